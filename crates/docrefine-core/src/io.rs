//! Document storage used by the batch processor, scraper and comparison run.
//!
//! All file reads and writes on the processing path go through
//! [`DocumentStore`], so tests can swap the filesystem for memory.

use crate::error::PipelineError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Read and write whole text documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document as UTF-8 text.
    async fn read_to_string(&self, path: &Path) -> Result<String, PipelineError>;

    /// Write a document, creating parent directories as needed.
    async fn write(&self, path: &Path, contents: &str) -> Result<(), PipelineError>;
}

/// Filesystem-backed store using `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

#[async_trait]
impl DocumentStore for FsStore {
    async fn read_to_string(&self, path: &Path) -> Result<String, PipelineError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PipelineError::Read {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    async fn write(&self, path: &Path, contents: &str) -> Result<(), PipelineError> {
        let write_err = |e: std::io::Error| PipelineError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
            }
        }
        tokio::fs::write(path, contents).await.map_err(write_err)
    }
}

/// In-memory store keyed by path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document.
    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.into(), contents.into());
        }
    }

    /// Contents of one document, if present.
    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.lock().ok()?.get(path).cloned()
    }

    /// All stored paths under `dir`, sorted.
    pub fn paths_in(&self, dir: &Path) -> Vec<PathBuf> {
        match self.files.lock() {
            Ok(files) => files
                .keys()
                .filter(|p| p.parent() == Some(dir))
                .cloned()
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read_to_string(&self, path: &Path) -> Result<String, PipelineError> {
        self.get(path).ok_or_else(|| PipelineError::Read {
            path: path.to_path_buf(),
            message: "No such file".to_string(),
        })
    }

    async fn write(&self, path: &Path, contents: &str) -> Result<(), PipelineError> {
        let mut files = self.files.lock().map_err(|_| PipelineError::Write {
            path: path.to_path_buf(),
            message: "store lock poisoned".to_string(),
        })?;
        files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }
}
