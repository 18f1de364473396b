//! Work item discovery with skip-already-processed semantics.

use super::naming;
use crate::config::ProcessingConfig;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One source document to refine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// File name within the input directory
    pub file_name: String,
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl WorkItem {
    pub fn new(path: PathBuf, size: u64) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            file_name,
            path,
            size,
        }
    }
}

/// Outcome of scanning the input and output directories.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOutcome {
    /// Every eligible source document
    pub total: usize,
    /// Sources whose refined output already exists
    pub already_processed: usize,
    /// Items still to be processed, sorted by file name
    pub remaining: Vec<WorkItem>,
}

/// Finds source documents in the input directory.
pub struct FileDiscovery {
    config: ProcessingConfig,
}

impl FileDiscovery {
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// All eligible documents directly inside `dir`, sorted by file name.
    ///
    /// Eligible means: regular file, configured extension, and not carrying
    /// the output marker. A missing directory yields no items.
    pub fn discover(&self, dir: &Path) -> Vec<WorkItem> {
        let mut items: Vec<WorkItem> = self
            .files_in(dir)
            .filter(|(name, _)| {
                !name.starts_with(&self.config.output_marker) && self.has_extension(name)
            })
            .map(|(_, entry)| {
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                WorkItem::new(entry.into_path(), size)
            })
            .collect();

        items.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        items
    }

    /// Source file names that already have a refined output in `dir`.
    pub fn processed_sources(&self, dir: &Path, short_names: &[String]) -> HashSet<String> {
        self.files_in(dir)
            .filter_map(|(name, _)| {
                naming::parse_output_name(
                    &name,
                    &self.config.output_marker,
                    &self.config.input_extension,
                    short_names,
                )
            })
            .collect()
    }

    /// Discover inputs and drop the ones already refined.
    pub fn pending(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        short_names: &[String],
    ) -> DiscoveryOutcome {
        let all = self.discover(input_dir);
        let done = self.processed_sources(output_dir, short_names);
        let total = all.len();
        let remaining: Vec<WorkItem> = all
            .into_iter()
            .filter(|item| !done.contains(&item.file_name))
            .collect();

        tracing::info!(
            "Found {total} total files, {} remaining to process",
            remaining.len()
        );

        DiscoveryOutcome {
            total,
            already_processed: total - remaining.len(),
            remaining,
        }
    }

    /// Get total size of all items.
    pub fn total_size(items: &[WorkItem]) -> u64 {
        items.iter().map(|i| i.size).sum()
    }

    fn files_in<'a>(
        &self,
        dir: &'a Path,
    ) -> impl Iterator<Item = (String, walkdir::DirEntry)> + 'a {
        WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| (e.file_name().to_string_lossy().into_owned(), e))
    }

    fn has_extension(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext == self.config.input_extension)
            .unwrap_or(false)
    }
}
