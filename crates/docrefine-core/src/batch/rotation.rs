//! Deterministic round-robin backend selection.

use super::backend::Backend;
use crate::error::RefineError;

/// Cycles through backends in configured order.
///
/// The N-th call to [`next`](Self::next) returns backend `N % len`.
#[derive(Debug)]
pub struct BackendRotation {
    backends: Vec<Backend>,
    index: usize,
}

impl BackendRotation {
    /// Build a rotation. An empty backend list is a setup error.
    pub fn new(backends: Vec<Backend>) -> Result<Self, RefineError> {
        if backends.is_empty() {
            return Err(RefineError::NoBackends(
                "backend rotation needs at least one backend".to_string(),
            ));
        }
        Ok(Self { backends, index: 0 })
    }

    /// Return the current backend and advance.
    pub fn next(&mut self) -> &Backend {
        let backend = &self.backends[self.index];
        self.index = (self.index + 1) % self.backends.len();
        backend
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn backends(&self) -> &[Backend] {
        &self.backends
    }

    /// Short names in rotation order.
    pub fn short_names(&self) -> Vec<String> {
        self.backends
            .iter()
            .map(|b| b.short_name().to_string())
            .collect()
    }
}
