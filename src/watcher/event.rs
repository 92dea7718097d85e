//! Change events delivered by the watcher.

use std::path::Path;
use std::sync::Arc;

use super::file::WatchedFile;

/// Files whose snapshot changed during one scan pass.
///
/// Never empty: [`ChangeEvent::from_batch`] refuses an empty batch.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    files: Vec<Arc<WatchedFile>>,
}

impl ChangeEvent {
    /// Wrap a scan batch, or `None` if nothing changed.
    pub fn from_batch(files: Vec<Arc<WatchedFile>>) -> Option<Self> {
        if files.is_empty() {
            None
        } else {
            Some(Self { files })
        }
    }

    /// Changed files in scan order.
    pub fn files(&self) -> &[Arc<WatchedFile>] {
        &self.files
    }

    pub fn into_files(self) -> Vec<Arc<WatchedFile>> {
        self.files
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|f| f.path())
    }

    /// Whether this exact descriptor is part of the batch.
    pub fn contains(&self, file: &Arc<WatchedFile>) -> bool {
        self.files.iter().any(|f| Arc::ptr_eq(f, file))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
