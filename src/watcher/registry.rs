//! Registry of watched file descriptors.
//!
//! Descriptors are held by identity. Registering the same path twice yields
//! two independent watches. A mutex guards mutation and iteration so the
//! scan loop and callers can share one registry.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use super::file::WatchedFile;

/// Unordered collection of watched files.
#[derive(Debug, Default)]
pub struct FileRegistry {
    files: Mutex<Vec<Arc<WatchedFile>>>,
    /// Bumped on every successful removal.
    removals: AtomicU64,
}

impl FileRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor. Duplicates by path are allowed.
    pub fn add(&self, file: Arc<WatchedFile>) {
        self.files.lock().push(file);
    }

    /// Remove a descriptor by identity.
    ///
    /// Returns false if it was not registered.
    pub fn remove(&self, file: &Arc<WatchedFile>) -> bool {
        let mut files = self.files.lock();
        match files.iter().position(|f| Arc::ptr_eq(f, file)) {
            Some(idx) => {
                files.swap_remove(idx);
                self.removals.fetch_add(1, Ordering::Release);
                true
            }
            None => false,
        }
    }

    /// Check whether this exact descriptor is registered.
    pub fn contains(&self, file: &Arc<WatchedFile>) -> bool {
        self.files.lock().iter().any(|f| Arc::ptr_eq(f, file))
    }

    /// Count of removals so far. Unchanged count means no descriptor has
    /// left the registry in between.
    pub fn removal_generation(&self) -> u64 {
        self.removals.load(Ordering::Acquire)
    }

    /// All descriptors matching `predicate`, in registry order.
    ///
    /// The predicate runs without the registry lock held, so it may call
    /// back into the registry.
    pub fn find<P>(&self, mut predicate: P) -> Vec<Arc<WatchedFile>>
    where
        P: FnMut(&WatchedFile) -> bool,
    {
        let mut files = self.files();
        files.retain(|f| predicate(f));
        files
    }

    /// All descriptors watching `path`.
    pub fn find_by_path(&self, path: &Path) -> Vec<Arc<WatchedFile>> {
        self.find(|f| f.path() == path)
    }

    /// All descriptors carrying `tag`.
    pub fn find_by_tag(&self, tag: &str) -> Vec<Arc<WatchedFile>> {
        self.find(|f| f.tag() == tag)
    }

    /// Point-in-time copy of every registered descriptor.
    ///
    /// The scan loop iterates this copy so the lock is never held across
    /// file I/O or channel delivery.
    pub fn files(&self) -> Vec<Arc<WatchedFile>> {
        self.files.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn fixture(temp: &TempDir, name: &str) -> PathBuf {
        let path = temp.path().join(name);
        fs::write(&path, name).unwrap();
        path
    }

    #[test]
    fn test_registry_add_and_find() {
        let temp = TempDir::new().unwrap();
        let registry = FileRegistry::new();

        let a = WatchedFile::builder(fixture(&temp, "a.txt"))
            .tag("config")
            .build()
            .unwrap();
        let b = WatchedFile::builder(fixture(&temp, "b.txt"))
            .tag("data")
            .build()
            .unwrap();
        registry.add(a.clone());
        registry.add(b.clone());

        assert_eq!(registry.len(), 2);

        let configs = registry.find_by_tag("config");
        assert_eq!(configs.len(), 1);
        assert!(Arc::ptr_eq(&configs[0], &a));

        let by_path = registry.find_by_path(b.path());
        assert_eq!(by_path.len(), 1);
        assert!(Arc::ptr_eq(&by_path[0], &b));

        assert!(registry.find(|_| false).is_empty());
    }

    #[test]
    fn test_registry_allows_duplicate_paths() {
        let temp = TempDir::new().unwrap();
        let path = fixture(&temp, "a.txt");
        let registry = FileRegistry::new();

        let first = WatchedFile::builder(&path).tag("one").build().unwrap();
        let second = WatchedFile::builder(&path).tag("two").build().unwrap();
        registry.add(first.clone());
        registry.add(second.clone());

        assert_eq!(registry.find_by_path(&path).len(), 2);

        // Removal is by identity, not by path
        assert!(registry.remove(&first));
        let remaining = registry.find_by_path(&path);
        assert_eq!(remaining.len(), 1);
        assert!(Arc::ptr_eq(&remaining[0], &second));
    }

    #[test]
    fn test_registry_remove_absent_is_noop() {
        let temp = TempDir::new().unwrap();
        let registry = FileRegistry::new();
        let file = WatchedFile::new(fixture(&temp, "a.txt")).unwrap();

        assert!(!registry.remove(&file));
        assert!(registry.is_empty());

        registry.add(file.clone());
        assert!(registry.contains(&file));
        assert!(registry.remove(&file));
        assert!(!registry.remove(&file));
        assert!(!registry.contains(&file));
    }

    #[test]
    fn test_registry_find_predicate_can_reenter() {
        let temp = TempDir::new().unwrap();
        let registry = FileRegistry::new();
        registry.add(WatchedFile::new(fixture(&temp, "a.txt")).unwrap());
        registry.add(WatchedFile::new(fixture(&temp, "b.txt")).unwrap());

        let found = registry.find(|f| {
            registry.len() == 2 && registry.find_by_path(f.path()).len() == 1
        });
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_removal_generation() {
        let temp = TempDir::new().unwrap();
        let registry = FileRegistry::new();
        let file = WatchedFile::new(fixture(&temp, "a.txt")).unwrap();
        assert_eq!(registry.removal_generation(), 0);

        registry.add(file.clone());
        assert_eq!(registry.removal_generation(), 0);

        assert!(registry.remove(&file));
        assert_eq!(registry.removal_generation(), 1);

        // Absent descriptors do not bump the generation
        assert!(!registry.remove(&file));
        assert_eq!(registry.removal_generation(), 1);
    }

    #[test]
    fn test_registry_find_sees_tag_updates() {
        let temp = TempDir::new().unwrap();
        let registry = FileRegistry::new();
        let file = WatchedFile::new(fixture(&temp, "a.txt")).unwrap();
        registry.add(file.clone());

        assert!(registry.find_by_tag("hot").is_empty());
        file.set_tag("hot");
        assert_eq!(registry.find_by_tag("hot").len(), 1);
    }
}
