//! Watched file descriptors.

use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::error::WatchError;
use super::strategy::{ContentStrategy, RawRead, Snapshot};

/// One file under watch.
///
/// Descriptors are shared as `Arc<WatchedFile>`; the registry and change
/// events compare them by pointer identity, so the same path can be
/// registered twice as independent watches.
pub struct WatchedFile {
    path: PathBuf,
    strategy: Arc<dyn ContentStrategy>,
    tag: RwLock<String>,
    /// Only written by the scan loop, and only after a detected change.
    last_snapshot: Mutex<Snapshot>,
}

impl WatchedFile {
    /// Start building a descriptor for `path`.
    pub fn builder(path: impl Into<PathBuf>) -> WatchedFileBuilder {
        WatchedFileBuilder::new(path)
    }

    /// Descriptor with the default raw-read strategy and an empty tag.
    pub fn new(path: impl Into<PathBuf>) -> Result<Arc<Self>, WatchError> {
        Self::builder(path).build()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tag(&self) -> String {
        self.tag.read().clone()
    }

    pub fn set_tag(&self, tag: impl Into<String>) {
        *self.tag.write() = tag.into();
    }

    /// Name of the content strategy, for logging.
    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// The snapshot taken at construction or at the last detected change.
    pub fn last_snapshot(&self) -> Snapshot {
        self.last_snapshot.lock().clone()
    }

    /// Re-read the file and compare against the stored snapshot.
    ///
    /// Returns `Ok(true)` and stores the new snapshot when the content
    /// differs. On error the stored snapshot is left untouched.
    pub fn poll(&self) -> Result<bool, WatchError> {
        let current = self.read_snapshot()?;

        let mut last = self.last_snapshot.lock();
        if *last == current {
            return Ok(false);
        }
        *last = current;
        Ok(true)
    }

    fn read_snapshot(&self) -> Result<Snapshot, WatchError> {
        let mut file = File::open(&self.path).map_err(|e| WatchError::Open {
            path: self.path.clone(),
            source: e,
        })?;
        self.snapshot_of(&mut file).map_err(|e| WatchError::Read {
            path: self.path.clone(),
            source: e,
        })
    }

    fn snapshot_of(&self, file: &mut File) -> io::Result<Snapshot> {
        self.strategy.snapshot(file)
    }
}

impl fmt::Debug for WatchedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchedFile")
            .field("path", &self.path)
            .field("strategy", &self.strategy.name())
            .field("tag", &*self.tag.read())
            .finish()
    }
}

/// Builder for [`WatchedFile`].
///
/// Setters may be called in any order and repeatedly; the last call wins.
pub struct WatchedFileBuilder {
    path: PathBuf,
    strategy: Option<Arc<dyn ContentStrategy>>,
    tag: String,
}

impl WatchedFileBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            strategy: None,
            tag: String::new(),
        }
    }

    /// Override the default raw-read strategy.
    pub fn strategy(mut self, strategy: impl ContentStrategy + 'static) -> Self {
        self.strategy = Some(Arc::new(strategy));
        self
    }

    /// Use an already shared strategy.
    pub fn shared_strategy(mut self, strategy: Arc<dyn ContentStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Validate the path and take the initial snapshot.
    ///
    /// Fails with [`WatchError::InvalidFile`] when the path cannot be
    /// stat'ed, is not a regular file, or cannot be opened, and with
    /// [`WatchError::InitialRead`] when the strategy fails on it.
    pub fn build(self) -> Result<Arc<WatchedFile>, WatchError> {
        let invalid = |path: &PathBuf, source: io::Error| WatchError::InvalidFile {
            path: path.clone(),
            source,
        };

        let metadata = fs::metadata(&self.path).map_err(|e| invalid(&self.path, e))?;
        if !metadata.is_file() {
            return Err(invalid(
                &self.path,
                io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }
        let mut handle = File::open(&self.path).map_err(|e| invalid(&self.path, e))?;

        let strategy = self.strategy.unwrap_or_else(|| Arc::new(RawRead));
        let file = WatchedFile {
            path: self.path,
            strategy,
            tag: RwLock::new(self.tag),
            last_snapshot: Mutex::new(Snapshot::default()),
        };

        let initial = file
            .snapshot_of(&mut handle)
            .map_err(|e| WatchError::InitialRead {
                path: file.path.clone(),
                source: e,
            })?;
        *file.last_snapshot.lock() = initial;

        Ok(Arc::new(file))
    }
}
