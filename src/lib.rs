//! Polling file-change watcher.
//!
//! Register files, start the watcher, and receive one [`ChangeEvent`] per
//! scan pass in which at least one file's content snapshot changed.
//!
//! ```no_run
//! use std::time::Duration;
//! use pollwatch::{Digest, PollWatcher, WatchedFile};
//!
//! # fn main() -> Result<(), pollwatch::WatchError> {
//! let mut watcher = PollWatcher::builder()
//!     .poll_interval(Duration::from_secs(1))
//!     .build()?;
//! watcher.add_file(WatchedFile::builder("Cargo.toml").strategy(Digest).tag("manifest").build()?);
//!
//! let (events, errors) = watcher.start()?;
//! if let Ok(event) = events.recv() {
//!     for file in event.files() {
//!         println!("{} changed ({})", file.path().display(), file.tag());
//!     }
//! }
//! drop(errors);
//! watcher.stop()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod logging;
pub mod watcher;

pub use config::{LoggingConfig, Settings, WatcherSettings};
pub use watcher::{
    ChangeEvent, ContentStrategy, Digest, FileRegistry, PollWatcher, PollWatcherBuilder, RawRead,
    Snapshot, WatchError, WatchedFile, WatchedFileBuilder, WatcherConfig,
};
