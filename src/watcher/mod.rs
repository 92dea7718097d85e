//! Polling file watcher.
//!
//! Watches an explicit set of files by re-reading them on a fixed interval.
//! No OS notification APIs are involved, which makes the behavior the same
//! on every platform and lets callers define what "changed" means through a
//! content strategy (raw bytes, a digest, or their own function).
//!
//! # Architecture
//!
//! ```text
//! PollWatcher
//!   - FileRegistry (Arc<WatchedFile> by identity)
//!   - scan thread: tick -> poll each file -> batch
//!         |
//!    +----------+----------+
//!    |                     |
//! events (ChangeEvent)  errors (WatchError)
//! ```

mod config;
mod error;
mod event;
mod file;
mod polling;
mod registry;
mod strategy;

pub use config::{DEFAULT_POLL_INTERVAL, WatcherConfig};
pub use error::WatchError;
pub use event::ChangeEvent;
pub use file::{WatchedFile, WatchedFileBuilder};
pub use polling::{PollWatcher, PollWatcherBuilder};
pub use registry::FileRegistry;
pub use strategy::{ContentStrategy, Digest, RawRead, Snapshot};
