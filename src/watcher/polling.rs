//! Polling watcher: the scheduled scan loop and event dispatch.
//!
//! A single background thread wakes on every tick, re-reads each registered
//! file through its content strategy and compares the result with the stored
//! snapshot. Changed files from one pass are delivered as one
//! [`ChangeEvent`]; read failures are delivered one by one on the error
//! channel. Both channels are rendezvous channels, so the scan loop does not
//! move on until the consumer has taken the message (or the watcher stops).

use std::ops::ControlFlow;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded, select, tick};

use super::config::WatcherConfig;
use super::error::WatchError;
use super::event::ChangeEvent;
use super::file::WatchedFile;
use super::registry::FileRegistry;

/// Polling file watcher.
///
/// Lifecycle is `Idle -> Running -> Stopped`. A stopped watcher cannot be
/// restarted. Files can be added and removed in any state.
pub struct PollWatcher {
    config: WatcherConfig,
    /// Shared with the scan thread.
    registry: Arc<FileRegistry>,
    state: State,
}

enum State {
    Idle,
    Running(ScanHandle),
    Stopped,
}

/// Caller-side handles of a running scan loop.
struct ScanHandle {
    /// Dropped to signal stop; never sent on.
    stop_tx: Sender<()>,
    events: Receiver<ChangeEvent>,
    errors: Receiver<WatchError>,
    thread: JoinHandle<()>,
}

impl PollWatcher {
    /// Create a builder for configuring the watcher.
    pub fn builder() -> PollWatcherBuilder {
        PollWatcherBuilder::new()
    }

    /// Create an idle watcher with an empty registry.
    pub fn new(config: WatcherConfig) -> Self {
        Self {
            config,
            registry: Arc::new(FileRegistry::new()),
            state: State::Idle,
        }
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running(_))
    }

    /// Start the scan loop.
    ///
    /// Returns the event and error channels. Both are unbuffered: the scan
    /// loop blocks on delivery until a consumer receives. A slow consumer
    /// slows scanning down to its own pace.
    pub fn start(&mut self) -> Result<(Receiver<ChangeEvent>, Receiver<WatchError>), WatchError> {
        if !matches!(self.state, State::Idle) {
            return Err(WatchError::AlreadyStarted);
        }

        let (stop_tx, stop_rx) = bounded(0);
        let (event_tx, event_rx) = bounded(0);
        let (error_tx, error_rx) = bounded(0);

        let scanner = Scanner {
            registry: self.registry.clone(),
            ticker: tick(self.config.poll_interval()),
            stop_rx,
            events: event_tx,
            errors: error_tx,
        };

        let thread = thread::Builder::new()
            .name("pollwatch-scan".to_string())
            .spawn(move || scanner.run())
            .map_err(|e| WatchError::SpawnFailed { source: e })?;

        crate::log_event!(
            "watcher",
            "started",
            "{} files every {:?}",
            self.registry.len(),
            self.config.poll_interval()
        );

        self.state = State::Running(ScanHandle {
            stop_tx,
            events: event_rx.clone(),
            errors: error_rx.clone(),
            thread,
        });

        Ok((event_rx, error_rx))
    }

    /// Stop the scan loop and close all channels.
    ///
    /// Terminal: the watcher cannot be started again. Waits for the scan
    /// thread to exit, which happens at the next stop check; a file read
    /// that hangs delays this.
    pub fn stop(&mut self) -> Result<(), WatchError> {
        match std::mem::replace(&mut self.state, State::Stopped) {
            State::Running(handle) => {
                handle.shutdown();
                crate::log_event!("watcher", "stopped");
                Ok(())
            }
            previous => {
                self.state = previous;
                Err(WatchError::NotRunning)
            }
        }
    }

    /// Event channel of the running watcher.
    pub fn events(&self) -> Option<Receiver<ChangeEvent>> {
        match &self.state {
            State::Running(handle) => Some(handle.events.clone()),
            _ => None,
        }
    }

    /// Error channel of the running watcher.
    pub fn errors(&self) -> Option<Receiver<WatchError>> {
        match &self.state {
            State::Running(handle) => Some(handle.errors.clone()),
            _ => None,
        }
    }

    /// Register a file. The same path may be registered more than once.
    pub fn add_file(&self, file: Arc<WatchedFile>) {
        crate::debug_event!("watcher", "added", "{}", file.path().display());
        self.registry.add(file);
    }

    /// Unregister a file by identity. No-op if it is not registered.
    ///
    /// A scan pass already in progress skips the file from here on; it
    /// will not appear in any later event or error.
    pub fn remove_file(&self, file: &Arc<WatchedFile>) -> bool {
        let removed = self.registry.remove(file);
        if removed {
            crate::debug_event!("watcher", "removed", "{}", file.path().display());
        }
        removed
    }

    /// Registered files matching `predicate`.
    pub fn find<P>(&self, predicate: P) -> Vec<Arc<WatchedFile>>
    where
        P: FnMut(&WatchedFile) -> bool,
    {
        self.registry.find(predicate)
    }

    /// All registered files.
    pub fn files(&self) -> Vec<Arc<WatchedFile>> {
        self.registry.files()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

impl Default for PollWatcher {
    fn default() -> Self {
        Self::new(WatcherConfig::default())
    }
}

impl Drop for PollWatcher {
    fn drop(&mut self) {
        if let State::Running(handle) = std::mem::replace(&mut self.state, State::Stopped) {
            handle.shutdown();
        }
    }
}

impl ScanHandle {
    fn shutdown(self) {
        let ScanHandle {
            stop_tx, thread, ..
        } = self;
        drop(stop_tx);
        if thread.join().is_err() {
            tracing::error!("[watcher] scan thread panicked");
        }
    }
}

/// Owned by the scan thread.
struct Scanner {
    registry: Arc<FileRegistry>,
    ticker: Receiver<Instant>,
    /// Disconnects when the watcher stops.
    stop_rx: Receiver<()>,
    events: Sender<ChangeEvent>,
    errors: Sender<WatchError>,
}

impl Scanner {
    fn run(self) {
        loop {
            // Stop wins over a pending tick
            if self.stop_requested() {
                break;
            }

            select! {
                recv(self.stop_rx) -> _ => break,
                recv(self.ticker) -> _ => {
                    if self.scan().is_break() {
                        break;
                    }
                }
            }
        }
        crate::debug_event!("watcher", "scan loop exited");
    }

    fn stop_requested(&self) -> bool {
        !matches!(self.stop_rx.try_recv(), Err(TryRecvError::Empty))
    }

    /// One pass over the registry.
    fn scan(&self) -> ControlFlow<()> {
        let started = Instant::now();
        let mut batch = Vec::new();
        let generation = self.registry.removal_generation();

        for file in self.registry.files() {
            if self.stop_requested() {
                return ControlFlow::Break(());
            }
            // Removed since the pass began; only look once something was removed
            if self.registry.removal_generation() != generation && !self.registry.contains(&file) {
                continue;
            }

            match file.poll() {
                Ok(true) => {
                    crate::debug_event!("watcher", "changed", "{}", file.path().display());
                    batch.push(file);
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("[watcher] {e}");
                    self.deliver(&self.errors, e)?;
                }
            }
        }

        let elapsed = started.elapsed();
        match ChangeEvent::from_batch(batch) {
            Some(event) => {
                crate::debug_event!(
                    "watcher",
                    "pass",
                    "{} changed in {}",
                    event.len(),
                    format_elapsed(elapsed)
                );
                self.deliver(&self.events, event)
            }
            None => ControlFlow::Continue(()),
        }
    }

    /// Hand `msg` to a consumer, giving up if the watcher stops first.
    fn deliver<T>(&self, tx: &Sender<T>, msg: T) -> ControlFlow<()> {
        select! {
            send(tx, msg) -> res => match res {
                Ok(()) => ControlFlow::Continue(()),
                Err(_) => ControlFlow::Break(()),
            },
            recv(self.stop_rx) -> _ => ControlFlow::Break(()),
        }
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    if elapsed.as_millis() > 0 {
        format!("{}ms", elapsed.as_millis())
    } else {
        format!("{}us", elapsed.as_micros())
    }
}

/// Builder for constructing a [`PollWatcher`].
pub struct PollWatcherBuilder {
    poll_interval: Option<Duration>,
    files: Vec<Arc<WatchedFile>>,
}

impl PollWatcherBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            poll_interval: None,
            files: Vec::new(),
        }
    }

    /// Set the poll interval. Zero fails in [`build`](Self::build).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Take the poll interval from an existing config.
    pub fn config(mut self, config: WatcherConfig) -> Self {
        self.poll_interval = Some(config.poll_interval());
        self
    }

    /// Register a file up front.
    pub fn file(mut self, file: Arc<WatchedFile>) -> Self {
        self.files.push(file);
        self
    }

    /// Build the PollWatcher.
    pub fn build(self) -> Result<PollWatcher, WatchError> {
        let config = match self.poll_interval {
            Some(interval) => WatcherConfig::new(interval)?,
            None => WatcherConfig::default(),
        };

        let watcher = PollWatcher::new(config);
        for file in self.files {
            watcher.add_file(file);
        }
        Ok(watcher)
    }
}

impl Default for PollWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
