//! Content strategies: turn an open file into a comparable snapshot.
//!
//! A strategy reads the whole handle and returns an opaque [`Snapshot`].
//! The watcher never interprets snapshots, it only compares them.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};

use sha2::{Digest as _, Sha256};

/// Opaque content state of a file, compared by exact equality.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Snapshot(Vec<u8>);

impl Snapshot {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Snapshot {
    // Raw snapshots can be whole files; print a short prefix only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: String = self.0.iter().take(16).map(|b| format!("{b:02x}")).collect();
        let ellipsis = if self.0.len() > 16 { ".." } else { "" };
        write!(f, "Snapshot({} bytes: {head}{ellipsis})", self.0.len())
    }
}

/// Converts an open file handle into a [`Snapshot`].
///
/// Implementations must consume the handle to EOF before returning and
/// must not have side effects beyond reading it.
pub trait ContentStrategy: Send + Sync {
    /// Strategy name for logging.
    fn name(&self) -> &str;

    /// Read `file` fully and produce its snapshot.
    fn snapshot(&self, file: &mut File) -> io::Result<Snapshot>;
}

/// Full byte content; any byte change is a change.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawRead;

impl ContentStrategy for RawRead {
    fn name(&self) -> &str {
        "raw"
    }

    fn snapshot(&self, file: &mut File) -> io::Result<Snapshot> {
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(Snapshot(data))
    }
}

/// SHA-256 of the full content. Snapshots are always 32 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Digest;

impl ContentStrategy for Digest {
    fn name(&self) -> &str {
        "sha256"
    }

    fn snapshot(&self, file: &mut File) -> io::Result<Snapshot> {
        let mut hasher = Sha256::new();
        io::copy(file, &mut hasher)?;
        Ok(Snapshot(hasher.finalize().to_vec()))
    }
}

/// Any suitable closure is a strategy.
impl<F> ContentStrategy for F
where
    F: Fn(&mut File) -> io::Result<Snapshot> + Send + Sync,
{
    fn name(&self) -> &str {
        "custom"
    }

    fn snapshot(&self, file: &mut File) -> io::Result<Snapshot> {
        self(file)
    }
}
