//! Seed source implementations.

use rand_core::{OsRng, RngCore};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Errors raised when seed material cannot be supplied.
#[derive(Debug, Clone, Error)]
pub enum SeedError {
    #[error("seed source unavailable: {0}")]
    Unavailable(String),
    #[error("seed source supplied {got} of {need} bytes")]
    ShortRead { got: usize, need: usize },
    #[error("seed source I/O error: {0}")]
    Io(String),
}

/// A supplier of cryptographically secure random bytes.
///
/// Implementations either fill the whole destination or fail; partial
/// fills are reported as errors, never returned silently.
pub trait SeedSource: Send + Sync {
    /// Fills `dest` with secure random bytes.
    fn fill(&self, dest: &mut [u8]) -> Result<(), SeedError>;
}

/// Seed source backed by the operating system's CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSeedSource;

impl SeedSource for OsSeedSource {
    fn fill(&self, dest: &mut [u8]) -> Result<(), SeedError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| SeedError::Unavailable(e.to_string()))
    }
}

/// Seed source that reads from a file or character device.
///
/// Useful for pointing producers at `/dev/random` or a hardware RNG node.
/// The handle is shared, so concurrent producers serialize their reads.
#[derive(Debug)]
pub struct FileSeedSource {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSeedSource {
    /// Opens the seed file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| SeedError::Io(e.to_string()))?;
        tracing::debug!(path = %path.display(), "Opened seed file");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Returns the path this source reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SeedSource for FileSeedSource {
    fn fill(&self, dest: &mut [u8]) -> Result<(), SeedError> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| SeedError::Unavailable("seed file lock poisoned".into()))?;

        let mut got = 0;
        while got < dest.len() {
            match file.read(&mut dest[got..]) {
                Ok(0) => {
                    return Err(SeedError::ShortRead {
                        got,
                        need: dest.len(),
                    })
                }
                Ok(n) => got += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(SeedError::Io(e.to_string())),
            }
        }
        Ok(())
    }
}
