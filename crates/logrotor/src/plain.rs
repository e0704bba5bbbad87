//! Non-rotating append writer

use logrotor_core::{Error, Result};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::state::{open_append, FileState};

/// A single append-only file with no rotation, retention, or background work
pub struct PlainWriter {
    path: PathBuf,
    state: Mutex<FileState>,
}

impl PlainWriter {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open_append(&path).map_err(|source| Error::Open {
            path: path.clone(),
            source,
        })?;
        let size = file.metadata()?.len();

        let mut state = FileState::new();
        state.install(file, path.clone(), size);
        debug!("Opened plain log {}", path.display());

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn append(&self, buf: &[u8]) -> Result<usize> {
        self.state.lock().write(buf)
    }

    pub fn close(&self) -> Result<()> {
        self.state.lock().close()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        !self.state.lock().is_open()
    }
}

impl std::fmt::Debug for PlainWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlainWriter").field("path", &self.path).finish()
    }
}
