//! Mutable state of the active log file

use logrotor_core::{Error, Result, DEFAULT_FILE_MODE};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// The open handle, its name, and the bytes counted against it.
///
/// No handle means closed. Callers guard this behind the writer's mutex.
#[derive(Debug, Default)]
pub(crate) struct FileState {
    file: Option<File>,
    path: Option<PathBuf>,
    size: u64,
    rotations: u64,
}

impl FileState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    /// Append the whole buffer.
    ///
    /// The counter grows by whatever reached the file, including the partial
    /// count of a failed write.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let file = self.file.as_mut().ok_or(Error::InvalidState)?;

        let mut written = 0;
        let mut failure = None;
        while written < buf.len() {
            match file.write(&buf[written..]) {
                Ok(0) => {
                    failure = Some(std::io::Error::new(
                        ErrorKind::WriteZero,
                        "failed to write whole buffer",
                    ));
                    break;
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        self.size += written as u64;
        match failure {
            Some(source) => Err(Error::Write { written, source }),
            None => Ok(written),
        }
    }

    /// Install a freshly opened handle, counting from `size` bytes
    pub fn install(&mut self, file: File, path: PathBuf, size: u64) {
        self.file = Some(file);
        self.path = Some(path);
        self.size = size;
        self.rotations += 1;
    }

    /// Close the handle, leaving the state empty even if the close fails
    pub fn close(&mut self) -> Result<()> {
        let path = self.path.take();
        self.size = 0;

        let Some(mut file) = self.file.take() else {
            return Ok(());
        };

        // Flush only; fsync fails with EINVAL on special files
        file.flush().map_err(|source| Error::Close {
            path: path.unwrap_or_default(),
            source,
        })
    }
}

/// Open a log file for appending, creating it if needed
pub(crate) fn open_append(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(DEFAULT_FILE_MODE);
    }

    options.open(path)
}
