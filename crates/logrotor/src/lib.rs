//! logrotor - Rotating append-only log files
//!
//! A [`RotatingWriter`] appends to `<base_path><stamp>`, switches to a new
//! file when the rotation interval elapses or the active file grows past the
//! size limit, and deletes the oldest rotated files beyond the retention
//! count. With every threshold disabled, [`open`] returns a plain append
//! writer instead.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
//!
//! let writer = Arc::new(logrotor::RotatingWriter::open(
//!     logrotor::RotationConfig::fine("/var/log/app.log", 3600, 10 * 1024 * 1024, 5),
//! )?);
//!
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer().with_writer(writer.clone()))
//!     .init();
//! # Ok::<(), logrotor::Error>(())
//! ```

pub mod clock;
mod naming;
mod plain;
mod purge;
mod scheduler;
mod sink;
mod state;
mod writer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use logrotor_core::{
    ConfigFormat, Error, Layout, Result, RotationConfig, DAILY_INTERVAL_SECS, DAILY_LAYOUT,
    FINE_LAYOUT,
};
pub use plain::PlainWriter;
pub use purge::PurgeReport;
pub use sink::{LogSink, SinkWriter};
pub use writer::RotatingWriter;

use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::MakeWriter;

/// A log file opened by [`open`]: rotating, or plain when nothing is configured
#[derive(Debug)]
pub enum LogFile {
    Plain(PlainWriter),
    Rotating(RotatingWriter),
}

impl LogFile {
    pub fn append(&self, buf: &[u8]) -> Result<usize> {
        match self {
            LogFile::Plain(w) => w.append(buf),
            LogFile::Rotating(w) => w.append(buf),
        }
    }

    pub fn close(&self) -> Result<()> {
        match self {
            LogFile::Plain(w) => w.close(),
            LogFile::Rotating(w) => w.close(),
        }
    }

    /// Path of the file currently written to
    pub fn current_path(&self) -> Option<PathBuf> {
        match self {
            LogFile::Plain(w) if !w.is_closed() => Some(w.path().to_path_buf()),
            LogFile::Plain(_) => None,
            LogFile::Rotating(w) => w.current_path(),
        }
    }

    pub fn as_rotating(&self) -> Option<&RotatingWriter> {
        match self {
            LogFile::Rotating(w) => Some(w),
            LogFile::Plain(_) => None,
        }
    }
}

impl LogSink for LogFile {
    fn append(&self, buf: &[u8]) -> Result<usize> {
        LogFile::append(self, buf)
    }

    fn close(&self) -> Result<()> {
        LogFile::close(self)
    }
}

impl io::Write for &LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        sink::write_through(*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        sink::write_through(&*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = SinkWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter::new(self)
    }
}

/// Open a log file as described by `config`
pub fn open(config: RotationConfig) -> Result<LogFile> {
    if config.is_passthrough() {
        return Ok(LogFile::Plain(PlainWriter::open(&config.base_path)?));
    }
    Ok(LogFile::Rotating(RotatingWriter::open(config)?))
}

/// Second-resolution names (`<base>.20240131.235959`) with the given thresholds.
///
/// Zero disables a threshold; all zero opens `base_path` itself without
/// rotation.
pub fn open_fine<P: AsRef<Path>>(
    base_path: P,
    interval_secs: u64,
    max_size_bytes: u64,
    max_count: usize,
) -> Result<LogFile> {
    open(RotationConfig::fine(
        base_path.as_ref(),
        interval_secs,
        max_size_bytes,
        max_count,
    ))
}

/// One file per day (`<base>.20240131`), no size or count caps
pub fn open_daily<P: AsRef<Path>>(base_path: P) -> Result<LogFile> {
    open(RotationConfig::daily(base_path.as_ref()))
}
