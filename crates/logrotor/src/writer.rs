//! Rotating log writer

use logrotor_core::{Error, Result, RotationConfig, PURGE_THREAD_NAME};
use parking_lot::Mutex;
use std::io;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::naming::LogName;
use crate::purge::{purge, PurgeReport};
use crate::scheduler::Scheduler;
use crate::state::{open_append, FileState};

/// What a rotation did.
///
/// Rotation runs under the state lock and must not log there: the writer
/// may be the sink of the active tracing subscriber. Callers log this once
/// the lock is released.
#[derive(Debug)]
enum Rotation {
    Unchanged,
    Rotated {
        from: Option<PathBuf>,
        to: PathBuf,
        resumed: u64,
        purge_spawn: Option<io::Error>,
    },
}

impl Rotation {
    fn log(&self) {
        if let Rotation::Rotated {
            from,
            to,
            resumed,
            purge_spawn,
        } = self
        {
            match from {
                Some(from) => debug!("Rotated log {} -> {}", from.display(), to.display()),
                None => debug!("Opened log {}", to.display()),
            }
            if *resumed > 0 {
                debug!("Resuming {} at {} bytes", to.display(), resumed);
            }
            if let Some(e) = purge_spawn {
                warn!("Failed to start retention pass for {}: {}", to.display(), e);
            }
        }
    }
}

/// State shared with the scheduler and retention threads
struct Shared {
    config: RotationConfig,
    naming: LogName,
    clock: Arc<dyn Clock>,
    state: Mutex<FileState>,
    purges: Mutex<Vec<JoinHandle<PurgeReport>>>,
}

impl Shared {
    /// Switch to the file named for "now".
    ///
    /// The old handle is closed before the new one is opened. If either
    /// step fails the state is left without a handle, which is terminal.
    fn rotate(self: &Arc<Self>, state: &mut FileState) -> Result<Rotation> {
        let candidate = self.naming.path_at(self.clock.now())?;
        if state.path() == Some(candidate.as_path()) {
            return Ok(Rotation::Unchanged);
        }

        let from = state.path().map(PathBuf::from);
        state.close()?;

        let file = open_append(&candidate).map_err(|source| Error::Open {
            path: candidate.clone(),
            source,
        })?;
        let resumed = file
            .metadata()
            .map_err(|source| Error::Open {
                path: candidate.clone(),
                source,
            })?
            .len();

        state.install(file, candidate.clone(), resumed);
        let purge_spawn = self.dispatch_purge().err();

        Ok(Rotation::Rotated {
            from,
            to: candidate,
            resumed,
            purge_spawn,
        })
    }

    /// Start a retention pass in the background
    fn dispatch_purge(self: &Arc<Self>) -> io::Result<()> {
        if self.config.max_count == 0 {
            return Ok(());
        }

        let shared = Arc::clone(self);
        let handle = thread::Builder::new()
            .name(PURGE_THREAD_NAME.to_string())
            .spawn(move || {
                let live = shared.state.lock().path().map(PathBuf::from);
                purge(&shared.naming, shared.config.max_count, live.as_deref())
            })?;

        let mut purges = self.purges.lock();
        purges.retain(|h| !h.is_finished());
        purges.push(handle);
        Ok(())
    }

    fn join_purges(&self) -> Vec<PurgeReport> {
        let handles = std::mem::take(&mut *self.purges.lock());
        handles
            .into_iter()
            .filter_map(|handle| match handle.join() {
                Ok(report) => Some(report),
                Err(_) => {
                    warn!("Retention pass panicked");
                    None
                }
            })
            .collect()
    }
}

/// Append-only log writer that rotates by time and size and prunes old files.
///
/// All writes, closes, and rotations are serialized by one lock. The writer
/// is `Send + Sync`; share it behind an `Arc` to write from several threads.
pub struct RotatingWriter {
    shared: Arc<Shared>,
    scheduler: Mutex<Option<Scheduler>>,
}

impl RotatingWriter {
    /// Open a writer using the local wall clock
    pub fn open(config: RotationConfig) -> Result<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    /// Open a writer that names files from `clock`
    pub fn open_with_clock(config: RotationConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let layout = config.validate()?;
        let naming = LogName::new(&config, layout)?;

        let shared = Arc::new(Shared {
            config,
            naming,
            clock,
            state: Mutex::new(FileState::new()),
            purges: Mutex::new(Vec::new()),
        });

        let rotation = {
            let mut state = shared.state.lock();
            shared.rotate(&mut state)?
        };
        rotation.log();

        let writer = Self {
            shared,
            scheduler: Mutex::new(None),
        };

        if writer.shared.config.interval_secs > 0 {
            let interval = Duration::from_secs(writer.shared.config.interval_secs);
            match Scheduler::spawn(interval, scheduled_rotation(Arc::clone(&writer.shared))) {
                Ok(scheduler) => *writer.scheduler.lock() = Some(scheduler),
                Err(e) => {
                    if let Err(close_err) = writer.close() {
                        warn!("Failed to close log after scheduler error: {}", close_err);
                    }
                    return Err(Error::IoError(e));
                }
            }
        }

        info!(
            "Opened rotating log {} (layout '{}', interval {}s, max size {}, max count {})",
            writer.shared.config.base_path.display(),
            writer.shared.config.layout,
            writer.shared.config.interval_secs,
            writer.shared.config.max_size_bytes,
            writer.shared.config.max_count
        );

        Ok(writer)
    }

    /// Append `buf` to the active file.
    ///
    /// On a failed write the error carries the partial byte count. When the
    /// write pushes the file past the size limit the writer rotates before
    /// returning; a rotation failure comes back as [`Error::Rotate`] even
    /// though every byte was written.
    pub fn append(&self, buf: &[u8]) -> Result<usize> {
        let (written, rotation) = {
            let mut state = self.shared.state.lock();
            let written = state.write(buf)?;

            let max_size = self.shared.config.max_size_bytes;
            if max_size > 0 && state.size() > max_size {
                let rotation = self.shared.rotate(&mut state).map_err(|e| Error::Rotate {
                    written,
                    source: Box::new(e),
                })?;
                (written, Some(rotation))
            } else {
                (written, None)
            }
        };

        if let Some(rotation) = rotation {
            rotation.log();
        }
        Ok(written)
    }

    /// Rotate now if the layout yields a new name
    pub fn rotate_now(&self) -> Result<()> {
        let rotation = {
            let mut state = self.shared.state.lock();
            if !state.is_open() {
                return Err(Error::InvalidState);
            }
            self.shared.rotate(&mut state)?
        };
        rotation.log();
        Ok(())
    }

    /// Stop background rotation, close the active file, and wait for
    /// in-flight retention passes. Closing twice is not an error.
    pub fn close(&self) -> Result<()> {
        let scheduler = self.scheduler.lock().take();
        if let Some(scheduler) = scheduler {
            scheduler.stop();
        }

        let (path, result) = {
            let mut state = self.shared.state.lock();
            let path = state.path().map(PathBuf::from);
            (path, state.close())
        };

        self.shared.join_purges();

        if let Some(path) = path {
            match &result {
                Ok(()) => info!("Closed rotating log {}", path.display()),
                Err(e) => warn!("Closing rotating log {} failed: {}", path.display(), e),
            }
        }
        result
    }

    /// Wait for retention passes started so far
    pub fn wait_purges(&self) -> Vec<PurgeReport> {
        self.shared.join_purges()
    }

    /// Path of the active file, `None` once closed
    pub fn current_path(&self) -> Option<PathBuf> {
        self.shared.state.lock().path().map(PathBuf::from)
    }

    /// Bytes counted against the active file
    pub fn current_size(&self) -> u64 {
        self.shared.state.lock().size()
    }

    /// Number of files this writer has switched to, including the first
    pub fn rotation_count(&self) -> u64 {
        self.shared.state.lock().rotations()
    }

    pub fn is_closed(&self) -> bool {
        !self.shared.state.lock().is_open()
    }

    pub fn config(&self) -> &RotationConfig {
        &self.shared.config
    }
}

/// Scheduler tick: rotate unless the writer has been closed
fn scheduled_rotation(shared: Arc<Shared>) -> impl FnMut() -> ControlFlow<()> + Send + 'static {
    move || {
        let result = {
            let mut state = shared.state.lock();
            if !state.is_open() {
                return ControlFlow::Break(());
            }
            shared.rotate(&mut state)
        };

        match result {
            Ok(rotation) => rotation.log(),
            Err(e) => warn!(
                "Scheduled rotation of {} failed: {}",
                shared.config.base_path.display(),
                e
            ),
        }
        ControlFlow::Continue(())
    }
}

impl Drop for RotatingWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close rotating log on drop: {}", e);
        }
    }
}

impl std::fmt::Debug for RotatingWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingWriter")
            .field("config", &self.shared.config)
            .field("current_path", &self.current_path())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::fs;
    use tempfile::TempDir;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn open(
        dir: &TempDir,
        max_size: u64,
        max_count: usize,
    ) -> (RotatingWriter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        let config = RotationConfig::fine(dir.path().join("app.log"), 0, max_size, max_count);
        let writer = RotatingWriter::open_with_clock(config, clock.clone()).unwrap();
        (writer, clock)
    }

    #[test]
    fn test_open_creates_first_file() {
        let dir = TempDir::new().unwrap();
        let (writer, _clock) = open(&dir, 0, 3);

        let path = writer.current_path().unwrap();
        assert_eq!(path, dir.path().join("app.log.20240601.120000"));
        assert!(path.exists());
        assert_eq!(writer.rotation_count(), 1);
        assert_eq!(writer.current_size(), 0);
    }

    #[test]
    fn test_open_fails_for_missing_directory() {
        let config = RotationConfig::fine("/nonexistent/dir/app.log", 0, 10, 0);
        let result = RotatingWriter::open(config);
        assert!(matches!(result, Err(Error::Open { .. })));
    }

    #[test]
    fn test_open_rejects_invalid_layout() {
        let dir = TempDir::new().unwrap();
        let config = RotationConfig::new(dir.path().join("app.log"), ".%Q").with_max_count(1);
        assert!(matches!(
            RotatingWriter::open(config),
            Err(Error::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_open_with_monthly_layout() {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(start()));
        let config = RotationConfig::new(dir.path().join("app.log"), ".%Y%m").with_max_count(3);
        let writer = RotatingWriter::open_with_clock(config, clock.clone()).unwrap();
        assert_eq!(
            writer.current_path().unwrap(),
            dir.path().join("app.log.202406")
        );

        clock.advance(chrono::Duration::days(20));
        writer.rotate_now().unwrap();
        assert_eq!(writer.rotation_count(), 1);

        clock.advance(chrono::Duration::days(20));
        writer.rotate_now().unwrap();
        assert_eq!(
            writer.current_path().unwrap(),
            dir.path().join("app.log.202407")
        );
        assert_eq!(writer.rotation_count(), 2);
    }

    #[test]
    fn test_size_rotation() {
        let dir = TempDir::new().unwrap();
        let (writer, clock) = open(&dir, 10, 0);
        let first = writer.current_path().unwrap();

        clock.advance(chrono::Duration::seconds(1));
        assert_eq!(writer.append(b"aaaa").unwrap(), 4);
        assert_eq!(writer.append(b"bbbb").unwrap(), 4);
        assert_eq!(writer.current_path().unwrap(), first);
        assert_eq!(writer.current_size(), 8);

        assert_eq!(writer.append(b"cccc").unwrap(), 4);
        let second = writer.current_path().unwrap();
        assert_ne!(second, first);
        assert_eq!(writer.current_size(), 0);
        assert_eq!(writer.rotation_count(), 2);
        assert_eq!(fs::read_to_string(&first).unwrap(), "aaaabbbbcccc");
    }

    #[test]
    fn test_size_rotation_within_same_second_keeps_file() {
        let dir = TempDir::new().unwrap();
        let (writer, _clock) = open(&dir, 4, 0);
        let first = writer.current_path().unwrap();

        writer.append(b"12345").unwrap();
        assert_eq!(writer.current_path().unwrap(), first);
        assert_eq!(writer.rotation_count(), 1);
        assert_eq!(writer.current_size(), 5);
    }

    #[test]
    fn test_rotate_now_same_window_is_noop() {
        let dir = TempDir::new().unwrap();
        let (writer, clock) = open(&dir, 0, 0);

        clock.advance(chrono::Duration::seconds(1));
        writer.rotate_now().unwrap();
        writer.rotate_now().unwrap();
        assert_eq!(writer.rotation_count(), 2);
    }

    #[test]
    fn test_resume_counts_existing_bytes() {
        let dir = TempDir::new().unwrap();
        let existing = dir.path().join("app.log.20240601.120000");
        fs::write(&existing, b"0123456").unwrap();

        let (writer, _clock) = open(&dir, 10, 0);
        assert_eq!(writer.current_path().unwrap(), existing);
        assert_eq!(writer.current_size(), 7);

        writer.append(b"789").unwrap();
        assert_eq!(writer.current_size(), 10);
        assert_eq!(fs::read_to_string(&existing).unwrap(), "0123456789");
    }

    #[test]
    fn test_write_after_close() {
        let dir = TempDir::new().unwrap();
        let (writer, _clock) = open(&dir, 0, 0);
        let path = writer.current_path().unwrap();

        writer.close().unwrap();
        assert!(writer.is_closed());
        let err = writer.append(b"late").unwrap_err();
        assert!(matches!(err, Error::InvalidState));
        assert_eq!(err.bytes_written(), 0);
        assert_eq!(fs::read(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_close_twice() {
        let dir = TempDir::new().unwrap();
        let (writer, _clock) = open(&dir, 0, 0);
        writer.close().unwrap();
        writer.close().unwrap();
        assert!(matches!(writer.rotate_now(), Err(Error::InvalidState)));
    }

    #[test]
    fn test_failed_rotation_leaves_writer_closed() {
        let dir = TempDir::new().unwrap();
        let logs = dir.path().join("logs");
        fs::create_dir(&logs).unwrap();

        let clock = Arc::new(ManualClock::new(start()));
        let config = RotationConfig::fine(logs.join("app.log"), 0, 4, 0);
        let writer = RotatingWriter::open_with_clock(config, clock.clone()).unwrap();

        fs::remove_dir_all(&logs).unwrap();
        clock.advance(chrono::Duration::seconds(1));

        let err = writer.append(b"12345").unwrap_err();
        assert!(matches!(err, Error::Rotate { written: 5, .. }));
        assert!(writer.is_closed());
        assert!(matches!(writer.append(b"x"), Err(Error::InvalidState)));
        writer.close().unwrap();
    }

    #[test]
    fn test_rotation_triggers_purge() {
        let dir = TempDir::new().unwrap();
        let (writer, clock) = open(&dir, 1, 2);

        for _ in 0..4 {
            clock.advance(chrono::Duration::seconds(1));
            writer.append(b"xx").unwrap();
        }
        writer.wait_purges();

        let remaining = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(remaining, 2);
        assert!(writer.current_path().unwrap().exists());
    }
}
