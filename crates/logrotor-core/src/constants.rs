//! Constants and default values for logrotor

/// Coarse daily layout: `<base>.20240131`
pub const DAILY_LAYOUT: &str = ".%Y%m%d";

/// Fine-grained layout: `<base>.20240131.235959`
pub const FINE_LAYOUT: &str = ".%Y%m%d.%H%M%S";

/// Rotation interval paired with the daily layout
pub const DAILY_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Permission bits for newly created log files (unix only)
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Thread name of the time-based rotation loop
pub const SCHEDULER_THREAD_NAME: &str = "logrotor-scheduler";

/// Thread name of a retention pass
pub const PURGE_THREAD_NAME: &str = "logrotor-purge";
