//! File names derived from the base path and layout

use chrono::NaiveDateTime;
use logrotor_core::{Layout, Result, RotationConfig};
use std::path::{Path, PathBuf};

/// Naming scheme `<base_path><stamp>` for one writer
#[derive(Debug, Clone)]
pub(crate) struct LogName {
    dir: PathBuf,
    prefix: String,
    layout: Layout,
}

impl LogName {
    pub fn new(config: &RotationConfig, layout: Layout) -> Result<Self> {
        let (dir, prefix) = config.split_base()?;
        Ok(Self {
            dir,
            prefix,
            layout,
        })
    }

    /// Path of the file that should be active at `at`
    pub fn path_at(&self, at: NaiveDateTime) -> Result<PathBuf> {
        let stamp = self.layout.format(at)?;
        Ok(self.dir.join(format!("{}{}", self.prefix, stamp)))
    }

    /// Directory entries are resolved against this path
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Directory to list when looking for rotated files
    pub fn scan_dir(&self) -> &Path {
        if self.dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            &self.dir
        }
    }

    /// True if `file_name` is `<prefix><stamp>` with a stamp the layout accepts
    pub fn is_rotated(&self, file_name: &str) -> bool {
        file_name
            .strip_prefix(self.prefix.as_str())
            .is_some_and(|stamp| self.layout.matches(stamp))
    }
}
