//! Retention: delete the oldest rotated files beyond the configured count

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::naming::LogName;

/// Outcome of one retention pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PurgeReport {
    /// Entries whose names parse as rotated files
    pub candidates: usize,
    /// Files removed by this pass
    pub deleted: Vec<PathBuf>,
    /// Whether the active file was among the oldest and kept
    pub skipped_live: bool,
    /// Deletions that failed for a reason other than the file being gone
    pub failed: usize,
}

/// Run one retention pass.
///
/// Only names that parse with the layout are considered; anything else
/// sharing the prefix is left alone. `live` is never deleted.
pub(crate) fn purge(naming: &LogName, max_count: usize, live: Option<&Path>) -> PurgeReport {
    let mut report = PurgeReport::default();
    if max_count == 0 {
        return report;
    }

    let entries = match fs::read_dir(naming.scan_dir()) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(
                "Cannot list {} for retention: {}",
                naming.scan_dir().display(),
                e
            );
            return report;
        }
    };

    let mut rotated: Vec<(String, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let file_name = entry.file_name().to_str()?.to_string();
            if naming.is_rotated(&file_name) {
                let path = naming.dir().join(&file_name);
                Some((file_name, path))
            } else {
                None
            }
        })
        .collect();

    report.candidates = rotated.len();
    if rotated.len() <= max_count {
        return report;
    }

    // Name order is age order for zero-padded, most-significant-first layouts
    rotated.sort_by(|a, b| a.0.cmp(&b.0));
    let excess = rotated.len() - max_count;

    let oldest = rotated.into_iter().take(excess).map(|(_, path)| path);
    remove_oldest(oldest, live, &mut report);
    report
}

/// Delete each path except `live`, recording the outcome in `report`.
///
/// A file that is already gone is neither deleted nor failed.
fn remove_oldest<I>(oldest: I, live: Option<&Path>, report: &mut PurgeReport)
where
    I: IntoIterator<Item = PathBuf>,
{
    for path in oldest {
        if live == Some(path.as_path()) {
            report.skipped_live = true;
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Purged rotated log {}", path.display());
                report.deleted.push(path);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!("Failed to purge rotated log {}: {}", path.display(), e);
                report.failed += 1;
            }
        }
    }
}
