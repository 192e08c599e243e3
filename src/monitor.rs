//! Polling-based change detection.
//!
//! [`ChangeMonitor`] remembers the last modification time it saw for every
//! document. Each [`ChangeMonitor::check_for_changes`] call stats every
//! document once and reports whether any known one moved. The first sighting
//! of a path only records it, so the first call after startup never reports
//! a change.
//!
//! Paths are never dropped from the baseline. A deleted document is simply no
//! longer visited; if it reappears with a different timestamp that counts as
//! a change.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, UNIX_EPOCH};

use crate::discovery;

#[derive(Debug, Default)]
pub struct ChangeMonitor {
    baseline: Mutex<HashMap<PathBuf, Duration>>,
}

impl ChangeMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stat every document under `root` and compare against the baseline.
    ///
    /// Returns true if at least one previously seen document has a new
    /// modification time. The baseline is updated either way. A missing root
    /// is treated as an empty tree.
    pub fn check_for_changes(&self, root: &Path) -> bool {
        let discovery = discovery::discover_or_empty(root);
        let mut baseline = self.baseline.lock().unwrap_or_else(PoisonError::into_inner);
        let mut changed = false;

        for doc in &discovery.documents {
            let path = discovery.source_path(doc);
            let mtime = modification_time(&path);

            match baseline.get_mut(&path) {
                None => {
                    baseline.insert(path, mtime);
                }
                Some(seen) if *seen != mtime => {
                    tracing::debug!("Changed: {}", doc);
                    *seen = mtime;
                    changed = true;
                }
                Some(_) => {}
            }
        }

        changed
    }

    /// Number of paths in the baseline.
    pub fn tracked(&self) -> usize {
        self.baseline
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Modification time since the epoch, or zero if it cannot be read.
fn modification_time(path: &Path) -> Duration {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn unreadable_timestamp_is_zero() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(modification_time(&tmp.path().join("missing.html")), Duration::ZERO);
    }

    #[test]
    fn missing_root_is_an_empty_tree() {
        let tmp = TempDir::new().unwrap();
        let monitor = ChangeMonitor::new();
        assert!(!monitor.check_for_changes(&tmp.path().join("nope")));
        assert_eq!(monitor.tracked(), 0);
    }

    #[test]
    fn ignores_non_documents() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.html"), "entry").unwrap();
        fs::write(tmp.path().join("style.css"), "css").unwrap();
        fs::write(tmp.path().join("a.html"), "a").unwrap();

        let monitor = ChangeMonitor::new();
        monitor.check_for_changes(tmp.path());

        assert_eq!(monitor.tracked(), 1);
    }
}
