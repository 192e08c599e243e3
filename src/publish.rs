//! Staging of notes into a publish directory.
//!
//! Layout produced under the publish directory:
//!
//! ```text
//! public/
//! ├── files.json          manifest, sorted
//! ├── index.html          viewer entry page   ┐
//! ├── viewer.js                               ├ copied from the viewer dir
//! ├── viewer.css                              ┘
//! ├── style.css           shared stylesheet (copy 1)
//! └── notes/
//!     ├── style.css       shared stylesheet (copy 2)
//!     └── <relative path of every document>
//! ```
//!
//! Every build is a full re-scan. Individual copy failures are recorded in the
//! [`BuildReport`] and the build carries on.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::{self, Layout};
use crate::discovery::{self, DocumentPath, Manifest, MANIFEST_FILE, STYLESHEET};
use crate::error::{Error, Result};

/// Subdirectory of the publish directory that mirrors the notes root.
pub const NOTES_SUBDIR: &str = "notes";

/// Viewer files copied verbatim into the publish root when present.
pub const VIEWER_FILES: [&str; 3] = ["index.html", "viewer.js", "viewer.css"];

/// A single file that could not be staged.
#[derive(Debug, Clone)]
pub struct CopyFailure {
    pub source: PathBuf,
    pub target: PathBuf,
    pub error: String,
}

/// Outcome of one build pass.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Manifest as written to disk.
    pub manifest: Manifest,
    pub manifest_path: PathBuf,
    /// Stylesheet and viewer files that were copied.
    pub assets: Vec<PathBuf>,
    pub failed: Vec<CopyFailure>,
    /// Staged documents removed because they no longer exist in the source.
    pub pruned: Vec<PathBuf>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    fn record_failure(&mut self, source: PathBuf, target: PathBuf, error: Error) {
        tracing::warn!("Failed to stage {}: {}", source.display(), error);
        self.failed.push(CopyFailure {
            source,
            target,
            error: error.to_string(),
        });
    }
}

#[derive(Debug, Clone)]
pub struct Publisher {
    notes_dir: PathBuf,
    viewer_dir: PathBuf,
    public_dir: PathBuf,
    prune: bool,
}

impl Publisher {
    pub fn new(
        notes_dir: impl Into<PathBuf>,
        viewer_dir: impl Into<PathBuf>,
        public_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            notes_dir: notes_dir.into(),
            viewer_dir: viewer_dir.into(),
            public_dir: public_dir.into(),
            prune: false,
        }
    }

    pub fn from_layout(layout: &Layout) -> Self {
        Self::new(&layout.notes_dir, &layout.viewer_dir, &layout.public_dir)
    }

    /// Remove staged documents that are no longer in the source tree.
    pub fn with_prune(mut self, prune: bool) -> Self {
        self.prune = prune;
        self
    }

    pub fn staged_notes_dir(&self) -> PathBuf {
        self.public_dir.join(NOTES_SUBDIR)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.public_dir.join(MANIFEST_FILE)
    }

    /// Run a full build.
    ///
    /// Fails only if the notes root is missing or unreadable, if the publish
    /// directory sits inside it, or if the publish directory or manifest
    /// cannot be written.
    pub fn build(&self) -> Result<BuildReport> {
        config::ensure_outside_notes(&self.public_dir, &self.notes_dir)?;
        tracing::info!("Scanning notes in {}", self.notes_dir.display());
        let discovery = discovery::discover(&self.notes_dir)?;

        let staged_dir = self.staged_notes_dir();
        fs::create_dir_all(&staged_dir).map_err(|e| Error::io(&staged_dir, e))?;

        let mut report = BuildReport::default();
        let mut staged = Vec::with_capacity(discovery.documents.len());

        for doc in &discovery.documents {
            let source = discovery.source_path(doc);
            let target = doc.under(&staged_dir);
            match copy_file(&source, &target) {
                Ok(()) => {
                    tracing::debug!("Staged {}", doc);
                    staged.push(doc.clone());
                }
                Err(e) => report.record_failure(source, target, e),
            }
        }

        if let Some(stylesheet) = &discovery.stylesheet {
            for target in [staged_dir.join(STYLESHEET), self.public_dir.join(STYLESHEET)] {
                match copy_file(stylesheet, &target) {
                    Ok(()) => report.assets.push(target),
                    Err(e) => report.record_failure(stylesheet.clone(), target, e),
                }
            }
        }

        let manifest = Manifest::new(staged);
        let manifest_path = self.manifest_path();
        let json = manifest.to_pretty_json()?;
        fs::write(&manifest_path, json).map_err(|e| Error::io(&manifest_path, e))?;
        tracing::info!(
            "Wrote {} ({} documents)",
            manifest_path.display(),
            manifest.len()
        );

        for name in VIEWER_FILES {
            let source = self.viewer_dir.join(name);
            if !source.is_file() {
                tracing::debug!("Viewer file {} not present, skipping", source.display());
                continue;
            }
            let target = self.public_dir.join(name);
            match copy_file(&source, &target) {
                Ok(()) => report.assets.push(target),
                Err(e) => report.record_failure(source, target, e),
            }
        }

        if self.prune {
            report.pruned = prune_stale(&staged_dir, &manifest);
        }

        report.manifest = manifest;
        report.manifest_path = manifest_path;
        Ok(report)
    }
}

fn copy_file(source: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::copy(source, target).map_err(|e| Error::io(source, e))?;
    Ok(())
}

/// Delete staged documents missing from `manifest`, then any directories
/// left empty. Returns the removed files.
fn prune_stale(staged_dir: &Path, manifest: &Manifest) -> Vec<PathBuf> {
    let mut removed = Vec::new();

    for entry in WalkDir::new(staged_dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() || !discovery::is_document_path(entry.path()) {
            continue;
        }
        let keep = entry
            .path()
            .strip_prefix(staged_dir)
            .ok()
            .and_then(DocumentPath::from_relative)
            .is_some_and(|doc| manifest.contains(doc.as_str()));
        if keep {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => {
                tracing::info!("Pruned {}", entry.path().display());
                removed.push(entry.path().to_path_buf());
            }
            Err(e) => tracing::warn!("Failed to prune {}: {}", entry.path().display(), e),
        }
    }

    // remove_dir only succeeds on empty directories.
    for entry in WalkDir::new(staged_dir)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_dir() {
            let _ = fs::remove_dir(entry.path());
        }
    }

    removed
}
