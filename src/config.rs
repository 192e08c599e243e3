//! Directory layout and server settings.
//!
//! The default layout mirrors a project where the viewer lives in its own
//! directory next to the notes:
//!
//! ```text
//! project/
//! ├── interview/html-version/   notes root (first existing candidate)
//! └── viewer/                   viewer dir (current directory)
//!     └── public/               publish dir
//! ```
//!
//! Environment variables override the defaults; command-line flags override
//! the environment.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Notes roots tried in order, relative to the project root.
pub const NOTES_CANDIDATES: [&str; 3] = ["interview/html-version", "notes", "src/notes"];

/// Name of the publish directory inside the viewer dir.
pub const PUBLIC_DIR: &str = "public";

const ENV_PROJECT_ROOT: &str = "NOTES_VIEWER_PROJECT_ROOT";
const ENV_NOTES_DIR: &str = "NOTES_VIEWER_NOTES_DIR";
const ENV_VIEWER_DIR: &str = "NOTES_VIEWER_VIEWER_DIR";
const ENV_PUBLIC_DIR: &str = "NOTES_VIEWER_PUBLIC_DIR";
const ENV_PORT: &str = "NOTES_VIEWER_PORT";

/// Unresolved settings. `None` means "use the default".
#[derive(Debug, Clone)]
pub struct Config {
    pub project_root: Option<PathBuf>,
    /// Explicit notes root; when set it is the only candidate tried.
    pub notes_dir: Option<PathBuf>,
    pub viewer_dir: Option<PathBuf>,
    pub public_dir: Option<PathBuf>,
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_root: None,
            notes_dir: None,
            viewer_dir: None,
            public_dir: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Absolute, resolved directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub project_root: PathBuf,
    pub notes_dir: PathBuf,
    pub viewer_dir: PathBuf,
    pub public_dir: PathBuf,
}

impl Config {
    /// Load configuration from `NOTES_VIEWER_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let port = match var(ENV_PORT) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("Ignoring invalid {}={:?}", ENV_PORT, raw);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        Self {
            project_root: var(ENV_PROJECT_ROOT).map(PathBuf::from),
            notes_dir: var(ENV_NOTES_DIR).map(PathBuf::from),
            viewer_dir: var(ENV_VIEWER_DIR).map(PathBuf::from),
            public_dir: var(ENV_PUBLIC_DIR).map(PathBuf::from),
            port,
            ..Self::default()
        }
    }

    /// Notes roots that [`Config::resolve`] will try, in order.
    pub fn notes_candidates(&self, project_root: &Path, cwd: &Path) -> Vec<PathBuf> {
        match &self.notes_dir {
            Some(dir) => vec![absolute(cwd, dir)],
            None => NOTES_CANDIDATES
                .iter()
                .map(|rel| project_root.join(rel))
                .collect(),
        }
    }

    /// Resolve against the current directory.
    pub fn resolve(&self) -> Result<Layout> {
        let cwd = std::env::current_dir().map_err(|e| Error::io(".", e))?;
        self.resolve_from(&cwd)
    }

    /// Resolve relative paths against `cwd`. Fails with
    /// [`Error::MissingRoot`] listing every candidate if no notes root exists.
    pub fn resolve_from(&self, cwd: &Path) -> Result<Layout> {
        let viewer_dir = self
            .viewer_dir
            .as_deref()
            .map_or_else(|| cwd.to_path_buf(), |dir| absolute(cwd, dir));

        let project_root = match &self.project_root {
            Some(dir) => absolute(cwd, dir),
            None => viewer_dir
                .parent()
                .map_or_else(|| viewer_dir.clone(), Path::to_path_buf),
        };

        let candidates = self.notes_candidates(&project_root, cwd);
        let Some(notes_dir) = candidates.iter().find(|dir| dir.is_dir()).cloned() else {
            return Err(Error::MissingRoot { candidates });
        };

        let public_dir = self
            .public_dir
            .as_deref()
            .map_or_else(|| viewer_dir.join(PUBLIC_DIR), |dir| absolute(cwd, dir));
        ensure_outside_notes(&public_dir, &notes_dir)?;

        Ok(Layout {
            project_root,
            notes_dir,
            viewer_dir,
            public_dir,
        })
    }
}

/// A publish directory under the notes root would be rescanned by the next
/// build and staged into itself.
pub(crate) fn ensure_outside_notes(public_dir: &Path, notes_dir: &Path) -> Result<()> {
    if public_dir.starts_with(notes_dir) {
        return Err(Error::PublishInsideNotes {
            public_dir: public_dir.to_path_buf(),
            notes_dir: notes_dir.to_path_buf(),
        });
    }
    Ok(())
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
