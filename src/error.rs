use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while discovering or publishing notes.
#[derive(Debug, Error)]
pub enum Error {
    #[error("notes directory not found, tried: {}", display_candidates(.candidates))]
    MissingRoot { candidates: Vec<PathBuf> },

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("publish directory {} is inside the notes root {}", .public_dir.display(), .notes_dir.display())]
    PublishInsideNotes {
        public_dir: PathBuf,
        notes_dir: PathBuf,
    },

    #[error("failed to walk notes directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize manifest: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn display_candidates(candidates: &[PathBuf]) -> String {
    candidates
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
