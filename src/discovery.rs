//! Document discovery.
//!
//! A *document* is any regular file under the notes root whose name ends in
//! [`DOCUMENT_EXTENSION`] and is not the viewer entry point ([`ENTRY_POINT`]).
//! Every caller that needs to know "is this a note" goes through
//! [`is_document`], so the build and the dev server can never disagree.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// File name suffix that marks a document.
pub const DOCUMENT_EXTENSION: &str = ".html";
/// Reserved name of the viewer entry page; never a document.
pub const ENTRY_POINT: &str = "index.html";
/// Shared stylesheet that documents link to.
pub const STYLESHEET: &str = "style.css";
/// File name of the manifest written into the publish directory.
pub const MANIFEST_FILE: &str = "files.json";

/// Returns true if a file with this name is a publishable document.
pub fn is_document(file_name: &str) -> bool {
    file_name.ends_with(DOCUMENT_EXTENSION) && file_name != ENTRY_POINT
}

/// Path form of [`is_document`]; non-UTF-8 names are never documents.
pub fn is_document_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(is_document)
}

/// A document location relative to the notes root, always `/`-separated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DocumentPath(String);

impl DocumentPath {
    /// Normalize a root-relative path. Returns `None` for paths that escape
    /// the root, are absolute, or contain non-UTF-8 components.
    pub fn from_relative(rel: &Path) -> Option<Self> {
        let mut parts = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str()?),
                Component::CurDir => {}
                _ => return None,
            }
        }
        if parts.is_empty() {
            return None;
        }
        Some(Self(parts.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve this document under `base`, using the platform separator.
    pub fn under(&self, base: &Path) -> PathBuf {
        self.0.split('/').fold(base.to_path_buf(), |acc, part| acc.join(part))
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one scan of the notes root.
///
/// `documents` is in walk order; call [`Discovery::manifest`] for the
/// deterministic ordering.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub root: PathBuf,
    pub documents: Vec<DocumentPath>,
    /// Absolute location of the shared stylesheet, if the root has one.
    pub stylesheet: Option<PathBuf>,
}

impl Discovery {
    fn empty(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            documents: Vec::new(),
            stylesheet: None,
        }
    }

    /// Location of a discovered document in the source tree.
    pub fn source_path(&self, document: &DocumentPath) -> PathBuf {
        document.under(&self.root)
    }

    pub fn manifest(&self) -> Manifest {
        Manifest::new(self.documents.clone())
    }
}

/// Scan `root`, failing if it does not exist or cannot be read.
///
/// Unreadable entries below the root are logged and skipped.
pub fn discover(root: &Path) -> Result<Discovery> {
    if !root.exists() {
        return Err(Error::MissingRoot {
            candidates: vec![root.to_path_buf()],
        });
    }
    if !root.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }

    let mut discovery = Discovery::empty(root);

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(Error::Walk(e)),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_document_path(entry.path()) {
            continue;
        }

        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        match DocumentPath::from_relative(rel) {
            Some(doc) => discovery.documents.push(doc),
            None => tracing::warn!("Skipping non-UTF-8 path: {}", entry.path().display()),
        }
    }

    let stylesheet = root.join(STYLESHEET);
    if stylesheet.is_file() {
        discovery.stylesheet = Some(stylesheet);
    }

    Ok(discovery)
}

/// Scan `root`, yielding an empty result instead of an error.
///
/// Used by the dev server, where a vanished notes directory simply means
/// there is nothing to list.
pub fn discover_or_empty(root: &Path) -> Discovery {
    match discover(root) {
        Ok(discovery) => discovery,
        Err(Error::MissingRoot { .. }) => Discovery::empty(root),
        Err(e) => {
            tracing::warn!("Discovery failed, serving empty list: {}", e);
            Discovery::empty(root)
        }
    }
}

/// Sorted, de-duplicated list of documents, serialized as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Manifest(Vec<DocumentPath>);

impl Manifest {
    pub fn new(mut documents: Vec<DocumentPath>) -> Self {
        documents.sort();
        documents.dedup();
        Self(documents)
    }

    pub fn documents(&self) -> &[DocumentPath] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0
            .binary_search_by(|doc| doc.as_str().cmp(path))
            .is_ok()
    }

    /// The on-disk form: two-space indentation, non-ASCII left literal.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The form served by the dev server's dynamic listing.
    pub fn to_compact_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
