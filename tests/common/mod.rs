//! Shared fixtures for integration specs.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Write `contents` to `root/rel`, creating parent directories.
pub fn write(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = rel.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(&path, contents).expect("Failed to write fixture");
    path
}

/// The tree used throughout the specs: two notes, the entry page and the
/// shared stylesheet.
pub fn sample_notes(root: &Path) {
    write(root, "a/x.html", "<h1>x</h1>");
    write(root, "b/y.html", "<h1>y</h1>");
    write(root, "index.html", "<html>entry</html>");
    write(root, "style.css", "body { margin: 0 }");
}
