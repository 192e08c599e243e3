//! Publish a tree of static HTML notes as a browsable collection.
//!
//! - [`discovery`]: walks the notes root and classifies documents.
//! - [`publish`]: stages documents and assets into a publish directory and writes `files.json`.
//! - [`monitor`]: polling-based change detection over document modification times.
//! - [`api`]: the local development server.

pub mod api;
pub mod config;
pub mod discovery;
pub mod error;
pub mod monitor;
pub mod publish;

pub use error::{Error, Result};
