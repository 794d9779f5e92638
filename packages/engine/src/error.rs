//! Error types for the synchronization engine.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can abort a synchronization run.
///
/// Per-item delete/copy failures are not errors in this sense; they are
/// recorded in the session's failure lists and the run continues.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Source path is not an existing directory.
    #[error("Source is not a directory: {}", path.display())]
    SourceNotADirectory {
        /// The path that was given.
        path: PathBuf,
    },

    /// Destination path is not an existing directory.
    #[error("Destination is not a directory: {}", path.display())]
    DestinationNotADirectory {
        /// The path that was given.
        path: PathBuf,
    },

    /// Failed to read file metadata during scanning.
    #[error("Failed to read metadata for {}: {source}", path.display())]
    Metadata {
        /// The file whose metadata was requested.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
