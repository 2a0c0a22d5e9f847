//! Errors that abort loading a rule catalog.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal error while loading rule sources. No partial catalog survives it.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A rule-source path does not exist.
    #[error("rule source not found: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// A rule-source path exists but could not be read.
    #[error("cannot read rule source {}: {source}", path.display())]
    Io {
        /// The unreadable path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A rule source is not valid YAML/JSON or does not match the
    /// rule-source shape.
    #[error("invalid rule source {source_name}: {reason}")]
    Parse {
        /// File name, with the document index for multi-document files.
        source_name: String,
        /// Parser or deserializer message.
        reason: String,
    },
}
