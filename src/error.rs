use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the fallible `try_*` store operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid UTF-8 input: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),

    /// The temporary file was written but could not replace the target.
    #[error("failed to replace {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid key {0:?}")]
    InvalidKey(String),

    #[error("value for `{key}` would not read back unchanged")]
    InvalidValue { key: String },
}
