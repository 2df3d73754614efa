//! Error types for svg-tiler.
//!
//! Every failure in the pipeline degrades to "no-op, optionally notify":
//! callers keep their last good state when one of these comes back.
//!
//! Exporting before a document is loaded is deliberately *not* an error;
//! exporters return `Ok(None)` for that case.

use thiserror::Error;

/// Errors produced by loading, rendering and exporting.
#[derive(Error, Debug)]
pub enum TilerError {
    /// The default asset (or a file on disk) could not be read.
    #[error("Failed to load {path}: {reason}")]
    LoadFailure { path: String, reason: String },

    /// An uploaded file was not declared as an SVG image.
    #[error("Please upload a valid SVG file (got {mime})")]
    InvalidFormat { mime: String },

    /// The text is not a usable SVG document.
    #[error("SVG parse error: {0}")]
    Parse(String),

    /// The composed surface could not be rasterized.
    #[error("Render error: {0}")]
    Render(String),

    /// An artifact could not be encoded.
    #[error("Encode error: {0}")]
    Encode(String),

    /// A configuration file was unreadable or malformed.
    #[error("Config error: {0}")]
    Config(String),

    /// A background export task stopped without reporting a result.
    #[error("Export task failed: {0}")]
    TaskFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, TilerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_format_message_names_the_mime() {
        let err = TilerError::InvalidFormat { mime: "image/png".to_string() };
        assert_eq!(err.to_string(), "Please upload a valid SVG file (got image/png)");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: TilerError = io.into();
        assert!(matches!(err, TilerError::Io(_)));
    }
}
