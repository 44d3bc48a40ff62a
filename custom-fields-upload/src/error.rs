//! Error types for upload widget rendering

use thiserror::Error;

/// Result type for upload widget rendering
pub type Result<T> = std::result::Result<T, UploadError>;

#[derive(Debug, Error)]
pub enum UploadError {
    /// The widget template failed to parse
    #[error("template parse error: {0}")]
    Parse(String),

    /// The widget template failed to render
    #[error("template render error: {0}")]
    Render(String),
}
