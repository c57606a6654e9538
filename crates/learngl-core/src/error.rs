use thiserror::Error;

/// Core error types for learngl-reader.
///
/// Covers everything that can go wrong while obtaining a document's raw text
/// or loading the function metadata table. Compile failures live in
/// `learngl-mdx` and are not represented here.
///
/// # Examples
///
/// ```
/// use learngl_core::error::{DocsError, Result};
///
/// fn check_id(id: &str) -> Result<()> {
///     if id.is_empty() {
///         return Err(DocsError::InvalidIdentifier(id.into()));
///     }
///     Ok(())
/// }
///
/// assert!(check_id("").is_err());
/// ```
#[derive(Error, Debug)]
pub enum DocsError {
    #[error("request failed for {url}: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("request timed out after {secs}s for {location}")]
    Timeout { location: String, secs: u64 },

    #[error("document is not valid UTF-8: {0}")]
    InvalidEncoding(String),

    #[error("document too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    #[error("invalid document identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("invalid function table: {0}")]
    InvalidFunctionTable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for `Result<T, DocsError>`.
pub type Result<T> = std::result::Result<T, DocsError>;
