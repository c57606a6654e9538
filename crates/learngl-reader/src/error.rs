use learngl_core::DocsError;
use learngl_mdx::CompileError;
use thiserror::Error;

/// Shown when a document cannot be fetched, whatever the underlying cause.
pub const FETCH_FAILED_MESSAGE: &str = "문서를 불러올 수 없습니다.";

/// Prefix for compile failures; the compiler diagnostic follows it.
pub const COMPILE_FAILED_PREFIX: &str = "MDX 파싱 오류: ";

/// Why a document load ended in the error state.
///
/// # Examples
///
/// ```
/// use learngl_core::DocsError;
/// use learngl_reader::error::LoadError;
///
/// let err = LoadError::from(DocsError::HttpStatus {
///     url: "http://localhost/docs/missing.mdx".into(),
///     status: 404,
/// });
/// assert_eq!(err.user_message(), "문서를 불러올 수 없습니다.");
/// ```
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] DocsError),

    #[error("compile failed: {0}")]
    Compile(#[from] CompileError),

    #[error("compile task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl LoadError {
    /// The message a reader sees in place of the document.
    ///
    /// Fetch failures collapse to one fixed sentence; compile failures keep
    /// the diagnostic so authors can locate the problem.
    pub fn user_message(&self) -> String {
        match self {
            Self::Fetch(_) => FETCH_FAILED_MESSAGE.to_string(),
            Self::Compile(e) => format!("{COMPILE_FAILED_PREFIX}{e}"),
            Self::Task(e) => format!("{COMPILE_FAILED_PREFIX}{e}"),
        }
    }
}

/// Convenience type alias for `Result<T, LoadError>`.
pub type Result<T> = std::result::Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_message_hides_details() {
        let err = LoadError::from(DocsError::Timeout {
            location: "http://localhost/docs/a.mdx".into(),
            secs: 5,
        });
        assert_eq!(err.user_message(), FETCH_FAILED_MESSAGE);
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_compile_message_keeps_diagnostic() {
        let err = LoadError::from(CompileError::UnknownComponent {
            tag: "Quiz".into(),
            line: 7,
        });
        let message = err.user_message();
        assert!(message.starts_with(COMPILE_FAILED_PREFIX));
        assert!(message.contains("Quiz"));
        assert!(message.contains("line 7"));
    }
}
