use thiserror::Error;

/// Errors produced while compiling a document.
///
/// Every variant carries the 1-based source line where the problem was
/// detected; the `Display` form starts with `line N:` so the message can be
/// shown to a reader as-is.
///
/// # Examples
///
/// ```
/// use learngl_mdx::{CompileError, parse};
///
/// let err = parse("# Title\n\n<Info>\nunclosed\n").unwrap_err();
/// assert_eq!(err, CompileError::UnclosedTag { tag: "Info".into(), line: 3 });
/// assert_eq!(err.to_string(), "line 3: <Info> is never closed");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("line {line}: unterminated code fence")]
    UnterminatedCodeFence { line: usize },

    #[error("line {line}: <{tag}> is never closed")]
    UnclosedTag { tag: String, line: usize },

    #[error("line {line}: expected </{expected}> but found </{found}>")]
    MismatchedClosingTag {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("line {line}: unexpected closing tag </{tag}>")]
    UnexpectedClosingTag { tag: String, line: usize },

    #[error("line {line}: tag is missing its closing '>'")]
    UnterminatedTag { line: usize },

    #[error("line {line}: malformed attribute in <{tag}>: {reason}")]
    MalformedAttribute {
        tag: String,
        line: usize,
        reason: String,
    },

    #[error("line {line}: unsupported expression {{{expression}}}")]
    UnsupportedExpression { expression: String, line: usize },

    #[error("line {line}: unterminated expression")]
    UnterminatedExpression { line: usize },

    #[error("line {line}: `{keyword}` statements are not supported")]
    UnsupportedStatement { keyword: String, line: usize },

    #[error("line {line}: unknown component <{tag}>")]
    UnknownComponent { tag: String, line: usize },
}

impl CompileError {
    /// 1-based source line of the error.
    pub fn line(&self) -> usize {
        match self {
            Self::UnterminatedCodeFence { line }
            | Self::UnclosedTag { line, .. }
            | Self::MismatchedClosingTag { line, .. }
            | Self::UnexpectedClosingTag { line, .. }
            | Self::UnterminatedTag { line }
            | Self::MalformedAttribute { line, .. }
            | Self::UnsupportedExpression { line, .. }
            | Self::UnterminatedExpression { line }
            | Self::UnsupportedStatement { line, .. }
            | Self::UnknownComponent { line, .. } => *line,
        }
    }
}

/// Convenience type alias for `Result<T, CompileError>`.
pub type Result<T> = std::result::Result<T, CompileError>;
