use crate::error::{DocsError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// Opaque identifier naming one document (e.g. `"introduction"`).
///
/// Identifiers are supplied by the navigation layer and never change once
/// issued. Only emptiness and control characters are rejected up front;
/// sources apply their own stricter rules (see [`DocumentId::is_path_safe`]).
///
/// # Examples
///
/// ```
/// use learngl_core::source::DocumentId;
///
/// let id = DocumentId::new("introduction").unwrap();
/// assert_eq!(id.as_str(), "introduction");
/// assert!(DocumentId::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Creates a new identifier.
    ///
    /// # Errors
    ///
    /// Returns `DocsError::InvalidIdentifier` if `id` is empty or contains
    /// control characters.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id.chars().any(char::is_control) {
            return Err(DocsError::InvalidIdentifier(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Percent-encoded form, safe to append to a URL path.
    ///
    /// Each `/`-separated segment is encoded on its own, so nested
    /// identifiers such as `getting-started/hello-triangle` keep their path.
    pub fn encoded(&self) -> String {
        self.0
            .split('/')
            .map(urlencoding::encode)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// True if the identifier can be joined onto a directory without
    /// escaping it: no separators, no leading dot, no `..`.
    pub fn is_path_safe(&self) -> bool {
        !self.0.starts_with('.') && !self.0.contains(['/', '\\']) && !self.0.contains("..")
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for DocumentId {
    type Err = DocsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Anything that can produce the raw text of a document.
///
/// Implementations must report every failure (unreachable resource,
/// non-success status, undecodable body) as an error and never return
/// partial content.
///
/// # Examples
///
/// ```
/// use learngl_core::source::{DocumentId, DocumentSource};
/// use async_trait::async_trait;
///
/// struct Fixed;
///
/// #[async_trait]
/// impl DocumentSource for Fixed {
///     async fn fetch(&self, _id: &DocumentId) -> learngl_core::Result<String> {
///         Ok("# Hello".into())
///     }
///
///     fn location(&self, id: &DocumentId) -> String {
///         format!("fixed:{id}")
///     }
/// }
/// ```
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetches the raw document text.
    async fn fetch(&self, id: &DocumentId) -> Result<String>;

    /// Where `id` would be read from, for logs and diagnostics.
    fn location(&self, id: &DocumentId) -> String;
}
