//! Document source backed by a local directory.
//!
//! Used for offline reading and for checking a checkout of the document tree
//! before it is published. Identifiers map to `{root}/{id}{extension}`; any
//! identifier that could escape `root` is rejected before touching the disk.
//!
//! # Limits
//!
//! - File size limit: 10MB (hard)
//! - Files above 1MB are loaded but logged at `warn`
//! - Non-UTF8 files are rejected

use crate::error::{DocsError, Result};
use crate::source::{DocumentId, DocumentSource};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Maximum allowed document size in bytes (10MB).
const MAX_FILE_SIZE: u64 = 10_000_000;

/// Large document warning threshold (1MB). Tutorial pages are rarely above 100KB.
const LARGE_FILE_THRESHOLD: u64 = 1_000_000;

/// Reads documents from `{root}/{id}{extension}`.
///
/// # Examples
///
/// ```no_run
/// use learngl_core::fs::FileSource;
/// use learngl_core::source::{DocumentId, DocumentSource};
///
/// # async fn example() -> learngl_core::Result<()> {
/// let source = FileSource::new("public/docs", ".mdx");
/// let text = source.fetch(&DocumentId::new("introduction")?).await?;
/// println!("Loaded {} bytes", text.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
    extension: String,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a document would be read from.
    ///
    /// # Errors
    ///
    /// Returns `DocsError::InvalidIdentifier` if the identifier is not
    /// path-safe.
    pub fn path_for(&self, id: &DocumentId) -> Result<PathBuf> {
        if !id.is_path_safe() {
            tracing::warn!("Rejecting unsafe document identifier: {:?}", id.as_str());
            return Err(DocsError::InvalidIdentifier(id.as_str().to_string()));
        }
        Ok(self.root.join(format!("{}{}", id.as_str(), self.extension)))
    }
}

fn log_io_error(path: &Path, e: &std::io::Error) {
    match e.kind() {
        ErrorKind::NotFound => tracing::debug!("Document not found: {:?}", path),
        ErrorKind::PermissionDenied => tracing::warn!("Permission denied: {:?}", path),
        _ => tracing::error!("IO error for {:?}: {}", path, e),
    }
}

#[async_trait]
impl DocumentSource for FileSource {
    async fn fetch(&self, id: &DocumentId) -> Result<String> {
        let path = self.path_for(id)?;
        tracing::debug!("Loading document from disk: {:?}", path);

        let metadata = tokio::fs::metadata(&path).await.map_err(|e| {
            log_io_error(&path, &e);
            DocsError::Io(e)
        })?;

        let size = metadata.len();
        if size > MAX_FILE_SIZE {
            tracing::error!(
                "Document exceeds maximum size: {} bytes (limit: {} bytes)",
                size,
                MAX_FILE_SIZE
            );
            return Err(DocsError::TooLarge {
                size,
                max: MAX_FILE_SIZE,
            });
        }
        if size > LARGE_FILE_THRESHOLD {
            tracing::warn!("Document is large: {} bytes for {:?}", size, path);
        }

        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            log_io_error(&path, &e);
            DocsError::Io(e)
        })?;

        let content = String::from_utf8(bytes)
            .map_err(|_| DocsError::InvalidEncoding(path.display().to_string()))?;

        tracing::debug!("Loaded document: {:?} ({} bytes)", path, content.len());
        Ok(content)
    }

    fn location(&self, id: &DocumentId) -> String {
        self.root
            .join(format!("{}{}", id.as_str(), self.extension))
            .display()
            .to_string()
    }
}
