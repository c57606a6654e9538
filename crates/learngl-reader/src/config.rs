use learngl_core::{
    DocsError, DocumentSource, FileSource, FunctionTable, HttpSource, HttpSourceOptions,
};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Root configuration for the reader.
///
/// Read from a JSON file passed with `--config`; every section and field is
/// optional and falls back to the defaults documented on each struct.
///
/// # Examples
///
/// ```
/// use learngl_reader::config::ReaderConfig;
///
/// let json = r#"{
///     "source": {
///         "base_url": "https://learngl.example",
///         "docs_path": "articles"
///     },
///     "loader": { "fetch_timeout_secs": 15 }
/// }"#;
///
/// let config: ReaderConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.source.docs_path, "/articles/");
/// assert_eq!(config.loader.fetch_timeout_secs, Some(15));
/// assert!(config.source.cache);
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ReaderConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub functions: FunctionsConfig,
}

impl ReaderConfig {
    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// `DocsError::Io` if the file cannot be read, `DocsError::Json` if it is
    /// not a valid configuration.
    pub async fn load(path: &Path) -> Result<Self, DocsError> {
        let text = tokio::fs::read_to_string(path).await?;
        let config = serde_json::from_str(&text)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// Where documents come from.
///
/// Documents are fetched over HTTP unless `docs_dir` is set, in which case
/// they are read from that directory and the HTTP fields are ignored.
///
/// # Defaults
///
/// - `base_url`: `"http://localhost:5173"`
/// - `docs_path`: `"/docs/"` (always normalised to start and end with `/`)
/// - `extension`: `".mdx"` (a missing leading dot is added)
/// - `docs_dir`: none
/// - `cache`: `true` (ETag/Last-Modified revalidation for HTTP)
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(
        default = "default_docs_path",
        deserialize_with = "deserialize_docs_path"
    )]
    pub docs_path: String,
    #[serde(
        default = "default_extension",
        deserialize_with = "deserialize_extension"
    )]
    pub extension: String,
    #[serde(default)]
    pub docs_dir: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub cache: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            docs_path: default_docs_path(),
            extension: default_extension(),
            docs_dir: None,
            cache: true,
        }
    }
}

impl SourceConfig {
    /// Options for an [`HttpSource`] built from this section.
    pub fn http_options(&self) -> HttpSourceOptions {
        HttpSourceOptions {
            base_url: self.base_url.clone(),
            docs_path: self.docs_path.clone(),
            extension: self.extension.clone(),
            cache: self.cache,
        }
    }

    /// Builds the configured document source.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn build(&self) -> Result<Arc<dyn DocumentSource>, DocsError> {
        if let Some(dir) = &self.docs_dir {
            tracing::debug!("Reading documents from {}", dir.display());
            return Ok(Arc::new(FileSource::new(dir.clone(), self.extension.clone())));
        }
        tracing::debug!("Fetching documents from {}{}", self.base_url, self.docs_path);
        Ok(Arc::new(HttpSource::new(self.http_options())?))
    }
}

/// Document loader behaviour.
///
/// # Defaults
///
/// - `fetch_timeout_secs`: none (a fetch that never completes leaves the
///   document loading)
/// - `check_concurrency`: `10` documents in flight for `learngl check`
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    #[serde(default)]
    pub fetch_timeout_secs: Option<u64>,
    #[serde(
        default = "default_check_concurrency",
        deserialize_with = "deserialize_concurrency"
    )]
    pub check_concurrency: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: None,
            check_concurrency: default_check_concurrency(),
        }
    }
}

impl LoaderConfig {
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }
}

/// Function metadata used by the `code` and `Func` components.
///
/// # Defaults
///
/// - `table`: none, meaning the table embedded in the binary
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FunctionsConfig {
    #[serde(default)]
    pub table: Option<PathBuf>,
}

impl FunctionsConfig {
    /// Loads the configured table, or returns the builtin one.
    ///
    /// # Errors
    ///
    /// I/O and parse errors for a configured table file.
    pub async fn load_table(&self) -> Result<Arc<FunctionTable>, DocsError> {
        let Some(path) = &self.table else {
            return Ok(FunctionTable::builtin());
        };
        let text = tokio::fs::read_to_string(path).await?;
        let table = FunctionTable::from_json(&text)?;
        tracing::info!(
            "Loaded {} functions from {}",
            table.len(),
            path.display()
        );
        Ok(Arc::new(table))
    }
}

const fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "http://localhost:5173".to_string()
}

fn default_docs_path() -> String {
    "/docs/".to_string()
}

fn default_extension() -> String {
    ".mdx".to_string()
}

const fn default_check_concurrency() -> usize {
    10
}

/// `docs` / `/docs` / `docs/` all become `/docs/`; an empty path becomes `/`.
fn normalize_docs_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim();
    if trimmed.is_empty() || trimmed.starts_with('.') {
        trimmed.to_string()
    } else {
        format!(".{trimmed}")
    }
}

fn deserialize_docs_path<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let normalized = normalize_docs_path(&raw);
    if normalized != raw {
        tracing::debug!("docs_path '{}' normalized to '{}'", raw, normalized);
    }
    Ok(normalized)
}

fn deserialize_extension<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(normalize_extension(&raw))
}

fn deserialize_concurrency<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = usize::deserialize(deserializer)?;
    if value == 0 {
        tracing::warn!("check_concurrency must be at least 1, using 1");
        return Ok(1);
    }
    Ok(value)
}
