//! The `learngl` command line.

use crate::components::standard_registry;
use crate::config::ReaderConfig;
use crate::document::{DocumentLoader, DocumentState, load_document};
use clap::{Parser, Subcommand};
use futures::stream::{self, StreamExt};
use learngl_core::{DocsError, DocumentId, DocumentSource, FunctionAnnotator, FunctionTable};
use learngl_mdx::TagRegistry;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    name = "learngl",
    version,
    about = "Render and check LearnOpenGL Korean tutorial documents"
)]
pub struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Fetch documents from this server (overrides the config file)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Read documents from this directory instead of over HTTP
    #[arg(long, global = true)]
    pub docs_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load one document and print its HTML
    Render { id: String },

    /// Load and compile documents concurrently, reporting each result
    Check {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Print the function references found in a piece of code as JSON
    Annotate { text: String },

    /// List the functions in the metadata table
    Functions,
}

/// What a command produced. `output` goes to stdout, `diagnostics` to stderr.
#[derive(Debug, Default)]
pub struct Outcome {
    pub output: String,
    pub diagnostics: String,
    pub success: bool,
}

impl Outcome {
    fn ok(output: String) -> Self {
        Self {
            output,
            diagnostics: String::new(),
            success: true,
        }
    }
}

impl Cli {
    /// Reads the config file (if any) and applies command-line overrides.
    ///
    /// # Errors
    ///
    /// Errors from reading or parsing the config file.
    pub async fn resolve_config(&self) -> Result<ReaderConfig, DocsError> {
        let mut config = match &self.config {
            Some(path) => ReaderConfig::load(path).await?,
            None => ReaderConfig::default(),
        };
        if let Some(base_url) = &self.base_url {
            config.source.base_url.clone_from(base_url);
            config.source.docs_dir = None;
        }
        if let Some(dir) = &self.docs_dir {
            config.source.docs_dir = Some(dir.clone());
        }
        Ok(config)
    }
}

/// Runs a parsed command line.
///
/// # Errors
///
/// Setup failures: unreadable configuration or function table, an HTTP
/// client that cannot be built, or an invalid document identifier. Document
/// failures are reported through [`Outcome::success`] instead.
pub async fn run(cli: Cli) -> Result<Outcome, DocsError> {
    let config = cli.resolve_config().await?;
    let table = config.functions.load_table().await?;

    match cli.command {
        Command::Render { id } => {
            let id = DocumentId::new(id)?;
            let registry = Arc::new(standard_registry(table));
            render(&config, config.source.build()?, registry, id).await
        }
        Command::Check { ids } => {
            let ids = ids
                .into_iter()
                .map(DocumentId::new)
                .collect::<Result<Vec<_>, _>>()?;
            let registry = Arc::new(standard_registry(table));
            Ok(check(&config, config.source.build()?, registry, ids).await)
        }
        Command::Annotate { text } => annotate(&table, &text),
        Command::Functions => Ok(functions(&table)),
    }
}

async fn render(
    config: &ReaderConfig,
    source: Arc<dyn DocumentSource>,
    registry: Arc<TagRegistry>,
    id: DocumentId,
) -> Result<Outcome, DocsError> {
    let loader =
        DocumentLoader::new(source, registry).with_fetch_timeout(config.loader.fetch_timeout());
    let task = loader.load(id.clone());
    if let Err(e) = task.await {
        tracing::error!("Load task failed: {}", e);
    }

    let snapshot = loader.snapshot();
    if let Some(elapsed) = snapshot.load_time {
        tracing::info!(
            "Loaded '{}' in {:?} ({})",
            id,
            elapsed,
            snapshot.state.label()
        );
    }

    Ok(match snapshot.state {
        DocumentState::Ready(document) => {
            let mut output = document.render_html();
            output.push('\n');
            Outcome::ok(output)
        }
        DocumentState::Error(message) => Outcome {
            output: String::new(),
            diagnostics: format!("{message}\n"),
            success: false,
        },
        other => Outcome {
            output: String::new(),
            diagnostics: format!("unexpected state: {}\n", other.label()),
            success: false,
        },
    })
}

async fn check(
    config: &ReaderConfig,
    source: Arc<dyn DocumentSource>,
    registry: Arc<TagRegistry>,
    ids: Vec<DocumentId>,
) -> Outcome {
    let timeout = config.loader.fetch_timeout();
    let total = ids.len();

    let mut results: Vec<_> = stream::iter(ids.into_iter().enumerate())
        .map(|(index, id)| {
            let source = Arc::clone(&source);
            let registry = Arc::clone(&registry);
            async move {
                let result = load_document(source.as_ref(), &registry, &id, timeout).await;
                (index, id, result)
            }
        })
        .buffer_unordered(config.loader.check_concurrency)
        .collect()
        .await;
    results.sort_by_key(|(index, _, _)| *index);

    let mut outcome = Outcome::ok(String::new());
    let mut failed = 0;
    for (_, id, result) in results {
        match result {
            Ok(_) => {
                let _ = writeln!(outcome.output, "ok     {id}");
            }
            Err(e) => {
                failed += 1;
                tracing::warn!("Check failed for '{}': {}", id, e);
                let _ = writeln!(outcome.output, "error  {id}: {}", e.user_message());
            }
        }
    }
    let _ = writeln!(outcome.output, "{total} checked, {failed} failed");
    outcome.success = failed == 0;
    outcome
}

fn annotate(table: &FunctionTable, text: &str) -> Result<Outcome, DocsError> {
    let annotation = FunctionAnnotator::new(table).annotate(text);
    let mut output = serde_json::to_string_pretty(&annotation)?;
    output.push('\n');
    Ok(Outcome::ok(output))
}

fn functions(table: &FunctionTable) -> Outcome {
    let mut output = String::new();
    for name in table.names() {
        output.push_str(name);
        output.push('\n');
    }
    Outcome::ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("learngl").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_render() {
        let cli = parse(&["render", "hello-triangle", "--docs-dir", "/srv/docs"]);
        assert!(matches!(cli.command, Command::Render { ref id } if id == "hello-triangle"));
        assert_eq!(cli.docs_dir, Some(PathBuf::from("/srv/docs")));
    }

    #[test]
    fn test_check_requires_ids() {
        assert!(Cli::try_parse_from(["learngl", "check"]).is_err());
        let cli = parse(&["check", "a", "b"]);
        assert!(matches!(cli.command, Command::Check { ref ids } if ids.len() == 2));
    }

    #[tokio::test]
    async fn test_base_url_overrides_docs_dir() {
        let cli = parse(&["--base-url", "http://example.com", "functions"]);
        let config = cli.resolve_config().await.unwrap();
        assert_eq!(config.source.base_url, "http://example.com");
        assert!(config.source.docs_dir.is_none());
    }

    #[tokio::test]
    async fn test_functions_lists_sorted_names() {
        let outcome = run(parse(&["functions"])).await.unwrap();
        assert!(outcome.success);
        let names: Vec<&str> = outcome.output.lines().collect();
        assert!(names.contains(&"glGenTextures"));
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[tokio::test]
    async fn test_annotate_json() {
        let outcome = run(parse(&["annotate", "glfwGetTime glfwInit"])).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&outcome.output).unwrap();
        let segments = json["segments"].as_array().unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0]["kind"], "reference");
        assert_eq!(segments[0]["token"], "glfwGetTime");
        assert_eq!(segments[1]["kind"], "literal");
        assert_eq!(segments[1]["text"], " ");
        assert_eq!(segments[2]["record"]["name"], "glfwInit");
    }

    #[tokio::test]
    async fn test_invalid_id_is_setup_error() {
        let err = run(parse(&["render", "bad\tid"])).await.unwrap_err();
        assert!(matches!(err, DocsError::InvalidIdentifier(_)));
    }
}
