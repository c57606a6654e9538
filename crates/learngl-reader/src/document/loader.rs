//! Fetch-then-compile pipeline with request supersession.
//!
//! Only the most recent `load` may change what observers see. Earlier loads
//! are not aborted: they run to completion and their results are dropped by
//! the generation check in [`LoadSnapshot::publish`].

use super::state::{DocumentState, LoadSnapshot};
use crate::error::{LoadError, Result};
use learngl_core::{DocsError, DocumentId, DocumentSource};
use learngl_mdx::{CompiledDocument, TagRegistry, compile};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Fetches the raw text of `id`, optionally bounded by `timeout`.
///
/// # Errors
///
/// Whatever the source reports, or `DocsError::Timeout` when the limit
/// elapses first.
pub async fn fetch_document(
    source: &dyn DocumentSource,
    id: &DocumentId,
    timeout: Option<Duration>,
) -> Result<String> {
    let fetch = source.fetch(id);
    let text = match timeout {
        Some(limit) => tokio::time::timeout(limit, fetch).await.map_err(|_| {
            DocsError::Timeout {
                location: source.location(id),
                secs: limit.as_secs(),
            }
        })??,
        None => fetch.await?,
    };
    Ok(text)
}

/// Compiles `text` on the blocking pool.
///
/// # Errors
///
/// The compiler's diagnostic, or `LoadError::Task` if the compile panicked.
pub async fn compile_document(
    text: String,
    registry: &Arc<TagRegistry>,
) -> Result<CompiledDocument> {
    let registry = Arc::clone(registry);
    let compiled = tokio::task::spawn_blocking(move || compile(&text, &registry)).await??;
    Ok(compiled)
}

/// Fetches and compiles one document without touching any shared state.
///
/// # Errors
///
/// See [`fetch_document`] and [`compile_document`].
pub async fn load_document(
    source: &dyn DocumentSource,
    registry: &Arc<TagRegistry>,
    id: &DocumentId,
    timeout: Option<Duration>,
) -> Result<CompiledDocument> {
    let text = fetch_document(source, id, timeout).await?;
    compile_document(text, registry).await
}

/// Loads documents and publishes their state through a watch channel.
///
/// # Examples
///
/// ```
/// use learngl_core::{DocumentId, FileSource};
/// use learngl_mdx::TagRegistry;
/// use learngl_reader::document::{DocumentLoader, DocumentState};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join("intro.mdx"), "# 시작하기").unwrap();
///
/// let loader = DocumentLoader::new(
///     Arc::new(FileSource::new(dir.path(), ".mdx")),
///     Arc::new(TagRegistry::new()),
/// );
///
/// loader.load(DocumentId::new("intro").unwrap());
/// assert!(loader.state().is_loading());
///
/// let state = loader.settled().await;
/// assert_eq!(state.document().unwrap().render_html(), "<h1>시작하기</h1>");
/// # }
/// ```
pub struct DocumentLoader {
    source: Arc<dyn DocumentSource>,
    registry: Arc<TagRegistry>,
    fetch_timeout: Option<Duration>,
    state: Arc<watch::Sender<LoadSnapshot>>,
}

impl DocumentLoader {
    pub fn new(source: Arc<dyn DocumentSource>, registry: Arc<TagRegistry>) -> Self {
        let (state, _) = watch::channel(LoadSnapshot::default());
        Self {
            source,
            registry,
            fetch_timeout: None,
            state: Arc::new(state),
        }
    }

    /// Bounds every fetch by `timeout`. `None` waits indefinitely.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<TagRegistry> {
        &self.registry
    }

    /// A receiver that observes every published state change.
    pub fn subscribe(&self) -> watch::Receiver<LoadSnapshot> {
        self.state.subscribe()
    }

    /// Current state.
    pub fn state(&self) -> DocumentState {
        self.state.borrow().state.clone()
    }

    pub fn snapshot(&self) -> LoadSnapshot {
        self.state.borrow().clone()
    }

    /// Requests `id`.
    ///
    /// The state becomes `Loading` before this returns. The work runs on a
    /// spawned task; the returned handle completes once that task has either
    /// published its result or discovered it was superseded. Dropping the
    /// handle does not cancel the load.
    ///
    /// Must be called from within a tokio runtime.
    pub fn load(&self, id: DocumentId) -> JoinHandle<()> {
        let mut generation = 0;
        self.state
            .send_modify(|snapshot| generation = snapshot.begin(id.clone()));
        tracing::debug!("Loading document '{}' (generation {})", id, generation);

        let task = LoadTask {
            source: Arc::clone(&self.source),
            registry: Arc::clone(&self.registry),
            fetch_timeout: self.fetch_timeout,
            state: Arc::clone(&self.state),
            id,
            generation,
        };
        tokio::spawn(task.run())
    }

    /// Waits until the latest request settles and returns its state.
    ///
    /// Returns immediately with `Idle` if nothing was ever requested.
    pub async fn settled(&self) -> DocumentState {
        let mut rx = self.subscribe();
        let result = rx
            .wait_for(|snapshot| !snapshot.state.is_loading())
            .await
            .map(|snapshot| snapshot.state.clone());
        match result {
            Ok(state) => state,
            Err(_) => self.state(),
        }
    }
}

struct LoadTask {
    source: Arc<dyn DocumentSource>,
    registry: Arc<TagRegistry>,
    fetch_timeout: Option<Duration>,
    state: Arc<watch::Sender<LoadSnapshot>>,
    id: DocumentId,
    generation: u64,
}

impl LoadTask {
    async fn run(self) {
        let text = match fetch_document(self.source.as_ref(), &self.id, self.fetch_timeout).await {
            Ok(text) => text,
            Err(e) => {
                self.fail(&e);
                return;
            }
        };

        if self.is_superseded() {
            tracing::debug!("Dropping fetched '{}': superseded", self.id);
            return;
        }

        match compile_document(text, &self.registry).await {
            Ok(document) => {
                if self.publish(DocumentState::Ready(Arc::new(document))) {
                    tracing::info!("Loaded document '{}'", self.id);
                }
            }
            Err(e) => self.fail(&e),
        }
    }

    fn is_superseded(&self) -> bool {
        !self.state.borrow().is_current(self.generation)
    }

    fn fail(&self, error: &LoadError) {
        if self.publish(DocumentState::Error(error.user_message())) {
            match error {
                LoadError::Fetch(e) => tracing::warn!(
                    "Failed to fetch '{}' from {}: {}",
                    self.id,
                    self.source.location(&self.id),
                    e
                ),
                _ => tracing::warn!("Failed to compile '{}': {}", self.id, error),
            }
        }
    }

    /// Returns whether the state was updated.
    fn publish(&self, state: DocumentState) -> bool {
        let generation = self.generation;
        let published = self
            .state
            .send_if_modified(|snapshot| snapshot.publish(generation, state));
        if !published {
            tracing::debug!(
                "Discarding result for '{}' (generation {}): superseded",
                self.id,
                generation
            );
        }
        published
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Notify;

    struct MemorySource {
        docs: HashMap<&'static str, &'static str>,
    }

    #[async_trait]
    impl DocumentSource for MemorySource {
        async fn fetch(&self, id: &DocumentId) -> learngl_core::Result<String> {
            self.docs
                .get(id.as_str())
                .map(|text| (*text).to_string())
                .ok_or_else(|| DocsError::HttpStatus {
                    url: self.location(id),
                    status: 404,
                })
        }

        fn location(&self, id: &DocumentId) -> String {
            format!("memory:{id}")
        }
    }

    struct NeverSource(Notify);

    #[async_trait]
    impl DocumentSource for NeverSource {
        async fn fetch(&self, _id: &DocumentId) -> learngl_core::Result<String> {
            self.0.notified().await;
            Ok(String::new())
        }

        fn location(&self, id: &DocumentId) -> String {
            format!("never:{id}")
        }
    }

    fn loader(docs: &[(&'static str, &'static str)]) -> DocumentLoader {
        let source = MemorySource {
            docs: docs.iter().copied().collect(),
        };
        DocumentLoader::new(Arc::new(source), Arc::new(TagRegistry::new()))
    }

    fn id(s: &str) -> DocumentId {
        DocumentId::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_initial_state_idle() {
        let loader = loader(&[]);
        assert!(matches!(loader.state(), DocumentState::Idle));
        assert!(matches!(loader.settled().await, DocumentState::Idle));
    }

    #[tokio::test]
    async fn test_load_ready() {
        let loader = loader(&[("intro", "# 소개\n\n본문")]);
        loader.load(id("intro")).await.unwrap();

        let state = loader.state();
        let doc = state.document().expect("ready");
        assert_eq!(doc.render_html(), "<h1>소개</h1>\n<p>본문</p>");
        assert_eq!(loader.snapshot().generation, 1);
        assert!(loader.snapshot().load_time.is_some());
    }

    #[tokio::test]
    async fn test_missing_document() {
        let loader = loader(&[]);
        loader.load(id("missing")).await.unwrap();
        assert_eq!(loader.state().error(), Some("문서를 불러올 수 없습니다."));
    }

    #[tokio::test]
    async fn test_compile_error() {
        let loader = loader(&[("bad", "<Quiz />")]);
        loader.load(id("bad")).await.unwrap();

        let state = loader.state();
        let message = state.error().unwrap();
        assert!(message.starts_with("MDX 파싱 오류: "));
        assert!(message.contains("Quiz"));
        assert!(state.document().is_none());
    }

    #[tokio::test]
    async fn test_loading_is_synchronous() {
        let loader = loader(&[("a", "a")]);
        let mut rx = loader.subscribe();
        let handle = loader.load(id("a"));
        assert!(rx.borrow_and_update().state.is_loading());
        handle.await.unwrap();
        assert!(rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_reload_same_id_starts_fresh() {
        let loader = loader(&[("a", "a")]);
        loader.load(id("a")).await.unwrap();
        let handle = loader.load(id("a"));
        assert!(loader.state().is_loading());
        handle.await.unwrap();
        assert!(loader.state().document().is_some());
        assert_eq!(loader.snapshot().generation, 2);
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let source = NeverSource(Notify::new());
        let loader = DocumentLoader::new(Arc::new(source), Arc::new(TagRegistry::new()))
            .with_fetch_timeout(Some(Duration::from_millis(20)));

        loader.load(id("slow")).await.unwrap();
        assert_eq!(loader.state().error(), Some("문서를 불러올 수 없습니다."));
    }

    #[tokio::test]
    async fn test_fetch_document_timeout_error() {
        let source = NeverSource(Notify::new());
        let err = fetch_document(&source, &id("slow"), Some(Duration::from_millis(10)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::Fetch(DocsError::Timeout { ref location, .. }) if location == "never:slow"
        ));
    }

    #[tokio::test]
    async fn test_load_document_standalone() {
        let source = MemorySource {
            docs: HashMap::from([("a", "*x*")]),
        };
        let registry = Arc::new(TagRegistry::new());
        let doc = load_document(&source, &registry, &id("a"), None)
            .await
            .unwrap();
        assert_eq!(doc.render_html(), "<p><em>x</em></p>");
    }
}
