use learngl_core::DocumentId;
use learngl_mdx::CompiledDocument;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What a reader currently sees for the requested document.
///
/// Exactly one variant is active. `Ready` and `Error` are terminal for the
/// request that produced them; a new request starts over at `Loading`.
///
/// # Examples
///
/// ```
/// use learngl_reader::document::DocumentState;
///
/// let state = DocumentState::default();
/// assert!(matches!(state, DocumentState::Idle));
/// assert_eq!(state.label(), "idle");
/// ```
#[derive(Debug, Clone, Default)]
pub enum DocumentState {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// Fetching or compiling; no content for the current identifier.
    Loading,
    /// Fetch or compile failed. Holds the message shown to the reader.
    Error(String),
    /// Compiled and ready to render.
    Ready(Arc<CompiledDocument>),
}

impl DocumentState {
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// True once the current request has finished, successfully or not.
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Error(_) | Self::Ready(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn document(&self) -> Option<&Arc<CompiledDocument>> {
        match self {
            Self::Ready(document) => Some(document),
            _ => None,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Error(_) => "error",
            Self::Ready(_) => "ready",
        }
    }
}

/// The value carried by the loader's watch channel.
///
/// `generation` increases with every request; a load may only publish a
/// result while its generation is still the current one.
#[derive(Debug, Clone, Default)]
pub struct LoadSnapshot {
    pub generation: u64,
    pub id: Option<DocumentId>,
    pub state: DocumentState,
    /// When the current request entered `Loading`, cleared once it settles.
    pub loading_started_at: Option<Instant>,
    /// How long the last settled request took from `begin` to `publish`.
    pub load_time: Option<Duration>,
}

impl LoadSnapshot {
    /// Starts a new request: bumps the generation and resets to `Loading`.
    ///
    /// Returns the generation the request must present when publishing.
    ///
    /// # Examples
    ///
    /// ```
    /// use learngl_core::DocumentId;
    /// use learngl_reader::document::LoadSnapshot;
    ///
    /// let mut snapshot = LoadSnapshot::default();
    /// let generation = snapshot.begin(DocumentId::new("intro").unwrap());
    /// assert_eq!(generation, 1);
    /// assert!(snapshot.state.is_loading());
    /// assert!(snapshot.loading_started_at.is_some());
    /// ```
    pub fn begin(&mut self, id: DocumentId) -> u64 {
        self.generation += 1;
        self.id = Some(id);
        self.state = DocumentState::Loading;
        self.loading_started_at = Some(Instant::now());
        self.load_time = None;
        self.generation
    }

    pub const fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Stores `state` if `generation` is still current.
    ///
    /// Returns whether anything changed; results from superseded requests
    /// are dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use learngl_core::DocumentId;
    /// use learngl_reader::document::{DocumentState, LoadSnapshot};
    ///
    /// let mut snapshot = LoadSnapshot::default();
    /// let first = snapshot.begin(DocumentId::new("a").unwrap());
    /// let second = snapshot.begin(DocumentId::new("b").unwrap());
    ///
    /// assert!(!snapshot.publish(first, DocumentState::Error("late".into())));
    /// assert!(snapshot.state.is_loading());
    ///
    /// assert!(snapshot.publish(second, DocumentState::Error("x".into())));
    /// assert_eq!(snapshot.state.error(), Some("x"));
    /// ```
    pub fn publish(&mut self, generation: u64, state: DocumentState) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.state = state;
        self.load_time = self.loading_duration();
        self.loading_started_at = None;
        true
    }

    /// How long the current request has been loading.
    pub fn loading_duration(&self) -> Option<Duration> {
        self.loading_started_at
            .map(|start| Instant::now().duration_since(start))
    }
}
