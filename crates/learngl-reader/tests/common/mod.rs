//! Common test utilities for integration tests.
//!
//! Provides an in-memory document source whose fetches can be held open
//! until a test releases them, which makes request ordering deterministic.

use async_trait::async_trait;
use learngl_core::{DocsError, DocumentId, DocumentSource, FunctionTable};
use learngl_mdx::TagRegistry;
use learngl_reader::standard_registry;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// In-memory source. Unknown identifiers fail like an HTTP 404.
pub(crate) struct GatedSource {
    docs: HashMap<String, String>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    fetches: AtomicUsize,
}

impl GatedSource {
    pub(crate) fn new(docs: &[(&str, &str)]) -> Self {
        Self {
            docs: docs
                .iter()
                .map(|(id, text)| ((*id).to_string(), (*text).to_string()))
                .collect(),
            gates: Mutex::new(HashMap::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Holds fetches of `id` until the returned gate is notified.
    pub(crate) fn gate(&self, id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(id.to_string(), Arc::clone(&gate));
        gate
    }

    #[allow(dead_code)] // Used by loader tests only
    pub(crate) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentSource for GatedSource {
    async fn fetch(&self, id: &DocumentId) -> learngl_core::Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().get(id.as_str()).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.docs
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| DocsError::HttpStatus {
                url: self.location(id),
                status: 404,
            })
    }

    fn location(&self, id: &DocumentId) -> String {
        format!("memory:/docs/{id}.mdx")
    }
}

pub(crate) fn id(s: &str) -> DocumentId {
    DocumentId::new(s).unwrap()
}

pub(crate) fn registry() -> Arc<TagRegistry> {
    Arc::new(standard_registry(FunctionTable::builtin()))
}

#[allow(dead_code)] // Used by CLI tests only
pub(crate) fn write_docs(dir: &Path, docs: &[(&str, &str)]) {
    for (name, text) in docs {
        std::fs::write(dir.join(format!("{name}.mdx")), text).unwrap();
    }
}
