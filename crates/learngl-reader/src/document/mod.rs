//! Document management.
//!
//! - `state`: the observable document state and the generation-stamped
//!   snapshot published by the loader
//! - `loader`: fetch, compile and publish, with supersession of stale loads

mod loader;
mod state;

pub use loader::{DocumentLoader, compile_document, fetch_document, load_document};
pub use state::{DocumentState, LoadSnapshot};
