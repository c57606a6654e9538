//! Reader front end for the Korean LearnOpenGL translation.
//!
//! Ties the pieces together: documents are fetched through a
//! [`learngl_core::DocumentSource`], compiled by `learngl-mdx` against the
//! [`standard_registry`](components::standard_registry), and published to
//! observers as a [`DocumentState`](document::DocumentState).
//!
//! # Architecture
//!
//! - **config**: JSON configuration with defaults for every field
//! - **document**: observable state and the supersession-aware loader
//! - **components**: the tag set documents may use, including the annotated
//!   inline `code` renderer
//! - **highlight**: syntect highlighting for fenced code
//! - **cli**: the `learngl` command line
//!
//! # Examples
//!
//! ```
//! use learngl_core::FunctionTable;
//! use learngl_mdx::compile;
//! use learngl_reader::standard_registry;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(standard_registry(FunctionTable::builtin()));
//! let html = compile("`int x = 5;`", &registry).unwrap().render_html();
//! assert_eq!(
//!     html,
//!     "<div class=\"paragraph\"><code class=\"inline-code\">int x = 5;</code></div>"
//! );
//! ```

pub mod cli;
pub mod components;
pub mod config;
pub mod document;
pub mod error;
pub mod highlight;

pub use components::{AnnotatedCode, standard_registry};
pub use config::ReaderConfig;
pub use document::{DocumentLoader, DocumentState, LoadSnapshot};
pub use error::{LoadError, Result};
