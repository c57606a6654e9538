//! Core abstractions for learngl-reader.
//!
//! This crate provides the pieces shared by the MDX compiler and the reader
//! front end that do not depend on the document syntax itself.
//!
//! # Architecture
//!
//! learngl-core defines:
//! - **Function table**: OpenGL/GLFW metadata embedded in the binary, with
//!   exact and family-based name resolution
//! - **Annotator**: splits inline code into literal runs and function references
//! - **Document sources**: the `DocumentSource` trait plus HTTP (with
//!   ETag/Last-Modified revalidation) and filesystem implementations
//! - **Error Types**: `DocsError` and the crate `Result` alias
//!
//! # Examples
//!
//! ```
//! use learngl_core::{FunctionAnnotator, FunctionTable};
//!
//! let table = FunctionTable::builtin();
//! let annotation = FunctionAnnotator::new(&table).annotate("glfwGetTime glfwInit");
//!
//! assert_eq!(annotation.segments().len(), 3);
//! assert_eq!(annotation.text(), "glfwGetTime glfwInit");
//! ```

pub mod annotate;
pub mod error;
pub mod fs;
pub mod functions;
pub mod http;
pub mod source;

pub use annotate::{Annotation, AnnotationSegment, FunctionAnnotator};
pub use error::{DocsError, Result};
pub use fs::FileSource;
pub use functions::{FamilyRule, FunctionRecord, FunctionTable, MatchKind, Parameter, Resolution};
pub use http::{CachedResponse, HttpSource, HttpSourceOptions};
pub use source::{DocumentId, DocumentSource};
