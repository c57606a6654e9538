//! MDX compiler for learngl-reader.
//!
//! Turns Markdown-with-components documents into a tree of blocks and
//! inlines, checks every component tag against a [`TagRegistry`], and
//! renders the result to HTML through the registry.
//!
//! Documents are never evaluated as code: JSX attributes accept only string,
//! boolean and JSON literal values, and `{expressions}`, `import` and
//! `export` are compile errors.
//!
//! # Examples
//!
//! ```
//! use learngl_mdx::{TagContext, TagRegistry, compile};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(TagRegistry::new().with(
//!     "Info",
//!     |ctx: &TagContext<'_>, out: &mut String| {
//!         out.push_str("<div class=\"info\">");
//!         out.push_str(ctx.children);
//!         out.push_str("</div>");
//!     },
//! ));
//!
//! let doc = compile("## 참고\n\n<Info>\n`glClear`를 사용합니다.\n</Info>\n", &registry).unwrap();
//! assert_eq!(
//!     doc.render_html(),
//!     "<h2>참고</h2>\n<div class=\"info\"><p><code>glClear</code>를 사용합니다.</p></div>"
//! );
//! ```

pub mod ast;
pub mod compile;
pub mod error;
mod markdown;
pub mod parser;
pub mod registry;
pub mod render;
mod tag;

pub use ast::{Alignment, AttributeValue, Attributes, Block, Document, Element, Inline};
pub use compile::{CompiledDocument, compile};
pub use error::{CompileError, Result};
pub use parser::parse;
pub use registry::{TagContext, TagRenderer, TagRegistry};
pub use render::{escape_html, push_attribute, push_attributes, push_escaped, render_intrinsic};
