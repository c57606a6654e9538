//! Extension-tag registry.
//!
//! Maps tag names to renderers. Capitalised names are components and a
//! document may only use the ones registered here; lowercase names are
//! intrinsic HTML elements that render as themselves unless overridden.
//!
//! Markdown nodes are routed through the same table under their HTML names
//! (`p`, `pre`, `code`, `a`, `h1`..`h6`, `ul`, `ol`, `li`, ...), so overriding
//! `code` changes how every inline code span renders.

use crate::ast::Attributes;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// What a renderer receives for one tag.
#[derive(Debug, Clone, Copy)]
pub struct TagContext<'a> {
    pub tag: &'a str,
    pub attributes: &'a Attributes,
    /// Children already rendered to HTML.
    pub children: &'a str,
    /// Unescaped source text, when every child is plain text. Always set for
    /// inline code spans and fenced code blocks.
    pub raw_text: Option<&'a str>,
}

/// Renders one tag to HTML.
///
/// Implemented for closures, which keeps one-off overrides short:
///
/// ```
/// use learngl_mdx::{TagContext, TagRegistry, compile};
/// use std::sync::Arc;
///
/// let registry = TagRegistry::new().with("Note", |ctx: &TagContext<'_>, out: &mut String| {
///     out.push_str("<aside>");
///     out.push_str(ctx.children);
///     out.push_str("</aside>");
/// });
///
/// let doc = compile("<Note>hi</Note>", &Arc::new(registry)).unwrap();
/// assert_eq!(doc.render_html(), "<p><aside>hi</aside></p>");
/// ```
pub trait TagRenderer: Send + Sync {
    fn render(&self, ctx: &TagContext<'_>, out: &mut String);
}

impl<F> TagRenderer for F
where
    F: Fn(&TagContext<'_>, &mut String) + Send + Sync,
{
    fn render(&self, ctx: &TagContext<'_>, out: &mut String) {
        self(ctx, out);
    }
}

/// Immutable once built; share it behind an `Arc`.
#[derive(Clone, Default)]
pub struct TagRegistry {
    renderers: HashMap<String, Arc<dyn TagRenderer>>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `renderer` under `name`, replacing any earlier entry.
    pub fn register(&mut self, name: impl Into<String>, renderer: impl TagRenderer + 'static) {
        self.renderers.insert(name.into(), Arc::new(renderer));
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, renderer: impl TagRenderer + 'static) -> Self {
        self.register(name, renderer);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn TagRenderer>> {
        self.renderers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.renderers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.renderers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

impl fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagRegistry")
            .field("tags", &self.names())
            .finish()
    }
}
