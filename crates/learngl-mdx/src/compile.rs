//! Parse plus tag resolution.

use crate::ast::{Block, Document, Element, Inline};
use crate::error::{CompileError, Result};
use crate::parser::parse;
use crate::registry::TagRegistry;
use crate::render::HtmlRenderer;
use std::sync::Arc;

/// A parsed document whose components all resolve against its registry.
///
/// Rendering cannot fail: every capitalised tag was checked at compile time.
#[derive(Debug, Clone)]
pub struct CompiledDocument {
    document: Document,
    registry: Arc<TagRegistry>,
}

impl CompiledDocument {
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn registry(&self) -> &Arc<TagRegistry> {
        &self.registry
    }

    /// Renders the document to an HTML fragment.
    pub fn render_html(&self) -> String {
        let mut out = String::new();
        HtmlRenderer::new(&self.registry).render_blocks(&self.document.blocks, &mut out);
        out
    }
}

/// Parses `text` and checks every component tag against `registry`.
///
/// # Errors
///
/// Any parse error, or `CompileError::UnknownComponent` for the first
/// capitalised tag (in document order) that is not registered.
///
/// # Examples
///
/// ```
/// use learngl_mdx::{CompileError, TagRegistry, compile};
/// use std::sync::Arc;
///
/// let registry = Arc::new(TagRegistry::new());
/// let err = compile("# 제목\n\n<Quiz />\n", &registry).unwrap_err();
/// assert_eq!(err, CompileError::UnknownComponent { tag: "Quiz".into(), line: 3 });
///
/// let doc = compile("<div>\nok\n</div>", &registry).unwrap();
/// assert_eq!(doc.render_html(), "<div><p>ok</p></div>");
/// ```
pub fn compile(text: &str, registry: &Arc<TagRegistry>) -> Result<CompiledDocument> {
    let document = parse(text)?;
    check_blocks(&document.blocks, registry)?;
    tracing::debug!("Compiled document with {} top-level blocks", document.blocks.len());
    Ok(CompiledDocument {
        document,
        registry: Arc::clone(registry),
    })
}

fn check_element<C>(element: &Element<C>, registry: &TagRegistry) -> Result<()> {
    if element.is_component() && !registry.contains(&element.name) {
        return Err(CompileError::UnknownComponent {
            tag: element.name.clone(),
            line: element.line,
        });
    }
    Ok(())
}

fn check_blocks(blocks: &[Block], registry: &TagRegistry) -> Result<()> {
    for block in blocks {
        match block {
            Block::Heading { content, .. } | Block::Paragraph(content) => {
                check_inlines(content, registry)?;
            }
            Block::List { items, .. } => {
                for item in items {
                    check_blocks(item, registry)?;
                }
            }
            Block::BlockQuote(children) => check_blocks(children, registry)?,
            Block::Table { head, rows, .. } => {
                for cell in head.iter().chain(rows.iter().flatten()) {
                    check_inlines(cell, registry)?;
                }
            }
            Block::Element(element) => {
                check_element(element, registry)?;
                check_blocks(&element.children, registry)?;
            }
            Block::CodeBlock { .. } | Block::ThematicBreak => {}
        }
    }
    Ok(())
}

fn check_inlines(inlines: &[Inline], registry: &TagRegistry) -> Result<()> {
    for inline in inlines {
        match inline {
            Inline::Emphasis(children)
            | Inline::Strong(children)
            | Inline::Strikethrough(children)
            | Inline::Link { children, .. } => {
                check_inlines(children, registry)?;
            }
            Inline::Element(element) => {
                check_element(element, registry)?;
                check_inlines(&element.children, registry)?;
            }
            Inline::Text(_) | Inline::Code(_) | Inline::Image { .. } | Inline::HardBreak => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TagContext;

    fn registry() -> Arc<TagRegistry> {
        Arc::new(
            TagRegistry::new()
                .with("Warning", |ctx: &TagContext<'_>, out: &mut String| {
                    out.push_str("<div class=\"warning\">");
                    out.push_str(ctx.children);
                    out.push_str("</div>");
                })
                .with("Func", |ctx: &TagContext<'_>, out: &mut String| {
                    out.push_str("<span class=\"func\">");
                    out.push_str(ctx.attributes.get_str("name").unwrap_or_default());
                    out.push_str("</span>");
                }),
        )
    }

    #[test]
    fn test_compile_and_render() {
        let doc = compile(
            "<Warning>\n<Func name=\"glClear\" />를 먼저 호출하세요.\n</Warning>",
            &registry(),
        )
        .unwrap();
        assert_eq!(
            doc.render_html(),
            "<div class=\"warning\"><p><span class=\"func\">glClear</span>를 먼저 호출하세요.</p></div>"
        );
    }

    #[test]
    fn test_unknown_block_component() {
        let err = compile("a\n\n<Quiz>\nq\n</Quiz>", &registry()).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownComponent {
                tag: "Quiz".into(),
                line: 3,
            }
        );
    }

    #[test]
    fn test_unknown_component_nested_in_list() {
        let err = compile("- item <Tooltip>x</Tooltip>", &registry()).unwrap_err();
        assert!(matches!(err, CompileError::UnknownComponent { ref tag, line: 1 } if tag == "Tooltip"));
    }

    #[test]
    fn test_unknown_component_inside_emphasis() {
        let err = compile("*<Badge />*", &registry()).unwrap_err();
        assert!(matches!(err, CompileError::UnknownComponent { .. }));
    }

    #[test]
    fn test_first_unknown_in_document_order() {
        let err = compile("<Alpha />\n\n<Beta />", &registry()).unwrap_err();
        assert!(matches!(err, CompileError::UnknownComponent { ref tag, .. } if tag == "Alpha"));
    }

    #[test]
    fn test_intrinsic_tags_need_no_registration() {
        let doc = compile("<span>x</span> <br />", &registry()).unwrap();
        assert_eq!(doc.render_html(), "<p><span>x</span> <br /></p>");
    }

    #[test]
    fn test_parse_errors_propagate() {
        let err = compile("```\nno end", &registry()).unwrap_err();
        assert_eq!(err, CompileError::UnterminatedCodeFence { line: 1 });
    }

    #[test]
    fn test_document_accessors() {
        let registry = registry();
        let doc = compile("# t", &registry).unwrap();
        assert!(Arc::ptr_eq(doc.registry(), &registry));
        assert_eq!(doc.document().blocks.len(), 1);
        assert_eq!(doc.into_document().blocks.len(), 1);
    }
}
