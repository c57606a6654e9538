//! HTML rendering.
//!
//! Every node is emitted through [`TagRegistry`] under its HTML tag name;
//! names without a renderer fall back to [`render_intrinsic`]. All text and
//! attribute values are escaped.

use crate::ast::{Alignment, AttributeValue, Attributes, Block, Element, Inline};
use crate::registry::{TagContext, TagRegistry};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Appends `s` to `out` with HTML special characters escaped.
pub fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

/// Escapes HTML special characters.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    push_escaped(&mut out, s);
    out
}

/// Writes ` name="value"` pairs. JSX names `className`/`htmlFor` map to
/// `class`/`for`; event handlers and `false` booleans are dropped.
pub fn push_attributes(out: &mut String, attributes: &Attributes) {
    for (name, value) in attributes.iter() {
        if name.len() > 2 && name[..2].eq_ignore_ascii_case("on") {
            continue;
        }
        let name = match name {
            "className" => "class",
            "htmlFor" => "for",
            other => other,
        };
        match value {
            AttributeValue::Bool(false) => {}
            AttributeValue::Bool(true) => {
                out.push(' ');
                out.push_str(name);
            }
            AttributeValue::String(s) => push_attribute(out, name, s),
            AttributeValue::Json(serde_json::Value::String(s)) => push_attribute(out, name, s),
            AttributeValue::Json(serde_json::Value::Bool(b)) => {
                if *b {
                    out.push(' ');
                    out.push_str(name);
                }
            }
            AttributeValue::Json(json) => push_attribute(out, name, &json.to_string()),
        }
    }
}

/// Writes one ` name="escaped value"` pair.
pub fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    push_escaped(out, value);
    out.push('"');
}

/// Default rendering for a tag nobody registered: the tag itself.
///
/// `pre` wraps its children in `<code>` and turns a `language` attribute
/// into a `language-*` class, matching fenced code output elsewhere.
pub fn render_intrinsic(ctx: &TagContext<'_>, out: &mut String) {
    if ctx.tag == "pre" {
        out.push_str("<pre><code");
        if let Some(language) = ctx.attributes.get_str("language") {
            push_attribute(out, "class", &format!("language-{language}"));
        }
        out.push('>');
        out.push_str(ctx.children);
        out.push_str("</code></pre>");
        return;
    }

    out.push('<');
    out.push_str(ctx.tag);
    push_attributes(out, ctx.attributes);
    if VOID_ELEMENTS.contains(&ctx.tag) {
        out.push_str(" />");
        return;
    }
    out.push('>');
    out.push_str(ctx.children);
    out.push_str("</");
    out.push_str(ctx.tag);
    out.push('>');
}

pub(crate) struct HtmlRenderer<'r> {
    registry: &'r TagRegistry,
}

impl<'r> HtmlRenderer<'r> {
    pub(crate) fn new(registry: &'r TagRegistry) -> Self {
        Self { registry }
    }

    fn emit(
        &self,
        tag: &str,
        attributes: &Attributes,
        children: &str,
        raw_text: Option<&str>,
        out: &mut String,
    ) {
        let ctx = TagContext {
            tag,
            attributes,
            children,
            raw_text,
        };
        match self.registry.get(tag) {
            Some(renderer) => renderer.render(&ctx, out),
            None => render_intrinsic(&ctx, out),
        }
    }

    pub(crate) fn render_blocks(&self, blocks: &[Block], out: &mut String) {
        for (i, block) in blocks.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            self.render_block(block, out);
        }
    }

    fn render_block(&self, block: &Block, out: &mut String) {
        let none = Attributes::new();
        match block {
            Block::Heading { level, content } => {
                let children = self.inlines_to_string(content);
                self.emit(&format!("h{level}"), &none, &children, None, out);
            }
            Block::Paragraph(content) => {
                let children = self.inlines_to_string(content);
                self.emit("p", &none, &children, None, out);
            }
            Block::CodeBlock { language, code } => {
                let mut attributes = Attributes::new();
                if let Some(language) = language {
                    attributes = attributes.with("language", language.as_str());
                }
                self.emit("pre", &attributes, &escape_html(code), Some(code), out);
            }
            Block::List {
                ordered,
                start,
                tight,
                items,
            } => {
                let mut children = String::new();
                for item in items {
                    let mut item_html = String::new();
                    if *tight {
                        self.render_tight_item(item, &mut item_html);
                    } else {
                        self.render_blocks(item, &mut item_html);
                    }
                    self.emit("li", &none, &item_html, None, &mut children);
                }
                let mut attributes = Attributes::new();
                if let Some(start) = start.filter(|&n| n != 1) {
                    attributes = attributes.with("start", start.to_string());
                }
                let tag = if *ordered { "ol" } else { "ul" };
                self.emit(tag, &attributes, &children, None, out);
            }
            Block::BlockQuote(blocks) => {
                let mut children = String::new();
                self.render_blocks(blocks, &mut children);
                self.emit("blockquote", &none, &children, None, out);
            }
            Block::ThematicBreak => self.emit("hr", &none, "", None, out),
            Block::Table {
                alignments,
                head,
                rows,
            } => self.render_table(alignments, head, rows, out),
            Block::Element(element) => {
                let mut children = String::new();
                self.render_blocks(&element.children, &mut children);
                self.emit(&element.name, &element.attributes, &children, None, out);
            }
        }
    }

    fn render_table(
        &self,
        alignments: &[Alignment],
        head: &[Vec<Inline>],
        rows: &[Vec<Vec<Inline>>],
        out: &mut String,
    ) {
        let mut head_html = String::new();
        self.render_row("th", alignments, head, &mut head_html);
        let mut thead = String::new();
        self.emit("thead", &Attributes::new(), &head_html, None, &mut thead);

        let mut body_html = String::new();
        for row in rows {
            self.render_row("td", alignments, row, &mut body_html);
        }

        let mut children = thead;
        if !rows.is_empty() {
            self.emit("tbody", &Attributes::new(), &body_html, None, &mut children);
        }
        self.emit("table", &Attributes::new(), &children, None, out);
    }

    fn render_row(&self, cell_tag: &str, alignments: &[Alignment], cells: &[Vec<Inline>], out: &mut String) {
        let mut row = String::new();
        for (i, cell) in cells.iter().enumerate() {
            let mut attributes = Attributes::new();
            if let Some(align) = alignments.get(i).copied().and_then(Alignment::as_css) {
                attributes = attributes.with("style", format!("text-align: {align}"));
            }
            let children = self.inlines_to_string(cell);
            self.emit(cell_tag, &attributes, &children, None, &mut row);
        }
        self.emit("tr", &Attributes::new(), &row, None, out);
    }

    /// Paragraphs in tight list items render without their wrapper.
    fn render_tight_item(&self, blocks: &[Block], out: &mut String) {
        for (i, block) in blocks.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            match block {
                Block::Paragraph(content) => self.render_inlines(content, out),
                other => self.render_block(other, out),
            }
        }
    }

    fn inlines_to_string(&self, inlines: &[Inline]) -> String {
        let mut out = String::new();
        self.render_inlines(inlines, &mut out);
        out
    }

    pub(crate) fn render_inlines(&self, inlines: &[Inline], out: &mut String) {
        for inline in inlines {
            self.render_inline(inline, out);
        }
    }

    fn render_inline(&self, inline: &Inline, out: &mut String) {
        let none = Attributes::new();
        match inline {
            Inline::Text(text) => push_escaped(out, text),
            Inline::Code(code) => self.emit("code", &none, &escape_html(code), Some(code), out),
            Inline::Emphasis(children) => {
                let children = self.inlines_to_string(children);
                self.emit("em", &none, &children, None, out);
            }
            Inline::Strong(children) => {
                let children = self.inlines_to_string(children);
                self.emit("strong", &none, &children, None, out);
            }
            Inline::Strikethrough(children) => {
                let children = self.inlines_to_string(children);
                self.emit("del", &none, &children, None, out);
            }
            Inline::Link { url, children } => {
                let attributes = Attributes::new().with("href", url.as_str());
                let children = self.inlines_to_string(children);
                self.emit("a", &attributes, &children, None, out);
            }
            Inline::Image { url, alt } => {
                let attributes = Attributes::new()
                    .with("src", url.as_str())
                    .with("alt", alt.as_str());
                self.emit("img", &attributes, "", None, out);
            }
            Inline::HardBreak => self.emit("br", &none, "", None, out),
            Inline::Element(element) => self.render_inline_element(element, out),
        }
    }

    fn render_inline_element(&self, element: &Element<Inline>, out: &mut String) {
        let children = self.inlines_to_string(&element.children);
        let raw_text = plain_text_children(&element.children);
        self.emit(
            &element.name,
            &element.attributes,
            &children,
            raw_text.as_deref(),
            out,
        );
    }
}

/// Concatenated text if every child is plain text.
fn plain_text_children(children: &[Inline]) -> Option<String> {
    children
        .iter()
        .map(|child| match child {
            Inline::Text(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn render(src: &str) -> String {
        render_with(src, &TagRegistry::new())
    }

    fn render_with(src: &str, registry: &TagRegistry) -> String {
        let doc = parse(src).unwrap();
        let mut out = String::new();
        HtmlRenderer::new(registry).render_blocks(&doc.blocks, &mut out);
        out
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_markdown_basics() {
        assert_eq!(
            render("# 제목\n\n**굵게** `a < b` [링크](https://learnopengl.com)"),
            "<h1>제목</h1>\n<p><strong>굵게</strong> <code>a &lt; b</code> \
             <a href=\"https://learnopengl.com\">링크</a></p>"
        );
    }

    #[test]
    fn test_code_block() {
        assert_eq!(
            render("```glsl\nvec4 c = a < b ? x : y;\n```"),
            "<pre><code class=\"language-glsl\">vec4 c = a &lt; b ? x : y;</code></pre>"
        );
        assert_eq!(render("```\nx\n```"), "<pre><code>x</code></pre>");
    }

    #[test]
    fn test_lists() {
        assert_eq!(render("- a\n- b"), "<ul><li>a</li><li>b</li></ul>");
        assert_eq!(
            render("2. a\n\n3. b"),
            "<ol start=\"2\"><li><p>a</p></li><li><p>b</p></li></ol>"
        );
    }

    #[test]
    fn test_quote_break_and_image() {
        assert_eq!(
            render("> 인용\n\n---\n\n![alt \"q\"](/a.png)"),
            "<blockquote><p>인용</p></blockquote>\n<hr />\n\
             <p><img src=\"/a.png\" alt=\"alt &quot;q&quot;\" /></p>"
        );
    }

    #[test]
    fn test_table_with_alignment() {
        assert_eq!(
            render("| 함수 | 설명 |\n|:---|---:|\n| `glClear` | 지우기 |"),
            "<table><thead><tr><th style=\"text-align: left\">함수</th>\
             <th style=\"text-align: right\">설명</th></tr></thead>\
             <tbody><tr><td style=\"text-align: left\"><code>glClear</code></td>\
             <td style=\"text-align: right\">지우기</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_strikethrough() {
        assert_eq!(render("~~old~~ new"), "<p><del>old</del> new</p>");
    }

    #[test]
    fn test_html_comment_is_dropped() {
        assert_eq!(render("<!-- 번역 메모 -->\n\n본문"), "<p>본문</p>");
        assert_eq!(render("a <!-- b --> c"), "<p>a  c</p>");
    }

    #[test]
    fn test_hard_break() {
        assert_eq!(render("a  \nb"), "<p>a<br />b</p>");
    }

    #[test]
    fn test_intrinsic_element_attributes() {
        assert_eq!(
            render("<div className=\"box\" hidden onClick=\"evil()\" data-x={3}>\n안\n</div>"),
            "<div class=\"box\" hidden data-x=\"3\"><p>안</p></div>"
        );
    }

    #[test]
    fn test_registered_override_receives_raw_text() {
        let registry = TagRegistry::new().with("code", |ctx: &TagContext<'_>, out: &mut String| {
            out.push('[');
            out.push_str(ctx.raw_text.unwrap_or("?"));
            out.push(']');
        });
        assert_eq!(render_with("`<T>`", &registry), "<p>[<T>]</p>");
    }

    #[test]
    fn test_structured_children_have_no_raw_text() {
        let registry = TagRegistry::new().with("code", |ctx: &TagContext<'_>, out: &mut String| {
            out.push_str(if ctx.raw_text.is_some() { "raw" } else { "structured" });
        });
        assert_eq!(
            render_with("<code>plain</code> <code>**b**</code>", &registry),
            "<p>raw structured</p>"
        );
    }

    #[test]
    fn test_paragraph_override() {
        let registry = TagRegistry::new().with("p", |ctx: &TagContext<'_>, out: &mut String| {
            out.push_str("<div class=\"paragraph\">");
            out.push_str(ctx.children);
            out.push_str("</div>");
        });
        assert_eq!(render_with("a\n\nb", &registry), "<div class=\"paragraph\">a</div>\n<div class=\"paragraph\">b</div>");
    }
}
