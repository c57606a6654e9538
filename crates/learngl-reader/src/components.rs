//! The tag set available to tutorial documents.
//!
//! Components render to plain HTML with stable class names; styling and
//! interactivity belong to whatever page embeds the output.

use crate::highlight::highlight;
use learngl_core::{AnnotationSegment, FunctionAnnotator, FunctionRecord, FunctionTable, Parameter};
use learngl_mdx::{
    AttributeValue, Attributes, TagContext, TagRegistry, TagRenderer, push_attribute, push_escaped,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;

const YOUTUBE_ALLOW: &str =
    "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture";

/// Builds the registry every document is compiled against.
///
/// # Examples
///
/// ```
/// use learngl_core::FunctionTable;
/// use learngl_mdx::compile;
/// use learngl_reader::components::standard_registry;
/// use std::sync::Arc;
///
/// let registry = Arc::new(standard_registry(FunctionTable::builtin()));
/// let doc = compile("<Warning>\n주의하세요.\n</Warning>", &registry).unwrap();
/// assert_eq!(
///     doc.render_html(),
///     "<div class=\"warning-block\"><div class=\"paragraph\">주의하세요.</div></div>"
/// );
/// ```
pub fn standard_registry(table: Arc<FunctionTable>) -> TagRegistry {
    TagRegistry::new()
        .with("Func", FuncComponent {
            table: Arc::clone(&table),
        })
        .with("Warning", warning)
        .with("Info", info)
        .with("Collapsible", collapsible)
        .with("List", list)
        .with("NumberedList", numbered_list)
        .with("NumberedItem", numbered_item)
        .with("TranslatorNote", translator_note)
        .with("LinkBlock", link_block)
        .with("ColorText", color_text)
        .with("YouTube", youtube)
        .with("code", AnnotatedCode::new(table))
        .with("pre", code_block)
        .with("p", paragraph)
}

/// Inline code with function references expanded into documentation popups.
///
/// Plain-text spans are annotated; spans without any resolvable name keep
/// ordinary code styling. Structured children are passed through untouched.
pub struct AnnotatedCode {
    table: Arc<FunctionTable>,
}

impl AnnotatedCode {
    pub const fn new(table: Arc<FunctionTable>) -> Self {
        Self { table }
    }
}

impl TagRenderer for AnnotatedCode {
    fn render(&self, ctx: &TagContext<'_>, out: &mut String) {
        let Some(text) = ctx.raw_text else {
            out.push_str("<span class=\"function-code\">");
            out.push_str(ctx.children);
            out.push_str("</span>");
            return;
        };

        let annotation = FunctionAnnotator::new(&self.table).annotate(text);
        if !annotation.has_references() {
            out.push_str("<code class=\"inline-code\">");
            out.push_str(ctx.children);
            out.push_str("</code>");
            return;
        }

        out.push_str("<span class=\"function-code\">");
        for segment in annotation.segments() {
            match segment {
                AnnotationSegment::Literal { text } => push_escaped(out, text),
                AnnotationSegment::Reference { token, record, .. } => {
                    push_function_doc(out, token, record);
                }
            }
        }
        out.push_str("</span>");
    }
}

/// `<Func name="..." />`: a function documentation popup.
///
/// A name found in the table uses the table's record; explicit `params`,
/// `description`, `example` and `tags` attributes override its fields.
struct FuncComponent {
    table: Arc<FunctionTable>,
}

impl TagRenderer for FuncComponent {
    fn render(&self, ctx: &TagContext<'_>, out: &mut String) {
        let name = ctx.attributes.get_str("name").unwrap_or_default();
        let mut record = self
            .table
            .get(name)
            .map_or_else(|| FunctionRecord::named(name), |record| (**record).clone());

        if let Some(params) = lenient_attribute::<Vec<Parameter>>(ctx.attributes, "params") {
            record.params = params;
        }
        if let Some(tags) = lenient_attribute::<Vec<String>>(ctx.attributes, "tags") {
            record.tags = tags;
        }
        if let Some(description) = ctx.attributes.get_str("description") {
            record.description = Some(description.to_string());
        }
        if let Some(example) = ctx.attributes.get_str("example") {
            record.example = Some(example.to_string());
        }

        push_function_doc(out, name, &record);
    }
}

/// Reads a JSON attribute that may also arrive as a JSON string.
///
/// Malformed values become an empty default; absent ones return `None`.
fn lenient_attribute<T>(attributes: &Attributes, name: &str) -> Option<T>
where
    T: DeserializeOwned + Default,
{
    let value = match attributes.get(name)? {
        AttributeValue::String(text) => match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Malformed {} attribute, using empty list: {}", name, e);
                return Some(T::default());
            }
        },
        other => other.to_json(),
    };
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Malformed {} attribute, using empty list: {}", name, e);
            Some(T::default())
        }
    }
}

/// Hover card for one function. `display` is the name as written in the text.
fn push_function_doc(out: &mut String, display: &str, record: &FunctionRecord) {
    out.push_str("<span class=\"function-doc\">");
    out.push_str("<span class=\"function-doc-title\">");
    push_escaped(out, display);
    out.push_str("</span><span class=\"function-doc-box\">");

    if let Some(description) = record.description.as_deref().filter(|d| !d.is_empty()) {
        out.push_str("<span class=\"function-doc-description\"><strong>설명:</strong> ");
        push_escaped(out, description);
        out.push_str("</span>");
    }

    out.push_str("<span class=\"function-doc-params\"><strong>파라미터:</strong>");
    if record.params.is_empty() {
        out.push_str("<span class=\"function-doc-param\">없음</span>");
    }
    for param in &record.params {
        out.push_str("<span class=\"function-doc-param\"><code>");
        push_escaped(out, &param.name);
        out.push_str("</code> (");
        push_escaped(out, &param.ty);
        out.push_str(") - ");
        push_escaped(out, &param.description);
        out.push_str("</span>");
    }
    out.push_str("</span>");

    if let Some(example) = record.example.as_deref().filter(|e| !e.is_empty()) {
        out.push_str("<span class=\"function-doc-example\"><strong>예시:</strong><code>");
        push_escaped(out, example);
        out.push_str("</code></span>");
    }

    if !record.tags.is_empty() {
        out.push_str("<span class=\"function-doc-tags\">");
        for tag in &record.tags {
            out.push_str("<span class=\"function-doc-tag\">");
            push_escaped(out, tag);
            out.push_str("</span>");
        }
        out.push_str("</span>");
    }

    out.push_str("</span></span>");
}

fn wrap(out: &mut String, class: &str, children: &str) {
    out.push_str("<div class=\"");
    out.push_str(class);
    out.push_str("\">");
    out.push_str(children);
    out.push_str("</div>");
}

fn warning(ctx: &TagContext<'_>, out: &mut String) {
    wrap(out, "warning-block", ctx.children);
}

fn info(ctx: &TagContext<'_>, out: &mut String) {
    wrap(out, "info-block", ctx.children);
}

fn paragraph(ctx: &TagContext<'_>, out: &mut String) {
    wrap(out, "paragraph", ctx.children);
}

fn collapsible(ctx: &TagContext<'_>, out: &mut String) {
    let variant = match ctx.attributes.get_str("variant") {
        Some(v @ ("note" | "info" | "tip" | "warning")) => v,
        _ => "note",
    };
    out.push_str("<details class=\"collapsible collapsible-");
    out.push_str(variant);
    out.push('"');
    if ctx.attributes.get_bool("defaultOpen").unwrap_or(false) {
        out.push_str(" open");
    }
    out.push_str("><summary class=\"collapsible-header\"><span class=\"collapsible-title\">");
    push_escaped(out, ctx.attributes.get_str("title").unwrap_or_default());
    out.push_str("</span></summary>");
    wrap(out, "collapsible-content", ctx.children);
    out.push_str("</details>");
}

/// `<List items={[...]} ordered compact />`: items come from the attribute,
/// not from children.
fn list(ctx: &TagContext<'_>, out: &mut String) {
    let ordered = ctx.attributes.get_bool("ordered").unwrap_or(false);
    let compact = ctx.attributes.get_bool("compact").unwrap_or(false);
    let items = match ctx.attributes.get_json("items") {
        Some(serde_json::Value::Array(items)) => items,
        Some(other) => {
            tracing::warn!("List items must be an array, got {}", other);
            Vec::new()
        }
        None => Vec::new(),
    };

    let tag = if ordered { "ol" } else { "ul" };
    out.push('<');
    out.push_str(tag);
    out.push_str(" class=\"list\">");
    for (idx, item) in items.iter().enumerate() {
        out.push_str(if compact {
            "<li class=\"list-item compact\">"
        } else {
            "<li class=\"list-item\">"
        });
        out.push_str("<span class=\"list-marker\">");
        if ordered {
            out.push_str(&format!("{}.", idx + 1));
        } else {
            out.push('✓');
        }
        out.push_str("</span><span class=\"list-text\">");
        match item {
            serde_json::Value::String(text) => push_escaped(out, text),
            other => push_escaped(out, &other.to_string()),
        }
        out.push_str("</span></li>");
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn numbered_list(ctx: &TagContext<'_>, out: &mut String) {
    let start = match ctx.attributes.get("startFrom") {
        Some(AttributeValue::Json(serde_json::Value::Number(n))) => n.as_u64().unwrap_or(1),
        Some(AttributeValue::String(s)) => s.trim().parse().unwrap_or(1),
        _ => 1,
    };
    out.push_str("<ol class=\"numbered-list\"");
    if start > 1 {
        push_attribute(out, "style", &format!("counter-reset: item {}", start - 1));
    }
    out.push('>');
    out.push_str(ctx.children);
    out.push_str("</ol>");
}

fn numbered_item(ctx: &TagContext<'_>, out: &mut String) {
    out.push_str("<li class=\"numbered-item\">");
    wrap(out, "numbered-item-content", ctx.children);
    out.push_str("</li>");
}

fn translator_note(ctx: &TagContext<'_>, out: &mut String) {
    let kind = ctx.attributes.get_str("type").unwrap_or("note");
    let (class, header) = match kind {
        "clarification" => ("clarification", "번역자 보충 설명"),
        "addition" => ("addition", "번역자 추가 정보"),
        "correction" => ("correction", "번역자 정정"),
        _ => ("note", "번역자 주"),
    };
    let author = ctx.attributes.get_str("author").unwrap_or("번역자");

    out.push_str("<div class=\"translator-note translator-note-");
    out.push_str(class);
    out.push_str("\"><div class=\"translator-note-header\">");
    out.push_str(header);
    out.push_str("</div>");
    wrap(out, "translator-note-content", ctx.children);
    if !author.is_empty() {
        out.push_str("<div class=\"translator-note-author\">");
        push_escaped(out, author);
        out.push_str("</div>");
    }
    out.push_str("</div>");
}

fn link_block(ctx: &TagContext<'_>, out: &mut String) {
    let url = ctx.attributes.get_str("url").unwrap_or_default();
    let text = ctx.attributes.get_str("text").unwrap_or(url);
    out.push_str("<a class=\"link-block\"");
    push_attribute(out, "href", url);
    out.push_str(" target=\"_blank\" rel=\"noopener noreferrer\"");
    push_attribute(out, "aria-label", text);
    out.push('>');
    push_escaped(out, text);
    out.push_str("</a>");
}

/// Accepts names, hex and functional notations; anything else is dropped.
fn is_css_color(color: &str) -> bool {
    !color.is_empty()
        && color
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '#' | '(' | ')' | ',' | '.' | '%' | ' ' | '-'))
}

fn color_text(ctx: &TagContext<'_>, out: &mut String) {
    out.push_str("<span");
    match ctx.attributes.get_str("color") {
        Some(color) if is_css_color(color) => {
            push_attribute(out, "style", &format!("color: {color}"));
        }
        Some(color) => tracing::warn!("Ignoring invalid ColorText color: {:?}", color),
        None => {}
    }
    out.push('>');
    out.push_str(ctx.children);
    out.push_str("</span>");
}

fn youtube(ctx: &TagContext<'_>, out: &mut String) {
    let attrs = ctx.attributes;
    let Some(video_id) = attrs.get_str("videoId").filter(|id| !id.is_empty()) else {
        tracing::warn!("YouTube component without videoId");
        return;
    };
    let flag = |name: &str, default: bool| {
        if attrs.get_bool(name).unwrap_or(default) {
            '1'
        } else {
            '0'
        }
    };
    let src = format!(
        "https://www.youtube.com/embed/{video_id}?autoplay={}&mute={}&controls={}&rel=0&modestbranding=1&playsinline=1",
        flag("autoplay", false),
        flag("muted", false),
        flag("controls", true),
    );
    let ratio = match attrs.get_str("aspectRatio") {
        Some("4:3") => "4-3",
        Some("1:1") => "1-1",
        _ => "16-9",
    };
    let title = attrs.get_str("title").filter(|t| !t.is_empty());
    let description = attrs.get_str("description").filter(|d| !d.is_empty());

    out.push_str("<div class=\"youtube-embed\"><div class=\"youtube-video ratio-");
    out.push_str(ratio);
    out.push_str("\"><iframe");
    push_attribute(out, "src", &src);
    push_attribute(out, "title", title.unwrap_or("YouTube video player"));
    push_attribute(out, "allow", YOUTUBE_ALLOW);
    out.push_str(" allowfullscreen></iframe></div>");
    if title.is_some() || description.is_some() {
        out.push_str("<div class=\"youtube-info\">");
        if let Some(title) = title {
            out.push_str("<h4>");
            push_escaped(out, title);
            out.push_str("</h4>");
        }
        if let Some(description) = description {
            out.push_str("<p>");
            push_escaped(out, description);
            out.push_str("</p>");
        }
        out.push_str("</div>");
    }
    out.push_str("</div>");
}

/// Fenced code with a language label and a copy button. Code in a known
/// language is syntax highlighted.
fn code_block(ctx: &TagContext<'_>, out: &mut String) {
    let language = ctx.attributes.get_str("language").filter(|l| !l.is_empty());
    out.push_str("<div class=\"code-block\"><div class=\"code-header\"><span class=\"code-language\">");
    push_escaped(out, language.unwrap_or("text"));
    out.push_str("</span><button class=\"copy-button\" type=\"button\">복사</button></div><pre><code");
    if let Some(language) = language {
        push_attribute(out, "class", &format!("language-{language}"));
    }
    out.push('>');
    match language
        .zip(ctx.raw_text)
        .and_then(|(language, code)| highlight(code, language))
    {
        Some(html) => out.push_str(&html),
        None => out.push_str(ctx.children),
    }
    out.push_str("</code></pre></div>");
}
