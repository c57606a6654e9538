//! Markdown runs to blocks and inlines.
//!
//! Each run of Markdown lines between block tags is parsed with
//! `pulldown-cmark` and its event stream is folded into [`Block`] and
//! [`Inline`] nodes. Raw HTML in the stream is read as JSX: tags become
//! [`Element`]s and must nest properly, `<!-- -->` comments are dropped.
//! Text is also scanned for `{expressions}` and for JSX tags CommonMark does
//! not accept as HTML, such as ones with `{...}` attribute values.

use crate::ast::{Alignment, Attributes, Block, Element, Inline};
use crate::error::{CompileError, Result};
use crate::tag::{TagKind, TagScan, TagToken, balanced_braces, scan_tag, starts_tag};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};
use std::borrow::Cow;
use std::ops::Range;

/// One source line and its 1-based line number in the document.
#[derive(Debug, Clone)]
pub(crate) struct SourceLine<'a> {
    pub(crate) text: Cow<'a, str>,
    pub(crate) line: usize,
}

impl<'a> SourceLine<'a> {
    pub(crate) fn new(text: impl Into<Cow<'a, str>>, line: usize) -> Self {
        Self {
            text: text.into(),
            line,
        }
    }

    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

fn leading_whitespace(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options
}

/// Parses a run of Markdown lines.
///
/// The run is dedented by its common indentation first, so content nested
/// inside block elements may be indented like JSX children.
pub(crate) fn parse_markdown(lines: &[SourceLine<'_>]) -> Result<Vec<Block>> {
    if lines.iter().all(SourceLine::is_blank) {
        return Ok(Vec::new());
    }

    let indent = lines
        .iter()
        .filter(|l| !l.is_blank())
        .map(|l| leading_whitespace(&l.text))
        .min()
        .unwrap_or(0);

    let mut source = String::new();
    let mut starts = Vec::with_capacity(lines.len());
    for line in lines {
        starts.push((source.len(), line.line));
        let strip = leading_whitespace(&line.text).min(indent);
        source.push_str(&line.text[strip..]);
        source.push('\n');
    }

    let mut builder = TreeBuilder::new(&source, LineMap { starts });
    for (event, range) in Parser::new_ext(&source, options()).into_offset_iter() {
        builder.event(event, range)?;
    }
    builder.finish()
}

/// Maps byte offsets in a run back to document lines.
struct LineMap {
    /// `(offset of line start, document line)` in source order.
    starts: Vec<(usize, usize)>,
}

impl LineMap {
    fn index(&self, offset: usize) -> usize {
        self.starts
            .partition_point(|&(start, _)| start <= offset)
            .saturating_sub(1)
    }

    fn line(&self, offset: usize) -> usize {
        self.starts.get(self.index(offset)).map_or(1, |&(_, line)| line)
    }

    /// Base line for [`scan_tag`], which counts newlines from the start of
    /// the run.
    fn base(&self, offset: usize) -> usize {
        self.line(offset).saturating_sub(self.index(offset)).max(1)
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn alignment(align: pulldown_cmark::Alignment) -> Alignment {
    match align {
        pulldown_cmark::Alignment::None => Alignment::None,
        pulldown_cmark::Alignment::Left => Alignment::Left,
        pulldown_cmark::Alignment::Center => Alignment::Center,
        pulldown_cmark::Alignment::Right => Alignment::Right,
    }
}

enum FrameKind {
    Root,
    Paragraph,
    Heading(u8),
    BlockQuote,
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    HtmlBlock,
    List {
        start: Option<u64>,
        tight: bool,
        items: Vec<Vec<Block>>,
    },
    Item,
    Table {
        alignments: Vec<Alignment>,
        head: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },
    TableRow {
        head: bool,
        cells: Vec<Vec<Inline>>,
    },
    TableCell,
    Emphasis,
    Strong,
    Strikethrough,
    Link(String),
    Image(String),
    Element {
        name: String,
        attributes: Attributes,
        line: usize,
    },
    /// Containers with no node of their own; children move to the parent.
    Transparent,
}

struct Frame {
    kind: FrameKind,
    blocks: Vec<Block>,
    inlines: Vec<Inline>,
}

impl Frame {
    fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            blocks: Vec::new(),
            inlines: Vec::new(),
        }
    }

    /// Moves pending inlines into a paragraph. Tight list items hold their
    /// text this way.
    fn flush_inlines(&mut self) {
        let inlines = trim_inlines(std::mem::take(&mut self.inlines));
        if !inlines.is_empty() {
            self.blocks.push(Block::Paragraph(inlines));
        }
    }
}

/// Trims whitespace at both ends of a run of inlines, dropping emptied text.
fn trim_inlines(mut inlines: Vec<Inline>) -> Vec<Inline> {
    if let Some(Inline::Text(text)) = inlines.last_mut() {
        text.truncate(text.trim_end().len());
        if text.is_empty() {
            inlines.pop();
        }
    }
    if let Some(Inline::Text(text)) = inlines.first_mut() {
        let trimmed = text.trim_start();
        if trimmed.len() != text.len() {
            *text = trimmed.to_string();
        }
        if text.is_empty() {
            inlines.remove(0);
        }
    }
    inlines
}

struct TreeBuilder<'s> {
    source: &'s str,
    lines: LineMap,
    stack: Vec<Frame>,
    /// Source consumed by a tag or comment that ran past its event.
    resume_at: usize,
}

impl<'s> TreeBuilder<'s> {
    fn new(source: &'s str, lines: LineMap) -> Self {
        Self {
            source,
            lines,
            stack: vec![Frame::new(FrameKind::Root)],
            resume_at: 0,
        }
    }

    fn top(&mut self) -> &mut Frame {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn push_block(&mut self, block: Block) {
        let top = self.top();
        top.flush_inlines();
        top.blocks.push(block);
    }

    fn push_inline(&mut self, inline: Inline) {
        self.top().inlines.push(inline);
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let inlines = &mut self.top().inlines;
        if let Some(Inline::Text(last)) = inlines.last_mut() {
            last.push_str(text);
        } else {
            inlines.push(Inline::Text(text.to_string()));
        }
    }

    fn event(&mut self, event: Event<'_>, range: Range<usize>) -> Result<()> {
        let structural = matches!(event, Event::Start(_) | Event::End(_));
        if !structural && range.end <= self.resume_at {
            return Ok(());
        }

        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => self.end()?,
            Event::Text(text) => self.text(&text, range)?,
            Event::Code(code) => self.push_inline(Inline::Code(code.into_string())),
            Event::Html(html) | Event::InlineHtml(html) => {
                if self.source.get(range.clone()) == Some(&*html) {
                    self.scan(range, false)?;
                } else {
                    self.push_text(&html);
                }
            }
            Event::SoftBreak => self.push_text("\n"),
            Event::HardBreak => self.push_inline(Inline::HardBreak),
            Event::Rule => self.push_block(Block::ThematicBreak),
            _ => {}
        }
        Ok(())
    }

    fn start(&mut self, tag: Tag<'_>) {
        let kind = match tag {
            Tag::Paragraph => {
                self.mark_loose();
                FrameKind::Paragraph
            }
            Tag::Heading { level, .. } => FrameKind::Heading(heading_level(level)),
            Tag::BlockQuote(_) => FrameKind::BlockQuote,
            Tag::CodeBlock(kind) => FrameKind::CodeBlock {
                language: match kind {
                    CodeBlockKind::Fenced(info) => info.split_whitespace().next().map(String::from),
                    CodeBlockKind::Indented => None,
                },
                code: String::new(),
            },
            Tag::HtmlBlock => FrameKind::HtmlBlock,
            Tag::List(start) => FrameKind::List {
                start,
                tight: true,
                items: Vec::new(),
            },
            Tag::Item => FrameKind::Item,
            Tag::Table(alignments) => FrameKind::Table {
                alignments: alignments.into_iter().map(alignment).collect(),
                head: Vec::new(),
                rows: Vec::new(),
            },
            Tag::TableHead => FrameKind::TableRow {
                head: true,
                cells: Vec::new(),
            },
            Tag::TableRow => FrameKind::TableRow {
                head: false,
                cells: Vec::new(),
            },
            Tag::TableCell => FrameKind::TableCell,
            Tag::Emphasis => FrameKind::Emphasis,
            Tag::Strong => FrameKind::Strong,
            Tag::Strikethrough => FrameKind::Strikethrough,
            Tag::Link { dest_url, .. } => FrameKind::Link(dest_url.into_string()),
            Tag::Image { dest_url, .. } => FrameKind::Image(dest_url.into_string()),
            _ => FrameKind::Transparent,
        };
        self.stack.push(Frame::new(kind));
    }

    /// A paragraph directly inside a list item makes the list loose.
    fn mark_loose(&mut self) {
        let n = self.stack.len();
        if n >= 2
            && matches!(self.stack[n - 1].kind, FrameKind::Item)
            && let FrameKind::List { tight, .. } = &mut self.stack[n - 2].kind
        {
            *tight = false;
        }
    }

    fn end(&mut self) -> Result<()> {
        if self.stack.len() <= 1 {
            return Ok(());
        }
        let Some(Frame {
            kind,
            mut blocks,
            inlines,
        }) = self.stack.pop()
        else {
            return Ok(());
        };

        match kind {
            FrameKind::Element { name, line, .. } => {
                return Err(CompileError::UnclosedTag { tag: name, line });
            }
            FrameKind::Paragraph | FrameKind::HtmlBlock => {
                let inlines = trim_inlines(inlines);
                if !inlines.is_empty() {
                    self.push_block(Block::Paragraph(inlines));
                }
            }
            FrameKind::Heading(level) => self.push_block(Block::Heading {
                level,
                content: trim_inlines(inlines),
            }),
            FrameKind::BlockQuote => self.push_block(Block::BlockQuote(blocks)),
            FrameKind::CodeBlock { language, mut code } => {
                if code.ends_with('\n') {
                    code.pop();
                }
                self.push_block(Block::CodeBlock { language, code });
            }
            FrameKind::List {
                start,
                tight,
                items,
            } => self.push_block(Block::List {
                ordered: start.is_some(),
                start,
                tight,
                items,
            }),
            FrameKind::Item => {
                let inlines = trim_inlines(inlines);
                if !inlines.is_empty() {
                    blocks.push(Block::Paragraph(inlines));
                }
                if let FrameKind::List { items, .. } = &mut self.top().kind {
                    items.push(blocks);
                }
            }
            FrameKind::Table {
                alignments,
                head,
                rows,
            } => self.push_block(Block::Table {
                alignments,
                head,
                rows,
            }),
            FrameKind::TableRow { head, cells } => {
                if let FrameKind::Table {
                    head: table_head,
                    rows,
                    ..
                } = &mut self.top().kind
                {
                    if head {
                        *table_head = cells;
                    } else {
                        rows.push(cells);
                    }
                }
            }
            FrameKind::TableCell => {
                let cell = trim_inlines(inlines);
                if let FrameKind::TableRow { cells, .. } = &mut self.top().kind {
                    cells.push(cell);
                }
            }
            FrameKind::Emphasis => self.push_inline(Inline::Emphasis(inlines)),
            FrameKind::Strong => self.push_inline(Inline::Strong(inlines)),
            FrameKind::Strikethrough => self.push_inline(Inline::Strikethrough(inlines)),
            FrameKind::Link(url) => self.push_inline(Inline::Link {
                url,
                children: inlines,
            }),
            FrameKind::Image(url) => {
                let alt = inlines.iter().map(Inline::plain_text).collect();
                self.push_inline(Inline::Image { url, alt });
            }
            FrameKind::Transparent | FrameKind::Root => {
                for block in blocks {
                    self.push_block(block);
                }
                for inline in inlines {
                    self.push_inline(inline);
                }
            }
        }
        Ok(())
    }

    fn text(&mut self, text: &str, range: Range<usize>) -> Result<()> {
        if let FrameKind::CodeBlock { code, .. } = &mut self.top().kind {
            code.push_str(text);
            return Ok(());
        }
        // Entities and escapes are already decoded; only verbatim source can
        // hold tags or expressions.
        if self.source.get(range.clone()) != Some(text) {
            self.push_text(text);
            return Ok(());
        }
        let escaped = range.start > 0 && self.source.as_bytes()[range.start - 1] == b'\\';
        self.scan(range, escaped)
    }

    /// Splits verbatim source into text, tags and comments. `escaped` marks
    /// the first byte as backslash-escaped.
    fn scan(&mut self, range: Range<usize>, escaped: bool) -> Result<()> {
        let source = self.source;
        let bytes = source.as_bytes();
        let end = range.end;
        let mut pos = range.start.max(self.resume_at);
        let mut literal = pos;

        while pos < end {
            if escaped && pos == range.start {
                pos += 1;
                continue;
            }
            match bytes[pos] {
                b'<' if source[pos..].starts_with("<!--") => match source[pos + 4..].find("-->") {
                    Some(close) => {
                        self.push_text(&source[literal..pos]);
                        pos += 4 + close + 3;
                        literal = pos;
                    }
                    None => pos += 4,
                },
                b'<' if starts_tag(source, pos) => {
                    let line = self.lines.line(pos);
                    match scan_tag(source, pos, self.lines.base(pos))? {
                        TagScan::Complete(token) => {
                            self.push_text(&source[literal..pos]);
                            pos = token.end;
                            literal = pos;
                            self.tag(token, line)?;
                        }
                        TagScan::Incomplete => return Err(CompileError::UnterminatedTag { line }),
                        TagScan::NotATag => pos += 1,
                    }
                }
                b'{' => {
                    let line = self.lines.line(pos);
                    let Some((expression, close)) = balanced_braces(source, pos) else {
                        return Err(CompileError::UnterminatedExpression { line });
                    };
                    let expression = expression.trim();
                    if !(expression.starts_with("/*") && expression.ends_with("*/")) {
                        return Err(CompileError::UnsupportedExpression {
                            expression: expression.to_string(),
                            line,
                        });
                    }
                    self.push_text(&source[literal..pos]);
                    pos = close;
                    literal = pos;
                }
                _ => pos += 1,
            }
        }

        if literal < end {
            self.push_text(&source[literal..end]);
        }
        self.resume_at = self.resume_at.max(pos);
        Ok(())
    }

    fn tag(&mut self, token: TagToken, line: usize) -> Result<()> {
        let TagToken {
            kind,
            name,
            attributes,
            ..
        } = token;

        match kind {
            TagKind::SelfClosing => self.push_inline(Inline::Element(Element {
                name,
                attributes,
                children: Vec::new(),
                line,
            })),
            TagKind::Open => self.stack.push(Frame::new(FrameKind::Element {
                name,
                attributes,
                line,
            })),
            TagKind::Close => {
                let open = match &self.top().kind {
                    FrameKind::Element { name: open, .. } if *open == name => true,
                    FrameKind::Element { name: open, .. } => {
                        return Err(CompileError::MismatchedClosingTag {
                            expected: open.clone(),
                            found: name,
                            line,
                        });
                    }
                    _ => false,
                };
                if !open {
                    return Err(CompileError::UnexpectedClosingTag { tag: name, line });
                }
                if let Some(Frame {
                    kind:
                        FrameKind::Element {
                            name,
                            attributes,
                            line,
                        },
                    inlines,
                    ..
                }) = self.stack.pop()
                {
                    self.push_inline(Inline::Element(Element {
                        name,
                        attributes,
                        children: inlines,
                        line,
                    }));
                }
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Block>> {
        while self.stack.len() > 1 {
            self.end()?;
        }
        let mut root = self
            .stack
            .pop()
            .unwrap_or_else(|| Frame::new(FrameKind::Root));
        root.flush_inlines();
        Ok(root.blocks)
    }
}
