//! Block-level MDX parser.
//!
//! The document is segmented line by line first. Standalone block tags
//! (`<Tag attr="v">` ... `</Tag>` or `<Tag />` alone on their lines, with
//! attributes possibly spanning several lines) nest by recursion, and
//! `{/* ... */}` comments at the start of a line are removed. Every run of
//! lines between tags is Markdown and goes to `pulldown-cmark` with tables
//! and strikethrough enabled; inline JSX inside a run is handled there.
//!
//! Fenced code and `<!-- -->` comments are kept whole, so tag-like lines in
//! them are never pulled out. `import`/`export` statements at the top level
//! and `{expressions}` anywhere are rejected.

use crate::ast::{Block, Document, Element};
use crate::error::{CompileError, Result};
use crate::markdown::{SourceLine, parse_markdown};
use crate::tag::{TagKind, TagScan, TagToken, scan_tag, starts_tag};
use once_cell::sync::Lazy;
use regex::Regex;

static FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:(`{3,})[^`]*|(~{3,}).*)$").unwrap());
static STATEMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(import|export)(?:\s|\{|$)").unwrap());

/// Parses MDX text into a [`Document`].
///
/// # Errors
///
/// Returns a [`CompileError`] with the 1-based line of the first problem.
///
/// # Examples
///
/// ```
/// use learngl_mdx::{Block, parse};
///
/// let doc = parse("# 삼각형\n\n<Warning>\n주의하세요.\n</Warning>\n").unwrap();
/// assert_eq!(doc.blocks.len(), 2);
/// assert!(matches!(&doc.blocks[1], Block::Element(e) if e.name == "Warning"));
/// ```
pub fn parse(text: &str) -> Result<Document> {
    tracing::trace!("Parsing MDX document ({} bytes)", text.len());
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut parser = BlockParser::new(text.lines().collect());
    let blocks = parser.parse_blocks(None)?;
    Ok(Document { blocks })
}

struct OpenTag {
    name: String,
    line: usize,
}

/// A tag standing alone on its line(s).
struct BlockTag {
    token: TagToken,
    lines: usize,
}

struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    fn parse(line: &str) -> Option<Self> {
        let caps = FENCE.captures(line)?;
        let run = caps.get(1).or_else(|| caps.get(2))?.as_str();
        Some(Self {
            marker: run.chars().next()?,
            len: run.len(),
        })
    }

    fn closes(&self, line: &str) -> bool {
        line.len() >= self.len && line.chars().all(|c| c == self.marker)
    }
}

fn flush_run(run: &mut Vec<SourceLine<'_>>, blocks: &mut Vec<Block>) -> Result<()> {
    if run.is_empty() {
        return Ok(());
    }
    blocks.extend(parse_markdown(run)?);
    run.clear();
    Ok(())
}

/// True if the next line added to `run` would open a new paragraph.
fn at_paragraph_start(run: &[SourceLine<'_>]) -> bool {
    run.last().is_none_or(|l| l.text.trim().is_empty())
}

struct BlockParser<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> BlockParser<'a> {
    const fn new(lines: Vec<&'a str>) -> Self {
        Self { lines, pos: 0 }
    }

    const fn line_no(&self, index: usize) -> usize {
        index + 1
    }

    fn parse_blocks(&mut self, open: Option<&OpenTag>) -> Result<Vec<Block>> {
        let mut blocks = Vec::new();
        let mut run: Vec<SourceLine<'a>> = Vec::new();

        while self.pos < self.lines.len() {
            let raw = self.lines[self.pos];
            let line = raw.trim();
            let line_no = self.line_no(self.pos);

            if let Some(fence) = Fence::parse(line) {
                self.code_block(&fence, &mut run)?;
                continue;
            }

            if line.starts_with("<!--") {
                self.html_comment(&mut run);
                continue;
            }

            if line.starts_with("{/*") {
                self.comment()?;
                continue;
            }

            if let Some(tag) = self.block_tag()? {
                flush_run(&mut run, &mut blocks)?;
                self.pos += tag.lines;
                let TagToken {
                    kind,
                    name,
                    attributes,
                    ..
                } = tag.token;

                match kind {
                    TagKind::Close => {
                        return match open {
                            Some(open) if open.name == name => Ok(blocks),
                            Some(open) => Err(CompileError::MismatchedClosingTag {
                                expected: open.name.clone(),
                                found: name,
                                line: line_no,
                            }),
                            None => Err(CompileError::UnexpectedClosingTag {
                                tag: name,
                                line: line_no,
                            }),
                        };
                    }
                    TagKind::SelfClosing => {
                        blocks.push(Block::Element(Element {
                            name,
                            attributes,
                            children: Vec::new(),
                            line: line_no,
                        }));
                    }
                    TagKind::Open => {
                        let open_tag = OpenTag {
                            name,
                            line: line_no,
                        };
                        let children = self.parse_blocks(Some(&open_tag))?;
                        blocks.push(Block::Element(Element {
                            name: open_tag.name,
                            attributes,
                            children,
                            line: line_no,
                        }));
                    }
                }
                continue;
            }

            if open.is_none()
                && at_paragraph_start(&run)
                && let Some(caps) = STATEMENT.captures(line)
            {
                return Err(CompileError::UnsupportedStatement {
                    keyword: caps[1].to_string(),
                    line: line_no,
                });
            }

            run.push(SourceLine::new(raw, line_no));
            self.pos += 1;
        }

        flush_run(&mut run, &mut blocks)?;

        match open {
            Some(open) => Err(CompileError::UnclosedTag {
                tag: open.name.clone(),
                line: open.line,
            }),
            None => Ok(blocks),
        }
    }

    /// Recognises a tag that occupies its line(s) alone. Attributes may span
    /// several lines.
    fn block_tag(&self) -> Result<Option<BlockTag>> {
        let first = self.lines[self.pos].trim_start();
        if !starts_tag(first, 0) {
            return Ok(None);
        }

        let line_no = self.line_no(self.pos);
        let mut joined = first.to_string();
        let mut lines = 1;
        loop {
            match scan_tag(&joined, 0, line_no)? {
                TagScan::Complete(token) => {
                    if joined[token.end..].trim().is_empty() {
                        return Ok(Some(BlockTag { token, lines }));
                    }
                    return Ok(None);
                }
                TagScan::NotATag => return Ok(None),
                TagScan::Incomplete => {
                    let Some(next) = self.lines.get(self.pos + lines) else {
                        return Err(CompileError::UnterminatedTag { line: line_no });
                    };
                    joined.push('\n');
                    joined.push_str(next);
                    lines += 1;
                }
            }
        }
    }

    /// Moves a fenced code block into the Markdown run unchanged.
    fn code_block(&mut self, fence: &Fence, run: &mut Vec<SourceLine<'a>>) -> Result<()> {
        let start_line = self.line_no(self.pos);
        run.push(SourceLine::new(self.lines[self.pos], start_line));
        self.pos += 1;

        while let Some(&raw) = self.lines.get(self.pos) {
            run.push(SourceLine::new(raw, self.line_no(self.pos)));
            self.pos += 1;
            if fence.closes(raw.trim()) {
                return Ok(());
            }
        }

        Err(CompileError::UnterminatedCodeFence { line: start_line })
    }

    /// Moves an HTML comment into the Markdown run unchanged; it is dropped
    /// there. An unclosed comment runs to the end of the document.
    fn html_comment(&mut self, run: &mut Vec<SourceLine<'a>>) {
        let mut first = true;
        while let Some(&raw) = self.lines.get(self.pos) {
            run.push(SourceLine::new(raw, self.line_no(self.pos)));
            self.pos += 1;
            let body = if first {
                raw.trim_start().get(4..).unwrap_or("")
            } else {
                raw
            };
            first = false;
            if body.contains("-->") {
                return;
            }
        }
    }

    /// Skips a `{/* ... */}` comment. Text after the terminator on the same
    /// line is parsed as if it started the line.
    fn comment(&mut self) -> Result<()> {
        let start_line = self.line_no(self.pos);
        let first: &'a str = self.lines[self.pos];
        let mut current = first.trim_start();
        let mut search_from = 3;

        loop {
            if let Some(idx) = current[search_from..].find("*/}") {
                let rest = &current[search_from + idx + 3..];
                if rest.trim().is_empty() {
                    self.pos += 1;
                } else {
                    self.lines[self.pos] = rest;
                }
                return Ok(());
            }
            self.pos += 1;
            match self.lines.get(self.pos) {
                Some(&next) => {
                    current = next;
                    search_from = 0;
                }
                None => return Err(CompileError::UnterminatedExpression { line: start_line }),
            }
        }
    }
}
