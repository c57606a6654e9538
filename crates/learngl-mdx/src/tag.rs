//! JSX-style tag scanning shared by the block and inline parsers.

use crate::ast::{AttributeValue, Attributes};
use crate::error::{CompileError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TagKind {
    Open,
    SelfClosing,
    Close,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TagToken {
    pub(crate) kind: TagKind,
    pub(crate) name: String,
    pub(crate) attributes: Attributes,
    /// Byte offset just past the closing `>`.
    pub(crate) end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TagScan {
    Complete(TagToken),
    /// Input ended before the tag did.
    Incomplete,
    /// `<` not followed by a tag name.
    NotATag,
}

/// 1-based line of byte offset `pos`, given the line of `src[0]`.
pub(crate) fn line_at(src: &str, pos: usize, base_line: usize) -> usize {
    base_line + src[..pos].bytes().filter(|&b| b == b'\n').count()
}

/// True if `<` at `pos` starts a tag rather than literal text.
pub(crate) fn starts_tag(src: &str, pos: usize) -> bool {
    let bytes = &src.as_bytes()[pos..];
    match bytes {
        [b'<', b'/', c, ..] | [b'<', c, ..] => c.is_ascii_alphabetic(),
        _ => false,
    }
}

/// Finds the brace matching the `{` at `open`, skipping string literals.
/// Returns the text between the braces and the offset past the closing `}`.
pub(crate) fn balanced_braces(src: &str, open: usize) -> Option<(&str, usize)> {
    let bytes = src.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = open;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q {
                quote = None;
            }
        } else {
            match b {
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    let close = src[i + 2..].find("*/")?;
                    i += close + 4;
                    continue;
                }
                b'"' | b'\'' | b'`' => quote = Some(b),
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some((&src[open + 1..i], i + 1));
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_' | b':')
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
        i += 1;
    }
    i
}

/// Scans the tag starting at `src[start] == '<'`.
///
/// Attribute values are quoted strings, bare names (boolean `true`), or
/// `{...}` holding a JSON literal. `{/* ... */}` comments between attributes
/// are skipped. Any other expression is rejected.
pub(crate) fn scan_tag(src: &str, start: usize, base_line: usize) -> Result<TagScan> {
    let bytes = src.as_bytes();
    let mut i = start + 1;

    let closing = bytes.get(i) == Some(&b'/');
    if closing {
        i += 1;
    }

    if !bytes.get(i).is_some_and(u8::is_ascii_alphabetic) {
        return Ok(TagScan::NotATag);
    }
    let name_start = i;
    while bytes.get(i).copied().is_some_and(is_name_byte) {
        i += 1;
    }
    let name = &src[name_start..i];

    let malformed = |at: usize, reason: &str| CompileError::MalformedAttribute {
        tag: name.to_string(),
        line: line_at(src, at, base_line),
        reason: reason.to_string(),
    };

    if closing {
        i = skip_whitespace(bytes, i);
        return match bytes.get(i) {
            Some(b'>') => Ok(TagScan::Complete(TagToken {
                kind: TagKind::Close,
                name: name.to_string(),
                attributes: Attributes::new(),
                end: i + 1,
            })),
            None => Ok(TagScan::Incomplete),
            Some(_) => Err(malformed(i, "closing tags cannot have attributes")),
        };
    }

    let mut attributes = Attributes::new();
    loop {
        let before = i;
        i = skip_whitespace(bytes, i);
        let token = |kind, end| {
            TagScan::Complete(TagToken {
                kind,
                name: name.to_string(),
                attributes: attributes.clone(),
                end,
            })
        };

        match bytes.get(i) {
            None => return Ok(TagScan::Incomplete),
            Some(b'>') => return Ok(token(TagKind::Open, i + 1)),
            Some(b'/') => {
                return match bytes.get(i + 1) {
                    Some(b'>') => Ok(token(TagKind::SelfClosing, i + 2)),
                    None => Ok(TagScan::Incomplete),
                    Some(_) => Err(malformed(i, "expected '>' after '/'")),
                };
            }
            Some(b'{') => {
                let Some((expr, end)) = balanced_braces(src, i) else {
                    return Ok(TagScan::Incomplete);
                };
                let expr = expr.trim();
                if !(expr.starts_with("/*") && expr.ends_with("*/")) {
                    return Err(CompileError::UnsupportedExpression {
                        expression: expr.to_string(),
                        line: line_at(src, i, base_line),
                    });
                }
                i = end;
            }
            Some(&b) if b.is_ascii_alphabetic() || b == b'_' => {
                if i == before {
                    return Err(malformed(i, "attributes must be separated by whitespace"));
                }
                let attr_start = i;
                while bytes.get(i).copied().is_some_and(is_name_byte) {
                    i += 1;
                }
                let attr_name = &src[attr_start..i];

                let after_name = skip_whitespace(bytes, i);
                if bytes.get(after_name) != Some(&b'=') {
                    attributes.insert(attr_name, AttributeValue::Bool(true));
                    continue;
                }

                i = skip_whitespace(bytes, after_name + 1);
                let value = match bytes.get(i) {
                    None => return Ok(TagScan::Incomplete),
                    Some(&q @ (b'"' | b'\'')) => {
                        let Some(len) = src[i + 1..].find(q as char) else {
                            return Ok(TagScan::Incomplete);
                        };
                        let value = &src[i + 1..i + 1 + len];
                        i += len + 2;
                        AttributeValue::String(value.to_string())
                    }
                    Some(b'{') => {
                        let Some((expr, end)) = balanced_braces(src, i) else {
                            return Ok(TagScan::Incomplete);
                        };
                        let expr = expr.trim();
                        let value = serde_json::from_str(expr).map_err(|_| {
                            CompileError::UnsupportedExpression {
                                expression: expr.to_string(),
                                line: line_at(src, i, base_line),
                            }
                        })?;
                        i = end;
                        AttributeValue::Json(value)
                    }
                    Some(_) => {
                        return Err(malformed(
                            i,
                            &format!("value of `{attr_name}` must be quoted or wrapped in braces"),
                        ));
                    }
                };
                attributes.insert(attr_name, value);
            }
            Some(_) => return Err(malformed(i, "unexpected character")),
        }
    }
}
