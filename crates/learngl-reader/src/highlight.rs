//! Syntax highlighting for fenced code.
//!
//! Code is highlighted with syntect's bundled grammars and the
//! `base16-ocean.dark` theme into inline-styled spans. Shader languages use
//! the C grammar. Unknown languages are left to the caller's plain-text
//! rendering.

use once_cell::sync::Lazy;
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::html::{IncludeBackground, styled_line_to_highlighted_html};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

const THEME: &str = "base16-ocean.dark";

static SYNTAXES: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEMES: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

fn syntax_for(language: &str) -> Option<&'static SyntaxReference> {
    let language = language.to_ascii_lowercase();
    let token = match language.as_str() {
        "glsl" | "vert" | "frag" | "geom" | "comp" | "shader" => "c",
        other => other,
    };
    SYNTAXES
        .find_syntax_by_token(token)
        .filter(|syntax| syntax.name != "Plain Text")
}

/// Highlights `code` as `language`, returning HTML spans.
///
/// Returns `None` when the language has no grammar or highlighting fails.
pub fn highlight(code: &str, language: &str) -> Option<String> {
    let syntax = syntax_for(language)?;
    let theme = THEMES.themes.get(THEME)?;
    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut html = String::with_capacity(code.len() * 4);

    for line in LinesWithEndings::from(code) {
        let ranges = match highlighter.highlight_line(line, &SYNTAXES) {
            Ok(ranges) => ranges,
            Err(e) => {
                tracing::debug!("Highlighting '{}' failed: {}", language, e);
                return None;
            }
        };
        let spans = styled_line_to_highlighted_html(&ranges, IncludeBackground::No).ok()?;
        html.push_str(&spans);
    }

    Some(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_language() {
        let html = highlight("int x = 1;", "cpp").unwrap();
        assert!(html.contains("<span style=\"color:"));
        assert!(html.contains("int"));
    }

    #[test]
    fn test_shader_alias() {
        assert!(highlight("void main() {}", "glsl").is_some());
        assert!(highlight("void main() {}", "GLSL").is_some());
        assert!(highlight("void main() {}", "frag").is_some());
    }

    #[test]
    fn test_unknown_language_falls_back() {
        assert_eq!(highlight("x", "klingon"), None);
        assert_eq!(highlight("x", "text"), None);
    }

    #[test]
    fn test_output_is_escaped() {
        let html = highlight("if (a < b && c) {}", "c").unwrap();
        assert!(html.contains("&lt;"));
        assert!(!html.contains("a < b"));
    }

    #[test]
    fn test_multiline_keeps_newlines() {
        let html = highlight("int a;\nint b;", "c").unwrap();
        assert_eq!(html.matches('\n').count(), 1);
    }
}
