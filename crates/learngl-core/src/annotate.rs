//! Function-reference annotator.
//!
//! Scans a run of plain text (typically an inline code span) for OpenGL and
//! GLFW function names and splits it into literal runs and references that
//! carry the resolved [`FunctionRecord`].
//!
//! The scan is a single left-to-right pass over non-overlapping regex
//! matches. Tokens that do not resolve stay inside the surrounding literal
//! run, so concatenating every segment's text always reproduces the input.

use crate::functions::{FunctionRecord, FunctionTable, MatchKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;

/// `gl`/`glfw` followed by an uppercase letter and any letters or digits,
/// or the whitelisted `glfwGetTime`.
static FUNCTION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:glfw|gl)[A-Z][A-Za-z0-9]*\b|\bglfwGetTime\b").unwrap());

/// One piece of annotated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnnotationSegment {
    /// Plain text, copied verbatim from the input.
    Literal { text: String },
    /// A resolved function token. `token` is the text as it appears in the
    /// input, which may differ from `record.name` for family matches.
    Reference {
        token: String,
        #[serde(rename = "match")]
        kind: MatchKind,
        record: Arc<FunctionRecord>,
    },
}

impl AnnotationSegment {
    /// The input text this segment covers.
    pub fn text(&self) -> &str {
        match self {
            Self::Literal { text } => text,
            Self::Reference { token, .. } => token,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference { .. })
    }
}

/// Result of annotating one input string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    segments: Vec<AnnotationSegment>,
}

impl Annotation {
    pub fn segments(&self) -> &[AnnotationSegment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<AnnotationSegment> {
        self.segments
    }

    /// True if at least one token resolved. When false the annotation is a
    /// single literal equal to the input and callers usually fall back to
    /// plain code styling.
    pub fn has_references(&self) -> bool {
        self.segments.iter().any(AnnotationSegment::is_reference)
    }

    /// Concatenated segment text; always equal to the annotated input.
    pub fn text(&self) -> String {
        self.segments.iter().map(AnnotationSegment::text).collect()
    }
}

/// Annotates text against a [`FunctionTable`].
///
/// # Examples
///
/// ```
/// use learngl_core::annotate::{AnnotationSegment, FunctionAnnotator};
/// use learngl_core::functions::FunctionTable;
///
/// let table = FunctionTable::builtin();
/// let annotator = FunctionAnnotator::new(&table);
/// let annotation = annotator.annotate("glUniform3fv(loc, 1, values)");
///
/// match &annotation.segments()[0] {
///     AnnotationSegment::Reference { token, record, .. } => {
///         assert_eq!(token, "glUniform3fv");
///         assert_eq!(record.name, "glUniform");
///     }
///     other => panic!("unexpected {other:?}"),
/// }
/// assert_eq!(annotation.text(), "glUniform3fv(loc, 1, values)");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FunctionAnnotator<'t> {
    table: &'t FunctionTable,
}

impl<'t> FunctionAnnotator<'t> {
    pub fn new(table: &'t FunctionTable) -> Self {
        Self { table }
    }

    /// Splits `input` into literal runs and resolved references.
    pub fn annotate(&self, input: &str) -> Annotation {
        let mut segments = Vec::new();
        let mut last_end = 0;

        for token in FUNCTION_TOKEN.find_iter(input) {
            let Some(resolution) = self.table.resolve(token.as_str()) else {
                continue;
            };

            if token.start() > last_end {
                segments.push(AnnotationSegment::Literal {
                    text: input[last_end..token.start()].to_string(),
                });
            }
            segments.push(AnnotationSegment::Reference {
                token: token.as_str().to_string(),
                kind: resolution.kind,
                record: resolution.record,
            });
            last_end = token.end();
        }

        if segments.is_empty() {
            return Annotation {
                segments: vec![AnnotationSegment::Literal {
                    text: input.to_string(),
                }],
            };
        }

        if last_end < input.len() {
            segments.push(AnnotationSegment::Literal {
                text: input[last_end..].to_string(),
            });
        }

        Annotation { segments }
    }
}
