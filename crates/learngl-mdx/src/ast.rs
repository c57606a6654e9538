//! Document tree produced by the parser.

use serde_json::Value;

/// A parsed document: an ordered list of blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading {
        level: u8,
        content: Vec<Inline>,
    },
    Paragraph(Vec<Inline>),
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    List {
        ordered: bool,
        start: Option<u64>,
        /// No blank lines between or inside items; paragraphs render unwrapped.
        tight: bool,
        items: Vec<Vec<Block>>,
    },
    BlockQuote(Vec<Block>),
    ThematicBreak,
    Table {
        alignments: Vec<Alignment>,
        head: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },
    Element(Element<Block>),
}

/// Column alignment from a table's delimiter row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

impl Alignment {
    /// CSS `text-align` value, if the column has one.
    pub fn as_css(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Left => Some("left"),
            Self::Center => Some("center"),
            Self::Right => Some("right"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Code(String),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Link { url: String, children: Vec<Inline> },
    Image { url: String, alt: String },
    HardBreak,
    Element(Element<Inline>),
}

/// A JSX-style tag with its children. `C` is [`Block`] for elements that
/// stand on their own lines and [`Inline`] for elements inside text.
#[derive(Debug, Clone, PartialEq)]
pub struct Element<C> {
    pub name: String,
    pub attributes: Attributes,
    pub children: Vec<C>,
    /// 1-based line of the opening tag.
    pub line: usize,
}

impl<C> Element<C> {
    /// Capitalised or dotted names are components and must be registered;
    /// everything else is an intrinsic HTML element.
    pub fn is_component(&self) -> bool {
        is_component_name(&self.name)
    }
}

pub(crate) fn is_component_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_uppercase()) || name.contains('.')
}

impl Inline {
    /// Plain text of this node and its descendants, without markup.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text(text) | Self::Code(text) => out.push_str(text),
            Self::Emphasis(children)
            | Self::Strong(children)
            | Self::Strikethrough(children)
            | Self::Link { children, .. } => {
                children.iter().for_each(|c| c.collect_text(out));
            }
            Self::Image { alt, .. } => out.push_str(alt),
            Self::HardBreak => out.push('\n'),
            Self::Element(element) => element.children.iter().for_each(|c| c.collect_text(out)),
        }
    }
}

/// Value of a single tag attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// `name="value"` or `name='value'`
    String(String),
    /// Bare `name`, always `true`.
    Bool(bool),
    /// `name={...}` holding a JSON literal.
    Json(Value),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Json(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) | Self::Json(Value::Bool(b)) => Some(*b),
            Self::String(s) => s.parse().ok(),
            Self::Json(_) => None,
        }
    }

    /// The value as JSON; strings and booleans convert to their JSON form.
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Bool(b) => Value::Bool(*b),
            Self::Json(v) => v.clone(),
        }
    }
}

/// Ordered tag attributes. A repeated name replaces the earlier value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    entries: Vec<(String, AttributeValue)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: AttributeValue) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Builder form of [`Attributes::insert`] for string values.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, AttributeValue::String(value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttributeValue::as_str)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(AttributeValue::as_bool)
    }

    /// `true` only if the attribute is present and truthy.
    pub fn flag(&self, name: &str) -> bool {
        self.get_bool(name).unwrap_or(false)
    }

    pub fn get_json(&self, name: &str) -> Option<Value> {
        self.get(name).map(AttributeValue::to_json)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
