//! OpenGL/GLFW function metadata table.
//!
//! The table maps canonical function names to [`FunctionRecord`]s. It is
//! loaded once from JSON (the builtin table is embedded in the binary) and is
//! immutable afterwards, so it can be shared freely across threads.
//!
//! Lookup follows two steps: an exact key match, then a fixed list of
//! [`FamilyRule`]s that map typed variants (`glUniform3fv`, `glGetFloatv`, ...)
//! onto the one record that documents the whole family.

use crate::error::{DocsError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

const BUILTIN_TABLE: &str = include_str!("../data/opengl_functions.json");

static BUILTIN: Lazy<Arc<FunctionTable>> = Lazy::new(|| {
    Arc::new(FunctionTable::from_json(BUILTIN_TABLE).expect("embedded function table is valid"))
});

/// One documented parameter of a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: String,
    #[serde(default)]
    pub description: String,
}

/// Documentation metadata for a single API call.
///
/// `params` and `tags` are parsed leniently: a malformed payload becomes an
/// empty list instead of failing the whole table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub params: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub tags: Vec<String>,
}

impl FunctionRecord {
    /// Creates a record with only a name; the rest is empty.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            description: None,
            example: None,
            tags: Vec::new(),
        }
    }
}

fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match serde_json::from_value(value) {
        Ok(items) => Ok(items),
        Err(e) => {
            tracing::warn!("malformed list in function record, using empty list: {}", e);
            Ok(Vec::new())
        }
    }
}

/// Heuristic families used when a token has no exact table entry.
///
/// Rules are tried in [`FamilyRule::ORDER`]; the first one whose shape matches
/// decides the outcome. Their prefixes are distinct, so at most one can match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilyRule {
    /// `glUniform{1-4}{f,i}[v]` → `glUniform`
    Uniform,
    /// `glVertexAttrib{1-4}{f,d}[v]` → `glVertexAttribPointer`
    VertexAttrib,
    /// `glTexParameter{i,f}[v]` → `glTexParameteri`, else `glTexParameterfv`
    TexParameter,
    /// `glGet{Integer,Float,Double,Boolean}[v]` → `glGetIntegerv`
    Get,
}

impl FamilyRule {
    pub const ORDER: [Self; 4] = [
        Self::Uniform,
        Self::VertexAttrib,
        Self::TexParameter,
        Self::Get,
    ];

    /// Returns true if `token` has this family's shape.
    pub fn matches(self, token: &str) -> bool {
        static UNIFORM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^glUniform[1-4][fi]v?$").unwrap());
        static VERTEX_ATTRIB: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^glVertexAttrib[1-4][fd]v?$").unwrap());
        static TEX_PARAMETER: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^glTexParameter[if]v?$").unwrap());
        static GET: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^glGet(?:Integer|Float|Double|Boolean)v?$").unwrap());

        match self {
            Self::Uniform => UNIFORM.is_match(token),
            Self::VertexAttrib => VERTEX_ATTRIB.is_match(token),
            Self::TexParameter => TEX_PARAMETER.is_match(token),
            Self::Get => GET.is_match(token),
        }
    }

    /// Canonical names this family resolves to, in preference order.
    pub fn targets(self) -> &'static [&'static str] {
        match self {
            Self::Uniform => &["glUniform"],
            Self::VertexAttrib => &["glVertexAttribPointer"],
            Self::TexParameter => &["glTexParameteri", "glTexParameterfv"],
            Self::Get => &["glGetIntegerv"],
        }
    }
}

/// How a token was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Family(FamilyRule),
}

/// A successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub record: Arc<FunctionRecord>,
    pub kind: MatchKind,
}

/// Immutable map from canonical function name to its record.
///
/// # Examples
///
/// ```
/// use learngl_core::functions::{FunctionTable, MatchKind, FamilyRule};
///
/// let table = FunctionTable::builtin();
/// let exact = table.resolve("glBindTexture").unwrap();
/// assert_eq!(exact.kind, MatchKind::Exact);
///
/// let family = table.resolve("glUniform4f").unwrap();
/// assert_eq!(family.record.name, "glUniform");
/// assert_eq!(family.kind, MatchKind::Family(FamilyRule::Uniform));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    entries: HashMap<String, Arc<FunctionRecord>>,
}

impl FunctionTable {
    /// Returns the table embedded in the binary.
    pub fn builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN)
    }

    /// Parses a table from a JSON object keyed by canonical name.
    ///
    /// Entries that are not objects, or that fail to deserialize, are skipped
    /// with a warning. A record without a `name` takes its key.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` is not JSON or the top level is not an object.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let serde_json::Value::Object(map) = value else {
            return Err(DocsError::InvalidFunctionTable(
                "expected an object keyed by function name".into(),
            ));
        };

        let mut entries = HashMap::with_capacity(map.len());
        for (key, entry) in map {
            match serde_json::from_value::<FunctionRecord>(entry) {
                Ok(mut record) => {
                    if record.name.is_empty() {
                        record.name.clone_from(&key);
                    }
                    entries.insert(key, Arc::new(record));
                }
                Err(e) => {
                    tracing::warn!("skipping function table entry {}: {}", key, e);
                }
            }
        }

        tracing::debug!("loaded function table with {} entries", entries.len());
        Ok(Self { entries })
    }

    /// Builds a table from records, keyed by each record's name.
    pub fn from_records(records: impl IntoIterator<Item = FunctionRecord>) -> Self {
        let entries = records
            .into_iter()
            .map(|record| (record.name.clone(), Arc::new(record)))
            .collect();
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<FunctionRecord>> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolves a token: exact entry first, then the first matching family rule.
    ///
    /// Returns `None` when nothing applies, or when the matching family's
    /// target records are all absent from this table.
    pub fn resolve(&self, token: &str) -> Option<Resolution> {
        if let Some(record) = self.entries.get(token) {
            return Some(Resolution {
                record: Arc::clone(record),
                kind: MatchKind::Exact,
            });
        }

        let rule = FamilyRule::ORDER.into_iter().find(|rule| rule.matches(token))?;
        rule.targets()
            .iter()
            .find_map(|target| self.entries.get(*target))
            .map(|record| Resolution {
                record: Arc::clone(record),
                kind: MatchKind::Family(rule),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_loads() {
        let table = FunctionTable::builtin();
        assert!(table.len() > 40);
        for name in [
            "glGenTextures",
            "glUniform",
            "glVertexAttribPointer",
            "glTexParameteri",
            "glGetIntegerv",
            "glfwGetTime",
            "glfwInit",
        ] {
            assert!(table.contains(name), "missing {name}");
        }
    }

    #[test]
    fn test_builtin_records_named_after_keys() {
        let table = FunctionTable::builtin();
        for name in table.names() {
            assert_eq!(table.get(name).unwrap().name, name);
        }
    }

    #[test]
    fn test_exact_match_wins() {
        let table = FunctionTable::builtin();
        let resolution = table.resolve("glGenTextures").unwrap();
        assert_eq!(resolution.kind, MatchKind::Exact);
        assert_eq!(resolution.record.name, "glGenTextures");
    }

    #[test]
    fn test_exact_match_beats_family_shape() {
        // glTexParameteri has the TexParameter shape and an exact entry.
        let table = FunctionTable::builtin();
        let resolution = table.resolve("glTexParameteri").unwrap();
        assert_eq!(resolution.kind, MatchKind::Exact);
    }

    #[test]
    fn test_uniform_family() {
        let table = FunctionTable::builtin();
        for token in ["glUniform1i", "glUniform3fv", "glUniform4f", "glUniform2iv"] {
            let resolution = table.resolve(token).unwrap();
            assert_eq!(resolution.record.name, "glUniform", "{token}");
            assert_eq!(resolution.kind, MatchKind::Family(FamilyRule::Uniform));
        }
        assert!(table.resolve("glUniform5f").is_none());
        assert!(table.resolve("glUniform3d").is_none());
    }

    #[test]
    fn test_vertex_attrib_family() {
        let table = FunctionTable::builtin();
        let resolution = table.resolve("glVertexAttrib3f").unwrap();
        assert_eq!(resolution.record.name, "glVertexAttribPointer");
        assert!(table.resolve("glVertexAttrib3i").is_none());
    }

    #[test]
    fn test_tex_parameter_family_prefers_integer_variant() {
        let table = FunctionTable::builtin();
        let resolution = table.resolve("glTexParameterf").unwrap();
        assert_eq!(resolution.record.name, "glTexParameteri");

        let only_fv = FunctionTable::from_records([FunctionRecord::named("glTexParameterfv")]);
        let resolution = only_fv.resolve("glTexParameteriv").unwrap();
        assert_eq!(resolution.record.name, "glTexParameterfv");
    }

    #[test]
    fn test_get_family() {
        let table = FunctionTable::builtin();
        for token in ["glGetFloatv", "glGetDouble", "glGetBooleanv", "glGetInteger"] {
            let resolution = table.resolve(token).unwrap();
            assert_eq!(resolution.record.name, "glGetIntegerv", "{token}");
        }
        assert!(table.resolve("glGetString").is_none());
    }

    #[test]
    fn test_family_without_target_resolves_nothing() {
        let table = FunctionTable::from_records([FunctionRecord::named("glClear")]);
        assert!(table.resolve("glUniform1f").is_none());
    }

    #[test]
    fn test_rules_are_mutually_exclusive() {
        for token in ["glUniform1f", "glVertexAttrib2d", "glTexParameterfv", "glGetFloatv"] {
            let hits = FamilyRule::ORDER
                .iter()
                .filter(|rule| rule.matches(token))
                .count();
            assert_eq!(hits, 1, "{token}");
        }
    }

    #[test]
    fn test_malformed_params_degrade_to_empty() {
        let json = r#"{
            "glFoo": {
                "name": "glFoo",
                "params": "not a list",
                "description": "d",
                "tags": [1, 2]
            }
        }"#;
        let table = FunctionTable::from_json(json).unwrap();
        let record = table.get("glFoo").unwrap();
        assert!(record.params.is_empty());
        assert!(record.tags.is_empty());
        assert_eq!(record.description.as_deref(), Some("d"));
    }

    #[test]
    fn test_missing_name_takes_key() {
        let table = FunctionTable::from_json(r#"{"glBar": {}}"#).unwrap();
        assert_eq!(table.get("glBar").unwrap().name, "glBar");
    }

    #[test]
    fn test_non_object_entry_skipped() {
        let table = FunctionTable::from_json(r#"{"glBar": 3, "glBaz": {}}"#).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.contains("glBaz"));
    }

    #[test]
    fn test_top_level_must_be_object() {
        let result = FunctionTable::from_json("[]");
        assert!(matches!(result, Err(DocsError::InvalidFunctionTable(_))));
    }

    #[test]
    fn test_names_sorted() {
        let table = FunctionTable::from_records([
            FunctionRecord::named("glViewport"),
            FunctionRecord::named("glClear"),
        ]);
        assert_eq!(table.names(), vec!["glClear", "glViewport"]);
    }
}
