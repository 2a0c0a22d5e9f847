//! # Document Trees
//!
//! Every document the engine touches (rule sources and targets alike) is
//! held as a `serde_json::Value`. YAML input is parsed with `serde_yaml`
//! and converted into the JSON value tree so that schema validation,
//! path selection and diffing all operate on one representation.
//!
//! Nodes inside a tree are addressed by RFC 6901 JSON Pointers. The
//! helpers at the bottom of this module build pointers one token at a
//! time.

use serde::Deserialize;
use serde_json::Value;

use crate::error::TreeError;

/// Serialization format of a document stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    /// One or more YAML documents separated by `---`.
    #[default]
    Yaml,
    /// A single JSON document.
    Json,
}

impl DocumentFormat {
    /// Guess the format from a file extension; anything but `.json` is YAML.
    pub fn from_extension(ext: Option<&str>) -> Self {
        match ext {
            Some(e) if e.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Parse a text stream into its documents.
///
/// YAML streams may hold several documents; JSON always yields exactly one.
///
/// # Errors
///
/// Returns `TreeError::Yaml`/`TreeError::Json` on malformed text and
/// `TreeError::Unsupported` for YAML constructs without a JSON equivalent.
pub fn parse_documents(text: &str, format: DocumentFormat) -> Result<Vec<Value>, TreeError> {
    match format {
        DocumentFormat::Json => Ok(vec![serde_json::from_str(text)?]),
        DocumentFormat::Yaml => {
            let mut docs = Vec::new();
            for de in serde_yaml::Deserializer::from_str(text) {
                let yaml = serde_yaml::Value::deserialize(de)?;
                docs.push(yaml_to_json_value(&yaml)?);
            }
            Ok(docs)
        }
    }
}

/// Render documents back into a text stream.
///
/// YAML documents are separated by `---`; JSON documents are pretty-printed
/// one after another.
pub fn render_documents(docs: &[Value], format: DocumentFormat) -> Result<String, TreeError> {
    let mut out = String::new();
    for (i, doc) in docs.iter().enumerate() {
        match format {
            DocumentFormat::Yaml => {
                if i > 0 {
                    out.push_str("---\n");
                }
                out.push_str(&serde_yaml::to_string(doc)?);
            }
            DocumentFormat::Json => {
                out.push_str(&serde_json::to_string_pretty(doc)?);
                out.push('\n');
            }
        }
    }
    Ok(out)
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// YAML has a richer type system than JSON (tags, non-string keys), but
/// rule sources and target documents use only the JSON-compatible subset.
/// Tags are dropped and scalar keys are stringified.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, TreeError> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| TreeError::Unsupported(format!("non-finite float {f}")))
            } else {
                Err(TreeError::Unsupported(format!("YAML number {n:?}")))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, TreeError> = seq.iter().map(yaml_to_json_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => {
                        return Err(TreeError::Unsupported(format!("map key {other:?}")));
                    }
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}

/// Escape one reference token for use in a JSON Pointer (RFC 6901 §4).
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Append an object key to a JSON Pointer.
pub fn pointer_with_key(base: &str, key: &str) -> String {
    format!("{base}/{}", escape_token(key))
}

/// Append an array index to a JSON Pointer.
pub fn pointer_with_index(base: &str, index: usize) -> String {
    format!("{base}/{index}")
}
