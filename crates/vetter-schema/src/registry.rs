//! # Schema Registry
//!
//! Rule-source documents may carry a `definitions` map that their rules
//! reference by document name, e.g. `$ref: "kubernetes#/definitions/labels"`.
//! The registry stores those maps keyed by document name and makes them
//! available to compilation through a local retriever, so no `$ref` ever
//! triggers a network request.
//!
//! ## Resolution
//!
//! A rule schema has no `$id`, so jsonschema resolves a relative reference
//! such as `kubernetes#/...` against its default base URI. The retriever
//! strips everything up to the last `/` and looks the remainder up by
//! document name. Unknown names fail compilation.

use std::collections::HashMap;
use std::sync::Arc;

use jsonschema::{Retrieve, Uri};
use serde_json::{Map, Value};

/// Shared schema definitions, keyed by rule-source document name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    documents: Arc<HashMap<String, Value>>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the `definitions` map of the rule-source document `name`.
    ///
    /// A later registration under the same name replaces the earlier one.
    pub fn register(&mut self, name: &str, definitions: Map<String, Value>) {
        let mut doc = Map::new();
        doc.insert("definitions".to_string(), Value::Object(definitions));
        let replaced = Arc::make_mut(&mut self.documents).insert(name.to_string(), Value::Object(doc));
        if replaced.is_some() {
            tracing::warn!(name, "schema definitions registered twice, keeping the later set");
        } else {
            tracing::debug!(name, "registered schema definitions");
        }
    }

    /// Returns true if a document with this name has been registered.
    pub fn contains(&self, name: &str) -> bool {
        self.documents.contains_key(name)
    }

    /// Number of registered documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Registered document names, sorted alphabetically.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.documents.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Look up a registered document by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.documents.get(name)
    }

    /// Resolve a `$ref` string to `(document root, target)`.
    ///
    /// `local_root` is the schema the reference appears in; it is used for
    /// fragment-only references (`#/definitions/x`). References naming a
    /// document (`name#/definitions/x`, `name`) are looked up in the
    /// registry.
    pub fn resolve<'a>(&'a self, reference: &str, local_root: &'a Value) -> Option<(&'a Value, &'a Value)> {
        let (base, fragment) = reference.split_once('#').unwrap_or((reference, ""));
        let root = if base.is_empty() {
            local_root
        } else {
            self.documents.get(document_name(base))?
        };
        let target = if fragment.is_empty() {
            root
        } else {
            root.pointer(fragment)?
        };
        Some((root, target))
    }

    /// Build the retriever handed to jsonschema at compile time.
    pub(crate) fn retriever(&self) -> RegistryRetriever {
        RegistryRetriever {
            documents: Arc::clone(&self.documents),
        }
    }
}

/// Last path segment of a reference base, i.e. the document name.
fn document_name(base: &str) -> &str {
    base.rsplit('/').next().unwrap_or(base)
}

/// Retriever that serves `$ref` targets from a registry snapshot.
pub(crate) struct RegistryRetriever {
    documents: Arc<HashMap<String, Value>>,
}

impl Retrieve for RegistryRetriever {
    fn retrieve(&self, uri: &Uri<&str>) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        let name = document_name(uri_str);
        self.documents
            .get(name)
            .cloned()
            .ok_or_else(|| format!("no schema definitions registered for {uri_str:?}").into())
    }
}
