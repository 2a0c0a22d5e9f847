//! # Rule Catalog
//!
//! Loads rule-source files into typed [`RuleDefinition`]s and registers
//! their shared `definitions` with a [`SchemaRegistry`].
//!
//! ## Ordering
//!
//! Rules are appended in document order within a file and in path order
//! across files. Directory loads take every `*.yml`, `*.yaml` and `*.json`
//! file directly inside the directory, sorted by file name.
//!
//! ## Atomicity
//!
//! Every load call parses all of its inputs before touching the catalog.
//! A missing path or malformed document fails the call and leaves the
//! catalog exactly as it was.

use std::path::{Path, PathBuf};

use vetter_core::{parse_documents, DocumentFormat};
use vetter_schema::SchemaRegistry;

use crate::definition::{RuleDefinition, RuleSource};
use crate::error::CatalogError;

/// File extensions picked up by directory loads.
const RULE_EXTENSIONS: &[&str] = &["yml", "yaml", "json"];

/// The full set of loaded rules plus their shared schema definitions.
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    rules: Vec<RuleDefinition>,
    registry: SchemaRegistry,
    sources: Vec<String>,
}

impl RuleCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fresh catalog from rule-source files.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for a missing path and
    /// `CatalogError::Parse` for malformed content.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        catalog.load_files(paths)?;
        Ok(catalog)
    }

    /// Add the rules from several files, all or nothing.
    pub fn load_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<usize, CatalogError> {
        let mut parsed = Vec::new();
        for path in paths {
            parsed.extend(read_source_file(path.as_ref())?);
        }
        Ok(self.commit(parsed))
    }

    /// Add the rules from one file.
    pub fn load_file(&mut self, path: &Path) -> Result<usize, CatalogError> {
        let parsed = read_source_file(path)?;
        Ok(self.commit(parsed))
    }

    /// Add the rules from every rule-source file in `dir`.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, CatalogError> {
        let files = list_rule_files(dir)?;
        tracing::debug!(dir = %dir.display(), files = files.len(), "scanning rule directory");
        self.load_files(&files)
    }

    /// Add the rules from in-memory text. `source_name` labels errors.
    pub fn load_str(
        &mut self,
        text: &str,
        format: DocumentFormat,
        source_name: &str,
    ) -> Result<usize, CatalogError> {
        let parsed = parse_sources(text, format, source_name)?;
        Ok(self.commit(parsed))
    }

    /// All loaded rules, in load order.
    pub fn rules(&self) -> &[RuleDefinition] {
        &self.rules
    }

    /// Registry holding every loaded document's shared definitions.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Names of the loaded rule-source documents, in load order.
    pub fn source_names(&self) -> &[String] {
        &self.sources
    }

    /// Number of loaded rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rules are loaded.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn commit(&mut self, sources: Vec<RuleSource>) -> usize {
        let mut added = 0;
        for source in sources {
            if let Some(definitions) = source.definitions {
                self.registry.register(&source.name, definitions);
            }
            added += source.rules.len();
            self.rules
                .extend(source.rules.into_iter().map(RuleDefinition::normalize));
            tracing::debug!(source = %source.name, "loaded rule source");
            self.sources.push(source.name);
        }
        added
    }
}

fn read_source_file(path: &Path) -> Result<Vec<RuleSource>, CatalogError> {
    if !path.exists() {
        return Err(CatalogError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let format = DocumentFormat::from_extension(path.extension().and_then(|e| e.to_str()));
    parse_sources(&text, format, &path.display().to_string())
}

fn parse_sources(
    text: &str,
    format: DocumentFormat,
    source_name: &str,
) -> Result<Vec<RuleSource>, CatalogError> {
    let docs = parse_documents(text, format).map_err(|e| CatalogError::Parse {
        source_name: source_name.to_string(),
        reason: e.to_string(),
    })?;

    let mut sources = Vec::with_capacity(docs.len());
    for (index, doc) in docs.into_iter().enumerate() {
        if doc.is_null() {
            tracing::debug!(source = source_name, index, "skipping empty rule document");
            continue;
        }
        let source: RuleSource = serde_json::from_value(doc).map_err(|e| CatalogError::Parse {
            source_name: format!("{source_name}[{index}]"),
            reason: e.to_string(),
        })?;
        sources.push(source);
    }
    Ok(sources)
}

fn list_rule_files(dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    if !dir.is_dir() {
        return Err(CatalogError::NotFound {
            path: dir.to_path_buf(),
        });
    }
    let entries = std::fs::read_dir(dir).map_err(|source| CatalogError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CatalogError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_rule_file = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| RULE_EXTENSIONS.contains(&ext));
        if path.is_file() && is_rule_file {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NETWORK: &str = r#"
name: network
definitions:
  port: { type: integer }
rules:
  - name: port-required
    desc: servers declare a port
    level: error
    tags: [network]
    select: '$.servers[*]'
    check: { required: [port] }
---
name: naming
rules:
  - name: has-name
    desc: document is named
    level: warn
    tags: [meta]
    select: ''
    check: { required: [name] }
"#;

    #[test]
    fn test_load_str_multi_document() {
        let mut catalog = RuleCatalog::new();
        let added = catalog.load_str(NETWORK, DocumentFormat::Yaml, "inline").unwrap();
        assert_eq!(added, 2);
        let names: Vec<&str> = catalog.rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["port-required", "has-name"]);
        assert_eq!(catalog.source_names(), &["network".to_string(), "naming".to_string()]);
        assert!(catalog.registry().contains("network"));
        assert!(!catalog.registry().contains("naming"));
    }

    #[test]
    fn test_blank_select_is_normalized_on_load() {
        let mut catalog = RuleCatalog::new();
        catalog.load_str(NETWORK, DocumentFormat::Yaml, "inline").unwrap();
        assert_eq!(catalog.rules()[1].select, "$");
    }

    #[test]
    fn test_malformed_document_leaves_catalog_untouched() {
        let mut catalog = RuleCatalog::new();
        catalog.load_str(NETWORK, DocumentFormat::Yaml, "inline").unwrap();

        let broken = "name: ok\nrules: []\n---\nname: bad\nrules:\n  - {name: a}\n";
        let err = catalog.load_str(broken, DocumentFormat::Yaml, "broken").unwrap_err();
        match &err {
            CatalogError::Parse { source_name, .. } => assert_eq!(source_name, "broken[1]"),
            other => panic!("Expected Parse, got: {other}"),
        }
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.source_names().len(), 2);
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let err = RuleCatalog::new()
            .load_str("name: [", DocumentFormat::Yaml, "bad.yml")
            .unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = RuleCatalog::load(&["/definitely/not/here.yml"]).unwrap_err();
        assert!(
            matches!(err, CatalogError::NotFound { .. }),
            "Expected NotFound, got: {err}"
        );
    }
}
