//! Document input and output. `-` names stdin or stdout.

use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use vetter_core::{parse_documents, render_documents, DocumentFormat};

/// Path standing for stdin/stdout.
pub const STDIO: &str = "-";

/// Returns true if `path` names stdin/stdout.
pub fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == STDIO
}

/// Read every document from `source`.
///
/// Files ending in `.json` are parsed as JSON; everything else, stdin
/// included, as (possibly multi-document) YAML.
pub fn read_documents(source: &Path) -> Result<Vec<Value>> {
    let (text, format) = if is_stdio(source) {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read documents from stdin")?;
        (text, DocumentFormat::Yaml)
    } else {
        let text = std::fs::read_to_string(source)
            .with_context(|| format!("failed to read {}", source.display()))?;
        let format = DocumentFormat::from_extension(source.extension().and_then(|e| e.to_str()));
        (text, format)
    };
    let docs = parse_documents(&text, format)
        .with_context(|| format!("failed to parse {}", source.display()))?;
    tracing::debug!(source = %source.display(), documents = docs.len(), "read documents");
    Ok(docs)
}

/// Render `docs` in `format` and write them to `dest`.
pub fn write_documents(dest: &Path, docs: &[Value], format: DocumentFormat) -> Result<()> {
    let text = render_documents(docs, format).context("failed to render documents")?;
    if is_stdio(dest) {
        let mut out = std::io::stdout().lock();
        out.write_all(text.as_bytes())
            .and_then(|()| out.flush())
            .context("failed to write documents to stdout")?;
    } else {
        std::fs::write(dest, text).with_context(|| format!("failed to write {}", dest.display()))?;
    }
    tracing::debug!(dest = %dest.display(), documents = docs.len(), "wrote documents");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_multi_document_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.yml");
        std::fs::write(&path, "a: 1\n---\nb: 2\n").unwrap();
        let docs = read_documents(&path).unwrap();
        assert_eq!(docs, vec![json!({"a": 1}), json!({"b": 2})]);
    }

    #[test]
    fn test_read_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, r#"{"servers": []}"#).unwrap();
        assert_eq!(read_documents(&path).unwrap(), vec![json!({"servers": []})]);
    }

    #[test]
    fn test_missing_source_names_the_path() {
        let err = read_documents(Path::new("/definitely/not/here.yml")).unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.yml"));
    }

    #[test]
    fn test_write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.yml");
        let docs = vec![json!({"a": 1}), json!({"b": [true]})];
        write_documents(&path, &docs, DocumentFormat::Yaml).unwrap();
        assert_eq!(read_documents(&path).unwrap(), docs);
    }
}
