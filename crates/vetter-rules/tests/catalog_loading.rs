//! # Catalog Loading Tests
//!
//! Loads the rule files shipped in the repository's `rules/` directory and
//! temporary directories built per test.

use std::path::PathBuf;

use serde_json::json;
use vetter_core::Severity;
use vetter_rules::{CatalogError, RuleCatalog, RuleSelector, VisitingEngine};

fn shipped_rules() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("rules")
}

#[test]
fn shipped_rules_load_in_file_order() {
    let mut catalog = RuleCatalog::new();
    let added = catalog.load_dir(&shipped_rules()).expect("shipped rules should load");

    assert_eq!(added, 7);
    assert_eq!(catalog.source_names(), &["metadata", "labels", "network"]);
    let names: Vec<&str> = catalog.rules().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "has-name",
            "version-default",
            "label-values",
            "port-required",
            "host-required",
            "server-tag",
            "tls-port",
        ]
    );
    assert!(catalog.registry().contains("network"));
}

#[test]
fn shipped_rules_check_a_document() {
    let mut catalog = RuleCatalog::new();
    catalog.load_dir(&shipped_rules()).unwrap();
    let selector = RuleSelector {
        include_level: Severity::all_levels().iter().copied().collect(),
        ..Default::default()
    };
    let engine = VisitingEngine::new(&catalog, &selector);
    let mut doc = json!({
        "name": "demo",
        "servers": [{"host": "a"}, {"host": "b", "port": 80, "tls": true}],
        "labels": {"team": "core", "tier": 1}
    });
    let before = doc.clone();

    let ctx = engine.visit(&mut doc, false);
    let report = ctx.report();

    let mut failing: Vec<String> = report
        .errors
        .iter()
        .map(|e| format!("{} {}", e.rule.name, e.pointer()))
        .collect();
    failing.sort();
    assert_eq!(
        failing,
        vec![
            "label-values /labels/tier",
            "port-required /servers/0",
            "tls-port /servers/1/port",
        ]
    );
    assert_eq!(report.changes.len(), 3);
    assert_eq!(doc, before);
}

#[test]
fn shipped_registry_definitions_are_enforced() {
    let mut catalog = RuleCatalog::new();
    catalog.load_dir(&shipped_rules()).unwrap();
    let selector = RuleSelector {
        include_name: ["port-required".to_string()].into_iter().collect(),
        ..Default::default()
    };
    let engine = VisitingEngine::new(&catalog, &selector);
    let mut doc = json!({"servers": [{"host": "a", "port": 70000}]});

    let report = engine.visit(&mut doc, false).into_report();
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].pointer(), "/servers/0/port");
}

#[test]
fn directory_load_takes_rule_files_only() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("b.yaml"),
        "name: b\nrules:\n  - {name: from-yaml, desc: d, level: info, tags: [], check: {}}\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("a.json"),
        r#"{"name": "a", "rules": [{"name": "from-json", "desc": "d", "level": "warn", "tags": ["x"], "check": {}}]}"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not a rule file").unwrap();
    std::fs::create_dir(dir.path().join("nested.yml")).unwrap();

    let mut catalog = RuleCatalog::new();
    catalog.load_dir(dir.path()).unwrap();

    let names: Vec<&str> = catalog.rules().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["from-json", "from-yaml"]);
    assert_eq!(catalog.rules()[0].select, "$");
}

#[test]
fn malformed_file_aborts_the_whole_load() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("a.yml"),
        "name: a\nrules:\n  - {name: ok, desc: d, level: info, tags: [], check: {}}\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("b.yml"),
        "name: b\nrules:\n  - {name: no-check, desc: d, level: info, tags: []}\n",
    )
    .unwrap();

    let mut catalog = RuleCatalog::new();
    let err = catalog.load_dir(dir.path()).unwrap_err();

    assert!(matches!(err, CatalogError::Parse { .. }), "Expected Parse, got: {err}");
    assert!(catalog.is_empty());
    assert!(catalog.registry().is_empty());
}

#[test]
fn missing_directory_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent");
    let err = RuleCatalog::new().load_dir(&missing).unwrap_err();
    match err {
        CatalogError::NotFound { path } => assert_eq!(path, missing),
        other => panic!("Expected NotFound, got: {other}"),
    }
}

#[test]
fn missing_file_among_several_loads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let present = dir.path().join("present.yml");
    std::fs::write(&present, "name: p\nrules: []\n").unwrap();

    let mut catalog = RuleCatalog::new();
    let err = catalog
        .load_files(&[present, dir.path().join("absent.yml")])
        .unwrap_err();

    assert!(matches!(err, CatalogError::NotFound { .. }));
    assert!(catalog.source_names().is_empty());
}
