//! # Engine Scenarios
//!
//! End-to-end runs of the visiting engine: catalog text in, selector
//! applied, document visited, report and document inspected.

use serde_json::{json, Value};
use vetter_core::{DeltaOp, DocumentFormat, Severity};
use vetter_rules::{RuleCatalog, RuleErrorKind, RuleSelector, VisitingEngine};

fn catalog(text: &str) -> RuleCatalog {
    let mut catalog = RuleCatalog::new();
    catalog
        .load_str(text, DocumentFormat::Yaml, "inline")
        .expect("inline rules should load");
    catalog
}

fn by_name(names: &[&str]) -> RuleSelector {
    RuleSelector {
        include_name: names.iter().map(|n| n.to_string()).collect(),
        ..Default::default()
    }
}

fn every_level() -> RuleSelector {
    RuleSelector {
        include_level: Severity::all_levels().iter().copied().collect(),
        ..Default::default()
    }
}

fn servers() -> Value {
    json!({"servers": [{"host": "a"}, {"host": "b", "port": 80}]})
}

const PORT_REQUIRED: &str = r#"
name: network
rules:
  - name: port-required
    desc: servers declare a port
    level: error
    tags: [network]
    select: '$.servers[*]'
    check:
      type: object
      required: [port]
      properties:
        port: { type: integer }
"#;

const PORT_REQUIRED_WITH_TAG: &str = r#"
name: network
rules:
  - name: port-required
    desc: servers declare a port and carry a tag
    level: error
    tags: [network]
    select: '$.servers[*]'
    check:
      type: object
      required: [port]
      properties:
        port: { type: integer }
        tag: { type: string, default: default }
"#;

#[test]
fn missing_port_reports_exactly_one_error() {
    let catalog = catalog(PORT_REQUIRED);
    let engine = VisitingEngine::new(&catalog, &by_name(&["port-required"]));
    let mut doc = servers();

    let report = engine.visit(&mut doc, false).into_report();

    assert_eq!(report.errors.len(), 1, "errors: {:?}", report.errors);
    let err = &report.errors[0];
    assert_eq!(err.rule.name, "port-required");
    assert_eq!(err.rule.level, Severity::Error);
    assert_eq!(err.kind, RuleErrorKind::Check);
    assert_eq!(err.node, "/servers/0");
    assert!(err.message.contains("port"), "message: {}", err.message);
    assert!(report.changes.is_empty());
}

#[test]
fn default_tag_is_written_back_when_mutating() {
    let catalog = catalog(PORT_REQUIRED_WITH_TAG);
    let engine = VisitingEngine::new(&catalog, &by_name(&["port-required"]));
    let mut doc = servers();

    let report = engine.visit(&mut doc, true).into_report();

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].node, "/servers/0");
    assert_eq!(
        doc,
        json!({"servers": [{"host": "a"}, {"host": "b", "port": 80, "tag": "default"}]})
    );
    assert_eq!(report.changes.len(), 1);
    assert!(report.changes[0].applied);
}

#[test]
fn default_tag_is_only_reported_without_mutation() {
    let catalog = catalog(PORT_REQUIRED_WITH_TAG);
    let engine = VisitingEngine::new(&catalog, &by_name(&["port-required"]));
    let mut doc = servers();

    let report = engine.visit(&mut doc, false).into_report();

    assert_eq!(doc, servers());
    assert_eq!(report.changes.len(), 1);
    let change = &report.changes[0];
    assert!(!change.applied);
    assert_eq!(change.node, "/servers/1");
    match &change.op {
        DeltaOp::Added { rhs, .. } => assert_eq!(rhs, &json!("default")),
        other => panic!("Expected Added, got: {other}"),
    }
}

#[test]
fn check_runs_are_idempotent() {
    let catalog = catalog(PORT_REQUIRED_WITH_TAG);
    let engine = VisitingEngine::new(&catalog, &every_level());
    let mut doc = servers();

    let first = engine.visit(&mut doc, false).into_report();
    let second = engine.visit(&mut doc, false).into_report();

    assert_eq!(doc, servers());
    assert_eq!(first.errors, second.errors);
    assert_eq!(first.changes, second.changes);
}

#[test]
fn equal_rewrite_is_not_a_change() {
    let catalog = catalog(PORT_REQUIRED_WITH_TAG);
    let engine = VisitingEngine::new(&catalog, &every_level());
    let mut doc = json!({"servers": [{"host": "b", "port": 80, "tag": "default"}]});
    let before = doc.clone();

    let ctx = engine.visit(&mut doc, true);

    assert!(ctx.report().is_empty());
    assert_eq!(ctx.summary().passed, 1);
    assert_eq!(doc, before);
}

#[test]
fn later_rules_see_earlier_writes() {
    let text = r#"
name: tags
rules:
  - name: tag-default
    desc: servers get a tag
    level: info
    tags: []
    select: '$.servers[*]'
    check: { properties: { tag: { default: default } } }
  - name: tag-required
    desc: servers carry a tag
    level: error
    tags: []
    select: '$.servers[*]'
    check: { required: [tag] }
"#;
    let catalog = catalog(text);
    let engine = VisitingEngine::new(&catalog, &every_level());

    let mut mutated = servers();
    let report = engine.visit(&mut mutated, true).into_report();
    assert!(report.is_clean(), "errors: {:?}", report.errors);
    assert_eq!(report.changes.len(), 2);

    let mut untouched = servers();
    let report = engine.visit(&mut untouched, false).into_report();
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors.iter().all(|e| e.rule.name == "tag-required"));
}

/// A schema that cannot compile fails its own rule only. This is stricter
/// than letting the run abort.
#[test]
fn compile_failure_is_isolated_to_its_rule() {
    let text = r#"
name: mixed
rules:
  - name: dangling-ref
    desc: references an unregistered definition
    level: error
    tags: []
    select: '$.servers[*]'
    check: { $ref: 'nowhere#/definitions/server' }
  - name: port-required
    desc: servers declare a port
    level: error
    tags: []
    select: '$.servers[*]'
    check: { required: [port] }
"#;
    let catalog = catalog(text);
    let engine = VisitingEngine::new(&catalog, &every_level());
    let mut doc = servers();

    let report = engine.visit(&mut doc, true).into_report();

    let seen: Vec<(&str, RuleErrorKind)> = report
        .errors
        .iter()
        .map(|e| (e.rule.name.as_str(), e.kind))
        .collect();
    assert_eq!(
        seen,
        vec![
            ("dangling-ref", RuleErrorKind::Compile),
            ("port-required", RuleErrorKind::Check),
        ]
    );
}

#[test]
fn filtered_nodes_are_skipped_not_failed() {
    let text = r#"
name: tls
rules:
  - name: tls-port
    desc: tls servers listen on 443
    level: warn
    tags: []
    select: '$.servers[*]'
    filter: { required: [tls] }
    check: { properties: { port: { const: 443 } } }
"#;
    let catalog = catalog(text);
    let engine = VisitingEngine::new(&catalog, &every_level());
    let mut doc = json!({"servers": [{"port": 80}, {"port": 80, "tls": true}]});

    let ctx = engine.visit(&mut doc, false);

    assert_eq!(ctx.report().errors.len(), 1);
    assert_eq!(ctx.report().errors[0].pointer(), "/servers/1/port");
    let summary = ctx.summary();
    assert_eq!(summary.filtered, 1);
    assert_eq!(summary.failed, 1);
}

#[test]
fn empty_selector_runs_nothing() {
    let catalog = catalog(PORT_REQUIRED);
    let engine = VisitingEngine::new(&catalog, &RuleSelector::default());
    let mut doc = servers();

    let ctx = engine.visit(&mut doc, true);

    assert!(engine.active().is_empty());
    assert!(ctx.report().is_empty());
    assert_eq!(ctx.summary().rules, 0);
}
