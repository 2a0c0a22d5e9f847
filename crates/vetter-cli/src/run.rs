//! # Running Rules
//!
//! Resolves the command line over the config file, loads the catalog, and
//! executes one of the three modes.
//!
//! - `list`: print the active rules.
//! - `check`: visit every document without mutation and print the report.
//! - `fix`: visit every document with mutation and write the documents out.
//!
//! Every document of a multi-document source is visited with its own
//! context; reports are printed in document order.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use serde_json::Value;

use vetter_core::Severity;
use vetter_rules::{RuleCatalog, RuleDefinition, RuleSelector, VisitingEngine, VisitorResult};

use crate::config::{Config, Mode, OutputFormat, RuleSources};
use crate::io::{read_documents, write_documents, STDIO};

/// Arguments controlling a run. Lists extend the config file; scalars
/// override it.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Rule-source file. Repeatable.
    #[arg(long = "rules", value_name = "FILE")]
    pub rules: Vec<PathBuf>,

    /// Directory of rule-source files. Repeatable.
    #[arg(long = "rule-dir", value_name = "DIR")]
    pub rule_dirs: Vec<PathBuf>,

    /// Activate rules of this level. Repeatable.
    #[arg(long, value_name = "LEVEL")]
    pub include_level: Vec<Severity>,

    /// Activate the rule with this name. Repeatable.
    #[arg(long, value_name = "NAME")]
    pub include_name: Vec<String>,

    /// Activate rules carrying this tag. Repeatable.
    #[arg(long, value_name = "TAG")]
    pub include_tag: Vec<String>,

    /// Deactivate rules of this level. Repeatable.
    #[arg(long, value_name = "LEVEL")]
    pub exclude_level: Vec<Severity>,

    /// Deactivate the rule with this name. Repeatable.
    #[arg(long, value_name = "NAME")]
    pub exclude_name: Vec<String>,

    /// Deactivate rules carrying this tag. Repeatable.
    #[arg(long, value_name = "TAG")]
    pub exclude_tag: Vec<String>,

    /// What to do [default: check].
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Document to read, `-` for stdin.
    #[arg(long, value_name = "PATH", default_value = STDIO)]
    pub source: PathBuf,

    /// Where `fix` writes documents, `-` for stdout.
    #[arg(long, value_name = "PATH", default_value = STDIO)]
    pub dest: PathBuf,

    /// Output format for `fix` [default: yaml].
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Exit with the number of errors (at most 255) instead of 1.
    #[arg(long)]
    pub count: bool,
}

/// Fully resolved run options.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Rule sources.
    pub rules: RuleSources,
    /// Selection criteria.
    pub selector: RuleSelector,
    /// Run mode.
    pub mode: Mode,
    /// Document source.
    pub source: PathBuf,
    /// Document destination for `fix`.
    pub dest: PathBuf,
    /// Output format for `fix`.
    pub format: OutputFormat,
    /// Exit with the error count.
    pub count: bool,
}

impl RunArgs {
    /// Layer these arguments over `config`.
    pub fn resolve(self, config: Config) -> Settings {
        let mut rules = config.rules;
        rules.files.extend(self.rules);
        rules.dirs.extend(self.rule_dirs);

        let mut selector = config.select;
        selector.merge(RuleSelector {
            include_level: self.include_level.into_iter().collect(),
            include_name: self.include_name.into_iter().collect(),
            include_tag: self.include_tag.into_iter().collect(),
            exclude_level: self.exclude_level.into_iter().collect(),
            exclude_name: self.exclude_name.into_iter().collect(),
            exclude_tag: self.exclude_tag.into_iter().collect(),
        });

        Settings {
            rules,
            selector,
            mode: self.mode.or(config.mode).unwrap_or_default(),
            source: self.source,
            dest: self.dest,
            format: self.format.or(config.format).unwrap_or_default(),
            count: self.count || config.count.unwrap_or(false),
        }
    }
}

/// Load every configured rule source into one catalog.
pub fn load_catalog(rules: &RuleSources) -> Result<RuleCatalog> {
    if rules.is_empty() {
        bail!("no rule sources given; use --rules, --rule-dir or a config file");
    }
    let mut catalog = RuleCatalog::new();
    catalog.load_files(&rules.files)?;
    for dir in &rules.dirs {
        catalog.load_dir(dir)?;
    }
    tracing::info!(
        rules = catalog.len(),
        sources = catalog.source_names().len(),
        "loaded rule catalog"
    );
    Ok(catalog)
}

/// Execute a run. Returns the process exit code.
pub fn run_vetter(settings: &Settings) -> Result<u8> {
    let catalog = load_catalog(&settings.rules)?;
    if settings.selector.is_empty() {
        tracing::warn!("no selection criteria given; no rules are active");
    }
    let engine = VisitingEngine::new(&catalog, &settings.selector);
    tracing::info!(active = engine.active().len(), mode = ?settings.mode, "selected rules");

    if settings.mode == Mode::List {
        for rule in engine.active() {
            println!("{}", list_line(rule));
        }
        return Ok(0);
    }

    let mutate = settings.mode == Mode::Fix;
    let mut docs = read_documents(&settings.source)?;
    let reports = visit_documents(&engine, &mut docs, mutate);

    let multi = reports.len() > 1;
    let mut errors = 0;
    for (index, report) in reports.iter().enumerate() {
        errors += report.errors.len();
        for line in report_lines(report, multi.then_some(index)) {
            // In fix mode stdout may carry the documents.
            if mutate {
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
        }
    }

    if mutate {
        write_documents(&settings.dest, &docs, settings.format.into())?;
    }

    Ok(exit_code(errors, settings.count))
}

/// Visit each document with its own context.
pub fn visit_documents(engine: &VisitingEngine<'_>, docs: &mut [Value], mutate: bool) -> Vec<VisitorResult> {
    docs.iter_mut()
        .enumerate()
        .map(|(index, doc)| {
            let ctx = engine.visit(doc, mutate);
            tracing::info!(document = index, summary = %ctx.summary(), "document visited");
            ctx.into_report()
        })
        .collect()
}

/// `level name [tags]: desc`
pub fn list_line(rule: &RuleDefinition) -> String {
    let tags: Vec<&str> = rule.tags.iter().map(String::as_str).collect();
    format!("{} {} [{}]: {}", rule.level, rule.name, tags.join(", "), rule.desc)
}

/// Printable lines for one document's report: errors, then changes.
pub fn report_lines(report: &VisitorResult, document: Option<usize>) -> Vec<String> {
    let prefix = document.map(|i| format!("document {i}: ")).unwrap_or_default();
    report
        .errors
        .iter()
        .map(|e| format!("{prefix}{e}"))
        .chain(report.changes.iter().map(|c| format!("{prefix}change {c}")))
        .collect()
}

/// 0 when clean; otherwise the error count clamped to 255 with `count`,
/// else 1.
pub fn exit_code(errors: usize, count: bool) -> u8 {
    match (errors, count) {
        (0, _) => 0,
        (n, true) => u8::try_from(n).unwrap_or(u8::MAX),
        (_, false) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::io::is_stdio;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        run: RunArgs,
    }

    fn parse(args: &[&str]) -> RunArgs {
        let mut argv = vec!["vetter"];
        argv.extend_from_slice(args);
        TestCli::try_parse_from(argv).unwrap().run
    }

    #[test]
    fn test_defaults() {
        let settings = parse(&[]).resolve(Config::default());
        assert_eq!(settings.mode, Mode::Check);
        assert_eq!(settings.format, OutputFormat::Yaml);
        assert!(is_stdio(&settings.source));
        assert!(is_stdio(&settings.dest));
        assert!(!settings.count);
        assert!(settings.selector.is_empty());
    }

    #[test]
    fn test_repeatable_flags_collect() {
        let args = parse(&[
            "--rules", "a.yml", "--rules", "b.yml",
            "--include-level", "error", "--include-level", "fatal",
            "--exclude-tag", "slow",
        ]);
        assert_eq!(args.rules, vec![PathBuf::from("a.yml"), PathBuf::from("b.yml")]);
        assert_eq!(args.include_level, vec![Severity::Error, Severity::Fatal]);
        assert_eq!(args.exclude_tag, vec!["slow".to_string()]);
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        assert!(TestCli::try_parse_from(["vetter", "--include-level", "loud"]).is_err());
        assert!(TestCli::try_parse_from(["vetter", "--mode", "repair"]).is_err());
    }

    #[test]
    fn test_flags_layer_over_config() {
        let config = Config::from_yaml_str(
            "rules: {files: [base.yml]}\nselect: {include_tag: [network]}\nmode: fix\nformat: json\ncount: true\n",
        )
        .unwrap();
        let settings = parse(&["--rules", "extra.yml", "--include-tag", "meta", "--mode", "check"])
            .resolve(config);

        assert_eq!(
            settings.rules.files,
            vec![PathBuf::from("base.yml"), PathBuf::from("extra.yml")]
        );
        assert_eq!(settings.selector.include_tag.len(), 2);
        assert_eq!(settings.mode, Mode::Check);
        assert_eq!(settings.format, OutputFormat::Json);
        assert!(settings.count);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(0, false), 0);
        assert_eq!(exit_code(0, true), 0);
        assert_eq!(exit_code(7, false), 1);
        assert_eq!(exit_code(7, true), 7);
        assert_eq!(exit_code(300, true), 255);
    }

    #[test]
    fn test_missing_rule_sources_is_an_error() {
        assert!(load_catalog(&RuleSources::default()).is_err());
    }

    #[test]
    fn test_list_line_format() {
        let rule: RuleDefinition = serde_yaml::from_str(
            "{name: port-required, desc: servers declare a port, level: error, tags: [servers, network], check: {}}",
        )
        .unwrap();
        assert_eq!(
            list_line(&rule),
            "error port-required [network, servers]: servers declare a port"
        );
    }
}
