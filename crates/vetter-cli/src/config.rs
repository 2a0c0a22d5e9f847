//! # Configuration
//!
//! Optional YAML file supplying defaults for every run option. Looked up at
//! `--config PATH`, else `.vetter.yml` in the current directory.
//!
//! ```yaml
//! rules:
//!   files: [rules/network.yml]
//!   dirs: [rules/shared]
//! select:
//!   include_level: [warn, error, fatal]
//!   exclude_tag: [slow]
//! mode: check
//! format: yaml
//! count: false
//! ```
//!
//! Relative rule paths are resolved against the directory holding the
//! config file. Unknown keys are rejected.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use vetter_core::DocumentFormat;
use vetter_rules::RuleSelector;

/// File name looked up in the current directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = ".vetter.yml";

/// What a run does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Report violations; never write a document.
    #[default]
    Check,
    /// Apply rule corrections and write the documents out.
    Fix,
    /// Print the active rules and exit.
    List,
}

/// Output format for fixed documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// YAML, one `---` separated document per input document.
    #[default]
    Yaml,
    /// Pretty-printed JSON, one value per input document.
    Json,
}

impl From<OutputFormat> for DocumentFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Yaml => DocumentFormat::Yaml,
            OutputFormat::Json => DocumentFormat::Json,
        }
    }
}

/// Rule-source locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleSources {
    /// Individual rule-source files.
    pub files: Vec<PathBuf>,
    /// Directories whose rule-source files are all loaded.
    pub dirs: Vec<PathBuf>,
}

impl RuleSources {
    /// Returns true if no source is named.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }

    fn resolve_against(&mut self, base: &Path) {
        for path in self.files.iter_mut().chain(self.dirs.iter_mut()) {
            *path = resolve_path(path, base);
        }
    }
}

/// Contents of a config file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Rule sources.
    pub rules: RuleSources,
    /// Selection criteria.
    pub select: RuleSelector,
    /// Run mode.
    pub mode: Option<Mode>,
    /// Output format for `fix`.
    pub format: Option<OutputFormat>,
    /// Exit with the error count instead of 1.
    pub count: Option<bool>,
}

impl Config {
    /// Parse config text. Paths are left as written.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        // An empty file is an empty config.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).context("invalid config")
    }

    /// Read a config file, resolving its rule paths against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config = Self::from_yaml_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.rules.resolve_against(base);
        tracing::debug!(config = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load `explicit` if given, else `.vetter.yml` in `cwd` if it exists,
    /// else an empty config.
    ///
    /// An explicit path that does not exist is an error.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let implicit = cwd.join(DEFAULT_CONFIG_FILE);
        if implicit.is_file() {
            Self::load(&implicit)
        } else {
            Ok(Self::default())
        }
    }
}

/// Resolve `path` against `base` unless it is absolute.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vetter_core::Severity;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_yaml_str(
            r#"
rules:
  files: [a.yml]
  dirs: [rules]
select:
  include_level: [error, fatal]
  exclude_tag: [slow]
mode: fix
format: json
count: true
"#,
        )
        .unwrap();
        assert_eq!(config.rules.files, vec![PathBuf::from("a.yml")]);
        assert_eq!(config.rules.dirs, vec![PathBuf::from("rules")]);
        assert!(config.select.include_level.contains(&Severity::Fatal));
        assert!(config.select.exclude_tag.contains("slow"));
        assert_eq!(config.mode, Some(Mode::Fix));
        assert_eq!(config.format, Some(OutputFormat::Json));
        assert_eq!(config.count, Some(true));
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::from_yaml_str("").unwrap(), Config::default());
        assert_eq!(Config::from_yaml_str("{}").unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Config::from_yaml_str("mode: check\nverbose: true\n").is_err());
        assert!(Config::from_yaml_str("rules: {paths: [a]}\n").is_err());
        assert!(Config::from_yaml_str("mode: repair\n").is_err());
    }

    #[test]
    fn test_load_resolves_rule_paths_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vetter.yml");
        std::fs::write(&path, "rules:\n  files: [rules/a.yml, /abs/b.yml]\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.rules.files,
            vec![dir.path().join("rules/a.yml"), PathBuf::from("/abs/b.yml")]
        );
    }

    #[test]
    fn test_discover_prefers_explicit_then_default_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::discover(None, dir.path()).unwrap(), Config::default());

        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "mode: list\n").unwrap();
        assert_eq!(Config::discover(None, dir.path()).unwrap().mode, Some(Mode::List));

        let other = dir.path().join("other.yml");
        std::fs::write(&other, "mode: fix\n").unwrap();
        assert_eq!(
            Config::discover(Some(&other), dir.path()).unwrap().mode,
            Some(Mode::Fix)
        );

        assert!(Config::discover(Some(&dir.path().join("absent.yml")), dir.path()).is_err());
    }
}
