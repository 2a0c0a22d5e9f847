//! # vetter-cli — Command Line Interface
//!
//! Provides the `vetter` binary: load rules, select the active ones, and
//! check or fix YAML/JSON documents against them.
//!
//! ```bash
//! vetter --rule-dir rules --include-level error --source deploy.yml
//! vetter --rules rules/network.yml --include-tag defaults --mode fix --source deploy.yml --dest fixed.yml
//! vetter --rule-dir rules --include-level warn --mode list
//! ```
//!
//! ## Exit Codes
//!
//! - `0`: no errors
//! - `1`: errors found, or an operational failure
//! - `N`: with `--count`, the number of errors (at most 255)

pub mod config;
pub mod io;
pub mod run;

pub use config::{Config, Mode, OutputFormat, RuleSources, DEFAULT_CONFIG_FILE};
pub use run::{run_vetter, RunArgs, Settings};
