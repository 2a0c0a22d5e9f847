//! # Rule Definitions
//!
//! The typed shape of rule-source documents. Deserialization is the
//! load-time validation step: a document with a missing required field,
//! an unknown severity, or an unexpected key is rejected as a whole.
//!
//! ```yaml
//! name: network
//! definitions:
//!   port: { type: integer, minimum: 1, maximum: 65535 }
//! rules:
//!   - name: port-required
//!     desc: every server declares a port
//!     level: error
//!     tags: [network]
//!     select: '$.servers[*]'
//!     check:
//!       type: object
//!       required: [port]
//!       properties:
//!         port: { $ref: 'network#/definitions/port' }
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use vetter_core::Severity;
use vetter_schema::SchemaSpec;

/// Selector used when a rule omits `select`: the whole document.
pub const ROOT_SELECTOR: &str = "$";

fn root_selector() -> String {
    ROOT_SELECTOR.to_string()
}

/// A single rule as loaded from a rule source.
///
/// Immutable once loaded. `check` and `filter` are owned copies of the
/// source schemas; compilation reads them and never writes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDefinition {
    /// Unique-ish rule name, used for selection and reporting.
    pub name: String,
    /// Human-readable description.
    pub desc: String,
    /// Severity of a violation.
    pub level: Severity,
    /// Tags for selection. Duplicates in the source collapse.
    pub tags: BTreeSet<String>,
    /// Path expression picking the nodes this rule applies to.
    #[serde(default = "root_selector")]
    pub select: String,
    /// Optional guard: nodes it rejects are skipped, not failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<SchemaSpec>,
    /// Required check: nodes it rejects are reported.
    pub check: SchemaSpec,
}

impl RuleDefinition {
    /// Replace an empty or blank `select` with the root selector.
    pub(crate) fn normalize(mut self) -> Self {
        if self.select.trim().is_empty() {
            self.select = root_selector();
        }
        self
    }

    /// Returns true if any of the rule's tags is in `tags`.
    pub fn has_any_tag(&self, tags: &BTreeSet<String>) -> bool {
        !self.tags.is_disjoint(tags)
    }
}

/// One rule-source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSource {
    /// Document name; shared definitions are registered under it.
    pub name: String,
    /// Shared schema definitions referenced as `name#/definitions/<key>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions: Option<Map<String, Value>>,
    /// Rules in document order.
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}
