//! # Rule Selection
//!
//! Reduces a catalog to its active rules using six criteria sets.
//!
//! ## Precedence
//!
//! For each rule, in catalog order:
//!
//! 1. level in `exclude_level` → rejected
//! 2. name in `exclude_name` → rejected
//! 3. any tag in `exclude_tag` → rejected
//! 4. otherwise added if level in `include_level`, name in `include_name`,
//!    or any tag in `include_tag`
//!
//! Exclusion always wins. A rule that matches no include criterion is never
//! added, so an empty selector activates nothing. Callers wanting every
//! rule must say so, e.g. by including every level.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use vetter_core::Severity;

use crate::definition::RuleDefinition;

/// Include/exclude criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleSelector {
    /// Levels to include.
    pub include_level: BTreeSet<Severity>,
    /// Names to include.
    pub include_name: BTreeSet<String>,
    /// Tags to include.
    pub include_tag: BTreeSet<String>,
    /// Levels to exclude.
    pub exclude_level: BTreeSet<Severity>,
    /// Names to exclude.
    pub exclude_name: BTreeSet<String>,
    /// Tags to exclude.
    pub exclude_tag: BTreeSet<String>,
}

impl RuleSelector {
    /// Returns true if no criterion is set.
    pub fn is_empty(&self) -> bool {
        self.include_level.is_empty()
            && self.include_name.is_empty()
            && self.include_tag.is_empty()
            && self.exclude_level.is_empty()
            && self.exclude_name.is_empty()
            && self.exclude_tag.is_empty()
    }

    /// Union every criterion of `other` into `self`.
    pub fn merge(&mut self, other: RuleSelector) {
        self.include_level.extend(other.include_level);
        self.include_name.extend(other.include_name);
        self.include_tag.extend(other.include_tag);
        self.exclude_level.extend(other.exclude_level);
        self.exclude_name.extend(other.exclude_name);
        self.exclude_tag.extend(other.exclude_tag);
    }

    /// Returns true if an exclude criterion rejects `rule`.
    pub fn excludes(&self, rule: &RuleDefinition) -> bool {
        self.exclude_level.contains(&rule.level)
            || self.exclude_name.contains(&rule.name)
            || rule.has_any_tag(&self.exclude_tag)
    }

    /// Returns true if an include criterion matches `rule`.
    pub fn includes(&self, rule: &RuleDefinition) -> bool {
        self.include_level.contains(&rule.level)
            || self.include_name.contains(&rule.name)
            || rule.has_any_tag(&self.include_tag)
    }

    /// The active subset of `rules`, in catalog order.
    ///
    /// Each catalog entry appears at most once.
    pub fn resolve<'r>(&self, rules: &'r [RuleDefinition]) -> Vec<&'r RuleDefinition> {
        let mut active = Vec::new();
        for rule in rules {
            if self.excludes(rule) {
                tracing::debug!(rule = %rule.name, "rule excluded");
                continue;
            }
            if self.includes(rule) {
                active.push(rule);
            }
        }
        tracing::debug!(total = rules.len(), active = active.len(), "resolved active rules");
        active
    }
}
