//! # Severity — Rule Levels
//!
//! Defines the `Severity` enum attached to every rule. The engine treats
//! it as an opaque, comparable tag: it only filters on it during rule
//! selection and prints it in reports.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::VetterError;

/// Severity level of a rule, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Diagnostic detail.
    Debug,
    /// Informational finding.
    Info,
    /// Suspicious but tolerated.
    Warn,
    /// Violation that should block the document.
    Error,
    /// Violation that makes the document unusable.
    Fatal,
}

impl Severity {
    /// Returns all levels in ascending order.
    pub fn all_levels() -> &'static [Severity] {
        &[
            Self::Debug,
            Self::Info,
            Self::Warn,
            Self::Error,
            Self::Fatal,
        ]
    }

    /// Returns the lowercase identifier for this level.
    ///
    /// Matches the serde representation used in rule-source files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = VetterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            other => Err(VetterError::UnknownLevel(other.to_string())),
        }
    }
}
