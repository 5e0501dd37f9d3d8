//! Validation findings produced by pack rules.

use serde::{Deserialize, Serialize};

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warn,
}

/// A single validation finding tied to one rule.
///
/// Issues are immutable once produced. The report-unique `id` (`i1`, `i2`,
/// ...) is assigned by the validator after all rules have run; rules create
/// issues with an empty id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Report-unique identifier.
    pub id: String,
    /// Id of the rule that produced this issue.
    pub item_id: String,
    pub severity: Severity,
    pub message: String,
    /// Raw excerpt from the draft that triggered the finding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    /// Location or repair hints (e.g. "line 12").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<String>>,
}

impl Issue {
    /// Create an `error` issue for the given rule.
    pub fn error(item_id: &str, message: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            item_id: item_id.to_string(),
            severity: Severity::Error,
            message: message.into(),
            evidence: None,
            hints: None,
        }
    }

    /// Create a `warn` issue for the given rule.
    pub fn warn(item_id: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warn,
            ..Self::error(item_id, message)
        }
    }

    /// Attach a draft excerpt as evidence.
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    /// Attach a location hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.get_or_insert_with(Vec::new).push(hint.into());
        self
    }
}
