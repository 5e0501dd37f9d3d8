//! Runs every pack rule against a draft and aggregates the findings.

use serde::{Deserialize, Serialize};

use crate::core::issue::Issue;
use crate::core::pack::SpecPack;

/// Aggregated result of one validation pass.
///
/// `ok` is derived from `issues` at construction and never set
/// independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub ok: bool,
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self {
            ok: issues.is_empty(),
            issues,
        }
    }
}

/// Run every item in pack declaration order and concatenate the issues.
///
/// Issue order follows pack order (first-declared, first-reported); ids are
/// reassigned to be report-unique (`i1`, `i2`, ...). A panicking rule is a
/// configuration bug and is deliberately not caught here.
pub fn validate_all(draft: &str, pack: &SpecPack) -> ValidationReport {
    let mut issues = Vec::new();
    for item in pack.items() {
        issues.extend(item.validate(draft));
    }
    for (index, issue) in issues.iter_mut().enumerate() {
        issue.id = format!("i{}", index + 1);
    }
    ValidationReport::new(issues)
}
