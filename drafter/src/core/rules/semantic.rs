//! Semantic rules: language-quality scans.
//!
//! These produce `warn` findings with location hints; actual quality
//! judgment is delegated to the generator via healing instructions.

use serde::Deserialize;

use crate::core::issue::Issue;
use crate::core::item::ValidationItem;

fn default_terms() -> Vec<String> {
    ["maybe", "somehow", "probably", "as needed", "etc."]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Flags vague language that weakens a requirements document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ClarityScan {
    #[serde(default = "default_terms")]
    pub terms: Vec<String>,
}

impl Default for ClarityScan {
    fn default() -> Self {
        Self {
            terms: default_terms(),
        }
    }
}

impl ValidationItem for ClarityScan {
    fn item_id(&self) -> &str {
        "clarity-scan"
    }

    fn to_prompt(&self) -> String {
        format!(
            "Avoid vague language ({}); state requirements precisely.",
            self.terms.join(", ")
        )
    }

    fn validate(&self, draft: &str) -> Vec<Issue> {
        let mut issues = Vec::new();
        for term in &self.terms {
            let needle = term.to_ascii_lowercase();
            for (index, line) in draft.lines().enumerate() {
                if line.to_ascii_lowercase().contains(&needle) {
                    issues.push(
                        Issue::warn(self.item_id(), format!("vague term '{term}'"))
                            .with_hint(format!("line {}", index + 1)),
                    );
                    // One finding per term keeps reports readable.
                    break;
                }
            }
        }
        issues
    }
}
