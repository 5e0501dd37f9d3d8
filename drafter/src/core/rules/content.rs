//! Deterministic content rules: length, placeholders, title block.

use serde::Deserialize;

use crate::core::issue::Issue;
use crate::core::item::ValidationItem;

/// Requires a minimum draft length in words.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct WordCount {
    pub min_words: usize,
}

impl ValidationItem for WordCount {
    fn item_id(&self) -> &str {
        "word-count"
    }

    fn to_prompt(&self) -> String {
        format!("Write at least {} words.", self.min_words)
    }

    fn validate(&self, draft: &str) -> Vec<Issue> {
        let count = draft.split_whitespace().count();
        if count >= self.min_words {
            return Vec::new();
        }
        vec![
            Issue::error(
                self.item_id(),
                format!("draft has {count} words, expected at least {}", self.min_words),
            )
            .with_evidence(format!("{count} words")),
        ]
    }
}

fn default_markers() -> Vec<String> {
    ["TBD", "TODO", "FIXME", "lorem ipsum", "<placeholder>"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Flags unresolved placeholder markers.
///
/// There is no safe local repair for a placeholder (the content is simply
/// missing), so `heal` stays at the default `None` and these issues always
/// escalate to regeneration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PlaceholderScan {
    #[serde(default = "default_markers")]
    pub markers: Vec<String>,
}

impl Default for PlaceholderScan {
    fn default() -> Self {
        Self {
            markers: default_markers(),
        }
    }
}

impl ValidationItem for PlaceholderScan {
    fn item_id(&self) -> &str {
        "placeholder-scan"
    }

    fn to_prompt(&self) -> String {
        format!(
            "Do not leave placeholder markers such as {} anywhere in the document.",
            self.markers.join(", ")
        )
    }

    fn validate(&self, draft: &str) -> Vec<Issue> {
        let lower = draft.to_ascii_lowercase();
        self.markers
            .iter()
            .filter(|marker| lower.contains(&marker.to_ascii_lowercase()))
            .map(|marker| {
                let line = draft
                    .lines()
                    .position(|l| l.to_ascii_lowercase().contains(&marker.to_ascii_lowercase()))
                    .map(|n| n + 1)
                    .unwrap_or(1);
                Issue::error(self.item_id(), format!("placeholder marker '{marker}' present"))
                    .with_evidence(marker.clone())
                    .with_hint(format!("line {line}"))
            })
            .collect()
    }
}

fn default_title() -> String {
    "Product Requirements Document".to_string()
}

/// Requires the draft to open with a top-level `# ` title.
///
/// This is the local-repair example: a missing title has an obvious cheap
/// fix, so `heal` prepends the configured default instead of costing a
/// generation call.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct TitleBlock {
    #[serde(default = "default_title")]
    pub default_title: String,
}

impl Default for TitleBlock {
    fn default() -> Self {
        Self {
            default_title: default_title(),
        }
    }
}

impl TitleBlock {
    fn has_title(draft: &str) -> bool {
        draft
            .lines()
            .find(|line| !line.trim().is_empty())
            .is_some_and(|line| line.starts_with("# "))
    }
}

impl ValidationItem for TitleBlock {
    fn item_id(&self) -> &str {
        "title-block"
    }

    fn to_prompt(&self) -> String {
        "Open the document with a single top-level `# ` title line.".to_string()
    }

    fn validate(&self, draft: &str) -> Vec<Issue> {
        if Self::has_title(draft) {
            return Vec::new();
        }
        vec![Issue::error(
            self.item_id(),
            "draft does not open with a top-level `# ` title",
        )]
    }

    fn heal(&self, draft: &str, _issues: &[Issue]) -> Option<String> {
        if Self::has_title(draft) {
            return None;
        }
        Some(format!("# {}\n\n{draft}", self.default_title))
    }
}
