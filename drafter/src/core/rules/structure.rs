//! Structural rules: document outline and section layout.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::core::issue::Issue;
use crate::core::item::ValidationItem;

/// Markdown headings (`#` through `###`).
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,3}\s+\S.*$").expect("heading regex"));

/// Numbered markdown headings such as `## 1. Overview` or `## 2) Scope`.
static NUMBERED_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,3}\s+\d+[.)]\s+\S.*$").expect("numbered heading regex"));

fn headings(draft: &str) -> Vec<&str> {
    HEADING_RE.find_iter(draft).map(|m| m.as_str()).collect()
}

/// Requires a minimum count of numbered section headings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct NumberedHeadings {
    pub min_sections: usize,
}

impl ValidationItem for NumberedHeadings {
    fn item_id(&self) -> &str {
        "numbered-headings"
    }

    fn to_prompt(&self) -> String {
        format!(
            "Structure the document with at least {} numbered markdown section \
             headings (for example `## 1. Overview`).",
            self.min_sections
        )
    }

    fn validate(&self, draft: &str) -> Vec<Issue> {
        let found: Vec<&str> = NUMBERED_HEADING_RE
            .find_iter(draft)
            .map(|m| m.as_str())
            .collect();
        if found.len() >= self.min_sections {
            return Vec::new();
        }
        let mut issue = Issue::error(
            self.item_id(),
            format!(
                "expected at least {} numbered section headings, found {}",
                self.min_sections,
                found.len()
            ),
        );
        if !found.is_empty() {
            issue = issue.with_evidence(found.join("\n"));
        }
        vec![issue]
    }
}

/// Requires each named section to appear as a heading.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RequiredSections {
    pub sections: Vec<String>,
}

impl ValidationItem for RequiredSections {
    fn item_id(&self) -> &str {
        "required-sections"
    }

    fn to_prompt(&self) -> String {
        format!(
            "Include a section for each of: {}.",
            self.sections.join(", ")
        )
    }

    fn validate(&self, draft: &str) -> Vec<Issue> {
        let found = headings(draft);
        self.sections
            .iter()
            .filter(|wanted| {
                let needle = wanted.to_ascii_lowercase();
                !found
                    .iter()
                    .any(|h| h.to_ascii_lowercase().contains(&needle))
            })
            .map(|missing| {
                Issue::error(self.item_id(), format!("missing section '{missing}'"))
                    .with_hint(format!("add a heading containing '{missing}'"))
            })
            .collect()
    }
}

/// Bounds the total heading count of the document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SectionCount {
    pub min: usize,
    #[serde(default)]
    pub max: Option<usize>,
}

impl ValidationItem for SectionCount {
    fn item_id(&self) -> &str {
        "section-count"
    }

    fn to_prompt(&self) -> String {
        match self.max {
            Some(max) => format!("Use between {} and {max} sections overall.", self.min),
            None => format!("Use at least {} sections overall.", self.min),
        }
    }

    fn validate(&self, draft: &str) -> Vec<Issue> {
        let count = headings(draft).len();
        if count < self.min {
            return vec![Issue::error(
                self.item_id(),
                format!("expected at least {} sections, found {count}", self.min),
            )];
        }
        if let Some(max) = self.max
            && count > max
        {
            return vec![Issue::error(
                self.item_id(),
                format!("expected at most {max} sections, found {count}"),
            )];
        }
        Vec::new()
    }
}
