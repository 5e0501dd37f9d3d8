//! Deterministic classification of issues into healing buckets.
//!
//! Buckets only shape the natural-language repair instructions; they carry
//! no other semantics. See [`crate::io::prompt`] for how each bucket is
//! phrased.

use crate::core::issue::Issue;

/// `item_id` markers that route an issue to the semantic bucket.
const SEMANTIC_MARKERS: &[&str] = &["semantic", "clarity", "quality", "tone", "style"];

/// `item_id` markers that route an issue to the structural bucket.
const STRUCTURAL_MARKERS: &[&str] = &["section", "heading", "structure", "format", "outline"];

/// Issues partitioned by owning-rule category.
///
/// The three buckets are disjoint and their union is the input; order is
/// preserved within each bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueClasses {
    pub deterministic: Vec<Issue>,
    pub semantic: Vec<Issue>,
    pub structural: Vec<Issue>,
}

impl IssueClasses {
    pub fn is_empty(&self) -> bool {
        self.deterministic.is_empty() && self.semantic.is_empty() && self.structural.is_empty()
    }

    pub fn len(&self) -> usize {
        self.deterministic.len() + self.semantic.len() + self.structural.len()
    }
}

/// Partition issues by inspecting each owning rule id against the marker
/// lists. Semantic markers win over structural; unmatched ids fall into the
/// deterministic (default) bucket.
pub fn classify(issues: &[Issue]) -> IssueClasses {
    let mut classes = IssueClasses::default();
    for issue in issues {
        let id = issue.item_id.to_ascii_lowercase();
        if SEMANTIC_MARKERS.iter().any(|m| id.contains(m)) {
            classes.semantic.push(issue.clone());
        } else if STRUCTURAL_MARKERS.iter().any(|m| id.contains(m)) {
            classes.structural.push(issue.clone());
        } else {
            classes.deterministic.push(issue.clone());
        }
    }
    classes
}
