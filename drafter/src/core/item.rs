//! The pluggable rule seam.
//!
//! The [`ValidationItem`] trait decouples the validator and healing loop
//! from how any one rule decides pass/fail. Built-in rules live in
//! [`crate::core::rules`]; tests use small inline impls.

use crate::core::issue::Issue;

/// One validation rule: an identifier, a prompt fragment telling the
/// generator the expectation up front, a pure check, and an optional cheap
/// local repair.
///
/// Implementations must be total, side-effect-free functions over their
/// inputs: the same draft always yields the same issues. Rules hold their
/// own typed parameters as struct fields.
pub trait ValidationItem: Send + Sync {
    /// Identifier, unique within a pack.
    fn item_id(&self) -> &str;

    /// Natural-language instruction injected into the generation prompt so
    /// the generator is told the rule before drafting.
    fn to_prompt(&self) -> String;

    /// Check the draft. Returned issues carry this rule's `item_id` and an
    /// empty report id (the validator assigns report-unique ids).
    fn validate(&self, draft: &str) -> Vec<Issue>;

    /// Attempt a local string repair that resolves `issues` without
    /// invoking the generator.
    ///
    /// Must return `None` rather than the unchanged draft ("no cheap fix,
    /// escalate to regeneration"), and must not introduce issues that did
    /// not exist before.
    fn heal(&self, draft: &str, issues: &[Issue]) -> Option<String> {
        let _ = (draft, issues);
        None
    }
}

impl std::fmt::Debug for dyn ValidationItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationItem")
            .field("item_id", &self.item_id())
            .finish_non_exhaustive()
    }
}
