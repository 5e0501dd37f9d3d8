//! Local heal pass: cheap string repairs applied between validation and
//! regeneration.

use std::collections::HashMap;

use tracing::debug;

use crate::core::issue::Issue;
use crate::core::pack::SpecPack;

/// Result of offering every issue-owning rule a local repair.
#[derive(Debug, Clone)]
pub struct LocalHealOutcome {
    /// Draft after applying all accepted repairs, in pack order.
    pub draft: String,
    /// Ids of rules whose repair was applied.
    pub healed_items: Vec<String>,
    /// Issues whose owning rule declined to repair (escalate to
    /// regeneration).
    pub remaining: Vec<Issue>,
}

/// Offer each rule with outstanding issues a local repair, in pack
/// declaration order.
///
/// A rule returning `Some` replaces the working draft; its issues are
/// considered addressed and are re-checked by the next validation pass. A
/// rule returning `None` keeps its issues in `remaining`, preserving report
/// order.
pub fn apply_local_heals(draft: &str, issues: &[Issue], pack: &SpecPack) -> LocalHealOutcome {
    let mut by_item: HashMap<&str, Vec<Issue>> = HashMap::new();
    for issue in issues {
        by_item
            .entry(issue.item_id.as_str())
            .or_default()
            .push(issue.clone());
    }

    let mut current = draft.to_string();
    let mut healed_items = Vec::new();

    for item in pack.items() {
        let Some(owned) = by_item.get(item.item_id()) else {
            continue;
        };
        if let Some(next) = item.heal(&current, owned) {
            debug!(item_id = item.item_id(), "local heal applied");
            current = next;
            healed_items.push(item.item_id().to_string());
        }
    }

    let remaining: Vec<Issue> = issues
        .iter()
        .filter(|issue| !healed_items.iter().any(|h| h == &issue.item_id))
        .cloned()
        .collect();

    LocalHealOutcome {
        draft: current,
        healed_items,
        remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pack::PackBuilder;
    use crate::core::rules::content::{PlaceholderScan, TitleBlock};
    use crate::core::validator::validate_all;

    fn pack() -> SpecPack {
        PackBuilder::new("p")
            .push(Box::new(TitleBlock::default()))
            .expect("push")
            .push(Box::new(PlaceholderScan::default()))
            .expect("push")
            .build()
    }

    #[test]
    fn healable_issues_are_repaired_and_dropped() {
        let pack = pack();
        let draft = "body without a title";
        let report = validate_all(draft, &pack);
        assert_eq!(report.issues.len(), 1);

        let outcome = apply_local_heals(draft, &report.issues, &pack);
        assert_eq!(outcome.healed_items, vec!["title-block".to_string()]);
        assert!(outcome.remaining.is_empty());
        assert!(validate_all(&outcome.draft, &pack).ok);
    }

    #[test]
    fn heal_none_issues_remain_in_report_order() {
        let pack = pack();
        let draft = "status: TBD, details TODO";
        let report = validate_all(draft, &pack);
        // title missing (healable) + two placeholder markers (not healable)
        assert_eq!(report.issues.len(), 3);

        let outcome = apply_local_heals(draft, &report.issues, &pack);
        assert_eq!(outcome.healed_items, vec!["title-block".to_string()]);
        let owners: Vec<&str> = outcome.remaining.iter().map(|i| i.item_id.as_str()).collect();
        assert_eq!(owners, vec!["placeholder-scan", "placeholder-scan"]);
        assert!(outcome.draft.starts_with("# "));
    }

    #[test]
    fn no_issues_is_a_no_op() {
        let pack = pack();
        let outcome = apply_local_heals("# ok\n", &[], &pack);
        assert_eq!(outcome.draft, "# ok\n");
        assert!(outcome.healed_items.is_empty());
        assert!(outcome.remaining.is_empty());
    }
}
