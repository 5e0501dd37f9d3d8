//! Built-in rule registry.
//!
//! Rules are explicit records collected into a [`SpecPack`] via typed
//! factories; pack files refer to them by `kind` and supply serde-typed
//! params. The registry does not know how any one rule decides pass/fail.

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use crate::core::item::ValidationItem;
use crate::core::pack::{HealPolicy, PackBuilder, SpecPack};

pub mod content;
pub mod semantic;
pub mod structure;

use content::{PlaceholderScan, TitleBlock, WordCount};
use semantic::ClarityScan;
use structure::{NumberedHeadings, RequiredSections, SectionCount};

/// Registered rule kinds, with a one-line description each.
pub const KINDS: &[(&str, &str)] = &[
    ("numbered-headings", "require numbered markdown section headings"),
    ("required-sections", "require named sections to be present"),
    ("section-count", "bound the total section count"),
    ("word-count", "require a minimum word count"),
    ("placeholder-scan", "forbid placeholder markers (TBD, TODO, ...)"),
    ("title-block", "require a top-level title (locally healable)"),
    ("clarity-scan", "warn on vague language"),
];

/// Construct a rule from its registry kind and JSON params.
pub fn build_item(kind: &str, params: Value) -> Result<Box<dyn ValidationItem>> {
    fn typed<T: serde::de::DeserializeOwned + ValidationItem + 'static>(
        kind: &str,
        params: Value,
    ) -> Result<Box<dyn ValidationItem>> {
        let item: T =
            serde_json::from_value(params).with_context(|| format!("params for rule '{kind}'"))?;
        Ok(Box::new(item))
    }

    match kind {
        "numbered-headings" => typed::<NumberedHeadings>(kind, params),
        "required-sections" => typed::<RequiredSections>(kind, params),
        "section-count" => typed::<SectionCount>(kind, params),
        "word-count" => typed::<WordCount>(kind, params),
        "placeholder-scan" => typed::<PlaceholderScan>(kind, params),
        "title-block" => typed::<TitleBlock>(kind, params),
        "clarity-scan" => typed::<ClarityScan>(kind, params),
        other => Err(anyhow!("unknown rule kind '{other}'")),
    }
}

/// The built-in PRD pack: every registered rule with default-ish params and
/// a healing budget of two attempts.
pub fn default_pack() -> SpecPack {
    PackBuilder::new("prd-default")
        .heal_policy(HealPolicy { max_attempts: 2 })
        .push(Box::new(TitleBlock::default()))
        .and_then(|b| {
            b.push(Box::new(NumberedHeadings { min_sections: 3 }))
        })
        .and_then(|b| {
            b.push(Box::new(RequiredSections {
                sections: vec![
                    "Overview".to_string(),
                    "Requirements".to_string(),
                    "Risks".to_string(),
                ],
            }))
        })
        .and_then(|b| b.push(Box::new(SectionCount { min: 3, max: None })))
        .and_then(|b| b.push(Box::new(WordCount { min_words: 150 })))
        .and_then(|b| b.push(Box::new(PlaceholderScan::default())))
        .and_then(|b| b.push(Box::new(ClarityScan::default())))
        .expect("built-in rule ids are unique")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_pack_has_unique_ids_in_registry_order() {
        let pack = default_pack();
        let ids: Vec<&str> = pack.items().iter().map(|i| i.item_id()).collect();
        assert_eq!(
            ids,
            vec![
                "title-block",
                "numbered-headings",
                "required-sections",
                "section-count",
                "word-count",
                "placeholder-scan",
                "clarity-scan",
            ]
        );
        assert_eq!(pack.heal_policy().max_attempts, 2);
    }

    #[test]
    fn build_item_constructs_typed_rules() {
        let item = build_item("numbered-headings", json!({"minSections": 4})).expect("build");
        assert_eq!(item.item_id(), "numbered-headings");
        assert!(item.to_prompt().contains("at least 4"));
    }

    #[test]
    fn build_item_defaults_optional_params() {
        let item = build_item("placeholder-scan", json!({})).expect("build");
        assert!(!item.validate("this is TBD").is_empty());
    }

    #[test]
    fn build_item_rejects_unknown_kind() {
        let err = build_item("no-such-rule", json!({})).unwrap_err();
        assert!(err.to_string().contains("unknown rule kind"));
    }

    #[test]
    fn build_item_rejects_bad_params() {
        let err = build_item("word-count", json!({"minWords": "ten"})).unwrap_err();
        assert!(err.to_string().contains("params for rule 'word-count'"));
    }

    #[test]
    fn kinds_table_matches_registry() {
        for (kind, _) in KINDS {
            // Every advertised kind must construct with permissive params.
            let params = match *kind {
                "numbered-headings" => json!({"minSections": 1}),
                "required-sections" => json!({"sections": ["Overview"]}),
                "section-count" => json!({"min": 1}),
                "word-count" => json!({"minWords": 1}),
                _ => json!({}),
            };
            build_item(kind, params).expect("registered kind builds");
        }
    }
}
