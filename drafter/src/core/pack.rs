//! Named, ordered rule collections with a healing budget.

use std::collections::HashSet;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::item::ValidationItem;

/// Healing budget for a pack.
///
/// `max_attempts = 0` disables healing: the first draft is validated once
/// and returned as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealPolicy {
    pub max_attempts: u32,
}

impl Default for HealPolicy {
    fn default() -> Self {
        Self { max_attempts: 2 }
    }
}

/// An immutable, named, ordered set of validation rules plus a healing
/// policy. Shared read-only by every component for the duration of a run.
pub struct SpecPack {
    id: String,
    items: Vec<Box<dyn ValidationItem>>,
    heal_policy: HealPolicy,
}

impl SpecPack {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Rules in declaration order.
    pub fn items(&self) -> &[Box<dyn ValidationItem>] {
        &self.items
    }

    pub fn heal_policy(&self) -> HealPolicy {
        self.heal_policy
    }
}

impl std::fmt::Debug for SpecPack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.items.iter().map(|item| item.item_id()).collect();
        f.debug_struct("SpecPack")
            .field("id", &self.id)
            .field("items", &ids)
            .field("heal_policy", &self.heal_policy)
            .finish()
    }
}

/// Builder that enforces `item_id` uniqueness eagerly, at pack construction
/// rather than at run time.
#[derive(Debug)]
pub struct PackBuilder {
    id: String,
    items: Vec<Box<dyn ValidationItem>>,
    seen: HashSet<String>,
    heal_policy: HealPolicy,
}

impl PackBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            items: Vec::new(),
            seen: HashSet::new(),
            heal_policy: HealPolicy::default(),
        }
    }

    pub fn heal_policy(mut self, policy: HealPolicy) -> Self {
        self.heal_policy = policy;
        self
    }

    /// Append a rule, rejecting duplicate ids.
    pub fn push(mut self, item: Box<dyn ValidationItem>) -> Result<Self> {
        let item_id = item.item_id().to_string();
        if item_id.trim().is_empty() {
            return Err(anyhow!("pack '{}': empty item id", self.id));
        }
        if !self.seen.insert(item_id.clone()) {
            return Err(anyhow!("pack '{}': duplicate item id '{item_id}'", self.id));
        }
        self.items.push(item);
        Ok(self)
    }

    pub fn build(self) -> SpecPack {
        SpecPack {
            id: self.id,
            items: self.items,
            heal_policy: self.heal_policy,
        }
    }
}
