//! Pack definition files: JSON validated against a bundled schema, then
//! built into a [`SpecPack`] via the rule registry.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use jsonschema::Draft;
use serde::Deserialize;
use serde_json::Value;

use crate::core::pack::{HealPolicy, PackBuilder, SpecPack};
use crate::core::rules::build_item;

const PACK_SCHEMA: &str = include_str!("../../schemas/spec_pack.schema.json");

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackFile {
    id: String,
    #[serde(default)]
    heal_policy: HealPolicy,
    items: Vec<ItemEntry>,
}

#[derive(Debug, Deserialize)]
struct ItemEntry {
    kind: String,
    #[serde(default = "empty_params")]
    params: Value,
}

fn empty_params() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Parse and build a pack from JSON text: schema conformance first, then
/// rule construction (duplicate ids fail at build, not at run time).
pub fn parse_pack(raw: &str) -> Result<SpecPack> {
    let instance: Value = serde_json::from_str(raw).context("parse pack json")?;
    validate_schema(&instance)?;
    let file: PackFile = serde_json::from_str(raw).context("parse pack as v1 struct")?;

    let mut builder = PackBuilder::new(&file.id).heal_policy(file.heal_policy);
    for entry in file.items {
        let item = build_item(&entry.kind, entry.params)?;
        builder = builder.push(item)?;
    }
    Ok(builder.build())
}

/// Load a pack definition from disk.
pub fn load_pack(path: &Path) -> Result<SpecPack> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_pack(&raw).with_context(|| format!("load pack {}", path.display()))
}

/// Validate a pack instance against the bundled JSON Schema (Draft 2020-12).
fn validate_schema(instance: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(PACK_SCHEMA).context("parse bundled pack schema")?;
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .context("compile pack schema")?;
    let messages: Vec<String> = compiled
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        bail!("pack schema validation failed:\n- {}", messages.join("\n- "));
    }
    Ok(())
}
