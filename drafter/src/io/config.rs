//! Pipeline configuration stored in `drafter.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Pipeline configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to sensible values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DrafterConfig {
    /// Wall-clock budget for one generation call, in seconds.
    pub generation_timeout_secs: u64,

    /// Fail the generation when its output exceeds this many bytes.
    pub output_limit_bytes: usize,

    /// Directory of knowledge documents appended to the prompt, if any.
    pub knowledge_dir: Option<PathBuf>,

    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Command invoked to produce text (e.g. `["llm","generate"]`). The
    /// prompt is fed on stdin; stdout is streamed as deltas.
    pub command: Vec<String>,
}

impl Default for DrafterConfig {
    fn default() -> Self {
        Self {
            generation_timeout_secs: 5 * 60,
            output_limit_bytes: 1_000_000,
            knowledge_dir: None,
            generator: GeneratorConfig::default(),
        }
    }
}

impl DrafterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.generation_timeout_secs == 0 {
            return Err(anyhow!("generation_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `DrafterConfig::default()`. Note that
/// the default has no generator command; `drafter run` rejects that before
/// any generation attempt.
pub fn load_config(path: &Path) -> Result<DrafterConfig> {
    if !path.exists() {
        let cfg = DrafterConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: DrafterConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &DrafterConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, &buf)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
