//! Knowledge-base collaborator: local documents that extend the prompt.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

/// One knowledge document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeDoc {
    pub path: String,
    pub content: String,
}

/// Source of background documents, consumed once per run.
pub trait KnowledgeSource {
    fn read_all(&self) -> Result<Vec<KnowledgeDoc>>;
}

/// Knowledge source that reads every `.md` file in a directory,
/// lexicographically by file name.
pub struct DirKnowledge {
    dir: PathBuf,
}

impl DirKnowledge {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl KnowledgeSource for DirKnowledge {
    fn read_all(&self) -> Result<Vec<KnowledgeDoc>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries: Vec<PathBuf> = fs::read_dir(&self.dir)
            .with_context(|| format!("read knowledge dir {}", self.dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
            .collect();
        entries.sort();

        let mut docs = Vec::new();
        for path in entries {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("read knowledge doc {}", path.display()))?;
            docs.push(KnowledgeDoc {
                path: path.display().to_string(),
                content,
            });
        }
        Ok(docs)
    }
}

/// Knowledge source with nothing to contribute.
pub struct NoKnowledge;

impl KnowledgeSource for NoKnowledge {
    fn read_all(&self) -> Result<Vec<KnowledgeDoc>> {
        Ok(Vec::new())
    }
}

/// Read all documents, degrading to an empty context on failure.
///
/// A broken knowledge base must never abort a run.
pub fn read_all_or_empty<K: KnowledgeSource>(source: &K) -> Vec<KnowledgeDoc> {
    match source.read_all() {
        Ok(docs) => docs,
        Err(err) => {
            warn!(error = %err, "knowledge source failed, continuing without context");
            Vec::new()
        }
    }
}
