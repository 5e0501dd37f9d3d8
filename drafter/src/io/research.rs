//! Competitor-research collaborator, specified at the boundary only.

use anyhow::Result;
use tracing::warn;

/// One structured research fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchFact {
    pub subject: String,
    pub fact: String,
}

/// Source of research facts, consumed once per run.
pub trait ResearchSource {
    fn lookup(&self, names: &[String]) -> Result<Vec<ResearchFact>>;
}

/// Research source that never has anything to say.
pub struct NoResearch;

impl ResearchSource for NoResearch {
    fn lookup(&self, _names: &[String]) -> Result<Vec<ResearchFact>> {
        Ok(Vec::new())
    }
}

/// Look up facts, degrading to an empty set on failure.
pub fn lookup_or_empty<R: ResearchSource>(source: &R, names: &[String]) -> Vec<ResearchFact> {
    match source.lookup(names) {
        Ok(facts) => facts,
        Err(err) => {
            warn!(error = %err, "research source failed, continuing without facts");
            Vec::new()
        }
    }
}
