//! Prompt assembly for generation and healing calls.
//!
//! The draft prompt injects every rule's expectation up front, so the
//! generator is told the rules before drafting. The healing prompt phrases
//! each classifier bucket differently: deterministic findings carry raw
//! rule evidence under a "Fix" imperative, semantic findings carry a
//! location hint under "Improvement", structural findings fall under
//! "Required". Empty buckets render no section at all.

use anyhow::Result;
use minijinja::{Environment, context};
use serde::Serialize;

use crate::core::classifier::IssueClasses;
use crate::core::issue::Issue;
use crate::core::pack::SpecPack;
use crate::io::knowledge::KnowledgeDoc;
use crate::io::research::ResearchFact;

const DRAFT_TEMPLATE: &str = include_str!("prompts/draft.md");
const HEALING_TEMPLATE: &str = include_str!("prompts/healing.md");

/// System-level framing shared by every generation call.
pub const SYSTEM_CONTEXT: &str =
    "You are a precise product-requirements writer. Respond with markdown only.";

#[derive(Debug, Clone, Serialize)]
struct DocContext {
    path: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct FactContext {
    subject: String,
    fact: String,
}

#[derive(Debug, Clone, Serialize)]
struct IssueContext {
    id: String,
    message: String,
    evidence: Option<String>,
    location: Option<String>,
}

impl IssueContext {
    fn from_issue(issue: &Issue) -> Self {
        Self {
            id: issue.id.clone(),
            message: issue.message.clone(),
            evidence: issue.evidence.clone(),
            location: issue
                .hints
                .as_ref()
                .and_then(|hints| hints.first().cloned()),
        }
    }
}

/// All inputs needed to build the initial draft prompt.
#[derive(Debug, Clone)]
pub struct DraftInputs {
    /// Raw input brief from the caller.
    pub input: String,
    pub knowledge: Vec<KnowledgeDoc>,
    pub research: Vec<ResearchFact>,
}

/// Template engine wrapper around minijinja.
struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("draft", DRAFT_TEMPLATE)
            .expect("draft template should be valid");
        env.add_template("healing", HEALING_TEMPLATE)
            .expect("healing template should be valid");
        Self { env }
    }

    fn render_draft(&self, inputs: &DraftInputs, pack: &SpecPack) -> Result<String> {
        let expectations: Vec<String> =
            pack.items().iter().map(|item| item.to_prompt()).collect();
        let knowledge: Vec<DocContext> = inputs
            .knowledge
            .iter()
            .map(|doc| DocContext {
                path: doc.path.clone(),
                content: doc.content.trim().to_string(),
            })
            .collect();
        let research: Vec<FactContext> = inputs
            .research
            .iter()
            .map(|fact| FactContext {
                subject: fact.subject.clone(),
                fact: fact.fact.clone(),
            })
            .collect();

        let template = self.env.get_template("draft")?;
        let rendered = template.render(context! {
            input => inputs.input.trim(),
            expectations => expectations,
            knowledge => (!knowledge.is_empty()).then_some(knowledge),
            research => (!research.is_empty()).then_some(research),
        })?;
        Ok(rendered)
    }

    fn render_healing(&self, draft: &str, classes: &IssueClasses) -> Result<String> {
        let bucket = |issues: &[Issue]| -> Option<Vec<IssueContext>> {
            (!issues.is_empty())
                .then(|| issues.iter().map(IssueContext::from_issue).collect())
        };

        let template = self.env.get_template("healing")?;
        let rendered = template.render(context! {
            draft => draft,
            deterministic => bucket(&classes.deterministic),
            semantic => bucket(&classes.semantic),
            structural => bucket(&classes.structural),
        })?;
        Ok(rendered)
    }
}

/// Builds generation and healing prompts for a pack.
#[derive(Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Initial draft prompt: brief + rule expectations + optional context.
    pub fn build_draft(&self, inputs: &DraftInputs, pack: &SpecPack) -> String {
        PromptEngine::new()
            .render_draft(inputs, pack)
            .expect("draft template rendering should not fail")
    }

    /// Healing prompt: current draft + per-bucket repair instructions.
    pub fn build_healing(&self, draft: &str, classes: &IssueClasses) -> String {
        PromptEngine::new()
            .render_healing(draft, classes)
            .expect("healing template rendering should not fail")
    }
}
