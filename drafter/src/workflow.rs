//! The healing orchestrator: a bounded generate -> validate -> heal loop
//! that reports every transition as a stream frame.

use anyhow::{Context, Result};
use futures::StreamExt;
use tracing::{debug, info, instrument, warn};

use crate::core::classifier::classify;
use crate::core::heal::apply_local_heals;
use crate::core::pack::SpecPack;
use crate::core::validator::{ValidationReport, validate_all};
use crate::io::generator::{GenerateRequest, Generator};
use crate::io::knowledge::{KnowledgeSource, read_all_or_empty};
use crate::io::prompt::{DraftInputs, PromptBuilder, SYSTEM_CONTEXT};
use crate::io::research::{ResearchSource, lookup_or_empty};
use crate::protocol::encode::FrameSink;
use crate::protocol::frame::{ErrorCode, Phase, StreamFrame};

/// Marker error: the pipeline cannot start at all (no generator
/// configured). Fatal before any generation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingConfigError {
    pub message: String,
}

impl std::fmt::Display for MissingConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "missing configuration: {}", self.message)
    }
}

impl std::error::Error for MissingConfigError {}

/// Caller input for one run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Raw product brief.
    pub input: String,
    /// Competitor names handed to the research source.
    pub research_names: Vec<String>,
}

/// How a run ended. Both variants carry a draft: exhausting the attempt
/// budget is a soft failure and still returns the best available draft.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Validation passed.
    Clean { draft: String, attempts: u32 },
    /// Attempts exhausted with issues remaining; the caller decides
    /// whether the draft is acceptable.
    AttemptLimitReached {
        draft: String,
        report: ValidationReport,
    },
}

/// Orchestrator-internal loop state; never exposed outside a single run.
struct WorkflowState {
    attempt: u32,
    draft: String,
    report: Option<ValidationReport>,
}

/// Drive the full loop and guarantee terminal-frame discipline: the sink
/// sees a finite stream of phase/generation/validation frames followed by
/// exactly one `result` or `error` frame, then the sink is closed.
pub async fn run_to_sink<G, K, R, S>(
    request: &RunRequest,
    pack: &SpecPack,
    generator: &G,
    knowledge: &K,
    research: &R,
    sink: &mut S,
) -> Result<RunOutcome>
where
    G: Generator,
    K: KnowledgeSource,
    R: ResearchSource,
    S: FrameSink,
{
    match run_workflow(request, pack, generator, knowledge, research, sink).await {
        Ok(outcome) => {
            sink.close();
            Ok(outcome)
        }
        Err(err) => {
            if let Err(emit_err) = sink.emit(&error_frame_for(&err)) {
                warn!(error = %emit_err, "failed to emit terminal error frame");
            }
            sink.close();
            Err(err)
        }
    }
}

/// Build the terminal `error` frame for a failed run.
pub fn error_frame_for(err: &anyhow::Error) -> StreamFrame {
    let code = if err.downcast_ref::<MissingConfigError>().is_some() {
        ErrorCode::MissingConfiguration
    } else {
        ErrorCode::UnexpectedError
    };
    StreamFrame::Error {
        message: format!("{err:#}"),
        code,
        recoverable: false,
        details: None,
    }
}

/// The loop itself. Emits every non-terminal frame plus the `result`
/// frame; error funneling lives in [`run_to_sink`].
///
/// Invariants: `attempt` is monotone and never exceeds the pack's
/// `max_attempts`; at most `max_attempts + 1` generation calls are made;
/// every iteration emits exactly one `validation` frame before any healing
/// decision; the loop always terminates.
#[instrument(skip_all, fields(pack = pack.id(), max_attempts = pack.heal_policy().max_attempts))]
pub async fn run_workflow<G, K, R, S>(
    request: &RunRequest,
    pack: &SpecPack,
    generator: &G,
    knowledge: &K,
    research: &R,
    sink: &mut S,
) -> Result<RunOutcome>
where
    G: Generator,
    K: KnowledgeSource,
    R: ResearchSource,
    S: FrameSink,
{
    let prompts = PromptBuilder::new();
    // Collaborator failures degrade to empty context, never abort the run.
    let inputs = DraftInputs {
        input: request.input.clone(),
        knowledge: read_all_or_empty(knowledge),
        research: lookup_or_empty(research, &request.research_names),
    };

    let mut state = WorkflowState {
        attempt: 0,
        draft: String::new(),
        report: None,
    };

    sink.emit(&StreamFrame::Phase {
        phase: Phase::Generating,
        attempt: 0,
        message: Some("initial draft".to_string()),
    })?;
    state.draft = stream_generation(
        generator,
        &GenerateRequest {
            prompt: prompts.build_draft(&inputs, pack),
            system_context: SYSTEM_CONTEXT.to_string(),
        },
        sink,
    )
    .await?;

    loop {
        sink.emit(&StreamFrame::phase(Phase::Validating, state.attempt))?;
        let report = validate_all(&state.draft, pack);
        sink.emit(&StreamFrame::Validation {
            report: report.clone(),
        })?;

        if let Some(prev) = &state.report {
            sink.emit(&StreamFrame::SelfReview {
                attempt: state.attempt,
                resolved: prev.issues.len().saturating_sub(report.issues.len()),
                remaining: report.issues.len(),
            })?;
        }

        if report.ok {
            info!(attempt = state.attempt, "draft is clean");
            sink.emit(&StreamFrame::Result {
                final_draft: state.draft.clone(),
            })?;
            return Ok(RunOutcome::Clean {
                draft: state.draft,
                attempts: state.attempt,
            });
        }

        if state.attempt >= pack.heal_policy().max_attempts {
            // Soft failure: return the best available draft with the
            // outstanding issues; do not fabricate success.
            warn!(
                attempt = state.attempt,
                issues = report.issues.len(),
                "attempt limit reached, returning best-effort draft"
            );
            sink.emit(&StreamFrame::Result {
                final_draft: state.draft.clone(),
            })?;
            return Ok(RunOutcome::AttemptLimitReached {
                draft: state.draft,
                report,
            });
        }

        state.attempt += 1;
        sink.emit(&StreamFrame::phase(Phase::Healing, state.attempt))?;

        let healed = apply_local_heals(&state.draft, &report.issues, pack);
        state.draft = healed.draft;
        if healed.remaining.is_empty() {
            debug!(
                healed = healed.healed_items.len(),
                "every issue healed locally, skipping regeneration"
            );
        } else {
            let classes = classify(&healed.remaining);
            state.draft = stream_generation(
                generator,
                &GenerateRequest {
                    prompt: prompts.build_healing(&state.draft, &classes),
                    system_context: SYSTEM_CONTEXT.to_string(),
                },
                sink,
            )
            .await?;
        }
        state.report = Some(report);
    }
}

/// Consume one generation stream, forwarding each delta as a frame.
async fn stream_generation<G: Generator, S: FrameSink>(
    generator: &G,
    request: &GenerateRequest,
    sink: &mut S,
) -> Result<String> {
    let mut stream = generator.generate(request).await?;
    let mut draft = String::new();
    while let Some(delta) = stream.next().await {
        let delta = delta.context("generation stream failed")?;
        sink.emit(&StreamFrame::Generation {
            delta: delta.clone(),
        })?;
        draft.push_str(&delta);
    }
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pack::{HealPolicy, PackBuilder};
    use crate::core::rules::content::{PlaceholderScan, TitleBlock, WordCount};
    use crate::test_support::{
        CollectSink, ScriptedGen, ScriptedGenerator, StaticKnowledge, StaticResearch,
    };

    fn request() -> RunRequest {
        RunRequest {
            input: "A plant-watering app.".to_string(),
            research_names: Vec::new(),
        }
    }

    fn pack_with(max_attempts: u32, items: Vec<Box<dyn crate::core::item::ValidationItem>>) -> SpecPack {
        let mut builder = PackBuilder::new("test").heal_policy(HealPolicy { max_attempts });
        for item in items {
            builder = builder.push(item).expect("unique ids");
        }
        builder.build()
    }

    async fn run(
        pack: &SpecPack,
        generator: &ScriptedGenerator,
    ) -> (Result<RunOutcome>, CollectSink) {
        let mut sink = CollectSink::new();
        let outcome = run_to_sink(
            &request(),
            pack,
            generator,
            &StaticKnowledge(Vec::new()),
            &StaticResearch(Vec::new()),
            &mut sink,
        )
        .await;
        (outcome, sink)
    }

    fn phases(sink: &CollectSink) -> Vec<(Phase, u32)> {
        sink.frames
            .iter()
            .filter_map(|f| match f {
                StreamFrame::Phase { phase, attempt, .. } => Some((*phase, *attempt)),
                _ => None,
            })
            .collect()
    }

    fn terminal_count(sink: &CollectSink) -> usize {
        sink.frames.iter().filter(|f| f.is_terminal()).count()
    }

    #[tokio::test]
    async fn clean_first_draft_ends_after_one_generation() {
        let pack = pack_with(2, vec![Box::new(WordCount { min_words: 2 })]);
        let generator =
            ScriptedGenerator::new(vec![ScriptedGen::Chunks(vec![
                "one ".to_string(),
                "two three".to_string(),
            ])]);

        let (outcome, sink) = run(&pack, &generator).await;

        assert_eq!(
            outcome.expect("run"),
            RunOutcome::Clean {
                draft: "one two three".to_string(),
                attempts: 0
            }
        );
        assert_eq!(generator.calls(), 1);
        assert_eq!(phases(&sink), vec![(Phase::Generating, 0), (Phase::Validating, 0)]);
        // Deltas are forwarded as they arrive.
        let deltas = sink.filtered(|f| matches!(f, StreamFrame::Generation { .. }));
        assert_eq!(deltas.len(), 2);
        assert_eq!(terminal_count(&sink), 1);
        assert_eq!(sink.closes, 1);
    }

    /// With `max_attempts = 0` and a failing first draft, the loop emits
    /// generating, validating, validation, then a best-effort result —
    /// never a healing phase.
    #[tokio::test]
    async fn zero_attempts_skips_healing_entirely() {
        let pack = pack_with(0, vec![Box::new(WordCount { min_words: 100 })]);
        let generator = ScriptedGenerator::new(vec![ScriptedGen::draft("too short")]);

        let (outcome, sink) = run(&pack, &generator).await;

        match outcome.expect("run") {
            RunOutcome::AttemptLimitReached { draft, report } => {
                assert_eq!(draft, "too short");
                assert!(!report.ok);
            }
            other => panic!("expected limit outcome, got {other:?}"),
        }
        assert_eq!(generator.calls(), 1);
        assert_eq!(phases(&sink), vec![(Phase::Generating, 0), (Phase::Validating, 0)]);
        assert!(sink.frames.iter().any(|f| matches!(f, StreamFrame::Validation { .. })));
        assert_eq!(terminal_count(&sink), 1);
        assert!(matches!(
            sink.frames.last(),
            Some(StreamFrame::Result { .. })
        ));
    }

    #[tokio::test]
    async fn healing_regenerates_and_succeeds() {
        let pack = pack_with(2, vec![Box::new(PlaceholderScan::default())]);
        let generator = ScriptedGenerator::new(vec![
            ScriptedGen::draft("plan: TBD"),
            ScriptedGen::draft("plan: ship in Q3"),
        ]);

        let (outcome, sink) = run(&pack, &generator).await;

        assert_eq!(
            outcome.expect("run"),
            RunOutcome::Clean {
                draft: "plan: ship in Q3".to_string(),
                attempts: 1
            }
        );
        assert_eq!(generator.calls(), 2);
        assert_eq!(
            phases(&sink),
            vec![
                (Phase::Generating, 0),
                (Phase::Validating, 0),
                (Phase::Healing, 1),
                (Phase::Validating, 1),
            ]
        );
        // The re-validation after healing is followed by a self-review.
        assert!(sink.frames.iter().any(|f| matches!(
            f,
            StreamFrame::SelfReview {
                attempt: 1,
                resolved: 1,
                remaining: 0
            }
        )));
    }

    /// Bounded loop: with `max_attempts = N` the orchestrator performs at
    /// most N+1 generation calls and terminates.
    #[tokio::test]
    async fn attempt_limit_bounds_generation_calls() {
        let max_attempts = 2;
        let pack = pack_with(max_attempts, vec![Box::new(WordCount { min_words: 100 })]);
        let generator = ScriptedGenerator::new(vec![
            ScriptedGen::draft("short 1"),
            ScriptedGen::draft("short 2"),
            ScriptedGen::draft("short 3"),
            // Extra script entries must never be consumed.
            ScriptedGen::draft("never used"),
        ]);

        let (outcome, sink) = run(&pack, &generator).await;

        assert!(matches!(
            outcome.expect("run"),
            RunOutcome::AttemptLimitReached { .. }
        ));
        assert_eq!(generator.calls(), (max_attempts + 1) as usize);
        // One validation frame per iteration.
        let validations = sink.filtered(|f| matches!(f, StreamFrame::Validation { .. }));
        assert_eq!(validations.len(), (max_attempts + 1) as usize);
        assert_eq!(terminal_count(&sink), 1);
    }

    #[tokio::test]
    async fn fully_local_heal_skips_regeneration() {
        let pack = pack_with(2, vec![Box::new(TitleBlock::default())]);
        // Only one generation is scripted: the healing pass must not call
        // the generator because title-block heals locally.
        let generator = ScriptedGenerator::new(vec![ScriptedGen::draft("body without title")]);

        let (outcome, sink) = run(&pack, &generator).await;

        match outcome.expect("run") {
            RunOutcome::Clean { draft, attempts } => {
                assert!(draft.starts_with("# Product Requirements Document"));
                assert_eq!(attempts, 1);
            }
            other => panic!("expected clean outcome, got {other:?}"),
        }
        assert_eq!(generator.calls(), 1);
        assert_eq!(
            phases(&sink),
            vec![
                (Phase::Generating, 0),
                (Phase::Validating, 0),
                (Phase::Healing, 1),
                (Phase::Validating, 1),
            ]
        );
    }

    #[tokio::test]
    async fn generator_failure_emits_exactly_one_error_frame() {
        let pack = pack_with(2, vec![Box::new(WordCount { min_words: 1 })]);
        let generator =
            ScriptedGenerator::new(vec![ScriptedGen::Fail("backend unavailable".to_string())]);

        let (outcome, sink) = run(&pack, &generator).await;

        assert!(outcome.is_err());
        assert_eq!(terminal_count(&sink), 1);
        match sink.frames.last().expect("frames") {
            StreamFrame::Error {
                code, recoverable, ..
            } => {
                assert_eq!(*code, ErrorCode::UnexpectedError);
                assert!(!recoverable);
            }
            other => panic!("expected error frame, got {other:?}"),
        }
        assert_eq!(sink.closes, 1);
    }

    #[tokio::test]
    async fn missing_configuration_maps_to_its_error_code() {
        let err: anyhow::Error = MissingConfigError {
            message: "generator.command is not configured".to_string(),
        }
        .into();
        match error_frame_for(&err) {
            StreamFrame::Error { code, .. } => {
                assert_eq!(code, ErrorCode::MissingConfiguration);
            }
            other => panic!("expected error frame, got {other:?}"),
        }
    }
}
