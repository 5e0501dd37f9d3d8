//! Test-only scripted collaborators for exercising the pipeline without a
//! real generator.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use futures::StreamExt;

use crate::io::generator::{GenerateRequest, Generator, TextStream};
use crate::io::knowledge::{KnowledgeDoc, KnowledgeSource};
use crate::io::research::{ResearchFact, ResearchSource};
use crate::protocol::encode::FrameSink;
use crate::protocol::frame::StreamFrame;

/// One scripted generation: the chunks streamed for a single call, or a
/// stream-time failure.
pub enum ScriptedGen {
    Chunks(Vec<String>),
    Fail(String),
}

impl ScriptedGen {
    /// Stream a whole draft as a single chunk.
    pub fn draft(text: &str) -> Self {
        Self::Chunks(vec![text.to_string()])
    }
}

/// Generator that replays scripted outputs in order and counts calls.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<ScriptedGen>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<ScriptedGen>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of generation calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Generator for ScriptedGenerator {
    async fn generate(&self, _request: &GenerateRequest) -> Result<TextStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .expect("script lock")
            .pop_front()
            .ok_or_else(|| anyhow!("scripted generator exhausted"))?;
        match next {
            ScriptedGen::Chunks(chunks) => {
                Ok(futures::stream::iter(chunks.into_iter().map(Ok)).boxed())
            }
            ScriptedGen::Fail(message) => Ok(futures::stream::iter(vec![Err(anyhow!(message))]).boxed()),
        }
    }
}

/// Knowledge source returning fixed documents.
pub struct StaticKnowledge(pub Vec<KnowledgeDoc>);

impl KnowledgeSource for StaticKnowledge {
    fn read_all(&self) -> Result<Vec<KnowledgeDoc>> {
        Ok(self.0.clone())
    }
}

/// Research source returning fixed facts.
pub struct StaticResearch(pub Vec<ResearchFact>);

impl ResearchSource for StaticResearch {
    fn lookup(&self, _names: &[String]) -> Result<Vec<ResearchFact>> {
        Ok(self.0.clone())
    }
}

/// Frame sink collecting frames in memory, with idempotent close.
#[derive(Default)]
pub struct CollectSink {
    pub frames: Vec<StreamFrame>,
    pub closes: usize,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames matching a predicate, by reference.
    pub fn filtered(&self, pred: impl Fn(&StreamFrame) -> bool) -> Vec<&StreamFrame> {
        self.frames.iter().filter(|f| pred(f)).collect()
    }
}

impl FrameSink for CollectSink {
    fn emit(&mut self, frame: &StreamFrame) -> Result<()> {
        if self.closes == 0 {
            self.frames.push(frame.clone());
        }
        Ok(())
    }

    fn close(&mut self) {
        self.closes += 1;
    }
}
