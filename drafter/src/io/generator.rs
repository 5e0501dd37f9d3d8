//! Generator abstraction for draft production.
//!
//! The [`Generator`] trait decouples the healing loop from the actual text
//! backend (currently a configured subprocess). Tests use scripted
//! generators that stream predetermined chunks without spawning processes.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_stream::try_stream;
use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use crate::io::config::DrafterConfig;

/// Incremental text produced by a generation call.
pub type TextStream = BoxStream<'static, Result<String>>;

/// Parameters for one generation call.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Prompt text to feed to the generator.
    pub prompt: String,
    /// System-level framing prepended to the prompt.
    pub system_context: String,
}

/// Abstraction over text-generation backends.
///
/// The pipeline does not know or care how the backend produces text; it
/// only consumes the delta stream in order.
pub trait Generator {
    fn generate(
        &self,
        request: &GenerateRequest,
    ) -> impl Future<Output = Result<TextStream>> + Send;
}

/// Generator that spawns a configured command, feeds the prompt on stdin,
/// and streams stdout chunks as deltas.
#[derive(Debug)]
pub struct CommandGenerator {
    command: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl CommandGenerator {
    /// Build from config. An empty generator command is a configuration
    /// error and is rejected here, before any generation attempt.
    pub fn from_config(cfg: &DrafterConfig) -> Result<Self> {
        if cfg.generator.command.is_empty() || cfg.generator.command[0].trim().is_empty() {
            return Err(crate::workflow::MissingConfigError {
                message: "generator.command is not configured".to_string(),
            }
            .into());
        }
        Ok(Self {
            command: cfg.generator.command.clone(),
            timeout: Duration::from_secs(cfg.generation_timeout_secs),
            output_limit_bytes: cfg.output_limit_bytes,
        })
    }
}

impl Generator for CommandGenerator {
    #[instrument(skip_all, fields(timeout_secs = self.timeout.as_secs()))]
    async fn generate(&self, request: &GenerateRequest) -> Result<TextStream> {
        info!(command = %self.command[0], "starting generator command");

        let mut cmd = Command::new(&self.command[0]);
        cmd.args(&self.command[1..])
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true);

        let deadline = Instant::now() + self.timeout;
        let mut child = cmd.spawn().context("spawn generator command")?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("stdin was not piped"))?;
        let input = format!("{}\n\n{}", request.system_context, request.prompt);
        // A child that never drains stdin blocks this write once the pipe
        // buffer fills, so it runs under the same deadline as the reads.
        tokio::time::timeout_at(deadline, stdin.write_all(input.as_bytes()))
            .await
            .map_err(|_| anyhow!("generation timed out"))?
            .context("write prompt to generator stdin")?;
        drop(stdin);

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("stdout was not piped"))?;

        let limit = self.output_limit_bytes;

        let stream = try_stream! {
            let mut carry: Vec<u8> = Vec::new();
            let mut total = 0usize;
            let mut buf = [0u8; 8192];
            loop {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    Err(anyhow!("generation timed out"))?;
                }
                let n = tokio::time::timeout(remaining, stdout.read(&mut buf))
                    .await
                    .map_err(|_| anyhow!("generation timed out"))?
                    .context("read generator output")?;
                if n == 0 {
                    break;
                }
                total += n;
                if total > limit {
                    Err(anyhow!("generator output exceeded {limit} bytes"))?;
                }
                carry.extend_from_slice(&buf[..n]);
                let (text, rest) = split_valid_utf8(std::mem::take(&mut carry));
                carry = rest;
                if !text.is_empty() {
                    yield text;
                }
            }
            if !carry.is_empty() {
                Err(anyhow!("generator output ended mid UTF-8 sequence"))?;
            }
            let status = child.wait().await.context("wait for generator")?;
            debug!(exit_code = ?status.code(), "generator finished");
            if !status.success() {
                Err(anyhow!("generator exited with status {:?}", status.code()))?;
            }
        };

        Ok(stream.boxed())
    }
}

/// Split a byte buffer into its longest valid UTF-8 prefix and the
/// (possibly incomplete) remainder. A read boundary may land mid-code-point.
fn split_valid_utf8(bytes: Vec<u8>) -> (String, Vec<u8>) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, Vec::new()),
        Err(err) => {
            let valid = err.utf8_error().valid_up_to();
            let mut bytes = err.into_bytes();
            let rest = bytes.split_off(valid);
            let text = String::from_utf8(bytes).expect("prefix verified valid");
            (text, rest)
        }
    }
}

/// Drain a generation stream into a single string (used by tests and the
/// CLI when deltas are not forwarded anywhere).
pub async fn collect(mut stream: TextStream) -> Result<String> {
    let mut out = String::new();
    while let Some(delta) = stream.next().await {
        out.push_str(&delta?);
    }
    Ok(out)
}
