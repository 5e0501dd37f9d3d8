//! NDJSON frame encoding and the outgoing frame sink.

use std::io::Write;

use anyhow::{Context, Result};
use tracing::debug;

use crate::protocol::frame::StreamFrame;

/// Serialize one frame as a newline-terminated JSON record.
pub fn encode_frame(frame: &StreamFrame) -> Result<String> {
    let mut line = serde_json::to_string(frame).context("serialize frame")?;
    line.push('\n');
    Ok(line)
}

/// Destination for outgoing frames.
///
/// Both the normal completion path and the error path may independently try
/// to terminate the stream, so `close` must be idempotent and `emit` after
/// close must be a silent no-op.
pub trait FrameSink {
    fn emit(&mut self, frame: &StreamFrame) -> Result<()>;
    fn close(&mut self);
}

/// Frame sink writing newline-delimited JSON, flushed per frame.
pub struct NdjsonSink<W: Write> {
    writer: Option<W>,
}

impl<W: Write> NdjsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
        }
    }
}

impl<W: Write> FrameSink for NdjsonSink<W> {
    fn emit(&mut self, frame: &StreamFrame) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            debug!("frame emitted after close, dropping");
            return Ok(());
        };
        let line = encode_frame(frame)?;
        writer.write_all(line.as_bytes()).context("write frame")?;
        writer.flush().context("flush frame")?;
        Ok(())
    }

    fn close(&mut self) {
        self.writer = None;
    }
}
