//! Chunk-boundary-safe NDJSON frame decoding.

use tracing::{debug, warn};

use crate::protocol::frame::StreamFrame;

/// Incremental decoder for a transport that may split frames at arbitrary
/// byte offsets, including mid-record and mid-code-point.
///
/// Bytes are buffered until a `\n` completes a record; the trailing partial
/// line re-seeds the buffer. Malformed lines are dropped with a logged
/// warning rather than raised: one corrupt line must not abort an otherwise
/// healthy stream.
///
/// Construct one processor per connection; state never crosses runs.
#[derive(Debug, Default)]
pub struct StreamProcessor {
    buf: Vec<u8>,
}

impl StreamProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one transport chunk, returning every frame completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamFrame> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = &line[..line.len() - 1];
            if let Some(frame) = parse_line(line) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Parse any remaining buffered content as a final, unterminated record.
    ///
    /// Garbage left at stream end is discarded silently: the producer is
    /// expected to terminate with a well-formed terminal frame.
    pub fn flush(&mut self) -> Option<StreamFrame> {
        let rest = std::mem::take(&mut self.buf);
        if rest.iter().all(|b| b.is_ascii_whitespace()) {
            return None;
        }
        match serde_json::from_slice(&rest) {
            Ok(frame) => Some(frame),
            Err(err) => {
                debug!(error = %err, "discarding trailing partial record");
                None
            }
        }
    }

    /// Drop all buffered state, ready for a fresh connection.
    pub fn reset(&mut self) {
        self.buf.clear();
    }
}

fn parse_line(line: &[u8]) -> Option<StreamFrame> {
    if line.iter().all(|b| b.is_ascii_whitespace()) {
        return None;
    }
    match serde_json::from_slice(line) {
        Ok(frame) => Some(frame),
        Err(err) => {
            warn!(
                error = %err,
                line = %String::from_utf8_lossy(line),
                "dropping malformed frame line"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode::encode_frame;
    use crate::protocol::frame::{ErrorCode, Phase};

    fn sample_frames() -> Vec<StreamFrame> {
        vec![
            StreamFrame::phase(Phase::Generating, 0),
            StreamFrame::Generation {
                delta: "multi-byte: déjà vu ✓".to_string(),
            },
            StreamFrame::Error {
                message: "boom".to_string(),
                code: ErrorCode::UnexpectedError,
                recoverable: false,
                details: None,
            },
            StreamFrame::Result {
                final_draft: "done".to_string(),
            },
        ]
    }

    fn encode_all(frames: &[StreamFrame]) -> Vec<u8> {
        frames
            .iter()
            .map(|f| encode_frame(f).expect("encode"))
            .collect::<String>()
            .into_bytes()
    }

    #[test]
    fn whole_stream_in_one_chunk() {
        let frames = sample_frames();
        let mut proc = StreamProcessor::new();
        let decoded = proc.push(&encode_all(&frames));
        assert_eq!(decoded, frames);
        assert!(proc.flush().is_none());
    }

    /// One-byte chunks must reproduce the frame sequence exactly, including
    /// through multi-byte UTF-8 sequences split mid-code-point.
    #[test]
    fn one_byte_chunks_round_trip() {
        let frames = sample_frames();
        let bytes = encode_all(&frames);
        let mut proc = StreamProcessor::new();
        let mut decoded = Vec::new();
        for byte in bytes {
            decoded.extend(proc.push(&[byte]));
        }
        assert_eq!(decoded, frames);
    }

    /// A single record split at every possible byte offset decodes to
    /// exactly one frame in every split configuration.
    #[test]
    fn single_record_split_at_every_offset() {
        let record = br#"{"type":"result","data":{"finalDraft":"x"}}
"#;
        for split in 0..=record.len() {
            let mut proc = StreamProcessor::new();
            let mut decoded = proc.push(&record[..split]);
            decoded.extend(proc.push(&record[split..]));
            assert_eq!(decoded.len(), 1, "split at offset {split}");
            assert_eq!(
                decoded[0],
                StreamFrame::Result {
                    final_draft: "x".to_string()
                }
            );
        }
    }

    #[test]
    fn malformed_lines_are_dropped_and_stream_continues() {
        let mut proc = StreamProcessor::new();
        let input = concat!(
            "{\"type\":\"phase\",\"data\":{\"phase\":\"generating\",\"attempt\":0}}\n",
            "this is not json\n",
            "{\"type\":\"oops\",\"data\":{}}\n",
            "{\"no_type_at_all\":true}\n",
            "{\"type\":\"result\",\"data\":{\"finalDraft\":\"d\"}}\n",
        );
        let decoded = proc.push(input.as_bytes());
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0], StreamFrame::phase(Phase::Generating, 0));
        assert!(decoded[1].is_terminal());
    }

    /// A shape-valid error frame must survive decoding even when its code
    /// is outside the taxonomy; only malformed lines get dropped.
    #[test]
    fn error_frames_with_unrecognized_codes_are_kept() {
        let mut proc = StreamProcessor::new();
        let decoded = proc.push(
            b"{\"type\":\"error\",\"data\":{\"message\":\"no key\",\"code\":\"MISSING_API_KEY\",\"recoverable\":false}}\n",
        );
        assert_eq!(decoded.len(), 1);
        assert_eq!(
            decoded[0],
            StreamFrame::Error {
                message: "no key".to_string(),
                code: ErrorCode::Other("MISSING_API_KEY".to_string()),
                recoverable: false,
                details: None,
            }
        );
        assert!(decoded[0].is_terminal());
    }

    #[test]
    fn empty_lines_are_ignored() {
        let mut proc = StreamProcessor::new();
        let decoded = proc.push(b"\n  \n{\"type\":\"generation\",\"data\":{\"delta\":\"x\"}}\n\n");
        assert_eq!(decoded.len(), 1);
    }

    #[test]
    fn flush_parses_trailing_unterminated_record() {
        let mut proc = StreamProcessor::new();
        assert!(proc
            .push(br#"{"type":"result","data":{"finalDraft":"x"}}"#)
            .is_empty());
        let frame = proc.flush().expect("trailing record");
        assert_eq!(
            frame,
            StreamFrame::Result {
                final_draft: "x".to_string()
            }
        );
        // Buffer consumed: a second flush yields nothing.
        assert!(proc.flush().is_none());
    }

    #[test]
    fn flush_discards_garbage_silently() {
        let mut proc = StreamProcessor::new();
        assert!(proc.push(b"{\"type\":\"resu").is_empty());
        assert!(proc.flush().is_none());
    }

    #[test]
    fn reset_clears_partial_state() {
        let mut proc = StreamProcessor::new();
        assert!(proc.push(b"{\"type\":\"gener").is_empty());
        proc.reset();
        let decoded = proc.push(b"{\"type\":\"generation\",\"data\":{\"delta\":\"y\"}}\n");
        assert_eq!(
            decoded,
            vec![StreamFrame::Generation {
                delta: "y".to_string()
            }]
        );
    }
}
