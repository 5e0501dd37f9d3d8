//! Wire frames for reporting loop progress to a remote caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::validator::ValidationReport;

/// Loop phase reported in `phase` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Generating,
    Validating,
    Healing,
}

/// Machine-readable error taxonomy carried by `error` frames.
///
/// Decoding preserves codes outside the taxonomy as [`ErrorCode::Other`]
/// instead of dropping the frame; producers only emit the named variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    /// Fatal: the pipeline cannot start (e.g. no generator configured).
    MissingConfiguration,
    /// Non-fatal: represented as issues, drives healing.
    ValidationFailure,
    /// Non-fatal: best-effort result returned with residual issues.
    AttemptLimitReached,
    /// Decode-time malformed frame; dropped, stream continues.
    TransportError,
    /// Fatal: anything else; terminates the run.
    UnexpectedError,
    /// A code outside the taxonomy, preserved verbatim from the wire.
    Other(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::MissingConfiguration => "MISSING_CONFIGURATION",
            Self::ValidationFailure => "VALIDATION_FAILURE",
            Self::AttemptLimitReached => "ATTEMPT_LIMIT_REACHED",
            Self::TransportError => "TRANSPORT_ERROR",
            Self::UnexpectedError => "UNEXPECTED_ERROR",
            Self::Other(code) => code,
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(match code.as_str() {
            "MISSING_CONFIGURATION" => Self::MissingConfiguration,
            "VALIDATION_FAILURE" => Self::ValidationFailure,
            "ATTEMPT_LIMIT_REACHED" => Self::AttemptLimitReached,
            "TRANSPORT_ERROR" => Self::TransportError,
            "UNEXPECTED_ERROR" => Self::UnexpectedError,
            _ => Self::Other(code),
        })
    }
}

/// One self-describing unit of the streamed progress protocol.
///
/// Frames are ordered but carry no back-references; each is a closed
/// record. On the wire a frame is one JSON object per line:
/// `{"type":"phase","data":{...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum StreamFrame {
    Phase {
        phase: Phase,
        attempt: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Generation {
        delta: String,
    },
    Validation {
        report: ValidationReport,
    },
    #[serde(rename_all = "camelCase")]
    Result {
        final_draft: String,
    },
    Error {
        message: String,
        code: ErrorCode,
        recoverable: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<Value>,
    },
    SelfReview {
        attempt: u32,
        resolved: usize,
        remaining: usize,
    },
}

impl StreamFrame {
    pub fn phase(phase: Phase, attempt: u32) -> Self {
        Self::Phase {
            phase,
            attempt,
            message: None,
        }
    }

    /// True for the two frame kinds that may terminate a stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Result { .. } | Self::Error { .. })
    }
}
