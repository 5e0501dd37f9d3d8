//! Spec-validated PRD drafting pipeline.
//!
//! This crate implements a bounded generate/validate/heal loop for drafting
//! product requirements documents against a pluggable pack of validation
//! rules. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (rules, validation,
//!   classification, local healing). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting collaborators (config, subprocess
//!   generation, knowledge files, prompt assembly). Isolated behind traits
//!   to enable scripting in tests.
//! - **[`protocol`]**: The NDJSON stream-frame wire format, with a
//!   chunk-boundary-safe decoder.
//!
//! [`workflow`] coordinates core logic with I/O to run the full loop,
//! reporting progress through a [`protocol::encode::FrameSink`].

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod protocol;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod workflow;
