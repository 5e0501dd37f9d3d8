//! Streamed progress protocol: frames, NDJSON encoding, chunk-safe decoding.

pub mod decode;
pub mod encode;
pub mod frame;
