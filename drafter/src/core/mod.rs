//! Deterministic, pure pipeline logic.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod classifier;
pub mod heal;
pub mod issue;
pub mod item;
pub mod pack;
pub mod rules;
pub mod validator;
