//! Stable exit codes for drafter CLI commands.

/// Command succeeded; for `run`, the final draft passed validation.
pub const OK: i32 = 0;
/// Command failed due to invalid config/pack/input or other errors.
pub const INVALID: i32 = 1;
/// `validate` found issues, or `run` exhausted its attempt budget.
pub const ISSUES: i32 = 2;
