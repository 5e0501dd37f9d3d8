//! Side-effecting collaborators and their seams.

pub mod config;
pub mod generator;
pub mod knowledge;
pub mod pack_file;
pub mod prompt;
pub mod research;
