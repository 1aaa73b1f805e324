//! Library half of the `hatchling` binary.

pub mod commands;
pub mod posts;
