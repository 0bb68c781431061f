//! Use cases: the orchestration layer between transports and the domain.

pub mod commands;

pub use commands::{CommandOutcome, CommandProcessor, ProcessError};
