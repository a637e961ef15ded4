//! The `mcli` document client.

pub mod cli;
pub mod commands;

pub use cli::Cli;
pub use commands::{run, run_command, Target};
