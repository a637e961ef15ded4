//! The `rcli` key-value client.

pub mod cli;
pub mod commands;

pub use cli::Cli;
pub use commands::{run, run_command};
