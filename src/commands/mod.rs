//! CLI command implementations for cli-proc-monitor.
//!
//! - `check`: System validation
//! - `config`: Configuration file generation
//! - `test`: Poll a few times and print what was found

pub mod check;
pub mod config;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use test::command_test;
