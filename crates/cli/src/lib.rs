//! CLI tool for driving a shardkv router.
//!
//! Provides:
//! - Parsing of command scripts (`add_server`, `remove_server`, `store`, `retrieve`)
//! - Replay of those scripts against a router
//! - Command-line and file configuration

pub mod commands;
pub mod config;

pub use commands::{replay, Command, CommandResult, ParseError};
pub use config::CliConfig;
