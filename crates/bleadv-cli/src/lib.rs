//! bleadv CLI library
//!
//! Command line parsing, layered configuration and the command handlers
//! behind the `bleadv` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::{Cli, Commands, Overrides};
pub use commands::CommandDispatcher;
pub use config::AppConfig;
pub use error::{CliError, Result};
