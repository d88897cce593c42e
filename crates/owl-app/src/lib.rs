//! OWL: task automation with a pair of role-playing LLM agents.

pub mod app;
pub mod artifacts;
pub mod cli;
pub mod config;
pub mod web;

pub use cli::{Cli, Commands, RequirementsMode};
pub use config::{ConfigError, OwlConfig};
