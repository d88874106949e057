//! Configuration system for the mmdc-mcp diagram server.
//!
//! This crate provides configuration loading and default values for the
//! server. It includes:
//!
//! - The YAML-backed [`Config`] model (`mermaid`, `server`, `logging` sections)
//! - Output option enums shared with the render core ([`OutputFormat`],
//!   [`Theme`], [`Background`])
//! - `${VAR}` substitution and environment variable overrides
//! - Typed [`ConfigError`] values for I/O, parse and validation failures

pub mod config;
pub mod defaults;
pub mod env_vars;
pub mod error;
mod types;

// Re-export main types for convenience
pub use config::{Config, LoggingSettings, MermaidSettings, ServerSettings};
pub use env_vars::substitute_variables;
pub use error::ConfigError;
pub use types::{Background, OutputFormat, Theme, UnknownVariant};
