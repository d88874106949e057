//! Command-line interface for mmdc-mcp.
//!
//! `serve` (the default) runs the stdio MCP server. The other subcommands are
//! local utilities that finish immediately.

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use mmdc_mcp_config::Config;
use mmdc_mcp_server::syntax;
use mmdc_mcp_server::tools::list_types;
use std::io::Read;
use std::path::{Path, PathBuf};

/// mmdc-mcp - Mermaid diagram rendering for MCP clients
#[derive(Parser)]
#[command(name = "mmdc-mcp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (default: $MMDC_MCP_CONFIG, then <config dir>/mmdc-mcp/config.yaml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level: off, error, warn, info, debug or trace
    #[arg(long, global = true, value_name = "LEVEL", value_parser = parse_log_level)]
    pub log_level: Option<LevelFilter>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the MCP server on stdin/stdout (default)
    Serve,

    /// Check Mermaid syntax locally and print the report
    Validate {
        /// Diagram file, or '-' for stdin
        #[arg(value_name = "FILE")]
        path: String,
    },

    /// Print the supported diagram types
    Types,

    /// Load and validate the configuration, then print it
    CheckConfig,
}

/// Runtime options passed from CLI to the server
#[derive(Clone, Debug, Default)]
pub struct RuntimeOptions {
    /// Explicit config file path
    pub config_path: Option<PathBuf>,
    /// Log level from `--log-level`
    pub log_level: Option<LevelFilter>,
}

impl RuntimeOptions {
    /// Load the configuration this run should use.
    pub fn load_config(&self) -> anyhow::Result<Config> {
        match &self.config_path {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        }
    }
}

/// Result of CLI processing
pub enum CliResult {
    /// Start the server with these options
    Continue(RuntimeOptions),
    /// Exit with the given code (subcommand completed)
    Exit(i32),
}

fn parse_log_level(value: &str) -> Result<LevelFilter, String> {
    crate::debug::parse_level_name(value)
        .ok_or_else(|| format!("unknown log level '{value}'"))
}

/// Process CLI arguments and handle subcommands
pub fn process_cli() -> CliResult {
    process(Cli::parse())
}

/// Handle an already-parsed command line.
pub fn process(cli: Cli) -> CliResult {
    let options = RuntimeOptions {
        config_path: cli.config,
        log_level: cli.log_level,
    };

    let result = match cli.command {
        None | Some(Commands::Serve) => return CliResult::Continue(options),
        Some(Commands::Validate { path }) => validate(&path),
        Some(Commands::Types) => print_json(&list_types::catalogue()).map(|()| true),
        Some(Commands::CheckConfig) => check_config(&options),
    };

    match result {
        Ok(true) => CliResult::Exit(0),
        Ok(false) => CliResult::Exit(1),
        Err(e) => {
            eprintln!("mmdc-mcp: error: {e:#}");
            CliResult::Exit(1)
        }
    }
}

/// Print the syntax report; `Ok(false)` when the diagram is invalid.
fn validate(path: &str) -> anyhow::Result<bool> {
    let source = read_source(path)?;
    let report = syntax::check(&source);
    let mut value = serde_json::to_value(&report)?;
    value["prompt"] = serde_json::Value::String(report.prompt());
    print_json(&value)?;
    Ok(report.valid)
}

fn read_source(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("Failed to read diagram from stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(Path::new(path)).with_context(|| format!("Failed to read {path}"))
}

fn check_config(options: &RuntimeOptions) -> anyhow::Result<bool> {
    let mut config = options.load_config()?;
    if !config.server.auth_token.is_empty() {
        config.server.auth_token = "********".to_string();
    }
    print!("{}", serde_yaml_ng::to_string(&config)?);
    Ok(true)
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
