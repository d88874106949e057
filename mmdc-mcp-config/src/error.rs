//! Typed error variants for the mmdc-mcp-config crate.
//!
//! `Config::load` still returns `anyhow::Result` for the binary boundary;
//! callers that want to match on a specific failure can downcast:
//!
//! ```rust,no_run
//! use mmdc_mcp_config::ConfigError;
//!
//! fn check_load_err(e: &anyhow::Error) {
//!     if let Some(cfg_err) = e.downcast_ref::<ConfigError>() {
//!         match cfg_err {
//!             ConfigError::Io { path, .. } => eprintln!("cannot read {path}"),
//!             ConfigError::Parse(p) => eprintln!("YAML parse error: {p}"),
//!             ConfigError::Validation(msg) => eprintln!("Validation: {msg}"),
//!         }
//!     }
//! }
//! ```

use thiserror::Error;

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("I/O error reading config '{path}': {source}")]
    Io {
        /// Path of the config file.
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config file contained invalid YAML.
    #[error("YAML parse error in config: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    /// A field value failed semantic validation.
    ///
    /// The inner string names the field and the accepted range.
    #[error("Config validation error: {0}")]
    Validation(String),
}
