//! The YAML-backed configuration model.
//!
//! Every section is `#[serde(default)]`, so an empty or partial file is
//! valid. Load order: defaults, then the YAML file (after `${VAR}`
//! substitution), then environment overrides, then validation.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::defaults;
use crate::env_vars::substitute_variables_with;
use crate::error::ConfigError;
use crate::types::{Background, OutputFormat, Theme};

/// Environment variable for overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "MMDC_MCP_CONFIG";

/// Default config filename (relative to the config dir).
pub const CONFIG_FILENAME: &str = "config.yaml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mermaid: MermaidSettings,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

/// Rendering settings: retry budget, limits, defaults and renderer paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MermaidSettings {
    /// Render attempts allowed per distinct diagram source.
    pub max_retry_attempts: u32,
    /// Directory generated artifacts are written to.
    pub output_dir: PathBuf,
    /// Maximum diagram source length, in characters.
    pub max_diagram_size: usize,
    pub default_format: OutputFormat,
    pub default_theme: Theme,
    pub default_background: Background,
    pub default_scale: u32,
    pub default_width: u32,
    /// Wall-clock limit for one renderer invocation.
    pub render_timeout_secs: u64,
    /// Renderer executable (mermaid-cli).
    pub mmdc_path: String,
    /// Where per-invocation scratch inputs and the sandbox config live.
    pub scratch_dir: PathBuf,
}

impl Default for MermaidSettings {
    fn default() -> Self {
        Self {
            max_retry_attempts: defaults::max_retry_attempts(),
            output_dir: defaults::output_dir(),
            max_diagram_size: defaults::max_diagram_size(),
            default_format: OutputFormat::default(),
            default_theme: Theme::default(),
            default_background: Background::default(),
            default_scale: defaults::scale(),
            default_width: defaults::width(),
            render_timeout_secs: defaults::render_timeout_secs(),
            mmdc_path: defaults::mmdc_path(),
            scratch_dir: defaults::scratch_dir(),
        }
    }
}

/// Settings used to build public artifact locators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub public_base_url: String,
    /// Appended as `?token=` to artifact URLs; empty means no token.
    pub auth_token: String,
    /// Upper bound on `tools/call` requests (and so renderer processes)
    /// running at once.
    pub max_concurrent_renders: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            public_base_url: defaults::public_base_url(),
            auth_token: String::new(),
            max_concurrent_renders: defaults::max_concurrent_renders(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `error`, `warn`, `info`, `debug`, `trace` or `off`.
    pub level: Option<String>,
    /// Optional file that mirrors everything written to stderr.
    pub file: Option<PathBuf>,
}

impl Config {
    /// Resolve the config file path from `MMDC_MCP_CONFIG` or
    /// `<config_dir>/mmdc-mcp/config.yaml`.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
            && !path.trim().is_empty()
        {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".config")
            })
            .join(defaults::APP_DIR_NAME)
            .join(CONFIG_FILENAME)
    }

    /// Load from the default path, apply environment overrides and validate.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path` (defaults when the file is absent), apply environment
    /// overrides and validate.
    pub fn load_from(path: &Path) -> Result<Self> {
        log::info!("Config path: {:?}", path);

        let mut config = if path.exists() {
            let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            Self::from_yaml_str_with(&contents, |name| std::env::var(name).ok())?
        } else {
            log::info!("No config file at {:?}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML after `${VAR}` substitution with an explicit lookup.
    pub fn from_yaml_str_with(
        contents: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let contents = substitute_variables_with(contents, lookup);
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(&contents)?)
    }

    /// Apply the documented environment overrides. Values that fail to parse
    /// are logged and ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let m = &mut self.mermaid;
        override_parsed(&lookup, "MERMAID_MAX_RETRIES", &mut m.max_retry_attempts);
        override_parsed(&lookup, "MERMAID_MAX_DIAGRAM_SIZE", &mut m.max_diagram_size);
        override_parsed(&lookup, "MERMAID_DEFAULT_FORMAT", &mut m.default_format);
        override_parsed(&lookup, "MERMAID_DEFAULT_THEME", &mut m.default_theme);
        override_parsed(&lookup, "MERMAID_DEFAULT_BACKGROUND", &mut m.default_background);
        override_parsed(&lookup, "MERMAID_TIMEOUT_SECS", &mut m.render_timeout_secs);
        if let Some(dir) = non_empty(&lookup, "MERMAID_OUTPUT_DIR") {
            m.output_dir = PathBuf::from(dir);
        }
        if let Some(path) = non_empty(&lookup, "MERMAID_MMDC_PATH") {
            m.mmdc_path = path;
        }

        if let Some(url) = non_empty(&lookup, "PUBLIC_BASE_URL") {
            self.server.public_base_url = url;
        }
        if let Some(token) = lookup("AUTH_TOKEN") {
            self.server.auth_token = token;
        }
        override_parsed(
            &lookup,
            "MMDC_MCP_MAX_CONCURRENT_RENDERS",
            &mut self.server.max_concurrent_renders,
        );
    }

    /// Check ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.mermaid;
        if m.max_retry_attempts == 0 {
            return Err(ConfigError::Validation(
                "mermaid.max_retry_attempts must be at least 1".into(),
            ));
        }
        if m.max_diagram_size == 0 {
            return Err(ConfigError::Validation(
                "mermaid.max_diagram_size must be at least 1".into(),
            ));
        }
        if m.render_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "mermaid.render_timeout_secs must be at least 1".into(),
            ));
        }
        if !defaults::SCALES.contains(&m.default_scale) {
            return Err(ConfigError::Validation(format!(
                "mermaid.default_scale must be one of {:?}, got {}",
                defaults::SCALES,
                m.default_scale
            )));
        }
        if !defaults::WIDTH_RANGE.contains(&m.default_width) {
            return Err(ConfigError::Validation(format!(
                "mermaid.default_width must be within {}..={}, got {}",
                defaults::WIDTH_RANGE.start(),
                defaults::WIDTH_RANGE.end(),
                m.default_width
            )));
        }
        if m.mmdc_path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "mermaid.mmdc_path must not be empty".into(),
            ));
        }
        if self.server.max_concurrent_renders == 0 {
            return Err(ConfigError::Validation(
                "server.max_concurrent_renders must be at least 1".into(),
            ));
        }
        url::Url::parse(&self.server.public_base_url).map_err(|e| {
            ConfigError::Validation(format!(
                "server.public_base_url '{}' is not a valid URL: {e}",
                self.server.public_base_url
            ))
        })?;
        Ok(())
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Option<String> {
    lookup(var).filter(|v| !v.trim().is_empty())
}

fn override_parsed<T>(lookup: &impl Fn(&str) -> Option<String>, var: &str, target: &mut T)
where
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = non_empty(lookup, var) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *target = value,
        Err(e) => log::warn!("Ignoring {var}={raw:?}: {e}"),
    }
}
