//! Validation and normalization of `generate_mermaid_diagram` arguments.
//!
//! Hard failures (empty or oversized source, unknown enum values, unsafe
//! output names) produce a [`ValidationFailure`] and never reach the attempt
//! ledger. Out-of-range `scale` and `width` are replaced with the configured
//! defaults instead of failing the request.

use mmdc_mcp_config::defaults::{SCALES, WIDTH_RANGE};
use mmdc_mcp_config::{Background, MermaidSettings, OutputFormat, Theme};
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;

/// Longest caller-supplied output name accepted.
pub const MAX_FILENAME_LEN: usize = 200;

/// A rejected request, reported to the caller and never counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{reason}")]
pub struct ValidationFailure {
    pub reason: String,
    pub suggestion: String,
}

impl ValidationFailure {
    pub fn new(reason: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            suggestion: suggestion.into(),
        }
    }
}

/// A validated render request. Options are fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub source: String,
    pub format: OutputFormat,
    pub theme: Theme,
    pub background: Background,
    pub scale: u32,
    pub width: u32,
    /// Output name without the format extension, if the caller gave one.
    pub file_name: Option<String>,
}

impl RenderRequest {
    /// Validate raw tool arguments against `settings`.
    pub fn from_arguments(
        args: &Value,
        settings: &MermaidSettings,
    ) -> Result<Self, ValidationFailure> {
        let source = args
            .get("mermaid_code")
            .and_then(Value::as_str)
            .unwrap_or_default();

        if source.trim().is_empty() {
            return Err(ValidationFailure::new(
                "mermaid_code is empty - please provide Mermaid diagram syntax",
                "Example: graph TD\n    A[Start] --> B[End]",
            ));
        }

        let length = source.chars().count();
        if length > settings.max_diagram_size {
            return Err(ValidationFailure::new(
                format!(
                    "Diagram code too large ({length} chars, max {})",
                    settings.max_diagram_size
                ),
                "Simplify the diagram or split into multiple diagrams",
            ));
        }

        let scale = coerce_number(args, "scale", settings.default_scale, |n| {
            SCALES.contains(&n)
        });
        let width = coerce_number(args, "width", settings.default_width, |n| {
            WIDTH_RANGE.contains(&n)
        });

        let format = parse_option(
            args,
            "output_format",
            settings.default_format,
            "Use 'png', 'svg', or 'pdf'",
        )?;
        let theme = parse_option(
            args,
            "theme",
            settings.default_theme,
            "Use 'default', 'dark', 'forest', or 'neutral'",
        )?;
        let background = parse_option(
            args,
            "background",
            settings.default_background,
            "Use 'white' or 'transparent'",
        )?;

        let file_name = optional_str(args, "filename")?
            .map(validate_file_name)
            .transpose()?;

        Ok(Self {
            source: source.to_string(),
            format,
            theme,
            background,
            scale,
            width,
            file_name,
        })
    }
}

/// String argument: absent, null or blank means "not given".
fn optional_str<'a>(args: &'a Value, key: &str) -> Result<Option<&'a str>, ValidationFailure> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim())),
        Some(other) => Err(ValidationFailure::new(
            format!("Invalid {key}: {other}"),
            format!("'{key}' must be a string"),
        )),
    }
}

fn parse_option<T>(
    args: &Value,
    key: &str,
    default: T,
    suggestion: &str,
) -> Result<T, ValidationFailure>
where
    T: FromStr,
{
    match optional_str(args, key) {
        Ok(None) => Ok(default),
        Ok(Some(raw)) => raw
            .parse::<T>()
            .map_err(|_| ValidationFailure::new(format!("Invalid {key}: {raw}"), suggestion)),
        Err(_) => Err(ValidationFailure::new(
            format!("Invalid {key}: {}", args[key]),
            suggestion,
        )),
    }
}

/// Numeric knob: anything missing, non-integer or rejected by `accept`
/// becomes `default`.
fn coerce_number(args: &Value, key: &str, default: u32, accept: impl Fn(u32) -> bool) -> u32 {
    let Some(raw) = args.get(key).filter(|v| !v.is_null()) else {
        return default;
    };
    match raw.as_u64().and_then(|n| u32::try_from(n).ok()) {
        Some(n) if accept(n) => n,
        _ => {
            log::warn!("Invalid {key} {raw}, using default {default}");
            default
        }
    }
}

fn validate_file_name(name: &str) -> Result<String, ValidationFailure> {
    let suggestion = "Use a plain file name without directories, e.g. 'architecture_overview'";
    if name.chars().count() > MAX_FILENAME_LEN {
        return Err(ValidationFailure::new(
            format!("filename too long (max {MAX_FILENAME_LEN} chars)"),
            suggestion,
        ));
    }
    if name.contains(['/', '\\', '\0']) || name.contains("..") || name.starts_with('.') {
        return Err(ValidationFailure::new(
            format!("Invalid filename: {name}"),
            suggestion,
        ));
    }
    Ok(name.to_string())
}
