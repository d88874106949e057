//! Environment variable allowlist and substitution for config file processing.
//!
//! Only allowlisted variables (and `MMDC_MCP_*` / `MERMAID_*` prefixed ones)
//! are resolved, so a shared config file cannot pull arbitrary secrets out of
//! the server's environment.

use regex::Regex;
use std::sync::LazyLock;

/// Matches `${VAR_NAME}` or `${VAR_NAME:-default_value}`.
static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-((?:[^}\\]|\\.)*))?}")
        .expect("env-var substitution regex is a compile-time constant and must be valid")
});

/// Environment variables that are safe to substitute in config files.
pub const ALLOWED_ENV_VARS: &[&str] = &[
    "HOME",
    "USER",
    "USERNAME",
    "LOGNAME",
    "USERPROFILE",
    "XDG_CONFIG_HOME",
    "XDG_DATA_HOME",
    "XDG_STATE_HOME",
    "XDG_CACHE_HOME",
    "XDG_RUNTIME_DIR",
    "TMPDIR",
    "TEMP",
    "TMP",
    "HOSTNAME",
    "APPDATA",
    "LOCALAPPDATA",
    "PUBLIC_BASE_URL",
    "AUTH_TOKEN",
];

/// A variable is allowed if it is in [`ALLOWED_ENV_VARS`] or carries one of
/// the application prefixes.
pub fn is_env_var_allowed(var_name: &str) -> bool {
    ALLOWED_ENV_VARS.contains(&var_name)
        || var_name.starts_with("MMDC_MCP_")
        || var_name.starts_with("MERMAID_")
}

/// Substitute `${VAR}` patterns using the process environment.
///
/// - `${VAR}` is replaced with the value of `VAR`; unset leaves the placeholder.
/// - `${VAR:-default}` falls back to `default` when `VAR` is unset.
/// - `$${VAR}` is an escape producing the literal `${VAR}`.
pub fn substitute_variables(input: &str) -> String {
    substitute_variables_with(input, |name| std::env::var(name).ok())
}

/// Same as [`substitute_variables`] with an explicit variable lookup.
pub fn substitute_variables_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let escaped_placeholder = "\x00ESC_DOLLAR\x00";
    let working = input.replace("$${", escaped_placeholder);

    let result = ENV_VAR_PATTERN.replace_all(&working, |caps: &regex::Captures| {
        let var_name = &caps[1];

        if !is_env_var_allowed(var_name) {
            log::warn!(
                "Config references non-allowlisted environment variable: ${{{var_name}}}, skipped"
            );
            return caps[0].to_string();
        }

        match lookup(var_name) {
            Some(val) => val,
            None => caps
                .get(2)
                .map(|m| m.as_str().replace("\\}", "}"))
                .unwrap_or_else(|| caps[0].to_string()),
        }
    });

    result.replace(escaped_placeholder, "${")
}
