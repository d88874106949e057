//! Configuration loading through the CLI runtime options.

use mmdc_mcp::cli::RuntimeOptions;
use mmdc_mcp::config::{ConfigError, OutputFormat, Theme};
use std::path::PathBuf;

fn options_for(path: PathBuf) -> RuntimeOptions {
    RuntimeOptions {
        config_path: Some(path),
        log_level: None,
    }
}

#[test]
fn test_explicit_config_path_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.yaml");
    std::fs::write(
        &path,
        "mermaid:\n  max_retry_attempts: 2\n  default_format: pdf\n  default_theme: forest\n\
         logging:\n  level: debug\n",
    )
    .unwrap();

    let config = options_for(path).load_config().unwrap();
    assert_eq!(config.mermaid.max_retry_attempts, 2);
    assert_eq!(config.mermaid.default_format, OutputFormat::Pdf);
    assert_eq!(config.mermaid.default_theme, Theme::Forest);
    assert_eq!(config.logging.level.as_deref(), Some("debug"));
}

#[test]
fn test_missing_explicit_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = options_for(dir.path().join("nope.yaml")).load_config().unwrap();
    assert_eq!(config.mermaid.max_diagram_size, 50_000);
    assert_eq!(config.mermaid.render_timeout_secs, 30);
}

#[test]
fn test_disallowed_variables_are_not_substituted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "mermaid:\n  mmdc_path: \"${SOME_SECRET_VAR}/mmdc\"\n").unwrap();

    let config = options_for(path).load_config().unwrap();
    assert_eq!(config.mermaid.mmdc_path, "${SOME_SECRET_VAR}/mmdc");
}

#[test]
fn test_default_substitution_value_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(
        &path,
        "mermaid:\n  output_dir: \"${MMDC_MCP_TEST_UNSET_ROOT:-/srv/mermaid}/diagrams\"\n",
    )
    .unwrap();

    let config = options_for(path).load_config().unwrap();
    assert_eq!(
        config.mermaid.output_dir,
        PathBuf::from("/srv/mermaid/diagrams")
    );
}

#[test]
fn test_invalid_config_is_a_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "server:\n  public_base_url: \"::not a url::\"\n").unwrap();

    let err = options_for(path).load_config().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::Validation(_))
    ));
}
