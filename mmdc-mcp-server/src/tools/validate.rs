//! Handler for the `validate_mermaid_syntax` MCP tool.

use serde_json::Value;

use super::tool_result;
use crate::syntax;

/// Execute the `validate_mermaid_syntax` tool. Invalid syntax is reported
/// in-band (`valid: false`), not as a tool error.
pub fn handle_validate(arguments: &Value) -> Value {
    log::info!("Validating Mermaid syntax");
    let source = arguments
        .get("mermaid_code")
        .and_then(Value::as_str)
        .unwrap_or_default();
    tool_result(validation_response(source), false)
}

/// The syntax report plus its `prompt` line.
pub fn validation_response(source: &str) -> Value {
    let report = syntax::check(source);
    let mut response = serde_json::to_value(&report).unwrap_or_default();
    response["prompt"] = Value::String(report.prompt());
    response
}
