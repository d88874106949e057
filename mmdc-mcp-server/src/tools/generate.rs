//! Handler for the `generate_mermaid_diagram` MCP tool.

use serde_json::Value;

use super::tool_result;
use crate::ServerContext;

/// Execute the `generate_mermaid_diagram` tool.
pub fn handle_generate(ctx: &ServerContext, arguments: &Value) -> Value {
    let outcome = ctx.service.generate(arguments);
    tool_result(outcome.to_response(), !outcome.is_success())
}
