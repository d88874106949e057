//! Tool registration, descriptors, and dispatch for the MCP server.
//!
//! This module owns the tool registry: it builds the `tools/list` response and
//! dispatches `tools/call` requests to the appropriate per-tool handler.

pub mod generate;
pub mod list_types;
pub mod validate;

use serde_json::Value;

use crate::ServerContext;

pub use generate::handle_generate;
pub use list_types::handle_list_types;
pub use validate::handle_validate;

pub const GENERATE_TOOL: &str = "generate_mermaid_diagram";
pub const VALIDATE_TOOL: &str = "validate_mermaid_syntax";
pub const LIST_TYPES_TOOL: &str = "list_diagram_types";

// ---------------------------------------------------------------------------
// Tool descriptors
// ---------------------------------------------------------------------------

fn generate_input_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "mermaid_code": {
                "type": "string",
                "description": "Mermaid diagram source"
            },
            "output_format": {
                "type": "string",
                "enum": ["svg", "png", "pdf"],
                "description": "Output format (default from server config, normally svg)"
            },
            "filename": {
                "type": "string",
                "description": "Output name without extension; generated when omitted"
            },
            "theme": {
                "type": "string",
                "enum": ["default", "dark", "forest", "neutral"]
            },
            "background": {
                "type": "string",
                "enum": ["white", "transparent"]
            },
            "scale": {
                "type": "integer",
                "enum": [1, 2, 3],
                "description": "Raster scale factor: 1 fast, 2 balanced, 3 high quality"
            },
            "width": {
                "type": "integer",
                "minimum": 800,
                "maximum": 3200,
                "description": "Raster width in pixels"
            }
        },
        "required": ["mermaid_code"]
    })
}

fn generate_tool() -> Value {
    serde_json::json!({
        "name": GENERATE_TOOL,
        "description": "Generate diagram image from Mermaid code. Returns image_url to view result.\n\nRequired: mermaid_code (string)\nOptional: output_format (svg/png/pdf, default=svg), filename, theme (default/dark/forest/neutral), background (white/transparent), scale (1-3, default=2), width (800-3200px, default=1600)\n\nQuality: scale=1 (fast), scale=2 (balanced), scale=3 (high). SVG is fastest and recommended.\nReturns: {success, image_url, file_name} or {success=false, error, suggestion}",
        "inputSchema": generate_input_schema()
    })
}

fn validate_tool() -> Value {
    serde_json::json!({
        "name": VALIDATE_TOOL,
        "description": "Validate Mermaid syntax without generating image. Returns {valid, diagram_type, errors[]}",
        "inputSchema": {
            "type": "object",
            "properties": {
                "mermaid_code": {
                    "type": "string",
                    "description": "Mermaid diagram source"
                }
            },
            "required": ["mermaid_code"]
        }
    })
}

fn list_types_tool() -> Value {
    serde_json::json!({
        "name": LIST_TYPES_TOOL,
        "description": "List supported Mermaid diagram types (flowchart, sequence, class, ER, gantt, etc.) with examples",
        "inputSchema": {
            "type": "object",
            "properties": {}
        }
    })
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Handle the `tools/list` request.
pub fn handle_tools_list() -> Value {
    serde_json::json!({
        "tools": [generate_tool(), validate_tool(), list_types_tool()]
    })
}

/// Handle the `tools/call` request.
pub fn handle_tools_call(ctx: &ServerContext, params: Option<Value>) -> Value {
    let params = match params {
        Some(p) => p,
        None => {
            return tool_error("Missing params for tools/call");
        }
    };

    let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
    let empty = Value::Object(Default::default());
    let arguments = params.get("arguments").unwrap_or(&empty);

    match name {
        GENERATE_TOOL => handle_generate(ctx, arguments),
        VALIDATE_TOOL => handle_validate(arguments),
        LIST_TYPES_TOOL => handle_list_types(),
        _ => tool_error(&format!("Unknown tool: {name}")),
    }
}

// ---------------------------------------------------------------------------
// Result helpers (shared by tool handlers in submodules)
// ---------------------------------------------------------------------------

/// Build a tool error result.
pub fn tool_error(message: &str) -> Value {
    serde_json::json!({
        "isError": true,
        "content": [{
            "type": "text",
            "text": message
        }]
    })
}

/// Wrap a response object as a tool result: JSON text content plus the same
/// object as `structuredContent`.
pub fn tool_result(response: Value, is_error: bool) -> Value {
    let text = serde_json::to_string_pretty(&response).unwrap_or_else(|_| response.to_string());
    let mut result = serde_json::json!({
        "content": [{
            "type": "text",
            "text": text
        }],
        "structuredContent": response
    });
    if is_error {
        result["isError"] = Value::Bool(true);
    }
    result
}
