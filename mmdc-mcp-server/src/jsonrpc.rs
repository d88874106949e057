//! JSON-RPC 2.0 wire types and response helpers.
//!
//! This module contains the minimal set of types needed to implement a
//! JSON-RPC 2.0 server over stdio: incoming message deserialization,
//! outgoing response serialization, and the standard error constructors.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
/// MCP extension code for an unknown resource URI.
pub const RESOURCE_NOT_FOUND: i64 = -32002;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// An incoming JSON-RPC 2.0 message from the client.
#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    #[allow(dead_code)] // Deserialized from JSON-RPC requests
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
}

/// An outgoing JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Value,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// ---------------------------------------------------------------------------
// Response constructors
// ---------------------------------------------------------------------------

/// Build a success response.
pub fn success_response(id: Value, result: Value) -> Response {
    Response {
        jsonrpc: "2.0",
        result: Some(result),
        error: None,
        id,
    }
}

/// Build an error response with an arbitrary code.
pub fn error_response(id: Value, code: i64, message: impl Into<String>) -> Response {
    Response {
        jsonrpc: "2.0",
        result: None,
        error: Some(RpcError {
            code,
            message: message.into(),
            data: None,
        }),
        id,
    }
}

/// Build a method-not-found error response.
pub fn method_not_found(id: Value, method: &str) -> Response {
    error_response(id, METHOD_NOT_FOUND, format!("Method not found: {method}"))
}

/// Build an invalid-params error response.
pub fn invalid_params(id: Value, message: impl Into<String>) -> Response {
    error_response(id, INVALID_PARAMS, message)
}

/// Build a resource-not-found error response carrying the URI.
pub fn resource_not_found(id: Value, uri: &str) -> Response {
    let mut response = error_response(id, RESOURCE_NOT_FOUND, "Resource not found");
    if let Some(error) = response.error.as_mut() {
        error.data = Some(serde_json::json!({ "uri": uri }));
    }
    response
}

/// Build a parse error response.
pub fn parse_error() -> Response {
    error_response(Value::Null, PARSE_ERROR, "Parse error")
}

// ---------------------------------------------------------------------------
// I/O helper
// ---------------------------------------------------------------------------

/// Send a JSON-RPC response to a writer as a single newline-terminated line.
pub fn send_response(out: &mut impl Write, response: &Response) {
    match serde_json::to_string(response) {
        Ok(json) => {
            if let Err(e) = writeln!(out, "{json}") {
                log::error!("Failed to write response: {e}");
            }
            if let Err(e) = out.flush() {
                log::error!("Failed to flush stdout: {e}");
            }
        }
        Err(e) => {
            log::error!("Failed to serialize response: {e}");
        }
    }
}
