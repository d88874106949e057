//! The result of one `generate_mermaid_diagram` call and its wire shape.

use mmdc_mcp_config::OutputFormat;
use serde_json::{Value, json};
use std::path::PathBuf;

use crate::advisor::ErrorCategory;
use crate::ledger::BudgetExhausted;
use crate::request::ValidationFailure;

const BUDGET_SUGGESTION: &str = "Unable to generate diagram after multiple attempts. \
     Please verify Mermaid syntax is correct or simplify the diagram.";
const TIMEOUT_SUGGESTION: &str = "Diagram is too complex - try simplifying it";
const UNEXPECTED_SUGGESTION: &str =
    "This looks like a server-side problem; retrying the same diagram may not help";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Success {
        artifact_path: PathBuf,
        file_name: String,
        format: OutputFormat,
        size_bytes: u64,
        image_url: String,
    },
    ValidationFailure(ValidationFailure),
    BudgetExhausted(BudgetExhausted),
    RenderFailure {
        /// Renderer output, verbatim.
        error: String,
        suggestion: String,
        category: ErrorCategory,
        attempt: u32,
        max_attempts: u32,
    },
    Timeout {
        attempt: u32,
        max_attempts: u32,
        timeout_secs: u64,
    },
    UnexpectedFailure {
        message: String,
        attempt: u32,
        max_attempts: u32,
    },
}

impl RenderOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RenderOutcome::Success { .. })
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RenderOutcome::Success { .. } => "success",
            RenderOutcome::ValidationFailure(_) => "validation_failure",
            RenderOutcome::BudgetExhausted(_) => "budget_exhausted",
            RenderOutcome::RenderFailure { .. } => "render_failure",
            RenderOutcome::Timeout { .. } => "timeout",
            RenderOutcome::UnexpectedFailure { .. } => "unexpected_failure",
        }
    }

    /// One-line status for the calling agent.
    pub fn prompt(&self) -> String {
        match self {
            RenderOutcome::Success {
                format,
                size_bytes,
                image_url,
                ..
            } => format!(
                "✓ Generated {} diagram ({size_bytes} bytes). View it at {image_url}",
                format.as_str().to_uppercase()
            ),
            RenderOutcome::ValidationFailure(failure) => format!(
                "The diagram request was rejected: {}. {}",
                failure.reason, failure.suggestion
            ),
            RenderOutcome::BudgetExhausted(exhausted) => format!(
                "Giving up after {} attempts with the same Mermaid code. \
                 Change the diagram before trying again.",
                exhausted.max_attempts
            ),
            RenderOutcome::RenderFailure {
                attempt,
                max_attempts,
                ..
            } => format!(
                "Mermaid syntax error detected (attempt {attempt}/{max_attempts}). \
                 Please fix the errors and try again."
            ),
            RenderOutcome::Timeout {
                attempt,
                max_attempts,
                ..
            } => format!(
                "Rendering timed out (attempt {attempt}/{max_attempts}). \
                 Simplify the diagram and try again."
            ),
            RenderOutcome::UnexpectedFailure {
                attempt,
                max_attempts,
                ..
            } => format!(
                "The diagram server hit an internal error (attempt {attempt}/{max_attempts})."
            ),
        }
    }

    /// The response object returned to the tool caller.
    pub fn to_response(&self) -> Value {
        let mut response = match self {
            RenderOutcome::Success {
                file_name,
                format,
                size_bytes,
                image_url,
                ..
            } => json!({
                "success": true,
                "message": format!(
                    "✓ Generated {} diagram ({size_bytes} bytes)",
                    format.as_str().to_uppercase()
                ),
                "image_url": image_url,
                "file_name": file_name,
                "format": format.as_str(),
                "size_bytes": size_bytes,
            }),
            RenderOutcome::ValidationFailure(failure) => json!({
                "success": false,
                "error": failure.reason,
                "suggestion": failure.suggestion,
            }),
            RenderOutcome::BudgetExhausted(exhausted) => json!({
                "success": false,
                "error": exhausted.to_string(),
                "suggestion": BUDGET_SUGGESTION,
                "attempt": exhausted.attempts,
                "max_attempts": exhausted.max_attempts,
            }),
            RenderOutcome::RenderFailure {
                error,
                suggestion,
                category,
                attempt,
                max_attempts,
            } => json!({
                "success": false,
                "error": error,
                "suggestion": suggestion,
                "category": category,
                "attempt": attempt,
                "max_attempts": max_attempts,
            }),
            RenderOutcome::Timeout {
                attempt,
                max_attempts,
                timeout_secs,
            } => json!({
                "success": false,
                "error": format!("Diagram generation timed out ({timeout_secs}s limit)"),
                "suggestion": TIMEOUT_SUGGESTION,
                "attempt": attempt,
                "max_attempts": max_attempts,
            }),
            RenderOutcome::UnexpectedFailure {
                message,
                attempt,
                max_attempts,
            } => json!({
                "success": false,
                "error": message,
                "suggestion": UNEXPECTED_SUGGESTION,
                "attempt": attempt,
                "max_attempts": max_attempts,
            }),
        };
        response["prompt"] = Value::String(self.prompt());
        response
    }
}
