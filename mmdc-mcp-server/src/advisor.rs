//! Renderer error classification.
//!
//! Raw renderer output is matched, case-insensitively and in table order,
//! against [`ADVISORIES`]. The first row whose keywords match wins; messages
//! often contain more than one keyword, so the order is significant.

use serde::Serialize;

/// Error categories a renderer message can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    SyntaxError,
    ParseError,
    UnexpectedToken,
    Timeout,
    Generic,
}

/// One classification rule.
#[derive(Debug)]
pub struct Advisory {
    pub category: ErrorCategory,
    /// Lowercase substrings; any one of them selects this row.
    pub keywords: &'static [&'static str],
    pub hint: &'static str,
}

impl Advisory {
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k))
    }
}

/// Ordered classification table.
pub const ADVISORIES: &[Advisory] = &[
    Advisory {
        category: ErrorCategory::SyntaxError,
        keywords: &["syntax error"],
        hint: "Syntax error detected. Check for: missing semicolons, incorrect arrow syntax \
               (use --> or ---), mismatched brackets.",
    },
    Advisory {
        category: ErrorCategory::ParseError,
        keywords: &["parse error"],
        hint: "Parse error. Verify the diagram type declaration (graph TD, sequenceDiagram, \
               etc.) and node connections.",
    },
    Advisory {
        category: ErrorCategory::UnexpectedToken,
        keywords: &["unexpected"],
        hint: "Unexpected token found. Check for typos in keywords or special characters.",
    },
    Advisory {
        category: ErrorCategory::Timeout,
        keywords: &["timeout", "timed out"],
        hint: "Rendering timed out. The diagram might be too complex, try simplifying it.",
    },
];

/// Used when no row matches.
pub const GENERIC_HINT: &str = "Check Mermaid syntax at: https://mermaid.js.org/syntax/";

/// Classify a raw renderer message.
pub fn classify(raw: &str) -> ErrorCategory {
    find(raw).map_or(ErrorCategory::Generic, |a| a.category)
}

/// Remediation hint for a raw renderer message.
pub fn advise(raw: &str) -> &'static str {
    find(raw).map_or(GENERIC_HINT, |a| a.hint)
}

fn find(raw: &str) -> Option<&'static Advisory> {
    let lowered = raw.to_lowercase();
    ADVISORIES.iter().find(|a| a.matches(&lowered))
}
