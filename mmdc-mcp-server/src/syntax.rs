//! Renderer-independent structural checks on Mermaid source.
//!
//! These are deliberately shallow: a type declaration, a connection count and
//! a global bracket balance. Brackets are totalled across `[]`, `()` and `{}`
//! together, so `A[x)` passes; ER cardinality markers such as `||--o{` count
//! as unmatched opens.

use serde::Serialize;

/// Diagram kinds recognized from the leading declaration keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagramKind {
    #[serde(rename = "flowchart")]
    Flowchart,
    #[serde(rename = "sequenceDiagram")]
    Sequence,
    #[serde(rename = "classDiagram")]
    Class,
    #[serde(rename = "erDiagram")]
    EntityRelationship,
    #[serde(rename = "stateDiagram")]
    State,
    #[serde(rename = "gantt")]
    Gantt,
    #[serde(rename = "pie")]
    Pie,
    #[serde(rename = "gitGraph")]
    GitGraph,
}

impl DiagramKind {
    pub fn name(self) -> &'static str {
        match self {
            DiagramKind::Flowchart => "flowchart",
            DiagramKind::Sequence => "sequenceDiagram",
            DiagramKind::Class => "classDiagram",
            DiagramKind::EntityRelationship => "erDiagram",
            DiagramKind::State => "stateDiagram",
            DiagramKind::Gantt => "gantt",
            DiagramKind::Pie => "pie",
            DiagramKind::GitGraph => "gitGraph",
        }
    }

    fn is_flowchart_like(self) -> bool {
        matches!(self, DiagramKind::Flowchart)
    }
}

/// Lowercased declaration keywords, checked in order.
const DECLARATIONS: &[(&str, DiagramKind)] = &[
    ("graph", DiagramKind::Flowchart),
    ("flowchart", DiagramKind::Flowchart),
    ("sequencediagram", DiagramKind::Sequence),
    ("classdiagram", DiagramKind::Class),
    ("erdiagram", DiagramKind::EntityRelationship),
    ("statediagram", DiagramKind::State),
    ("gantt", DiagramKind::Gantt),
    ("pie", DiagramKind::Pie),
    ("gitgraph", DiagramKind::GitGraph),
];

/// Tokens counted as connections.
const CONNECTION_MARKERS: &[&str] = &["-->", "---"];

const OPEN_BRACKETS: [char; 3] = ['[', '(', '{'];
const CLOSE_BRACKETS: [char; 3] = [']', ')', '}'];

/// Result of [`check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxReport {
    pub valid: bool,
    pub diagram_type: String,
    /// Lines containing at least one connection marker.
    pub node_count: usize,
    pub line_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl SyntaxReport {
    /// One-line summary for the calling agent.
    pub fn prompt(&self) -> String {
        if self.valid {
            format!(
                "✓ Mermaid syntax appears valid. Diagram type: {}, {} connections found.",
                self.diagram_type, self.node_count
            )
        } else {
            format!(
                "✗ Mermaid syntax errors detected: {}",
                self.errors.join(", ")
            )
        }
    }
}

/// Detect the diagram kind from the first declaration keyword.
///
/// The keyword must be followed by a non-alphanumeric character (or end the
/// input), so `stateDiagram-v2` matches but `pieces` does not.
pub fn detect_diagram_kind(source: &str) -> Option<DiagramKind> {
    let lowered = source.trim_start().to_lowercase();
    DECLARATIONS.iter().find_map(|(keyword, kind)| {
        let rest = lowered.strip_prefix(keyword)?;
        match rest.chars().next() {
            Some(c) if c.is_alphanumeric() => None,
            _ => Some(*kind),
        }
    })
}

/// Run the structural checks.
pub fn check(source: &str) -> SyntaxReport {
    if source.trim().is_empty() {
        return SyntaxReport {
            valid: false,
            diagram_type: "unknown".to_string(),
            node_count: 0,
            line_count: 0,
            errors: vec!["Empty diagram code".to_string()],
            warnings: Vec::new(),
        };
    }

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let kind = detect_diagram_kind(source);
    if kind.is_none() {
        errors.push(
            "Unable to detect diagram type - must start with: graph, flowchart, \
             sequenceDiagram, classDiagram, erDiagram, etc."
                .to_string(),
        );
    }

    let lines: Vec<&str> = source.trim().split('\n').collect();
    if lines.len() < 2 {
        warnings.push("Diagram has only one line - might be incomplete".to_string());
    }

    let node_count = lines
        .iter()
        .filter(|line| CONNECTION_MARKERS.iter().any(|m| line.contains(m)))
        .count();
    if node_count == 0 && kind.is_some_and(DiagramKind::is_flowchart_like) {
        warnings.push("No connections found (--> or ---) - diagram might be empty".to_string());
    }

    let open = source.chars().filter(|c| OPEN_BRACKETS.contains(c)).count();
    let close = source.chars().filter(|c| CLOSE_BRACKETS.contains(c)).count();
    if open != close {
        errors.push(format!("Mismatched brackets: {open} open, {close} closed"));
    }

    SyntaxReport {
        valid: errors.is_empty(),
        diagram_type: kind.map_or("unknown", DiagramKind::name).to_string(),
        node_count,
        line_count: lines.len(),
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source() {
        for src in ["", "   \n\t "] {
            let report = check(src);
            assert!(!report.valid);
            assert!(report.errors[0].to_lowercase().contains("empty"));
        }
    }

    #[test]
    fn test_single_line_flowchart_is_valid() {
        let report = check("graph TD; A[Start] --> B(End)");
        assert!(report.valid);
        assert_eq!(report.diagram_type, "flowchart");
        assert!(report.node_count >= 1);
        assert_eq!(report.line_count, 1);
        assert!(report.warnings.iter().any(|w| w.contains("only one line")));
    }

    #[test]
    fn test_bracket_mismatch_reports_exact_counts() {
        let report = check("graph TD; A[Start --> B(End)");
        assert!(!report.valid);
        assert!(
            report
                .errors
                .contains(&"Mismatched brackets: 2 open, 1 closed".to_string())
        );
    }

    #[test]
    fn test_wrong_kind_but_balanced_brackets_pass() {
        let report = check("graph TD\n    A[Start) --> B");
        assert!(report.valid);
    }

    #[test]
    fn test_unknown_type() {
        let report = check("digraph G {\n  a -> b\n}");
        assert!(!report.valid);
        assert_eq!(report.diagram_type, "unknown");
        assert!(report.errors[0].contains("Unable to detect diagram type"));
    }

    #[test]
    fn test_detects_every_declaration() {
        let cases = [
            ("flowchart LR\n A-->B", "flowchart"),
            ("Graph TD\n A-->B", "flowchart"),
            ("sequenceDiagram\n Alice->>Bob: hi", "sequenceDiagram"),
            ("classDiagram\n class Animal", "classDiagram"),
            ("erDiagram\n CUSTOMER ||--o{ ORDER : places", "erDiagram"),
            ("stateDiagram-v2\n [*] --> Still", "stateDiagram"),
            ("gantt\n title Plan", "gantt"),
            ("pie title Pets\n \"Dogs\" : 3", "pie"),
            ("gitGraph\n commit", "gitGraph"),
            ("  \n  graph TD\n A-->B", "flowchart"),
        ];
        for (src, expected) in cases {
            assert_eq!(check(src).diagram_type, expected, "source: {src:?}");
        }
    }

    #[test]
    fn test_keyword_needs_boundary() {
        assert_eq!(detect_diagram_kind("pieces of text"), None);
        assert_eq!(detect_diagram_kind("graphics\nA-->B"), None);
        assert_eq!(detect_diagram_kind("pie"), Some(DiagramKind::Pie));
    }

    #[test]
    fn test_flowchart_without_connections_warns_but_stays_valid() {
        let report = check("flowchart TD\n    A[Lonely node]");
        assert!(report.valid);
        assert_eq!(report.node_count, 0);
        assert!(report.warnings.iter().any(|w| w.contains("No connections")));
    }

    #[test]
    fn test_sequence_without_connections_does_not_warn() {
        let report = check("sequenceDiagram\n    Alice->>John: Hello");
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_er_cardinality_counts_as_open_bracket() {
        let report = check("erDiagram\n    CUSTOMER ||--o{ ORDER : places");
        assert!(!report.valid);
        assert!(report.errors[0].contains("1 open, 0 closed"));
    }

    #[test]
    fn test_prompt_text() {
        let ok = check("graph TD\n A --> B\n B --- C");
        assert_eq!(
            ok.prompt(),
            "✓ Mermaid syntax appears valid. Diagram type: flowchart, 2 connections found."
        );
        let bad = check("graph TD; A[");
        assert!(bad.prompt().starts_with("✗ Mermaid syntax errors detected: Mismatched"));
    }

    #[test]
    fn test_serialized_report_omits_empty_lists() {
        let json = serde_json::to_value(check("graph TD\n A --> B")).unwrap();
        assert_eq!(json["valid"], true);
        assert!(json.get("errors").is_none());
        assert!(json.get("warnings").is_none());
    }
}
