//! Handler for the `list_diagram_types` MCP tool.

use serde::Serialize;
use serde_json::Value;

use super::tool_result;

/// One entry of the diagram type catalogue.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DiagramTypeInfo {
    #[serde(rename = "type")]
    pub name: &'static str,
    pub description: &'static str,
    pub example: &'static str,
}

pub const DIAGRAM_TYPES: &[DiagramTypeInfo] = &[
    DiagramTypeInfo {
        name: "flowchart / graph",
        description: "Flowcharts and directional graphs",
        example: "flowchart TD\n    A[Start] --> B{Decision}\n    B -->|Yes| C[Do Something]\n    B -->|No| D[Do Something Else]",
    },
    DiagramTypeInfo {
        name: "sequenceDiagram",
        description: "Sequence diagrams for interactions between actors",
        example: "sequenceDiagram\n    Alice->>John: Hello John\n    John-->>Alice: Hi Alice",
    },
    DiagramTypeInfo {
        name: "classDiagram",
        description: "UML class diagrams",
        example: "classDiagram\n    class Animal\n    Animal : +String name\n    Animal : +makeSound()",
    },
    DiagramTypeInfo {
        name: "erDiagram",
        description: "Entity relationship diagrams for databases",
        example: "erDiagram\n    CUSTOMER ||--o{ ORDER : places\n    ORDER ||--|{ LINE-ITEM : contains",
    },
    DiagramTypeInfo {
        name: "stateDiagram",
        description: "State machine diagrams",
        example: "stateDiagram-v2\n    [*] --> Still\n    Still --> Moving\n    Moving --> [*]",
    },
    DiagramTypeInfo {
        name: "gantt",
        description: "Gantt charts for project timelines",
        example: "gantt\n    title Project Timeline\n    section Planning\n    Task 1 :a1, 2024-01-01, 30d",
    },
    DiagramTypeInfo {
        name: "pie",
        description: "Pie charts",
        example: "pie title Pets\n    \"Dogs\" : 386\n    \"Cats\" : 85\n    \"Rats\" : 15",
    },
    DiagramTypeInfo {
        name: "gitGraph",
        description: "Git commit graphs",
        example: "gitGraph\n    commit\n    branch develop\n    checkout develop\n    commit",
    },
];

/// The catalogue with its count and prompt line.
pub fn catalogue() -> Value {
    serde_json::json!({
        "diagram_types": DIAGRAM_TYPES,
        "total_count": DIAGRAM_TYPES.len(),
        "prompt": format!(
            "Mermaid supports {} diagram types. Most popular: flowchart, sequenceDiagram, erDiagram, classDiagram.",
            DIAGRAM_TYPES.len()
        )
    })
}

/// Execute the `list_diagram_types` tool.
pub fn handle_list_types() -> Value {
    tool_result(catalogue(), false)
}
