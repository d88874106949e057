//! The `diagram_selection_guide` prompt.

use serde_json::{Value, json};

pub const GUIDE_PROMPT: &str = "diagram_selection_guide";

const GUIDE_TEXT: &str = r#"# Mermaid Diagram Workflow

## Principles
1. If the user names a diagram type, generate that type right away.
2. Offer an alternative only when it is clearly better, in one sentence.
3. Once the user picks, generate their choice without further debate.
4. When unsure, generate what was asked for.

## Typical cases

### The user names the type
"Create a flowchart from this: graph TD; User-->API"
Generate the flowchart. No questions.

### The code fits the content
"graph TD; Start-->Process-->Decision-->End"
Flowchart syntax describing a process. Generate it quietly.

### A better type clearly exists
"graph TD; User->>Server->>Database"
Flowchart syntax describing messages between parties. Say once:
"I can render this as a flowchart, or as a sequence diagram, which reads better for interactions. Which do you prefer?"

## Diagram types
- flowchart / graph: processes, decisions, workflows
- sequenceDiagram: interactions, API calls, messages between parties
- erDiagram: database schemas and table relationships
- classDiagram: classes, fields, inheritance
- stateDiagram: states and transitions, lifecycles
- gantt: schedules and project timelines
- pie: proportions and breakdowns
- gitGraph: branches and commits

## When to suggest another type
Suggest when flowchart code shows actors exchanging messages (sequenceDiagram),
when plain numbers describe shares of a whole (pie), or when dated tasks are
drawn as boxes (gantt).

Do not suggest when the user named the type, when the syntax already fits,
when several types would do equally well, or for cosmetic gains.

## Workflow
1. Optionally call validate_mermaid_syntax to catch obvious mistakes cheaply.
2. Call generate_mermaid_diagram.
3. On failure, read `error` and `suggestion`, fix the code and retry. Retrying
   identical code counts against a fixed budget; change the code between tries.

## Defaults
- Format: svg (fastest, scalable)
- Theme: default
- Raster quality: scale=2, width=1600
"#;

/// Handle `prompts/list`.
pub fn handle_prompts_list() -> Value {
    json!({
        "prompts": [{
            "name": GUIDE_PROMPT,
            "description": "How to pick a Mermaid diagram type and drive the generation tools",
            "arguments": []
        }]
    })
}

/// Handle `prompts/get`. `None` for an unknown prompt name.
pub fn handle_prompts_get(name: &str) -> Option<Value> {
    (name == GUIDE_PROMPT).then(|| {
        json!({
            "description": "Mermaid diagram selection guide",
            "messages": [{
                "role": "user",
                "content": {
                    "type": "text",
                    "text": GUIDE_TEXT
                }
            }]
        })
    })
}
