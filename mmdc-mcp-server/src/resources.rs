//! Read-only MCP resources over the artifact directory.
//!
//! - `diagrams://list` is a text listing, newest first.
//! - `diagram://{diagram_name}` returns one artifact as a base64 blob.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, SecondsFormat, Utc};
use mmdc_mcp_config::OutputFormat;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const LIST_URI: &str = "diagrams://list";
pub const DIAGRAM_URI_PREFIX: &str = "diagram://";
pub const DIAGRAM_URI_TEMPLATE: &str = "diagram://{diagram_name}";

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("Invalid diagram name: {0}")]
    InvalidName(String),

    #[error("Unknown resource URI: {0}")]
    UnknownUri(String),

    #[error("Diagram '{0}' not found")]
    NotFound(String),

    #[error("Error loading diagram {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file in the artifact directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramEntry {
    pub name: String,
    pub modified: SystemTime,
    pub size_bytes: u64,
}

impl DiagramEntry {
    pub fn uri(&self) -> String {
        format!("{DIAGRAM_URI_PREFIX}{}", self.name)
    }

    pub fn mime_type(&self) -> &'static str {
        mime_for(&self.name)
    }
}

/// Regular files in `dir`, newest first. `None` when the directory does not
/// exist.
pub fn scan_diagrams(dir: &Path) -> std::io::Result<Option<Vec<DiagramEntry>>> {
    let read_dir = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        entries.push(DiagramEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            size_bytes: metadata.len(),
        });
    }
    entries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
    Ok(Some(entries))
}

/// Text for `diagrams://list`.
pub fn listing_text(dir: &Path) -> String {
    match scan_diagrams(dir) {
        Ok(None) => "No diagrams directory found".to_string(),
        Ok(Some(entries)) if entries.is_empty() => "No diagrams generated yet".to_string(),
        Ok(Some(entries)) => {
            let lines: Vec<String> = entries
                .iter()
                .map(|e| {
                    let modified: DateTime<Utc> = e.modified.into();
                    format!(
                        "- {} ({}, modified {})",
                        e.name,
                        e.uri(),
                        modified.to_rfc3339_opts(SecondsFormat::Secs, true)
                    )
                })
                .collect();
            format!("Available diagrams ({}):\n{}", entries.len(), lines.join("\n"))
        }
        Err(e) => {
            log::error!("Error listing diagrams: {e}");
            format!("Error listing diagrams: {e}")
        }
    }
}

/// Handle `resources/list`.
pub fn handle_resources_list(dir: &Path) -> Value {
    let mut resources = vec![json!({
        "uri": LIST_URI,
        "name": "Generated diagrams",
        "description": "List of generated diagram files, newest first",
        "mimeType": "text/plain"
    })];
    if let Ok(Some(entries)) = scan_diagrams(dir) {
        resources.extend(entries.iter().map(|e| {
            json!({
                "uri": e.uri(),
                "name": e.name,
                "mimeType": e.mime_type(),
                "size": e.size_bytes
            })
        }));
    }
    json!({ "resources": resources })
}

/// Handle `resources/templates/list`.
pub fn handle_resource_templates_list() -> Value {
    json!({
        "resourceTemplates": [{
            "uriTemplate": DIAGRAM_URI_TEMPLATE,
            "name": "Generated diagram",
            "description": "A generated diagram image, base64 encoded"
        }]
    })
}

/// Handle `resources/read` for `uri`.
pub fn read_resource(dir: &Path, uri: &str) -> Result<Value, ResourceError> {
    if uri == LIST_URI {
        return Ok(json!({
            "contents": [{
                "uri": LIST_URI,
                "mimeType": "text/plain",
                "text": listing_text(dir)
            }]
        }));
    }

    let name = uri
        .strip_prefix(DIAGRAM_URI_PREFIX)
        .ok_or_else(|| ResourceError::UnknownUri(uri.to_string()))?;
    if name.is_empty() || name.contains(['/', '\\', '\0']) || name.contains("..") {
        return Err(ResourceError::InvalidName(name.to_string()));
    }

    let path = dir.join(name);
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("Diagram not found: {}", path.display());
            return Err(ResourceError::NotFound(name.to_string()));
        }
        Err(source) => return Err(ResourceError::Io { path, source }),
    };
    log::info!("Serving diagram resource: {name} ({} bytes)", bytes.len());

    Ok(json!({
        "contents": [{
            "uri": uri,
            "mimeType": mime_for(name),
            "blob": BASE64.encode(&bytes)
        }]
    }))
}

fn mime_for(name: &str) -> &'static str {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(OutputFormat::from_extension)
        .map(OutputFormat::mime_type)
        .unwrap_or("application/octet-stream")
}
