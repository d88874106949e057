//! Default values referenced by `#[serde(default = "...")]` attributes.

use std::path::PathBuf;

/// Application directory name under the platform data/config roots.
pub const APP_DIR_NAME: &str = "mmdc-mcp";

// ── Retry budget and limits ────────────────────────────────────────────────

pub fn max_retry_attempts() -> u32 {
    5
}

pub fn max_diagram_size() -> usize {
    50_000
}

pub fn render_timeout_secs() -> u64 {
    30
}

pub fn max_concurrent_renders() -> usize {
    4
}

// ── Raster knobs ───────────────────────────────────────────────────────────

/// Accepted render scales.
pub const SCALES: [u32; 3] = [1, 2, 3];

/// Inclusive pixel width range for raster output.
pub const WIDTH_RANGE: std::ops::RangeInclusive<u32> = 800..=3200;

pub fn scale() -> u32 {
    2
}

pub fn width() -> u32 {
    1600
}

// ── Paths ──────────────────────────────────────────────────────────────────

/// `<data_dir>/mmdc-mcp/diagrams`, falling back to `~/.local/share`.
pub fn output_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local")
                .join("share")
        })
        .join(APP_DIR_NAME)
        .join("diagrams")
}

pub fn scratch_dir() -> PathBuf {
    std::env::temp_dir()
}

pub fn mmdc_path() -> String {
    "mmdc".to_string()
}

// ── Server ─────────────────────────────────────────────────────────────────

pub fn public_base_url() -> String {
    "http://localhost:8401".to_string()
}
