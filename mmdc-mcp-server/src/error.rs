//! Infrastructure faults inside a render invocation.
//!
//! None of these reach the caller as errors; the invoker converts each into
//! an `UnexpectedFailure` outcome.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write temp file: {0}")]
    ScratchWrite(#[source] std::io::Error),

    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("renderer reported success but {path} is unreadable: {source}")]
    OutputMetadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write sandbox config {path}: {source}")]
    SandboxConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
