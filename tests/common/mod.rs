//! Shared integration test helpers for mmdc-mcp.
//!
//! Include with `mod common;` at the top of a test file. The
//! `#[allow(dead_code)]` below keeps files that use only some helpers quiet.

#![allow(dead_code)]

use mmdc_mcp::config::Config;
use mmdc_mcp::server::ServerContext;
use mmdc_mcp::server::command::{CommandExecutor, ExecutionResult, RenderCommand};
use mmdc_mcp::server::ledger::AttemptLedger;
use mmdc_mcp::server::publisher::TokenUrlLocator;
use mmdc_mcp::server::service::DiagramService;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// A `Config` whose output and scratch directories live in a fresh temp dir.
///
/// Keep the `TempDir` alive until the test is done with the files.
pub fn config_in_tmp_dir() -> (Config, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = Config::default();
    config.mermaid.output_dir = temp_dir.path().join("diagrams");
    config.mermaid.scratch_dir = temp_dir.path().join("scratch");
    config.server.public_base_url = "http://localhost:8401".into();
    config.server.auth_token = "test-token".into();
    (config, temp_dir)
}

pub fn exited(code: i32, stderr: &str) -> ExecutionResult {
    ExecutionResult::Exited {
        code: Some(code),
        stdout: String::new(),
        stderr: stderr.into(),
    }
}

pub fn rendered() -> ExecutionResult {
    exited(0, "")
}

pub fn syntax_error() -> ExecutionResult {
    exited(1, "Error: Parse error on line 2:\nExpecting 'SEMI', got 'EOF'")
}

/// Plays back scripted results in order, falling back to `default` once the
/// script runs out. Exit 0 writes a small artifact to the `-o` path, as the
/// real renderer would. Every command is recorded together with whether its
/// scratch input existed while it ran.
pub struct ScriptedExecutor {
    script: Mutex<VecDeque<ExecutionResult>>,
    default: ExecutionResult,
    delay: Duration,
    pub commands: Mutex<Vec<RenderCommand>>,
    pub input_seen: Mutex<Vec<bool>>,
}

impl ScriptedExecutor {
    pub fn new(script: Vec<ExecutionResult>, default: ExecutionResult) -> Self {
        Self {
            script: Mutex::new(script.into()),
            default,
            delay: Duration::ZERO,
            commands: Mutex::new(Vec::new()),
            input_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn always(result: ExecutionResult) -> Self {
        Self::new(Vec::new(), result)
    }

    /// Sleep this long inside every execution.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn last_command(&self) -> RenderCommand {
        self.commands
            .lock()
            .last()
            .cloned()
            .expect("no command executed")
    }
}

impl CommandExecutor for ScriptedExecutor {
    fn execute(&self, command: &RenderCommand) -> std::io::Result<ExecutionResult> {
        let input = command.flag_value("-i").map(PathBuf::from);
        self.input_seen
            .lock()
            .push(input.as_deref().is_some_and(Path::exists));

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let result = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.default.clone());
        if result.success()
            && let Some(output) = command.flag_value("-o")
        {
            std::fs::write(output, b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>")?;
        }
        self.commands.lock().push(command.clone());
        Ok(result)
    }
}

/// A service wired to `executor` with a fresh ledger.
pub fn service_with(config: &Config, executor: Arc<ScriptedExecutor>) -> DiagramService {
    DiagramService::new(
        config.mermaid.clone(),
        Arc::new(AttemptLedger::new()),
        executor,
        Arc::new(TokenUrlLocator::from_settings(&config.server)),
    )
}

pub fn context_with(config: Config, executor: Arc<ScriptedExecutor>) -> Arc<ServerContext> {
    let service = service_with(&config, executor);
    Arc::new(ServerContext::with_service(config, service))
}

/// `.mmd` files left in the scratch directory.
pub fn scratch_inputs(config: &Config) -> Vec<PathBuf> {
    match std::fs::read_dir(&config.mermaid.scratch_dir) {
        Ok(rd) => rd
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "mmd"))
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// A cloneable writer that collects everything written to it.
#[derive(Clone, Default)]
pub struct SharedBuf(pub Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn lines(&self) -> Vec<serde_json::Value> {
        String::from_utf8(self.0.lock().clone())
            .expect("non-UTF-8 output")
            .lines()
            .map(|l| serde_json::from_str(l).expect("output line is not JSON"))
            .collect()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
