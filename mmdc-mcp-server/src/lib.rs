//! MCP (Model Context Protocol) server for Mermaid diagram rendering.
//!
//! Reads line-delimited JSON-RPC 2.0 from stdin and writes responses to stdout.
//! Exposes three tools:
//! - `generate_mermaid_diagram`: renders Mermaid source through `mmdc`,
//!   tracking retries of identical source against a fixed budget
//! - `validate_mermaid_syntax`: structural checks without running the renderer
//! - `list_diagram_types`: catalogue of supported diagram types
//!
//! Generated artifacts are also exposed as resources, and a prompt guide
//! describes the intended workflow.
//!
//! # Module layout
//!
//! - [`service`] - the render-attempt lifecycle (validate, reserve, invoke, settle)
//! - [`request`], [`fingerprint`], [`ledger`] - inputs and retry accounting
//! - [`invoker`], [`command`], [`scratch`], [`files`] - running the renderer
//! - [`advisor`], [`outcome`], [`publisher`] - turning results into responses
//! - [`syntax`] - renderer-independent syntax checks
//! - [`jsonrpc`], [`tools`], [`resources`], [`prompts`] - the MCP surface

pub mod advisor;
pub mod command;
pub mod error;
pub mod files;
pub mod fingerprint;
pub mod invoker;
pub mod jsonrpc;
pub mod ledger;
pub mod outcome;
pub mod prompts;
pub mod publisher;
pub mod request;
pub mod resources;
pub mod scratch;
pub mod service;
pub mod syntax;
pub mod tools;

use mmdc_mcp_config::Config;
use parking_lot::Mutex;
use serde_json::Value;
use std::io::{BufRead, Write};
use std::panic::AssertUnwindSafe;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;

use jsonrpc::{
    INTERNAL_ERROR, IncomingMessage, Response, error_response, invalid_params, method_not_found,
    parse_error, resource_not_found, send_response, success_response,
};
use resources::ResourceError;
use service::DiagramService;
use tools::{handle_tools_call, handle_tools_list, tool_error};

// ---------------------------------------------------------------------------
// Protocol constants (pub(crate) so submodules can access them)
// ---------------------------------------------------------------------------

/// MCP protocol version.
pub(crate) const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name reported during initialization.
pub(crate) const SERVER_NAME: &str = "mmdc-mcp";

/// Application version set by the main crate.
/// Use `set_app_version()` to initialize this before calling `run_mcp_server()`.
static APP_VERSION: OnceLock<String> = OnceLock::new();

/// Set the application version (should be called from the main crate with
/// the root crate's `VERSION` constant before running the MCP server).
pub fn set_app_version(version: impl Into<String>) {
    let _ = APP_VERSION.set(version.into());
}

/// Get the application version, falling back to the crate version if not set.
pub(crate) fn get_app_version() -> &'static str {
    APP_VERSION
        .get()
        .map(|s| s.as_str())
        .unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Everything a request handler needs, shared across worker threads.
pub struct ServerContext {
    pub config: Config,
    pub service: DiagramService,
}

impl ServerContext {
    /// Production wiring from a loaded configuration.
    pub fn new(config: Config) -> Self {
        let service = DiagramService::from_config(&config);
        Self { config, service }
    }

    /// Use an already-built service (tests inject fakes this way).
    pub fn with_service(config: Config, service: DiagramService) -> Self {
        Self { config, service }
    }
}

/// Handle the `initialize` JSON-RPC request.
fn handle_initialize() -> Value {
    serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {},
            "resources": {},
            "prompts": {}
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": get_app_version()
        }
    })
}

/// Dispatch every method except `tools/call`, which runs on a worker.
pub fn dispatch(ctx: &ServerContext, id: Value, method: &str, params: Option<Value>) -> Response {
    let output_dir = &ctx.config.mermaid.output_dir;
    match method {
        "initialize" => success_response(id, handle_initialize()),
        "ping" => success_response(id, serde_json::json!({})),
        "tools/list" => success_response(id, handle_tools_list()),
        "tools/call" => success_response(id, handle_tools_call(ctx, params)),
        "resources/list" => success_response(id, resources::handle_resources_list(output_dir)),
        "resources/templates/list" => {
            success_response(id, resources::handle_resource_templates_list())
        }
        "resources/read" => {
            let Some(uri) = string_param(&params, "uri") else {
                return invalid_params(id, "Missing 'uri' in resources/read params");
            };
            match resources::read_resource(output_dir, uri) {
                Ok(result) => success_response(id, result),
                Err(ResourceError::NotFound(_)) => resource_not_found(id, uri),
                Err(e @ ResourceError::Io { .. }) => {
                    log::error!("{e}");
                    error_response(id, INTERNAL_ERROR, e.to_string())
                }
                Err(e) => invalid_params(id, e.to_string()),
            }
        }
        "prompts/list" => success_response(id, prompts::handle_prompts_list()),
        "prompts/get" => {
            let Some(name) = string_param(&params, "name") else {
                return invalid_params(id, "Missing 'name' in prompts/get params");
            };
            match prompts::handle_prompts_get(name) {
                Some(result) => success_response(id, result),
                None => invalid_params(id, format!("Unknown prompt: {name}")),
            }
        }
        _ => method_not_found(id, method),
    }
}

fn string_param<'a>(params: &'a Option<Value>, key: &str) -> Option<&'a str> {
    params.as_ref()?.get(key)?.as_str()
}

fn log_and_send<W: Write>(out: &Mutex<W>, response: &Response) {
    log::debug!(
        "-> {}",
        serde_json::to_string(response).unwrap_or_else(|_| "<serialization error>".into())
    );
    send_response(&mut *out.lock(), response);
}

/// A queued `tools/call`: request id and params.
type ToolJob = (Value, Option<Value>);

fn spawn_tool_worker<W: Write + Send + 'static>(
    index: usize,
    ctx: &Arc<ServerContext>,
    out: &Arc<Mutex<W>>,
    jobs: &Arc<Mutex<Receiver<ToolJob>>>,
) -> std::io::Result<JoinHandle<()>> {
    let ctx = Arc::clone(ctx);
    let out = Arc::clone(out);
    let jobs = Arc::clone(jobs);
    std::thread::Builder::new()
        .name(format!("mmdc-mcp-tool-{index}"))
        .spawn(move || {
            loop {
                let job = jobs.lock().recv();
                let Ok((id, params)) = job else {
                    break;
                };
                log_and_send(&out, &run_tool_call(&ctx, id, params));
            }
        })
}

/// Run a `tools/call` request, turning a panic into a tool error result.
fn run_tool_call(ctx: &ServerContext, id: Value, params: Option<Value>) -> Response {
    let result = std::panic::catch_unwind(AssertUnwindSafe(|| handle_tools_call(ctx, params)))
        .unwrap_or_else(|_| {
            log::error!("Tool handler panicked");
            tool_error("Internal error while running tool")
        });
    success_response(id, result)
}

/// Serve JSON-RPC from `reader`, writing responses to `writer`.
///
/// `tools/call` requests are queued to a pool of at most
/// `server.max_concurrent_renders` worker threads, started on demand; every
/// other request is answered inline. Returns once `reader` is exhausted and
/// all queued tool calls have responded.
pub fn serve<R, W>(ctx: Arc<ServerContext>, reader: R, writer: W)
where
    R: BufRead,
    W: Write + Send + 'static,
{
    let out = Arc::new(Mutex::new(writer));
    let worker_limit = ctx.config.server.max_concurrent_renders.max(1);
    let (jobs_tx, jobs_rx) = mpsc::channel::<ToolJob>();
    let jobs_rx = Arc::new(Mutex::new(jobs_rx));
    let mut workers: Vec<JoinHandle<()>> = Vec::new();

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::error!("Error reading stdin: {e}");
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        log::debug!("<- {trimmed}");

        let msg: IncomingMessage = match serde_json::from_str(trimmed) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("Parse error: {e}");
                log_and_send(&out, &parse_error());
                continue;
            }
        };

        let method = match msg.method {
            Some(m) => m,
            None => {
                // No method field, so not a request or notification we handle
                log::debug!("Ignoring message without method");
                continue;
            }
        };

        // Notifications (no id) never get a response
        let id = match msg.id {
            Some(id) => id,
            None => {
                log::debug!("Notification: {method}");
                continue;
            }
        };

        if method != "tools/call" {
            log_and_send(&out, &dispatch(&ctx, id, &method, msg.params));
            continue;
        }

        if workers.len() < worker_limit {
            match spawn_tool_worker(workers.len(), &ctx, &out, &jobs_rx) {
                Ok(handle) => workers.push(handle),
                Err(e) => log::warn!("Could not spawn tool worker: {e}"),
            }
        }
        if workers.is_empty() {
            log_and_send(&out, &run_tool_call(&ctx, id, msg.params));
            continue;
        }
        if let Err(mpsc::SendError((id, params))) = jobs_tx.send((id, msg.params)) {
            log_and_send(&out, &run_tool_call(&ctx, id, params));
        }
    }

    // Closing the queue lets idle workers exit once the backlog is drained.
    drop(jobs_tx);
    for worker in workers {
        if worker.join().is_err() {
            log::error!("Tool worker terminated abnormally");
        }
    }
    log::info!("stdin closed, exiting");
}

/// Run the MCP server on stdin/stdout until stdin is closed.
pub fn run_mcp_server(ctx: Arc<ServerContext>) {
    log::info!("Starting {SERVER_NAME} MCP server v{}", get_app_version());
    let stdin = std::io::stdin();
    serve(ctx, stdin.lock(), std::io::stdout());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
