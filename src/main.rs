use anyhow::Result;
use mmdc_mcp::cli;
use mmdc_mcp::server::{ServerContext, run_mcp_server, set_app_version};
use std::sync::Arc;

fn main() -> Result<()> {
    // Subcommands other than `serve` finish here.
    let runtime_options = match cli::process_cli() {
        cli::CliResult::Exit(code) => {
            if code == 0 {
                return Ok(());
            }
            std::process::exit(code);
        }
        cli::CliResult::Continue(options) => options,
    };

    let config = runtime_options.load_config()?;
    mmdc_mcp::debug::init_log_bridge(runtime_options.log_level, &config.logging);

    log::info!(
        "Starting mmdc-mcp v{} | output_dir={} | max_retries={}",
        mmdc_mcp::VERSION,
        config.mermaid.output_dir.display(),
        config.mermaid.max_retry_attempts
    );

    set_app_version(mmdc_mcp::VERSION);
    run_mcp_server(Arc::new(ServerContext::new(config)));
    Ok(())
}
