//! One renderer invocation: scratch input, `mmdc` command, outcome mapping.

use mmdc_mcp_config::MermaidSettings;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::advisor;
use crate::command::{CommandExecutor, ExecutionResult, RenderCommand};
use crate::error::InvokeError;
use crate::files::write_json_atomic;
use crate::fingerprint::Fingerprint;
use crate::outcome::RenderOutcome;
use crate::publisher::LocatorBuilder;
use crate::request::RenderRequest;
use crate::scratch::ScratchFile;

/// Puppeteer launch config passed to `mmdc -p`, kept in the scratch dir.
pub const SANDBOX_CONFIG_FILENAME: &str = "mmdc-mcp-puppeteer.json";

/// Chromium flags that let the headless browser start inside containers
/// without user namespaces.
pub const SANDBOX_ARGS: [&str; 3] = [
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
];

pub struct RenderInvoker {
    settings: MermaidSettings,
    executor: Arc<dyn CommandExecutor>,
    locator: Arc<dyn LocatorBuilder>,
}

impl RenderInvoker {
    pub fn new(
        settings: MermaidSettings,
        executor: Arc<dyn CommandExecutor>,
        locator: Arc<dyn LocatorBuilder>,
    ) -> Self {
        Self {
            settings,
            executor,
            locator,
        }
    }

    pub fn settings(&self) -> &MermaidSettings {
        &self.settings
    }

    pub fn sandbox_config_path(&self) -> PathBuf {
        self.settings.scratch_dir.join(SANDBOX_CONFIG_FILENAME)
    }

    /// Render `request`. The attempt has already been reserved by the caller;
    /// every failure, including infrastructure faults, comes back as an
    /// outcome.
    pub fn invoke(
        &self,
        request: &RenderRequest,
        fingerprint: &Fingerprint,
        attempt: u32,
        max_attempts: u32,
    ) -> RenderOutcome {
        match self.try_invoke(request, fingerprint, attempt, max_attempts) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("Error generating diagram: {e}");
                RenderOutcome::UnexpectedFailure {
                    message: format!("Unexpected error: {e}"),
                    attempt,
                    max_attempts,
                }
            }
        }
    }

    fn try_invoke(
        &self,
        request: &RenderRequest,
        fingerprint: &Fingerprint,
        attempt: u32,
        max_attempts: u32,
    ) -> Result<RenderOutcome, InvokeError> {
        let output_dir = &self.settings.output_dir;
        std::fs::create_dir_all(output_dir).map_err(|source| InvokeError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        let sandbox_config = self.sandbox_config_path();
        write_json_atomic(&json!({ "args": SANDBOX_ARGS }), &sandbox_config).map_err(
            |source| InvokeError::SandboxConfig {
                path: sandbox_config.clone(),
                source,
            },
        )?;

        let file_name = output_file_name(request, fingerprint, chrono::Utc::now().timestamp());
        let output_path = output_dir.join(&file_name);

        let scratch = ScratchFile::create(&self.settings.scratch_dir, fingerprint, &request.source)
            .map_err(InvokeError::ScratchWrite)?;

        let command = render_command(
            &self.settings,
            request,
            scratch.path(),
            &output_path,
            &sandbox_config,
        );
        log::info!("Running: {}", command.display());

        let result = self
            .executor
            .execute(&command)
            .map_err(|source| InvokeError::Spawn {
                program: command.program.clone(),
                source,
            });
        // The scratch input is released on every path, before the outcome is built.
        drop(scratch);

        match result? {
            ExecutionResult::Exited { code: Some(0), .. } => {
                let size_bytes = std::fs::metadata(&output_path)
                    .map_err(|source| InvokeError::OutputMetadata {
                        path: output_path.clone(),
                        source,
                    })?
                    .len();
                log::info!(
                    "Generated diagram: {} ({size_bytes} bytes)",
                    output_path.display()
                );
                Ok(RenderOutcome::Success {
                    image_url: self.locator.locate(&file_name),
                    artifact_path: output_path,
                    file_name,
                    format: request.format,
                    size_bytes,
                })
            }
            ExecutionResult::Exited {
                code,
                stdout,
                stderr,
            } => {
                let error = failure_text(code, stdout, stderr);
                log::warn!("mmdc failed: {error}");
                let category = advisor::classify(&error);
                Ok(RenderOutcome::RenderFailure {
                    suggestion: advisor::advise(&error).to_string(),
                    error,
                    category,
                    attempt,
                    max_attempts,
                })
            }
            ExecutionResult::TimedOut { elapsed } => {
                log::warn!(
                    "mmdc timed out after {:.1}s (attempt {attempt}/{max_attempts})",
                    elapsed.as_secs_f64()
                );
                Ok(RenderOutcome::Timeout {
                    attempt,
                    max_attempts,
                    timeout_secs: self.settings.render_timeout_secs,
                })
            }
        }
    }
}

/// `<filename or diagram_<fp>_<unixtime>>.<ext>`.
fn output_file_name(request: &RenderRequest, fingerprint: &Fingerprint, unix_time: i64) -> String {
    let stem = match &request.file_name {
        Some(name) => name.clone(),
        None => format!("diagram_{fingerprint}_{unix_time}"),
    };
    format!("{stem}.{}", request.format.extension())
}

/// Build the `mmdc` invocation. Scale and width are only passed for raster
/// formats.
pub fn render_command(
    settings: &MermaidSettings,
    request: &RenderRequest,
    input: &Path,
    output: &Path,
    sandbox_config: &Path,
) -> RenderCommand {
    let mut command = RenderCommand::new(
        &settings.mmdc_path,
        Duration::from_secs(settings.render_timeout_secs),
    )
    .arg("-i")
    .arg(input.to_string_lossy())
    .arg("-o")
    .arg(output.to_string_lossy())
    .args(["-t", request.theme.as_str(), "-b", request.background.as_str()]);

    if request.format.is_raster() {
        command = command
            .arg("-s")
            .arg(request.scale.to_string())
            .arg("-w")
            .arg(request.width.to_string());
    }

    command
        .arg("-p")
        .arg(sandbox_config.to_string_lossy())
        .working_dir(&settings.scratch_dir)
}

fn failure_text(code: Option<i32>, stdout: String, stderr: String) -> String {
    if !stderr.trim().is_empty() {
        stderr
    } else if !stdout.trim().is_empty() {
        stdout
    } else {
        match code {
            Some(code) => format!("Unknown error (exit code {code})"),
            None => "Unknown error (terminated by signal)".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::ErrorCategory;
    use crate::publisher::TokenUrlLocator;
    use mmdc_mcp_config::{Background, OutputFormat, Theme};
    use parking_lot::Mutex;

    /// Records each command and answers with a canned result. On success it
    /// writes `bytes` to the `-o` path like the real renderer would.
    struct FakeExecutor {
        result: ExecutionResult,
        bytes: &'static [u8],
        seen: Mutex<Vec<RenderCommand>>,
    }

    impl FakeExecutor {
        fn new(result: ExecutionResult) -> Self {
            Self {
                result,
                bytes: b"<svg/>",
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl CommandExecutor for FakeExecutor {
        fn execute(&self, command: &RenderCommand) -> std::io::Result<ExecutionResult> {
            let input = command.flag_value("-i").unwrap();
            assert!(Path::new(input).exists(), "scratch input missing during run");
            if self.result.success() {
                std::fs::write(command.flag_value("-o").unwrap(), self.bytes)?;
            }
            self.seen.lock().push(command.clone());
            Ok(self.result.clone())
        }
    }

    struct FailingExecutor;

    impl CommandExecutor for FailingExecutor {
        fn execute(&self, _: &RenderCommand) -> std::io::Result<ExecutionResult> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "mmdc not found"))
        }
    }

    fn settings(dir: &Path) -> MermaidSettings {
        MermaidSettings {
            output_dir: dir.join("out"),
            scratch_dir: dir.join("scratch"),
            ..MermaidSettings::default()
        }
    }

    fn request(format: OutputFormat) -> RenderRequest {
        RenderRequest {
            source: "graph TD\n A-->B".into(),
            format,
            theme: Theme::Dark,
            background: Background::Transparent,
            scale: 3,
            width: 1200,
            file_name: None,
        }
    }

    fn invoker(dir: &Path, executor: Arc<dyn CommandExecutor>) -> RenderInvoker {
        RenderInvoker::new(
            settings(dir),
            executor,
            Arc::new(TokenUrlLocator::new("http://localhost:8401", "secret")),
        )
    }

    fn exited(code: i32, stdout: &str, stderr: &str) -> ExecutionResult {
        ExecutionResult::Exited {
            code: Some(code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    fn scratch_entries(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir.join("scratch"))
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".mmd"))
            .collect()
    }

    #[test]
    fn test_vector_command_has_no_scale_or_width() {
        let s = MermaidSettings::default();
        let cmd = render_command(
            &s,
            &request(OutputFormat::Svg),
            Path::new("/tmp/in.mmd"),
            Path::new("/tmp/out.svg"),
            Path::new("/tmp/p.json"),
        );
        assert_eq!(
            cmd.args,
            [
                "-i",
                "/tmp/in.mmd",
                "-o",
                "/tmp/out.svg",
                "-t",
                "dark",
                "-b",
                "transparent",
                "-p",
                "/tmp/p.json"
            ]
        );
        assert_eq!(cmd.program, "mmdc");
        assert_eq!(cmd.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_raster_command_has_scale_and_width() {
        for format in [OutputFormat::Png, OutputFormat::Pdf] {
            let cmd = render_command(
                &MermaidSettings::default(),
                &request(format),
                Path::new("in.mmd"),
                Path::new("out"),
                Path::new("p.json"),
            );
            assert_eq!(cmd.flag_value("-s"), Some("3"));
            assert_eq!(cmd.flag_value("-w"), Some("1200"));
            assert_eq!(cmd.args.last().map(String::as_str), Some("p.json"));
        }
    }

    #[test]
    fn test_output_file_name() {
        let fp = Fingerprint::of("x");
        let mut req = request(OutputFormat::Png);
        assert_eq!(
            output_file_name(&req, &fp, 1_700_000_000),
            format!("diagram_{fp}_1700000000.png")
        );
        req.file_name = Some("overview.v2".into());
        assert_eq!(output_file_name(&req, &fp, 0), "overview.v2.png");
    }

    #[test]
    fn test_success_stats_output_and_builds_locator() {
        let dir = tempfile::tempdir().unwrap();
        let executor = Arc::new(FakeExecutor::new(exited(0, "", "")));
        let inv = invoker(dir.path(), executor.clone());
        let mut req = request(OutputFormat::Svg);
        req.file_name = Some("arch".into());

        let (artifact_path, file_name, size_bytes, image_url) =
            match inv.invoke(&req, &Fingerprint::of(&req.source), 1, 5) {
                RenderOutcome::Success {
                    artifact_path,
                    file_name,
                    size_bytes,
                    image_url,
                    ..
                } => (artifact_path, file_name, size_bytes, image_url),
                other => panic!("expected success, got {other:?}"),
            };
        assert_eq!(file_name, "arch.svg");
        assert_eq!(size_bytes, 6);
        assert_eq!(artifact_path, dir.path().join("out").join("arch.svg"));
        assert_eq!(
            image_url,
            "http://localhost:8401/diagrams/arch.svg?token=secret"
        );
        assert!(scratch_entries(dir.path()).is_empty());

        let sandbox: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(inv.sandbox_config_path()).unwrap(),
        )
        .unwrap();
        assert_eq!(sandbox["args"][0], "--no-sandbox");
        assert_eq!(executor.seen.lock().len(), 1);
    }

    #[test]
    fn test_nonzero_exit_is_render_failure_with_advice() {
        let dir = tempfile::tempdir().unwrap();
        let inv = invoker(
            dir.path(),
            Arc::new(FakeExecutor::new(exited(1, "", "Error: Parse error on line 2"))),
        );
        let req = request(OutputFormat::Svg);
        match inv.invoke(&req, &Fingerprint::of(&req.source), 3, 5) {
            RenderOutcome::RenderFailure {
                error,
                category,
                attempt,
                max_attempts,
                ..
            } => {
                assert_eq!(error, "Error: Parse error on line 2");
                assert_eq!(category, ErrorCategory::ParseError);
                assert_eq!((attempt, max_attempts), (3, 5));
            }
            other => panic!("expected render failure, got {other:?}"),
        }
        assert!(scratch_entries(dir.path()).is_empty());
    }

    #[test]
    fn test_failure_text_falls_back_to_stdout_then_code() {
        assert_eq!(failure_text(Some(1), "out".into(), " \n".into()), "out");
        assert_eq!(
            failure_text(Some(2), String::new(), String::new()),
            "Unknown error (exit code 2)"
        );
        assert_eq!(
            failure_text(None, String::new(), String::new()),
            "Unknown error (terminated by signal)"
        );
    }

    #[test]
    fn test_timeout_outcome_and_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let inv = invoker(
            dir.path(),
            Arc::new(FakeExecutor::new(ExecutionResult::TimedOut {
                elapsed: Duration::from_secs(30),
            })),
        );
        let req = request(OutputFormat::Png);
        assert_eq!(
            inv.invoke(&req, &Fingerprint::of(&req.source), 2, 5),
            RenderOutcome::Timeout {
                attempt: 2,
                max_attempts: 5,
                timeout_secs: 30,
            }
        );
        assert!(scratch_entries(dir.path()).is_empty());
    }

    #[test]
    fn test_spawn_error_is_unexpected_failure() {
        let dir = tempfile::tempdir().unwrap();
        let inv = invoker(dir.path(), Arc::new(FailingExecutor));
        let req = request(OutputFormat::Svg);
        match inv.invoke(&req, &Fingerprint::of(&req.source), 1, 5) {
            RenderOutcome::UnexpectedFailure { message, attempt, .. } => {
                assert!(message.starts_with("Unexpected error: failed to run 'mmdc'"));
                assert_eq!(attempt, 1);
            }
            other => panic!("expected unexpected failure, got {other:?}"),
        }
        assert!(scratch_entries(dir.path()).is_empty());
    }

    #[test]
    fn test_success_without_output_file_is_unexpected_failure() {
        struct SilentSuccess;
        impl CommandExecutor for SilentSuccess {
            fn execute(&self, _: &RenderCommand) -> std::io::Result<ExecutionResult> {
                Ok(ExecutionResult::Exited {
                    code: Some(0),
                    stdout: String::new(),
                    stderr: String::new(),
                })
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let inv = invoker(dir.path(), Arc::new(SilentSuccess));
        let req = request(OutputFormat::Svg);
        assert!(matches!(
            inv.invoke(&req, &Fingerprint::of(&req.source), 1, 5),
            RenderOutcome::UnexpectedFailure { .. }
        ));
    }
}
