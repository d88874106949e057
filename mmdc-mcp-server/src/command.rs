//! Renderer invocation as data, and the strategy that executes it.
//!
//! [`RenderCommand`] describes a subprocess (program, arguments, working
//! directory, timeout) without running anything. A [`CommandExecutor`] turns
//! it into an [`ExecutionResult`]; [`SystemExecutor`] spawns a real process,
//! tests substitute their own executor.

use parking_lot::Mutex;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

/// How long to keep collecting output after an exit that lands at the deadline.
const OUTPUT_GRACE: Duration = Duration::from_millis(250);

/// A subprocess invocation, not yet executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Duration,
}

impl RenderCommand {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Value following `flag` in the argument list, if present.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Space-joined command line for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What happened when a [`RenderCommand`] ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    /// The process exited on its own. `code` is `None` when it was killed by
    /// a signal.
    Exited {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    /// The timeout elapsed and the process was killed.
    TimedOut { elapsed: Duration },
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        matches!(self, ExecutionResult::Exited { code: Some(0), .. })
    }
}

/// Execution strategy for [`RenderCommand`]s.
///
/// Implementations must be `Send + Sync`; one executor is shared by every
/// concurrent render.
pub trait CommandExecutor: Send + Sync {
    /// Run `command` to completion or until its timeout.
    ///
    /// # Errors
    /// Returns an I/O error if the process cannot be spawned or polled.
    fn execute(&self, command: &RenderCommand) -> std::io::Result<ExecutionResult>;
}

/// Spawns a real child process with captured stdout/stderr and polls it
/// until exit or timeout.
#[derive(Debug, Clone)]
pub struct SystemExecutor {
    poll_interval: Duration,
}

impl Default for SystemExecutor {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl SystemExecutor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CommandExecutor for SystemExecutor {
    fn execute(&self, command: &RenderCommand) -> std::io::Result<ExecutionResult> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        let start = Instant::now();
        let deadline = start + command.timeout;
        let mut child = cmd.spawn()?;

        // Drain both pipes on their own threads so a chatty renderer cannot
        // block on a full pipe while we poll. Each reader signals `done` at EOF.
        let (done_tx, done_rx) = mpsc::channel();
        let stdout = child.stdout.take().map(|p| Capture::spawn(p, done_tx.clone()));
        let stderr = child.stderr.take().map(|p| Capture::spawn(p, done_tx.clone()));
        let readers = usize::from(stdout.is_some()) + usize::from(stderr.is_some());
        drop(done_tx);

        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    // A surviving descendant (headless Chromium) can keep the
                    // pipes open after the renderer exits; only wait for EOF
                    // until the deadline (plus a short grace for output
                    // written just before exit).
                    let read_deadline = deadline.max(Instant::now() + OUTPUT_GRACE);
                    if !wait_for_readers(&done_rx, readers, read_deadline) {
                        log::warn!(
                            "'{}' exited but its output pipes stayed open past {}s, using the output captured so far",
                            command.program,
                            command.timeout.as_secs_f64()
                        );
                    }
                    return Ok(ExecutionResult::Exited {
                        code: status.code(),
                        stdout: stdout.as_ref().map(Capture::text).unwrap_or_default(),
                        stderr: stderr.as_ref().map(Capture::text).unwrap_or_default(),
                    });
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        log::warn!(
                            "'{}' exceeded {}s, terminating",
                            command.program,
                            command.timeout.as_secs_f64()
                        );
                        let _ = child.kill();
                        let _ = child.wait();
                        // Grandchildren may still hold the pipes open; leave
                        // the reader threads detached.
                        return Ok(ExecutionResult::TimedOut {
                            elapsed: start.elapsed(),
                        });
                    }
                    std::thread::sleep(self.poll_interval);
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(e);
                }
            }
        }
    }
}

/// Bytes read so far from one child pipe, filled by a detached thread.
struct Capture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Capture {
    fn spawn<R: Read + Send + 'static>(mut pipe: R, done: Sender<()>) -> Self {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buf);
        std::thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => sink.lock().extend_from_slice(&chunk[..n]),
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                    Err(e) => {
                        log::warn!("Error reading renderer output: {e}");
                        break;
                    }
                }
            }
            let _ = done.send(());
        });
        Self { buf }
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }
}

/// Wait until `count` readers reached EOF or `deadline` passed. Returns
/// `false` on the deadline.
fn wait_for_readers(done: &Receiver<()>, count: usize, deadline: Instant) -> bool {
    for _ in 0..count {
        let left = deadline.saturating_duration_since(Instant::now());
        if done.recv_timeout(left).is_err() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_flag_lookup() {
        let cmd = RenderCommand::new("mmdc", Duration::from_secs(30))
            .args(["-i", "in.mmd", "-o", "out.svg"])
            .arg("-t")
            .arg("dark");
        assert_eq!(cmd.flag_value("-o"), Some("out.svg"));
        assert_eq!(cmd.flag_value("-t"), Some("dark"));
        assert_eq!(cmd.flag_value("-s"), None);
        assert_eq!(cmd.display(), "mmdc -i in.mmd -o out.svg -t dark");
    }

    #[test]
    fn test_spawn_failure_is_io_error() {
        let cmd = RenderCommand::new(
            "/definitely/not/a/renderer-binary",
            Duration::from_secs(1),
        );
        assert!(SystemExecutor::new().execute(&cmd).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_exit_code_and_streams() {
        let cmd = RenderCommand::new("sh", Duration::from_secs(10))
            .args(["-c", "echo rendered; echo 'Parse error on line 2' >&2; exit 3"]);
        let result = SystemExecutor::new().execute(&cmd).unwrap();
        match result {
            ExecutionResult::Exited {
                code,
                stdout,
                stderr,
            } => {
                assert_eq!(code, Some(3));
                assert_eq!(stdout.trim(), "rendered");
                assert_eq!(stderr.trim(), "Parse error on line 2");
            }
            other => panic!("expected exit, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_success_status() {
        let cmd = RenderCommand::new("sh", Duration::from_secs(10)).args(["-c", "exit 0"]);
        assert!(SystemExecutor::new().execute(&cmd).unwrap().success());
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_process() {
        let cmd = RenderCommand::new("sh", Duration::from_millis(200)).args(["-c", "sleep 5"]);
        let start = Instant::now();
        let result = SystemExecutor::new().execute(&cmd).unwrap();
        assert!(matches!(result, ExecutionResult::TimedOut { .. }));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_working_dir_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = RenderCommand::new("sh", Duration::from_secs(10))
            .args(["-c", "pwd"])
            .working_dir(dir.path());
        let ExecutionResult::Exited { stdout, .. } = SystemExecutor::new().execute(&cmd).unwrap()
        else {
            panic!("expected exit");
        };
        let expected = dir.path().canonicalize().unwrap();
        let actual = std::path::Path::new(stdout.trim()).canonicalize().unwrap();
        assert_eq!(actual, expected);
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_with_descendant_holding_pipes_respects_deadline() {
        let cmd = RenderCommand::new("sh", Duration::from_millis(500))
            .args(["-c", "sleep 6 & echo 'Parse error' >&2; exit 1"]);
        let start = Instant::now();
        let result = SystemExecutor::new().execute(&cmd).unwrap();
        assert!(
            start.elapsed() < Duration::from_secs(3),
            "call took {:?}",
            start.elapsed()
        );
        match result {
            ExecutionResult::Exited { code, stderr, .. } => {
                assert_eq!(code, Some(1));
                assert_eq!(stderr.trim(), "Parse error");
            }
            other => panic!("expected exit, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_with_descendant_holding_pipes() {
        let cmd = RenderCommand::new("sh", Duration::from_millis(300))
            .args(["-c", "sleep 6 & sleep 6"]);
        let start = Instant::now();
        let result = SystemExecutor::new().execute(&cmd).unwrap();
        assert!(matches!(result, ExecutionResult::TimedOut { .. }));
        assert!(start.elapsed() < Duration::from_secs(3));
    }
}
