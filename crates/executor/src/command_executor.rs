use crate::error::{ExecutorError, StreamName};
use crate::suggestions;
use execstream_protocol::EventStream;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Lifecycle of one command execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Prepare,
    Running,
    Draining,
    Finalizing,
    Done,
}

/// Summary of one execution, for callers and logs. The event stream is the
/// authoritative record.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub command: String,
    pub working_dir: PathBuf,
    pub exit_code: Option<i32>,
    pub stdout_lines: usize,
    pub stderr_lines: usize,
    pub suggestion: Option<String>,
    pub error: Option<String>,
    pub phase: Phase,
}

impl ExecutionReport {
    fn new(command: &str, working_dir: PathBuf) -> Self {
        Self {
            command: command.to_string(),
            working_dir,
            exit_code: None,
            stdout_lines: 0,
            stderr_lines: 0,
            suggestion: None,
            error: None,
            phase: Phase::Prepare,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.exit_code == Some(0)
    }
}

enum StreamLine {
    Line(StreamName, String),
    Failed(StreamName, std::io::Error),
}

/// Runs shell commands and streams their output as events.
///
/// The working directory is passed to each spawned child; the worker's own
/// process directory is never changed.
pub struct CommandExecutor {
    base_dir: PathBuf,
}

impl CommandExecutor {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Executor rooted at the worker's current directory.
    pub fn from_current_dir() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory a command runs in: `project_dir` when it is an existing
    /// directory, otherwise the executor's base directory.
    pub fn resolve_dir(&self, project_dir: Option<&Path>) -> PathBuf {
        match project_dir {
            Some(dir) if dir.is_dir() => dir.to_path_buf(),
            Some(dir) => {
                warn!(
                    project_dir = %dir.display(),
                    fallback = %self.base_dir.display(),
                    "project directory does not exist, using worker directory"
                );
                self.base_dir.clone()
            }
            None => self.base_dir.clone(),
        }
    }

    /// Runs `command` and writes its full event stream, including the
    /// terminal `end` event.
    pub async fn run(
        &self,
        command: &str,
        project_dir: Option<&Path>,
        stream: &EventStream,
    ) -> ExecutionReport {
        let working_dir = self.resolve_dir(project_dir);
        let mut report = ExecutionReport::new(command, working_dir.clone());

        stream.text(format!("Executing code in background: {command}"));
        info!(
            command = %command,
            dir = %working_dir.display(),
            sequence_id = %stream.sequence_id(),
            "executing command"
        );

        match self.execute(command, &working_dir, stream, &mut report).await {
            Ok(status) => {
                report.phase = Phase::Finalizing;
                let code = status.code().unwrap_or(-1);
                report.exit_code = Some(code);
                stream.text(format!("Command executed with return code: {code}"));

                if let Some(suggestion) = suggestions::suggest(command) {
                    debug!(shape = ?suggestion.shape, "suggesting follow-up command");
                    stream.command(suggestion.command);
                    report.suggestion = Some(suggestion.command.to_string());
                }
            }
            Err(e) => {
                warn!(command = %command, error = %e, "command execution failed");
                stream.error(format!("Command execution error: {e}"));
                report.error = Some(e.to_string());
            }
        }

        report.phase = Phase::Done;
        stream.finish();
        report
    }

    async fn execute(
        &self,
        command: &str,
        working_dir: &Path,
        stream: &EventStream,
        report: &mut ExecutionReport,
    ) -> Result<ExitStatus, ExecutorError> {
        if command.trim().is_empty() {
            return Err(ExecutorError::EmptyCommand);
        }

        report.phase = Phase::Running;
        let mut child = shell_command(command)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ExecutorError::Spawn)?;

        report.phase = Phase::Draining;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(stdout, StreamName::Stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(stderr, StreamName::Stderr, tx.clone()));
        }
        drop(tx);

        // Single writer: lines from both readers are emitted in arrival order.
        while let Some(message) = rx.recv().await {
            match message {
                StreamLine::Line(StreamName::Stdout, line) => {
                    report.stdout_lines += 1;
                    stream.text(line);
                }
                StreamLine::Line(StreamName::Stderr, line) => {
                    report.stderr_lines += 1;
                    stream.error(line);
                }
                StreamLine::Failed(name, source) => {
                    let e = ExecutorError::Stream {
                        stream: name,
                        source,
                    };
                    warn!(error = %e, "output stream failed");
                    stream.error(e.to_string());
                }
            }
        }

        for reader in readers {
            if let Err(e) = reader.await {
                warn!(error = %e, "stream reader task failed");
            }
        }

        child.wait().await.map_err(ExecutorError::Wait)
    }
}

fn shell_command(command: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    }
    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let mut line = String::from_utf8_lossy(bytes).into_owned();
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    line
}

fn spawn_reader<R>(
    reader: R,
    name: StreamName,
    tx: mpsc::UnboundedSender<StreamLine>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(StreamLine::Line(name, decode_line(&buf))).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.send(StreamLine::Failed(name, e));
                    break;
                }
            }
        }
    })
}
