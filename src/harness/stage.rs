//! Stage: one external-process invocation
//!
//! A stage spawns a command, feeds it stdin, drains its stdout and stderr, and waits for it up to a wall-clock
//! timeout. Whatever happens, the caller gets a [`StageOutcome`] back; a hanging or missing toolchain binary is an
//! outcome, not an error.
//!
//! ## I/O Boundaries
//!
//! Process execution sits behind the [`StageExecutor`] trait so the pipeline can be driven by a scripted executor
//! in tests. [`ProcessStage`] is the real implementation.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// A command line: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl StageCommand {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Build a command that runs `target` through `launcher` (e.g. `java -jar <target>`).
    ///
    /// An empty launcher runs `target` directly.
    pub fn launched(launcher: &[OsString], target: &Path) -> Self {
        match launcher.split_first() {
            Some((program, rest)) => {
                let mut command = StageCommand::new(program.clone());
                command.args.extend(rest.iter().cloned());
                command.arg(target)
            }
            None => StageCommand::new(target),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }
}

impl fmt::Display for StageCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// How a stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// The process terminated on its own.
    Completed {
        exit_code: i32,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },
    /// The process outlived its budget and was killed.
    TimedOut { timeout: Duration },
    /// The process could not be started (or could not be waited on).
    SpawnFailed { reason: String },
}

impl StageOutcome {
    /// Exit code of a completed process.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            StageOutcome::Completed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }

    /// Completed with exit code 0.
    pub fn succeeded(&self) -> bool {
        self.exit_code() == Some(0)
    }

    pub fn stdout(&self) -> Option<&[u8]> {
        match self {
            StageOutcome::Completed { stdout, .. } => Some(stdout),
            _ => None,
        }
    }

    pub fn stderr(&self) -> Option<&[u8]> {
        match self {
            StageOutcome::Completed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// Why this outcome is a harness-level fault, if it is one.
    pub fn fault(&self) -> Option<String> {
        match self {
            StageOutcome::Completed { .. } => None,
            StageOutcome::TimedOut { timeout } => Some(format!("timed out after {}ms", timeout.as_millis())),
            StageOutcome::SpawnFailed { reason } => Some(reason.clone()),
        }
    }
}

/// Run one command to completion or timeout.
pub trait StageExecutor {
    fn run(&self, command: &StageCommand, input: &[u8], timeout: Duration) -> StageOutcome;
}

impl<T: StageExecutor + ?Sized> StageExecutor for &T {
    fn run(&self, command: &StageCommand, input: &[u8], timeout: Duration) -> StageOutcome {
        (**self).run(command, input, timeout)
    }
}

/// Executes stages as real child processes.
#[derive(Debug, Clone, Copy)]
pub struct ProcessStage {
    /// Interval between `try_wait` polls.
    pub poll_interval: Duration,
    /// How long to wait for the output pipes to close once the process has exited.
    pub drain_grace: Duration,
}

impl Default for ProcessStage {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            drain_grace: Duration::from_secs(1),
        }
    }
}

impl ProcessStage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StageExecutor for ProcessStage {
    fn run(&self, command: &StageCommand, input: &[u8], timeout: Duration) -> StageOutcome {
        tracing::debug!(command = %command, stdin_len = input.len(), "spawning stage");

        let mut child = match Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                return StageOutcome::SpawnFailed {
                    reason: format!("failed to launch '{}': {}", command.program.to_string_lossy(), e),
                };
            }
        };

        if let Some(mut pipe) = child.stdin.take() {
            let input = input.to_vec();
            // Dropping the pipe at the end of the thread closes the child's stdin.
            thread::spawn(move || {
                if let Err(e) = pipe.write_all(&input) {
                    if e.kind() != io::ErrorKind::BrokenPipe {
                        tracing::debug!(error = %e, "failed to write stage stdin");
                    }
                }
            });
        }
        let stdout_pipe = child.stdout.take().map(drain);
        let stderr_pipe = child.stderr.take().map(drain);

        let status = match self.wait(&mut child, timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                tracing::warn!(command = %command, timeout_ms = timeout.as_millis() as u64, "stage timed out");
                return StageOutcome::TimedOut { timeout };
            }
            Err(e) => {
                return StageOutcome::SpawnFailed {
                    reason: format!("failed to wait for '{}': {}", command.program.to_string_lossy(), e),
                };
            }
        };

        let outcome = StageOutcome::Completed {
            exit_code: exit_code_of(status),
            stdout: self.collect(stdout_pipe, "stdout"),
            stderr: self.collect(stderr_pipe, "stderr"),
        };
        tracing::debug!(command = %command, exit_code = ?outcome.exit_code(), "stage completed");
        outcome
    }
}

impl ProcessStage {
    /// Poll the child until it exits. Returns `Ok(None)` after killing it on timeout.
    fn wait(&self, child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(Some(status)),
                Ok(None) if start.elapsed() >= timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Ok(None);
                }
                Ok(None) => thread::sleep(self.poll_interval),
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(e);
                }
            }
        }
    }

    fn collect(&self, pipe: Option<Drain>, stream: &'static str) -> Vec<u8> {
        let Some(pipe) = pipe else {
            return Vec::new();
        };
        // A grandchild that inherited the pipe can keep it open; don't wait on it forever.
        if let Err(RecvTimeoutError::Timeout) = pipe.done.recv_timeout(self.drain_grace) {
            tracing::warn!(
                stream,
                grace_ms = self.drain_grace.as_millis() as u64,
                "pipe still open after exit, keeping output captured so far"
            );
        }
        std::mem::take(&mut *pipe.buf.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Output of one pipe, filled by a reader thread.
struct Drain {
    buf: Arc<Mutex<Vec<u8>>>,
    /// Signalled once the pipe reached EOF.
    done: Receiver<()>,
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> Drain {
    let buf = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&buf);
    let (tx, done) = mpsc::channel();
    thread::spawn(move || {
        let mut chunk = [0u8; 8192];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => sink
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        let _ = tx.send(());
    });
    Drain { buf, done }
}

fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}
