//! External process execution
//!
//! Runs a program to completion, capturing stdout and stderr, and turns a
//! non-zero exit code into [`SesameError::ProcessFailed`].

use crate::error::{SesameError, SesameResult};
use crate::platform::Platform;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

/// Poll interval used where a blocking wait would spin a core
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How to wait for a child process to exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Await the exit status directly
    Blocking,
    /// Check for exit at a fixed interval
    Poll(Duration),
}

impl WaitStrategy {
    /// Strategy for the given platform: polling on macOS, blocking elsewhere
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::MacOS => WaitStrategy::Poll(POLL_INTERVAL),
            _ => WaitStrategy::Blocking,
        }
    }
}

/// Captured result of a successful process run
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Runs external commands synchronously from the caller's point of view
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    working_dir: Option<PathBuf>,
    wait: WaitStrategy,
}

impl ProcessRunner {
    /// Create a runner that uses the current directory and the platform wait strategy
    pub fn new() -> Self {
        Self {
            working_dir: None,
            wait: WaitStrategy::for_platform(Platform::detect()),
        }
    }

    /// Default working directory for commands run without one
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Override the wait strategy
    pub fn with_wait_strategy(mut self, wait: WaitStrategy) -> Self {
        self.wait = wait;
        self
    }

    /// Run `program` with `args`, returning captured output on exit code 0
    pub async fn run<I, S>(
        &self,
        program: &Path,
        args: I,
        working_dir: Option<&Path>,
    ) -> SesameResult<ProcessOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        let command_line = format!(
            "{} {}",
            program.display(),
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let mut cmd = Command::new(program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        match working_dir.or(self.working_dir.as_deref()) {
            Some(dir) => {
                debug!("Executing: [{}] {}", dir.display(), command_line);
                cmd.current_dir(dir);
            }
            None => debug!("Executing: {}", command_line),
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| SesameError::command_failed(command_line.clone(), e))?;

        // Drain both pipes while waiting so a chatty compiler cannot block on a full pipe
        let stdout = child.stdout.take().map(|s| tokio::spawn(read_stream(s)));
        let stderr = child.stderr.take().map(|s| tokio::spawn(read_stream(s)));

        let status = self
            .wait_for(&mut child)
            .await
            .map_err(|e| SesameError::command_failed(command_line.clone(), e))?;

        let stdout = collect(stdout).await?;
        let stderr = collect(stderr).await?;
        let code = status.code().unwrap_or(-1);

        debug!("Exited with code {}: {}", code, command_line);

        if !status.success() {
            return Err(SesameError::process_failed(
                command_line,
                code,
                &stderr,
                &stdout,
            ));
        }

        Ok(ProcessOutput {
            code,
            stdout,
            stderr,
        })
    }

    async fn wait_for(&self, child: &mut tokio::process::Child) -> std::io::Result<ExitStatus> {
        match self.wait {
            WaitStrategy::Blocking => child.wait().await,
            WaitStrategy::Poll(interval) => loop {
                if let Some(status) = child.try_wait()? {
                    return Ok(status);
                }
                tokio::time::sleep(interval).await;
            },
        }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_stream<R: AsyncRead + Unpin>(mut stream: R) -> std::io::Result<String> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

async fn collect(
    handle: Option<tokio::task::JoinHandle<std::io::Result<String>>>,
) -> SesameResult<String> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    handle
        .await
        .map_err(|e| SesameError::Internal(format!("output reader panicked: {}", e)))?
        .map_err(|e| SesameError::io("reading process output", e))
}
