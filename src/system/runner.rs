// file: src/system/runner.rs
// version: 1.0.0
// guid: 6b09e3d7-a852-44f1-9c06-e71d284f0b35

//! External command execution with dual-sink output
//!
//! Every invocation is recorded in the durable log before it runs. Combined
//! stdout/stderr goes to the durable log and, when console streaming is on,
//! to stderr as well. Success is the command's own exit status, never the
//! status of the output plumbing.

use crate::steps::StepOutcome;
use crate::system::DurableLog;
use crate::{ProvisionError, Result};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, error};

/// How many durable-log lines to dump when a fatal step fails
const FAILURE_TAIL_LINES: usize = 60;

/// Executes external commands, logging everything to the durable log
pub struct CommandRunner {
    log: Arc<DurableLog>,
    stream_console: bool,
}

impl CommandRunner {
    pub fn new(log: Arc<DurableLog>, stream_console: bool) -> Self {
        Self {
            log,
            stream_console,
        }
    }

    /// The durable log this runner writes to
    pub fn log(&self) -> &DurableLog {
        &self.log
    }

    /// Run a load-bearing command. Non-zero exit is fatal: the exit code and
    /// the last 60 durable-log lines are printed, and an error is returned.
    pub async fn run(&self, program: &str, args: &[&str]) -> Result<()> {
        self.run_env(program, args, &[]).await
    }

    /// Like [`run`](Self::run), with extra environment variables set for the
    /// child (e.g. `DEBIAN_FRONTEND=noninteractive`).
    pub async fn run_env(
        &self,
        program: &str,
        args: &[&str],
        envs: &[(&str, &str)],
    ) -> Result<()> {
        let (code, _) = self.execute(program, args, envs, false).await?;
        if code != 0 {
            self.dump_failure(program, args, code)?;
            return Err(ProvisionError::CommandFailed {
                command: render(program, args),
                code,
            });
        }
        Ok(())
    }

    /// Run a command and return its trimmed stdout. Fatal on non-zero exit.
    pub async fn run_capture(&self, program: &str, args: &[&str]) -> Result<String> {
        let (code, stdout) = self.execute(program, args, &[], true).await?;
        if code != 0 {
            self.dump_failure(program, args, code)?;
            return Err(ProvisionError::CommandFailed {
                command: render(program, args),
                code,
            });
        }
        Ok(stdout.trim().to_string())
    }

    /// Run a best-effort command: failure is logged and returned as an
    /// outcome, never an error.
    pub async fn run_soft(&self, program: &str, args: &[&str]) -> StepOutcome {
        self.run_soft_env(program, args, &[]).await
    }

    /// Best-effort variant with extra environment variables
    pub async fn run_soft_env(
        &self,
        program: &str,
        args: &[&str],
        envs: &[(&str, &str)],
    ) -> StepOutcome {
        match self.execute(program, args, envs, false).await {
            Ok((0, _)) => StepOutcome::Completed,
            Ok((code, _)) => {
                StepOutcome::failed(format!("{} exited {}", render(program, args), code))
            }
            Err(e) => StepOutcome::failed(format!("{}: {}", render(program, args), e)),
        }
    }

    /// Check a command exits zero without treating failure as fatal
    pub async fn check(&self, program: &str, args: &[&str]) -> bool {
        matches!(self.execute(program, args, &[], false).await, Ok((0, _)))
    }

    /// Capture trimmed stdout, returning `None` instead of failing when the
    /// command is missing or exits non-zero
    pub async fn capture_soft(&self, program: &str, args: &[&str]) -> Option<String> {
        match self.execute(program, args, &[], true).await {
            Ok((0, stdout)) => Some(stdout.trim().to_string()),
            _ => None,
        }
    }

    /// Spawn the command, pump both output streams into the sinks, and wait.
    /// Returns the command's exit code and captured stdout.
    async fn execute(
        &self,
        program: &str,
        args: &[&str],
        envs: &[(&str, &str)],
        capture: bool,
    ) -> Result<(i32, String)> {
        let rendered = render(program, args);
        self.log.status(&format!("+ {}", rendered))?;
        debug!("executing: {}", rendered);

        let mut child = Command::new(program)
            .args(args)
            .envs(envs.iter().copied())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ProvisionError::provision(format!("failed to spawn {}: {}", program, e))
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let stdout_pump = self.pump(stdout, capture);
        let stderr_pump = self.pump(stderr, false);
        let (captured, _) = tokio::join!(stdout_pump, stderr_pump);

        let status = child.wait().await?;
        let code = status.code().unwrap_or(-1);
        self.log
            .status(&format!("= {} (exit {})", program, code))?;

        Ok((code, captured))
    }

    /// Drain one output stream line by line into the durable log and,
    /// optionally, the console. Sink errors are swallowed so they can never
    /// masquerade as a command failure.
    async fn pump<R>(&self, stream: Option<R>, capture: bool) -> String
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let mut captured = String::new();
        let Some(stream) = stream else {
            return captured;
        };

        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let _ = self.log.raw(&line);
            if self.stream_console {
                eprintln!("{}", line);
            }
            if capture {
                captured.push_str(&line);
                captured.push('\n');
            }
        }
        captured
    }

    fn dump_failure(&self, program: &str, args: &[&str], code: i32) -> Result<()> {
        let rendered = render(program, args);
        error!("`{}` failed with exit code {}", rendered, code);
        self.log
            .status(&format!("FATAL: {} (exit {})", rendered, code))?;

        eprintln!("--- last {} log lines ({}) ---", FAILURE_TAIL_LINES, self.log.path().display());
        for line in self.log.tail(FAILURE_TAIL_LINES)? {
            eprintln!("{}", line);
        }
        Ok(())
    }
}

fn render(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}
