//! External process execution

use std::fmt;
use std::process::Stdio;

use async_trait::async_trait;
use tracing::debug;

/// Captured result of a finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub program: String,
    pub args: Vec<String>,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Multi-line dump used in failure messages.
///
/// Arguments are written verbatim, space separated, so secrets among them
/// stay matchable by a [`crate::Redactor`], which must see the text before it
/// is surfaced.
impl fmt::Display for ProcessOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "program: {}", self.program)?;
        writeln!(f, "args: {}", self.args.join(" "))?;
        match self.exit_code {
            Some(code) => writeln!(f, "exit code: {code}")?,
            None => writeln!(f, "exit code: terminated by signal")?,
        }
        writeln!(f, "stdout: {}", String::from_utf8_lossy(&self.stdout).trim_end())?;
        write!(f, "stderr: {}", String::from_utf8_lossy(&self.stderr).trim_end())
    }
}

/// Runs an external program to completion and captures its output
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<ProcessOutput>;
}

/// [`ProcessRunner`] spawning real processes through tokio.
///
/// There is no timeout, a hung client hangs the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<ProcessOutput> {
        debug!(program, arg_count = args.len(), "Spawning process");

        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await?;

        debug!(program, status = ?output.status.code(), "Process exited");

        Ok(ProcessOutput {
            program: program.to_string(),
            args: args.to_vec(),
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
