//! External command execution for install/uninstall hooks.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use modhub_core::config::ALIAS_PLACEHOLDER;
use modhub_core::error::{AppError, ErrorKind};
use modhub_core::result::AppResult;

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Exited with status 0.
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs a program and captures its output.
#[async_trait]
pub trait CommandRunner: Send + Sync + std::fmt::Debug {
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> AppResult<CommandOutput>;
}

/// Runs commands as child processes.
#[derive(Debug, Clone)]
pub struct ProcessCommandRunner {
    timeout: Duration,
}

impl ProcessCommandRunner {
    /// Runner killing any command that outlives `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for ProcessCommandRunner {
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> AppResult<CommandOutput> {
        debug!(program, ?args, cwd = %cwd.display(), "Running command");

        let child = tokio::process::Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| {
                AppError::external_service(format!(
                    "'{program}' did not finish within {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ExternalService,
                    format!("Failed to start '{program}'"),
                    e,
                )
            })?;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Substitute the alias into a configured command line.
///
/// Returns `None` for an empty template, which disables the command.
pub fn render_command(template: &[String], alias: &str) -> Option<(String, Vec<String>)> {
    let (program, args) = template.split_first()?;
    let args = args
        .iter()
        .map(|arg| arg.replace(ALIAS_PLACEHOLDER, alias))
        .collect();
    Some((program.replace(ALIAS_PLACEHOLDER, alias), args))
}
