//! Plugin installer.
//!
//! Runs the configured install/uninstall commands for a plugin and records
//! the result in the store. Commands are only run for plugins the catalog
//! knows about.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use modhub_core::config::PluginConfig;
use modhub_core::error::AppError;
use modhub_core::result::AppResult;

use crate::command::{CommandOutput, CommandRunner, ProcessCommandRunner, render_command};
use crate::store::PluginStore;

/// Result of an install or uninstall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallOutcome {
    pub alias: String,
    /// Human-readable summary.
    pub message: String,
    /// Whether the new state reached the persistence backend.
    pub recorded: bool,
    /// Command stdout, if a command ran.
    pub output: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Install,
    Uninstall,
}

impl Action {
    fn verb(self) -> &'static str {
        match self {
            Self::Install => "Install",
            Self::Uninstall => "Uninstall",
        }
    }
}

/// Runs plugin lifecycle commands.
#[derive(Debug, Clone)]
pub struct PluginInstaller {
    runner: Arc<dyn CommandRunner>,
    working_dir: PathBuf,
    install_command: Vec<String>,
    uninstall_command: Vec<String>,
    refresh_command: Vec<String>,
}

impl PluginInstaller {
    /// Installer using the given runner and the `[plugins]` command templates.
    pub fn new(runner: Arc<dyn CommandRunner>, config: &PluginConfig) -> Self {
        Self {
            runner,
            working_dir: config.app_root(),
            install_command: config.install_command.clone(),
            uninstall_command: config.uninstall_command.clone(),
            refresh_command: config.refresh_autoload_command.clone(),
        }
    }

    /// Installer spawning real processes.
    pub fn from_config(config: &PluginConfig) -> Self {
        let runner = ProcessCommandRunner::new(Duration::from_secs(config.command_timeout_seconds));
        Self::new(Arc::new(runner), config)
    }

    /// Run the install command and record the manifest version.
    pub async fn install(&self, store: &mut PluginStore, alias: &str) -> AppResult<InstallOutcome> {
        let descriptor = store
            .find_by_alias(alias)
            .await?
            .ok_or_else(|| AppError::not_found("Plugin not exists"))?;

        let output = self.run(Action::Install, &self.install_command, alias).await?;
        let recorded = store.mark_installed(alias, descriptor.version.clone()).await?;

        Ok(InstallOutcome {
            alias: alias.to_string(),
            message: "Installed plugin dependencies".to_string(),
            recorded,
            output: output.map(|o| o.stdout),
        })
    }

    /// Run the uninstall command and clear the installed flag.
    pub async fn uninstall(&self, store: &mut PluginStore, alias: &str) -> AppResult<InstallOutcome> {
        store
            .find_by_alias(alias)
            .await?
            .ok_or_else(|| AppError::not_found("Plugin not exists"))?;

        let output = self
            .run(Action::Uninstall, &self.uninstall_command, alias)
            .await?;
        let recorded = store.mark_uninstalled(alias).await?;

        Ok(InstallOutcome {
            alias: alias.to_string(),
            message: "Uninstalled plugin dependencies".to_string(),
            recorded,
            output: output.map(|o| o.stdout),
        })
    }

    /// Regenerate the host's autoloader. No-op when no command is configured.
    pub async fn refresh_autoload(&self) -> AppResult<Option<CommandOutput>> {
        let Some((program, args)) = render_command(&self.refresh_command, "") else {
            return Ok(None);
        };

        let output = self.runner.run(&program, &args, &self.working_dir).await?;
        if !output.success() {
            return Err(AppError::external_service(format!(
                "Autoload refresh failed ({}): {}",
                describe_status(&output),
                output.stderr.trim()
            )));
        }

        info!(program = %program, "Autoloader regenerated");
        Ok(Some(output))
    }

    async fn run(
        &self,
        action: Action,
        template: &[String],
        alias: &str,
    ) -> AppResult<Option<CommandOutput>> {
        let Some((program, args)) = render_command(template, alias) else {
            warn!(alias, action = action.verb(), "No command configured, only recording state");
            return Ok(None);
        };

        let output = self.runner.run(&program, &args, &self.working_dir).await?;
        if !output.success() {
            return Err(AppError::external_service(format!(
                "{} command for '{alias}' failed ({}): {}",
                action.verb(),
                describe_status(&output),
                output.stderr.trim()
            )));
        }

        info!(alias, action = action.verb(), "Plugin command completed");
        Ok(Some(output))
    }
}

fn describe_status(output: &CommandOutput) -> String {
    match output.status {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}
