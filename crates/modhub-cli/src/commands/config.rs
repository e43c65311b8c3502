//! Configuration CLI commands.

use clap::{Args, Subcommand};

use modhub_core::error::AppError;
use modhub_database::connection::mask_password;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Validate the configuration and the paths it points at
    Validate,
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let mut config = super::load_config(config_path)?;

    match &args.command {
        ConfigCommand::Show => {
            config.database.url = mask_password(&config.database.url);
            match format {
                OutputFormat::Json => output::print_json(&config),
                OutputFormat::Table => {
                    output::print_kv("Server", &config.server.bind_address());
                    output::print_kv("Database", &config.database.url);
                    output::print_kv("App root", &config.plugins.app_root);
                    output::print_kv("Plugins", &config.plugins.plugins_root().display().to_string());
                    output::print_kv("Manifest file", &config.plugins.manifest_file);
                    output::print_kv(
                        "Autoload manifest",
                        &config.plugins.autoload_manifest_path().display().to_string(),
                    );
                    output::print_kv("Install", &config.plugins.install_command.join(" "));
                    output::print_kv("Uninstall", &config.plugins.uninstall_command.join(" "));
                    output::print_kv("Autoload refresh", &config.plugins.refresh_autoload_command.join(" "));
                    output::print_kv("Log level", &config.logging.level);
                }
            }
        }
        ConfigCommand::Validate => {
            let plugins_root = config.plugins.plugins_root();
            let manifest = config.plugins.autoload_manifest_path();
            let mut problems = 0;

            if !tokio::fs::metadata(&plugins_root).await.is_ok_and(|m| m.is_dir()) {
                output::print_warning(&format!(
                    "Plugins directory {} does not exist",
                    plugins_root.display()
                ));
                problems += 1;
            }
            if !tokio::fs::metadata(&manifest).await.is_ok_and(|m| m.is_file()) {
                output::print_warning(&format!(
                    "Autoload manifest {} does not exist",
                    manifest.display()
                ));
                problems += 1;
            }
            if config.plugins.manifest_file.trim().is_empty() {
                return Err(AppError::configuration("plugins.manifest_file must not be empty"));
            }

            if problems == 0 {
                output::print_success(&format!("Configuration '{config_path}' is valid"));
            } else {
                output::print_warning(&format!(
                    "Configuration '{config_path}' loaded with {problems} warning(s)"
                ));
            }
        }
    }

    Ok(())
}
