//! Plugin management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use modhub_core::error::AppError;
use modhub_plugin::{AutoloadChange, PluginDescriptor, PluginInstaller};

use crate::output::{self, OutputFormat, yes_no};

/// Arguments for plugin commands
#[derive(Debug, Args)]
pub struct PluginArgs {
    /// Plugin subcommand
    #[command(subcommand)]
    pub command: PluginCommand,
}

/// Plugin subcommands
#[derive(Debug, Subcommand)]
pub enum PluginCommand {
    /// List discovered plugins
    List,
    /// Show one plugin
    Show {
        /// Plugin alias
        alias: String,
    },
    /// Enable a plugin and register its autoload entry
    Enable {
        /// Plugin alias
        alias: String,
        /// Skip the autoload refresh command
        #[arg(long)]
        no_refresh: bool,
    },
    /// Disable a plugin and remove its autoload entry
    Disable {
        /// Plugin alias
        alias: String,
        /// Skip the autoload refresh command
        #[arg(long)]
        no_refresh: bool,
    },
    /// Run a plugin's install command
    Install {
        /// Plugin alias
        alias: String,
    },
    /// Run a plugin's uninstall command
    Uninstall {
        /// Plugin alias
        alias: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Plugin display row for table output
#[derive(Debug, Serialize, Tabled)]
struct PluginRow {
    alias: String,
    namespace: String,
    autoload: String,
    version: String,
    enabled: String,
    installed: String,
}

impl From<&PluginDescriptor> for PluginRow {
    fn from(p: &PluginDescriptor) -> Self {
        Self {
            alias: p.alias.clone(),
            namespace: p.namespace.clone(),
            autoload: p.autoload_type.to_string(),
            version: p.version.clone().unwrap_or_else(|| "-".to_string()),
            enabled: yes_no(p.enabled).to_string(),
            installed: match (&p.installed_version, p.installed) {
                (Some(v), true) => format!("yes ({v})"),
                (_, installed) => yes_no(installed).to_string(),
            },
        }
    }
}

/// Execute plugin commands
pub async fn execute(
    args: &PluginArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let (mut store, pool) = super::open_store(&config).await;
    let installer = PluginInstaller::from_config(&config.plugins);

    match &args.command {
        PluginCommand::List => {
            let catalog = store.get_all().await?.clone();
            if !store.is_backend_ready() {
                output::print_warning("Database unavailable, showing default plugin state");
            }
            for conflict in catalog.conflicts() {
                output::print_warning(&format!(
                    "Skipped {} ({:?} '{}' already claimed by {})",
                    conflict.skipped.display(),
                    conflict.kind,
                    conflict.key,
                    conflict.kept.display()
                ));
            }
            let rows: Vec<PluginRow> = catalog.iter().map(PluginRow::from).collect();
            output::print_list(&rows, format);
        }
        PluginCommand::Show { alias } => {
            let plugin = store
                .find_by_alias(alias)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Plugin not found: {alias}")))?;
            print_plugin(&plugin, format);
        }
        PluginCommand::Enable { alias, no_refresh } => {
            let change = store.enable(alias).await?;
            report_change(alias, true, &change);
            refresh(&installer, *no_refresh).await;
        }
        PluginCommand::Disable { alias, no_refresh } => {
            let change = store.disable(alias).await?;
            report_change(alias, false, &change);
            refresh(&installer, *no_refresh).await;
        }
        PluginCommand::Install { alias } => {
            let outcome = installer.install(&mut store, alias).await?;
            if let Some(stdout) = outcome.output.as_deref().filter(|s| !s.trim().is_empty()) {
                println!("{}", stdout.trim_end());
            }
            output::print_success(&format!("{} ({})", outcome.message, outcome.alias));
            if !outcome.recorded {
                output::print_warning("Install state was not recorded: database unavailable");
            }
        }
        PluginCommand::Uninstall { alias, yes } => {
            if !yes {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!("Uninstall plugin '{alias}'?"))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

                if !confirm {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let outcome = installer.uninstall(&mut store, alias).await?;
            output::print_success(&format!("{} ({})", outcome.message, outcome.alias));
            if !outcome.recorded {
                output::print_warning("Uninstall state was not recorded: database unavailable");
            }
        }
    }

    if let Some(pool) = pool {
        pool.close().await;
    }
    Ok(())
}

fn print_plugin(plugin: &PluginDescriptor, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_json(plugin),
        OutputFormat::Table => {
            let none = || "-".to_string();
            output::print_kv("Alias", &plugin.alias);
            output::print_kv("Name", &plugin.name.clone().unwrap_or_else(none));
            output::print_kv("Namespace", &plugin.namespace);
            output::print_kv("Autoload", plugin.autoload_type.as_str());
            output::print_kv("Version", &plugin.version.clone().unwrap_or_else(none));
            output::print_kv("Author", &plugin.author.clone().unwrap_or_else(none));
            output::print_kv("Description", &plugin.description.clone().unwrap_or_else(none));
            output::print_kv("Enabled", yes_no(plugin.enabled));
            output::print_kv("Installed", yes_no(plugin.installed));
            output::print_kv(
                "Installed version",
                &plugin.installed_version.clone().unwrap_or_else(none),
            );
            output::print_kv("Manifest", &plugin.manifest_path.display().to_string());
            output::print_kv(
                "Record id",
                &plugin.id.map(|id| id.to_string()).unwrap_or_else(none),
            );
        }
    }
}

fn report_change(alias: &str, enabled: bool, change: &AutoloadChange) {
    let verb = if enabled { "enabled" } else { "disabled" };
    match change {
        AutoloadChange::Added { path, .. } => {
            output::print_success(&format!("Plugin '{alias}' {verb}, autoload entry {path} added"))
        }
        AutoloadChange::Removed { path, .. } => {
            output::print_success(&format!("Plugin '{alias}' {verb}, autoload entry {path} removed"))
        }
        AutoloadChange::Unchanged => {
            output::print_success(&format!("Plugin '{alias}' {verb}, autoload already up to date"))
        }
    }
}

async fn refresh(installer: &PluginInstaller, skip: bool) {
    if skip {
        return;
    }
    match installer.refresh_autoload().await {
        Ok(Some(_)) => output::print_success("Autoloader regenerated"),
        Ok(None) => {}
        Err(e) => output::print_warning(&format!("Autoload refresh failed: {e}")),
    }
}
