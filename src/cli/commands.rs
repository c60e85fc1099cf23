//! CLI commands and argument parsing
//!
//! Each command is one reconcile invocation against a JSON state file: the
//! state is loaded, the driver runs once, and the updated state (conditions
//! included) is written back even when the driver fails.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::Tabled;
use tracing::{debug, info};

use crate::config::record::{Infrastructure, StorageState};
use crate::config::settings::Settings;
use crate::error::Result;
use crate::provider::AzureClientFactory;
use crate::storage::conditions::Condition;
use crate::storage::naming::{generate_account_name, generate_container_name, generate_private_endpoint_name};
use crate::storage::{AzureStorageDriver, EnvVar};
use crate::utils::format::{render_rows, render_value, OutputFormat};

/// Get the full version string with build information
fn get_version() -> &'static str {
    env!("VERSION_WITH_GIT")
}

#[derive(Parser)]
#[command(name = "azstore")]
#[command(about = "Provision and tear down Azure Blob Storage for an image registry")]
#[command(version = get_version(), author)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Storage state file (JSON), created when missing
    #[arg(long, global = true, env = "AZSTORE_STATE", default_value = "azstore-state.json")]
    pub state: PathBuf,

    /// Cluster infrastructure file (JSON)
    #[arg(long, global = true, env = "AZSTORE_INFRASTRUCTURE")]
    pub infra: Option<PathBuf>,

    /// Settings file, defaults to ~/.config/azstore/azstore.toml
    #[arg(long, global = true, env = "AZSTORE_SETTINGS")]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the storage account and container if they are missing
    Provision,
    /// Delete storage created by this tool
    Deprovision,
    /// Check that the configured container exists
    Status,
    /// Print the registry storage environment
    Env {
        /// Print secret values instead of masking them
        #[arg(long)]
        show_secrets: bool,
    },
    /// Generate resource names for a cluster without calling Azure
    GenerateName {
        /// Infrastructure name of the cluster
        infra_name: String,
    },
}

#[derive(Debug, Tabled, Serialize)]
struct ConditionRow {
    #[tabled(rename = "Type")]
    #[serde(rename = "type")]
    condition_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Last Transition")]
    last_transition_time: String,
}

impl From<&Condition> for ConditionRow {
    fn from(condition: &Condition) -> Self {
        Self {
            condition_type: condition.condition_type.clone(),
            status: condition.status.to_string(),
            reason: condition.reason.clone(),
            message: condition.message.clone(),
            last_transition_time: condition.last_transition_time.to_rfc3339(),
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
struct EnvRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl From<&EnvVar> for EnvRow {
    fn from(var: &EnvVar) -> Self {
        Self {
            name: var.name.clone(),
            value: var.value.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedNames {
    account_name: String,
    container_name: String,
    private_endpoint_name: String,
}

impl Cli {
    pub async fn execute(self, settings: Settings) -> Result<()> {
        match &self.command {
            Commands::Provision => execute_provision(&self, settings).await,
            Commands::Deprovision => execute_deprovision(&self, settings).await,
            Commands::Status => execute_status(&self, settings).await,
            Commands::Env { show_secrets } => execute_env(&self, settings, *show_secrets).await,
            Commands::GenerateName { infra_name } => execute_generate_name(infra_name, self.format),
        }
    }
}

/// Load the state record, starting empty when the file does not exist yet
pub async fn load_state(path: &Path) -> Result<StorageState> {
    if !path.exists() {
        debug!("state file {} not found, starting with an empty state", path.display());
        return Ok(StorageState::default());
    }
    StorageState::load(path).await
}

async fn load_infrastructure(path: Option<&Path>) -> Result<Infrastructure> {
    match path {
        Some(path) => Infrastructure::load(path).await,
        None => Ok(Infrastructure::default()),
    }
}

fn create_driver(state: &StorageState, settings: Settings) -> AzureStorageDriver {
    let factory = Arc::new(AzureClientFactory::new(settings.poll_options()));
    AzureStorageDriver::new(state.spec.clone(), settings, factory)
}

fn print_conditions(state: &StorageState, format: OutputFormat) -> Result<()> {
    let rows: Vec<ConditionRow> = state.conditions.iter().map(ConditionRow::from).collect();
    println!("{}", render_rows(format, &rows)?);
    Ok(())
}

/// Persist the state, then surface the driver result
async fn finish(cli: &Cli, state: &StorageState, result: Result<()>) -> Result<()> {
    state.save(&cli.state).await?;
    print_conditions(state, cli.format)?;
    result
}

async fn execute_provision(cli: &Cli, settings: Settings) -> Result<()> {
    let mut state = load_state(&cli.state).await?;
    let infra = load_infrastructure(cli.infra.as_deref()).await?;
    let mut driver = create_driver(&state, settings);

    info!("provisioning storage");
    let result = driver.create_storage(&mut state, &infra).await;
    finish(cli, &state, result).await
}

async fn execute_deprovision(cli: &Cli, settings: Settings) -> Result<()> {
    let mut state = load_state(&cli.state).await?;
    let mut driver = create_driver(&state, settings);

    info!("removing storage");
    let result = driver.remove_storage(&mut state).await;
    finish(cli, &state, result).await
}

async fn execute_status(cli: &Cli, settings: Settings) -> Result<()> {
    let mut state = load_state(&cli.state).await?;
    let driver = create_driver(&state, settings);

    let result = driver.storage_exists(&mut state).await.map(|exists| {
        debug!("storage exists: {}", exists);
        if AzureStorageDriver::storage_changed(&state) {
            info!("storage configuration has changed since it was last applied");
        }
    });
    finish(cli, &state, result).await
}

async fn execute_env(cli: &Cli, settings: Settings, show_secrets: bool) -> Result<()> {
    let state = load_state(&cli.state).await?;
    let driver = create_driver(&state, settings);

    let vars = driver.config_env().await?;
    let rows: Vec<EnvRow> = vars
        .iter()
        .map(|var| {
            if show_secrets {
                EnvRow::from(var)
            } else {
                EnvRow::from(&var.masked())
            }
        })
        .collect();

    println!("{}", render_rows(cli.format, &rows)?);
    Ok(())
}

fn execute_generate_name(infra_name: &str, format: OutputFormat) -> Result<()> {
    let account_name = generate_account_name(infra_name);
    let names = GeneratedNames {
        private_endpoint_name: generate_private_endpoint_name(&account_name),
        container_name: generate_container_name(infra_name)?,
        account_name,
    };

    println!("{}", render_value(format, &names)?);
    Ok(())
}
