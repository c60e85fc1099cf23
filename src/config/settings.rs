//! Configuration settings management
//!
//! This module handles loading operator settings from a settings file and
//! environment variables, and resolving them into the credentials used by
//! the storage driver.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use zeroize::Zeroizing;

use crate::config::cloud::CustomCloudEndpoints;
use crate::error::{AzstoreError, Result};
use crate::utils::poll::PollOptions;

pub const ACCOUNT_KEY_ENV: &str = "REGISTRY_STORAGE_AZURE_ACCOUNTKEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub debug: bool,
    pub subscription_id: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: Option<Zeroizing<String>>,
    pub federated_token_file: Option<PathBuf>,
    pub resource_group: String,
    pub region: String,
    /// A user provided storage account key. Its presence means the storage
    /// is managed by the user and nothing gets provisioned.
    pub account_key: Option<Zeroizing<String>>,
    pub poll_interval_secs: u64,
    pub poll_timeout_secs: u64,
    pub custom_cloud: Option<CustomCloudEndpoints>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            subscription_id: String::new(),
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: None,
            federated_token_file: None,
            resource_group: String::new(),
            region: String::new(),
            account_key: None,
            poll_interval_secs: 10,
            poll_timeout_secs: 180,
            custom_cloud: None,
        }
    }
}

/// Service principal credentials and placement of the cluster resources
#[derive(Debug, Clone)]
pub struct ClusterCredentials {
    pub subscription_id: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: Option<Zeroizing<String>>,
    pub federated_token_file: Option<PathBuf>,
    pub resource_group: String,
    pub region: String,
}

/// Credentials the storage driver works with
#[derive(Debug, Clone)]
pub enum StorageCredentials {
    /// The user supplied an account key for storage they manage themselves.
    UserManaged { account_key: Zeroizing<String> },
    /// The operator provisions storage with cluster credentials.
    Cluster(ClusterCredentials),
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the credentials the driver should use.
    ///
    /// A user provided account key wins over cluster credentials, but an empty
    /// one is rejected.
    pub fn storage_credentials(&self) -> Result<StorageCredentials> {
        if let Some(key) = &self.account_key {
            if key.trim().is_empty() {
                return Err(AzstoreError::config(format!(
                    "the setting {} has an empty value; it should be removed so that \
                     the cluster credentials are used or it should contain a valid \
                     storage account access key",
                    ACCOUNT_KEY_ENV
                )));
            }
            return Ok(StorageCredentials::UserManaged {
                account_key: key.clone(),
            });
        }

        self.validate()?;

        Ok(StorageCredentials::Cluster(ClusterCredentials {
            subscription_id: self.subscription_id.clone(),
            tenant_id: self.tenant_id.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            federated_token_file: self.federated_token_file.clone(),
            resource_group: self.resource_group.clone(),
            region: self.region.clone(),
        }))
    }

    /// Validate the cluster credentials, listing every missing option at once
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.subscription_id.is_empty() {
            missing.push("'subscription_id'");
        }
        if self.tenant_id.is_empty() {
            missing.push("'tenant_id'");
        }
        if self.client_id.is_empty() {
            missing.push("'client_id'");
        }
        let has_secret = self
            .client_secret
            .as_ref()
            .is_some_and(|s| !s.trim().is_empty());
        if !has_secret && self.federated_token_file.is_none() {
            missing.push("'client_secret'");
            missing.push("'federated_token_file'");
        }
        if self.resource_group.is_empty() {
            missing.push("'resource_group'");
        }
        if self.region.is_empty() {
            missing.push("'region'");
        }

        if !missing.is_empty() {
            return Err(AzstoreError::config(format!(
                "client misconfigured, missing {} option(s)",
                missing.join(", ")
            )));
        }
        Ok(())
    }

    pub fn poll_options(&self) -> PollOptions {
        PollOptions {
            interval: Duration::from_secs(self.poll_interval_secs),
            timeout: Duration::from_secs(self.poll_timeout_secs),
        }
    }

    pub fn get_settings_path() -> Result<PathBuf> {
        // Use XDG Base Directory specification on Linux and macOS
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            use std::env;
            let config_dir = if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
                PathBuf::from(xdg_config_home)
            } else {
                let home_dir = env::var("HOME")
                    .map_err(|_| AzstoreError::config("HOME environment variable not set"))?;
                PathBuf::from(home_dir).join(".config")
            };
            Ok(config_dir.join("azstore").join("azstore.toml"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            let config_dir = dirs::config_dir()
                .ok_or_else(|| AzstoreError::config("Unable to determine config directory"))?;
            Ok(config_dir.join("azstore").join("azstore.toml"))
        }
    }

    pub async fn load(path: Option<&Path>) -> Result<Self> {
        load_settings(path).await
    }
}

/// Load settings with priority order:
/// 1. Environment variables
/// 2. Settings file
/// 3. Default values
pub async fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();

    let settings_path = match path {
        Some(p) => p.to_path_buf(),
        None => Settings::get_settings_path()?,
    };
    if settings_path.exists() {
        settings = load_from_file(&settings_path).await?;
    }

    load_from_env(&mut settings);

    Ok(settings)
}

async fn load_from_file(path: &Path) -> Result<Settings> {
    let contents = tokio::fs::read_to_string(path).await?;

    // Try to parse as TOML first, then JSON as fallback
    if let Ok(settings) = toml::from_str::<Settings>(&contents) {
        return Ok(settings);
    }

    let settings = serde_json::from_str::<Settings>(&contents)?;
    Ok(settings)
}

fn load_from_env(settings: &mut Settings) {
    if let Ok(value) = std::env::var("DEBUG") {
        settings.debug = value.to_lowercase() == "true" || value == "1";
    }

    if let Ok(value) = std::env::var("AZURE_SUBSCRIPTION_ID") {
        settings.subscription_id = value;
    }

    if let Ok(value) = std::env::var("AZURE_TENANT_ID") {
        settings.tenant_id = value;
    }

    if let Ok(value) = std::env::var("AZURE_CLIENT_ID") {
        settings.client_id = value;
    }

    if let Ok(value) = std::env::var("AZURE_CLIENT_SECRET") {
        settings.client_secret = Some(Zeroizing::new(value));
    }

    if let Ok(value) = std::env::var("AZURE_FEDERATED_TOKEN_FILE") {
        settings.federated_token_file = Some(PathBuf::from(value));
    }

    if let Ok(value) = std::env::var("AZURE_RESOURCE_GROUP") {
        settings.resource_group = value;
    }

    if let Ok(value) = std::env::var("AZURE_REGION") {
        settings.region = value;
    }

    if let Ok(value) = std::env::var(ACCOUNT_KEY_ENV) {
        settings.account_key = Some(Zeroizing::new(value));
    }

    if let Ok(value) = std::env::var("AZSTORE_POLL_INTERVAL_SECS") {
        if let Ok(seconds) = value.parse::<u64>() {
            settings.poll_interval_secs = seconds;
        }
    }

    if let Ok(value) = std::env::var("AZSTORE_POLL_TIMEOUT_SECS") {
        if let Ok(seconds) = value.parse::<u64>() {
            settings.poll_timeout_secs = seconds;
        }
    }
}
