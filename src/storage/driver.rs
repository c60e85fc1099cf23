//! Storage driver entry points
//!
//! One call per reconcile invocation. Every call ends by writing the
//! `StorageExists` condition on the state it was given; errors are also
//! returned to the caller.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::cloud::CloudEnvironment;
use crate::config::record::{AzureStorageConfig, Infrastructure, ManagementState, StorageState};
use crate::config::settings::{ClusterCredentials, Settings, StorageCredentials};
use crate::error::{AzstoreError, Result};
use crate::provider::models::PublicNetworkAccess;
use crate::provider::{BlobContainerOperations, ClientFactory, ProviderClients};
use crate::storage::conditions::{report, ConditionStatus, StorageExistsReason};
use crate::storage::env::{self, EnvVar};
use crate::storage::{decommission, probe, provision};

pub struct AzureStorageDriver {
    config: AzureStorageConfig,
    settings: Settings,
    factory: Arc<dyn ClientFactory>,
}

impl AzureStorageDriver {
    /// Create a driver working on a copy of `config`, normally the spec of
    /// the state record.
    pub fn new(config: AzureStorageConfig, settings: Settings, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            config,
            settings,
            factory,
        }
    }

    /// The working configuration, including names chosen by this driver
    pub fn config(&self) -> &AzureStorageConfig {
        &self.config
    }

    /// Storage identifier: the container name
    pub fn id(&self) -> &str {
        &self.config.container
    }

    fn environment(&self) -> Result<CloudEnvironment> {
        CloudEnvironment::from_name(&self.config.cloud_name, self.settings.custom_cloud.as_ref())
    }

    fn clients(&self, environment: &CloudEnvironment, credentials: &ClusterCredentials) -> Result<ProviderClients> {
        self.factory.clients(environment, credentials)
    }

    /// Keep names chosen so far so the next invocation repairs these
    /// resources instead of generating new ones. Storage created by this
    /// invocation is managed even when a later step failed.
    fn save_progress(&self, state: &mut StorageState, created: bool) {
        state.spec = self.config.clone();
        if created && state.management_state.is_none() {
            info!("storage management state set to {:?}", ManagementState::Managed);
            state.management_state = Some(ManagementState::Managed);
        }
    }

    /// Provision the account and container, and private network access when
    /// requested.
    pub async fn create_storage(&mut self, state: &mut StorageState, infra: &Infrastructure) -> Result<()> {
        let credentials = match self.settings.storage_credentials() {
            Ok(credentials) => credentials,
            Err(e) => {
                report(
                    state,
                    ConditionStatus::Unknown,
                    StorageExistsReason::ConfigError,
                    format!("Unable to get configuration: {}", e),
                );
                return Err(e);
            }
        };

        let credentials = match credentials {
            StorageCredentials::UserManaged { .. } => {
                self.process_user_managed(state);
                return Ok(());
            }
            StorageCredentials::Cluster(credentials) => credentials,
        };

        if infra.infrastructure_name.is_empty() {
            let e = AzstoreError::config("infrastructure name is not set");
            report(
                state,
                ConditionStatus::Unknown,
                StorageExistsReason::ConfigError,
                format!("Unable to get infrastructure: {}", e),
            );
            return Err(e);
        }

        if self.config.cloud_name.is_empty() && self.config.account_name.is_empty() {
            if let Some(azure) = &infra.azure {
                self.config.cloud_name = azure.cloud_name.clone();
            }
        }

        if let Some(internal) = self.config.network_access.internal() {
            if internal.vnet_name.is_empty() || internal.subnet_name.is_empty() {
                let e = AzstoreError::config(
                    "internal network access requires both a vnet name and a subnet name",
                );
                report(
                    state,
                    ConditionStatus::Unknown,
                    StorageExistsReason::ConfigError,
                    format!("Unable to configure private network access: {}", e),
                );
                return Err(e);
            }
        }

        let environment = match self.environment() {
            Ok(environment) => environment,
            Err(e) => {
                report(
                    state,
                    ConditionStatus::Unknown,
                    StorageExistsReason::ConfigError,
                    format!("Unable to get cloud environment: {}", e),
                );
                return Err(e);
            }
        };

        let clients = match self.clients(&environment, &credentials) {
            Ok(clients) => clients,
            Err(e) => {
                report(
                    state,
                    ConditionStatus::Unknown,
                    StorageExistsReason::AzureError,
                    format!("Unable to get azure clients: {}", e),
                );
                return Err(e);
            }
        };

        let account =
            match provision::assure_storage_account(&clients, &environment, &mut self.config, infra).await {
                Ok(account) => account,
                Err(e) => {
                    self.save_progress(state, false);
                    report(
                        state,
                        ConditionStatus::Unknown,
                        StorageExistsReason::AzureError,
                        format!("Unable to process storage account: {}", e),
                    );
                    return Err(e);
                }
            };
        self.config.account_name = account.name.clone();

        if let Err(e) = provision::assure_private_network(&clients, &mut self.config, infra, &account).await {
            self.save_progress(state, account.created);
            report(
                state,
                ConditionStatus::Unknown,
                StorageExistsReason::AzureError,
                format!("Unable to process storage account: {}", e),
            );
            return Err(e);
        }

        let container = match provision::assure_container(&clients, &self.config, infra).await {
            Ok(container) => container,
            Err(e) => {
                self.save_progress(state, account.created);
                report(
                    state,
                    ConditionStatus::Unknown,
                    StorageExistsReason::AzureError,
                    format!("Unable to process storage container: {}", e),
                );
                return Err(e);
            }
        };
        self.config.container = container.name.clone();

        if self.config.network_access.is_internal()
            && !probe::is_account_private(clients.accounts.as_ref(), &self.config.account_name).await
        {
            if let Err(e) = clients
                .accounts
                .update_public_network_access(&self.config.account_name, PublicNetworkAccess::Disabled)
                .await
            {
                self.save_progress(state, account.created || container.created);
                report(
                    state,
                    ConditionStatus::Unknown,
                    StorageExistsReason::AzureError,
                    format!("Unable to disable public network access: {}", e),
                );
                return Err(e);
            }
        }

        if state.management_state.is_none() {
            let management_state = if account.created || container.created {
                ManagementState::Managed
            } else {
                ManagementState::Unmanaged
            };
            info!("storage management state set to {:?}", management_state);
            state.management_state = Some(management_state);
        }

        state.spec = self.config.clone();
        state.status = Some(self.config.clone());
        report(
            state,
            ConditionStatus::True,
            StorageExistsReason::ContainerExists,
            "Storage container exists",
        );
        Ok(())
    }

    /// Storage reached with a user supplied key is only checked for
    /// completeness, never provisioned.
    fn process_user_managed(&self, state: &mut StorageState) {
        if self.config.account_name.is_empty() {
            report(
                state,
                ConditionStatus::False,
                StorageExistsReason::NotConfigured,
                "Storage account key is provided, but account name is not specified",
            );
            return;
        }

        if self.config.container.is_empty() {
            report(
                state,
                ConditionStatus::False,
                StorageExistsReason::NotConfigured,
                "Storage account is provided, but container is not specified",
            );
            return;
        }

        if state.management_state.is_none() {
            state.management_state = Some(ManagementState::Unmanaged);
        }
        state.status = Some(self.config.clone());
        report(
            state,
            ConditionStatus::True,
            StorageExistsReason::UserManaged,
            "Storage is managed by the user",
        );
    }

    /// Delete managed storage. Unmanaged storage is left alone.
    pub async fn remove_storage(&mut self, state: &mut StorageState) -> Result<()> {
        if !state.is_managed() {
            debug!("storage is not managed, nothing to remove");
            return Ok(());
        }

        if self.config.account_name.is_empty() {
            report(
                state,
                ConditionStatus::False,
                StorageExistsReason::NotConfigured,
                "Storage is not configured",
            );
            return Ok(());
        }

        let credentials = match self.settings.storage_credentials() {
            Ok(StorageCredentials::Cluster(credentials)) => credentials,
            Ok(StorageCredentials::UserManaged { .. }) => {
                warn!("storage account key is provided, not removing user managed storage");
                return Ok(());
            }
            Err(e) => {
                report(
                    state,
                    ConditionStatus::Unknown,
                    StorageExistsReason::ConfigError,
                    format!("Unable to get configuration: {}", e),
                );
                return Err(e);
            }
        };

        let environment = match self.environment() {
            Ok(environment) => environment,
            Err(e) => {
                report(
                    state,
                    ConditionStatus::Unknown,
                    StorageExistsReason::ConfigError,
                    format!("Unable to get cloud environment: {}", e),
                );
                return Err(e);
            }
        };

        let clients = match self.clients(&environment, &credentials) {
            Ok(clients) => clients,
            Err(e) => {
                report(
                    state,
                    ConditionStatus::Unknown,
                    StorageExistsReason::AzureError,
                    format!("Unable to get accounts client: {}", e),
                );
                return Err(e);
            }
        };

        decommission::remove_storage(&clients, &mut self.config, state).await
    }

    /// Account key and container client for the configured account
    async fn account_access(
        &self,
        environment: &CloudEnvironment,
        credentials: &StorageCredentials,
    ) -> Result<(String, Arc<dyn BlobContainerOperations>)> {
        match credentials {
            StorageCredentials::UserManaged { account_key } => Ok((
                account_key.as_str().to_string(),
                self.factory.containers(environment)?,
            )),
            StorageCredentials::Cluster(credentials) => {
                let clients = self.clients(environment, credentials)?;
                let key =
                    probe::primary_account_key(clients.accounts.as_ref(), &self.config.account_name).await?;
                Ok((key, clients.containers))
            }
        }
    }

    /// Check that the configured container exists and is reachable.
    pub async fn storage_exists(&self, state: &mut StorageState) -> Result<bool> {
        if self.config.account_name.is_empty() || self.config.container.is_empty() {
            report(
                state,
                ConditionStatus::False,
                StorageExistsReason::NotConfigured,
                "Storage is not configured",
            );
            return Ok(false);
        }

        let credentials = match self.settings.storage_credentials() {
            Ok(credentials) => credentials,
            Err(e) => {
                report(
                    state,
                    ConditionStatus::Unknown,
                    StorageExistsReason::ConfigError,
                    format!("Unable to get configuration: {}", e),
                );
                return Err(e);
            }
        };

        let environment = match self.environment() {
            Ok(environment) => environment,
            Err(e) => {
                report(
                    state,
                    ConditionStatus::Unknown,
                    StorageExistsReason::ConfigError,
                    format!("Unable to get cloud environment: {}", e),
                );
                return Err(e);
            }
        };

        let (key, containers) = match self.account_access(&environment, &credentials).await {
            Ok(access) => access,
            Err(e) => {
                report(
                    state,
                    ConditionStatus::Unknown,
                    StorageExistsReason::AzureError,
                    format!("Unable to get storage account key: {}", e),
                );
                return Err(e);
            }
        };

        let exists = match probe::container_exists(
            containers.as_ref(),
            &self.config.account_name,
            &key,
            &self.config.container,
        )
        .await
        {
            Ok(exists) => exists,
            Err(e) => {
                report(state, ConditionStatus::Unknown, StorageExistsReason::AzureError, e.to_string());
                return Err(e);
            }
        };

        if !exists {
            report(
                state,
                ConditionStatus::False,
                StorageExistsReason::ContainerNotFound,
                format!("Could not find storage container {}", self.config.container),
            );
            return Ok(false);
        }

        report(
            state,
            ConditionStatus::True,
            StorageExistsReason::ContainerExists,
            "Storage container exists",
        );
        Ok(true)
    }

    /// Whether the desired configuration differs from the applied one
    pub fn storage_changed(state: &StorageState) -> bool {
        state.status.as_ref() != Some(&state.spec)
    }

    /// Environment variables pointing the registry at this storage
    pub async fn config_env(&self) -> Result<Vec<EnvVar>> {
        let credentials = self.settings.storage_credentials()?;
        let environment = self.environment()?;
        let (key, _) = self.account_access(&environment, &credentials).await?;

        let mut vars = vec![
            EnvVar::new(env::STORAGE_ENV, "azure"),
            EnvVar::new(env::CONTAINER_ENV, self.config.container.clone()),
            EnvVar::new(env::ACCOUNT_NAME_ENV, self.config.account_name.clone()),
            EnvVar::secret(env::ACCOUNT_KEY_ENV, key),
        ];

        if !self.config.cloud_name.is_empty() {
            vars.push(EnvVar::new(env::REALM_ENV, environment.storage_endpoint_suffix));
        }

        Ok(vars)
    }
}
