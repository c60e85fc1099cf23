//! Azure provider clients
//!
//! The storage driver talks to Azure only through the operation traits
//! defined here. `AzureClientFactory` wires them to the resource manager and
//! blob data plane; tests substitute their own implementations.

pub mod account;
pub mod arm;
pub mod container;
pub mod dns;
pub mod ids;
pub mod models;
pub mod network;

pub use account::{AzureStorageAccountOperations, StorageAccountOperations};
pub use container::{AzureBlobContainerOperations, BlobContainerOperations};
pub use dns::{AzurePrivateDnsOperations, PrivateDnsOperations};
pub use network::{AzureNetworkOperations, NetworkOperations};

use std::sync::Arc;
use tracing::debug;

use crate::auth::AuthProviderFactory;
use crate::config::cloud::CloudEnvironment;
use crate::config::settings::ClusterCredentials;
use crate::error::Result;
use crate::provider::arm::ArmClient;
use crate::utils::poll::PollOptions;

/// Subscription, resource group and region the cluster resources live in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceScope {
    pub subscription_id: String,
    pub resource_group: String,
    pub region: String,
}

impl From<&ClusterCredentials> for ResourceScope {
    fn from(credentials: &ClusterCredentials) -> Self {
        Self {
            subscription_id: credentials.subscription_id.clone(),
            resource_group: credentials.resource_group.clone(),
            region: credentials.region.clone(),
        }
    }
}

/// Provider clients for one cloud environment and resource scope
#[derive(Clone)]
pub struct ProviderClients {
    pub scope: ResourceScope,
    pub accounts: Arc<dyn StorageAccountOperations>,
    pub containers: Arc<dyn BlobContainerOperations>,
    pub network: Arc<dyn NetworkOperations>,
    pub dns: Arc<dyn PrivateDnsOperations>,
}

/// Builds provider clients
pub trait ClientFactory: Send + Sync {
    /// Clients authenticated with the cluster credentials
    fn clients(
        &self,
        environment: &CloudEnvironment,
        credentials: &ClusterCredentials,
    ) -> Result<ProviderClients>;

    /// Blob container client alone, for storage reached with a user supplied
    /// account key
    fn containers(&self, environment: &CloudEnvironment) -> Result<Arc<dyn BlobContainerOperations>>;
}

/// Factory for clients talking to Azure
pub struct AzureClientFactory {
    poll: PollOptions,
}

impl AzureClientFactory {
    pub fn new(poll: PollOptions) -> Self {
        Self { poll }
    }
}

impl ClientFactory for AzureClientFactory {
    fn clients(
        &self,
        environment: &CloudEnvironment,
        credentials: &ClusterCredentials,
    ) -> Result<ProviderClients> {
        debug!(
            "creating azure clients for {} in resource group {}",
            environment.name, credentials.resource_group
        );
        let auth_provider = AuthProviderFactory::from_credentials(credentials, environment)?;
        let arm = Arc::new(ArmClient::new(
            auth_provider,
            environment,
            credentials.subscription_id.clone(),
            credentials.resource_group.clone(),
            self.poll.clone(),
        )?);

        Ok(ProviderClients {
            scope: ResourceScope::from(credentials),
            accounts: Arc::new(AzureStorageAccountOperations::new(arm.clone())),
            containers: self.containers(environment)?,
            network: Arc::new(AzureNetworkOperations::new(arm.clone())),
            dns: Arc::new(AzurePrivateDnsOperations::new(arm)),
        })
    }

    fn containers(&self, environment: &CloudEnvironment) -> Result<Arc<dyn BlobContainerOperations>> {
        Ok(Arc::new(AzureBlobContainerOperations::new(environment.clone())))
    }
}
