//! Blob container operations
//!
//! Containers live on the blob data plane, so these calls authenticate with
//! the storage account key rather than a resource manager token.

use async_trait::async_trait;
use azure_storage::{CloudLocation, StorageCredentials};
use azure_storage_blobs::prelude::*;
use tracing::info;

use crate::config::cloud::CloudEnvironment;
use crate::error::{AzstoreError, Result};

/// Trait for blob container operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobContainerOperations: Send + Sync {
    /// Whether the container exists; a missing container is `Ok(false)`
    async fn exists(&self, account: &str, key: &str, container: &str) -> Result<bool>;

    /// Create a container without public access
    async fn create(&self, account: &str, key: &str, container: &str) -> Result<()>;

    /// Delete a container
    async fn delete(&self, account: &str, key: &str, container: &str) -> Result<()>;
}

/// Azure blob container operations implementation
pub struct AzureBlobContainerOperations {
    environment: CloudEnvironment,
}

impl AzureBlobContainerOperations {
    pub fn new(environment: CloudEnvironment) -> Self {
        Self { environment }
    }

    fn container_client(&self, account: &str, key: &str, container: &str) -> ContainerClient {
        let location = CloudLocation::Custom {
            account: account.to_string(),
            uri: self.environment.blob_service_url(account),
        };
        let credentials = StorageCredentials::access_key(account.to_string(), key.to_string());

        ClientBuilder::with_location(location, credentials).container_client(container)
    }
}

#[async_trait]
impl BlobContainerOperations for AzureBlobContainerOperations {
    async fn exists(&self, account: &str, key: &str, container: &str) -> Result<bool> {
        self.container_client(account, key, container)
            .exists()
            .await
            .map_err(|e| {
                AzstoreError::azure_api(format!(
                    "unable to get the storage container {}: {}",
                    container, e
                ))
            })
    }

    async fn create(&self, account: &str, key: &str, container: &str) -> Result<()> {
        info!("creating storage container {} in account {}", container, account);
        self.container_client(account, key, container)
            .create()
            .public_access(PublicAccess::None)
            .await?;
        Ok(())
    }

    async fn delete(&self, account: &str, key: &str, container: &str) -> Result<()> {
        info!("deleting storage container {} in account {}", container, account);
        self.container_client(account, key, container)
            .delete()
            .await?;
        Ok(())
    }
}
