//! Storage account operations
//!
//! This module provides the storage account operations the driver consumes
//! and their implementation against the `Microsoft.Storage` resource provider.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::error::{AzstoreError, Result};
use crate::provider::arm::{str_at, ArmClient, STORAGE_API_VERSION};
use crate::provider::models::*;

/// Trait for storage account operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageAccountOperations: Send + Sync {
    /// Check whether `name` can be used for a new storage account
    async fn check_name_availability(&self, name: &str) -> Result<NameAvailability>;

    /// Create a storage account and wait for it to be provisioned
    async fn create_account(&self, request: &StorageAccountCreateRequest) -> Result<StorageAccount>;

    /// Get storage account properties
    async fn get_account(&self, name: &str) -> Result<StorageAccount>;

    /// Enable or disable public network access
    async fn update_public_network_access(
        &self,
        name: &str,
        access: PublicNetworkAccess,
    ) -> Result<()>;

    /// List the account access keys, primary first
    async fn list_keys(&self, name: &str) -> Result<Vec<AccountKey>>;

    /// Delete a storage account
    async fn delete_account(&self, name: &str) -> Result<()>;
}

/// Azure storage account operations implementation
pub struct AzureStorageAccountOperations {
    arm: Arc<ArmClient>,
}

impl AzureStorageAccountOperations {
    pub fn new(arm: Arc<ArmClient>) -> Self {
        Self { arm }
    }

    fn account_path(&self, name: &str) -> String {
        self.arm
            .resource_path(&format!("{}/{}", STORAGE_ACCOUNT_RESOURCE_TYPE, name))
    }

    fn parse_account(&self, data: &Value) -> Result<StorageAccount> {
        let name = str_at(data, "/name").ok_or_else(|| {
            AzstoreError::serialization("Storage account response has no name")
        })?;

        let public_network_access = match str_at(data, "/properties/publicNetworkAccess") {
            Some("Disabled") => Some(PublicNetworkAccess::Disabled),
            Some("Enabled") => Some(PublicNetworkAccess::Enabled),
            _ => None,
        };

        let tags = data
            .get("tags")
            .and_then(|t| t.as_object())
            .map(|tags| {
                tags.iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Ok(StorageAccount {
            id: str_at(data, "/id").unwrap_or_default().to_string(),
            name: name.to_string(),
            location: str_at(data, "/location").unwrap_or_default().to_string(),
            public_network_access,
            tags,
        })
    }
}

fn create_body(request: &StorageAccountCreateRequest) -> Value {
    let properties = match &request.security {
        Some(security) => json!({
            "supportsHttpsTrafficOnly": security.https_traffic_only,
            "allowBlobPublicAccess": security.allow_blob_public_access,
            "minimumTlsVersion": security.minimum_tls_version,
        }),
        None => json!({}),
    };

    json!({
        "location": request.location,
        "kind": request.kind.as_str(),
        "sku": { "name": request.sku },
        "tags": request.tags,
        "properties": properties,
    })
}

#[async_trait]
impl StorageAccountOperations for AzureStorageAccountOperations {
    async fn check_name_availability(&self, name: &str) -> Result<NameAvailability> {
        let path = self
            .arm
            .subscription_path("Microsoft.Storage/checkNameAvailability");
        let body = json!({ "name": name, "type": STORAGE_ACCOUNT_RESOURCE_TYPE });

        let data = self
            .arm
            .post("check name availability", &path, STORAGE_API_VERSION, Some(&body))
            .await?;

        let name_available = data
            .get("nameAvailable")
            .and_then(|v| v.as_bool())
            .ok_or_else(|| {
                AzstoreError::serialization("Name availability response has no nameAvailable")
            })?;

        Ok(NameAvailability {
            name_available,
            reason: str_at(&data, "/reason").map(|s| s.to_string()),
            message: str_at(&data, "/message").map(|s| s.to_string()),
        })
    }

    async fn create_account(&self, request: &StorageAccountCreateRequest) -> Result<StorageAccount> {
        info!(
            "creating storage account {} ({}, {}) in {}",
            request.name,
            request.kind.as_str(),
            request.sku,
            request.location
        );
        let path = self.account_path(&request.name);
        let data = self
            .arm
            .put("create storage account", &path, STORAGE_API_VERSION, &create_body(request))
            .await?;
        self.parse_account(&data)
    }

    async fn get_account(&self, name: &str) -> Result<StorageAccount> {
        let data = self
            .arm
            .get(&self.account_path(name), STORAGE_API_VERSION)
            .await
            .map_err(|e| e.or_not_found("StorageAccount", name))?;
        self.parse_account(&data)
    }

    async fn update_public_network_access(
        &self,
        name: &str,
        access: PublicNetworkAccess,
    ) -> Result<()> {
        info!(
            "setting public network access of storage account {} to {}",
            name,
            access.as_str()
        );
        let body = json!({ "properties": { "publicNetworkAccess": access.as_str() } });
        self.arm
            .patch("update storage account", &self.account_path(name), STORAGE_API_VERSION, &body)
            .await?;
        Ok(())
    }

    async fn list_keys(&self, name: &str) -> Result<Vec<AccountKey>> {
        let path = format!("{}/listKeys", self.account_path(name));
        let data = self
            .arm
            .post("list storage account keys", &path, STORAGE_API_VERSION, None)
            .await?;

        let keys = data
            .get("keys")
            .and_then(|k| k.as_array())
            .map(|keys| {
                keys.iter()
                    .filter_map(|key| {
                        Some(AccountKey {
                            key_name: str_at(key, "/keyName").unwrap_or_default().to_string(),
                            value: str_at(key, "/value")?.to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(keys)
    }

    async fn delete_account(&self, name: &str) -> Result<()> {
        info!("deleting storage account {}", name);
        self.arm
            .delete("delete storage account", &self.account_path(name), STORAGE_API_VERSION)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_create_body_for_registry_account() {
        let mut tags = BTreeMap::new();
        tags.insert("kubernetes.io_cluster.infra".to_string(), "owned".to_string());
        let request = StorageAccountCreateRequest::for_registry("acct", "eastus", tags, false);

        let body = create_body(&request);
        assert_eq!(body["kind"], "StorageV2");
        assert_eq!(body["sku"]["name"], "Standard_LRS");
        assert_eq!(body["properties"]["supportsHttpsTrafficOnly"], true);
        assert_eq!(body["properties"]["allowBlobPublicAccess"], false);
        assert_eq!(body["properties"]["minimumTlsVersion"], "TLS1_2");
        assert_eq!(body["tags"]["kubernetes.io_cluster.infra"], "owned");
    }

    #[test]
    fn test_create_body_for_legacy_kind() {
        let request = StorageAccountCreateRequest::for_registry("acct", "local", BTreeMap::new(), true);

        let body = create_body(&request);
        assert_eq!(body["kind"], "Storage");
        assert_eq!(body["properties"], json!({}));
    }
}
