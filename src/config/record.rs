//! Desired and observed storage state
//!
//! `StorageState` is the record a reconcile invocation reads and writes: the
//! desired storage configuration (`spec`), the last applied one (`status`),
//! the management state and the status conditions. Generated names are
//! written back here so later invocations treat them as provided.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;
use crate::storage::conditions::Condition;

/// Whether the operator owns the lifecycle of the storage resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManagementState {
    Managed,
    Unmanaged,
}

/// Internal (private endpoint) network access parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InternalNetworkAccess {
    pub vnet_name: String,
    pub subnet_name: String,
    /// Resource group holding the virtual network, defaults to the cluster one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_resource_group: Option<String>,
    /// Recorded once the endpoint name has been chosen
    #[serde(skip_serializing_if = "String::is_empty")]
    pub private_endpoint_name: String,
}

/// How the registry reaches its storage account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NetworkAccess {
    #[default]
    External,
    Internal {
        #[serde(default)]
        internal: InternalNetworkAccess,
    },
}

impl NetworkAccess {
    pub fn is_internal(&self) -> bool {
        matches!(self, NetworkAccess::Internal { .. })
    }

    pub fn internal(&self) -> Option<&InternalNetworkAccess> {
        match self {
            NetworkAccess::Internal { internal } => Some(internal),
            NetworkAccess::External => None,
        }
    }

    pub fn internal_mut(&mut self) -> Option<&mut InternalNetworkAccess> {
        match self {
            NetworkAccess::Internal { internal } => Some(internal),
            NetworkAccess::External => None,
        }
    }

    /// Name of the private endpoint recorded for this storage, if any
    pub fn private_endpoint_name(&self) -> Option<&str> {
        self.internal()
            .map(|i| i.private_endpoint_name.as_str())
            .filter(|name| !name.is_empty())
    }
}

/// Azure storage configuration of the registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AzureStorageConfig {
    pub account_name: String,
    pub container: String,
    pub cloud_name: String,
    pub network_access: NetworkAccess,
}

/// Storage section of the registry state record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageState {
    pub spec: AzureStorageConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AzureStorageConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub management_state: Option<ManagementState>,
    pub conditions: Vec<Condition>,
}

impl StorageState {
    pub fn new(spec: AzureStorageConfig) -> Self {
        Self {
            spec,
            ..Self::default()
        }
    }

    pub fn is_managed(&self) -> bool {
        self.management_state == Some(ManagementState::Managed)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;
        Ok(())
    }
}

/// Azure specific platform status of the cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AzurePlatformStatus {
    pub cloud_name: String,
    pub resource_group_name: String,
    /// User declared tags applied to resources created for the cluster
    pub resource_tags: BTreeMap<String, String>,
}

/// Read-only cluster infrastructure metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Infrastructure {
    pub infrastructure_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzurePlatformStatus>,
}

impl Infrastructure {
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_access_serialization() {
        let access = NetworkAccess::Internal {
            internal: InternalNetworkAccess {
                vnet_name: "vnet".to_string(),
                subnet_name: "workers".to_string(),
                ..InternalNetworkAccess::default()
            },
        };
        let json = serde_json::to_value(&access).unwrap();
        assert_eq!(json["type"], "Internal");
        assert_eq!(json["internal"]["vnetName"], "vnet");
        assert!(json["internal"].get("privateEndpointName").is_none());

        let parsed: NetworkAccess = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, access);
    }

    #[test]
    fn test_missing_fields_default() {
        let state: StorageState =
            serde_json::from_str(r#"{"spec": {"accountName": "acct1"}}"#).unwrap();
        assert_eq!(state.spec.account_name, "acct1");
        assert_eq!(state.spec.network_access, NetworkAccess::External);
        assert!(state.management_state.is_none());
        assert!(state.conditions.is_empty());
    }

    #[test]
    fn test_private_endpoint_name_ignores_empty() {
        let mut access = NetworkAccess::Internal {
            internal: InternalNetworkAccess::default(),
        };
        assert_eq!(access.private_endpoint_name(), None);

        access.internal_mut().unwrap().private_endpoint_name = "acct-pe".to_string();
        assert_eq!(access.private_endpoint_name(), Some("acct-pe"));
        assert_eq!(NetworkAccess::External.private_endpoint_name(), None);
    }

    #[tokio::test]
    async fn test_state_file_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut state = StorageState::new(AzureStorageConfig {
            account_name: "acct1".to_string(),
            container: "c1".to_string(),
            ..AzureStorageConfig::default()
        });
        state.management_state = Some(ManagementState::Managed);
        state.save(&path).await.unwrap();

        let loaded = StorageState::load(&path).await.unwrap();
        assert_eq!(loaded, state);
    }
}
