//! Provider data models
//!
//! Requests and responses exchanged with the provider clients, reduced to the
//! fields the storage driver needs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type TagSet = BTreeMap<String, String>;

pub const STORAGE_ACCOUNT_RESOURCE_TYPE: &str = "Microsoft.Storage/storageAccounts";
pub const DEFAULT_SKU: &str = "Standard_LRS";
pub const MINIMUM_TLS_VERSION: &str = "TLS1_2";

/// Result of a storage account name availability check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameAvailability {
    pub name_available: bool,
    pub reason: Option<String>,
    pub message: Option<String>,
}

impl NameAvailability {
    pub fn available() -> Self {
        Self {
            name_available: true,
            reason: None,
            message: None,
        }
    }

    pub fn already_exists() -> Self {
        Self {
            name_available: false,
            reason: Some("AlreadyExists".to_string()),
            message: None,
        }
    }
}

/// Storage account kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageKind {
    /// General-purpose v2, the current kind.
    StorageV2,
    /// Legacy general-purpose v1, the only kind Azure Stack Hub supports.
    Storage,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::StorageV2 => "StorageV2",
            StorageKind::Storage => "Storage",
        }
    }
}

/// Storage account creation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageAccountCreateRequest {
    pub name: String,
    pub location: String,
    pub kind: StorageKind,
    pub sku: String,
    pub tags: TagSet,
    /// Security properties; `None` for the legacy kind, which rejects them.
    pub security: Option<StorageAccountSecurity>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageAccountSecurity {
    pub https_traffic_only: bool,
    pub allow_blob_public_access: bool,
    pub minimum_tls_version: String,
}

impl StorageAccountCreateRequest {
    /// Build the request for a new registry account
    pub fn for_registry(name: &str, location: &str, tags: TagSet, legacy_kind: bool) -> Self {
        if legacy_kind {
            return Self {
                name: name.to_string(),
                location: location.to_string(),
                kind: StorageKind::Storage,
                sku: DEFAULT_SKU.to_string(),
                tags,
                security: None,
            };
        }

        Self {
            name: name.to_string(),
            location: location.to_string(),
            kind: StorageKind::StorageV2,
            sku: DEFAULT_SKU.to_string(),
            tags,
            security: Some(StorageAccountSecurity {
                https_traffic_only: true,
                allow_blob_public_access: false,
                minimum_tls_version: MINIMUM_TLS_VERSION.to_string(),
            }),
        }
    }
}

/// Public network access setting of a storage account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublicNetworkAccess {
    Enabled,
    Disabled,
}

impl PublicNetworkAccess {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicNetworkAccess::Enabled => "Enabled",
            PublicNetworkAccess::Disabled => "Disabled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageAccount {
    pub id: String,
    pub name: String,
    pub location: String,
    pub public_network_access: Option<PublicNetworkAccess>,
    pub tags: TagSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountKey {
    pub key_name: String,
    pub value: String,
}

/// Private endpoint creation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateEndpointCreateRequest {
    pub name: String,
    pub location: String,
    pub subnet_id: String,
    pub private_link_resource_id: String,
    pub group_ids: Vec<String>,
    pub network_interface_name: String,
    pub tags: TagSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateEndpoint {
    pub id: String,
    pub name: String,
    /// Resource ids of the interfaces Azure attached to the endpoint
    pub network_interface_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    pub id: String,
    pub name: String,
    /// Private addresses of the IP configurations, in order
    pub private_ip_addresses: Vec<String>,
}

/// Virtual network link parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualNetworkLinkRequest {
    pub zone_name: String,
    pub link_name: String,
    pub location: String,
    pub virtual_network_id: String,
    pub registration_enabled: bool,
    pub tags: TagSet,
}
