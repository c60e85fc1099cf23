//! Azure cloud environments
//!
//! Maps a cloud name as reported by the cluster platform to the endpoints the
//! provider clients need.

use serde::{Deserialize, Serialize};

use crate::error::{AzstoreError, Result};

pub const AZURE_STACK_CLOUD: &str = "AzureStackCloud";

/// Endpoints of one Azure cloud
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudEnvironment {
    pub name: String,
    pub resource_manager_endpoint: String,
    pub active_directory_endpoint: String,
    pub token_audience: String,
    pub storage_endpoint_suffix: String,
}

/// Endpoints for clouds that are not built in (Azure Stack Hub)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCloudEndpoints {
    pub resource_manager_endpoint: String,
    pub active_directory_endpoint: String,
    pub token_audience: String,
    pub storage_endpoint_suffix: String,
}

impl CloudEnvironment {
    pub fn public() -> Self {
        Self {
            name: "AzurePublicCloud".to_string(),
            resource_manager_endpoint: "https://management.azure.com".to_string(),
            active_directory_endpoint: "https://login.microsoftonline.com".to_string(),
            token_audience: "https://management.azure.com".to_string(),
            storage_endpoint_suffix: "core.windows.net".to_string(),
        }
    }

    pub fn us_government() -> Self {
        Self {
            name: "AzureUSGovernmentCloud".to_string(),
            resource_manager_endpoint: "https://management.usgovcloudapi.net".to_string(),
            active_directory_endpoint: "https://login.microsoftonline.us".to_string(),
            token_audience: "https://management.usgovcloudapi.net".to_string(),
            storage_endpoint_suffix: "core.usgovcloudapi.net".to_string(),
        }
    }

    pub fn china() -> Self {
        Self {
            name: "AzureChinaCloud".to_string(),
            resource_manager_endpoint: "https://management.chinacloudapi.cn".to_string(),
            active_directory_endpoint: "https://login.chinacloudapi.cn".to_string(),
            token_audience: "https://management.chinacloudapi.cn".to_string(),
            storage_endpoint_suffix: "core.chinacloudapi.cn".to_string(),
        }
    }

    pub fn german() -> Self {
        Self {
            name: "AzureGermanCloud".to_string(),
            resource_manager_endpoint: "https://management.microsoftazure.de".to_string(),
            active_directory_endpoint: "https://login.microsoftonline.de".to_string(),
            token_audience: "https://management.microsoftazure.de".to_string(),
            storage_endpoint_suffix: "core.cloudapi.de".to_string(),
        }
    }

    /// Resolve a cloud by name. An empty name is the public cloud.
    ///
    /// Azure Stack Hub has no well-known endpoints, so it requires `custom`.
    pub fn from_name(name: &str, custom: Option<&CustomCloudEndpoints>) -> Result<Self> {
        if name.is_empty() {
            return Ok(Self::public());
        }

        match name.to_uppercase().as_str() {
            "AZUREPUBLICCLOUD" => Ok(Self::public()),
            "AZUREUSGOVERNMENTCLOUD" => Ok(Self::us_government()),
            "AZURECHINACLOUD" => Ok(Self::china()),
            "AZUREGERMANCLOUD" => Ok(Self::german()),
            "AZURESTACKCLOUD" => {
                let custom = custom.ok_or_else(|| {
                    AzstoreError::config(
                        "AzureStackCloud requires custom cloud endpoints in the settings",
                    )
                })?;
                Ok(Self {
                    name: AZURE_STACK_CLOUD.to_string(),
                    resource_manager_endpoint: custom.resource_manager_endpoint.clone(),
                    active_directory_endpoint: custom.active_directory_endpoint.clone(),
                    token_audience: custom.token_audience.clone(),
                    storage_endpoint_suffix: custom.storage_endpoint_suffix.clone(),
                })
            }
            _ => Err(AzstoreError::config(format!(
                "autorest/azure: There is no cloud environment matching the name \"{}\"",
                name
            ))),
        }
    }

    /// Azure Stack Hub does not support the current storage account API.
    pub fn is_azure_stack(&self) -> bool {
        self.name.eq_ignore_ascii_case(AZURE_STACK_CLOUD)
    }

    /// Scope used to request ARM tokens
    pub fn token_scope(&self) -> String {
        let audience = self.token_audience.trim_end_matches('/');
        if audience.ends_with("/.default") {
            audience.to_string()
        } else {
            format!("{}/.default", audience)
        }
    }

    /// Blob service endpoint for a storage account
    pub fn blob_service_url(&self, account_name: &str) -> String {
        format!("https://{}.blob.{}", account_name, self.storage_endpoint_suffix)
    }
}
