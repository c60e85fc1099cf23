//! Private endpoint, network interface and private DNS zone group operations
//! against the `Microsoft.Network` resource provider.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::error::{AzstoreError, Result};
use crate::provider::arm::{str_at, ArmClient, NETWORK_API_VERSION};
use crate::provider::models::*;

/// Trait for network operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NetworkOperations: Send + Sync {
    async fn get_private_endpoint(&self, name: &str) -> Result<PrivateEndpoint>;

    /// Create a private endpoint and wait for it to be provisioned
    async fn create_private_endpoint(
        &self,
        request: &PrivateEndpointCreateRequest,
    ) -> Result<PrivateEndpoint>;

    async fn delete_private_endpoint(&self, name: &str) -> Result<()>;

    async fn get_network_interface(&self, name: &str) -> Result<NetworkInterface>;

    /// Attach a zone group referencing `zone_id` to a private endpoint
    async fn create_private_dns_zone_group(
        &self,
        endpoint_name: &str,
        group_name: &str,
        zone_id: &str,
    ) -> Result<()>;

    async fn delete_private_dns_zone_group(&self, endpoint_name: &str, group_name: &str) -> Result<()>;
}

/// Azure network operations implementation
pub struct AzureNetworkOperations {
    arm: Arc<ArmClient>,
}

impl AzureNetworkOperations {
    pub fn new(arm: Arc<ArmClient>) -> Self {
        Self { arm }
    }

    fn endpoint_path(&self, name: &str) -> String {
        self.arm
            .resource_path(&format!("Microsoft.Network/privateEndpoints/{}", name))
    }

    fn zone_group_path(&self, endpoint_name: &str, group_name: &str) -> String {
        format!(
            "{}/privateDnsZoneGroups/{}",
            self.endpoint_path(endpoint_name),
            group_name
        )
    }
}

fn parse_private_endpoint(data: &Value) -> Result<PrivateEndpoint> {
    let name = str_at(data, "/name")
        .ok_or_else(|| AzstoreError::serialization("Private endpoint response has no name"))?;

    let network_interface_ids = data
        .pointer("/properties/networkInterfaces")
        .and_then(|n| n.as_array())
        .map(|nics| {
            nics.iter()
                .filter_map(|nic| str_at(nic, "/id").map(|id| id.to_string()))
                .collect()
        })
        .unwrap_or_default();

    Ok(PrivateEndpoint {
        id: str_at(data, "/id").unwrap_or_default().to_string(),
        name: name.to_string(),
        network_interface_ids,
    })
}

fn parse_network_interface(data: &Value) -> Result<NetworkInterface> {
    let name = str_at(data, "/name")
        .ok_or_else(|| AzstoreError::serialization("Network interface response has no name"))?;

    let private_ip_addresses = data
        .pointer("/properties/ipConfigurations")
        .and_then(|c| c.as_array())
        .map(|configs| {
            configs
                .iter()
                .filter_map(|c| str_at(c, "/properties/privateIPAddress").map(|ip| ip.to_string()))
                .collect()
        })
        .unwrap_or_default();

    Ok(NetworkInterface {
        id: str_at(data, "/id").unwrap_or_default().to_string(),
        name: name.to_string(),
        private_ip_addresses,
    })
}

fn private_endpoint_body(request: &PrivateEndpointCreateRequest) -> Value {
    json!({
        "location": request.location,
        "tags": request.tags,
        "properties": {
            "customNetworkInterfaceName": request.network_interface_name,
            "subnet": { "id": request.subnet_id },
            "privateLinkServiceConnections": [{
                "name": request.name,
                "properties": {
                    "privateLinkServiceId": request.private_link_resource_id,
                    "groupIds": request.group_ids,
                }
            }]
        }
    })
}

#[async_trait]
impl NetworkOperations for AzureNetworkOperations {
    async fn get_private_endpoint(&self, name: &str) -> Result<PrivateEndpoint> {
        let data = self
            .arm
            .get(&self.endpoint_path(name), NETWORK_API_VERSION)
            .await
            .map_err(|e| e.or_not_found("PrivateEndpoint", name))?;
        parse_private_endpoint(&data)
    }

    async fn create_private_endpoint(
        &self,
        request: &PrivateEndpointCreateRequest,
    ) -> Result<PrivateEndpoint> {
        info!(
            "creating private endpoint {} in subnet {}",
            request.name, request.subnet_id
        );
        let data = self
            .arm
            .put(
                "create private endpoint",
                &self.endpoint_path(&request.name),
                NETWORK_API_VERSION,
                &private_endpoint_body(request),
            )
            .await?;
        parse_private_endpoint(&data)
    }

    async fn delete_private_endpoint(&self, name: &str) -> Result<()> {
        info!("deleting private endpoint {}", name);
        self.arm
            .delete("delete private endpoint", &self.endpoint_path(name), NETWORK_API_VERSION)
            .await
    }

    async fn get_network_interface(&self, name: &str) -> Result<NetworkInterface> {
        let path = self
            .arm
            .resource_path(&format!("Microsoft.Network/networkInterfaces/{}", name));
        let data = self
            .arm
            .get(&path, NETWORK_API_VERSION)
            .await
            .map_err(|e| e.or_not_found("NetworkInterface", name))?;
        parse_network_interface(&data)
    }

    async fn create_private_dns_zone_group(
        &self,
        endpoint_name: &str,
        group_name: &str,
        zone_id: &str,
    ) -> Result<()> {
        info!(
            "creating private dns zone group {} on endpoint {}",
            group_name, endpoint_name
        );
        let body = json!({
            "properties": {
                "privateDnsZoneConfigs": [{
                    "name": group_name,
                    "properties": { "privateDnsZoneId": zone_id }
                }]
            }
        });
        self.arm
            .put(
                "create private dns zone group",
                &self.zone_group_path(endpoint_name, group_name),
                NETWORK_API_VERSION,
                &body,
            )
            .await?;
        Ok(())
    }

    async fn delete_private_dns_zone_group(&self, endpoint_name: &str, group_name: &str) -> Result<()> {
        info!(
            "deleting private dns zone group {} from endpoint {}",
            group_name, endpoint_name
        );
        self.arm
            .delete(
                "delete private dns zone group",
                &self.zone_group_path(endpoint_name, group_name),
                NETWORK_API_VERSION,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_private_endpoint_interfaces() {
        let data = json!({
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/privateEndpoints/acct-pe",
            "name": "acct-pe",
            "properties": {
                "networkInterfaces": [
                    { "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/networkInterfaces/acct-pe-nic" }
                ]
            }
        });

        let endpoint = parse_private_endpoint(&data).unwrap();
        assert_eq!(endpoint.name, "acct-pe");
        assert_eq!(endpoint.network_interface_ids.len(), 1);
    }

    #[test]
    fn test_parse_network_interface_addresses() {
        let data = json!({
            "name": "acct-pe-nic",
            "properties": {
                "ipConfigurations": [
                    { "name": "ipconfig1", "properties": { "privateIPAddress": "10.0.1.4" } }
                ]
            }
        });

        let nic = parse_network_interface(&data).unwrap();
        assert_eq!(nic.private_ip_addresses, vec!["10.0.1.4".to_string()]);
    }

    #[test]
    fn test_private_endpoint_body() {
        let request = PrivateEndpointCreateRequest {
            name: "acct-pe".to_string(),
            location: "eastus".to_string(),
            subnet_id: "/subnets/workers".to_string(),
            private_link_resource_id: "/storageAccounts/acct".to_string(),
            group_ids: vec!["blob".to_string()],
            network_interface_name: "acct-pe-nic".to_string(),
            tags: TagSet::new(),
        };

        let body = private_endpoint_body(&request);
        assert_eq!(body["properties"]["customNetworkInterfaceName"], "acct-pe-nic");
        assert_eq!(
            body["properties"]["privateLinkServiceConnections"][0]["properties"]["groupIds"][0],
            "blob"
        );
    }
}
