//! Private DNS zone, record set and virtual network link operations
//! against the `Microsoft.Network/privateDnsZones` resource provider.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::provider::arm::{ArmClient, PRIVATE_DNS_API_VERSION};
use crate::provider::models::*;

/// Trait for private DNS operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PrivateDnsOperations: Send + Sync {
    async fn create_or_update_zone(&self, zone_name: &str, location: &str, tags: &TagSet) -> Result<()>;

    /// Create or replace an `A` record set holding a single address
    async fn create_or_update_a_record(
        &self,
        zone_name: &str,
        relative_name: &str,
        ttl: u32,
        ipv4_address: &str,
    ) -> Result<()>;

    async fn delete_a_record(&self, zone_name: &str, relative_name: &str) -> Result<()>;

    async fn create_or_update_vnet_link(&self, request: &VirtualNetworkLinkRequest) -> Result<()>;

    async fn delete_vnet_link(&self, zone_name: &str, link_name: &str) -> Result<()>;
}

/// Azure private DNS operations implementation
pub struct AzurePrivateDnsOperations {
    arm: Arc<ArmClient>,
}

impl AzurePrivateDnsOperations {
    pub fn new(arm: Arc<ArmClient>) -> Self {
        Self { arm }
    }

    fn zone_path(&self, zone_name: &str) -> String {
        self.arm
            .resource_path(&format!("Microsoft.Network/privateDnsZones/{}", zone_name))
    }

    fn a_record_path(&self, zone_name: &str, relative_name: &str) -> String {
        format!("{}/A/{}", self.zone_path(zone_name), relative_name)
    }

    fn vnet_link_path(&self, zone_name: &str, link_name: &str) -> String {
        format!("{}/virtualNetworkLinks/{}", self.zone_path(zone_name), link_name)
    }
}

#[async_trait]
impl PrivateDnsOperations for AzurePrivateDnsOperations {
    async fn create_or_update_zone(&self, zone_name: &str, location: &str, tags: &TagSet) -> Result<()> {
        info!("creating or updating private dns zone {}", zone_name);
        let body = json!({ "location": location, "tags": tags });
        self.arm
            .put("create private dns zone", &self.zone_path(zone_name), PRIVATE_DNS_API_VERSION, &body)
            .await?;
        Ok(())
    }

    async fn create_or_update_a_record(
        &self,
        zone_name: &str,
        relative_name: &str,
        ttl: u32,
        ipv4_address: &str,
    ) -> Result<()> {
        info!(
            "creating A record {}.{} -> {}",
            relative_name, zone_name, ipv4_address
        );
        let body = json!({
            "properties": {
                "ttl": ttl,
                "aRecords": [{ "ipv4Address": ipv4_address }]
            }
        });
        self.arm
            .put(
                "create record set",
                &self.a_record_path(zone_name, relative_name),
                PRIVATE_DNS_API_VERSION,
                &body,
            )
            .await?;
        Ok(())
    }

    async fn delete_a_record(&self, zone_name: &str, relative_name: &str) -> Result<()> {
        info!("deleting A record {}.{}", relative_name, zone_name);
        self.arm
            .delete(
                "delete record set",
                &self.a_record_path(zone_name, relative_name),
                PRIVATE_DNS_API_VERSION,
            )
            .await
    }

    async fn create_or_update_vnet_link(&self, request: &VirtualNetworkLinkRequest) -> Result<()> {
        info!(
            "linking private dns zone {} to {}",
            request.zone_name, request.virtual_network_id
        );
        let body = json!({
            "location": request.location,
            "tags": request.tags,
            "properties": {
                "registrationEnabled": request.registration_enabled,
                "virtualNetwork": { "id": request.virtual_network_id }
            }
        });
        self.arm
            .put(
                "create virtual network link",
                &self.vnet_link_path(&request.zone_name, &request.link_name),
                PRIVATE_DNS_API_VERSION,
                &body,
            )
            .await?;
        Ok(())
    }

    async fn delete_vnet_link(&self, zone_name: &str, link_name: &str) -> Result<()> {
        info!("deleting virtual network link {} from {}", link_name, zone_name);
        self.arm
            .delete(
                "delete virtual network link",
                &self.vnet_link_path(zone_name, link_name),
                PRIVATE_DNS_API_VERSION,
            )
            .await
    }
}
