//! Private network isolation
//!
//! Reaching a storage account privately takes five resources, created in
//! this order: the private endpoint, the shared private DNS zone, an `A`
//! record for the account, a DNS zone group on the endpoint and a virtual
//! network link for the zone. A failure stops the chain where it is; nothing
//! is rolled back and re-running the chain converges.

use tracing::{debug, info};

use crate::config::record::InternalNetworkAccess;
use crate::error::{AzstoreError, Result};
use crate::provider::ids;
use crate::provider::models::{
    PrivateEndpoint, PrivateEndpointCreateRequest, TagSet, VirtualNetworkLinkRequest,
};
use crate::provider::ProviderClients;
use crate::storage::naming::generate_private_endpoint_name;
use crate::storage::tolerate_not_found;

pub const PRIVATE_DNS_ZONE_NAME: &str = "privatelink.blob.core.windows.net";
pub const PRIVATE_DNS_ZONE_LOCATION: &str = "global";
pub const A_RECORD_TTL: u32 = 10;
pub const BLOB_GROUP_ID: &str = "blob";

/// Name of the zone group (and its single zone config) on the endpoint
pub fn zone_group_name(zone_name: &str) -> String {
    zone_name.replace('.', "-")
}

fn vnet_resource_group<'a>(clients: &'a ProviderClients, network: &'a InternalNetworkAccess) -> &'a str {
    network
        .network_resource_group
        .as_deref()
        .filter(|rg| !rg.is_empty())
        .unwrap_or(&clients.scope.resource_group)
}

/// Create the private endpoint for `account` and configure private DNS for it.
///
/// The endpoint name is taken from `network`, or generated and written back
/// when none is recorded yet.
pub async fn configure_private_network(
    clients: &ProviderClients,
    account: &str,
    tags: &TagSet,
    network: &mut InternalNetworkAccess,
) -> Result<PrivateEndpoint> {
    if network.private_endpoint_name.is_empty() {
        network.private_endpoint_name = generate_private_endpoint_name(account);
    }

    let scope = &clients.scope;
    let vnet_rg = vnet_resource_group(clients, network).to_string();
    let endpoint_name = network.private_endpoint_name.clone();

    let request = PrivateEndpointCreateRequest {
        name: endpoint_name.clone(),
        location: scope.region.clone(),
        subnet_id: ids::subnet_id(
            &scope.subscription_id,
            &vnet_rg,
            &network.vnet_name,
            &network.subnet_name,
        ),
        private_link_resource_id: ids::storage_account_id(
            &scope.subscription_id,
            &scope.resource_group,
            account,
        ),
        group_ids: vec![BLOB_GROUP_ID.to_string()],
        network_interface_name: format!("{}-nic", endpoint_name),
        tags: tags.clone(),
    };

    info!(
        "configuring private network access for storage account {} through {}",
        account, endpoint_name
    );
    let endpoint = clients.network.create_private_endpoint(&request).await?;

    configure_private_dns(clients, &endpoint, &network.vnet_name, &vnet_rg, account, tags).await?;

    Ok(endpoint)
}

/// Configure private DNS for an endpoint that already exists, e.g. one left
/// behind by an invocation that failed before its DNS was complete. Every
/// step is create-or-update, so a complete configuration is left unchanged.
pub async fn refresh_private_dns(
    clients: &ProviderClients,
    endpoint: &PrivateEndpoint,
    account: &str,
    tags: &TagSet,
    network: &InternalNetworkAccess,
) -> Result<()> {
    let vnet_rg = vnet_resource_group(clients, network);
    configure_private_dns(clients, endpoint, &network.vnet_name, vnet_rg, account, tags).await
}

/// Private address of the interface Azure attached to the endpoint
async fn endpoint_address(clients: &ProviderClients, endpoint: &PrivateEndpoint) -> Result<String> {
    let nic_id = endpoint.network_interface_ids.first().ok_or_else(|| {
        AzstoreError::azure_api(format!(
            "private endpoint {} did not have any network interfaces",
            endpoint.name
        ))
    })?;

    let nic = clients
        .network
        .get_network_interface(ids::resource_name(nic_id))
        .await?;

    nic.private_ip_addresses.first().cloned().ok_or_else(|| {
        AzstoreError::azure_api(format!(
            "network interface {} did not have any IP configurations",
            nic.name
        ))
    })
}

/// Resolve the account's blob endpoint to the private endpoint inside
/// `vnet_name`.
pub async fn configure_private_dns(
    clients: &ProviderClients,
    endpoint: &PrivateEndpoint,
    vnet_name: &str,
    vnet_resource_group: &str,
    account: &str,
    tags: &TagSet,
) -> Result<()> {
    let scope = &clients.scope;

    clients
        .dns
        .create_or_update_zone(PRIVATE_DNS_ZONE_NAME, PRIVATE_DNS_ZONE_LOCATION, tags)
        .await?;

    let address = endpoint_address(clients, endpoint).await?;
    clients
        .dns
        .create_or_update_a_record(PRIVATE_DNS_ZONE_NAME, account, A_RECORD_TTL, &address)
        .await?;

    let zone_id = ids::private_dns_zone_id(
        &scope.subscription_id,
        &scope.resource_group,
        PRIVATE_DNS_ZONE_NAME,
    );
    clients
        .network
        .create_private_dns_zone_group(&endpoint.name, &zone_group_name(PRIVATE_DNS_ZONE_NAME), &zone_id)
        .await?;

    let link = VirtualNetworkLinkRequest {
        zone_name: PRIVATE_DNS_ZONE_NAME.to_string(),
        link_name: account.to_string(),
        location: PRIVATE_DNS_ZONE_LOCATION.to_string(),
        virtual_network_id: ids::virtual_network_id(&scope.subscription_id, vnet_resource_group, vnet_name),
        registration_enabled: false,
        tags: tags.clone(),
    };
    match clients.dns.create_or_update_vnet_link(&link).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_conflict() => {
            debug!("virtual network {} is already linked to {}: {}", vnet_name, PRIVATE_DNS_ZONE_NAME, e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Remove the DNS resources that belong to this registry alone. The shared
/// zone stays.
pub async fn destroy_private_dns(clients: &ProviderClients, endpoint_name: &str, account: &str) -> Result<()> {
    info!("removing private dns configuration of storage account {}", account);

    tolerate_not_found(clients.dns.delete_a_record(PRIVATE_DNS_ZONE_NAME, account).await)?;
    tolerate_not_found(
        clients
            .network
            .delete_private_dns_zone_group(endpoint_name, &zone_group_name(PRIVATE_DNS_ZONE_NAME))
            .await,
    )?;
    tolerate_not_found(clients.dns.delete_vnet_link(PRIVATE_DNS_ZONE_NAME, account).await)?;

    Ok(())
}
