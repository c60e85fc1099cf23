//! Azure resource identifiers

pub fn subnet_id(subscription_id: &str, resource_group: &str, vnet_name: &str, subnet_name: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Network/virtualNetworks/{}/subnets/{}",
        subscription_id, resource_group, vnet_name, subnet_name
    )
}

pub fn virtual_network_id(subscription_id: &str, resource_group: &str, vnet_name: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Network/virtualNetworks/{}",
        subscription_id, resource_group, vnet_name
    )
}

pub fn storage_account_id(subscription_id: &str, resource_group: &str, account_name: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Storage/storageAccounts/{}",
        subscription_id, resource_group, account_name
    )
}

pub fn private_dns_zone_id(subscription_id: &str, resource_group: &str, zone_name: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Network/privateDnsZones/{}",
        subscription_id, resource_group, zone_name
    )
}

/// Last segment of a resource id, i.e. the resource name
pub fn resource_name(id: &str) -> &str {
    id.trim_end_matches('/').rsplit('/').next().unwrap_or(id)
}
