//! In-memory Azure used by the driver integration tests
//!
//! `FakeAzure` implements every provider trait over a shared state, records
//! each call in order and can be told to fail specific operations.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};
use zeroize::Zeroizing;

use azstore::config::cloud::CloudEnvironment;
use azstore::config::record::{
    AzurePlatformStatus, AzureStorageConfig, Infrastructure, InternalNetworkAccess, NetworkAccess,
    StorageState,
};
use azstore::config::settings::{ClusterCredentials, Settings};
use azstore::error::{AzstoreError, Result};
use azstore::provider::models::{
    AccountKey, NameAvailability, NetworkInterface, PrivateEndpoint, PrivateEndpointCreateRequest,
    PublicNetworkAccess, StorageAccount, StorageAccountCreateRequest, TagSet, VirtualNetworkLinkRequest,
};
use azstore::provider::{
    BlobContainerOperations, ClientFactory, NetworkOperations, PrivateDnsOperations, ProviderClients,
    ResourceScope, StorageAccountOperations,
};
use azstore::storage::{AzureStorageDriver, Condition, ConditionSink, STORAGE_EXISTS};

pub const SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000001";
pub const RESOURCE_GROUP: &str = "mycluster-rg";
pub const REGION: &str = "eastus";
pub const INFRA_NAME: &str = "mycluster-x7k2p";
pub const ENDPOINT_ADDRESS: &str = "10.0.1.4";

#[derive(Debug, Clone)]
pub struct FakeAccount {
    pub request: StorageAccountCreateRequest,
    pub public_network_access: PublicNetworkAccess,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub accounts: BTreeMap<String, FakeAccount>,
    /// Names owned by someone outside the subscription
    pub foreign_names: BTreeSet<String>,
    /// Report every account name as taken
    pub all_names_taken: bool,
    /// (account, container)
    pub containers: BTreeSet<(String, String)>,
    pub endpoints: BTreeMap<String, PrivateEndpointCreateRequest>,
    pub zones: BTreeSet<String>,
    /// (zone, relative name) -> address
    pub a_records: BTreeMap<(String, String), String>,
    /// (endpoint, group) -> zone id
    pub zone_groups: BTreeMap<(String, String), String>,
    pub vnet_links: BTreeMap<(String, String), VirtualNetworkLinkRequest>,
    pub calls: Vec<String>,
    /// operation -> (HTTP status, error code)
    pub failures: BTreeMap<String, (u16, String)>,
}

#[derive(Debug, Default)]
pub struct FakeAzure {
    state: Mutex<FakeState>,
}

fn not_found(kind: &str, name: &str) -> AzstoreError {
    AzstoreError::azure_response(404, "ResourceNotFound", format!("{} '{}' was not found", kind, name))
}

impl FakeAzure {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Calls whose operation name is `op`
    pub fn calls_to(&self, op: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.split(':').next() == Some(op))
            .collect()
    }

    /// Operation names in call order
    pub fn operations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|c| c.split(':').next().unwrap_or_default().to_string())
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn fail(&self, op: &str, status: u16, code: &str) {
        self.state().failures.insert(op.to_string(), (status, code.to_string()));
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    pub fn add_account(&self, name: &str) {
        let request = StorageAccountCreateRequest::for_registry(name, REGION, TagSet::new(), false);
        self.state().accounts.insert(
            name.to_string(),
            FakeAccount {
                request,
                public_network_access: PublicNetworkAccess::Enabled,
            },
        );
    }

    pub fn add_container(&self, account: &str, container: &str) {
        self.state()
            .containers
            .insert((account.to_string(), container.to_string()));
    }

    pub fn has_container(&self, account: &str, container: &str) -> bool {
        self.state()
            .containers
            .contains(&(account.to_string(), container.to_string()))
    }

    /// Record the call and return the injected failure for `op`, if any
    fn enter(&self, op: &str, args: &[&str]) -> Result<()> {
        let mut state = self.state();
        state.calls.push(format!("{}:{}", op, args.join(",")));
        match state.failures.get(op) {
            Some((status, code)) => Err(AzstoreError::azure_response(
                *status,
                code.clone(),
                format!("injected failure in {}", op),
            )),
            None => Ok(()),
        }
    }

    fn endpoint(name: &str, request: &PrivateEndpointCreateRequest) -> PrivateEndpoint {
        PrivateEndpoint {
            id: format!(
                "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Network/privateEndpoints/{}",
                SUBSCRIPTION, RESOURCE_GROUP, name
            ),
            name: name.to_string(),
            network_interface_ids: vec![format!(
                "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Network/networkInterfaces/{}",
                SUBSCRIPTION, RESOURCE_GROUP, request.network_interface_name
            )],
        }
    }
}

#[async_trait]
impl StorageAccountOperations for FakeAzure {
    async fn check_name_availability(&self, name: &str) -> Result<NameAvailability> {
        self.enter("check_name_availability", &[name])?;
        let state = self.state();
        if state.all_names_taken || state.accounts.contains_key(name) || state.foreign_names.contains(name) {
            Ok(NameAvailability::already_exists())
        } else {
            Ok(NameAvailability::available())
        }
    }

    async fn create_account(&self, request: &StorageAccountCreateRequest) -> Result<StorageAccount> {
        self.enter("create_account", &[&request.name])?;
        self.state().accounts.insert(
            request.name.clone(),
            FakeAccount {
                request: request.clone(),
                public_network_access: PublicNetworkAccess::Enabled,
            },
        );
        self.get_account_unlogged(&request.name)
    }

    async fn get_account(&self, name: &str) -> Result<StorageAccount> {
        self.enter("get_account", &[name])?;
        self.get_account_unlogged(name)
    }

    async fn update_public_network_access(&self, name: &str, access: PublicNetworkAccess) -> Result<()> {
        self.enter("update_public_network_access", &[name, access.as_str()])?;
        let mut state = self.state();
        let account = state
            .accounts
            .get_mut(name)
            .ok_or_else(|| not_found("Microsoft.Storage/storageAccounts", name))?;
        account.public_network_access = access;
        Ok(())
    }

    async fn list_keys(&self, name: &str) -> Result<Vec<AccountKey>> {
        self.enter("list_keys", &[name])?;
        if !self.state().accounts.contains_key(name) {
            return Err(not_found("Microsoft.Storage/storageAccounts", name));
        }
        Ok(vec![
            AccountKey {
                key_name: "key1".to_string(),
                value: format!("{}-key1", name),
            },
            AccountKey {
                key_name: "key2".to_string(),
                value: format!("{}-key2", name),
            },
        ])
    }

    async fn delete_account(&self, name: &str) -> Result<()> {
        self.enter("delete_account", &[name])?;
        let mut state = self.state();
        if state.accounts.remove(name).is_none() {
            return Err(not_found("Microsoft.Storage/storageAccounts", name));
        }
        state.containers.retain(|(account, _)| account != name);
        Ok(())
    }
}

impl FakeAzure {
    fn get_account_unlogged(&self, name: &str) -> Result<StorageAccount> {
        let state = self.state();
        let account = state
            .accounts
            .get(name)
            .ok_or_else(|| not_found("Microsoft.Storage/storageAccounts", name))?;
        Ok(StorageAccount {
            id: format!(
                "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Storage/storageAccounts/{}",
                SUBSCRIPTION, RESOURCE_GROUP, name
            ),
            name: name.to_string(),
            location: account.request.location.clone(),
            public_network_access: Some(account.public_network_access),
            tags: account.request.tags.clone(),
        })
    }
}

#[async_trait]
impl BlobContainerOperations for FakeAzure {
    async fn exists(&self, account: &str, key: &str, container: &str) -> Result<bool> {
        self.enter("container_exists", &[account, container])?;
        assert_eq!(key, format!("{}-key1", account), "container calls use the primary key");
        Ok(self.has_container(account, container))
    }

    async fn create(&self, account: &str, key: &str, container: &str) -> Result<()> {
        self.enter("create_container", &[account, container])?;
        assert_eq!(key, format!("{}-key1", account), "container calls use the primary key");
        self.add_container(account, container);
        Ok(())
    }

    async fn delete(&self, account: &str, _key: &str, container: &str) -> Result<()> {
        self.enter("delete_container", &[account, container])?;
        if !self
            .state()
            .containers
            .remove(&(account.to_string(), container.to_string()))
        {
            return Err(AzstoreError::azure_response(
                404,
                "ContainerNotFound",
                "The specified container does not exist.",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl NetworkOperations for FakeAzure {
    async fn get_private_endpoint(&self, name: &str) -> Result<PrivateEndpoint> {
        self.enter("get_private_endpoint", &[name])?;
        let state = self.state();
        let request = state
            .endpoints
            .get(name)
            .ok_or_else(|| not_found("Microsoft.Network/privateEndpoints", name))?;
        Ok(Self::endpoint(name, request))
    }

    async fn create_private_endpoint(&self, request: &PrivateEndpointCreateRequest) -> Result<PrivateEndpoint> {
        self.enter("create_private_endpoint", &[&request.name])?;
        self.state()
            .endpoints
            .insert(request.name.clone(), request.clone());
        Ok(Self::endpoint(&request.name, request))
    }

    async fn delete_private_endpoint(&self, name: &str) -> Result<()> {
        self.enter("delete_private_endpoint", &[name])?;
        if self.state().endpoints.remove(name).is_none() {
            return Err(not_found("Microsoft.Network/privateEndpoints", name));
        }
        Ok(())
    }

    async fn get_network_interface(&self, name: &str) -> Result<NetworkInterface> {
        self.enter("get_network_interface", &[name])?;
        let state = self.state();
        let known = state
            .endpoints
            .values()
            .any(|endpoint| endpoint.network_interface_name == name);
        if !known {
            return Err(not_found("Microsoft.Network/networkInterfaces", name));
        }
        Ok(NetworkInterface {
            id: format!("/networkInterfaces/{}", name),
            name: name.to_string(),
            private_ip_addresses: vec![ENDPOINT_ADDRESS.to_string()],
        })
    }

    async fn create_private_dns_zone_group(&self, endpoint_name: &str, group_name: &str, zone_id: &str) -> Result<()> {
        self.enter("create_private_dns_zone_group", &[endpoint_name, group_name])?;
        self.state()
            .zone_groups
            .insert((endpoint_name.to_string(), group_name.to_string()), zone_id.to_string());
        Ok(())
    }

    async fn delete_private_dns_zone_group(&self, endpoint_name: &str, group_name: &str) -> Result<()> {
        self.enter("delete_private_dns_zone_group", &[endpoint_name, group_name])?;
        let removed = self
            .state()
            .zone_groups
            .remove(&(endpoint_name.to_string(), group_name.to_string()));
        match removed {
            Some(_) => Ok(()),
            None => Err(not_found("privateDnsZoneGroups", group_name)),
        }
    }
}

#[async_trait]
impl PrivateDnsOperations for FakeAzure {
    async fn create_or_update_zone(&self, zone_name: &str, location: &str, _tags: &TagSet) -> Result<()> {
        self.enter("create_or_update_zone", &[zone_name, location])?;
        self.state().zones.insert(zone_name.to_string());
        Ok(())
    }

    async fn create_or_update_a_record(
        &self,
        zone_name: &str,
        relative_name: &str,
        ttl: u32,
        ipv4_address: &str,
    ) -> Result<()> {
        self.enter(
            "create_or_update_a_record",
            &[zone_name, relative_name, &ttl.to_string(), ipv4_address],
        )?;
        self.state().a_records.insert(
            (zone_name.to_string(), relative_name.to_string()),
            ipv4_address.to_string(),
        );
        Ok(())
    }

    async fn delete_a_record(&self, zone_name: &str, relative_name: &str) -> Result<()> {
        self.enter("delete_a_record", &[zone_name, relative_name])?;
        let removed = self
            .state()
            .a_records
            .remove(&(zone_name.to_string(), relative_name.to_string()));
        match removed {
            Some(_) => Ok(()),
            None => Err(not_found("A", relative_name)),
        }
    }

    async fn create_or_update_vnet_link(&self, request: &VirtualNetworkLinkRequest) -> Result<()> {
        self.enter("create_or_update_vnet_link", &[&request.zone_name, &request.link_name])?;
        self.state().vnet_links.insert(
            (request.zone_name.clone(), request.link_name.clone()),
            request.clone(),
        );
        Ok(())
    }

    async fn delete_vnet_link(&self, zone_name: &str, link_name: &str) -> Result<()> {
        self.enter("delete_vnet_link", &[zone_name, link_name])?;
        let removed = self
            .state()
            .vnet_links
            .remove(&(zone_name.to_string(), link_name.to_string()));
        match removed {
            Some(_) => Ok(()),
            None => Err(not_found("virtualNetworkLinks", link_name)),
        }
    }
}

/// Client factory handing out the fake for every client
pub struct FakeFactory {
    pub azure: Arc<FakeAzure>,
}

impl ClientFactory for FakeFactory {
    fn clients(&self, _environment: &CloudEnvironment, credentials: &ClusterCredentials) -> Result<ProviderClients> {
        Ok(ProviderClients {
            scope: ResourceScope::from(credentials),
            accounts: self.azure.clone(),
            containers: self.azure.clone(),
            network: self.azure.clone(),
            dns: self.azure.clone(),
        })
    }

    fn containers(&self, _environment: &CloudEnvironment) -> Result<Arc<dyn BlobContainerOperations>> {
        Ok(self.azure.clone())
    }
}

pub fn cluster_settings() -> Settings {
    Settings {
        subscription_id: SUBSCRIPTION.to_string(),
        tenant_id: "tenant".to_string(),
        client_id: "client".to_string(),
        client_secret: Some(Zeroizing::new("secret".to_string())),
        resource_group: RESOURCE_GROUP.to_string(),
        region: REGION.to_string(),
        ..Settings::default()
    }
}

pub fn user_managed_settings(key: &str) -> Settings {
    Settings {
        account_key: Some(Zeroizing::new(key.to_string())),
        ..Settings::default()
    }
}

pub fn infrastructure() -> Infrastructure {
    let mut resource_tags = std::collections::BTreeMap::new();
    resource_tags.insert("team".to_string(), "registry".to_string());
    Infrastructure {
        infrastructure_name: INFRA_NAME.to_string(),
        azure: Some(AzurePlatformStatus {
            cloud_name: "AzurePublicCloud".to_string(),
            resource_group_name: RESOURCE_GROUP.to_string(),
            resource_tags,
        }),
    }
}

pub fn internal_access(vnet: &str, subnet: &str) -> NetworkAccess {
    NetworkAccess::Internal {
        internal: InternalNetworkAccess {
            vnet_name: vnet.to_string(),
            subnet_name: subnet.to_string(),
            ..InternalNetworkAccess::default()
        },
    }
}

pub fn spec(account: &str, container: &str) -> AzureStorageConfig {
    AzureStorageConfig {
        account_name: account.to_string(),
        container: container.to_string(),
        ..AzureStorageConfig::default()
    }
}

/// Driver working on the spec of `state`, as one reconcile invocation would
pub fn driver(azure: &Arc<FakeAzure>, settings: Settings, state: &StorageState) -> AzureStorageDriver {
    AzureStorageDriver::new(
        state.spec.clone(),
        settings,
        Arc::new(FakeFactory { azure: azure.clone() }),
    )
}

pub fn storage_condition(state: &StorageState) -> Condition {
    state
        .condition(STORAGE_EXISTS)
        .cloned()
        .expect("StorageExists condition is set")
}
