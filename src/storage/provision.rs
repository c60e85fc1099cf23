//! Storage account and container provisioning
//!
//! Every step is re-entrant: it probes first and creates only what is
//! missing, reporting whether anything was created.

use tracing::{debug, info};

use crate::config::cloud::CloudEnvironment;
use crate::config::record::{AzureStorageConfig, Infrastructure};
use crate::error::{AzstoreError, Result};
use crate::provider::models::{StorageAccountCreateRequest, TagSet};
use crate::provider::ProviderClients;
use crate::storage::isolation::{configure_private_network, refresh_private_dns};
use crate::storage::naming::{
    generate_account_name, generate_container_name, generate_private_endpoint_name,
    validate_account_name, validate_container_name,
};
use crate::storage::probe;

/// A resource name and whether this invocation created the resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssuredResource {
    pub name: String,
    pub created: bool,
}

/// Tags applied to resources this driver creates: the cluster ownership tag
/// plus the resource tags declared on the platform.
pub fn resource_tags(infra: &Infrastructure) -> TagSet {
    let mut tags = TagSet::new();
    tags.insert(
        format!("kubernetes.io_cluster.{}", infra.infrastructure_name),
        "owned".to_string(),
    );
    if let Some(azure) = &infra.azure {
        for (key, value) in &azure.resource_tags {
            debug!("user has provided storage account tag: {}: {}", key, value);
            tags.insert(key.clone(), value.clone());
        }
    }
    tags
}

/// Make sure the storage account exists.
///
/// A user supplied name that is taken is assumed to be the user's account. A
/// generated name that is taken is an error. `config` receives the account
/// name once the account is known to exist.
pub async fn assure_storage_account(
    clients: &ProviderClients,
    environment: &CloudEnvironment,
    config: &mut AzureStorageConfig,
    infra: &Infrastructure,
) -> Result<AssuredResource> {
    let generated = config.account_name.is_empty();
    let account_name = if generated {
        generate_account_name(&infra.infrastructure_name)
    } else {
        validate_account_name(&config.account_name)?;
        config.account_name.clone()
    };

    let availability = probe::account_exists(clients.accounts.as_ref(), &account_name).await?;
    if generated && !availability.name_available {
        return Err(AzstoreError::name_not_available(
            account_name,
            availability.reason.unwrap_or_else(|| "unknown".to_string()),
        ));
    }

    if !availability.name_available {
        debug!("storage account {} already exists", account_name);
        config.account_name = account_name.clone();
        return Ok(AssuredResource {
            name: account_name,
            created: false,
        });
    }

    let request = StorageAccountCreateRequest::for_registry(
        &account_name,
        &clients.scope.region,
        resource_tags(infra),
        environment.is_azure_stack(),
    );
    clients.accounts.create_account(&request).await?;
    config.account_name = account_name.clone();
    info!("storage account {} created", account_name);

    Ok(AssuredResource {
        name: account_name,
        created: true,
    })
}

/// Make sure an internal-only account is reachable through its private
/// endpoint. Does nothing for public access.
///
/// A freshly created account gets the whole isolation chain. An account that
/// already existed gets its endpoint created when missing and its private DNS
/// configured again, since an earlier invocation may have stopped anywhere in
/// the chain. `config` receives the private endpoint name.
pub async fn assure_private_network(
    clients: &ProviderClients,
    config: &mut AzureStorageConfig,
    infra: &Infrastructure,
    account: &AssuredResource,
) -> Result<()> {
    let Some(network) = config.network_access.internal_mut() else {
        return Ok(());
    };
    let tags = resource_tags(infra);

    if account.created {
        configure_private_network(clients, &account.name, &tags, network).await?;
        return Ok(());
    }

    let endpoint_name = if network.private_endpoint_name.is_empty() {
        generate_private_endpoint_name(&account.name)
    } else {
        network.private_endpoint_name.clone()
    };
    network.private_endpoint_name = endpoint_name.clone();

    match probe::find_private_endpoint(clients.network.as_ref(), &endpoint_name).await? {
        Some(endpoint) => {
            debug!("private endpoint {} already exists", endpoint_name);
            refresh_private_dns(clients, &endpoint, &account.name, &tags, network).await?;
        }
        None => {
            info!(
                "private endpoint {} of storage account {} is missing, configuring private network access",
                endpoint_name, account.name
            );
            configure_private_network(clients, &account.name, &tags, network).await?;
        }
    }
    Ok(())
}

/// Make sure the container exists in the account named by `config`.
pub async fn assure_container(
    clients: &ProviderClients,
    config: &AzureStorageConfig,
    infra: &Infrastructure,
) -> Result<AssuredResource> {
    if !config.container.is_empty() {
        validate_container_name(&config.container)?;
    }

    let account_name = &config.account_name;
    let key = probe::primary_account_key(clients.accounts.as_ref(), account_name).await?;

    if config.container.is_empty() {
        let container = generate_container_name(&infra.infrastructure_name)?;
        clients.containers.create(account_name, &key, &container).await?;
        return Ok(AssuredResource {
            name: container,
            created: true,
        });
    }

    if probe::container_exists(clients.containers.as_ref(), account_name, &key, &config.container).await? {
        debug!("storage container {} already exists", config.container);
        return Ok(AssuredResource {
            name: config.container.clone(),
            created: false,
        });
    }

    clients
        .containers
        .create(account_name, &key, &config.container)
        .await?;
    Ok(AssuredResource {
        name: config.container.clone(),
        created: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::record::AzurePlatformStatus;
    use std::collections::BTreeMap;

    #[test]
    fn test_resource_tags_merge_platform_tags() {
        let mut resource_tags_in = BTreeMap::new();
        resource_tags_in.insert("team".to_string(), "registry".to_string());
        let infra = Infrastructure {
            infrastructure_name: "mycluster-x7k2p".to_string(),
            azure: Some(AzurePlatformStatus {
                cloud_name: String::new(),
                resource_group_name: "rg".to_string(),
                resource_tags: resource_tags_in,
            }),
        };

        let tags = resource_tags(&infra);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags["kubernetes.io_cluster.mycluster-x7k2p"], "owned");
        assert_eq!(tags["team"], "registry");
    }

    #[test]
    fn test_resource_tags_without_platform_status() {
        let infra = Infrastructure {
            infrastructure_name: "infra".to_string(),
            azure: None,
        };
        assert_eq!(resource_tags(&infra).len(), 1);
    }
}
