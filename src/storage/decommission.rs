//! Storage teardown
//!
//! Reverses provisioning: container, isolation resources, then the account.
//! Resources that are already gone count as deleted, and every completed
//! step is reflected in the record and the condition right away so a later
//! invocation resumes where this one stopped.

use tracing::{info, warn};

use crate::config::record::{AzureStorageConfig, StorageState};
use crate::error::Result;
use crate::provider::ProviderClients;
use crate::storage::conditions::{report, ConditionStatus, StorageExistsReason};
use crate::storage::isolation::destroy_private_dns;
use crate::storage::probe;
use crate::storage::tolerate_not_found;

/// Apply `change` to the working config and to the spec and status of the
/// record.
fn record_change(config: &mut AzureStorageConfig, state: &mut StorageState, change: impl Fn(&mut AzureStorageConfig)) {
    change(config);
    change(&mut state.spec);
    if let Some(status) = state.status.as_mut() {
        change(status);
    }
}

/// Remove the private endpoint recorded in `config` together with its DNS
/// configuration. Works whether or not the account still exists.
async fn remove_private_network(
    clients: &ProviderClients,
    config: &mut AzureStorageConfig,
    state: &mut StorageState,
    account_name: &str,
) -> Result<()> {
    let Some(endpoint_name) = config.network_access.private_endpoint_name().map(str::to_string) else {
        return Ok(());
    };

    if let Err(e) = destroy_private_dns(clients, &endpoint_name, account_name).await {
        report(
            state,
            ConditionStatus::Unknown,
            StorageExistsReason::AzureError,
            format!("Unable to remove private dns configuration: {}", e),
        );
        return Err(e);
    }

    if let Err(e) = tolerate_not_found(clients.network.delete_private_endpoint(&endpoint_name).await) {
        report(
            state,
            ConditionStatus::Unknown,
            StorageExistsReason::AzureError,
            format!("Unable to delete private endpoint: {}", e),
        );
        return Err(e);
    }

    record_change(config, state, |c| {
        if let Some(internal) = c.network_access.internal_mut() {
            internal.private_endpoint_name.clear();
        }
    });
    Ok(())
}

/// Delete the storage named by `config`. The caller has checked that the
/// storage is managed and that an account is recorded.
pub async fn remove_storage(
    clients: &ProviderClients,
    config: &mut AzureStorageConfig,
    state: &mut StorageState,
) -> Result<()> {
    let account_name = config.account_name.clone();

    if !config.container.is_empty() {
        let key = match probe::primary_account_key(clients.accounts.as_ref(), &account_name).await {
            Ok(key) => key,
            Err(e) if e.is_not_found() => {
                warn!("storage account {} is already gone", account_name);
                remove_private_network(clients, config, state, &account_name).await?;
                record_change(config, state, |c| {
                    c.account_name.clear();
                    c.container.clear();
                });
                report(
                    state,
                    ConditionStatus::False,
                    StorageExistsReason::ContainerNotFound,
                    format!("Container has been already deleted: {}", e),
                );
                return Ok(());
            }
            Err(e) => {
                report(
                    state,
                    ConditionStatus::Unknown,
                    StorageExistsReason::AzureError,
                    format!("Unable to get account primary keys: {}", e),
                );
                return Err(e);
            }
        };

        let container = config.container.clone();
        if let Err(e) = tolerate_not_found(clients.containers.delete(&account_name, &key, &container).await) {
            report(
                state,
                ConditionStatus::Unknown,
                StorageExistsReason::AzureError,
                format!("Unable to delete storage container: {}", e),
            );
            return Err(e);
        }

        record_change(config, state, |c| c.container.clear());
        report(
            state,
            ConditionStatus::False,
            StorageExistsReason::ContainerDeleted,
            "Storage container has been deleted",
        );
    }

    remove_private_network(clients, config, state, &account_name).await?;

    if let Err(e) = tolerate_not_found(clients.accounts.delete_account(&account_name).await) {
        report(
            state,
            ConditionStatus::Unknown,
            StorageExistsReason::AzureError,
            format!("Unable to delete storage account: {}", e),
        );
        return Err(e);
    }

    info!("storage account {} deleted", account_name);
    record_change(config, state, |c| c.account_name.clear());
    report(
        state,
        ConditionStatus::False,
        StorageExistsReason::AccountDeleted,
        "Storage account has been deleted",
    );

    Ok(())
}
