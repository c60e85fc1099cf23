//! Read-only existence checks
//!
//! Each probe separates "present", "confirmed absent" and "could not tell".
//! Only the last one is an error.

use tracing::debug;

use crate::error::{AzstoreError, Result};
use crate::provider::models::{NameAvailability, PrivateEndpoint, PublicNetworkAccess};
use crate::provider::{BlobContainerOperations, NetworkOperations, StorageAccountOperations};

/// Check whether a storage account name is still free
pub async fn account_exists(
    accounts: &dyn StorageAccountOperations,
    name: &str,
) -> Result<NameAvailability> {
    let availability = accounts.check_name_availability(name).await?;
    debug!(
        "storage account name {} available: {} ({})",
        name,
        availability.name_available,
        availability.reason.as_deref().unwrap_or("-")
    );
    Ok(availability)
}

pub async fn container_exists(
    containers: &dyn BlobContainerOperations,
    account: &str,
    key: &str,
    container: &str,
) -> Result<bool> {
    if account.is_empty() || container.is_empty() {
        return Ok(false);
    }
    containers.exists(account, key, container).await
}

/// Look up a private endpoint; a missing endpoint is `Ok(None)`
pub async fn find_private_endpoint(
    network: &dyn NetworkOperations,
    name: &str,
) -> Result<Option<PrivateEndpoint>> {
    match network.get_private_endpoint(name).await {
        Ok(endpoint) => Ok(Some(endpoint)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Fetch the primary access key of an account.
///
/// A missing account yields [`AzstoreError::AccountNotFound`] so callers can
/// tell "already deleted" apart from transient failures.
pub async fn primary_account_key(accounts: &dyn StorageAccountOperations, name: &str) -> Result<String> {
    let keys = accounts.list_keys(name).await.map_err(|e| {
        if e.is_not_found() {
            AzstoreError::account_not_found(name, e.to_string())
        } else {
            e
        }
    })?;

    keys.into_iter()
        .next()
        .map(|key| key.value)
        .ok_or_else(|| AzstoreError::azure_api(format!("storage account {} has no access keys", name)))
}

/// True only when the account reports public network access as disabled.
/// Lookup failures count as public.
pub async fn is_account_private(accounts: &dyn StorageAccountOperations, name: &str) -> bool {
    match accounts.get_account(name).await {
        Ok(account) => account.public_network_access == Some(PublicNetworkAccess::Disabled),
        Err(e) => {
            debug!("unable to read storage account {}: {}", name, e);
            false
        }
    }
}
