//! Azure storage driver
//!
//! Provisions and removes the storage account and blob container backing the
//! image registry, optionally reachable only through a private endpoint.

pub mod conditions;
pub mod decommission;
pub mod driver;
pub mod env;
pub mod isolation;
pub mod naming;
pub mod probe;
pub mod provision;

pub use conditions::{Condition, ConditionSink, ConditionStatus, StorageExistsReason, STORAGE_EXISTS};
pub use driver::AzureStorageDriver;
pub use env::EnvVar;
pub use provision::AssuredResource;

use crate::error::Result;

/// Treat a missing resource as already deleted
pub(crate) fn tolerate_not_found(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if e.is_not_found() => {
            tracing::debug!("ignoring missing resource: {}", e);
            Ok(())
        }
        other => other,
    }
}
