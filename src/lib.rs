//! azstore - Azure Blob Storage provisioning for an image registry
//!
//! Creates the storage account and blob container an image registry stores
//! its data in, optionally reachable only through a private endpoint, reports
//! the outcome through a status condition, and removes everything again on
//! teardown.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod provider;
pub mod storage;
pub mod utils;

// Re-export commonly used types
pub use error::{AzstoreError, Result};
pub use storage::AzureStorageDriver;
