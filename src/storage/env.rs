//! Registry environment
//!
//! Environment variables that point the registry at the provisioned storage.

use serde::Serialize;
use std::fmt;

pub use crate::config::settings::ACCOUNT_KEY_ENV;

pub const STORAGE_ENV: &str = "REGISTRY_STORAGE";
pub const CONTAINER_ENV: &str = "REGISTRY_STORAGE_AZURE_CONTAINER";
pub const ACCOUNT_NAME_ENV: &str = "REGISTRY_STORAGE_AZURE_ACCOUNTNAME";
pub const REALM_ENV: &str = "REGISTRY_STORAGE_AZURE_REALM";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
    /// Secret values belong in a secret store, not in plain configuration
    pub secret: bool,
}

impl EnvVar {
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            secret: false,
        }
    }

    pub fn secret(name: &str, value: impl Into<String>) -> Self {
        Self {
            secret: true,
            ..Self::new(name, value)
        }
    }

    /// Copy with the value hidden if it is secret
    pub fn masked(&self) -> Self {
        if !self.secret {
            return self.clone();
        }
        Self {
            value: "********".to_string(),
            ..self.clone()
        }
    }
}

impl fmt::Display for EnvVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}
