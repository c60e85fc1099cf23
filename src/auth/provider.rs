//! Authentication provider trait and implementations
//!
//! This module defines the authentication provider trait consumed by the
//! Azure Resource Manager clients and provides implementations for client
//! secret and default (environment, workload identity, managed identity)
//! credentials.

use async_trait::async_trait;
use azure_core::auth::{AccessToken, TokenCredential};
use azure_identity::{ClientSecretCredential, DefaultAzureCredential, TokenCredentialOptions};
use std::sync::Arc;
use tracing::debug;

use crate::config::cloud::CloudEnvironment;
use crate::config::settings::ClusterCredentials;
use crate::error::{AzstoreError, Result};

/// Trait for Azure authentication providers
#[async_trait]
pub trait AzureAuthProvider: Send + Sync {
    /// Get an access token for the specified scopes
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken>;

    /// Get the underlying token credential for Azure SDK usage
    fn get_token_credential(&self) -> Arc<dyn TokenCredential>;
}

/// Default Azure Credential Provider using DefaultAzureCredential
pub struct DefaultAzureCredentialProvider {
    credential: Arc<DefaultAzureCredential>,
}

impl DefaultAzureCredentialProvider {
    /// Create a new DefaultAzureCredentialProvider
    pub fn new() -> Result<Self> {
        let credential = Arc::new(
            DefaultAzureCredential::create(TokenCredentialOptions::default()).map_err(|e| {
                AzstoreError::authentication(format!(
                    "Failed to create DefaultAzureCredential: {}",
                    e
                ))
            })?,
        );

        Ok(Self { credential })
    }
}

#[async_trait]
impl AzureAuthProvider for DefaultAzureCredentialProvider {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken> {
        self.credential
            .get_token(scopes)
            .await
            .map_err(|e| AzstoreError::authentication(format!("Failed to get token: {}", e)))
    }

    fn get_token_credential(&self) -> Arc<dyn TokenCredential> {
        self.credential.clone()
    }
}

/// Client Secret Authentication Provider
pub struct ClientSecretProvider {
    credential: Arc<ClientSecretCredential>,
}

impl ClientSecretProvider {
    /// Create a new ClientSecretProvider against the authority of `environment`
    pub fn new(
        environment: &CloudEnvironment,
        tenant_id: String,
        client_id: String,
        client_secret: String,
    ) -> Result<Self> {
        let authority_url = url::Url::parse(&environment.active_directory_endpoint)
            .map_err(|e| AzstoreError::config(format!("Invalid authority URL: {}", e)))?;

        let credential = Arc::new(ClientSecretCredential::new(
            azure_core::new_http_client(),
            authority_url,
            tenant_id,
            client_id,
            client_secret,
        ));

        Ok(Self { credential })
    }
}

#[async_trait]
impl AzureAuthProvider for ClientSecretProvider {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken> {
        self.credential
            .get_token(scopes)
            .await
            .map_err(|e| AzstoreError::authentication(format!("Failed to get token: {}", e)))
    }

    fn get_token_credential(&self) -> Arc<dyn TokenCredential> {
        self.credential.clone()
    }
}

/// Authentication provider factory
pub struct AuthProviderFactory;

impl AuthProviderFactory {
    /// Create an authentication provider for the cluster credentials.
    ///
    /// A client secret selects [`ClientSecretProvider`]; otherwise the default
    /// credential chain is used, which picks up a federated token file from
    /// the environment.
    pub fn from_credentials(
        credentials: &ClusterCredentials,
        environment: &CloudEnvironment,
    ) -> Result<Arc<dyn AzureAuthProvider>> {
        match credentials.client_secret.as_deref() {
            Some(secret) if !secret.trim().is_empty() => {
                debug!("using client secret credentials for {}", credentials.client_id);
                Ok(Arc::new(ClientSecretProvider::new(
                    environment,
                    credentials.tenant_id.clone(),
                    credentials.client_id.clone(),
                    secret.to_string(),
                )?))
            }
            _ => {
                debug!("using default azure credential chain");
                Ok(Arc::new(DefaultAzureCredentialProvider::new()?))
            }
        }
    }
}
