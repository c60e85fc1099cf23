//! Azure Resource Manager REST client
//!
//! Thin wrapper over `reqwest` that signs requests with a bearer token for the
//! cloud's resource manager audience and completes long-running operations.
//! A write answered with `201`/`202` is followed through its
//! `Azure-AsyncOperation` or `Location` header until it settles.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::auth::AzureAuthProvider;
use crate::config::cloud::CloudEnvironment;
use crate::error::{AzstoreError, Result};
use crate::utils::network::{classify_network_error, create_http_client, HttpClientOptions};
use crate::utils::poll::{poll_until_done, PollOptions, PollStatus};

pub const STORAGE_API_VERSION: &str = "2023-01-01";
pub const NETWORK_API_VERSION: &str = "2023-09-01";
pub const PRIVATE_DNS_API_VERSION: &str = "2020-06-01";

const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";
const LOCATION_HEADER: &str = "location";

/// Resource manager client bound to one subscription and resource group
pub struct ArmClient {
    auth_provider: Arc<dyn AzureAuthProvider>,
    http_client: Client,
    endpoint: String,
    scope: String,
    subscription_id: String,
    resource_group: String,
    poll: PollOptions,
}

impl ArmClient {
    pub fn new(
        auth_provider: Arc<dyn AzureAuthProvider>,
        environment: &CloudEnvironment,
        subscription_id: String,
        resource_group: String,
        poll: PollOptions,
    ) -> Result<Self> {
        let http_client = create_http_client(&HttpClientOptions::default())?;

        Ok(Self {
            auth_provider,
            http_client,
            endpoint: environment.resource_manager_endpoint.trim_end_matches('/').to_string(),
            scope: environment.token_scope(),
            subscription_id,
            resource_group,
            poll,
        })
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn resource_group(&self) -> &str {
        &self.resource_group
    }

    /// Path of a resource in the client's resource group, `provider_path`
    /// being e.g. `Microsoft.Storage/storageAccounts/name`.
    pub fn resource_path(&self, provider_path: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}",
            self.subscription_id, self.resource_group, provider_path
        )
    }

    /// Path of a subscription level provider action
    pub fn subscription_path(&self, provider_path: &str) -> String {
        format!("/subscriptions/{}/providers/{}", self.subscription_id, provider_path)
    }

    fn build_url(&self, path: &str, api_version: &str) -> String {
        format!("{}{}?api-version={}", self.endpoint, path, api_version)
    }

    async fn create_headers(&self) -> Result<HeaderMap> {
        let token = self.auth_provider.get_token(&[self.scope.as_str()]).await?;
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token.token.secret())).map_err(|e| {
                AzstoreError::authentication(format!("Invalid token format: {}", e))
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Response> {
        let headers = self.create_headers().await?;
        let mut request = self.http_client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_network_error(&e, url))?;
        check_status(response).await
    }

    pub async fn get(&self, path: &str, api_version: &str) -> Result<Value> {
        let url = self.build_url(path, api_version);
        let response = self.send(Method::GET, &url, None).await?;
        read_json(response).await
    }

    /// Create or replace a resource and return its settled state
    pub async fn put(&self, operation: &str, path: &str, api_version: &str, body: &Value) -> Result<Value> {
        let url = self.build_url(path, api_version);
        debug!("PUT {}", path);
        let response = self.send(Method::PUT, &url, Some(body)).await?;

        match self.complete(operation, response).await? {
            Some(value) if !value.is_null() => Ok(value),
            _ => self.get(path, api_version).await,
        }
    }

    pub async fn patch(&self, operation: &str, path: &str, api_version: &str, body: &Value) -> Result<Value> {
        let url = self.build_url(path, api_version);
        debug!("PATCH {}", path);
        let response = self.send(Method::PATCH, &url, Some(body)).await?;

        match self.complete(operation, response).await? {
            Some(value) if !value.is_null() => Ok(value),
            _ => self.get(path, api_version).await,
        }
    }

    pub async fn post(
        &self,
        operation: &str,
        path: &str,
        api_version: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self.build_url(path, api_version);
        let response = self.send(Method::POST, &url, body).await?;
        Ok(self.complete(operation, response).await?.unwrap_or(Value::Null))
    }

    pub async fn delete(&self, operation: &str, path: &str, api_version: &str) -> Result<()> {
        let url = self.build_url(path, api_version);
        debug!("DELETE {}", path);
        let response = self.send(Method::DELETE, &url, None).await?;
        self.complete(operation, response).await?;
        Ok(())
    }

    /// Wait for a long-running operation started by `response`.
    ///
    /// Returns the final body when one is available, `None` when the caller
    /// has to read the resource again.
    async fn complete(&self, operation: &str, response: Response) -> Result<Option<Value>> {
        let status = response.status().as_u16();
        if status == 201 || status == 202 {
            if let Some(url) = header_value(response.headers(), ASYNC_OPERATION_HEADER) {
                self.poll_async_operation(operation, &url).await?;
                return Ok(None);
            }
            if let Some(url) = header_value(response.headers(), LOCATION_HEADER) {
                return self.poll_location(operation, &url).await.map(Some);
            }
        }

        read_json(response).await.map(Some)
    }

    async fn poll_async_operation(&self, operation: &str, url: &str) -> Result<()> {
        debug!("waiting for {} to complete", operation);
        poll_until_done(
            operation,
            || async {
                let response = self.send(Method::GET, url, None).await?;
                let status = response.status().as_u16();
                let body = read_json(response).await?;
                operation_status(operation, status, &body)
            },
            &self.poll,
        )
        .await
    }

    async fn poll_location(&self, operation: &str, url: &str) -> Result<Value> {
        debug!("waiting for {} to complete", operation);
        poll_until_done(
            operation,
            || async {
                let response = self.send(Method::GET, url, None).await?;
                if response.status().as_u16() == 202 {
                    return Ok(PollStatus::Pending);
                }
                Ok(PollStatus::Done(read_json(response).await?))
            },
            &self.poll,
        )
        .await
    }
}

/// Interpret the body of an `Azure-AsyncOperation` status resource
fn operation_status(operation: &str, http_status: u16, body: &Value) -> Result<PollStatus<()>> {
    let status = body
        .get("status")
        .and_then(|s| s.as_str())
        .unwrap_or("InProgress");

    match status {
        "Succeeded" => Ok(PollStatus::Done(())),
        "Failed" | "Canceled" => match body.get("error") {
            Some(error) => Err(AzstoreError::azure_response(
                http_status,
                error.get("code").and_then(|c| c.as_str()).unwrap_or_default(),
                error.get("message").and_then(|m| m.as_str()).unwrap_or_default(),
            )),
            None => Err(AzstoreError::operation_failed(
                operation,
                status,
                "no error details returned",
            )),
        },
        _ => Ok(PollStatus::Pending),
    }
}

async fn check_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(parse_azure_error(status, &body))
}

async fn read_json(response: Response) -> Result<Value> {
    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| {
        AzstoreError::serialization(format!("Failed to parse resource manager response: {}", e))
    })
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

/// Parse an ARM error body of the form `{"error": {"code", "message"}}`
pub fn parse_azure_error(status: u16, body: &str) -> AzstoreError {
    if let Ok(error_json) = serde_json::from_str::<Value>(body) {
        if let Some(error) = error_json.get("error") {
            let code = error.get("code").and_then(|c| c.as_str()).unwrap_or_default();
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or_default();
            return AzstoreError::azure_response(status, code, message);
        }
    }
    AzstoreError::azure_response(status, "", body)
}

/// Read a string field at `pointer` (JSON pointer syntax)
pub(crate) fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(|v| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_azure_error_body() {
        let body = r#"{"error":{"code":"ResourceNotFound","message":"The Resource was not found."}}"#;
        let err = parse_azure_error(404, body);
        assert!(err.is_not_found());
        assert!(
            matches!(err, AzstoreError::AzureResponseError { ref code, .. } if code == "ResourceNotFound")
        );
    }

    #[test]
    fn test_parse_azure_error_plain_body() {
        let err = parse_azure_error(500, "upstream exploded");
        assert!(matches!(
            err,
            AzstoreError::AzureResponseError { status: 500, ref message, .. } if message == "upstream exploded"
        ));
    }

    #[test]
    fn test_operation_status() {
        assert_eq!(
            operation_status("op", 200, &json!({"status": "InProgress"})).unwrap(),
            PollStatus::Pending
        );
        assert_eq!(
            operation_status("op", 200, &json!({"status": "Succeeded"})).unwrap(),
            PollStatus::Done(())
        );

        let err = operation_status(
            "create link",
            200,
            &json!({"status": "Failed", "error": {"code": "Conflict", "message": "exists"}}),
        )
        .unwrap_err();
        assert!(err.is_conflict());

        let err = operation_status("create link", 200, &json!({"status": "Canceled"})).unwrap_err();
        assert!(matches!(err, AzstoreError::OperationFailed { .. }));
    }

    #[test]
    fn test_str_at() {
        let value = json!({"properties": {"publicNetworkAccess": "Disabled"}});
        assert_eq!(str_at(&value, "/properties/publicNetworkAccess"), Some("Disabled"));
        assert_eq!(str_at(&value, "/properties/missing"), None);
    }
}
