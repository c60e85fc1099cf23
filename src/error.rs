use thiserror::Error;

/// Main error type for azstore operations
#[derive(Debug, Error)]
pub enum AzstoreError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Azure API error: {0}")]
    AzureApiError(String),

    #[error("Azure API error: HTTP {status} ({code}): {message}")]
    AzureResponseError {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{kind} not found: {name}")]
    ResourceNotFound { kind: String, name: String },

    #[error("Storage account not found: {name}: {details}")]
    AccountNotFound { name: String, details: String },

    #[error("Storage account name not available: {name} ({reason})")]
    NameNotAvailable { name: String, reason: String },

    #[error("Invalid resource name '{name}': {details}")]
    InvalidName { name: String, details: String },

    #[error("Operation '{operation}' failed with status {status}: {details}")]
    OperationFailed {
        operation: String,
        status: String,
        details: String,
    },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Operation '{operation}' timed out")]
    Timeout { operation: String },
}

impl AzstoreError {
    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::AuthenticationError(msg.into())
    }

    pub fn azure_api<S: Into<String>>(msg: S) -> Self {
        Self::AzureApiError(msg.into())
    }

    pub fn azure_response<C: Into<String>, M: Into<String>>(status: u16, code: C, message: M) -> Self {
        Self::AzureResponseError {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn not_found<K: Into<String>, N: Into<String>>(kind: K, name: N) -> Self {
        Self::ResourceNotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn account_not_found<N: Into<String>, D: Into<String>>(name: N, details: D) -> Self {
        Self::AccountNotFound {
            name: name.into(),
            details: details.into(),
        }
    }

    pub fn name_not_available<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Self::NameNotAvailable {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_name<N: Into<String>, D: Into<String>>(name: N, details: D) -> Self {
        Self::InvalidName {
            name: name.into(),
            details: details.into(),
        }
    }

    pub fn operation_failed<O: Into<String>, S: Into<String>, D: Into<String>>(
        operation: O,
        status: S,
        details: D,
    ) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            status: status.into(),
            details: details.into(),
        }
    }

    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::NetworkError(msg.into())
    }

    pub fn connection_timeout<S: Into<String>>(msg: S) -> Self {
        Self::ConnectionTimeout(msg.into())
    }

    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::SerializationError(msg.into())
    }

    pub fn timeout<S: Into<String>>(operation: S) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// True when the provider confirmed that the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::ResourceNotFound { .. } | Self::AccountNotFound { .. } => true,
            Self::AzureResponseError { status, code, .. } => {
                *status == 404 || code == "ResourceNotFound" || code == "NotFound"
            }
            _ => false,
        }
    }

    /// True when the provider rejected the request with a `Conflict` error code.
    ///
    /// Conflicts on virtual network links are not reported as HTTP 409, so the
    /// error code is what matters here.
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::AzureResponseError { status, code, .. } => *status == 409 || code == "Conflict",
            _ => false,
        }
    }

    /// Rewrites a provider 404 into a typed not-found error for `kind`/`name`.
    pub fn or_not_found<K: Into<String>, N: Into<String>>(self, kind: K, name: N) -> Self {
        if self.is_not_found() {
            Self::not_found(kind, name)
        } else {
            self
        }
    }
}

/// Result type alias for azstore operations
pub type Result<T> = std::result::Result<T, AzstoreError>;

/// Convert Azure Core errors to AzstoreError
impl From<azure_core::Error> for AzstoreError {
    fn from(error: azure_core::Error) -> Self {
        if let Some(http) = error.as_http_error() {
            return Self::AzureResponseError {
                status: u16::from(http.status()),
                code: http.error_code().unwrap_or_default().to_string(),
                message: error.to_string(),
            };
        }
        Self::AzureApiError(error.to_string())
    }
}
