//! Status conditions
//!
//! Every driver call ends by writing the `StorageExists` condition. Its
//! status is `True` when storage is in place, `False` when it is confirmed
//! absent or not configured and `Unknown` when a provider or configuration
//! error left the outcome undetermined.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::record::StorageState;

pub const STORAGE_EXISTS: &str = "StorageExists";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionStatus::True => write!(f, "True"),
            ConditionStatus::False => write!(f, "False"),
            ConditionStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Reasons reported on the `StorageExists` condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageExistsReason {
    #[serde(rename = "StorageNotConfigured")]
    NotConfigured,
    ConfigError,
    UserManaged,
    AzureError,
    ContainerNotFound,
    ContainerExists,
    ContainerDeleted,
    AccountDeleted,
}

impl StorageExistsReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageExistsReason::NotConfigured => "StorageNotConfigured",
            StorageExistsReason::ConfigError => "ConfigError",
            StorageExistsReason::UserManaged => "UserManaged",
            StorageExistsReason::AzureError => "AzureError",
            StorageExistsReason::ContainerNotFound => "ContainerNotFound",
            StorageExistsReason::ContainerExists => "ContainerExists",
            StorageExistsReason::ContainerDeleted => "ContainerDeleted",
            StorageExistsReason::AccountDeleted => "AccountDeleted",
        }
    }
}

impl fmt::Display for StorageExistsReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: ConditionStatus,
    pub reason: String,
    pub message: String,
    pub last_transition_time: DateTime<Utc>,
}

/// Something that holds status conditions
pub trait ConditionSink {
    fn conditions(&self) -> &[Condition];

    fn conditions_mut(&mut self) -> &mut Vec<Condition>;

    fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions()
            .iter()
            .find(|c| c.condition_type == condition_type)
    }

    /// Replace the condition of the same type. The transition time only
    /// moves when the status changes.
    fn update_condition(
        &mut self,
        condition_type: &str,
        status: ConditionStatus,
        reason: &str,
        message: &str,
    ) {
        let now = Utc::now();
        let conditions = self.conditions_mut();

        match conditions
            .iter_mut()
            .find(|c| c.condition_type == condition_type)
        {
            Some(existing) => {
                if existing.status != status {
                    existing.last_transition_time = now;
                }
                existing.status = status;
                existing.reason = reason.to_string();
                existing.message = message.to_string();
            }
            None => conditions.push(Condition {
                condition_type: condition_type.to_string(),
                status,
                reason: reason.to_string(),
                message: message.to_string(),
                last_transition_time: now,
            }),
        }
    }
}

impl ConditionSink for StorageState {
    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    fn conditions_mut(&mut self) -> &mut Vec<Condition> {
        &mut self.conditions
    }
}

/// Write the `StorageExists` condition
pub fn report<S: ConditionSink + ?Sized>(
    sink: &mut S,
    status: ConditionStatus,
    reason: StorageExistsReason,
    message: impl AsRef<str>,
) {
    let message = message.as_ref();
    debug!("{}: {} ({}): {}", STORAGE_EXISTS, status, reason, message);
    sink.update_condition(STORAGE_EXISTS, status, reason.as_str(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::record::AzureStorageConfig;

    #[test]
    fn test_not_configured_wire_name() {
        let json = serde_json::to_string(&StorageExistsReason::NotConfigured).unwrap();
        assert_eq!(json, "\"StorageNotConfigured\"");
        assert_eq!(StorageExistsReason::ContainerExists.to_string(), "ContainerExists");
    }

    #[test]
    fn test_update_replaces_same_type() {
        let mut state = StorageState::new(AzureStorageConfig::default());
        report(&mut state, ConditionStatus::Unknown, StorageExistsReason::AzureError, "boom");
        report(&mut state, ConditionStatus::True, StorageExistsReason::ContainerExists, "ok");

        assert_eq!(state.conditions.len(), 1);
        let condition = state.condition(STORAGE_EXISTS).unwrap();
        assert_eq!(condition.status, ConditionStatus::True);
        assert_eq!(condition.reason, "ContainerExists");
        assert_eq!(condition.message, "ok");
    }

    #[test]
    fn test_transition_time_kept_when_status_unchanged() {
        let mut state = StorageState::new(AzureStorageConfig::default());
        report(&mut state, ConditionStatus::False, StorageExistsReason::ContainerDeleted, "a");
        let first = state.condition(STORAGE_EXISTS).unwrap().last_transition_time;

        report(&mut state, ConditionStatus::False, StorageExistsReason::AccountDeleted, "b");
        let condition = state.condition(STORAGE_EXISTS).unwrap();
        assert_eq!(condition.last_transition_time, first);
        assert_eq!(condition.reason, "AccountDeleted");
    }
}
