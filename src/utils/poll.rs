//! Polling of long-running operations
//!
//! Azure Resource Manager accepts most writes asynchronously. This module
//! collapses "submit, then poll" into a single awaited call with a bounded
//! polling interval and total timeout.

use crate::error::{AzstoreError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

#[derive(Debug, Clone)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(180),
        }
    }
}

/// Outcome of a single poll
#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus<T> {
    Pending,
    Done(T),
}

/// Call `poll` until it reports `Done`, an error, or the timeout elapses.
///
/// Errors returned by `poll` are terminal; no retries happen here.
pub async fn poll_until_done<T, F, Fut>(
    operation: &str,
    mut poll: F,
    options: &PollOptions,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollStatus<T>>>,
{
    let deadline = Instant::now() + options.timeout;

    loop {
        if let PollStatus::Done(value) = poll().await? {
            return Ok(value);
        }

        if Instant::now() + options.interval > deadline {
            return Err(AzstoreError::timeout(operation));
        }
        sleep(options.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast() -> PollOptions {
        PollOptions {
            interval: Duration::from_millis(1),
            timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn test_returns_when_done() {
        let calls = AtomicUsize::new(0);
        let value = poll_until_done(
            "create account",
            || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Ok(PollStatus::Pending)
                } else {
                    Ok(PollStatus::Done(42))
                }
            },
            &fast(),
        )
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_error_is_terminal() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = poll_until_done(
            "create endpoint",
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AzstoreError::azure_api("Failed"))
            },
            &fast(),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_times_out() {
        let options = PollOptions {
            interval: Duration::from_millis(5),
            timeout: Duration::from_millis(20),
        };
        let result: Result<()> =
            poll_until_done("create zone", || async { Ok(PollStatus::Pending) }, &options).await;

        assert!(matches!(result, Err(AzstoreError::Timeout { ref operation }) if operation == "create zone"));
    }
}
