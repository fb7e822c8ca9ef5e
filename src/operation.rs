//! Bounded polling of long-running media generations.
//!
//! `Submitted -> Polling(n) -> Succeeded | Failed`. The loop sleeps for the
//! policy interval before every check, gives up after `max_attempts` checks
//! or once the optional deadline passes, and stops early when the shared
//! cancel flag is raised.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info, warn};

use crate::data_uri::DataUri;
use crate::provider::{ModelClient, OperationHandle, OperationStatus, ProviderError};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;
const CANCEL_CHECK_SLICE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            deadline: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Submitted,
    Polling { attempt: u32 },
    Succeeded,
    Failed,
}

impl OperationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationState::Submitted => "submitted",
            OperationState::Polling { .. } => "polling",
            OperationState::Succeeded => "succeeded",
            OperationState::Failed => "failed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("operation {name} failed: {reason}")]
    Failed { name: String, reason: String },
    #[error("operation {name} still running after {attempts} checks")]
    Exhausted { name: String, attempts: u32 },
    #[error("operation {name} missed its {deadline:?} deadline")]
    DeadlineExceeded { name: String, deadline: Duration },
    #[error("operation {name} was cancelled")]
    Cancelled { name: String },
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Sleeps for `duration`, waking early if `cancel` is raised. Returns false
/// when cancelled.
async fn sleep_unless_cancelled(duration: Duration, cancel: &AtomicBool) -> bool {
    let until = Instant::now() + duration;
    loop {
        if cancel.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= until {
            return true;
        }
        sleep((until - now).min(CANCEL_CHECK_SLICE)).await;
    }
}

pub async fn poll_until_done(
    client: &dyn ModelClient,
    handle: &OperationHandle,
    policy: PollPolicy,
    cancel: Arc<AtomicBool>,
) -> Result<Vec<DataUri>, PollError> {
    let started = Instant::now();
    let mut state = OperationState::Submitted;
    debug!(operation = handle.name.as_str(), state = state.as_str());

    for attempt in 1..=policy.max_attempts {
        if !sleep_unless_cancelled(policy.interval, &cancel).await {
            warn!(operation = handle.name.as_str(), attempt, "operation poll cancelled");
            return Err(PollError::Cancelled {
                name: handle.name.clone(),
            });
        }
        if let Some(deadline) = policy.deadline {
            if started.elapsed() > deadline {
                return Err(PollError::DeadlineExceeded {
                    name: handle.name.clone(),
                    deadline,
                });
            }
        }

        state = OperationState::Polling { attempt };
        match client.check_operation(handle).await? {
            OperationStatus::Pending => {
                debug!(operation = handle.name.as_str(), attempt, state = state.as_str());
            }
            OperationStatus::Done(media) => {
                state = OperationState::Succeeded;
                info!(
                    operation = handle.name.as_str(),
                    attempt,
                    state = state.as_str(),
                    media = media.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "operation finished"
                );
                return Ok(media);
            }
            OperationStatus::Failed(reason) => {
                state = OperationState::Failed;
                warn!(
                    operation = handle.name.as_str(),
                    attempt,
                    state = state.as_str(),
                    reason = reason.as_str(),
                    "operation failed"
                );
                return Err(PollError::Failed {
                    name: handle.name.clone(),
                    reason,
                });
            }
        }
    }

    Err(PollError::Exhausted {
        name: handle.name.clone(),
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ScriptedClient;

    fn fast(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(1),
            max_attempts,
            deadline: None,
        }
    }

    fn handle() -> OperationHandle {
        OperationHandle {
            name: "operations/test".into(),
        }
    }

    #[tokio::test]
    async fn returns_media_once_done() {
        let client = ScriptedClient::new()
            .poll(OperationStatus::Pending)
            .poll(OperationStatus::Pending)
            .poll(OperationStatus::Done(vec![DataUri::new("video/mp4", vec![7])]));
        let media = poll_until_done(&client, &handle(), fast(10), Arc::default())
            .await
            .unwrap();
        assert_eq!(media.len(), 1);
        assert_eq!(client.polls_seen(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let client = ScriptedClient::new();
        let err = poll_until_done(&client, &handle(), fast(4), Arc::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PollError::Exhausted { attempts: 4, .. }));
        assert_eq!(client.polls_seen(), 4);
    }

    #[tokio::test]
    async fn reports_remote_failure() {
        let client = ScriptedClient::new().poll(OperationStatus::Failed("quota".into()));
        let err = poll_until_done(&client, &handle(), fast(3), Arc::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PollError::Failed { ref reason, .. } if reason == "quota"));
    }

    #[tokio::test]
    async fn propagates_transport_errors() {
        let client = ScriptedClient::new().poll_fail("connection reset");
        let err = poll_until_done(&client, &handle(), fast(3), Arc::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PollError::Provider(_)));
    }

    #[tokio::test]
    async fn cancellation_stops_before_checking() {
        let client = ScriptedClient::new();
        let cancel = Arc::new(AtomicBool::new(true));
        let err = poll_until_done(&client, &handle(), fast(3), cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, PollError::Cancelled { .. }));
        assert_eq!(client.polls_seen(), 0);
    }

    #[tokio::test]
    async fn deadline_is_enforced() {
        let client = ScriptedClient::new();
        let policy = PollPolicy {
            interval: Duration::from_millis(5),
            max_attempts: 1_000,
            deadline: Some(Duration::from_millis(1)),
        };
        let err = poll_until_done(&client, &handle(), policy, Arc::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PollError::DeadlineExceeded { .. }));
    }

    #[test]
    fn state_labels() {
        assert_eq!(OperationState::Polling { attempt: 2 }.as_str(), "polling");
        assert_eq!(OperationState::Submitted.as_str(), "submitted");
    }
}
