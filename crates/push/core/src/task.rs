//! Delivery tasks, per-task outcomes and the aggregate reply.

use std::sync::Arc;

use crate::{Overrides, Payload, Platform, ProviderError};

/// Notification content shared by every task of one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    pub payload: Payload,
    pub overrides: Overrides,
}

/// One batch of recipients sharing a platform and message.
///
/// Immutable once built; the scheduler consumes each task exactly once.
#[derive(Debug, Clone)]
pub struct DeliveryTask {
    index: usize,
    platform: Platform,
    tokens: Vec<String>,
    message: Arc<Message>,
}

impl DeliveryTask {
    /// Create a task at position `index` of its request.
    pub fn new(index: usize, platform: Platform, tokens: Vec<String>, message: Arc<Message>) -> Self {
        Self {
            index,
            platform,
            tokens,
            message,
        }
    }

    /// Creation position within the request.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Number of recipients in this batch.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Consume the task and hand its recipients to an outcome.
    pub fn into_outcome(
        self,
        status: OutcomeStatus,
        error: Option<ProviderError>,
        attempts: u32,
    ) -> TaskOutcome {
        TaskOutcome {
            index: self.index,
            platform: self.platform,
            tokens: self.tokens,
            status,
            error,
            attempts,
        }
    }
}

/// Terminal status of a delivery task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Provider accepted the batch.
    Success,
    /// Permanent provider error, or a transient one with no retry budget.
    Failed,
    /// Every attempt hit a transient error.
    RetriedThenFailed,
    /// Not attempted, or aborted, because the dispatch was cancelled.
    Cancelled,
}

impl OutcomeStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
            Self::RetriedThenFailed => write!(f, "retried_then_failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result of executing one delivery task.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TaskOutcome {
    /// Position of the task within its request.
    pub index: usize,
    pub platform: Platform,
    /// Recipients covered by the task.
    pub tokens: Vec<String>,
    pub status: OutcomeStatus,
    /// Last provider error, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ProviderError>,
    /// Provider calls made for this task.
    pub attempts: u32,
}

impl TaskOutcome {
    /// Number of recipients covered by this outcome.
    pub fn recipients(&self) -> usize {
        self.tokens.len()
    }
}

/// Aggregate result of one push request.
///
/// Totals are derived from the outcomes at construction and cannot drift from
/// them afterwards, so a reply is only ever serialized, never parsed back.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DispatchReply {
    request_id: String,
    success: usize,
    failure: usize,
    outcomes: Vec<TaskOutcome>,
}

impl DispatchReply {
    /// Build a reply from outcomes already in task order.
    ///
    /// Counts are per recipient: a successful task adds its batch size to
    /// `success`, any other status adds it to `failure`.
    pub fn new(request_id: impl Into<String>, outcomes: Vec<TaskOutcome>) -> Self {
        let (success, failure) = outcomes.iter().fold((0, 0), |(ok, err), outcome| {
            if outcome.status.is_success() {
                (ok + outcome.recipients(), err)
            } else {
                (ok, err + outcome.recipients())
            }
        });

        Self {
            request_id: request_id.into(),
            success,
            failure,
            outcomes,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Recipients delivered successfully.
    pub fn success(&self) -> usize {
        self.success
    }

    /// Recipients that failed, including cancelled ones.
    pub fn failure(&self) -> usize {
        self.failure
    }

    /// Total recipients covered by the reply.
    pub fn total(&self) -> usize {
        self.success + self.failure
    }

    /// Outcomes in task creation order.
    pub fn outcomes(&self) -> &[TaskOutcome] {
        &self.outcomes
    }

    /// True if every recipient was delivered.
    pub fn is_complete_success(&self) -> bool {
        self.failure == 0
    }
}
