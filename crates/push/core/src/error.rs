//! Error taxonomy.

/// Caller-input fault on the whole request. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("unsupported platform {0:?}")]
    UnsupportedPlatform(String),
    #[error("recipient list is empty")]
    EmptyRecipients,
    #[error("recipient token at position {index} is blank")]
    InvalidToken { index: usize },
}

/// Classification of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// Connection or transport failure.
    Network,
    /// The attempt exceeded its deadline.
    Timeout,
    /// Provider asked us to slow down.
    RateLimited,
    /// Provider-side 5xx or maintenance.
    Unavailable,
    /// Token is malformed or belongs to another app.
    InvalidToken,
    /// Device is no longer registered.
    Unregistered,
    /// Provider refused the notification for any other reason.
    Rejected,
    /// No provider is configured for the task's platform.
    Unroutable,
    /// The attempt was aborted by dispatch cancellation.
    Cancelled,
}

impl ProviderErrorKind {
    /// Whether a retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::RateLimited | Self::Unavailable
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::Unavailable => "unavailable",
            Self::InvalidToken => "invalid_token",
            Self::Unregistered => "unregistered",
            Self::Rejected => "rejected",
            Self::Unroutable => "unroutable",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a provider for one delivery task.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Attempt deadline elapsed.
    pub fn timeout(after: std::time::Duration) -> Self {
        Self::new(
            ProviderErrorKind::Timeout,
            format!("no response within {}ms", after.as_millis()),
        )
    }

    /// Attempt aborted after the cancellation grace period.
    pub fn cancelled() -> Self {
        Self::new(ProviderErrorKind::Cancelled, "dispatch cancelled")
    }
}

/// Errors that abort a whole dispatch call.
///
/// Everything except [`DispatchError::Validation`] means the engine broke its
/// own contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid push request: {0}")]
    Validation(#[from] ValidationError),
    #[error("dispatch incomplete: no outcome for tasks {missing:?}")]
    IncompleteDispatch { missing: Vec<usize> },
    #[error("dispatch produced more than one outcome for task {index}")]
    DuplicateOutcome { index: usize },
    #[error("dispatch produced an outcome for unknown task {index}")]
    UnknownTask { index: usize },
}

impl DispatchError {
    /// True for engine bugs, false for caller faults.
    pub fn is_contract_violation(&self) -> bool {
        !matches!(self, Self::Validation(_))
    }
}
