//! Provider traits.

use push_core::{DeliveryTask, ProviderError};

/// Push delivery backend for one or more platforms.
///
/// Implementations are shared across concurrently running tasks and must be
/// reentrant.
#[trait_variant::make(Send)]
pub trait Provider: Send + Sync {
    /// Deliver one batch.
    async fn send(&self, task: &DeliveryTask) -> Result<(), ProviderError>;

    /// Whether retrying `task` after `error` may succeed.
    fn is_transient(&self, _task: &DeliveryTask, error: &ProviderError) -> bool {
        error.kind.is_transient()
    }
}
