//! Provider that accepts every task without contacting a backend.

use push_core::{DeliveryTask, ProviderError};

use crate::Provider;

/// Logs and accepts every batch.
#[derive(Debug, Clone, Default)]
pub struct NoopProvider;

impl Provider for NoopProvider {
    async fn send(&self, task: &DeliveryTask) -> Result<(), ProviderError> {
        tracing::info!(
            platform = %task.platform(),
            task = task.index(),
            recipients = task.len(),
            title = %task.message().payload.title,
            "noop provider accepted batch"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use push_core::Platform;

    #[tokio::test]
    async fn test_noop_accepts() {
        let task = DeliveryTask::new(0, Platform::Webpush, vec!["a".into()], Default::default());
        assert!(NoopProvider.send(&task).await.is_ok());
    }
}
