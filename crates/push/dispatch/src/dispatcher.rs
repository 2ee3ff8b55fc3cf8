//! End-to-end dispatch of one push request.

use futures::StreamExt as _;
use push_core::{DispatchConfig, DispatchError, DispatchReply, OutcomeStatus, PushRequest};
use push_provider::Provider;
use tokio_util::sync::CancellationToken;

use crate::{aggregate, dispatch, normalize};

/// Runs push requests through normalize, schedule and aggregate.
///
/// Holds no per-request state; one instance serves concurrent calls.
/// Identical requests are dispatched again every time they are submitted.
pub struct Dispatcher<P> {
    config: DispatchConfig,
    provider: P,
}

impl<P> Dispatcher<P> {
    /// Create a new dispatcher.
    pub fn new(config: DispatchConfig, provider: P) -> Self {
        Self { config, provider }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: Provider> Dispatcher<P> {
    /// Dispatch a request, bounded only by the configured call deadline.
    pub async fn dispatch(&self, req: &PushRequest) -> Result<DispatchReply, DispatchError> {
        self.dispatch_with_cancel(req, CancellationToken::new())
            .await
    }

    /// Dispatch a request that stops early when `cancel` fires.
    ///
    /// A cancelled call still returns a full reply: tasks that never ran are
    /// reported as `Cancelled`.
    pub async fn dispatch_with_cancel(
        &self,
        req: &PushRequest,
        cancel: CancellationToken,
    ) -> Result<DispatchReply, DispatchError> {
        let request_id = uuid::Uuid::new_v4().to_string();

        let tasks = normalize(req, &self.config).inspect_err(|e| {
            tracing::warn!(request_id = %request_id, error = %e, "rejecting push request");
        })?;
        let expected = tasks.len();

        tracing::info!(
            request_id = %request_id,
            platform = %req.platform,
            recipients = req.tokens.len(),
            tasks = expected,
            "dispatching push request"
        );

        // Child token so the deadline never cancels the caller's token.
        let cancel = cancel.child_token();
        let run = dispatch(tasks, &self.provider, &self.config, cancel.clone())
            .collect::<Vec<_>>();

        let outcomes = match self.config.call_deadline() {
            None => run.await,
            Some(deadline) => {
                tokio::pin!(run);
                tokio::select! {
                    outcomes = &mut run => outcomes,
                    _ = tokio::time::sleep(deadline) => {
                        tracing::warn!(
                            request_id = %request_id,
                            deadline_ms = deadline.as_millis() as u64,
                            "call deadline elapsed, cancelling dispatch"
                        );
                        cancel.cancel();
                        run.await
                    }
                }
            }
        };

        let cancelled = outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Cancelled)
            .count();

        let reply = aggregate(request_id.as_str(), outcomes, expected).inspect_err(|e| {
            tracing::error!(request_id = %request_id, error = %e, "dispatch contract violated");
        })?;

        tracing::info!(
            request_id = %request_id,
            success = reply.success(),
            failure = reply.failure(),
            cancelled_tasks = cancelled,
            "push request dispatched"
        );

        Ok(reply)
    }
}
