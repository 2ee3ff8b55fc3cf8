//! Bounded-concurrency task execution with timeout, retry and cancellation.
//!
//! Per task: `Pending -> Attempting -> {Succeeded | Retrying -> Attempting |
//! Failed | Cancelled}`. Every task yields exactly one [`TaskOutcome`].

use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use futures::stream::FuturesUnordered;
use push_core::{DeliveryTask, DispatchConfig, OutcomeStatus, ProviderError, TaskOutcome};
use push_provider::Provider;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::RetryPolicy;

/// Per-call execution limits.
#[derive(Debug, Clone)]
struct Limits {
    retry: RetryPolicy,
    attempt_timeout: Duration,
    grace: Duration,
}

/// How a single provider call ended.
enum Attempt {
    Delivered,
    Failed(ProviderError),
    /// Still running when the cancellation grace period ran out.
    Aborted,
}

/// Execute tasks against `provider`.
///
/// The returned stream is lazy: no provider call is made until it is polled.
/// Outcomes arrive in completion order, not task order.
///
/// Once `cancel` fires no new attempt starts. Tasks waiting for the
/// concurrency gate or sleeping in backoff end as `Cancelled`; in-flight
/// attempts get the configured grace period before being dropped.
pub fn dispatch<'a, P: Provider>(
    tasks: Vec<DeliveryTask>,
    provider: &'a P,
    config: &DispatchConfig,
    cancel: CancellationToken,
) -> impl Stream<Item = TaskOutcome> + Send + use<'a, P> {
    let gate = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
    let limits = Limits {
        retry: RetryPolicy::from_config(config),
        attempt_timeout: config.per_attempt_timeout(),
        grace: config.cancel_grace_period(),
    };

    tasks
        .into_iter()
        .map(|task| run_task(task, provider, Arc::clone(&gate), limits.clone(), cancel.clone()))
        .collect::<FuturesUnordered<_>>()
}

async fn run_task<P: Provider>(
    task: DeliveryTask,
    provider: &P,
    gate: Arc<Semaphore>,
    limits: Limits,
    cancel: CancellationToken,
) -> TaskOutcome {
    let _permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            return task.into_outcome(OutcomeStatus::Cancelled, None, 0);
        }
        permit = gate.acquire() => match permit {
            Ok(permit) => permit,
            // The gate is owned by this dispatch call and never closed.
            Err(_) => return task.into_outcome(OutcomeStatus::Cancelled, None, 0),
        },
    };

    let mut attempts = 0;
    let mut last_error = None;

    loop {
        if cancel.is_cancelled() {
            return task.into_outcome(OutcomeStatus::Cancelled, last_error, attempts);
        }

        attempts += 1;
        tracing::debug!(
            task = task.index(),
            platform = %task.platform(),
            attempt = attempts,
            "sending batch"
        );

        let error = match attempt(provider, &task, &limits, &cancel).await {
            Attempt::Delivered => {
                return task.into_outcome(OutcomeStatus::Success, None, attempts);
            }
            Attempt::Aborted => {
                return task.into_outcome(
                    OutcomeStatus::Cancelled,
                    Some(ProviderError::cancelled()),
                    attempts,
                );
            }
            Attempt::Failed(error) => error,
        };

        if !provider.is_transient(&task, &error) {
            tracing::debug!(task = task.index(), error = %error, "permanent provider error");
            return task.into_outcome(OutcomeStatus::Failed, Some(error), attempts);
        }

        // An attempt that finished inside the grace period keeps its own
        // result; only the retry is skipped.
        let exhausted = attempts >= limits.retry.max_attempts();
        if exhausted || cancel.is_cancelled() {
            let status = if attempts > 1 {
                OutcomeStatus::RetriedThenFailed
            } else {
                OutcomeStatus::Failed
            };
            if exhausted {
                tracing::warn!(
                    task = task.index(),
                    attempts,
                    error = %error,
                    "retry budget exhausted"
                );
            } else {
                tracing::info!(
                    task = task.index(),
                    attempts,
                    error = %error,
                    "dispatch cancelled, not retrying"
                );
            }
            return task.into_outcome(status, Some(error), attempts);
        }

        let delay = limits.retry.delay_for_retry(attempts);
        tracing::warn!(
            task = task.index(),
            attempt = attempts,
            max = limits.retry.max_retries,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "retrying after transient error"
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                return task.into_outcome(OutcomeStatus::Cancelled, Some(error), attempts);
            }
            _ = tokio::time::sleep(delay) => {}
        }
        last_error = Some(error);
    }
}

async fn attempt<P: Provider>(
    provider: &P,
    task: &DeliveryTask,
    limits: &Limits,
    cancel: &CancellationToken,
) -> Attempt {
    let timeout = limits.attempt_timeout;
    let send = tokio::time::timeout(timeout, provider.send(task));
    tokio::pin!(send);

    let result = tokio::select! {
        result = &mut send => result,
        _ = cancel.cancelled() => {
            match tokio::time::timeout(limits.grace, &mut send).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::debug!(task = task.index(), "aborting attempt after grace period");
                    return Attempt::Aborted;
                }
            }
        }
    };

    match result {
        Ok(Ok(())) => Attempt::Delivered,
        Ok(Err(e)) => Attempt::Failed(e),
        Err(_) => Attempt::Failed(ProviderError::timeout(timeout)),
    }
}
