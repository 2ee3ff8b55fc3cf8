//! Scripted provider for engine tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use push_core::{DeliveryTask, ProviderError, ProviderErrorKind};
use push_provider::Provider;

/// What one provider call does.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Step {
    Ok,
    Transient,
    Permanent,
    /// Succeed after a delay.
    Delay(Duration),
    /// Fail transiently after a delay.
    SlowTransient(Duration),
    /// Never answer within any reasonable test deadline.
    Hang,
}

/// Replays a per-task script of steps; tasks without a script succeed.
#[derive(Default)]
pub(crate) struct ScriptedProvider {
    scripts: Mutex<HashMap<usize, VecDeque<Step>>>,
    fallback: Option<Step>,
    attempts: Mutex<HashMap<usize, u32>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Step used once a task's script runs out.
    pub(crate) fn with_fallback(mut self, step: Step) -> Self {
        self.fallback = Some(step);
        self
    }

    pub(crate) fn with_script(self, task: usize, steps: impl IntoIterator<Item = Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(task, steps.into_iter().collect());
        self
    }

    pub(crate) fn attempts(&self, task: usize) -> u32 {
        self.attempts.lock().unwrap().get(&task).copied().unwrap_or(0)
    }

    pub(crate) fn total_attempts(&self) -> u32 {
        self.attempts.lock().unwrap().values().sum()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_step(&self, task: usize) -> Step {
        *self.attempts.lock().unwrap().entry(task).or_default() += 1;
        self.scripts
            .lock()
            .unwrap()
            .get_mut(&task)
            .and_then(VecDeque::pop_front)
            .or(self.fallback)
            .unwrap_or(Step::Ok)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Provider for ScriptedProvider {
    async fn send(&self, task: &DeliveryTask) -> Result<(), ProviderError> {
        let step = self.next_step(task.index());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        // Yield so concurrent tasks overlap even for instant steps.
        tokio::time::sleep(Duration::from_millis(2)).await;

        match step {
            Step::Ok => Ok(()),
            Step::Transient => Err(ProviderError::new(
                ProviderErrorKind::Unavailable,
                "scripted 503",
            )),
            Step::Permanent => Err(ProviderError::new(
                ProviderErrorKind::InvalidToken,
                "scripted bad token",
            )),
            Step::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Step::SlowTransient(delay) => {
                tokio::time::sleep(delay).await;
                Err(ProviderError::new(
                    ProviderErrorKind::Unavailable,
                    "scripted slow 503",
                ))
            }
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }
    }
}
