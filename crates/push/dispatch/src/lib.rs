//! Push Dispatch Engine
//!
//! Normalizes push requests into batched delivery tasks, executes them against
//! a provider with bounded concurrency and retry, and aggregates the outcomes.

mod aggregate;
mod dispatcher;
mod normalize;
mod retry;
mod scheduler;

#[cfg(test)]
mod testing;

pub use aggregate::aggregate;
pub use dispatcher::Dispatcher;
pub use normalize::normalize;
pub use retry::RetryPolicy;
pub use scheduler::dispatch;

pub use tokio_util::sync::CancellationToken;
