//! Push Providers
//!
//! Delivery backends the dispatch engine calls through, and the routing that
//! picks one per platform.

mod apns;
mod configured;
mod noop;
mod router;
mod traits;

pub use apns::*;
pub use configured::*;
pub use noop::*;
pub use router::*;
pub use traits::*;
