//! Push Core Types
//!
//! Data model, error taxonomy and configuration shared by the dispatch engine,
//! the providers and the HTTP surface.

mod config;
mod error;
mod platform;
mod request;
mod task;

pub use config::*;
pub use error::*;
pub use platform::*;
pub use request::*;
pub use task::*;
