//! Providers Module - External Systems
//!
//! MongoDB store and user provisioning, plus the notification topic.

pub mod mongo;
pub mod notifications;
pub mod provision;

pub use mongo::*;
pub use notifications::*;
pub use provision::*;
