//! Utils Module - Helper Functions & Shared Utilities

pub mod cache;
pub mod telemetry;

pub use cache::*;
pub use telemetry::*;
