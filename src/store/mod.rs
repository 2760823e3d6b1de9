//! Store Module - Todo persistence
//!
//! Repository trait plus the in-process backends: the serial-id store,
//! its cached view and the legacy scratch list.

pub mod cached;
pub mod memory;
pub mod repository;
pub mod scratch;

pub use cached::*;
pub use memory::*;
pub use repository::*;
pub use scratch::*;
