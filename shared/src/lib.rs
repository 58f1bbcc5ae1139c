//! Shared types for the weekly recipe rotation scheduler
//!
//! Contains the dish schema, menu records and the storage batch contract that
//! both the scheduler core and external stores agree on, plus logging setup.

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;
