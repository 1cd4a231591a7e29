//! Domain layer for the planner assistant
//!
//! Core models, the error type shared by every layer, and the port traits
//! that adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
