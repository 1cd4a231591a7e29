//! Infrastructure adapters for external systems.

pub mod graph;
pub mod memory;
pub mod substrates;
