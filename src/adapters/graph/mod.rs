//! Microsoft Graph adapter for the planner and mail ports.

pub mod client;

pub use client::GraphClient;
