//! CLI command handlers

pub mod chat;
pub mod mail;
pub mod tasks;
