//! Core types, configuration, and durable state for seedwarden.

pub mod client;
pub mod config;
pub mod store;
pub mod types;
