//! Logging and tracing setup shared by the seedwarden binaries.
//!
//! - **Logging**: Human-readable and JSON-formatted output via `tracing-subscriber`
//! - **Tracing**: trace/span ID generation so every log line of one cleanup
//!   run can be correlated

pub mod logging;
pub mod tracing_setup;
