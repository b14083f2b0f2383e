//! Cleanup policy engine for download-client tasks.
//!
//! The engine provides:
//! - Task classification into protected, managed and unclassified populations
//! - Condition evaluation and duration-based debounced deletion
//! - Retirement of healthy seeds that have served their purpose
//! - The per-run orchestrator and its report

pub mod classifier;
pub mod condition;
pub mod duration;
pub mod executor;
pub mod orchestrator;
pub mod report;
pub mod retirement;

pub use orchestrator::{CleanupRunner, RunError};
pub use report::RunSummary;
