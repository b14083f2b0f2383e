//! Seams to the external collaborators: the download client and the
//! notification channel. Concrete implementations live in `sw-integrations`.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::Task;

// ---------------------------------------------------------------------------
// Download client
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ClientError {
    /// The client could not be reached (refused, DNS, TLS, timeout).
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    /// The client answered with an unexpected HTTP status.
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Acknowledgement of a delete request. `NotFound` is as good as `Deleted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteAck {
    Deleted,
    NotFound,
}

#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// Snapshot of every task the client currently holds.
    async fn list_tasks(&self) -> Result<Vec<Task>, ClientError>;

    /// Remove a task, optionally together with its downloaded files.
    async fn delete_task(&self, id: &str, delete_files: bool) -> Result<DeleteAck, ClientError>;

    /// Whether the client still knows a task with this id.
    async fn task_exists(&self, id: &str) -> Result<bool, ClientError>;
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notifier not configured: {0}")]
    NotConfigured(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("rejected (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one pre-formatted report.
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}
