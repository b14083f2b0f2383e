use sw_core::client::{DeleteAck, TorrentClient};
use sw_core::types::Task;
use tracing::{error, info, warn};

/// Result of one deletion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The client no longer knows the task.
    AlreadyGone,
    /// Dry run: nothing was sent to the client.
    Simulated,
    Failed(String),
}

impl DeleteOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, DeleteOutcome::Failed(_))
    }
}

/// Delete `task`, resolving an ambiguous error with an existence check.
///
/// An error is only reported as `Failed` when the task is still present or
/// its presence cannot be confirmed.
pub async fn execute(
    client: &dyn TorrentClient,
    task: &Task,
    delete_files: bool,
    dry_run: bool,
) -> DeleteOutcome {
    if dry_run {
        info!(
            task_id = %task.id,
            name = %task.name,
            delete_files,
            "dry run: would delete task"
        );
        return DeleteOutcome::Simulated;
    }

    let err = match client.delete_task(&task.id, delete_files).await {
        Ok(DeleteAck::Deleted) => {
            info!(task_id = %task.id, name = %task.name, delete_files, "task deleted");
            return DeleteOutcome::Deleted;
        }
        Ok(DeleteAck::NotFound) => {
            warn!(task_id = %task.id, name = %task.name, "task already gone from client");
            return DeleteOutcome::AlreadyGone;
        }
        Err(e) => e,
    };

    match client.task_exists(&task.id).await {
        Ok(false) => {
            warn!(
                task_id = %task.id,
                error = %err,
                "delete call failed but task is gone, treating as deleted"
            );
            DeleteOutcome::AlreadyGone
        }
        Ok(true) => {
            error!(task_id = %task.id, name = %task.name, error = %err, "failed to delete task");
            DeleteOutcome::Failed(err.to_string())
        }
        Err(check_err) => {
            error!(
                task_id = %task.id,
                error = %err,
                check_error = %check_err,
                "failed to delete task and could not confirm its state"
            );
            DeleteOutcome::Failed(err.to_string())
        }
    }
}
