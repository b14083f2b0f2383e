use std::fmt;

use chrono::{DateTime, Duration, Utc};
use sw_core::config::MonitorConfig;
use sw_core::types::{Condition, Task, TaskState};

/// Why a task is exempt from all cleanup logic for this run.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    RecentlyAdded { hours: f64 },
    FreshlySeeding { state: TaskState, hours: f64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::RecentlyAdded { hours } => write!(f, "added {hours:.1}h ago"),
            SkipReason::FreshlySeeding { state, hours } => {
                write!(f, "{state} with only {hours:.1}h of seeding")
            }
        }
    }
}

/// Priority skip, evaluated before classification.
///
/// A task is skipped when it was added within the grace period, or when it
/// is actively seeding and only recently completed. A stalled upload is never
/// skipped here: that is a monitored condition.
pub fn skip_reason(task: &Task, cfg: &MonitorConfig, now: DateTime<Utc>) -> Option<SkipReason> {
    let since_added = now.signed_duration_since(task.added_at);
    if since_added < hours(cfg.grace_period_hours) {
        return Some(SkipReason::RecentlyAdded {
            hours: since_added.num_seconds() as f64 / 3600.0,
        });
    }

    let seeding = Duration::seconds(i64::try_from(task.seeding_secs).unwrap_or(i64::MAX));
    if task.state.is_active_seeding() && seeding < hours(cfg.fresh_seed_grace_hours) {
        return Some(SkipReason::FreshlySeeding {
            state: task.state,
            hours: task.seeding_secs as f64 / 3600.0,
        });
    }

    None
}

/// Derive the monitored condition from live attributes; `None` means healthy.
///
/// Zero-throughput checks compare against exactly zero. A fully downloaded
/// task can never be in a download condition.
pub fn effective_condition(task: &Task) -> Option<Condition> {
    match task.state {
        TaskState::StalledUpload => Some(Condition::StalledUpload),
        TaskState::PausedUpload => Some(Condition::PausedUpload),
        TaskState::Uploading if task.upload_speed == 0 => Some(Condition::UploadingZeroSpeed),
        TaskState::StalledDownload if !task.is_complete() => Some(Condition::StalledDownload),
        TaskState::Downloading if task.download_speed == 0 && !task.is_complete() => {
            Some(Condition::DownloadingZeroSpeed)
        }
        _ => None,
    }
}

fn hours(h: u64) -> Duration {
    Duration::hours(i64::try_from(h).unwrap_or(i64::MAX / 3600))
}
