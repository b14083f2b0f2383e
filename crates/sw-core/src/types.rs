use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TaskState
// ---------------------------------------------------------------------------

/// Live state of a task as reported by the download client.
///
/// Variants use the client's wire names. qBittorrent 5 renamed the
/// `paused*` states to `stopped*`; both spellings map to the same variant.
/// Any string the client invents later deserializes as [`TaskState::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    #[serde(rename = "uploading")]
    Uploading,
    #[serde(rename = "forcedUP")]
    ForcedUpload,
    #[serde(rename = "stalledUP")]
    StalledUpload,
    #[serde(rename = "pausedUP", alias = "stoppedUP")]
    PausedUpload,
    #[serde(rename = "queuedUP")]
    QueuedUpload,
    #[serde(rename = "checkingUP")]
    CheckingUpload,
    #[serde(rename = "downloading")]
    Downloading,
    #[serde(rename = "forcedDL")]
    ForcedDownload,
    #[serde(rename = "stalledDL")]
    StalledDownload,
    #[serde(rename = "pausedDL", alias = "stoppedDL")]
    PausedDownload,
    #[serde(rename = "queuedDL")]
    QueuedDownload,
    #[serde(rename = "checkingDL")]
    CheckingDownload,
    #[serde(rename = "metaDL", alias = "forcedMetaDL")]
    FetchingMetadata,
    #[serde(rename = "allocating")]
    Allocating,
    #[serde(rename = "moving")]
    Moving,
    #[serde(rename = "checkingResumeData")]
    CheckingResumeData,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "missingFiles")]
    MissingFiles,
    #[serde(rename = "unknown", other)]
    Unknown,
}

impl TaskState {
    /// Uploading or force-uploading: the task is offered to peers right now.
    pub fn is_active_seeding(&self) -> bool {
        matches!(self, TaskState::Uploading | TaskState::ForcedUpload)
    }

    /// States that warrant deletion regardless of how long they have lasted.
    pub fn is_severe_error(&self) -> bool {
        matches!(
            self,
            TaskState::Error | TaskState::MissingFiles | TaskState::Unknown
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Uploading => "uploading",
            TaskState::ForcedUpload => "forcedUP",
            TaskState::StalledUpload => "stalledUP",
            TaskState::PausedUpload => "pausedUP",
            TaskState::QueuedUpload => "queuedUP",
            TaskState::CheckingUpload => "checkingUP",
            TaskState::Downloading => "downloading",
            TaskState::ForcedDownload => "forcedDL",
            TaskState::StalledDownload => "stalledDL",
            TaskState::PausedDownload => "pausedDL",
            TaskState::QueuedDownload => "queuedDL",
            TaskState::CheckingDownload => "checkingDL",
            TaskState::FetchingMetadata => "metaDL",
            TaskState::Allocating => "allocating",
            TaskState::Moving => "moving",
            TaskState::CheckingResumeData => "checkingResumeData",
            TaskState::Error => "error",
            TaskState::MissingFiles => "missingFiles",
            TaskState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// Read-only snapshot of one download-client task for the current run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Stable identity (the info-hash for qBittorrent).
    pub id: String,
    pub name: String,
    pub category: String,
    pub tags: Vec<String>,
    pub state: TaskState,
    /// Bytes per second.
    pub upload_speed: u64,
    /// Bytes per second.
    pub download_speed: u64,
    /// Completion fraction in `[0, 1]`.
    pub progress: f64,
    pub added_at: DateTime<Utc>,
    /// `None` when the client has never seen transfer activity.
    pub last_activity: Option<DateTime<Utc>>,
    pub seeding_secs: u64,
    /// Uploaded / downloaded. May be very large or infinite.
    pub ratio: f64,
    pub num_leechers: u32,
    pub num_seeders: u32,
}

impl Task {
    /// A task with neutral attributes, mainly for constructing fixtures.
    pub fn new(id: impl Into<String>, name: impl Into<String>, state: TaskState) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            tags: Vec::new(),
            state,
            upload_speed: 0,
            download_speed: 0,
            progress: 0.0,
            added_at: Utc::now(),
            last_activity: None,
            seeding_secs: 0,
            ratio: 0.0,
            num_leechers: 0,
            num_seeders: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }

    pub fn seeding_days(&self) -> f64 {
        self.seeding_secs as f64 / 86_400.0
    }
}

/// Split a client tag string (`"a, b,,c"`) into trimmed, non-empty tags.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// Coarse "effective condition" bucket that keys the duration monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "stalledUP")]
    StalledUpload,
    #[serde(rename = "pausedUP")]
    PausedUpload,
    #[serde(rename = "uploading_zero_speed")]
    UploadingZeroSpeed,
    #[serde(rename = "stalledDL")]
    StalledDownload,
    #[serde(rename = "downloading_zero_speed")]
    DownloadingZeroSpeed,
}

impl Condition {
    /// Completed tasks that are not moving any data out.
    pub fn is_upload_stall(&self) -> bool {
        matches!(
            self,
            Condition::StalledUpload | Condition::PausedUpload | Condition::UploadingZeroSpeed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::StalledUpload => "stalledUP",
            Condition::PausedUpload => "pausedUP",
            Condition::UploadingZeroSpeed => "uploading_zero_speed",
            Condition::StalledDownload => "stalledDL",
            Condition::DownloadingZeroSpeed => "downloading_zero_speed",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// MonitorEntry
// ---------------------------------------------------------------------------

/// Persisted record of a managed task lingering in a non-healthy condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorEntry {
    pub name: String,
    pub condition: Condition,
    /// When the task entered `condition`; never moved while it persists.
    pub first_seen: DateTime<Utc>,
    /// Freeleech status captured when the entry was created.
    pub is_freeleech: bool,
}

impl MonitorEntry {
    pub fn new(
        name: impl Into<String>,
        condition: Condition,
        first_seen: DateTime<Utc>,
        is_freeleech: bool,
    ) -> Self {
        Self {
            name: name.into(),
            condition,
            first_seen,
            is_freeleech,
        }
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.first_seen)
    }
}
