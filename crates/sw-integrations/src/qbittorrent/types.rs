use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sw_core::types::{parse_tags, Task, TaskState};

/// One element of `GET /api/v2/torrents/info`.
///
/// Only the fields the cleanup engine reads are modelled; qBittorrent sends
/// many more and serde ignores them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentInfo {
    pub hash: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// Comma-separated tag list.
    #[serde(default)]
    pub tags: String,
    pub state: TaskState,
    #[serde(default)]
    pub upspeed: i64,
    #[serde(default)]
    pub dlspeed: i64,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub added_on: i64,
    /// Unix seconds; zero or negative when never active.
    #[serde(default)]
    pub last_activity: i64,
    #[serde(default)]
    pub seeding_time: i64,
    #[serde(default)]
    pub ratio: f64,
    #[serde(default)]
    pub num_leechs: i64,
    #[serde(default)]
    pub num_seeds: i64,
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn non_negative(v: i64) -> u64 {
    v.max(0) as u64
}

impl From<TorrentInfo> for Task {
    fn from(t: TorrentInfo) -> Self {
        Task {
            id: t.hash,
            name: t.name,
            category: t.category,
            tags: parse_tags(&t.tags),
            state: t.state,
            upload_speed: non_negative(t.upspeed),
            download_speed: non_negative(t.dlspeed),
            progress: t.progress.clamp(0.0, 1.0),
            added_at: timestamp(t.added_on),
            last_activity: (t.last_activity > 0).then(|| timestamp(t.last_activity)),
            seeding_secs: non_negative(t.seeding_time),
            ratio: t.ratio.max(0.0),
            num_leechers: u32::try_from(t.num_leechs.max(0)).unwrap_or(u32::MAX),
            num_seeders: u32::try_from(t.num_seeds.max(0)).unwrap_or(u32::MAX),
        }
    }
}
