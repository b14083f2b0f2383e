use chrono::{DateTime, Duration, Utc};
use sw_core::config::MonitorConfig;
use sw_core::types::{Condition, MonitorEntry, Task};

/// What the duration monitor wants done with a task in a bad condition.
#[derive(Debug, Clone, PartialEq)]
pub enum DurationDecision {
    /// First sighting of this condition: (re)start the clock with this entry.
    StartMonitoring(MonitorEntry),
    /// Same condition as before, threshold not reached yet.
    Keep { elapsed: Duration, threshold: Duration },
    /// Threshold reached: delete the task together with its files.
    Delete { reason: String },
}

/// How long `condition` may last before the task is deleted.
///
/// `is_freeleech` is the flag snapshotted on the monitor entry, not the
/// task's current tags.
pub fn threshold_for(
    condition: Condition,
    is_freeleech: bool,
    num_leechers: u32,
    cfg: &MonitorConfig,
) -> Duration {
    let minutes = if condition.is_upload_stall() && is_freeleech && num_leechers == 0 {
        cfg.freeleech_stalled_minutes
    } else if condition.is_upload_stall() && !is_freeleech && num_leechers > 0 {
        cfg.stalled_with_leechers_minutes
    } else {
        cfg.base_threshold_minutes
    };
    Duration::minutes(i64::try_from(minutes).unwrap_or(i64::MAX / 60))
}

/// Decide the fate of a managed task observed in `condition`.
///
/// The clock is keyed on the condition: an entry recorded for a different
/// condition is replaced, never carried over. A `Keep` never touches the
/// stored timestamp.
pub fn decide(
    existing: Option<&MonitorEntry>,
    condition: Condition,
    task: &Task,
    is_freeleech: bool,
    cfg: &MonitorConfig,
    now: DateTime<Utc>,
) -> DurationDecision {
    let entry = match existing {
        Some(entry) if entry.condition == condition => entry,
        _ => {
            return DurationDecision::StartMonitoring(MonitorEntry::new(
                task.name.clone(),
                condition,
                now,
                is_freeleech,
            ))
        }
    };

    let elapsed = entry.elapsed(now);
    let threshold = threshold_for(condition, entry.is_freeleech, task.num_leechers, cfg);
    if elapsed >= threshold {
        DurationDecision::Delete {
            reason: format!(
                "{} for {}m (threshold {}m, freeleech={}, leechers={})",
                condition,
                elapsed.num_minutes(),
                threshold.num_minutes(),
                entry.is_freeleech,
                task.num_leechers
            ),
        }
    } else {
        DurationDecision::Keep { elapsed, threshold }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_core::types::TaskState;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_750_000_000, 0).unwrap()
    }

    fn stalled(leechers: u32) -> Task {
        let mut t = Task::new("abc", "Some.Release", TaskState::StalledUpload);
        t.num_leechers = leechers;
        t.progress = 1.0;
        t
    }

    fn entry(condition: Condition, fl: bool, mins_ago: i64) -> MonitorEntry {
        MonitorEntry::new("Some.Release", condition, t0() - Duration::minutes(mins_ago), fl)
    }

    #[test]
    fn threshold_table() {
        let cfg = MonitorConfig::default();
        let up = Condition::StalledUpload;
        assert_eq!(threshold_for(up, true, 0, &cfg), Duration::minutes(240));
        assert_eq!(threshold_for(up, true, 3, &cfg), Duration::minutes(15));
        assert_eq!(threshold_for(up, false, 2, &cfg), Duration::minutes(45));
        assert_eq!(threshold_for(up, false, 0, &cfg), Duration::minutes(15));
        assert_eq!(
            threshold_for(Condition::UploadingZeroSpeed, true, 0, &cfg),
            Duration::minutes(240)
        );
        assert_eq!(
            threshold_for(Condition::StalledDownload, true, 0, &cfg),
            Duration::minutes(15)
        );
        assert_eq!(
            threshold_for(Condition::DownloadingZeroSpeed, false, 5, &cfg),
            Duration::minutes(15)
        );
    }

    #[test]
    fn first_sighting_starts_monitoring() {
        let d = decide(
            None,
            Condition::StalledUpload,
            &stalled(2),
            false,
            &MonitorConfig::default(),
            t0(),
        );
        match d {
            DurationDecision::StartMonitoring(e) => {
                assert_eq!(e.first_seen, t0());
                assert_eq!(e.condition, Condition::StalledUpload);
                assert!(!e.is_freeleech);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn below_threshold_keeps() {
        let e = entry(Condition::StalledUpload, false, 44);
        let d = decide(
            Some(&e),
            Condition::StalledUpload,
            &stalled(2),
            false,
            &MonitorConfig::default(),
            t0(),
        );
        assert_eq!(
            d,
            DurationDecision::Keep {
                elapsed: Duration::minutes(44),
                threshold: Duration::minutes(45)
            }
        );
    }

    #[test]
    fn exactly_at_threshold_deletes() {
        let e = entry(Condition::StalledUpload, false, 45);
        let d = decide(
            Some(&e),
            Condition::StalledUpload,
            &stalled(2),
            false,
            &MonitorConfig::default(),
            t0(),
        );
        match d {
            DurationDecision::Delete { reason } => {
                assert!(reason.contains("stalledUP"), "{reason}");
                assert!(reason.contains("45m"), "{reason}");
                assert!(reason.contains("freeleech=false"), "{reason}");
                assert!(reason.contains("leechers=2"), "{reason}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn condition_change_resets_clock() {
        let e = entry(Condition::PausedUpload, false, 500);
        let d = decide(
            Some(&e),
            Condition::StalledUpload,
            &stalled(0),
            false,
            &MonitorConfig::default(),
            t0(),
        );
        match d {
            DurationDecision::StartMonitoring(new) => {
                assert_eq!(new.condition, Condition::StalledUpload);
                assert_eq!(new.first_seen, t0());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn entry_freeleech_snapshot_wins_over_current_flag() {
        let e = entry(Condition::StalledUpload, true, 100);
        let d = decide(
            Some(&e),
            Condition::StalledUpload,
            &stalled(0),
            false,
            &MonitorConfig::default(),
            t0(),
        );
        assert!(matches!(d, DurationDecision::Keep { .. }));
    }
}
