use std::fmt;

use chrono::{DateTime, Utc};
use sw_core::config::RetirementConfig;
use sw_core::types::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetirementRule {
    /// Ratio goal met, little demand left, seeded long enough.
    HighAchiever,
    /// Seeded for months with no leechers and no recent transfer.
    LongIdle,
}

impl fmt::Display for RetirementRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetirementRule::HighAchiever => f.write_str("high_achiever"),
            RetirementRule::LongIdle => f.write_str("long_idle"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Retirement {
    pub rule: RetirementRule,
    pub reason: String,
}

/// Check whether a healthy, actively seeding managed task should be retired.
///
/// Freeleech tasks are never retired. The high-achiever rule is checked
/// first; every bound is inclusive.
pub fn evaluate(
    task: &Task,
    is_freeleech: bool,
    cfg: &RetirementConfig,
    now: DateTime<Utc>,
) -> Option<Retirement> {
    if is_freeleech {
        return None;
    }

    let seeding_days = task.seeding_days();

    if task.ratio >= cfg.min_ratio
        && task.num_leechers <= cfg.low_demand_leechers
        && seeding_days >= cfg.min_seeding_days as f64
    {
        return Some(Retirement {
            rule: RetirementRule::HighAchiever,
            reason: format!(
                "retired: ratio/low-demand/seeding-days (ratio {:.2}, leechers {}, {:.1}d seeding)",
                task.ratio, task.num_leechers, seeding_days
            ),
        });
    }

    let idle_days = days_since_activity(task, now);
    if seeding_days >= cfg.long_idle_seeding_days as f64
        && task.num_leechers <= cfg.long_idle_max_leechers
        && idle_days >= cfg.long_idle_inactive_days as f64
    {
        let idle = if idle_days.is_finite() {
            format!("{idle_days:.1}d")
        } else {
            "never".to_string()
        };
        return Some(Retirement {
            rule: RetirementRule::LongIdle,
            reason: format!(
                "retired: long-idle ({:.1}d seeding, leechers {}, last activity {})",
                seeding_days, task.num_leechers, idle
            ),
        });
    }

    None
}

/// Days since the last transfer; a task with no recorded activity counts as
/// idle forever.
fn days_since_activity(task: &Task, now: DateTime<Utc>) -> f64 {
    match task.last_activity {
        Some(at) => now.signed_duration_since(at).num_seconds() as f64 / 86_400.0,
        None => f64::INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sw_core::types::TaskState;

    const DAY: u64 = 86_400;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_750_000_000, 0).unwrap()
    }

    fn seed(ratio: f64, leechers: u32, days: u64) -> Task {
        let mut t = Task::new("abc", "Seed", TaskState::Uploading);
        t.ratio = ratio;
        t.num_leechers = leechers;
        t.seeding_secs = days * DAY;
        t.upload_speed = 1000;
        t.progress = 1.0;
        t.last_activity = Some(now() - Duration::minutes(5));
        t
    }

    #[test]
    fn high_achiever_boundary_is_inclusive() {
        let r = evaluate(&seed(5.0, 1, 14), false, &RetirementConfig::default(), now()).unwrap();
        assert_eq!(r.rule, RetirementRule::HighAchiever);
        assert!(r.reason.starts_with("retired: ratio/low-demand/seeding-days"));
    }

    #[test]
    fn high_achiever_misses_each_bound() {
        let cfg = RetirementConfig::default();
        assert!(evaluate(&seed(4.99, 1, 14), false, &cfg, now()).is_none());
        assert!(evaluate(&seed(5.0, 2, 14), false, &cfg, now()).is_none());
        let mut short = seed(5.0, 1, 13);
        short.seeding_secs = 14 * DAY - 1;
        assert!(evaluate(&short, false, &cfg, now()).is_none());
    }

    #[test]
    fn infinite_ratio_counts() {
        let r = evaluate(&seed(f64::INFINITY, 0, 20), false, &RetirementConfig::default(), now());
        assert_eq!(r.unwrap().rule, RetirementRule::HighAchiever);
    }

    #[test]
    fn freeleech_is_never_retired() {
        assert!(evaluate(&seed(50.0, 0, 200), true, &RetirementConfig::default(), now()).is_none());
    }

    #[test]
    fn long_idle_rule() {
        let mut t = seed(0.5, 0, 90);
        t.last_activity = Some(now() - Duration::days(7));
        let r = evaluate(&t, false, &RetirementConfig::default(), now()).unwrap();
        assert_eq!(r.rule, RetirementRule::LongIdle);
        assert!(r.reason.starts_with("retired: long-idle"));
    }

    #[test]
    fn long_idle_requires_inactivity() {
        let mut t = seed(0.5, 0, 120);
        t.last_activity = Some(now() - Duration::days(6));
        assert!(evaluate(&t, false, &RetirementConfig::default(), now()).is_none());
    }

    #[test]
    fn long_idle_requires_no_leechers() {
        let mut t = seed(0.5, 1, 120);
        t.last_activity = None;
        assert!(evaluate(&t, false, &RetirementConfig::default(), now()).is_none());
    }

    #[test]
    fn missing_activity_is_idle_forever() {
        let mut t = seed(0.5, 0, 95);
        t.last_activity = None;
        let r = evaluate(&t, false, &RetirementConfig::default(), now()).unwrap();
        assert_eq!(r.rule, RetirementRule::LongIdle);
        assert!(r.reason.contains("never"));
    }

    #[test]
    fn high_achiever_wins_when_both_match() {
        let mut t = seed(6.0, 0, 100);
        t.last_activity = None;
        let r = evaluate(&t, false, &RetirementConfig::default(), now()).unwrap();
        assert_eq!(r.rule, RetirementRule::HighAchiever);
    }
}
