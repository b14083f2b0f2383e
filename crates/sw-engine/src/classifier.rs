use serde::{Deserialize, Serialize};
use sw_core::config::ClassificationConfig;
use sw_core::types::Task;

/// Which cleanup policy a task falls under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Population {
    /// Files must be preserved; only removed on a severe client error.
    Protected,
    /// Subject to throughput-driven cleanup.
    Managed,
    /// Left alone.
    Unclassified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub population: Population,
    pub is_freeleech: bool,
}

/// One precedence rule: if `matches`, the task belongs to `outcome`.
pub struct ClassRule {
    pub name: &'static str,
    pub matches: fn(&Task, &ClassificationConfig, bool) -> bool,
    pub outcome: Population,
}

/// Precedence chain, evaluated first-match-wins. Protected beats managed so a
/// task carrying both a protected and a managed marker keeps its files.
pub const RULES: &[ClassRule] = &[
    ClassRule {
        name: "protected_category",
        matches: |task, cfg, _| cfg.protected_categories.contains(&task.category),
        outcome: Population::Protected,
    },
    ClassRule {
        name: "protected_tag",
        matches: |task, cfg, _| task.tags.iter().any(|t| cfg.protected_tags.contains(t)),
        outcome: Population::Protected,
    },
    ClassRule {
        name: "managed_category",
        matches: |task, cfg, _| cfg.managed_categories.contains(&task.category),
        outcome: Population::Managed,
    },
    ClassRule {
        name: "managed_tag",
        matches: |task, cfg, _| task.tags.iter().any(|t| cfg.managed_tags.contains(t)),
        outcome: Population::Managed,
    },
    ClassRule {
        name: "freeleech_default",
        matches: |_, _, is_freeleech| is_freeleech,
        outcome: Population::Managed,
    },
];

pub fn is_freeleech(task: &Task, cfg: &ClassificationConfig) -> bool {
    task.tags.iter().any(|t| cfg.freeleech_tags.contains(t))
}

/// Resolve a task's population and freeleech flag. Pure.
pub fn classify(task: &Task, cfg: &ClassificationConfig) -> Classification {
    let is_freeleech = is_freeleech(task, cfg);
    let population = matching_rule(task, cfg, is_freeleech)
        .map(|rule| rule.outcome)
        .unwrap_or(Population::Unclassified);
    Classification {
        population,
        is_freeleech,
    }
}

/// The first rule that matches, if any.
pub fn matching_rule(
    task: &Task,
    cfg: &ClassificationConfig,
    is_freeleech: bool,
) -> Option<&'static ClassRule> {
    RULES
        .iter()
        .find(|rule| (rule.matches)(task, cfg, is_freeleech))
}
