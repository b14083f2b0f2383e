//! Drives one cleanup pass: walk every task once, apply the policies,
//! reconcile and persist the monitor ledger, then report.

use std::collections::HashSet;
use std::time::Instant;

use chrono::{DateTime, Utc};
use sw_core::client::{ClientError, Notifier, TorrentClient};
use sw_core::config::Config;
use sw_core::store::{MonitorLedger, MonitorStore};
use sw_core::types::Task;
use sw_telemetry::tracing_setup::{create_child_span, create_operation_span};
use thiserror::Error;
use tracing::{debug, error, info, Instrument};

use crate::classifier::{classify, Population};
use crate::condition::{effective_condition, skip_reason};
use crate::duration::{decide, DurationDecision};
use crate::executor::{execute, DeleteOutcome};
use crate::report::{render_html, FileAction, ReportAction, ReportItem, RunSummary, SystemError};
use crate::retirement;

/// A failure that aborts the whole run before anything is mutated.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("{0}")]
    Client(#[from] ClientError),
}

impl RunError {
    /// Short label used as the system-error heading in the report.
    pub fn context(&self) -> &'static str {
        match self {
            RunError::Client(ClientError::Connection(_)) => "connection failed",
            RunError::Client(_) => "task listing failed",
        }
    }
}

/// Applies the cleanup policies to a client's tasks.
pub struct CleanupRunner {
    config: Config,
}

impl CleanupRunner {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn dry_run(&self) -> bool {
        self.config.general.dry_run
    }

    /// Full run: list tasks, load the ledger, apply one pass, persist, report.
    ///
    /// Tasks are listed before the store is opened, so a client failure
    /// leaves the store file untouched. A failure report is sent before the
    /// error is returned.
    pub async fn run_once(
        &self,
        client: &dyn TorrentClient,
        store: &MonitorStore,
        notifier: Option<&dyn Notifier>,
    ) -> Result<RunSummary, RunError> {
        let (span, trace_id) = create_operation_span("cleanup_run");
        async move {
            let started = Instant::now();
            info!(
                trace_id = %trace_id,
                dry_run = self.dry_run(),
                store = %store.path().display(),
                "cleanup run starting"
            );

            let tasks = match client.list_tasks().await {
                Ok(tasks) => tasks,
                Err(e) => {
                    let err = RunError::from(e);
                    error!(error = %err, "cleanup run aborted");
                    let mut summary =
                        RunSummary::failure(self.dry_run(), err.context(), err.to_string());
                    summary.elapsed = started.elapsed();
                    self.publish(&summary, notifier).await;
                    return Err(err);
                }
            };

            let mut ledger = store.load();
            let mut summary = self.apply(client, &tasks, &mut ledger, Utc::now()).await;

            let saved = {
                let _persist = create_child_span(&trace_id, "persist_store").entered();
                store.save(&ledger)
            };
            if let Err(e) = saved {
                error!(error = %e, path = %store.path().display(), "failed to persist monitor store");
                summary.system_errors.push(SystemError {
                    context: "store save failed".to_string(),
                    message: e.to_string(),
                });
            }

            summary.elapsed = started.elapsed();
            self.publish(&summary, notifier).await;
            Ok(summary)
        }
        .instrument(span)
        .await
    }

    /// One pass over the client's current tasks against `ledger`.
    ///
    /// Pure apart from the delete calls: the caller owns loading and
    /// persisting the ledger. Each task is visited exactly once.
    pub async fn run_pass(
        &self,
        client: &dyn TorrentClient,
        ledger: &mut MonitorLedger,
        now: DateTime<Utc>,
    ) -> Result<RunSummary, RunError> {
        let tasks = client.list_tasks().await?;
        Ok(self.apply(client, &tasks, ledger, now).await)
    }

    async fn apply(
        &self,
        client: &dyn TorrentClient,
        tasks: &[Task],
        ledger: &mut MonitorLedger,
        now: DateTime<Utc>,
    ) -> RunSummary {
        debug!(tasks = tasks.len(), monitored = ledger.len(), "task snapshot received");

        let mut summary = RunSummary::new(self.dry_run());
        for task in tasks {
            self.process_task(client, ledger, task, now, &mut summary).await;
        }

        let present: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        for (id, entry) in ledger.retain_present(&present) {
            info!(
                task_id = %id,
                name = %entry.name,
                condition = %entry.condition,
                "task vanished from client, dropping monitor entry"
            );
            summary.removed_from_monitor += 1;
        }

        summary
    }

    async fn process_task(
        &self,
        client: &dyn TorrentClient,
        ledger: &mut MonitorLedger,
        task: &Task,
        now: DateTime<Utc>,
        summary: &mut RunSummary,
    ) {
        if let Some(reason) = skip_reason(task, &self.config.monitor, now) {
            debug!(task_id = %task.id, name = %task.name, reason = %reason, "skipping task");
            summary.skipped += 1;
            drop_entry(ledger, task, "skipped", summary);
            return;
        }

        let class = classify(task, &self.config.classification);
        match class.population {
            Population::Protected => {
                drop_entry(ledger, task, "protected", summary);
                if task.state.is_severe_error() {
                    let reason = format!("protected task in {} state", task.state);
                    let outcome = execute(client, task, false, self.dry_run()).await;
                    record(summary, task, &outcome, ReportAction::Deleted, FileAction::TaskOnly, reason);
                }
            }
            Population::Unclassified => {
                drop_entry(ledger, task, "unclassified", summary);
            }
            Population::Managed if task.state.is_severe_error() => {
                drop_entry(ledger, task, "severe error", summary);
                let reason = format!("severe error state: {}", task.state);
                let outcome = execute(client, task, true, self.dry_run()).await;
                record(summary, task, &outcome, ReportAction::Deleted, FileAction::WithFiles, reason);
            }
            Population::Managed => match effective_condition(task) {
                Some(condition) => {
                    let decision = decide(
                        ledger.get(&task.id),
                        condition,
                        task,
                        class.is_freeleech,
                        &self.config.monitor,
                        now,
                    );
                    match decision {
                        DurationDecision::StartMonitoring(entry) => {
                            info!(
                                task_id = %task.id,
                                name = %task.name,
                                condition = %condition,
                                freeleech = entry.is_freeleech,
                                "monitoring task"
                            );
                            ledger.insert(task.id.clone(), entry);
                            summary.newly_monitored += 1;
                        }
                        DurationDecision::Keep { elapsed, threshold } => {
                            debug!(
                                task_id = %task.id,
                                condition = %condition,
                                elapsed_mins = elapsed.num_minutes(),
                                threshold_mins = threshold.num_minutes(),
                                "condition persists, below threshold"
                            );
                            summary.rechecked += 1;
                        }
                        DurationDecision::Delete { reason } => {
                            let outcome = execute(client, task, true, self.dry_run()).await;
                            if outcome.is_success() && ledger.remove(&task.id).is_some() {
                                summary.removed_from_monitor += 1;
                            }
                            record(summary, task, &outcome, ReportAction::Deleted, FileAction::WithFiles, reason);
                        }
                    }
                }
                None => {
                    drop_entry(ledger, task, "healthy", summary);
                    if !task.state.is_active_seeding() {
                        return;
                    }
                    if let Some(r) =
                        retirement::evaluate(task, class.is_freeleech, &self.config.retirement, now)
                    {
                        info!(task_id = %task.id, name = %task.name, rule = %r.rule, "retiring task");
                        let outcome = execute(client, task, true, self.dry_run()).await;
                        record(summary, task, &outcome, ReportAction::Retired, FileAction::WithFiles, r.reason);
                    }
                }
            },
        }
    }

    /// Render, log and (when warranted) send the run report.
    ///
    /// Delivery failures are logged and never propagated.
    pub async fn publish(&self, summary: &RunSummary, notifier: Option<&dyn Notifier>) {
        let notifications = &self.config.notifications;
        let html = render_html(summary, notifications.max_report_items);
        summary.log();
        debug!(report = %html, "rendered report");

        let Some(notifier) = notifier else {
            return;
        };
        if notifications.skip_idle_reports && !summary.is_noteworthy() {
            debug!("idle run, report not sent");
            return;
        }
        match notifier.send(&html).await {
            Ok(()) => info!("report sent"),
            Err(e) => error!(error = %e, "failed to send report"),
        }
    }
}

fn drop_entry(ledger: &mut MonitorLedger, task: &Task, why: &str, summary: &mut RunSummary) {
    if let Some(entry) = ledger.remove(&task.id) {
        info!(
            task_id = %task.id,
            name = %task.name,
            condition = %entry.condition,
            why,
            "removed from monitor"
        );
        summary.removed_from_monitor += 1;
    }
}

fn record(
    summary: &mut RunSummary,
    task: &Task,
    outcome: &DeleteOutcome,
    action: ReportAction,
    files: FileAction,
    reason: String,
) {
    let (action, reason) = match outcome {
        DeleteOutcome::Failed(msg) => (ReportAction::Failed, format!("{reason}: {msg}")),
        _ => {
            match action {
                ReportAction::Retired => summary.retired += 1,
                _ => summary.deleted += 1,
            }
            (action, reason)
        }
    };
    summary.items.push(ReportItem {
        name: task.name.clone(),
        task_id: task.id.clone(),
        action,
        files,
        reason,
        simulated: *outcome == DeleteOutcome::Simulated,
    });
}
