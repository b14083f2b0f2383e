use anyhow::Context;
use sw_core::client::{ClientError, Notifier};
use sw_core::config::Config;
use sw_core::store::MonitorStore;
use sw_engine::{CleanupRunner, RunSummary};
use sw_integrations::qbittorrent::QbitClient;
use sw_integrations::telegram::TelegramNotifier;
use tracing::{info, warn};

/// Run the default subcommand: one full cleanup pass.
///
/// Connection and listing failures are reported, then returned so the
/// process exits non-zero.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    let runner = CleanupRunner::new(config);
    let notifier = build_notifier(config);
    let notifier = notifier.as_ref().map(|n| n as &dyn Notifier);

    let client = match QbitClient::connect(&config.qbittorrent).await {
        Ok(client) => client,
        Err(e) => {
            let err = ClientError::from(e);
            let context = match err {
                ClientError::Auth(_) => "authentication failed",
                _ => "connection failed",
            };
            let summary = RunSummary::failure(runner.dry_run(), context, err.to_string());
            runner.publish(&summary, notifier).await;
            return Err(anyhow::Error::new(err).context(format!(
                "could not connect to qBittorrent at {}",
                config.qbittorrent.url
            )));
        }
    };

    let store = MonitorStore::new(
        config.monitor.resolved_store_path(),
        config.monitor.corrupt_backups_retained,
    );
    let summary = runner
        .run_once(&client, &store, notifier)
        .await
        .context("cleanup run aborted")?;

    if summary.failed() > 0 {
        warn!(failed = summary.failed(), "some deletions failed and will be retried next run");
    }
    Ok(())
}

fn build_notifier(config: &Config) -> Option<TelegramNotifier> {
    if !config.notifications.enabled {
        info!("notifications disabled");
        return None;
    }
    match TelegramNotifier::from_config(&config.notifications) {
        Ok(notifier) => Some(notifier),
        Err(e) => {
            warn!(error = %e, "telegram notifier unavailable, reports will only be logged");
            None
        }
    }
}
