use chrono::{DateTime, Utc};
use sw_core::config::Config;
use sw_core::store::{MonitorLedger, MonitorStore};

/// Print the monitor ledger without contacting the client.
pub fn run(config: &Config) -> anyhow::Result<()> {
    let store = MonitorStore::new(
        config.monitor.resolved_store_path(),
        config.monitor.corrupt_backups_retained,
    );
    let ledger = store.load();

    println!("monitor store: {}", store.path().display());
    println!("{}", "-".repeat(40));
    if ledger.is_empty() {
        println!("no tasks under monitoring");
        return Ok(());
    }
    for line in format_entries(&ledger, Utc::now()) {
        println!("{line}");
    }
    println!("{} task(s) monitored", ledger.len());
    Ok(())
}

fn format_entries(ledger: &MonitorLedger, now: DateTime<Utc>) -> Vec<String> {
    ledger
        .iter()
        .map(|(id, entry)| {
            let fl = if entry.is_freeleech { " [FL]" } else { "" };
            format!(
                "{id}  {:<24} {:>5}m  {}{fl}",
                entry.condition.as_str(),
                entry.elapsed(now).num_minutes(),
                entry.name
            )
        })
        .collect()
}
