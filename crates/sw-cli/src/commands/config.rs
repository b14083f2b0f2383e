use anyhow::Context;
use sw_core::config::Config;

/// Print the effective configuration as TOML.
///
/// Only environment variable names are printed, never their values.
pub fn run(config: &Config) -> anyhow::Result<()> {
    let text = config.to_toml().context("failed to serialize config")?;
    println!("{text}");
    Ok(())
}
