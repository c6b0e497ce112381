use std::path::PathBuf;

use anyhow::Context;
use tracing::warn;
use transflow_lib::settings::{AppSettings, load_settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(err) = transflow_lib::init_logging() {
        eprintln!("{err}");
    }

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: transflow <file>")?;

    let settings = load_settings().unwrap_or_else(|err| {
        warn!("failed to load settings, using defaults: {err}");
        AppSettings::default()
    });

    transflow_lib::run_file_session(path, settings)
        .await
        .context("file session failed")?;
    Ok(())
}
