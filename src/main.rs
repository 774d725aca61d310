//! oirelay CLI entry point.
//!
//! One positional argument (the JSON config path) or `--gen-config` to
//! write a blank template. No subcommands.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use oirelay::config::{self, Config};
use oirelay::logging;
use oirelay::relay::Relay;

/// Relay NWWS-OI weather bulletins to a webhook and desktop notifications.
#[derive(Parser)]
#[command(name = "oirelay", version, about)]
struct Cli {
    /// Path to the JSON configuration file.
    config: Option<PathBuf>,

    /// Write a blank configuration template to ./config.json and exit.
    #[arg(short, long)]
    gen_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.gen_config {
        logging::init_cli();
        let path = PathBuf::from("./config.json");
        config::write_template(&path)?;
        info!(path = %path.display(), "configuration template written");
        return Ok(());
    }

    let Some(config_path) = cli.config else {
        anyhow::bail!("a configuration file is required (or pass --gen-config for a template)");
    };

    // The config must be fully populated before the session opens; load
    // and validate before touching the network.
    let config = config::load_config(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    let logs_dir = config::config_dir()?.join("logs");
    let _logging_guard = logging::init_relay(&logs_dir)?;

    log_connection_summary(&config);

    Relay::new(config).run().await
}

/// Log the startup summary with the password and webhook token masked.
fn log_connection_summary(config: &Config) {
    info!(
        username = %config.username,
        password = %config.redacted_password(),
        server = %config.server,
        port = config.port,
        use_tls = config.use_tls,
        resource = %config.resource,
        jid = %config.jid(),
        room = %config.room_jid(),
        webhook = %config.redacted_webhook_url(),
        offices = ?config.wfo_offices,
        notifications = config.enable_notifications,
        "starting bulletin relay"
    );
}
