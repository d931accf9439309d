//! Dashboard Sync Entry Point
//!
//! Loads the client config, prints the portfolio summary and keeps the
//! alert badge fresh until interrupted.
//!
//! Usage: `dashboard-sync [config.toml]`

use std::path::PathBuf;

use dashboard_sync::{ClientConfig, DashboardSession, SyncResult};
use log::{error, info};

fn load_config() -> SyncResult<ClientConfig> {
    match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => ClientConfig::load(&path),
        None => {
            let mut config = ClientConfig::default();
            config.apply_overrides(|key| std::env::var(key).ok())?;
            Ok(config)
        }
    }
}

async fn run(config: ClientConfig) -> SyncResult<()> {
    let mut session = DashboardSession::connect(config)?;
    session.refresh_portfolio().await?;

    let summary = session.portfolio_summary().await?;
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("event=summary_unprintable error={}", e),
    }

    session.start_polling()?;
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("event=signal_handler_failed error={}", e);
        let _ = rolling_logger::error(&format!("Ctrl-C handler unavailable: {}", e));
    }
    session.stop_polling();
    info!(
        "event=shutdown unread={} badge={:?}",
        session.alerts.unread_count(),
        session.alerts.badge_label()
    );
    Ok(())
}

fn main() {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };
    match config.init_logging() {
        Ok(()) => {
            let banner = format!("dashboard-sync starting against {}", config.base_url);
            let _ = rolling_logger::info(&banner);
        }
        Err(e) => eprintln!("logging disabled: {}", e),
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };
    let local = tokio::task::LocalSet::new();
    if let Err(e) = local.block_on(&runtime, run(config)) {
        error!("event=session_failed error={}", e);
        let _ = rolling_logger::error(&format!("Session failed: {}", e));
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
