// Raffle entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Open the shared snapshot database
// 4. Join the sync network (host the hub if nobody else does)
// 5. Build the raffle context and its orchestrator state
// 6. Spawn the orchestrator task
// 7. Run the TUI until the user quits
// 8. Cleanup on exit

use std::sync::Arc;

use raffle_app::app;
use raffle_core::config;
use raffle_core::db::SqliteStore;
use raffle_core::raffle::{AccessMode, Raffle};
use raffle_core::sync;
use raffle_tui::tui;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mode = parse_mode(std::env::args().skip(1))?;

    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("Raffle starting up in {:?} mode", mode);

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: title={}, hub port {}, poll every {} ms",
        config.event.title, config.sync.hub_port, config.sync.poll_interval_ms
    );

    // 3. Open database
    let cwd = std::env::current_dir()?;
    let db_path = config.db_path(&cwd).context("failed to resolve database path")?;
    let db_path = db_path.to_string_lossy().into_owned();
    let store = SqliteStore::open(&db_path).context("failed to open database")?;
    info!("Database opened at {}", db_path);

    // 4. Join the sync network
    let link = if config.sync.enabled {
        sync::start(config.sync.hub_port).await
    } else {
        info!("Sync disabled in config; relying on polling");
        sync::disabled()
    };
    if link.hosting {
        info!("This context hosts the sync hub");
    }

    // 5. Build the context
    let raffle = Raffle::new(Arc::new(store), link.notifier, mode, config.labels());
    if raffle.is_degraded() {
        error!("Initial snapshot could not be read; starting from an empty view");
    }
    let state = app::AppState::new(raffle, config.event.title.clone());

    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    // 6. Spawn the orchestrator
    let poll_interval = config.poll_interval();
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, ui_tx, state, poll_interval).await {
            error!("Application loop error: {}", e);
        }
    });

    // 7. Run the TUI event loop (blocking until the user quits)
    if let Err(e) = tui::run(ui_rx, cmd_tx).await {
        error!("TUI error: {}", e);
    }

    // 8. Cleanup: wait for the orchestrator to finish (with timeout)
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("Raffle shut down cleanly");
    Ok(())
}

/// Pick the access mode from the command line.
///
/// `--join` (or `--mode join`) opens the registration kiosk; anything else
/// runs the operator dashboard.
fn parse_mode<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<AccessMode> {
    let mut args = args.into_iter();
    let mut mode = AccessMode::Operator;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--join" => mode = AccessMode::RegistrationOnly,
            "--mode" => {
                let value = args.next().context("--mode needs a value")?;
                mode = if value == "join" {
                    AccessMode::RegistrationOnly
                } else {
                    AccessMode::Operator
                };
            }
            other => anyhow::bail!("unknown argument: {other} (usage: raffle [--join])"),
        }
    }
    Ok(mode)
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("raffle.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("raffle_core=info,raffle_app=info,raffle_tui=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn default_mode_is_operator() {
        assert_eq!(parse_mode(args(&[])).unwrap(), AccessMode::Operator);
    }

    #[test]
    fn join_flags_select_registration() {
        assert_eq!(parse_mode(args(&["--join"])).unwrap(), AccessMode::RegistrationOnly);
        assert_eq!(parse_mode(args(&["--mode", "join"])).unwrap(), AccessMode::RegistrationOnly);
        assert_eq!(parse_mode(args(&["--mode", "operator"])).unwrap(), AccessMode::Operator);
    }

    #[test]
    fn bad_arguments_are_rejected() {
        assert!(parse_mode(args(&["--mode"])).is_err());
        assert!(parse_mode(args(&["--frobnicate"])).is_err());
    }
}
