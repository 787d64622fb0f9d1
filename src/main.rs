use color_eyre::Result;
use std::sync::Arc;
use std::time::Duration;

use tradewatch::adapters::{FileSessionStorage, LogNavigator, ReqwestHttpClient};
use tradewatch::auth::CredentialService;
use tradewatch::config::DashboardConfig;
use tradewatch::credential_watcher::spawn_file_watcher;
use tradewatch::dashboard::Dashboard;
use tradewatch::logging::init_logging;
use tradewatch::resource::StoreContext;

/// Interval between printed snapshots.
const PRINT_INTERVAL: Duration = Duration::from_secs(5);

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<()> {
    if std::env::args().any(|arg| arg == "--version") {
        println!("tradewatch {}", VERSION);
        return Ok(());
    }

    color_eyre::install()?;
    init_logging()?;

    let config = DashboardConfig::from_env()?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(config))
}

async fn run(config: DashboardConfig) -> Result<()> {
    let storage = match &config.storage_dir {
        Some(dir) => FileSessionStorage::in_dir(dir),
        None => FileSessionStorage::new()?,
    };
    tracing::info!(path = %storage.path().display(), api = %config.api_url, "Starting tradewatch");

    let service = Arc::new(CredentialService::new(Arc::new(storage.clone())));

    // Keep the watcher alive for the whole run
    let _file_watcher = match spawn_file_watcher(service.clone(), storage.path()) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::warn!("Session file watcher unavailable, relying on polling: {}", e);
            None
        }
    };

    let http = ReqwestHttpClient::new(config.request_timeout)?;

    let context = StoreContext::new(config, Arc::new(http), service, Arc::new(LogNavigator));
    let dashboard = Dashboard::new(&context);
    dashboard.activate();

    let mut ticker = tokio::time::interval(PRINT_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = dashboard.snapshot();
                println!("{}", serde_json::to_string(&snapshot)?);
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                }
                break;
            }
        }
    }

    dashboard.deactivate();
    tracing::info!("Stopped");
    Ok(())
}
