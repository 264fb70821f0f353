mod config;
mod main_lib;
mod scheduler;

use config::Config;
use main_lib::{build_state, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();
    let state = build_state(&config).await?;

    if config.run_once {
        return scheduler::run_once(&state).await;
    }

    let handle = scheduler::start_sync_scheduler(state, config.sync_interval);
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested; stopping scheduler");
    handle.abort();
    Ok(())
}
