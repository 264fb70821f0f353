use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use txsync_connect::{
    LogProgressReporter, PlaidApiClient, PlaidConfig, SyncConfig, SyncOrchestrator,
};
use txsync_core::transactions::{LedgerMerger, LedgerMergerTrait, LedgerRepositoryTrait};
use txsync_core::users::UserDirectoryTrait;
use txsync_storage_sqlite::{
    create_pool, init, run_migrations, spawn_writer, LedgerRepository, UserDirectoryRepository,
};

use crate::config::Config;

pub struct WorkerState {
    pub orchestrator: SyncOrchestrator<LogProgressReporter>,
}

pub fn init_tracing() {
    let log_format = std::env::var("TXSYNC_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Opens the database and wires the store, provider client and orchestrator.
/// Must run inside the Tokio runtime (the write actor is spawned here).
pub async fn build_state(config: &Config) -> anyhow::Result<Arc<WorkerState>> {
    let db_path = init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);
    let pool = create_pool(&db_path)?;
    run_migrations(&pool)?;
    let writer = spawn_writer((*pool).clone());

    let ledgers: Arc<dyn LedgerRepositoryTrait> =
        Arc::new(LedgerRepository::new(pool.clone(), writer));
    let directory: Arc<dyn UserDirectoryTrait> =
        Arc::new(UserDirectoryRepository::new(pool.clone()));
    let merger: Arc<dyn LedgerMergerTrait> =
        Arc::new(LedgerMerger::new(ledgers.clone(), directory.clone()));

    let mut plaid = PlaidConfig::new(
        config.plaid_env,
        config.plaid_client_id.clone(),
        config.plaid_secret.clone(),
    );
    plaid.page_size = config.page_size;
    plaid.request_timeout = config.request_timeout;
    let api = Arc::new(PlaidApiClient::new(plaid)?);
    tracing::info!("Using Plaid API at {}", api.base_url());

    let sync_config = SyncConfig {
        max_pages: config.max_pages,
        page_timeout: Some(config.request_timeout),
        max_concurrent_accounts: config.max_concurrent_accounts,
    };

    let orchestrator = SyncOrchestrator::new(
        api,
        directory,
        ledgers,
        merger,
        Arc::new(LogProgressReporter),
        sync_config,
    );

    Ok(Arc::new(WorkerState { orchestrator }))
}
