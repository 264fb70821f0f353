//! Background scheduler for periodic ledger sync.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};
use txsync_core::errors::Result;
use txsync_core::sync::SyncRunReport;

use crate::main_lib::WorkerState;

/// Initial delay before the first scheduled run.
const INITIAL_DELAY_SECS: u64 = 5;

/// Starts the background sync loop. The first run happens after a short delay,
/// then once per `every`.
pub fn start_sync_scheduler(state: Arc<WorkerState>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Ledger sync scheduler started ({}s interval)", every.as_secs());

        tokio::time::sleep(Duration::from_secs(INITIAL_DELAY_SECS)).await;

        let mut sync_interval = interval(every);
        // A long run should not trigger a burst of catch-up runs.
        sync_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            sync_interval.tick().await;
            if let Err(e) = run_scheduled_sync(&state).await {
                error!("Scheduled sync could not list users: {}", e);
            }
        }
    })
}

/// Runs one sync pass over every user and logs a summary.
///
/// Fails only when the user directory cannot be listed.
pub async fn run_scheduled_sync(state: &Arc<WorkerState>) -> Result<SyncRunReport> {
    info!("Running scheduled ledger sync...");

    let run = state.orchestrator.sync_all_users().await?;

    for failure in &run.start_failures {
        warn!(
            user_id = %failure.user_id,
            "User sync could not start: {}",
            failure.error
        );
    }
    for report in run.users.iter().filter(|r| r.failed_count() > 0) {
        for (account_id, outcome) in report.accounts.iter().filter(|(_, o)| o.status.is_failure()) {
            warn!(
                user_id = %report.user_id,
                account_id = %account_id,
                status = %outcome.status,
                "Account sync failed: {}",
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    info!(
        users = run.users.len(),
        skipped_users = run.start_failures.len(),
        appended = run.appended_total(),
        failed = run.failed_accounts(),
        "Scheduled ledger sync completed"
    );
    Ok(run)
}

/// Single pass for `TXSYNC_RUN_ONCE`: any listing, start, or account
/// failure turns into an error so the process exits non-zero.
pub async fn run_once(state: &Arc<WorkerState>) -> anyhow::Result<()> {
    let run = run_scheduled_sync(state).await?;
    if !run.start_failures.is_empty() {
        anyhow::bail!("{} user(s) could not be synced", run.start_failures.len());
    }
    if run.failed_accounts() > 0 {
        anyhow::bail!("{} account(s) failed to sync", run.failed_accounts());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use txsync_connect::{
        LogProgressReporter, PlaidApiClient, PlaidConfig, PlaidEnvironment, SyncConfig,
        SyncOrchestrator,
    };
    use txsync_core::errors::{DatabaseError, Error};
    use txsync_core::transactions::{LedgerMerger, LedgerRepositoryTrait};
    use txsync_core::users::{LinkedAccount, UserDirectoryTrait};
    use txsync_storage_sqlite::{create_pool, init, run_migrations, spawn_writer, LedgerRepository};

    /// Directory that lists `users` but whose other lookups depend on the flags.
    struct FlakyDirectory {
        users: Vec<String>,
        listing_fails: bool,
    }

    fn unavailable() -> Error {
        Error::Database(DatabaseError::ConnectionFailed("directory unavailable".to_string()))
    }

    impl UserDirectoryTrait for FlakyDirectory {
        fn user_exists(&self, user_id: &str) -> txsync_core::errors::Result<bool> {
            Ok(self.users.iter().any(|u| u == user_id))
        }

        fn accounts_of(&self, _user_id: &str) -> txsync_core::errors::Result<Vec<LinkedAccount>> {
            Err(unavailable())
        }

        fn list_user_ids(&self) -> txsync_core::errors::Result<Vec<String>> {
            if self.listing_fails {
                return Err(unavailable());
            }
            Ok(self.users.clone())
        }
    }

    async fn state_with(directory: FlakyDirectory, dir: &tempfile::TempDir) -> Arc<WorkerState> {
        let db_path = init(&dir.path().join("txsync.db").to_string_lossy()).unwrap();
        let pool = create_pool(&db_path).unwrap();
        run_migrations(&pool).unwrap();
        let writer = spawn_writer((*pool).clone());

        let ledgers: Arc<dyn LedgerRepositoryTrait> =
            Arc::new(LedgerRepository::new(pool.clone(), writer));
        let directory: Arc<dyn UserDirectoryTrait> = Arc::new(directory);
        let merger = Arc::new(LedgerMerger::new(ledgers.clone(), directory.clone()));
        let api = Arc::new(
            PlaidApiClient::new(PlaidConfig::new(
                PlaidEnvironment::Sandbox,
                "client".to_string(),
                "secret".to_string(),
            ))
            .unwrap(),
        );

        Arc::new(WorkerState {
            orchestrator: SyncOrchestrator::new(
                api,
                directory,
                ledgers,
                merger,
                Arc::new(LogProgressReporter),
                SyncConfig::default(),
            ),
        })
    }

    #[tokio::test]
    async fn test_unlistable_directory_fails_the_pass() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(
            FlakyDirectory {
                users: vec!["alice".to_string()],
                listing_fails: true,
            },
            &dir,
        )
        .await;

        assert!(matches!(
            run_scheduled_sync(&state).await,
            Err(Error::Database(_))
        ));
        assert!(run_once(&state).await.is_err());
    }

    #[tokio::test]
    async fn test_user_that_could_not_start_fails_run_once() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(
            FlakyDirectory {
                users: vec!["alice".to_string()],
                listing_fails: false,
            },
            &dir,
        )
        .await;

        let run = run_scheduled_sync(&state).await.unwrap();
        assert!(run.users.is_empty());
        assert_eq!(run.start_failures.len(), 1);
        assert_eq!(run.start_failures[0].user_id, "alice");

        let err = run_once(&state).await.unwrap_err();
        assert!(err.to_string().contains("could not be synced"));
    }
}
