//! Auto-sync functionality for CLI commands.
//!
//! Provides opportunistic synchronization around CLI operations when
//! `auto_sync` is enabled in the configuration.

use sqlx::SqlitePool;

use crate::config::Config;
use crate::remote::AccountClient;
use crate::sync::context::{SyncContext, SyncOptions};
use crate::sync::orchestrator::SyncOrchestrator;

/// Performs auto-sync if enabled and the server is reachable.
///
/// This function:
/// 1. Checks if auto_sync is enabled in config
/// 2. Checks if sync is configured (server, key, and user present)
/// 3. Checks if the server is reachable
/// 4. Performs the sync
///
/// Failures degrade gracefully - the CLI must keep working offline when
/// the server is unavailable.
pub async fn try_auto_sync(pool: &SqlitePool, config: &Config) {
    if !config.sync.auto_sync || !config.sync.is_configured() {
        return;
    }

    let client = match AccountClient::from_config(&config.sync) {
        Ok(client) => client,
        Err(_) => return,
    };

    // Check server reachability first (fast fail)
    if !client.check_server().await {
        eprintln!("Auto-sync: server unreachable, skipping");
        return;
    }

    let ctx = SyncContext::new(pool.clone(), client, config.sync.user_id.clone());
    match SyncOrchestrator::new(&ctx)
        .sync_from_remote(&SyncOptions::default())
        .await
    {
        Ok(summary) => {
            if !summary.success {
                eprintln!("Auto-sync finished with errors:");
                eprint!("{}", summary);
            }
        }
        Err(e) => {
            eprintln!("Auto-sync: {}", e);
        }
    }
}
