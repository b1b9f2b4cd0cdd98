//! Sync CLI commands for synchronizing with the account service.

use clap::{Args, Subcommand};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::remote::{AccountClient, RemoteError};
use crate::sync::{SyncContext, SyncError, SyncOptions, SyncOrchestrator};

/// Sync with the account service
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Treat remote data as authoritative (replace local custom content)
    #[arg(long)]
    force: bool,

    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Show sync configuration and server status
    Status,
}

impl SyncCommand {
    pub async fn run(&self, pool: &SqlitePool, config: &Config) -> Result<(), SyncCommandError> {
        match &self.command {
            None => self.sync(pool, config).await,
            Some(SyncSubcommand::Status) => self.status(config).await,
        }
    }

    async fn sync(&self, pool: &SqlitePool, config: &Config) -> Result<(), SyncCommandError> {
        let ctx = SyncContext::from_config(pool.clone(), &config.sync)?;
        let orchestrator = SyncOrchestrator::new(&ctx);

        if self.force {
            println!("Syncing with account service (force: remote wins)...");
        } else {
            println!("Syncing with account service...");
        }
        println!();

        let options = SyncOptions { force: self.force };
        let summary = orchestrator.sync_from_remote(&options).await?;

        print!("{}", summary);
        println!();
        if summary.success {
            println!("Sync complete.");
        } else {
            println!("Sync finished with errors.");
        }

        Ok(())
    }

    async fn status(&self, config: &Config) -> Result<(), SyncCommandError> {
        println!("Sync Configuration");
        println!("==================");
        println!();

        if !config.sync.is_configured() {
            println!("Status: Not configured");
            println!();
            println!("To enable sync, add to your config file:");
            println!();
            println!("  sync:");
            println!("    server_url: \"https://sync.example.com\"");
            println!("    api_key: \"your-api-key\"");
            println!("    user_id: \"your-user-id\"");
            println!("    auto_sync: false");
            println!();
            println!("Or set environment variables:");
            println!("  PARTYDECK_SYNC_URL");
            println!("  PARTYDECK_SYNC_API_KEY");
            println!("  PARTYDECK_SYNC_USER_ID");
            return Ok(());
        }

        let server_url = config.sync.server_url.as_deref().unwrap_or_default();
        let api_key = config.sync.api_key.as_deref().unwrap_or_default();
        let user_id = config.sync.user_id.as_deref().unwrap_or_default();

        println!("Server:    {}", server_url);
        println!("API Key:   {}...", &api_key[..api_key.len().min(8)]);
        println!("User:      {}", user_id);
        println!(
            "Auto-sync: {}",
            if config.sync.auto_sync {
                "enabled"
            } else {
                "disabled"
            }
        );
        println!();

        print!("Server status: ");
        let client = AccountClient::from_config(&config.sync)?;
        if client.check_server().await {
            println!("✓ reachable");
        } else {
            println!("✗ unreachable");
        }

        Ok(())
    }
}

/// Errors from sync commands
#[derive(Debug)]
pub enum SyncCommandError {
    Remote(RemoteError),
    Sync(SyncError),
}

impl std::fmt::Display for SyncCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncCommandError::Remote(e) => write!(f, "{}", e),
            SyncCommandError::Sync(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SyncCommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncCommandError::Remote(e) => Some(e),
            SyncCommandError::Sync(e) => Some(e),
        }
    }
}

impl From<RemoteError> for SyncCommandError {
    fn from(e: RemoteError) -> Self {
        SyncCommandError::Remote(e)
    }
}

impl From<SyncError> for SyncCommandError {
    fn from(e: SyncError) -> Self {
        SyncCommandError::Sync(e)
    }
}
