//! Shared plumbing for the sync subsystem.
//!
//! Every synchronizer receives a [`SyncContext`] carrying the local
//! repositories, the remote account client, and the signed-in user. The
//! context is an explicit dependency rather than a global so the subsystem
//! can be exercised against throwaway stores.

use sqlx::SqlitePool;
use std::time::Duration;

use crate::config::SyncConfig;
use crate::db::{BoardRepository, GroupRepository, SettingsRepository, TileRepository};
use crate::models::{CustomGroup, CustomTile, GameBoard};
use crate::remote::{AccountClient, RemoteError, UserDocument};

/// Pause between a destructive bulk operation and the writes that depend on
/// it, and between consecutive remote pushes.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Errors that can escape the sync subsystem.
///
/// Only [`SyncError::Unauthenticated`] ever reaches the caller of a full
/// sync; everything else is folded into per-synchronizer results.
#[derive(Debug)]
pub enum SyncError {
    /// No signed-in user; sync is meaningless without one
    Unauthenticated,
    /// Account service error
    Remote(RemoteError),
    /// Local store error
    Store(sqlx::Error),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Unauthenticated => {
                write!(f, "Not signed in. Add user_id to the sync config.")
            }
            SyncError::Remote(e) => write!(f, "Remote error: {}", e),
            SyncError::Store(e) => write!(f, "Store error: {}", e),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<RemoteError> for SyncError {
    fn from(e: RemoteError) -> Self {
        SyncError::Remote(e)
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(e: sqlx::Error) -> Self {
        SyncError::Store(e)
    }
}

/// Options for a sync run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Treat remote as authoritative: replace local state instead of
    /// merging.
    pub force: bool,
}

/// Uniform result shape produced by every synchronizer.
///
/// `success` reports whether the operation itself completed; per-item
/// failures are recorded in `errors` without failing the operation.
#[derive(Debug, Clone, Default)]
pub struct SyncResult {
    pub success: bool,
    pub items_processed: usize,
    pub errors: Vec<String>,
}

impl SyncResult {
    pub fn ok(items_processed: usize) -> Self {
        Self {
            success: true,
            items_processed,
            errors: Vec::new(),
        }
    }

    pub fn ok_with_errors(items_processed: usize, errors: Vec<String>) -> Self {
        Self {
            success: true,
            items_processed,
            errors,
        }
    }

    /// Records an operation-level failure under `operation`'s name.
    pub fn failed(operation: &str, error: impl std::fmt::Display) -> Self {
        tracing::error!("{} failed: {}", operation, error);
        Self {
            success: false,
            items_processed: 0,
            errors: vec![format!("{}: {}", operation, error)],
        }
    }
}

/// Dependency bundle shared by the synchronizers.
pub struct SyncContext {
    pub tiles: TileRepository,
    pub groups: GroupRepository,
    pub boards: BoardRepository,
    pub settings: SettingsRepository,
    pub remote: AccountClient,
    user_id: Option<String>,
    settle_delay: Duration,
}

impl SyncContext {
    pub fn new(pool: SqlitePool, remote: AccountClient, user_id: Option<String>) -> Self {
        Self {
            tiles: TileRepository::new(pool.clone()),
            groups: GroupRepository::new(pool.clone()),
            boards: BoardRepository::new(pool.clone()),
            settings: SettingsRepository::new(pool),
            remote,
            user_id,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Creates a context from the sync config.
    pub fn from_config(pool: SqlitePool, config: &SyncConfig) -> Result<Self, RemoteError> {
        let remote = AccountClient::from_config(config)?;
        Ok(Self::new(pool, remote, config.user_id.clone()))
    }

    /// Overrides the settle delay. Tests use zero.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// The signed-in user, or an unauthenticated error. There is no
    /// anonymous fallback at this layer.
    pub fn authenticated_user(&self) -> Result<&str, SyncError> {
        self.user_id
            .as_deref()
            .filter(|user| !user.is_empty())
            .ok_or(SyncError::Unauthenticated)
    }

    /// Fetches the signed-in user's account document. `None` means the user
    /// has never synced.
    pub async fn fetch_user_document(&self) -> Result<Option<UserDocument>, SyncError> {
        let user = self.authenticated_user()?;
        Ok(self.remote.fetch_user_document(user).await?)
    }

    /// Waits for a preceding destructive write to settle before dependent
    /// writes begin. A best-effort ordering fence, not a correctness
    /// guarantee.
    pub async fn settle(&self) {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
    }

    // ========== Remote push helpers ==========

    pub async fn push_custom_tiles(&self, tiles: &[CustomTile]) -> Result<(), SyncError> {
        let user = self.authenticated_user()?;
        Ok(self.remote.push_custom_tiles(user, tiles).await?)
    }

    pub async fn push_custom_groups(&self, groups: &[CustomGroup]) -> Result<(), SyncError> {
        let user = self.authenticated_user()?;
        Ok(self.remote.push_custom_groups(user, groups).await?)
    }

    pub async fn push_disabled_defaults(&self, refs: &[String]) -> Result<(), SyncError> {
        let user = self.authenticated_user()?;
        Ok(self.remote.push_disabled_defaults(user, refs).await?)
    }

    pub async fn push_game_boards(&self, boards: &[GameBoard]) -> Result<(), SyncError> {
        let user = self.authenticated_user()?;
        Ok(self.remote.push_game_boards(user, boards).await?)
    }

    pub async fn push_settings(
        &self,
        settings: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), SyncError> {
        let user = self.authenticated_user()?;
        Ok(self.remote.push_settings(user, settings).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    async fn context_with_user(user: Option<&str>) -> (SyncContext, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(Some(temp_dir.path().join("test.db"))).await.unwrap();
        let remote = AccountClient::new("http://127.0.0.1:1", "test-key");
        let ctx = SyncContext::new(pool, remote, user.map(String::from))
            .with_settle_delay(Duration::ZERO);
        (ctx, temp_dir)
    }

    #[tokio::test]
    async fn test_authenticated_user_present() {
        let (ctx, _temp) = context_with_user(Some("u1")).await;
        assert_eq!(ctx.authenticated_user().unwrap(), "u1");
    }

    #[tokio::test]
    async fn test_authenticated_user_missing() {
        let (ctx, _temp) = context_with_user(None).await;
        assert!(matches!(
            ctx.authenticated_user(),
            Err(SyncError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_authenticated_user_empty_string() {
        let (ctx, _temp) = context_with_user(Some("")).await;
        assert!(matches!(
            ctx.authenticated_user(),
            Err(SyncError::Unauthenticated)
        ));
    }

    #[test]
    fn test_sync_result_constructors() {
        let ok = SyncResult::ok(3);
        assert!(ok.success);
        assert_eq!(ok.items_processed, 3);
        assert!(ok.errors.is_empty());

        let failed = SyncResult::failed("tiles sync", "boom");
        assert!(!failed.success);
        assert_eq!(failed.errors, vec!["tiles sync: boom"]);
    }
}
