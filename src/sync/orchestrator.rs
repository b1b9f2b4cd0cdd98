//! Top-level sync coordinator.
//!
//! Authenticates, fetches the account document, dispatches the five
//! per-entity synchronizers concurrently, and aggregates their results.
//! Only an authentication failure escapes to the caller; everything else
//! is folded into the summary.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use futures::future::join_all;

use crate::sync::boards::GameBoardsSync;
use crate::sync::context::{SyncContext, SyncError, SyncOptions, SyncResult};
use crate::sync::disabled::DisabledDefaultsSync;
use crate::sync::groups::CustomGroupsSync;
use crate::sync::matcher;
use crate::sync::settings::SettingsSync;
use crate::sync::tiles::CustomTilesSync;

type SyncFuture<'f> = Pin<Box<dyn Future<Output = SyncResult> + 'f>>;

/// Aggregated outcome of a full sync run.
#[derive(Debug)]
pub struct SyncSummary {
    /// True only when every synchronizer succeeded.
    pub success: bool,
    pub results: Vec<(&'static str, SyncResult)>,
}

impl SyncSummary {
    fn aggregate(results: Vec<(&'static str, SyncResult)>) -> Self {
        let success = results.iter().all(|(_, result)| result.success);
        for (name, result) in &results {
            if !result.success {
                tracing::error!("{} sync failed: {}", name, result.errors.join("; "));
            }
        }
        Self { success, results }
    }
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, result) in &self.results {
            if result.success {
                let suffix = if result.errors.is_empty() {
                    String::new()
                } else {
                    format!(", {} skipped", result.errors.len())
                };
                writeln!(
                    f,
                    "  ✓ {} ({} item{}{})",
                    name,
                    result.items_processed,
                    if result.items_processed == 1 { "" } else { "s" },
                    suffix
                )?;
            } else {
                writeln!(
                    f,
                    "  ✗ {}: {}",
                    name,
                    result
                        .errors
                        .first()
                        .map(String::as_str)
                        .unwrap_or("unknown error")
                )?;
            }
        }
        Ok(())
    }
}

pub struct SyncOrchestrator<'a> {
    ctx: &'a SyncContext,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(ctx: &'a SyncContext) -> Self {
        Self { ctx }
    }

    /// Runs a full sync against the account document.
    ///
    /// An absent document means the user has never synced; local state is
    /// pushed up instead. There is no cross-entity transaction: a failed
    /// synchronizer never rolls back its siblings' applied changes.
    pub async fn sync_from_remote(
        &self,
        options: &SyncOptions,
    ) -> Result<SyncSummary, SyncError> {
        self.ctx.authenticated_user()?;

        // Matching relies on first-match-wins, so de-duplicate first. A
        // cleanup failure is not fatal.
        if let Err(e) = matcher::cleanup_duplicate_tiles(&self.ctx.tiles).await {
            tracing::warn!("Duplicate tile cleanup failed: {}", e);
        }

        let document = match self.ctx.fetch_user_document().await {
            Ok(Some(document)) => document,
            Ok(None) => return Ok(self.push_all().await),
            Err(SyncError::Unauthenticated) => return Err(SyncError::Unauthenticated),
            Err(e) => {
                return Ok(SyncSummary::aggregate(vec![(
                    "account document",
                    SyncResult::failed("account document fetch", e),
                )]));
            }
        };

        let tiles = CustomTilesSync::new(self.ctx);
        let groups = CustomGroupsSync::new(self.ctx);
        let disabled = DisabledDefaultsSync::new(self.ctx);
        let boards = GameBoardsSync::new(self.ctx);
        let settings = SettingsSync::new(self.ctx);

        // All five run concurrently. Each already folds its own failures
        // into its result, so this join settles everything and
        // short-circuits nothing.
        let tasks: Vec<(&'static str, SyncFuture<'_>)> = vec![
            (
                "custom tiles",
                Box::pin(tiles.sync_from_remote(&document.custom_tiles, options)),
            ),
            (
                "custom groups",
                Box::pin(groups.sync_from_remote(&document.custom_groups, options)),
            ),
            (
                "disabled defaults",
                Box::pin(disabled.sync_from_remote(&document.disabled_defaults, options)),
            ),
            (
                "game boards",
                Box::pin(boards.sync_from_remote(&document.game_boards, options)),
            ),
            (
                "settings",
                Box::pin(settings.sync_from_remote(&document.settings, options)),
            ),
        ];

        let (names, futures): (Vec<_>, Vec<_>) = tasks.into_iter().unzip();
        let settled = join_all(futures).await;
        let results = names.into_iter().zip(settled).collect();

        Ok(SyncSummary::aggregate(results))
    }

    /// First-ever sync: no remote document exists, so every local slice is
    /// pushed up as-is, with a settle between dependent writes.
    async fn push_all(&self) -> SyncSummary {
        tracing::info!("No account document found; pushing local state as first sync");

        let mut results = Vec::new();

        let tiles = match self.ctx.tiles.get_custom_tiles().await {
            Ok(tiles) => tiles,
            Err(e) => {
                results.push(("custom tiles", SyncResult::failed("custom tiles push", e)));
                return SyncSummary::aggregate(results);
            }
        };
        results.push((
            "custom tiles",
            match self.ctx.push_custom_tiles(&tiles).await {
                Ok(()) => SyncResult::ok(tiles.len()),
                Err(e) => SyncResult::failed("custom tiles push", e),
            },
        ));
        self.ctx.settle().await;

        results.push((
            "custom groups",
            match self.ctx.groups.get_custom_groups().await {
                Ok(groups) => match self.ctx.push_custom_groups(&groups).await {
                    Ok(()) => SyncResult::ok(groups.len()),
                    Err(e) => SyncResult::failed("custom groups push", e),
                },
                Err(e) => SyncResult::failed("custom groups push", e),
            },
        ));
        self.ctx.settle().await;

        results.push((
            "disabled defaults",
            match self.ctx.tiles.get_disabled_defaults().await {
                Ok(refs) => match self.ctx.push_disabled_defaults(&refs).await {
                    Ok(()) => SyncResult::ok(refs.len()),
                    Err(e) => SyncResult::failed("disabled defaults push", e),
                },
                Err(e) => SyncResult::failed("disabled defaults push", e),
            },
        ));
        self.ctx.settle().await;

        results.push((
            "game boards",
            match self.ctx.boards.list().await {
                Ok(boards) => match self.ctx.push_game_boards(&boards).await {
                    Ok(()) => SyncResult::ok(boards.len()),
                    Err(e) => SyncResult::failed("game boards push", e),
                },
                Err(e) => SyncResult::failed("game boards push", e),
            },
        ));
        self.ctx.settle().await;

        results.push((
            "settings",
            match self.ctx.settings.get_state().await {
                Ok(state) => {
                    let filtered = crate::models::settings::sanitize_local_settings(&state);
                    match self.ctx.push_settings(&filtered).await {
                        Ok(()) => SyncResult::ok(filtered.len()),
                        Err(e) => SyncResult::failed("settings push", e),
                    }
                }
                Err(e) => SyncResult::failed("settings push", e),
            },
        ));

        SyncSummary::aggregate(results)
    }
}
