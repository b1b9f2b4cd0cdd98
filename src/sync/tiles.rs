//! Custom-tile synchronizer.
//!
//! Reconciles the remote custom-tile slice against the local store. Local
//! state wins when both sides exist; `force` makes remote authoritative.

use crate::models::CustomTile;
use crate::sync::context::{SyncContext, SyncOptions, SyncResult};
use crate::sync::matcher;

pub struct CustomTilesSync<'a> {
    ctx: &'a SyncContext,
}

impl<'a> CustomTilesSync<'a> {
    pub fn new(ctx: &'a SyncContext) -> Self {
        Self { ctx }
    }

    pub async fn sync_from_remote(
        &self,
        remote: &[CustomTile],
        options: &SyncOptions,
    ) -> SyncResult {
        // Built-in tiles must never enter the custom merge path, whatever a
        // corrupted remote slice claims.
        let remote: Vec<&CustomTile> = remote
            .iter()
            .filter(|tile| {
                if !tile.is_custom {
                    tracing::warn!(
                        "Skipping non-custom tile '{}' found in remote custom slice",
                        tile.action
                    );
                    return false;
                }
                true
            })
            .collect();

        let local_count = match self.ctx.tiles.count_custom().await {
            Ok(count) => count,
            Err(e) => return SyncResult::failed("custom tiles sync", e),
        };

        if options.force {
            return self.replace_local(&remote).await;
        }
        if remote.is_empty() {
            if local_count == 0 {
                return SyncResult::ok(0);
            }
            return self.push_local().await;
        }
        if local_count == 0 {
            return self.replace_local(&remote).await;
        }
        self.merge(&remote).await
    }

    /// First sync with local-only data: the remote slice becomes a copy of
    /// local state.
    async fn push_local(&self) -> SyncResult {
        let local = match self.ctx.tiles.get_custom_tiles().await {
            Ok(tiles) => tiles,
            Err(e) => return SyncResult::failed("custom tiles push", e),
        };

        match self.ctx.push_custom_tiles(&local).await {
            Ok(()) => SyncResult::ok(local.len()),
            Err(e) => SyncResult::failed("custom tiles push", e),
        }
    }

    /// Wipes local custom tiles and imports the remote slice. Items that
    /// already match are skipped, so a retried replace converges instead of
    /// duplicating.
    async fn replace_local(&self, remote: &[&CustomTile]) -> SyncResult {
        if let Err(e) = self.ctx.tiles.delete_all_custom_tiles().await {
            return SyncResult::failed("custom tiles replace", e);
        }
        // Let the wipe settle before dependent imports land.
        self.ctx.settle().await;

        let mut errors = Vec::new();
        let mut imported = 0;
        for tile in remote {
            match matcher::find_existing_tile(&self.ctx.tiles, tile).await {
                Ok(Some(_)) => {
                    tracing::debug!("Tile '{}' already present; skipping import", tile.action);
                }
                Ok(None) => match self.ctx.tiles.add_custom_tile(tile).await {
                    Ok(_) => imported += 1,
                    Err(e) => errors.push(format!("import '{}': {}", tile.action, e)),
                },
                Err(e) => {
                    tracing::warn!("Skipping remote tile: {}", e);
                    errors.push(e.to_string());
                }
            }
        }

        SyncResult::ok_with_errors(imported, errors)
    }

    /// Merges remote tiles into local state. Matched tiles take only the
    /// enabled flag from remote; unmatched tiles are imported. One bad tile
    /// never stops its siblings.
    async fn merge(&self, remote: &[&CustomTile]) -> SyncResult {
        let owned: Vec<CustomTile> = remote.iter().map(|t| (*t).clone()).collect();
        let batch = matcher::batch_find_existing_tiles(&self.ctx.tiles, &owned).await;

        let mut errors = batch.errors;
        let mut processed = 0;
        for tile in remote {
            // Validation failures were already recorded by the batch pass.
            let Ok(key) = matcher::match_key(tile) else {
                continue;
            };

            match batch.matches.get(&key) {
                Some(found) => {
                    if !found.exact {
                        tracing::debug!(
                            "Tile '{}' matched an existing tile case-insensitively",
                            tile.action
                        );
                    }
                    if found.tile.is_enabled != tile.is_enabled {
                        let Some(id) = found.tile.id else {
                            continue;
                        };
                        if let Err(e) = self.ctx.tiles.set_enabled(id, tile.is_enabled).await {
                            errors.push(format!("update '{}': {}", tile.action, e));
                            continue;
                        }
                    }
                    processed += 1;
                }
                None => match self.ctx.tiles.add_custom_tile(tile).await {
                    Ok(_) => processed += 1,
                    Err(e) => errors.push(format!("import '{}': {}", tile.action, e)),
                },
            }
        }

        // Push the merged state back so both sides converge.
        let merged = match self.ctx.tiles.get_custom_tiles().await {
            Ok(tiles) => tiles,
            Err(e) => return SyncResult::failed("custom tiles merge push", e),
        };
        if let Err(e) = self.ctx.push_custom_tiles(&merged).await {
            let mut result = SyncResult::failed("custom tiles merge push", e);
            result.items_processed = processed;
            result.errors.extend(errors);
            return result;
        }

        SyncResult::ok_with_errors(processed, errors)
    }
}
