//! Identifier-based tile matching.
//!
//! Local and remote tiles are matched by `(group_id, intensity, action)`,
//! never by row id and never by group display name. A tile without a
//! `group_id` cannot be matched and is rejected with an error rather than
//! matched loosely.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::db::TileRepository;
use crate::models::CustomTile;

/// Errors from the matching layer.
#[derive(Debug)]
pub enum MatcherError {
    /// Tile has no group identifier. The action text is carried for
    /// diagnostics.
    MissingGroupId(String),
    /// Tile has no intensity. Zero is valid; absence is not.
    MissingIntensity(String),
    /// Tile action is blank.
    BlankAction,
    /// Local store error.
    Store(sqlx::Error),
}

impl std::fmt::Display for MatcherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatcherError::MissingGroupId(action) => {
                write!(f, "Tile '{}' has no group_id; cannot match", action)
            }
            MatcherError::MissingIntensity(action) => {
                write!(f, "Tile '{}' has no intensity; cannot match", action)
            }
            MatcherError::BlankAction => write!(f, "Tile has a blank action; cannot match"),
            MatcherError::Store(e) => write!(f, "Store error: {}", e),
        }
    }
}

impl std::error::Error for MatcherError {}

impl From<sqlx::Error> for MatcherError {
    fn from(e: sqlx::Error) -> Self {
        MatcherError::Store(e)
    }
}

/// Checks that a tile carries everything matching needs: a group id, an
/// intensity, and a non-blank action. Locale and game mode are not required
/// here; they have defaults.
pub fn validate_tile_for_matching(tile: &CustomTile) -> Result<(), MatcherError> {
    if tile.group_id.trim().is_empty() {
        return Err(MatcherError::MissingGroupId(tile.action.clone()));
    }
    if tile.intensity.is_none() {
        return Err(MatcherError::MissingIntensity(tile.action.clone()));
    }
    if tile.action.trim().is_empty() {
        return Err(MatcherError::BlankAction);
    }
    Ok(())
}

/// Canonical match key: `group_id|intensity|action`.
pub fn match_key(tile: &CustomTile) -> Result<String, MatcherError> {
    if tile.group_id.trim().is_empty() {
        return Err(MatcherError::MissingGroupId(tile.action.clone()));
    }
    let intensity = tile
        .intensity
        .ok_or_else(|| MatcherError::MissingIntensity(tile.action.clone()))?;
    Ok(format!(
        "{}|{}|{}",
        tile.group_id,
        intensity,
        tile.action.trim()
    ))
}

fn loose_key(tile: &CustomTile) -> Result<String, MatcherError> {
    Ok(match_key(tile)?.to_lowercase())
}

/// Structural equality over the match key. Ids, tags, and flags do not
/// participate.
pub fn tiles_equal(a: &CustomTile, b: &CustomTile) -> Result<bool, MatcherError> {
    Ok(match_key(a)? == match_key(b)?)
}

/// A matched local tile.
#[derive(Debug, Clone)]
pub struct TileMatch {
    pub tile: CustomTile,
    /// False when the action matched only case-insensitively. Diagnostic;
    /// callers treat loose matches as matches so merges never duplicate.
    pub exact: bool,
}

/// Finds the local custom tile matching `tile`, if any.
///
/// One store query per call (the tile's group); candidates are compared in
/// memory. The first match in insertion order wins; the store is kept
/// duplicate-free by the orchestrator's cleanup pass.
pub async fn find_existing_tile(
    repo: &TileRepository,
    tile: &CustomTile,
) -> Result<Option<TileMatch>, MatcherError> {
    validate_tile_for_matching(tile)?;
    let key = match_key(tile)?;
    let loose = loose_key(tile)?;

    let candidates = repo.get_custom_tiles_by_group(&tile.group_id).await?;

    let mut fallback = None;
    for candidate in candidates {
        let Ok(candidate_key) = match_key(&candidate) else {
            continue;
        };
        if candidate_key == key {
            return Ok(Some(TileMatch {
                tile: candidate,
                exact: true,
            }));
        }
        if fallback.is_none() && candidate_key.to_lowercase() == loose {
            fallback = Some(candidate);
        }
    }

    Ok(fallback.map(|tile| TileMatch { tile, exact: false }))
}

/// Matches found for a batch of tiles, keyed by each input's match key,
/// plus per-tile errors for inputs that could not be matched.
#[derive(Debug, Default)]
pub struct BatchMatches {
    pub matches: HashMap<String, TileMatch>,
    pub errors: Vec<String>,
}

/// Matches many tiles with one store query per distinct group.
///
/// Inputs are grouped by `group_id`; each group's local tiles are fetched
/// once and indexed by match key. If the query for a group fails, that
/// group falls back to one-by-one matching so a single bad group cannot
/// abort the whole batch.
pub async fn batch_find_existing_tiles(
    repo: &TileRepository,
    tiles: &[CustomTile],
) -> BatchMatches {
    let mut out = BatchMatches::default();

    let mut by_group: HashMap<String, Vec<&CustomTile>> = HashMap::new();
    for tile in tiles {
        match validate_tile_for_matching(tile) {
            Ok(()) => by_group
                .entry(tile.group_id.clone())
                .or_default()
                .push(tile),
            Err(e) => out.errors.push(e.to_string()),
        }
    }

    for (group_id, group_tiles) in by_group {
        match repo.get_custom_tiles_by_group(&group_id).await {
            Ok(existing) => {
                let mut exact_index: HashMap<String, CustomTile> = HashMap::new();
                let mut loose_index: HashMap<String, CustomTile> = HashMap::new();
                for candidate in existing {
                    let Ok(key) = match_key(&candidate) else {
                        continue;
                    };
                    loose_index
                        .entry(key.to_lowercase())
                        .or_insert_with(|| candidate.clone());
                    exact_index.entry(key).or_insert(candidate);
                }

                for tile in group_tiles {
                    let Ok(key) = match_key(tile) else { continue };
                    if let Some(found) = exact_index.get(&key) {
                        out.matches.insert(
                            key,
                            TileMatch {
                                tile: found.clone(),
                                exact: true,
                            },
                        );
                    } else if let Some(found) = loose_index.get(&key.to_lowercase()) {
                        out.matches.insert(
                            key,
                            TileMatch {
                                tile: found.clone(),
                                exact: false,
                            },
                        );
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Batch lookup for group '{}' failed ({}); matching its tiles one by one",
                    group_id,
                    e
                );
                for tile in group_tiles {
                    match find_existing_tile(repo, tile).await {
                        Ok(Some(found)) => {
                            if let Ok(key) = match_key(tile) {
                                out.matches.insert(key, found);
                            }
                        }
                        Ok(None) => {}
                        Err(e) => out.errors.push(e.to_string()),
                    }
                }
            }
        }
    }

    out
}

/// Pre-sync health numbers for a set of tiles. Diagnostic only; nothing in
/// the sync flow branches on these.
#[derive(Debug, Default, Serialize)]
pub struct MatchingStats {
    pub total: usize,
    pub with_group_id: usize,
    pub missing_group_id: usize,
    /// Tiles beyond the first sharing a match key.
    pub duplicate_keys: usize,
    pub validation_errors: Vec<String>,
}

pub fn matching_stats(tiles: &[CustomTile]) -> MatchingStats {
    let mut stats = MatchingStats {
        total: tiles.len(),
        ..Default::default()
    };

    let mut seen = HashSet::new();
    for tile in tiles {
        if tile.group_id.trim().is_empty() {
            stats.missing_group_id += 1;
        } else {
            stats.with_group_id += 1;
        }

        if let Err(e) = validate_tile_for_matching(tile) {
            stats.validation_errors.push(e.to_string());
        }

        if let Ok(key) = match_key(tile) {
            if !seen.insert(key) {
                stats.duplicate_keys += 1;
            }
        }
    }

    stats
}

/// Deletes all but the first tile per match key. Idempotent; run by the
/// orchestrator before matching so first-match-wins is well defined.
pub async fn cleanup_duplicate_tiles(repo: &TileRepository) -> Result<usize, MatcherError> {
    let tiles = repo.get_custom_tiles().await?;

    let mut seen = HashSet::new();
    let mut removed = 0;
    for tile in tiles {
        let Ok(key) = match_key(&tile) else {
            // Keyless tiles cannot be judged duplicates of anything.
            continue;
        };
        if !seen.insert(key) {
            if let Some(id) = tile.id {
                repo.delete(id).await?;
                removed += 1;
            }
        }
    }

    if removed > 0 {
        tracing::info!("Removed {} duplicate custom tiles", removed);
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    async fn setup() -> (TileRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(Some(temp_dir.path().join("test.db"))).await.unwrap();
        (TileRepository::new(pool), temp_dir)
    }

    #[test]
    fn test_match_key_shape() {
        let tile = CustomTile::new("grp-1", 2, "  Sing a song  ");
        assert_eq!(match_key(&tile).unwrap(), "grp-1|2|Sing a song");
    }

    #[test]
    fn test_match_key_requires_group_id() {
        let mut tile = CustomTile::new("", 2, "Sing");
        assert!(matches!(
            match_key(&tile),
            Err(MatcherError::MissingGroupId(_))
        ));

        tile.group_id = "   ".to_string();
        assert!(matches!(
            match_key(&tile),
            Err(MatcherError::MissingGroupId(_))
        ));
    }

    #[test]
    fn test_match_key_requires_intensity() {
        let mut tile = CustomTile::new("grp-1", 0, "Sing");
        tile.intensity = None;
        assert!(matches!(
            match_key(&tile),
            Err(MatcherError::MissingIntensity(_))
        ));
    }

    #[test]
    fn test_match_key_zero_intensity_is_valid() {
        let tile = CustomTile::new("grp-1", 0, "Sing");
        assert_eq!(match_key(&tile).unwrap(), "grp-1|0|Sing");
    }

    #[test]
    fn test_tiles_equal_ignores_id_tags_enabled() {
        let mut a = CustomTile::new("grp-1", 2, "Sing");
        a.id = Some(1);
        a.tags = vec!["music".into()];
        let mut b = CustomTile::new("grp-1", 2, "Sing");
        b.id = Some(99);
        b.is_enabled = false;

        assert!(tiles_equal(&a, &b).unwrap());
    }

    #[test]
    fn test_tiles_equal_fails_without_group_id() {
        let a = CustomTile::new("grp-1", 2, "Sing");
        let b = CustomTile::new("", 2, "Sing");
        assert!(tiles_equal(&a, &b).is_err());
        assert!(tiles_equal(&b, &a).is_err());
    }

    #[test]
    fn test_validate_tile() {
        assert!(validate_tile_for_matching(&CustomTile::new("g", 0, "A")).is_ok());
        assert!(validate_tile_for_matching(&CustomTile::new("g", 0, "  ")).is_err());
        assert!(validate_tile_for_matching(&CustomTile::new("", 0, "A")).is_err());
    }

    #[tokio::test]
    async fn test_find_existing_tile_exact() {
        let (repo, _temp) = setup().await;
        repo.add_custom_tile(&CustomTile::new("grp-1", 2, "Sing"))
            .await
            .unwrap();

        let found = find_existing_tile(&repo, &CustomTile::new("grp-1", 2, "Sing"))
            .await
            .unwrap()
            .unwrap();

        assert!(found.exact);
        assert_eq!(found.tile.action, "Sing");
    }

    #[tokio::test]
    async fn test_find_existing_tile_loose_case() {
        let (repo, _temp) = setup().await;
        repo.add_custom_tile(&CustomTile::new("grp-1", 2, "Sing A Song"))
            .await
            .unwrap();

        let found = find_existing_tile(&repo, &CustomTile::new("grp-1", 2, "sing a song"))
            .await
            .unwrap()
            .unwrap();

        assert!(!found.exact);
    }

    #[tokio::test]
    async fn test_find_existing_tile_none() {
        let (repo, _temp) = setup().await;
        repo.add_custom_tile(&CustomTile::new("grp-1", 2, "Sing"))
            .await
            .unwrap();

        // Different intensity is a different tile.
        let found = find_existing_tile(&repo, &CustomTile::new("grp-1", 3, "Sing"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_find_existing_tile_rejects_missing_group_id() {
        let (repo, _temp) = setup().await;
        let result = find_existing_tile(&repo, &CustomTile::new("", 2, "Sing")).await;
        assert!(matches!(result, Err(MatcherError::MissingGroupId(_))));
    }

    #[tokio::test]
    async fn test_batch_matches_across_groups() {
        let (repo, _temp) = setup().await;
        repo.add_custom_tile(&CustomTile::new("grp-1", 1, "A"))
            .await
            .unwrap();
        repo.add_custom_tile(&CustomTile::new("grp-2", 1, "B"))
            .await
            .unwrap();

        let inputs = vec![
            CustomTile::new("grp-1", 1, "A"),
            CustomTile::new("grp-2", 1, "B"),
            CustomTile::new("grp-2", 2, "C"),
        ];
        let batch = batch_find_existing_tiles(&repo, &inputs).await;

        assert_eq!(batch.matches.len(), 2);
        assert!(batch.errors.is_empty());
        assert!(batch.matches.contains_key("grp-1|1|A"));
        assert!(batch.matches.contains_key("grp-2|1|B"));
    }

    #[tokio::test]
    async fn test_batch_records_invalid_tiles_and_continues() {
        let (repo, _temp) = setup().await;
        repo.add_custom_tile(&CustomTile::new("grp-1", 1, "A"))
            .await
            .unwrap();

        let inputs = vec![
            CustomTile::new("grp-1", 1, "A"),
            CustomTile::new("", 1, "No group"),
        ];
        let batch = batch_find_existing_tiles(&repo, &inputs).await;

        assert_eq!(batch.matches.len(), 1);
        assert_eq!(batch.errors.len(), 1);
        assert!(batch.errors[0].contains("No group"));
    }

    #[test]
    fn test_matching_stats() {
        let mut no_intensity = CustomTile::new("grp-1", 0, "C");
        no_intensity.intensity = None;

        let tiles = vec![
            CustomTile::new("grp-1", 1, "A"),
            CustomTile::new("grp-1", 1, "A"), // duplicate key
            CustomTile::new("", 1, "B"),      // missing group
            no_intensity,
        ];

        let stats = matching_stats(&tiles);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.with_group_id, 3);
        assert_eq!(stats.missing_group_id, 1);
        assert_eq!(stats.duplicate_keys, 1);
        assert_eq!(stats.validation_errors.len(), 2);
    }

    #[tokio::test]
    async fn test_cleanup_duplicate_tiles() {
        let (repo, _temp) = setup().await;
        let keep = repo
            .add_custom_tile(&CustomTile::new("grp-1", 1, "A"))
            .await
            .unwrap();
        repo.add_custom_tile(&CustomTile::new("grp-1", 1, "A"))
            .await
            .unwrap();
        repo.add_custom_tile(&CustomTile::new("grp-1", 2, "A"))
            .await
            .unwrap();

        let removed = cleanup_duplicate_tiles(&repo).await.unwrap();
        assert_eq!(removed, 1);

        // First-inserted survives.
        assert!(repo.get_by_id(keep).await.unwrap().is_some());
        assert_eq!(repo.count_custom().await.unwrap(), 2);

        // Idempotent.
        assert_eq!(cleanup_duplicate_tiles(&repo).await.unwrap(), 0);
    }
}
