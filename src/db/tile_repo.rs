use sqlx::SqlitePool;
use std::str::FromStr;

use crate::models::{CustomTile, GameMode};

/// Repository for tiles and the disabled-defaults list.
///
/// Both live here because disabled defaults are references to built-in
/// tiles; no other table touches them.
pub struct TileRepository {
    pool: SqlitePool,
}

// Row types for database queries
#[derive(sqlx::FromRow)]
struct TileRow {
    id: i64,
    group_id: String,
    intensity: i64,
    action: String,
    tags: String,
    game_mode: String,
    locale: String,
    is_custom: i64,
    is_enabled: i64,
}

impl TileRow {
    fn into_tile(self) -> CustomTile {
        let tags: Vec<String> = serde_json::from_str(&self.tags).unwrap_or_default();
        CustomTile {
            id: Some(self.id),
            group_id: self.group_id,
            intensity: Some(self.intensity),
            action: self.action,
            tags,
            game_mode: GameMode::from_str(&self.game_mode).unwrap_or_default(),
            locale: self.locale,
            is_custom: self.is_custom != 0,
            is_enabled: self.is_enabled != 0,
        }
    }
}

impl TileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a custom tile and returns the new row id.
    ///
    /// The tile's own `id` is ignored; local ids are assigned by the store.
    /// A missing intensity is rejected by the NOT NULL constraint rather
    /// than silently defaulted.
    pub async fn add_custom_tile(&self, tile: &CustomTile) -> Result<i64, sqlx::Error> {
        let tags = serde_json::to_string(&tile.tags).unwrap_or_else(|_| "[]".to_string());

        let result = sqlx::query(
            r#"
            INSERT INTO tiles (group_id, intensity, action, tags, game_mode, locale, is_custom, is_enabled)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&tile.group_id)
        .bind(tile.intensity)
        .bind(&tile.action)
        .bind(&tags)
        .bind(tile.game_mode.to_string())
        .bind(&tile.locale)
        .bind(tile.is_custom as i64)
        .bind(tile.is_enabled as i64)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<CustomTile>, sqlx::Error> {
        let row: Option<TileRow> = sqlx::query_as("SELECT * FROM tiles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(TileRow::into_tile))
    }

    /// Lists all custom tiles in insertion order.
    pub async fn get_custom_tiles(&self) -> Result<Vec<CustomTile>, sqlx::Error> {
        let rows: Vec<TileRow> =
            sqlx::query_as("SELECT * FROM tiles WHERE is_custom = 1 ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(TileRow::into_tile).collect())
    }

    /// Lists the custom tiles of one group, in insertion order.
    pub async fn get_custom_tiles_by_group(
        &self,
        group_id: &str,
    ) -> Result<Vec<CustomTile>, sqlx::Error> {
        let rows: Vec<TileRow> = sqlx::query_as(
            "SELECT * FROM tiles WHERE is_custom = 1 AND group_id = ? ORDER BY id",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TileRow::into_tile).collect())
    }

    pub async fn count_custom(&self) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tiles WHERE is_custom = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Updates the enabled flag, the one field sync may legitimately take
    /// from the remote copy of a matched tile.
    pub async fn set_enabled(&self, id: i64, enabled: bool) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tiles SET is_enabled = ? WHERE id = ?")
            .bind(enabled as i64)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_custom_tile(&self, tile: &CustomTile) -> Result<(), sqlx::Error> {
        let id = tile.id.ok_or(sqlx::Error::RowNotFound)?;
        let tags = serde_json::to_string(&tile.tags).unwrap_or_else(|_| "[]".to_string());

        sqlx::query(
            r#"
            UPDATE tiles
            SET group_id = ?, intensity = ?, action = ?, tags = ?,
                game_mode = ?, locale = ?, is_enabled = ?
            WHERE id = ? AND is_custom = 1
            "#,
        )
        .bind(&tile.group_id)
        .bind(tile.intensity)
        .bind(&tile.action)
        .bind(&tags)
        .bind(tile.game_mode.to_string())
        .bind(&tile.locale)
        .bind(tile.is_enabled as i64)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM tiles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Wipes all custom tiles; built-in tiles are untouched.
    pub async fn delete_all_custom_tiles(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tiles WHERE is_custom = 1")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ========== Disabled defaults ==========

    pub async fn get_disabled_defaults(&self) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT tile_ref FROM disabled_defaults ORDER BY tile_ref")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(r,)| r).collect())
    }

    /// Replaces the disabled-defaults list with `refs`.
    pub async fn set_disabled_defaults(&self, refs: &[String]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM disabled_defaults")
            .execute(&mut *tx)
            .await?;

        for tile_ref in refs {
            sqlx::query("INSERT OR IGNORE INTO disabled_defaults (tile_ref) VALUES (?)")
                .bind(tile_ref)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn clear_disabled_defaults(&self) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM disabled_defaults")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    struct TestContext {
        repo: TileRepository,
        _temp_dir: TempDir, // Keep alive for duration of test
    }

    async fn setup_repo() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let pool = init_db(Some(db_path)).await.unwrap();
        TestContext {
            repo: TileRepository::new(pool),
            _temp_dir: temp_dir,
        }
    }

    #[tokio::test]
    async fn test_add_and_get_tile() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let tile = CustomTile::new("grp-1", 2, "Sing a song")
            .with_tags(vec!["music".into()]);
        let id = repo.add_custom_tile(&tile).await.unwrap();

        let fetched = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(fetched.group_id, "grp-1");
        assert_eq!(fetched.intensity, Some(2));
        assert_eq!(fetched.action, "Sing a song");
        assert_eq!(fetched.tags, vec!["music"]);
        assert!(fetched.is_custom);
    }

    #[tokio::test]
    async fn test_add_tile_without_intensity_fails() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let mut tile = CustomTile::new("grp-1", 0, "No level");
        tile.intensity = None;

        let result = repo.add_custom_tile(&tile).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_get_custom_tiles_by_group() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        repo.add_custom_tile(&CustomTile::new("grp-1", 1, "A"))
            .await
            .unwrap();
        repo.add_custom_tile(&CustomTile::new("grp-1", 2, "B"))
            .await
            .unwrap();
        repo.add_custom_tile(&CustomTile::new("grp-2", 1, "C"))
            .await
            .unwrap();

        let tiles = repo.get_custom_tiles_by_group("grp-1").await.unwrap();
        assert_eq!(tiles.len(), 2);
        assert!(tiles.iter().all(|t| t.group_id == "grp-1"));
    }

    #[tokio::test]
    async fn test_set_enabled() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let id = repo
            .add_custom_tile(&CustomTile::new("grp-1", 1, "Toggle me"))
            .await
            .unwrap();

        repo.set_enabled(id, false).await.unwrap();

        let tile = repo.get_by_id(id).await.unwrap().unwrap();
        assert!(!tile.is_enabled);
    }

    #[tokio::test]
    async fn test_delete_all_custom_tiles_spares_defaults() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let mut builtin = CustomTile::new("grp-1", 1, "Built in");
        builtin.is_custom = false;
        repo.add_custom_tile(&builtin).await.unwrap();
        repo.add_custom_tile(&CustomTile::new("grp-1", 2, "Custom"))
            .await
            .unwrap();

        let deleted = repo.delete_all_custom_tiles().await.unwrap();
        assert_eq!(deleted, 1);

        let remaining = repo.count_custom().await.unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_update_custom_tile() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let id = repo
            .add_custom_tile(&CustomTile::new("grp-1", 1, "Before"))
            .await
            .unwrap();

        let mut tile = repo.get_by_id(id).await.unwrap().unwrap();
        tile.action = "After".to_string();
        tile.intensity = Some(3);
        repo.update_custom_tile(&tile).await.unwrap();

        let fetched = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(fetched.action, "After");
        assert_eq!(fetched.intensity, Some(3));
    }

    #[tokio::test]
    async fn test_disabled_defaults_roundtrip() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let refs = vec!["alcohol|2|0".to_string(), "poppers|1|3".to_string()];
        repo.set_disabled_defaults(&refs).await.unwrap();

        let mut stored = repo.get_disabled_defaults().await.unwrap();
        stored.sort();
        assert_eq!(stored, vec!["alcohol|2|0", "poppers|1|3"]);
    }

    #[tokio::test]
    async fn test_set_disabled_defaults_replaces() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        repo.set_disabled_defaults(&["old|1|0".to_string()])
            .await
            .unwrap();
        repo.set_disabled_defaults(&["new|1|0".to_string()])
            .await
            .unwrap();

        let stored = repo.get_disabled_defaults().await.unwrap();
        assert_eq!(stored, vec!["new|1|0"]);
    }

    #[tokio::test]
    async fn test_clear_disabled_defaults() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        repo.set_disabled_defaults(&["x|1|0".to_string()])
            .await
            .unwrap();
        repo.clear_disabled_defaults().await.unwrap();

        assert!(repo.get_disabled_defaults().await.unwrap().is_empty());
    }
}
