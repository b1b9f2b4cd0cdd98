use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::models::{CustomGroup, GameMode, GroupIntensity};

pub struct GroupRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: String,
    name: String,
    label: String,
    locale: String,
    game_mode: String,
    intensities: String,
    is_default: i64,
    created_at: String,
    updated_at: String,
}

impl GroupRow {
    fn into_group(self) -> CustomGroup {
        let intensities: Vec<GroupIntensity> =
            serde_json::from_str(&self.intensities).unwrap_or_default();
        CustomGroup {
            id: self.id,
            name: self.name,
            label: self.label,
            locale: self.locale,
            game_mode: GameMode::from_str(&self.game_mode).unwrap_or_default(),
            intensities,
            is_default: self.is_default != 0,
            created_at: parse_timestamp(&self.created_at),
            updated_at: parse_timestamp(&self.updated_at),
        }
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl GroupRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn add(&self, group: &CustomGroup) -> Result<(), sqlx::Error> {
        let intensities =
            serde_json::to_string(&group.intensities).unwrap_or_else(|_| "[]".to_string());

        sqlx::query(
            r#"
            INSERT INTO custom_groups (id, name, label, locale, game_mode, intensities, is_default, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&group.id)
        .bind(&group.name)
        .bind(&group.label)
        .bind(&group.locale)
        .bind(group.game_mode.to_string())
        .bind(&intensities)
        .bind(group.is_default as i64)
        .bind(group.created_at.to_rfc3339())
        .bind(group.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<CustomGroup>, sqlx::Error> {
        let row: Option<GroupRow> = sqlx::query_as("SELECT * FROM custom_groups WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(GroupRow::into_group))
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<CustomGroup>, sqlx::Error> {
        let row: Option<GroupRow> =
            sqlx::query_as("SELECT * FROM custom_groups WHERE LOWER(name) = LOWER(?)")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(GroupRow::into_group))
    }

    /// Lists user-authored groups (built-in defaults excluded).
    pub async fn get_custom_groups(&self) -> Result<Vec<CustomGroup>, sqlx::Error> {
        let rows: Vec<GroupRow> =
            sqlx::query_as("SELECT * FROM custom_groups WHERE is_default = 0 ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(GroupRow::into_group).collect())
    }

    pub async fn count_custom(&self) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM custom_groups WHERE is_default = 0")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Imports groups, skipping ids that already exist. Returns the number
    /// of rows actually inserted, which makes retries harmless.
    pub async fn import_custom_groups(
        &self,
        groups: &[CustomGroup],
    ) -> Result<usize, sqlx::Error> {
        let mut imported = 0;
        for group in groups {
            let intensities =
                serde_json::to_string(&group.intensities).unwrap_or_else(|_| "[]".to_string());

            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO custom_groups (id, name, label, locale, game_mode, intensities, is_default, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&group.id)
            .bind(&group.name)
            .bind(&group.label)
            .bind(&group.locale)
            .bind(group.game_mode.to_string())
            .bind(&intensities)
            .bind(group.is_default as i64)
            .bind(group.created_at.to_rfc3339())
            .bind(group.updated_at.to_rfc3339())
            .execute(&self.pool)
            .await?;

            imported += result.rows_affected() as usize;
        }
        Ok(imported)
    }

    pub async fn delete(&self, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM custom_groups WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Wipes user-authored groups; built-in defaults are untouched.
    pub async fn delete_all_custom_groups(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM custom_groups WHERE is_default = 0")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    async fn setup() -> (GroupRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let pool = init_db(Some(db_path)).await.unwrap();
        (GroupRepository::new(pool), temp_dir)
    }

    #[tokio::test]
    async fn test_add_and_get_group() {
        let (repo, _temp) = setup().await;

        let group = CustomGroup::new("dares", "Dares")
            .with_intensities(vec![GroupIntensity::new(1, "Mild", 1)]);
        repo.add(&group).await.unwrap();

        let fetched = repo.get_by_id(&group.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "dares");
        assert_eq!(fetched.intensities.len(), 1);
        assert_eq!(fetched.intensities[0].label, "Mild");
    }

    #[tokio::test]
    async fn test_get_by_name_case_insensitive() {
        let (repo, _temp) = setup().await;

        repo.add(&CustomGroup::new("dares", "Dares")).await.unwrap();

        let found = repo.get_by_name("DARES").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_import_skips_existing_ids() {
        let (repo, _temp) = setup().await;

        let group = CustomGroup::new("dares", "Dares");
        repo.add(&group).await.unwrap();

        let incoming = vec![group.clone(), CustomGroup::new("truths", "Truths")];
        let imported = repo.import_custom_groups(&incoming).await.unwrap();

        assert_eq!(imported, 1);
        assert_eq!(repo.count_custom().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_import_is_idempotent() {
        let (repo, _temp) = setup().await;

        let groups = vec![CustomGroup::new("a", "A"), CustomGroup::new("b", "B")];
        repo.import_custom_groups(&groups).await.unwrap();
        let second = repo.import_custom_groups(&groups).await.unwrap();

        assert_eq!(second, 0);
        assert_eq!(repo.count_custom().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_all_custom_groups_spares_defaults() {
        let (repo, _temp) = setup().await;

        let mut builtin = CustomGroup::new("classic", "Classic");
        builtin.is_default = true;
        repo.add(&builtin).await.unwrap();
        repo.add(&CustomGroup::new("mine", "Mine")).await.unwrap();

        let deleted = repo.delete_all_custom_groups().await.unwrap();
        assert_eq!(deleted, 1);
        assert!(repo.get_by_id(&builtin.id).await.unwrap().is_some());
    }
}
