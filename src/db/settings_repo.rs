use serde_json::{Map, Value};
use sqlx::SqlitePool;

pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the whole settings map.
    pub async fn get_state(&self) -> Result<Map<String, Value>, sqlx::Error> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await?;

        let mut state = Map::new();
        for (key, raw) in rows {
            // Rows are written by this repository as JSON; anything else is
            // treated as a bare string.
            let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
            state.insert(key, value);
        }
        Ok(state)
    }

    pub async fn get(&self, key: &str) -> Result<Option<Value>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(raw,)| serde_json::from_str(&raw).unwrap_or(Value::String(raw))))
    }

    /// Applies `patch` on top of the stored settings, key by key.
    pub async fn update_settings(&self, patch: &Map<String, Value>) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        for (key, value) in patch {
            let raw = value.to_string();
            sqlx::query(
                r#"
                INSERT INTO settings (key, value) VALUES (?, ?)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value
                "#,
            )
            .bind(key)
            .bind(&raw)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn set(&self, key: &str, value: Value) -> Result<(), sqlx::Error> {
        let mut patch = Map::new();
        patch.insert(key.to_string(), value);
        self.update_settings(&patch).await
    }
}
