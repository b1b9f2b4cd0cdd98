use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::models::{BoardTile, GameBoard, GameMode};

pub struct BoardRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct BoardRow {
    id: i64,
    title: String,
    tiles: String,
    tags: String,
    game_mode: String,
    is_active: i64,
    created_at: String,
    updated_at: String,
}

impl BoardRow {
    fn into_board(self) -> GameBoard {
        let tiles: Vec<BoardTile> = serde_json::from_str(&self.tiles).unwrap_or_default();
        let tags: Vec<String> = serde_json::from_str(&self.tags).unwrap_or_default();
        GameBoard {
            id: Some(self.id),
            title: self.title,
            tiles,
            tags,
            game_mode: GameMode::from_str(&self.game_mode).unwrap_or_default(),
            is_active: self.is_active != 0,
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

impl BoardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_title(&self, title: &str) -> Result<Option<GameBoard>, sqlx::Error> {
        let row: Option<BoardRow> = sqlx::query_as("SELECT * FROM game_boards WHERE title = ?")
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(BoardRow::into_board))
    }

    pub async fn list(&self) -> Result<Vec<GameBoard>, sqlx::Error> {
        let rows: Vec<BoardRow> = sqlx::query_as("SELECT * FROM game_boards ORDER BY title")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(BoardRow::into_board).collect())
    }

    /// Inserts the board, or updates the existing board with the same
    /// title. The local row id and created_at of an existing board are
    /// preserved.
    pub async fn upsert(&self, board: &GameBoard) -> Result<GameBoard, sqlx::Error> {
        let tiles = serde_json::to_string(&board.tiles).unwrap_or_else(|_| "[]".to_string());
        let tags = serde_json::to_string(&board.tags).unwrap_or_else(|_| "[]".to_string());
        let now = Utc::now().to_rfc3339();

        match self.get_by_title(&board.title).await? {
            Some(existing) => {
                sqlx::query(
                    r#"
                    UPDATE game_boards
                    SET tiles = ?, tags = ?, game_mode = ?, is_active = ?, updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&tiles)
                .bind(&tags)
                .bind(board.game_mode.to_string())
                .bind(board.is_active as i64)
                .bind(&now)
                .bind(existing.id)
                .execute(&self.pool)
                .await?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO game_boards (title, tiles, tags, game_mode, is_active, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&board.title)
                .bind(&tiles)
                .bind(&tags)
                .bind(board.game_mode.to_string())
                .bind(board.is_active as i64)
                .bind(board.created_at.to_rfc3339())
                .bind(&now)
                .execute(&self.pool)
                .await?;
            }
        }

        self.get_by_title(&board.title)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn delete_by_title(&self, title: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM game_boards WHERE title = ?")
            .bind(title)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
