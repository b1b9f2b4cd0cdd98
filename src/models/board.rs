use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::game_mode::GameMode;

/// One square of a saved game board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardTile {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl BoardTile {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            role: None,
        }
    }
}

/// A named ordered sequence of board tiles. Upserted by title equivalence;
/// the local row id never travels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameBoard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tiles: Vec<BoardTile>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "gameMode", default)]
    pub game_mode: GameMode,
    #[serde(rename = "isActive", default)]
    pub is_active: bool,
    #[serde(rename = "createdAt", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl GameBoard {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            title: title.into(),
            tiles: Vec::new(),
            tags: Vec::new(),
            game_mode: GameMode::default(),
            is_active: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_tiles(mut self, tiles: Vec<BoardTile>) -> Self {
        self.tiles = tiles;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_game_mode(mut self, game_mode: GameMode) -> Self {
        self.game_mode = game_mode;
        self
    }
}

impl fmt::Display for GameBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "=".repeat(self.title.len()))?;
        writeln!(f, "Mode: {}", self.game_mode)?;
        writeln!(f, "Active: {}", if self.is_active { "yes" } else { "no" })?;
        writeln!(f, "Tiles: {}", self.tiles.len())?;

        if !self.tags.is_empty() {
            writeln!(f, "Tags: {}", self.tags.join(", "))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_new() {
        let board = GameBoard::new("Friday Night");

        assert_eq!(board.title, "Friday Night");
        assert!(board.tiles.is_empty());
        assert!(!board.is_active);
        assert!(board.id.is_none());
    }

    #[test]
    fn test_board_with_tiles() {
        let board = GameBoard::new("Friday Night").with_tiles(vec![
            BoardTile::new("Start", "Everyone takes a turn"),
            BoardTile::new("Finish", "Game over"),
        ]);

        assert_eq!(board.tiles.len(), 2);
        assert_eq!(board.tiles[0].title, "Start");
    }

    #[test]
    fn test_board_display() {
        let board = GameBoard::new("Friday Night").with_tags(vec!["party".into()]);
        let out = format!("{}", board);

        assert!(out.contains("Friday Night"));
        assert!(out.contains("party"));
    }

    #[test]
    fn test_board_deserialize_sparse_remote_json() {
        let board: GameBoard = serde_json::from_str(r#"{"title": "Imported"}"#).unwrap();

        assert_eq!(board.title, "Imported");
        assert!(board.tiles.is_empty());
        assert!(!board.is_active);
    }
}
