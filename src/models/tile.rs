use serde::{Deserialize, Serialize};
use std::fmt;

use super::game_mode::GameMode;

fn default_locale() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

/// A user-authored content tile belonging to a group at an intensity level.
///
/// Local and remote copies carry independently assigned ids; the two are
/// never compared. Matching between stores is by
/// `(group_id, intensity, action)` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomTile {
    /// Local row id. Stripped before any cross-store write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Stable identifier of the owning group. Required for sync; an empty
    /// value is rejected by the matcher, never defaulted.
    #[serde(default)]
    pub group_id: String,
    /// One of the owning group's declared intensity values. Zero is valid;
    /// absence is not.
    #[serde(default)]
    pub intensity: Option<i64>,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "gameMode", default)]
    pub game_mode: GameMode,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(rename = "isCustom", default = "default_true")]
    pub is_custom: bool,
    #[serde(rename = "isEnabled", default = "default_true")]
    pub is_enabled: bool,
}

impl CustomTile {
    pub fn new(
        group_id: impl Into<String>,
        intensity: i64,
        action: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            group_id: group_id.into(),
            intensity: Some(intensity),
            action: action.into(),
            tags: Vec::new(),
            game_mode: GameMode::default(),
            locale: default_locale(),
            is_custom: true,
            is_enabled: true,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_game_mode(mut self, game_mode: GameMode) -> Self {
        self.game_mode = game_mode;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }
}

impl fmt::Display for CustomTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let intensity = self
            .intensity
            .map(|i| i.to_string())
            .unwrap_or_else(|| "?".to_string());
        write!(
            f,
            "[{}/{}] {} ({}, {})",
            self.group_id, intensity, self.action, self.game_mode, self.locale
        )?;
        if !self.is_enabled {
            write!(f, " (disabled)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_new_defaults() {
        let tile = CustomTile::new("grp-1", 2, "Sing a song");

        assert_eq!(tile.group_id, "grp-1");
        assert_eq!(tile.intensity, Some(2));
        assert_eq!(tile.action, "Sing a song");
        assert!(tile.is_custom);
        assert!(tile.is_enabled);
        assert_eq!(tile.locale, "en");
        assert_eq!(tile.game_mode, GameMode::Online);
        assert!(tile.id.is_none());
    }

    #[test]
    fn test_tile_builders() {
        let tile = CustomTile::new("grp-1", 1, "Dance")
            .with_tags(vec!["silly".into()])
            .with_game_mode(GameMode::Local)
            .with_locale("fr");

        assert_eq!(tile.tags, vec!["silly"]);
        assert_eq!(tile.game_mode, GameMode::Local);
        assert_eq!(tile.locale, "fr");
    }

    #[test]
    fn test_tile_wire_names() {
        let tile = CustomTile::new("grp-1", 0, "Wave");
        let json = serde_json::to_value(&tile).unwrap();

        assert!(json.get("group_id").is_some());
        assert!(json.get("gameMode").is_some());
        assert!(json.get("isCustom").is_some());
        assert!(json.get("isEnabled").is_some());
        // Local-only id is absent when unset.
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_tile_deserialize_sparse_remote_json() {
        // Remote documents written by older clients may omit most fields.
        let tile: CustomTile = serde_json::from_str(r#"{"action": "Clap"}"#).unwrap();

        assert_eq!(tile.action, "Clap");
        assert_eq!(tile.group_id, "");
        assert_eq!(tile.intensity, None);
        assert!(tile.is_custom);
        assert!(tile.is_enabled);
    }

    #[test]
    fn test_tile_display_marks_disabled() {
        let mut tile = CustomTile::new("grp-1", 3, "Shout");
        tile.is_enabled = false;
        let out = format!("{}", tile);
        assert!(out.contains("Shout"));
        assert!(out.contains("(disabled)"));
    }
}
