use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::game_mode::GameMode;

fn default_locale() -> String {
    "en".to_string()
}

/// One level of a group's intensity scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupIntensity {
    pub id: i64,
    pub label: String,
    pub value: i64,
    #[serde(rename = "isDefault", default)]
    pub is_default: bool,
}

impl GroupIntensity {
    pub fn new(id: i64, label: impl Into<String>, value: i64) -> Self {
        Self {
            id,
            label: label.into(),
            value,
            is_default: false,
        }
    }
}

/// A user-authored tile group with its declared intensity scale.
///
/// Tiles reference a group by `group_id`; the group's `id` is the stable
/// join key used for sync matching, not the human-readable `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomGroup {
    #[serde(default)]
    pub id: String,
    /// Slug name.
    #[serde(default)]
    pub name: String,
    /// Display label.
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(rename = "gameMode", default)]
    pub game_mode: GameMode,
    #[serde(default)]
    pub intensities: Vec<GroupIntensity>,
    #[serde(rename = "isDefault", default)]
    pub is_default: bool,
    #[serde(rename = "createdAt", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl CustomGroup {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            label: label.into(),
            locale: default_locale(),
            game_mode: GameMode::default(),
            intensities: Vec::new(),
            is_default: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_intensities(mut self, intensities: Vec<GroupIntensity>) -> Self {
        self.intensities = intensities;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_game_mode(mut self, game_mode: GameMode) -> Self {
        self.game_mode = game_mode;
        self
    }

    /// Returns true if `value` is one of this group's declared intensity
    /// values.
    pub fn has_intensity(&self, value: i64) -> bool {
        self.intensities.iter().any(|i| i.value == value)
    }
}

impl fmt::Display for CustomGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.label, self.name)?;
        writeln!(f, "Id: {}", self.id)?;
        writeln!(f, "Mode: {} / {}", self.game_mode, self.locale)?;

        if !self.intensities.is_empty() {
            writeln!(f, "Intensities:")?;
            for intensity in &self.intensities {
                writeln!(f, "  {} = {}", intensity.value, intensity.label)?;
            }
        }

        Ok(())
    }
}
