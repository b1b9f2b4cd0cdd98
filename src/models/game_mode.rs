use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Online,
    Local,
    Solo,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameMode::Online => write!(f, "online"),
            GameMode::Local => write!(f, "local"),
            GameMode::Solo => write!(f, "solo"),
        }
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "online" => Ok(GameMode::Online),
            "local" => Ok(GameMode::Local),
            "solo" => Ok(GameMode::Solo),
            _ => Err(format!(
                "Invalid game mode '{}'. Valid options: online, local, solo",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_mode_display() {
        assert_eq!(format!("{}", GameMode::Online), "online");
        assert_eq!(format!("{}", GameMode::Local), "local");
        assert_eq!(format!("{}", GameMode::Solo), "solo");
    }

    #[test]
    fn test_game_mode_from_str() {
        assert_eq!(GameMode::from_str("online").unwrap(), GameMode::Online);
        assert_eq!(GameMode::from_str("LOCAL").unwrap(), GameMode::Local);
        assert_eq!(GameMode::from_str("Solo").unwrap(), GameMode::Solo);
    }

    #[test]
    fn test_game_mode_from_str_invalid() {
        assert!(GameMode::from_str("couch").is_err());
        assert!(GameMode::from_str("").is_err());
    }

    #[test]
    fn test_game_mode_json_roundtrip() {
        let mode = GameMode::Local;
        let json = serde_json::to_string(&mode).unwrap();
        assert_eq!(json, "\"local\"");

        let parsed: GameMode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, mode);
    }

    #[test]
    fn test_game_mode_default() {
        assert_eq!(GameMode::default(), GameMode::Online);
    }
}
