mod board;
mod game_mode;
mod group;
pub mod settings;
mod tile;

pub use board::{BoardTile, GameBoard};
pub use game_mode::GameMode;
pub use group::{CustomGroup, GroupIntensity};
pub use tile::CustomTile;
