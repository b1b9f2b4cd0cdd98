mod board;
mod config_cmd;
mod group;
mod setting;
mod sync_cmd;
mod tile;

pub use board::BoardCommand;
pub use config_cmd::ConfigCommand;
pub use group::GroupCommand;
pub use setting::SettingCommand;
pub use sync_cmd::SyncCommand;
pub use tile::TileCommand;
