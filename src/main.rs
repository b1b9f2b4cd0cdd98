use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod db;
mod models;
mod remote;
mod sync;

use commands::{
    BoardCommand, ConfigCommand, GroupCommand, SettingCommand, SyncCommand, TileCommand,
};
use config::Config;
use db::{init_db, BoardRepository, GroupRepository, SettingsRepository, TileRepository};
use sync::auto::try_auto_sync;

#[derive(Parser)]
#[command(name = "partydeck")]
#[command(version)]
#[command(about = "Offline-first companion for the PartyDeck party game", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage custom tiles
    Tile(TileCommand),

    /// Manage custom tile groups
    Group(GroupCommand),

    /// Manage saved game boards
    Board(BoardCommand),

    /// Manage user settings
    Setting(SettingCommand),

    /// Manage configuration
    Config(ConfigCommand),

    /// Sync with the account service
    Sync(SyncCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "partydeck=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Tile(cmd)) => {
            let pool = init_db(Some(config.database_path.value.clone())).await?;
            let tiles = TileRepository::new(pool.clone());
            let groups = GroupRepository::new(pool.clone());
            cmd.run(&tiles, &groups, &config).await?;
            try_auto_sync(&pool, &config).await;
        }
        Some(Commands::Group(cmd)) => {
            let pool = init_db(Some(config.database_path.value.clone())).await?;
            let groups = GroupRepository::new(pool.clone());
            cmd.run(&groups, &config).await?;
            try_auto_sync(&pool, &config).await;
        }
        Some(Commands::Board(cmd)) => {
            let pool = init_db(Some(config.database_path.value.clone())).await?;
            let boards = BoardRepository::new(pool.clone());
            cmd.run(&boards).await?;
            try_auto_sync(&pool, &config).await;
        }
        Some(Commands::Setting(cmd)) => {
            let pool = init_db(Some(config.database_path.value.clone())).await?;
            let settings = SettingsRepository::new(pool.clone());
            cmd.run(&settings).await?;
            try_auto_sync(&pool, &config).await;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        Some(Commands::Sync(cmd)) => {
            let pool = init_db(Some(config.database_path.value.clone())).await?;
            cmd.run(&pool, &config).await?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
