use clap::{Args, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::str::FromStr;

use crate::db::BoardRepository;
use crate::models::{BoardTile, GameBoard, GameMode};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct BoardCommand {
    #[command(subcommand)]
    pub command: BoardSubcommand,
}

#[derive(Subcommand)]
pub enum BoardSubcommand {
    /// Create a game board
    Add {
        /// Board title
        title: String,

        /// Board square as "TITLE:DESCRIPTION" (can be repeated, in order)
        #[arg(long = "square", value_name = "TITLE:DESCRIPTION")]
        squares: Vec<String>,

        /// Tags (can be repeated)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Game mode (online, local, solo)
        #[arg(long)]
        mode: Option<String>,
    },

    /// List saved game boards
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a board's details
    Show {
        /// Board title
        title: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a board
    Delete {
        /// Board title
        title: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl BoardCommand {
    pub async fn run(&self, boards: &BoardRepository) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            BoardSubcommand::Add {
                title,
                squares,
                tags,
                mode,
            } => {
                if title.trim().is_empty() {
                    return Err("Board title cannot be empty".into());
                }
                if boards.get_by_title(title.trim()).await?.is_some() {
                    return Err(format!("Board already exists: {}", title.trim()).into());
                }

                let mut tiles = Vec::new();
                for square in squares {
                    let (square_title, description) = square
                        .split_once(':')
                        .ok_or_else(|| {
                            format!("Invalid square '{}'. Expected TITLE:DESCRIPTION", square)
                        })?;
                    tiles.push(BoardTile::new(square_title.trim(), description.trim()));
                }

                let mut board = GameBoard::new(title.trim())
                    .with_tiles(tiles)
                    .with_tags(tags.clone());
                if let Some(mode) = mode {
                    board = board.with_game_mode(GameMode::from_str(mode)?);
                }

                let stored = boards.upsert(&board).await?;
                println!("Created board:");
                println!("{}", stored);
                Ok(())
            }

            BoardSubcommand::List { format } => {
                let boards = boards.list().await?;

                if boards.is_empty() {
                    println!("No game boards found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&boards)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<30}  {:<8}  {:<7}  TILES", "TITLE", "MODE", "ACTIVE");
                        println!("{}", "-".repeat(60));
                        for board in &boards {
                            println!(
                                "{:<30}  {:<8}  {:<7}  {}",
                                board.title,
                                board.game_mode.to_string(),
                                if board.is_active { "yes" } else { "no" },
                                board.tiles.len()
                            );
                        }
                        println!("\nTotal: {} board(s)", boards.len());
                    }
                }
                Ok(())
            }

            BoardSubcommand::Show { title, format } => {
                let board = boards
                    .get_by_title(title)
                    .await?
                    .ok_or_else(|| format!("Board not found: {}", title))?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&board)?);
                    }
                    OutputFormat::Text => {
                        println!("{}", board);
                        if !board.tiles.is_empty() {
                            println!("Squares:");
                            for (position, tile) in board.tiles.iter().enumerate() {
                                println!("  {:>3}. {} - {}", position + 1, tile.title, tile.description);
                            }
                        }
                    }
                }
                Ok(())
            }

            BoardSubcommand::Delete { title, force } => {
                let board = boards
                    .get_by_title(title)
                    .await?
                    .ok_or_else(|| format!("Board not found: {}", title))?;

                if !force {
                    print!("Delete board '{}'? [y/N] ", board.title);
                    io::stdout().flush()?;

                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;

                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                boards.delete_by_title(&board.title).await?;
                println!("Deleted board: {}", board.title);
                Ok(())
            }
        }
    }
}
