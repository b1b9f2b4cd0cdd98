use clap::{Args, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::str::FromStr;

use crate::config::Config;
use crate::db::{GroupRepository, TileRepository};
use crate::models::{CustomTile, GameMode};
use crate::sync::matcher;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct TileCommand {
    #[command(subcommand)]
    pub command: TileSubcommand,
}

#[derive(Subcommand)]
pub enum TileSubcommand {
    /// Add a custom tile to a group
    Add {
        /// Group name or id the tile belongs to
        group: String,

        /// The tile's action text
        action: String,

        /// Intensity level (must be declared by the group)
        #[arg(long, short)]
        intensity: i64,

        /// Tags (can be repeated)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Game mode (online, local, solo)
        #[arg(long)]
        mode: Option<String>,

        /// Locale (defaults to the configured locale)
        #[arg(long)]
        locale: Option<String>,
    },

    /// List custom tiles
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Filter by group name or id
        #[arg(long)]
        group: Option<String>,
    },

    /// Update an existing tile
    Update {
        /// Tile id
        id: i64,

        /// New action text
        #[arg(long)]
        action: Option<String>,

        /// New intensity level
        #[arg(long, short)]
        intensity: Option<i64>,

        /// Replace tags (can be repeated)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },

    /// Enable a tile
    Enable {
        /// Tile id
        id: i64,
    },

    /// Disable a tile
    Disable {
        /// Tile id
        id: i64,
    },

    /// Delete a tile
    Delete {
        /// Tile id
        id: i64,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Show matching health statistics for local custom tiles
    Stats {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl TileCommand {
    pub async fn run(
        &self,
        tiles: &TileRepository,
        groups: &GroupRepository,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            TileSubcommand::Add {
                group,
                action,
                intensity,
                tags,
                mode,
                locale,
            } => {
                if action.trim().is_empty() {
                    return Err("Tile action cannot be empty".into());
                }

                // Resolve the group by id first, then by name.
                let group = match groups.get_by_id(group).await? {
                    Some(found) => found,
                    None => groups
                        .get_by_name(group)
                        .await?
                        .ok_or_else(|| format!("Group not found: {}", group))?,
                };

                if !group.intensities.is_empty() && !group.has_intensity(*intensity) {
                    let declared: Vec<String> = group
                        .intensities
                        .iter()
                        .map(|i| i.value.to_string())
                        .collect();
                    return Err(format!(
                        "Group '{}' has no intensity {}. Declared: {}",
                        group.name,
                        intensity,
                        declared.join(", ")
                    )
                    .into());
                }

                let mut tile = CustomTile::new(group.id.as_str(), *intensity, action.trim())
                    .with_locale(locale.clone().unwrap_or_else(|| config.locale.value.clone()));
                if let Some(mode) = mode {
                    tile = tile.with_game_mode(GameMode::from_str(mode)?);
                }
                if !tags.is_empty() {
                    tile = tile.with_tags(tags.clone());
                }

                // Refuse duplicates up front instead of leaving them for
                // the sync cleanup pass.
                if let Some(existing) = matcher::find_existing_tile(tiles, &tile).await? {
                    return Err(format!(
                        "An equivalent tile already exists (id {})",
                        existing.tile.id.unwrap_or_default()
                    )
                    .into());
                }

                let id = tiles.add_custom_tile(&tile).await?;
                tile.id = Some(id);
                println!("Added tile:");
                println!("{}", tile);
                Ok(())
            }

            TileSubcommand::List { format, group } => {
                let tiles = match group {
                    Some(group_ref) => {
                        let group_id = match groups.get_by_id(group_ref).await? {
                            Some(found) => found.id,
                            None => groups
                                .get_by_name(group_ref)
                                .await?
                                .map(|g| g.id)
                                .unwrap_or_else(|| group_ref.clone()),
                        };
                        tiles.get_custom_tiles_by_group(&group_id).await?
                    }
                    None => tiles.get_custom_tiles().await?,
                };

                if tiles.is_empty() {
                    println!("No custom tiles found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&tiles)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<6}  {:<24}  {:<9}  {:<8}  ACTION", "ID", "GROUP", "INTENSITY", "ENABLED");
                        println!("{}", "-".repeat(80));
                        for tile in &tiles {
                            println!(
                                "{:<6}  {:<24}  {:<9}  {:<8}  {}",
                                tile.id.unwrap_or_default(),
                                tile.group_id,
                                tile.intensity.unwrap_or_default(),
                                if tile.is_enabled { "yes" } else { "no" },
                                tile.action
                            );
                        }
                        println!("\nTotal: {} tile(s)", tiles.len());
                    }
                }
                Ok(())
            }

            TileSubcommand::Update {
                id,
                action,
                intensity,
                tags,
            } => {
                if action.is_none() && intensity.is_none() && tags.is_empty() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let original = tiles
                    .get_by_id(*id)
                    .await?
                    .ok_or_else(|| format!("Tile not found: {}", id))?;

                let mut updated = original.clone();
                if let Some(new_action) = action {
                    updated.action = new_action.trim().to_string();
                }
                if let Some(new_intensity) = intensity {
                    updated.intensity = Some(*new_intensity);
                }
                if !tags.is_empty() {
                    updated.tags = tags.clone();
                }

                // A changed match key must not collide with another tile.
                if !matcher::tiles_equal(&updated, &original)? {
                    if let Some(existing) = matcher::find_existing_tile(tiles, &updated).await? {
                        if existing.tile.id != original.id {
                            return Err(format!(
                                "An equivalent tile already exists (id {})",
                                existing.tile.id.unwrap_or_default()
                            )
                            .into());
                        }
                    }
                }

                tiles.update_custom_tile(&updated).await?;
                println!("Updated tile:");
                println!("{}", updated);
                Ok(())
            }

            TileSubcommand::Enable { id } => {
                let tile = tiles
                    .get_by_id(*id)
                    .await?
                    .ok_or_else(|| format!("Tile not found: {}", id))?;
                tiles.set_enabled(*id, true).await?;
                println!("Enabled tile: {}", tile.action);
                Ok(())
            }

            TileSubcommand::Disable { id } => {
                let tile = tiles
                    .get_by_id(*id)
                    .await?
                    .ok_or_else(|| format!("Tile not found: {}", id))?;
                tiles.set_enabled(*id, false).await?;
                println!("Disabled tile: {}", tile.action);
                Ok(())
            }

            TileSubcommand::Delete { id, force } => {
                let tile = tiles
                    .get_by_id(*id)
                    .await?
                    .ok_or_else(|| format!("Tile not found: {}", id))?;

                if !force {
                    print!("Delete tile '{}'? [y/N] ", tile.action);
                    io::stdout().flush()?;

                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;

                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                tiles.delete(*id).await?;
                println!("Deleted tile: {}", tile.action);
                Ok(())
            }

            TileSubcommand::Stats { format } => {
                let all = tiles.get_custom_tiles().await?;
                let stats = matcher::matching_stats(&all);

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&stats)?);
                    }
                    OutputFormat::Text => {
                        println!("Tile matching health");
                        println!("====================\n");
                        println!("Total tiles:        {}", stats.total);
                        println!("With group id:      {}", stats.with_group_id);
                        println!("Missing group id:   {}", stats.missing_group_id);
                        println!("Duplicate keys:     {}", stats.duplicate_keys);

                        if !stats.validation_errors.is_empty() {
                            println!("\nValidation errors:");
                            for error in &stats.validation_errors {
                                println!("  - {}", error);
                            }
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
