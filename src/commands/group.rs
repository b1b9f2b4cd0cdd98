use clap::{Args, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::str::FromStr;

use crate::config::Config;
use crate::db::GroupRepository;
use crate::models::{CustomGroup, GameMode, GroupIntensity};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct GroupCommand {
    #[command(subcommand)]
    pub command: GroupSubcommand,
}

#[derive(Subcommand)]
pub enum GroupSubcommand {
    /// Create a custom group
    Add {
        /// Slug name of the group
        name: String,

        /// Display label (defaults to the name)
        #[arg(long)]
        label: Option<String>,

        /// Intensity level as "label=value" (can be repeated)
        #[arg(long = "intensity", value_name = "LABEL=VALUE")]
        intensities: Vec<String>,

        /// Game mode (online, local, solo)
        #[arg(long)]
        mode: Option<String>,
    },

    /// List custom groups
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a group's details
    Show {
        /// Group name or id
        identifier: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a group
    Delete {
        /// Group name or id
        identifier: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

/// Parses an "label=value" intensity argument.
fn parse_intensity(raw: &str, position: i64) -> Result<GroupIntensity, String> {
    let (label, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("Invalid intensity '{}'. Expected LABEL=VALUE", raw))?;
    let value: i64 = value
        .trim()
        .parse()
        .map_err(|_| format!("Invalid intensity value in '{}'", raw))?;
    if label.trim().is_empty() {
        return Err(format!("Invalid intensity '{}'. Label cannot be empty", raw));
    }
    Ok(GroupIntensity::new(position, label.trim(), value))
}

impl GroupCommand {
    pub async fn run(
        &self,
        groups: &GroupRepository,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            GroupSubcommand::Add {
                name,
                label,
                intensities,
                mode,
            } => {
                if name.trim().is_empty() {
                    return Err("Group name cannot be empty".into());
                }
                if groups.get_by_name(name).await?.is_some() {
                    return Err(format!("Group already exists: {}", name).into());
                }

                let mut parsed = Vec::new();
                for (position, raw) in intensities.iter().enumerate() {
                    parsed.push(parse_intensity(raw, position as i64 + 1)?);
                }

                let mut group = CustomGroup::new(
                    name.trim(),
                    label.clone().unwrap_or_else(|| name.trim().to_string()),
                )
                .with_locale(config.locale.value.clone())
                .with_intensities(parsed);
                if let Some(mode) = mode {
                    group = group.with_game_mode(GameMode::from_str(mode)?);
                }

                groups.add(&group).await?;
                println!("Created group:");
                println!("{}", group);
                Ok(())
            }

            GroupSubcommand::List { format } => {
                let groups = groups.get_custom_groups().await?;

                if groups.is_empty() {
                    println!("No custom groups found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&groups)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<38}  {:<20}  {:<8}  INTENSITIES", "ID", "NAME", "MODE");
                        println!("{}", "-".repeat(84));
                        for group in &groups {
                            let levels: Vec<String> = group
                                .intensities
                                .iter()
                                .map(|i| i.value.to_string())
                                .collect();
                            println!(
                                "{:<38}  {:<20}  {:<8}  {}",
                                group.id,
                                group.name,
                                group.game_mode.to_string(),
                                levels.join(", ")
                            );
                        }
                        println!("\nTotal: {} group(s)", groups.len());
                    }
                }
                Ok(())
            }

            GroupSubcommand::Show { identifier, format } => {
                let group = find_group(groups, identifier).await?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&group)?);
                    }
                    OutputFormat::Text => {
                        println!("{}", group);
                    }
                }
                Ok(())
            }

            GroupSubcommand::Delete { identifier, force } => {
                let group = find_group(groups, identifier).await?;

                if !force {
                    print!("Delete group '{}'? [y/N] ", group.name);
                    io::stdout().flush()?;

                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;

                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                groups.delete(&group.id).await?;
                println!("Deleted group: {}", group.name);
                Ok(())
            }
        }
    }
}

async fn find_group(
    groups: &GroupRepository,
    identifier: &str,
) -> Result<CustomGroup, Box<dyn std::error::Error>> {
    if let Some(group) = groups.get_by_id(identifier).await? {
        return Ok(group);
    }
    groups
        .get_by_name(identifier)
        .await?
        .ok_or_else(|| format!("Group not found: {}", identifier).into())
}
