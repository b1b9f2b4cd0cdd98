use clap::{Args, Subcommand};
use serde_json::Value;

use crate::db::SettingsRepository;

#[derive(Args)]
pub struct SettingCommand {
    #[command(subcommand)]
    pub command: SettingSubcommand,
}

#[derive(Subcommand)]
pub enum SettingSubcommand {
    /// List all settings
    List,

    /// Show one setting
    Get {
        /// Setting key
        key: String,
    },

    /// Set a setting
    Set {
        /// Setting key
        key: String,

        /// Value, parsed as JSON when possible, stored as a string otherwise
        value: String,
    },
}

impl SettingCommand {
    pub async fn run(
        &self,
        settings: &SettingsRepository,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            SettingSubcommand::List => {
                let state = settings.get_state().await?;

                if state.is_empty() {
                    println!("No settings stored");
                    return Ok(());
                }

                for (key, value) in &state {
                    println!("{} = {}", key, value);
                }
                Ok(())
            }

            SettingSubcommand::Get { key } => match settings.get(key).await? {
                Some(value) => {
                    println!("{}", value);
                    Ok(())
                }
                None => Err(format!("Setting not found: {}", key).into()),
            },

            SettingSubcommand::Set { key, value } => {
                let value: Value = serde_json::from_str(value)
                    .unwrap_or_else(|_| Value::String(value.clone()));
                settings.set(key, value.clone()).await?;
                println!("{} = {}", key, value);
                Ok(())
            }
        }
    }
}
