use anyhow::Context;
use clap::{Parser, Subcommand};
use cityweather_core::{CityDirectory, CityRecord, Config, provider::provider_from_config};
use std::{path::PathBuf, sync::Arc};
use tracing::{info, warn};

use crate::server::{self, AppState};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "City weather web app")]
pub struct Cli {
    /// Default log level when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the web server.
    Serve {
        /// Listen address, overriding the config file.
        #[arg(long)]
        bind: Option<String>,

        /// JSON city table, overriding the config file.
        #[arg(long)]
        cities: Option<PathBuf>,
    },

    /// Store a fallback OpenWeather API key in the config file.
    Configure {
        /// OpenWeather One Call API key.
        api_key: String,
    },

    /// Search the city directory from the terminal.
    Cities {
        /// Name fragment; lists the featured cities when absent.
        query: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Command::Serve { bind, cities } => {
                if let Some(path) = cities {
                    config.cities_file = Some(path);
                }
                let bind = bind.unwrap_or_else(|| config.server.bind.clone());

                let directory = config.load_directory()?;
                info!(cities = directory.len(), "Loaded city directory");

                let key_env = &config.openweather.api_key_env;
                if !config.has_api_key() && std::env::var_os(key_env).is_none() {
                    warn!("No OpenWeather API key found; set {key_env} before opening a forecast page");
                }

                let provider = Arc::from(provider_from_config(&config));
                let state = AppState::new(
                    directory,
                    provider,
                    config.default_city_id,
                    &config.featured_city_ids,
                );

                server::serve(state, &bind).await?;
            }
            Command::Configure { api_key } => {
                config.set_api_key(api_key);
                let path = config.save().context("Failed to save configuration")?;
                println!("Saved OpenWeather API key to {}", path.display());
            }
            Command::Cities { query } => {
                let directory = config.load_directory()?;
                let cities = match query.as_deref().and_then(|q| directory.search(q)) {
                    Some(found) => found,
                    None => directory.featured(&config.featured_city_ids),
                };
                print_cities(&directory, &cities);
            }
        }

        Ok(())
    }
}

fn print_cities(directory: &CityDirectory, cities: &[&CityRecord]) {
    if cities.is_empty() {
        println!("No cities match ({} known).", directory.len());
        return;
    }

    for city in cities {
        println!("{:>9}  {}", city.city_id, city.display_name());
    }
}
