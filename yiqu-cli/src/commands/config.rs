//! Config subcommands: inspect the merged configuration.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::ConfigLoader;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (defaults, files and environment merged)
    Show,
    /// Show configuration file and report locations
    Path,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(),
        ConfigCommands::Path => show_paths(),
    }
}

fn show_config() -> Result<()> {
    let config = ConfigLoader::load()?;
    for (_, path) in locations().iter().take(2).filter(|(_, p)| p.exists()) {
        println!("# from {}", path.display());
    }
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn show_paths() -> Result<()> {
    for (label, path) in locations() {
        let missing = if path.exists() { "" } else { " (not found)" };
        println!("{:<16}{}{}", format!("{label}:"), path.display(), missing);
    }
    Ok(())
}

fn locations() -> [(&'static str, PathBuf); 3] {
    [
        ("User config", ConfigLoader::user_config_path()),
        ("Project config", ConfigLoader::project_config_path()),
        ("Reports", yiqu_paths::reports_dir()),
    ]
}
