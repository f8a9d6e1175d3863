//! CLI subcommand: `atelier config`

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};

use crate::config::{Config, DEFAULT_CONFIG_TEMPLATE};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration, defaults included
    Show {
        #[arg(short, long, value_enum, default_value_t = ConfigFormat::Toml)]
        format: ConfigFormat,
    },

    /// Print one value (e.g. generation.text_model)
    Get { key: String },

    /// Change one value and write the file back (e.g. studio.locale en)
    Set { key: String, value: String },

    /// Print where config.toml is read from
    Path,

    /// Write the commented starter config.toml
    Init {
        /// Replace an existing file
        #[arg(short, long)]
        force: bool,
    },
}

/// `config_file` is the global `--config` override, if any.
pub fn run(args: ConfigArgs, config_file: Option<&str>) -> Result<()> {
    match args.command {
        ConfigCommands::Show { format } => {
            let config = Config::load(config_file)?;
            let rendered = match format {
                ConfigFormat::Toml => toml::to_string_pretty(&config)?,
                ConfigFormat::Json => serde_json::to_string_pretty(&config)?,
            };
            println!("{}", rendered);
        }
        ConfigCommands::Get { key } => {
            println!("{}", Config::load(config_file)?.get_value(&key)?);
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load(config_file)?;
            config.set_value(&key, &value)?;
            config.save()?;
            println!("{} = {} ({})", key, value, config.file_path().display());
        }
        ConfigCommands::Path => println!("{}", target_path(config_file)?.display()),
        ConfigCommands::Init { force } => {
            let path = init(&target_path(config_file)?, force)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn target_path(config_file: Option<&str>) -> Result<PathBuf> {
    match config_file {
        Some(p) => Ok(PathBuf::from(shellexpand::tilde(p).to_string())),
        None => Config::config_path(),
    }
}

fn init(path: &std::path::Path, force: bool) -> Result<PathBuf> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Pass --force to replace it.",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG_TEMPLATE)?;
    Ok(path.to_path_buf())
}
