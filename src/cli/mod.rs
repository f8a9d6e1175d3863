pub mod config;
#[cfg(feature = "desktop")]
pub mod desktop;
pub mod generate;
pub mod paths;
pub mod studio;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "atelier")]
#[command(author, version, about = "An AI patissier that designs desserts from a few keywords")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file
    #[arg(short, long, global = true, env = "ATELIER_CONFIG")]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Design one dessert and print it
    Generate(generate::GenerateArgs),

    /// Interactive studio: order, refine and save creations
    Studio(studio::StudioArgs),

    /// Launch the desktop GUI
    #[cfg(feature = "desktop")]
    Desktop(desktop::DesktopArgs),

    /// Configuration management
    Config(config::ConfigArgs),

    /// Show resolved XDG directory paths
    Paths,
}
