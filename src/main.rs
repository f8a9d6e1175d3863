use anyhow::Result;
use clap::Parser;

use atelier::Config;
use atelier::cli::{self, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let config_file = cli.config.as_deref();

    match cli.command {
        Commands::Generate(args) => {
            let config = load_config(config_file, cli.verbose)?;
            cli::generate::run(args, &config).await
        }
        Commands::Studio(args) => {
            let config = load_config(config_file, cli.verbose)?;
            cli::studio::run(args, &config).await
        }
        #[cfg(feature = "desktop")]
        Commands::Desktop(args) => {
            let config = load_config(config_file, cli.verbose)?;
            cli::desktop::run(args, config)
        }
        Commands::Config(args) => {
            init_logging(cli.verbose, "info");
            cli::config::run(args, config_file)
        }
        Commands::Paths => {
            init_logging(cli.verbose, "info");
            cli::paths::run()
        }
    }
}

fn load_config(config_file: Option<&str>, verbose: bool) -> Result<Config> {
    let config = Config::load(config_file)?;
    init_logging(verbose, &config.logging.level);
    Ok(config)
}

// Logs go to stderr so that stdout stays clean for `--format json`.
fn init_logging(verbose: bool, level: &str) {
    let log_level = if verbose { "debug" } else { level };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();
}
