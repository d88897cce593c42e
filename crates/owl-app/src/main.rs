use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use owl::{app, Cli, OwlConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    owl_logging::init_logging(cli.verbose);

    let config = match OwlConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Configuration error:".red().bold(), e);
            std::process::exit(2);
        }
    };

    app::dispatch(cli.command, config).await
}
