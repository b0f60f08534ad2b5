pub mod config;
pub mod data;
pub mod html;
pub mod links;
pub mod server;
pub mod types;
pub mod view;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a self-contained dashboard HTML file
    Render {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(short, long, value_name = "FILE", default_value = "map.html")]
        output: PathBuf,
    },
    /// Serve the interactive dashboard
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Render { config, output } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let cities = data::load_cities(&app_config)?;
            let links = links::LinkTable::build(&app_config.links);
            let page = html::export_page(&app_config, &cities, &links)?;
            std::fs::write(output, page)
                .with_context(|| format!("Failed to write {:?}", output))?;
            tracing::info!("Wrote dashboard to {:?}", output);
        }
        Commands::Serve { config } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let cities = data::load_cities(&app_config)?;
            server::start_server(app_config, cities).await?;
        }
    }

    Ok(())
}
