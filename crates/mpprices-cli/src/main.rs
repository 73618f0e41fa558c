mod articles;
mod export;
mod logging;
mod ozon;
mod runner;
mod wb;

use clap::{CommandFactory, Parser, Subcommand};

use crate::ozon::OzonCommands;
use crate::wb::WbCommands;

#[derive(Debug, Parser)]
#[command(name = "mpprices")]
#[command(about = "Wildberries and Ozon price collector")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Wildberries: storefront catalog and seller APIs
    Wb {
        #[command(subcommand)]
        command: WbCommands,
    },
    /// Ozon: seller storefront and Seller API
    Ozon {
        #[command(subcommand)]
        command: OzonCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = mpprices_core::load_app_config()?;
    let _log_guard = logging::init_logging(&config.logs_dir, &config.log_level)?;
    tracing::debug!(?config, "configuration loaded");

    match command {
        Commands::Wb { command } => match command {
            WbCommands::Articles { cabinet } => wb::run_articles(&config, cabinet.as_deref()).await,
            WbCommands::Brands { brand } => wb::run_brands(&config, brand.as_deref()).await,
            WbCommands::Check { brand } => wb::run_check(&config, brand.as_deref()).await,
            WbCommands::Prices { cabinet, articles } => {
                wb::run_prices(&config, cabinet.as_deref(), articles.as_deref()).await
            }
            WbCommands::Objects {
                cabinet,
                parent_id,
                name,
            } => wb::run_objects(&config, cabinet.as_deref(), parent_id, name).await,
        },
        Commands::Ozon { command } => match command {
            OzonCommands::Sellers { limit } => ozon::run_sellers(&config, limit).await,
            OzonCommands::Prices => ozon::run_prices(&config).await,
            OzonCommands::Articles => ozon::run_articles(&config).await,
        },
    }
}

#[cfg(test)]
mod tests;
