//! `ozon` command handlers.

mod articles;
mod prices;
mod sellers;

use clap::Subcommand;
use mpprices_core::AppConfig;
use mpprices_scraper::ozon::{OzonSellerClient, OzonSellerSettings};

pub(crate) use articles::run_articles;
pub(crate) use prices::run_prices;
pub(crate) use sellers::run_sellers;

/// Sub-commands available under `ozon`.
#[derive(Debug, Subcommand)]
pub enum OzonCommands {
    /// Scrape the seller storefront and join it with Seller API prices
    Sellers {
        /// Stop after this many catalog products (overrides OZON_TEST_LIMIT)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Export every seller price from the Seller API
    Prices,
    /// Write the cabinet's offer ids to the OzonArticles sheet of Articles.xlsx
    Articles,
}

/// Seller API client from `OZON_CLIENT_ID` / `OZON_API_KEY`.
///
/// # Errors
///
/// Returns an error when a credential is missing or the client cannot be
/// built.
pub(super) fn seller_client(config: &AppConfig) -> anyhow::Result<OzonSellerClient> {
    let (client_id, api_key) = config.ozon.seller_credentials()?;
    Ok(OzonSellerClient::new(
        client_id,
        api_key,
        OzonSellerSettings::from_config(config),
    )?)
}
