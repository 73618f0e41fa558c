//! `wb` command handlers.
//!
//! Per-cabinet and per-brand failures are logged and skipped; a command
//! only fails when every unit fails.

mod articles;
mod brands;
mod check;
mod objects;
mod prices;

use std::path::PathBuf;

use clap::Subcommand;
use mpprices_core::{AppConfig, WbCabinetConfig};
use mpprices_scraper::wb::{WbContentClient, WbPricesClient};

pub(crate) use articles::run_articles;
pub(crate) use brands::run_brands;
pub(crate) use check::run_check;
pub(crate) use objects::run_objects;
pub(crate) use prices::run_prices;

/// Sub-commands available under `wb`.
#[derive(Debug, Subcommand)]
pub enum WbCommands {
    /// Export every product card of the cabinets to Articles.xlsx
    Articles {
        /// Restrict to one cabinet key (MAU, MAB, MMA, COSMO, DREAMLAB, BEAUTYLAB)
        #[arg(long)]
        cabinet: Option<String>,
    },
    /// Scrape storefront prices for every brand in the brands file
    Brands {
        /// Restrict to one brand (by name)
        #[arg(long)]
        brand: Option<String>,
    },
    /// Check configuration and fetch one catalog page to confirm the storefront answers
    Check {
        /// Brand to fetch (defaults to the first in the brands file)
        #[arg(long)]
        brand: Option<String>,
    },
    /// Export seller prices from the Prices API joined with content cards
    Prices {
        /// Restrict to one cabinet key
        #[arg(long)]
        cabinet: Option<String>,

        /// Only keep articles listed in this workbook
        #[arg(long, value_name = "PATH")]
        articles: Option<PathBuf>,
    },
    /// Export the content subject catalogue
    Objects {
        /// Cabinet whose token is used (defaults to the first with one)
        #[arg(long)]
        cabinet: Option<String>,

        /// Only subjects under this parent category
        #[arg(long)]
        parent_id: Option<u64>,

        /// Subject name substring
        #[arg(long)]
        name: Option<String>,
    },
}

/// A cabinet that has an API token.
pub(super) struct ApiCabinet<'a> {
    pub key: &'a str,
    pub supplier_id: u64,
    pub token: &'a str,
}

/// Cabinets to run against, optionally narrowed to `filter`.
///
/// Without a filter, cabinets lacking a token are skipped with a warning.
/// A filter naming an unknown cabinet, or one without a token, is an error.
pub(super) fn cabinets_with_tokens<'a>(
    config: &'a AppConfig,
    filter: Option<&str>,
) -> anyhow::Result<Vec<ApiCabinet<'a>>> {
    let with_token = |c: &'a WbCabinetConfig| {
        c.api_key
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(|token| ApiCabinet {
                key: c.key.as_str(),
                supplier_id: c.supplier_id,
                token,
            })
    };

    if let Some(key) = filter {
        let cabinet = config.wb.cabinet(key).ok_or_else(|| {
            let known: Vec<&str> = config.wb.cabinets.iter().map(|c| c.key.as_str()).collect();
            anyhow::anyhow!("unknown cabinet '{key}'; known: {}", known.join(", "))
        })?;
        let cabinet = with_token(cabinet).ok_or_else(|| {
            anyhow::anyhow!("cabinet '{key}' has no API token; set WB_API_KEY_{}", cabinet.key)
        })?;
        return Ok(vec![cabinet]);
    }

    Ok(config
        .wb
        .cabinets
        .iter()
        .filter_map(|c| {
            let cabinet = with_token(c);
            if cabinet.is_none() {
                tracing::warn!(cabinet = %c.key, "skipping cabinet: no API token");
            }
            cabinet
        })
        .collect())
}

pub(super) fn content_client(
    config: &AppConfig,
    cabinet: &ApiCabinet<'_>,
) -> anyhow::Result<WbContentClient> {
    Ok(WbContentClient::new(
        cabinet.token,
        config.request_timeout_secs,
        &config.user_agent,
        config.max_retries,
        config.retry_backoff_base_ms,
    )?)
}

pub(super) fn prices_client(
    config: &AppConfig,
    cabinet: &ApiCabinet<'_>,
) -> anyhow::Result<WbPricesClient> {
    Ok(WbPricesClient::new(
        cabinet.token,
        config.request_timeout_secs,
        &config.user_agent,
        config.max_retries,
        config.retry_backoff_base_ms,
    )?)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        mpprices_core::build_app_config(|key| {
            vars.get(key).cloned().ok_or(std::env::VarError::NotPresent)
        })
        .unwrap()
    }

    #[test]
    fn tokenless_cabinets_are_skipped() {
        let config = config(&[("WB_API_KEY_COSMO", "tok")]);
        let cabinets = cabinets_with_tokens(&config, None).unwrap();
        assert_eq!(cabinets.len(), 1);
        assert_eq!(cabinets[0].key, "COSMO");
        assert_eq!(cabinets[0].supplier_id, 224_650);
    }

    #[test]
    fn filter_is_case_insensitive() {
        let config = config(&[("WB_API_KEY_MAU", "a"), ("WB_API_KEY_MAB", "b")]);
        let cabinets = cabinets_with_tokens(&config, Some("mab")).unwrap();
        assert_eq!(cabinets.len(), 1);
        assert_eq!(cabinets[0].token, "b");
    }

    #[test]
    fn filter_on_tokenless_cabinet_fails() {
        let config = config(&[]);
        let err = cabinets_with_tokens(&config, Some("MMA")).err().unwrap();
        assert!(err.to_string().contains("WB_API_KEY_MMA"));
        let err = cabinets_with_tokens(&config, Some("NOPE")).err().unwrap();
        assert!(err.to_string().starts_with("unknown cabinet 'NOPE'"));
    }
}
