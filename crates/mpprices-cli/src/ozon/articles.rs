use std::collections::HashMap;

use mpprices_core::{ozon_cabinet_name, AppConfig};
use mpprices_scraper::ozon::{PriceFilter, ProductInfo, SellerPrice, PRICES_PAGE_LIMIT};

use crate::articles::{read_other_sheets, OZON_ARTICLES_HEADERS, OZON_ARTICLES_SHEET};
use crate::export::{Cell, SheetWriter};

use super::seller_client;

const ARTICLES_WIDTH_CAP: usize = 100;

/// One row per cabinet product that has an offer id, named from `infos`.
fn article_rows(prices: &[SellerPrice], infos: &[ProductInfo], cabinet_name: &str) -> Vec<Vec<Cell>> {
    let names: HashMap<u64, &str> = infos
        .iter()
        .filter_map(|i| i.name.as_deref().map(|n| (i.product_id, n)))
        .collect();

    prices
        .iter()
        .filter_map(|price| {
            let Some(offer_id) = price.offer_id.as_deref().filter(|o| !o.is_empty()) else {
                tracing::debug!(product_id = ?price.product_id, "product without offer_id skipped");
                return None;
            };
            let name = price.product_id.and_then(|id| names.get(&id).copied());
            Some(vec![
                Cell::from(cabinet_name),
                Cell::from(offer_id),
                Cell::from(price.product_id),
                Cell::from(name),
            ])
        })
        .collect()
}

/// Collects the offer ids of every product in the Ozon cabinet into the
/// `OzonArticles` sheet of `Articles.xlsx`, keeping the other sheets.
///
/// # Errors
///
/// Returns an error if the credentials are missing, the Seller API fails,
/// no product has an offer id, or the workbook cannot be rewritten.
pub(crate) async fn run_articles(config: &AppConfig) -> anyhow::Result<()> {
    let client = seller_client(config)?;
    let cabinet_name = ozon_cabinet_name(config.ozon.seller_id);

    let items = client
        .fetch_product_prices(&PriceFilter::All, PRICES_PAGE_LIMIT)
        .await?;
    let prices: Vec<SellerPrice> = items.iter().map(SellerPrice::from_value).collect();
    let product_ids: Vec<u64> = prices.iter().filter_map(|p| p.product_id).collect();
    let infos = client.fetch_products_by_product_id(&product_ids).await?;

    let rows = article_rows(&prices, &infos, &cabinet_name);
    if rows.is_empty() {
        anyhow::bail!("no ozon articles found for cabinet {cabinet_name}");
    }
    tracing::info!(cabinet = %cabinet_name, products = prices.len(), articles = rows.len(), "ozon articles collected");

    let kept = read_other_sheets(&config.articles_path, OZON_ARTICLES_SHEET)?;
    let path = SheetWriter::new(OZON_ARTICLES_SHEET, &OZON_ARTICLES_HEADERS)
        .width_cap(ARTICLES_WIDTH_CAP)
        .write_alongside(&config.articles_path, &rows, &kept)?;
    tracing::info!(path = %path.display(), sheet = OZON_ARTICLES_SHEET, "ozon articles exported");
    Ok(())
}
