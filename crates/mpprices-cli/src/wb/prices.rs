use std::collections::HashSet;
use std::path::Path;

use mpprices_core::AppConfig;
use mpprices_scraper::wb::{merge_cards_with_prices, WbPriceRow};

use crate::articles::{article_nm_ids, read_articles};
use crate::export::{log_fill_rates, timestamped_path, Cell, SheetWriter};
use crate::runner::run_units;

use super::{cabinets_with_tokens, content_client, prices_client};

const HEADERS: [&str; 10] = [
    "cabinet_name",
    "cabinet_id",
    "article",
    "vendor_code",
    "brand",
    "name",
    "price_basic",
    "price_product",
    "price_card",
    "discount",
];

fn cells(row: &WbPriceRow) -> Vec<Cell> {
    vec![
        Cell::from(row.cabinet.as_str()),
        Cell::from(row.cabinet_id),
        Cell::from(row.nm_id),
        Cell::from(row.vendor_code.as_str()),
        Cell::from(row.brand.as_str()),
        Cell::from(row.title.as_str()),
        Cell::from(row.base_price),
        Cell::from(row.discount_price),
        Cell::from(row.club_price),
        Cell::from(row.discount),
    ]
}

/// Keeps rows whose `nmID` is in `wanted`; `None` keeps everything.
fn filter_rows(rows: Vec<WbPriceRow>, wanted: Option<&HashSet<u64>>) -> Vec<WbPriceRow> {
    match wanted {
        Some(ids) => rows.into_iter().filter(|r| ids.contains(&r.nm_id)).collect(),
        None => rows,
    }
}

fn load_wanted(path: &Path) -> anyhow::Result<HashSet<u64>> {
    let ids: HashSet<u64> = article_nm_ids(&read_articles(path)?).into_iter().collect();
    if ids.is_empty() {
        anyhow::bail!("{} lists no usable articles", path.display());
    }
    Ok(ids)
}

/// Joins each cabinet's content cards with its Prices API goods.
///
/// # Errors
///
/// Returns an error if the article list cannot be read, no cabinet has a
/// token, every cabinet fails, or the workbook cannot be written.
pub(crate) async fn run_prices(
    config: &AppConfig,
    cabinet: Option<&str>,
    articles: Option<&Path>,
) -> anyhow::Result<()> {
    let wanted = articles.map(load_wanted).transpose()?;
    let cabinets = cabinets_with_tokens(config, cabinet)?;

    let fetched = run_units(
        "cabinets",
        &cabinets,
        1,
        |c| c.key.to_owned(),
        |c| async move {
            let cards = content_client(config, c)?.fetch_all_cards().await?;
            let goods = prices_client(config, c)?.fetch_all_goods().await?;
            let rows = merge_cards_with_prices(c.key, c.supplier_id, &cards, &goods);
            tracing::info!(
                cabinet = c.key,
                cards = cards.len(),
                goods = goods.len(),
                "wb cabinet prices fetched"
            );
            Ok(rows)
        },
    )
    .await?;

    let rows: Vec<WbPriceRow> = fetched.into_iter().flat_map(|(_, rows)| rows).collect();
    let before = rows.len();
    let rows = filter_rows(rows, wanted.as_ref());
    if wanted.is_some() {
        tracing::info!(kept = rows.len(), fetched = before, "filtered to listed articles");
    }

    let cells: Vec<Vec<Cell>> = rows.iter().map(cells).collect();
    let path = timestamped_path(&config.output_dir, "wb_prices", chrono::Local::now());
    SheetWriter::new("Prices", &HEADERS).write(&path, &cells)?;
    log_fill_rates(&HEADERS, &cells);
    Ok(())
}
