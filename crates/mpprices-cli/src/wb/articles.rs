use std::collections::{BTreeMap, HashMap};

use mpprices_core::AppConfig;
use mpprices_scraper::wb::ContentCard;

use crate::articles::{read_other_sheets, ARTICLES_HEADERS, ARTICLES_SHEET};
use crate::export::{Cell, SheetWriter};
use crate::runner::run_units;

use super::{cabinets_with_tokens, content_client, ApiCabinet};

const ARTICLES_WIDTH_CAP: usize = 100;

struct ArticleRow {
    nm_id: u64,
    title: String,
    cabinet: String,
    cabinet_id: u64,
}

impl ArticleRow {
    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::from(self.nm_id),
            Cell::from(self.title.as_str()),
            Cell::from(self.cabinet.as_str()),
            Cell::from(self.cabinet_id),
        ]
    }
}

fn article_rows(cabinet: &ApiCabinet<'_>, cards: &[ContentCard]) -> Vec<ArticleRow> {
    cards
        .iter()
        .map(|card| ArticleRow {
            nm_id: card.nm_id,
            title: card.display_name().to_owned(),
            cabinet: cabinet.key.to_owned(),
            cabinet_id: cabinet.supplier_id,
        })
        .collect()
}

/// `nmID`s that appear more than once, with their counts.
fn duplicate_nm_ids(rows: &[ArticleRow]) -> BTreeMap<u64, usize> {
    let mut counts: HashMap<u64, usize> = HashMap::new();
    for row in rows {
        *counts.entry(row.nm_id).or_default() += 1;
    }
    counts.into_iter().filter(|(_, n)| *n > 1).collect()
}

/// Fetches every content card of each cabinet and writes the article list.
/// Other sheets of an existing `Articles.xlsx` are kept.
///
/// # Errors
///
/// Returns an error if no cabinet has a token, every cabinet fails, or the
/// workbook cannot be written.
pub(crate) async fn run_articles(config: &AppConfig, cabinet: Option<&str>) -> anyhow::Result<()> {
    let cabinets = cabinets_with_tokens(config, cabinet)?;

    let fetched = run_units(
        "cabinets",
        &cabinets,
        1,
        |c| c.key.to_owned(),
        |c| async move {
            let client = content_client(config, c)?;
            let cards = client.fetch_all_cards().await?;
            tracing::info!(cabinet = c.key, cards = cards.len(), "wb cards fetched");
            Ok(article_rows(c, &cards))
        },
    )
    .await?;

    for (key, rows) in &fetched {
        tracing::info!(cabinet = %key, articles = rows.len(), "cabinet articles");
    }
    let rows: Vec<ArticleRow> = fetched.into_iter().flat_map(|(_, rows)| rows).collect();

    let duplicates = duplicate_nm_ids(&rows);
    if !duplicates.is_empty() {
        tracing::warn!(count = duplicates.len(), "duplicate nmIDs across cabinets");
        for (nm_id, n) in &duplicates {
            tracing::debug!(nm_id, occurrences = n, "duplicate nmID");
        }
    }

    let cells: Vec<Vec<Cell>> = rows.iter().map(ArticleRow::cells).collect();
    let kept = read_other_sheets(&config.articles_path, ARTICLES_SHEET)?;
    let path = SheetWriter::new(ARTICLES_SHEET, &ARTICLES_HEADERS)
        .width_cap(ARTICLES_WIDTH_CAP)
        .write_alongside(&config.articles_path, &cells, &kept)?;
    tracing::info!(path = %path.display(), articles = rows.len(), "articles exported");
    Ok(())
}
