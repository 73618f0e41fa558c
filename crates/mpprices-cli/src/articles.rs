//! `Articles.xlsx`: the article lists written by `wb articles` and
//! `ozon articles`, one sheet each, and read back by `wb prices --articles`.

use std::path::Path;

use anyhow::Context;
use calamine::{open_workbook_auto, Data, Reader};

use crate::export::{Cell, KeptSheet};

pub(crate) const ARTICLES_SHEET: &str = "Articles";
pub(crate) const ARTICLES_HEADERS: [&str; 4] =
    ["Артикул", "Название товара", "Кабинет", "ID кабинета"];

pub(crate) const OZON_ARTICLES_SHEET: &str = "OzonArticles";
pub(crate) const OZON_ARTICLES_HEADERS: [&str; 4] =
    ["Кабинет", "Артикул (offer_id)", "ID товара", "Название товара"];

const SHEET_HINTS: [&str; 3] = ["wb", "wildberries", "article"];
const HEADER_WORDS: [&str; 4] = ["артикул", "article", "vendorcode", "vendor_code"];

/// Picks the first sheet whose name mentions WB or articles, else the first.
/// The Ozon sheet holds offer ids, not `nmID`s, and is never picked.
fn pick_sheet(names: &[String]) -> Option<&str> {
    let mut candidates = names.iter().filter(|n| n.as_str() != OZON_ARTICLES_SHEET);
    let first = candidates.clone().next();
    candidates
        .find(|name| {
            let lowered = name.to_lowercase();
            SHEET_HINTS.iter().any(|hint| lowered.contains(hint))
        })
        .or(first)
        .map(String::as_str)
}

#[allow(clippy::cast_possible_truncation)]
fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty | Data::Error(_) => return None,
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 => (*f as i64).to_string(),
        Data::Float(f) => f.to_string(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    Some(text).filter(|t| !t.is_empty())
}

#[allow(clippy::cast_precision_loss)]
fn data_cell(cell: &Data) -> Cell {
    match cell {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        other => cell_text(other).map_or(Cell::Empty, Cell::Text),
    }
}

fn is_header_word(text: &str) -> bool {
    let lowered = text.to_lowercase();
    HEADER_WORDS.contains(&lowered.as_str())
}

/// Reads article numbers from a workbook.
///
/// The header row is skipped. Each remaining row contributes its first
/// non-empty cell that is not a header word; whole numbers are rendered
/// without a fractional part.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or has no readable sheet.
pub(crate) fn read_articles(path: &Path) -> anyhow::Result<Vec<String>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let names = workbook.sheet_names();
    let sheet = pick_sheet(&names)
        .with_context(|| format!("{} has no sheets", path.display()))?
        .to_owned();
    let range = workbook
        .worksheet_range(&sheet)
        .with_context(|| format!("failed to read sheet {sheet}"))?;

    let articles: Vec<String> = range
        .rows()
        .skip(1)
        .filter_map(|row| {
            row.iter()
                .filter_map(cell_text)
                .find(|text| !is_header_word(text))
        })
        .collect();

    tracing::info!(path = %path.display(), sheet, articles = articles.len(), "articles loaded");
    Ok(articles)
}

/// Every sheet of the workbook at `path` except `replaced`, for rewriting
/// the workbook with `replaced` regenerated. A missing file has no sheets.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub(crate) fn read_other_sheets(path: &Path, replaced: &str) -> anyhow::Result<Vec<KeptSheet>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut kept = Vec::new();
    for name in workbook.sheet_names() {
        if name == replaced {
            continue;
        }
        let range = workbook
            .worksheet_range(&name)
            .with_context(|| format!("failed to read sheet {name}"))?;
        let (row0, col0) = range.start().unwrap_or_default();
        let rows = range
            .rows()
            .map(|row| row.iter().map(data_cell).collect())
            .collect();
        kept.push(KeptSheet {
            name,
            origin: (row0, u16::try_from(col0)?),
            rows,
        });
    }
    tracing::debug!(path = %path.display(), kept = kept.len(), "existing sheets carried over");
    Ok(kept)
}

/// Article numbers that parse as WB `nmID`s; others are logged and dropped.
pub(crate) fn article_nm_ids(articles: &[String]) -> Vec<u64> {
    articles
        .iter()
        .filter_map(|a| match a.parse::<u64>() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!(article = %a, "article is not a numeric nmID; ignored");
                None
            }
        })
        .collect()
}
