use mpprices_core::AppConfig;
use mpprices_scraper::ozon::{PriceDetails, PriceFilter, PRICES_PAGE_LIMIT};

use crate::export::{log_fill_rates, timestamped_path, Cell, SheetWriter};

use super::seller_client;

/// The first six are the priority columns.
const HEADERS: [&str; 20] = [
    "SKU (product_id)",
    "Артикул продавца",
    "Цена",
    "Валюта",
    "Зачёркнутая цена",
    "Минимальная цена",
    "Маркетинговая цена продавца",
    "Розничная цена",
    "Чистая цена",
    "НДС",
    "Авто-действия включены",
    "Эквайринг",
    "Объёмный вес",
    "Комиссия FBO (%)",
    "Комиссия FBS (%)",
    "Комиссия RFBS (%)",
    "Комиссия FBP (%)",
    "Индекс цвета",
    "Индекс Ozon",
    "Мин. цена по индексу Ozon",
];

fn cells(d: &PriceDetails) -> Vec<Cell> {
    vec![
        Cell::from(d.product_id),
        Cell::from(d.offer_id.clone()),
        Cell::from(d.price),
        Cell::from(d.currency.clone()),
        Cell::from(d.old_price),
        Cell::from(d.min_price),
        Cell::from(d.marketing_seller_price),
        Cell::from(d.retail_price),
        Cell::from(d.net_price),
        Cell::from(d.vat),
        Cell::from(d.auto_action_enabled.clone()),
        Cell::from(d.acquiring),
        Cell::from(d.volume_weight),
        Cell::from(d.sales_percent_fbo),
        Cell::from(d.sales_percent_fbs),
        Cell::from(d.sales_percent_rfbs),
        Cell::from(d.sales_percent_fbp),
        Cell::from(d.color_index.clone()),
        Cell::from(d.ozon_index_value),
        Cell::from(d.ozon_index_min_price),
    ]
}

/// Exports every price the Seller API returns for the cabinet.
///
/// # Errors
///
/// Returns an error if the credentials are missing, the API call fails, it
/// returns nothing, or the workbook cannot be written.
pub(crate) async fn run_prices(config: &AppConfig) -> anyhow::Result<()> {
    let client = seller_client(config)?;
    let items = client
        .fetch_product_prices(&PriceFilter::All, PRICES_PAGE_LIMIT)
        .await?;
    if items.is_empty() {
        anyhow::bail!("seller API returned no prices");
    }
    tracing::info!(items = items.len(), "ozon prices fetched");

    let details: Vec<PriceDetails> = items.iter().map(PriceDetails::from_value).collect();
    let cells: Vec<Vec<Cell>> = details.iter().map(cells).collect();
    let path = timestamped_path(&config.output_dir, "ozon_prices", chrono::Local::now());
    SheetWriter::new("Prices", &HEADERS).write(&path, &cells)?;
    log_fill_rates(&HEADERS, &cells);
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn flattened_item_lands_in_matching_columns() {
        let details = PriceDetails::from_value(&json!({
            "product_id": 42,
            "offer_id": "CB-1",
            "price": {"price": "990", "currency_code": "RUB", "old_price": "1500", "auto_action_enabled": true},
            "commissions": {"sales_percent_fbo": 12.5},
            "price_indexes": {"color_index": "GREEN"}
        }));
        let row = cells(&details);
        assert_eq!(row.len(), HEADERS.len());
        let at = |name: &str| &row[HEADERS.iter().position(|h| *h == name).unwrap()];

        assert_eq!(at("SKU (product_id)"), &Cell::Number(42.0));
        assert_eq!(at("Артикул продавца"), &Cell::Text("CB-1".into()));
        assert_eq!(at("Цена"), &Cell::Number(990.0));
        assert_eq!(at("Зачёркнутая цена"), &Cell::Number(1500.0));
        assert_eq!(at("Авто-действия включены"), &Cell::Text("true".into()));
        assert_eq!(at("Комиссия FBO (%)"), &Cell::Number(12.5));
        assert_eq!(at("Индекс цвета"), &Cell::Text("GREEN".into()));
        assert_eq!(at("НДС"), &Cell::Empty);
    }
}
