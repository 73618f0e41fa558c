use std::collections::BTreeSet;

use mpprices_core::{ozon_cabinet_name, AccountType, AppConfig};
use mpprices_scraper::ozon::{
    load_initial_cookies, merge_catalog_with_seller, rows_from_seller_only, OzonCatalogClient,
    OzonCatalogProduct, OzonCatalogSettings, OzonPriceRow, OzonSellerClient, PriceFilter,
    ProductInfo, SellerPrice, PRICES_PAGE_LIMIT,
};

use crate::export::{log_fill_rates, timestamped_path, Cell, SheetWriter};

use super::seller_client;

/// The original eleven columns, then cabinet product id, currency and the
/// data sources of each row.
const HEADERS: [&str; 15] = [
    "SKU",
    "Артикул продавца",
    "Название товара",
    "ID кабинета",
    "Кабинет",
    "Цена покупателя",
    "Зачёркнутая цена (каталог)",
    "Скидка %",
    "Цена продавца",
    "Зачёркнутая цена (API)",
    "Минимальная цена",
    "ID товара в кабинете",
    "Валюта",
    "Источник (каталог)",
    "Источник (Seller API)",
];

fn cells(row: &OzonPriceRow) -> Vec<Cell> {
    vec![
        Cell::from(row.sku),
        Cell::from(row.offer_id.clone()),
        Cell::from(row.name.clone()),
        Cell::from(row.cabinet_id),
        Cell::from(row.cabinet_name.as_str()),
        Cell::from(row.price_current),
        Cell::from(row.price_original),
        Cell::from(row.discount_percent),
        Cell::from(row.price_seller),
        Cell::from(row.price_old),
        Cell::from(row.price_min),
        Cell::from(row.product_id_seller),
        Cell::from(row.currency.as_str()),
        Cell::from(row.source_catalog),
        Cell::from(row.source_seller),
    ]
}

/// Alphabetical by name; unnamed rows go last.
fn sort_by_name(rows: &mut [OzonPriceRow]) {
    rows.sort_by(|a, b| {
        (a.name.is_none(), a.name.as_deref()).cmp(&(b.name.is_none(), b.name.as_deref()))
    });
}

/// What the Seller API knows about the storefront products.
#[derive(Debug, Default)]
struct SellerData {
    infos: Vec<ProductInfo>,
    prices: Vec<SellerPrice>,
}

/// `/v5` prices for `product_ids`, in filter-sized chunks.
async fn prices_for_products(
    client: &OzonSellerClient,
    product_ids: &[u64],
) -> anyhow::Result<Vec<SellerPrice>> {
    let mut prices = Vec::new();
    for chunk in product_ids.chunks(PRICES_PAGE_LIMIT as usize) {
        let items = client
            .fetch_product_prices(&PriceFilter::ProductIds(chunk.to_vec()), PRICES_PAGE_LIMIT)
            .await?;
        prices.extend(items.iter().map(SellerPrice::from_value));
    }
    Ok(prices)
}

/// Looks up the storefront SKUs in the seller's cabinet.
///
/// A lookup of the first SKU runs first; when it finds nothing the products are
/// not in this cabinet and the stage is skipped.
async fn seller_data_for_catalog(
    client: &OzonSellerClient,
    products: &[OzonCatalogProduct],
) -> anyhow::Result<SellerData> {
    let skus: Vec<u64> = products
        .iter()
        .map(|p| p.sku)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let Some(first_sku) = skus.first().copied() else {
        return Ok(SellerData::default());
    };

    let known = client.fetch_products_by_sku(&[first_sku]).await?;
    if known.is_empty() {
        tracing::warn!(sku = first_sku, "seller API knows nothing about the first SKU; using catalog data only");
        return Ok(SellerData::default());
    }

    let infos = client.fetch_products_by_sku(&skus).await?;
    let product_ids: Vec<u64> = infos
        .iter()
        .map(|i| i.product_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let prices = prices_for_products(client, &product_ids).await?;
    tracing::info!(skus = skus.len(), infos = infos.len(), prices = prices.len(), "seller API data fetched");
    Ok(SellerData { infos, prices })
}

/// Rows from the Seller API alone, for when the storefront returned nothing.
async fn seller_only_rows(
    client: &OzonSellerClient,
    seller_id: u64,
    cabinet_name: &str,
) -> anyhow::Result<Vec<OzonPriceRow>> {
    let items = client
        .fetch_product_prices(&PriceFilter::All, PRICES_PAGE_LIMIT)
        .await?;
    let prices: Vec<SellerPrice> = items.iter().map(SellerPrice::from_value).collect();
    let product_ids: Vec<u64> = prices.iter().filter_map(|p| p.product_id).collect();
    let infos = client.fetch_products_by_product_id(&product_ids).await?;
    Ok(rows_from_seller_only(&prices, &infos, seller_id, cabinet_name))
}

/// Walks the seller storefront, enriches it from the Seller API and writes
/// the merged price list.
///
/// A failed catalog walk or Seller API stage is logged and the other source
/// is used alone.
///
/// # Errors
///
/// Returns an error if the seller config is invalid, the cookie file is
/// unreadable, both sources come back empty, or the workbook cannot be
/// written.
pub(crate) async fn run_sellers(config: &AppConfig, limit: Option<usize>) -> anyhow::Result<()> {
    let ozon = &config.ozon;
    ozon.validate_catalog()?;
    let seller_id = ozon.seller_id;
    let cabinet_name = ozon_cabinet_name(seller_id);

    if ozon.account_type == AccountType::Foreign {
        tracing::info!("OZON_ACCOUNT_TYPE=foreign: the seller API only returns products of your own cabinet");
    }

    let cookies = load_initial_cookies(ozon.cookies.as_deref(), &ozon.cookies_path)?;
    let catalog_client = OzonCatalogClient::new(OzonCatalogSettings::from_config(config), cookies)?;
    let max_products = limit.or(ozon.test_limit);

    let products = match catalog_client
        .fetch_seller_catalog(seller_id, &ozon.seller_name, ozon.max_pages, max_products)
        .await
    {
        Ok(catalog) => {
            let stats = &catalog.stats;
            tracing::info!(
                products = catalog.products.len(),
                pages_ok = stats.pages_ok,
                pages_failed = stats.pages_failed,
                antibot_blocks = stats.antibot_blocks,
                "ozon storefront catalog fetched"
            );
            if let Some(delay) = &stats.delay {
                tracing::info!(
                    current_delay = ?delay.current_delay,
                    requests = delay.total_requests,
                    blocks = delay.total_blocks,
                    "adaptive delay {:.1}% success",
                    delay.success_rate
                );
            }
            catalog.products
        }
        Err(e) => {
            tracing::error!(seller_id, error = %e, "ozon storefront catalog failed");
            Vec::new()
        }
    };

    let seller = match seller_client(config) {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "seller API stage skipped");
            None
        }
    };

    let mut rows = if products.is_empty() {
        let Some(client) = &seller else {
            anyhow::bail!("storefront catalog is empty and Seller API credentials are missing");
        };
        tracing::warn!("storefront catalog is empty; building rows from the seller API only");
        seller_only_rows(client, seller_id, &cabinet_name).await?
    } else {
        let data = match &seller {
            Some(client) => seller_data_for_catalog(client, &products)
                .await
                .unwrap_or_else(|e| {
                    tracing::error!(error = %format!("{e:#}"), "seller API stage failed; using catalog data only");
                    SellerData::default()
                }),
            None => SellerData::default(),
        };
        merge_catalog_with_seller(&products, &data.infos, &data.prices, seller_id, &cabinet_name).rows
    };

    if rows.is_empty() {
        anyhow::bail!("no ozon rows to export for seller {seller_id}");
    }
    sort_by_name(&mut rows);

    let cells: Vec<Vec<Cell>> = rows.iter().map(cells).collect();
    let path = timestamped_path(&config.output_dir, "ozon_seller_prices", chrono::Local::now());
    SheetWriter::new("Prices", &HEADERS).write(&path, &cells)?;
    log_fill_rates(&HEADERS, &cells);
    Ok(())
}
