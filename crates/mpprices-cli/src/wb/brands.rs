use std::collections::BTreeMap;

use mpprices_core::{load_brands, AppConfig, BrandConfig};
use mpprices_scraper::wb::{parse_catalog_product, BrandRef, WbCatalogClient, WbCatalogRow, WbCatalogSettings};
use mpprices_scraper::CookieJar;

use crate::export::{log_fill_rates, timestamped_path, Cell, SheetWriter};
use crate::runner::run_units;

const HEADERS: [&str; 12] = [
    "brand_id",
    "brand_name",
    "product_id",
    "product_name",
    "cabinet_id",
    "cabinet_name",
    "supplier_name",
    "size_id",
    "size_name",
    "price_basic",
    "price_product",
    "source",
];

fn cells(row: &WbCatalogRow) -> Vec<Cell> {
    vec![
        Cell::from(row.brand_id),
        Cell::from(row.brand_name.as_str()),
        Cell::from(row.product_id),
        Cell::from(row.product_name.as_str()),
        Cell::from(row.cabinet_id),
        Cell::from(row.cabinet_name.as_str()),
        Cell::from(row.supplier_name.clone()),
        Cell::from(row.size_id),
        Cell::from(row.size_name.clone()),
        Cell::from(row.price_basic),
        Cell::from(row.price_product),
        Cell::from(row.source),
    ]
}

pub(super) fn select_brands(brands: Vec<BrandConfig>, filter: Option<&str>) -> anyhow::Result<Vec<BrandConfig>> {
    let Some(name) = filter else {
        return Ok(brands);
    };
    let selected: Vec<BrandConfig> = brands
        .into_iter()
        .filter(|b| b.name.eq_ignore_ascii_case(name) || b.display_name() == name.to_uppercase())
        .collect();
    if selected.is_empty() {
        anyhow::bail!("brand '{name}' not found in the brands file");
    }
    Ok(selected)
}

fn sort_rows(rows: &mut [WbCatalogRow]) {
    rows.sort_by(|a, b| {
        (&a.brand_name, &a.cabinet_name, &a.product_name)
            .cmp(&(&b.brand_name, &b.cabinet_name, &b.product_name))
    });
}

fn count_by<'r>(rows: &'r [WbCatalogRow], key: impl Fn(&'r WbCatalogRow) -> &'r str) -> BTreeMap<&'r str, usize> {
    let mut counts = BTreeMap::new();
    for row in rows {
        *counts.entry(key(row)).or_default() += 1;
    }
    counts
}

/// Scrapes the storefront catalog of each configured brand, keeping only
/// products sold by our own cabinets.
///
/// # Errors
///
/// Returns an error if the brands file cannot be loaded, the brand filter
/// matches nothing, every brand fails, or the workbook cannot be written.
pub(crate) async fn run_brands(config: &AppConfig, brand: Option<&str>) -> anyhow::Result<()> {
    let brands = select_brands(load_brands(&config.brands_path)?.brands, brand)?;

    let cookies = CookieJar::parse(config.wb.cookies.as_deref().unwrap_or_default());
    let client = WbCatalogClient::new(WbCatalogSettings::from_config(config), cookies)?;
    let client = &client;
    let cabinets = &config.wb;

    let fetched = run_units(
        "brands",
        &brands,
        1,
        BrandConfig::display_name,
        |b| async move {
            let display_name = b.display_name();
            let catalog = client
                .fetch_brand_catalog(b.brand_id, &display_name, b.fsupplier.as_deref())
                .await?;
            let brand_ref = BrandRef {
                id: b.brand_id,
                name: &display_name,
            };
            let rows: Vec<WbCatalogRow> = catalog
                .products
                .iter()
                .flat_map(|p| parse_catalog_product(p, brand_ref, cabinets))
                .collect();
            tracing::info!(
                brand = %display_name,
                products = catalog.products.len(),
                rows = rows.len(),
                failed_pages = catalog.failed_pages,
                "wb brand processed"
            );
            Ok(rows)
        },
    )
    .await?;

    let mut rows: Vec<WbCatalogRow> = fetched.into_iter().flat_map(|(_, rows)| rows).collect();
    if rows.is_empty() {
        anyhow::bail!("no rows from our cabinets in any brand catalog");
    }
    sort_rows(&mut rows);

    let cells: Vec<Vec<Cell>> = rows.iter().map(cells).collect();
    let path = timestamped_path(&config.output_dir, "wb_brands_prices", chrono::Local::now());
    SheetWriter::new("Prices", &HEADERS).write(&path, &cells)?;

    log_fill_rates(&HEADERS, &cells);
    for (brand, n) in count_by(&rows, |r| r.brand_name.as_str()) {
        tracing::info!(brand, rows = n, "per-brand rows");
    }
    for (cabinet, n) in count_by(&rows, |r| r.cabinet_name.as_str()) {
        tracing::info!(cabinet, rows = n, "per-cabinet rows");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brand(name: &str) -> BrandConfig {
        BrandConfig {
            name: name.to_string(),
            brand_id: 1,
            fsupplier: None,
        }
    }

    fn row(brand: &str, cabinet: &str, product: &str) -> WbCatalogRow {
        WbCatalogRow {
            brand_id: 1,
            brand_name: brand.to_string(),
            product_id: 1,
            product_name: product.to_string(),
            cabinet_id: 1,
            cabinet_name: cabinet.to_string(),
            supplier_name: None,
            size_id: None,
            size_name: None,
            price_basic: Some(10.0),
            price_product: None,
            source: "api-catalog",
        }
    }

    #[test]
    fn brand_filter_matches_case_insensitively() {
        let brands = vec![brand("Cosmo Beauty"), brand("DreamLab")];
        let picked = select_brands(brands, Some("dreamlab")).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "DreamLab");
    }

    #[test]
    fn unknown_brand_is_an_error() {
        let err = select_brands(vec![brand("A")], Some("B")).unwrap_err();
        assert!(err.to_string().contains("'B'"));
    }

    #[test]
    fn rows_sort_by_brand_cabinet_product() {
        let mut rows = vec![
            row("B", "MAU", "x"),
            row("A", "MAU", "z"),
            row("A", "COSMO", "y"),
            row("A", "MAU", "a"),
        ];
        sort_rows(&mut rows);
        let order: Vec<(&str, &str, &str)> = rows
            .iter()
            .map(|r| (r.brand_name.as_str(), r.cabinet_name.as_str(), r.product_name.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("A", "COSMO", "y"), ("A", "MAU", "a"), ("A", "MAU", "z"), ("B", "MAU", "x")]
        );
    }

    #[test]
    fn empty_price_cells_stay_empty() {
        let c = cells(&row("A", "MAU", "x"));
        assert_eq!(c[9], Cell::Number(10.0));
        assert_eq!(c[10], Cell::Empty);
        assert_eq!(c[6], Cell::Empty);
    }
}
