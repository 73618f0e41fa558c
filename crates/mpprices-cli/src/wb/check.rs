use mpprices_core::{load_brands, AppConfig};
use mpprices_scraper::price_text::kopecks_to_rubles;
use mpprices_scraper::wb::{CatalogPrice, CatalogProduct, WbCatalogClient, WbCatalogSettings};
use mpprices_scraper::CookieJar;

use super::brands::select_brands;

/// Ruble prices above this almost always mean kopecks were not converted.
const MAX_PLAUSIBLE_RUB: f64 = 1_000_000.0;

/// Products inspected from the first catalog page.
const SAMPLE: usize = 5;

fn config_issues(config: &AppConfig) -> Vec<String> {
    let mut issues = Vec::new();
    if config.wb.cabinets.is_empty() {
        issues.push("no WB cabinets configured".to_string());
    }
    if config.wb.dest == 0 {
        issues.push("WB_DEST is zero".to_string());
    }
    if config.max_concurrent_requests == 0 {
        issues.push("MAX_CONCURRENT_REQUESTS must be positive".to_string());
    }
    issues
}

fn product_prices(product: &CatalogProduct) -> impl Iterator<Item = CatalogPrice> + '_ {
    product
        .sizes
        .iter()
        .filter_map(|s| s.price)
        .chain(product.price)
}

fn product_issues(products: &[CatalogProduct]) -> Vec<String> {
    let mut issues = Vec::new();
    for p in products.iter().take(SAMPLE) {
        if p.name.trim().is_empty() {
            issues.push(format!("product {}: name is missing", p.id));
        }
        let mut priced = false;
        for price in product_prices(p) {
            priced = true;
            for (field, kopecks) in [("basic", price.basic), ("product", price.product)] {
                match kopecks {
                    None | Some(0) => issues.push(format!("product {}: price {field} is not positive", p.id)),
                    Some(k) if kopecks_to_rubles(k) > MAX_PLAUSIBLE_RUB => {
                        issues.push(format!("product {}: price {field} {k} looks unconverted", p.id));
                    }
                    Some(_) => {}
                }
            }
        }
        if !priced {
            issues.push(format!("product {}: no prices", p.id));
        }
    }
    issues
}

/// Checks the configuration and fetches the first catalog page of one brand
/// to confirm the storefront still answers with the expected shape.
///
/// # Errors
///
/// Returns an error listing every problem found, or when the brands file
/// cannot be loaded or the page cannot be fetched.
pub(crate) async fn run_check(config: &AppConfig, brand: Option<&str>) -> anyhow::Result<()> {
    let mut issues = config_issues(config);

    let brands = select_brands(load_brands(&config.brands_path)?.brands, brand)?;
    let Some(target) = brands.first() else {
        anyhow::bail!("brands file lists no brands");
    };

    let cookies = CookieJar::parse(config.wb.cookies.as_deref().unwrap_or_default());
    let client = WbCatalogClient::new(WbCatalogSettings::from_config(config), cookies)?;
    client.ensure_session().await;
    let page = client
        .fetch_page(target.brand_id, 1, target.fsupplier.as_deref())
        .await?;
    tracing::info!(
        brand = %target.display_name(),
        products = page.products.len(),
        total = page.total,
        "wb catalog reachable"
    );
    if page.products.is_empty() {
        issues.push(format!("brand {} returned an empty first page", target.display_name()));
    }
    issues.extend(product_issues(&page.products));

    if issues.is_empty() {
        tracing::info!("wb check passed");
        return Ok(());
    }
    for issue in &issues {
        tracing::warn!(%issue, "wb check");
    }
    anyhow::bail!("wb check found {} issue(s): {}", issues.len(), issues.join("; "))
}
