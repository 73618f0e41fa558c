//! Converts storefront catalog products into export rows.

use mpprices_core::WbSettings;

use crate::price_text::kopecks_to_rubles;
use crate::wb::types::{CatalogPrice, CatalogProduct, WbCatalogRow};

pub const CATALOG_SOURCE: &str = "api-catalog";

/// Brand the rows are produced for.
#[derive(Debug, Clone, Copy)]
pub struct BrandRef<'a> {
    pub id: u64,
    pub name: &'a str,
}

/// A zero kopeck price means "not shown" on the storefront.
fn rubles(kopecks: Option<u64>) -> Option<f64> {
    kopecks.filter(|k| *k > 0).map(kopecks_to_rubles)
}

fn row(
    product: &CatalogProduct,
    brand: BrandRef<'_>,
    supplier_id: u64,
    cabinet_name: &str,
    size: Option<(Option<u64>, Option<String>)>,
    price: Option<CatalogPrice>,
) -> WbCatalogRow {
    let (size_id, size_name) = size.unwrap_or((None, None));
    let price = price.unwrap_or_default();
    WbCatalogRow {
        brand_id: brand.id,
        brand_name: brand.name.to_owned(),
        product_id: product.id,
        product_name: product.name.clone(),
        cabinet_id: supplier_id,
        cabinet_name: cabinet_name.to_owned(),
        supplier_name: product.supplier.clone(),
        size_id,
        size_name,
        price_basic: rubles(price.basic),
        price_product: rubles(price.product),
        source: CATALOG_SOURCE,
    }
}

/// Produces one row per size of `product`, or a single row from the
/// product-level price when it has no sizes.
///
/// Products whose supplier is not one of our cabinets are dropped: the
/// storefront mixes in resellers of the same brand.
#[must_use]
pub fn parse_catalog_product(
    product: &CatalogProduct,
    brand: BrandRef<'_>,
    cabinets: &WbSettings,
) -> Vec<WbCatalogRow> {
    let Some(supplier_id) = product.supplier_id else {
        return Vec::new();
    };
    let Some(cabinet) = cabinets.cabinet_by_supplier(supplier_id) else {
        return Vec::new();
    };
    let cabinet_name = cabinet.key.as_str();

    if product.sizes.is_empty() {
        return vec![row(
            product,
            brand,
            supplier_id,
            cabinet_name,
            None,
            product.price,
        )];
    }

    product
        .sizes
        .iter()
        .map(|size| {
            let size_name = size
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .or_else(|| size.orig_name.clone().filter(|n| !n.is_empty()));
            row(
                product,
                brand,
                supplier_id,
                cabinet_name,
                Some((size.option_id, size_name)),
                size.price,
            )
        })
        .collect()
}
