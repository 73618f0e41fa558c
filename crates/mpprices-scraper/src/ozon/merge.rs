//! Joins storefront products with Seller API data into export rows.

use std::collections::HashMap;

use crate::ozon::types::{
    OzonCatalogProduct, OzonPriceRow, ProductInfo, SellerPrice, SELLER_INFO_SOURCE,
    SELLER_PRICES_SOURCE,
};
use crate::price_text::discount_percent;

#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub rows: Vec<OzonPriceRow>,
    /// Catalog products found in the seller's cabinet by SKU.
    pub matched: usize,
    pub unmatched: usize,
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

/// SKU to cabinet product. FBO and FBS SKUs resolve too, since the
/// storefront may show either.
fn index_infos(infos: &[ProductInfo]) -> HashMap<u64, &ProductInfo> {
    let mut by_sku = HashMap::new();
    for info in infos {
        for sku in [info.sku, info.fbo_sku, info.fbs_sku].into_iter().flatten() {
            by_sku.entry(sku).or_insert(info);
        }
    }
    by_sku
}

/// Builds one row per storefront product, enriched with whatever the
/// Seller API knows about it.
///
/// Seller prices are looked up by offer id, then by product id. The
/// struck-through price prefers the seller's `old_price` over the one shown
/// on the storefront and fills both `price_original` and `price_old`; the
/// discount is recomputed from the final pair. A product counts as matched
/// when its SKU resolves to a cabinet product.
#[must_use]
pub fn merge_catalog_with_seller(
    catalog: &[OzonCatalogProduct],
    infos: &[ProductInfo],
    prices: &[SellerPrice],
    seller_id: u64,
    cabinet_name: &str,
) -> MergeOutcome {
    let by_sku = index_infos(infos);
    let by_offer: HashMap<&str, &SellerPrice> = prices
        .iter()
        .filter_map(|p| p.offer_id.as_deref().map(|o| (o, p)))
        .collect();
    let by_product: HashMap<u64, &SellerPrice> = prices
        .iter()
        .filter_map(|p| p.product_id.map(|id| (id, p)))
        .collect();

    let mut outcome = MergeOutcome::default();
    for product in catalog {
        let info = by_sku.get(&product.sku).copied();
        let offer_id = info
            .and_then(|i| i.offer_id.clone())
            .or_else(|| product.offer_id.clone());
        let price = offer_id
            .as_deref()
            .and_then(|o| by_offer.get(o))
            .or_else(|| info.and_then(|i| by_product.get(&i.product_id)))
            .copied();

        if info.is_some() {
            outcome.matched += 1;
        } else {
            outcome.unmatched += 1;
        }

        let price_original = price
            .and_then(|p| positive(p.old_price))
            .or(product.original_price);
        let discount = match (price_original, product.current_price) {
            (Some(original), Some(current)) => discount_percent(original, current),
            _ => product.discount_percent,
        };
        let name = Some(product.name.clone())
            .filter(|n| !n.is_empty())
            .or_else(|| info.and_then(|i| i.name.clone()));

        outcome.rows.push(OzonPriceRow {
            sku: Some(product.sku),
            product_id_seller: info.map(|i| i.product_id),
            offer_id,
            name,
            cabinet_id: seller_id,
            cabinet_name: cabinet_name.to_owned(),
            price_current: product.current_price,
            price_original,
            discount_percent: discount,
            price_seller: price.and_then(|p| p.seller_price),
            price_old: price_original,
            price_min: price.and_then(|p| p.min_price),
            currency: price.map_or_else(|| "RUB".to_owned(), |p| p.currency.clone()),
            source_catalog: Some(product.source),
            source_seller: info.map(|_| SELLER_INFO_SOURCE),
        });
    }

    tracing::info!(
        products = catalog.len(),
        matched = outcome.matched,
        unmatched = outcome.unmatched,
        "ozon catalog merged with seller data"
    );
    outcome
}

/// Rows built from the Seller API alone, for when the storefront yielded
/// nothing. Names come from `infos` matched by product id.
#[must_use]
pub fn rows_from_seller_only(
    prices: &[SellerPrice],
    infos: &[ProductInfo],
    seller_id: u64,
    cabinet_name: &str,
) -> Vec<OzonPriceRow> {
    let names: HashMap<u64, &ProductInfo> = infos.iter().map(|i| (i.product_id, i)).collect();

    prices
        .iter()
        .map(|price| {
            let info = price.product_id.and_then(|id| names.get(&id)).copied();
            let price_old = positive(price.old_price);
            let discount = match (price_old, price.seller_price) {
                (Some(old), Some(current)) => discount_percent(old, current),
                _ => None,
            };
            OzonPriceRow {
                sku: None,
                product_id_seller: price.product_id,
                offer_id: price
                    .offer_id
                    .clone()
                    .or_else(|| info.and_then(|i| i.offer_id.clone())),
                name: info.and_then(|i| i.name.clone()),
                cabinet_id: seller_id,
                cabinet_name: cabinet_name.to_owned(),
                price_current: None,
                price_original: price_old,
                discount_percent: discount,
                price_seller: price.seller_price,
                price_old,
                price_min: price.min_price,
                currency: price.currency.clone(),
                source_catalog: None,
                source_seller: Some(if info.is_some() {
                    SELLER_INFO_SOURCE
                } else {
                    SELLER_PRICES_SOURCE
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ozon::types::CATALOG_SOURCE;

    fn product(sku: u64, name: &str, current: Option<f64>, original: Option<f64>) -> OzonCatalogProduct {
        OzonCatalogProduct {
            sku,
            name: name.to_string(),
            offer_id: None,
            current_price: current,
            original_price: original,
            discount_percent: None,
            source: CATALOG_SOURCE,
        }
    }

    fn info(product_id: u64, sku: u64, offer: &str) -> ProductInfo {
        ProductInfo {
            product_id,
            offer_id: Some(offer.to_string()),
            sku: Some(sku),
            fbs_sku: None,
            fbo_sku: None,
            name: Some(format!("seller name {product_id}")),
        }
    }

    fn seller_price(product_id: u64, offer: &str, price: f64, old: Option<f64>) -> SellerPrice {
        SellerPrice {
            product_id: Some(product_id),
            offer_id: Some(offer.to_string()),
            seller_price: Some(price),
            old_price: old,
            min_price: Some(price - 50.0),
            currency: "RUB".to_string(),
        }
    }

    #[test]
    fn seller_old_price_overrides_catalog_original() {
        let catalog = [product(100, "Крем", Some(500.0), Some(800.0))];
        let infos = [info(1, 100, "CR-1")];
        let prices = [seller_price(1, "CR-1", 600.0, Some(1000.0))];

        let outcome = merge_catalog_with_seller(&catalog, &infos, &prices, 42, "Cosmo");
        assert_eq!(outcome.matched, 1);
        let row = &outcome.rows[0];
        assert_eq!(row.offer_id.as_deref(), Some("CR-1"));
        assert_eq!(row.product_id_seller, Some(1));
        assert_eq!(row.price_original, Some(1000.0));
        assert_eq!(row.price_old, Some(1000.0));
        assert_eq!(row.discount_percent, Some(50.0));
        assert_eq!(row.price_seller, Some(600.0));
        assert_eq!(row.name.as_deref(), Some("Крем"));
        assert_eq!(row.source_seller, Some(SELLER_INFO_SOURCE));
    }

    #[test]
    fn zero_old_price_keeps_catalog_original() {
        let catalog = [product(100, "Крем", Some(500.0), Some(800.0))];
        let infos = [info(1, 100, "CR-1")];
        let prices = [seller_price(1, "CR-1", 600.0, Some(0.0))];

        let row = &merge_catalog_with_seller(&catalog, &infos, &prices, 42, "Cosmo").rows[0];
        assert_eq!(row.price_original, Some(800.0));
        assert_eq!(row.price_old, Some(800.0));
    }

    #[test]
    fn unmatched_product_keeps_catalog_data() {
        let mut tile = product(300, "", Some(99.0), None);
        tile.offer_id = Some("TILE-OFFER".to_string());
        let outcome = merge_catalog_with_seller(&[tile], &[], &[], 42, "Cosmo");
        assert_eq!(outcome.unmatched, 1);
        let row = &outcome.rows[0];
        assert_eq!(row.offer_id.as_deref(), Some("TILE-OFFER"));
        assert_eq!(row.name, None);
        assert_eq!(row.currency, "RUB");
        assert_eq!(row.source_seller, None);
        assert_eq!(row.source_catalog, Some(CATALOG_SOURCE));
    }

    #[test]
    fn fbo_sku_resolves_and_name_falls_back_to_seller() {
        let mut i = info(7, 1, "X-7");
        i.sku = None;
        i.fbo_sku = Some(555);
        let catalog = [product(555, "", Some(10.0), None)];
        let outcome = merge_catalog_with_seller(&catalog, &[i], &[], 42, "Cosmo");
        assert_eq!(outcome.matched, 1);
        let row = &outcome.rows[0];
        assert_eq!(row.product_id_seller, Some(7));
        assert_eq!(row.name.as_deref(), Some("seller name 7"));
        assert_eq!(row.price_seller, None);
        assert_eq!(row.source_seller, Some(SELLER_INFO_SOURCE));
    }

    #[test]
    fn price_without_cabinet_product_is_unmatched() {
        let mut tile = product(300, "Гель", Some(400.0), None);
        tile.offer_id = Some("G-1".to_string());
        let prices = [seller_price(3, "G-1", 450.0, Some(900.0))];
        let outcome = merge_catalog_with_seller(&[tile], &[], &prices, 42, "Cosmo");
        assert_eq!((outcome.matched, outcome.unmatched), (0, 1));
        let row = &outcome.rows[0];
        assert_eq!(row.price_seller, Some(450.0));
        assert_eq!(row.price_old, Some(900.0));
        assert_eq!(row.source_seller, None);
    }

    #[test]
    fn seller_only_rows() {
        let prices = [
            seller_price(1, "A", 300.0, Some(400.0)),
            SellerPrice {
                product_id: Some(2),
                offer_id: None,
                seller_price: Some(50.0),
                old_price: None,
                min_price: None,
                currency: "RUB".to_string(),
            },
        ];
        let infos = [info(1, 100, "A")];
        let rows = rows_from_seller_only(&prices, &infos, 9, "Cab");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sku, None);
        assert_eq!(rows[0].name.as_deref(), Some("seller name 1"));
        assert_eq!(rows[0].discount_percent, Some(25.0));
        assert_eq!(rows[0].source_seller, Some(SELLER_INFO_SOURCE));
        assert_eq!(rows[1].name, None);
        assert_eq!(rows[1].source_seller, Some(SELLER_PRICES_SOURCE));
    }
}
