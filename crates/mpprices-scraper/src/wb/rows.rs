use std::collections::HashMap;

use crate::wb::types::{ContentCard, GoodsItem, WbPriceRow};

/// Joins content cards with the Prices API goods on `nmID`.
///
/// Prices are taken from the first size: unless a good has
/// `editableSizePrice`, every size carries the same price. Cards with no
/// matching good keep empty price columns.
#[must_use]
pub fn merge_cards_with_prices(
    cabinet: &str,
    cabinet_id: u64,
    cards: &[ContentCard],
    goods: &[GoodsItem],
) -> Vec<WbPriceRow> {
    let by_nm: HashMap<u64, &GoodsItem> = goods.iter().map(|g| (g.nm_id, g)).collect();

    cards
        .iter()
        .map(|card| {
            let good = by_nm.get(&card.nm_id);
            let size = good.and_then(|g| g.sizes.first());
            WbPriceRow {
                cabinet: cabinet.to_owned(),
                cabinet_id,
                nm_id: card.nm_id,
                vendor_code: if card.vendor_code.is_empty() {
                    good.map(|g| g.vendor_code.clone()).unwrap_or_default()
                } else {
                    card.vendor_code.clone()
                },
                brand: card.brand.clone(),
                title: card.display_name().to_owned(),
                base_price: size.and_then(|s| s.price),
                discount_price: size.and_then(|s| s.discounted_price),
                club_price: size.and_then(|s| s.club_discounted_price),
                discount: good.and_then(|g| g.discount),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn joins_on_nm_id_and_keeps_unpriced_cards() {
        let cards: Vec<ContentCard> = serde_json::from_value(json!([
            {"nmID": 1, "vendorCode": "A-1", "brand": "Cosmo", "title": "Крем"},
            {"nmID": 2, "vendorCode": "", "brand": "Cosmo", "title": "", "imtName": "Сыворотка"},
            {"nmID": 3, "vendorCode": "C-3", "brand": "Cosmo", "title": "Маска"}
        ]))
        .unwrap();
        let goods: Vec<GoodsItem> = serde_json::from_value(json!([
            {"nmID": 1, "vendorCode": "A-1", "discount": 30,
             "sizes": [{"sizeID": 10, "price": 1000, "discountedPrice": 700, "clubDiscountedPrice": 665}]},
            {"nmID": 2, "vendorCode": "B-2", "sizes": [{"price": 500.5, "discountedPrice": 500.5}]}
        ]))
        .unwrap();

        let rows = merge_cards_with_prices("COSMO", 224_650, &cards, &goods);
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].base_price, Some(1000.0));
        assert_eq!(rows[0].discount_price, Some(700.0));
        assert_eq!(rows[0].club_price, Some(665.0));
        assert_eq!(rows[0].discount, Some(30.0));

        assert_eq!(rows[1].vendor_code, "B-2");
        assert_eq!(rows[1].title, "Сыворотка");
        assert_eq!(rows[1].club_price, None);

        assert_eq!(rows[2].base_price, None);
        assert_eq!(rows[2].cabinet, "COSMO");
        assert_eq!(rows[2].cabinet_id, 224_650);
    }
}
