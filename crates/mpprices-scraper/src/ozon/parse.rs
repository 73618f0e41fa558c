//! Product tile parsing for storefront `entrypoint-api` pages.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::ozon::pagination::tile_grid_states;
use crate::ozon::types::{value_as_text, value_as_u64, OzonCatalogProduct, CATALOG_SOURCE};
use crate::price_text::{discount_percent, parse_discount_text, parse_price_text, value_as_f64};

static OFFER_IN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)offer[_-]?id=([^&/?]+)").expect("valid offer link regex"));

/// Every product tile on a page, in grid order. Tiles that fail to parse
/// are skipped.
#[must_use]
pub fn parse_products_from_page(page: &Value) -> Vec<OzonCatalogProduct> {
    let mut products = Vec::new();
    for state in tile_grid_states(page) {
        let Some(items) = state.get("items").and_then(Value::as_array) else {
            continue;
        };
        let before = products.len();
        products.extend(items.iter().filter_map(parse_catalog_item));
        let skipped = items.len() - (products.len() - before);
        if skipped > 0 {
            tracing::debug!(skipped, "ozon tiles without sku skipped");
        }
    }
    products
}

/// A JSON price: numbers as-is, strings through [`parse_price_text`].
/// Zero counts as absent.
fn price_of(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::String(s) => parse_price_text(s),
        other => value_as_f64(other),
    };
    parsed.filter(|p| *p > 0.0)
}

fn first_price(obj: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| obj.get(*k).and_then(price_of))
}

fn find_offer_id(item: &Value) -> Option<String> {
    if let Some(direct) = ["offer_id", "offerId", "offer"]
        .iter()
        .find_map(|k| item.get(*k).and_then(value_as_text))
    {
        return Some(direct);
    }

    if let Some(link) = item
        .get("action")
        .and_then(|a| a.get("link"))
        .and_then(Value::as_str)
    {
        if let Some(caps) = OFFER_IN_LINK.captures(link) {
            return Some(caps[1].to_string());
        }
    }

    let params = item
        .get("multiButton")
        .and_then(|m| m.get("ozonButton"))
        .and_then(|b| b.get("addToCart"))
        .and_then(|a| a.get("params"));
    if let Some(from_cart) = params.and_then(|p| {
        ["offer_id", "offerId"]
            .iter()
            .find_map(|k| p.get(*k).and_then(value_as_text))
    }) {
        return Some(from_cart);
    }

    item.get("trackingInfo")
        .and_then(Value::as_object)
        .and_then(|tracking: &Map<String, Value>| {
            tracking
                .iter()
                .filter(|(key, _)| key.to_lowercase().contains("offer"))
                .find_map(|(_, value)| value_as_text(value))
        })
}

#[derive(Default)]
struct Prices {
    current: Option<f64>,
    original: Option<f64>,
    discount: Option<f64>,
}

impl Prices {
    fn found(&self) -> bool {
        self.current.is_some() || self.original.is_some()
    }
}

fn prices_from_price_v2(price_v2: &Value, prices: &mut Prices) {
    if let Some(entries) = price_v2.get("price").and_then(Value::as_array) {
        for entry in entries {
            let Some(value) = entry
                .get("text")
                .and_then(Value::as_str)
                .and_then(parse_price_text)
            else {
                continue;
            };
            match entry.get("textStyle").and_then(Value::as_str) {
                Some("PRICE") => {
                    prices.current.get_or_insert(value);
                }
                Some("ORIGINAL_PRICE") => {
                    prices.original.get_or_insert(value);
                }
                None => {
                    prices.current.get_or_insert(value);
                }
                Some(_) => {}
            }
        }
    }
    if prices.current.is_none() {
        prices.current = price_v2
            .get("price")
            .filter(|p| !p.is_array())
            .and_then(price_of);
    }
    if prices.original.is_none() {
        prices.original = first_price(price_v2, &["originalPrice", "oldPrice"]);
    }
    if let Some(text) = price_v2.get("discount").and_then(Value::as_str) {
        prices.discount = parse_discount_text(text);
    }
}

fn prices_from_price_state(price: &Value, prices: &mut Prices) {
    if prices.current.is_none() {
        prices.current = first_price(price, &["value", "price", "current"]);
    }
    if prices.original.is_none() {
        prices.original = first_price(price, &["original", "old", "originalPrice"]);
    }
}

/// Parses one storefront product tile.
///
/// Returns `None` when the tile has no usable `sku`. Name is the first
/// `textAtom` of `mainState`. Prices come from the first `priceV2` state
/// that yields any, else a `price` state, else item-level keys. A missing
/// discount is derived from the two prices.
#[must_use]
pub fn parse_catalog_item(item: &Value) -> Option<OzonCatalogProduct> {
    let sku = item.get("sku").and_then(value_as_u64).filter(|s| *s > 0)?;
    let main_state: &[Value] = item
        .get("mainState")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let name = main_state
        .iter()
        .find(|s| s.get("type").and_then(Value::as_str) == Some("textAtom"))
        .and_then(|s| s.get("textAtom"))
        .and_then(|t| t.get("text"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut prices = Prices::default();
    for state in main_state {
        match state.get("type").and_then(Value::as_str) {
            Some("priceV2") => {
                if let Some(price_v2) = state.get("priceV2") {
                    prices_from_price_v2(price_v2, &mut prices);
                }
                if prices.found() {
                    break;
                }
            }
            Some("price") => {
                if let Some(price) = state.get("price").filter(|p| p.is_object()) {
                    prices_from_price_state(price, &mut prices);
                }
            }
            _ => {}
        }
    }

    if prices.current.is_none() {
        prices.current = first_price(item, &["price", "currentPrice"]);
    }
    if prices.original.is_none() {
        prices.original = first_price(item, &["originalPrice", "oldPrice", "priceOriginal"]);
    }
    if prices.discount.is_none() {
        if let (Some(original), Some(current)) = (prices.original, prices.current) {
            prices.discount = discount_percent(original, current);
        }
    }

    Some(OzonCatalogProduct {
        sku,
        name,
        offer_id: find_offer_id(item),
        current_price: prices.current,
        original_price: prices.original,
        discount_percent: prices.discount,
        source: CATALOG_SOURCE,
    })
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
