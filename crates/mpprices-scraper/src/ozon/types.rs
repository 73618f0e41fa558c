use serde::Serialize;
use serde_json::Value;

use crate::adaptive::DelayStats;
use crate::price_text::value_as_f64;

pub const CATALOG_SOURCE: &str = "catalog_api";
pub const SELLER_PRICES_SOURCE: &str = "seller_api";
pub const SELLER_INFO_SOURCE: &str = "seller_api_v3";

// ---------------------------------------------------------------------------
// Storefront catalog
// ---------------------------------------------------------------------------

/// A product tile from the seller storefront.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OzonCatalogProduct {
    /// Global Ozon SKU, the join key towards the Seller API.
    pub sku: u64,
    pub name: String,
    pub offer_id: Option<String>,
    /// Price the buyer pays.
    pub current_price: Option<f64>,
    /// Struck-through price.
    pub original_price: Option<f64>,
    pub discount_percent: Option<f64>,
    pub source: &'static str,
}

/// Where the next storefront page is, as advertised by the current one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NextPage {
    pub url: Option<String>,
    pub paginator_token: Option<String>,
    pub search_page_state: Option<String>,
}

impl NextPage {
    /// `true` when the page carried no pagination hint at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.url.is_none() && self.paginator_token.is_none() && self.search_page_state.is_none()
    }
}

/// Outcome counters of a storefront catalog walk.
#[derive(Debug, Clone, Default)]
pub struct CatalogStats {
    pub pages_ok: usize,
    pub pages_failed: usize,
    pub antibot_blocks: u32,
    pub delay: Option<DelayStats>,
}

// ---------------------------------------------------------------------------
// Seller API
// ---------------------------------------------------------------------------

/// Which products `/v5/product/info/prices` should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceFilter {
    All,
    OfferIds(Vec<String>),
    ProductIds(Vec<u64>),
}

impl PriceFilter {
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::All => serde_json::json!({"visibility": "ALL"}),
            Self::OfferIds(ids) => serde_json::json!({"offer_id": ids}),
            Self::ProductIds(ids) => {
                let ids: Vec<String> = ids.iter().map(u64::to_string).collect();
                serde_json::json!({"product_id": ids})
            }
        }
    }
}

/// Reads an id that may arrive as a JSON number or numeric string.
pub(crate) fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads a non-empty string, rendering numbers as text.
pub(crate) fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Identity of a product in the seller's cabinet, from `/v3/product/info/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductInfo {
    pub product_id: u64,
    pub offer_id: Option<String>,
    pub sku: Option<u64>,
    pub fbs_sku: Option<u64>,
    pub fbo_sku: Option<u64>,
    pub name: Option<String>,
}

impl ProductInfo {
    /// Parses one `/v3/product/info/list` item; `None` without an `id`.
    ///
    /// Newer responses drop the top-level `sku` in favour of a `sources`
    /// array, whose first entry is used instead.
    #[must_use]
    pub fn from_value(item: &Value) -> Option<Self> {
        let product_id = item
            .get("id")
            .or_else(|| item.get("product_id"))
            .and_then(value_as_u64)?;
        let sku = item.get("sku").and_then(value_as_u64).or_else(|| {
            item.get("sources")
                .and_then(Value::as_array)
                .and_then(|sources| {
                    sources
                        .iter()
                        .find_map(|s| s.get("sku").and_then(value_as_u64))
                })
        });
        Some(Self {
            product_id,
            offer_id: item.get("offer_id").and_then(value_as_text),
            sku: sku.filter(|s| *s > 0),
            fbs_sku: item.get("fbs_sku").and_then(value_as_u64),
            fbo_sku: item.get("fbo_sku").and_then(value_as_u64),
            name: item.get("name").and_then(value_as_text),
        })
    }
}

/// Seller-side prices of one product, from `/v5/product/info/prices`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellerPrice {
    pub product_id: Option<u64>,
    pub offer_id: Option<String>,
    pub seller_price: Option<f64>,
    pub old_price: Option<f64>,
    pub min_price: Option<f64>,
    pub currency: String,
}

impl SellerPrice {
    #[must_use]
    pub fn from_value(item: &Value) -> Self {
        let price = item.get("price");
        let nested = |key: &str| price.and_then(|p| p.get(key)).and_then(value_as_f64);

        // `old_price` has shipped as `{old_price: …}`, as a bare number, and
        // inside `price`.
        let old_price = match item.get("old_price") {
            Some(obj @ Value::Object(_)) => obj.get("old_price").and_then(value_as_f64),
            Some(other) => value_as_f64(other),
            None => None,
        }
        .or_else(|| nested("old_price"));

        let min_price = match item.get("min_price") {
            Some(obj @ Value::Object(_)) => obj.get("min_price").and_then(value_as_f64),
            Some(other) => value_as_f64(other),
            None => None,
        }
        .or_else(|| nested("min_price"));

        Self {
            product_id: item.get("product_id").and_then(value_as_u64),
            offer_id: item.get("offer_id").and_then(value_as_text),
            seller_price: nested("price").filter(|p| *p > 0.0),
            old_price,
            min_price: min_price.filter(|p| *p > 0.0),
            currency: price
                .and_then(|p| p.get("currency_code"))
                .and_then(value_as_text)
                .unwrap_or_else(|| "RUB".to_string()),
        }
    }
}

/// Full flattening of a `/v5/product/info/prices` item for the price export.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceDetails {
    pub product_id: Option<u64>,
    pub offer_id: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub old_price: Option<f64>,
    pub min_price: Option<f64>,
    pub marketing_seller_price: Option<f64>,
    pub retail_price: Option<f64>,
    pub net_price: Option<f64>,
    pub vat: Option<f64>,
    pub auto_action_enabled: Option<String>,
    pub acquiring: Option<f64>,
    pub volume_weight: Option<f64>,
    pub sales_percent_fbo: Option<f64>,
    pub sales_percent_fbs: Option<f64>,
    pub sales_percent_rfbs: Option<f64>,
    pub sales_percent_fbp: Option<f64>,
    pub color_index: Option<String>,
    pub ozon_index_value: Option<f64>,
    pub ozon_index_min_price: Option<f64>,
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(b.to_string()),
        other => value_as_text(other),
    }
}

impl PriceDetails {
    #[must_use]
    pub fn from_value(item: &Value) -> Self {
        let at = |path: &[&str]| -> Option<&Value> {
            path.iter().try_fold(item, |node, key| node.get(*key))
        };
        let num = |path: &[&str]| at(path).and_then(value_as_f64);

        Self {
            product_id: at(&["product_id"]).and_then(value_as_u64),
            offer_id: at(&["offer_id"]).and_then(value_as_text),
            price: num(&["price", "price"]),
            currency: at(&["price", "currency_code"]).and_then(value_as_text),
            old_price: num(&["price", "old_price"]),
            min_price: num(&["price", "min_price"]),
            marketing_seller_price: num(&["price", "marketing_seller_price"]),
            retail_price: num(&["price", "retail_price"]),
            net_price: num(&["price", "net_price"]),
            vat: num(&["price", "vat"]),
            auto_action_enabled: at(&["price", "auto_action_enabled"]).and_then(scalar_text),
            acquiring: num(&["acquiring"]),
            volume_weight: num(&["volume_weight"]),
            sales_percent_fbo: num(&["commissions", "sales_percent_fbo"]),
            sales_percent_fbs: num(&["commissions", "sales_percent_fbs"]),
            sales_percent_rfbs: num(&["commissions", "sales_percent_rfbs"]),
            sales_percent_fbp: num(&["commissions", "sales_percent_fbp"]),
            color_index: at(&["price_indexes", "color_index"]).and_then(value_as_text),
            ozon_index_value: num(&["price_indexes", "ozon_index_data", "price_index_value"]),
            ozon_index_min_price: num(&["price_indexes", "ozon_index_data", "min_price"]),
        }
    }
}

// ---------------------------------------------------------------------------
// Merged output
// ---------------------------------------------------------------------------

/// One exported row of `ozon sellers`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OzonPriceRow {
    pub sku: Option<u64>,
    pub product_id_seller: Option<u64>,
    pub offer_id: Option<String>,
    pub name: Option<String>,
    pub cabinet_id: u64,
    pub cabinet_name: String,
    pub price_current: Option<f64>,
    pub price_original: Option<f64>,
    pub discount_percent: Option<f64>,
    pub price_seller: Option<f64>,
    pub price_old: Option<f64>,
    pub price_min: Option<f64>,
    pub currency: String,
    pub source_catalog: Option<&'static str>,
    pub source_seller: Option<&'static str>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn product_info_reads_string_ids_and_sources() {
        let info = ProductInfo::from_value(&json!({
            "id": "987654",
            "offer_id": "CB-001",
            "name": "Крем",
            "sources": [{"sku": 1_234_567, "source": "sds"}]
        }))
        .unwrap();
        assert_eq!(info.product_id, 987_654);
        assert_eq!(info.sku, Some(1_234_567));
        assert_eq!(info.offer_id.as_deref(), Some("CB-001"));
    }

    #[test]
    fn product_info_without_id_is_rejected() {
        assert!(ProductInfo::from_value(&json!({"offer_id": "x"})).is_none());
    }

    #[test]
    fn seller_price_old_price_variants() {
        let nested = SellerPrice::from_value(&json!({
            "product_id": 1, "offer_id": "A",
            "price": {"price": "990.0000", "currency_code": "RUB"},
            "old_price": {"old_price": "1990"}
        }));
        assert_eq!(nested.seller_price, Some(990.0));
        assert_eq!(nested.old_price, Some(1990.0));

        let bare = SellerPrice::from_value(&json!({"price": {"price": 10}, "old_price": 25}));
        assert_eq!(bare.old_price, Some(25.0));

        let inside = SellerPrice::from_value(&json!({"price": {"price": 10, "old_price": "30"}}));
        assert_eq!(inside.old_price, Some(30.0));
        assert_eq!(inside.currency, "RUB");
    }

    #[test]
    fn seller_price_zero_means_absent() {
        let p = SellerPrice::from_value(&json!({"price": {"price": "0", "min_price": 0}}));
        assert_eq!(p.seller_price, None);
        assert_eq!(p.min_price, None);
    }

    #[test]
    fn price_details_flattens_nested_fields() {
        let d = PriceDetails::from_value(&json!({
            "product_id": 5,
            "offer_id": "OFF-5",
            "acquiring": 1.5,
            "volume_weight": 0.3,
            "price": {
                "price": "500", "currency_code": "RUB", "old_price": "900",
                "min_price": "450", "marketing_seller_price": "480",
                "retail_price": "0", "net_price": "300", "vat": "0.2",
                "auto_action_enabled": true
            },
            "commissions": {"sales_percent_fbo": 12, "sales_percent_fbs": 14.5},
            "price_indexes": {
                "color_index": "GREEN",
                "ozon_index_data": {"price_index_value": 0.95, "min_price": 470}
            }
        }));
        assert_eq!(d.product_id, Some(5));
        assert_eq!(d.price, Some(500.0));
        assert_eq!(d.old_price, Some(900.0));
        assert_eq!(d.vat, Some(0.2));
        assert_eq!(d.auto_action_enabled.as_deref(), Some("true"));
        assert_eq!(d.sales_percent_fbs, Some(14.5));
        assert_eq!(d.sales_percent_rfbs, None);
        assert_eq!(d.color_index.as_deref(), Some("GREEN"));
        assert_eq!(d.ozon_index_min_price, Some(470.0));
    }

    #[test]
    fn price_filter_json_shapes() {
        assert_eq!(PriceFilter::All.to_json(), json!({"visibility": "ALL"}));
        assert_eq!(
            PriceFilter::ProductIds(vec![1, 2]).to_json(),
            json!({"product_id": ["1", "2"]})
        );
        assert_eq!(
            PriceFilter::OfferIds(vec!["A".into()]).to_json(),
            json!({"offer_id": ["A"]})
        );
    }
}
