use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Internal storefront catalog
// ---------------------------------------------------------------------------

/// One page of the storefront brand catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogPage {
    #[serde(default)]
    pub products: Vec<CatalogProduct>,
    /// Total number of products for the brand across all pages.
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogProduct {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "supplierId", default)]
    pub supplier_id: Option<u64>,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub sizes: Vec<CatalogSize>,
    /// Present on some products that carry no per-size prices.
    #[serde(default)]
    pub price: Option<CatalogPrice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSize {
    #[serde(rename = "optionId", default)]
    pub option_id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "origName", default)]
    pub orig_name: Option<String>,
    #[serde(default)]
    pub price: Option<CatalogPrice>,
}

/// Storefront prices in kopecks.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CatalogPrice {
    #[serde(default)]
    pub basic: Option<u64>,
    #[serde(default)]
    pub product: Option<u64>,
}

/// One exported row of `wb brands`: a single size of a catalog product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WbCatalogRow {
    pub brand_id: u64,
    pub brand_name: String,
    pub product_id: u64,
    pub product_name: String,
    pub cabinet_id: u64,
    pub cabinet_name: String,
    pub supplier_name: Option<String>,
    pub size_id: Option<u64>,
    pub size_name: Option<String>,
    pub price_basic: Option<f64>,
    pub price_product: Option<f64>,
    pub source: &'static str,
}

// ---------------------------------------------------------------------------
// Content API
// ---------------------------------------------------------------------------

/// Response of `POST /content/v2/get/cards/list`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardsResponse {
    #[serde(default)]
    pub cards: Vec<ContentCard>,
    #[serde(default)]
    pub cursor: Option<CardsCursor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentCard {
    #[serde(rename = "nmID", alias = "nmId")]
    pub nm_id: u64,
    #[serde(rename = "vendorCode", default)]
    pub vendor_code: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "imtName", default)]
    pub imt_name: Option<String>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<String>,
}

impl ContentCard {
    /// Card title, falling back to the merged-card name when the title is
    /// blank.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.title.trim().is_empty() {
            self.imt_name.as_deref().unwrap_or_default()
        } else {
            &self.title
        }
    }
}

/// Pagination cursor of the cards list. The first request sends only `limit`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardsCursor {
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(rename = "nmID", default, skip_serializing_if = "Option::is_none")]
    pub nm_id: Option<u64>,
    #[serde(default, skip_serializing)]
    pub total: Option<u64>,
}

/// Response of `GET /content/v2/object/all`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectsResponse {
    #[serde(default)]
    pub data: Vec<ContentObject>,
    #[serde(default)]
    pub error: bool,
    #[serde(rename = "errorText", default)]
    pub error_text: String,
}

/// A subject (product category) from the content catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContentObject {
    #[serde(rename = "subjectID")]
    pub subject_id: u64,
    #[serde(rename = "parentID", default)]
    pub parent_id: u64,
    #[serde(rename = "subjectName", default)]
    pub subject_name: String,
    #[serde(rename = "parentName", default)]
    pub parent_name: String,
}

/// Filter for the objects listing.
#[derive(Debug, Clone, Default)]
pub struct ObjectsQuery {
    pub locale: Option<String>,
    pub parent_id: Option<u64>,
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Discounts & Prices API
// ---------------------------------------------------------------------------

/// Response of `GET /api/v2/list/goods/filter`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoodsResponse {
    #[serde(default)]
    pub data: Option<GoodsData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoodsData {
    #[serde(rename = "listGoods", default)]
    pub list_goods: Vec<GoodsItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoodsItem {
    #[serde(rename = "nmID")]
    pub nm_id: u64,
    #[serde(rename = "vendorCode", default)]
    pub vendor_code: String,
    #[serde(default)]
    pub sizes: Vec<GoodsSize>,
    /// Seller discount in percent.
    #[serde(default)]
    pub discount: Option<f64>,
    #[serde(rename = "clubDiscount", default)]
    pub club_discount: Option<f64>,
}

/// Per-size prices in rubles.
#[derive(Debug, Clone, Deserialize)]
pub struct GoodsSize {
    #[serde(rename = "sizeID", default)]
    pub size_id: Option<u64>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(rename = "discountedPrice", default)]
    pub discounted_price: Option<f64>,
    #[serde(rename = "clubDiscountedPrice", default)]
    pub club_discounted_price: Option<f64>,
    #[serde(rename = "techSizeName", default)]
    pub tech_size_name: Option<String>,
}

/// One exported row of `wb prices`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WbPriceRow {
    pub cabinet: String,
    pub cabinet_id: u64,
    pub nm_id: u64,
    pub vendor_code: String,
    pub brand: String,
    pub title: String,
    pub base_price: Option<f64>,
    pub discount_price: Option<f64>,
    pub club_price: Option<f64>,
    pub discount: Option<f64>,
}
