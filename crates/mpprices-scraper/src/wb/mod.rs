//! Wildberries: the storefront's internal catalog plus the seller Content
//! and Prices APIs.

pub mod catalog;
pub mod catalog_parse;
pub mod content;
pub mod prices;
pub mod rows;
pub mod types;

pub use catalog::{BrandCatalog, WbCatalogClient, WbCatalogSettings, IMPORTANT_COOKIES};
pub use catalog_parse::{parse_catalog_product, BrandRef, CATALOG_SOURCE};
pub use content::WbContentClient;
pub use prices::WbPricesClient;
pub use rows::merge_cards_with_prices;
pub use types::{
    CardsCursor, CatalogPage, CatalogPrice, CatalogProduct, ContentCard, ContentObject, GoodsItem,
    ObjectsQuery, WbCatalogRow, WbPriceRow,
};
