//! Ozon: a seller's public storefront plus the official Seller API.

pub mod catalog;
pub mod merge;
pub mod pagination;
pub mod parse;
pub mod seller;
pub mod types;

pub use catalog::{
    load_initial_cookies, OzonCatalogClient, OzonCatalogSettings, SellerCatalog,
    HEURISTIC_PAGE_SIZE,
};
pub use merge::{merge_catalog_with_seller, rows_from_seller_only, MergeOutcome};
pub use pagination::find_next_page;
pub use parse::{parse_catalog_item, parse_products_from_page};
pub use seller::{OzonSellerClient, OzonSellerSettings, PRICES_PAGE_LIMIT};
pub use types::{
    CatalogStats, NextPage, OzonCatalogProduct, OzonPriceRow, PriceDetails, PriceFilter,
    ProductInfo, SellerPrice, CATALOG_SOURCE, SELLER_INFO_SOURCE, SELLER_PRICES_SOURCE,
};
