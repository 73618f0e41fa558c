//! Client for the official Ozon Seller API.

use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::{json, Value};

use mpprices_core::AppConfig;

use crate::error::ScraperError;
use crate::http::{build_client, join_path, normalise_base_url, send_json};
use crate::ozon::types::{PriceFilter, ProductInfo};
use crate::rate_limit::retry_with_backoff;

pub const DEFAULT_SELLER_BASE_URL: &str = "https://api-seller.ozon.ru";

/// Largest page `/v5/product/info/prices` returns.
pub const PRICES_PAGE_LIMIT: u32 = 1000;
/// `/v3/product/info/list` accepts at most this many ids per request.
pub const INFO_BATCH_SIZE: usize = 1000;
const MAX_PAGES: usize = 500;

#[derive(Debug, Clone)]
pub struct OzonSellerSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub request_delay_ms: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl OzonSellerSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
            request_delay_ms: config.ozon.seller_request_delay_ms,
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        }
    }
}

pub struct OzonSellerClient {
    client: Client,
    base_url: Url,
    client_id: String,
    api_key: String,
    settings: OzonSellerSettings,
}

/// Items live under `result.items` in most responses and at the root in
/// some API versions.
fn response_items(body: &Value) -> Vec<Value> {
    body.get("result")
        .and_then(|r| r.get("items"))
        .or_else(|| body.get("items"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn response_cursor(body: &Value) -> Option<String> {
    body.get("result")
        .and_then(|r| r.get("cursor"))
        .or_else(|| body.get("cursor"))
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
        .map(str::to_owned)
}

impl OzonSellerClient {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        client_id: u64,
        api_key: &str,
        settings: OzonSellerSettings,
    ) -> Result<Self, ScraperError> {
        Self::with_base_url(client_id, api_key, settings, DEFAULT_SELLER_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] or [`ScraperError::Http`].
    pub fn with_base_url(
        client_id: u64,
        api_key: &str,
        settings: OzonSellerSettings,
        base_url: &str,
    ) -> Result<Self, ScraperError> {
        Ok(Self {
            client: build_client(settings.timeout_secs, &settings.user_agent, None)?,
            base_url: normalise_base_url(base_url)?,
            client_id: client_id.to_string(),
            api_key: api_key.to_owned(),
            settings,
        })
    }

    async fn post(&self, path: &str, body: &Value, context: &str) -> Result<Value, ScraperError> {
        let url = join_path(&self.base_url, path)?;
        let delay = Duration::from_millis(self.settings.request_delay_ms);
        let target = &url;
        retry_with_backoff(self.settings.max_retries, self.settings.backoff_base_ms, || {
            let request = self
                .client
                .post(url.clone())
                .header("Client-Id", self.client_id.as_str())
                .header("Api-Key", self.api_key.as_str())
                .json(body);
            async move {
                tokio::time::sleep(delay).await;
                send_json::<Value>(request, target, context, &[self.api_key.as_str()]).await
            }
        })
        .await
    }

    /// Pages through `/v5/product/info/prices` and returns the raw items.
    ///
    /// Stops when the response carries no cursor or no items.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidLimit`]: `limit` above [`PRICES_PAGE_LIMIT`].
    /// - [`ScraperError::Unauthorized`]: credentials rejected.
    /// - [`ScraperError::RateLimited`]: 429 after all retries.
    /// - [`ScraperError::PaginationLimit`]: the cursor never ran out.
    pub async fn fetch_product_prices(
        &self,
        filter: &PriceFilter,
        limit: u32,
    ) -> Result<Vec<Value>, ScraperError> {
        if limit > PRICES_PAGE_LIMIT {
            return Err(ScraperError::InvalidLimit {
                limit,
                max: PRICES_PAGE_LIMIT,
            });
        }

        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        for page in 1..=MAX_PAGES {
            let mut body = json!({"filter": filter.to_json(), "limit": limit});
            if let Some(c) = &cursor {
                body["cursor"] = json!(c);
            }
            let response = self
                .post("v5/product/info/prices", &body, "ozon product prices")
                .await?;
            let batch = response_items(&response);
            let batch_len = batch.len();
            items.extend(batch);
            tracing::debug!(page, batch = batch_len, total = items.len(), "ozon prices page");

            cursor = response_cursor(&response);
            if batch_len == 0 || cursor.is_none() {
                tracing::info!(pages = page, items = items.len(), "ozon seller prices fetched");
                return Ok(items);
            }
        }

        Err(ScraperError::PaginationLimit {
            context: "ozon product prices".to_owned(),
            max_pages: MAX_PAGES,
        })
    }

    /// Resolves storefront SKUs to cabinet products.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Unauthorized`] on bad credentials; any other
    /// batch failure is logged and the batch skipped.
    pub async fn fetch_products_by_sku(
        &self,
        skus: &[u64],
    ) -> Result<Vec<ProductInfo>, ScraperError> {
        self.fetch_product_info("sku", skus).await
    }

    /// Looks up names and offer ids for cabinet product ids.
    ///
    /// # Errors
    ///
    /// As [`Self::fetch_products_by_sku`].
    pub async fn fetch_products_by_product_id(
        &self,
        product_ids: &[u64],
    ) -> Result<Vec<ProductInfo>, ScraperError> {
        self.fetch_product_info("product_id", product_ids).await
    }

    async fn fetch_product_info(
        &self,
        key: &str,
        ids: &[u64],
    ) -> Result<Vec<ProductInfo>, ScraperError> {
        let mut infos = Vec::new();
        let batches = ids.len().div_ceil(INFO_BATCH_SIZE);

        for (index, chunk) in ids.chunks(INFO_BATCH_SIZE).enumerate() {
            let mut body = json!({"offer_id": [], "product_id": [], "sku": []});
            body[key] = json!(chunk.iter().map(u64::to_string).collect::<Vec<_>>());

            match self
                .post("v3/product/info/list", &body, "ozon product info")
                .await
            {
                Ok(response) => {
                    let items = response_items(&response);
                    if items.is_empty() {
                        tracing::warn!(batch = index + 1, batches, key, "ozon product info batch returned no items");
                    }
                    infos.extend(items.iter().filter_map(ProductInfo::from_value));
                }
                Err(e @ ScraperError::Unauthorized { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!(batch = index + 1, batches, key, error = %e, "skipping failed ozon product info batch");
                }
            }
        }

        tracing::info!(requested = ids.len(), resolved = infos.len(), key, "ozon product info fetched");
        Ok(infos)
    }
}
