//! Client for the seller Discounts & Prices API.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Url};

use crate::error::ScraperError;
use crate::http::{build_client, join_path, normalise_base_url, send_json};
use crate::rate_limit::{retry_with_backoff, MinInterval};
use crate::wb::types::{GoodsItem, GoodsResponse};

pub const DEFAULT_PRICES_BASE_URL: &str = "https://discounts-prices-api.wildberries.ru";

pub const GOODS_PAGE_LIMIT: u32 = 1000;
/// 10 requests per 6 seconds per token.
const PRICES_MIN_INTERVAL: Duration = Duration::from_millis(600);
const MAX_PAGES: usize = 500;

pub struct WbPricesClient {
    client: Client,
    base_url: Url,
    api_key: String,
    max_retries: u32,
    backoff_base_ms: u64,
    gate: MinInterval,
}

impl WbPricesClient {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ScraperError> {
        Self::with_base_url(
            api_key,
            timeout_secs,
            user_agent,
            max_retries,
            backoff_base_ms,
            DEFAULT_PRICES_BASE_URL,
        )
    }

    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] or [`ScraperError::Http`].
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
        base_url: &str,
    ) -> Result<Self, ScraperError> {
        Ok(Self {
            client: build_client(timeout_secs, user_agent, None)?,
            base_url: normalise_base_url(base_url)?,
            api_key: api_key.to_owned(),
            max_retries,
            backoff_base_ms,
            gate: MinInterval::new(PRICES_MIN_INTERVAL),
        })
    }

    /// Fetches one page of goods with their per-size prices.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidLimit`]: `limit` above [`GOODS_PAGE_LIMIT`].
    /// - [`ScraperError::Unauthorized`]: token rejected.
    /// - [`ScraperError::RateLimited`]: 429 after all retries.
    pub async fn fetch_goods_page(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<GoodsItem>, ScraperError> {
        if limit > GOODS_PAGE_LIMIT {
            return Err(ScraperError::InvalidLimit {
                limit,
                max: GOODS_PAGE_LIMIT,
            });
        }
        let mut url = join_path(&self.base_url, "api/v2/list/goods/filter")?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());

        let target = &url;
        let response = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let request = self
                .client
                .get(url.clone())
                .header(AUTHORIZATION, self.api_key.as_str());
            async move {
                self.gate.wait().await;
                send_json::<GoodsResponse>(request, target, "wb goods prices", &[self.api_key.as_str()]).await
            }
        })
        .await?;

        Ok(response.data.map(|d| d.list_goods).unwrap_or_default())
    }

    /// Pages through every good of the cabinet.
    ///
    /// # Errors
    ///
    /// Propagates any page failure, or [`ScraperError::PaginationLimit`].
    pub async fn fetch_all_goods(&self) -> Result<Vec<GoodsItem>, ScraperError> {
        let mut goods = Vec::new();
        let mut offset = 0u32;
        for _ in 0..MAX_PAGES {
            let batch = self.fetch_goods_page(GOODS_PAGE_LIMIT, offset).await?;
            let len = batch.len();
            goods.extend(batch);
            if len < GOODS_PAGE_LIMIT as usize {
                return Ok(goods);
            }
            offset = offset.saturating_add(GOODS_PAGE_LIMIT);
        }
        Err(ScraperError::PaginationLimit {
            context: "wb goods prices".to_owned(),
            max_pages: MAX_PAGES,
        })
    }
}
