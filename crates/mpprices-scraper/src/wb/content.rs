//! Client for the seller Content API: product cards and the subject
//! catalogue.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Url};
use serde_json::json;

use crate::error::ScraperError;
use crate::http::{build_client, join_path, normalise_base_url, send_json};
use crate::rate_limit::{retry_with_backoff, MinInterval};
use crate::wb::types::{
    CardsCursor, CardsResponse, ContentCard, ContentObject, ObjectsQuery, ObjectsResponse,
};

pub const DEFAULT_CONTENT_BASE_URL: &str = "https://content-api.wildberries.ru";

/// Page size for the cards list; the API rejects anything larger.
pub const CARDS_PAGE_LIMIT: u32 = 100;
/// Largest page the objects listing accepts.
pub const MAX_OBJECTS_LIMIT: u32 = 1000;
/// 100 requests per minute per token.
const CONTENT_MIN_INTERVAL: Duration = Duration::from_millis(600);
const MAX_PAGES: usize = 1000;

pub struct WbContentClient {
    client: Client,
    base_url: Url,
    api_key: String,
    max_retries: u32,
    backoff_base_ms: u64,
    gate: MinInterval,
}

impl WbContentClient {
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
            DEFAULT_CONTENT_BASE_URL,
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
            gate: MinInterval::new(CONTENT_MIN_INTERVAL),
        })
    }

    /// Fetches one page of product cards after `cursor`.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Unauthorized`]: bad or expired token (not retried).
    /// - [`ScraperError::RateLimited`]: 429 after all retries.
    /// - [`ScraperError::Deserialize`]: unexpected body.
    pub async fn fetch_cards_page(
        &self,
        cursor: &CardsCursor,
        limit: u32,
    ) -> Result<CardsResponse, ScraperError> {
        let url = join_path(&self.base_url, "content/v2/get/cards/list")?;
        let mut cursor_body = serde_json::to_value(cursor).map_err(|e| {
            ScraperError::Deserialize {
                context: "cards cursor".to_owned(),
                source: e,
            }
        })?;
        cursor_body["limit"] = json!(limit);
        let body = json!({
            "settings": {
                "cursor": cursor_body,
                "filter": {"withPhoto": -1},
                "sort": {"ascending": false},
            }
        });

        let target = &url;
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let request = self
                .client
                .post(url.clone())
                .header(AUTHORIZATION, self.api_key.as_str())
                .json(&body);
            async move {
                self.gate.wait().await;
                send_json::<CardsResponse>(request, target, "wb content cards", &[self.api_key.as_str()]).await
            }
        })
        .await
    }

    /// Walks the cards cursor to the end and returns every card.
    ///
    /// # Errors
    ///
    /// Propagates a first-page failure. A later failure ends the walk with a
    /// warning and the cards collected so far are returned.
    pub async fn fetch_all_cards(&self) -> Result<Vec<ContentCard>, ScraperError> {
        let mut cursor = CardsCursor::default();
        let mut cards: Vec<ContentCard> = Vec::new();

        for page in 0..MAX_PAGES {
            let response = match self.fetch_cards_page(&cursor, CARDS_PAGE_LIMIT).await {
                Ok(r) => r,
                Err(e) if page == 0 => return Err(e),
                Err(e) => {
                    tracing::warn!(page, fetched = cards.len(), error = %e, "stopping wb cards walk early");
                    return Ok(cards);
                }
            };

            let batch = response.cards.len();
            cursor = next_cards_cursor(response.cursor.as_ref(), &response.cards);
            cards.extend(response.cards);
            tracing::debug!(page, batch, total = cards.len(), "wb cards page");

            if batch < CARDS_PAGE_LIMIT as usize {
                return Ok(cards);
            }
        }

        Err(ScraperError::PaginationLimit {
            context: "wb content cards".to_owned(),
            max_pages: MAX_PAGES,
        })
    }

    /// Fetches one page of the subject catalogue.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidLimit`] when `limit` exceeds
    /// [`MAX_OBJECTS_LIMIT`], otherwise as [`Self::fetch_cards_page`].
    pub async fn fetch_objects(
        &self,
        query: &ObjectsQuery,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ContentObject>, ScraperError> {
        if limit > MAX_OBJECTS_LIMIT {
            return Err(ScraperError::InvalidLimit {
                limit,
                max: MAX_OBJECTS_LIMIT,
            });
        }

        let mut url = join_path(&self.base_url, "content/v2/object/all")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("locale", query.locale.as_deref().unwrap_or("ru"))
                .append_pair("limit", &limit.to_string())
                .append_pair("offset", &offset.to_string());
            if let Some(parent_id) = query.parent_id {
                pairs.append_pair("parentID", &parent_id.to_string());
            }
            if let Some(name) = query.name.as_deref() {
                pairs.append_pair("name", name);
            }
        }

        let target = &url;
        let response = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let request = self
                .client
                .get(url.clone())
                .header(AUTHORIZATION, self.api_key.as_str());
            async move {
                self.gate.wait().await;
                send_json::<ObjectsResponse>(request, target, "wb content objects", &[self.api_key.as_str()]).await
            }
        })
        .await?;

        if response.error {
            tracing::warn!(error_text = %response.error_text, "wb objects endpoint reported an error");
        }
        Ok(response.data)
    }

    /// Pages through the subject catalogue until a short batch.
    ///
    /// # Errors
    ///
    /// Propagates a first-page failure; later failures end the walk with a
    /// warning.
    pub async fn fetch_all_objects(
        &self,
        query: &ObjectsQuery,
    ) -> Result<Vec<ContentObject>, ScraperError> {
        let mut objects = Vec::new();
        let mut offset = 0u32;

        for page in 0..MAX_PAGES {
            let batch = match self.fetch_objects(query, MAX_OBJECTS_LIMIT, offset).await {
                Ok(b) => b,
                Err(e) if page == 0 => return Err(e),
                Err(e) => {
                    tracing::warn!(offset, fetched = objects.len(), error = %e, "stopping wb objects walk early");
                    return Ok(objects);
                }
            };
            let len = batch.len();
            objects.extend(batch);
            if len < MAX_OBJECTS_LIMIT as usize {
                return Ok(objects);
            }
            offset = offset.saturating_add(MAX_OBJECTS_LIMIT);
        }

        Err(ScraperError::PaginationLimit {
            context: "wb content objects".to_owned(),
            max_pages: MAX_PAGES,
        })
    }
}

/// The next cursor is the one the API returns; when it omits one, the last
/// card's `updatedAt`/`nmID` pair continues the walk.
fn next_cards_cursor(returned: Option<&CardsCursor>, cards: &[ContentCard]) -> CardsCursor {
    let from_response = returned
        .filter(|c| c.updated_at.is_some() || c.nm_id.is_some())
        .map(|c| CardsCursor {
            updated_at: c.updated_at.clone(),
            nm_id: c.nm_id,
            total: None,
        });
    from_response.unwrap_or_else(|| {
        cards
            .last()
            .map(|card| CardsCursor {
                updated_at: card.updated_at.clone(),
                nm_id: Some(card.nm_id),
                total: None,
            })
            .unwrap_or_default()
    })
}
