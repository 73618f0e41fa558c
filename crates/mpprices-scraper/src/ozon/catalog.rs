//! Client for a seller's public storefront on Ozon.
//!
//! Pages come from the `entrypoint-api` JSON endpoint, which wraps the
//! storefront path in its `url` query parameter. Requests without a warmed
//! session are answered with 403 and an `ozon-antibot` header.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::header::COOKIE;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use tokio::sync::{Mutex, Semaphore};

use mpprices_core::{AppConfig, OzonMode};

use crate::adaptive::AdaptiveDelayer;
use crate::browser::{document_headers, xhr_headers};
use crate::cookies::CookieJar;
use crate::error::ScraperError;
use crate::http::{build_client, join_path, normalise_base_url, status_error};
use crate::ozon::pagination::find_next_page;
use crate::ozon::parse::parse_products_from_page;
use crate::ozon::types::{CatalogStats, NextPage, OzonCatalogProduct};
use crate::rate_limit::retry_with_backoff;
use crate::redact::{sanitize_for_logging, truncate_for_log};

pub const DEFAULT_OZON_SITE: &str = "https://www.ozon.ru";

const ENTRYPOINT_PATH: &str = "api/entrypoint-api.bx/page/json/v2";
const ANTIBOT_HEADER: &str = "ozon-antibot";
const WARMUP_ATTEMPTS: u32 = 3;

/// Products per storefront page. A full page without a pagination token
/// still suggests there may be another one.
pub const HEURISTIC_PAGE_SIZE: usize = 12;

#[derive(Debug, Clone)]
pub struct OzonCatalogSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub mode: OzonMode,
    /// Fixed pre-request delay; also the adaptive delayer's starting point.
    pub request_delay_ms: u64,
    pub max_concurrent: usize,
    pub adaptive_delay: bool,
    pub proxy: Option<String>,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    /// Base sleep between warm-up attempts after a transport error.
    pub warmup_backoff_ms: u64,
}

impl OzonCatalogSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
            mode: config.ozon.mode,
            request_delay_ms: config.ozon.catalog_request_delay_ms,
            max_concurrent: config.ozon.catalog_max_concurrent,
            adaptive_delay: config.ozon.adaptive_delay,
            proxy: config.ozon.proxy.clone(),
            max_retries: 2,
            backoff_base_ms: 2000,
            warmup_backoff_ms: 2000,
        }
    }
}

/// Starting cookies for the storefront session.
///
/// An explicit cookie string (from `OZON_COOKIES`) wins over the file. A
/// missing file yields an empty jar, which makes the client warm up.
///
/// # Errors
///
/// Returns [`ScraperError::CookieFileIo`] / [`ScraperError::CookieFileParse`]
/// when the file exists but cannot be read or parsed.
pub fn load_initial_cookies(explicit: Option<&str>, path: &Path) -> Result<CookieJar, ScraperError> {
    if let Some(raw) = explicit.filter(|s| !s.trim().is_empty()) {
        let jar = CookieJar::parse(raw);
        tracing::info!(cookies = jar.len(), "ozon cookies taken from environment");
        return Ok(jar);
    }
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no ozon cookie file");
        return Ok(CookieJar::new());
    }
    let jar = CookieJar::load_file(path)?;
    tracing::info!(cookies = jar.len(), path = %path.display(), "ozon cookies loaded from file");
    Ok(jar)
}

/// Products of one storefront walk plus its counters.
#[derive(Debug, Default)]
pub struct SellerCatalog {
    pub products: Vec<OzonCatalogProduct>,
    pub stats: CatalogStats,
}

pub struct OzonCatalogClient {
    client: Client,
    base_url: Url,
    settings: OzonCatalogSettings,
    cookies: Mutex<CookieJar>,
    delayer: Option<Mutex<AdaptiveDelayer>>,
    antibot_blocks: AtomicU32,
    semaphore: Semaphore,
}

fn seller_path(seller_id: u64, seller_name: &str) -> String {
    format!("/seller/{seller_name}-{seller_id}/")
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

impl OzonCatalogClient {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the `reqwest::Client` cannot be built
    /// (including an invalid proxy URL).
    pub fn new(settings: OzonCatalogSettings, cookies: CookieJar) -> Result<Self, ScraperError> {
        Self::with_base_url(settings, cookies, DEFAULT_OZON_SITE)
    }

    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] or [`ScraperError::Http`].
    pub fn with_base_url(
        settings: OzonCatalogSettings,
        cookies: CookieJar,
        base_url: &str,
    ) -> Result<Self, ScraperError> {
        let base_url = normalise_base_url(base_url)?;
        let client = build_client(
            settings.timeout_secs,
            &settings.user_agent,
            settings.proxy.as_deref(),
        )?;
        let delayer = settings.adaptive_delay.then(|| {
            let initial = Duration::from_millis(settings.request_delay_ms);
            Mutex::new(AdaptiveDelayer::new(
                initial,
                initial / 2,
                Duration::from_millis(5000).max(initial),
            ))
        });
        let permits = settings.max_concurrent.max(1);
        Ok(Self {
            client,
            base_url,
            settings,
            cookies: Mutex::new(cookies),
            delayer,
            antibot_blocks: AtomicU32::new(0),
            semaphore: Semaphore::new(permits),
        })
    }

    /// Snapshot of the current cookie jar, e.g. for persisting after a run.
    pub async fn cookies(&self) -> CookieJar {
        self.cookies.lock().await.clone()
    }

    #[must_use]
    pub fn antibot_blocks(&self) -> u32 {
        self.antibot_blocks.load(Ordering::Relaxed)
    }

    async fn cookie_header(&self) -> Option<String> {
        self.cookies.lock().await.header_value()
    }

    /// Fetches a page as a browser would, absorbing the cookies it sets.
    /// 200 and 403 both count as visited: the anti-bot layer sets its
    /// cookies on the challenge page too.
    async fn visit(&self, url: Url, referer: Option<&str>) -> bool {
        for attempt in 0..WARMUP_ATTEMPTS {
            let mut request = self.client.get(url.clone()).headers(document_headers(referer));
            if let Some(cookie) = self.cookie_header().await {
                request = request.header(COOKIE, cookie);
            }
            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    let merged = self
                        .cookies
                        .lock()
                        .await
                        .merge_set_cookie(response.headers());
                    tracing::debug!(url = %url, status = status.as_u16(), cookies_set = merged, "ozon warm-up visit");
                    if status == StatusCode::OK || status == StatusCode::FORBIDDEN {
                        return true;
                    }
                    return false;
                }
                Err(e) => {
                    tracing::warn!(url = %url, attempt = attempt + 1, error = %e, "ozon warm-up request failed");
                    if attempt + 1 < WARMUP_ATTEMPTS {
                        let wait = self
                            .settings
                            .warmup_backoff_ms
                            .saturating_mul(u64::from(attempt + 1));
                        tokio::time::sleep(Duration::from_millis(wait)).await;
                    }
                }
            }
        }
        false
    }

    /// Primes the session when no cookies were supplied.
    ///
    /// Light mode visits the homepage; full mode then opens the seller's
    /// storefront as well. Failures are logged and left to the first catalog
    /// request to surface.
    pub async fn warm_up(&self, seller_id: u64, seller_name: &str) {
        if !self.cookies.lock().await.is_empty() {
            tracing::debug!("ozon cookies present; warm-up skipped");
            return;
        }

        if !self.visit(self.base_url.clone(), None).await {
            tracing::warn!("ozon homepage warm-up did not succeed");
        }

        if self.settings.mode == OzonMode::Full {
            let seller_page = join_path(&self.base_url, &seller_path(seller_id, seller_name));
            if let Ok(url) = seller_page {
                let referer = self.base_url.to_string();
                if !self.visit(url, Some(&referer)).await {
                    tracing::warn!(seller_id, "ozon seller page warm-up did not succeed");
                }
            }
        }

        let jar = self.cookies.lock().await;
        tracing::info!(mode = %self.settings.mode, cookies = jar.len(), "ozon session warmed up");
    }

    /// Builds the entrypoint URL for one storefront page.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] if the path cannot be joined.
    pub fn page_url(
        &self,
        seller_id: u64,
        seller_name: &str,
        page: usize,
        next: &NextPage,
    ) -> Result<Url, ScraperError> {
        let mut inner = format!("{}?page={page}", seller_path(seller_id, seller_name));
        if page > 1 {
            inner.push_str(&format!("&layout_page_index={page}"));
        }
        if let Some(token) = &next.paginator_token {
            inner.push_str(&format!("&paginator_token={}", encode(token)));
        }
        if let Some(state) = &next.search_page_state {
            inner.push_str(&format!("&search_page_state={}", encode(state)));
        }

        let mut url = join_path(&self.base_url, ENTRYPOINT_PATH)?;
        url.query_pairs_mut().append_pair("url", &inner);
        Ok(url)
    }

    async fn pre_request_delay(&self) {
        let delay = match &self.delayer {
            Some(delayer) => delayer.lock().await.current_delay(),
            None => Duration::from_millis(self.settings.request_delay_ms),
        };
        tokio::time::sleep(delay).await;
    }

    /// Fetches one storefront page under the concurrency limit.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::AntibotChallenge`]: 403 with an `ozon-antibot` header.
    /// - [`ScraperError::RateLimited`]: 429 after all retries.
    /// - [`ScraperError::EmptyResponse`]: 200 with nothing in it.
    /// - [`ScraperError::UnexpectedStatus`] / [`ScraperError::NotFound`].
    pub async fn fetch_page(
        &self,
        seller_id: u64,
        seller_name: &str,
        page: usize,
        next: &NextPage,
    ) -> Result<Value, ScraperError> {
        let _permit = self.semaphore.acquire().await.ok();
        self.pre_request_delay().await;

        let url = self.page_url(seller_id, seller_name, page, next)?;
        let referer = join_path(&self.base_url, &seller_path(seller_id, seller_name))?;
        retry_with_backoff(self.settings.max_retries, self.settings.backoff_base_ms, || {
            self.fetch_page_once(&url, referer.as_str())
        })
        .await
    }

    async fn fetch_page_once(&self, url: &Url, referer: &str) -> Result<Value, ScraperError> {
        let origin = self.base_url.origin().ascii_serialization();
        let mut request = self.client.get(url.clone()).headers(xhr_headers(&origin, referer));
        if let Some(cookie) = self.cookie_header().await {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        self.cookies.lock().await.merge_set_cookie(&headers);
        let body = response.text().await?;

        if status == StatusCode::OK {
            if let Some(delayer) = &self.delayer {
                delayer.lock().await.on_success();
            }
            let trimmed = body.trim();
            if trimmed.is_empty() || trimmed == "{}" {
                return Err(ScraperError::EmptyResponse {
                    url: url.to_string(),
                });
            }
            return serde_json::from_str::<Value>(trimmed).map_err(|e| ScraperError::Deserialize {
                context: format!("ozon entrypoint page {url}"),
                source: e,
            });
        }

        if status == StatusCode::FORBIDDEN && headers.contains_key(ANTIBOT_HEADER) {
            if let Some(delayer) = &self.delayer {
                delayer.lock().await.on_block();
            }
            let blocks = self.antibot_blocks.fetch_add(1, Ordering::Relaxed) + 1;
            let lowered = body.to_lowercase();
            let snippet = {
                let jar = self.cookies.lock().await;
                sanitize_for_logging(truncate_for_log(&body, 200), &jar.credential_values())
            };
            tracing::warn!(
                blocks,
                captcha = lowered.contains("captcha"),
                challenge = lowered.contains("challenge"),
                blocked = lowered.contains("blocked"),
                body = %snippet,
                "ozon anti-bot block"
            );
            return Err(ScraperError::AntibotChallenge {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let jar = self.cookies.lock().await;
        Err(status_error(status, url, &headers, &body, &jar.credential_values()))
    }

    /// Walks a seller's storefront page by page.
    ///
    /// Continues while the last page advertised a pagination token or came
    /// back full ([`HEURISTIC_PAGE_SIZE`] products), up to `max_pages`.
    /// Stops at the first failed or empty page, or once `max_products` is
    /// reached.
    ///
    /// # Errors
    ///
    /// Propagates a failure of page 1; later failures end the walk early.
    pub async fn fetch_seller_catalog(
        &self,
        seller_id: u64,
        seller_name: &str,
        max_pages: usize,
        max_products: Option<usize>,
    ) -> Result<SellerCatalog, ScraperError> {
        self.warm_up(seller_id, seller_name).await;

        let mut catalog = SellerCatalog::default();
        let mut next = NextPage::default();
        let mut page = 1usize;

        loop {
            let body = match self.fetch_page(seller_id, seller_name, page, &next).await {
                Ok(body) => body,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    catalog.stats.pages_failed += 1;
                    tracing::warn!(seller_id, page, error = %e, "ozon catalog page failed; stopping");
                    break;
                }
            };
            catalog.stats.pages_ok += 1;

            let products = parse_products_from_page(&body);
            let found = products.len();
            tracing::debug!(seller_id, page, products = found, "ozon catalog page parsed");
            if found == 0 {
                tracing::info!(seller_id, page, "empty ozon catalog page; stopping");
                break;
            }
            catalog.products.extend(products);

            if let Some(limit) = max_products {
                if catalog.products.len() >= limit {
                    catalog.products.truncate(limit);
                    tracing::info!(seller_id, limit, "ozon product limit reached");
                    break;
                }
            }

            next = find_next_page(&body);
            if next.is_empty() && found != HEURISTIC_PAGE_SIZE {
                break;
            }
            if page >= max_pages {
                tracing::info!(seller_id, max_pages, "ozon page limit reached");
                break;
            }
            page += 1;
        }

        catalog.stats.antibot_blocks = self.antibot_blocks();
        if let Some(delayer) = &self.delayer {
            catalog.stats.delay = Some(delayer.lock().await.stats());
        }
        tracing::info!(
            seller_id,
            products = catalog.products.len(),
            pages_ok = catalog.stats.pages_ok,
            pages_failed = catalog.stats.pages_failed,
            antibot_blocks = catalog.stats.antibot_blocks,
            "ozon seller catalog fetched"
        );
        Ok(catalog)
    }
}
