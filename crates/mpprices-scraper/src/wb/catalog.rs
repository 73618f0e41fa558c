//! Client for the storefront's internal brand catalog.
//!
//! The endpoint is unauthenticated but sits behind an anti-bot layer that
//! answers HTTP 498 until the session carries the right cookies. A session is
//! primed by visiting the homepage and asking the challenge endpoints for an
//! `x_wbaas_token`; a 498 mid-run either hands out a fresh token in the
//! `X-Wbaas-Token` header or triggers one re-initialisation.

use std::time::Duration;

use reqwest::header::COOKIE;
use reqwest::{Client, StatusCode, Url};
use tokio::sync::{Mutex, Semaphore};

use mpprices_core::AppConfig;

use crate::browser::{document_headers, xhr_headers};
use crate::cookies::CookieJar;
use crate::error::ScraperError;
use crate::http::{build_client, join_path, normalise_base_url, status_error};
use crate::rate_limit::retry_with_backoff;
use crate::redact::{sanitize_for_logging, truncate_for_log};
use crate::wb::types::{CatalogPage, CatalogProduct};

pub const DEFAULT_WB_SITE: &str = "https://www.wildberries.ru";

const CATALOG_PATH: &str = "__internal/u-catalog/brands/v4/catalog";
const TOKEN_PATHS: [&str; 2] = [
    "__wbaas/challenges/antibot/token",
    "__wbaas/challenges/antibot/verify",
];
const ANTIBOT_STATUS: u16 = 498;
const TOKEN_COOKIE: &str = "x_wbaas_token";

/// Cookies the anti-bot layer expects on catalog calls.
pub const IMPORTANT_COOKIES: [&str; 5] = [
    "wbx-validation-key",
    TOKEN_COOKIE,
    "_wbauid",
    "_cp",
    "routeb",
];

/// Hard stop on the page count computed from the first page's `total`.
pub const MAX_PAGES: usize = 100;

/// Tunables for [`WbCatalogClient`].
#[derive(Debug, Clone)]
pub struct WbCatalogSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Delivery region; changes the prices shown.
    pub dest: i64,
    /// Buyer discount percentage the storefront applies.
    pub spp: u32,
    pub request_delay_ms: u64,
    pub max_concurrent: usize,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    /// Pause after the homepage visit and before each 498 retry.
    pub challenge_pause_ms: u64,
}

impl WbCatalogSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
            dest: config.wb.dest,
            spp: config.wb.spp,
            request_delay_ms: config.request_delay_ms,
            max_concurrent: config.max_concurrent_requests,
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
            challenge_pause_ms: 2000,
        }
    }
}

/// Products fetched for one brand plus how the pagination went.
#[derive(Debug, Default)]
pub struct BrandCatalog {
    pub products: Vec<CatalogProduct>,
    pub total: u64,
    pub total_pages: usize,
    pub failed_pages: usize,
}

pub struct WbCatalogClient {
    client: Client,
    base_url: Url,
    settings: WbCatalogSettings,
    cookies: Mutex<CookieJar>,
    session_ready: Mutex<bool>,
    semaphore: Semaphore,
}

impl WbCatalogClient {
    /// Creates a client for the public storefront, seeded with `cookies`
    /// (typically from `WB_COOKIES` / `WB_COOKIE_*`).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(settings: WbCatalogSettings, cookies: CookieJar) -> Result<Self, ScraperError> {
        Self::with_base_url(settings, cookies, DEFAULT_WB_SITE)
    }

    /// Creates a client against an arbitrary origin (used by tests).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] for an unparseable `base_url`
    /// and [`ScraperError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        settings: WbCatalogSettings,
        cookies: CookieJar,
        base_url: &str,
    ) -> Result<Self, ScraperError> {
        let base_url = normalise_base_url(base_url)?;
        let client = build_client(settings.timeout_secs, &settings.user_agent, None)?;
        let permits = settings.max_concurrent.max(1);
        Ok(Self {
            client,
            base_url,
            settings,
            cookies: Mutex::new(cookies),
            session_ready: Mutex::new(false),
            semaphore: Semaphore::new(permits),
        })
    }

    /// Snapshot of the current cookie jar.
    pub async fn cookies(&self) -> CookieJar {
        self.cookies.lock().await.clone()
    }

    fn origin(&self) -> String {
        self.base_url.origin().ascii_serialization()
    }

    fn pause(&self) -> Duration {
        Duration::from_millis(self.settings.challenge_pause_ms)
    }

    async fn cookie_header(&self) -> Option<String> {
        self.cookies.lock().await.header_value()
    }

    /// Primes the session once; later calls are no-ops.
    pub async fn ensure_session(&self) {
        let mut ready = self.session_ready.lock().await;
        if !*ready {
            self.init_session().await;
            *ready = true;
        }
    }

    /// Visits the homepage and the challenge token endpoints, absorbing every
    /// cookie they set. Failures are logged; the catalog call that follows
    /// reports whether the session is actually usable.
    async fn init_session(&self) {
        let mut request = self
            .client
            .get(self.base_url.clone())
            .headers(document_headers(None));
        if let Some(cookie) = self.cookie_header().await {
            request = request.header(COOKIE, cookie);
        }
        match request.send().await {
            Ok(response) => {
                let merged = self
                    .cookies
                    .lock()
                    .await
                    .merge_set_cookie(response.headers());
                tracing::debug!(
                    status = response.status().as_u16(),
                    cookies_set = merged,
                    "wb homepage visited"
                );
            }
            Err(e) => tracing::warn!(error = %e, "wb homepage visit failed"),
        }

        tokio::time::sleep(self.pause()).await;

        let origin = self.origin();
        for path in TOKEN_PATHS {
            let Ok(url) = join_path(&self.base_url, path) else {
                continue;
            };
            let mut request = self
                .client
                .get(url)
                .headers(xhr_headers(&origin, self.base_url.as_str()));
            if let Some(cookie) = self.cookie_header().await {
                request = request.header(COOKIE, cookie);
            }
            let Ok(response) = request.send().await else {
                tracing::debug!(path, "wb token endpoint unreachable");
                continue;
            };
            self.cookies
                .lock()
                .await
                .merge_set_cookie(response.headers());
            if response.status() != StatusCode::OK {
                continue;
            }
            let token = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v.get("token").and_then(|t| t.as_str()).map(str::to_owned))
                .filter(|t| !t.is_empty());
            if let Some(token) = token {
                self.cookies.lock().await.set(TOKEN_COOKIE, &token);
                tracing::debug!(path, "wb anti-bot token obtained");
                break;
            }
        }

        let jar = self.cookies.lock().await;
        let missing = jar.missing(&IMPORTANT_COOKIES);
        if missing.is_empty() {
            tracing::info!(cookies = jar.len(), "wb session initialised");
        } else {
            tracing::warn!(
                missing = ?missing,
                cookies = jar.len(),
                "wb session is missing anti-bot cookies; catalog requests may be challenged"
            );
        }
    }

    /// Builds the catalog URL for one page of a brand.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] if the path cannot be joined.
    pub fn catalog_url(
        &self,
        brand_id: u64,
        page: usize,
        fsupplier: Option<&str>,
    ) -> Result<Url, ScraperError> {
        let mut url = join_path(&self.base_url, CATALOG_PATH)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("ab_testing", "false")
                .append_pair("appType", "1")
                .append_pair("brand", &brand_id.to_string())
                .append_pair("curr", "rub")
                .append_pair("dest", &self.settings.dest.to_string())
                .append_pair("hide_dtype", "9")
                .append_pair("hide_vflags", "4294967296")
                .append_pair("lang", "ru")
                .append_pair("page", &page.to_string())
                .append_pair("sort", "popular")
                .append_pair("spp", &self.settings.spp.to_string());
            if let Some(fsupplier) = fsupplier {
                query.append_pair("fsupplier", fsupplier);
            }
        }
        Ok(url)
    }

    /// Fetches one catalog page under the concurrency limit, retrying 429
    /// and transient failures with backoff.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::AntibotChallenge`]: 498 persisted after the token
    ///   and session refresh attempts.
    /// - [`ScraperError::RateLimited`]: 429 after all retries.
    /// - [`ScraperError::UnexpectedStatus`] / [`ScraperError::NotFound`].
    /// - [`ScraperError::Deserialize`]: body is not a catalog page.
    pub async fn fetch_page(
        &self,
        brand_id: u64,
        page: usize,
        fsupplier: Option<&str>,
    ) -> Result<CatalogPage, ScraperError> {
        // The semaphore is never closed, so acquisition cannot fail.
        let _permit = self.semaphore.acquire().await.ok();
        tokio::time::sleep(Duration::from_millis(self.settings.request_delay_ms)).await;

        let url = self.catalog_url(brand_id, page, fsupplier)?;
        retry_with_backoff(
            self.settings.max_retries,
            self.settings.backoff_base_ms,
            || self.fetch_page_once(&url),
        )
        .await
    }

    async fn fetch_page_once(&self, url: &Url) -> Result<CatalogPage, ScraperError> {
        let origin = self.origin();
        let mut challenges = 0u32;

        loop {
            let mut request = self
                .client
                .get(url.clone())
                .headers(xhr_headers(&origin, self.base_url.as_str()));
            if let Some(cookie) = self.cookie_header().await {
                request = request.header(COOKIE, cookie);
            }

            let response = request.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            self.cookies.lock().await.merge_set_cookie(&headers);

            if status == StatusCode::OK {
                let body = response.text().await?;
                return serde_json::from_str::<CatalogPage>(&body).map_err(|e| {
                    ScraperError::Deserialize {
                        context: format!("wb catalog page {url}"),
                        source: e,
                    }
                });
            }

            if status.as_u16() != ANTIBOT_STATUS {
                let body = response.text().await.unwrap_or_default();
                let jar = self.cookies.lock().await;
                return Err(status_error(status, url, &headers, &body, &jar.credential_values()));
            }

            if challenges >= self.settings.max_retries {
                return Err(ScraperError::AntibotChallenge {
                    status: ANTIBOT_STATUS,
                    url: url.to_string(),
                });
            }

            let fresh_token = headers
                .get("x-wbaas-token")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("get"))
                .map(str::to_owned);

            if let Some(token) = fresh_token {
                tracing::warn!(attempt = challenges + 1, "wb 498: applying token from response header");
                self.cookies.lock().await.set(TOKEN_COOKIE, &token);
            } else if challenges == 0 {
                tracing::warn!("wb 498: re-initialising session");
                self.init_session().await;
            } else {
                let body = response.text().await.unwrap_or_default();
                let snippet = {
                    let jar = self.cookies.lock().await;
                    sanitize_for_logging(truncate_for_log(&body, 300), &jar.credential_values())
                };
                tracing::debug!(body = %snippet, "wb 498 body");
                return Err(ScraperError::AntibotChallenge {
                    status: ANTIBOT_STATUS,
                    url: url.to_string(),
                });
            }

            challenges += 1;
            tokio::time::sleep(self.pause()).await;
        }
    }

    /// Fetches every page of a brand's catalog.
    ///
    /// Page 1 yields `total`; the remaining pages are requested concurrently
    /// (bounded by the semaphore). Failed later pages are logged and skipped.
    ///
    /// # Errors
    ///
    /// Propagates any error from page 1.
    pub async fn fetch_brand_catalog(
        &self,
        brand_id: u64,
        brand_name: &str,
        fsupplier: Option<&str>,
    ) -> Result<BrandCatalog, ScraperError> {
        self.ensure_session().await;

        let first = self.fetch_page(brand_id, 1, fsupplier).await?;
        let per_page = first.products.len();
        let total = first.total;
        let mut catalog = BrandCatalog {
            products: first.products,
            total,
            total_pages: 1,
            failed_pages: 0,
        };

        let per_page_u64 = u64::try_from(per_page).unwrap_or(u64::MAX);
        if per_page == 0 || total <= per_page_u64 {
            tracing::info!(brand = brand_name, brand_id, products = catalog.products.len(), "wb brand catalog fetched");
            return Ok(catalog);
        }

        let computed = usize::try_from(total.div_ceil(per_page_u64)).unwrap_or(usize::MAX);
        if computed > MAX_PAGES {
            tracing::warn!(
                brand = brand_name,
                brand_id,
                computed,
                max_pages = MAX_PAGES,
                "wb catalog page count capped"
            );
        }
        let total_pages = computed.min(MAX_PAGES);
        catalog.total_pages = total_pages;

        let requests = (2..=total_pages).map(|page| async move {
            (page, self.fetch_page(brand_id, page, fsupplier).await)
        });
        for (page, result) in futures::future::join_all(requests).await {
            match result {
                Ok(p) => catalog.products.extend(p.products),
                Err(e) => {
                    catalog.failed_pages += 1;
                    tracing::warn!(brand = brand_name, brand_id, page, error = %e, "skipping failed wb catalog page");
                }
            }
        }

        tracing::info!(
            brand = brand_name,
            brand_id,
            total,
            pages = total_pages,
            failed_pages = catalog.failed_pages,
            products = catalog.products.len(),
            "wb brand catalog fetched"
        );
        Ok(catalog)
    }
}
