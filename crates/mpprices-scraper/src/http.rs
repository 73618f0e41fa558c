//! Response handling shared by the marketplace clients.

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::ScraperError;
use crate::redact::{sanitize_for_logging, truncate_for_log};

/// Builds the `reqwest::Client` every marketplace client uses.
pub(crate) fn build_client(
    timeout_secs: u64,
    user_agent: &str,
    proxy: Option<&str>,
) -> Result<Client, ScraperError> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent);
    if let Some(proxy_url) = proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
    }
    Ok(builder.build()?)
}

/// Parses `base_url`, forcing exactly one trailing slash so that
/// [`Url::join`] appends to the root rather than replacing the last segment.
pub(crate) fn normalise_base_url(base_url: &str) -> Result<Url, ScraperError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| ScraperError::InvalidBaseUrl {
        base_url: base_url.to_owned(),
        reason: e.to_string(),
    })
}

/// Joins a relative path onto a normalised base URL.
pub(crate) fn join_path(base: &Url, path: &str) -> Result<Url, ScraperError> {
    base.join(path).map_err(|e| ScraperError::InvalidBaseUrl {
        base_url: base.to_string(),
        reason: format!("cannot join \"{path}\": {e}"),
    })
}

/// Reads `Retry-After` as whole seconds; absent or non-numeric yields 0.
pub(crate) fn retry_after_secs(headers: &HeaderMap) -> u64 {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

/// Maps a non-success status to the matching [`ScraperError`].
///
/// `body` is only used to enrich 401 errors with the API's own message;
/// `secrets` are scrubbed from that message.
pub(crate) fn status_error(
    status: StatusCode,
    url: &Url,
    headers: &HeaderMap,
    body: &str,
    secrets: &[&str],
) -> ScraperError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ScraperError::RateLimited {
            domain: url.host_str().unwrap_or_default().to_owned(),
            retry_after_secs: retry_after_secs(headers),
        },
        StatusCode::UNAUTHORIZED => ScraperError::Unauthorized {
            url: url.to_string(),
            detail: error_detail(body, secrets),
        },
        StatusCode::NOT_FOUND => ScraperError::NotFound {
            url: url.to_string(),
        },
        other => ScraperError::UnexpectedStatus {
            status: other.as_u16(),
            url: url.to_string(),
        },
    }
}

/// Pulls a human-readable message out of an API error body.
///
/// Wildberries uses `detail`/`title`/`errorText`; Ozon uses `message`.
fn error_detail(body: &str, secrets: &[&str]) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| {
            ["detail", "errorText", "message", "title"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()))
                .filter(|m| !m.is_empty())
        })
        .unwrap_or_else(|| body.trim());
    sanitize_for_logging(truncate_for_log(message, 200), secrets)
}

/// Sends `request`, checks the status, and deserializes the body as `T`.
///
/// `secrets` (the request's credentials) never appear in a returned error.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    url: &Url,
    context: &str,
    secrets: &[&str],
) -> Result<T, ScraperError> {
    let response = request.send().await?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(status_error(status, url, &headers, &body, secrets));
    }

    serde_json::from_str::<T>(&body).map_err(|e| ScraperError::Deserialize {
        context: context.to_owned(),
        source: e,
    })
}
