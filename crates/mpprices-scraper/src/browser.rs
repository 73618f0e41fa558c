//! Desktop Chrome request profiles for the marketplaces' browser-facing
//! endpoints.
//!
//! Only headers are emulated; the TLS fingerprint is whatever rustls
//! produces. `Accept-Encoding` is left to `reqwest` so that compressed
//! bodies are decoded transparently.

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, ORIGIN, PRAGMA,
    REFERER, UPGRADE_INSECURE_REQUESTS,
};

const SEC_CH_UA: &str = r#""Google Chrome";v="131", "Chromium";v="131", "Not_A Brand";v="24""#;
const ACCEPT_LANGUAGE_RU: &str = "ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7";

fn insert_static(headers: &mut HeaderMap, name: &'static str, value: &'static str) {
    headers.insert(
        HeaderName::from_static(name),
        HeaderValue::from_static(value),
    );
}

fn client_hints(headers: &mut HeaderMap) {
    insert_static(headers, "sec-ch-ua", SEC_CH_UA);
    insert_static(headers, "sec-ch-ua-mobile", "?0");
    insert_static(headers, "sec-ch-ua-platform", "\"Windows\"");
}

/// Headers for a top-level page navigation (homepage or storefront visit).
///
/// `referer` is set for in-site navigations; a cold visit passes `None` and
/// is marked `Sec-Fetch-Site: none`.
#[must_use]
pub fn document_headers(referer: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_RU));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    insert_static(&mut headers, "sec-fetch-dest", "document");
    insert_static(&mut headers, "sec-fetch-mode", "navigate");
    insert_static(&mut headers, "sec-fetch-user", "?1");
    client_hints(&mut headers);

    match referer.and_then(|r| HeaderValue::from_str(r).ok()) {
        Some(value) => {
            headers.insert(REFERER, value);
            insert_static(&mut headers, "sec-fetch-site", "same-origin");
        }
        None => insert_static(&mut headers, "sec-fetch-site", "none"),
    }
    headers
}

/// Headers for a same-origin XHR/fetch call made by the storefront's own JS.
#[must_use]
pub fn xhr_headers(origin: &str, referer: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_RU));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    if let Ok(value) = HeaderValue::from_str(origin) {
        headers.insert(ORIGIN, value);
    }
    if let Ok(value) = HeaderValue::from_str(referer) {
        headers.insert(REFERER, value);
    }
    insert_static(&mut headers, "sec-fetch-dest", "empty");
    insert_static(&mut headers, "sec-fetch-mode", "cors");
    insert_static(&mut headers, "sec-fetch-site", "same-origin");
    client_hints(&mut headers);
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_document_visit_has_no_referer() {
        let h = document_headers(None);
        assert!(h.get(REFERER).is_none());
        assert_eq!(h.get("sec-fetch-site").unwrap(), "none");
        assert_eq!(h.get("sec-fetch-mode").unwrap(), "navigate");
    }

    #[test]
    fn in_site_document_visit_is_same_origin() {
        let h = document_headers(Some("https://www.ozon.ru/"));
        assert_eq!(h.get(REFERER).unwrap(), "https://www.ozon.ru/");
        assert_eq!(h.get("sec-fetch-site").unwrap(), "same-origin");
    }

    #[test]
    fn xhr_headers_carry_origin_and_hints() {
        let h = xhr_headers("https://www.wildberries.ru", "https://www.wildberries.ru/");
        assert_eq!(h.get(ORIGIN).unwrap(), "https://www.wildberries.ru");
        assert_eq!(h.get("sec-fetch-mode").unwrap(), "cors");
        assert!(h.get("sec-ch-ua").unwrap().to_str().unwrap().contains("131"));
    }
}
