//! Next-page discovery in storefront `entrypoint-api` responses.
//!
//! The product grid lives in a `widgetStates` entry whose key contains
//! `tileGridDesktop`; its value is itself a JSON document encoded as a
//! string. Pagination hints have moved around between layouts, so every
//! known location is checked.

use reqwest::Url;
use serde_json::Value;

use crate::ozon::types::{value_as_text, NextPage};

const TILE_GRID_MARKER: &str = "tileGridDesktop";

/// Decoded `tileGridDesktop` widget states of a page, in key order.
#[must_use]
pub fn tile_grid_states(page: &Value) -> Vec<Value> {
    let Some(states) = page.get("widgetStates").and_then(Value::as_object) else {
        return Vec::new();
    };
    states
        .iter()
        .filter(|(key, _)| key.contains(TILE_GRID_MARKER))
        .filter_map(|(key, raw)| match raw {
            Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    tracing::debug!(state = %key, error = %e, "undecodable widget state");
                    None
                }
            },
            Value::Object(_) => Some(raw.clone()),
            _ => None,
        })
        .collect()
}

fn text_at(node: &Value, key: &str) -> Option<String> {
    node.get(key).and_then(value_as_text)
}

/// `next` is either a URL string or a pagination object.
fn absorb_next(node: &Value, url: &mut Option<String>, pagination: &mut Vec<Value>) {
    match node.get("next") {
        Some(Value::String(s)) if !s.is_empty() => {
            url.get_or_insert_with(|| s.clone());
        }
        Some(obj @ Value::Object(_)) => pagination.push(obj.clone()),
        _ => {}
    }
}

/// Reads a token from a pagination object in either camelCase or
/// snake_case.
fn pagination_token(pagination: &Value, camel: &str, snake: &str) -> Option<String> {
    text_at(pagination, camel).or_else(|| text_at(pagination, snake))
}

/// Pulls `paginator_token` / `search_page_state` out of a next-page URL,
/// which is usually site-relative (`/seller/…/?page=2&paginator_token=…`).
#[must_use]
pub fn tokens_from_url(next_url: &str) -> (Option<String>, Option<String>) {
    let parsed = Url::parse("https://www.ozon.ru/").and_then(|base| base.join(next_url));
    let Ok(parsed) = parsed else {
        return (None, None);
    };
    let mut paginator = None;
    let mut search_state = None;
    for (key, value) in parsed.query_pairs() {
        if value.is_empty() {
            continue;
        }
        match key.as_ref() {
            "paginator_token" => paginator = Some(value.into_owned()),
            "search_page_state" => search_state = Some(value.into_owned()),
            _ => {}
        }
    }
    (paginator, search_state)
}

/// Finds where the next page is.
///
/// Search order: root `nextPage`; then each tile-grid state's `sharedData`
/// (`nextPage`, `paginatorToken`, `searchPageState`, `pagination`) and its
/// own `nextPage`, `next`, `pagination`, `paginatorToken`,
/// `searchPageState`; then root `pageInfo.nextPage`, `next`, and
/// `pagination`. The first value found for each field wins. Tokens missing
/// after that are taken from pagination objects and finally from the
/// next-page URL's query.
#[must_use]
pub fn find_next_page(page: &Value) -> NextPage {
    let mut url = text_at(page, "nextPage");
    let mut paginator_token = None;
    let mut search_page_state = None;
    let mut pagination: Vec<Value> = Vec::new();

    for state in tile_grid_states(page) {
        if let Some(shared) = state.get("sharedData").filter(|s| s.is_object()) {
            if url.is_none() {
                url = text_at(shared, "nextPage");
            }
            if paginator_token.is_none() {
                paginator_token = text_at(shared, "paginatorToken");
            }
            if search_page_state.is_none() {
                search_page_state = text_at(shared, "searchPageState");
            }
            if let Some(p) = shared.get("pagination").filter(|p| p.is_object()) {
                pagination.push(p.clone());
            }
        }
        if url.is_none() {
            url = text_at(&state, "nextPage");
        }
        absorb_next(&state, &mut url, &mut pagination);
        if let Some(p) = state.get("pagination").filter(|p| p.is_object()) {
            pagination.push(p.clone());
        }
        if paginator_token.is_none() {
            paginator_token = text_at(&state, "paginatorToken");
        }
        if search_page_state.is_none() {
            search_page_state = text_at(&state, "searchPageState");
        }
    }

    if let Some(page_info) = page.get("pageInfo") {
        if url.is_none() {
            url = text_at(page_info, "nextPage");
        }
        if let Some(p) = page_info.get("pagination").filter(|p| p.is_object()) {
            pagination.push(p.clone());
        }
    }
    absorb_next(page, &mut url, &mut pagination);
    if let Some(p) = page.get("pagination").filter(|p| p.is_object()) {
        pagination.push(p.clone());
    }

    for p in &pagination {
        if paginator_token.is_none() {
            paginator_token = pagination_token(p, "paginatorToken", "paginator_token");
        }
        if search_page_state.is_none() {
            search_page_state = pagination_token(p, "searchPageState", "search_page_state");
        }
    }

    if let Some(next_url) = url.as_deref() {
        let (from_url_token, from_url_state) = tokens_from_url(next_url);
        paginator_token = paginator_token.or(from_url_token);
        search_page_state = search_page_state.or(from_url_state);
    }

    NextPage {
        url,
        paginator_token,
        search_page_state,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn page_with_state(state: &Value) -> Value {
        json!({
            "widgetStates": {
                "tileGridDesktop-1234-default-1": state.to_string(),
                "searchResultsHeader-1": "{}"
            }
        })
    }

    #[test]
    fn empty_page_has_no_next() {
        assert!(find_next_page(&json!({})).is_empty());
        assert!(find_next_page(&page_with_state(&json!({"items": []}))).is_empty());
    }

    #[test]
    fn root_next_page_with_url_tokens() {
        let page = json!({
            "nextPage": "/seller/cosmo-beauty-176640/?page=2&paginator_token=abc%3D&search_page_state=xyz"
        });
        let next = find_next_page(&page);
        assert_eq!(next.paginator_token.as_deref(), Some("abc="));
        assert_eq!(next.search_page_state.as_deref(), Some("xyz"));
        assert!(next.url.unwrap().contains("page=2"));
    }

    #[test]
    fn shared_data_tokens() {
        let page = page_with_state(&json!({
            "items": [],
            "sharedData": {"paginatorToken": "tok-1", "searchPageState": "st-1"}
        }));
        let next = find_next_page(&page);
        assert_eq!(next.paginator_token.as_deref(), Some("tok-1"));
        assert_eq!(next.search_page_state.as_deref(), Some("st-1"));
        assert!(next.url.is_none());
    }

    #[test]
    fn next_object_is_pagination_in_snake_case() {
        let page = page_with_state(&json!({
            "next": {"paginator_token": "snake", "search_page_state": "s"}
        }));
        let next = find_next_page(&page);
        assert_eq!(next.paginator_token.as_deref(), Some("snake"));
        assert_eq!(next.search_page_state.as_deref(), Some("s"));
    }

    #[test]
    fn next_string_is_url() {
        let page = page_with_state(&json!({"next": "/seller/x-1/?page=3"}));
        assert_eq!(
            find_next_page(&page).url.as_deref(),
            Some("/seller/x-1/?page=3")
        );
    }

    #[test]
    fn page_info_and_root_pagination() {
        let page = json!({
            "pageInfo": {"nextPage": "/seller/x-1/?page=2"},
            "pagination": {"paginatorToken": "root-tok"}
        });
        let next = find_next_page(&page);
        assert_eq!(next.url.as_deref(), Some("/seller/x-1/?page=2"));
        assert_eq!(next.paginator_token.as_deref(), Some("root-tok"));
    }

    #[test]
    fn object_widget_state_is_accepted() {
        let page = json!({
            "widgetStates": {"tileGridDesktop-9": {"paginatorToken": "obj"}}
        });
        assert_eq!(find_next_page(&page).paginator_token.as_deref(), Some("obj"));
    }

    #[test]
    fn tokens_from_absolute_url() {
        let (tok, state) =
            tokens_from_url("https://www.ozon.ru/seller/a-1/?paginator_token=T&search_page_state=");
        assert_eq!(tok.as_deref(), Some("T"));
        assert_eq!(state, None);
    }
}
