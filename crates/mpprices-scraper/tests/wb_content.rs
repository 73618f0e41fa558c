//! Integration tests for the Wildberries Content and Prices API clients.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mpprices_scraper::wb::{ObjectsQuery, WbContentClient, WbPricesClient};
use mpprices_scraper::ScraperError;

fn content_client(server: &MockServer) -> WbContentClient {
    WbContentClient::with_base_url("wb-token", 5, "mpprices-test/0.1", 0, 0, &server.uri())
        .expect("failed to build test WbContentClient")
}

fn prices_client(server: &MockServer) -> WbPricesClient {
    WbPricesClient::with_base_url("wb-token", 5, "mpprices-test/0.1", 0, 0, &server.uri())
        .expect("failed to build test WbPricesClient")
}

fn card(nm_id: u64) -> serde_json::Value {
    json!({
        "nmID": nm_id,
        "vendorCode": format!("VC-{nm_id}"),
        "brand": "Cosmo",
        "title": format!("Крем {nm_id}"),
        "updatedAt": format!("2024-05-01T10:00:{:02}Z", nm_id % 60)
    })
}

// ---------------------------------------------------------------------------
// Content cards
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cards_walk_follows_the_cursor() {
    let server = MockServer::start().await;

    let first_page: Vec<_> = (1..=100).map(card).collect();

    // Registered first so it wins for the second request.
    Mock::given(method("POST"))
        .and(path("/content/v2/get/cards/list"))
        .and(body_partial_json(json!({"settings": {"cursor": {"nmID": 100}}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "cards": [card(101)],
            "cursor": {"updatedAt": "2024-05-01T10:00:41Z", "nmID": 101, "total": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/content/v2/get/cards/list"))
        .and(header("authorization", "wb-token"))
        .and(body_partial_json(json!({"settings": {"cursor": {"limit": 100}}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "cards": first_page,
            "cursor": {"updatedAt": "2024-05-01T10:00:40Z", "nmID": 100, "total": 100}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cards = content_client(&server)
        .fetch_all_cards()
        .await
        .expect("cards should be fetched");

    assert_eq!(cards.len(), 101);
    assert_eq!(cards[100].nm_id, 101);
    assert_eq!(cards[0].vendor_code, "VC-1");
}

#[tokio::test]
async fn cards_unauthorized_surfaces_detail() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/content/v2/get/cards/list"))
        .respond_with(ResponseTemplate::new(401).set_body_json(&json!({
            "title": "unauthorized",
            "detail": "token is expired",
            "status": 401
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = content_client(&server)
        .fetch_all_cards()
        .await
        .expect_err("401 should fail the walk");

    match err {
        ScraperError::Unauthorized { detail, .. } => assert_eq!(detail, "token is expired"),
        other => panic!("expected Unauthorized, got: {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_detail_never_echoes_the_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/content/v2/get/cards/list"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token sk-live-SECRET-9876 is expired"))
        .mount(&server)
        .await;

    let client = WbContentClient::with_base_url(
        "sk-live-SECRET-9876",
        5,
        "mpprices-test/0.1",
        0,
        0,
        &server.uri(),
    )
    .expect("failed to build test WbContentClient");
    let err = client.fetch_all_cards().await.expect_err("401 should fail the walk");

    let rendered = err.to_string();
    assert!(!rendered.contains("sk-live-SECRET-9876"), "token leaked: {rendered}");
    assert!(rendered.contains("token [REDACTED] is expired"), "unexpected: {rendered}");
}

#[tokio::test]
async fn cards_walk_keeps_pages_before_a_later_failure() {
    let server = MockServer::start().await;

    let first_page: Vec<_> = (1..=100).map(card).collect();
    Mock::given(method("POST"))
        .and(path("/content/v2/get/cards/list"))
        .and(body_partial_json(json!({"settings": {"cursor": {"nmID": 100}}})))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/content/v2/get/cards/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "cards": first_page,
            "cursor": {"updatedAt": "2024-05-01T10:00:40Z", "nmID": 100, "total": 100}
        })))
        .mount(&server)
        .await;

    let cards = content_client(&server)
        .fetch_all_cards()
        .await
        .expect("first page succeeded");
    assert_eq!(cards.len(), 100);
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

#[tokio::test]
async fn objects_sends_filters_as_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/content/v2/object/all"))
        .and(query_param("locale", "ru"))
        .and(query_param("limit", "1000"))
        .and(query_param("offset", "0"))
        .and(query_param("parentID", "1"))
        .and(query_param("name", "Крем"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "data": [
                {"subjectID": 2560, "parentID": 1, "subjectName": "Кремы", "parentName": "Косметика"}
            ],
            "error": false,
            "errorText": ""
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = ObjectsQuery {
        locale: None,
        parent_id: Some(1),
        name: Some("Крем".to_string()),
    };
    let objects = content_client(&server)
        .fetch_all_objects(&query)
        .await
        .expect("objects should be fetched");

    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].subject_id, 2560);
    assert_eq!(objects[0].subject_name, "Кремы");
}

#[tokio::test]
async fn objects_limit_above_maximum_is_rejected() {
    let server = MockServer::start().await;

    let err = content_client(&server)
        .fetch_objects(&ObjectsQuery::default(), 1001, 0)
        .await
        .expect_err("limit above 1000 is invalid");

    assert!(
        matches!(err, ScraperError::InvalidLimit { limit: 1001, max: 1000 }),
        "expected InvalidLimit, got: {err:?}"
    );
}

// ---------------------------------------------------------------------------
// Prices
// ---------------------------------------------------------------------------

#[tokio::test]
async fn goods_single_short_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/list/goods/filter"))
        .and(query_param("limit", "1000"))
        .and(query_param("offset", "0"))
        .and(header("authorization", "wb-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "data": {"listGoods": [{
                "nmID": 101,
                "vendorCode": "VC-101",
                "discount": 30,
                "clubDiscount": 5,
                "sizes": [{"sizeID": 1, "price": 2000, "discountedPrice": 1400, "clubDiscountedPrice": 1330, "techSizeName": "0"}]
            }]},
            "error": false,
            "errorText": ""
        })))
        .expect(1)
        .mount(&server)
        .await;

    let goods = prices_client(&server)
        .fetch_all_goods()
        .await
        .expect("goods should be fetched");

    assert_eq!(goods.len(), 1);
    assert_eq!(goods[0].nm_id, 101);
    assert_eq!(goods[0].sizes[0].discounted_price, Some(1400.0));
    assert_eq!(goods[0].discount, Some(30.0));
}

#[tokio::test]
async fn goods_missing_data_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/list/goods/filter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"data": null})))
        .mount(&server)
        .await;

    let goods = prices_client(&server)
        .fetch_all_goods()
        .await
        .expect("empty data is not an error");
    assert!(goods.is_empty());
}

#[tokio::test]
async fn goods_unauthorized_propagates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/list/goods/filter"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let err = prices_client(&server)
        .fetch_all_goods()
        .await
        .expect_err("401 should fail");
    assert!(
        matches!(err, ScraperError::Unauthorized { .. }),
        "expected Unauthorized, got: {err:?}"
    );
}
