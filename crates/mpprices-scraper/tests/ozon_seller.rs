//! Integration tests for `OzonSellerClient` using wiremock HTTP mocks.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mpprices_scraper::ozon::{OzonSellerClient, OzonSellerSettings, PriceFilter, SellerPrice};
use mpprices_scraper::ScraperError;

fn test_client(server: &MockServer) -> OzonSellerClient {
    let settings = OzonSellerSettings {
        timeout_secs: 5,
        user_agent: "mpprices-test/0.1".to_string(),
        request_delay_ms: 0,
        max_retries: 0,
        backoff_base_ms: 0,
    };
    OzonSellerClient::with_base_url(176_640, "ozon-key", settings, &server.uri())
        .expect("failed to build test OzonSellerClient")
}

fn price_item(product_id: u64, offer_id: &str) -> serde_json::Value {
    json!({
        "product_id": product_id,
        "offer_id": offer_id,
        "price": {"price": "990.0000", "old_price": "1990.0000", "min_price": "900.0000", "currency_code": "RUB"}
    })
}

#[tokio::test]
async fn product_prices_follow_the_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v5/product/info/prices"))
        .and(body_partial_json(json!({"cursor": "c1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "items": [price_item(3, "C")],
            "cursor": "",
            "total": 3
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v5/product/info/prices"))
        .and(header("client-id", "176640"))
        .and(header("api-key", "ozon-key"))
        .and(body_partial_json(json!({"filter": {"visibility": "ALL"}, "limit": 1000})))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "items": [price_item(1, "A"), price_item(2, "B")],
            "cursor": "c1",
            "total": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let items = test_client(&server)
        .fetch_product_prices(&PriceFilter::All, 1000)
        .await
        .expect("prices should be fetched");

    assert_eq!(items.len(), 3);
    let first = SellerPrice::from_value(&items[0]);
    assert_eq!(first.offer_id.as_deref(), Some("A"));
    assert_eq!(first.seller_price, Some(990.0));
    assert_eq!(first.old_price, Some(1990.0));
}

#[tokio::test]
async fn product_prices_with_offer_filter_under_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v5/product/info/prices"))
        .and(body_partial_json(json!({"filter": {"offer_id": ["A"]}, "limit": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "result": {"items": [price_item(1, "A")], "cursor": ""}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let items = test_client(&server)
        .fetch_product_prices(&PriceFilter::OfferIds(vec!["A".to_string()]), 1)
        .await
        .expect("prices should be fetched");
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn product_prices_limit_is_validated() {
    let server = MockServer::start().await;

    let err = test_client(&server)
        .fetch_product_prices(&PriceFilter::All, 5000)
        .await
        .expect_err("limit above 1000 is invalid");
    assert!(matches!(err, ScraperError::InvalidLimit { limit: 5000, .. }));
}

#[tokio::test]
async fn product_prices_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v5/product/info/prices"))
        .respond_with(ResponseTemplate::new(401).set_body_json(&json!({
            "code": 16,
            "message": "Invalid Api-Key, please contact support"
        })))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .fetch_product_prices(&PriceFilter::All, 1000)
        .await
        .expect_err("401 should fail");
    match err {
        ScraperError::Unauthorized { detail, .. } => {
            assert_eq!(detail, "Invalid Api-Key, please contact support");
        }
        other => panic!("expected Unauthorized, got: {other:?}"),
    }
}

#[tokio::test]
async fn products_by_sku_are_batched() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/product/info/list"))
        .and(body_partial_json(json!({"offer_id": [], "product_id": []})))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "items": [{"id": 11, "offer_id": "A", "name": "Крем", "sources": [{"sku": 5001}]}]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let skus: Vec<u64> = (1..=1001).collect();
    let infos = test_client(&server)
        .fetch_products_by_sku(&skus)
        .await
        .expect("infos should be fetched");

    assert_eq!(infos.len(), 2);
    assert_eq!(infos[0].product_id, 11);
    assert_eq!(infos[0].sku, Some(5001));
}

#[tokio::test]
async fn products_by_product_id_send_string_ids() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/product/info/list"))
        .and(body_partial_json(json!({"product_id": ["11", "12"], "sku": []})))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "items": [{"id": 11, "name": "A"}, {"id": 12, "name": "B"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let infos = test_client(&server)
        .fetch_products_by_product_id(&[11, 12])
        .await
        .expect("infos should be fetched");
    assert_eq!(infos.len(), 2);
}

#[tokio::test]
async fn failed_info_batch_is_skipped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/product/info/list"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let infos = test_client(&server)
        .fetch_products_by_sku(&[1, 2, 3])
        .await
        .expect("server errors are skipped");
    assert!(infos.is_empty());
}

#[tokio::test]
async fn unauthorized_info_batch_stops() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/product/info/list"))
        .respond_with(ResponseTemplate::new(401).set_body_string("denied"))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .fetch_products_by_sku(&[1])
        .await
        .expect_err("401 should stop");
    assert!(matches!(err, ScraperError::Unauthorized { .. }));
}
