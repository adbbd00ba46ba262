use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;

use fresh_chicken_orders::api::{self, AppState};
use fresh_chicken_orders::cache::{MemoryCache, DEFAULT_TTL};
use fresh_chicken_orders::domain::order::OrderLifecycleManager;
use fresh_chicken_orders::health::HealthChecker;
use fresh_chicken_orders::metrics::Metrics;
use fresh_chicken_orders::store::MemoryOrderStore;

fn state() -> (web::Data<AppState>, Arc<MemoryOrderStore>, Arc<MemoryCache>) {
    let store = Arc::new(MemoryOrderStore::new());
    let cache = Arc::new(MemoryCache::new());
    let metrics = Arc::new(Metrics::new().unwrap());
    let manager = OrderLifecycleManager::new(store.clone(), cache.clone(), metrics.clone(), DEFAULT_TTL);

    let state = AppState {
        manager: Arc::new(manager),
        health: HealthChecker::new(store.clone(), cache.clone()),
        metrics,
    };
    (web::Data::new(state), store, cache)
}

fn kim_order() -> Value {
    json!({
        "customerName": "Kim",
        "menuItem": "Fried Chicken",
        "quantity": 2,
        "totalPrice": 24000
    })
}

#[actix_web::test]
async fn test_create_and_fetch_order() {
    let (state, _, _) = state();
    let app = test::init_service(App::new().app_data(state).configure(api::configure)).await;

    let req = test::TestRequest::post().uri("/api/orders").set_json(kim_order()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "PENDING");
    assert_eq!(body["data"]["statusText"], "Order received");
    let id = body["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::get().uri(&format!("/api/orders/{}", id)).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["customerName"], "Kim");
    assert_eq!(body["data"]["totalPrice"], 24000);
}

#[actix_web::test]
async fn test_validation_errors_are_400() {
    let (state, store, _) = state();
    let app = test::init_service(App::new().app_data(state).configure(api::configure)).await;

    let mut invalid = kim_order();
    invalid["quantity"] = json!(0);
    let req = test::TestRequest::post().uri("/api/orders").set_json(invalid).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);

    let req = test::TestRequest::post()
        .uri("/api/orders")
        .set_json(json!({ "customerName": "Kim" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert!(store.is_empty().await);
}

#[actix_web::test]
async fn test_unknown_order_is_404() {
    let (state, _, _) = state();
    let app = test::init_service(App::new().app_data(state).configure(api::configure)).await;

    let req = test::TestRequest::get().uri("/api/orders/99999").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Order not found: 99999");
}

#[actix_web::test]
async fn test_cancel_then_cancel_again() {
    let (state, _, _) = state();
    let app = test::init_service(App::new().app_data(state).configure(api::configure)).await;

    let req = test::TestRequest::post().uri("/api/orders").set_json(kim_order()).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::delete().uri(&format!("/api/orders/{}", id)).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["status"], "CANCELLED");

    let req = test::TestRequest::delete().uri(&format!("/api/orders/{}", id)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_update_status_and_filter() {
    let (state, _, _) = state();
    let app = test::init_service(App::new().app_data(state).configure(api::configure)).await;

    for _ in 0..3 {
        let req = test::TestRequest::post().uri("/api/orders").set_json(kim_order()).to_request();
        test::call_service(&app, req).await;
    }

    let req = test::TestRequest::patch().uri("/api/orders/2/status?status=ready").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["status"], "READY");
    assert_eq!(body["data"]["statusText"], "Ready for pickup");

    let req = test::TestRequest::get().uri("/api/orders/status/READY").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);

    let req = test::TestRequest::get().uri("/api/orders/summary").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["PENDING"], 2);
    assert_eq!(body["data"]["READY"], 1);

    let req = test::TestRequest::patch().uri("/api/orders/2/status?status=SHIPPED").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_list_search_and_recent() {
    let (state, _, _) = state();
    let app = test::init_service(App::new().app_data(state).configure(api::configure)).await;

    for name in ["Kim", "Lee", "Kim Jiwoo"] {
        let mut order = kim_order();
        order["customerName"] = json!(name);
        let req = test::TestRequest::post().uri("/api/orders").set_json(order).to_request();
        test::call_service(&app, req).await;
    }

    let req = test::TestRequest::get().uri("/api/orders?page=0&size=2&sort=id,asc").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["totalElements"], 3);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["currentPage"], 0);
    assert_eq!(body["data"][0]["id"], 1);

    let req = test::TestRequest::get().uri("/api/orders/search?customerName=Kim").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["totalElements"], 2);

    let req = test::TestRequest::get().uri("/api/orders/recent").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let req = test::TestRequest::get().uri("/api/orders?sort=colour").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_store_outage_is_503() {
    let (state, store, _) = state();
    let app = test::init_service(App::new().app_data(state).configure(api::configure)).await;
    store.set_unavailable(true);

    let req = test::TestRequest::get().uri("/api/orders/recent").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["requestId"].is_string());
}

#[actix_web::test]
async fn test_health_endpoints() {
    let (state, _, cache) = state();
    let app = test::init_service(App::new().app_data(state).configure(api::configure)).await;

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "UP");
    assert_eq!(body["application"], "fresh_chicken_orders");

    let req = test::TestRequest::get().uri("/api/health/detailed").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["components"]["database"]["status"], "UP");
    assert_eq!(body["components"]["cache"]["status"], "UP");

    cache.set_unavailable(true);
    let req = test::TestRequest::get().uri("/api/health/detailed").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["components"]["cache"]["status"], "DOWN");
}

#[actix_web::test]
async fn test_metrics_endpoint_exposes_counters() {
    let (state, _, _) = state();
    let app = test::init_service(App::new().app_data(state).configure(api::configure)).await;

    let req = test::TestRequest::post().uri("/api/orders").set_json(kim_order()).to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let body = test::call_and_read_body(&app, req).await;
    let text = String::from_utf8(body.to_vec()).unwrap();

    assert!(text.contains("fresh_chicken_orders_created_total{status=\"PENDING\"} 1"));
}

#[actix_web::test]
async fn test_malformed_id_is_400_envelope() {
    let (state, _, _) = state();
    let app = test::init_service(App::new().app_data(state).configure(api::configure)).await;

    let requests = [
        test::TestRequest::get().uri("/api/orders/abc").to_request(),
        test::TestRequest::delete().uri("/api/orders/abc").to_request(),
        test::TestRequest::patch().uri("/api/orders/abc/status?status=READY").to_request(),
    ];

    for req in requests {
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["message"].is_string());
    }
}

#[actix_web::test]
async fn test_unknown_sort_direction_is_400() {
    let (state, _, _) = state();
    let app = test::init_service(App::new().app_data(state).configure(api::configure)).await;

    let req = test::TestRequest::get().uri("/api/orders?sort=createdAt,sideways").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn test_range_is_inclusive_and_ordered() {
    let (state, _, _) = state();
    let app = test::init_service(App::new().app_data(state).configure(api::configure)).await;

    let mut created_at = Vec::new();
    for _ in 0..3 {
        let req = test::TestRequest::post().uri("/api/orders").set_json(kim_order()).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        created_at.push(body["data"]["createdAt"].as_str().unwrap().replace('+', "%2B"));
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let uri = format!("/api/orders/range?start={}&end={}", created_at[0], created_at[1]);
    let req = test::TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["id"], 1);
    assert_eq!(body["data"][1]["id"], 2);

    let uri = format!("/api/orders/range?start={}&end={}", created_at[2], created_at[0]);
    let req = test::TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "start must not be after end");

    let req = test::TestRequest::get().uri("/api/orders/range?start=yesterday&end=today").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
}
