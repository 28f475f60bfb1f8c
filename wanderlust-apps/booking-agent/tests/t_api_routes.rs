//!  Wanderlust Booking Agent
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! HTTP API tests over the catalog fixture
//!
//! Requests go straight into the router through `tower::ServiceExt::oneshot`,
//! except for the remote catalog client and the per-client rate limit, which
//! need a listening socket.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::NaiveDate;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceExt;
use wanderlust_booking_agent::{
    AppState, BookingConversation, Catalog, CheckoutGateway, FlowContext, HttpCatalog,
    InMemoryCatalog, LocalCheckoutGateway, PageRequest, SearchFilter, StepId, api_schemas,
    rate_limit, router,
};

fn load_catalog() -> Arc<InMemoryCatalog> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/catalog.json");
    let raw = std::fs::read_to_string(&path).expect("Failed to read catalog fixture");
    Arc::new(InMemoryCatalog::from_json(&raw).expect("Failed to parse catalog fixture"))
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date")
}

fn app_with(checkout: Arc<dyn CheckoutGateway>) -> Router {
    let state = AppState::new(load_catalog(), checkout).with_today(today());
    router(Arc::new(state))
}

fn app() -> Router {
    app_with(Arc::new(LocalCheckoutGateway::new()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is not JSON")
    };
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

fn validate_json_schema(instance: &Value, schema_name: &str) {
    let schemas = api_schemas();
    let schema = &schemas[schema_name];
    assert!(schema.is_object(), "no schema named {schema_name}");
    let validator = jsonschema::Validator::new(schema)
        .unwrap_or_else(|e| panic!("Failed to create validator for {schema_name}: {e}"));
    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|e| format!("{schema_name}: {e}"))
        .collect();
    assert!(errors.is_empty(), "Schema validation failed:\n{}", errors.join("\n"));
}

fn hotel_ids(page: &Value) -> Vec<&str> {
    page["data"]
        .as_array()
        .expect("data array")
        .iter()
        .filter_map(|h| h["id"].as_str())
        .collect()
}

#[tokio::test]
async fn test_hotel_search_response_matches_schema() {
    let app = app();
    let (status, body) = get(&app, "/api/user/home/search?destination=Goa&page=2").await;
    assert_eq!(status, StatusCode::OK);
    validate_json_schema(&body, "HotelSearchResponse");
    assert_eq!(body["pagination"], json!({ "total": 12, "page": 2, "pages": 3 }));
    assert_eq!(
        hotel_ids(&body),
        vec!["goa-06", "goa-07", "goa-08", "goa-09", "goa-10"]
    );
}

#[tokio::test]
async fn test_hotel_search_reads_repeated_keys() {
    let app = app();
    let (status, body) = get(
        &app,
        "/api/user/home/search?stars%5B%5D=5&stars%5B%5D=4&facilities=Free%20WiFi&sortOption=pricePerNightAsc&page=-3",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(
        hotel_ids(&body),
        vec!["paris-01", "goa-01", "goa-04", "goa-07", "goa-10"]
    );
}

#[tokio::test]
async fn test_restaurant_search_and_details() {
    let app = app();
    let (status, body) = get(&app, "/api/user/home/restaurants/search?destination=India").await;
    assert_eq!(status, StatusCode::OK);
    validate_json_schema(&body, "RestaurantSearchResponse");
    assert_eq!(body["pagination"]["total"], 3);

    let (status, body) = get(&app, "/api/user/home/restaurants/r-jaipur-01").await;
    assert_eq!(status, StatusCode::OK);
    validate_json_schema(&body, "Restaurant");
    assert_eq!(body["foodItems"][0]["item"], "Royal Thali");

    let (status, _) = get(&app, "/api/user/home/restaurants/r-goa-blocked").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blocked_hotel_details_are_not_found() {
    let app = app();
    let (status, body) = get(&app, "/api/user/home/paris-01").await;
    assert_eq!(status, StatusCode::OK);
    validate_json_schema(&body, "Hotel");
    assert_eq!(body["name"], "Left Bank Hotel");
    assert_eq!(body["roomTypes"][1]["type"], "King");

    let (status, body) = get(&app, "/api/user/home/goa-blocked").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_admin_block_hides_hotel_from_search() {
    let app = app();
    let (status, body) = send(&app, Method::PUT, "/api/admin/hotels/goa-01/block", None).await;
    assert_eq!(status, StatusCode::OK);
    validate_json_schema(&body, "BlockStatus");
    assert_eq!(body, json!({ "id": "goa-01", "isBlocked": true }));

    let (_, search) = get(&app, "/api/user/home/search?destination=Goa").await;
    assert_eq!(search["pagination"]["total"], 11);
    assert!(!hotel_ids(&search).contains(&"goa-01"));
    let (status, _) = get(&app, "/api/user/home/goa-01").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&app, Method::PUT, "/api/admin/hotels/goa-01/unblock", None).await;
    let (_, search) = get(&app, "/api/user/home/search?destination=Goa").await;
    assert_eq!(search["pagination"]["total"], 12);

    let (status, _) = send(&app, Method::PUT, "/api/admin/restaurants/r-goa-blocked/unblock", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&app, "/api/user/home/restaurants/r-goa-blocked").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::PUT, "/api/admin/hotels/nope/block", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_quote_uses_form_total() {
    let app = app();
    let request = json!({
        "hotelId": "goa-02",
        "roomType": "Double",
        "roomCount": 2,
        "checkIn": "2026-03-10",
        "checkOut": "2026-03-13"
    });
    let (status, body) = send(&app, Method::POST, "/api/user/booking/quote", Some(request)).await;
    assert_eq!(status, StatusCode::OK);
    validate_json_schema(&body, "QuoteResponse");
    assert_eq!(body, json!({ "roomPrice": 1700.0, "nightsPerStay": 3, "totalCost": 10200.0 }));

    let same_day = json!({
        "hotelId": "goa-02",
        "roomType": "Double",
        "roomCount": 2,
        "checkIn": "2026-03-10",
        "checkOut": "2026-03-10"
    });
    let (_, body) = send(&app, Method::POST, "/api/user/booking/quote", Some(same_day)).await;
    assert_eq!(body["totalCost"], 3400.0);

    let unknown = json!({
        "hotelId": "goa-blocked",
        "roomType": "Double",
        "roomCount": 1,
        "checkIn": "2026-03-10",
        "checkOut": "2026-03-11"
    });
    let (status, _) = send(&app, Method::POST, "/api/user/booking/quote", Some(unknown)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn restaurant_checkout(restaurant_id: &str) -> Value {
    json!({
        "kind": "restaurant",
        "userName": "Ravi",
        "restaurantId": restaurant_id,
        "dateOfBooking": "2026-03-02",
        "guestCount": 3,
        "foodItem": "Masala Chai",
        "foodPrice": 33.75,
        "foodCount": 100
    })
}

#[tokio::test]
async fn test_checkout_hands_off_to_gateway() {
    let gateway = Arc::new(LocalCheckoutGateway::new());
    let app = app_with(gateway.clone());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/user/booking/checkout",
        Some(restaurant_checkout("r-goa-02")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    validate_json_schema(&body, "CheckoutSession");
    assert!(body["sessionId"].as_str().is_some_and(|id| id.starts_with("cs_local_")));
    assert_eq!(gateway.submitted().await.len(), 1);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/user/booking/checkout",
        Some(restaurant_checkout("r-goa-blocked")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(gateway.submitted().await.len(), 1);
}

#[tokio::test]
async fn test_checkout_failure_is_bad_gateway() {
    let app = app_with(Arc::new(LocalCheckoutGateway::unavailable()));
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/user/booking/checkout",
        Some(restaurant_checkout("r-goa-02")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["message"], "Requirement unavailable");
}

#[tokio::test]
async fn test_register_reports_every_invalid_field() {
    let app = app();
    let bad = json!({
        "email": "not-an-email",
        "mobile": "9876543210",
        "password": "abc",
        "firstName": "Asha",
        "lastName": "Rao"
    });
    let (status, body) = send(&app, Method::POST, "/api/user/register", Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    validate_json_schema(&body, "ValidationErrors");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .expect("errors array")
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["email", "password"]);
}

#[tokio::test]
async fn test_register_then_duplicate_conflicts() {
    let app = app();
    let user = json!({
        "email": "Asha@Example.com",
        "mobile": "9876543210",
        "password": "secret123",
        "firstName": "Asha",
        "lastName": "Rao"
    });
    let (status, body) = send(&app, Method::POST, "/api/user/register", Some(user.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    validate_json_schema(&body, "UserProfile");
    assert_eq!(body["email"], "asha@example.com");
    assert_eq!(body["role"], json!(["user"]));
    assert_eq!(body["isBlocked"], false);
    assert!(body.get("password").is_none());

    let mut again = user;
    again["email"] = json!("asha@example.com");
    let (status, _) = send(&app, Method::POST, "/api/user/register", Some(again)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_malformed_body_is_a_validation_error() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/user/register")
        .header("content-type", "application/json")
        .body(Body::from("{\"email\":"))
        .expect("request");
    let response = app.oneshot(request).await.expect("router is infallible");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body: Value = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(body["errors"][0]["field"], "body");
}

#[tokio::test]
async fn test_chatbot_session_lifecycle() {
    let app = app();
    let (status, started) = send(&app, Method::POST, "/api/user/chatbot/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    validate_json_schema(&started, "ConversationStarted");
    assert_eq!(started["prompts"][0]["step"], "start");
    assert_eq!(started["prompts"][0]["input"], "text");
    let id = started["sessionId"].as_str().expect("session id").to_string();
    let uri = format!("/api/user/chatbot/sessions/{id}");

    let (status, reply) = send(&app, Method::POST, &uri, Some(json!({ "input": "Asha" }))).await;
    assert_eq!(status, StatusCode::OK);
    validate_json_schema(&reply, "ConversationReply");
    assert_eq!(reply["prompts"][0]["step"], "selectBooking");
    assert_eq!(reply["closed"], false);

    for input in ["Hotel", "Goa", "Cancel Booking"] {
        send(&app, Method::POST, &uri, Some(json!({ "input": input }))).await;
    }
    let (_, reply) = send(&app, Method::POST, &uri, Some(json!({ "input": "Quit" }))).await;
    assert_eq!(reply["closed"], true);
    assert_eq!(reply["prompts"], json!([]));

    let (status, _) = send(&app, Method::POST, &uri, Some(json!({ "input": "Continue" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "quitting removes the session");
}

#[tokio::test]
async fn test_chatbot_session_can_be_ended() {
    let app = app();
    let (_, started) = send(&app, Method::POST, "/api/user/chatbot/sessions", None).await;
    let uri = format!(
        "/api/user/chatbot/sessions/{}",
        started["sessionId"].as_str().expect("session id")
    );

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_docs_list_every_payload() {
    let app = app();
    let (status, body) = get(&app, "/api/docs").await;
    assert_eq!(status, StatusCode::OK);
    for name in [
        "HotelSearchResponse",
        "RestaurantSearchResponse",
        "QuoteRequest",
        "PaymentData",
        "ConversationReply",
        "RegistrationRequest",
        "ChatFrame",
    ] {
        assert!(body[name].is_object(), "missing schema {name}");
    }
}

#[tokio::test]
async fn test_remote_catalog_drives_a_conversation() {
    let state = AppState::new(load_catalog(), Arc::new(LocalCheckoutGateway::new()));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router(Arc::new(state))).await.ok();
    });

    let remote = Arc::new(HttpCatalog::new(&format!("http://{addr}"), 5).expect("client"));
    let goa = remote
        .search_hotels(&SearchFilter::for_destination("Goa"), PageRequest::new(3))
        .await
        .expect("remote search");
    assert_eq!(goa.pagination.total, 12);
    assert_eq!(goa.data.len(), 2);
    assert!(remote.hotel("goa-blocked").await.expect("lookup").is_none());
    assert!(remote.restaurant("r-goa-01").await.expect("lookup").is_some());

    let ctx = FlowContext::new(today());
    let mut conv = BookingConversation::new(remote, Arc::new(LocalCheckoutGateway::new()), ctx);
    for input in ["Asha", "Hotel"] {
        conv.submit(input).await.expect("submit");
    }
    let prompts = conv.submit("paris").await.expect("submit");
    assert_eq!(prompts[0].step, StepId::ListHotels);
    assert_eq!(prompts[0].options[0], "Left Bank Hotel");
}

fn session_state(idle: Duration, max_sessions: usize) -> Arc<AppState> {
    let state = AppState::new(load_catalog(), Arc::new(LocalCheckoutGateway::new()))
        .with_today(today())
        .with_session_limits(idle, max_sessions);
    Arc::new(state)
}

#[tokio::test(start_paused = true)]
async fn test_idle_conversations_are_evicted() {
    let state = session_state(Duration::from_secs(60), 100);
    let app = router(state.clone());
    let (idle, _) = state.open_conversation().await;
    let (_, started) = send(&app, Method::POST, "/api/user/chatbot/sessions", None).await;
    let active = started["sessionId"].as_str().expect("session id").to_string();

    tokio::time::advance(Duration::from_secs(45)).await;
    let uri = format!("/api/user/chatbot/sessions/{active}");
    let (status, _) = send(&app, Method::POST, &uri, Some(json!({ "input": "Asha" }))).await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::advance(Duration::from_secs(30)).await;
    assert_eq!(state.evict_idle_sessions().await, 1);
    assert_eq!(state.session_count().await, 1);
    assert!(state.conversation(&idle).await.is_none());

    let idle_uri = format!("/api/user/chatbot/sessions/{idle}");
    let (status, _) = send(&app, Method::POST, &idle_uri, Some(json!({ "input": "Asha" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, reply) = send(&app, Method::POST, &uri, Some(json!({ "input": "Hotel" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["prompts"][0]["step"], "searchHotel");
}

#[tokio::test(start_paused = true)]
async fn test_session_sweeper_stops_on_shutdown() {
    let state = session_state(Duration::from_secs(10), 100);
    state.open_conversation().await;
    state.open_conversation().await;
    let sweeper = tokio::spawn(state.clone().sweep_sessions(Duration::from_secs(5)));

    tokio::time::sleep(Duration::from_secs(8)).await;
    assert_eq!(state.session_count().await, 2);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(state.session_count().await, 0);

    state.shutdown.cancel();
    sweeper.await.expect("sweeper task panicked");
}

#[tokio::test(start_paused = true)]
async fn test_full_session_store_evicts_least_recently_active() {
    let state = session_state(Duration::from_secs(600), 2);
    let (first, _) = state.open_conversation().await;
    tokio::time::advance(Duration::from_secs(1)).await;
    let (second, _) = state.open_conversation().await;
    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(state.conversation(&first).await.is_some());
    tokio::time::advance(Duration::from_secs(1)).await;

    let (third, _) = state.open_conversation().await;
    assert_eq!(state.session_count().await, 2);
    assert!(state.conversation(&second).await.is_none());
    assert!(state.conversation(&first).await.is_some());
    assert!(state.conversation(&third).await.is_some());
}

#[tokio::test]
async fn test_rate_limit_refuses_a_client_over_quota() {
    let state = AppState::new(load_catalog(), Arc::new(LocalCheckoutGateway::new())).with_today(today());
    let limits = rate_limit(3, Duration::from_secs(3600)).expect("rate limit");
    let app = wanderlust_booking_agent::app(Arc::new(state), None, 16, limits);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .ok();
    });

    let client = wreq::Client::builder().build().expect("client");
    let url = format!("http://{addr}/api/user/home/search?destination=goa");
    for _ in 0..3 {
        let response = client.get(&url).send().await.expect("request");
        assert_eq!(response.status().as_u16(), 200);
        let headers = response.headers();
        assert!(headers.contains_key("x-ratelimit-remaining"), "{headers:?}");
        assert_eq!(
            headers.get("x-content-type-options").and_then(|v| v.to_str().ok()),
            Some("nosniff")
        );
        assert_eq!(
            headers.get("x-frame-options").and_then(|v| v.to_str().ok()),
            Some("SAMEORIGIN")
        );
    }

    let response = client.get(&url).send().await.expect("request");
    assert_eq!(response.status().as_u16(), 429);
    assert_eq!(
        response
            .headers()
            .get("x-content-type-options")
            .and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );
}

#[test]
fn test_rate_limit_needs_a_usable_refill() {
    assert!(rate_limit(0, Duration::from_secs(900)).is_err());
    assert!(rate_limit(100, Duration::ZERO).is_err());
    assert!(rate_limit(100, Duration::from_secs(900)).is_ok());
}
