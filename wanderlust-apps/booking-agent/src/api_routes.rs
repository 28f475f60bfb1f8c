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

//! # HTTP API
//!
//! Search, listing details, quotes, checkout, the booking assistant, registration,
//! admin blocking and the live-chat socket, routed with axum.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use http::header::{CONTENT_TYPE, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS};
use http::{HeaderName, HeaderValue, Method};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower::limit::GlobalConcurrencyLimitLayer;
use governor::middleware::StateInformationMiddleware;
use tower_governor::GovernorLayer;
use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::api_docs::docs;
use crate::api_error::ApiError;
use crate::api_state::SharedState;
use crate::booking_flow_prompts::Prompt;
use crate::booking_price::HotelQuote;
use crate::catalog::{Catalog, Hotel, Restaurant};
use crate::checkout::{CheckoutSession, PaymentData};
use crate::live_chat::live_chat_ws;
use crate::pagination::{PageRequest, PageResult};
use crate::search_query_builder::SearchFilter;
use crate::validation::{FieldError, RegistrationRequest, UserProfile};

#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub hotel_id: String,
    pub room_type: String,
    pub room_count: u32,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
pub struct ChatInput {
    pub input: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationStarted {
    pub session_id: String,
    pub prompts: Vec<Prompt>,
}

#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationReply {
    pub prompts: Vec<Prompt>,
    pub closed: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlockStatus {
    pub id: String,
    pub is_blocked: bool,
}

type Pairs = Query<Vec<(String, String)>>;

fn pairs(params: &[(String, String)]) -> impl Iterator<Item = (&str, &str)> + Clone {
    params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
}

/// Routes without the outer middleware, as driven by tests
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/user/home/search", get(search_hotels))
        .route("/api/user/home/restaurants/search", get(search_restaurants))
        .route("/api/user/home/restaurants/:restaurant_id", get(restaurant_details))
        .route("/api/user/home/:hotel_id", get(hotel_details))
        .route("/api/user/booking/quote", post(quote))
        .route("/api/user/booking/checkout", post(checkout))
        .route("/api/user/chatbot/sessions", post(start_conversation))
        .route(
            "/api/user/chatbot/sessions/:session_id",
            post(reply).delete(end_conversation),
        )
        .route("/api/user/register", post(register))
        .route("/api/admin/hotels/:id/block", put(block_hotel))
        .route("/api/admin/hotels/:id/unblock", put(unblock_hotel))
        .route("/api/admin/restaurants/:id/block", put(block_restaurant))
        .route("/api/admin/restaurants/:id/unblock", put(unblock_restaurant))
        .route("/api/user/live-chat/ws", get(live_chat_ws))
        .route("/api/docs", get(docs))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Per peer IP quota, answered with 429 and `x-ratelimit-*` headers once spent
pub type RateLimit = GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// `requests` per `window` for each client IP, refilled evenly over the window.
///
/// The server must be served with `into_make_service_with_connect_info::<SocketAddr>()`
/// so the peer address is known.
pub fn rate_limit(requests: u32, window: Duration) -> anyhow::Result<Arc<RateLimit>> {
    let refill = window
        .checked_div(requests)
        .filter(|period| !period.is_zero())
        .context("Rate limit window is too short for the request count")?;
    let config = GovernorConfigBuilder::default()
        .period(refill)
        .burst_size(requests)
        .use_headers()
        .finish()
        .context("Invalid rate limit")?;
    Ok(Arc::new(config))
}

/// Full application: routes plus security headers, CORS, rate and concurrency limits
pub fn app(
    state: SharedState,
    frontend_url: Option<&str>,
    max_concurrency: usize,
    rate_limit: Arc<RateLimit>,
) -> Router {
    router(state).layer(
        ServiceBuilder::new()
            .layer(SetResponseHeaderLayer::if_not_present(
                X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                X_FRAME_OPTIONS,
                HeaderValue::from_static("SAMEORIGIN"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                REFERRER_POLICY,
                HeaderValue::from_static("no-referrer"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("cross-origin-opener-policy"),
                HeaderValue::from_static("same-origin"),
            ))
            .layer(cors_layer(frontend_url))
            .layer(GovernorLayer { config: rate_limit })
            .layer(GlobalConcurrencyLimitLayer::new(max_concurrency)),
    )
}

fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    let origin = frontend_url.and_then(|url| match url.trim_end_matches('/').parse::<HeaderValue>() {
        Ok(origin) => Some(origin),
        Err(e) => {
            tracing::warn!("Ignoring unusable frontend URL {:?}: {}", url, e);
            None
        }
    });
    match origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([CONTENT_TYPE])
            .max_age(Duration::from_secs(60 * 60)),
        None => CorsLayer::permissive(),
    }
}

async fn search_hotels(
    State(state): State<SharedState>,
    Query(params): Pairs,
) -> Result<Json<PageResult<Hotel>>, ApiError> {
    let filter = SearchFilter::from_query_pairs(pairs(&params));
    let page = PageRequest::from_query_pairs(pairs(&params));
    Ok(Json(state.catalog.search_hotels(&filter, page).await?))
}

async fn search_restaurants(
    State(state): State<SharedState>,
    Query(params): Pairs,
) -> Result<Json<PageResult<Restaurant>>, ApiError> {
    let filter = SearchFilter::from_query_pairs(pairs(&params));
    let page = PageRequest::from_query_pairs(pairs(&params));
    Ok(Json(state.catalog.search_restaurants(&filter, page).await?))
}

async fn hotel_details(
    State(state): State<SharedState>,
    Path(hotel_id): Path<String>,
) -> Result<Json<Hotel>, ApiError> {
    state
        .catalog
        .hotel(&hotel_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Hotel {hotel_id}")))
}

async fn restaurant_details(
    State(state): State<SharedState>,
    Path(restaurant_id): Path<String>,
) -> Result<Json<Restaurant>, ApiError> {
    state
        .catalog
        .restaurant(&restaurant_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Restaurant {restaurant_id}")))
}

async fn quote(
    State(state): State<SharedState>,
    payload: Result<Json<QuoteRequest>, JsonRejection>,
) -> Result<Json<HotelQuote>, ApiError> {
    let Json(request) = payload?;
    let hotel = state
        .catalog
        .hotel(&request.hotel_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Hotel {}", request.hotel_id)))?;
    let quote = HotelQuote::compute(
        &hotel,
        &request.room_type,
        request.room_count,
        request.check_in,
        request.check_out,
    );
    Ok(Json(HotelQuote {
        total_cost: quote.form_total(request.room_count),
        ..quote
    }))
}

async fn checkout(
    State(state): State<SharedState>,
    payload: Result<Json<PaymentData>, JsonRejection>,
) -> Result<Json<CheckoutSession>, ApiError> {
    let Json(payment) = payload?;
    let listed = match &payment {
        PaymentData::Hotel(h) => state.catalog.hotel(&h.hotel_id).await?.is_some(),
        PaymentData::Restaurant(r) => state.catalog.restaurant(&r.restaurant_id).await?.is_some(),
    };
    if !listed {
        return Err(ApiError::NotFound("Listing".to_string()));
    }
    let session = state.checkout.create_session(&payment).await?;
    Ok(Json(session))
}

async fn start_conversation(
    State(state): State<SharedState>,
) -> (StatusCode, Json<ConversationStarted>) {
    let (session_id, opening) = state.open_conversation().await;
    (
        StatusCode::CREATED,
        Json(ConversationStarted {
            session_id,
            prompts: vec![opening],
        }),
    )
}

async fn reply(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    payload: Result<Json<ChatInput>, JsonRejection>,
) -> Result<Json<ConversationReply>, ApiError> {
    let Json(ChatInput { input }) = payload?;
    let conversation = state
        .conversation(&session_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Conversation {session_id}")))?;
    // An input arriving while an effect is in flight is refused, not queued.
    let mut guard = conversation
        .try_lock()
        .map_err(|_| ApiError::ConversationBusy)?;
    let prompts = guard.submit(&input).await?;
    let closed = guard.is_closed();
    drop(guard);
    if closed {
        state.close_conversation(&session_id).await;
    }
    Ok(Json(ConversationReply { prompts, closed }))
}

async fn end_conversation(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.close_conversation(&session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Conversation {session_id}")))
    }
}

async fn register(
    State(state): State<SharedState>,
    payload: Result<Json<RegistrationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let Json(request) = payload?;
    request.validate().map_err(ApiError::Validation)?;
    let profile = request.into_profile();
    let mut users = state.users.write().await;
    if users.contains_key(&profile.email) {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }
    users.insert(profile.email.clone(), profile.clone());
    tracing::info!("Registered {}", profile.email);
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn set_hotel_blocked(
    state: &SharedState,
    id: String,
    is_blocked: bool,
) -> Result<Json<BlockStatus>, ApiError> {
    if state.catalog.set_hotel_blocked(&id, is_blocked).await {
        Ok(Json(BlockStatus { id, is_blocked }))
    } else {
        Err(ApiError::NotFound(format!("Hotel {id}")))
    }
}

async fn set_restaurant_blocked(
    state: &SharedState,
    id: String,
    is_blocked: bool,
) -> Result<Json<BlockStatus>, ApiError> {
    if state.catalog.set_restaurant_blocked(&id, is_blocked).await {
        Ok(Json(BlockStatus { id, is_blocked }))
    } else {
        Err(ApiError::NotFound(format!("Restaurant {id}")))
    }
}

async fn block_hotel(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<BlockStatus>, ApiError> {
    set_hotel_blocked(&state, id, true).await
}

async fn unblock_hotel(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<BlockStatus>, ApiError> {
    set_hotel_blocked(&state, id, false).await
}

async fn block_restaurant(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<BlockStatus>, ApiError> {
    set_restaurant_blocked(&state, id, true).await
}

async fn unblock_restaurant(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<BlockStatus>, ApiError> {
    set_restaurant_blocked(&state, id, false).await
}

/// Resolves on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
