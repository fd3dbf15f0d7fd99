use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use application::{
    DeckDto, MessageDto, SendMessageRequest, SwipeRequest, SwipeResultDto, ThreadDto,
};
use domain::SwipeDirection;

use crate::{error::ApiError, state::AppState, ws};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeckQuery {
    user_id: String,
    #[serde(default)]
    refresh: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwipePayload {
    user_id: String,
    card_id: Uuid,
    direction: SwipeDirection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FavoritePayload {
    user_id: String,
    listing_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct ThreadsQuery {
    email: String,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    user1: String,
    user2: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessagePayload {
    from_email: String,
    to_email: String,
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarkReadPayload {
    from_email: String,
    to_email: String,
}

#[derive(Debug, Serialize)]
struct MarkReadResponse {
    updated: u64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/swipecards", get(get_deck))
        .route("/swipecards/swipe", post(swipe))
        .route("/favorites/{user_id}", get(list_favorites))
        .route("/favorites", post(add_favorite).delete(remove_favorite))
        .route("/chat/threads", get(get_threads))
        .route("/chat/messages", get(get_history))
        .route("/chat/message", post(send_message))
        .route("/chat/read", post(mark_read))
        .route("/ws", get(ws::websocket_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn get_deck(
    State(state): State<AppState>,
    Query(query): Query<DeckQuery>,
) -> Result<Json<DeckDto>, ApiError> {
    let deck = state
        .deck_service
        .get_deck(query.user_id, query.refresh)
        .await?;
    Ok(Json(deck))
}

async fn swipe(
    State(state): State<AppState>,
    Json(payload): Json<SwipePayload>,
) -> Result<Json<SwipeResultDto>, ApiError> {
    let result = state
        .deck_service
        .swipe(SwipeRequest {
            user_id: payload.user_id,
            card_id: payload.card_id,
            direction: payload.direction,
        })
        .await?;
    Ok(Json(result))
}

async fn list_favorites(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Uuid>>, ApiError> {
    let ids = state.deck_service.list_favorites(user_id).await?;
    Ok(Json(ids))
}

async fn add_favorite(
    State(state): State<AppState>,
    Json(payload): Json<FavoritePayload>,
) -> Result<StatusCode, ApiError> {
    state
        .deck_service
        .add_favorite(payload.user_id, payload.listing_id)
        .await?;
    Ok(StatusCode::CREATED)
}

async fn remove_favorite(
    State(state): State<AppState>,
    Json(payload): Json<FavoritePayload>,
) -> Result<StatusCode, ApiError> {
    state
        .deck_service
        .remove_favorite(payload.user_id, payload.listing_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_threads(
    State(state): State<AppState>,
    Query(query): Query<ThreadsQuery>,
) -> Result<Json<Vec<ThreadDto>>, ApiError> {
    let threads = state.chat_service.threads(query.email).await?;
    Ok(Json(threads))
}

async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let messages = state.chat_service.history(query.user1, query.user2).await?;
    Ok(Json(messages))
}

async fn send_message(
    State(state): State<AppState>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    let message = state
        .chat_service
        .send(SendMessageRequest {
            from_email: payload.from_email,
            to_email: payload.to_email,
            content: payload.content,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn mark_read(
    State(state): State<AppState>,
    Json(payload): Json<MarkReadPayload>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let updated = state
        .chat_service
        .mark_read(payload.from_email, payload.to_email)
        .await?;
    Ok(Json(MarkReadResponse { updated }))
}
