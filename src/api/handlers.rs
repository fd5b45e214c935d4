use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::models::{
    BuildReport, Game, HistoryEntry, Item, ItemId, NewGame, Recommendation, RentOutcome,
    ReturnOutcome, SimilarItem, NO_HISTORY_MESSAGE,
};
use crate::services::RatedGame;

use super::AppState;

/// Threshold used by the top-rated listing when the query does not give one
const DEFAULT_TOP_RATED_SCORE: f64 = 8.5;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub title: String,
    pub year: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct MinScoreQuery {
    pub min_score: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SimilarItemsResponse {
    pub item_id: ItemId,
    pub min_score: f64,
    pub similar: Vec<SimilarItem>,
}

#[derive(Debug, Deserialize)]
pub struct RecordViewRequest {
    pub item_id: ItemId,
}

#[derive(Debug, Serialize)]
pub struct TitleLengthResponse {
    pub user_id: String,
    pub total_title_length: usize,
}

#[derive(Debug, Serialize)]
pub struct ImportGamesResponse {
    pub submitted: usize,
    pub inserted: usize,
}

#[derive(Debug, Deserialize)]
pub struct RentRequest {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct RentalResponse<O> {
    pub title: String,
    pub outcome: O,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub user_id: String,
    #[serde(flatten)]
    pub recommendation: Recommendation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl RecommendationResponse {
    fn new(user_id: String, recommendation: Recommendation) -> Self {
        let message = match recommendation {
            Recommendation::NoHistory => Some(NO_HISTORY_MESSAGE),
            Recommendation::NothingToRecommend => Some("Nothing to recommend"),
            Recommendation::Titles { .. } => None,
        };
        Self {
            user_id,
            recommendation,
            message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DecrementResponse {
    pub platform: String,
    pub updated: u64,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// List catalog items, optionally only the first `limit` by id
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListItemsQuery>,
) -> AppResult<Json<Vec<Item>>> {
    let items = match query.limit {
        Some(limit) => state.catalog.top_n_items(limit).await?,
        None => state.catalog.list_items().await?,
    };
    Ok(Json(items))
}

pub async fn create_item(
    State(state): State<AppState>,
    Json(request): Json<CreateItemRequest>,
) -> AppResult<(StatusCode, Json<Item>)> {
    let item = state.catalog.create_item(&request.title, request.year).await?;
    state.similarity.invalidate().await;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> AppResult<Json<Item>> {
    Ok(Json(state.catalog.get_item(id).await?))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
    Json(request): Json<UpdateItemRequest>,
) -> AppResult<Json<Item>> {
    let item = state.catalog.update_title(id, &request.title).await?;
    // Cached results carry titles
    state.similarity.invalidate().await;
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> AppResult<StatusCode> {
    state.catalog.delete_item(id).await?;
    state.similarity.invalidate().await;
    Ok(StatusCode::NO_CONTENT)
}

/// Items similar to `id`, ascending by score
pub async fn similar_items(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
    Query(query): Query<MinScoreQuery>,
) -> AppResult<Json<SimilarItemsResponse>> {
    let min_score = query
        .min_score
        .unwrap_or_else(|| state.similarity.default_min_score());
    let similar = state.similarity.top_similar(id, Some(min_score)).await?;
    Ok(Json(SimilarItemsResponse {
        item_id: id,
        min_score,
        similar,
    }))
}

/// Recompute the similarity matrix over the whole catalog
pub async fn build_similarity(State(state): State<AppState>) -> AppResult<Json<BuildReport>> {
    Ok(Json(state.similarity.rebuild().await?))
}

pub async fn record_view(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<RecordViewRequest>,
) -> AppResult<(StatusCode, Json<HistoryEntry>)> {
    let entry = state.catalog.record_view(&user_id, request.item_id).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn title_length(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<TitleLengthResponse>> {
    let total_title_length = state.catalog.sum_title_length(&user_id).await?;
    Ok(Json(TitleLengthResponse {
        user_id,
        total_title_length,
    }))
}

pub async fn list_games(State(state): State<AppState>) -> AppResult<Json<Vec<Game>>> {
    Ok(Json(state.game_stats.list_games().await?))
}

/// Bulk import; titles already in the catalog are skipped
pub async fn import_games(
    State(state): State<AppState>,
    Json(games): Json<Vec<NewGame>>,
) -> AppResult<(StatusCode, Json<ImportGamesResponse>)> {
    let submitted = games.len();
    let inserted = state.game_stats.import_games(games).await?;
    Ok((
        StatusCode::CREATED,
        Json(ImportGamesResponse {
            submitted,
            inserted,
        }),
    ))
}

pub async fn top_rated(
    State(state): State<AppState>,
    Query(query): Query<MinScoreQuery>,
) -> AppResult<Json<Vec<RatedGame>>> {
    let min_score = query.min_score.unwrap_or(DEFAULT_TOP_RATED_SCORE);
    Ok(Json(state.game_stats.top_rated(min_score).await?))
}

pub async fn rent_game(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<RentRequest>,
) -> AppResult<(StatusCode, Json<RentalResponse<RentOutcome>>)> {
    let outcome = state.rentals.rent(&user_id, &request.title).await?;
    let status = match outcome {
        RentOutcome::Rented => StatusCode::OK,
        RentOutcome::AlreadyRented => StatusCode::CONFLICT,
        RentOutcome::NotFound => StatusCode::NOT_FOUND,
    };
    Ok((
        status,
        Json(RentalResponse {
            message: outcome.message(&request.title),
            title: request.title,
            outcome,
        }),
    ))
}

pub async fn return_game(
    State(state): State<AppState>,
    Path((user_id, title)): Path<(String, String)>,
) -> AppResult<(StatusCode, Json<RentalResponse<ReturnOutcome>>)> {
    let outcome = state.rentals.return_game(&user_id, &title).await?;
    let status = match outcome {
        ReturnOutcome::Returned => StatusCode::OK,
        ReturnOutcome::NotRentedByYou => StatusCode::CONFLICT,
        ReturnOutcome::NotFound => StatusCode::NOT_FOUND,
    };
    Ok((
        status,
        Json(RentalResponse {
            message: outcome.message(&title),
            title,
            outcome,
        }),
    ))
}

pub async fn recommend_by_genre(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<RecommendationResponse>> {
    let mut rng = state.request_rng().await?;
    let recommendation = state
        .recommendations
        .recommend_by_genre(&user_id, &mut rng)
        .await?;
    Ok(Json(RecommendationResponse::new(user_id, recommendation)))
}

pub async fn recommend_by_name(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<RecommendationResponse>> {
    let mut rng = state.request_rng().await?;
    let recommendation = state
        .recommendations
        .recommend_by_name(&user_id, &mut rng)
        .await?;
    Ok(Json(RecommendationResponse::new(user_id, recommendation)))
}

pub async fn decrement_scores(
    State(state): State<AppState>,
    Path(platform): Path<String>,
) -> AppResult<Json<DecrementResponse>> {
    let updated = state.game_stats.decrement_scores(&platform).await?;
    Ok(Json(DecrementResponse { platform, updated }))
}

pub async fn average_scores(
    State(state): State<AppState>,
) -> AppResult<Json<BTreeMap<String, f64>>> {
    Ok(Json(state.game_stats.average_score_per_platform().await?))
}

pub async fn genre_distribution(
    State(state): State<AppState>,
) -> AppResult<Json<BTreeMap<String, usize>>> {
    Ok(Json(state.game_stats.genre_distribution().await?))
}
