use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Media catalog
        .route("/items", get(handlers::list_items).post(handlers::create_item))
        .route(
            "/items/:id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route("/items/:id/similar", get(handlers::similar_items))
        .route("/similarity/build", post(handlers::build_similarity))
        // View history
        .route("/users/:user_id/history", post(handlers::record_view))
        .route("/users/:user_id/title-length", get(handlers::title_length))
        // Games
        .route("/games", get(handlers::list_games).post(handlers::import_games))
        .route("/games/top-rated", get(handlers::top_rated))
        // Rentals and recommendations
        .route("/users/:user_id/rentals", post(handlers::rent_game))
        .route("/users/:user_id/rentals/:title", delete(handlers::return_game))
        .route(
            "/users/:user_id/recommendations/genre",
            get(handlers::recommend_by_genre),
        )
        .route(
            "/users/:user_id/recommendations/name",
            get(handlers::recommend_by_name),
        )
        // Statistics
        .route("/platforms/:platform/decrement", post(handlers::decrement_scores))
        .route("/platforms/average-scores", get(handlers::average_scores))
        .route("/genres/distribution", get(handlers::genre_distribution))
}
