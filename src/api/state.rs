use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::db::{
    Cache, CatalogReader, CatalogWriter, GameStore, HistoryReader, HistoryWriter,
    InMemoryGameStore, InMemoryMediaStore, PgGameStore, PgMediaStore, RentalLedger,
    SimilarityStoreIo,
};
use crate::error::{AppError, AppResult};
use crate::services::{
    CatalogService, GameStatsService, RecommendationService, RentalService, SimilarityService,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub similarity: Arc<SimilarityService>,
    pub rentals: Arc<RentalService>,
    pub recommendations: Arc<RecommendationService>,
    pub game_stats: Arc<GameStatsService>,
    rng: Arc<Mutex<StdRng>>,
}

impl AppState {
    /// State backed by in-process stores; nothing survives a restart
    pub fn in_memory(config: &Config) -> Self {
        Self::from_stores(
            Arc::new(InMemoryMediaStore::new()),
            Arc::new(InMemoryGameStore::new()),
            config,
            None,
        )
    }

    /// State backed by Postgres, with optional Redis caching of similarity queries
    pub fn postgres(pool: PgPool, config: &Config, cache: Option<Cache>) -> Self {
        Self::from_stores(
            Arc::new(PgMediaStore::new(pool.clone())),
            Arc::new(PgGameStore::new(pool)),
            config,
            cache,
        )
    }

    fn from_stores<M, G>(media: Arc<M>, games: Arc<G>, config: &Config, cache: Option<Cache>) -> Self
    where
        M: CatalogReader + CatalogWriter + SimilarityStoreIo + HistoryReader + HistoryWriter + 'static,
        G: GameStore + RentalLedger + HistoryReader + 'static,
    {
        let mut similarity = SimilarityService::new(
            media.clone(),
            media.clone(),
            config.edge_policy,
            config.min_similarity_score,
        )
        .with_build_concurrency(config.max_db_connections as usize);
        if let Some(cache) = cache {
            similarity = similarity.with_cache(cache, config.similar_cache_ttl);
        }

        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            catalog: Arc::new(CatalogService::new(
                media.clone(),
                media.clone(),
                media.clone(),
                media,
            )),
            similarity: Arc::new(similarity),
            rentals: Arc::new(RentalService::new(games.clone(), games.clone())),
            recommendations: Arc::new(RecommendationService::new(
                games.clone(),
                games.clone(),
                config.recommendation_limit,
            )),
            game_stats: Arc::new(GameStatsService::new(games)),
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// A generator for one request, split off the shared one.
    ///
    /// With a configured seed the sequence of requests is reproducible.
    pub async fn request_rng(&self) -> AppResult<StdRng> {
        let mut shared = self.rng.lock().await;
        StdRng::from_rng(&mut *shared)
            .map_err(|e| AppError::Internal(format!("Failed to derive generator: {}", e)))
    }
}
