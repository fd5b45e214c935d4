use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;

use crate::{
    cached,
    db::{Cache, CacheKey, CatalogReader, SimilarityStoreIo},
    error::{AppError, AppResult},
    models::{BuildReport, EdgePolicy, Item, SimilarItem, SimilarityEdge, UpsertOutcome},
    services::distance::{attribute_distance, max_year_distance},
};

/// Computes the pairwise similarity matrix over a catalog and writes it to a store
///
/// The catalog is fanned out one task per row: the task for item `i` handles
/// every pair `(i, j)` with `j` after `i`, so no two tasks write the same key.
/// At most `concurrency` rows run at once. Every upsert is atomic on its own,
/// which makes a failed build safe to rerun.
#[derive(Clone)]
pub struct SimilarityMatrixBuilder {
    store: Arc<dyn SimilarityStoreIo>,
    policy: EdgePolicy,
    concurrency: usize,
}

/// Rows built in parallel unless configured otherwise
pub const DEFAULT_BUILD_CONCURRENCY: usize = 4;

impl SimilarityMatrixBuilder {
    pub fn new(store: Arc<dyn SimilarityStoreIo>, policy: EdgePolicy) -> Self {
        Self {
            store,
            policy,
            concurrency: DEFAULT_BUILD_CONCURRENCY,
        }
    }

    /// Caps the number of rows in flight, usually at the store's connection count
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn build(&self, catalog: &[Item]) -> AppResult<BuildReport> {
        let started = Instant::now();
        let items: Arc<Vec<Item>> = Arc::new(catalog.to_vec());
        let max_distance = max_year_distance(&items).unwrap_or(0);

        let mut report = BuildReport {
            items: items.len(),
            ..BuildReport::default()
        };

        tracing::info!(
            items = items.len(),
            max_distance,
            policy = ?self.policy,
            concurrency = self.concurrency,
            "Starting similarity matrix build"
        );

        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = Vec::new();
        for row in 0..items.len().saturating_sub(1) {
            // Wait for a free slot before spawning so a large catalog does not
            // queue a task per row up front
            let permit = permits
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| AppError::Internal(format!("Build semaphore closed: {}", e)))?;
            let store = self.store.clone();
            let items = items.clone();
            let policy = self.policy;
            let task = tokio::spawn(async move {
                let _permit = permit;
                build_row(store.as_ref(), &items, row, max_distance, policy).await
            });
            tasks.push((row, task));
        }

        for (row, task) in tasks {
            match task.await {
                Ok(row_report) => report.merge(&row_report),
                Err(e) => {
                    let lost = items.len() - row - 1;
                    tracing::error!(error = %e, row, lost, "Similarity build task failed");
                    report.pairs += lost;
                    report.failed += lost;
                }
            }
        }

        tracing::info!(
            pairs = report.pairs,
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Similarity matrix build finished"
        );

        if report.failed > 0 {
            return Err(AppError::Internal(format!(
                "{} of {} similarity edges failed to persist; rerun the build to resume",
                report.failed, report.pairs
            )));
        }

        Ok(report)
    }
}

async fn build_row(
    store: &dyn SimilarityStoreIo,
    items: &[Item],
    row: usize,
    max_distance: u32,
    policy: EdgePolicy,
) -> BuildReport {
    let mut report = BuildReport::default();
    let anchor = &items[row];

    for other in &items[row + 1..] {
        if other.id() == anchor.id() {
            continue;
        }
        report.pairs += 1;

        match upsert_pair(store, anchor, other, max_distance, policy).await {
            Ok(outcome) => report.record(outcome),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    a = anchor.id(),
                    b = other.id(),
                    "Failed to upsert similarity edge"
                );
                report.failed += 1;
            }
        }
    }

    report
}

async fn upsert_pair(
    store: &dyn SimilarityStoreIo,
    a: &Item,
    b: &Item,
    max_distance: u32,
    policy: EdgePolicy,
) -> AppResult<UpsertOutcome> {
    // A catalog where every item shares a year has nothing to tell apart
    let score = if max_distance == 0 {
        1.0
    } else {
        attribute_distance(a, b, max_distance)?
    };
    let edge = SimilarityEdge::new(a.id(), b.id(), score)?;
    store.upsert_edge(edge, policy).await
}

/// Builds the similarity matrix on demand and answers similar-item queries
pub struct SimilarityService {
    catalog: Arc<dyn CatalogReader>,
    store: Arc<dyn SimilarityStoreIo>,
    builder: SimilarityMatrixBuilder,
    cache: Option<Cache>,
    cache_ttl: u64,
    default_min_score: f64,
}

impl SimilarityService {
    pub fn new(
        catalog: Arc<dyn CatalogReader>,
        store: Arc<dyn SimilarityStoreIo>,
        policy: EdgePolicy,
        default_min_score: f64,
    ) -> Self {
        Self {
            catalog,
            builder: SimilarityMatrixBuilder::new(store.clone(), policy),
            store,
            cache: None,
            cache_ttl: 0,
            default_min_score,
        }
    }

    /// Caches query results in Redis for `ttl` seconds
    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    pub fn with_build_concurrency(mut self, concurrency: usize) -> Self {
        self.builder = self.builder.with_concurrency(concurrency);
        self
    }

    pub fn default_min_score(&self) -> f64 {
        self.default_min_score
    }

    /// Rebuilds the matrix over the current catalog
    pub async fn rebuild(&self) -> AppResult<BuildReport> {
        let items = self.catalog.list_items().await?;
        let result = self.builder.build(&items).await;
        self.invalidate().await;
        result
    }

    /// Makes previously cached results unreachable.
    ///
    /// The generation lives in Redis, so the bump is seen by every instance
    /// and survives restarts. Without a cache this does nothing.
    pub async fn invalidate(&self) {
        let Some(cache) = &self.cache else {
            return;
        };
        match cache.bump_generation(&CacheKey::SimilarGeneration).await {
            Ok(generation) => tracing::debug!(generation, "Similarity cache generation bumped"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to bump similarity cache generation")
            }
        }
    }

    /// Items similar to `item_id` with a score of at least `min_score`
    /// (the configured default when `None`), ascending by score then id.
    ///
    /// An unknown item yields an empty list rather than an error.
    pub async fn top_similar(
        &self,
        item_id: i64,
        min_score: Option<f64>,
    ) -> AppResult<Vec<SimilarItem>> {
        let min_score = min_score.unwrap_or(self.default_min_score);
        if !(0.0..=1.0).contains(&min_score) {
            return Err(AppError::InvalidInput(format!(
                "min_score must be within [0, 1], got {}",
                min_score
            )));
        }

        let Some(cache) = &self.cache else {
            return self.compute_top_similar(item_id, min_score).await;
        };

        match cache.current_generation(&CacheKey::SimilarGeneration).await {
            Ok(generation) => {
                let key = CacheKey::similar_items(generation, item_id, min_score);
                cached!(
                    cache,
                    key,
                    self.cache_ttl,
                    self.compute_top_similar(item_id, min_score)
                )
            }
            Err(e) => {
                // Without the current generation no key is known to be fresh
                tracing::warn!(error = %e, "Cache generation unavailable, computing");
                self.compute_top_similar(item_id, min_score).await
            }
        }
    }

    async fn compute_top_similar(&self, item_id: i64, min_score: f64) -> AppResult<Vec<SimilarItem>> {
        if self.catalog.get_item(item_id).await?.is_none() {
            tracing::debug!(item_id, "Similar-items query for unknown item");
            return Ok(Vec::new());
        }

        let edges = self.store.edges_touching(item_id).await?;
        let mut similar = Vec::new();

        for edge in edges.into_iter().filter(|edge| edge.score >= min_score) {
            let Some(other_id) = edge.other(item_id) else {
                continue;
            };
            match self.catalog.get_item(other_id).await? {
                Some(other) => similar.push(SimilarItem {
                    item_id: other_id,
                    score: edge.score,
                    title: other.title().to_string(),
                }),
                None => tracing::debug!(item_id, other_id, "Skipping edge to missing item"),
            }
        }

        similar.sort_by(|a, b| {
            a.score
                .total_cmp(&b.score)
                .then_with(|| a.item_id.cmp(&b.item_id))
        });

        Ok(similar)
    }
}
