use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;
use crate::models::ItemId;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Counter shared by every instance, bumped whenever the matrix or the
    /// catalog changes. Stored without a TTL.
    SimilarGeneration,
    /// Similar-item results for one item at one threshold.
    /// Entries from older generations are never read again and age out via TTL.
    SimilarItems {
        generation: u64,
        item_id: ItemId,
        min_score_bits: u64,
    },
}

impl CacheKey {
    pub fn similar_items(generation: u64, item_id: ItemId, min_score: f64) -> Self {
        CacheKey::SimilarItems {
            generation,
            item_id,
            min_score_bits: min_score.to_bits(),
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::SimilarGeneration => write!(f, "similar:generation"),
            CacheKey::SimilarItems {
                generation,
                item_id,
                min_score_bits,
            } => write!(
                f,
                "similar:{}:{}:{}",
                generation,
                item_id,
                f64::from_bits(*min_score_bits)
            ),
        }
    }
}

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Pending write handed to the background writer
struct PendingWrite {
    key: String,
    payload: String,
    ttl: u64,
}

/// Redis-backed cache for query results
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<PendingWrite>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Asks the writer to flush what is queued and stop
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Creates the cache and spawns its background writer task
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::run_writer(client, write_rx, shutdown_rx).await;
        });

        (
            Self {
                redis_client,
                write_tx,
            },
            CacheWriterHandle { shutdown_tx },
        )
    }

    async fn run_writer(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<PendingWrite>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");
        let mut failed_writes: u64 = 0;

        loop {
            tokio::select! {
                Some(write) = write_rx.recv() => {
                    if let Err(e) = Self::write(&client, write).await {
                        failed_writes += 1;
                        tracing::error!(error = %e, failed_writes, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    write_rx.close();
                    while let Some(write) = write_rx.recv().await {
                        if let Err(e) = Self::write(&client, write).await {
                            tracing::error!(error = %e, "Failed to flush cache write during shutdown");
                        }
                    }
                    tracing::info!(failed_writes, "Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write(client: &Client, write: PendingWrite) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(write.key, write.payload, write.ttl).await?;
        Ok(())
    }

    /// Reads and deserializes a cached value; `None` on a miss
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        cached
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })
            })
            .transpose()
    }

    /// Current value of a generation counter, 0 if it was never bumped
    pub async fn current_generation(&self, key: &CacheKey) -> AppResult<u64> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let generation: Option<u64> = conn.get(key.to_string()).await?;
        Ok(generation.unwrap_or(0))
    }

    /// Atomically increments a generation counter and returns the new value
    pub async fn bump_generation(&self, key: &CacheKey) -> AppResult<u64> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let generation: u64 = conn.incr(key.to_string(), 1u64).await?;
        Ok(generation)
    }

    /// Queues a value for writing without waiting on Redis
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Cache serialization error");
                return;
            }
        };

        let write = PendingWrite {
            key: key.to_string(),
            payload,
            ttl,
        };

        if let Err(e) = self.write_tx.send(write) {
            tracing::error!(error = %e, "Cache writer is gone, dropping write");
        }
    }
}
