pub mod memory;
pub mod postgres;
pub mod redis;
pub mod store;

pub use memory::{InMemoryGameStore, InMemoryMediaStore};
pub use postgres::{create_pool, PgGameStore, PgMediaStore};
pub use redis::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
pub use store::{
    CatalogReader, CatalogWriter, GameStore, HistoryReader, HistoryWriter, RentalLedger,
    SimilarityStoreIo,
};
