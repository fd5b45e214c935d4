//! Collaborator interfaces between the recommendation core and its data store.
//!
//! Services receive these as `Arc<dyn Trait>` so the backing store (in-memory
//! or Postgres) is chosen once at startup and tests can substitute fakes.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::{
    error::AppResult,
    models::{
        EdgePolicy, Game, GameId, HistoryEntry, Item, ItemId, NewGame, SimilarityEdge,
        UpsertOutcome,
    },
};

/// Read access to the media catalog
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// All items, ordered by id
    async fn list_items(&self) -> AppResult<Vec<Item>>;

    async fn get_item(&self, id: ItemId) -> AppResult<Option<Item>>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait CatalogWriter: Send + Sync {
    async fn insert_item(&self, title: &str, year: i32) -> AppResult<Item>;

    /// Returns `None` when no item has this id
    async fn update_title(&self, id: ItemId, title: &str) -> AppResult<Option<Item>>;

    /// Removes the item and every similarity edge touching it.
    /// View history is left alone.
    async fn delete_item(&self, id: ItemId) -> AppResult<bool>;
}

/// Sparse symmetric storage of pairwise similarity scores
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SimilarityStoreIo: Send + Sync {
    /// Inserts or overwrites one edge as a single atomic operation
    async fn upsert_edge(&self, edge: SimilarityEdge, policy: EdgePolicy)
        -> AppResult<UpsertOutcome>;

    /// Looks up a pair in either orientation
    async fn find_edge(&self, a: ItemId, b: ItemId) -> AppResult<Option<f64>>;

    async fn edges_touching(&self, id: ItemId) -> AppResult<Vec<SimilarityEdge>>;
}

/// Item ids a user has interacted with, most recent first
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HistoryReader: Send + Sync {
    async fn interacted_item_ids(&self, user_id: &str) -> AppResult<Vec<ItemId>>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait HistoryWriter: Send + Sync {
    async fn record_view(&self, entry: HistoryEntry) -> AppResult<()>;
}

/// The rentable game catalog
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GameStore: Send + Sync {
    /// All games, ordered by id
    async fn list_games(&self) -> AppResult<Vec<Game>>;

    /// Games with the given ids; unknown ids are silently dropped
    async fn get_games(&self, ids: &[GameId]) -> AppResult<Vec<Game>>;

    async fn find_by_title(&self, title: &str) -> AppResult<Option<Game>>;

    /// Returns `None` if a game with the same title already exists
    async fn insert_game(&self, game: NewGame) -> AppResult<Option<Game>>;

    /// Compare-and-set of the rental flag to `rented`.
    ///
    /// Fails with `ConflictingState` when the flag already holds `rented`
    /// and with `NotFound` for an unknown id. State is unchanged on failure.
    async fn transition_rented(&self, id: GameId, rented: bool) -> AppResult<()>;

    /// Subtracts one point from every game on `platform`, returning how many changed
    async fn decrement_scores(&self, platform: &str) -> AppResult<u64>;
}

/// Per-user list of currently rented games
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RentalLedger: Send + Sync {
    /// Most recent rental first
    async fn rented_game_ids(&self, user_id: &str) -> AppResult<Vec<GameId>>;

    async fn add_rental(&self, user_id: &str, game_id: GameId) -> AppResult<()>;

    /// Returns whether the user actually held the game
    async fn remove_rental(&self, user_id: &str, game_id: GameId) -> AppResult<bool>;
}
