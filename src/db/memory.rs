//! In-memory backend. The default store, also what the test suite runs against.

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use super::store::{
    CatalogReader, CatalogWriter, GameStore, HistoryReader, HistoryWriter, RentalLedger,
    SimilarityStoreIo,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        canonical_pair, EdgePolicy, Game, GameId, HistoryEntry, Item, ItemId, NewGame,
        SimilarityEdge, UpsertOutcome,
    },
};

/// Media items, their similarity edges and view history
///
/// Edges live in a `DashMap` so each upsert holds only its shard's lock while
/// reading and writing the entry.
#[derive(Default)]
pub struct InMemoryMediaStore {
    items: RwLock<BTreeMap<ItemId, Item>>,
    next_item_id: AtomicI64,
    edges: DashMap<(ItemId, ItemId), f64>,
    history: RwLock<HashMap<String, Vec<HistoryEntry>>>,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[async_trait]
impl CatalogReader for InMemoryMediaStore {
    async fn list_items(&self) -> AppResult<Vec<Item>> {
        Ok(self.items.read().await.values().cloned().collect())
    }

    async fn get_item(&self, id: ItemId) -> AppResult<Option<Item>> {
        Ok(self.items.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl CatalogWriter for InMemoryMediaStore {
    async fn insert_item(&self, title: &str, year: i32) -> AppResult<Item> {
        let id = self.next_item_id.fetch_add(1, Ordering::SeqCst) + 1;
        let item = Item::new(id, title, year)?;
        self.items.write().await.insert(id, item.clone());
        Ok(item)
    }

    async fn update_title(&self, id: ItemId, title: &str) -> AppResult<Option<Item>> {
        let mut items = self.items.write().await;
        match items.get_mut(&id) {
            Some(item) => {
                item.set_title(title)?;
                Ok(Some(item.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_item(&self, id: ItemId) -> AppResult<bool> {
        let removed = self.items.write().await.remove(&id).is_some();
        if removed {
            self.edges.retain(|(low, high), _| *low != id && *high != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl SimilarityStoreIo for InMemoryMediaStore {
    async fn upsert_edge(
        &self,
        edge: SimilarityEdge,
        policy: EdgePolicy,
    ) -> AppResult<UpsertOutcome> {
        // Held until the edge is written so a concurrent delete_item cannot
        // remove an endpoint in between
        let items = self.items.read().await;
        for id in [edge.low_id, edge.high_id] {
            if !items.contains_key(&id) {
                return Err(AppError::NotFound(format!("item {}", id)));
            }
        }

        let outcome = match self.edges.entry((edge.low_id, edge.high_id)) {
            Entry::Occupied(mut existing) => match policy {
                EdgePolicy::Skip => UpsertOutcome::Skipped,
                EdgePolicy::Refresh => {
                    existing.insert(edge.score);
                    UpsertOutcome::Updated
                }
            },
            Entry::Vacant(slot) => {
                slot.insert(edge.score);
                UpsertOutcome::Inserted
            }
        };
        Ok(outcome)
    }

    async fn find_edge(&self, a: ItemId, b: ItemId) -> AppResult<Option<f64>> {
        let key = canonical_pair(a, b);
        Ok(self.edges.get(&key).map(|score| *score))
    }

    async fn edges_touching(&self, id: ItemId) -> AppResult<Vec<SimilarityEdge>> {
        let mut edges: Vec<SimilarityEdge> = self
            .edges
            .iter()
            .filter(|entry| entry.key().0 == id || entry.key().1 == id)
            .map(|entry| SimilarityEdge {
                low_id: entry.key().0,
                high_id: entry.key().1,
                score: *entry.value(),
            })
            .collect();
        edges.sort_by_key(|edge| (edge.low_id, edge.high_id));
        Ok(edges)
    }
}

#[async_trait]
impl HistoryReader for InMemoryMediaStore {
    async fn interacted_item_ids(&self, user_id: &str) -> AppResult<Vec<ItemId>> {
        Ok(self
            .history
            .read()
            .await
            .get(user_id)
            .map(|entries| entries.iter().map(|entry| entry.item_id).collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl HistoryWriter for InMemoryMediaStore {
    async fn record_view(&self, entry: HistoryEntry) -> AppResult<()> {
        self.history
            .write()
            .await
            .entry(entry.user_id.clone())
            .or_default()
            .insert(0, entry);
        Ok(())
    }
}

/// Games and the per-user rental ledger
#[derive(Default)]
pub struct InMemoryGameStore {
    games: RwLock<BTreeMap<GameId, Game>>,
    next_game_id: AtomicI64,
    rentals: RwLock<HashMap<String, Vec<GameId>>>,
}

impl InMemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStore for InMemoryGameStore {
    async fn list_games(&self) -> AppResult<Vec<Game>> {
        Ok(self.games.read().await.values().cloned().collect())
    }

    async fn get_games(&self, ids: &[GameId]) -> AppResult<Vec<Game>> {
        let games = self.games.read().await;
        Ok(ids.iter().filter_map(|id| games.get(id).cloned()).collect())
    }

    async fn find_by_title(&self, title: &str) -> AppResult<Option<Game>> {
        Ok(self
            .games
            .read()
            .await
            .values()
            .find(|game| game.title == title)
            .cloned())
    }

    async fn insert_game(&self, game: NewGame) -> AppResult<Option<Game>> {
        let mut games = self.games.write().await;
        if games.values().any(|existing| existing.title == game.title) {
            return Ok(None);
        }
        let id = self.next_game_id.fetch_add(1, Ordering::SeqCst) + 1;
        let game = game.into_game(id);
        games.insert(id, game.clone());
        Ok(Some(game))
    }

    async fn transition_rented(&self, id: GameId, rented: bool) -> AppResult<()> {
        // Check and write under one write guard so concurrent callers serialize
        let mut games = self.games.write().await;
        let game = games
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("game {}", id)))?;

        if game.is_rented == rented {
            return Err(AppError::ConflictingState(format!(
                "{} is already {}",
                game.title,
                if rented { "rented" } else { "available" }
            )));
        }

        game.is_rented = rented;
        Ok(())
    }

    async fn decrement_scores(&self, platform: &str) -> AppResult<u64> {
        let mut games = self.games.write().await;
        let mut changed = 0;
        for game in games.values_mut().filter(|game| game.platform == platform) {
            game.user_score -= 1.0;
            changed += 1;
        }
        Ok(changed)
    }
}

#[async_trait]
impl RentalLedger for InMemoryGameStore {
    async fn rented_game_ids(&self, user_id: &str) -> AppResult<Vec<GameId>> {
        Ok(self
            .rentals
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_rental(&self, user_id: &str, game_id: GameId) -> AppResult<()> {
        let mut rentals = self.rentals.write().await;
        let ledger = rentals.entry(user_id.to_string()).or_default();
        if !ledger.contains(&game_id) {
            ledger.insert(0, game_id);
        }
        Ok(())
    }

    async fn remove_rental(&self, user_id: &str, game_id: GameId) -> AppResult<bool> {
        let mut rentals = self.rentals.write().await;
        match rentals.get_mut(user_id) {
            Some(ledger) => {
                let before = ledger.len();
                ledger.retain(|id| *id != game_id);
                Ok(ledger.len() != before)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl HistoryReader for InMemoryGameStore {
    async fn interacted_item_ids(&self, user_id: &str) -> AppResult<Vec<ItemId>> {
        self.rented_game_ids(user_id).await
    }
}
