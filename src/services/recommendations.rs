use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    db::{GameStore, HistoryReader},
    error::{AppError, AppResult},
    models::{GameId, Recommendation},
    services::{category::recommend_by_category, content::recommend_by_content, sampling::RandomSource},
};

/// Personalized game recommendations built from a user's rentals
///
/// Randomness is passed in per call so handlers can hand over a generator
/// derived from the shared (optionally seeded) one.
pub struct RecommendationService {
    games: Arc<dyn GameStore>,
    rentals: Arc<dyn HistoryReader>,
    limit: usize,
}

impl RecommendationService {
    pub fn new(games: Arc<dyn GameStore>, rentals: Arc<dyn HistoryReader>, limit: usize) -> Self {
        Self {
            games,
            rentals,
            limit,
        }
    }

    /// Samples games from a genre picked in proportion to how often the user rented it
    pub async fn recommend_by_genre<R: RandomSource + Send + ?Sized>(
        &self,
        user_id: &str,
        rng: &mut R,
    ) -> AppResult<Recommendation> {
        let rented = self.rentals.interacted_item_ids(user_id).await?;
        if rented.is_empty() {
            return Ok(Recommendation::NoHistory);
        }

        let catalog = self.games.list_games().await?;
        Ok(recommend_by_category(&rented, &catalog, self.limit, rng))
    }

    /// Ranks games the user has not rented by title similarity to one of
    /// their rentals, chosen at random
    pub async fn recommend_by_name<R: RandomSource + Send + ?Sized>(
        &self,
        user_id: &str,
        rng: &mut R,
    ) -> AppResult<Recommendation> {
        let rented_ids = self.rentals.interacted_item_ids(user_id).await?;
        if rented_ids.is_empty() {
            return Ok(Recommendation::NoHistory);
        }

        let rented = self.games.get_games(&rented_ids).await?;
        let Some(seed) = rng.pick_index(rented.len()).map(|index| &rented[index]) else {
            tracing::debug!(user_id, "Rentals reference no existing game");
            return Ok(Recommendation::NoHistory);
        };

        let held: HashSet<GameId> = rented_ids.into_iter().collect();
        let candidates: Vec<String> = self
            .games
            .list_games()
            .await?
            .into_iter()
            .filter(|game| !held.contains(&game.id))
            .map(|game| game.title)
            .collect();

        match recommend_by_content(&seed.title, &candidates, self.limit) {
            Ok(titles) => {
                tracing::debug!(user_id, seed = %seed.title, picked = titles.len(), "Name recommendation");
                Ok(Recommendation::Titles {
                    titles,
                    category: None,
                })
            }
            Err(AppError::EmptyCandidatePool) => Ok(Recommendation::NothingToRecommend),
            Err(e) => Err(e),
        }
    }
}
