use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::{
    db::GameStore,
    error::{AppError, AppResult},
    models::{Game, NewGame},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatedGame {
    pub title: String,
    pub user_score: f64,
}

/// Catalog-wide queries and bulk maintenance over games
pub struct GameStatsService {
    games: Arc<dyn GameStore>,
}

impl GameStatsService {
    pub fn new(games: Arc<dyn GameStore>) -> Self {
        Self { games }
    }

    pub async fn list_games(&self) -> AppResult<Vec<Game>> {
        self.games.list_games().await
    }

    /// Inserts games whose titles are not in the catalog yet, returning how many were added
    pub async fn import_games(&self, games: Vec<NewGame>) -> AppResult<usize> {
        let submitted = games.len();
        let mut inserted = 0;

        for game in games {
            if game.title.trim().is_empty() {
                return Err(AppError::InvalidInput("Game title must not be empty".to_string()));
            }
            if self.games.insert_game(game).await?.is_some() {
                inserted += 1;
            }
        }

        tracing::info!(submitted, inserted, "Games imported");
        Ok(inserted)
    }

    /// Games scoring at least `min_score`, best first
    pub async fn top_rated(&self, min_score: f64) -> AppResult<Vec<RatedGame>> {
        let mut rated: Vec<RatedGame> = self
            .games
            .list_games()
            .await?
            .into_iter()
            .filter(|game| game.user_score >= min_score)
            .map(|game| RatedGame {
                title: game.title,
                user_score: game.user_score,
            })
            .collect();

        rated.sort_by(|a, b| {
            b.user_score
                .total_cmp(&a.user_score)
                .then_with(|| a.title.cmp(&b.title))
        });
        Ok(rated)
    }

    pub async fn decrement_scores(&self, platform: &str) -> AppResult<u64> {
        let changed = self.games.decrement_scores(platform).await?;
        tracing::info!(platform, changed, "Scores decremented");
        Ok(changed)
    }

    /// Mean user score per platform, rounded to three decimals
    pub async fn average_score_per_platform(&self) -> AppResult<BTreeMap<String, f64>> {
        let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        for game in self.games.list_games().await? {
            let entry = sums.entry(game.platform).or_insert((0.0, 0));
            entry.0 += game.user_score;
            entry.1 += 1;
        }

        Ok(sums
            .into_iter()
            .map(|(platform, (sum, count))| {
                let mean = sum / count as f64;
                (platform, (mean * 1000.0).round() / 1000.0)
            })
            .collect())
    }

    /// Number of games carrying each genre
    pub async fn genre_distribution(&self) -> AppResult<BTreeMap<String, usize>> {
        let mut distribution = BTreeMap::new();
        for game in self.games.list_games().await? {
            for genre in game.genres {
                *distribution.entry(genre).or_insert(0) += 1;
            }
        }
        Ok(distribution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryGameStore;

    fn new_game(title: &str, platform: &str, score: f64, genres: &[&str]) -> NewGame {
        NewGame {
            title: title.to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            user_score: score,
            platform: platform.to_string(),
        }
    }

    async fn stats() -> GameStatsService {
        let service = GameStatsService::new(Arc::new(InMemoryGameStore::new()));
        service
            .import_games(vec![
                new_game("Pikmin 4", "Switch", 8.9, &["Strategy"]),
                new_game("Metroid Dread", "Switch", 8.6, &["Action", "Adventure"]),
                new_game("Super Mario Galaxy", "Wii", 9.1, &["Action", "Platformer"]),
                new_game("Wii Music", "Wii", 4.0, &["Music"]),
                new_game("Mario Kart 8", "Switch", 8.0, &["Racing"]),
            ])
            .await
            .unwrap();
        service
    }

    #[tokio::test]
    async fn test_import_skips_duplicates() {
        let service = stats().await;
        let inserted = service
            .import_games(vec![
                new_game("Pikmin 4", "Switch", 1.0, &[]),
                new_game("Splatoon 3", "Switch", 7.4, &["Shooter"]),
            ])
            .await
            .unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(service.list_games().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_top_rated() {
        let service = stats().await;
        let titles: Vec<String> = service
            .top_rated(8.5)
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.title)
            .collect();
        assert_eq!(titles, vec!["Super Mario Galaxy", "Pikmin 4", "Metroid Dread"]);
    }

    #[tokio::test]
    async fn test_average_per_platform() {
        let service = stats().await;
        let averages = service.average_score_per_platform().await.unwrap();
        assert_eq!(averages["Wii"], 6.55);
        assert_eq!(averages["Switch"], 8.5);
    }

    #[tokio::test]
    async fn test_decrement_then_average() {
        let service = stats().await;
        assert_eq!(service.decrement_scores("Wii").await.unwrap(), 2);
        assert_eq!(service.decrement_scores("GameCube").await.unwrap(), 0);
        let averages = service.average_score_per_platform().await.unwrap();
        assert_eq!(averages["Wii"], 5.55);
    }

    #[tokio::test]
    async fn test_genre_distribution() {
        let service = stats().await;
        let distribution = service.genre_distribution().await.unwrap();
        assert_eq!(distribution["Action"], 2);
        assert_eq!(distribution["Racing"], 1);
        assert_eq!(distribution.len(), 6);
    }
}
