use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

use super::store::{
    CatalogReader, CatalogWriter, GameStore, HistoryReader, HistoryWriter, RentalLedger,
    SimilarityStoreIo,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        canonical_pair, title_length, EdgePolicy, Game, GameId, HistoryEntry, Item, ItemId,
        NewGame, SimilarityEdge, UpsertOutcome,
    },
};

/// Creates a PostgreSQL connection pool and applies pending migrations
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!(max_connections, "Connected to PostgreSQL, migrations applied");

    Ok(pool)
}

#[derive(FromRow)]
struct ItemRow {
    id: i64,
    title: String,
    prod_year: i32,
}

impl TryFrom<ItemRow> for Item {
    type Error = AppError;

    fn try_from(row: ItemRow) -> AppResult<Self> {
        Item::new(row.id, row.title, row.prod_year)
    }
}

#[derive(FromRow)]
struct EdgeRow {
    low_id: i64,
    high_id: i64,
    score: f64,
}

impl From<EdgeRow> for SimilarityEdge {
    fn from(row: EdgeRow) -> Self {
        SimilarityEdge {
            low_id: row.low_id,
            high_id: row.high_id,
            score: row.score,
        }
    }
}

#[derive(FromRow)]
struct GameRow {
    id: i64,
    title: String,
    genres: Vec<String>,
    user_score: f64,
    platform: String,
    is_rented: bool,
}

impl From<GameRow> for Game {
    fn from(row: GameRow) -> Self {
        Game {
            id: row.id,
            title: row.title,
            genres: row.genres.into_iter().collect(),
            user_score: row.user_score,
            platform: row.platform,
            is_rented: row.is_rented,
        }
    }
}

const ITEM_COLUMNS: &str = "id, title, prod_year";
const GAME_COLUMNS: &str = "id, title, genres, user_score, platform, is_rented";

/// Media items, similarity edges and view history in PostgreSQL
#[derive(Clone)]
pub struct PgMediaStore {
    pool: PgPool,
}

impl PgMediaStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogReader for PgMediaStore {
    async fn list_items(&self) -> AppResult<Vec<Item>> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            "SELECT {} FROM media_items ORDER BY id",
            ITEM_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Item::try_from).collect()
    }

    async fn get_item(&self, id: ItemId) -> AppResult<Option<Item>> {
        let row: Option<ItemRow> = sqlx::query_as(&format!(
            "SELECT {} FROM media_items WHERE id = $1",
            ITEM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Item::try_from).transpose()
    }
}

#[async_trait]
impl CatalogWriter for PgMediaStore {
    async fn insert_item(&self, title: &str, year: i32) -> AppResult<Item> {
        // Validate before touching the database
        let draft = Item::new(0, title, year)?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO media_items (title, prod_year, title_length) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(draft.title())
        .bind(draft.year())
        .bind(draft.derived_length() as i32)
        .fetch_one(&self.pool)
        .await?;

        Item::new(id, title, year)
    }

    async fn update_title(&self, id: ItemId, title: &str) -> AppResult<Option<Item>> {
        if title.trim().is_empty() {
            return Err(AppError::InvalidInput("Title must not be empty".to_string()));
        }

        let row: Option<ItemRow> = sqlx::query_as(&format!(
            "UPDATE media_items SET title = $2, title_length = $3 WHERE id = $1 RETURNING {}",
            ITEM_COLUMNS
        ))
        .bind(id)
        .bind(title)
        .bind(title_length(title) as i32)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Item::try_from).transpose()
    }

    async fn delete_item(&self, id: ItemId) -> AppResult<bool> {
        // similarity rows go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM media_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SimilarityStoreIo for PgMediaStore {
    async fn upsert_edge(
        &self,
        edge: SimilarityEdge,
        policy: EdgePolicy,
    ) -> AppResult<UpsertOutcome> {
        match policy {
            EdgePolicy::Refresh => {
                let inserted: bool = sqlx::query_scalar(
                    r#"
                    INSERT INTO similarity (low_id, high_id, score)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (low_id, high_id) DO UPDATE SET score = EXCLUDED.score
                    RETURNING (xmax = 0) AS inserted
                    "#,
                )
                .bind(edge.low_id)
                .bind(edge.high_id)
                .bind(edge.score)
                .fetch_one(&self.pool)
                .await?;

                Ok(if inserted {
                    UpsertOutcome::Inserted
                } else {
                    UpsertOutcome::Updated
                })
            }
            EdgePolicy::Skip => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO similarity (low_id, high_id, score)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (low_id, high_id) DO NOTHING
                    "#,
                )
                .bind(edge.low_id)
                .bind(edge.high_id)
                .bind(edge.score)
                .execute(&self.pool)
                .await?;

                Ok(if result.rows_affected() == 1 {
                    UpsertOutcome::Inserted
                } else {
                    UpsertOutcome::Skipped
                })
            }
        }
    }

    async fn find_edge(&self, a: ItemId, b: ItemId) -> AppResult<Option<f64>> {
        let (low, high) = canonical_pair(a, b);
        let score: Option<f64> =
            sqlx::query_scalar("SELECT score FROM similarity WHERE low_id = $1 AND high_id = $2")
                .bind(low)
                .bind(high)
                .fetch_optional(&self.pool)
                .await?;
        Ok(score)
    }

    async fn edges_touching(&self, id: ItemId) -> AppResult<Vec<SimilarityEdge>> {
        let rows: Vec<EdgeRow> = sqlx::query_as(
            r#"
            SELECT low_id, high_id, score FROM similarity
            WHERE low_id = $1 OR high_id = $1
            ORDER BY low_id, high_id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SimilarityEdge::from).collect())
    }
}

#[async_trait]
impl HistoryReader for PgMediaStore {
    async fn interacted_item_ids(&self, user_id: &str) -> AppResult<Vec<ItemId>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT media_item_id FROM view_history WHERE user_id = $1 ORDER BY viewed_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}

#[async_trait]
impl HistoryWriter for PgMediaStore {
    async fn record_view(&self, entry: HistoryEntry) -> AppResult<()> {
        let viewed_at: DateTime<Utc> = entry.viewed_at;
        sqlx::query("INSERT INTO view_history (user_id, media_item_id, viewed_at) VALUES ($1, $2, $3)")
            .bind(&entry.user_id)
            .bind(entry.item_id)
            .bind(viewed_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Games and rentals in PostgreSQL
#[derive(Clone)]
pub struct PgGameStore {
    pool: PgPool,
}

impl PgGameStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GameStore for PgGameStore {
    async fn list_games(&self) -> AppResult<Vec<Game>> {
        let rows: Vec<GameRow> =
            sqlx::query_as(&format!("SELECT {} FROM games ORDER BY id", GAME_COLUMNS))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Game::from).collect())
    }

    async fn get_games(&self, ids: &[GameId]) -> AppResult<Vec<Game>> {
        let rows: Vec<GameRow> = sqlx::query_as(&format!(
            "SELECT {} FROM games WHERE id = ANY($1) ORDER BY id",
            GAME_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Game::from).collect())
    }

    async fn find_by_title(&self, title: &str) -> AppResult<Option<Game>> {
        let row: Option<GameRow> =
            sqlx::query_as(&format!("SELECT {} FROM games WHERE title = $1", GAME_COLUMNS))
                .bind(title)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Game::from))
    }

    async fn insert_game(&self, game: NewGame) -> AppResult<Option<Game>> {
        let genres: Vec<String> = game.genres.iter().cloned().collect();
        let row: Option<GameRow> = sqlx::query_as(&format!(
            r#"
            INSERT INTO games (title, genres, user_score, platform, is_rented)
            VALUES ($1, $2, $3, $4, FALSE)
            ON CONFLICT (title) DO NOTHING
            RETURNING {}
            "#,
            GAME_COLUMNS
        ))
        .bind(&game.title)
        .bind(&genres)
        .bind(game.user_score)
        .bind(&game.platform)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Game::from))
    }

    async fn transition_rented(&self, id: GameId, rented: bool) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE games SET is_rented = $2 WHERE id = $1 AND is_rented <> $2")
                .bind(id)
                .bind(rented)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM games WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        if exists {
            Err(AppError::ConflictingState(format!(
                "game {} is already {}",
                id,
                if rented { "rented" } else { "available" }
            )))
        } else {
            Err(AppError::NotFound(format!("game {}", id)))
        }
    }

    async fn decrement_scores(&self, platform: &str) -> AppResult<u64> {
        let result = sqlx::query("UPDATE games SET user_score = user_score - 1 WHERE platform = $1")
            .bind(platform)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl RentalLedger for PgGameStore {
    async fn rented_game_ids(&self, user_id: &str) -> AppResult<Vec<GameId>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT game_id FROM rentals WHERE user_id = $1 ORDER BY rented_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn add_rental(&self, user_id: &str, game_id: GameId) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO rentals (user_id, game_id, rented_at) VALUES ($1, $2, now()) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(game_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_rental(&self, user_id: &str, game_id: GameId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM rentals WHERE user_id = $1 AND game_id = $2")
            .bind(user_id)
            .bind(game_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl HistoryReader for PgGameStore {
    async fn interacted_item_ids(&self, user_id: &str) -> AppResult<Vec<ItemId>> {
        self.rented_game_ids(user_id).await
    }
}
