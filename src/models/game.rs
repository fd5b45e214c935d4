use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type GameId = i64;

/// A rentable game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub title: String,
    #[serde(default)]
    pub genres: BTreeSet<String>,
    pub user_score: f64,
    pub platform: String,
    #[serde(default)]
    pub is_rented: bool,
}

impl Game {
    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.contains(genre)
    }
}

/// A game as submitted for import, before it has an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGame {
    pub title: String,
    #[serde(default)]
    pub genres: BTreeSet<String>,
    pub user_score: f64,
    pub platform: String,
}

impl NewGame {
    pub fn into_game(self, id: GameId) -> Game {
        Game {
            id,
            title: self.title,
            genres: self.genres,
            user_score: self.user_score,
            platform: self.platform,
            is_rented: false,
        }
    }
}

/// Result of a rent request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RentOutcome {
    Rented,
    AlreadyRented,
    NotFound,
}

impl RentOutcome {
    pub fn message(&self, title: &str) -> String {
        match self {
            RentOutcome::Rented => format!("{} rented successfully", title),
            RentOutcome::AlreadyRented => format!("{} is already rented", title),
            RentOutcome::NotFound => format!("{} not found", title),
        }
    }
}

/// Result of a return request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnOutcome {
    Returned,
    NotRentedByYou,
    NotFound,
}

impl ReturnOutcome {
    pub fn message(&self, title: &str) -> String {
        match self {
            ReturnOutcome::Returned => format!("{} returned successfully", title),
            ReturnOutcome::NotRentedByYou => format!("{} was not rented by you", title),
            ReturnOutcome::NotFound => format!("{} not found", title),
        }
    }
}
