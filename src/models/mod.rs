mod game;
mod history;
mod item;
mod recommendation;
mod similarity;

pub use game::{Game, GameId, NewGame, RentOutcome, ReturnOutcome};
pub use history::HistoryEntry;
pub use item::{title_length, Item, ItemId};
pub use recommendation::{Recommendation, NO_HISTORY_MESSAGE};
pub use similarity::{
    canonical_pair, BuildReport, EdgePolicy, SimilarItem, SimilarityEdge, UpsertOutcome,
};
