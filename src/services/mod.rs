pub mod catalog;
pub mod category;
pub mod content;
pub mod distance;
pub mod game_stats;
pub mod recommendations;
pub mod rentals;
pub mod sampling;
pub mod similarity;
pub mod vectorizer;

pub use catalog::CatalogService;
pub use game_stats::{GameStatsService, RatedGame};
pub use recommendations::RecommendationService;
pub use rentals::RentalService;
pub use sampling::RandomSource;
pub use similarity::{SimilarityMatrixBuilder, SimilarityService};
