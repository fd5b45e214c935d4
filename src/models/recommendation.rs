use serde::Serialize;

/// Sentinel shown to users who have not rented anything yet
pub const NO_HISTORY_MESSAGE: &str = "No games rented";

/// Outcome of a recommendation request
///
/// Absence of data is a regular result rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Recommendation {
    /// The user has no interactions to base a recommendation on
    NoHistory,
    /// There was history, but nothing left to recommend from it
    NothingToRecommend,
    Titles {
        titles: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        category: Option<String>,
    },
}

impl Recommendation {
    pub fn titles(&self) -> &[String] {
        match self {
            Recommendation::Titles { titles, .. } => titles,
            _ => &[],
        }
    }
}
