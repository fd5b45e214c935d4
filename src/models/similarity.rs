use serde::{Deserialize, Serialize};

use super::ItemId;
use crate::error::{AppError, AppResult};

/// Orders an unordered pair so the lower id comes first
pub fn canonical_pair(a: ItemId, b: ItemId) -> (ItemId, ItemId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// A stored similarity score between two distinct items, `low_id < high_id`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityEdge {
    pub low_id: ItemId,
    pub high_id: ItemId,
    pub score: f64,
}

impl SimilarityEdge {
    /// Builds a canonically ordered edge; rejects self-pairs and scores outside [0, 1]
    pub fn new(a: ItemId, b: ItemId, score: f64) -> AppResult<Self> {
        if a == b {
            return Err(AppError::InvalidInput(format!(
                "Cannot relate item {} to itself",
                a
            )));
        }
        if !(0.0..=1.0).contains(&score) {
            return Err(AppError::InvalidInput(format!(
                "Similarity score {} is outside [0, 1]",
                score
            )));
        }
        let (low_id, high_id) = canonical_pair(a, b);
        Ok(Self {
            low_id,
            high_id,
            score,
        })
    }

    /// The endpoint opposite `id`, or `None` if the edge does not touch it
    pub fn other(&self, id: ItemId) -> Option<ItemId> {
        if self.low_id == id {
            Some(self.high_id)
        } else if self.high_id == id {
            Some(self.low_id)
        } else {
            None
        }
    }
}

/// What a rebuild does with an edge that already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgePolicy {
    /// Recompute and overwrite the stored score
    #[default]
    Refresh,
    /// Keep the stored score untouched
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Skipped,
}

/// One row of a similar-items query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarItem {
    pub item_id: ItemId,
    pub score: f64,
    pub title: String,
}

/// Summary of a similarity matrix build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub items: usize,
    pub pairs: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BuildReport {
    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn merge(&mut self, other: &BuildReport) {
        self.pairs += other.pairs;
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_is_canonicalized() {
        let edge = SimilarityEdge::new(9, 4, 0.5).unwrap();
        assert_eq!((edge.low_id, edge.high_id), (4, 9));
        assert_eq!(edge.other(4), Some(9));
        assert_eq!(edge.other(9), Some(4));
        assert_eq!(edge.other(1), None);
    }

    #[test]
    fn test_self_edge_rejected() {
        assert!(SimilarityEdge::new(3, 3, 1.0).is_err());
    }

    #[test]
    fn test_score_range_enforced() {
        assert!(SimilarityEdge::new(1, 2, 1.01).is_err());
        assert!(SimilarityEdge::new(1, 2, -0.1).is_err());
        assert!(SimilarityEdge::new(1, 2, 0.0).is_ok());
    }

    #[test]
    fn test_edge_policy_serde() {
        assert_eq!(serde_json::to_string(&EdgePolicy::Skip).unwrap(), "\"skip\"");
        let policy: EdgePolicy = serde_json::from_str("\"refresh\"").unwrap();
        assert_eq!(policy, EdgePolicy::Refresh);
    }

    #[test]
    fn test_report_merge() {
        let mut total = BuildReport::default();
        let mut part = BuildReport {
            pairs: 2,
            ..BuildReport::default()
        };
        part.record(UpsertOutcome::Inserted);
        part.record(UpsertOutcome::Skipped);
        total.merge(&part);
        total.merge(&part);
        assert_eq!(total.pairs, 4);
        assert_eq!(total.inserted, 2);
        assert_eq!(total.skipped, 2);
    }
}
