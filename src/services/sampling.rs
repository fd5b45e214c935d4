use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Source of randomness for the recommenders.
///
/// Implemented for every [`rand::Rng`], so production code hands in a
/// thread or entropy-seeded generator and tests a seeded `StdRng`.
pub trait RandomSource {
    /// Uniform index in `0..len`, `None` when `len` is zero
    fn pick_index(&mut self, len: usize) -> Option<usize>;

    /// Index chosen with probability proportional to its weight.
    /// Zero weights are never chosen; `None` if no weight is positive.
    fn pick_weighted(&mut self, weights: &[u64]) -> Option<usize>;

    /// `amount` distinct indices from `0..len`, uniformly, in random order
    fn sample_indices(&mut self, len: usize, amount: usize) -> Vec<usize>;
}

impl<R: Rng> RandomSource for R {
    fn pick_index(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.gen_range(0..len))
    }

    fn pick_weighted(&mut self, weights: &[u64]) -> Option<usize> {
        WeightedIndex::<u64>::new(weights)
            .ok()
            .map(|distribution| distribution.sample(self))
    }

    fn sample_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        rand::seq::index::sample(self, len, amount.min(len)).into_vec()
    }
}
