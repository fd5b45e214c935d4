use crate::{
    error::{AppError, AppResult},
    services::vectorizer::{cosine_similarity, TfIdfVectorizer},
};

/// Ranks `candidates` by title similarity to `seed` and keeps the best `k`.
///
/// The vector space is fitted on the seed plus all candidates each call.
/// Ordering is descending by cosine similarity; equal scores keep candidate
/// order. Callers remove already-seen titles from `candidates` beforehand.
pub fn recommend_by_content<S: AsRef<str>>(
    seed: &str,
    candidates: &[S],
    k: usize,
) -> AppResult<Vec<String>> {
    if candidates.is_empty() {
        return Err(AppError::EmptyCandidatePool);
    }

    let corpus: Vec<&str> = std::iter::once(seed)
        .chain(candidates.iter().map(|candidate| candidate.as_ref()))
        .collect();
    let (_, vectors) = TfIdfVectorizer::fit_transform(&corpus);
    let (seed_vector, candidate_vectors) = vectors
        .split_first()
        .ok_or_else(|| AppError::Internal("Vectorizer returned no vectors".to_string()))?;

    let mut ranked: Vec<(usize, f64)> = candidate_vectors
        .iter()
        .map(|vector| cosine_similarity(seed_vector, vector))
        .enumerate()
        .collect();
    // sort_by is stable, so ties stay in candidate order
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    Ok(ranked
        .into_iter()
        .take(k)
        .map(|(index, _)| candidates[index].as_ref().to_string())
        .collect())
}
