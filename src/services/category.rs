use std::collections::{BTreeMap, HashMap};

use crate::{
    models::{Game, GameId, Recommendation},
    services::sampling::RandomSource,
};

/// Genre counts over the interacted games.
///
/// A game contributes one count to every genre it carries. Ids with no
/// matching game are ignored. Keys are ordered so seeded sampling repeats.
pub fn category_tallies<'a>(interacted: &[GameId], catalog: &'a [Game]) -> BTreeMap<&'a str, u64> {
    let by_id: HashMap<GameId, &Game> = catalog.iter().map(|game| (game.id, game)).collect();
    let mut tallies = BTreeMap::new();

    for game in interacted.iter().filter_map(|id| by_id.get(id)) {
        for genre in &game.genres {
            *tallies.entry(genre.as_str()).or_insert(0) += 1;
        }
    }

    tallies
}

/// Picks a genre weighted by how often the user engaged with it, then up to
/// `k` games from that genre uniformly without replacement.
///
/// Genres with fewer than `k` members are returned whole, in catalog order.
pub fn recommend_by_category<R: RandomSource + ?Sized>(
    interacted: &[GameId],
    catalog: &[Game],
    k: usize,
    rng: &mut R,
) -> Recommendation {
    if interacted.is_empty() {
        return Recommendation::NoHistory;
    }

    let (genres, weights): (Vec<&str>, Vec<u64>) =
        category_tallies(interacted, catalog).into_iter().unzip();
    let Some(choice) = rng.pick_weighted(&weights) else {
        return Recommendation::NothingToRecommend;
    };
    let genre = genres[choice];

    let members: Vec<&Game> = catalog.iter().filter(|game| game.has_genre(genre)).collect();
    let titles: Vec<String> = if members.len() <= k {
        members.iter().map(|game| game.title.clone()).collect()
    } else {
        rng.sample_indices(members.len(), k)
            .into_iter()
            .map(|index| members[index].title.clone())
            .collect()
    };

    tracing::debug!(genre, candidates = members.len(), picked = titles.len(), "Genre recommendation");

    Recommendation::Titles {
        titles,
        category: Some(genre.to_string()),
    }
}
