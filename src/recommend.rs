use fnv::{FnvHashMap, FnvHashSet};

use crate::neighbors;
use crate::types::{InteractionTable, UserItemMatrix};

/// A ranked recommendation list: item ids in rank order, and the titles
/// resolved for them through the clean interaction table. An item id with
/// several distinct recorded titles contributes all of them, so `titles`
/// can be longer than `item_ids`.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendations {
    pub item_ids: Vec<u32>,
    pub titles: Vec<String>,
}

/// A user is known iff it appears in the clean interaction table;
/// everybody else gets the cold-start popularity path.
pub fn is_known_user(user_id: u32, interactions: &InteractionTable) -> bool {
    interactions.contains_user(user_id)
}

/// All realized item ids ordered by view count (descending), ties broken
/// by ascending item id. Shared by the cold path and the warm path's
/// candidate ordering.
fn popularity_order(interactions: &InteractionTable) -> Vec<u32> {
    let view_counts = interactions.view_counts();

    let mut item_ids: Vec<u32> = view_counts.keys().copied().collect();
    item_ids.sort_unstable_by(|a, b| view_counts[b].cmp(&view_counts[a]).then(a.cmp(b)));

    item_ids
}

/// The `m` globally most-viewed item ids.
pub fn top_items(interactions: &InteractionTable, m: usize) -> Vec<u32> {
    let mut item_ids = popularity_order(interactions);
    item_ids.truncate(m);
    item_ids
}

/// User-based collaborative filtering: walks the target's neighbors from
/// most to least similar and collects each neighbor's items, skipping
/// anything the target has already seen and anything already collected,
/// in global popularity order within each neighbor. Stops at `m` items;
/// returns fewer only when every neighbor's unseen pool is exhausted.
pub fn user_user_recs(
    user_id: u32,
    m: usize,
    interactions: &InteractionTable,
    matrix: &UserItemMatrix,
) -> Vec<u32> {
    let seen = matrix.items_for(user_id);

    let popularity_rank: FnvHashMap<u32, usize> = popularity_order(interactions)
        .into_iter()
        .enumerate()
        .map(|(rank, item_id)| (item_id, rank))
        .collect();

    let mut recs = Vec::with_capacity(m);
    let mut collected = FnvHashSet::default();

    for neighbor in neighbors::rank_neighbors(user_id, interactions, matrix) {
        if recs.len() >= m {
            break;
        }

        let mut pool: Vec<u32> = matrix
            .items_for(neighbor.neighbor_id)
            .into_iter()
            .filter(|item_id| !seen.contains(item_id) && !collected.contains(item_id))
            .collect();

        // matrix items normally all carry a popularity rank; an item id
        // missing from the table sorts last, by id
        pool.sort_unstable_by_key(|&item_id| {
            (
                popularity_rank.get(&item_id).copied().unwrap_or(usize::MAX),
                item_id,
            )
        });

        for item_id in pool {
            collected.insert(item_id);
            recs.push(item_id);

            if recs.len() >= m {
                break;
            }
        }
    }

    recs
}

/// Resolves item ids to their recorded titles, flattening the distinct
/// titles per id in recommendation order.
pub fn item_titles(item_ids: &[u32], interactions: &InteractionTable) -> Vec<String> {
    item_ids
        .iter()
        .flat_map(|&item_id| interactions.titles_for(item_id))
        .map(str::to_string)
        .collect()
}

/// Produces up to `m` recommendations for `user_id`: neighbor-based
/// filtering for a known user, global popularity for an unknown one.
pub fn recommend(
    user_id: u32,
    m: usize,
    interactions: &InteractionTable,
    matrix: &UserItemMatrix,
) -> Recommendations {
    let item_ids = if is_known_user(user_id, interactions) {
        user_user_recs(user_id, m, interactions, matrix)
    } else {
        top_items(interactions, m)
    };

    let titles = item_titles(&item_ids, interactions);

    Recommendations { item_ids, titles }
}
