use crate::types::{InteractionTable, UserItemMatrix};

/// A user ranked by similarity to some target user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbor {
    pub neighbor_id: u32,
    /// Dot product of the neighbor's matrix row with the target's row.
    pub similarity: u32,
    /// The neighbor's total interaction count over the clean table.
    pub num_interactions: u32,
}

/// Ranks every realized user other than `user_id` by similarity to
/// `user_id`, most similar first.
///
/// Similarity is the presence-row dot product; ties break on the
/// neighbor's interaction count (descending), then on neighbor id
/// (ascending) so the ranking is reproducible. The caller must route
/// users without a realized matrix row to the popularity fallback instead.
pub fn rank_neighbors(
    user_id: u32,
    interactions: &InteractionTable,
    matrix: &UserItemMatrix,
) -> Vec<Neighbor> {
    let interaction_counts = interactions.interaction_counts();

    let mut neighbors: Vec<Neighbor> = matrix
        .user_ids()
        .iter()
        .filter(|&&other| other != user_id)
        .map(|&other| Neighbor {
            neighbor_id: other,
            similarity: matrix.similarity(user_id, other),
            num_interactions: interaction_counts.get(&other).copied().unwrap_or(0),
        })
        .collect();

    neighbors.sort_by(|a, b| {
        b.similarity
            .cmp(&a.similarity)
            .then(b.num_interactions.cmp(&a.num_interactions))
            .then(a.neighbor_id.cmp(&b.neighbor_id))
    });

    neighbors
}
