/*
 * Userec
 * Copyright (C) 2026 The userec developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */
use fnv::{FnvHashMap, FnvHashSet};
use serde_derive::{Deserialize, Serialize};

/// One row of the clean interaction table. Serialized column names keep
/// the source vocabulary, so the clean CSV reads `article_id,title,user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRow {
    #[serde(rename = "article_id")]
    pub item_id: u32,
    pub title: String,
    pub user_id: u32,
}

/// The clean user-item interaction table, in cleaned source row order.
/// Raw user identifiers have already been replaced by anonymized ids.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionTable {
    rows: Vec<InteractionRow>,
}

impl InteractionTable {
    pub fn new(rows: Vec<InteractionRow>) -> Self {
        InteractionTable { rows }
    }

    pub fn rows(&self) -> &[InteractionRow] {
        &self.rows
    }

    pub fn num_interactions(&self) -> usize {
        self.rows.len()
    }

    pub fn contains_user(&self, user_id: u32) -> bool {
        self.rows.iter().any(|row| row.user_id == user_id)
    }

    /// Number of interaction rows per user. Repeated views count each time,
    /// unlike in the binarized matrix.
    pub fn interaction_counts(&self) -> FnvHashMap<u32, u32> {
        let mut counts = FnvHashMap::default();

        for row in &self.rows {
            *counts.entry(row.user_id).or_insert(0) += 1;
        }

        counts
    }

    /// Number of interaction rows per item, the popularity signal.
    pub fn view_counts(&self) -> FnvHashMap<u32, u32> {
        let mut counts = FnvHashMap::default();

        for row in &self.rows {
            *counts.entry(row.item_id).or_insert(0) += 1;
        }

        counts
    }

    /// Distinct titles recorded for an item id, in first-appearance row
    /// order. Usually a single title; upstream anomalies can associate
    /// several with one id, and all of them are reported.
    pub fn titles_for(&self, item_id: u32) -> Vec<&str> {
        let mut seen = FnvHashSet::default();
        let mut titles = Vec::new();

        for row in &self.rows {
            if row.item_id == item_id && seen.insert(row.title.as_str()) {
                titles.push(row.title.as_str());
            }
        }

        titles
    }
}

/// One row of the clean item table: the typed item id plus the remaining
/// source columns as opaque strings, aligned with [`ItemTable::headers`].
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRow {
    pub item_id: u32,
    pub fields: Vec<String>,
}

/// The clean item table. Only the item id carries semantics downstream;
/// the other columns pass through from the source unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemTable {
    headers: Vec<String>,
    rows: Vec<ItemRow>,
}

impl ItemTable {
    pub fn new(headers: Vec<String>, rows: Vec<ItemRow>) -> Self {
        ItemTable { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[ItemRow] {
        &self.rows
    }

    pub fn num_items(&self) -> usize {
        self.rows.len()
    }
}

/// Binary user×item presence matrix: 1 iff the user has at least one
/// interaction with the item, 0 otherwise.
///
/// Stored as sparse per-user item sets keyed by user id, with an ascending
/// enumeration of the realized user and item ids. Lookups behave as if the
/// matrix were dense: any (user, item) pair absent from the sets reads 0.
#[derive(Debug, Clone, PartialEq)]
pub struct UserItemMatrix {
    user_ids: Vec<u32>,
    item_ids: Vec<u32>,
    rows: FnvHashMap<u32, FnvHashSet<u32>>,
}

impl UserItemMatrix {
    /// Pivots the clean interaction table into the presence matrix:
    /// group by (user, item), count views, then collapse every count >= 1
    /// to presence.
    pub fn from_interactions(interactions: &InteractionTable) -> Self {
        let mut view_counts: FnvHashMap<u32, FnvHashMap<u32, u32>> = FnvHashMap::default();

        for row in interactions.rows() {
            *view_counts
                .entry(row.user_id)
                .or_insert_with(FnvHashMap::default)
                .entry(row.item_id)
                .or_insert(0) += 1;
        }

        let mut rows: FnvHashMap<u32, FnvHashSet<u32>> = FnvHashMap::default();
        let mut item_id_set = FnvHashSet::default();

        for (user_id, counts) in view_counts {
            let items: FnvHashSet<u32> = counts
                .into_iter()
                .filter(|&(_, count)| count >= 1)
                .map(|(item_id, _)| item_id)
                .collect();

            for &item_id in &items {
                item_id_set.insert(item_id);
            }

            rows.insert(user_id, items);
        }

        let mut user_ids: Vec<u32> = rows.keys().copied().collect();
        user_ids.sort_unstable();

        let mut item_ids: Vec<u32> = item_id_set.into_iter().collect();
        item_ids.sort_unstable();

        UserItemMatrix { user_ids, item_ids, rows }
    }

    /// Reassembles a matrix from per-user item sets and the realized item
    /// enumeration, as read back from the persisted artifact.
    pub fn from_rows(rows: FnvHashMap<u32, FnvHashSet<u32>>, item_ids: Vec<u32>) -> Self {
        let mut user_ids: Vec<u32> = rows.keys().copied().collect();
        user_ids.sort_unstable();

        UserItemMatrix { user_ids, item_ids, rows }
    }

    /// Realized user ids (rows), ascending.
    pub fn user_ids(&self) -> &[u32] {
        &self.user_ids
    }

    /// Realized item ids (columns), ascending.
    pub fn item_ids(&self) -> &[u32] {
        &self.item_ids
    }

    pub fn has_user(&self, user_id: u32) -> bool {
        self.rows.contains_key(&user_id)
    }

    pub fn value(&self, user_id: u32, item_id: u32) -> u8 {
        match self.rows.get(&user_id) {
            Some(items) if items.contains(&item_id) => 1,
            _ => 0,
        }
    }

    /// The set of items a user has interacted with. Empty for a user
    /// without a realized row.
    pub fn items_for(&self, user_id: u32) -> FnvHashSet<u32> {
        self.rows.get(&user_id).cloned().unwrap_or_default()
    }

    /// Dot product of two user rows: the number of items both users have
    /// interacted with. Symmetric; the self-product equals the user's own
    /// presence count.
    pub fn similarity(&self, user_a: u32, user_b: u32) -> u32 {
        match (self.rows.get(&user_a), self.rows.get(&user_b)) {
            (Some(a), Some(b)) => a.intersection(b).count() as u32,
            _ => 0,
        }
    }
}
