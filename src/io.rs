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

//! Delimited-file transport for the clean artifacts.
//!
//! The cleaning stage writes three UTF-8 CSV artifacts plus the identity
//! mapping to fixed locations; the recommendation stage reads them back.
//! The file paths are one possible transport for the typed artifacts, not
//! part of their semantics.

use std::fs::{self, File};
use std::io::{Read, Write};

use fnv::{FnvHashMap, FnvHashSet};

use crate::anonymize::Anonymizer;
use crate::errors::{RecError, Result};
use crate::types::{InteractionRow, InteractionTable, ItemTable, UserItemMatrix};

pub const OUTPUT_DIR: &str = "data/processed";
pub const INTERACTIONS_PATH: &str = "data/processed/user-item-clean.csv";
pub const ITEMS_PATH: &str = "data/processed/item-clean.csv";
pub const MATRIX_PATH: &str = "data/processed/user-item-matrix.csv";
pub const MAPPING_PATH: &str = "data/identity/encodings.json";

/// Reads a CSV source file. Sources carry a header line naming their
/// columns.
pub fn csv_reader(path: &str) -> Result<csv::Reader<File>> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    Ok(reader)
}

fn open_artifact(path: &str) -> Result<File> {
    File::open(path).map_err(|source| RecError::MissingArtifact {
        path: path.to_string(),
        source,
    })
}

pub fn write_interactions<W: Write>(writer: W, interactions: &InteractionTable) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for row in interactions.rows() {
        csv_writer.serialize(row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn read_interactions<R: Read>(reader: R) -> Result<InteractionTable> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.deserialize() {
        let row: InteractionRow = record?;
        rows.push(row);
    }

    Ok(InteractionTable::new(rows))
}

pub fn write_items<W: Write>(writer: W, items: &ItemTable) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(items.headers())?;
    for row in items.rows() {
        csv_writer.write_record(&row.fields)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Writes the presence matrix as `user_id,<item id>…` with one `0`/`1`
/// row per realized user. The original export dropped the user index;
/// carrying it makes the artifact self-describing on reload.
pub fn write_matrix<W: Write>(writer: W, matrix: &UserItemMatrix) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec!["user_id".to_string()];
    header.extend(matrix.item_ids().iter().map(u32::to_string));
    csv_writer.write_record(&header)?;

    for &user_id in matrix.user_ids() {
        let mut record = vec![user_id.to_string()];
        record.extend(
            matrix
                .item_ids()
                .iter()
                .map(|&item_id| matrix.value(user_id, item_id).to_string()),
        );
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn read_matrix<R: Read>(reader: R) -> Result<UserItemMatrix> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let mut item_ids = Vec::with_capacity(headers.len().saturating_sub(1));

    for header in headers.iter().skip(1) {
        let item_id = header.parse::<u32>().map_err(|_| {
            RecError::MalformedMatrix(format!("item id column '{}' is not an integer", header))
        })?;
        item_ids.push(item_id);
    }

    let mut rows: FnvHashMap<u32, FnvHashSet<u32>> = FnvHashMap::default();

    for record in csv_reader.records() {
        let record = record?;

        let user_field = record.get(0).unwrap_or("");
        let user_id = user_field.parse::<u32>().map_err(|_| {
            RecError::MalformedMatrix(format!("user id '{}' is not an integer", user_field))
        })?;

        let mut items = FnvHashSet::default();
        for (idx, &item_id) in item_ids.iter().enumerate() {
            match record.get(idx + 1) {
                Some("1") => {
                    items.insert(item_id);
                }
                Some("0") | None => {}
                Some(other) => {
                    return Err(RecError::MalformedMatrix(format!(
                        "cell '{}' for user {} is neither 0 nor 1",
                        other, user_id
                    )));
                }
            }
        }

        rows.insert(user_id, items);
    }

    Ok(UserItemMatrix::from_rows(rows, item_ids))
}

/// Saves the three clean artifacts. Each one is first written to a `.tmp`
/// sibling; the renames to the final names only happen after every write
/// succeeded, so a failure mid-write leaves any previous artifacts intact.
pub fn save_artifacts(
    interactions: &InteractionTable,
    items: &ItemTable,
    matrix: &UserItemMatrix,
) -> Result<()> {
    fs::create_dir_all(OUTPUT_DIR)?;

    write_interactions(File::create(tmp_path(INTERACTIONS_PATH))?, interactions)?;
    write_items(File::create(tmp_path(ITEMS_PATH))?, items)?;
    write_matrix(File::create(tmp_path(MATRIX_PATH))?, matrix)?;

    for path in &[INTERACTIONS_PATH, ITEMS_PATH, MATRIX_PATH] {
        fs::rename(tmp_path(path), path)?;
    }

    Ok(())
}

fn tmp_path(path: &str) -> String {
    format!("{}.tmp", path)
}

/// Loads the three clean artifacts from their fixed locations. Fails with
/// a pointer at the cleaning stage if any of them is absent.
pub fn load_artifacts() -> Result<(InteractionTable, ItemTable, UserItemMatrix)> {
    let interactions = read_interactions(open_artifact(INTERACTIONS_PATH)?)?;
    let items = read_items(open_artifact(ITEMS_PATH)?)?;
    let matrix = read_matrix(open_artifact(MATRIX_PATH)?)?;

    Ok((interactions, items, matrix))
}

pub fn read_items<R: Read>(reader: R) -> Result<ItemTable> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();

    let id_idx = headers
        .iter()
        .position(|header| header == crate::clean::ITEM_ID_COLUMN)
        .ok_or(RecError::MissingColumn {
            column: crate::clean::ITEM_ID_COLUMN,
            table: "clean item",
        })?;

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;

        let item_id = crate::clean::coerce_item_id(record.get(id_idx).unwrap_or(""))?;
        let fields = record.iter().map(str::to_string).collect();

        rows.push(crate::types::ItemRow { item_id, fields });
    }

    Ok(ItemTable::new(headers, rows))
}

/// Persists the identity mapping; read and written only here and by the
/// Anonymizer itself.
pub fn save_mapping(anonymizer: &Anonymizer) -> Result<()> {
    anonymizer.save_to(MAPPING_PATH)
}

pub fn load_or_new_mapping() -> Result<Anonymizer> {
    Anonymizer::load_or_new(MAPPING_PATH)
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::types::{InteractionRow, ItemRow};

    fn row(user_id: u32, item_id: u32, title: &str) -> InteractionRow {
        InteractionRow { item_id, title: title.to_string(), user_id }
    }

    #[test]
    fn interaction_table_round_trips_with_source_vocabulary() {
        let table = InteractionTable::new(vec![
            row(1, 1430, "using pixiedust"),
            row(2, 100, "a title, with a comma"),
        ]);

        let mut buffer = Vec::new();
        write_interactions(&mut buffer, &table).unwrap();

        let written = String::from_utf8(buffer.clone()).unwrap();
        assert!(written.starts_with("article_id,title,user_id\n"));

        let reloaded = read_interactions(&buffer[..]).unwrap();
        assert_eq!(reloaded, table);
    }

    #[test]
    fn matrix_round_trips() {
        let table = InteractionTable::new(vec![
            row(1, 10, "a"),
            row(1, 30, "c"),
            row(2, 20, "b"),
        ]);
        let matrix = UserItemMatrix::from_interactions(&table);

        let mut buffer = Vec::new();
        write_matrix(&mut buffer, &matrix).unwrap();

        let reloaded = read_matrix(&buffer[..]).unwrap();

        assert_eq!(reloaded, matrix);
        assert_eq!(reloaded.value(1, 10), 1);
        assert_eq!(reloaded.value(2, 10), 0);
    }

    #[test]
    fn malformed_matrix_cells_are_rejected() {
        let data = "user_id,10,20\n1,1,2\n";

        let result = read_matrix(data.as_bytes());

        assert!(matches!(result, Err(RecError::MalformedMatrix(_))));
    }

    #[test]
    fn item_table_round_trips() {
        let table = ItemTable::new(
            vec!["article_id".into(), "doc_status".into(), "title".into()],
            vec![ItemRow {
                item_id: 50,
                fields: vec!["50".into(), "Live".into(), "a title".into()],
            }],
        );

        let mut buffer = Vec::new();
        write_items(&mut buffer, &table).unwrap();

        let reloaded = read_items(&buffer[..]).unwrap();
        assert_eq!(reloaded, table);
    }
}
