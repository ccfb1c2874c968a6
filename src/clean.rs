use std::io::Read;

use fnv::FnvHashSet;

use crate::anonymize::Anonymizer;
use crate::errors::{RecError, Result};
use crate::types::{InteractionRow, InteractionTable, ItemRow, ItemTable};

/// Column carrying the raw user identifier in the interaction source.
pub const USER_COLUMN: &str = "email";
/// Column carrying the item id in both sources.
pub const ITEM_ID_COLUMN: &str = "article_id";
/// Column carrying the item title in the interaction source.
pub const TITLE_COLUMN: &str = "title";

/// Pandas exports carry the old row index under this header (or an empty
/// one); such columns are discarded.
const PANDAS_INDEX_COLUMN: &str = "Unnamed: 0";

fn column_index(
    headers: &csv::StringRecord,
    column: &'static str,
    table: &'static str,
) -> Result<usize> {
    headers
        .iter()
        .position(|header| header == column)
        .ok_or(RecError::MissingColumn { column, table })
}

/// Coerces an item id cell to an integer. Sources exported through a float
/// dtype render ids as e.g. `1430.0`, so a float-formatted integral value
/// is accepted and truncated.
pub fn coerce_item_id(value: &str) -> Result<u32> {
    let trimmed = value.trim();

    if let Ok(id) = trimmed.parse::<u32>() {
        return Ok(id);
    }

    match trimmed.parse::<f64>() {
        Ok(float) if float.is_finite() && float >= 0.0 && float <= u32::MAX as f64 => {
            Ok(float as u32)
        }
        _ => Err(RecError::BadItemId {
            value: value.to_string(),
        }),
    }
}

fn is_missing(value: &str) -> bool {
    value.trim().is_empty()
}

/// Cleans the interaction source: drops rows with a missing user
/// identifier, coerces item ids to integers, and replaces the surviving
/// raw identifiers (in row order) with ids from the anonymizer. The raw
/// identifier column does not appear in the output.
pub fn clean_interactions<R: Read>(
    reader: &mut csv::Reader<R>,
    anonymizer: &mut Anonymizer,
) -> Result<InteractionTable> {
    let headers = reader.headers()?.clone();

    let user_idx = column_index(&headers, USER_COLUMN, "interaction")?;
    let item_idx = column_index(&headers, ITEM_ID_COLUMN, "interaction")?;
    let title_idx = column_index(&headers, TITLE_COLUMN, "interaction")?;

    let mut raw_identifiers = Vec::new();
    let mut survivors = Vec::new();

    for record in reader.records() {
        let record = record?;

        let raw_user = record.get(user_idx).unwrap_or("");
        if is_missing(raw_user) {
            continue;
        }

        let item_id = coerce_item_id(record.get(item_idx).unwrap_or(""))?;
        let title = record.get(title_idx).unwrap_or("").to_string();

        raw_identifiers.push(raw_user.to_string());
        survivors.push((item_id, title));
    }

    let user_ids = anonymizer.encode(raw_identifiers.iter().map(String::as_str));

    let rows = survivors
        .into_iter()
        .zip(user_ids)
        .map(|((item_id, title), user_id)| InteractionRow { item_id, title, user_id })
        .collect();

    Ok(InteractionTable::new(rows))
}

/// Cleans the item source: drops index columns, deduplicates by item id
/// keeping the first occurrence, and passes the remaining columns through
/// unchanged.
pub fn clean_items<R: Read>(reader: &mut csv::Reader<R>) -> Result<ItemTable> {
    let headers = reader.headers()?.clone();

    let kept: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, header)| !header.is_empty() && *header != PANDAS_INDEX_COLUMN)
        .map(|(idx, _)| idx)
        .collect();

    let id_idx = column_index(&headers, ITEM_ID_COLUMN, "item")?;

    let kept_headers: Vec<String> = kept
        .iter()
        .map(|&idx| headers.get(idx).unwrap_or("").to_string())
        .collect();

    let mut seen_ids = FnvHashSet::default();
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;

        let item_id = coerce_item_id(record.get(id_idx).unwrap_or(""))?;

        if !seen_ids.insert(item_id) {
            continue;
        }

        let fields = kept
            .iter()
            .map(|&idx| record.get(idx).unwrap_or("").to_string())
            .collect();

        rows.push(ItemRow { item_id, fields });
    }

    Ok(ItemTable::new(kept_headers, rows))
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::errors::RecError;

    fn reader(data: &str) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new().from_reader(data.as_bytes())
    }

    #[test]
    fn rows_with_missing_user_are_dropped_before_anonymization() {
        let data = "\
article_id,title,email
100,one hundred,alice@example.com
200,two hundred,
100,one hundred,bob@example.com
";
        let mut anonymizer = Anonymizer::new();
        let table = clean_interactions(&mut reader(data), &mut anonymizer).unwrap();

        assert_eq!(table.num_interactions(), 2);
        assert_eq!(table.rows()[0].user_id, 1);
        assert_eq!(table.rows()[1].user_id, 2);
        // the dropped row never consumed an id
        assert_eq!(anonymizer.num_identifiers(), 2);
    }

    #[test]
    fn float_formatted_item_ids_are_coerced() {
        let data = "\
article_id,title,email
1430.0,using pixiedust,alice@example.com
";
        let mut anonymizer = Anonymizer::new();
        let table = clean_interactions(&mut reader(data), &mut anonymizer).unwrap();

        assert_eq!(table.rows()[0].item_id, 1430);
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let data = "\
article_id,title
100,one hundred
";
        let mut anonymizer = Anonymizer::new();
        let result = clean_interactions(&mut reader(data), &mut anonymizer);

        match result {
            Err(RecError::MissingColumn { column, .. }) => assert_eq!(column, "email"),
            other => panic!("expected MissingColumn, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn non_numeric_item_id_is_fatal() {
        let data = "\
article_id,title,email
abc,broken,alice@example.com
";
        let mut anonymizer = Anonymizer::new();
        let result = clean_interactions(&mut reader(data), &mut anonymizer);

        assert!(matches!(result, Err(RecError::BadItemId { .. })));
    }

    #[test]
    fn index_column_is_discarded() {
        let data = "\
Unnamed: 0,article_id,title,email
0,100,one hundred,alice@example.com
";
        let mut anonymizer = Anonymizer::new();
        let table = clean_interactions(&mut reader(data), &mut anonymizer).unwrap();

        assert_eq!(table.rows()[0].item_id, 100);
        assert_eq!(table.rows()[0].title, "one hundred");
    }

    #[test]
    fn duplicate_items_keep_the_first_occurrence() {
        let data = "\
Unnamed: 0,article_id,doc_status,title
0,50,Live,the original title
1,60,Live,another item
2,50,Draft,a conflicting title
";
        let table = clean_items(&mut reader(data)).unwrap();

        assert_eq!(table.num_items(), 2);
        assert_eq!(table.headers(), &["article_id", "doc_status", "title"]);
        assert_eq!(table.rows()[0].item_id, 50);
        assert_eq!(
            table.rows()[0].fields,
            vec!["50", "Live", "the original title"]
        );
        assert_eq!(table.rows()[1].item_id, 60);
    }

    #[test]
    fn item_source_without_id_column_is_fatal() {
        let data = "\
doc_status,title
Live,untracked item
";
        let result = clean_items(&mut reader(data));

        assert!(matches!(
            result,
            Err(RecError::MissingColumn { column: "article_id", .. })
        ));
    }

    #[test]
    fn coercion_accepts_int_and_integral_float_only() {
        assert_eq!(coerce_item_id("7").unwrap(), 7);
        assert_eq!(coerce_item_id(" 7 ").unwrap(), 7);
        assert_eq!(coerce_item_id("1430.0").unwrap(), 1430);
        assert!(coerce_item_id("").is_err());
        assert!(coerce_item_id("NaN").is_err());
        assert!(coerce_item_id("-3").is_err());
    }
}
