use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use fnv::FnvHashMap;

use crate::errors::Result;

/// Maps raw user identifiers (e.g. email addresses) to stable small
/// integer ids.
///
/// Each distinct identifier is assigned the next unused integer, starting
/// at 1, the first time it is seen; later occurrences reuse the assigned
/// id. Ids are therefore dense in 1..=K for K distinct identifiers, and
/// the assignment order reflects first-appearance order in the input.
///
/// Persistence is a separate concern from assignment: [`Anonymizer::save`]
/// and [`Anonymizer::load`] move the mapping to and from durable storage,
/// so a rerun over the same input ordering reproduces identical ids.
pub struct Anonymizer {
    assignments: FnvHashMap<String, u32>,
    next_id: u32,
}

impl Anonymizer {
    pub fn new() -> Self {
        Anonymizer {
            assignments: FnvHashMap::with_capacity_and_hasher(100, Default::default()),
            next_id: 1,
        }
    }

    /// Returns the id for `raw`, assigning the next unused one on first
    /// sight.
    pub fn assign(&mut self, raw: &str) -> u32 {
        if let Some(&id) = self.assignments.get(raw) {
            return id;
        }

        let id = self.next_id;
        self.assignments.insert(raw.to_owned(), id);
        self.next_id += 1;

        id
    }

    /// Encodes an ordered sequence of raw identifiers into a same-length
    /// sequence of ids.
    pub fn encode<'a, I>(&mut self, raws: I) -> Vec<u32>
    where
        I: IntoIterator<Item = &'a str>,
    {
        raws.into_iter().map(|raw| self.assign(raw)).collect()
    }

    pub fn num_identifiers(&self) -> usize {
        self.assignments.len()
    }

    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, &self.assignments)?;
        Ok(())
    }

    pub fn load<R: Read>(reader: R) -> Result<Self> {
        let assignments: FnvHashMap<String, u32> = serde_json::from_reader(reader)?;
        let next_id = assignments.values().max().map_or(1, |max| max + 1);

        Ok(Anonymizer { assignments, next_id })
    }

    pub fn save_to(&self, path: &str) -> Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        self.save(BufWriter::new(file))
    }

    /// Reloads a persisted mapping, or starts an empty one if none has
    /// been saved yet.
    pub fn load_or_new(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            let file = File::open(path)?;
            Self::load(BufReader::new(file))
        } else {
            Ok(Self::new())
        }
    }
}

impl Default for Anonymizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {

    use super::Anonymizer;

    #[test]
    fn first_seen_order_assignment() {
        let mut anonymizer = Anonymizer::new();

        let ids = anonymizer.encode(vec!["a", "b", "a", "c"]);

        assert_eq!(ids, vec![1, 2, 1, 3]);
    }

    #[test]
    fn repeated_runs_are_deterministic() {
        let raws = vec!["x@y.com", "z@y.com", "x@y.com", "w@y.com", "z@y.com"];

        let first = Anonymizer::new().encode(raws.clone());
        let second = Anonymizer::new().encode(raws);

        assert_eq!(first, second);
    }

    #[test]
    fn distinct_identifiers_never_share_an_id() {
        let mut anonymizer = Anonymizer::new();

        let ids = anonymizer.encode(vec!["a", "b", "c", "b", "a"]);

        assert_eq!(ids[0], ids[4]);
        assert_eq!(ids[1], ids[3]);
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert_ne!(ids[0], ids[2]);
        assert_eq!(anonymizer.num_identifiers(), 3);
    }

    #[test]
    fn empty_input_yields_empty_mapping() {
        let mut anonymizer = Anonymizer::new();

        let ids = anonymizer.encode(std::iter::empty());

        assert!(ids.is_empty());
        assert_eq!(anonymizer.num_identifiers(), 0);
    }

    #[test]
    fn save_and_load_restore_assignments_and_counter() {
        let mut anonymizer = Anonymizer::new();
        anonymizer.encode(vec!["a", "b", "c"]);

        let mut buffer = Vec::new();
        anonymizer.save(&mut buffer).unwrap();

        let mut reloaded = Anonymizer::load(&buffer[..]).unwrap();

        // known identifiers keep their ids, new ones continue the counter
        assert_eq!(reloaded.assign("b"), 2);
        assert_eq!(reloaded.assign("d"), 4);
    }
}
