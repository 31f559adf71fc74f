use hashbrown::HashMap;

use crate::{drill::DrillRecord, types::DrillKey};

/// Mapping from drill key to record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrillTable {
    records: HashMap<DrillKey, DrillRecord>,
}

impl DrillTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&DrillRecord> {
        self.records.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Inserts or overwrites the record at `key`, returning the previous one.
    pub fn insert(&mut self, key: DrillKey, rec: DrillRecord) -> Option<DrillRecord> {
        self.records.insert(key, rec)
    }

    pub fn remove(&mut self, key: &str) -> Option<DrillRecord> {
        self.records.remove(key)
    }

    /// Copies every entry of `other` into `self`; entries of `other` win on
    /// key collision. Returns the number of merged entries.
    pub fn merge_from(&mut self, other: DrillTable) -> usize {
        let merged = other.records.len();
        self.records.extend(other.records);
        merged
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DrillKey, &DrillRecord)> {
        self.records.iter()
    }

    /// Entries ordered by key.
    pub fn sorted_entries(&self) -> Vec<(&DrillKey, &DrillRecord)> {
        let mut entries: Vec<_> = self.records.iter().collect();
        entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
        entries
    }
}

impl FromIterator<(DrillKey, DrillRecord)> for DrillTable {
    fn from_iter<I: IntoIterator<Item = (DrillKey, DrillRecord)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<DrillRecord> for DrillTable {
    fn from_iter<I: IntoIterator<Item = DrillRecord>>(iter: I) -> Self {
        iter.into_iter().map(|rec| (rec.key(), rec)).collect()
    }
}
