//! Record storage and aggregation.
use super::{Record, RecordValue};
use std::collections::HashSet;
use xxhash_rust::xxh3::Xxh3Builder;

/// Stores records and aggregates them by key.
///
/// Scalar values are aggregated into min/max/mean/median; for any other
/// value type the most recent occurrence wins.
#[derive(Default)]
pub struct RecordStorage {
    data: Vec<Record>,
}

fn min(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(*vs.iter().min_by(|x, y| x.total_cmp(y)).unwrap())
}

fn max(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(*vs.iter().max_by(|x, y| x.total_cmp(y)).unwrap())
}

fn mean(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().sum::<f32>() / vs.len() as f32)
}

/// Note that this function sorts the given vector in place.
fn median(mut vs: Vec<f32>) -> RecordValue {
    vs.sort_by(|x, y| x.total_cmp(y));
    RecordValue::Scalar(vs[vs.len() / 2])
}

impl RecordStorage {
    /// Creates a new empty record storage.
    pub fn new() -> Self {
        Self { data: vec![] }
    }

    /// Stores a record.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    fn keys(&self) -> HashSet<String, Xxh3Builder> {
        let mut keys = HashSet::<String, Xxh3Builder>::default();
        for record in self.data.iter() {
            for k in record.keys() {
                keys.insert(k.clone());
            }
        }
        keys
    }

    /// The most recent value for `key`, regardless of type.
    fn latest(&self, key: &str) -> RecordValue {
        for record in self.data.iter().rev() {
            if let Some(value) = record.get(key) {
                return value.clone();
            }
        }
        panic!("Key '{}' was not found.", key);
    }

    /// Aggregates the scalar occurrences of `key`.
    fn scalar(&self, key: &str) -> Record {
        let vs: Vec<f32> = self
            .data
            .iter()
            .filter_map(|record| match record.get(key) {
                Some(RecordValue::Scalar(v)) => Some(*v),
                Some(_) => panic!("Expect RecordValue::Scalar for {}", key),
                None => None,
            })
            .collect();

        if vs.len() == 1 {
            Record::from_slice(&[(key.to_string(), RecordValue::Scalar(vs[0]))])
        } else {
            Record::from_slice(&[
                (format!("{}_min", key), min(&vs)),
                (format!("{}_max", key), max(&vs)),
                (format!("{}_mean", key), mean(&vs)),
                (format!("{}_median", key), median(vs)),
            ])
        }
    }

    /// Aggregates all stored records and clears the storage.
    pub fn aggregate(&mut self) -> Record {
        let mut record = Record::empty();

        for key in self.keys().iter() {
            let r = match self.latest(key) {
                RecordValue::Scalar(..) => self.scalar(key),
                value => Record::from_slice(&[(key.to_string(), value)]),
            };
            record = record.merge(r);
        }

        self.data = vec![];

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregates_scalars() {
        let mut storage = RecordStorage::new();
        for v in [3f32, 1.0, 2.0] {
            storage.store(Record::from_scalar("loss", v));
        }

        let record = storage.aggregate();
        assert_eq!(record.get_scalar("loss_min").unwrap(), 1.0);
        assert_eq!(record.get_scalar("loss_max").unwrap(), 3.0);
        assert_eq!(record.get_scalar("loss_mean").unwrap(), 2.0);
        assert_eq!(record.get_scalar("loss_median").unwrap(), 2.0);

        // The storage is cleared on aggregation.
        assert!(storage.aggregate().is_empty());
    }

    #[test]
    fn single_scalar_passes_through() {
        let mut storage = RecordStorage::new();
        storage.store(Record::from_scalar("loss", 0.5));
        let record = storage.aggregate();
        assert_eq!(record.get_scalar("loss").unwrap(), 0.5);
    }

    #[test]
    fn latest_string_wins() {
        let mut storage = RecordStorage::new();
        storage.store(Record::from_slice(&[(
            "phase",
            RecordValue::String("warmup".to_string()),
        )]));
        storage.store(Record::from_slice(&[(
            "phase",
            RecordValue::String("train".to_string()),
        )]));
        let record = storage.aggregate();
        assert_eq!(record.get_string("phase").unwrap(), "train");
    }
}
