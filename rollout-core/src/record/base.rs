//! Base implementation of records for logging.
use crate::error::RolloutError;
use chrono::prelude::{DateTime, Local};
use std::{
    collections::{
        hash_map::{Iter, Keys},
        HashMap,
    },
    convert::Into,
};

/// Represents possible types of values in a [`Record`].
#[derive(Debug, Clone)]
pub enum RecordValue {
    /// Scalar, typically a metric like loss or accuracy.
    Scalar(f32),

    /// DateTime.
    DateTime(DateTime<Local>),

    /// A 1-dimensional array, e.g. a return trace.
    Array1(Vec<f32>),

    /// String.
    String(String),
}

/// Represents a record, a string-keyed container of metric values.
#[derive(Debug)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Construct empty record.
    pub fn empty() -> Self {
        Self {
            0: HashMap::new(),
        }
    }

    /// Construct a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self {
            0: HashMap::from([(name.into(), RecordValue::Scalar(value))]),
        }
    }

    /// Create a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Get keys.
    pub fn keys(&self) -> Keys<String, RecordValue> {
        self.0.keys()
    }

    /// Insert a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Return an iterator over key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Get the value of the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merge records, the second record overwriting on key collisions.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Get scalar value.
    pub fn get_scalar(&self, k: &str) -> Result<f32, RolloutError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::Scalar(v) => Ok(*v as _),
                _ => Err(RolloutError::RecordValueTypeError("Scalar".to_string())),
            }
        } else {
            Err(RolloutError::RecordKeyError(k.to_string()))
        }
    }

    /// Get 1-dimensional array value.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, RolloutError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::Array1(v) => Ok(v.clone()),
                _ => Err(RolloutError::RecordValueTypeError("Array1".to_string())),
            }
        } else {
            Err(RolloutError::RecordKeyError(k.to_string()))
        }
    }

    /// Get String value.
    pub fn get_string(&self, k: &str) -> Result<String, RolloutError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::String(s) => Ok(s.clone()),
                _ => Err(RolloutError::RecordValueTypeError("String".to_string())),
            }
        } else {
            Err(RolloutError::RecordKeyError(k.to_string()))
        }
    }

    /// Returns true if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.0.len() == 0
    }
}
