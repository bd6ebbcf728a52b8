//! Aggregated batch results.

use super::value::FieldValue;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::btree_map::{self, BTreeMap};

/// Aggregated view of a single field across a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldAggregate {
    /// One slot per item in submission order; `None` marks an item that
    /// did not define the field.
    Positional(Vec<Option<FieldValue>>),
    /// Occurrence count per canonical string form. Items lacking the field
    /// contribute nothing.
    Frequency(BTreeMap<String, u64>),
}

impl FieldAggregate {
    pub fn as_positional(&self) -> Option<&[Option<FieldValue>]> {
        match self {
            FieldAggregate::Positional(slots) => Some(slots),
            FieldAggregate::Frequency(_) => None,
        }
    }

    pub fn as_frequency(&self) -> Option<&BTreeMap<String, u64>> {
        match self {
            FieldAggregate::Frequency(counts) => Some(counts),
            FieldAggregate::Positional(_) => None,
        }
    }

    /// Number of items that defined the field.
    pub fn defined_count(&self) -> u64 {
        match self {
            FieldAggregate::Positional(slots) => slots.iter().filter(|s| s.is_some()).count() as u64,
            FieldAggregate::Frequency(counts) => counts.values().sum(),
        }
    }
}

impl Serialize for FieldAggregate {
    /// Positional slots serialize as a JSON array with `null` for missing
    /// entries; frequency maps serialize as an object of counts.
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FieldAggregate::Positional(slots) => slots.serialize(serializer),
            FieldAggregate::Frequency(counts) => counts.serialize(serializer),
        }
    }
}

/// Field name to aggregated view, for one batch. Fields are kept in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AggregatedResult(BTreeMap<String, FieldAggregate>);

impl AggregatedResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the aggregate for `field`, for custom reducers.
    pub fn insert(&mut self, field: impl Into<String>, aggregate: FieldAggregate) {
        self.0.insert(field.into(), aggregate);
    }

    pub fn get(&self, field: &str) -> Option<&FieldAggregate> {
        self.0.get(field)
    }

    pub fn positional(&self, field: &str) -> Option<&[Option<FieldValue>]> {
        self.get(field).and_then(FieldAggregate::as_positional)
    }

    pub fn frequency(&self, field: &str) -> Option<&BTreeMap<String, u64>> {
        self.get(field).and_then(FieldAggregate::as_frequency)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldAggregate> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, FieldAggregate> {
        self.0
    }

    /// JSON rendering. Missing positional slots and explicit nulls both become `null`.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(field, agg)| {
                    let v = match agg {
                        FieldAggregate::Positional(slots) => Value::Array(
                            slots
                                .iter()
                                .map(|s| s.clone().map_or(Value::Null, Value::from))
                                .collect(),
                        ),
                        FieldAggregate::Frequency(counts) => Value::Object(
                            counts
                                .iter()
                                .map(|(k, n)| (k.clone(), Value::from(*n)))
                                .collect(),
                        ),
                    };
                    (field.clone(), v)
                })
                .collect(),
        )
    }
}

impl<K: Into<String>> FromIterator<(K, FieldAggregate)> for AggregatedResult {
    fn from_iter<I: IntoIterator<Item = (K, FieldAggregate)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<'a> IntoIterator for &'a AggregatedResult {
    type Item = (&'a String, &'a FieldAggregate);
    type IntoIter = btree_map::Iter<'a, String, FieldAggregate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
