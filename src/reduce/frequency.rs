//! Frequency reduction: occurrence counts per canonical value.

use super::field_union;
use crate::types::{AggregatedResult, DataItem, FieldAggregate};
use std::collections::BTreeMap;

pub(crate) fn reduce_frequency(items: &[DataItem]) -> AggregatedResult {
    let mut result = AggregatedResult::new();
    for field in field_union(items) {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        // An explicit null defines the field and is counted under "null".
        for value in items.iter().filter_map(|item| item.get(field)) {
            *counts.entry(value.canonical_string()).or_insert(0) += 1;
        }
        result.insert(field.to_string(), FieldAggregate::Frequency(counts));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldValue;

    fn counts(pairs: &[(&str, u64)]) -> BTreeMap<String, u64> {
        pairs.iter().map(|(k, n)| (k.to_string(), *n)).collect()
    }

    #[test]
    fn test_counts_repeated_values() {
        let items = vec![
            DataItem::new().with("a", 1),
            DataItem::new().with("a", 1),
            DataItem::new().with("a", 2),
        ];
        let r = reduce_frequency(&items);
        assert_eq!(r.frequency("a").unwrap(), &counts(&[("1", 2), ("2", 1)]));
    }

    #[test]
    fn test_number_and_string_collide() {
        let items = vec![
            DataItem::new().with("a", 2),
            DataItem::new().with("a", "2"),
            DataItem::new().with("a", 2.0),
        ];
        let r = reduce_frequency(&items);
        assert_eq!(r.frequency("a").unwrap(), &counts(&[("2", 3)]));
    }

    #[test]
    fn test_absent_fields_contribute_nothing() {
        let items = vec![
            DataItem::new().with("a", true),
            DataItem::new().with("b", "x"),
            DataItem::new().with("a", FieldValue::Null),
        ];
        let r = reduce_frequency(&items);
        assert_eq!(r.frequency("a").unwrap(), &counts(&[("null", 1), ("true", 1)]));
        assert_eq!(r.frequency("b").unwrap(), &counts(&[("x", 1)]));
    }
}
