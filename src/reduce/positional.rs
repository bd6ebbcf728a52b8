//! Positional reduction: one slot per item per field.

use super::field_union;
use crate::types::{AggregatedResult, DataItem, FieldAggregate};

pub(crate) fn reduce_positional(items: &[DataItem]) -> AggregatedResult {
    let mut result = AggregatedResult::new();
    for field in field_union(items) {
        let slots = items.iter().map(|item| item.get(field).cloned()).collect();
        result.insert(field.to_string(), FieldAggregate::Positional(slots));
    }
    result
}
