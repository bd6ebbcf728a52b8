//! Tests for the positional and frequency reducers through the public API

use batch_aggregator::prelude::*;
use batch_aggregator::reduce_immediate_with;
use serde_json::json;
use std::collections::BTreeMap;

fn item(v: serde_json::Value) -> DataItem {
    DataItem::try_from(v).expect("object literal")
}

#[test]
fn test_immediate_aggregates_form_fields() {
    let items = vec![
        item(json!({"input": "firstName", "isValid": true, "isRequired": true})),
        item(json!({"input": "lastName", "isValid": true, "isRequired": true})),
        item(json!({"input": "email", "isValid": false, "isRequired": true})),
    ];

    let result = reduce_immediate(&items);

    assert_eq!(
        result.to_json(),
        json!({
            "input": ["firstName", "lastName", "email"],
            "isValid": [true, true, false],
            "isRequired": [true, true, true]
        })
    );
}

#[test]
fn test_immediate_empty_batch() {
    assert!(reduce_immediate(&[]).is_empty());
    assert_eq!(reduce_immediate(&[]).to_json(), json!({}));
}

#[test]
fn test_immediate_single_item() {
    let result = reduce_immediate(&[item(json!({"name": "John", "age": 30}))]);
    assert_eq!(result.to_json(), json!({"name": ["John"], "age": [30]}));
}

#[test]
fn test_heterogeneous_fields_get_missing_markers() {
    let items = vec![
        item(json!({"field1": "value1", "field2": "value2"})),
        item(json!({"field2": "value3", "field3": "value4"})),
    ];

    let result = reduce_immediate(&items);

    assert_eq!(
        result.positional("field1").unwrap(),
        &[Some(FieldValue::from("value1")), None]
    );
    assert_eq!(
        result.positional("field2").unwrap(),
        &[
            Some(FieldValue::from("value2")),
            Some(FieldValue::from("value3"))
        ]
    );
    assert_eq!(
        result.positional("field3").unwrap(),
        &[None, Some(FieldValue::from("value4"))]
    );
}

#[test]
fn test_positional_slot_count_equals_batch_size() {
    let items: Vec<DataItem> = (0..7)
        .map(|i| {
            let mut it = DataItem::new().with("always", i);
            if i % 3 == 0 {
                it.insert("sometimes", format!("v{}", i));
            }
            it
        })
        .collect();

    let result = reduce_immediate(&items);

    for (field, agg) in &result {
        let slots = agg.as_positional().unwrap();
        assert_eq!(slots.len(), items.len(), "field {}", field);
        for (slot, it) in slots.iter().zip(&items) {
            assert_eq!(slot.as_ref(), it.get(field));
        }
    }
    assert_eq!(result.get("sometimes").unwrap().defined_count(), 3);
}

#[test]
fn test_frequency_counts() {
    let items = vec![
        item(json!({"a": 1})),
        item(json!({"a": 1})),
        item(json!({"a": 2})),
    ];

    let result = reduce(&items, AggregationMode::Frequency);

    assert_eq!(result.to_json(), json!({"a": {"1": 2, "2": 1}}));
}

#[test]
fn test_frequency_canonical_string_collisions() {
    let items = vec![
        item(json!({"v": 2})),
        item(json!({"v": "2"})),
        item(json!({"v": 2.0})),
        item(json!({"v": true})),
        item(json!({"v": "true"})),
        item(json!({"v": 2.5})),
    ];

    let result = reduce_immediate_with(&items, AggregationMode::Frequency);

    let expected: BTreeMap<String, u64> = [("2", 3), ("true", 2), ("2.5", 1)]
        .into_iter()
        .map(|(k, n)| (k.to_string(), n))
        .collect();
    assert_eq!(result.frequency("v").unwrap(), &expected);
}

#[test]
fn test_frequency_sums_to_defining_items() {
    let items = vec![
        item(json!({"a": "x", "b": 1})),
        item(json!({"a": "y"})),
        item(json!({"a": "x", "c": null})),
        item(json!({})),
    ];

    let result = reduce(&items, AggregationMode::Frequency);

    for (field, agg) in &result {
        let defining = items.iter().filter(|it| it.contains_field(field)).count() as u64;
        assert_eq!(agg.defined_count(), defining, "field {}", field);
    }
    assert_eq!(result.frequency("c").unwrap()["null"], 1);
}

#[test]
fn test_custom_reducer_closure() {
    let only_first = |items: &[DataItem]| reduce_immediate(&items[..1.min(items.len())]);
    let result = only_first.reduce(&[item(json!({"a": 1})), item(json!({"a": 2}))]);
    assert_eq!(result.to_json(), json!({"a": [1]}));
}
