//! 类型模块：数据项、字段值与聚合结果。
//!
//! # Types Module
//!
//! Core data types flowing through the aggregator.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`FieldValue`] | Tagged union of field values with a canonical string form |
//! | [`DataItem`] | One submitted record, an open field-name to value map |
//! | [`AggregatedResult`] | Per-field aggregate of one batch |
//! | [`FieldAggregate`] | Positional slots or frequency counts for a field |
//!
//! ## Example
//!
//! ```rust
//! use batch_aggregator::types::{DataItem, FieldValue};
//!
//! let item = DataItem::new().with("input", "email").with("isValid", false);
//! assert_eq!(item.get("input"), Some(&FieldValue::from("email")));
//! ```

pub mod item;
pub mod result;
pub mod value;

pub use item::DataItem;
pub use result::{AggregatedResult, FieldAggregate};
pub use value::FieldValue;
