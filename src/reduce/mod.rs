//! 归约模块：将一批数据项归约为单个聚合结果。
//!
//! # Reduction Module
//!
//! Pure functions turning a batch of [`DataItem`]s into one [`AggregatedResult`].
//!
//! ## Modes
//!
//! | Mode | Per-field shape |
//! |------|-----------------|
//! | [`AggregationMode::Positional`] | One slot per item in submission order, `None` where the item lacks the field |
//! | [`AggregationMode::Frequency`] | Count per canonical string form (see [`FieldValue::canonical_string`]) |
//!
//! Both modes compute the union of field names across the batch. An empty batch
//! reduces to an empty result. Custom strategies plug in through the [`Reducer`]
//! trait, which is implemented for any `Fn(&[DataItem]) -> AggregatedResult`.
//!
//! ## Example
//!
//! ```rust
//! use batch_aggregator::reduce::{reduce, AggregationMode};
//! use batch_aggregator::types::DataItem;
//!
//! let items = vec![
//!     DataItem::new().with("a", 1),
//!     DataItem::new().with("a", 1),
//!     DataItem::new().with("a", 2),
//! ];
//! let result = reduce(&items, AggregationMode::Frequency);
//! assert_eq!(result.frequency("a").unwrap()["1"], 2);
//! ```
//!
//! [`FieldValue::canonical_string`]: crate::types::FieldValue::canonical_string

mod frequency;
mod positional;

use crate::types::{AggregatedResult, DataItem};
use crate::{Error, ErrorContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Selects how each field is aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    #[default]
    Positional,
    Frequency,
}

impl AggregationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationMode::Positional => "positional",
            AggregationMode::Frequency => "frequency",
        }
    }
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positional" => Ok(AggregationMode::Positional),
            "frequency" => Ok(AggregationMode::Frequency),
            other => Err(Error::configuration_with_context(
                "unknown aggregation mode",
                ErrorContext::new()
                    .with_details(format!("expected 'positional' or 'frequency', got '{}'", other)),
            )),
        }
    }
}

/// A reduction strategy. Must be pure: the scheduler calls it outside any lock
/// and may call it from the timer task.
pub trait Reducer: Send + Sync {
    fn reduce(&self, items: &[DataItem]) -> AggregatedResult;
}

impl Reducer for AggregationMode {
    fn reduce(&self, items: &[DataItem]) -> AggregatedResult {
        reduce(items, *self)
    }
}

impl<F> Reducer for F
where
    F: Fn(&[DataItem]) -> AggregatedResult + Send + Sync,
{
    fn reduce(&self, items: &[DataItem]) -> AggregatedResult {
        self(items)
    }
}

/// Reduces `items` with the given mode.
pub fn reduce(items: &[DataItem], mode: AggregationMode) -> AggregatedResult {
    if items.is_empty() {
        return AggregatedResult::new();
    }
    match mode {
        AggregationMode::Positional => positional::reduce_positional(items),
        AggregationMode::Frequency => frequency::reduce_frequency(items),
    }
}

/// Synchronous entry point: reduces an explicit batch with the default
/// (positional) mode, bypassing any buffering.
pub fn reduce_immediate(items: &[DataItem]) -> AggregatedResult {
    reduce(items, AggregationMode::default())
}

/// Like [`reduce_immediate`] with an explicit mode.
pub fn reduce_immediate_with(items: &[DataItem], mode: AggregationMode) -> AggregatedResult {
    reduce(items, mode)
}

fn field_union(items: &[DataItem]) -> BTreeSet<&str> {
    items.iter().flat_map(DataItem::fields).collect()
}
