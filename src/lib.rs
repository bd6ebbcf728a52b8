//! # batch-aggregator
//!
//! 轻量级进程内数据聚合器：缓冲小记录，延迟后将整批归约为一个聚合结构。
//!
//! Lightweight in-process data aggregator. Callers repeatedly submit small
//! records; the aggregator buffers them and, a fixed delay after the first
//! record of a batch, reduces the batch into a single aggregated structure
//! handed to a caller-supplied callback.
//!
//! ## Overview
//!
//! - **Buffered**: [`Aggregator::submit`] appends to the pending batch and arms a
//!   one-shot flush timer; it never blocks and never fails
//! - **Immediate**: [`reduce_immediate`] reduces an explicit batch synchronously
//! - **Two reduction modes**: positional slots or frequency counts, selected per
//!   aggregator via [`AggregationMode`], or any custom [`reduce::Reducer`]
//! - **Recovered callback failures**: errors and panics in the flush callback go to
//!   a pluggable [`diagnostics::DiagnosticSink`] instead of the caller
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use batch_aggregator::{Aggregator, DataItem};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> batch_aggregator::Result<()> {
//!     let aggregator = Aggregator::builder()
//!         .with_flush_delay(Duration::from_millis(200))
//!         .with_callback(|result| {
//!             println!("flushed: {}", result.to_json());
//!             Ok(())
//!         })
//!         .build()?;
//!
//!     for field in ["firstName", "lastName", "email"] {
//!         aggregator.submit(DataItem::new().with("input", field));
//!     }
//!
//!     tokio::time::sleep(Duration::from_millis(300)).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`aggregator`] | Batch scheduler, builder and configuration |
//! | [`reduce`] | Positional and frequency reducers |
//! | [`types`] | Data items, field values and aggregated results |
//! | [`diagnostics`] | Diagnostic events and sinks |

pub mod aggregator;
pub mod diagnostics;
pub mod reduce;
pub mod types;

// Re-export main types for convenience
pub use aggregator::{Aggregator, AggregatorBuilder, AggregatorConfig, FlushCallback};
pub use reduce::{reduce, reduce_immediate, reduce_immediate_with, AggregationMode};
pub use types::{AggregatedResult, DataItem, FieldAggregate, FieldValue};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};

/// Common imports.
pub mod prelude {
    pub use crate::aggregator::{Aggregator, AggregatorConfig, AggregatorStats};
    pub use crate::diagnostics::{DiagnosticEvent, DiagnosticSink, InMemoryDiagnosticSink};
    pub use crate::reduce::{reduce, reduce_immediate, AggregationMode, Reducer};
    pub use crate::types::{AggregatedResult, DataItem, FieldAggregate, FieldValue};
    pub use crate::{Error, Result};
}
