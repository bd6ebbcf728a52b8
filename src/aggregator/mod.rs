//! 批处理调度模块：缓冲数据项，延迟后归约并交付给回调。
//!
//! # Batch Scheduler Module
//!
//! An [`Aggregator`] buffers submitted [`DataItem`]s and, a fixed delay after the
//! first submission into an empty batch, reduces the whole batch into one
//! [`AggregatedResult`] delivered to the registered [`FlushCallback`].
//!
//! ## Lifecycle
//!
//! | Event | Effect |
//! |-------|--------|
//! | `submit` on an empty batch | Item appended, one-shot timer armed |
//! | `submit` with a timer armed | Item appended, nothing else |
//! | Timer fires | Timer cleared, batch drained, reduced, callback invoked |
//! | Callback fails or panics | Reported to the [`DiagnosticSink`], state unaffected |
//!
//! At most one timer is live per aggregator. The batch is drained before the
//! callback runs, so a callback may submit again and start a new batch.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Aggregator`] | Clonable handle owning the pending batch, timer and callback |
//! | [`AggregatorBuilder`] | Delay, mode, reducer, diagnostic sink and runtime selection |
//! | [`AggregatorConfig`] | Flush delay and aggregation mode, loadable from the environment |
//! | [`AggregatorStats`] | Counter snapshot |
//!
//! ## Example
//!
//! ```rust,no_run
//! use batch_aggregator::aggregator::Aggregator;
//! use batch_aggregator::types::DataItem;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> batch_aggregator::Result<()> {
//!     let aggregator = Aggregator::builder()
//!         .with_flush_delay(Duration::from_millis(500))
//!         .build()?;
//!
//!     aggregator.submit_with_callback(DataItem::new().with("input", "firstName"), |result| {
//!         println!("{}", result.to_json());
//!         Ok(())
//!     });
//!     aggregator.submit(DataItem::new().with("input", "lastName"));
//!
//!     tokio::time::sleep(Duration::from_secs(1)).await;
//!     Ok(())
//! }
//! ```
//!
//! [`DataItem`]: crate::types::DataItem
//! [`AggregatedResult`]: crate::types::AggregatedResult
//! [`DiagnosticSink`]: crate::diagnostics::DiagnosticSink

mod config;
mod scheduler;

pub use config::{AggregatorConfig, DEFAULT_FLUSH_DELAY, FLUSH_DELAY_ENV, MODE_ENV};
pub use scheduler::{Aggregator, AggregatorBuilder, AggregatorStats, FlushCallback};
