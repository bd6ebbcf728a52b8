//! Delayed-flush batch scheduler.

use super::config::AggregatorConfig;
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink, TracingDiagnosticSink};
use crate::reduce::{AggregationMode, Reducer};
use crate::types::{AggregatedResult, DataItem};
use crate::{Error, ErrorContext, Result};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Receives the aggregated result of each flushed batch. Returning `Err` or
/// panicking is reported to the diagnostic sink and otherwise ignored.
pub type FlushCallback = Arc<dyn Fn(AggregatedResult) -> anyhow::Result<()> + Send + Sync>;

/// Point-in-time view of an aggregator's counters and state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatorStats {
    pub items_submitted: u64,
    pub batches_flushed: u64,
    pub items_flushed: u64,
    pub callback_failures: u64,
    pub pending: usize,
    pub timer_armed: bool,
}

struct State {
    pending: Vec<DataItem>,
    timer: Option<JoinHandle<()>>,
    callback: Option<FlushCallback>,
}

struct AtomicStats {
    items_submitted: AtomicU64,
    batches_flushed: AtomicU64,
    items_flushed: AtomicU64,
    callback_failures: AtomicU64,
}

impl AtomicStats {
    fn new() -> Self {
        Self {
            items_submitted: AtomicU64::new(0),
            batches_flushed: AtomicU64::new(0),
            items_flushed: AtomicU64::new(0),
            callback_failures: AtomicU64::new(0),
        }
    }
}

struct Inner {
    config: AggregatorConfig,
    reducer: Arc<dyn Reducer>,
    sink: Arc<dyn DiagnosticSink>,
    runtime: Handle,
    state: Mutex<State>,
    stats: AtomicStats,
}

impl Inner {
    // Nothing panics while the lock is held, but a poisoned lock must not
    // turn `submit` into a panic either.
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs when the timer fires. The batch is drained and the timer cleared
    /// before the reducer or callback runs, so a callback that submits starts a
    /// fresh batch with its own timer.
    fn flush(&self) {
        let (batch, callback) = {
            let mut st = self.lock_state();
            st.timer = None;
            if st.pending.is_empty() {
                return;
            }
            (std::mem::take(&mut st.pending), st.callback.clone())
        };

        let batch_size = batch.len();
        let result = self.reducer.reduce(&batch);
        self.stats.batches_flushed.fetch_add(1, Ordering::Relaxed);
        self.stats
            .items_flushed
            .fetch_add(batch_size as u64, Ordering::Relaxed);
        self.sink.report(&DiagnosticEvent::BatchFlushed {
            batch_size,
            fields: result.len(),
        });

        let Some(callback) = callback else {
            return;
        };
        let failure = match panic::catch_unwind(AssertUnwindSafe(|| callback(result))) {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some((format!("{:#}", e), false)),
            Err(payload) => Some((panic_message(payload.as_ref()), true)),
        };
        if let Some((message, panicked)) = failure {
            self.stats.callback_failures.fetch_add(1, Ordering::Relaxed);
            self.sink.report(&DiagnosticEvent::CallbackFailed {
                message,
                batch_size,
                panicked,
            });
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "flush callback panicked".to_string()
    }
}

/// Buffers submitted items and flushes them as one aggregated result after
/// the configured delay.
///
/// The first submission into an empty batch arms a one-shot timer; later
/// submissions only append. When the timer fires the batch is reduced and
/// handed to the most recently registered callback. Handles are cheap to
/// clone and share one batch.
///
/// There is no drain on drop: a live timer keeps the state alive and still
/// flushes, but items buffered when the runtime shuts down are lost.
#[derive(Clone)]
pub struct Aggregator {
    inner: Arc<Inner>,
}

impl Aggregator {
    pub fn builder() -> AggregatorBuilder {
        AggregatorBuilder::new()
    }

    /// Builds an aggregator on the current Tokio runtime.
    pub fn new(config: AggregatorConfig) -> Result<Self> {
        Self::builder().with_config(config).build()
    }

    /// Appends `item` to the pending batch, arming the flush timer if none is armed.
    pub fn submit(&self, item: impl Into<DataItem>) {
        self.push(item.into(), None);
    }

    /// Registers `callback` (replacing any previous one) and submits `item`.
    ///
    /// Registration is not tied to the batch: the pending batch is delivered to
    /// whichever callback is current when it flushes.
    pub fn submit_with_callback<F>(&self, item: impl Into<DataItem>, callback: F)
    where
        F: Fn(AggregatedResult) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.push(item.into(), Some(Arc::new(callback)));
    }

    /// Replaces the flush callback without submitting anything.
    pub fn set_callback<F>(&self, callback: F)
    where
        F: Fn(AggregatedResult) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.inner.lock_state().callback = Some(Arc::new(callback));
    }

    fn push(&self, item: DataItem, callback: Option<FlushCallback>) {
        let mut st = self.inner.lock_state();
        if let Some(cb) = callback {
            st.callback = Some(cb);
        }
        st.pending.push(item);
        self.inner
            .stats
            .items_submitted
            .fetch_add(1, Ordering::Relaxed);
        tracing::trace!(pending = st.pending.len(), "item submitted");

        if st.timer.is_none() {
            let delay = self.inner.config.flush_delay;
            let inner = Arc::clone(&self.inner);
            // The handle is stored before the lock is released, so the task
            // cannot clear it first even with a zero delay.
            st.timer = Some(self.inner.runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                inner.flush();
            }));
            tracing::debug!(delay_ms = delay.as_millis() as u64, "flush timer armed");
        }
    }

    pub fn pending_len(&self) -> usize {
        self.inner.lock_state().pending.len()
    }

    pub fn is_timer_armed(&self) -> bool {
        self.inner.lock_state().timer.is_some()
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.inner.config
    }

    pub fn flush_delay(&self) -> Duration {
        self.inner.config.flush_delay
    }

    /// Configured mode. Ignored for reduction when a custom reducer was supplied.
    pub fn mode(&self) -> AggregationMode {
        self.inner.config.mode
    }

    pub fn stats(&self) -> AggregatorStats {
        let (pending, timer_armed) = {
            let st = self.inner.lock_state();
            (st.pending.len(), st.timer.is_some())
        };
        let s = &self.inner.stats;
        AggregatorStats {
            items_submitted: s.items_submitted.load(Ordering::Relaxed),
            batches_flushed: s.batches_flushed.load(Ordering::Relaxed),
            items_flushed: s.items_flushed.load(Ordering::Relaxed),
            callback_failures: s.callback_failures.load(Ordering::Relaxed),
            pending,
            timer_armed,
        }
    }
}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.inner.lock_state();
        f.debug_struct("Aggregator")
            .field("config", &self.inner.config)
            .field("pending", &st.pending.len())
            .field("timer_armed", &st.timer.is_some())
            .field("has_callback", &st.callback.is_some())
            .finish()
    }
}

/// Builder for [`Aggregator`].
pub struct AggregatorBuilder {
    config: AggregatorConfig,
    reducer: Option<Arc<dyn Reducer>>,
    sink: Option<Arc<dyn DiagnosticSink>>,
    runtime: Option<Handle>,
    callback: Option<FlushCallback>,
}

impl AggregatorBuilder {
    pub fn new() -> Self {
        Self {
            config: AggregatorConfig::default(),
            reducer: None,
            sink: None,
            runtime: None,
            callback: None,
        }
    }

    pub fn with_config(mut self, config: AggregatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_flush_delay(mut self, delay: Duration) -> Self {
        self.config.flush_delay = delay;
        self
    }

    pub fn with_mode(mut self, mode: AggregationMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Custom reduction strategy; takes precedence over the configured mode.
    pub fn with_reducer<R: Reducer + 'static>(mut self, reducer: R) -> Self {
        self.reducer = Some(Arc::new(reducer));
        self
    }

    /// Destination for callback failures and flush events. Defaults to
    /// [`TracingDiagnosticSink`].
    pub fn with_diagnostic_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Runtime that runs the flush timer. Defaults to the current runtime at `build`.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(AggregatedResult) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> Result<Aggregator> {
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|e| {
                Error::runtime_with_context(
                    "no Tokio runtime available for the flush timer",
                    ErrorContext::new()
                        .with_source("aggregator_builder")
                        .with_details(e.to_string()),
                )
            })?,
        };
        let mode = self.config.mode;
        let reducer = self
            .reducer
            .unwrap_or_else(|| Arc::new(mode) as Arc<dyn Reducer>);
        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(TracingDiagnosticSink) as Arc<dyn DiagnosticSink>);

        Ok(Aggregator {
            inner: Arc::new(Inner {
                config: self.config,
                reducer,
                sink,
                runtime,
                state: Mutex::new(State {
                    pending: Vec::new(),
                    timer: None,
                    callback: self.callback,
                }),
                stats: AtomicStats::new(),
            }),
        })
    }
}

impl Default for AggregatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
