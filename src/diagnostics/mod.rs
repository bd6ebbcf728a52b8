//! 诊断模块：可插拔的诊断事件接收器（回调失败、批次刷新）。
//!
//! Diagnostics sinks.
//!
//! The aggregator never propagates a failing flush callback to its caller.
//! Instead it reports a [`DiagnosticEvent`] to the sink it was built with.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`DiagnosticEvent`] | Typed diagnostic event enum |
//! | [`DiagnosticSink`] | Trait for diagnostic destinations |
//! | [`TracingDiagnosticSink`] | Default sink, writes through `tracing` |
//! | [`NoopDiagnosticSink`] | Discards everything |
//! | [`InMemoryDiagnosticSink`] | Bounded in-memory sink for testing |
//! | [`CompositeDiagnosticSink`] | Multi-destination composite sink |

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// Event reported by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiagnosticEvent {
    /// The flush callback returned an error or panicked. The batch is gone
    /// either way.
    CallbackFailed {
        message: String,
        batch_size: usize,
        panicked: bool,
    },
    /// A batch was reduced and handed to the callback (if any).
    BatchFlushed { batch_size: usize, fields: usize },
}

impl DiagnosticEvent {
    pub fn is_failure(&self) -> bool {
        matches!(self, DiagnosticEvent::CallbackFailed { .. })
    }
}

/// Destination for diagnostic events. Called synchronously from the flush
/// path, so implementations should not block.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, event: &DiagnosticEvent);
}

/// Logs events with `tracing`: failures at `error`, flushes at `debug`.
#[derive(Debug, Clone, Default)]
pub struct TracingDiagnosticSink;

impl DiagnosticSink for TracingDiagnosticSink {
    fn report(&self, event: &DiagnosticEvent) {
        match event {
            DiagnosticEvent::CallbackFailed {
                message,
                batch_size,
                panicked,
            } => {
                tracing::error!(
                    batch_size = *batch_size,
                    panicked = *panicked,
                    "Error in flush callback: {}",
                    message
                );
            }
            DiagnosticEvent::BatchFlushed { batch_size, fields } => {
                tracing::debug!(batch_size = *batch_size, fields = *fields, "batch flushed");
            }
        }
    }
}

/// Sink that drops every event.
#[derive(Debug, Clone, Default)]
pub struct NoopDiagnosticSink;

impl DiagnosticSink for NoopDiagnosticSink {
    fn report(&self, _event: &DiagnosticEvent) {}
}

/// In-memory sink for testing. Keeps at most `max_events`, dropping the oldest.
pub struct InMemoryDiagnosticSink {
    events: Arc<RwLock<Vec<DiagnosticEvent>>>,
    max_events: usize,
}

impl InMemoryDiagnosticSink {
    pub fn new(max: usize) -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            max_events: max,
        }
    }

    pub fn get_events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn failures(&self) -> Vec<DiagnosticEvent> {
        self.get_events()
            .into_iter()
            .filter(DiagnosticEvent::is_failure)
            .collect()
    }

    pub fn clear(&self) {
        self.events
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.events.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for InMemoryDiagnosticSink {
    fn report(&self, event: &DiagnosticEvent) {
        if self.max_events == 0 {
            return;
        }
        let mut events = self.events.write().unwrap_or_else(|e| e.into_inner());
        events.push(event.clone());
        if events.len() > self.max_events {
            events.remove(0);
        }
    }
}

/// Composite sink for multiple destinations.
pub struct CompositeDiagnosticSink {
    sinks: Vec<Arc<dyn DiagnosticSink>>,
}

impl CompositeDiagnosticSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl Default for CompositeDiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticSink for CompositeDiagnosticSink {
    fn report(&self, event: &DiagnosticEvent) {
        for s in &self.sinks {
            s.report(event);
        }
    }
}
