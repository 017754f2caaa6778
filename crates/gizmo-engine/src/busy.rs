//! Busy flag and the guard that brackets node computations
//!
//! Each node owns one [`BusyIndicator`]. The engine is the only writer: it
//! acquires a [`BusyGuard`] before invoking a computation, and the guard
//! clears the flag when dropped. Because release happens in `Drop`, the flag
//! is cleared on every exit path, including errors and panics.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::events::{emit, EngineEvent, EventSink};

/// Shared, read-only view of a node's busy flag
///
/// Cloning is cheap; all clones observe the same flag. Readers on other
/// threads (e.g. an HTTP handler) see the flag while a computation runs.
#[derive(Debug, Clone, Default)]
pub struct BusyIndicator(Arc<AtomicBool>);

impl BusyIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the node's computation is currently running
    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn set(&self, busy: bool) {
        self.0.store(busy, Ordering::Release);
    }
}

/// Scoped busy state for one computation run
pub(crate) struct BusyGuard {
    indicator: BusyIndicator,
    node: String,
    sink: Arc<dyn EventSink>,
}

impl BusyGuard {
    /// Set busy and announce it immediately
    pub(crate) fn acquire(indicator: BusyIndicator, node: &str, sink: Arc<dyn EventSink>) -> Self {
        indicator.set(true);
        emit(
            sink.as_ref(),
            EngineEvent::NodeBusy {
                node: node.to_string(),
            },
        );
        Self {
            indicator,
            node: node.to_string(),
            sink,
        }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.indicator.set(false);
        emit(
            self.sink.as_ref(),
            EngineEvent::NodeIdle {
                node: std::mem::take(&mut self.node),
            },
        );
    }
}
