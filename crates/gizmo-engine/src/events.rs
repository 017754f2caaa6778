//! Event types for observing the engine
//!
//! Events are sent from the engine to the presentation layer (or any
//! consumer) to report busy transitions, attribute writes, notification
//! deliveries and computation failures.

use serde::{Deserialize, Serialize};

use crate::types::AttributeValue;

/// Trait for receiving engine events
///
/// This abstracts over the transport (channel, broadcast, in-memory list)
/// so the engine can be hosted in different contexts.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be sent (e.g., channel closed)
    fn send(&self, event: EngineEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

impl EventError {
    pub fn channel_closed() -> Self {
        Self {
            message: "Channel closed".to_string(),
        }
    }
}

/// Events emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EngineEvent {
    /// A node's computation started; its busy flag is now set
    #[serde(rename_all = "camelCase")]
    NodeBusy { node: String },

    /// A node's computation returned (successfully or not); busy is cleared
    #[serde(rename_all = "camelCase")]
    NodeIdle { node: String },

    /// An attribute was written (directly or through a binding)
    #[serde(rename_all = "camelCase")]
    AttributeChanged {
        node: String,
        attribute: String,
        old: AttributeValue,
        new: AttributeValue,
    },

    /// A coalesced batch of changes was handed to a node
    #[serde(rename_all = "camelCase")]
    NotificationDelivered { node: String, changes: usize },

    /// A node's computation returned an error
    #[serde(rename_all = "camelCase")]
    ComputationFailed { node: String, error: String },

    /// A downstream input was bound to an upstream attribute
    #[serde(rename_all = "camelCase")]
    BindingInstalled {
        downstream_node: String,
        downstream_attribute: String,
        upstream_node: String,
        upstream_attribute: String,
    },

    /// A binding was removed (explicitly or by a direct write)
    #[serde(rename_all = "camelCase")]
    BindingRemoved { node: String, attribute: String },
}

impl EngineEvent {
    /// Name of the node the event concerns (downstream node for bindings)
    pub fn node(&self) -> &str {
        match self {
            Self::NodeBusy { node }
            | Self::NodeIdle { node }
            | Self::AttributeChanged { node, .. }
            | Self::NotificationDelivered { node, .. }
            | Self::ComputationFailed { node, .. }
            | Self::BindingRemoved { node, .. } => node,
            Self::BindingInstalled {
                downstream_node, ..
            } => downstream_node,
        }
    }
}

/// Send an event, logging instead of failing when the sink is gone
pub(crate) fn emit(sink: &dyn EventSink, event: EngineEvent) {
    if let Err(e) = sink.send(event) {
        log::warn!("Dropped engine event: {}", e);
    }
}

/// A no-op event sink that discards all events
///
/// Useful for testing or when events aren't needed.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: EngineEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: std::sync::Mutex<Vec<EngineEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: EngineEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .map_err(|_| EventError {
                message: "Event list poisoned".to_string(),
            })?
            .push(event);
        Ok(())
    }
}
