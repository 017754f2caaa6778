//! Gizmo Engine - reactive attribute dispatch for stateful nodes
//!
//! Nodes ("gizmos") expose typed attributes and an execute step. Writing a
//! node's watched attributes schedules one coalesced notification; the
//! engine delivers it by running the node's computation with a busy flag
//! raised for the duration.
//!
//! # Architecture
//!
//! - `NodeGraph`: attribute storage, bindings, and the batch-window dispatcher
//! - `Gizmo` / `NodeContext`: the node computation contract
//! - `BusyIndicator`: per-node busy flag, readable from any thread
//! - `EventSink`: generic event streaming (busy transitions, writes, failures)
//!
//! Dispatch is single-threaded: nothing is delivered until the host calls
//! `step` or `run_until_idle`, and one computation runs at a time.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gizmo_engine::{NodeGraph, NullEventSink};
//!
//! let mut graph = NodeGraph::new(Arc::new(NullEventSink));
//! let a = graph.add_node("a", Incrementer::default())?;
//! let b = graph.add_node("b", Adder::default())?;
//! graph.bind(b, "in_1", a, "out_1")?;
//! graph.trigger(a, "run")?;
//! graph.run_until_idle()?;
//! ```

pub mod busy;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod events;
pub mod node;
pub mod registry;
pub mod types;
mod validation;
pub mod view;

// Re-export key types
pub use busy::BusyIndicator;
pub use descriptor::{DescriptorFn, GizmoDescriptor, NodeMetadata};
pub use engine::{Delivery, NodeGraph};
pub use error::{GizmoError, Result};
pub use events::{EngineEvent, EventError, EventSink, NullEventSink, VecEventSink};
pub use node::{Gizmo, NodeContext};
pub use registry::NodeRegistry;
pub use types::{
    AttributeKind, AttributeSpec, AttributeType, AttributeValue, Binding, Change, ChangeBatch,
    NodeId,
};
pub use view::{AttributeView, NodeView};
