//! The node computation contract
//!
//! A node type implements [`Gizmo`]: it declares its attributes and supplies
//! an `execute` step. The engine calls `execute` once per delivered batch
//! window, with the node's busy flag raised for the duration.
//!
//! Conventions the engine relies on but does not enforce:
//!
//! - `execute` should be stable for identical non-trigger inputs.
//! - A node that observes one of its trigger attributes set to true must
//!   reset it to false before returning. Otherwise the trigger stays true
//!   and the triggered work runs again on the node's next window.

use crate::descriptor::NodeMetadata;
use crate::engine::NodeGraph;
use crate::error::{GizmoError, Result};
use crate::types::{AttributeType, AttributeValue, ChangeBatch, NodeId};

/// A reactive node
pub trait Gizmo: Send {
    /// Declared attributes of this node
    fn metadata(&self) -> NodeMetadata;

    /// Recompute after a batch of changes to watched attributes
    ///
    /// The batch holds every change recorded since the window was scheduled;
    /// the node decides which of them to act on.
    fn execute(&mut self, ctx: &mut NodeContext<'_>, changes: &ChangeBatch) -> Result<()>;
}

/// A node's access to its own attributes while its computation runs
///
/// Writes go through the same dispatcher as external writes: they are
/// recorded, fan out over bindings, and may schedule new windows, but no
/// window is delivered until the current computation has returned.
pub struct NodeContext<'g> {
    graph: &'g mut NodeGraph,
    node: NodeId,
}

impl<'g> NodeContext<'g> {
    pub(crate) fn new(graph: &'g mut NodeGraph, node: NodeId) -> Self {
        Self { graph, node }
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Instance name of the running node
    pub fn name(&self) -> &str {
        self.graph.slot_name(self.node)
    }

    /// Read an attribute, resolving bindings
    pub fn get(&self, attribute: &str) -> Result<AttributeValue> {
        self.graph.get(self.node, attribute)
    }

    /// Read a numeric attribute
    pub fn number(&self, attribute: &str) -> Result<f64> {
        let value = self.get(attribute)?;
        value.as_number().ok_or_else(|| GizmoError::TypeMismatch {
            attribute: attribute.to_string(),
            expected: AttributeType::Number,
            actual: value.value_type(),
        })
    }

    /// Read an event attribute
    pub fn event(&self, attribute: &str) -> Result<bool> {
        let value = self.get(attribute)?;
        value.as_event().ok_or_else(|| GizmoError::TypeMismatch {
            attribute: attribute.to_string(),
            expected: AttributeType::Event,
            actual: value.value_type(),
        })
    }

    /// Write any of the node's attributes, outputs included
    pub fn set(&mut self, attribute: &str, value: AttributeValue) -> Result<()> {
        self.graph.set_from_computation(self.node, attribute, value)
    }

    pub fn set_number(&mut self, attribute: &str, value: f64) -> Result<()> {
        self.set(attribute, AttributeValue::Number(value))
    }

    /// Reset an event attribute to false
    pub fn reset(&mut self, attribute: &str) -> Result<()> {
        self.set(attribute, AttributeValue::Event(false))
    }
}
