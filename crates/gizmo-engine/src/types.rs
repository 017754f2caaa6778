//! Core types for reactive node graphs
//!
//! These types describe node attributes, their values, the change records
//! produced when they are written, and the bindings that link one node's
//! attribute to another's.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle to a node inside a [`NodeGraph`](crate::engine::NodeGraph)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in insertion order
    pub fn index(&self) -> usize {
        self.0
    }
}

/// The value type of an attribute, fixed at declaration time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// Floating point number
    Number,
    /// One-shot boolean event
    Event,
}

impl AttributeType {
    /// Value an attribute of this type holds when no default is declared
    pub fn default_value(&self) -> AttributeValue {
        match self {
            AttributeType::Number => AttributeValue::Number(0.0),
            AttributeType::Event => AttributeValue::Event(false),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeType::Number => write!(f, "number"),
            AttributeType::Event => write!(f, "event"),
        }
    }
}

/// A typed attribute value
///
/// Serializes as a bare JSON number or boolean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Event(bool),
}

impl AttributeValue {
    /// The type this value carries
    pub fn value_type(&self) -> AttributeType {
        match self {
            AttributeValue::Number(_) => AttributeType::Number,
            AttributeValue::Event(_) => AttributeType::Event,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Event(_) => None,
        }
    }

    pub fn as_event(&self) -> Option<bool> {
        match self {
            AttributeValue::Event(b) => Some(*b),
            AttributeValue::Number(_) => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::Event(b) => write!(f, "{}", b),
        }
    }
}

/// How an attribute participates in the data flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Externally settable, may be bound to another node's attribute
    Input,
    /// Written only by the node's own computation
    Output,
    /// One-shot event the computation resets to false after observing it
    Trigger,
}

impl AttributeKind {
    /// Whether writes to this attribute schedule the owning node
    ///
    /// A node watches its inputs and triggers, not every declared attribute.
    /// Outputs are excluded: equal-value writes are never suppressed, so a
    /// node watching its own outputs would reschedule itself after every
    /// run. Output writes are still recorded, emitted, and replayed on the
    /// inputs bound to them.
    pub fn is_watched(&self) -> bool {
        !matches!(self, AttributeKind::Output)
    }
}

/// Declaration of a single attribute on a node type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSpec {
    /// Attribute name, unique per node type
    pub name: String,
    /// Human-readable label
    pub label: String,
    /// Input, output or trigger
    pub kind: AttributeKind,
    /// Value type
    pub value_type: AttributeType,
    /// Initial value
    pub default: AttributeValue,
}

impl AttributeSpec {
    /// Create an attribute spec with the type's default value
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        kind: AttributeKind,
        value_type: AttributeType,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            value_type,
            default: value_type.default_value(),
        }
    }

    /// Create an input attribute
    pub fn input(name: impl Into<String>, label: impl Into<String>, value_type: AttributeType) -> Self {
        Self::new(name, label, AttributeKind::Input, value_type)
    }

    /// Create an output attribute
    pub fn output(name: impl Into<String>, label: impl Into<String>, value_type: AttributeType) -> Self {
        Self::new(name, label, AttributeKind::Output, value_type)
    }

    /// Create a trigger (event) attribute
    pub fn trigger(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, AttributeKind::Trigger, AttributeType::Event)
    }

    /// Set the initial value
    pub fn with_default(mut self, value: AttributeValue) -> Self {
        self.default = value;
        self
    }
}

/// A single attribute write, as delivered to the node that watches it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub attribute: String,
    pub old: AttributeValue,
    pub new: AttributeValue,
}

/// All changes accumulated for one node during one batch window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeBatch {
    /// Name of the node receiving the batch
    pub node: String,
    /// Changes in the order they were made
    pub changes: Vec<Change>,
}

impl ChangeBatch {
    pub fn new(node: impl Into<String>, changes: Vec<Change>) -> Self {
        Self {
            node: node.into(),
            changes,
        }
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }

    /// Whether any change in the batch touched this attribute
    pub fn contains(&self, attribute: &str) -> bool {
        self.changes.iter().any(|c| c.attribute == attribute)
    }

    /// The most recent change to this attribute in the batch
    pub fn latest(&self, attribute: &str) -> Option<&Change> {
        self.changes.iter().rev().find(|c| c.attribute == attribute)
    }
}

/// A live reference from a downstream input to an upstream attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub downstream_node: String,
    pub downstream_attribute: String,
    pub upstream_node: String,
    pub upstream_attribute: String,
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} <- {}.{}",
            self.downstream_node, self.downstream_attribute, self.upstream_node, self.upstream_attribute
        )
    }
}

/// Location of an attribute: node plus declaration index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct AttrRef {
    pub node: NodeId,
    pub index: usize,
}
