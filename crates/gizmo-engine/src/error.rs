//! Error types for the gizmo engine

use thiserror::Error;

use crate::types::AttributeType;

/// Result type alias using GizmoError
pub type Result<T> = std::result::Result<T, GizmoError>;

/// Errors that can occur in the gizmo engine
#[derive(Debug, Error)]
pub enum GizmoError {
    /// No node with this name or id exists in the graph
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// A node with this name was already added
    #[error("Duplicate node name: {0}")]
    DuplicateNode(String),

    /// The node does not declare this attribute
    #[error("Unknown attribute '{attribute}' on node '{node}'")]
    UnknownAttribute { node: String, attribute: String },

    /// A node type declares the same attribute name twice
    #[error("Duplicate attribute '{attribute}' on node type '{node_type}'")]
    DuplicateAttribute { node_type: String, attribute: String },

    /// A value of the wrong type was written to an attribute
    #[error("Invalid value for '{attribute}': expected {expected}, got {actual}")]
    TypeMismatch {
        attribute: String,
        expected: AttributeType,
        actual: AttributeType,
    },

    /// Outputs are only written by the owning node's computation
    #[error("Attribute '{attribute}' on node '{node}' is an output and cannot be set externally")]
    ReadOnlyAttribute { node: String, attribute: String },

    /// Only input attributes can be bound to another node
    #[error("Attribute '{attribute}' on node '{node}' is not an input and cannot be bound")]
    NotBindable { node: String, attribute: String },

    /// The binding would make an attribute resolve through itself
    #[error("Binding {downstream} <- {upstream} would create a reference loop")]
    BindingLoop { downstream: String, upstream: String },

    /// A node computation was asked to run while it is already running
    #[error("Computation for node '{0}' is already running")]
    Reentrant(String),

    /// Raised by node computations
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// A node computation panicked; the panic message is kept
    #[error("Computation panicked: {0}")]
    Panicked(String),

    /// A node computation returned an error; busy was already cleared
    #[error("Computation failed on node '{node}': {source}")]
    ComputationFailed {
        node: String,
        #[source]
        source: Box<GizmoError>,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GizmoError {
    /// Create an execution failed error with a message
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    pub(crate) fn unknown_attribute(node: &str, attribute: &str) -> Self {
        Self::UnknownAttribute {
            node: node.to_string(),
            attribute: attribute.to_string(),
        }
    }
}
