//! Read-only snapshots of nodes for presentation layers

use serde::{Deserialize, Serialize};

use crate::types::{AttributeKind, AttributeType, AttributeValue};

/// Snapshot of one attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeView {
    pub name: String,
    pub label: String,
    pub kind: AttributeKind,
    pub value_type: AttributeType,
    /// Current value, resolved through any binding
    pub value: AttributeValue,
    /// `node.attribute` this input is bound to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound_to: Option<String>,
}

impl AttributeView {
    /// Whether a user may write this attribute directly
    pub fn is_editable(&self) -> bool {
        self.kind != AttributeKind::Output && self.bound_to.is_none()
    }
}

/// Snapshot of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    /// Instance name
    pub name: String,
    pub node_type: String,
    pub label: String,
    /// Busy flag at the time of the snapshot
    pub busy: bool,
    pub attributes: Vec<AttributeView>,
}

impl NodeView {
    pub fn attribute(&self, name: &str) -> Option<&AttributeView> {
        self.attributes.iter().find(|a| a.name == name)
    }
}
