//! Node descriptor trait and metadata types
//!
//! Every node type declares its attribute set statically through
//! [`GizmoDescriptor`]. The dispatcher subscribes to exactly the declared
//! attributes, so there is no runtime introspection of node structs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{GizmoError, Result};
use crate::types::AttributeSpec;

/// Trait for node types that can describe their metadata
///
/// # Example
///
/// ```ignore
/// use gizmo_engine::{AttributeSpec, AttributeType, GizmoDescriptor, NodeMetadata};
///
/// impl GizmoDescriptor for Doubler {
///     fn descriptor() -> NodeMetadata {
///         NodeMetadata {
///             node_type: "doubler".to_string(),
///             label: "Doubler".to_string(),
///             description: "Multiplies its input by two".to_string(),
///             attributes: vec![
///                 AttributeSpec::input("in_3", "In 3", AttributeType::Number),
///                 AttributeSpec::output("multiplied_by_two", "Doubled", AttributeType::Number),
///             ],
///         }
///     }
/// }
/// ```
pub trait GizmoDescriptor {
    /// Get the static metadata for this node type
    fn descriptor() -> NodeMetadata
    where
        Self: Sized;
}

/// Complete metadata for a node type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    /// Unique type identifier (e.g., "adder")
    pub node_type: String,
    /// Human-readable label
    pub label: String,
    /// Description of what the node computes
    pub description: String,
    /// Declared attributes, in display order
    pub attributes: Vec<AttributeSpec>,
}

impl NodeMetadata {
    /// Look up an attribute declaration by name
    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Declaration index of an attribute
    pub fn position(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    /// Check that attribute names are unique and defaults match their types
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for spec in &self.attributes {
            if !seen.insert(spec.name.as_str()) {
                return Err(GizmoError::DuplicateAttribute {
                    node_type: self.node_type.clone(),
                    attribute: spec.name.clone(),
                });
            }
            if spec.default.value_type() != spec.value_type {
                return Err(GizmoError::TypeMismatch {
                    attribute: spec.name.clone(),
                    expected: spec.value_type,
                    actual: spec.default.value_type(),
                });
            }
        }
        Ok(())
    }
}

/// Link-time registration of a node type's descriptor
///
/// Node crates submit one of these per node type so that
/// [`NodeRegistry::with_builtins`](crate::registry::NodeRegistry::with_builtins)
/// can list them without a hand-maintained table.
pub struct DescriptorFn(pub fn() -> NodeMetadata);

inventory::collect!(DescriptorFn);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttributeType, AttributeValue};

    fn metadata(attributes: Vec<AttributeSpec>) -> NodeMetadata {
        NodeMetadata {
            node_type: "test-node".to_string(),
            label: "Test Node".to_string(),
            description: "A test node".to_string(),
            attributes,
        }
    }

    #[test]
    fn test_validate_accepts_unique_names() {
        let meta = metadata(vec![
            AttributeSpec::input("in_1", "In 1", AttributeType::Number),
            AttributeSpec::output("out", "Out", AttributeType::Number),
            AttributeSpec::trigger("run", "Run"),
        ]);
        assert!(meta.validate().is_ok());
        assert_eq!(meta.position("run"), Some(2));
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let meta = metadata(vec![
            AttributeSpec::input("x", "X", AttributeType::Number),
            AttributeSpec::output("x", "X again", AttributeType::Number),
        ]);
        assert!(matches!(
            meta.validate(),
            Err(GizmoError::DuplicateAttribute { attribute, .. }) if attribute == "x"
        ));
    }

    #[test]
    fn test_validate_rejects_mistyped_default() {
        let meta = metadata(vec![AttributeSpec::trigger("run", "Run")
            .with_default(AttributeValue::Number(1.0))]);
        assert!(matches!(meta.validate(), Err(GizmoError::TypeMismatch { .. })));
    }

    #[test]
    fn test_metadata_serialization() {
        let meta = metadata(vec![AttributeSpec::input("in_1", "In 1", AttributeType::Number)]);
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("nodeType")); // camelCase
        assert!(json.contains("valueType"));
    }
}
