//! Node type registry
//!
//! Maps node type strings to their metadata. Node crates register their
//! descriptors at link time via [`DescriptorFn`]; hosts use the registry to
//! list available node types and their attribute declarations.
//!
//! # Usage
//!
//! ```ignore
//! use gizmo_engine::NodeRegistry;
//!
//! let registry = NodeRegistry::with_builtins();
//! let adder = registry.get_metadata("adder").unwrap();
//! ```

use std::collections::HashMap;

use crate::descriptor::{DescriptorFn, NodeMetadata};

/// Registry of node types and their metadata
pub struct NodeRegistry {
    entries: HashMap<String, NodeMetadata>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Create a registry holding every descriptor submitted with `inventory`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for descriptor in inventory::iter::<DescriptorFn> {
            registry.register((descriptor.0)());
        }
        registry
    }

    /// Register a node type; a later registration of the same type replaces it
    pub fn register(&mut self, metadata: NodeMetadata) {
        if let Err(e) = metadata.validate() {
            log::warn!("Registering invalid node type '{}': {}", metadata.node_type, e);
        }
        self.entries.insert(metadata.node_type.clone(), metadata);
    }

    /// Get metadata for a node type
    pub fn get_metadata(&self, node_type: &str) -> Option<&NodeMetadata> {
        self.entries.get(node_type)
    }

    /// Get all registered metadata, sorted by node type
    pub fn all_metadata(&self) -> Vec<&NodeMetadata> {
        let mut all: Vec<&NodeMetadata> = self.entries.values().collect();
        all.sort_by(|a, b| a.node_type.cmp(&b.node_type));
        all
    }

    /// Check whether a node type is registered
    pub fn has_node_type(&self, node_type: &str) -> bool {
        self.entries.contains_key(node_type)
    }

    /// List registered node types
    pub fn node_types(&self) -> Vec<&str> {
        self.entries.keys().map(|s| s.as_str()).collect()
    }

    /// Merge another registry into this one (other's entries win)
    pub fn merge(&mut self, other: NodeRegistry) {
        self.entries.extend(other.entries);
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
