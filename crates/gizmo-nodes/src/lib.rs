//! Gizmo Nodes
//!
//! Example node implementations for the Gizmo dashboard. Each node is a
//! small arithmetic producer or consumer that can be bound to the others.
//!
//! # Categories
//!
//! - **Source**: Nodes that produce values when triggered
//! - **Arithmetic**: Nodes that recompute outputs from bound inputs

use std::time::Duration;

pub mod arithmetic;
pub mod setup;
pub mod source;

// Re-export all nodes for convenience
pub use arithmetic::*;
pub use setup::{build_demo_graph, DemoGraph};
pub use source::*;

/// Stand-in for slow work so the busy flag is observable
pub(crate) fn simulate_work(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}
