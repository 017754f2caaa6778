//! Demo graph wiring for host applications.
//!
//! Hosts call [`build_demo_graph`] at startup to get the three example nodes
//! already bound together:
//!
//! ```text
//! a.out_1 ──> b.in_1
//! a.out_2 ──> b.in_2
//!             b.out_3 ──> c.in_3
//! ```
//!
//! Binding schedules the downstream nodes, so the first
//! `run_until_idle` computes `b` and `c` from the initial values.

use std::sync::Arc;
use std::time::Duration;

use gizmo_engine::{EventSink, NodeGraph, NodeId, Result};

use crate::{Adder, Doubler, Incrementer};

/// The demo graph and the ids of its nodes
pub struct DemoGraph {
    pub graph: NodeGraph,
    pub a: NodeId,
    pub b: NodeId,
    pub c: NodeId,
}

/// Build the incrementer → adder → doubler graph
///
/// `delay` is the simulated work time of every node computation.
pub fn build_demo_graph(event_sink: Arc<dyn EventSink>, delay: Duration) -> Result<DemoGraph> {
    let mut graph = NodeGraph::new(event_sink);

    let a = graph.add_node("a", Incrementer::with_delay(delay))?;
    let b = graph.add_node("b", Adder::with_delay(delay))?;
    let c = graph.add_node("c", Doubler::with_delay(delay))?;

    graph.bind(b, Adder::ATTR_IN_1, a, Incrementer::ATTR_OUT_1)?;
    graph.bind(b, Adder::ATTR_IN_2, a, Incrementer::ATTR_OUT_2)?;
    graph.bind(c, Doubler::ATTR_IN_3, b, Adder::ATTR_OUT_3)?;

    log::info!("Demo graph ready with {} nodes", graph.len());
    Ok(DemoGraph { graph, a, b, c })
}
