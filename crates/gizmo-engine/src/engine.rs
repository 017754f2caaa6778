//! Reactive attribute dispatcher
//!
//! [`NodeGraph`] owns every node's attribute values, the bindings between
//! nodes, and a FIFO of scheduled batch windows.
//!
//! # Key Concepts
//!
//! - **Coalescing**: the first watched write on a node schedules one window;
//!   later writes join it until the window is delivered
//! - **Deferred delivery**: windows are only delivered when the host calls
//!   [`NodeGraph::step`] or [`NodeGraph::run_until_idle`], never from inside `set`
//! - **Bindings**: a downstream input resolves through to its upstream
//!   attribute at read time; upstream writes are replayed as writes on the
//!   downstream attribute so the downstream node gets its own window
//! - **Busy bracketing**: each delivery runs under a [`BusyGuard`]

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::busy::{BusyGuard, BusyIndicator};
use crate::descriptor::NodeMetadata;
use crate::error::{GizmoError, Result};
use crate::events::{emit, EngineEvent, EventSink};
use crate::node::{Gizmo, NodeContext};
use crate::types::{
    AttrRef, AttributeKind, AttributeSpec, AttributeValue, Binding, Change, ChangeBatch, NodeId,
};
use crate::validation;
use crate::view::{AttributeView, NodeView};

/// Per-node state held by the graph
struct NodeSlot {
    name: String,
    metadata: NodeMetadata,
    values: Vec<AttributeValue>,
    busy: BusyIndicator,
    /// Changes recorded since the node's window was scheduled
    pending: Vec<Change>,
    /// Whether a window for this node is waiting in the ready queue
    scheduled: bool,
    /// Taken out while the computation runs
    gizmo: Option<Box<dyn Gizmo>>,
}

/// Result of delivering one batch window
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Node whose computation ran
    pub node: NodeId,
    /// The batch it was given
    pub batch: ChangeBatch,
}

/// A graph of reactive nodes and the bindings between them
pub struct NodeGraph {
    nodes: Vec<NodeSlot>,
    names: HashMap<String, NodeId>,
    /// downstream attribute -> the attribute it resolves through to
    upstream: HashMap<AttrRef, AttrRef>,
    /// upstream attribute -> attributes bound to it, in bind order
    downstream: HashMap<AttrRef, Vec<AttrRef>>,
    /// Nodes with a scheduled window, oldest first
    ready: VecDeque<NodeId>,
    event_sink: Arc<dyn EventSink>,
}

impl NodeGraph {
    /// Create an empty graph reporting to the given sink
    pub fn new(event_sink: Arc<dyn EventSink>) -> Self {
        Self {
            nodes: Vec::new(),
            names: HashMap::new(),
            upstream: HashMap::new(),
            downstream: HashMap::new(),
            ready: VecDeque::new(),
            event_sink,
        }
    }

    /// Add a node; its attributes start at their declared defaults
    pub fn add_node(&mut self, name: impl Into<String>, gizmo: impl Gizmo + 'static) -> Result<NodeId> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(GizmoError::DuplicateNode(name));
        }

        let metadata = gizmo.metadata();
        metadata.validate()?;

        let id = NodeId(self.nodes.len());
        let values = metadata.attributes.iter().map(|a| a.default).collect();
        log::debug!(
            "Adding node '{}' ({}) with {} attributes",
            name,
            metadata.node_type,
            metadata.attributes.len()
        );

        self.names.insert(name.clone(), id);
        self.nodes.push(NodeSlot {
            name,
            metadata,
            values,
            busy: BusyIndicator::new(),
            pending: Vec::new(),
            scheduled: false,
            gizmo: Some(Box::new(gizmo)),
        });
        Ok(id)
    }

    /// Look up a node by name
    pub fn node_id(&self, name: &str) -> Result<NodeId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| GizmoError::UnknownNode(name.to_string()))
    }

    /// Name of a node
    pub fn node_name(&self, id: NodeId) -> Result<&str> {
        Ok(&self.slot(id)?.name)
    }

    /// All node ids in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Declared metadata of a node
    pub fn metadata(&self, id: NodeId) -> Result<&NodeMetadata> {
        Ok(&self.slot(id)?.metadata)
    }

    /// Shared read-only handle on a node's busy flag
    pub fn busy_indicator(&self, id: NodeId) -> Result<BusyIndicator> {
        Ok(self.slot(id)?.busy.clone())
    }

    pub fn is_busy(&self, id: NodeId) -> Result<bool> {
        Ok(self.slot(id)?.busy.is_busy())
    }

    /// Read an attribute, resolving bindings
    pub fn get(&self, id: NodeId, attribute: &str) -> Result<AttributeValue> {
        let target = self.locate(id, attribute)?;
        Ok(self.resolve(target))
    }

    /// Write an attribute from outside the node
    ///
    /// The write is recorded even if the value is unchanged. Writing a bound
    /// input replaces the binding with the plain value. Outputs can only be
    /// written by the node's own computation.
    pub fn set(&mut self, id: NodeId, attribute: &str, value: AttributeValue) -> Result<()> {
        let target = self.locate(id, attribute)?;
        if self.spec(target).kind == AttributeKind::Output {
            return Err(GizmoError::ReadOnlyAttribute {
                node: self.nodes[id.0].name.clone(),
                attribute: attribute.to_string(),
            });
        }
        self.store(target, value)
    }

    /// Fire an event attribute (set it to true)
    pub fn trigger(&mut self, id: NodeId, attribute: &str) -> Result<()> {
        self.set(id, attribute, AttributeValue::Event(true))
    }

    /// Write performed by a node's own computation; outputs are allowed
    pub(crate) fn set_from_computation(
        &mut self,
        id: NodeId,
        attribute: &str,
        value: AttributeValue,
    ) -> Result<()> {
        let target = self.locate(id, attribute)?;
        self.store(target, value)
    }

    /// Bind `downstream.downstream_attr` to `upstream.upstream_attr`
    ///
    /// Installing the binding counts as a write to the downstream attribute,
    /// so the downstream node is scheduled. An existing binding on the
    /// downstream attribute is replaced. Node-level cycles are reported but
    /// not prevented.
    pub fn bind(
        &mut self,
        downstream: NodeId,
        downstream_attr: &str,
        upstream: NodeId,
        upstream_attr: &str,
    ) -> Result<()> {
        let down = self.locate(downstream, downstream_attr)?;
        let up = self.locate(upstream, upstream_attr)?;

        let down_spec = self.spec(down);
        if down_spec.kind != AttributeKind::Input {
            return Err(GizmoError::NotBindable {
                node: self.nodes[downstream.0].name.clone(),
                attribute: downstream_attr.to_string(),
            });
        }
        let up_type = self.spec(up).value_type;
        if down_spec.value_type != up_type {
            return Err(GizmoError::TypeMismatch {
                attribute: downstream_attr.to_string(),
                expected: down_spec.value_type,
                actual: up_type,
            });
        }
        if validation::creates_reference_loop(&self.upstream, down, up) {
            return Err(GizmoError::BindingLoop {
                downstream: self.qualified_name(down),
                upstream: self.qualified_name(up),
            });
        }

        if self.upstream.contains_key(&down) {
            self.remove_binding(down);
        }

        let old = self.resolve(down);
        self.upstream.insert(down, up);
        self.downstream.entry(up).or_default().push(down);
        let new = self.resolve(down);

        log::info!(
            "Bound {} <- {}",
            self.qualified_name(down),
            self.qualified_name(up)
        );
        emit(
            self.event_sink.as_ref(),
            EngineEvent::BindingInstalled {
                downstream_node: self.nodes[downstream.0].name.clone(),
                downstream_attribute: downstream_attr.to_string(),
                upstream_node: self.nodes[upstream.0].name.clone(),
                upstream_attribute: upstream_attr.to_string(),
            },
        );

        self.record(down, old, new);
        self.propagate(down, old, new);

        let cycles = self.binding_cycles();
        if !cycles.is_empty() {
            log::warn!(
                "Binding graph has a cycle through {:?}; updates may re-trigger without bound",
                cycles
            );
        }
        Ok(())
    }

    /// Remove the binding on an input; it keeps the last resolved value
    ///
    /// Returns whether a binding was removed.
    pub fn unbind(&mut self, id: NodeId, attribute: &str) -> Result<bool> {
        let target = self.locate(id, attribute)?;
        Ok(self.remove_binding(target))
    }

    /// All installed bindings
    pub fn bindings(&self) -> Vec<Binding> {
        let mut bindings: Vec<Binding> = self
            .upstream
            .iter()
            .map(|(down, up)| Binding {
                downstream_node: self.nodes[down.node.0].name.clone(),
                downstream_attribute: self.spec(*down).name.clone(),
                upstream_node: self.nodes[up.node.0].name.clone(),
                upstream_attribute: self.spec(*up).name.clone(),
            })
            .collect();
        bindings.sort_by(|a, b| {
            (&a.downstream_node, &a.downstream_attribute)
                .cmp(&(&b.downstream_node, &b.downstream_attribute))
        });
        bindings
    }

    /// Names of nodes that lie on a node-level binding cycle
    pub fn binding_cycles(&self) -> Vec<String> {
        let edges: Vec<(usize, usize)> = self
            .upstream
            .iter()
            .map(|(down, up)| (up.node.0, down.node.0))
            .collect();
        validation::nodes_on_cycles(self.nodes.len(), &edges)
            .into_iter()
            .map(|i| self.nodes[i].name.clone())
            .collect()
    }

    /// Number of windows waiting to be delivered
    pub fn pending_windows(&self) -> usize {
        self.ready.len()
    }

    /// Whether no window is scheduled
    pub fn is_idle(&self) -> bool {
        self.ready.is_empty()
    }

    /// Deliver the oldest scheduled window
    ///
    /// Runs the node's computation under a busy guard with the full batch.
    /// Writes made by the computation are recorded and may schedule new
    /// windows (including one for the same node) but are never delivered
    /// during this call. A computation error is returned after busy has been
    /// cleared; the window is consumed and not retried.
    /// A panic inside the computation is caught and reported the same way
    /// as [`GizmoError::Panicked`]; the node stays usable.
    pub fn step(&mut self) -> Result<Option<Delivery>> {
        let Some(id) = self.ready.pop_front() else {
            return Ok(None);
        };

        let slot = &mut self.nodes[id.0];
        slot.scheduled = false;
        let batch = ChangeBatch::new(slot.name.clone(), std::mem::take(&mut slot.pending));
        let name = slot.name.clone();
        let busy = slot.busy.clone();
        let Some(mut gizmo) = slot.gizmo.take() else {
            return Err(GizmoError::Reentrant(name));
        };

        log::debug!("Delivering {} change(s) to '{}'", batch.len(), name);
        emit(
            self.event_sink.as_ref(),
            EngineEvent::NotificationDelivered {
                node: name.clone(),
                changes: batch.len(),
            },
        );

        let result = {
            let _guard = BusyGuard::acquire(busy, &name, self.event_sink.clone());
            let mut ctx = NodeContext::new(self, id);
            panic::catch_unwind(AssertUnwindSafe(|| gizmo.execute(&mut ctx, &batch)))
                .unwrap_or_else(|payload| {
                    Err(GizmoError::Panicked(panic_message(payload.as_ref())))
                })
        };
        // Restored on every exit path so later windows can run
        self.nodes[id.0].gizmo = Some(gizmo);

        match result {
            Ok(()) => Ok(Some(Delivery { node: id, batch })),
            Err(err) => {
                log::debug!("Computation on '{}' failed: {}", name, err);
                emit(
                    self.event_sink.as_ref(),
                    EngineEvent::ComputationFailed {
                        node: name.clone(),
                        error: err.to_string(),
                    },
                );
                Err(GizmoError::ComputationFailed {
                    node: name,
                    source: Box::new(err),
                })
            }
        }
    }

    /// Deliver windows until none remain; returns how many were delivered
    ///
    /// Stops at the first computation error. Windows scheduled after the
    /// failing one stay queued. A binding cycle makes this loop unbounded;
    /// hosts that allow cycles should drive [`step`](Self::step) themselves.
    pub fn run_until_idle(&mut self) -> Result<usize> {
        let mut delivered = 0;
        while self.step()?.is_some() {
            delivered += 1;
        }
        Ok(delivered)
    }

    /// Snapshot of one node for presentation
    pub fn node_view(&self, id: NodeId) -> Result<NodeView> {
        let slot = self.slot(id)?;
        let attributes = slot
            .metadata
            .attributes
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                let target = AttrRef { node: id, index };
                AttributeView {
                    name: spec.name.clone(),
                    label: spec.label.clone(),
                    kind: spec.kind,
                    value_type: spec.value_type,
                    value: self.resolve(target),
                    bound_to: self.upstream.get(&target).map(|up| self.qualified_name(*up)),
                }
            })
            .collect();

        Ok(NodeView {
            name: slot.name.clone(),
            node_type: slot.metadata.node_type.clone(),
            label: slot.metadata.label.clone(),
            busy: slot.busy.is_busy(),
            attributes,
        })
    }

    /// Snapshots of all nodes in insertion order
    pub fn views(&self) -> Vec<NodeView> {
        self.node_ids()
            .filter_map(|id| self.node_view(id).ok())
            .collect()
    }

    pub(crate) fn slot_name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    fn slot(&self, id: NodeId) -> Result<&NodeSlot> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| GizmoError::UnknownNode(format!("#{}", id.0)))
    }

    fn locate(&self, id: NodeId, attribute: &str) -> Result<AttrRef> {
        let slot = self.slot(id)?;
        let index = slot
            .metadata
            .position(attribute)
            .ok_or_else(|| GizmoError::unknown_attribute(&slot.name, attribute))?;
        Ok(AttrRef { node: id, index })
    }

    fn spec(&self, target: AttrRef) -> &AttributeSpec {
        &self.nodes[target.node.0].metadata.attributes[target.index]
    }

    fn qualified_name(&self, target: AttrRef) -> String {
        format!("{}.{}", self.nodes[target.node.0].name, self.spec(target).name)
    }

    /// Follow bindings to the attribute that actually holds the value
    fn resolve(&self, mut target: AttrRef) -> AttributeValue {
        while let Some(up) = self.upstream.get(&target) {
            target = *up;
        }
        self.nodes[target.node.0].values[target.index]
    }

    /// Type-check, drop any binding, then write and fan out
    fn store(&mut self, target: AttrRef, value: AttributeValue) -> Result<()> {
        let spec = self.spec(target);
        if spec.value_type != value.value_type() {
            return Err(GizmoError::TypeMismatch {
                attribute: spec.name.clone(),
                expected: spec.value_type,
                actual: value.value_type(),
            });
        }

        if self.upstream.contains_key(&target) {
            self.remove_binding(target);
        }

        let old = self.resolve(target);
        self.nodes[target.node.0].values[target.index] = value;
        self.record(target, old, value);
        self.propagate(target, old, value);
        Ok(())
    }

    /// Emit the change and, for watched attributes, enqueue it on the
    /// owning node, scheduling a window if none is pending
    fn record(&mut self, target: AttrRef, old: AttributeValue, new: AttributeValue) {
        let (attribute, watched) = {
            let spec = self.spec(target);
            (spec.name.clone(), spec.kind.is_watched())
        };
        let slot = &mut self.nodes[target.node.0];

        emit(
            self.event_sink.as_ref(),
            EngineEvent::AttributeChanged {
                node: slot.name.clone(),
                attribute: attribute.clone(),
                old,
                new,
            },
        );

        if !watched {
            return;
        }
        slot.pending.push(Change {
            attribute,
            old,
            new,
        });
        if !slot.scheduled {
            slot.scheduled = true;
            self.ready.push_back(target.node);
            log::trace!("Scheduled window for '{}'", slot.name);
        }
    }

    /// Replay a write on every attribute bound (directly or transitively) to `source`
    fn propagate(&mut self, source: AttrRef, old: AttributeValue, new: AttributeValue) {
        let mut work = VecDeque::from([source]);
        while let Some(current) = work.pop_front() {
            let Some(dependents) = self.downstream.get(&current).cloned() else {
                continue;
            };
            for dependent in dependents {
                self.record(dependent, old, new);
                work.push_back(dependent);
            }
        }
    }

    fn remove_binding(&mut self, target: AttrRef) -> bool {
        let Some(up) = self.upstream.get(&target).copied() else {
            return false;
        };
        let last = self.resolve(target);
        self.upstream.remove(&target);
        if let Some(list) = self.downstream.get_mut(&up) {
            list.retain(|d| *d != target);
            if list.is_empty() {
                self.downstream.remove(&up);
            }
        }
        self.nodes[target.node.0].values[target.index] = last;

        log::info!("Unbound {}", self.qualified_name(target));
        emit(
            self.event_sink.as_ref(),
            EngineEvent::BindingRemoved {
                node: self.nodes[target.node.0].name.clone(),
                attribute: self.spec(target).name.clone(),
            },
        );
        true
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::NodeMetadata;
    use crate::events::{NullEventSink, VecEventSink};
    use crate::types::AttributeType;

    /// Records every batch it receives; optionally fails
    struct Probe {
        metadata: NodeMetadata,
        batches: Arc<std::sync::Mutex<Vec<ChangeBatch>>>,
        fail: bool,
    }

    impl Probe {
        fn new(attributes: Vec<AttributeSpec>) -> (Self, Arc<std::sync::Mutex<Vec<ChangeBatch>>>) {
            let batches = Arc::new(std::sync::Mutex::new(Vec::new()));
            let probe = Self {
                metadata: NodeMetadata {
                    node_type: "probe".to_string(),
                    label: "Probe".to_string(),
                    description: "Records batches".to_string(),
                    attributes,
                },
                batches: batches.clone(),
                fail: false,
            };
            (probe, batches)
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }
    }

    impl Gizmo for Probe {
        fn metadata(&self) -> NodeMetadata {
            self.metadata.clone()
        }

        fn execute(&mut self, _ctx: &mut NodeContext<'_>, changes: &ChangeBatch) -> Result<()> {
            self.batches.lock().unwrap().push(changes.clone());
            if self.fail {
                return Err(GizmoError::failed("probe failure"));
            }
            Ok(())
        }
    }

    fn num(n: f64) -> AttributeValue {
        AttributeValue::Number(n)
    }

    fn source_attrs() -> Vec<AttributeSpec> {
        vec![
            AttributeSpec::input("x", "X", AttributeType::Number),
            AttributeSpec::output("out", "Out", AttributeType::Number),
        ]
    }

    fn sink_attrs() -> Vec<AttributeSpec> {
        vec![AttributeSpec::input("in", "In", AttributeType::Number)]
    }

    #[test]
    fn test_writes_coalesce_into_one_window() {
        let mut graph = NodeGraph::new(Arc::new(NullEventSink));
        let (probe, batches) = Probe::new(source_attrs());
        let a = graph.add_node("a", probe).unwrap();

        graph.set(a, "x", num(1.0)).unwrap();
        graph.set(a, "x", num(2.0)).unwrap();
        graph.set(a, "x", num(3.0)).unwrap();

        // Nothing is delivered until the loop runs
        assert!(batches.lock().unwrap().is_empty());
        assert_eq!(graph.pending_windows(), 1);

        assert_eq!(graph.run_until_idle().unwrap(), 1);
        let batches = batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 3);
        assert_eq!(batches[0].changes[2].old, num(2.0));
        assert_eq!(batches[0].changes[2].new, num(3.0));
    }

    #[test]
    fn test_separate_windows_after_delivery() {
        let mut graph = NodeGraph::new(Arc::new(NullEventSink));
        let (probe, batches) = Probe::new(source_attrs());
        let a = graph.add_node("a", probe).unwrap();

        graph.set(a, "x", num(1.0)).unwrap();
        graph.run_until_idle().unwrap();
        graph.set(a, "x", num(2.0)).unwrap();
        graph.run_until_idle().unwrap();

        assert_eq!(batches.lock().unwrap().len(), 2);
        // No writes, no window
        assert_eq!(graph.run_until_idle().unwrap(), 0);
    }

    #[test]
    fn test_equal_values_are_not_suppressed() {
        let mut graph = NodeGraph::new(Arc::new(NullEventSink));
        let (probe, batches) = Probe::new(source_attrs());
        let a = graph.add_node("a", probe).unwrap();

        graph.set(a, "x", num(5.0)).unwrap();
        graph.set(a, "x", num(5.0)).unwrap();
        graph.run_until_idle().unwrap();

        let batches = batches.lock().unwrap();
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[0].changes[1].old, num(5.0));
        assert_eq!(batches[0].changes[1].new, num(5.0));
    }

    #[test]
    fn test_type_mismatch_rejects_write() {
        let mut graph = NodeGraph::new(Arc::new(NullEventSink));
        let (probe, _) = Probe::new(source_attrs());
        let a = graph.add_node("a", probe).unwrap();

        let err = graph.set(a, "x", AttributeValue::Event(true)).unwrap_err();
        assert!(matches!(err, GizmoError::TypeMismatch { .. }));
        assert_eq!(graph.get(a, "x").unwrap(), num(0.0));
        assert!(graph.is_idle());
    }

    #[test]
    fn test_outputs_are_read_only_from_outside() {
        let mut graph = NodeGraph::new(Arc::new(NullEventSink));
        let (probe, _) = Probe::new(source_attrs());
        let a = graph.add_node("a", probe).unwrap();

        assert!(matches!(
            graph.set(a, "out", num(1.0)),
            Err(GizmoError::ReadOnlyAttribute { .. })
        ));
        assert!(matches!(
            graph.set(a, "missing", num(1.0)),
            Err(GizmoError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn test_duplicate_node_name() {
        let mut graph = NodeGraph::new(Arc::new(NullEventSink));
        graph.add_node("a", Probe::new(sink_attrs()).0).unwrap();
        assert!(matches!(
            graph.add_node("a", Probe::new(sink_attrs()).0),
            Err(GizmoError::DuplicateNode(_))
        ));
        assert_eq!(graph.node_id("a").unwrap().index(), 0);
        assert!(graph.node_id("b").is_err());
    }

    #[test]
    fn test_failing_computation_clears_busy_then_errors() {
        let sink = Arc::new(VecEventSink::new());
        let mut graph = NodeGraph::new(sink.clone());
        let (probe, batches) = Probe::new(sink_attrs());
        let a = graph.add_node("a", probe.failing()).unwrap();

        graph.set(a, "in", num(1.0)).unwrap();
        let err = graph.run_until_idle().unwrap_err();

        assert!(matches!(err, GizmoError::ComputationFailed { ref node, .. } if node == "a"));
        assert!(!graph.is_busy(a).unwrap());
        assert_eq!(batches.lock().unwrap().len(), 1);

        let events = sink.events();
        let idle = events
            .iter()
            .position(|e| matches!(e, EngineEvent::NodeIdle { .. }))
            .unwrap();
        let failed = events
            .iter()
            .position(|e| matches!(e, EngineEvent::ComputationFailed { .. }))
            .unwrap();
        assert!(idle < failed);

        // The window is consumed, not retried
        assert!(graph.is_idle());
    }

    /// Panics whenever `in` reads 1
    struct PanicsOnOne {
        runs: Arc<std::sync::Mutex<Vec<f64>>>,
    }

    impl Gizmo for PanicsOnOne {
        fn metadata(&self) -> NodeMetadata {
            NodeMetadata {
                node_type: "panics_on_one".to_string(),
                label: "Panics on one".to_string(),
                description: String::new(),
                attributes: sink_attrs(),
            }
        }

        fn execute(&mut self, ctx: &mut NodeContext<'_>, _changes: &ChangeBatch) -> Result<()> {
            let value = ctx.number("in")?;
            if value == 1.0 {
                panic!("cannot handle one");
            }
            self.runs.lock().unwrap().push(value);
            Ok(())
        }
    }

    #[test]
    fn test_panicking_computation_stays_usable() {
        let runs = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut graph = NodeGraph::new(Arc::new(NullEventSink));
        let a = graph
            .add_node("a", PanicsOnOne { runs: runs.clone() })
            .unwrap();

        graph.set(a, "in", num(1.0)).unwrap();
        let err = graph.step().unwrap_err();
        match err {
            GizmoError::ComputationFailed { node, source } => {
                assert_eq!(node, "a");
                assert!(matches!(*source, GizmoError::Panicked(ref msg) if msg == "cannot handle one"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!graph.is_busy(a).unwrap());

        // The next window reaches the same computation
        graph.set(a, "in", num(2.0)).unwrap();
        assert!(graph.step().unwrap().is_some());
        assert_eq!(*runs.lock().unwrap(), vec![2.0]);
    }

    #[test]
    fn test_binding_reads_through_and_schedules_downstream() {
        let mut graph = NodeGraph::new(Arc::new(NullEventSink));
        let (a_probe, _) = Probe::new(source_attrs());
        let (b_probe, b_batches) = Probe::new(sink_attrs());
        let a = graph.add_node("a", a_probe).unwrap();
        let b = graph.add_node("b", b_probe).unwrap();

        graph.bind(b, "in", a, "x").unwrap();
        graph.run_until_idle().unwrap();
        b_batches.lock().unwrap().clear();

        graph.set(a, "x", num(7.0)).unwrap();
        assert_eq!(graph.get(b, "in").unwrap(), num(7.0));
        graph.run_until_idle().unwrap();

        let batches = b_batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].changes[0].attribute, "in");
        assert_eq!(batches[0].changes[0].new, num(7.0));
    }

    #[test]
    fn test_bind_rejects_invalid_targets() {
        let mut graph = NodeGraph::new(Arc::new(NullEventSink));
        let a = graph.add_node("a", Probe::new(source_attrs()).0).unwrap();
        let b = graph
            .add_node(
                "b",
                Probe::new(vec![
                    AttributeSpec::input("in", "In", AttributeType::Number),
                    AttributeSpec::trigger("go", "Go"),
                ])
                .0,
            )
            .unwrap();

        assert!(matches!(
            graph.bind(a, "out", b, "in"),
            Err(GizmoError::NotBindable { .. })
        ));
        assert!(matches!(
            graph.bind(b, "go", a, "out"),
            Err(GizmoError::NotBindable { .. })
        ));
        assert!(matches!(
            graph.bind(b, "in", b, "go"),
            Err(GizmoError::TypeMismatch { .. })
        ));
        assert!(matches!(
            graph.bind(b, "in", b, "in"),
            Err(GizmoError::BindingLoop { .. })
        ));
        assert!(graph.bindings().is_empty());
    }

    #[test]
    fn test_direct_write_replaces_binding() {
        let mut graph = NodeGraph::new(Arc::new(NullEventSink));
        let a = graph.add_node("a", Probe::new(source_attrs()).0).unwrap();
        let b = graph.add_node("b", Probe::new(sink_attrs()).0).unwrap();

        graph.bind(b, "in", a, "x").unwrap();
        assert_eq!(graph.bindings().len(), 1);

        graph.set(b, "in", num(4.0)).unwrap();
        graph.set(a, "x", num(9.0)).unwrap();
        assert_eq!(graph.get(b, "in").unwrap(), num(4.0));
        assert!(graph.bindings().is_empty());
    }

    #[test]
    fn test_unbind_keeps_last_value() {
        let mut graph = NodeGraph::new(Arc::new(NullEventSink));
        let a = graph.add_node("a", Probe::new(source_attrs()).0).unwrap();
        let b = graph.add_node("b", Probe::new(sink_attrs()).0).unwrap();

        graph.bind(b, "in", a, "x").unwrap();
        graph.set(a, "x", num(3.0)).unwrap();
        assert!(graph.unbind(b, "in").unwrap());
        assert!(!graph.unbind(b, "in").unwrap());

        graph.set(a, "x", num(8.0)).unwrap();
        assert_eq!(graph.get(b, "in").unwrap(), num(3.0));
    }

    #[test]
    fn test_chained_inputs_propagate() {
        let mut graph = NodeGraph::new(Arc::new(NullEventSink));
        let a = graph.add_node("a", Probe::new(source_attrs()).0).unwrap();
        let (b_probe, b_batches) = Probe::new(sink_attrs());
        let (c_probe, c_batches) = Probe::new(sink_attrs());
        let b = graph.add_node("b", b_probe).unwrap();
        let c = graph.add_node("c", c_probe).unwrap();

        graph.bind(b, "in", a, "x").unwrap();
        graph.bind(c, "in", b, "in").unwrap();
        graph.run_until_idle().unwrap();
        b_batches.lock().unwrap().clear();
        c_batches.lock().unwrap().clear();

        graph.set(a, "x", num(2.0)).unwrap();
        graph.run_until_idle().unwrap();

        assert_eq!(graph.get(c, "in").unwrap(), num(2.0));
        assert_eq!(b_batches.lock().unwrap().len(), 1);
        assert_eq!(c_batches.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_binding_cycles_are_reported_not_prevented() {
        let attrs = || {
            vec![
                AttributeSpec::input("in", "In", AttributeType::Number),
                AttributeSpec::output("out", "Out", AttributeType::Number),
            ]
        };
        let mut graph = NodeGraph::new(Arc::new(NullEventSink));
        let a = graph.add_node("a", Probe::new(attrs()).0).unwrap();
        let b = graph.add_node("b", Probe::new(attrs()).0).unwrap();
        let c = graph.add_node("c", Probe::new(attrs()).0).unwrap();

        graph.bind(b, "in", a, "out").unwrap();
        graph.bind(c, "in", b, "out").unwrap();
        assert!(graph.binding_cycles().is_empty());

        graph.bind(a, "in", c, "out").unwrap();
        let mut cycle = graph.binding_cycles();
        cycle.sort();
        assert_eq!(cycle, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_node_view_reports_bindings() {
        let mut graph = NodeGraph::new(Arc::new(NullEventSink));
        let a = graph.add_node("a", Probe::new(source_attrs()).0).unwrap();
        let b = graph.add_node("b", Probe::new(sink_attrs()).0).unwrap();
        graph.bind(b, "in", a, "x").unwrap();
        graph.set(a, "x", num(1.5)).unwrap();

        let view = graph.node_view(b).unwrap();
        assert_eq!(view.name, "b");
        assert!(!view.busy);
        assert_eq!(view.attributes[0].value, num(1.5));
        assert_eq!(view.attributes[0].bound_to.as_deref(), Some("a.x"));
        assert_eq!(graph.views().len(), 2);
    }
}
