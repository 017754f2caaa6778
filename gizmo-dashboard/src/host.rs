//! Engine host
//!
//! The node graph is single-threaded and node computations block, so the
//! graph lives on a dedicated thread. HTTP handlers talk to it through an
//! [`EngineHandle`]: writes go over a command channel, reads come from the
//! snapshot the thread publishes after every command and every delivered
//! window. Busy flags are shared atomics and are read live.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use gizmo_engine::{
    AttributeValue, BusyIndicator, EngineEvent, EventError, EventSink, GizmoError, NodeGraph,
    NodeView,
};
use parking_lot::RwLock;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};

use crate::error::DashboardError;
use crate::presentation::{Dashboard, NodeCard, PresentationConfig};

type Reply = oneshot::Sender<Result<(), GizmoError>>;

/// Requests handled on the engine thread
#[derive(Debug)]
pub enum EngineCommand {
    Set {
        node: String,
        attribute: String,
        value: AttributeValue,
        reply: Reply,
    },
    Trigger {
        node: String,
        attribute: String,
        reply: Reply,
    },
    Shutdown,
}

/// Event sink that writes engine events to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEventSink;

impl EventSink for LoggingEventSink {
    fn send(&self, event: EngineEvent) -> Result<(), EventError> {
        match &event {
            EngineEvent::ComputationFailed { node, error } => {
                log::warn!("[{}] computation failed: {}", node, error)
            }
            _ => log::debug!("[{}] {:?}", event.node(), event),
        }
        Ok(())
    }
}

/// Owns the graph on its own thread
pub struct EngineHost {
    graph: NodeGraph,
    commands: mpsc::UnboundedReceiver<EngineCommand>,
    snapshot: Arc<RwLock<Vec<NodeView>>>,
}

impl EngineHost {
    /// Move `graph` onto a new thread and return a handle to it
    pub fn spawn(graph: NodeGraph) -> Result<(EngineHandle, JoinHandle<()>), DashboardError> {
        let busy: HashMap<String, BusyIndicator> = graph
            .node_ids()
            .filter_map(|id| {
                let name = graph.node_name(id).ok()?.to_string();
                let indicator = graph.busy_indicator(id).ok()?;
                Some((name, indicator))
            })
            .collect();

        let snapshot = Arc::new(RwLock::new(graph.views()));
        let (tx, rx) = mpsc::unbounded_channel();

        let host = EngineHost {
            graph,
            commands: rx,
            snapshot: snapshot.clone(),
        };
        let thread = thread::Builder::new()
            .name("gizmo-engine".to_string())
            .spawn(move || host.run())?;

        let handle = EngineHandle {
            commands: tx,
            snapshot,
            busy: Arc::new(busy),
        };
        Ok((handle, thread))
    }

    fn run(mut self) {
        log::info!("Engine host started");
        loop {
            // Writes queued while a computation ran are applied before the next window
            loop {
                match self.commands.try_recv() {
                    Ok(command) => {
                        if !self.handle(command) {
                            return self.stop();
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return self.stop(),
                }
            }

            if self.graph.is_idle() {
                match self.commands.blocking_recv() {
                    Some(command) => {
                        if !self.handle(command) {
                            return self.stop();
                        }
                        continue;
                    }
                    None => return self.stop(),
                }
            }

            if let Err(err) = self.graph.step() {
                log::error!("{}", err);
            }
            self.publish();
        }
    }

    /// Apply one command; returns false on shutdown
    fn handle(&mut self, command: EngineCommand) -> bool {
        let (result, reply) = match command {
            EngineCommand::Set {
                node,
                attribute,
                value,
                reply,
            } => {
                let result = self
                    .graph
                    .node_id(&node)
                    .and_then(|id| self.graph.set(id, &attribute, value));
                (result, reply)
            }
            EngineCommand::Trigger {
                node,
                attribute,
                reply,
            } => {
                let result = self
                    .graph
                    .node_id(&node)
                    .and_then(|id| self.graph.trigger(id, &attribute));
                (result, reply)
            }
            EngineCommand::Shutdown => return false,
        };

        if result.is_ok() {
            self.publish();
        }
        // The requester may have gone away; the write still stands
        let _ = reply.send(result);
        true
    }

    fn publish(&self) {
        *self.snapshot.write() = self.graph.views();
    }

    fn stop(self) {
        let pending = self.graph.pending_windows();
        if pending > 0 {
            log::warn!("Engine host stopping with {} undelivered window(s)", pending);
        }
        log::info!("Engine host stopped");
    }
}

/// Cloneable handle to a running [`EngineHost`]
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<EngineCommand>,
    snapshot: Arc<RwLock<Vec<NodeView>>>,
    busy: Arc<HashMap<String, BusyIndicator>>,
}

impl EngineHandle {
    /// Write a value to an input or trigger
    ///
    /// Resolves once the write is applied and scheduled, not once the
    /// resulting computations finish.
    pub async fn set(
        &self,
        node: &str,
        attribute: &str,
        value: AttributeValue,
    ) -> Result<(), DashboardError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Set {
            node: node.to_string(),
            attribute: attribute.to_string(),
            value,
            reply,
        })?;
        Ok(rx.await.map_err(|_| DashboardError::EngineStopped)??)
    }

    /// Fire a trigger attribute
    pub async fn trigger(&self, node: &str, attribute: &str) -> Result<(), DashboardError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Trigger {
            node: node.to_string(),
            attribute: attribute.to_string(),
            reply,
        })?;
        Ok(rx.await.map_err(|_| DashboardError::EngineStopped)??)
    }

    /// Latest snapshot with busy flags read live
    pub fn views(&self) -> Vec<NodeView> {
        let mut views = self.snapshot.read().clone();
        for view in &mut views {
            if let Some(indicator) = self.busy.get(&view.name) {
                view.busy = indicator.is_busy();
            }
        }
        views
    }

    /// Whether any node is computing
    pub fn is_busy(&self) -> bool {
        self.busy.values().any(BusyIndicator::is_busy)
    }

    /// Build the card column from the latest snapshot
    pub fn dashboard(&self, config: &PresentationConfig) -> Dashboard {
        let cards = self
            .views()
            .into_iter()
            .filter_map(|view| {
                let busy = self.busy.get(&view.name)?.clone();
                Some(NodeCard::new(view, busy, config))
            })
            .collect();
        Dashboard::new(cards, config.clone())
    }

    /// Ask the engine thread to stop after its current computation
    pub fn shutdown(&self) {
        if self.commands.send(EngineCommand::Shutdown).is_err() {
            log::debug!("Engine host already stopped");
        }
    }

    fn send(&self, command: EngineCommand) -> Result<(), DashboardError> {
        self.commands
            .send(command)
            .map_err(|_| DashboardError::EngineStopped)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use gizmo_engine::{
        AttributeSpec, AttributeType, ChangeBatch, Gizmo, NodeContext, NodeMetadata, Result,
        VecEventSink,
    };
    use gizmo_nodes::build_demo_graph;

    use super::*;

    /// Scales `in` by ten; errors on negative input and panics on 99
    struct Scaler;

    impl Gizmo for Scaler {
        fn metadata(&self) -> NodeMetadata {
            NodeMetadata {
                node_type: "scaler".to_string(),
                label: "Scaler".to_string(),
                description: "Multiplies its input by ten".to_string(),
                attributes: vec![
                    AttributeSpec::input("in", "In", AttributeType::Number),
                    AttributeSpec::output("out", "Out", AttributeType::Number),
                ],
            }
        }

        fn execute(&mut self, ctx: &mut NodeContext<'_>, _changes: &ChangeBatch) -> Result<()> {
            let value = ctx.number("in")?;
            if value < 0.0 {
                return Err(GizmoError::failed("negative input"));
            }
            if value == 99.0 {
                panic!("scaler overflow");
            }
            ctx.set_number("out", value * 10.0)
        }
    }

    fn spawn_demo(delay: Duration) -> EngineHandle {
        let demo = build_demo_graph(Arc::new(LoggingEventSink), delay).unwrap();
        let (handle, _thread) = EngineHost::spawn(demo.graph).unwrap();
        handle
    }

    fn value_of(handle: &EngineHandle, node: &str, attribute: &str) -> Option<AttributeValue> {
        handle
            .views()
            .iter()
            .find(|v| v.name == node)
            .and_then(|v| v.attribute(attribute))
            .map(|a| a.value)
    }

    async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_trigger_reaches_doubler() {
        let handle = spawn_demo(Duration::ZERO);
        handle.trigger("a", "run").await.unwrap();

        assert!(
            wait_for(|| {
                value_of(&handle, "c", "multiplied_by_two") == Some(AttributeValue::Number(6.0))
            })
            .await
        );
        assert!(wait_for(|| !handle.is_busy()).await);
        assert_eq!(value_of(&handle, "a", "run"), Some(AttributeValue::Event(false)));
        handle.shutdown();
    }

    #[tokio::test]
    async fn test_rejected_writes_surface_errors() {
        let handle = spawn_demo(Duration::ZERO);

        assert!(matches!(
            handle.trigger("z", "run").await,
            Err(DashboardError::Engine(GizmoError::UnknownNode(_)))
        ));
        assert!(matches!(
            handle.set("a", "out_1", AttributeValue::Number(5.0)).await,
            Err(DashboardError::Engine(GizmoError::ReadOnlyAttribute { .. }))
        ));
        handle.shutdown();
    }

    #[tokio::test]
    async fn test_busy_visible_while_computing() {
        let handle = spawn_demo(Duration::from_millis(300));
        assert!(wait_for(|| !handle.is_busy()).await);

        handle.trigger("a", "run").await.unwrap();
        assert!(wait_for(|| handle.is_busy()).await);
        assert_eq!(
            handle.dashboard(&PresentationConfig::default()).render().cards.len(),
            3
        );

        assert!(wait_for(|| {
            value_of(&handle, "c", "multiplied_by_two") == Some(AttributeValue::Number(6.0))
        })
        .await);
        handle.shutdown();
    }

    #[tokio::test]
    async fn test_loop_continues_after_failed_computation() {
        let sink = Arc::new(VecEventSink::new());
        let mut graph = NodeGraph::new(sink.clone());
        graph.add_node("s", Scaler).unwrap();
        let (handle, thread) = EngineHost::spawn(graph).unwrap();
        let out = || value_of(&handle, "s", "out");
        let failures = || {
            sink.events()
                .iter()
                .filter(|e| matches!(e, EngineEvent::ComputationFailed { .. }))
                .count()
        };

        handle.set("s", "in", AttributeValue::Number(1.0)).await.unwrap();
        assert!(wait_for(|| out() == Some(AttributeValue::Number(10.0))).await);

        // Error returned by the computation
        handle.set("s", "in", AttributeValue::Number(-1.0)).await.unwrap();
        assert!(wait_for(|| failures() == 1).await);
        // Panic inside the computation
        handle.set("s", "in", AttributeValue::Number(99.0)).await.unwrap();
        assert!(wait_for(|| failures() == 2).await);

        handle.set("s", "in", AttributeValue::Number(2.0)).await.unwrap();
        assert!(wait_for(|| out() == Some(AttributeValue::Number(20.0))).await);
        assert!(wait_for(|| !handle.is_busy()).await);
        assert!(!thread.is_finished());

        handle.shutdown();
    }

    #[tokio::test]
    async fn test_commands_fail_after_shutdown() {
        let demo = build_demo_graph(Arc::new(LoggingEventSink), Duration::ZERO).unwrap();
        let (handle, thread) = EngineHost::spawn(demo.graph).unwrap();

        handle.shutdown();
        tokio::task::spawn_blocking(move || thread.join())
            .await
            .unwrap()
            .unwrap();

        assert!(matches!(
            handle.trigger("a", "run").await,
            Err(DashboardError::EngineStopped)
        ));
    }
}
