//! Doubler Node

use std::time::Duration;

use gizmo_engine::{
    AttributeSpec, AttributeType, ChangeBatch, Gizmo, GizmoDescriptor, NodeContext, NodeMetadata,
    Result,
};

use crate::simulate_work;

/// Multiplies `in_3` by two into `multiplied_by_two`
#[derive(Debug, Clone, Default)]
pub struct Doubler {
    delay: Duration,
}

impl Doubler {
    pub const ATTR_IN_3: &'static str = "in_3";
    pub const ATTR_MULTIPLIED_BY_TWO: &'static str = "multiplied_by_two";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

impl GizmoDescriptor for Doubler {
    fn descriptor() -> NodeMetadata {
        NodeMetadata {
            node_type: "doubler".to_string(),
            label: "Doubler".to_string(),
            description: "Multiplies its input by two".to_string(),
            attributes: vec![
                AttributeSpec::input(Self::ATTR_IN_3, "In 3", AttributeType::Number),
                AttributeSpec::output(
                    Self::ATTR_MULTIPLIED_BY_TWO,
                    "Multiplied by two",
                    AttributeType::Number,
                ),
            ],
        }
    }
}

inventory::submit!(gizmo_engine::DescriptorFn(Doubler::descriptor));

impl Gizmo for Doubler {
    fn metadata(&self) -> NodeMetadata {
        Self::descriptor()
    }

    fn execute(&mut self, ctx: &mut NodeContext<'_>, _changes: &ChangeBatch) -> Result<()> {
        let in_3 = ctx.number(Self::ATTR_IN_3)?;
        log::info!("{}.in_3={}, multiplying by 2", ctx.name(), in_3);

        simulate_work(self.delay);

        ctx.set_number(Self::ATTR_MULTIPLIED_BY_TWO, in_3 * 2.0)?;
        log::info!("{}.multiplied_by_two={}", ctx.name(), in_3 * 2.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gizmo_engine::{AttributeValue, GizmoError, NodeGraph, NullEventSink};

    use super::*;

    #[test]
    fn test_doubles_input() {
        let mut graph = NodeGraph::new(Arc::new(NullEventSink));
        let c = graph.add_node("c", Doubler::new()).unwrap();

        graph.set(c, "in_3", AttributeValue::Number(-4.0)).unwrap();
        graph.run_until_idle().unwrap();

        assert_eq!(
            graph.get(c, "multiplied_by_two").unwrap(),
            AttributeValue::Number(-8.0)
        );
    }

    #[test]
    fn test_rejects_event_input() {
        let mut graph = NodeGraph::new(Arc::new(NullEventSink));
        let c = graph.add_node("c", Doubler::new()).unwrap();

        assert!(matches!(
            graph.set(c, "in_3", AttributeValue::Event(true)),
            Err(GizmoError::TypeMismatch { .. })
        ));
    }
}
