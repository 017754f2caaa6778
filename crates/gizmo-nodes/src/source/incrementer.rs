//! Incrementer Node
//!
//! Bumps a counter each time its `run` trigger fires and derives a second
//! output from it.

use std::time::Duration;

use gizmo_engine::{
    AttributeSpec, AttributeType, ChangeBatch, Gizmo, GizmoDescriptor, NodeContext, NodeMetadata,
    Result,
};

use crate::simulate_work;

/// Incrementer Node
///
/// When `run` is true: `out_1 += 1`, then after the configured delay
/// `out_2 = out_1 + 1`, then `run` is reset to false. Windows in which `run`
/// is false (including the one caused by the reset itself) do nothing.
///
/// # Attributes
/// - `out_1` (output) - Counter
/// - `out_2` (output) - Counter plus one
/// - `run` (trigger) - Fires one increment
#[derive(Debug, Clone, Default)]
pub struct Incrementer {
    /// Simulated work between the two output writes
    delay: Duration,
}

impl Incrementer {
    /// Attribute name for the counter output
    pub const ATTR_OUT_1: &'static str = "out_1";
    /// Attribute name for the derived output
    pub const ATTR_OUT_2: &'static str = "out_2";
    /// Attribute name for the trigger
    pub const ATTR_RUN: &'static str = "run";

    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a simulated work delay
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

impl GizmoDescriptor for Incrementer {
    fn descriptor() -> NodeMetadata {
        NodeMetadata {
            node_type: "incrementer".to_string(),
            label: "Incrementer".to_string(),
            description: "Increments a counter each time it is run".to_string(),
            attributes: vec![
                AttributeSpec::output(Self::ATTR_OUT_1, "Out 1", AttributeType::Number),
                AttributeSpec::output(Self::ATTR_OUT_2, "Out 2", AttributeType::Number),
                AttributeSpec::trigger(Self::ATTR_RUN, "Run"),
            ],
        }
    }
}

inventory::submit!(gizmo_engine::DescriptorFn(Incrementer::descriptor));

impl Gizmo for Incrementer {
    fn metadata(&self) -> NodeMetadata {
        Self::descriptor()
    }

    fn execute(&mut self, ctx: &mut NodeContext<'_>, _changes: &ChangeBatch) -> Result<()> {
        if !ctx.event(Self::ATTR_RUN)? {
            return Ok(());
        }

        log::info!("Incrementing {}.out_1", ctx.name());
        let out_1 = ctx.number(Self::ATTR_OUT_1)? + 1.0;
        ctx.set_number(Self::ATTR_OUT_1, out_1)?;

        simulate_work(self.delay);

        log::info!("Incrementing {}.out_2", ctx.name());
        ctx.set_number(Self::ATTR_OUT_2, out_1 + 1.0)?;

        ctx.reset(Self::ATTR_RUN)
    }
}
