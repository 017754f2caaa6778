//! Adder Node
//!
//! Sums two numeric inputs.

use std::time::Duration;

use gizmo_engine::{
    AttributeSpec, AttributeType, ChangeBatch, Gizmo, GizmoDescriptor, NodeContext, NodeMetadata,
    Result,
};

use crate::simulate_work;

/// Adder Node
///
/// Recomputes `out_3 = in_1 + in_2` on every window. Both inputs are read
/// after the delay, so writes that land in the same window are summed
/// together.
///
/// # Attributes
/// - `in_1` (input) - First addend
/// - `in_2` (input) - Second addend
/// - `out_3` (output) - Sum
#[derive(Debug, Clone, Default)]
pub struct Adder {
    delay: Duration,
}

impl Adder {
    pub const ATTR_IN_1: &'static str = "in_1";
    pub const ATTR_IN_2: &'static str = "in_2";
    pub const ATTR_OUT_3: &'static str = "out_3";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

impl GizmoDescriptor for Adder {
    fn descriptor() -> NodeMetadata {
        NodeMetadata {
            node_type: "adder".to_string(),
            label: "Adder".to_string(),
            description: "Adds its two inputs".to_string(),
            attributes: vec![
                AttributeSpec::input(Self::ATTR_IN_1, "In 1", AttributeType::Number),
                AttributeSpec::input(Self::ATTR_IN_2, "In 2", AttributeType::Number),
                AttributeSpec::output(Self::ATTR_OUT_3, "Out 3", AttributeType::Number),
            ],
        }
    }
}

inventory::submit!(gizmo_engine::DescriptorFn(Adder::descriptor));

impl Gizmo for Adder {
    fn metadata(&self) -> NodeMetadata {
        Self::descriptor()
    }

    fn execute(&mut self, ctx: &mut NodeContext<'_>, changes: &ChangeBatch) -> Result<()> {
        log::debug!("{}: {} input change(s)", ctx.name(), changes.len());
        let in_1 = ctx.number(Self::ATTR_IN_1)?;
        log::info!("{}.in_1={}", ctx.name(), in_1);

        simulate_work(self.delay);

        let in_2 = ctx.number(Self::ATTR_IN_2)?;
        log::info!("{}.in_2={}", ctx.name(), in_2);

        let sum = in_1 + in_2;
        ctx.set_number(Self::ATTR_OUT_3, sum)?;
        log::info!("{}.out_3={}", ctx.name(), sum);
        Ok(())
    }
}
