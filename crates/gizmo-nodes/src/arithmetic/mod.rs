//! Arithmetic nodes
//!
//! Nodes that recompute their output from their (usually bound) inputs
//! whenever an input changes.

mod adder;
mod doubler;

pub use adder::Adder;
pub use doubler::Doubler;
