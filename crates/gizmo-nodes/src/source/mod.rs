//! Source nodes
//!
//! Nodes that produce values on demand, driven by a trigger attribute.

mod incrementer;

pub use incrementer::Incrementer;
