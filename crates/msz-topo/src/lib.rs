#![deny(missing_docs)]
#![doc = "Assumption topology compiler: named assumptions in, dependency-ordered computation graph out."]

//! Pattern inference runs an ordered list of matchers over the assumption
//! keys; the first hit picks a typed builder. Every emitted node reads only
//! nodes defined before it, so a renderer can translate the graph into
//! linked formulas in a single pass.

/// Pattern dispatch and graph construction.
pub mod compiler;
/// Graph, node and expression types.
pub mod graph;
/// Key-naming patterns and their matchers.
pub mod pattern;

pub use compiler::{CompilerOptions, TopologyCompiler};
pub use graph::{ComputationNode, Expression, NodeKind, Operand, TopologyGraph};
pub use pattern::Pattern;
