//! Nested graph model.
//!
//! The [`GraphManager`] owns every node, edge and graph in arenas and hands out `Copy` handles.
//! A compound node points at its child [`Graph`]; every attached node is owned by exactly one
//! graph. Edges whose endpoints share an owner live in that graph's edge list, all others are
//! inter-graph edges kept by the manager. Removing an element detaches it but keeps its slot,
//! so handles taken earlier can still be used to read results back.

mod bounds;
mod edge;
mod hierarchy;
mod manager;
mod node;

pub use edge::{Edge, EdgePlacement};
pub use manager::{Graph, GraphManager, GraphSettings};
pub use node::{GridSpan, LabelHAlign, LabelVAlign, Node, NodeLabel, Padding};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl EdgeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl GraphId {
    pub fn index(self) -> usize {
        self.0
    }
}
