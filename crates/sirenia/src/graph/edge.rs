use super::{GraphId, NodeId};
use crate::geometry::Point;

/// Which edge list currently holds an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgePlacement {
    Detached,
    Graph(GraphId),
    InterGraph,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub(crate) source: NodeId,
    pub(crate) target: NodeId,
    pub(crate) placement: EdgePlacement,

    pub(crate) ideal_length: f64,
    pub(crate) length: f64,
    pub(crate) length_x: f64,
    pub(crate) length_y: f64,
    pub(crate) is_overlapping_source_and_target: bool,

    pub bendpoints: Vec<Point>,

    pub(crate) lca: Option<GraphId>,
    pub(crate) source_in_lca: Option<NodeId>,
    pub(crate) target_in_lca: Option<NodeId>,

    pub external_key: Option<String>,
}

impl Edge {
    pub(crate) fn new(source: NodeId, target: NodeId, ideal_length: f64) -> Self {
        Self {
            source,
            target,
            placement: EdgePlacement::Detached,
            ideal_length,
            length: 0.0,
            length_x: 0.0,
            length_y: 0.0,
            is_overlapping_source_and_target: false,
            bendpoints: Vec::new(),
            lca: None,
            source_in_lca: None,
            target_in_lca: None,
            external_key: None,
        }
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn placement(&self) -> EdgePlacement {
        self.placement
    }

    pub fn is_inter_graph(&self) -> bool {
        self.placement == EdgePlacement::InterGraph
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    pub fn ideal_length(&self) -> f64 {
        self.ideal_length
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn length_components(&self) -> (f64, f64) {
        (self.length_x, self.length_y)
    }

    pub fn is_overlapping_source_and_target(&self) -> bool {
        self.is_overlapping_source_and_target
    }

    pub fn lca(&self) -> Option<GraphId> {
        self.lca
    }

    pub fn source_in_lca(&self) -> Option<NodeId> {
        self.source_in_lca
    }

    pub fn target_in_lca(&self) -> Option<NodeId> {
        self.target_in_lca
    }

    /// The endpoint opposite to `node`; a self-loop returns `node` itself.
    pub fn other_end(&self, node: NodeId) -> Option<NodeId> {
        if node == self.source {
            Some(self.target)
        } else if node == self.target {
            Some(self.source)
        } else {
            None
        }
    }
}
