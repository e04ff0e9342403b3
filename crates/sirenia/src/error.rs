use crate::graph::{EdgeId, GraphId, NodeId};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("graph manager has no root graph")]
    NoRootGraph,
    #[error("node {node:?} is already attached to graph {graph:?}")]
    NodeAlreadyAttached { node: NodeId, graph: GraphId },
    #[error("node {node:?} is not listed by its owner graph")]
    NodeNotInGraph { node: NodeId },
    #[error("node {node:?} is detached from every graph")]
    NodeDetached { node: NodeId },
    #[error("node {node:?} already has a child graph")]
    NodeHasChildGraph { node: NodeId },
    #[error("graph {graph:?} already has a parent node")]
    GraphHasParent { graph: GraphId },
    #[error("graph {graph:?} has been removed from the graph manager")]
    GraphRemoved { graph: GraphId },
    #[error("edge {edge:?} has an endpoint that is not attached to any graph")]
    EdgeEndpointDetached { edge: EdgeId },
    #[error("edge {edge:?} is already placed in an edge list")]
    EdgeAlreadyPlaced { edge: EdgeId },
    #[error("edge {edge:?} is missing from the incidence list of one of its endpoints")]
    EdgeNotInIncidenceList { edge: EdgeId },
    #[error("edge {edge:?} is not placed in any edge list")]
    EdgeNotPlaced { edge: EdgeId },
    #[error("edge {edge:?} is not an inter-graph edge")]
    NotInterGraphEdge { edge: EdgeId },
    #[error("edge {edge:?} endpoints are not both owned by graph {graph:?}")]
    EdgeOwnerMismatch { edge: EdgeId, graph: GraphId },

    #[error("duplicate node id: {id}")]
    DuplicateNodeId { id: String },
    #[error("duplicate edge id: {id}")]
    DuplicateEdgeId { id: String },
    #[error("node {id} references an unknown parent: {parent}")]
    UnknownParent { id: String, parent: String },
    #[error("node {id} is part of a parent cycle")]
    ParentCycle { id: String },
    #[error("graph contains an edge with a missing endpoint: {edge_id}")]
    MissingEndpoint { edge_id: String },
}

pub type Result<T> = std::result::Result<T, Error>;
