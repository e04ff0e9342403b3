use std::cell::OnceCell;
use std::rc::Rc;

use indexmap::IndexSet;
use tracing::trace;

use super::{Edge, EdgeId, EdgePlacement, GraphId, Node, NodeId};
use crate::config::LayoutConfig;
use crate::error::{Error, Result};
use crate::geometry::Rect;

/// Structural constants the graph model needs for bounds and size estimation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphSettings {
    pub margin: f64,
    pub empty_compound_node_size: f64,
    pub node_dimensions_include_labels: bool,
    pub default_edge_length: f64,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self::from(&LayoutConfig::default())
    }
}

impl From<&LayoutConfig> for GraphSettings {
    fn from(config: &LayoutConfig) -> Self {
        Self {
            margin: config.graph_margin,
            empty_compound_node_size: config.empty_compound_node_size,
            node_dimensions_include_labels: config.node_dimensions_include_labels,
            default_edge_length: config.ideal_edge_length,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Graph {
    pub(crate) parent: Option<NodeId>,
    pub(crate) nodes: Vec<NodeId>,
    pub(crate) edges: Vec<EdgeId>,
    pub(crate) left: f64,
    pub(crate) top: f64,
    pub(crate) right: f64,
    pub(crate) bottom: f64,
    pub(crate) margin: f64,
    pub(crate) estimated_size: Option<f64>,
    pub(crate) is_connected: bool,
    pub(crate) removed: bool,
}

impl Graph {
    fn new(parent: NodeId, margin: f64) -> Self {
        Self {
            parent: Some(parent),
            nodes: Vec::new(),
            edges: Vec::new(),
            left: 0.0,
            top: 0.0,
            right: 0.0,
            bottom: 0.0,
            margin,
            estimated_size: None,
            is_connected: false,
            removed: false,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn top(&self) -> f64 {
        self.top
    }

    pub fn right(&self) -> f64 {
        self.right
    }

    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    pub fn estimated_size(&self) -> Option<f64> {
        self.estimated_size
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }
}

#[derive(Debug, Clone)]
pub struct GraphManager {
    pub(crate) settings: GraphSettings,
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) graphs: Vec<Graph>,
    graph_list: Vec<GraphId>,
    inter_graph_edges: Vec<EdgeId>,
    pub(crate) root: Option<GraphId>,
    root_node: Option<NodeId>,

    all_nodes: OnceCell<Rc<[NodeId]>>,
    all_edges: OnceCell<Rc<[EdgeId]>>,
    all_nodes_to_apply_gravitation: Option<Rc<[NodeId]>>,
}

impl Default for GraphManager {
    fn default() -> Self {
        Self::new(GraphSettings::default())
    }
}

impl GraphManager {
    pub fn new(settings: GraphSettings) -> Self {
        Self {
            settings,
            nodes: Vec::new(),
            edges: Vec::new(),
            graphs: Vec::new(),
            graph_list: Vec::new(),
            inter_graph_edges: Vec::new(),
            root: None,
            root_node: None,
            all_nodes: OnceCell::new(),
            all_edges: OnceCell::new(),
            all_nodes_to_apply_gravitation: None,
        }
    }

    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    pub fn root(&self) -> Option<GraphId> {
        self.root
    }

    /// Synthetic parent of the root graph. It is never owned by a graph.
    pub fn root_node(&self) -> Option<NodeId> {
        self.root_node
    }

    /// Live graphs in creation order, root first.
    pub fn graphs(&self) -> &[GraphId] {
        &self.graph_list
    }

    pub fn inter_graph_edges(&self) -> &[EdgeId] {
        &self.inter_graph_edges
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> &mut Edge {
        &mut self.edges[id.0]
    }

    pub fn graph(&self, id: GraphId) -> &Graph {
        &self.graphs[id.0]
    }

    pub fn graph_mut(&mut self, id: GraphId) -> &mut Graph {
        &mut self.graphs[id.0]
    }

    /// Number of node slots ever allocated, attached or not.
    pub fn node_capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn add_root(&mut self) -> GraphId {
        let root_node = NodeId(self.nodes.len());
        self.nodes.push(Node::new(Rect::default()));
        let graph = self.push_graph(root_node);
        self.nodes[root_node.0].child = Some(graph);
        self.root = Some(graph);
        self.root_node = Some(root_node);
        graph
    }

    /// Creates the child graph of `parent`.
    pub fn add_graph(&mut self, parent: NodeId) -> Result<GraphId> {
        if self.nodes[parent.0].child.is_some() {
            return Err(Error::NodeHasChildGraph { node: parent });
        }
        let graph = self.push_graph(parent);
        self.nodes[parent.0].child = Some(graph);
        Ok(graph)
    }

    fn push_graph(&mut self, parent: NodeId) -> GraphId {
        let id = GraphId(self.graphs.len());
        self.graphs.push(Graph::new(parent, self.settings.margin));
        self.graph_list.push(id);
        self.reset_all_nodes();
        id
    }

    /// Allocates a detached node.
    pub fn new_node(&mut self, rect: Rect) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(rect));
        id
    }

    pub fn add_node(&mut self, graph: GraphId, node: NodeId) -> Result<NodeId> {
        if self.graphs[graph.0].removed {
            return Err(Error::GraphRemoved { graph });
        }
        if let Some(owner) = self.nodes[node.0].owner {
            return Err(Error::NodeAlreadyAttached { node, graph: owner });
        }
        if Some(node) == self.root_node {
            return Err(Error::NodeAlreadyAttached {
                node,
                graph: self.root.ok_or(Error::NoRootGraph)?,
            });
        }
        self.nodes[node.0].owner = Some(graph);
        self.graphs[graph.0].nodes.push(node);
        self.reset_all_nodes();
        Ok(node)
    }

    /// Allocates a node and attaches it to `graph`.
    pub fn create_node(&mut self, graph: GraphId, rect: Rect) -> Result<NodeId> {
        let node = self.new_node(rect);
        self.add_node(graph, node)
    }

    /// Allocates an edge and places it in the matching edge list.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId) -> Result<EdgeId> {
        let id = EdgeId(self.edges.len());
        self.edges.push(Edge::new(
            source,
            target,
            self.settings.default_edge_length,
        ));
        self.attach_edge(id)?;
        Ok(id)
    }

    /// Places a detached edge: the shared owner's edge list when both endpoints have the same
    /// owner, the inter-graph list otherwise.
    pub fn attach_edge(&mut self, edge: EdgeId) -> Result<()> {
        let (source, target, placement) = {
            let e = &self.edges[edge.0];
            (e.source, e.target, e.placement)
        };
        if placement != EdgePlacement::Detached {
            return Err(Error::EdgeAlreadyPlaced { edge });
        }
        let source_owner = self.nodes[source.0]
            .owner
            .ok_or(Error::EdgeEndpointDetached { edge })?;
        let target_owner = self.nodes[target.0]
            .owner
            .ok_or(Error::EdgeEndpointDetached { edge })?;
        if self.nodes[source.0].edges.contains(&edge) || self.nodes[target.0].edges.contains(&edge)
        {
            return Err(Error::EdgeAlreadyPlaced { edge });
        }

        if source_owner == target_owner {
            self.graphs[source_owner.0].edges.push(edge);
            self.edges[edge.0].placement = EdgePlacement::Graph(source_owner);
        } else {
            self.inter_graph_edges.push(edge);
            self.edges[edge.0].placement = EdgePlacement::InterGraph;
        }
        self.nodes[source.0].edges.push(edge);
        if target != source {
            self.nodes[target.0].edges.push(edge);
        }
        self.reset_all_edges();
        Ok(())
    }

    pub fn remove_edge(&mut self, edge: EdgeId) -> Result<()> {
        let (source, target, placement) = {
            let e = &self.edges[edge.0];
            (e.source, e.target, e.placement)
        };

        match placement {
            EdgePlacement::Detached => return Err(Error::EdgeNotPlaced { edge }),
            EdgePlacement::Graph(graph) => {
                if self.nodes[source.0].owner != Some(graph)
                    || self.nodes[target.0].owner != Some(graph)
                {
                    return Err(Error::EdgeOwnerMismatch { edge, graph });
                }
            }
            EdgePlacement::InterGraph => {}
        }

        let source_pos = self.nodes[source.0].edges.iter().position(|e| *e == edge);
        let target_pos = self.nodes[target.0].edges.iter().position(|e| *e == edge);
        let (Some(source_pos), Some(_)) = (source_pos, target_pos) else {
            return Err(Error::EdgeNotInIncidenceList { edge });
        };

        let list = match placement {
            EdgePlacement::Graph(graph) => &mut self.graphs[graph.0].edges,
            _ => &mut self.inter_graph_edges,
        };
        let Some(list_pos) = list.iter().position(|e| *e == edge) else {
            return Err(Error::EdgeNotPlaced { edge });
        };
        list.remove(list_pos);

        self.nodes[source.0].edges.remove(source_pos);
        if target != source {
            if let Some(pos) = self.nodes[target.0].edges.iter().position(|e| *e == edge) {
                self.nodes[target.0].edges.remove(pos);
            }
        }
        self.edges[edge.0].placement = EdgePlacement::Detached;
        self.reset_all_edges();
        Ok(())
    }

    /// Detaches `node` from its owner after removing every incident edge.
    ///
    /// A child graph stays linked to the node.
    pub fn remove_node(&mut self, node: NodeId) -> Result<()> {
        let owner = self.nodes[node.0]
            .owner
            .ok_or(Error::NodeDetached { node })?;
        let Some(pos) = self.graphs[owner.0].nodes.iter().position(|n| *n == node) else {
            return Err(Error::NodeNotInGraph { node });
        };

        let incident = self.nodes[node.0].edges.clone();
        for edge in incident {
            self.remove_edge(edge)?;
        }

        self.graphs[owner.0].nodes.remove(pos);
        self.nodes[node.0].owner = None;
        self.reset_all_nodes();
        Ok(())
    }

    /// Removes a graph together with its edges and member nodes, recursing into member
    /// compounds, and unlinks it from its parent node.
    pub fn remove_graph(&mut self, graph: GraphId) -> Result<()> {
        if self.graphs[graph.0].removed {
            return Err(Error::GraphRemoved { graph });
        }

        let edges = self.graphs[graph.0].edges.clone();
        for edge in edges {
            self.remove_edge(edge)?;
        }
        let nodes = self.graphs[graph.0].nodes.clone();
        for node in nodes {
            if let Some(child) = self.nodes[node.0].child {
                self.remove_graph(child)?;
            }
            self.remove_node(node)?;
        }

        if let Some(pos) = self.graph_list.iter().position(|g| *g == graph) {
            self.graph_list.remove(pos);
        }
        if self.root == Some(graph) {
            self.root = None;
        }
        if let Some(parent) = self.graphs[graph.0].parent.take() {
            self.nodes[parent.0].child = None;
        }
        self.graphs[graph.0].removed = true;
        trace!(graph = graph.0, "removed graph");
        self.reset_all_nodes();
        self.reset_all_edges();
        Ok(())
    }

    /// Every attached node, graph by graph in creation order.
    pub fn all_nodes(&self) -> Rc<[NodeId]> {
        self.all_nodes
            .get_or_init(|| {
                self.graph_list
                    .iter()
                    .flat_map(|g| self.graphs[g.0].nodes.iter().copied())
                    .collect()
            })
            .clone()
    }

    /// Every placed edge: graph-local lists first, then inter-graph edges.
    pub fn all_edges(&self) -> Rc<[EdgeId]> {
        self.all_edges
            .get_or_init(|| {
                self.graph_list
                    .iter()
                    .flat_map(|g| self.graphs[g.0].edges.iter().copied())
                    .chain(self.inter_graph_edges.iter().copied())
                    .collect()
            })
            .clone()
    }

    pub fn all_nodes_to_apply_gravitation(&self) -> Rc<[NodeId]> {
        self.all_nodes_to_apply_gravitation
            .clone()
            .unwrap_or_else(|| Rc::from(Vec::new()))
    }

    pub fn set_all_nodes_to_apply_gravitation(&mut self, nodes: Vec<NodeId>) {
        self.all_nodes_to_apply_gravitation = Some(Rc::from(nodes));
    }

    pub fn reset_all_nodes(&mut self) {
        self.all_nodes = OnceCell::new();
    }

    pub fn reset_all_edges(&mut self) {
        self.all_edges = OnceCell::new();
    }

    pub fn reset_all_nodes_to_apply_gravitation(&mut self) {
        self.all_nodes_to_apply_gravitation = None;
    }

    /// Parent compound of `node`, `None` for root-level or detached nodes.
    pub fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        let owner = self.nodes[node.0].owner?;
        if Some(owner) == self.root {
            return None;
        }
        self.graphs[owner.0].parent
    }

    pub fn other_end(&self, edge: EdgeId, node: NodeId) -> Option<NodeId> {
        self.edges[edge.0].other_end(node)
    }

    /// The other end of `edge`, or its ancestor that is a member of `graph`.
    pub fn other_end_in_graph(&self, edge: EdgeId, node: NodeId, graph: GraphId) -> Option<NodeId> {
        let mut other = self.other_end(edge, node)?;
        loop {
            let owner = self.nodes[other.0].owner?;
            if owner == graph {
                return Some(other);
            }
            if Some(owner) == self.root {
                return None;
            }
            other = self.graphs[owner.0].parent?;
        }
    }

    /// `node` followed by all of its descendants.
    pub fn with_children(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = vec![node];
        let mut i = 0;
        while i < out.len() {
            if let Some(child) = self.nodes[out[i].0].child {
                out.extend(self.graphs[child.0].nodes.iter().copied());
            }
            i += 1;
        }
        out
    }

    /// Distinct adjacent nodes, self excluded.
    pub fn neighbors(&self, node: NodeId) -> IndexSet<NodeId> {
        self.nodes[node.0]
            .edges
            .iter()
            .filter_map(|e| self.other_end(*e, node))
            .filter(|n| *n != node)
            .collect()
    }

    /// Edges joining `a` and `b` in either direction.
    pub fn edges_between(&self, a: NodeId, b: NodeId) -> Vec<EdgeId> {
        self.nodes[a.0]
            .edges
            .iter()
            .copied()
            .filter(|e| {
                let edge = &self.edges[e.0];
                (edge.source == a && edge.target == b) || (edge.source == b && edge.target == a)
            })
            .collect()
    }

    /// Edges directed from `a` to `b`.
    pub fn edges_to(&self, a: NodeId, b: NodeId) -> Vec<EdgeId> {
        self.nodes[a.0]
            .edges
            .iter()
            .copied()
            .filter(|e| self.edges[e.0].source == a && self.edges[e.0].target == b)
            .collect()
    }

    /// Incident edges, self-loops included.
    pub fn degree(&self, node: NodeId) -> usize {
        self.nodes[node.0].edges.len()
    }

    /// Incident edges of `node` and all of its descendants.
    pub fn degree_with_children(&self, node: NodeId) -> usize {
        self.with_children(node)
            .into_iter()
            .map(|n| self.degree(n))
            .sum()
    }

    /// Leaf descendants of `node`, or 1 for a leaf or an empty compound.
    pub fn no_of_children(&self, node: NodeId) -> usize {
        let Some(child) = self.nodes[node.0].child else {
            return 1;
        };
        let count: usize = self.graphs[child.0]
            .nodes
            .iter()
            .map(|n| self.no_of_children(*n))
            .sum();
        count.max(1)
    }

    pub fn is_compound(&self, node: NodeId) -> bool {
        self.nodes[node.0]
            .child
            .is_some_and(|g| !self.graphs[g.0].nodes.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::GraphManager;
    use crate::error::Error;
    use crate::geometry::Rect;
    use crate::graph::EdgePlacement;

    fn rect() -> Rect {
        Rect::new(0.0, 0.0, 10.0, 10.0)
    }

    #[test]
    fn adding_an_attached_node_twice_fails() {
        let mut gm = GraphManager::default();
        let root = gm.add_root();
        let n = gm.create_node(root, rect()).unwrap();
        assert!(matches!(
            gm.add_node(root, n),
            Err(Error::NodeAlreadyAttached { .. })
        ));
    }

    #[test]
    fn second_child_graph_is_rejected() {
        let mut gm = GraphManager::default();
        let root = gm.add_root();
        let c = gm.create_node(root, rect()).unwrap();
        gm.add_graph(c).unwrap();
        assert!(matches!(
            gm.add_graph(c),
            Err(Error::NodeHasChildGraph { .. })
        ));
    }

    #[test]
    fn edge_to_detached_node_is_rejected() {
        let mut gm = GraphManager::default();
        let root = gm.add_root();
        let a = gm.create_node(root, rect()).unwrap();
        let b = gm.new_node(rect());
        assert!(matches!(
            gm.add_edge(a, b),
            Err(Error::EdgeEndpointDetached { .. })
        ));
        assert!(gm.node(a).edges().is_empty());
    }

    #[test]
    fn removed_edge_can_be_reattached() {
        let mut gm = GraphManager::default();
        let root = gm.add_root();
        let a = gm.create_node(root, rect()).unwrap();
        let b = gm.create_node(root, rect()).unwrap();
        let e = gm.add_edge(a, b).unwrap();

        assert!(matches!(gm.attach_edge(e), Err(Error::EdgeAlreadyPlaced { .. })));
        gm.remove_edge(e).unwrap();
        assert_eq!(gm.edge(e).placement(), EdgePlacement::Detached);
        assert!(matches!(gm.remove_edge(e), Err(Error::EdgeNotPlaced { .. })));

        gm.attach_edge(e).unwrap();
        assert_eq!(gm.edge(e).placement(), EdgePlacement::Graph(root));
        assert_eq!(gm.all_edges().as_ref(), &[e]);
    }

    #[test]
    fn self_loop_is_listed_once_per_node() {
        let mut gm = GraphManager::default();
        let root = gm.add_root();
        let a = gm.create_node(root, rect()).unwrap();
        let e = gm.add_edge(a, a).unwrap();
        assert_eq!(gm.node(a).edges(), &[e]);
        assert_eq!(gm.degree(a), 1);
        assert!(gm.neighbors(a).is_empty());
        gm.remove_node(a).unwrap();
        assert_eq!(gm.edge(e).placement(), EdgePlacement::Detached);
    }

    #[test]
    fn all_nodes_cache_follows_mutations() {
        let mut gm = GraphManager::default();
        let root = gm.add_root();
        let a = gm.create_node(root, rect()).unwrap();
        assert_eq!(gm.all_nodes().len(), 1);
        let g = gm.add_graph(a).unwrap();
        let b = gm.create_node(g, rect()).unwrap();
        assert_eq!(gm.all_nodes().as_ref(), &[a, b]);
        gm.remove_graph(g).unwrap();
        assert_eq!(gm.all_nodes().as_ref(), &[a]);
        assert_eq!(gm.node(a).child(), None);
        assert_eq!(gm.node(b).owner(), None);
    }

    #[test]
    fn no_of_children_counts_leaves() {
        let mut gm = GraphManager::default();
        let root = gm.add_root();
        let c = gm.create_node(root, rect()).unwrap();
        let g = gm.add_graph(c).unwrap();
        let inner = gm.create_node(g, rect()).unwrap();
        let g2 = gm.add_graph(inner).unwrap();
        gm.create_node(g2, rect()).unwrap();
        gm.create_node(g2, rect()).unwrap();
        gm.create_node(g, rect()).unwrap();
        assert_eq!(gm.no_of_children(c), 3);
        assert_eq!(gm.no_of_children(inner), 2);

        let empty = gm.create_node(root, rect()).unwrap();
        gm.add_graph(empty).unwrap();
        assert_eq!(gm.no_of_children(empty), 1);
    }
}
