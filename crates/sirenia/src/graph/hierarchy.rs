use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use super::{EdgeId, GraphId, GraphManager, NodeId};
use crate::error::{Error, Result};

impl GraphManager {
    /// `(graph, member)` pairs from the node's owner up to the root graph, where `member` is
    /// the node itself or the ancestor compound that sits in `graph`.
    fn ancestor_chain(&self, node: NodeId) -> Option<Vec<(GraphId, NodeId)>> {
        let mut chain = Vec::new();
        let mut current = node;
        loop {
            let owner = self.nodes[current.0].owner?;
            chain.push((owner, current));
            if Some(owner) == self.root {
                return Some(chain);
            }
            current = self.graphs[owner.0].parent?;
        }
    }

    /// Computes the lowest common ancestor graph of every edge, along with the ancestors of
    /// its endpoints that are members of that graph.
    pub fn calc_lowest_common_ancestors(&mut self) -> Result<()> {
        for edge in self.all_edges().iter().copied() {
            let (source, target) = (self.edges[edge.0].source, self.edges[edge.0].target);
            let source_chain = self
                .ancestor_chain(source)
                .ok_or(Error::EdgeEndpointDetached { edge })?;
            let target_chain = self
                .ancestor_chain(target)
                .ok_or(Error::EdgeEndpointDetached { edge })?;

            let found = source_chain.iter().find_map(|(sg, sn)| {
                target_chain
                    .iter()
                    .find(|(tg, _)| tg == sg)
                    .map(|(_, tn)| (*sg, *sn, *tn))
            });
            let e = &mut self.edges[edge.0];
            match found {
                Some((lca, s, t)) => {
                    e.lca = Some(lca);
                    e.source_in_lca = Some(s);
                    e.target_in_lca = Some(t);
                }
                None => {
                    e.lca = None;
                    e.source_in_lca = None;
                    e.target_in_lca = None;
                }
            }
        }
        Ok(())
    }

    /// Innermost graph containing both nodes' ancestor chains.
    pub fn calc_lowest_common_ancestor(&self, a: NodeId, b: NodeId) -> Option<GraphId> {
        let a_chain = self.ancestor_chain(a)?;
        let b_chain = self.ancestor_chain(b)?;
        a_chain
            .iter()
            .map(|(g, _)| *g)
            .find(|g| b_chain.iter().any(|(h, _)| h == g))
    }

    /// Sets the inclusion-tree depth of every attached node; root members get depth 1.
    pub fn calc_inclusion_tree_depths(&mut self) {
        let Some(root) = self.root else {
            return;
        };
        let mut stack: Vec<(GraphId, usize)> = vec![(root, 1)];
        while let Some((graph, depth)) = stack.pop() {
            for i in 0..self.graphs[graph.0].nodes.len() {
                let node = self.graphs[graph.0].nodes[i];
                self.nodes[node.0].inclusion_tree_depth = Some(depth);
                if let Some(child) = self.nodes[node.0].child {
                    stack.push((child, depth + 1));
                }
            }
        }
    }

    /// Memoized depth of `node`, or the depth implied by walking its owners.
    pub fn inclusion_tree_depth(&self, node: NodeId) -> usize {
        if let Some(depth) = self.nodes[node.0].inclusion_tree_depth {
            return depth;
        }
        self.ancestor_chain(node).map_or(0, |chain| chain.len())
    }

    pub fn graph_inclusion_tree_depth(&self, graph: GraphId) -> usize {
        if Some(graph) == self.root {
            return 1;
        }
        match self.graphs[graph.0].parent {
            Some(parent) => self.inclusion_tree_depth(parent),
            None => 1,
        }
    }

    /// True when `a` is a structural ancestor of `b` or the other way round.
    pub fn is_one_ancestor_of_other(&self, a: NodeId, b: NodeId) -> bool {
        self.is_ancestor(a, b) || self.is_ancestor(b, a)
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent_of(node);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent_of(p);
        }
        false
    }

    /// True iff some edge joins a node with one of its ancestors. Self-loops are allowed.
    pub fn includes_invalid_edge(&self) -> bool {
        self.all_edges().iter().any(|e| self.is_invalid_edge(*e))
    }

    fn is_invalid_edge(&self, edge: EdgeId) -> bool {
        let e = &self.edges[edge.0];
        e.source != e.target && self.is_one_ancestor_of_other(e.source, e.target)
    }

    /// Recomputes whether every member of `graph` is reachable from its first member, walking
    /// through descendants and edges that lead back into the graph.
    pub fn update_connected(&mut self, graph: GraphId) -> bool {
        let members = self.graphs[graph.0].nodes.clone();
        let Some(&first) = members.first() else {
            self.graphs[graph.0].is_connected = true;
            return true;
        };

        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        for n in self.with_children(first) {
            if visited.insert(n) {
                queue.push_back(n);
            }
        }
        while let Some(current) = queue.pop_front() {
            for &edge in &self.nodes[current.0].edges {
                let Some(neighbor) = self.other_end_in_graph(edge, current, graph) else {
                    continue;
                };
                if visited.contains(&neighbor) {
                    continue;
                }
                for n in self.with_children(neighbor) {
                    if visited.insert(n) {
                        queue.push_back(n);
                    }
                }
            }
        }

        let connected = members.iter().all(|n| visited.contains(n));
        self.graphs[graph.0].is_connected = connected;
        connected
    }
}

#[cfg(test)]
mod tests {
    use crate::geometry::Rect;
    use crate::graph::GraphManager;

    fn rect() -> Rect {
        Rect::new(0.0, 0.0, 10.0, 10.0)
    }

    #[test]
    fn lca_of_cousins_is_the_shared_graph() {
        let mut gm = GraphManager::default();
        let root = gm.add_root();
        let p = gm.create_node(root, rect()).unwrap();
        let pg = gm.add_graph(p).unwrap();
        let a = gm.create_node(pg, rect()).unwrap();
        let b = gm.create_node(pg, rect()).unwrap();
        let ag = gm.add_graph(a).unwrap();
        let bg = gm.add_graph(b).unwrap();
        let x = gm.create_node(ag, rect()).unwrap();
        let y = gm.create_node(bg, rect()).unwrap();
        let e = gm.add_edge(x, y).unwrap();
        let outer = gm.create_node(root, rect()).unwrap();
        let f = gm.add_edge(x, outer).unwrap();

        gm.calc_lowest_common_ancestors().unwrap();
        let edge = gm.edge(e);
        assert_eq!(edge.lca(), Some(pg));
        assert_eq!(edge.source_in_lca(), Some(a));
        assert_eq!(edge.target_in_lca(), Some(b));

        let edge = gm.edge(f);
        assert_eq!(edge.lca(), Some(root));
        assert_eq!(edge.source_in_lca(), Some(p));
        assert_eq!(edge.target_in_lca(), Some(outer));

        assert_eq!(gm.calc_lowest_common_ancestor(x, y), Some(pg));
        assert_eq!(gm.calc_lowest_common_ancestor(x, x), Some(ag));
    }

    #[test]
    fn inclusion_depths_start_at_one() {
        let mut gm = GraphManager::default();
        let root = gm.add_root();
        let p = gm.create_node(root, rect()).unwrap();
        let pg = gm.add_graph(p).unwrap();
        let a = gm.create_node(pg, rect()).unwrap();
        gm.calc_inclusion_tree_depths();
        assert_eq!(gm.node(p).inclusion_tree_depth(), Some(1));
        assert_eq!(gm.node(a).inclusion_tree_depth(), Some(2));
        assert_eq!(gm.graph_inclusion_tree_depth(root), 1);
        assert_eq!(gm.graph_inclusion_tree_depth(pg), 1);
    }

    #[test]
    fn connectivity_walks_through_compounds() {
        let mut gm = GraphManager::default();
        let root = gm.add_root();
        let c = gm.create_node(root, rect()).unwrap();
        let cg = gm.add_graph(c).unwrap();
        let inner = gm.create_node(cg, rect()).unwrap();
        let other = gm.create_node(root, rect()).unwrap();
        assert!(!gm.update_connected(root));

        gm.add_edge(inner, other).unwrap();
        assert!(gm.update_connected(root));
        assert!(gm.graph(root).is_connected());
    }
}
