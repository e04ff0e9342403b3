use rustc_hash::FxHashSet;

use super::LayoutBase;
use crate::error::{Error, Result};
use crate::geometry::{Point, Rect};
use crate::graph::{EdgeId, NodeId};

impl LayoutBase {
    /// Gives self-loops two bend points and each member of a multi-edge one, then replaces
    /// those edges by chains of 1×1 dummy nodes so the simulation can place the bends.
    pub fn create_bendpoints(&mut self) -> Result<()> {
        let edges = self.gm.all_edges();
        let mut visited: FxHashSet<EdgeId> = FxHashSet::default();

        for &edge in edges.iter() {
            if visited.len() == edges.len() {
                break;
            }
            if visited.contains(&edge) {
                continue;
            }
            let (source, target) = {
                let e = self.gm.edge(edge);
                (e.source(), e.target())
            };
            if source == target {
                self.gm.edge_mut(edge).bendpoints = vec![Point::default(); 2];
                self.create_dummy_nodes_for_bendpoints(edge)?;
                visited.insert(edge);
                continue;
            }

            let mut group = self.gm.edges_to(source, target);
            group.extend(self.gm.edges_to(target, source));
            if group.len() > 1 {
                for &multi in &group {
                    self.gm.edge_mut(multi).bendpoints.push(Point::default());
                    self.create_dummy_nodes_for_bendpoints(multi)?;
                }
            }
            visited.extend(group);
        }
        Ok(())
    }

    /// Threads a chain of dummies from the edge's source to its target through the lowest
    /// common ancestor graph, one dummy per bend point, and removes the original edge.
    pub fn create_dummy_nodes_for_bendpoints(&mut self, edge: EdgeId) -> Result<Vec<NodeId>> {
        let (source, target, bends) = {
            let e = self.gm.edge(edge);
            (e.source(), e.target(), e.bendpoints.len())
        };
        let graph = self
            .gm
            .calc_lowest_common_ancestor(source, target)
            .ok_or(Error::EdgeEndpointDetached { edge })?;

        let mut dummies = Vec::with_capacity(bends);
        let mut prev = source;
        for _ in 0..bends {
            let dummy = self.gm.create_node(graph, Rect::new(0.0, 0.0, 1.0, 1.0))?;
            self.gm.add_edge(prev, dummy)?;
            dummies.push(dummy);
            prev = dummy;
        }
        self.gm.add_edge(prev, target)?;
        self.gm.remove_edge(edge)?;
        self.edge_to_dummy_nodes.insert(edge, dummies.clone());
        Ok(dummies)
    }

    /// Copies each dummy's center into its edge's bend points, drops the dummies and restores
    /// the original edges.
    pub fn create_bendpoints_from_dummy_nodes(&mut self) -> Result<()> {
        let chains: Vec<(EdgeId, Vec<NodeId>)> = self.edge_to_dummy_nodes.drain(..).collect();
        for (edge, path) in chains {
            for (i, dummy) in path.iter().enumerate() {
                let center = self.gm.node(*dummy).center();
                if let Some(bp) = self.gm.edge_mut(edge).bendpoints.get_mut(i) {
                    *bp = center;
                }
                self.gm.remove_node(*dummy)?;
            }
            self.gm.attach_edge(edge)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::LayoutConfig;
    use crate::geometry::Rect;
    use crate::graph::EdgePlacement;
    use crate::layout::LayoutBase;

    #[test]
    fn multi_edges_get_one_dummy_each() {
        let mut base = LayoutBase::new(LayoutConfig::default());
        let root = base.gm.add_root();
        let a = base.gm.create_node(root, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let b = base.gm.create_node(root, Rect::new(50.0, 0.0, 10.0, 10.0)).unwrap();
        let e1 = base.gm.add_edge(a, b).unwrap();
        let e2 = base.gm.add_edge(b, a).unwrap();
        let lone = base.gm.create_node(root, Rect::default()).unwrap();
        let e3 = base.gm.add_edge(a, lone).unwrap();

        base.create_bendpoints().unwrap();
        assert_eq!(base.gm.edge(e1).placement(), EdgePlacement::Detached);
        assert_eq!(base.gm.edge(e2).placement(), EdgePlacement::Detached);
        assert!(base.gm.edge(e3).bendpoints.is_empty());
        // Two real nodes, one lone node, two dummies.
        assert_eq!(base.gm.all_nodes().len(), 5);

        let dummy = base.edge_to_dummy_nodes[&e1][0];
        base.gm.node_mut(dummy).set_center(25.0, 40.0);
        base.create_bendpoints_from_dummy_nodes().unwrap();

        assert_eq!(base.gm.all_nodes().len(), 3);
        assert_eq!(base.gm.edge(e1).placement(), EdgePlacement::Graph(root));
        assert_eq!(base.gm.edge(e1).bendpoints[0].x, 25.0);
        assert_eq!(base.gm.edge(e1).bendpoints[0].y, 40.0);
        assert_eq!(base.gm.all_edges().len(), 3);
    }

    #[test]
    fn self_loop_gets_two_dummies() {
        let mut base = LayoutBase::new(LayoutConfig::default());
        let root = base.gm.add_root();
        let a = base.gm.create_node(root, Rect::default()).unwrap();
        let e = base.gm.add_edge(a, a).unwrap();
        base.create_bendpoints().unwrap();
        assert_eq!(base.edge_to_dummy_nodes[&e].len(), 2);
        assert_eq!(base.gm.all_edges().len(), 3);
        base.create_bendpoints_from_dummy_nodes().unwrap();
        assert_eq!(base.gm.node(a).edges(), &[e]);
    }
}
