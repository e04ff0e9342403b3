use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use super::LayoutBase;
use crate::geometry::Point;
use crate::graph::{GraphId, GraphManager, NodeId};

impl LayoutBase {
    /// Scatters every leaf around the world center. Compound children are placed before their
    /// parent is resized to wrap them.
    pub fn position_nodes_randomly(&mut self) {
        if let Some(root) = self.gm.root() {
            self.position_graph_randomly(root);
        }
    }

    fn position_graph_randomly(&mut self, graph: GraphId) {
        let members = self.gm.graph(graph).nodes().to_vec();
        for node in members {
            match self.gm.node(node).child() {
                Some(child) if !self.gm.graph(child).nodes().is_empty() => {
                    self.position_graph_randomly(child);
                    self.gm.update_node_bounds(node);
                }
                _ => self.scatter(node),
            }
        }
    }

    fn scatter(&mut self, node: NodeId) {
        let bound = self.config.initial_world_boundary;
        let center = self.config.world_center;
        let cx = center.x + self.rng.symmetric(bound);
        let cy = center.y + self.rng.symmetric(bound);
        self.gm.node_mut(node).set_center(cx, cy);
    }

    /// Connected components of the root graph when it is a flat forest, empty otherwise.
    ///
    /// The graph qualifies when no root member is a compound and a breadth-first walk never
    /// reaches an already visited node other than the one it came from.
    pub fn flat_forest(&self) -> Vec<Vec<NodeId>> {
        let Some(root) = self.gm.root() else {
            return Vec::new();
        };
        let members = self.gm.graph(root).nodes();
        if members.iter().any(|n| self.gm.node(*n).child().is_some()) {
            return Vec::new();
        }

        let mut forest = Vec::new();
        let mut assigned: FxHashSet<NodeId> = FxHashSet::default();
        for &start in members {
            if assigned.contains(&start) {
                continue;
            }
            let mut tree = Vec::new();
            let mut visited: FxHashSet<NodeId> = FxHashSet::default();
            let mut parents: FxHashMap<NodeId, NodeId> = FxHashMap::default();
            let mut queue = VecDeque::from([start]);
            visited.insert(start);

            while let Some(current) = queue.pop_front() {
                tree.push(current);
                for &edge in self.gm.node(current).edges() {
                    let Some(neighbor) = self.gm.other_end(edge, current) else {
                        continue;
                    };
                    if parents.get(&current) == Some(&neighbor) {
                        continue;
                    }
                    if !visited.insert(neighbor) {
                        return Vec::new();
                    }
                    parents.insert(neighbor, current);
                    queue.push_back(neighbor);
                }
            }
            assigned.extend(tree.iter().copied());
            forest.push(tree);
        }
        forest
    }

    /// Lays each tree out radially around its center and arranges the trees in a roughly
    /// square grid, then centers the drawing on the world center.
    pub fn position_nodes_radially(&mut self, forest: &[Vec<NodeId>]) {
        let separation = self.config.component_separation;
        let columns = (forest.len() as f64).sqrt().ceil().max(1.0) as usize;
        let mut height = 0.0_f64;
        let mut current_x = 0.0_f64;
        let mut current_y = 0.0_f64;
        let mut bottom_right = Point::default();

        for (i, tree) in forest.iter().enumerate() {
            if i % columns == 0 {
                current_x = 0.0;
                current_y = height;
                if i != 0 {
                    current_y += separation;
                }
                height = 0.0;
            }
            let Some(center) = find_center_of_tree(&self.gm, tree) else {
                continue;
            };
            bottom_right = self.radial_layout(tree, center, Point::new(current_x, current_y));
            if bottom_right.y > height {
                height = bottom_right.y.floor();
            }
            current_x = (bottom_right.x + separation).floor();
        }

        debug!(trees = forest.len(), "placed flat forest radially");
        let center = self.config.world_center;
        self.transform(Point::new(
            center.x - bottom_right.x / 2.0,
            center.y - bottom_right.y / 2.0,
        ));
    }

    /// Places one tree with its bounding box anchored at `start`; returns the box's bottom-right.
    fn radial_layout(&mut self, tree: &[NodeId], center: NodeId, start: Point) -> Point {
        let max_diagonal = tree
            .iter()
            .map(|n| self.gm.node(*n).rect.diagonal())
            .fold(0.0, f64::max);
        let separation = max_diagonal.max(self.config.radial_separation);
        self.branch_radial_layout(center, None, 0.0, 360.0, 0.0, separation);

        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for n in tree {
            let r = self.gm.node(*n).rect;
            min.x = min.x.min(r.left());
            min.y = min.y.min(r.top());
            max.x = max.x.max(r.right());
            max.y = max.y.max(r.bottom());
        }
        let (dx, dy) = (start.x - min.x, start.y - min.y);
        for n in tree {
            self.gm.node_mut(*n).move_by(dx, dy);
        }
        Point::new(max.x + dx, max.y + dy)
    }

    /// Puts `node` in the middle of its angular interval at `distance` from the origin and
    /// splits the interval evenly among its children.
    fn branch_radial_layout(
        &mut self,
        node: NodeId,
        parent: Option<NodeId>,
        start_angle: f64,
        end_angle: f64,
        distance: f64,
        separation: f64,
    ) {
        let angle = (start_angle + end_angle) / 2.0;
        let theta = angle.to_radians();
        self.gm
            .node_mut(node)
            .set_center(distance * theta.cos(), distance * theta.sin());

        let edges = self.gm.node(node).edges().to_vec();
        let start_index = match parent {
            Some(p) => edges
                .iter()
                .position(|e| self.gm.other_end(*e, node) == Some(p))
                .map_or(0, |i| (i + 1) % edges.len()),
            None => 0,
        };
        let children: Vec<NodeId> = (0..edges.len())
            .map(|k| edges[(start_index + k) % edges.len()])
            .filter_map(|e| self.gm.other_end(e, node))
            .filter(|n| Some(*n) != parent && *n != node)
            .collect();
        if children.is_empty() {
            return;
        }

        let step = (end_angle - start_angle) / children.len() as f64;
        for (k, child) in children.into_iter().enumerate() {
            let child_start = start_angle + k as f64 * step;
            self.branch_radial_layout(
                child,
                Some(node),
                child_start,
                child_start + step,
                distance + separation,
                separation,
            );
        }
    }
}

/// Center of a tree found by repeatedly peeling leaves until one or two nodes remain.
pub fn find_center_of_tree(gm: &GraphManager, tree: &[NodeId]) -> Option<NodeId> {
    let mut remaining: Vec<NodeId> = tree.to_vec();
    if remaining.len() <= 2 {
        return remaining.first().copied();
    }

    let mut degrees: FxHashMap<NodeId, usize> = tree
        .iter()
        .map(|n| (*n, gm.neighbors(*n).len()))
        .collect();
    let mut leaves: Vec<NodeId> = tree
        .iter()
        .copied()
        .filter(|n| degrees[n] <= 1)
        .collect();

    while remaining.len() > 2 && !leaves.is_empty() {
        let peeled: FxHashSet<NodeId> = leaves.iter().copied().collect();
        remaining.retain(|n| !peeled.contains(n));
        let mut next = Vec::new();
        for leaf in &leaves {
            for neighbor in gm.neighbors(*leaf) {
                if peeled.contains(&neighbor) {
                    continue;
                }
                if let Some(d) = degrees.get_mut(&neighbor) {
                    *d = d.saturating_sub(1);
                    if *d == 1 {
                        next.push(neighbor);
                    }
                }
            }
        }
        leaves = next;
    }
    remaining.first().copied()
}

#[cfg(test)]
mod tests {
    use super::find_center_of_tree;
    use crate::config::LayoutConfig;
    use crate::geometry::Rect;
    use crate::layout::LayoutBase;

    #[test]
    fn center_of_a_path_is_its_middle() {
        let mut base = LayoutBase::new(LayoutConfig::default());
        let gm = &mut base.gm;
        let root = gm.add_root();
        let nodes: Vec<_> = (0..5)
            .map(|_| gm.create_node(root, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap())
            .collect();
        for w in nodes.windows(2) {
            gm.add_edge(w[0], w[1]).unwrap();
        }
        assert_eq!(find_center_of_tree(gm, &nodes), Some(nodes[2]));
    }

    #[test]
    fn flat_forest_rejects_cycles() {
        let mut base = LayoutBase::new(LayoutConfig::default());
        let gm = &mut base.gm;
        let root = gm.add_root();
        let a = gm.create_node(root, Rect::default()).unwrap();
        let b = gm.create_node(root, Rect::default()).unwrap();
        let c = gm.create_node(root, Rect::default()).unwrap();
        let d = gm.create_node(root, Rect::default()).unwrap();
        gm.add_edge(a, b).unwrap();
        gm.add_edge(c, d).unwrap();
        assert_eq!(base.flat_forest(), vec![vec![a, b], vec![c, d]]);

        let gm = &mut base.gm;
        gm.add_edge(b, a).unwrap();
        assert!(base.flat_forest().is_empty());
    }

    #[test]
    fn flat_forest_rejects_self_loops() {
        let mut base = LayoutBase::new(LayoutConfig::default());
        let gm = &mut base.gm;
        let root = gm.add_root();
        let a = gm.create_node(root, Rect::default()).unwrap();
        gm.add_edge(a, a).unwrap();
        assert!(base.flat_forest().is_empty());
    }

    #[test]
    fn scatter_stays_inside_the_initial_world() {
        let mut base = LayoutBase::new(LayoutConfig::default());
        let root = base.gm.add_root();
        let nodes: Vec<_> = (0..20)
            .map(|_| {
                base.gm
                    .create_node(root, Rect::new(0.0, 0.0, 10.0, 10.0))
                    .unwrap()
            })
            .collect();
        base.position_nodes_randomly();
        for n in nodes {
            let c = base.gm.node(n).center();
            assert!((200.0..=2200.0).contains(&c.x), "x out of range: {}", c.x);
            assert!((-100.0..=1900.0).contains(&c.y), "y out of range: {}", c.y);
        }
    }
}
