use rustc_hash::FxHashSet;

use crate::graph::{GraphManager, GridSpan, NodeId};

/// Uniform spatial index over the root graph used to limit repulsion to nearby pairs.
///
/// Cells are squares with the side of the repulsion range; a node is registered in every cell
/// its rectangle overlaps.
#[derive(Debug, Clone)]
pub struct RepulsionGrid {
    left: f64,
    top: f64,
    range: f64,
    size_x: i32,
    size_y: i32,
    // cells[x * size_y + y]
    cells: Vec<Vec<NodeId>>,
}

impl RepulsionGrid {
    /// Buckets every attached node. Expects fresh root bounds (`GraphManager::update_bounds`).
    pub fn build(gm: &mut GraphManager, range: f64) -> Option<Self> {
        let root = gm.root()?;
        if !range.is_finite() || range <= 0.0 {
            return None;
        }
        let g = gm.graph(root);
        let (left, top, right, bottom) = (g.left(), g.top(), g.right(), g.bottom());
        if !(left.is_finite() && top.is_finite() && right.is_finite() && bottom.is_finite()) {
            return None;
        }

        let size_x = (((right - left) / range).ceil() as i32).max(1);
        let size_y = (((bottom - top) / range).ceil() as i32).max(1);
        let mut grid = Self {
            left,
            top,
            range,
            size_x,
            size_y,
            cells: vec![Vec::new(); (size_x as usize) * (size_y as usize)],
        };

        for node in gm.all_nodes().iter().copied() {
            let span = grid.span_of(gm, node);
            gm.node_mut(node).grid = span;
            for gx in span.start_x..=span.finish_x {
                for gy in span.start_y..=span.finish_y {
                    let idx = grid.idx(gx, gy);
                    grid.cells[idx].push(node);
                }
            }
        }
        Some(grid)
    }

    pub fn size(&self) -> (i32, i32) {
        (self.size_x, self.size_y)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.size_x && y < self.size_y
    }

    fn idx(&self, x: i32, y: i32) -> usize {
        (x as usize) * (self.size_y as usize) + (y as usize)
    }

    /// Nodes registered in cell `(x, y)`; empty outside the grid.
    pub fn cell(&self, x: i32, y: i32) -> &[NodeId] {
        if !self.contains(x, y) {
            return &[];
        }
        &self.cells[self.idx(x, y)]
    }

    fn span_of(&self, gm: &GraphManager, node: NodeId) -> GridSpan {
        let r = gm.node(node).rect;
        let cell = |v: f64, origin: f64, size: i32| -> i32 {
            (((v - origin) / self.range).floor() as i32).clamp(0, size - 1)
        };
        GridSpan {
            start_x: cell(r.left(), self.left, self.size_x),
            finish_x: cell(r.right(), self.left, self.size_x),
            start_y: cell(r.top(), self.top, self.size_y),
            finish_y: cell(r.bottom(), self.top, self.size_y),
        }
    }

    /// Recomputes the nodes that repel `node`: same-owner nodes in the 3×3 block around its
    /// span, within range, and not yet processed during this pass.
    pub fn refresh_surrounding(
        &self,
        gm: &mut GraphManager,
        node: NodeId,
        processed: &FxHashSet<NodeId>,
    ) {
        let span = gm.node(node).grid;
        let owner = gm.node(node).owner();
        let rect = gm.node(node).rect;

        let mut seen: FxHashSet<NodeId> = FxHashSet::default();
        let mut surrounding = Vec::new();
        for gx in (span.start_x - 1)..=(span.finish_x + 1) {
            for gy in (span.start_y - 1)..=(span.finish_y + 1) {
                for &other in self.cell(gx, gy) {
                    if other == node || processed.contains(&other) || seen.contains(&other) {
                        continue;
                    }
                    let o = gm.node(other);
                    if o.owner() != owner {
                        continue;
                    }
                    let dx = (rect.center_x() - o.rect.center_x()).abs()
                        - (rect.half_width() + o.rect.half_width());
                    let dy = (rect.center_y() - o.rect.center_y()).abs()
                        - (rect.half_height() + o.rect.half_height());
                    if dx <= self.range && dy <= self.range {
                        seen.insert(other);
                        surrounding.push(other);
                    }
                }
            }
        }
        gm.node_mut(node).surrounding = surrounding;
    }
}

#[cfg(test)]
mod tests {
    use rustc_hash::FxHashSet;

    use super::RepulsionGrid;
    use crate::geometry::Rect;
    use crate::graph::GraphManager;

    #[test]
    fn surrounding_excludes_processed_and_distant_nodes() {
        let mut gm = GraphManager::default();
        let root = gm.add_root();
        let a = gm.create_node(root, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let b = gm.create_node(root, Rect::new(20.0, 0.0, 10.0, 10.0)).unwrap();
        let far = gm.create_node(root, Rect::new(200.0, 0.0, 10.0, 10.0)).unwrap();
        gm.update_bounds();

        let grid = RepulsionGrid::build(&mut gm, 10.0).expect("grid");
        let mut processed = FxHashSet::default();
        grid.refresh_surrounding(&mut gm, a, &processed);
        assert_eq!(gm.node(a).surrounding(), &[b]);

        processed.insert(a);
        grid.refresh_surrounding(&mut gm, b, &processed);
        assert!(gm.node(b).surrounding().is_empty());

        grid.refresh_surrounding(&mut gm, far, &processed);
        assert!(gm.node(far).surrounding().is_empty());
    }

    #[test]
    fn nodes_register_in_every_overlapped_cell() {
        let mut gm = GraphManager::default();
        let root = gm.add_root();
        let wide = gm.create_node(root, Rect::new(0.0, 0.0, 95.0, 10.0)).unwrap();
        gm.create_node(root, Rect::new(0.0, 60.0, 10.0, 10.0)).unwrap();
        gm.update_bounds();

        let grid = RepulsionGrid::build(&mut gm, 30.0).expect("grid");
        let span = gm.node(wide).grid_span();
        assert_eq!(span.finish_x - span.start_x, 3);
        for x in span.start_x..=span.finish_x {
            assert!(grid.cell(x, span.start_y).contains(&wide));
        }
    }

    #[test]
    fn surrounding_ignores_other_owners() {
        let mut gm = GraphManager::default();
        let root = gm.add_root();
        let c = gm.create_node(root, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let g = gm.add_graph(c).unwrap();
        gm.create_node(g, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let sibling = gm.create_node(root, Rect::new(40.0, 0.0, 10.0, 10.0)).unwrap();
        gm.update_bounds();

        let grid = RepulsionGrid::build(&mut gm, 100.0).expect("grid");
        grid.refresh_surrounding(&mut gm, c, &FxHashSet::default());
        assert_eq!(gm.node(c).surrounding(), &[sibling]);
    }
}
