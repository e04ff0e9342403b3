use tracing::debug;

use super::grid::RepulsionGrid;
use crate::error::Result;
use crate::graph::{EdgeId, GraphId, GraphManager, NodeId};
use crate::rng::SeededRng;

/// A leaf removed before the simulation, with what is needed to put it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrunedNode {
    pub node: NodeId,
    pub edge: EdgeId,
    pub owner: GraphId,
}

/// Strips degree-1 leaves whose only edge is intra-graph, round after round, until none are
/// left. Returns the removed nodes grouped by round.
pub(crate) fn reduce_trees(gm: &mut GraphManager) -> Result<Vec<Vec<PrunedNode>>> {
    let mut rounds = Vec::new();
    loop {
        let candidates: Vec<PrunedNode> = gm
            .all_nodes()
            .iter()
            .copied()
            .filter_map(|node| prunable(gm, node))
            .collect();
        if candidates.is_empty() {
            break;
        }

        let mut round = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            // A neighbour pruned earlier in this round may have left this node isolated.
            if gm.node(candidate.node).edges().len() == 1 {
                gm.remove_node(candidate.node)?;
                round.push(candidate);
            }
        }
        rounds.push(round);
    }
    debug!(rounds = rounds.len(), "reduced trees");
    Ok(rounds)
}

fn prunable(gm: &GraphManager, node: NodeId) -> Option<PrunedNode> {
    let n = gm.node(node);
    if n.child().is_some() || n.edges().len() != 1 {
        return None;
    }
    let edge = n.edges()[0];
    let e = gm.edge(edge);
    if e.is_inter_graph() || e.is_self_loop() {
        return None;
    }
    Some(PrunedNode {
        node,
        edge,
        owner: n.owner()?,
    })
}

/// Re-attaches the most recently pruned round next to the nodes they hung from.
pub(crate) fn grow_tree(
    gm: &mut GraphManager,
    pruned: &mut Vec<Vec<PrunedNode>>,
    grid: Option<&RepulsionGrid>,
    rng: &mut SeededRng,
    ideal_edge_length: f64,
) -> Result<()> {
    let Some(round) = pruned.pop() else {
        return Ok(());
    };
    for p in &round {
        find_place_for_pruned_node(gm, grid, rng, ideal_edge_length, p);
        gm.add_node(p.owner, p.node)?;
        gm.attach_edge(p.edge)?;
    }
    debug!(regrown = round.len(), remaining = pruned.len(), "grew pruned round");
    Ok(())
}

/// Places a pruned node beside its reconnection node in the least crowded of the four
/// cardinal directions, ties broken at random.
pub(crate) fn find_place_for_pruned_node(
    gm: &mut GraphManager,
    grid: Option<&RepulsionGrid>,
    rng: &mut SeededRng,
    ideal_edge_length: f64,
    pruned: &PrunedNode,
) {
    let Some(anchor) = gm.edge(pruned.edge).other_end(pruned.node) else {
        return;
    };
    let span = gm.node(anchor).grid_span();
    // Crowding of the neighbour cell plus the border cell, minus the anchor itself. A
    // neighbour past the grid edge counts as empty.
    let crowding = |(nx, ny): (i32, i32), (bx, by): (i32, i32)| -> i64 {
        match grid {
            Some(g) if g.contains(nx, ny) => {
                (g.cell(nx, ny).len() + g.cell(bx, by).len()) as i64 - 1
            }
            _ => 0,
        }
    };

    // up, right, down, left
    let mut regions = [0_i64; 4];
    for x in span.start_x..=span.finish_x {
        regions[0] += crowding((x, span.start_y - 1), (x, span.start_y));
        regions[2] += crowding((x, span.finish_y + 1), (x, span.finish_y));
    }
    for y in span.start_y..=span.finish_y {
        regions[1] += crowding((span.finish_x + 1, y), (span.finish_x, y));
        regions[3] += crowding((span.start_x - 1, y), (span.start_x, y));
    }

    let min = regions.iter().copied().min().unwrap_or(0);
    let candidates: Vec<usize> = (0..4).filter(|&i| regions[i] == min).collect();
    let direction = candidates[rng.pick(candidates.len())];

    let a = gm.node(anchor).rect;
    let node = gm.node_mut(pruned.node);
    let (w, h) = (node.rect.width, node.rect.height);
    match direction {
        0 => node.set_center(
            a.center_x(),
            a.center_y() - a.half_height() - ideal_edge_length - h / 2.0,
        ),
        1 => node.set_center(
            a.right() + ideal_edge_length + w / 2.0,
            a.center_y(),
        ),
        2 => node.set_center(
            a.center_x(),
            a.bottom() + ideal_edge_length + h / 2.0,
        ),
        _ => node.set_center(
            a.left() - ideal_edge_length - w / 2.0,
            a.center_y(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{PrunedNode, find_place_for_pruned_node, grow_tree, reduce_trees};
    use crate::fd::RepulsionGrid;
    use crate::geometry::Rect;
    use crate::graph::GraphManager;
    use crate::rng::SeededRng;

    #[test]
    fn pendant_chain_is_pruned_round_by_round() {
        // Triangle core with a two-node tail hanging off `a`.
        let mut gm = GraphManager::default();
        let root = gm.add_root();
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        let a = gm.create_node(root, r).unwrap();
        let b = gm.create_node(root, r).unwrap();
        let c = gm.create_node(root, r).unwrap();
        let t1 = gm.create_node(root, r).unwrap();
        let t2 = gm.create_node(root, r).unwrap();
        gm.add_edge(a, b).unwrap();
        gm.add_edge(b, c).unwrap();
        gm.add_edge(c, a).unwrap();
        gm.add_edge(a, t1).unwrap();
        gm.add_edge(t1, t2).unwrap();

        let mut rounds = reduce_trees(&mut gm).unwrap();
        assert_eq!(rounds.len(), 2);
        assert_eq!(rounds[0][0].node, t2);
        assert_eq!(rounds[1][0].node, t1);
        assert_eq!(gm.all_nodes().len(), 3);

        let mut rng = SeededRng::new(7);
        gm.node_mut(a).rect = Rect::new(100.0, 100.0, 10.0, 10.0);
        grow_tree(&mut gm, &mut rounds, None, &mut rng, 50.0).unwrap();
        assert_eq!(gm.all_nodes().len(), 4);
        assert_eq!(gm.node(t1).owner(), Some(root));
        let d = {
            let p = gm.node(t1).center();
            let q = gm.node(a).center();
            (p.x - q.x).hypot(p.y - q.y)
        };
        assert!((d - 60.0).abs() < 1e-9, "regrown node at distance {d}");

        grow_tree(&mut gm, &mut rounds, None, &mut rng, 50.0).unwrap();
        assert_eq!(gm.all_nodes().len(), 5);
        assert!(rounds.is_empty());
        assert_eq!(gm.degree(t1), 2);
    }

    #[test]
    fn isolated_edge_keeps_one_endpoint() {
        let mut gm = GraphManager::default();
        let root = gm.add_root();
        let a = gm.create_node(root, Rect::default()).unwrap();
        let b = gm.create_node(root, Rect::default()).unwrap();
        gm.add_edge(a, b).unwrap();
        let rounds = reduce_trees(&mut gm).unwrap();
        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].len(), 1);
        assert_eq!(gm.all_nodes().as_ref(), &[b]);
    }

    #[test]
    fn directions_past_the_grid_edge_count_as_free() {
        // Range-100 cells: `anchor` sits in the top row, in cell (1, 0), which it shares with
        // `neighbour`. The cell to its left is empty, the ones to the right and below are not.
        let mut gm = GraphManager::default();
        let root = gm.add_root();
        let anchor = gm.create_node(root, Rect::new(110.0, 10.0, 20.0, 20.0)).unwrap();
        gm.create_node(root, Rect::new(140.0, 10.0, 10.0, 10.0)).unwrap();
        gm.create_node(root, Rect::new(10.0, 150.0, 10.0, 10.0)).unwrap();
        gm.create_node(root, Rect::new(250.0, 10.0, 10.0, 10.0)).unwrap();
        gm.create_node(root, Rect::new(110.0, 150.0, 10.0, 10.0)).unwrap();
        let leaf = gm.create_node(root, Rect::new(250.0, 150.0, 10.0, 10.0)).unwrap();
        let edge = gm.add_edge(anchor, leaf).unwrap();
        gm.update_bounds();

        let grid = RepulsionGrid::build(&mut gm, 100.0).expect("grid");
        assert_eq!(grid.size(), (3, 2));
        let span = gm.node(anchor).grid_span();
        assert_eq!((span.start_x, span.finish_x, span.start_y, span.finish_y), (1, 1, 0, 0));
        assert!(!grid.contains(1, -1));

        let pruned = PrunedNode {
            node: leaf,
            edge,
            owner: root,
        };
        for seed in 1..=16 {
            let mut rng = SeededRng::new(seed);
            find_place_for_pruned_node(&mut gm, Some(&grid), &mut rng, 50.0, &pruned);
            let p = gm.node(leaf).center();
            assert_eq!(p.x, 120.0, "seed {seed}");
            assert_eq!(p.y, 20.0 - 10.0 - 50.0 - 5.0, "seed {seed}");
        }
    }
}
