//! Force accumulation for one simulation tick.
//!
//! Every function here only reads positions and writes force accumulators, except
//! [`move_nodes`], which consumes the accumulators.

use crate::geometry::{clip_points, separation_amount, sign};
use crate::graph::{EdgeId, GraphId, GraphManager, NodeId};

use super::FdState;

/// Hooke's law along the edge; attractive when longer than the ideal length.
pub(crate) fn spring_force(gm: &mut GraphManager, fd: &FdState, uniform_leaves: bool, edge: EdgeId) {
    let (source, target) = {
        let e = gm.edge(edge);
        (e.source(), e.target())
    };
    if uniform_leaves && gm.node(source).child().is_none() && gm.node(target).child().is_none() {
        gm.update_edge_length_simple(edge);
    } else {
        gm.update_edge_length(edge);
        if gm.edge(edge).is_overlapping_source_and_target() {
            return;
        }
    }

    let e = gm.edge(edge);
    let length = e.length();
    if length == 0.0 {
        return;
    }
    let force = fd.spring_constant * (length - e.ideal_length());
    let (lx, ly) = e.length_components();
    let fx = force * (lx / length);
    let fy = force * (ly / length);

    let s = &mut gm.node_mut(source).spring_force;
    s.0 += fx;
    s.1 += fy;
    let t = &mut gm.node_mut(target).spring_force;
    t.0 -= fx;
    t.1 -= fy;
}

/// Repulsion between two nodes of the same graph.
///
/// Overlapping rectangles are pushed apart by the separation amount weighted by
/// `nA·nB/(nA+nB)`; disjoint ones repel with `repulsion·nA·nB/d²`.
pub(crate) fn repulsion_force(
    gm: &mut GraphManager,
    fd: &FdState,
    uniform_leaves: bool,
    a: NodeId,
    b: NodeId,
) {
    let (rect_a, rect_b) = (gm.node(a).rect, gm.node(b).rect);
    let children_a = gm.node(a).no_of_children() as f64;
    let children_b = gm.node(b).no_of_children() as f64;

    let (fx, fy) = if rect_a.intersects(&rect_b) {
        let (ox, oy) = separation_amount(&rect_a, &rect_b, fd.separation_buffer);
        let children_constant = children_a * children_b / (children_a + children_b);
        (children_constant * 2.0 * ox, children_constant * 2.0 * oy)
    } else {
        let both_leaves = gm.node(a).child().is_none() && gm.node(b).child().is_none();
        let (mut dx, mut dy) = if uniform_leaves && both_leaves {
            (
                rect_b.center_x() - rect_a.center_x(),
                rect_b.center_y() - rect_a.center_y(),
            )
        } else {
            match clip_points(&rect_a, &rect_b) {
                Some((pa, pb)) => (pb.x - pa.x, pb.y - pa.y),
                None => return,
            }
        };
        if dx.abs() < fd.min_repulsion_dist {
            dx = sign(dx) * fd.min_repulsion_dist;
        }
        if dy.abs() < fd.min_repulsion_dist {
            dy = sign(dy) * fd.min_repulsion_dist;
        }
        let distance_sq = dx * dx + dy * dy;
        if distance_sq == 0.0 {
            return;
        }
        let distance = distance_sq.sqrt();
        let force = fd.repulsion_constant * children_a * children_b / distance_sq;
        (force * dx / distance, force * dy / distance)
    };

    let ra = &mut gm.node_mut(a).repulsion_force;
    ra.0 -= fx;
    ra.1 -= fy;
    let rb = &mut gm.node_mut(b).repulsion_force;
    rb.0 += fx;
    rb.1 += fy;
}

/// Pull towards the owner graph's center once a node strays beyond the owner's estimated size
/// times the range factor. Compound members use the stronger compound constants.
pub(crate) fn gravitational_force(gm: &mut GraphManager, fd: &FdState, node: NodeId) {
    let Some(owner) = gm.node(node).owner() else {
        return;
    };
    let (ocx, ocy) = gm.graph(owner).center();
    let rect = gm.node(node).rect;
    let dx = rect.center_x() - ocx;
    let dy = rect.center_y() - ocy;
    let abs_dx = dx.abs() + rect.half_width();
    let abs_dy = dy.abs() + rect.half_height();

    let at_root = Some(owner) == gm.root();
    let (range, strength) = if at_root {
        (fd.gravity_range_factor, fd.gravity_constant)
    } else {
        (
            fd.compound_gravity_range_factor,
            fd.gravity_constant * fd.compound_gravity_constant,
        )
    };
    let estimated = gm.graph_estimated_size(owner) * range;
    if abs_dx > estimated || abs_dy > estimated {
        gm.node_mut(node).gravitation_force = (-strength * dx, -strength * dy);
    }
}

/// Moves every node by its net force scaled by the cooling factor and clamped to the maximum
/// displacement, then clears the accumulators. A compound drags all of its leaves along.
pub(crate) fn move_nodes(gm: &mut GraphManager, fd: &mut FdState) {
    let cap = fd.cooling_factor * fd.max_node_displacement;
    for node in gm.all_nodes().iter().copied() {
        let n = gm.node(node);
        let children = n.no_of_children() as f64;
        let mut dx = fd.cooling_factor
            * (n.spring_force.0 + n.repulsion_force.0 + n.gravitation_force.0)
            / children;
        let mut dy = fd.cooling_factor
            * (n.spring_force.1 + n.repulsion_force.1 + n.gravitation_force.1)
            / children;
        if dx.abs() > cap {
            dx = cap * sign(dx);
        }
        if dy.abs() > cap {
            dy = cap * sign(dy);
        }

        match n.child() {
            Some(child) if !gm.graph(child).nodes().is_empty() => {
                propagate_displacement(gm, child, dx, dy);
            }
            _ => gm.node_mut(node).move_by(dx, dy),
        }
        fd.total_displacement += dx.abs() + dy.abs();
        gm.node_mut(node).reset_forces();
    }
}

fn propagate_displacement(gm: &mut GraphManager, graph: GraphId, dx: f64, dy: f64) {
    let members = gm.graph(graph).nodes().to_vec();
    for node in members {
        match gm.node(node).child() {
            Some(child) if !gm.graph(child).nodes().is_empty() => {
                propagate_displacement(gm, child, dx, dy);
            }
            _ => {
                let n = gm.node_mut(node);
                n.move_by(dx, dy);
                n.displacement.0 += dx;
                n.displacement.1 += dy;
            }
        }
    }
}

/// Base ideal length for every edge, lengthened for inter-graph edges by the nesting levels
/// they cross and, when `smart` is set, by the sizes of their endpoints in the common graph.
pub(crate) fn assign_ideal_edge_lengths(gm: &mut GraphManager, fd: &FdState, smart: bool, simple_node_size: f64) {
    for edge in gm.all_edges().iter().copied() {
        let e = gm.edge(edge);
        let mut ideal = fd.ideal_edge_length;
        if e.is_inter_graph() {
            if let (Some(lca), Some(s), Some(t)) = (e.lca(), e.source_in_lca(), e.target_in_lca()) {
                if smart {
                    ideal += gm.node_estimated_size(s) + gm.node_estimated_size(t)
                        - 2.0 * simple_node_size;
                }
                let lca_depth = gm.graph_inclusion_tree_depth(lca) as f64;
                let sd = gm.inclusion_tree_depth(e.source()) as f64;
                let td = gm.inclusion_tree_depth(e.target()) as f64;
                ideal += fd.ideal_edge_length
                    * fd.per_level_ideal_edge_length_factor
                    * (sd + td - 2.0 * lca_depth);
            }
        }
        gm.edge_mut(edge).ideal_length = ideal;
    }
}
