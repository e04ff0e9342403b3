use super::{EdgeId, GraphId, GraphManager, LabelHAlign, LabelVAlign, NodeId};
use crate::geometry::{Point, clip_points, sign};

impl GraphManager {
    /// Recomputes the bounds of every graph from the leaves up; compound rectangles are
    /// resized to wrap their children.
    pub fn update_bounds(&mut self) {
        if let Some(root) = self.root {
            self.update_graph_bounds(root, true);
        }
    }

    pub fn update_graph_bounds(&mut self, graph: GraphId, recursive: bool) {
        let mut left = f64::INFINITY;
        let mut top = f64::INFINITY;
        let mut right = f64::NEG_INFINITY;
        let mut bottom = f64::NEG_INFINITY;

        for i in 0..self.graphs[graph.0].nodes.len() {
            let node = self.graphs[graph.0].nodes[i];
            if recursive && self.nodes[node.0].child.is_some() {
                self.update_node_bounds(node);
            }
            let r = self.nodes[node.0].rect;
            left = left.min(r.left());
            top = top.min(r.top());
            right = right.max(r.right());
            bottom = bottom.max(r.bottom());
        }

        if !left.is_finite() {
            // Empty graph: fall back to the parent's rectangle.
            if let Some(parent) = self.graphs[graph.0].parent {
                let r = self.nodes[parent.0].rect;
                let g = &mut self.graphs[graph.0];
                g.left = r.left();
                g.top = r.top();
                g.right = r.right();
                g.bottom = r.bottom();
            }
            return;
        }

        let margin = self.graph_margin(graph);
        let g = &mut self.graphs[graph.0];
        g.left = left - margin;
        g.top = top - margin;
        g.right = right + margin;
        g.bottom = bottom + margin;
    }

    /// Resizes a compound to its child graph's bounds, widened by its label when labels are
    /// part of node dimensions.
    pub fn update_node_bounds(&mut self, node: NodeId) {
        let Some(child) = self.nodes[node.0].child else {
            return;
        };
        if self.graphs[child.0].nodes.is_empty() {
            return;
        }
        self.update_graph_bounds(child, true);

        let g = &self.graphs[child.0];
        let (left, top, width, height) = (g.left, g.top, g.right - g.left, g.bottom - g.top);
        let include_labels = self.settings.node_dimensions_include_labels;
        let n = &mut self.nodes[node.0];
        n.rect.x = left;
        n.rect.y = top;
        n.rect.width = width;
        n.rect.height = height;

        let Some(label) = n.label.filter(|_| include_labels) else {
            return;
        };
        if label.width > 0.0 {
            match label.halign {
                LabelHAlign::Left => {
                    n.rect.x -= label.width;
                    n.rect.width = width + label.width;
                }
                LabelHAlign::Center if label.width > width => {
                    n.rect.x -= (label.width - width) / 2.0;
                    n.rect.width = label.width;
                }
                LabelHAlign::Center => {}
                LabelHAlign::Right => n.rect.width = width + label.width,
            }
        }
        if label.height > 0.0 {
            match label.valign {
                LabelVAlign::Top => {
                    n.rect.y -= label.height;
                    n.rect.height = height + label.height;
                }
                LabelVAlign::Center if label.height > height => {
                    n.rect.y -= (label.height - height) / 2.0;
                    n.rect.height = label.height;
                }
                LabelVAlign::Center => {}
                LabelVAlign::Bottom => n.rect.height = height + label.height,
            }
        }
    }

    /// Margin around a graph's members: the parent's left padding when set, the graph's own
    /// margin otherwise.
    pub fn graph_margin(&self, graph: GraphId) -> f64 {
        self.graphs[graph.0]
            .parent
            .and_then(|p| self.nodes[p.0].padding)
            .map_or(self.graphs[graph.0].margin, |p| p.left)
    }

    /// Left-top corner of the members' bounding box minus the margin; `None` for an empty graph.
    pub fn update_left_top(&mut self, graph: GraphId) -> Option<Point> {
        let nodes = &self.graphs[graph.0].nodes;
        if nodes.is_empty() {
            return None;
        }
        let mut left = f64::INFINITY;
        let mut top = f64::INFINITY;
        for n in nodes {
            let r = self.nodes[n.0].rect;
            left = left.min(r.left());
            top = top.min(r.top());
        }
        let margin = self.graph_margin(graph);
        let g = &mut self.graphs[graph.0];
        g.left = left - margin;
        g.top = top - margin;
        Some(Point::new(g.left, g.top))
    }

    /// Estimated size of a graph: the sum of its members' sizes over the square root of their
    /// count. Compound members are resized to a square of their own estimate.
    pub fn calc_estimated_size(&mut self, graph: GraphId) -> f64 {
        let members = self.graphs[graph.0].nodes.clone();
        let total: f64 = members
            .iter()
            .map(|n| self.calc_node_estimated_size(*n))
            .sum();
        let size = if total == 0.0 {
            self.settings.empty_compound_node_size
        } else {
            total / (members.len() as f64).sqrt()
        };
        self.graphs[graph.0].estimated_size = Some(size);
        size
    }

    pub fn calc_node_estimated_size(&mut self, node: NodeId) -> f64 {
        let size = match self.nodes[node.0].child {
            None => {
                let r = self.nodes[node.0].rect;
                (r.width + r.height) / 2.0
            }
            Some(child) => {
                let size = self.calc_estimated_size(child);
                let r = &mut self.nodes[node.0].rect;
                r.width = size;
                r.height = size;
                size
            }
        };
        self.nodes[node.0].estimated_size = Some(size);
        size
    }

    /// Memoized estimated size, or the leaf estimate when none was computed.
    pub fn node_estimated_size(&self, node: NodeId) -> f64 {
        let n = &self.nodes[node.0];
        n.estimated_size
            .unwrap_or((n.rect.width + n.rect.height) / 2.0)
    }

    pub fn graph_estimated_size(&self, graph: GraphId) -> f64 {
        self.graphs[graph.0]
            .estimated_size
            .unwrap_or(self.settings.empty_compound_node_size)
    }

    /// Border-to-border edge length; flags the edge when its endpoints overlap.
    pub fn update_edge_length(&mut self, edge: EdgeId) {
        let (source, target) = (self.edges[edge.0].source, self.edges[edge.0].target);
        let source_rect = self.nodes[source.0].rect;
        let target_rect = self.nodes[target.0].rect;
        let e = &mut self.edges[edge.0];
        match clip_points(&target_rect, &source_rect) {
            None => e.is_overlapping_source_and_target = true,
            Some((on_target, on_source)) => {
                e.is_overlapping_source_and_target = false;
                e.length_x = clamp_component(on_target.x - on_source.x);
                e.length_y = clamp_component(on_target.y - on_source.y);
                e.length = e.length_x.hypot(e.length_y);
            }
        }
    }

    /// Center-to-center edge length.
    pub fn update_edge_length_simple(&mut self, edge: EdgeId) {
        let (source, target) = (self.edges[edge.0].source, self.edges[edge.0].target);
        let s = self.nodes[source.0].rect.center();
        let t = self.nodes[target.0].rect.center();
        let e = &mut self.edges[edge.0];
        e.length_x = clamp_component(t.x - s.x);
        e.length_y = clamp_component(t.y - s.y);
        e.length = e.length_x.hypot(e.length_y);
    }
}

fn clamp_component(v: f64) -> f64 {
    if v.abs() < 1.0 { sign(v) } else { v }
}
