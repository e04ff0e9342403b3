use serde::{Deserialize, Serialize};

use super::{EdgeId, GraphId, NodeId};
use crate::geometry::{Point, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Padding {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Padding {
    pub const fn uniform(p: f64) -> Self {
        Self {
            left: p,
            top: p,
            right: p,
            bottom: p,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelHAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelVAlign {
    Top,
    #[default]
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeLabel {
    pub width: f64,
    pub height: f64,
    pub halign: LabelHAlign,
    pub valign: LabelVAlign,
}

/// Inclusive range of repulsion-grid cells a node's rectangle covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridSpan {
    pub start_x: i32,
    pub finish_x: i32,
    pub start_y: i32,
    pub finish_y: i32,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) owner: Option<GraphId>,
    pub(crate) child: Option<GraphId>,
    pub rect: Rect,
    pub(crate) edges: Vec<EdgeId>,

    pub(crate) spring_force: (f64, f64),
    pub(crate) repulsion_force: (f64, f64),
    pub(crate) gravitation_force: (f64, f64),
    pub(crate) displacement: (f64, f64),

    pub(crate) estimated_size: Option<f64>,
    pub(crate) inclusion_tree_depth: Option<usize>,
    pub(crate) no_of_children: usize,

    pub padding: Option<Padding>,
    pub label: Option<NodeLabel>,

    pub(crate) grid: GridSpan,
    pub(crate) surrounding: Vec<NodeId>,

    /// Correlation key of the caller's element; never interpreted by the engine.
    pub external_key: Option<String>,
}

impl Node {
    pub(crate) fn new(rect: Rect) -> Self {
        Self {
            owner: None,
            child: None,
            rect,
            edges: Vec::new(),
            spring_force: (0.0, 0.0),
            repulsion_force: (0.0, 0.0),
            gravitation_force: (0.0, 0.0),
            displacement: (0.0, 0.0),
            estimated_size: None,
            inclusion_tree_depth: None,
            no_of_children: 1,
            padding: None,
            label: None,
            grid: GridSpan::default(),
            surrounding: Vec::new(),
            external_key: None,
        }
    }

    pub fn owner(&self) -> Option<GraphId> {
        self.owner
    }

    pub fn child(&self) -> Option<GraphId> {
        self.child
    }

    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn center(&self) -> Point {
        self.rect.center()
    }

    pub fn set_center(&mut self, cx: f64, cy: f64) {
        self.rect.set_center(cx, cy);
    }

    pub fn move_by(&mut self, dx: f64, dy: f64) {
        self.rect.move_by(dx, dy);
    }

    pub fn estimated_size(&self) -> Option<f64> {
        self.estimated_size
    }

    pub fn inclusion_tree_depth(&self) -> Option<usize> {
        self.inclusion_tree_depth
    }

    /// Leaf descendants counted for force weighting (1 for a leaf).
    pub fn no_of_children(&self) -> usize {
        self.no_of_children
    }

    pub fn spring_force(&self) -> (f64, f64) {
        self.spring_force
    }

    pub fn repulsion_force(&self) -> (f64, f64) {
        self.repulsion_force
    }

    pub fn gravitation_force(&self) -> (f64, f64) {
        self.gravitation_force
    }

    pub fn grid_span(&self) -> GridSpan {
        self.grid
    }

    pub fn surrounding(&self) -> &[NodeId] {
        &self.surrounding
    }

    pub(crate) fn reset_forces(&mut self) {
        self.spring_force = (0.0, 0.0);
        self.repulsion_force = (0.0, 0.0);
        self.gravitation_force = (0.0, 0.0);
        self.displacement = (0.0, 0.0);
    }
}
