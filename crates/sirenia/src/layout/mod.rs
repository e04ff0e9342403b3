//! Run orchestration shared by every layout.

mod bends;
mod placement;

pub use placement::find_center_of_tree;

use indexmap::IndexMap;
use tracing::debug;

use crate::config::{AnimateMode, LayoutConfig};
use crate::error::Result;
use crate::geometry::{Point, Transform};
use crate::graph::{EdgeId, GraphManager, GraphSettings, NodeId};
use crate::rng::SeededRng;

/// State every layout carries: the graph, the configuration and the run flags.
#[derive(Debug, Clone)]
pub struct LayoutBase {
    pub(crate) gm: GraphManager,
    pub(crate) config: LayoutConfig,
    pub(crate) rng: SeededRng,
    pub(crate) incremental: bool,
    pub(crate) create_bends_as_needed: bool,
    pub(crate) uniform_leaf_node_sizes: bool,
    pub(crate) is_sub_layout: bool,
    pub(crate) is_layout_finished: bool,
    pub(crate) edge_to_dummy_nodes: IndexMap<EdgeId, Vec<NodeId>>,
}

impl LayoutBase {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            gm: GraphManager::new(GraphSettings::from(&config)),
            rng: SeededRng::new(config.random_seed),
            incremental: config.incremental,
            create_bends_as_needed: config.create_bends_as_needed,
            uniform_leaf_node_sizes: config.uniform_leaf_node_sizes,
            is_sub_layout: false,
            is_layout_finished: false,
            edge_to_dummy_nodes: IndexMap::new(),
            config,
        }
    }

    pub fn graph_manager(&self) -> &GraphManager {
        &self.gm
    }

    pub fn graph_manager_mut(&mut self) -> &mut GraphManager {
        &mut self.gm
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn is_layout_finished(&self) -> bool {
        self.is_layout_finished
    }

    pub fn set_sub_layout(&mut self, is_sub_layout: bool) {
        self.is_sub_layout = is_sub_layout;
    }

    pub(crate) fn init_parameters(&mut self) {
        self.incremental = self.config.incremental;
        self.create_bends_as_needed = self.config.create_bends_as_needed;
        self.uniform_leaf_node_sizes = self.config.uniform_leaf_node_sizes;
    }

    /// A run cannot proceed without a non-empty root graph, or with an edge between a node and
    /// one of its ancestors.
    pub fn is_layout_impossible(&self) -> bool {
        let Some(root) = self.gm.root() else {
            return true;
        };
        self.gm.graph(root).nodes().is_empty() || self.gm.includes_invalid_edge()
    }

    /// Translates every node so the root graph's margin-adjusted left-top lands on
    /// `new_left_top`. Coordinates beyond the world boundary are clamped first.
    pub fn transform(&mut self, new_left_top: Point) {
        let Some(root) = self.gm.root() else {
            return;
        };
        let Some(left_top) = self.gm.update_left_top(root) else {
            return;
        };
        let mut trans = Transform::default();
        trans.set_world_origin(new_left_top);
        trans.set_device_origin(left_top);

        let boundary = self.config.world_boundary;
        for node in self.gm.all_nodes().iter().copied() {
            let rect = &mut self.gm.node_mut(node).rect;
            let left = rect.x.clamp(-boundary, boundary);
            let top = rect.y.clamp(-boundary, boundary);
            let p = trans.inverse_transform_point(Point::new(left, top));
            rect.x = p.x;
            rect.y = p.y;
        }
    }

    /// Writes results back into the model: restores edges that were split for bend points.
    pub fn update(&mut self) -> Result<()> {
        if self.create_bends_as_needed {
            self.create_bendpoints_from_dummy_nodes()?;
            self.gm.reset_all_edges();
        }
        Ok(())
    }
}

/// The run lifecycle: tiling hooks around a layout-specific simulation.
pub trait Layout {
    fn base(&self) -> &LayoutBase;
    fn base_mut(&mut self) -> &mut LayoutBase;

    /// Runs the layout-specific simulation. Returns whether the layout succeeded.
    fn layout(&mut self) -> Result<bool>;

    fn tiling_pre_layout(&mut self) -> Result<()> {
        Ok(())
    }

    fn tiling_post_layout(&mut self) -> Result<()> {
        Ok(())
    }

    fn init_parameters(&mut self) {
        self.base_mut().init_parameters();
    }

    /// Runs the whole lifecycle. In [`AnimateMode::During`] the call returns right after the
    /// simulation is prepared and [`Layout::finish_layout`] is left to the frame driver.
    fn run_layout(&mut self) -> Result<bool> {
        self.base_mut().is_layout_finished = false;
        self.tiling_pre_layout()?;
        self.init_parameters();

        let success = if self.base().is_layout_impossible() {
            debug!("layout skipped: empty graph or an edge joins a node and its ancestor");
            false
        } else {
            self.layout()?
        };
        debug!(success, "layout pass done");

        if self.base().config.animate == AnimateMode::During {
            return Ok(success);
        }
        self.finish_layout(success)?;
        Ok(success)
    }

    fn finish_layout(&mut self, success: bool) -> Result<()> {
        if success && !self.base().is_sub_layout {
            self.do_post_layout()?;
        }
        self.tiling_post_layout()?;
        self.base_mut().is_layout_finished = true;
        Ok(())
    }

    fn do_post_layout(&mut self) -> Result<()> {
        let base = self.base_mut();
        if !base.incremental {
            let origin = base.config.transform_origin;
            base.transform(origin);
        }
        base.update()
    }
}
