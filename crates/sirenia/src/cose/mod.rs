//! Compound-aware layout: nesting-aware ideal lengths, radial placement of flat forests, tree
//! reduction, and tiling of edge-free members around the force-directed core.

mod packing;
mod tiling;

pub use packing::{Organization, PackedItem, tile_nodes};
pub use tiling::{ClearedCompound, TilingState, ZeroDegreeGroup};

use tracing::debug;

use crate::config::{AnimateMode, LayoutConfig};
use crate::error::Result;
use crate::fd::{FdState, ForceDirected};
use crate::layout::{Layout, LayoutBase};

#[derive(Debug, Clone)]
pub struct CoseLayout {
    base: LayoutBase,
    fd: FdState,
    tiling: TilingState,
}

impl CoseLayout {
    pub fn new(config: LayoutConfig) -> Self {
        let fd = FdState::new(&config);
        Self {
            base: LayoutBase::new(config),
            fd,
            tiling: TilingState::default(),
        }
    }

    pub fn tiling(&self) -> &TilingState {
        &self.tiling
    }

    /// Gravity set, hierarchy bookkeeping, ideal lengths, initial placement, then the spring
    /// embedder. In [`AnimateMode::During`] the embedder is only prepared.
    fn classic_layout(&mut self) -> Result<bool> {
        let gravity = self.calculate_nodes_to_apply_gravitation_to();
        self.base.gm.set_all_nodes_to_apply_gravitation(gravity.clone());
        self.fd.nodes_with_gravity = gravity;
        self.calc_no_of_children_for_all_nodes();

        let gm = &mut self.base.gm;
        gm.calc_lowest_common_ancestors()?;
        gm.calc_inclusion_tree_depths();
        if let Some(root) = gm.root() {
            gm.calc_estimated_size(root);
        }
        self.calc_ideal_edge_lengths();

        if !self.base.incremental {
            let forest = self.base.flat_forest();
            if forest.is_empty() {
                debug!("positioning nodes randomly after tree reduction");
                self.reduce_trees()?;
                self.refresh_gravitation_set();
                self.base.position_nodes_randomly();
            } else {
                debug!(trees = forest.len(), "positioning flat forest radially");
                self.base.position_nodes_radially(&forest);
            }
        } else if self.base.config.tree_reduction_on_incremental {
            self.reduce_trees()?;
            self.refresh_gravitation_set();
        }

        self.init_spring_embedder();
        if self.base.config.animate != AnimateMode::During {
            self.run_spring_embedder()?;
        }
        Ok(true)
    }
}

impl Layout for CoseLayout {
    fn base(&self) -> &LayoutBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayoutBase {
        &mut self.base
    }

    fn init_parameters(&mut self) {
        self.base.init_parameters();
        self.fd = FdState::new(&self.base.config);
    }

    fn layout(&mut self) -> Result<bool> {
        if self.base.create_bends_as_needed {
            self.base.create_bendpoints()?;
        }
        self.base.gm.reset_all_nodes();
        self.base.gm.reset_all_edges();
        self.base.gm.reset_all_nodes_to_apply_gravitation();
        self.classic_layout()
    }

    fn tiling_pre_layout(&mut self) -> Result<()> {
        self.tiling = TilingState::default();
        if !self.base.config.tile {
            return Ok(());
        }
        let vertical = self.base.config.tiling_padding_vertical;
        let horizontal = self.base.config.tiling_padding_horizontal;
        let gm = &mut self.base.gm;
        self.tiling.group_zero_degree_members(gm)?;
        self.tiling.clear_compounds(gm, vertical, horizontal)?;
        self.tiling.clear_zero_degree_members(gm, vertical, horizontal)?;
        debug!(
            groups = self.tiling.member_groups().len(),
            compounds = self.tiling.compound_order().len(),
            "tiling prepared"
        );
        Ok(())
    }

    fn tiling_post_layout(&mut self) -> Result<()> {
        if !self.base.config.tile {
            return Ok(());
        }
        let gm = &mut self.base.gm;
        self.tiling.repopulate_zero_degree_members(gm)?;
        self.tiling.repopulate_compounds(gm)?;
        Ok(())
    }
}

impl ForceDirected for CoseLayout {
    fn fd(&self) -> &FdState {
        &self.fd
    }

    fn fd_mut(&mut self) -> &mut FdState {
        &mut self.fd
    }

    fn parts(&mut self) -> (&mut LayoutBase, &mut FdState) {
        (&mut self.base, &mut self.fd)
    }

    fn calc_ideal_edge_lengths(&mut self) {
        let smart = self.base.config.use_smart_ideal_edge_length_calculation;
        let simple = self.base.config.simple_node_size;
        crate::fd::assign_ideal_edge_lengths(&mut self.base.gm, &self.fd, smart, simple);
    }
}
