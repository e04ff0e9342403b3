//! Force-directed simulation: springs on edges, repulsion between siblings, gravity towards
//! graph centers, annealed by a cooling schedule.

mod forces;
mod grid;
mod tree;

pub use grid::RepulsionGrid;
pub use tree::PrunedNode;

pub(crate) use forces::assign_ideal_edge_lengths;

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::config::{AnimateMode, LayoutConfig, Quality};
use crate::error::Result;
use crate::graph::{EdgeId, NodeId};
use crate::layout::{Layout, LayoutBase};

const OSCILLATION_TOLERANCE: f64 = 2.0;
const TREE_GROWTH_PERIOD: usize = 10;
const GROWTH_COOLING_WINDOW: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationPhase {
    /// Main annealing on the reduced graph.
    Simulating,
    /// Re-inserting pruned tree rounds every few iterations.
    TreeGrowing,
    /// Settling after the last pruned round was re-inserted.
    GrowthFinished,
    Converged,
}

/// Physics parameters and counters of one simulation.
#[derive(Debug, Clone)]
pub struct FdState {
    pub(crate) quality: Quality,
    pub(crate) ideal_edge_length: f64,
    pub(crate) spring_constant: f64,
    pub(crate) repulsion_constant: f64,
    pub(crate) gravity_constant: f64,
    pub(crate) compound_gravity_constant: f64,
    pub(crate) gravity_range_factor: f64,
    pub(crate) compound_gravity_range_factor: f64,
    pub(crate) per_level_ideal_edge_length_factor: f64,
    pub(crate) min_repulsion_dist: f64,
    pub(crate) separation_buffer: f64,
    pub(crate) use_fr_grid_variant: bool,

    pub(crate) cooling_factor: f64,
    pub(crate) initial_cooling_factor: f64,
    pub(crate) incremental_cooling_factor: f64,
    pub(crate) final_temperature: f64,
    pub(crate) cooling_cycle: f64,
    pub(crate) max_cooling_cycle: f64,
    pub(crate) cooling_adjuster: f64,
    pub(crate) max_node_displacement: f64,

    pub(crate) total_displacement: f64,
    pub(crate) old_total_displacement: f64,
    pub(crate) displacement_threshold_per_node: f64,
    pub(crate) total_displacement_threshold: f64,

    pub(crate) max_iterations: usize,
    pub(crate) total_iterations: usize,
    pub(crate) convergence_check_period: usize,
    pub(crate) grid_calculation_check_period: usize,

    pub(crate) animation_period: usize,
    pub(crate) initial_animation_period: usize,
    pub(crate) not_animated_iterations: usize,
    pub(crate) update_due: bool,

    pub(crate) level: usize,
    pub(crate) repulsion_range: f64,
    pub(crate) grid: Option<RepulsionGrid>,

    pub(crate) pruned_nodes_all: Vec<Vec<PrunedNode>>,
    pub(crate) nodes_with_gravity: Vec<NodeId>,
    pub(crate) grow_tree_iterations: usize,
    pub(crate) after_growth_iterations: usize,
    pub(crate) phase: SimulationPhase,
}

impl FdState {
    pub fn new(config: &LayoutConfig) -> Self {
        let ideal = config.ideal_edge_length;
        let mut threshold_per_node = 3.0 * ideal / 100.0;
        let mut max_iterations = config.max_iterations as f64;
        match config.quality {
            Quality::Draft => {
                threshold_per_node += 0.3;
                max_iterations *= 0.8;
            }
            Quality::Proof => {
                threshold_per_node -= 0.3;
                max_iterations *= 1.2;
            }
            Quality::Default => {}
        }

        Self {
            quality: config.quality,
            ideal_edge_length: ideal,
            spring_constant: config.spring_strength,
            repulsion_constant: config.repulsion_strength,
            gravity_constant: config.gravity_strength,
            compound_gravity_constant: config.compound_gravity_strength,
            gravity_range_factor: config.gravity_range_factor,
            compound_gravity_range_factor: config.compound_gravity_range_factor,
            per_level_ideal_edge_length_factor: config.per_level_ideal_edge_length_factor,
            min_repulsion_dist: ideal / 10.0,
            separation_buffer: ideal / 2.0,
            use_fr_grid_variant: config.use_fr_grid_variant,

            cooling_factor: config.cooling_factor_incremental,
            initial_cooling_factor: config.cooling_factor_incremental,
            incremental_cooling_factor: config.cooling_factor_incremental,
            final_temperature: config.final_temperature,
            cooling_cycle: 0.0,
            max_cooling_cycle: 0.0,
            cooling_adjuster: 1.0,
            max_node_displacement: config.max_node_displacement_incremental,

            total_displacement: 0.0,
            old_total_displacement: 0.0,
            displacement_threshold_per_node: threshold_per_node.max(0.0),
            total_displacement_threshold: 0.0,

            max_iterations: max_iterations.round().max(1.0) as usize,
            total_iterations: 0,
            convergence_check_period: config.convergence_check_period.max(1),
            grid_calculation_check_period: config.grid_calculation_check_period.max(1),

            animation_period: config.animation_period,
            initial_animation_period: config.animation_period,
            not_animated_iterations: 0,
            update_due: false,

            level: 0,
            repulsion_range: 0.0,
            grid: None,

            pruned_nodes_all: Vec::new(),
            nodes_with_gravity: Vec::new(),
            grow_tree_iterations: 0,
            after_growth_iterations: 0,
            phase: SimulationPhase::Simulating,
        }
    }

    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    pub fn total_iterations(&self) -> usize {
        self.total_iterations
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn cooling_factor(&self) -> f64 {
        self.cooling_factor
    }

    pub fn total_displacement(&self) -> f64 {
        self.total_displacement
    }

    pub fn repulsion_range(&self) -> f64 {
        self.repulsion_range
    }

    pub fn displacement_threshold_per_node(&self) -> f64 {
        self.displacement_threshold_per_node
    }

    pub fn grid(&self) -> Option<&RepulsionGrid> {
        self.grid.as_ref()
    }

    pub fn pruned_rounds(&self) -> &[Vec<PrunedNode>] {
        &self.pruned_nodes_all
    }

    /// Whether an animation frame is due; clears the flag.
    pub fn take_update_due(&mut self) -> bool {
        std::mem::take(&mut self.update_due)
    }

    /// One step of the cooling schedule, taken at every convergence check.
    pub(crate) fn advance_cooling(&mut self) {
        self.cooling_cycle += 1.0;
        self.cooling_adjuster = match self.quality {
            Quality::Draft => self.cooling_cycle,
            Quality::Default => self.cooling_cycle / 3.0,
            Quality::Proof => 1.0,
        };
        let spread = self.initial_cooling_factor - self.final_temperature;
        if spread <= 0.0 || self.max_cooling_cycle <= 1.0 {
            self.cooling_factor = self.final_temperature.min(self.initial_cooling_factor);
        } else {
            let exponent = (100.0 * spread).ln() / self.max_cooling_cycle.ln();
            let drop = self.cooling_cycle.powf(exponent) / 100.0 * self.cooling_adjuster;
            self.cooling_factor = (self.initial_cooling_factor - drop).max(self.final_temperature);
        }
        self.animation_period = ((self.initial_animation_period as f64)
            * self.cooling_factor.sqrt())
        .ceil() as usize;
    }
}

/// Force-directed behavior shared by the flat and compound layouts. Every step has a default
/// implementation that an implementor may override.
pub trait ForceDirected: Layout {
    fn fd(&self) -> &FdState;
    fn fd_mut(&mut self) -> &mut FdState;
    /// Both halves at once, for steps that mutate the graph and the simulation state together.
    fn parts(&mut self) -> (&mut LayoutBase, &mut FdState);

    fn calc_ideal_edge_lengths(&mut self) {
        let (base, fd) = self.parts();
        forces::assign_ideal_edge_lengths(&mut base.gm, fd, false, base.config.simple_node_size);
    }

    fn calc_repulsion_range(&self) -> f64 {
        2.0 * (self.fd().level + 1) as f64 * self.fd().ideal_edge_length
    }

    fn init_spring_embedder(&mut self) {
        let range = self.calc_repulsion_range();
        let (base, fd) = self.parts();
        let node_count = base.gm.all_nodes().len();
        if base.incremental {
            fd.cooling_factor = fd.incremental_cooling_factor;
            fd.initial_cooling_factor = fd.incremental_cooling_factor;
            fd.max_node_displacement = base.config.max_node_displacement_incremental;
        } else {
            fd.cooling_factor = 1.0;
            fd.initial_cooling_factor = 1.0;
            fd.max_node_displacement = base.config.max_node_displacement;
        }
        fd.max_iterations = fd.max_iterations.max(node_count * 5);
        fd.total_displacement_threshold = fd.displacement_threshold_per_node * node_count as f64;
        fd.cooling_cycle = 0.0;
        fd.max_cooling_cycle = (fd.max_iterations / fd.convergence_check_period) as f64;
        fd.final_temperature = base.config.final_temperature;
        fd.cooling_adjuster = 1.0;
        fd.total_iterations = 0;
        fd.phase = SimulationPhase::Simulating;
        fd.repulsion_range = range;
        debug!(
            nodes = node_count,
            max_iterations = fd.max_iterations,
            repulsion_range = range,
            "initialized spring embedder"
        );
    }

    fn calc_spring_forces(&mut self) {
        let edges = self.base().gm.all_edges();
        for &edge in edges.iter() {
            self.calc_spring_force(edge);
        }
    }

    fn calc_spring_force(&mut self, edge: EdgeId) {
        let (base, fd) = self.parts();
        forces::spring_force(&mut base.gm, fd, base.uniform_leaf_node_sizes, edge);
    }

    /// Repulsion between sibling pairs. With the grid variant, each node's neighbourhood is
    /// refreshed every grid period (or when forced) and reused in between.
    fn calc_repulsion_forces(&mut self, grid_update_allowed: bool, force_surrounding_update: bool) {
        let nodes = self.base().gm.all_nodes();
        if !self.fd().use_fr_grid_variant {
            for (i, &a) in nodes.iter().enumerate() {
                let owner = self.base().gm.node(a).owner();
                for &b in &nodes[i + 1..] {
                    if self.base().gm.node(b).owner() == owner {
                        self.calc_repulsion_force(a, b);
                    }
                }
            }
            return;
        }

        let fd = self.fd();
        let on_period = fd.total_iterations % fd.grid_calculation_check_period == 1;
        if on_period && grid_update_allowed {
            self.update_grid();
        }
        let refresh = (on_period && grid_update_allowed) || force_surrounding_update;

        let mut processed: FxHashSet<NodeId> = FxHashSet::default();
        for &a in nodes.iter() {
            if refresh {
                let (base, fd) = self.parts();
                if let Some(grid) = fd.grid.as_ref() {
                    grid.refresh_surrounding(&mut base.gm, a, &processed);
                }
            }
            let surrounding = std::mem::take(&mut self.base_mut().gm.node_mut(a).surrounding);
            for &b in &surrounding {
                self.calc_repulsion_force(a, b);
            }
            self.base_mut().gm.node_mut(a).surrounding = surrounding;
            processed.insert(a);
        }
    }

    fn calc_repulsion_force(&mut self, a: NodeId, b: NodeId) {
        let (base, fd) = self.parts();
        forces::repulsion_force(&mut base.gm, fd, base.uniform_leaf_node_sizes, a, b);
    }

    /// Rebuilds the repulsion grid from the current root bounds.
    fn update_grid(&mut self) {
        let (base, fd) = self.parts();
        fd.grid = RepulsionGrid::build(&mut base.gm, fd.repulsion_range);
    }

    fn calc_gravitational_forces(&mut self) {
        let (base, fd) = self.parts();
        let nodes = base.gm.all_nodes_to_apply_gravitation();
        for &node in nodes.iter() {
            forces::gravitational_force(&mut base.gm, fd, node);
        }
    }

    fn move_nodes(&mut self) {
        let (base, fd) = self.parts();
        forces::move_nodes(&mut base.gm, fd);
    }

    /// Converged when the displacement of the last tick fell under the threshold, or when it
    /// stopped changing late in the run.
    fn is_converged(&mut self) -> bool {
        let fd = self.fd_mut();
        let oscillating = fd.total_iterations > fd.max_iterations / 3
            && (fd.total_displacement - fd.old_total_displacement).abs() < OSCILLATION_TOLERANCE;
        let converged = fd.total_displacement < fd.total_displacement_threshold;
        trace!(
            iteration = fd.total_iterations,
            total_displacement = fd.total_displacement,
            cooling = fd.cooling_factor,
            oscillating,
            converged,
            "convergence check"
        );
        fd.old_total_displacement = fd.total_displacement;
        converged || oscillating
    }

    /// Nodes that feel gravity: root members when the root graph is disconnected, and every
    /// member of a compound.
    fn calculate_nodes_to_apply_gravitation_to(&mut self) -> Vec<NodeId> {
        let gm = &mut self.base_mut().gm;
        let Some(root) = gm.root() else {
            return Vec::new();
        };
        let mut nodes = Vec::new();
        if !gm.update_connected(root) {
            nodes.extend_from_slice(gm.graph(root).nodes());
        }
        for graph in gm.graphs().to_vec() {
            if graph != root {
                nodes.extend_from_slice(gm.graph(graph).nodes());
            }
        }
        nodes
    }

    /// Keeps only the gravity nodes that are still attached.
    fn refresh_gravitation_set(&mut self) {
        let (base, fd) = self.parts();
        let attached: FxHashSet<NodeId> = base.gm.all_nodes().iter().copied().collect();
        let nodes = fd
            .nodes_with_gravity
            .iter()
            .copied()
            .filter(|n| attached.contains(n))
            .collect();
        base.gm.set_all_nodes_to_apply_gravitation(nodes);
    }

    fn calc_no_of_children_for_all_nodes(&mut self) {
        let gm = &mut self.base_mut().gm;
        for node in gm.all_nodes().iter().copied() {
            let count = gm.no_of_children(node);
            gm.node_mut(node).no_of_children = count;
        }
    }

    fn reduce_trees(&mut self) -> Result<()> {
        let rounds = tree::reduce_trees(&mut self.base_mut().gm)?;
        self.fd_mut().pruned_nodes_all = rounds;
        Ok(())
    }

    fn grow_tree(&mut self) -> Result<()> {
        let (base, fd) = self.parts();
        tree::grow_tree(
            &mut base.gm,
            &mut fd.pruned_nodes_all,
            fd.grid.as_ref(),
            &mut base.rng,
            fd.ideal_edge_length,
        )
    }

    fn find_place_for_pruned_node(&mut self, pruned: &PrunedNode) {
        let (base, fd) = self.parts();
        tree::find_place_for_pruned_node(
            &mut base.gm,
            fd.grid.as_ref(),
            &mut base.rng,
            fd.ideal_edge_length,
            pruned,
        );
    }

    /// Raises the update flag every animation period while animating during the layout.
    fn animate(&mut self) {
        let (base, fd) = self.parts();
        if base.config.animate != AnimateMode::During || base.is_sub_layout {
            return;
        }
        if fd.not_animated_iterations >= fd.animation_period {
            fd.update_due = true;
            fd.not_animated_iterations = 0;
        } else {
            fd.not_animated_iterations += 1;
        }
    }

    /// One iteration. Returns `true` once the simulation reached [`SimulationPhase::Converged`].
    fn tick(&mut self) -> Result<bool> {
        if self.fd().phase == SimulationPhase::Converged {
            return Ok(true);
        }
        self.fd_mut().total_iterations += 1;

        let (iteration, period, max_iterations) = {
            let fd = self.fd();
            (fd.total_iterations, fd.convergence_check_period, fd.max_iterations)
        };
        if self.fd().phase == SimulationPhase::Simulating {
            if iteration >= max_iterations {
                debug!(iteration, "iteration cap reached");
                if self.finish_simulating() {
                    return Ok(true);
                }
            } else if iteration % period == 0 {
                if self.is_converged() {
                    if self.finish_simulating() {
                        return Ok(true);
                    }
                } else {
                    self.fd_mut().advance_cooling();
                }
            }
        }

        if self.fd().phase == SimulationPhase::TreeGrowing {
            if self.fd().grow_tree_iterations % TREE_GROWTH_PERIOD == 0 {
                if self.fd().pruned_nodes_all.is_empty() {
                    debug!(iteration, "tree growth finished");
                    self.fd_mut().phase = SimulationPhase::GrowthFinished;
                } else {
                    self.base_mut().gm.update_bounds();
                    self.update_grid();
                    self.grow_tree()?;
                    self.refresh_gravitation_set();
                    self.base_mut().gm.update_bounds();
                    self.update_grid();
                    let fd = self.fd_mut();
                    fd.cooling_factor = fd.incremental_cooling_factor;
                }
            }
            self.fd_mut().grow_tree_iterations += 1;
        }

        if self.fd().phase == SimulationPhase::GrowthFinished {
            if self.is_converged() {
                debug!(iteration, "converged after tree growth");
                self.fd_mut().phase = SimulationPhase::Converged;
                return Ok(true);
            }
            if self.fd().after_growth_iterations % TREE_GROWTH_PERIOD == 0 {
                self.base_mut().gm.update_bounds();
                self.update_grid();
            }
            let fd = self.fd_mut();
            fd.cooling_factor = fd.incremental_cooling_factor
                * ((GROWTH_COOLING_WINDOW - fd.after_growth_iterations as f64)
                    / GROWTH_COOLING_WINDOW)
                    .max(0.0);
            fd.after_growth_iterations += 1;
        }

        let (grid_update_allowed, force_surrounding_update) = {
            let fd = self.fd();
            let growing = fd.phase == SimulationPhase::TreeGrowing
                && fd.grow_tree_iterations % TREE_GROWTH_PERIOD == 1;
            let settling = fd.phase == SimulationPhase::GrowthFinished
                && fd.after_growth_iterations % TREE_GROWTH_PERIOD == 1;
            (fd.phase == SimulationPhase::Simulating, growing || settling)
        };

        self.fd_mut().total_displacement = 0.0;
        self.base_mut().gm.update_bounds();
        self.calc_spring_forces();
        self.calc_repulsion_forces(grid_update_allowed, force_surrounding_update);
        self.calc_gravitational_forces();
        self.move_nodes();
        self.animate();
        Ok(false)
    }

    /// Leaves the main annealing: start re-growing pruned trees, or stop when there are none.
    /// Returns `true` when the simulation is over.
    fn finish_simulating(&mut self) -> bool {
        let fd = self.fd_mut();
        if fd.pruned_nodes_all.is_empty() {
            debug!(iteration = fd.total_iterations, "converged");
            fd.phase = SimulationPhase::Converged;
            true
        } else {
            debug!(
                iteration = fd.total_iterations,
                rounds = fd.pruned_nodes_all.len(),
                "growing pruned trees"
            );
            fd.phase = SimulationPhase::TreeGrowing;
            false
        }
    }

    fn run_spring_embedder(&mut self) -> Result<()> {
        while !self.tick()? {}
        debug!(
            iterations = self.fd().total_iterations,
            "spring embedder finished"
        );
        Ok(())
    }
}

/// Flat force-directed layout that uses the default steps only.
#[derive(Debug, Clone)]
pub struct FdLayout {
    base: LayoutBase,
    fd: FdState,
}

impl FdLayout {
    pub fn new(config: LayoutConfig) -> Self {
        let fd = FdState::new(&config);
        Self {
            base: LayoutBase::new(config),
            fd,
        }
    }
}

impl Layout for FdLayout {
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
        let gm = &mut self.base.gm;
        gm.calc_lowest_common_ancestors()?;
        gm.calc_inclusion_tree_depths();
        if let Some(root) = gm.root() {
            gm.calc_estimated_size(root);
        }
        self.calc_no_of_children_for_all_nodes();
        let gravity = self.calculate_nodes_to_apply_gravitation_to();
        self.base.gm.set_all_nodes_to_apply_gravitation(gravity.clone());
        self.fd.nodes_with_gravity = gravity;
        self.calc_ideal_edge_lengths();

        if !self.base.incremental {
            self.base.position_nodes_randomly();
        }
        self.init_spring_embedder();
        if self.base.config.animate != AnimateMode::During {
            self.run_spring_embedder()?;
        }
        Ok(true)
    }
}

impl ForceDirected for FdLayout {
    fn fd(&self) -> &FdState {
        &self.fd
    }

    fn fd_mut(&mut self) -> &mut FdState {
        &mut self.fd
    }

    fn parts(&mut self) -> (&mut LayoutBase, &mut FdState) {
        (&mut self.base, &mut self.fd)
    }
}

#[cfg(test)]
mod tests {
    use super::FdState;
    use crate::config::{LayoutConfig, Quality};

    fn state(quality: Quality) -> FdState {
        let config = LayoutConfig {
            quality,
            ..LayoutConfig::default()
        };
        let mut fd = FdState::new(&config);
        fd.initial_cooling_factor = 1.0;
        fd.cooling_factor = 1.0;
        fd.max_cooling_cycle = 25.0;
        fd
    }

    #[test]
    fn cooling_never_drops_below_final_temperature() {
        let mut fd = state(Quality::Default);
        let mut last = fd.cooling_factor;
        for _ in 0..40 {
            fd.advance_cooling();
            assert!(fd.cooling_factor <= last + 1e-12);
            assert!(fd.cooling_factor >= 0.04 - 1e-12);
            last = fd.cooling_factor;
        }
        assert!((fd.cooling_factor - 0.04).abs() < 1e-12);
    }

    #[test]
    fn draft_cools_faster_than_proof() {
        let mut draft = state(Quality::Draft);
        let mut proof = state(Quality::Proof);
        for _ in 0..5 {
            draft.advance_cooling();
            proof.advance_cooling();
        }
        assert!(draft.cooling_factor < proof.cooling_factor);
    }

    #[test]
    fn quality_scales_budget_and_threshold() {
        let base = FdState::new(&LayoutConfig::default());
        let draft = state(Quality::Draft);
        let proof = state(Quality::Proof);
        assert_eq!(base.max_iterations, 2500);
        assert_eq!(draft.max_iterations, 2000);
        assert_eq!(proof.max_iterations, 3000);
        assert!((draft.displacement_threshold_per_node - 1.8).abs() < 1e-12);
        assert!((proof.displacement_threshold_per_node - 1.2).abs() < 1e-12);
    }

    #[test]
    fn update_flag_is_taken_once() {
        let mut fd = FdState::new(&LayoutConfig::default());
        fd.update_due = true;
        assert!(fd.take_update_due());
        assert!(!fd.take_update_due());
    }
}
