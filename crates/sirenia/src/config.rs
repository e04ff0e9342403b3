//! Per-run layout configuration.
//!
//! A [`LayoutConfig`] is built once before a run and only read afterwards. Quality-dependent
//! adjustments are applied to the simulation state, never written back here.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Draft,
    #[default]
    Default,
    Proof,
}

/// When positions are handed to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimateMode {
    /// Once, after the simulation finished.
    #[default]
    End,
    /// Progressively, a batch of ticks per host frame.
    During,
    /// Once, without animation.
    Off,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub quality: Quality,
    pub animate: AnimateMode,
    /// Keep caller positions as the starting point instead of scattering nodes.
    pub incremental: bool,
    pub create_bends_as_needed: bool,
    /// Measure leaf edges and repulsion center-to-center.
    pub uniform_leaf_node_sizes: bool,
    pub node_dimensions_include_labels: bool,
    pub random_seed: u64,

    pub graph_margin: f64,
    pub simple_node_size: f64,
    pub empty_compound_node_size: f64,
    pub world_boundary: f64,
    pub initial_world_boundary: f64,
    pub world_center: Point,
    /// Where the root graph's margin-adjusted left-top lands after the layout.
    pub transform_origin: Point,

    pub ideal_edge_length: f64,
    pub spring_strength: f64,
    pub repulsion_strength: f64,
    pub gravity_strength: f64,
    pub compound_gravity_strength: f64,
    pub gravity_range_factor: f64,
    pub compound_gravity_range_factor: f64,
    pub per_level_ideal_edge_length_factor: f64,
    pub use_smart_ideal_edge_length_calculation: bool,
    pub use_fr_grid_variant: bool,

    pub max_iterations: usize,
    pub max_node_displacement: f64,
    pub max_node_displacement_incremental: f64,
    pub cooling_factor_incremental: f64,
    pub final_temperature: f64,
    pub convergence_check_period: usize,
    pub grid_calculation_check_period: usize,
    pub animation_period: usize,

    pub tile: bool,
    pub tiling_padding_vertical: f64,
    pub tiling_padding_horizontal: f64,
    pub tree_reduction_on_incremental: bool,
    pub component_separation: f64,
    pub radial_separation: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            quality: Quality::Default,
            animate: AnimateMode::End,
            incremental: false,
            create_bends_as_needed: false,
            uniform_leaf_node_sizes: false,
            node_dimensions_include_labels: false,
            random_seed: 1,

            graph_margin: 15.0,
            simple_node_size: 40.0,
            empty_compound_node_size: 40.0,
            world_boundary: 1_000_000.0,
            initial_world_boundary: 1_000.0,
            world_center: Point::new(1200.0, 900.0),
            transform_origin: Point::new(0.0, 0.0),

            ideal_edge_length: 50.0,
            spring_strength: 0.45,
            repulsion_strength: 4500.0,
            gravity_strength: 0.25,
            compound_gravity_strength: 1.0,
            gravity_range_factor: 3.8,
            compound_gravity_range_factor: 1.5,
            per_level_ideal_edge_length_factor: 0.1,
            use_smart_ideal_edge_length_calculation: true,
            use_fr_grid_variant: true,

            max_iterations: 2500,
            max_node_displacement: 300.0,
            max_node_displacement_incremental: 100.0,
            cooling_factor_incremental: 0.3,
            final_temperature: 0.04,
            convergence_check_period: 100,
            grid_calculation_check_period: 10,
            animation_period: 50,

            tile: true,
            tiling_padding_vertical: 10.0,
            tiling_padding_horizontal: 10.0,
            tree_reduction_on_incremental: false,
            component_separation: 60.0,
            radial_separation: 50.0,
        }
    }
}
