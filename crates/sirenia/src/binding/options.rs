use std::fmt;
use std::rc::Rc;

use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::config::{AnimateMode, LayoutConfig, Quality};

/// Padding between tiled members: a literal or a callback evaluated once per run.
#[derive(Clone)]
pub enum TilingPadding {
    Fixed(f64),
    Computed(Rc<dyn Fn() -> f64>),
}

impl TilingPadding {
    pub fn resolve(&self) -> f64 {
        match self {
            TilingPadding::Fixed(v) => *v,
            TilingPadding::Computed(f) => f(),
        }
    }
}

impl Default for TilingPadding {
    fn default() -> Self {
        TilingPadding::Fixed(10.0)
    }
}

impl fmt::Debug for TilingPadding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TilingPadding::Fixed(v) => f.debug_tuple("Fixed").field(v).finish(),
            TilingPadding::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for TilingPadding {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(TilingPadding::Fixed)
    }
}

fn deserialize_animate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<AnimateMode, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Flag(bool),
        Mode(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Flag(false) => Ok(AnimateMode::Off),
        Raw::Flag(true) => Ok(AnimateMode::End),
        Raw::Mode(mode) => match mode.as_str() {
            "end" => Ok(AnimateMode::End),
            "during" => Ok(AnimateMode::During),
            other => Err(de::Error::custom(format!(
                "unknown animate mode `{other}`, expected \"end\", \"during\" or false"
            ))),
        },
    }
}

/// Caller-facing knobs, named and defaulted the way graph front-ends usually spell them.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutOptions {
    pub quality: Quality,
    pub node_repulsion: f64,
    pub ideal_edge_length: f64,
    pub edge_elasticity: f64,
    pub nesting_factor: f64,
    pub gravity: f64,
    pub gravity_range: f64,
    pub gravity_compound: f64,
    pub gravity_range_compound: f64,
    pub num_iter: usize,
    /// `false` keeps the supplied positions as the starting point.
    pub randomize: bool,
    pub tile: bool,
    pub tiling_padding_vertical: TilingPadding,
    pub tiling_padding_horizontal: TilingPadding,
    #[serde(deserialize_with = "deserialize_animate")]
    pub animate: AnimateMode,
    /// Ticks per frame when animating during the layout.
    pub refresh: usize,
    pub initial_energy_on_incremental: f64,
    pub node_dimensions_include_labels: bool,
    pub fit: bool,
    pub padding: f64,
    pub random_seed: u64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            quality: Quality::Default,
            node_repulsion: 4500.0,
            ideal_edge_length: 50.0,
            edge_elasticity: 0.45,
            nesting_factor: 0.1,
            gravity: 0.25,
            gravity_range: 3.8,
            gravity_compound: 1.0,
            gravity_range_compound: 1.5,
            num_iter: 2500,
            randomize: true,
            tile: true,
            tiling_padding_vertical: TilingPadding::default(),
            tiling_padding_horizontal: TilingPadding::default(),
            animate: AnimateMode::End,
            refresh: 30,
            initial_energy_on_incremental: 0.3,
            node_dimensions_include_labels: false,
            fit: true,
            padding: 10.0,
            random_seed: 1,
        }
    }
}

impl From<&LayoutOptions> for LayoutConfig {
    fn from(o: &LayoutOptions) -> Self {
        LayoutConfig {
            quality: o.quality,
            animate: o.animate,
            incremental: !o.randomize,
            node_dimensions_include_labels: o.node_dimensions_include_labels,
            random_seed: o.random_seed,
            ideal_edge_length: o.ideal_edge_length,
            spring_strength: o.edge_elasticity,
            repulsion_strength: o.node_repulsion,
            gravity_strength: o.gravity,
            compound_gravity_strength: o.gravity_compound,
            gravity_range_factor: o.gravity_range,
            compound_gravity_range_factor: o.gravity_range_compound,
            per_level_ideal_edge_length_factor: o.nesting_factor,
            max_iterations: o.num_iter,
            cooling_factor_incremental: o.initial_energy_on_incremental,
            tile: o.tile,
            tiling_padding_vertical: o.tiling_padding_vertical.resolve(),
            tiling_padding_horizontal: o.tiling_padding_horizontal.resolve(),
            radial_separation: o.ideal_edge_length,
            ..LayoutConfig::default()
        }
    }
}
