#![forbid(unsafe_code)]

//! Headless compound-graph layout: a force-directed spring embedder with nesting-aware
//! gravity, tree reduction, radial placement of forests and tiling of edge-free members.
//!
//! Most callers describe their graph with [`Elements`] and call [`run`]. The lower layers
//! ([`graph`], [`fd`], [`cose`]) can be driven directly when a caller needs the intermediate
//! state, for example to step an animation with [`fd::ForceDirected::tick`].

pub mod binding;
pub mod config;
pub mod cose;
pub mod error;
pub mod fd;
pub mod geometry;
pub mod graph;
pub mod layout;
pub mod rng;

pub use binding::{
    EdgeElement, Elements, LayoutEvent, LayoutObserver, LayoutOptions, LayoutResult, LayoutRun,
    NodeElement, run,
};
pub use config::{AnimateMode, LayoutConfig, Quality};
pub use cose::CoseLayout;
pub use error::{Error, Result};
pub use fd::{FdLayout, ForceDirected};
pub use geometry::{Dimension, Point, Rect};
pub use graph::{EdgeId, GraphId, GraphManager, NodeId};
pub use layout::Layout;
