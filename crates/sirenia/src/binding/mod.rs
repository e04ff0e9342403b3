//! Bridge between caller-side graph descriptions and the layout engine: element and option
//! types, graph population, and the run lifecycle with its observer events.

mod elements;
mod options;
mod run;

pub use elements::{
    EdgeElement, Elements, LabelElement, NodeElement, PaddingElement, leaf_dimensions_with_label,
};
pub use options::{LayoutOptions, TilingPadding};
pub use run::{
    FitRequest, LayoutEvent, LayoutObserver, LayoutResult, LayoutRun, NoopObserver, run,
};
