use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use super::elements::{Elements, populate};
use super::options::LayoutOptions;
use crate::config::{AnimateMode, LayoutConfig};
use crate::cose::CoseLayout;
use crate::error::Result;
use crate::fd::ForceDirected;
use crate::geometry::{Dimension, Point};
use crate::graph::NodeId;
use crate::layout::Layout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutEvent {
    /// Before any computation.
    Start,
    /// The first time positions are available.
    Ready,
    /// After the final positions were delivered.
    Stop,
}

/// Receives lifecycle events and position updates. Both default to doing nothing.
pub trait LayoutObserver {
    fn on_event(&mut self, _event: LayoutEvent) {}
    fn on_positions(&mut self, _positions: &BTreeMap<String, Point>) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl LayoutObserver for NoopObserver {}

/// Asks the host to fit its viewport around the result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitRequest {
    pub padding: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutResult {
    /// Center of every node by external id.
    pub positions: BTreeMap<String, Point>,
    pub sizes: BTreeMap<String, Dimension>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit: Option<FitRequest>,
}

/// One layout over a caller graph.
///
/// With `animate: "during"` the host calls [`LayoutRun::frame`] once per animation frame after
/// [`LayoutRun::start`]; in the other modes `start` does everything.
pub struct LayoutRun<O: LayoutObserver = NoopObserver> {
    layout: CoseLayout,
    index: IndexMap<String, NodeId>,
    options: LayoutOptions,
    observer: O,
    success: bool,
    started: bool,
    ready_emitted: bool,
    stop_requested: bool,
    finished: bool,
}

impl LayoutRun<NoopObserver> {
    pub fn new(elements: &Elements, options: LayoutOptions) -> Result<Self> {
        Self::with_observer(elements, options, NoopObserver)
    }
}

impl<O: LayoutObserver> LayoutRun<O> {
    pub fn with_observer(elements: &Elements, options: LayoutOptions, observer: O) -> Result<Self> {
        let config = LayoutConfig::from(&options);
        let mut layout = CoseLayout::new(config);
        let include_labels = options.node_dimensions_include_labels;
        let index = populate(
            layout.base_mut().graph_manager_mut(),
            elements,
            include_labels,
        )?;
        Ok(Self {
            layout,
            index,
            options,
            observer,
            success: false,
            started: false,
            ready_emitted: false,
            stop_requested: false,
            finished: false,
        })
    }

    /// Runs the layout. Outside of `during` mode this also delivers the final positions and
    /// the `Ready` and `Stop` events.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        self.observer.on_event(LayoutEvent::Start);
        debug!(nodes = self.index.len(), animate = ?self.options.animate, "layout start");

        self.success = self.layout.run_layout()?;
        if self.options.animate == AnimateMode::During {
            if !self.success {
                self.layout.finish_layout(false)?;
                self.complete();
            }
            return Ok(());
        }
        self.complete();
        Ok(())
    }

    /// Advances an animated run by up to `refresh` ticks and delivers the intermediate
    /// positions. Finalizes once the simulation converged or a stop was requested. Returns
    /// whether the run is finished.
    pub fn frame(&mut self) -> Result<bool> {
        if !self.started {
            self.start()?;
        }
        if self.finished {
            return Ok(true);
        }

        let mut done = false;
        for _ in 0..self.options.refresh.max(1) {
            if self.stop_requested {
                done = true;
                break;
            }
            done = self.layout.tick()?;
            if done {
                break;
            }
            if self.layout.fd_mut().take_update_due() {
                self.emit_positions();
            }
        }

        if done {
            debug!(
                stopped = self.stop_requested,
                iterations = self.layout.fd().total_iterations(),
                "animated layout done"
            );
            self.layout.finish_layout(self.success)?;
            self.complete();
        } else {
            self.emit_positions();
            if !self.ready_emitted {
                self.ready_emitted = true;
                self.observer.on_event(LayoutEvent::Ready);
            }
        }
        Ok(self.finished)
    }

    /// Requests a hard stop before the next tick; the partial state is finalized as usual.
    pub fn stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn layout(&self) -> &CoseLayout {
        &self.layout
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Current centers of every external node.
    pub fn positions(&self) -> BTreeMap<String, Point> {
        let gm = self.layout.base().graph_manager();
        self.index
            .iter()
            .map(|(id, node)| (id.clone(), gm.node(*node).center()))
            .collect()
    }

    pub fn result(&self) -> LayoutResult {
        let gm = self.layout.base().graph_manager();
        let sizes = self
            .index
            .iter()
            .map(|(id, node)| {
                let r = gm.node(*node).rect;
                (id.clone(), Dimension::new(r.width, r.height))
            })
            .collect();
        LayoutResult {
            positions: self.positions(),
            sizes,
            success: self.success,
            fit: self.options.fit.then_some(FitRequest {
                padding: self.options.padding,
            }),
        }
    }

    fn emit_positions(&mut self) {
        let positions = self.positions();
        self.observer.on_positions(&positions);
    }

    fn complete(&mut self) {
        self.finished = true;
        self.emit_positions();
        if !self.ready_emitted {
            self.ready_emitted = true;
            self.observer.on_event(LayoutEvent::Ready);
        }
        self.observer.on_event(LayoutEvent::Stop);
        debug!(success = self.success, "layout stop");
    }
}

/// Lays out `elements` to completion, driving animated runs frame by frame.
pub fn run(elements: &Elements, options: LayoutOptions) -> Result<LayoutResult> {
    let mut run = LayoutRun::new(elements, options)?;
    run.start()?;
    while !run.is_finished() {
        run.frame()?;
    }
    Ok(run.result())
}
