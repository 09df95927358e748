//! Topology editor engine.
//!
//! Everything here is independent of the GUI toolkit so it can be driven
//! from tests:
//!
//! - [`model`] - Graph Model (nodes, edges, invariants)
//! - [`viewport`] - pan/zoom transform
//! - [`interaction`] - pointer/keyboard state machine
//! - [`edge`] - edge path renderer
//! - [`palette`] - palette-to-canvas drop pipeline
//! - [`persistence`] - canvas document (de)serialization
//! - [`collection`] - topology CRUD and the active document

pub mod collection;
pub mod edge;
pub mod interaction;
pub mod model;
pub mod palette;
pub mod persistence;
pub mod viewport;

use std::time::Instant;

use netmon_common::{EdgeKind, EditorConfig, Point, Result};

pub use collection::{LoadOutcome, LoadTicket, SaveRequest, TopologyManager};
pub use edge::{PathDescriptor, compute_cable_path, compute_edge_path};
pub use interaction::{
    CanvasEvent, Highlight, Interaction, InteractionConfig, KeyCommand, Modifiers, Mode, Outcome,
    PointerButton,
};
pub use model::{Edge, EdgeId, GraphModel, Node, NodeId};
pub use palette::{DropPipeline, PaletteEntry, available_devices, on_drop};
pub use viewport::Viewport;

/// One open canvas: the graph, its viewport and the interaction session.
#[derive(Debug, Clone)]
pub struct Canvas {
    graph: GraphModel,
    viewport: Viewport,
    interaction: Interaction,
}

/// An edge ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEdge {
    pub id: EdgeId,
    pub selected: bool,
    pub path: PathDescriptor,
}

impl Canvas {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            graph: GraphModel::new(),
            viewport: Viewport::from_config(config),
            interaction: Interaction::new(InteractionConfig::from(config)),
        }
    }

    pub fn graph(&self) -> &GraphModel {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut GraphModel {
        &mut self.graph
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    /// Feed one input event through the state machine.
    pub fn handle(&mut self, event: CanvasEvent, now: Instant) -> Outcome {
        self.interaction
            .handle(event, &mut self.graph, &mut self.viewport, now)
    }

    /// Expire transient feedback. Returns whether a redraw is needed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.interaction.tick(now)
    }

    pub fn set_connection_mode(&mut self, enabled: bool) {
        self.interaction.set_connection_mode(enabled);
    }

    /// Change the line type of every selected edge. Returns the ids that
    /// were changed, in selection order.
    pub fn set_selected_edge_kind(&mut self, kind: EdgeKind) -> Result<Vec<EdgeId>> {
        let ids: Vec<EdgeId> = self.interaction.selection().edges.iter().cloned().collect();
        for id in &ids {
            self.graph.set_edge_kind(id, kind)?;
        }
        if !ids.is_empty() {
            tracing::debug!(edges = ids.len(), kind = %kind, "Edge line type changed");
        }
        Ok(ids)
    }

    /// Whether any edge is selected, which enables the line-type selector.
    pub fn has_selected_edges(&self) -> bool {
        !self.interaction.selection().edges.is_empty()
    }

    /// Line type shared by all selected edges; `None` when nothing is
    /// selected or the kinds are mixed.
    pub fn selected_edge_kind(&self) -> Option<EdgeKind> {
        let mut kinds = self
            .interaction
            .selection()
            .edges
            .iter()
            .filter_map(|id| self.graph.edge(id))
            .map(|e| e.kind);
        let first = kinds.next()?;
        kinds.all(|k| k == first).then_some(first)
    }

    /// Swap in a freshly loaded graph; the viewport returns to identity and
    /// the session state is discarded.
    pub fn replace_graph(&mut self, graph: GraphModel) {
        self.graph = graph;
        self.viewport.reset();
        self.interaction.reset();
    }

    /// Empty graph, identity viewport.
    pub fn clear(&mut self) {
        self.replace_graph(GraphModel::new());
    }

    /// Re-validate session state after the graph changed outside the
    /// state machine.
    pub fn sync_interaction(&mut self) {
        self.interaction.retain_known(&self.graph);
    }

    /// Screen-space center of a node.
    pub fn node_anchor(&self, id: &str) -> Option<Point> {
        self.graph
            .node(id)
            .map(|n| self.viewport.graph_to_screen(n.position))
    }

    /// Node radius in screen pixels at the current zoom.
    pub fn screen_node_radius(&self) -> f64 {
        self.interaction.config().node_radius * self.viewport.zoom()
    }

    /// Paths of every edge at the current viewport.
    pub fn rendered_edges(&self) -> Vec<RenderedEdge> {
        let radius = self.screen_node_radius();
        self.graph
            .edges()
            .iter()
            .filter_map(|edge| {
                let source = self.node_anchor(&edge.source)?;
                let target = self.node_anchor(&edge.target)?;
                let selected = self.interaction.edge_selected(&edge.id);
                Some(RenderedEdge {
                    id: edge.id.clone(),
                    selected,
                    path: compute_edge_path(edge.kind, source, target, radius, selected),
                })
            })
            .collect()
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}
