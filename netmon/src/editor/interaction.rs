//! Pointer and keyboard state machine of the topology canvas.
//!
//! The machine owns the ephemeral session state (mode, connection toggle,
//! selection) and turns [`CanvasEvent`]s into mutations of the graph and
//! viewport it is handed. It never touches persistence.
//!
//! Highlighting is derived: [`Interaction::node_highlight`] computes it from
//! the current mode and selection, nothing is written onto the nodes.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use netmon_common::{EdgeKind, EditorConfig, Error, Point};

use super::edge::compute_edge_path;
use super::model::{EdgeId, GraphModel, NodeId};
use super::viewport::Viewport;

/// Pointer button, as far as the canvas cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
}

/// Modifier keys held during a pointer press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Ctrl/Cmd: toggle selection membership.
    pub multi: bool,
    /// Shift: pan even when the press lands on a node or edge.
    pub pan: bool,
}

/// Keyboard commands understood by the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyCommand {
    /// Delete or Backspace.
    Delete,
    Escape,
    /// Ctrl+A.
    SelectAll,
    ZoomIn { anchor: Point },
    ZoomOut { anchor: Point },
    ResetView,
    ToggleConnectionMode,
}

/// Input delivered to the canvas. Positions are screen coordinates relative
/// to the canvas origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasEvent {
    PointerDown {
        position: Point,
        button: PointerButton,
        modifiers: Modifiers,
    },
    PointerMove {
        position: Point,
    },
    PointerUp {
        position: Point,
    },
    /// Wheel movement in lines; positive zooms in.
    Wheel {
        lines: f64,
        position: Point,
    },
    Key(KeyCommand),
}

/// Result of a connection attempt, shown briefly on both nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    Connected(EdgeId),
    Rejected,
}

/// Current mode of the session.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Mode {
    #[default]
    Idle,
    /// A node follows the pointer, keeping the grab offset.
    DraggingNode {
        node_id: NodeId,
        offset: Point,
        moved: bool,
    },
    /// The viewport follows the pointer; `anchor` is the last pointer position.
    PanningViewport { anchor: Point },
    /// First node of a connection has been picked.
    ConnectPending { first: NodeId },
    /// Transient highlight after a connection attempt.
    ConnectionFeedback {
        nodes: [NodeId; 2],
        feedback: Feedback,
        expires_at: Instant,
    },
}

/// Derived highlight of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    None,
    Selected,
    PendingSource,
    Connected,
    Rejected,
}

/// What an event did, so the host knows whether to redraw or persist.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing changed.
    Ignored,
    /// Session state, selection or viewport changed.
    Updated,
    /// A node moved during a drag.
    Moved(NodeId),
    /// A drag ended; the node's final position.
    Committed { node: NodeId, position: Point },
    Connected(EdgeId),
    /// A connection was refused (duplicate pair); recovered locally.
    Rejected,
    /// Selected items were deleted; `edges` includes cascaded edges.
    Removed {
        nodes: Vec<NodeId>,
        edges: Vec<EdgeId>,
    },
}

impl Outcome {
    /// Whether the graph itself changed.
    pub fn mutates_graph(&self) -> bool {
        matches!(
            self,
            Outcome::Moved(_) | Outcome::Committed { .. } | Outcome::Connected(_) | Outcome::Removed { .. }
        )
    }
}

/// What lies under a screen point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hit {
    Node(NodeId),
    Edge(EdgeId),
    Empty,
}

/// Selected node and edge ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub nodes: BTreeSet<NodeId>,
    pub edges: BTreeSet<EdgeId>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len() + self.edges.len()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }
}

/// Tunables of the state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionConfig {
    /// Node hit radius in graph units.
    pub node_radius: f64,
    /// Edge hit distance in screen pixels.
    pub edge_hit_tolerance: f64,
    /// Lifetime of connection feedback.
    pub feedback: Duration,
    /// Zoom factor per wheel line or key press.
    pub zoom_step: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self::from(&EditorConfig::default())
    }
}

impl From<&EditorConfig> for InteractionConfig {
    fn from(config: &EditorConfig) -> Self {
        Self {
            node_radius: config.node_radius,
            edge_hit_tolerance: config.edge_hit_tolerance,
            feedback: Duration::from_millis(config.feedback_millis),
            zoom_step: config.wheel_zoom_step,
        }
    }
}

/// Interaction session state of one open canvas.
#[derive(Debug, Clone, Default)]
pub struct Interaction {
    mode: Mode,
    connection_mode: bool,
    selection: Selection,
    config: InteractionConfig,
}

impl Interaction {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn connection_mode(&self) -> bool {
        self.connection_mode
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn pending_source(&self) -> Option<&NodeId> {
        match &self.mode {
            Mode::ConnectPending { first } => Some(first),
            _ => None,
        }
    }

    /// Whether a pointer gesture (drag or pan) is in progress.
    pub fn is_grabbing(&self) -> bool {
        matches!(
            self.mode,
            Mode::DraggingNode { .. } | Mode::PanningViewport { .. }
        )
    }

    /// Whether a feedback highlight is waiting to expire.
    pub fn has_feedback(&self) -> bool {
        matches!(self.mode, Mode::ConnectionFeedback { .. })
    }

    /// Turn connection mode on or off.
    ///
    /// Any pending first pick and any feedback highlight are dropped.
    pub fn set_connection_mode(&mut self, enabled: bool) {
        self.connection_mode = enabled;
        if matches!(
            self.mode,
            Mode::ConnectPending { .. } | Mode::ConnectionFeedback { .. }
        ) {
            self.mode = Mode::Idle;
        }
        tracing::debug!(enabled, "Connection mode toggled");
    }

    /// Forget everything; used when a different document is loaded.
    pub fn reset(&mut self) {
        self.mode = Mode::Idle;
        self.selection.clear();
    }

    /// Drop selection entries and mode references to ids no longer in `graph`.
    pub fn retain_known(&mut self, graph: &GraphModel) {
        self.selection.nodes.retain(|id| graph.contains_node(id));
        self.selection.edges.retain(|id| graph.edge(id).is_some());

        let stale = match &self.mode {
            Mode::DraggingNode { node_id, .. } => !graph.contains_node(node_id),
            Mode::ConnectPending { first } => !graph.contains_node(first),
            Mode::ConnectionFeedback { nodes, .. } => {
                nodes.iter().any(|id| !graph.contains_node(id))
            }
            Mode::Idle | Mode::PanningViewport { .. } => false,
        };
        if stale {
            self.mode = Mode::Idle;
        }
    }

    pub fn node_highlight(&self, id: &str) -> Highlight {
        match &self.mode {
            Mode::ConnectPending { first } if first == id => return Highlight::PendingSource,
            Mode::ConnectionFeedback {
                nodes, feedback, ..
            } if nodes.iter().any(|n| n == id) => {
                return match feedback {
                    Feedback::Connected(_) => Highlight::Connected,
                    Feedback::Rejected => Highlight::Rejected,
                };
            }
            _ => {}
        }
        if self.selection.nodes.contains(id) {
            Highlight::Selected
        } else {
            Highlight::None
        }
    }

    pub fn edge_selected(&self, id: &str) -> bool {
        self.selection.edges.contains(id)
    }

    /// Expire feedback whose deadline has passed. Returns whether anything
    /// changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match &self.mode {
            Mode::ConnectionFeedback { expires_at, .. } if now >= *expires_at => {
                self.mode = Mode::Idle;
                true
            }
            _ => false,
        }
    }

    /// What lies under `position` (screen space).
    ///
    /// Nodes win over edges; among nodes the topmost wins.
    pub fn hit_test(&self, position: Point, graph: &GraphModel, viewport: &Viewport) -> Hit {
        let graph_point = viewport.screen_to_graph(position);
        if let Some(node) = graph.node_at(graph_point, self.config.node_radius) {
            return Hit::Node(node.id.clone());
        }

        let radius = self.config.node_radius * viewport.zoom();
        for edge in graph.edges().iter().rev() {
            let (Some(source), Some(target)) = (graph.node(&edge.source), graph.node(&edge.target))
            else {
                continue;
            };
            let path = compute_edge_path(
                edge.kind,
                viewport.graph_to_screen(source.position),
                viewport.graph_to_screen(target.position),
                radius,
                false,
            );
            if path.distance_to(position) <= self.config.edge_hit_tolerance {
                return Hit::Edge(edge.id.clone());
            }
        }

        Hit::Empty
    }

    /// Dispatch one event.
    pub fn handle(
        &mut self,
        event: CanvasEvent,
        graph: &mut GraphModel,
        viewport: &mut Viewport,
        now: Instant,
    ) -> Outcome {
        match event {
            CanvasEvent::PointerDown {
                position,
                button,
                modifiers,
            } => self.pointer_down(position, button, modifiers, graph, viewport, now),
            CanvasEvent::PointerMove { position } => self.pointer_move(position, graph, viewport),
            CanvasEvent::PointerUp { .. } => self.pointer_up(graph),
            CanvasEvent::Wheel { lines, position } => {
                if lines == 0.0 || !lines.is_finite() {
                    return Outcome::Ignored;
                }
                viewport.zoom_by(self.config.zoom_step.powf(lines), position);
                Outcome::Updated
            }
            CanvasEvent::Key(command) => self.key(command, graph, viewport),
        }
    }

    fn pointer_down(
        &mut self,
        position: Point,
        button: PointerButton,
        modifiers: Modifiers,
        graph: &mut GraphModel,
        viewport: &Viewport,
        now: Instant,
    ) -> Outcome {
        if self.is_grabbing() {
            return Outcome::Ignored;
        }
        // A new click supersedes a feedback flash still on screen.
        if self.has_feedback() {
            self.mode = Mode::Idle;
        }

        let hit = if button == PointerButton::Middle || modifiers.pan {
            Hit::Empty
        } else {
            self.hit_test(position, graph, viewport)
        };

        match hit {
            Hit::Node(id) if self.connection_mode => self.pick_for_connection(id, graph, now),
            Hit::Node(id) => {
                self.select(Some(&id), None, modifiers.multi);
                let Some(node) = graph.node(&id) else {
                    return Outcome::Updated;
                };
                let offset = node.position - viewport.screen_to_graph(position);
                tracing::debug!(node = %id, "Drag started");
                self.mode = Mode::DraggingNode {
                    node_id: id,
                    offset,
                    moved: false,
                };
                Outcome::Updated
            }
            Hit::Edge(id) => {
                self.cancel_pending();
                self.select(None, Some(&id), modifiers.multi);
                Outcome::Updated
            }
            Hit::Empty => {
                self.cancel_pending();
                if !modifiers.multi && button == PointerButton::Primary && !modifiers.pan {
                    self.selection.clear();
                }
                self.mode = Mode::PanningViewport { anchor: position };
                Outcome::Updated
            }
        }
    }

    fn pick_for_connection(&mut self, id: NodeId, graph: &mut GraphModel, now: Instant) -> Outcome {
        let first = match &self.mode {
            Mode::ConnectPending { first } => first.clone(),
            _ => {
                tracing::debug!(node = %id, "Connection source picked");
                self.mode = Mode::ConnectPending { first: id };
                return Outcome::Updated;
            }
        };

        if first == id {
            tracing::debug!(node = %id, "Connection cancelled");
            self.mode = Mode::Idle;
            return Outcome::Updated;
        }

        let expires_at = now + self.config.feedback;
        match graph.add_edge(&first, &id, EdgeKind::default()) {
            Ok(edge) => {
                tracing::debug!(source = %first, target = %id, edge = %edge, "Nodes connected");
                self.mode = Mode::ConnectionFeedback {
                    nodes: [first, id],
                    feedback: Feedback::Connected(edge.clone()),
                    expires_at,
                };
                Outcome::Connected(edge)
            }
            Err(e @ (Error::DuplicateEdge { .. } | Error::SelfLoop(_))) => {
                tracing::debug!(error = %e, "Connection rejected");
                self.mode = Mode::ConnectionFeedback {
                    nodes: [first, id],
                    feedback: Feedback::Rejected,
                    expires_at,
                };
                Outcome::Rejected
            }
            Err(e) => {
                tracing::warn!(error = %e, "Connection failed");
                self.mode = Mode::Idle;
                Outcome::Updated
            }
        }
    }

    fn pointer_move(
        &mut self,
        position: Point,
        graph: &mut GraphModel,
        viewport: &mut Viewport,
    ) -> Outcome {
        match &mut self.mode {
            Mode::DraggingNode {
                node_id,
                offset,
                moved,
            } => {
                let target = viewport.screen_to_graph(position) + *offset;
                match graph.move_node(node_id, target) {
                    Ok(()) => {
                        *moved = true;
                        Outcome::Moved(node_id.clone())
                    }
                    Err(_) => {
                        self.mode = Mode::Idle;
                        Outcome::Updated
                    }
                }
            }
            Mode::PanningViewport { anchor } => {
                let delta = position - *anchor;
                *anchor = position;
                if delta == Point::ORIGIN {
                    return Outcome::Ignored;
                }
                viewport.pan_by(delta);
                Outcome::Updated
            }
            _ => Outcome::Ignored,
        }
    }

    fn pointer_up(&mut self, graph: &GraphModel) -> Outcome {
        match std::mem::take(&mut self.mode) {
            Mode::DraggingNode { node_id, moved, .. } => match graph.node(&node_id) {
                Some(node) if moved => {
                    tracing::debug!(node = %node_id, position = %node.position, "Drag committed");
                    Outcome::Committed {
                        position: node.position,
                        node: node_id,
                    }
                }
                _ => Outcome::Updated,
            },
            Mode::PanningViewport { .. } => Outcome::Updated,
            other => {
                self.mode = other;
                Outcome::Ignored
            }
        }
    }

    fn key(&mut self, command: KeyCommand, graph: &mut GraphModel, viewport: &mut Viewport) -> Outcome {
        match command {
            KeyCommand::Delete => self.delete_selection(graph),
            KeyCommand::Escape => {
                let had_selection = !self.selection.is_empty();
                let had_pending = self.cancel_pending();
                self.selection.clear();
                if had_selection || had_pending {
                    Outcome::Updated
                } else {
                    Outcome::Ignored
                }
            }
            KeyCommand::SelectAll => {
                self.selection.nodes = graph.nodes().iter().map(|n| n.id.clone()).collect();
                self.selection.edges = graph.edges().iter().map(|e| e.id.clone()).collect();
                Outcome::Updated
            }
            KeyCommand::ZoomIn { anchor } => {
                viewport.zoom_by(self.config.zoom_step, anchor);
                Outcome::Updated
            }
            KeyCommand::ZoomOut { anchor } => {
                viewport.zoom_by(1.0 / self.config.zoom_step, anchor);
                Outcome::Updated
            }
            KeyCommand::ResetView => {
                viewport.reset();
                Outcome::Updated
            }
            KeyCommand::ToggleConnectionMode => {
                self.set_connection_mode(!self.connection_mode);
                Outcome::Updated
            }
        }
    }

    /// Remove selected edges first, then selected nodes (cascading).
    fn delete_selection(&mut self, graph: &mut GraphModel) -> Outcome {
        if self.selection.is_empty() || self.is_grabbing() {
            return Outcome::Ignored;
        }
        let selection = std::mem::take(&mut self.selection);

        let mut edges: Vec<EdgeId> = selection
            .edges
            .into_iter()
            .filter(|id| graph.remove_edge(id).is_ok())
            .collect();
        let mut nodes = Vec::new();
        for id in selection.nodes {
            if let Ok((_, cascaded)) = graph.remove_node(&id) {
                edges.extend(cascaded);
                nodes.push(id);
            }
        }

        self.retain_known(graph);
        tracing::debug!(nodes = nodes.len(), edges = edges.len(), "Selection deleted");
        Outcome::Removed { nodes, edges }
    }

    /// Drop a pending first pick or a feedback flash. Returns whether one
    /// was active.
    fn cancel_pending(&mut self) -> bool {
        if matches!(
            self.mode,
            Mode::ConnectPending { .. } | Mode::ConnectionFeedback { .. }
        ) {
            self.mode = Mode::Idle;
            true
        } else {
            false
        }
    }

    fn select(&mut self, node: Option<&NodeId>, edge: Option<&EdgeId>, toggle: bool) {
        if toggle {
            if let Some(id) = node
                && !self.selection.nodes.remove(id)
            {
                self.selection.nodes.insert(id.clone());
            }
            if let Some(id) = edge
                && !self.selection.edges.remove(id)
            {
                self.selection.edges.insert(id.clone());
            }
            return;
        }

        // A plain press on an already selected node keeps a multi-selection
        // so the group can be deleted after a drag.
        if let Some(id) = node
            && self.selection.nodes.contains(id)
        {
            return;
        }
        self.selection.clear();
        if let Some(id) = node {
            self.selection.nodes.insert(id.clone());
        }
        if let Some(id) = edge {
            self.selection.edges.insert(id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::model::Node;
    use netmon_common::DisplayData;

    struct Harness {
        graph: GraphModel,
        viewport: Viewport,
        interaction: Interaction,
        now: Instant,
    }

    impl Harness {
        fn new() -> Self {
            let mut graph = GraphModel::new();
            for (id, x, y) in [("a", 100.0, 100.0), ("b", 300.0, 100.0), ("c", 300.0, 300.0)] {
                graph
                    .add_node(Node {
                        id: id.to_string(),
                        device_id: Some(1),
                        position: Point::new(x, y),
                        display: DisplayData::default(),
                    })
                    .unwrap();
            }
            Self {
                graph,
                viewport: Viewport::default(),
                interaction: Interaction::default(),
                now: Instant::now(),
            }
        }

        fn send(&mut self, event: CanvasEvent) -> Outcome {
            self.interaction
                .handle(event, &mut self.graph, &mut self.viewport, self.now)
        }

        fn press(&mut self, x: f64, y: f64) -> Outcome {
            self.press_with(x, y, Modifiers::default())
        }

        fn press_with(&mut self, x: f64, y: f64, modifiers: Modifiers) -> Outcome {
            self.send(CanvasEvent::PointerDown {
                position: Point::new(x, y),
                button: PointerButton::Primary,
                modifiers,
            })
        }

        fn click(&mut self, x: f64, y: f64) -> Outcome {
            let outcome = self.press(x, y);
            self.send(CanvasEvent::PointerUp {
                position: Point::new(x, y),
            });
            outcome
        }

        fn drag_to(&mut self, x: f64, y: f64) -> Outcome {
            self.send(CanvasEvent::PointerMove {
                position: Point::new(x, y),
            })
        }

        fn release(&mut self, x: f64, y: f64) -> Outcome {
            self.send(CanvasEvent::PointerUp {
                position: Point::new(x, y),
            })
        }

        fn key(&mut self, command: KeyCommand) -> Outcome {
            self.send(CanvasEvent::Key(command))
        }
    }

    #[test]
    fn test_drag_keeps_grab_offset() {
        let mut h = Harness::new();
        h.press(110.0, 95.0);
        assert!(matches!(h.interaction.mode(), Mode::DraggingNode { .. }));

        assert_eq!(h.drag_to(160.0, 145.0), Outcome::Moved("a".to_string()));
        assert_eq!(h.graph.node("a").unwrap().position, Point::new(150.0, 150.0));

        let outcome = h.release(160.0, 145.0);
        assert_eq!(
            outcome,
            Outcome::Committed {
                node: "a".to_string(),
                position: Point::new(150.0, 150.0)
            }
        );
        assert_eq!(h.interaction.mode(), &Mode::Idle);
    }

    #[test]
    fn test_drag_respects_zoom_and_pan() {
        let mut h = Harness::new();
        h.viewport.set(2.0, Point::new(50.0, 50.0));
        // a at (100,100) is at screen (250,250)
        h.press(250.0, 250.0);
        h.drag_to(350.0, 250.0);
        h.release(350.0, 250.0);
        assert_eq!(h.graph.node("a").unwrap().position, Point::new(150.0, 100.0));
    }

    #[test]
    fn test_click_without_move_does_not_commit() {
        let mut h = Harness::new();
        assert_eq!(h.press(100.0, 100.0), Outcome::Updated);
        assert_eq!(h.release(100.0, 100.0), Outcome::Updated);
        assert_eq!(h.interaction.node_highlight("a"), Highlight::Selected);
    }

    #[test]
    fn test_pan_on_empty_canvas() {
        let mut h = Harness::new();
        h.press(600.0, 600.0);
        assert!(matches!(h.interaction.mode(), Mode::PanningViewport { .. }));
        h.drag_to(620.0, 590.0);
        h.drag_to(630.0, 600.0);
        h.release(630.0, 600.0);
        assert_eq!(h.viewport.pan(), Point::new(30.0, 0.0));
        assert_eq!(h.graph.node("a").unwrap().position, Point::new(100.0, 100.0));
    }

    #[test]
    fn test_pan_modifier_over_node() {
        let mut h = Harness::new();
        h.press_with(
            100.0,
            100.0,
            Modifiers {
                pan: true,
                ..Modifiers::default()
            },
        );
        h.drag_to(110.0, 100.0);
        h.release(110.0, 100.0);
        assert_eq!(h.viewport.pan(), Point::new(10.0, 0.0));
        assert_eq!(h.graph.node("a").unwrap().position, Point::new(100.0, 100.0));
    }

    #[test]
    fn test_two_click_connection() {
        let mut h = Harness::new();
        h.key(KeyCommand::ToggleConnectionMode);

        h.click(100.0, 100.0);
        assert_eq!(h.interaction.pending_source(), Some(&"a".to_string()));
        assert_eq!(h.interaction.node_highlight("a"), Highlight::PendingSource);

        let outcome = h.click(300.0, 100.0);
        assert!(matches!(outcome, Outcome::Connected(_)));
        assert_eq!(h.graph.edge_count(), 1);
        assert!(h.graph.edges()[0].connects("a", "b"));
        assert_eq!(h.interaction.node_highlight("a"), Highlight::Connected);
        assert_eq!(h.interaction.node_highlight("b"), Highlight::Connected);
        // Nodes do not move in connection mode.
        assert_eq!(h.graph.node("a").unwrap().position, Point::new(100.0, 100.0));
    }

    #[test]
    fn test_duplicate_connection_flashes_and_resets() {
        let mut h = Harness::new();
        h.graph.add_edge("b", "a", EdgeKind::Cable).unwrap();
        h.interaction.set_connection_mode(true);

        h.click(100.0, 100.0);
        assert_eq!(h.click(300.0, 100.0), Outcome::Rejected);
        assert_eq!(h.graph.edge_count(), 1);
        assert_eq!(h.interaction.node_highlight("b"), Highlight::Rejected);

        assert!(!h.interaction.tick(h.now + Duration::from_millis(100)));
        assert!(h.interaction.tick(h.now + Duration::from_millis(500)));
        assert_eq!(h.interaction.mode(), &Mode::Idle);
        assert_eq!(h.interaction.node_highlight("b"), Highlight::None);
    }

    #[test]
    fn test_same_node_cancels_pending() {
        let mut h = Harness::new();
        h.interaction.set_connection_mode(true);
        h.click(100.0, 100.0);
        h.click(100.0, 100.0);
        assert_eq!(h.interaction.mode(), &Mode::Idle);
        assert_eq!(h.graph.edge_count(), 0);
    }

    #[test]
    fn test_empty_click_cancels_pending() {
        let mut h = Harness::new();
        h.interaction.set_connection_mode(true);
        h.click(100.0, 100.0);
        h.click(700.0, 700.0);
        assert!(h.interaction.pending_source().is_none());
        assert_eq!(h.graph.edge_count(), 0);
    }

    #[test]
    fn test_toggling_connection_mode_clears_pending() {
        let mut h = Harness::new();
        h.interaction.set_connection_mode(true);
        h.click(100.0, 100.0);
        h.key(KeyCommand::ToggleConnectionMode);
        assert!(!h.interaction.connection_mode());
        assert_eq!(h.interaction.mode(), &Mode::Idle);
        assert_eq!(h.interaction.node_highlight("a"), Highlight::None);
        assert_eq!(h.graph.edge_count(), 0);
    }

    #[test]
    fn test_edge_hit_and_delete() {
        let mut h = Harness::new();
        let ab = h.graph.add_edge("a", "b", EdgeKind::Cable).unwrap();
        h.graph.add_edge("b", "c", EdgeKind::Cable).unwrap();

        // Midpoint of a-b, 3px off the line.
        h.click(200.0, 103.0);
        assert!(h.interaction.edge_selected(&ab));
        assert_eq!(h.interaction.selection().edges.len(), 1);
        assert!(h.interaction.selection().nodes.is_empty());

        let outcome = h.key(KeyCommand::Delete);
        assert_eq!(
            outcome,
            Outcome::Removed {
                nodes: vec![],
                edges: vec![ab]
            }
        );
        assert_eq!(h.graph.edge_count(), 1);
        assert_eq!(h.graph.node_count(), 3);
    }

    #[test]
    fn test_delete_node_cascades() {
        let mut h = Harness::new();
        h.graph.add_edge("a", "b", EdgeKind::Cable).unwrap();
        h.click(100.0, 100.0);

        let Outcome::Removed { nodes, edges } = h.key(KeyCommand::Delete) else {
            panic!("expected removal");
        };
        assert_eq!(nodes, vec!["a".to_string()]);
        assert_eq!(edges.len(), 1);
        assert!(h.graph.contains_node("b"));
        assert_eq!(h.graph.edge_count(), 0);
        assert!(h.interaction.selection().is_empty());
    }

    #[test]
    fn test_multi_select_toggles() {
        let mut h = Harness::new();
        let multi = Modifiers {
            multi: true,
            ..Modifiers::default()
        };
        h.click(100.0, 100.0);
        h.press_with(300.0, 100.0, multi);
        h.release(300.0, 100.0);
        assert_eq!(h.interaction.selection().nodes.len(), 2);

        h.press_with(100.0, 100.0, multi);
        h.release(100.0, 100.0);
        assert_eq!(h.interaction.selection().nodes.len(), 1);
        assert_eq!(h.interaction.node_highlight("b"), Highlight::Selected);

        h.click(700.0, 700.0);
        assert!(h.interaction.selection().is_empty());
    }

    #[test]
    fn test_select_all_and_escape() {
        let mut h = Harness::new();
        h.graph.add_edge("a", "c", EdgeKind::Cable).unwrap();
        h.key(KeyCommand::SelectAll);
        assert_eq!(h.interaction.selection().len(), 4);

        assert_eq!(h.key(KeyCommand::Escape), Outcome::Updated);
        assert!(h.interaction.selection().is_empty());
        assert_eq!(h.key(KeyCommand::Escape), Outcome::Ignored);
    }

    #[test]
    fn test_wheel_zooms_toward_cursor() {
        let mut h = Harness::new();
        let anchor = Point::new(320.0, 240.0);
        let before = h.viewport.screen_to_graph(anchor);
        h.send(CanvasEvent::Wheel {
            lines: 2.0,
            position: anchor,
        });
        assert!((h.viewport.zoom() - 1.21).abs() < 1e-9);
        assert!(h.viewport.screen_to_graph(anchor).approx_eq(before, 1e-6));
    }

    #[test]
    fn test_keyboard_zoom_and_reset() {
        let mut h = Harness::new();
        let anchor = Point::new(400.0, 300.0);
        h.key(KeyCommand::ZoomIn { anchor });
        h.key(KeyCommand::ZoomIn { anchor });
        h.key(KeyCommand::ZoomOut { anchor });
        assert!((h.viewport.zoom() - 1.1).abs() < 1e-9);
        h.key(KeyCommand::ResetView);
        assert!(h.viewport.is_identity());
    }

    #[test]
    fn test_topmost_node_wins() {
        let mut h = Harness::new();
        h.graph
            .add_node(Node {
                id: "top".to_string(),
                device_id: None,
                position: Point::new(110.0, 100.0),
                display: DisplayData::default(),
            })
            .unwrap();
        assert_eq!(
            h.interaction
                .hit_test(Point::new(105.0, 100.0), &h.graph, &h.viewport),
            Hit::Node("top".to_string())
        );
    }

    #[test]
    fn test_retain_known_drops_stale_pending() {
        let mut h = Harness::new();
        h.interaction.set_connection_mode(true);
        h.click(100.0, 100.0);
        h.graph.remove_node("a").unwrap();
        h.interaction.retain_known(&h.graph);
        assert_eq!(h.interaction.mode(), &Mode::Idle);
    }
}
