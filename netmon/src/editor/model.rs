//! In-memory node/edge collections of the topology being edited.
//!
//! The model is a simple undirected graph stored with directed fields:
//! every edge keeps its `source`/`target` order for the arrowhead, but
//! duplicate detection treats `{source, target}` as an unordered pair.

use netmon_common::{DeviceId, DeviceRecord, DisplayData, EdgeKind, Error, Point, Result};

/// Identifier of a node, unique within a topology document.
pub type NodeId = String;

/// Identifier of an edge, unique within a topology document.
pub type EdgeId = String;

/// Generate a fresh node id (`node-<uuid>`).
pub fn new_node_id() -> NodeId {
    format!("node-{}", uuid::Uuid::new_v4())
}

/// Generate a fresh edge id (`edge-<uuid>`).
pub fn new_edge_id() -> EdgeId {
    format!("edge-{}", uuid::Uuid::new_v4())
}

/// A placed device icon.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    /// Inventory device; `None` only before a device is assigned.
    pub device_id: Option<DeviceId>,
    /// Position in graph space.
    pub position: Point,
    /// Snapshot rendered without a live device lookup.
    pub display: DisplayData,
}

impl Node {
    /// A node placed from a catalog record.
    pub fn from_device(device: &DeviceRecord, position: Point) -> Self {
        Self {
            id: new_node_id(),
            device_id: Some(device.id),
            position,
            display: device.display_data(),
        }
    }
}

/// A cable between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
}

impl Edge {
    /// Whether this edge joins `a` and `b`, in either direction.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }

    /// Whether `node` is one of the endpoints.
    pub fn touches(&self, node: &str) -> bool {
        self.source == node || self.target == node
    }
}

/// The live, mutable projection of one topology document.
///
/// Nodes are kept in insertion order, which is also the paint order: later
/// nodes are drawn on top and win hit tests.
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

/// Plain copy of the collections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Insert a node. Its id must not already be in use.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId> {
        if self.contains_node(&node.id) {
            return Err(Error::validation(format!("Duplicate node id {}", node.id)));
        }
        let id = node.id.clone();
        self.nodes.push(node);
        Ok(id)
    }

    /// Remove a node and every edge incident to it.
    ///
    /// Returns the removed node and the ids of the cascaded edges.
    pub fn remove_node(&mut self, id: &str) -> Result<(Node, Vec<EdgeId>)> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| Error::UnknownNode(id.to_string()))?;
        let node = self.nodes.remove(index);

        let mut removed = Vec::new();
        self.edges.retain(|edge| {
            if edge.touches(id) {
                removed.push(edge.id.clone());
                false
            } else {
                true
            }
        });

        Ok((node, removed))
    }

    pub fn move_node(&mut self, id: &str, position: Point) -> Result<()> {
        let node = self
            .node_mut(id)
            .ok_or_else(|| Error::UnknownNode(id.to_string()))?;
        node.position = position;
        Ok(())
    }

    /// Connect two nodes with a freshly identified edge.
    pub fn add_edge(&mut self, source: &str, target: &str, kind: EdgeKind) -> Result<EdgeId> {
        self.insert_edge(Edge {
            id: new_edge_id(),
            source: source.to_string(),
            target: target.to_string(),
            kind,
        })
    }

    /// Insert an edge that already carries its id (used when loading).
    ///
    /// Checks run in order: unknown endpoint, self-loop, duplicate pair,
    /// duplicate id. A rejected edge leaves the edge set untouched.
    pub fn insert_edge(&mut self, edge: Edge) -> Result<EdgeId> {
        for endpoint in [&edge.source, &edge.target] {
            if !self.contains_node(endpoint) {
                return Err(Error::UnknownNode(endpoint.clone()));
            }
        }
        if edge.source == edge.target {
            return Err(Error::SelfLoop(edge.source));
        }
        if self.edges.iter().any(|e| e.connects(&edge.source, &edge.target)) {
            return Err(Error::DuplicateEdge {
                source_id: edge.source,
                target_id: edge.target,
            });
        }
        if self.edge(&edge.id).is_some() {
            return Err(Error::validation(format!("Duplicate edge id {}", edge.id)));
        }

        let id = edge.id.clone();
        self.edges.push(edge);
        Ok(id)
    }

    pub fn remove_edge(&mut self, id: &str) -> Result<Edge> {
        let index = self
            .edges
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| Error::UnknownEdge(id.to_string()))?;
        Ok(self.edges.remove(index))
    }

    /// Change the line type of an edge.
    pub fn set_edge_kind(&mut self, id: &str, kind: EdgeKind) -> Result<()> {
        let edge = self
            .edges
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::UnknownEdge(id.to_string()))?;
        edge.kind = kind;
        Ok(())
    }

    /// Edges incident to `node`.
    pub fn edges_of<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.touches(node))
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Topmost node whose hit circle contains `point` (graph space).
    pub fn node_at(&self, point: Point, radius: f64) -> Option<&Node> {
        self.nodes
            .iter()
            .rev()
            .find(|n| n.position.distance(point) <= radius)
    }

    /// Number of nodes placed from `device`.
    pub fn placements(&self, device: DeviceId) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.device_id == Some(device))
            .count()
    }

    /// Refresh the snapshot of every node placed from `device`.
    ///
    /// Returns how many nodes changed.
    pub fn refresh_display_data(&mut self, device: &DeviceRecord) -> usize {
        let display = device.display_data();
        let mut changed = 0;
        for node in self.nodes.iter_mut() {
            if node.device_id == Some(device.id) && node.display != display {
                node.display = display.clone();
                changed += 1;
            }
        }
        changed
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }
}

/// Structural equality: same node ids with the same positions and device
/// references, same edge ids with the same endpoint pairs. Insertion order
/// is not significant.
impl PartialEq for GraphModel {
    fn eq(&self, other: &Self) -> bool {
        if self.nodes.len() != other.nodes.len() || self.edges.len() != other.edges.len() {
            return false;
        }
        let nodes_match = self.nodes.iter().all(|node| {
            other.node(&node.id).is_some_and(|o| {
                o.position == node.position
                    && o.device_id == node.device_id
                    && o.display == node.display
            })
        });
        let edges_match = self.edges.iter().all(|edge| {
            other.edge(&edge.id).is_some_and(|o| {
                o.source == edge.source && o.target == edge.target && o.kind == edge.kind
            })
        });
        nodes_match && edges_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, x: f64, y: f64) -> Node {
        Node {
            id: id.to_string(),
            device_id: Some(1),
            position: Point::new(x, y),
            display: DisplayData::default(),
        }
    }

    fn graph_with(ids: &[&str]) -> GraphModel {
        let mut graph = GraphModel::new();
        for (i, id) in ids.iter().enumerate() {
            graph.add_node(node(id, i as f64 * 100.0, 0.0)).unwrap();
        }
        graph
    }

    #[test]
    fn test_generated_ids_are_prefixed_and_unique() {
        let a = new_node_id();
        let b = new_node_id();
        assert!(a.starts_with("node-"));
        assert_ne!(a, b);
        assert!(new_edge_id().starts_with("edge-"));
    }

    #[test]
    fn test_add_node_rejects_duplicate_id() {
        let mut graph = graph_with(&["a"]);
        assert!(graph.add_node(node("a", 5.0, 5.0)).is_err());
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_same_device_can_be_placed_twice() {
        let mut graph = GraphModel::new();
        let device = DeviceRecord {
            id: 7,
            name: "core-sw".to_string(),
            ip_address: "10.0.0.1".to_string(),
            category: "switches".to_string(),
            status: "online".to_string(),
            brand: String::new(),
            model: String::new(),
        };
        graph.add_node(Node::from_device(&device, Point::ORIGIN)).unwrap();
        graph
            .add_node(Node::from_device(&device, Point::new(50.0, 0.0)))
            .unwrap();
        assert_eq!(graph.placements(7), 2);
    }

    #[test]
    fn test_no_duplicate_edges_in_either_direction() {
        let mut graph = graph_with(&["a", "b", "c"]);
        graph.add_edge("a", "b", EdgeKind::Cable).unwrap();

        let forward = graph.add_edge("a", "b", EdgeKind::Cable);
        let backward = graph.add_edge("b", "a", EdgeKind::Straight);
        assert!(matches!(forward, Err(Error::DuplicateEdge { .. })));
        assert!(matches!(backward, Err(Error::DuplicateEdge { .. })));
        assert_eq!(graph.edge_count(), 1);

        graph.add_edge("c", "b", EdgeKind::Cable).unwrap();
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_self_loop_rejected_without_mutation() {
        let mut graph = graph_with(&["a"]);
        let result = graph.add_edge("a", "a", EdgeKind::Cable);
        assert!(matches!(result, Err(Error::SelfLoop(_))));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_unknown_endpoint_rejected() {
        let mut graph = graph_with(&["a"]);
        let result = graph.add_edge("a", "ghost", EdgeKind::Cable);
        assert!(matches!(result, Err(Error::UnknownNode(id)) if id == "ghost"));
    }

    #[test]
    fn test_remove_node_cascades_only_incident_edges() {
        let mut graph = graph_with(&["a", "b", "c", "d"]);
        let ab = graph.add_edge("a", "b", EdgeKind::Cable).unwrap();
        let ca = graph.add_edge("c", "a", EdgeKind::Cable).unwrap();
        let cd = graph.add_edge("c", "d", EdgeKind::Cable).unwrap();

        let (removed, cascaded) = graph.remove_node("a").unwrap();
        assert_eq!(removed.id, "a");
        assert_eq!(cascaded.len(), 2);
        assert!(cascaded.contains(&ab));
        assert!(cascaded.contains(&ca));
        assert!(graph.edge(&cd).is_some());
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_move_and_set_kind() {
        let mut graph = graph_with(&["a", "b"]);
        graph.move_node("a", Point::new(-12.5, 40.0)).unwrap();
        assert_eq!(graph.node("a").unwrap().position, Point::new(-12.5, 40.0));
        assert!(graph.move_node("zz", Point::ORIGIN).is_err());

        let id = graph.add_edge("a", "b", EdgeKind::Cable).unwrap();
        graph.set_edge_kind(&id, EdgeKind::Step).unwrap();
        assert_eq!(graph.edge(&id).unwrap().kind, EdgeKind::Step);
        assert!(matches!(
            graph.set_edge_kind("nope", EdgeKind::Step),
            Err(Error::UnknownEdge(_))
        ));
    }

    #[test]
    fn test_node_at_prefers_topmost() {
        let mut graph = GraphModel::new();
        graph.add_node(node("under", 0.0, 0.0)).unwrap();
        graph.add_node(node("over", 10.0, 0.0)).unwrap();

        assert_eq!(graph.node_at(Point::new(5.0, 0.0), 28.0).unwrap().id, "over");
        assert_eq!(graph.node_at(Point::new(-20.0, 0.0), 28.0).unwrap().id, "under");
        assert!(graph.node_at(Point::new(200.0, 0.0), 28.0).is_none());
    }

    #[test]
    fn test_refresh_display_data() {
        let mut graph = graph_with(&["a", "b"]);
        let mut device = DeviceRecord {
            id: 1,
            name: "renamed".to_string(),
            ip_address: String::new(),
            category: String::new(),
            status: "offline".to_string(),
            brand: String::new(),
            model: String::new(),
        };
        assert_eq!(graph.refresh_display_data(&device), 2);
        assert_eq!(graph.node("b").unwrap().display.name, "renamed");

        assert_eq!(graph.refresh_display_data(&device), 0);
        device.id = 99;
        assert_eq!(graph.refresh_display_data(&device), 0);
    }

    #[test]
    fn test_equality_ignores_order() {
        let mut left = GraphModel::new();
        left.add_node(node("a", 1.0, 2.0)).unwrap();
        left.add_node(node("b", 3.0, 4.0)).unwrap();

        let mut right = GraphModel::new();
        right.add_node(node("b", 3.0, 4.0)).unwrap();
        right.add_node(node("a", 1.0, 2.0)).unwrap();
        assert_eq!(left, right);

        right.move_node("a", Point::new(1.0, 2.5)).unwrap();
        assert_ne!(left, right);
    }
}
