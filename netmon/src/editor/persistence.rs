//! Conversion between the graph model and the stored canvas document.
//!
//! The storage payload carries the graph twice: `canvas_data` for rendering
//! and a `devices` array with the authoritative `(device, node, position)`
//! linkage. Both are written from the same model so they agree after a
//! round trip. When loading, the `devices` rows win.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use netmon_common::document::DEVICE_NODE_TYPE;
use netmon_common::{
    CanvasDocument, CanvasEdge, CanvasNode, DeviceLink, Error, ExportDocument, NodeData,
    PlacedDevice, Result, TopologyPayload, TopologyRecord,
};

use super::edge::stored_style;
use super::model::{Edge, GraphModel, Node};

/// A graph encoded for the storage service.
#[derive(Debug, Clone, PartialEq)]
pub struct Serialized {
    pub canvas: CanvasDocument,
    pub devices: Vec<DeviceLink>,
}

impl Serialized {
    /// Full-replace payload for `POST`/`PUT topologies`.
    pub fn into_payload(self, name: &str, description: &str) -> TopologyPayload {
        TopologyPayload {
            branch_id: None,
            name: name.to_string(),
            description: description.to_string(),
            canvas_data: Some(self.canvas),
            devices: Some(self.devices),
        }
    }
}

/// A decoded graph plus whatever had to be rejected on the way.
#[derive(Debug, Clone, Default)]
pub struct Decoded {
    pub graph: GraphModel,
    pub issues: Vec<String>,
}

impl Decoded {
    /// The rejected parts as a `CorruptDocument` warning, if any.
    pub fn warning(&self) -> Option<Error> {
        (!self.issues.is_empty()).then(|| Error::CorruptDocument {
            issues: self.issues.clone(),
        })
    }
}

/// An imported export file.
#[derive(Debug, Clone)]
pub struct Imported {
    pub name: String,
    pub description: Option<String>,
    pub decoded: Decoded,
}

/// Encode the whole graph.
///
/// Nodes without a device stay in `canvas_data` but get no `devices` row.
pub fn serialize(graph: &GraphModel) -> Serialized {
    let canvas = canvas_document(graph);
    let devices = graph
        .nodes()
        .iter()
        .filter_map(|node| {
            node.device_id.map(|device_id| DeviceLink {
                device_id,
                node_id: node.id.clone(),
                position_x: node.position.x,
                position_y: node.position.y,
                node_data: Some(node_data(node)),
            })
        })
        .collect();

    Serialized { canvas, devices }
}

/// Encode the graph as a full-replace payload.
pub fn to_payload(graph: &GraphModel, name: &str, description: &str) -> TopologyPayload {
    serialize(graph).into_payload(name, description)
}

/// Decode a canvas document on its own.
pub fn deserialize(canvas: &CanvasDocument) -> Decoded {
    deserialize_with_devices(canvas, &[])
}

/// Decode a stored topology.
pub fn deserialize_record(record: &TopologyRecord) -> Decoded {
    deserialize_with_devices(&record.canvas_data, &record.devices)
}

/// Decode a canvas document together with its `devices` rows.
///
/// Invalid parts are reported in [`Decoded::issues`] while the valid subset
/// still loads: duplicate node ids (first kept), edges with a missing
/// endpoint, self-loops, and edges repeating an already connected pair.
pub fn deserialize_with_devices(canvas: &CanvasDocument, placed: &[PlacedDevice]) -> Decoded {
    let mut graph = GraphModel::new();
    let mut issues = Vec::new();

    for stored in &canvas.nodes {
        let node = Node {
            id: stored.id.clone(),
            device_id: stored.data.device_id,
            position: stored.position,
            display: stored.data.display.clone(),
        };
        if graph.add_node(node).is_err() {
            issues.push(format!("duplicate node id {}", stored.id));
        }
    }

    let mut linked: Vec<&str> = Vec::new();
    for row in placed {
        if linked.contains(&row.node_id.as_str()) {
            issues.push(format!("duplicate device link for node {}", row.node_id));
            continue;
        }
        linked.push(&row.node_id);
        apply_device_row(&mut graph, row);
    }

    for stored in &canvas.edges {
        let edge = Edge {
            id: stored.id.clone(),
            source: stored.source.clone(),
            target: stored.target.clone(),
            kind: stored.kind,
        };
        if let Err(e) = graph.insert_edge(edge) {
            issues.push(edge_issue(&stored.id, &e));
        }
    }

    if !issues.is_empty() {
        tracing::warn!(issues = ?issues, "Topology document partially rejected");
    }

    Decoded { graph, issues }
}

/// Standalone export file for the graph.
pub fn export_document(
    name: &str,
    description: Option<&str>,
    graph: &GraphModel,
    exported_at: DateTime<Utc>,
) -> ExportDocument {
    let canvas = canvas_document(graph);
    ExportDocument {
        name: name.to_string(),
        description: description.map(str::to_string),
        nodes: canvas.nodes,
        edges: canvas.edges,
        exported_at: Some(exported_at),
    }
}

/// Parse an export file back into a graph, with the same validation as
/// [`deserialize`].
pub fn import_document(text: &str) -> Result<Imported> {
    let document: ExportDocument = serde_json::from_str(text)
        .map_err(|e| Error::validation(format!("Invalid topology file format: {}", e)))?;
    let decoded = deserialize(&CanvasDocument {
        nodes: document.nodes,
        edges: document.edges,
    });
    Ok(Imported {
        name: document.name,
        description: document.description,
        decoded,
    })
}

/// Write an export file.
pub fn write_export(path: impl AsRef<Path>, document: &ExportDocument) -> Result<()> {
    let json = serde_json::to_string_pretty(document)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read and parse an export file.
pub fn read_import(path: impl AsRef<Path>) -> Result<Imported> {
    let text = std::fs::read_to_string(path)?;
    import_document(&text)
}

/// `<name>_topology_<YYYY-MM-DD>.json`, non-alphanumerics replaced by `_`.
pub fn export_file_name(name: &str, date: NaiveDate) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_topology_{}.json", sanitized, date.format("%Y-%m-%d"))
}

fn canvas_document(graph: &GraphModel) -> CanvasDocument {
    let nodes = graph
        .nodes()
        .iter()
        .map(|node| CanvasNode {
            id: node.id.clone(),
            node_type: DEVICE_NODE_TYPE.to_string(),
            position: node.position,
            data: node_data(node),
        })
        .collect();

    let edges = graph
        .edges()
        .iter()
        .map(|edge| {
            let (style, marker) = stored_style(edge.kind);
            CanvasEdge {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                kind: edge.kind,
                animated: false,
                style: Some(style),
                marker_end: Some(marker),
            }
        })
        .collect();

    CanvasDocument { nodes, edges }
}

fn node_data(node: &Node) -> NodeData {
    NodeData {
        display: node.display.clone(),
        device_id: node.device_id,
    }
}

/// Apply one authoritative `devices` row, creating the node if the canvas
/// did not carry it.
fn apply_device_row(graph: &mut GraphModel, row: &PlacedDevice) {
    let display = if row.device.name.is_empty() {
        row.node_data
            .as_ref()
            .map(|data| data.display.clone())
            .unwrap_or_else(|| row.device.display_data())
    } else {
        row.device.display_data()
    };

    if let Some(node) = graph.node_mut(&row.node_id) {
        node.device_id = Some(row.device.id);
        node.position = row.position();
        node.display = display;
    } else {
        let node = Node {
            id: row.node_id.clone(),
            device_id: Some(row.device.id),
            position: row.position(),
            display,
        };
        // The id is absent, so insertion cannot fail.
        let _ = graph.add_node(node);
    }
}

fn edge_issue(id: &str, error: &Error) -> String {
    match error {
        Error::UnknownNode(node) => format!("edge {} references missing node {}", id, node),
        Error::SelfLoop(node) => format!("edge {} connects node {} to itself", id, node),
        Error::DuplicateEdge {
            source_id,
            target_id,
        } => format!(
            "edge {} repeats the connection between {} and {}",
            id, source_id, target_id
        ),
        other => format!("edge {}: {}", id, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netmon_common::{DeviceRecord, DisplayData, EdgeKind, Point};

    fn display(name: &str) -> DisplayData {
        DisplayData {
            name: name.to_string(),
            ip_address: "192.168.1.10".to_string(),
            category: "servers".to_string(),
            status: "online".to_string(),
            brand: "Dell".to_string(),
            model: "R740".to_string(),
        }
    }

    fn sample_graph() -> GraphModel {
        let mut graph = GraphModel::new();
        for (id, device, x, y) in [("n1", Some(10), 10.5, -4.0), ("n2", Some(11), 200.0, 80.25)] {
            graph
                .add_node(Node {
                    id: id.to_string(),
                    device_id: device,
                    position: Point::new(x, y),
                    display: display(id),
                })
                .unwrap();
        }
        graph
            .add_node(Node {
                id: "loose".to_string(),
                device_id: None,
                position: Point::new(-50.0, 0.0),
                display: DisplayData::default(),
            })
            .unwrap();
        graph.add_edge("n1", "n2", EdgeKind::Cable).unwrap();
        graph.add_edge("loose", "n2", EdgeKind::Step).unwrap();
        graph
    }

    #[test]
    fn test_round_trip_through_canvas() {
        let graph = sample_graph();
        let decoded = deserialize(&serialize(&graph).canvas);
        assert!(decoded.issues.is_empty());
        assert_eq!(decoded.graph, graph);
    }

    #[test]
    fn test_round_trip_through_json_and_devices() {
        let graph = sample_graph();
        let serialized = serialize(&graph);
        assert_eq!(serialized.devices.len(), 2);

        let json = serde_json::to_string(&serialized.canvas).unwrap();
        let canvas: CanvasDocument = serde_json::from_str(&json).unwrap();
        let placed: Vec<PlacedDevice> = serialized.devices.iter().map(PlacedDevice::from_link).collect();

        let decoded = deserialize_with_devices(&canvas, &placed);
        assert!(decoded.issues.is_empty());
        assert_eq!(decoded.graph, graph);
    }

    #[test]
    fn test_canvas_json_shape() {
        let serialized = serialize(&sample_graph());
        let value = serde_json::to_value(&serialized.canvas).unwrap();

        let node = &value["nodes"][0];
        assert_eq!(node["type"], "device");
        assert_eq!(node["position"]["x"], 10.5);
        assert_eq!(node["data"]["deviceId"], 10);
        assert_eq!(node["data"]["ip_address"], "192.168.1.10");
        assert!(value["nodes"][2]["data"].get("deviceId").is_none());

        let edge = &value["edges"][0];
        assert_eq!(edge["type"], "cable");
        assert_eq!(edge["style"]["stroke"], "#6366f1");
        assert_eq!(edge["markerEnd"]["type"], "arrowclosed");
        assert_eq!(value["edges"][1]["type"], "step");
    }

    #[test]
    fn test_dangling_edge_reported_valid_subset_loaded() {
        let mut canvas = serialize(&sample_graph()).canvas;
        canvas.edges.push(CanvasEdge {
            id: "bad".to_string(),
            source: "n1".to_string(),
            target: "ghost".to_string(),
            kind: EdgeKind::Cable,
            animated: false,
            style: None,
            marker_end: None,
        });

        let decoded = deserialize(&canvas);
        assert_eq!(decoded.graph.node_count(), 3);
        assert_eq!(decoded.graph.edge_count(), 2);
        assert_eq!(decoded.issues.len(), 1);
        assert!(decoded.issues[0].contains("ghost"));
        assert!(matches!(decoded.warning(), Some(Error::CorruptDocument { .. })));
    }

    #[test]
    fn test_duplicates_and_self_loops_reported() {
        let json = r#"{
            "nodes": [
                {"id": "a", "position": {"x": 0, "y": 0}, "data": {"name": "A"}},
                {"id": "b", "position": {"x": 1, "y": 1}, "data": {"name": "B"}},
                {"id": "a", "position": {"x": 9, "y": 9}, "data": {"name": "A2"}}
            ],
            "edges": [
                {"id": "e1", "source": "a", "target": "b"},
                {"id": "e2", "source": "b", "target": "a", "type": "mystery"},
                {"id": "e3", "source": "b", "target": "b"}
            ]
        }"#;
        let canvas: CanvasDocument = serde_json::from_str(json).unwrap();
        let decoded = deserialize(&canvas);

        assert_eq!(decoded.graph.node_count(), 2);
        assert_eq!(decoded.graph.node("a").unwrap().display.name, "A");
        assert_eq!(decoded.graph.edge_count(), 1);
        assert_eq!(decoded.graph.edge("e1").unwrap().kind, EdgeKind::Cable);
        assert_eq!(decoded.issues.len(), 3);
    }

    #[test]
    fn test_devices_rows_are_authoritative() {
        let canvas: CanvasDocument = serde_json::from_str(
            r#"{"nodes": [{"id": "n1", "position": {"x": 5, "y": 5}, "data": {"name": "stale"}}]}"#,
        )
        .unwrap();
        let placed = vec![
            PlacedDevice {
                device: DeviceRecord {
                    id: 3,
                    name: "edge-router".to_string(),
                    ip_address: "10.1.1.1".to_string(),
                    category: "switches".to_string(),
                    status: "online".to_string(),
                    brand: String::new(),
                    model: String::new(),
                },
                node_id: "n1".to_string(),
                position_x: 120.5,
                position_y: 40.0,
                node_data: None,
            },
            PlacedDevice {
                device: DeviceRecord {
                    id: 4,
                    name: String::new(),
                    ip_address: String::new(),
                    category: String::new(),
                    status: String::new(),
                    brand: String::new(),
                    model: String::new(),
                },
                node_id: "n9".to_string(),
                position_x: 0.0,
                position_y: 0.0,
                node_data: Some(NodeData {
                    display: display("from-snapshot"),
                    device_id: Some(4),
                }),
            },
        ];

        let decoded = deserialize_with_devices(&canvas, &placed);
        let n1 = decoded.graph.node("n1").unwrap();
        assert_eq!(n1.device_id, Some(3));
        assert_eq!(n1.position, Point::new(120.5, 40.0));
        assert_eq!(n1.display.name, "edge-router");

        let n9 = decoded.graph.node("n9").unwrap();
        assert_eq!(n9.display.name, "from-snapshot");
    }

    #[test]
    fn test_payload_is_full_replace() {
        let payload = to_payload(&sample_graph(), "Floor 1", "Main rack");
        assert_eq!(payload.name, "Floor 1");
        assert_eq!(payload.canvas_data.as_ref().unwrap().nodes.len(), 3);
        assert_eq!(payload.devices.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_export_import_file() {
        let graph = sample_graph();
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let path = dir.path().join(export_file_name("HQ / Floor 1", date));
        assert!(path.ends_with("HQ___Floor_1_topology_2024-03-09.json"));

        let document = export_document("HQ / Floor 1", Some("core"), &graph, Utc::now());
        write_export(&path, &document).unwrap();

        let imported = read_import(&path).unwrap();
        assert_eq!(imported.name, "HQ / Floor 1");
        assert_eq!(imported.description.as_deref(), Some("core"));
        assert_eq!(imported.decoded.graph, graph);
    }

    #[test]
    fn test_import_rejects_invalid_format() {
        assert!(matches!(
            import_document(r#"{"name": "x"}"#),
            Err(Error::ValidationFailure(_))
        ));
        assert!(import_document("not json").is_err());
    }
}
