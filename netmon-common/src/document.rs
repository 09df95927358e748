//! Wire types of the topology storage service and the canvas document.
//!
//! The storage service speaks snake_case JSON wrapped in a
//! `{success, data, message, errors}` envelope. The embedded `canvas_data`
//! keeps the node/edge shape the canvas renders:
//!
//! ```json
//! {
//!   "nodes": [{"id": "...", "type": "device", "position": {"x": 0, "y": 0}, "data": {...}}],
//!   "edges": [{"id": "...", "source": "...", "target": "...", "type": "cable",
//!              "style": {...}, "markerEnd": {...}}]
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::device::{DeviceId, DeviceRecord, DisplayData};
use crate::error::{Error, Result};
use crate::geometry::Point;

/// Identifier of a persisted topology document.
pub type TopologyId = u64;

/// Node `type` written for every device node.
pub const DEVICE_NODE_TYPE: &str = "device";

/// The persisted `canvas_data` of a topology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasDocument {
    #[serde(default)]
    pub nodes: Vec<CanvasNode>,
    #[serde(default)]
    pub edges: Vec<CanvasEdge>,
}

/// A node as stored in `canvas_data.nodes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    pub id: String,
    #[serde(rename = "type", default = "default_node_type")]
    pub node_type: String,
    #[serde(default)]
    pub position: Point,
    #[serde(default)]
    pub data: NodeData,
}

fn default_node_type() -> String {
    DEVICE_NODE_TYPE.to_string()
}

/// The `data` object of a canvas node: display snapshot plus device link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(flatten)]
    pub display: DisplayData,
    #[serde(
        rename = "deviceId",
        alias = "device_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub device_id: Option<DeviceId>,
}

/// Rendering variant of an edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Layered cable look with an arrowhead (default).
    #[default]
    Cable,
    /// Single plain stroke.
    Straight,
    /// Orthogonal path through the horizontal midpoint.
    Step,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 3] = [EdgeKind::Cable, EdgeKind::Straight, EdgeKind::Step];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Cable => "cable",
            EdgeKind::Straight => "straight",
            EdgeKind::Step => "step",
        }
    }

    /// Parse a stored `type`; unknown variants fall back to cable.
    pub fn from_type(value: &str) -> Self {
        match value {
            "straight" => EdgeKind::Straight,
            "step" | "smoothstep" => EdgeKind::Step,
            _ => EdgeKind::Cable,
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EdgeKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.as_deref().map(EdgeKind::from_type).unwrap_or_default())
    }
}

/// An edge as stored in `canvas_data.edges`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default)]
    pub kind: EdgeKind,
    #[serde(default)]
    pub animated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StrokeStyle>,
    #[serde(rename = "markerEnd", default, skip_serializing_if = "Option::is_none")]
    pub marker_end: Option<MarkerEnd>,
}

/// Persisted stroke attributes of an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub stroke: String,
    #[serde(rename = "strokeWidth")]
    pub stroke_width: f64,
}

/// Persisted arrowhead marker of an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerEnd {
    #[serde(rename = "type")]
    pub marker_type: String,
    pub width: f64,
    pub height: f64,
    pub color: String,
}

/// Device linkage row sent to the storage service on create/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceLink {
    pub device_id: DeviceId,
    pub node_id: String,
    #[serde(deserialize_with = "number_or_string")]
    pub position_x: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub position_y: f64,
    #[serde(default, deserialize_with = "embedded_json")]
    pub node_data: Option<NodeData>,
}

/// Device linkage row returned by `GET topologies/{id}`, joined with the
/// live device record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedDevice {
    #[serde(flatten)]
    pub device: DeviceRecord,
    pub node_id: String,
    #[serde(deserialize_with = "number_or_string")]
    pub position_x: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub position_y: f64,
    #[serde(default, deserialize_with = "embedded_json")]
    pub node_data: Option<NodeData>,
}

impl PlacedDevice {
    pub fn position(&self) -> Point {
        Point::new(self.position_x, self.position_y)
    }

    /// Rebuild a joined row from a stored link, taking the device fields from
    /// the link's own snapshot.
    pub fn from_link(link: &DeviceLink) -> Self {
        let display = link
            .node_data
            .as_ref()
            .map(|data| data.display.clone())
            .unwrap_or_default();
        Self {
            device: DeviceRecord {
                id: link.device_id,
                name: display.name,
                ip_address: display.ip_address,
                category: display.category,
                status: display.status,
                brand: display.brand,
                model: display.model,
            },
            node_id: link.node_id.clone(),
            position_x: link.position_x,
            position_y: link.position_y,
            node_data: link.node_data.clone(),
        }
    }
}

/// Topology metadata as listed by `GET topologies`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologySummary {
    pub id: TopologyId,
    #[serde(default)]
    pub branch_id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub device_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

/// A full topology document as returned by `GET topologies/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyRecord {
    pub id: TopologyId,
    #[serde(default)]
    pub branch_id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_canvas")]
    pub canvas_data: CanvasDocument,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub devices: Vec<PlacedDevice>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TopologyRecord {
    pub fn summary(&self) -> TopologySummary {
        TopologySummary {
            id: self.id,
            branch_id: self.branch_id,
            name: self.name.clone(),
            description: self.description.clone(),
            is_active: self.is_active,
            device_count: self.devices.len(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Body of `POST topologies` and `PUT topologies/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas_data: Option<CanvasDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<Vec<DeviceLink>>,
}

impl TopologyPayload {
    /// Metadata-only update (rename); leaves canvas and devices untouched.
    pub fn metadata(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            branch_id: None,
            name: name.into(),
            description: description.into(),
            canvas_data: None,
            devices: None,
        }
    }

    /// Payload for a new topology with an empty canvas.
    ///
    /// `POST topologies` requires `canvas_data` to be present.
    pub fn empty(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            canvas_data: Some(CanvasDocument::default()),
            devices: Some(Vec::new()),
            ..Self::metadata(name, description)
        }
    }
}

/// Standalone export file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub nodes: Vec<CanvasNode>,
    #[serde(default)]
    pub edges: Vec<CanvasEdge>,
    #[serde(rename = "exportedAt", default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
}

/// Response envelope of the storage service.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// Message describing a failed envelope, including validation details.
    pub fn failure_message(&self) -> String {
        let mut message = self
            .message
            .clone()
            .unwrap_or_else(|| "Unknown error".to_string());
        if let Some(serde_json::Value::Object(errors)) = &self.errors {
            let details: Vec<String> = errors
                .values()
                .flat_map(|v| match v {
                    serde_json::Value::Array(items) => items
                        .iter()
                        .map(|i| i.as_str().map(str::to_string).unwrap_or_else(|| i.to_string()))
                        .collect(),
                    other => vec![other.as_str().map(str::to_string).unwrap_or_else(|| other.to_string())],
                })
                .collect();
            if !details.is_empty() {
                message = format!("{}: {}", message, details.join(", "));
            }
        }
        if let Some(error) = &self.error {
            message = format!("{}: {}", message, error);
        }
        message
    }

    /// Unwrap the payload of a successful envelope.
    pub fn into_data(self) -> Result<T> {
        if !self.success {
            return Err(Error::NetworkFailure(self.failure_message()));
        }
        self.data
            .ok_or_else(|| Error::network("Response envelope carried no data"))
    }

    /// Check a successful envelope that carries no payload.
    pub fn into_unit(self) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            Err(Error::NetworkFailure(self.failure_message()))
        }
    }
}

/// Response of the device catalog: `{data: [...], pagination: {...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceListResponse {
    #[serde(default)]
    pub data: Vec<DeviceRecord>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Decimal columns come back as strings (`"120.50"`).
fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

/// Pivot `node_data` is either an object or a JSON-encoded string.
fn embedded_json<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<NodeData>, D::Error> {
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => serde_json::from_str(&s)
            .map(Some)
            .map_err(de::Error::custom),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(de::Error::custom),
    }
}

fn null_canvas<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<CanvasDocument, D::Error> {
    Ok(Option::<CanvasDocument>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canvas_document_shape() {
        let json = r##"{
            "nodes": [{"id": "n1", "type": "device", "position": {"x": 10, "y": 20},
                       "data": {"name": "sw1", "ip_address": "10.0.0.1", "category": "switches",
                                "status": "online", "brand": "", "model": "", "deviceId": 4}}],
            "edges": [{"id": "e1", "source": "n1", "target": "n2", "type": "smooth",
                       "style": {"stroke": "#94a3b8", "strokeWidth": 2.5},
                       "sourceHandle": "right"}]
        }"##;
        let doc: CanvasDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.nodes[0].position, Point::new(10.0, 20.0));
        assert_eq!(doc.nodes[0].data.device_id, Some(4));
        assert_eq!(doc.nodes[0].data.display.name, "sw1");
        // Unknown edge types load as cable.
        assert_eq!(doc.edges[0].kind, EdgeKind::Cable);
        assert!(doc.edges[0].marker_end.is_none());
    }

    #[test]
    fn test_node_data_serializes_device_id_camel_case() {
        let data = NodeData {
            display: DisplayData {
                name: "srv".into(),
                ..DisplayData::default()
            },
            device_id: Some(9),
        };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["deviceId"], 9);
        assert_eq!(value["name"], "srv");
        assert!(value.get("display").is_none());
    }

    #[test]
    fn test_placed_device_decimal_strings_and_encoded_node_data() {
        let json = r#"{
            "id": 12, "name": "cam-1", "ip_address": "10.2.0.5", "category": "cctv",
            "status": "online", "brand": "Axis", "model": "P32",
            "node_id": "node-1", "position_x": "120.50", "position_y": -3,
            "node_data": "{\"name\":\"cam-1\",\"deviceId\":12}"
        }"#;
        let placed: PlacedDevice = serde_json::from_str(json).unwrap();
        assert_eq!(placed.device.id, 12);
        assert_eq!(placed.position(), Point::new(120.5, -3.0));
        assert_eq!(placed.node_data.unwrap().device_id, Some(12));
    }

    #[test]
    fn test_topology_record_laravel_timestamps() {
        let json = r#"{
            "id": 1, "branch_id": 2, "name": "HQ", "description": null,
            "canvas_data": null, "is_active": true, "devices": [],
            "created_at": "2025-11-14T11:20:12+00:00",
            "updated_at": "2025-11-14T11:20:12+00:00"
        }"#;
        let record: TopologyRecord = serde_json::from_str(json).unwrap();
        assert!(record.canvas_data.nodes.is_empty());
        assert_eq!(record.summary().device_count, 0);
    }

    #[test]
    fn test_envelope_failure_message() {
        let json = r#"{"success": false, "message": "Validation failed",
                       "errors": {"name": ["The name field is required."]}}"#;
        let envelope: Envelope<TopologySummary> = serde_json::from_str(json).unwrap();
        let err = envelope.into_data().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Network failure: Validation failed: The name field is required."
        );
    }

    #[test]
    fn test_metadata_payload_omits_canvas() {
        let payload = TopologyPayload::metadata("Core", "");
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("canvas_data").is_none());
        assert!(value.get("devices").is_none());
        assert!(value.get("branch_id").is_none());
    }

    #[test]
    fn test_empty_payload_carries_blank_canvas() {
        let payload = TopologyPayload::empty("Core", "");
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["canvas_data"], json!({ "nodes": [], "edges": [] }));
        assert_eq!(value["devices"], json!([]));
    }
}
