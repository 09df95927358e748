//! Palette-to-canvas drop pipeline.
//!
//! A device pressed in the sidebar palette becomes a pending drag; releasing
//! it over the canvas places a new node at the drop point.

use netmon_common::{DeviceId, DeviceRecord, Error, Point, Result};

use super::Canvas;
use super::model::{GraphModel, Node, NodeId};

/// A palette entry: a catalog device and how often it is already placed.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteEntry {
    pub device: DeviceRecord,
    pub placements: usize,
}

/// Devices matching `query` (name or IP, case-insensitive), at most `limit`.
pub fn available_devices(
    catalog: &[DeviceRecord],
    query: &str,
    limit: usize,
    graph: Option<&GraphModel>,
) -> Vec<PaletteEntry> {
    catalog
        .iter()
        .filter(|device| device.matches(query))
        .take(limit)
        .map(|device| PaletteEntry {
            device: device.clone(),
            placements: graph.map_or(0, |g| g.placements(device.id)),
        })
        .collect()
}

/// Tracks the device being dragged out of the palette.
#[derive(Debug, Clone, Default)]
pub struct DropPipeline {
    dragging: Option<DeviceId>,
}

impl DropPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer pressed on a palette entry.
    pub fn begin_drag(&mut self, device: DeviceId) {
        tracing::debug!(device, "Palette drag started");
        self.dragging = Some(device);
    }

    pub fn dragging(&self) -> Option<DeviceId> {
        self.dragging
    }

    /// Drag released outside the canvas.
    pub fn cancel(&mut self) {
        self.dragging = None;
    }

    /// Release the current drag over the canvas at `screen`.
    ///
    /// Returns `Ok(None)` when no drag was in progress.
    pub fn release(
        &mut self,
        screen: Point,
        catalog: &[DeviceRecord],
        canvas: Option<&mut Canvas>,
    ) -> Result<Option<NodeId>> {
        match self.dragging.take() {
            Some(device) => on_drop(screen, device, catalog, canvas).map(Some),
            None => Ok(None),
        }
    }
}

/// Place `device` at the graph point under `screen`.
///
/// `canvas` is `None` when no topology is loaded; the drop is then rejected
/// and nothing is created. Dropping the same device twice creates two nodes.
pub fn on_drop(
    screen: Point,
    device: DeviceId,
    catalog: &[DeviceRecord],
    canvas: Option<&mut Canvas>,
) -> Result<NodeId> {
    let canvas = canvas.ok_or(Error::NoActiveTopology)?;
    let record = catalog
        .iter()
        .find(|d| d.id == device)
        .ok_or(Error::UnknownDevice(device))?;

    let position = canvas.viewport().screen_to_graph(screen);
    let id = canvas.graph_mut().add_node(Node::from_device(record, position))?;
    tracing::info!(node = %id, device, %position, "Device placed");
    Ok(id)
}
