//! In-memory collaborators for testing.
//!
//! [`MemoryStore`] stands in for both the device catalog and the topology
//! storage service, so the editor can run without a backend. Clones share
//! state, which lets a test keep a handle while the manager owns another.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use netmon_common::{
    DeviceCatalog, DeviceLink, DeviceRecord, EdgeKind, Error, PlacedDevice, Point, Result,
    TopologyId, TopologyPayload, TopologyRecord, TopologyStore, TopologySummary,
};

use crate::editor::model::{GraphModel, Node};
use crate::editor::persistence;

/// Shared in-memory device catalog and topology store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    devices: Vec<DeviceRecord>,
    topologies: BTreeMap<TopologyId, TopologyRecord>,
    next_id: TopologyId,
    fail_next: Option<String>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding [`sample_devices`] and two topologies, the first of
    /// which is populated.
    pub fn with_sample_data() -> Self {
        let store = Self::new();
        store.lock().devices = sample_devices();

        let head_office = sample_graph();
        store.insert(persistence::to_payload(
            &head_office,
            "Head Office",
            "Core switching and server rack",
        ));
        store.insert(TopologyPayload::empty("Data Center", "Row B"));
        store
    }

    /// Make the next call (of any kind) fail with a network error.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.lock().fail_next = Some(message.into());
    }

    pub fn devices(&self) -> Vec<DeviceRecord> {
        self.lock().devices.clone()
    }

    pub fn set_devices(&self, devices: Vec<DeviceRecord>) {
        self.lock().devices = devices;
    }

    /// Number of stored topologies.
    pub fn len(&self) -> usize {
        self.lock().topologies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a document directly, bypassing validation. Returns its id.
    pub fn insert(&self, payload: TopologyPayload) -> TopologyId {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        let now = Utc::now();
        let devices = join_devices(&inner.devices, payload.devices.as_deref().unwrap_or_default());
        inner.topologies.insert(
            id,
            TopologyRecord {
                id,
                branch_id: payload.branch_id,
                name: payload.name,
                description: Some(payload.description),
                canvas_data: payload.canvas_data.unwrap_or_default(),
                is_active: true,
                devices,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_failure(inner: &mut Inner) -> Result<()> {
        match inner.fail_next.take() {
            Some(message) => Err(Error::NetworkFailure(message)),
            None => Ok(()),
        }
    }
}

impl DeviceCatalog for MemoryStore {
    async fn list_devices(&self) -> Result<Vec<DeviceRecord>> {
        let mut inner = self.lock();
        Self::check_failure(&mut inner)?;
        Ok(inner.devices.clone())
    }
}

impl TopologyStore for MemoryStore {
    async fn list(&self) -> Result<Vec<TopologySummary>> {
        let mut inner = self.lock();
        Self::check_failure(&mut inner)?;
        Ok(inner.topologies.values().map(TopologyRecord::summary).collect())
    }

    async fn fetch(&self, id: TopologyId) -> Result<TopologyRecord> {
        let mut inner = self.lock();
        Self::check_failure(&mut inner)?;
        inner
            .topologies
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::network("Topology not found"))
    }

    async fn create(&self, payload: TopologyPayload) -> Result<TopologySummary> {
        {
            let mut inner = self.lock();
            Self::check_failure(&mut inner)?;
        }
        if payload.canvas_data.is_none() {
            return Err(Error::network(
                "Validation failed: The canvas data field is required.",
            ));
        }
        let id = self.insert(payload);
        let inner = self.lock();
        inner
            .topologies
            .get(&id)
            .map(TopologyRecord::summary)
            .ok_or_else(|| Error::network("Topology not found"))
    }

    async fn update(&self, id: TopologyId, payload: TopologyPayload) -> Result<TopologySummary> {
        let mut inner = self.lock();
        Self::check_failure(&mut inner)?;
        let devices = payload
            .devices
            .as_deref()
            .map(|links| join_devices(&inner.devices, links));

        let record = inner
            .topologies
            .get_mut(&id)
            .ok_or_else(|| Error::network("Topology not found"))?;
        record.name = payload.name;
        record.description = Some(payload.description);
        if let Some(canvas) = payload.canvas_data {
            record.canvas_data = canvas;
        }
        if let Some(devices) = devices {
            record.devices = devices;
        }
        record.updated_at = Utc::now();
        Ok(record.summary())
    }

    async fn delete(&self, id: TopologyId) -> Result<()> {
        let mut inner = self.lock();
        Self::check_failure(&mut inner)?;
        inner
            .topologies
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::network("Topology not found"))
    }
}

/// Join stored links with the live catalog, like the storage service does.
fn join_devices(catalog: &[DeviceRecord], links: &[DeviceLink]) -> Vec<PlacedDevice> {
    links
        .iter()
        .map(|link| {
            let mut placed = PlacedDevice::from_link(link);
            if let Some(device) = catalog.iter().find(|d| d.id == link.device_id) {
                placed.device = device.clone();
            }
            placed
        })
        .collect()
}

/// Mock device inventory.
pub fn sample_devices() -> Vec<DeviceRecord> {
    [
        (1, "Core Switch", "10.0.0.1", "switches", "online", "Cisco", "C9500"),
        (2, "Access Switch 2F", "10.0.0.12", "switches", "online", "Aruba", "2930F"),
        (3, "App Server", "10.0.1.20", "servers", "online", "Dell", "R740"),
        (4, "Lobby AP", "10.0.2.31", "wifi", "offline", "Ubiquiti", "U6-Pro"),
        (5, "Gate Camera", "10.0.3.40", "cctv", "online", "Hikvision", "DS-2CD"),
        (6, "Attendance Terminal", "10.0.4.50", "tas", "offline", "ZKTeco", "SpeedFace"),
    ]
    .into_iter()
    .map(|(id, name, ip, category, status, brand, model)| DeviceRecord {
        id,
        name: name.to_string(),
        ip_address: ip.to_string(),
        category: category.to_string(),
        status: status.to_string(),
        brand: brand.to_string(),
        model: model.to_string(),
    })
    .collect()
}

/// Small populated graph: core switch wired to an access switch and a server.
pub fn sample_graph() -> GraphModel {
    let devices = sample_devices();
    let mut graph = GraphModel::new();
    let mut ids = Vec::new();
    for (device, position) in devices.iter().take(3).zip([
        Point::new(300.0, 80.0),
        Point::new(140.0, 260.0),
        Point::new(460.0, 260.0),
    ]) {
        let node = Node::from_device(device, position);
        ids.push(node.id.clone());
        // Fresh uuids never collide.
        let _ = graph.add_node(node);
    }
    if let [core, access, server] = ids.as_slice() {
        let _ = graph.add_edge(core, access, EdgeKind::Cable);
        let _ = graph.add_edge(core, server, EdgeKind::Step);
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_store() {
        let store = MemoryStore::with_sample_data();
        assert_eq!(store.len(), 2);

        let list = store.list().await.unwrap();
        assert_eq!(list[0].name, "Head Office");
        assert_eq!(list[0].device_count, 3);

        let record = store.fetch(list[0].id).await.unwrap();
        assert_eq!(record.canvas_data.nodes.len(), 3);
        assert_eq!(record.canvas_data.edges.len(), 2);
        assert_eq!(record.devices[0].device.name, "Core Switch");
    }

    #[tokio::test]
    async fn test_fail_next_is_one_shot() {
        let store = MemoryStore::with_sample_data();
        store.fail_next("boom");
        assert!(matches!(store.list_devices().await, Err(Error::NetworkFailure(m)) if m == "boom"));
        assert_eq!(store.list_devices().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_create_requires_canvas() {
        let store = MemoryStore::new();
        let result = store.create(TopologyPayload::metadata("Lab", "")).await;
        assert!(matches!(result, Err(Error::NetworkFailure(m)) if m.contains("canvas data")));
        assert!(store.is_empty());

        let created = store.create(TopologyPayload::empty("Lab", "")).await.unwrap();
        assert_eq!(store.fetch(created.id).await.unwrap().canvas_data.nodes.len(), 0);
    }

    #[tokio::test]
    async fn test_metadata_update_keeps_canvas() {
        let store = MemoryStore::with_sample_data();
        store
            .update(1, TopologyPayload::metadata("HQ", ""))
            .await
            .unwrap();
        let record = store.fetch(1).await.unwrap();
        assert_eq!(record.name, "HQ");
        assert_eq!(record.canvas_data.nodes.len(), 3);
    }
}
