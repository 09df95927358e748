//! Topology collection manager.
//!
//! Owns the list of named topologies, which one is active, and the canvas
//! that projects it. Network calls are split in two halves so the GUI can
//! run them as background tasks: a `begin_*` half that prepares the request
//! (and snapshots the graph for saves) and an `apply_*` half that folds the
//! result back in. The composed `async` methods chain both halves for
//! callers that can borrow the manager across an await.
//!
//! A result arriving after the editor was closed, or a load overtaken by a
//! newer load, is dropped without touching the canvas.

use chrono::{DateTime, Utc};
use netmon_common::{
    EditorConfig, Error, ExportDocument, Result, TopologyId, TopologyPayload, TopologyRecord,
    TopologyStore, TopologySummary,
};

use super::Canvas;
use super::persistence::{self, Imported};

/// Longest accepted topology name.
pub const MAX_NAME_LEN: usize = 255;

/// Identifies one `load` so a late result can be recognised as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub id: TopologyId,
    generation: u64,
}

/// What happened to a load result.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The document replaced the canvas; `warning` lists rejected parts.
    Loaded { warning: Option<Error> },
    /// The result arrived too late and was discarded.
    Stale,
}

/// A save prepared at call time.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub id: TopologyId,
    pub payload: TopologyPayload,
}

/// CRUD over named topology documents plus the active canvas.
#[derive(Debug)]
pub struct TopologyManager<S> {
    store: S,
    topologies: Vec<TopologySummary>,
    search_query: String,
    active: Option<TopologySummary>,
    canvas: Canvas,
    loading: Option<LoadTicket>,
    generation: u64,
    mounted: bool,
}

impl<S> TopologyManager<S> {
    pub fn new(store: S, config: &EditorConfig) -> Self {
        Self {
            store,
            topologies: Vec::new(),
            search_query: String::new(),
            active: None,
            canvas: Canvas::new(config),
            loading: None,
            generation: 0,
            mounted: true,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn topologies(&self) -> &[TopologySummary] {
        &self.topologies
    }

    pub fn active(&self) -> Option<&TopologySummary> {
        self.active.as_ref()
    }

    pub fn active_id(&self) -> Option<TopologyId> {
        self.active.as_ref().map(|t| t.id)
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// The canvas, when a topology is loaded into it.
    pub fn active_canvas_mut(&mut self) -> Option<&mut Canvas> {
        if self.active.is_some() {
            Some(&mut self.canvas)
        } else {
            None
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    /// Topologies whose name contains `query`, case-insensitively.
    pub fn search(&self, query: &str) -> Vec<&TopologySummary> {
        let query = query.trim().to_lowercase();
        self.topologies
            .iter()
            .filter(|t| query.is_empty() || t.name.to_lowercase().contains(&query))
            .collect()
    }

    /// Topologies matching the current search query.
    pub fn filtered(&self) -> Vec<&TopologySummary> {
        self.search(&self.search_query)
    }

    /// Tear the editor down: every in-flight result becomes a no-op.
    pub fn close(&mut self) {
        self.mounted = false;
        self.loading = None;
        self.generation += 1;
        self.active = None;
        self.canvas.clear();
        tracing::debug!("Topology editor closed");
    }

    pub fn apply_listed(&mut self, result: Result<Vec<TopologySummary>>) -> Result<()> {
        if !self.mounted {
            return Ok(());
        }
        let topologies = result.inspect_err(|e| tracing::error!(error = %e, "Failed to list topologies"))?;
        if let Some(active) = &mut self.active
            && let Some(fresh) = topologies.iter().find(|t| t.id == active.id)
        {
            *active = fresh.clone();
        }
        tracing::debug!(count = topologies.len(), "Topologies listed");
        self.topologies = topologies;
        Ok(())
    }

    /// Validated payload for `create`.
    pub fn create_payload(&self, name: &str, description: &str) -> Result<TopologyPayload> {
        let name = validate_name(name)?;
        Ok(TopologyPayload::empty(name, description.trim()))
    }

    pub fn apply_created(&mut self, result: Result<TopologySummary>) -> Result<TopologySummary> {
        let summary = result.inspect_err(|e| tracing::error!(error = %e, "Failed to create topology"))?;
        tracing::info!(topology_id = summary.id, name = %summary.name, "Topology created");
        if self.mounted {
            self.upsert(summary.clone());
        }
        Ok(summary)
    }

    /// Validated metadata-only payload for `rename`.
    pub fn rename_payload(&self, name: &str, description: &str) -> Result<TopologyPayload> {
        let name = validate_name(name)?;
        Ok(TopologyPayload::metadata(name, description.trim()))
    }

    pub fn apply_renamed(&mut self, result: Result<TopologySummary>) -> Result<TopologySummary> {
        let summary = result.inspect_err(|e| tracing::error!(error = %e, "Failed to rename topology"))?;
        tracing::info!(topology_id = summary.id, name = %summary.name, "Topology renamed");
        if self.mounted {
            self.upsert(summary.clone());
        }
        Ok(summary)
    }

    /// Fold a delete result in. Removing the active topology empties the
    /// canvas and resets the viewport.
    pub fn apply_removed(&mut self, id: TopologyId, result: Result<()>) -> Result<()> {
        result.inspect_err(|e| tracing::error!(topology_id = id, error = %e, "Failed to delete topology"))?;
        tracing::info!(topology_id = id, "Topology deleted");
        if !self.mounted {
            return Ok(());
        }

        self.topologies.retain(|t| t.id != id);
        if self.loading.is_some_and(|ticket| ticket.id == id) {
            self.loading = None;
        }
        if self.active_id() == Some(id) {
            self.active = None;
            self.canvas.clear();
        }
        Ok(())
    }

    /// Start loading `id`; any earlier load still in flight becomes stale.
    pub fn begin_load(&mut self, id: TopologyId) -> LoadTicket {
        self.generation += 1;
        let ticket = LoadTicket {
            id,
            generation: self.generation,
        };
        self.loading = Some(ticket);
        tracing::debug!(topology_id = id, "Loading topology");
        ticket
    }

    /// Replace the canvas with a loaded document.
    ///
    /// Unsaved changes of the previous document are discarded. A document
    /// with rejected parts still loads; the rejection comes back as a
    /// warning.
    pub fn apply_loaded(
        &mut self,
        ticket: LoadTicket,
        result: Result<TopologyRecord>,
    ) -> Result<LoadOutcome> {
        if !self.mounted || self.loading != Some(ticket) {
            tracing::warn!(topology_id = ticket.id, "Dropping stale load result");
            return Ok(LoadOutcome::Stale);
        }
        self.loading = None;

        let record = result
            .inspect_err(|e| tracing::error!(topology_id = ticket.id, error = %e, "Failed to load topology"))?;
        let decoded = persistence::deserialize_record(&record);
        let warning = decoded.warning();
        if let Some(warning) = &warning {
            tracing::warn!(topology_id = record.id, error = %warning, "Loaded corrupt topology");
        }

        tracing::info!(
            topology_id = record.id,
            nodes = decoded.graph.node_count(),
            edges = decoded.graph.edge_count(),
            "Topology loaded"
        );
        self.canvas.replace_graph(decoded.graph);
        let summary = record.summary();
        self.upsert(summary.clone());
        self.active = Some(summary);

        Ok(LoadOutcome::Loaded { warning })
    }

    /// Snapshot the whole graph as a full-replace save of the active topology.
    pub fn begin_save(&self) -> Result<SaveRequest> {
        let active = self.active.as_ref().ok_or(Error::NoActiveTopology)?;
        let payload = persistence::to_payload(
            self.canvas.graph(),
            &active.name,
            active.description.as_deref().unwrap_or_default(),
        );
        Ok(SaveRequest {
            id: active.id,
            payload,
        })
    }

    /// Fold a save result in. The canvas is never touched, so a failed save
    /// can simply be retried.
    pub fn apply_saved(
        &mut self,
        id: TopologyId,
        result: Result<TopologySummary>,
    ) -> Result<TopologySummary> {
        let summary =
            result.inspect_err(|e| tracing::error!(topology_id = id, error = %e, "Failed to save topology"))?;
        tracing::info!(topology_id = id, devices = summary.device_count, "Topology saved");
        if self.mounted {
            self.upsert(summary.clone());
        }
        Ok(summary)
    }

    /// Standalone export of the active topology, with its file name.
    pub fn export(&self, now: DateTime<Utc>) -> Result<(String, ExportDocument)> {
        let active = self.active.as_ref().ok_or(Error::NoActiveTopology)?;
        let document = persistence::export_document(
            &active.name,
            active.description.as_deref(),
            self.canvas.graph(),
            now,
        );
        let file_name = persistence::export_file_name(&active.name, now.date_naive());
        Ok((file_name, document))
    }

    /// Replace the active canvas with an imported graph.
    pub fn import(&mut self, imported: Imported) -> Result<Option<Error>> {
        let canvas = self.active_canvas_mut().ok_or(Error::NoActiveTopology)?;
        let warning = imported.decoded.warning();
        tracing::info!(
            nodes = imported.decoded.graph.node_count(),
            edges = imported.decoded.graph.edge_count(),
            source = %imported.name,
            "Topology imported"
        );
        canvas.replace_graph(imported.decoded.graph);
        Ok(warning)
    }

    fn upsert(&mut self, summary: TopologySummary) {
        if let Some(active) = &mut self.active
            && active.id == summary.id
        {
            *active = summary.clone();
        }
        match self.topologies.iter_mut().find(|t| t.id == summary.id) {
            Some(existing) => *existing = summary,
            None => self.topologies.push(summary),
        }
    }
}

impl<S: TopologyStore> TopologyManager<S> {
    /// `list()`
    pub async fn list(&mut self) -> Result<&[TopologySummary]> {
        let result = self.store.list().await;
        self.apply_listed(result)?;
        Ok(&self.topologies)
    }

    /// `create(name, description)`
    pub async fn create(&mut self, name: &str, description: &str) -> Result<TopologySummary> {
        let payload = self.create_payload(name, description)?;
        let result = self.store.create(payload).await;
        self.apply_created(result)
    }

    /// `rename(id, name, description)`
    pub async fn rename(
        &mut self,
        id: TopologyId,
        name: &str,
        description: &str,
    ) -> Result<TopologySummary> {
        let payload = self.rename_payload(name, description)?;
        let result = self.store.update(id, payload).await;
        self.apply_renamed(result)
    }

    /// `remove(id)`
    pub async fn remove(&mut self, id: TopologyId) -> Result<()> {
        let result = self.store.delete(id).await;
        self.apply_removed(id, result)
    }

    /// `load(id)`
    pub async fn load(&mut self, id: TopologyId) -> Result<LoadOutcome> {
        let ticket = self.begin_load(id);
        let result = self.store.fetch(id).await;
        self.apply_loaded(ticket, result)
    }

    /// `save()`: full replace of the active topology.
    pub async fn save(&mut self) -> Result<TopologySummary> {
        let request = self.begin_save()?;
        let result = self.store.update(request.id, request.payload).await;
        self.apply_saved(request.id, result)
    }
}

/// Trim a topology name and enforce the required/length rules.
pub fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Topology name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::validation(format!(
            "Topology name must not exceed {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MemoryStore;
    use netmon_common::Point;

    fn manager() -> TopologyManager<MemoryStore> {
        TopologyManager::new(MemoryStore::with_sample_data(), &EditorConfig::default())
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Core  ").unwrap(), "Core");
        assert!(matches!(validate_name("   "), Err(Error::ValidationFailure(_))));
        assert!(validate_name(&"x".repeat(255)).is_ok());
        assert!(validate_name(&"x".repeat(256)).is_err());
    }

    #[tokio::test]
    async fn test_create_list_and_search() {
        let mut manager = manager();
        manager.list().await.unwrap();
        let before = manager.topologies().len();

        let created = manager.create("Warehouse", "Dock switches").await.unwrap();
        assert_eq!(created.name, "Warehouse");
        assert_eq!(manager.topologies().len(), before + 1);

        assert_eq!(manager.search("WARE").len(), 1);
        assert_eq!(manager.search("").len(), before + 1);
        manager.set_search_query("nothing-matches");
        assert!(manager.filtered().is_empty());
    }

    #[test]
    fn test_create_payload_carries_empty_canvas() {
        let payload = manager().create_payload(" Lab ", "").unwrap();
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["name"], "Lab");
        assert_eq!(value["canvas_data"]["nodes"], serde_json::json!([]));
        assert_eq!(value["canvas_data"]["edges"], serde_json::json!([]));
        assert_eq!(value["devices"], serde_json::json!([]));

        let rename = manager().rename_payload("Lab", "").unwrap();
        assert!(rename.canvas_data.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let mut manager = manager();
        let result = manager.create("  ", "").await;
        assert!(matches!(result, Err(Error::ValidationFailure(_))));
    }

    #[tokio::test]
    async fn test_load_resets_viewport_and_replaces_graph() {
        let mut manager = manager();
        manager.list().await.unwrap();
        let id = manager.topologies()[0].id;

        manager.load(id).await.unwrap();
        let nodes = manager.canvas().graph().node_count();
        assert!(nodes > 0);
        manager
            .active_canvas_mut()
            .unwrap()
            .viewport_mut()
            .zoom_by(2.0, Point::ORIGIN);

        let created = manager.create("Empty", "").await.unwrap();
        manager.load(created.id).await.unwrap();
        assert_eq!(manager.active_id(), Some(created.id));
        assert!(manager.canvas().graph().is_empty());
        assert!(manager.canvas().viewport().is_identity());
    }

    #[tokio::test]
    async fn test_stale_load_is_dropped() {
        let mut manager = manager();
        manager.list().await.unwrap();
        let first = manager.topologies()[0].id;
        let store = manager.store().clone();

        let stale = manager.begin_load(first);
        let fresh = manager.begin_load(first);
        let record = store.fetch(first).await;
        assert!(matches!(
            manager.apply_loaded(stale, record).unwrap(),
            LoadOutcome::Stale
        ));
        assert!(manager.active().is_none());

        let record = store.fetch(first).await;
        assert!(matches!(
            manager.apply_loaded(fresh, record).unwrap(),
            LoadOutcome::Loaded { .. }
        ));

        let late = manager.begin_load(first);
        manager.close();
        let record = store.fetch(first).await;
        assert!(matches!(
            manager.apply_loaded(late, record).unwrap(),
            LoadOutcome::Stale
        ));
        assert!(manager.canvas().graph().is_empty());
    }

    #[tokio::test]
    async fn test_save_snapshots_at_call_time() {
        let mut manager = manager();
        manager.list().await.unwrap();
        let id = manager.topologies()[0].id;
        manager.load(id).await.unwrap();

        let request = manager.begin_save().unwrap();
        let saved_nodes = request.payload.canvas_data.as_ref().unwrap().nodes.len();

        // Mutate after the snapshot; the request must not see it.
        let canvas = manager.active_canvas_mut().unwrap();
        let victim = canvas.graph().nodes()[0].id.clone();
        canvas.graph_mut().remove_node(&victim).unwrap();

        let result = manager
            .store()
            .update(request.id, request.payload.clone())
            .await;
        manager.apply_saved(request.id, result).unwrap();

        let stored = manager.store().fetch(id).await.unwrap();
        assert_eq!(stored.canvas_data.nodes.len(), saved_nodes);
        assert_eq!(manager.canvas().graph().node_count(), saved_nodes - 1);
    }

    #[tokio::test]
    async fn test_save_overtaken_by_load_of_other_topology() {
        let mut manager = manager();
        manager.list().await.unwrap();
        let first = manager.topologies()[0].id;
        let second = manager.topologies()[1].id;
        manager.load(first).await.unwrap();

        let canvas = manager.active_canvas_mut().unwrap();
        let victim = canvas.graph().nodes()[0].id.clone();
        canvas.graph_mut().remove_node(&victim).unwrap();
        let edited = manager.canvas().graph().clone();
        let request = manager.begin_save().unwrap();

        // The user switches documents before the save lands.
        let ticket = manager.begin_load(second);
        let record = manager.store().fetch(second).await;
        assert!(matches!(
            manager.apply_loaded(ticket, record).unwrap(),
            LoadOutcome::Loaded { .. }
        ));

        let result = manager
            .store()
            .update(request.id, request.payload.clone())
            .await;
        manager.apply_saved(request.id, result).unwrap();

        let stored = manager.store().fetch(first).await.unwrap();
        let stored_ids: Vec<&str> = stored.canvas_data.nodes.iter().map(|n| n.id.as_str()).collect();
        let edited_ids: Vec<&str> = edited.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(stored_ids, edited_ids);
        assert_eq!(stored.canvas_data.edges.len(), edited.edge_count());
        assert_eq!(manager.active_id(), Some(second));
        assert!(manager.canvas().graph().is_empty());
    }

    #[tokio::test]
    async fn test_results_after_close_are_ignored() {
        let mut manager = manager();
        manager.list().await.unwrap();
        let id = manager.topologies()[0].id;
        manager.load(id).await.unwrap();
        let request = manager.begin_save().unwrap();

        manager.close();
        assert!(!manager.is_mounted());
        let listed = manager.topologies().to_vec();

        let saved = manager
            .store()
            .update(request.id, request.payload.clone())
            .await
            .map(|mut summary| {
                summary.name = "Renamed elsewhere".to_string();
                summary
            });
        manager.apply_saved(request.id, saved).unwrap();
        manager.apply_removed(id, Ok(())).unwrap();
        manager.apply_listed(Ok(Vec::new())).unwrap();

        assert_eq!(manager.topologies(), listed.as_slice());
        assert!(manager.active().is_none());
        assert!(manager.canvas().graph().is_empty());
        assert!(manager.active_canvas_mut().is_none());
    }

    #[tokio::test]
    async fn test_save_without_topology() {
        let mut manager = manager();
        assert!(matches!(manager.save().await, Err(Error::NoActiveTopology)));
    }

    #[tokio::test]
    async fn test_failed_save_leaves_graph() {
        let mut manager = manager();
        manager.list().await.unwrap();
        let id = manager.topologies()[0].id;
        manager.load(id).await.unwrap();
        let before = manager.canvas().graph().clone();

        manager.store().fail_next("storage offline");
        let result = manager.save().await;
        assert!(matches!(result, Err(Error::NetworkFailure(_))));
        assert_eq!(manager.canvas().graph(), &before);
        assert_eq!(manager.active_id(), Some(id));
    }

    #[tokio::test]
    async fn test_remove_active_clears_canvas() {
        let mut manager = manager();
        manager.list().await.unwrap();
        let id = manager.topologies()[0].id;
        manager.load(id).await.unwrap();
        manager
            .active_canvas_mut()
            .unwrap()
            .viewport_mut()
            .pan_by(Point::new(40.0, 40.0));

        manager.remove(id).await.unwrap();
        assert!(manager.active().is_none());
        assert!(manager.canvas().graph().is_empty());
        assert!(manager.canvas().viewport().is_identity());
        assert!(manager.topologies().iter().all(|t| t.id != id));
        assert!(manager.active_canvas_mut().is_none());
    }

    #[tokio::test]
    async fn test_rename_updates_active() {
        let mut manager = manager();
        manager.list().await.unwrap();
        let id = manager.topologies()[0].id;
        manager.load(id).await.unwrap();

        manager.rename(id, "Renamed", "new text").await.unwrap();
        assert_eq!(manager.active().unwrap().name, "Renamed");
        assert!(manager.rename(id, "", "").await.is_err());
    }

    #[tokio::test]
    async fn test_export_and_import() {
        let mut manager = manager();
        assert!(matches!(
            manager.export(Utc::now()),
            Err(Error::NoActiveTopology)
        ));

        manager.list().await.unwrap();
        let id = manager.topologies()[0].id;
        manager.load(id).await.unwrap();
        let graph = manager.canvas().graph().clone();

        let (file_name, document) = manager.export(Utc::now()).unwrap();
        assert!(file_name.contains("_topology_"));
        let text = serde_json::to_string(&document).unwrap();

        manager.active_canvas_mut().unwrap().clear();
        let imported = persistence::import_document(&text).unwrap();
        assert!(manager.import(imported).unwrap().is_none());
        assert_eq!(manager.canvas().graph(), &graph);
    }
}
