use netmon_common::{
    DeviceId, DeviceRecord, EdgeKind, Point, TopologyId, TopologyRecord, TopologySummary,
};

use crate::editor::{CanvasEvent, LoadTicket};

/// Messages for the Netmon application.
///
/// Results of background requests carry the error as display text; the
/// update loop turns them back into [`netmon_common::Error`] values.
#[derive(Debug, Clone)]
pub enum Message {
    /// Topology list fetched from the storage service.
    TopologiesListed(Result<Vec<TopologySummary>, String>),

    /// Re-fetch the topology list.
    RefreshTopologies,

    /// User picked a topology in the sidebar.
    SelectTopology(TopologyId),

    /// A topology document arrived for the given load request.
    TopologyLoaded(LoadTicket, Result<TopologyRecord, String>),

    /// Sidebar search text changed.
    SearchTopologies(String),

    // Dialogs
    OpenCreateDialog,
    OpenRenameDialog(TopologyId),
    RequestDelete(TopologyId),
    OpenImportDialog,
    DialogNameChanged(String),
    DialogDescriptionChanged(String),
    DialogPathChanged(String),
    SubmitDialog,
    CancelDialog,

    TopologyCreated(Result<TopologySummary, String>),
    TopologyRenamed(Result<TopologySummary, String>),
    TopologyDeleted(TopologyId, Result<(), String>),

    /// Persist the active canvas.
    Save,
    Saved(TopologyId, Result<TopologySummary, String>),

    /// Write the active topology to an export file.
    Export,

    /// Device catalog fetched.
    DevicesLoaded(Result<Vec<DeviceRecord>, String>),

    /// Palette search text changed.
    SearchDevices(String),

    /// Pointer pressed on a palette entry.
    PaletteDragStart(DeviceId),

    /// Palette drag released over the canvas, in canvas-local pixels.
    PaletteDrop(Point),

    /// Palette drag released anywhere else.
    PaletteDragCancel,

    /// Input on the topology canvas.
    Canvas(CanvasEvent),

    /// Canvas widget size, used to anchor toolbar zoom.
    CanvasResized(f32, f32),

    // Toolbar
    ToggleConnectionMode,
    ZoomIn,
    ZoomOut,
    ResetView,
    SetEdgeKind(EdgeKind),
    DeleteSelection,

    DismissError,
    DismissWarning,
    DismissNotice,

    /// Periodic tick while connection feedback is showing.
    Tick,
}
