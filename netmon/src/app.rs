//! Netmon Iced application.

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use iced::widget::canvas::Cache;
use iced::widget::{center, column, container, opaque, row, rule, stack};
use iced::{Element, Length, Subscription, Task, Theme};

use netmon_common::{
    DeviceCatalog, DeviceRecord, Error, NetmonConfig, Point, TopologyId, TopologyStore,
};

use crate::editor::persistence;
use crate::editor::{
    CanvasEvent, DropPipeline, KeyCommand, LoadOutcome, Outcome, TopologyManager,
    available_devices,
};
use crate::message::Message;
use crate::subscription::tick_subscription;
use crate::view::dialog::{Dialog, dialog_view};
use crate::view::palette::palette_view;
use crate::view::sidebar::sidebar_view;
use crate::view::topology::{EditorView, editor_view};

/// Storage backend the application runs against.
pub trait Backend: TopologyStore + DeviceCatalog + Clone + Send + Sync + 'static {}

impl<T> Backend for T where T: TopologyStore + DeviceCatalog + Clone + Send + Sync + 'static {}

/// The main Netmon application.
pub struct NetmonApp<S> {
    /// Loaded configuration.
    config: NetmonConfig,
    /// Topology collection and the open canvas.
    manager: TopologyManager<S>,
    /// Device catalog snapshot for the palette.
    devices: Vec<DeviceRecord>,
    /// Palette search text.
    device_query: String,
    /// Palette drag in progress.
    pipeline: DropPipeline,
    /// Open dialog, if any.
    dialog: Option<Dialog>,
    /// Validation message shown inside the dialog.
    dialog_error: Option<String>,
    error: Option<String>,
    warning: Option<String>,
    notice: Option<String>,
    /// A save request is in flight.
    saving: bool,
    /// Last reported canvas widget size.
    canvas_size: (f32, f32),
    /// Canvas geometry cache; cleared whenever the canvas changes.
    cache: Cache,
}

impl<S: Backend> NetmonApp<S> {
    /// Boot the application (called by iced::application).
    pub fn boot(store: S, config: NetmonConfig) -> (Self, Task<Message>) {
        if let Err(e) = config.editor.validate() {
            tracing::warn!(error = %e, "Editor configuration is invalid, falling back where needed");
        }
        let app = Self {
            manager: TopologyManager::new(store, &config.editor),
            config,
            devices: Vec::new(),
            device_query: String::new(),
            pipeline: DropPipeline::new(),
            dialog: None,
            dialog_error: None,
            error: None,
            warning: None,
            notice: None,
            saving: false,
            canvas_size: (0.0, 0.0),
            cache: Cache::new(),
        };

        let task = Task::batch([app.list_task(), app.devices_task()]);
        (app, task)
    }

    /// Get the window title.
    pub fn title(&self) -> String {
        match self.manager.active() {
            Some(active) => format!("Netmon - {}", active.name),
            None => "Netmon".to_string(),
        }
    }

    /// Handle incoming messages.
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::RefreshTopologies => return self.list_task(),
            Message::TopologiesListed(result) => {
                if let Err(e) = self.manager.apply_listed(result.map_err(Error::NetworkFailure)) {
                    self.report(e);
                }
            }
            Message::SelectTopology(id) => return self.load_task(id),
            Message::TopologyLoaded(ticket, result) => {
                match self
                    .manager
                    .apply_loaded(ticket, result.map_err(Error::NetworkFailure))
                {
                    Ok(LoadOutcome::Loaded { warning }) => {
                        self.warning = warning.map(|w| w.to_string());
                        self.pipeline.cancel();
                        self.cache.clear();
                    }
                    Ok(LoadOutcome::Stale) => {}
                    Err(e) => self.report(e),
                }
            }
            Message::SearchTopologies(query) => self.manager.set_search_query(query),

            Message::OpenCreateDialog => self.open_dialog(Dialog::create()),
            Message::OpenRenameDialog(id) => {
                if let Some(topology) = self.manager.topologies().iter().find(|t| t.id == id) {
                    let dialog = Dialog::Rename {
                        id,
                        name: topology.name.clone(),
                        description: topology.description.clone().unwrap_or_default(),
                    };
                    self.open_dialog(dialog);
                }
            }
            Message::RequestDelete(id) => {
                if let Some(topology) = self.manager.topologies().iter().find(|t| t.id == id) {
                    let dialog = Dialog::ConfirmDelete {
                        id,
                        name: topology.name.clone(),
                    };
                    self.open_dialog(dialog);
                }
            }
            Message::OpenImportDialog => {
                if self.manager.active().is_some() {
                    self.open_dialog(Dialog::Import {
                        path: String::new(),
                    });
                } else {
                    self.report(Error::NoActiveTopology);
                }
            }
            Message::DialogNameChanged(value) => {
                if let Some(dialog) = &mut self.dialog {
                    dialog.set_name(value);
                }
            }
            Message::DialogDescriptionChanged(value) => {
                if let Some(dialog) = &mut self.dialog {
                    dialog.set_description(value);
                }
            }
            Message::DialogPathChanged(value) => {
                if let Some(dialog) = &mut self.dialog {
                    dialog.set_path(value);
                }
            }
            Message::SubmitDialog => return self.submit_dialog(),
            Message::CancelDialog => self.close_dialog(),

            Message::TopologyCreated(result) => {
                match self
                    .manager
                    .apply_created(result.map_err(Error::NetworkFailure))
                {
                    Ok(summary) => {
                        self.notice = Some(format!("Created \"{}\"", summary.name));
                        return self.load_task(summary.id);
                    }
                    Err(e) => self.report(e),
                }
            }
            Message::TopologyRenamed(result) => {
                match self
                    .manager
                    .apply_renamed(result.map_err(Error::NetworkFailure))
                {
                    Ok(summary) => self.notice = Some(format!("Renamed to \"{}\"", summary.name)),
                    Err(e) => self.report(e),
                }
            }
            Message::TopologyDeleted(id, result) => {
                match self
                    .manager
                    .apply_removed(id, result.map_err(Error::NetworkFailure))
                {
                    Ok(()) => {
                        self.notice = Some("Topology deleted".to_string());
                        self.cache.clear();
                    }
                    Err(e) => self.report(e),
                }
            }

            Message::Save => return self.save_task(),
            Message::Saved(id, result) => {
                self.saving = false;
                match self
                    .manager
                    .apply_saved(id, result.map_err(Error::NetworkFailure))
                {
                    Ok(_) => self.notice = Some("Topology saved".to_string()),
                    Err(e) => self.report(e),
                }
            }
            Message::Export => self.export(),

            Message::DevicesLoaded(result) => match result {
                Ok(devices) => {
                    if let Some(canvas) = self.manager.active_canvas_mut() {
                        let refreshed: usize = devices
                            .iter()
                            .map(|device| canvas.graph_mut().refresh_display_data(device))
                            .sum();
                        tracing::debug!(refreshed, "Refreshed node display data");
                    }
                    self.devices = devices;
                    self.cache.clear();
                }
                Err(e) => self.report(Error::NetworkFailure(e)),
            },
            Message::SearchDevices(query) => self.device_query = query,
            Message::PaletteDragStart(device) => self.pipeline.begin_drag(device),
            Message::PaletteDragCancel => self.pipeline.cancel(),
            Message::PaletteDrop(position) => {
                match self
                    .pipeline
                    .release(position, &self.devices, self.manager.active_canvas_mut())
                {
                    Ok(Some(_)) => self.cache.clear(),
                    Ok(None) => {}
                    Err(e) => self.report(e),
                }
            }

            Message::Canvas(event) => self.canvas_event(event),
            Message::CanvasResized(width, height) => {
                self.canvas_size = (width, height);
            }
            Message::ToggleConnectionMode => {
                self.canvas_event(CanvasEvent::Key(KeyCommand::ToggleConnectionMode))
            }
            Message::ZoomIn => {
                let anchor = self.canvas_center();
                self.canvas_event(CanvasEvent::Key(KeyCommand::ZoomIn { anchor }));
            }
            Message::ZoomOut => {
                let anchor = self.canvas_center();
                self.canvas_event(CanvasEvent::Key(KeyCommand::ZoomOut { anchor }));
            }
            Message::ResetView => self.canvas_event(CanvasEvent::Key(KeyCommand::ResetView)),
            Message::DeleteSelection => self.canvas_event(CanvasEvent::Key(KeyCommand::Delete)),
            Message::SetEdgeKind(kind) => {
                if let Some(canvas) = self.manager.active_canvas_mut() {
                    match canvas.set_selected_edge_kind(kind) {
                        Ok(_) => self.cache.clear(),
                        Err(e) => self.report(e),
                    }
                }
            }

            Message::DismissError => self.error = None,
            Message::DismissWarning => self.warning = None,
            Message::DismissNotice => self.notice = None,

            Message::Tick => {
                if let Some(canvas) = self.manager.active_canvas_mut()
                    && canvas.tick(Instant::now())
                {
                    self.cache.clear();
                }
            }
        }

        Task::none()
    }

    /// Tick only while connection feedback is on screen.
    pub fn subscription(&self) -> Subscription<Message> {
        if self.manager.canvas().interaction().has_feedback() {
            tick_subscription()
        } else {
            Subscription::none()
        }
    }

    /// Render the view.
    pub fn view(&self) -> Element<'_, Message> {
        let graph = self.manager.active().map(|_| self.manager.canvas().graph());
        let entries = available_devices(
            &self.devices,
            &self.device_query,
            self.config.editor.palette_limit,
            graph,
        );

        let sidebar = column![
            sidebar_view(
                self.manager.filtered(),
                self.manager.active_id(),
                self.manager.search_query(),
                self.manager.is_loading(),
            ),
            rule::horizontal(1),
            palette_view(
                entries,
                &self.device_query,
                self.pipeline.dragging(),
                self.manager.active().is_some(),
            ),
        ]
        .width(Length::Fixed(300.0));

        let editor = editor_view(EditorView {
            active: self.manager.active(),
            canvas: self.manager.canvas(),
            cache: &self.cache,
            dragging_device: self.pipeline.dragging(),
            canvas_size: self.canvas_size,
            loading: self.manager.is_loading(),
            saving: self.saving,
            error: self.error.as_deref(),
            warning: self.warning.as_deref(),
            notice: self.notice.as_deref(),
        });

        let base = row![sidebar, rule::vertical(1), editor];

        match &self.dialog {
            Some(dialog) => {
                let overlay = center(dialog_view(dialog, self.dialog_error.as_deref())).style(
                    |_theme: &Theme| container::Style {
                        background: Some(iced::Background::Color(iced::Color {
                            a: 0.6,
                            ..iced::Color::BLACK
                        })),
                        ..Default::default()
                    },
                );
                stack![base, opaque(overlay)].into()
            }
            None => base.into(),
        }
    }

    /// Get the application theme.
    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    pub fn manager(&self) -> &TopologyManager<S> {
        &self.manager
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    pub fn dialog_error(&self) -> Option<&str> {
        self.dialog_error.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn devices(&self) -> &[DeviceRecord] {
        &self.devices
    }

    fn canvas_event(&mut self, event: CanvasEvent) {
        let Some(canvas) = self.manager.active_canvas_mut() else {
            return;
        };
        match canvas.handle(event, Instant::now()) {
            Outcome::Ignored => {}
            _ => self.cache.clear(),
        }
    }

    fn canvas_center(&self) -> Point {
        let (width, height) = self.canvas_size;
        Point::new(f64::from(width) / 2.0, f64::from(height) / 2.0)
    }

    /// Route an error to the banner matching its severity.
    fn report(&mut self, error: Error) {
        if error.is_warning() {
            tracing::warn!(error = %error, "Editor warning");
            self.warning = Some(error.to_string());
        } else {
            tracing::error!(error = %error, "Editor error");
            self.error = Some(error.to_string());
        }
    }

    fn open_dialog(&mut self, dialog: Dialog) {
        self.dialog = Some(dialog);
        self.dialog_error = None;
    }

    fn close_dialog(&mut self) {
        self.dialog = None;
        self.dialog_error = None;
    }

    fn submit_dialog(&mut self) -> Task<Message> {
        let Some(dialog) = self.dialog.clone() else {
            return Task::none();
        };

        let task = match dialog {
            Dialog::Create { name, description } => {
                match self.manager.create_payload(&name, &description) {
                    Ok(payload) => {
                        let store = self.manager.store().clone();
                        Task::perform(
                            async move {
                                store
                                    .create(payload)
                                    .await
                                    .map_err(Error::into_network_message)
                            },
                            Message::TopologyCreated,
                        )
                    }
                    Err(e) => return self.dialog_failed(e),
                }
            }
            Dialog::Rename {
                id,
                name,
                description,
            } => match self.manager.rename_payload(&name, &description) {
                Ok(payload) => {
                    let store = self.manager.store().clone();
                    Task::perform(
                        async move {
                            store
                                .update(id, payload)
                                .await
                                .map_err(Error::into_network_message)
                        },
                        Message::TopologyRenamed,
                    )
                }
                Err(e) => return self.dialog_failed(e),
            },
            Dialog::ConfirmDelete { id, .. } => {
                let store = self.manager.store().clone();
                Task::perform(
                    async move {
                        store
                            .delete(id)
                            .await
                            .map_err(Error::into_network_message)
                    },
                    move |result| Message::TopologyDeleted(id, result),
                )
            }
            Dialog::Import { path } => {
                let imported = match persistence::read_import(path.trim()) {
                    Ok(imported) => imported,
                    Err(e) => return self.dialog_failed(e),
                };
                let source = imported.name.clone();
                match self.manager.import(imported) {
                    Ok(warning) => {
                        self.warning = warning.map(|w| w.to_string());
                        self.notice = Some(format!("Imported \"{}\"; save to keep it", source));
                        self.cache.clear();
                    }
                    Err(e) => return self.dialog_failed(e),
                }
                Task::none()
            }
        };

        self.close_dialog();
        task
    }

    fn dialog_failed(&mut self, error: Error) -> Task<Message> {
        tracing::debug!(error = %error, "Dialog input rejected");
        self.dialog_error = Some(error.to_string());
        Task::none()
    }

    fn export(&mut self) {
        let result = self.manager.export(Utc::now()).and_then(|(file_name, document)| {
            let path = export_dir().join(file_name);
            persistence::write_export(&path, &document)?;
            Ok(path)
        });
        match result {
            Ok(path) => {
                tracing::info!(path = %path.display(), "Topology exported");
                self.notice = Some(format!("Exported to {}", path.display()));
            }
            Err(e) => self.report(e),
        }
    }

    fn list_task(&self) -> Task<Message> {
        let store = self.manager.store().clone();
        Task::perform(
            async move {
                store
                    .list()
                    .await
                    .map_err(Error::into_network_message)
            },
            Message::TopologiesListed,
        )
    }

    fn devices_task(&self) -> Task<Message> {
        let store = self.manager.store().clone();
        Task::perform(
            async move {
                store
                    .list_devices()
                    .await
                    .map_err(Error::into_network_message)
            },
            Message::DevicesLoaded,
        )
    }

    fn load_task(&mut self, id: TopologyId) -> Task<Message> {
        let ticket = self.manager.begin_load(id);
        self.cache.clear();
        let store = self.manager.store().clone();
        Task::perform(
            async move {
                store
                    .fetch(id)
                    .await
                    .map_err(Error::into_network_message)
            },
            move |result| Message::TopologyLoaded(ticket, result),
        )
    }

    fn save_task(&mut self) -> Task<Message> {
        if self.saving {
            return Task::none();
        }
        let request = match self.manager.begin_save() {
            Ok(request) => request,
            Err(e) => {
                self.report(e);
                return Task::none();
            }
        };
        self.saving = true;
        let id = request.id;
        let store = self.manager.store().clone();
        Task::perform(
            async move {
                store
                    .update(request.id, request.payload)
                    .await
                    .map_err(Error::into_network_message)
            },
            move |result| Message::Saved(id, result),
        )
    }
}

/// Directory export files are written to.
fn export_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}
