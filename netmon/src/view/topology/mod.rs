//! Topology editor pane: banners, toolbar and the graph canvas.

pub mod graph;

use iced::widget::canvas::Cache;
use iced::widget::{button, center, column, container, pick_list, row, text};
use iced::{Alignment, Element, Length, Theme};

use netmon_common::{DeviceId, EdgeKind, TopologySummary};

use crate::editor::Canvas;
use crate::message::Message;

use graph::graph_view;

/// Everything the editor pane renders from.
pub struct EditorView<'a> {
    pub active: Option<&'a TopologySummary>,
    pub canvas: &'a Canvas,
    pub cache: &'a Cache,
    pub dragging_device: Option<DeviceId>,
    pub canvas_size: (f32, f32),
    pub loading: bool,
    pub saving: bool,
    pub error: Option<&'a str>,
    pub warning: Option<&'a str>,
    pub notice: Option<&'a str>,
}

/// Severity of a banner above the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Error,
    Warning,
    Notice,
}

impl BannerKind {
    fn color(self) -> iced::Color {
        match self {
            BannerKind::Error => iced::Color::from_rgb8(0xef, 0x44, 0x44),
            BannerKind::Warning => iced::Color::from_rgb8(0xf5, 0x9e, 0x0b),
            BannerKind::Notice => iced::Color::from_rgb8(0x22, 0xc5, 0x5e),
        }
    }

    fn dismiss(self) -> Message {
        match self {
            BannerKind::Error => Message::DismissError,
            BannerKind::Warning => Message::DismissWarning,
            BannerKind::Notice => Message::DismissNotice,
        }
    }
}

/// Render the editor pane.
pub fn editor_view(view: EditorView<'_>) -> Element<'_, Message> {
    let mut content = column![].spacing(8);

    for (kind, message) in [
        (BannerKind::Error, view.error),
        (BannerKind::Warning, view.warning),
        (BannerKind::Notice, view.notice),
    ] {
        if let Some(message) = message {
            content = content.push(banner(kind, message));
        }
    }

    let body: Element<'_, Message> = match view.active {
        _ if view.loading => placeholder("Loading topology..."),
        None => placeholder("Select or create a topology to start editing"),
        Some(active) => column![
            toolbar(active, view.canvas, view.saving),
            graph_view(
                view.canvas,
                view.cache,
                view.dragging_device,
                view.canvas_size
            ),
        ]
        .spacing(8)
        .into(),
    };
    content = content.push(body);

    container(content.padding(12))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

/// Dismissable message strip.
pub fn banner(kind: BannerKind, message: &str) -> Element<'_, Message> {
    let color = kind.color();
    let strip = row![
        text(message).size(13).width(Length::Fill),
        button(text("Dismiss").size(11))
            .on_press(kind.dismiss())
            .style(iced::widget::button::text),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    container(strip)
        .padding(8)
        .width(Length::Fill)
        .style(move |_theme: &Theme| container::Style {
            background: Some(iced::Background::Color(iced::Color {
                a: 0.15,
                ..color
            })),
            border: iced::Border {
                color,
                width: 1.0,
                radius: 4.0.into(),
            },
            ..Default::default()
        })
        .into()
}

fn toolbar<'a>(active: &'a TopologySummary, canvas: &'a Canvas, saving: bool) -> Element<'a, Message> {
    let interaction = canvas.interaction();
    let graph = canvas.graph();

    let title = column![
        text(&active.name).size(20),
        text(format!(
            "{} devices · {} connections",
            graph.node_count(),
            graph.edge_count()
        ))
        .size(11),
    ]
    .spacing(2)
    .width(Length::Fill);

    let connect_label = if interaction.connection_mode() {
        "Connect: ON"
    } else {
        "Connect: OFF"
    };
    let connect_style = if interaction.connection_mode() {
        iced::widget::button::primary
    } else {
        iced::widget::button::secondary
    };

    let zoom = text(format!(
        "{}%",
        (canvas.viewport().zoom() * 100.0).round() as i32
    ))
    .size(12);

    let mut delete = button(text("Delete selection").size(12)).style(iced::widget::button::danger);
    if !interaction.selection().is_empty() {
        delete = delete.on_press(Message::DeleteSelection);
    }

    let mut bar = row![
        title,
        button(text(connect_label).size(12))
            .on_press(Message::ToggleConnectionMode)
            .style(connect_style),
        button(text("-").size(12))
            .on_press(Message::ZoomOut)
            .style(iced::widget::button::secondary),
        zoom,
        button(text("+").size(12))
            .on_press(Message::ZoomIn)
            .style(iced::widget::button::secondary),
        button(text("Reset").size(12))
            .on_press(Message::ResetView)
            .style(iced::widget::button::secondary),
        delete,
    ]
    .spacing(8)
    .align_y(Alignment::Center);

    if canvas.has_selected_edges() {
        bar = bar.push(
            pick_list(EdgeKind::ALL, canvas.selected_edge_kind(), Message::SetEdgeKind)
                .placeholder("Mixed")
                .text_size(12),
        );
    }

    let mut save = button(text(if saving { "Saving..." } else { "Save" }).size(12))
        .style(iced::widget::button::primary);
    if !saving {
        save = save.on_press(Message::Save);
    }

    bar.push(save)
        .push(
            button(text("Export").size(12))
                .on_press(Message::Export)
                .style(iced::widget::button::secondary),
        )
        .push(
            button(text("Import").size(12))
                .on_press(Message::OpenImportDialog)
                .style(iced::widget::button::secondary),
        )
        .into()
}

fn placeholder<'a>(message: &'a str) -> Element<'a, Message> {
    center(text(message).size(16)).into()
}
