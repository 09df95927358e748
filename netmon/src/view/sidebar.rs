//! Topology list sidebar.

use iced::widget::{Column, button, column, row, scrollable, text, text_input};
use iced::{Alignment, Element, Length};

use netmon_common::{TopologyId, TopologySummary};

use super::muted;
use crate::message::Message;

/// Render the topology list with search and CRUD actions.
pub fn sidebar_view<'a>(
    topologies: Vec<&'a TopologySummary>,
    active: Option<TopologyId>,
    query: &'a str,
    loading: bool,
) -> Element<'a, Message> {
    let header = row![
        text("Topologies").size(18).width(Length::Fill),
        button(text("Refresh").size(12))
            .on_press(Message::RefreshTopologies)
            .style(iced::widget::button::secondary),
        button(text("New").size(12))
            .on_press(Message::OpenCreateDialog)
            .style(iced::widget::button::primary),
    ]
    .spacing(6)
    .align_y(Alignment::Center);

    let search = text_input("Search topologies...", query)
        .on_input(Message::SearchTopologies)
        .padding(6);

    let list: Element<'a, Message> = if topologies.is_empty() {
        let hint = if query.trim().is_empty() {
            "No topologies yet"
        } else {
            "No topologies match"
        };
        text(hint).size(12).style(muted).into()
    } else {
        let rows = topologies
            .into_iter()
            .map(|topology| topology_row(topology, active == Some(topology.id), loading));
        scrollable(Column::with_children(rows).spacing(4))
            .height(Length::Fill)
            .into()
    };

    column![header, search, list].spacing(10).padding(12).into()
}

fn topology_row(topology: &TopologySummary, is_active: bool, loading: bool) -> Element<'_, Message> {
    let summary = column![
        text(&topology.name).size(14),
        text(format!("{} devices", topology.device_count))
            .size(11)
            .style(muted),
    ]
    .spacing(2);

    let style = if is_active {
        iced::widget::button::primary
    } else {
        iced::widget::button::text
    };
    let mut open = button(summary).width(Length::Fill).style(style);
    if !(is_active && loading) {
        open = open.on_press(Message::SelectTopology(topology.id));
    }

    row![
        open,
        button(text("Rename").size(11))
            .on_press(Message::OpenRenameDialog(topology.id))
            .style(iced::widget::button::secondary),
        button(text("Delete").size(11))
            .on_press(Message::RequestDelete(topology.id))
            .style(iced::widget::button::danger),
    ]
    .spacing(4)
    .align_y(Alignment::Center)
    .into()
}
