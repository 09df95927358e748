//! Device palette: catalog devices that can be dragged onto the canvas.

use iced::widget::{Column, column, container, mouse_area, row, scrollable, text, text_input};
use iced::{Alignment, Element, Length, Theme};

use netmon_common::{DeviceCategory, DeviceId};

use super::muted;
use crate::editor::PaletteEntry;
use crate::message::Message;

/// Render the palette.
///
/// Pressing an entry starts a drag; the canvas reports where it ends.
pub fn palette_view<'a>(
    entries: Vec<PaletteEntry>,
    query: &'a str,
    dragging: Option<DeviceId>,
    has_active: bool,
) -> Element<'a, Message> {
    let search = text_input("Search devices...", query)
        .on_input(Message::SearchDevices)
        .padding(6);

    let hint = if !has_active {
        "Open a topology to place devices"
    } else if dragging.is_some() {
        "Release over the canvas to place"
    } else {
        "Drag a device onto the canvas"
    };

    let list: Element<'a, Message> = if entries.is_empty() {
        text("No devices found").size(12).style(muted).into()
    } else {
        let rows = entries
            .into_iter()
            .map(move |entry| device_row(entry, dragging));
        scrollable(Column::with_children(rows).spacing(4))
            .height(Length::Fill)
            .into()
    };

    column![
        text("Devices").size(18),
        search,
        text(hint).size(11).style(muted),
        list
    ]
    .spacing(10)
    .padding(12)
    .into()
}

fn device_row<'a>(entry: PaletteEntry, dragging: Option<DeviceId>) -> Element<'a, Message> {
    let device = entry.device;
    let id = device.id;
    let online = device.is_online();
    let category = DeviceCategory::from_label(&device.category);

    let mut details = format!("{} · {}", device.ip_address, category.glyph());
    if entry.placements > 0 {
        details.push_str(&format!(" · placed x{}", entry.placements));
    }

    let content = row![
        status_led(online),
        column![
            text(device.name).size(13),
            text(details).size(11).style(muted)
        ]
        .spacing(2)
    ]
    .spacing(8)
    .align_y(Alignment::Center);

    let is_dragging = dragging == Some(id);
    let card = container(content)
        .padding(6)
        .width(Length::Fill)
        .style(move |theme: &Theme| {
            let mut style = container::rounded_box(theme);
            if is_dragging {
                style.border.color = iced::Color::from_rgb8(0x3b, 0x82, 0xf6);
                style.border.width = 1.0;
            }
            style
        });

    mouse_area(card)
        .on_press(Message::PaletteDragStart(id))
        .interaction(iced::mouse::Interaction::Grab)
        .into()
}

/// Small round online/offline indicator.
fn status_led<'a>(online: bool) -> Element<'a, Message> {
    let color = if online {
        iced::Color::from_rgb(0.2, 0.8, 0.3)
    } else {
        iced::Color::from_rgb(0.9, 0.2, 0.2)
    };

    container(text(""))
        .width(Length::Fixed(10.0))
        .height(Length::Fixed(10.0))
        .style(move |_theme: &Theme| container::Style {
            background: Some(iced::Background::Color(color)),
            border: iced::Border {
                color: iced::Color::from_rgb(0.3, 0.3, 0.3),
                width: 1.0,
                radius: 5.0.into(),
            },
            ..Default::default()
        })
        .into()
}
