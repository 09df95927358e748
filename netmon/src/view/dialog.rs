//! Modal dialogs for topology create, rename, delete and import.

use iced::widget::{button, column, container, row, text, text_input};
use iced::{Alignment, Element, Length, Theme};

use netmon_common::TopologyId;

use crate::message::Message;

/// The dialog currently open over the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    Create {
        name: String,
        description: String,
    },
    Rename {
        id: TopologyId,
        name: String,
        description: String,
    },
    ConfirmDelete {
        id: TopologyId,
        name: String,
    },
    Import {
        path: String,
    },
}

impl Dialog {
    pub fn create() -> Self {
        Dialog::Create {
            name: String::new(),
            description: String::new(),
        }
    }

    pub fn set_name(&mut self, value: String) {
        if let Dialog::Create { name, .. } | Dialog::Rename { name, .. } = self {
            *name = value;
        }
    }

    pub fn set_description(&mut self, value: String) {
        if let Dialog::Create { description, .. } | Dialog::Rename { description, .. } = self {
            *description = value;
        }
    }

    pub fn set_path(&mut self, value: String) {
        if let Dialog::Import { path } = self {
            *path = value;
        }
    }
}

/// Render a dialog card; `error` is shown under the inputs.
pub fn dialog_view<'a>(dialog: &'a Dialog, error: Option<&'a str>) -> Element<'a, Message> {
    let (title, body, submit): (&str, Element<'a, Message>, &str) = match dialog {
        Dialog::Create { name, description } => {
            ("New Topology", metadata_inputs(name, description), "Create")
        }
        Dialog::Rename {
            name, description, ..
        } => ("Rename Topology", metadata_inputs(name, description), "Save"),
        Dialog::ConfirmDelete { name, .. } => (
            "Delete Topology",
            text(format!("Delete \"{}\"? This cannot be undone.", name))
                .size(14)
                .into(),
            "Delete",
        ),
        Dialog::Import { path } => (
            "Import Topology",
            text_input("Path to exported .json file", path)
                .on_input(Message::DialogPathChanged)
                .on_submit(Message::SubmitDialog)
                .padding(8)
                .into(),
            "Import",
        ),
    };

    let submit_style = if matches!(dialog, Dialog::ConfirmDelete { .. }) {
        iced::widget::button::danger
    } else {
        iced::widget::button::primary
    };

    let actions = row![
        button(text("Cancel").size(14))
            .on_press(Message::CancelDialog)
            .style(iced::widget::button::secondary),
        button(text(submit).size(14))
            .on_press(Message::SubmitDialog)
            .style(submit_style),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let mut content = column![text(title).size(20), body].spacing(14);
    if let Some(error) = error {
        content = content.push(text(error).size(12).style(|_theme: &Theme| text::Style {
            color: Some(iced::Color::from_rgb(0.9, 0.3, 0.3)),
        }));
    }
    content = content.push(actions);

    container(content)
        .padding(20)
        .width(Length::Fixed(380.0))
        .style(container::rounded_box)
        .into()
}

fn metadata_inputs<'a>(name: &'a str, description: &'a str) -> Element<'a, Message> {
    column![
        text_input("Topology name", name)
            .on_input(Message::DialogNameChanged)
            .on_submit(Message::SubmitDialog)
            .padding(8),
        text_input("Description (optional)", description)
            .on_input(Message::DialogDescriptionChanged)
            .padding(8),
    ]
    .spacing(8)
    .into()
}
