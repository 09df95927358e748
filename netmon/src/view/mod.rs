//! View components for the Netmon application.

pub mod dialog;
pub mod palette;
pub mod sidebar;
pub mod topology;

use iced::Theme;
use iced::widget::text;

/// Secondary text colour.
pub(crate) fn muted(_theme: &Theme) -> text::Style {
    text::Style {
        color: Some(iced::Color::from_rgb(0.55, 0.55, 0.6)),
    }
}
