//! Canvas widget for the topology editor.
//!
//! The program translates iced input into [`CanvasEvent`]s and draws the
//! graph straight from the engine state; it holds no editor state itself.

use iced::keyboard::{self, Key, key::Named};
use iced::mouse;
use iced::widget::canvas::{self, Cache, Frame, Geometry, LineDash, Path, Stroke, Text};
use iced::{Color, Element, Length, Rectangle, Renderer, Theme};

use netmon_common::{DeviceCategory, DeviceId, Point};

use crate::editor::edge::{Arrowhead, Rgba, StrokeLayer};
use crate::editor::interaction::Hit;
use crate::editor::{
    Canvas, CanvasEvent, Highlight, KeyCommand, Modifiers, Node, PointerButton, RenderedEdge,
};
use crate::message::Message;

/// Pixels per wheel "line" for trackpads reporting pixel deltas.
const PIXELS_PER_LINE: f32 = 50.0;

/// Build the canvas widget.
pub fn graph_view<'a>(
    canvas: &'a Canvas,
    cache: &'a Cache,
    dragging_device: Option<DeviceId>,
    known_size: (f32, f32),
) -> Element<'a, Message> {
    iced::widget::canvas(TopologyGraph {
        canvas,
        cache,
        dragging_device,
        known_size,
    })
    .width(Length::Fill)
    .height(Length::Fill)
    .into()
}

/// Canvas program drawing one topology.
struct TopologyGraph<'a> {
    canvas: &'a Canvas,
    cache: &'a Cache,
    dragging_device: Option<DeviceId>,
    known_size: (f32, f32),
}

/// Widget-local state: the keyboard modifiers currently held.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphInput {
    modifiers: keyboard::Modifiers,
}

impl canvas::Program<Message> for TopologyGraph<'_> {
    type State = GraphInput;

    fn update(
        &self,
        input: &mut Self::State,
        event: &canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        self.input_message(input, event, bounds, cursor)
            .map(Published::into_action)
    }

    fn draw(
        &self,
        _input: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let geometry = self.cache.draw(renderer, bounds.size(), |frame| {
            self.draw_graph(frame, bounds);
        });

        vec![geometry]
    }

    fn mouse_interaction(
        &self,
        _input: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if self.canvas.interaction().is_grabbing() {
            return mouse::Interaction::Grabbing;
        }
        let Some(position) = cursor.position_in(bounds) else {
            return mouse::Interaction::default();
        };
        if self.dragging_device.is_some() {
            return mouse::Interaction::Crosshair;
        }

        let hit = self.canvas.interaction().hit_test(
            from_iced_point(position),
            self.canvas.graph(),
            self.canvas.viewport(),
        );
        match hit {
            Hit::Node(_) if self.canvas.interaction().connection_mode() => {
                mouse::Interaction::Crosshair
            }
            Hit::Node(_) | Hit::Edge(_) => mouse::Interaction::Pointer,
            Hit::Empty => mouse::Interaction::Grab,
        }
    }
}

/// A message emitted by the program, and whether it captures the event.
#[derive(Debug, Clone)]
struct Published {
    message: Message,
    capture: bool,
}

impl Published {
    fn captured(event: CanvasEvent) -> Self {
        Self {
            message: Message::Canvas(event),
            capture: true,
        }
    }

    fn passed(message: Message) -> Self {
        Self {
            message,
            capture: false,
        }
    }

    fn into_action(self) -> canvas::Action<Message> {
        let action = canvas::Action::publish(self.message);
        if self.capture { action.and_capture() } else { action }
    }
}

impl TopologyGraph<'_> {
    /// Translate one iced event. A size change is reported only when the
    /// event itself produced nothing, so no input is lost to a resize.
    fn input_message(
        &self,
        input: &mut GraphInput,
        event: &canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<Published> {
        let translated = match event {
            canvas::Event::Mouse(mouse_event) => self.handle_mouse(input, mouse_event, bounds, cursor),
            canvas::Event::Keyboard(keyboard::Event::ModifiersChanged(modifiers)) => {
                input.modifiers = *modifiers;
                None
            }
            canvas::Event::Keyboard(keyboard_event) if cursor.is_over(bounds) => {
                self.handle_keyboard(keyboard_event, bounds)
            }
            _ => None,
        };

        translated.or_else(|| {
            ((bounds.width, bounds.height) != self.known_size)
                .then(|| Published::passed(Message::CanvasResized(bounds.width, bounds.height)))
        })
    }

    fn handle_mouse(
        &self,
        input: &GraphInput,
        event: &mouse::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<Published> {
        let publish = |event: CanvasEvent| Some(Published::captured(event));

        match event {
            mouse::Event::ButtonPressed(button) => {
                let button = match button {
                    mouse::Button::Left => PointerButton::Primary,
                    mouse::Button::Middle => PointerButton::Middle,
                    _ => return None,
                };
                let position = cursor.position_in(bounds)?;
                publish(CanvasEvent::PointerDown {
                    position: from_iced_point(position),
                    button,
                    modifiers: Modifiers {
                        multi: input.modifiers.command(),
                        pan: input.modifiers.shift(),
                    },
                })
            }
            mouse::Event::CursorMoved { .. } if self.canvas.interaction().is_grabbing() => {
                // Follow the pointer even when it leaves the widget.
                let position = relative_position(cursor, bounds)?;
                publish(CanvasEvent::PointerMove { position })
            }
            mouse::Event::ButtonReleased(mouse::Button::Left) if self.dragging_device.is_some() => {
                let message = match cursor.position_in(bounds) {
                    Some(position) => Message::PaletteDrop(from_iced_point(position)),
                    None => Message::PaletteDragCancel,
                };
                Some(Published::passed(message))
            }
            mouse::Event::ButtonReleased(mouse::Button::Left | mouse::Button::Middle)
                if self.canvas.interaction().is_grabbing() =>
            {
                let position = relative_position(cursor, bounds)?;
                publish(CanvasEvent::PointerUp { position })
            }
            mouse::Event::WheelScrolled { delta } => {
                let position = cursor.position_in(bounds)?;
                let lines = match delta {
                    mouse::ScrollDelta::Lines { y, .. } => *y,
                    mouse::ScrollDelta::Pixels { y, .. } => *y / PIXELS_PER_LINE,
                };
                if lines == 0.0 {
                    return None;
                }
                publish(CanvasEvent::Wheel {
                    lines: f64::from(lines),
                    position: from_iced_point(position),
                })
            }
            _ => None,
        }
    }

    fn handle_keyboard(
        &self,
        event: &keyboard::Event,
        bounds: Rectangle,
    ) -> Option<Published> {
        let keyboard::Event::KeyPressed { key, modifiers, .. } = event else {
            return None;
        };
        let anchor = Point::new(f64::from(bounds.width) / 2.0, f64::from(bounds.height) / 2.0);

        let command = match key.as_ref() {
            Key::Named(Named::Delete | Named::Backspace) => KeyCommand::Delete,
            Key::Named(Named::Escape) => KeyCommand::Escape,
            Key::Character(c) => match c {
                "a" | "A" if modifiers.command() => KeyCommand::SelectAll,
                "+" | "=" => KeyCommand::ZoomIn { anchor },
                "-" | "_" => KeyCommand::ZoomOut { anchor },
                "0" => KeyCommand::ResetView,
                "c" | "C" if !modifiers.command() => KeyCommand::ToggleConnectionMode,
                _ => return None,
            },
            _ => return None,
        };

        Some(Published::captured(CanvasEvent::Key(command)))
    }

    fn draw_graph(&self, frame: &mut Frame, bounds: Rectangle) {
        frame.fill(
            &Path::rectangle(iced::Point::ORIGIN, bounds.size()),
            Color::from_rgb(0.08, 0.08, 0.1),
        );

        for edge in self.canvas.rendered_edges() {
            draw_edge(frame, &edge);
        }

        let radius = self.canvas.screen_node_radius() as f32;
        for node in self.canvas.graph().nodes() {
            self.draw_node(frame, node, radius);
        }

        let center = iced::Point::new(bounds.width / 2.0, bounds.height / 2.0);
        if self.canvas.graph().is_empty() {
            frame.fill_text(Text {
                content: "Drag devices from the palette onto the canvas".to_string(),
                position: center,
                color: Color::from_rgb(0.5, 0.5, 0.5),
                size: 16.0.into(),
                align_x: iced::alignment::Horizontal::Center.into(),
                align_y: iced::alignment::Vertical::Center.into(),
                ..Text::default()
            });
        }

        let interaction = self.canvas.interaction();
        if interaction.connection_mode() {
            let hint = if interaction.pending_source().is_some() {
                "Click the second device to connect (Esc cancels)"
            } else {
                "Connection mode: click two devices"
            };
            frame.fill_text(Text {
                content: hint.to_string(),
                position: iced::Point::new(center.x, 16.0),
                color: Color::from_rgb(0.96, 0.62, 0.04),
                size: 13.0.into(),
                align_x: iced::alignment::Horizontal::Center.into(),
                ..Text::default()
            });
        }

        frame.fill_text(Text {
            content: format!(
                "Zoom: {}%",
                (self.canvas.viewport().zoom() * 100.0).round() as i32
            ),
            position: iced::Point::new(10.0, bounds.height - 20.0),
            color: Color::from_rgb(0.4, 0.4, 0.4),
            size: 12.0.into(),
            ..Text::default()
        });
    }

    fn draw_node(&self, frame: &mut Frame, node: &Node, radius: f32) {
        let Some(anchor) = self.canvas.node_anchor(&node.id) else {
            return;
        };
        let center = to_iced_point(anchor);
        let zoom = self.canvas.viewport().zoom() as f32;
        let category = DeviceCategory::from_label(&node.display.category);

        if let Some(ring) = highlight_color(self.canvas.interaction().node_highlight(&node.id)) {
            frame.stroke(
                &Path::circle(center, radius + 5.0),
                Stroke::default().with_color(ring).with_width(3.0),
            );
        }

        frame.fill(&Path::circle(center, radius), category_color(category));

        let status = if node.display.is_online() {
            Color::from_rgb8(0x22, 0xc5, 0x5e)
        } else {
            Color::from_rgb8(0xef, 0x44, 0x44)
        };
        frame.fill(
            &Path::circle(
                iced::Point::new(center.x + radius * 0.7, center.y - radius * 0.7),
                (5.0 * zoom).max(3.0),
            ),
            status,
        );

        frame.fill_text(Text {
            content: category.glyph().to_string(),
            position: center,
            color: Color::WHITE,
            size: (12.0 * zoom).max(8.0).into(),
            align_x: iced::alignment::Horizontal::Center.into(),
            align_y: iced::alignment::Vertical::Center.into(),
            ..Text::default()
        });

        frame.fill_text(Text {
            content: node.display.label().to_string(),
            position: iced::Point::new(center.x, center.y + radius + 6.0),
            color: Color::WHITE,
            size: (14.0 * zoom).max(11.0).into(),
            align_x: iced::alignment::Horizontal::Center.into(),
            ..Text::default()
        });

        if zoom >= 0.6 && !node.display.ip_address.is_empty() {
            frame.fill_text(Text {
                content: node.display.ip_address.clone(),
                position: iced::Point::new(center.x, center.y + radius + 22.0 * zoom.min(1.0)),
                color: Color::from_rgb(0.6, 0.6, 0.65),
                size: (11.0 * zoom).max(9.0).into(),
                align_x: iced::alignment::Horizontal::Center.into(),
                ..Text::default()
            });
        }
    }
}

fn draw_edge(frame: &mut Frame, edge: &RenderedEdge) {
    let points = &edge.path.points;
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    let path = Path::new(|builder| {
        builder.move_to(to_iced_point(*first));
        for point in rest {
            builder.line_to(to_iced_point(*point));
        }
    });

    for layer in &edge.path.layers {
        stroke_layer(frame, &path, layer);
    }
    if let Some(arrow) = &edge.path.arrow {
        draw_arrow(frame, arrow);
    }
}

fn stroke_layer(frame: &mut Frame, path: &Path, layer: &StrokeLayer) {
    let segments = layer.dash.map(|[on, off]| [on as f32, off as f32]);
    let mut stroke = Stroke::default()
        .with_color(to_color(layer.color))
        .with_width(layer.width as f32);
    if let Some(segments) = &segments {
        stroke.line_dash = LineDash {
            segments,
            offset: 0,
        };
    }
    frame.stroke(path, stroke);
}

fn draw_arrow(frame: &mut Frame, arrow: &Arrowhead) {
    let head = Path::new(|builder| {
        builder.move_to(to_iced_point(arrow.tip));
        builder.line_to(to_iced_point(arrow.left));
        builder.line_to(to_iced_point(arrow.right));
        builder.close();
    });
    frame.fill(&head, to_color(arrow.color));
}

fn highlight_color(highlight: Highlight) -> Option<Color> {
    match highlight {
        Highlight::None => None,
        Highlight::Selected => Some(Color::from_rgb8(0x3b, 0x82, 0xf6)),
        Highlight::PendingSource => Some(Color::from_rgb8(0xf5, 0x9e, 0x0b)),
        Highlight::Connected => Some(Color::from_rgb8(0x22, 0xc5, 0x5e)),
        Highlight::Rejected => Some(Color::from_rgb8(0xef, 0x44, 0x44)),
    }
}

fn category_color(category: DeviceCategory) -> Color {
    match category {
        DeviceCategory::Switch => Color::from_rgb(0.3, 0.6, 0.9),
        DeviceCategory::Server => Color::from_rgb(0.4, 0.8, 0.4),
        DeviceCategory::Wifi => Color::from_rgb(0.6, 0.4, 0.9),
        DeviceCategory::Cctv => Color::from_rgb(0.8, 0.6, 0.3),
        DeviceCategory::Tas => Color::from_rgb(0.3, 0.75, 0.75),
        DeviceCategory::Other => Color::from_rgb(0.5, 0.5, 0.5),
    }
}

fn to_color(rgba: Rgba) -> Color {
    Color::from_rgba8(rgba.r, rgba.g, rgba.b, rgba.alpha)
}

fn to_iced_point(point: Point) -> iced::Point {
    iced::Point::new(point.x as f32, point.y as f32)
}

fn from_iced_point(point: iced::Point) -> Point {
    Point::new(f64::from(point.x), f64::from(point.y))
}

/// Cursor position relative to the widget origin, inside or outside it.
fn relative_position(cursor: mouse::Cursor, bounds: Rectangle) -> Option<Point> {
    cursor.position().map(|p| {
        Point::new(
            f64::from(p.x - bounds.x),
            f64::from(p.y - bounds.y),
        )
    })
}
