use iced::mouse::{self, Cursor};
use iced::touch;
use iced::widget::canvas::{self, Program};
use iced::{Point, Rectangle, Renderer, Theme};

use crate::Message;

/// Raw vertical gesture input for the review screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Finger/button went down; carries the height of the review area
    Started { viewport_height: f32 },
    /// Total vertical travel since the press (negative is up)
    Moved(f32),
    Released,
}

/// Transparent layer over the photo that turns drags into `Gesture` messages.
/// It draws nothing; the photo and map underneath are ordinary widgets.
pub struct RevealSurface;

impl Program<Message> for RevealSurface {
    type State = DragState;

    fn draw(
        &self,
        _state: &Self::State,
        _renderer: &Renderer,
        _theme: &Theme,
        _bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        vec![]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            // Mouse button press - start dragging
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(pos) = cursor.position_over(bounds) {
                    return state.press(pos, bounds);
                }
            }
            canvas::Event::Touch(touch::Event::FingerPressed { position, .. }) => {
                if bounds.contains(position) {
                    return state.press(position, bounds);
                }
            }

            // Move - report travel if dragging
            canvas::Event::Mouse(mouse::Event::CursorMoved { position })
            | canvas::Event::Touch(touch::Event::FingerMoved { position, .. }) => {
                if let Some(origin) = state.origin {
                    let dy = position.y - origin.y;
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::Gesture(Gesture::Moved(dy))),
                    );
                }
            }

            // Release - stop dragging
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left))
            | canvas::Event::Touch(touch::Event::FingerLifted { .. })
            | canvas::Event::Touch(touch::Event::FingerLost { .. }) => {
                if state.origin.take().is_some() {
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::Gesture(Gesture::Released)),
                    );
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if state.origin.is_some() {
            mouse::Interaction::Grabbing
        } else if cursor.is_over(bounds) {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::default()
        }
    }
}

/// State for drag interactions
#[derive(Debug, Clone, Default)]
pub struct DragState {
    /// Where the press happened, while a drag is in progress
    pub origin: Option<Point>,
}

impl DragState {
    fn press(
        &mut self,
        position: Point,
        bounds: Rectangle,
    ) -> (canvas::event::Status, Option<Message>) {
        self.origin = Some(position);
        (
            canvas::event::Status::Captured,
            Some(Message::Gesture(Gesture::Started {
                viewport_height: bounds.height,
            })),
        )
    }
}
