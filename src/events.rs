//! Translation of raw terminal events into application events.

use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Key(KeyEvent),
    Click { col: u16, row: u16 },
    DoubleClick { col: u16, row: u16 },
    Scroll { col: u16, row: u16, delta: isize },
    Resize { width: u16, height: u16 },
    Paste(String),
}

/// Synthesises double clicks from consecutive left-button presses.
///
/// Only presses are looked at, so a single physical click never counts twice.
pub struct ClickTracker {
    window: Duration,
    distance: u16,
    last_press: Option<(Instant, u16, u16)>,
}

impl ClickTracker {
    pub fn new(window: Duration, distance: u16) -> Self {
        Self {
            window,
            distance,
            last_press: None,
        }
    }

    pub fn translate(&mut self, event: Event, now: Instant) -> Option<AppEvent> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
            Event::Key(_) => None,
            Event::Mouse(mouse) => self.mouse(mouse, now),
            Event::Resize(width, height) => Some(AppEvent::Resize { width, height }),
            Event::Paste(text) => Some(AppEvent::Paste(text)),
            _ => None,
        }
    }

    fn mouse(&mut self, mouse: MouseEvent, now: Instant) -> Option<AppEvent> {
        let (col, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let is_double = self.last_press.is_some_and(|(at, last_col, last_row)| {
                    now.duration_since(at) <= self.window
                        && last_row == row
                        && last_col.abs_diff(col) <= self.distance
                });

                if is_double {
                    self.last_press = None;
                    Some(AppEvent::DoubleClick { col, row })
                } else {
                    self.last_press = Some((now, col, row));
                    Some(AppEvent::Click { col, row })
                }
            }
            MouseEventKind::ScrollUp => Some(AppEvent::Scroll { col, row, delta: -1 }),
            MouseEventKind::ScrollDown => Some(AppEvent::Scroll { col, row, delta: 1 }),
            _ => None,
        }
    }
}
