//! Terminal input through crossterm.
//!
//! [`TerminalDevice`] folds crossterm events into the pointer and key-edge
//! samples the engine consumes. Terminal cells are mapped to surface pixels
//! with a fixed cell size.
//!
//! Most terminals report key presses only. Unless release reporting is
//! enabled, each press becomes a down edge immediately followed by an up edge,
//! with the held modifiers reported as keys around it so that combinations
//! such as Ctrl+S still match.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, ModifierKeyCode, MouseButton,
    MouseEventKind,
};
use tracing::trace;

use super::device::{Device, Key, KeyEdge, MouseButtons, PointerState, PointerTracker};
use crate::error::{Error, Result};
use crate::geometry::{Offset, Size};

impl Key {
    /// Map a crossterm key code. Codes without an engine counterpart map to `None`.
    pub fn from_crossterm(code: KeyCode) -> Option<Key> {
        Some(match code {
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Enter => Key::Enter,
            KeyCode::Esc => Key::Escape,
            KeyCode::Tab => Key::Tab,
            KeyCode::BackTab => Key::BackTab,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Delete => Key::Delete,
            KeyCode::Left => Key::Left,
            KeyCode::Right => Key::Right,
            KeyCode::Up => Key::Up,
            KeyCode::Down => Key::Down,
            KeyCode::Home => Key::Home,
            KeyCode::End => Key::End,
            KeyCode::PageUp => Key::PageUp,
            KeyCode::PageDown => Key::PageDown,
            KeyCode::F(n) => Key::F(n),
            KeyCode::Modifier(m) => match m {
                ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => Key::Shift,
                ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => Key::Ctrl,
                ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => Key::Alt,
                _ => return None,
            },
            _ => return None,
        })
    }
}

impl From<MouseButton> for MouseButtons {
    fn from(b: MouseButton) -> Self {
        match b {
            MouseButton::Left => MouseButtons::LEFT,
            MouseButton::Right => MouseButtons::RIGHT,
            MouseButton::Middle => MouseButtons::MIDDLE,
        }
    }
}

fn modifier_keys(m: KeyModifiers) -> Vec<Key> {
    let mut out = Vec::new();
    if m.contains(KeyModifiers::CONTROL) {
        out.push(Key::Ctrl);
    }
    if m.contains(KeyModifiers::ALT) {
        out.push(Key::Alt);
    }
    if m.contains(KeyModifiers::SHIFT) {
        out.push(Key::Shift);
    }
    out
}

/// Device adapter over crossterm's event queue.
#[derive(Debug)]
pub struct TerminalDevice {
    cell: Size,
    reports_releases: bool,
    pointer: PointerTracker,
    edges: VecDeque<KeyEdge>,
    resize: Option<Size>,
}

impl Default for TerminalDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalDevice {
    /// One pixel per cell, press-only keyboard.
    pub fn new() -> Self {
        Self {
            cell: Size::new(1, 1),
            reports_releases: false,
            pointer: PointerTracker::new(),
            edges: VecDeque::new(),
            resize: None,
        }
    }

    /// Pixel size of one terminal cell.
    pub fn with_cell_size(mut self, cell: Size) -> Self {
        self.cell = cell;
        self
    }

    /// Trust the terminal's key release events (keyboard enhancement enabled).
    pub fn with_release_events(mut self, enabled: bool) -> Self {
        self.reports_releases = enabled;
        self
    }

    /// Read every event already queued by the terminal without blocking.
    /// Returns how many were consumed.
    pub fn pump(&mut self) -> io::Result<usize> {
        let mut n = 0;
        while event::poll(Duration::ZERO)? {
            self.feed(event::read()?);
            n += 1;
        }
        Ok(n)
    }

    /// Fold one crossterm event into the pending samples.
    pub fn feed(&mut self, ev: Event) {
        match ev {
            Event::Key(key) => {
                let Some(code) = Key::from_crossterm(key.code) else {
                    return;
                };
                if self.reports_releases {
                    let edge = match key.kind {
                        KeyEventKind::Release => KeyEdge::up(code),
                        KeyEventKind::Press | KeyEventKind::Repeat => KeyEdge::down(code),
                    };
                    self.edges.push_back(edge);
                } else if key.kind != KeyEventKind::Release {
                    let mods = modifier_keys(key.modifiers);
                    self.edges.extend(mods.iter().map(|&m| KeyEdge::down(m)));
                    self.edges.push_back(KeyEdge::down(code));
                    self.edges.push_back(KeyEdge::up(code));
                    self.edges.extend(mods.iter().rev().map(|&m| KeyEdge::up(m)));
                }
            }
            Event::Mouse(mouse) => {
                self.pointer.move_to(Offset::new(
                    i32::from(mouse.column) * self.cell.width,
                    i32::from(mouse.row) * self.cell.height,
                ));
                match mouse.kind {
                    MouseEventKind::Down(b) => self.pointer.press(b.into()),
                    MouseEventKind::Up(b) => self.pointer.release(b.into()),
                    MouseEventKind::Drag(b) => self.pointer.hold(b.into()),
                    MouseEventKind::ScrollDown => self.pointer.scroll(1),
                    MouseEventKind::ScrollUp => self.pointer.scroll(-1),
                    _ => {}
                }
            }
            Event::Resize(cols, rows) => {
                self.resize = Some(Size::new(
                    i32::from(cols) * self.cell.width,
                    i32::from(rows) * self.cell.height,
                ));
            }
            _ => {}
        }
        trace!(position = ?self.pointer.position(), "terminal event");
    }
}

impl Device for TerminalDevice {
    fn poll(&mut self) -> Result<()> {
        self.pump().map_err(|e| Error::Device(e.to_string()))?;
        Ok(())
    }

    /// Latest terminal size in pixels.
    fn take_resize(&mut self) -> Option<Size> {
        self.resize.take()
    }

    fn pointer(&mut self) -> PointerState {
        self.pointer.sample()
    }

    fn next_key_edge(&mut self) -> Option<KeyEdge> {
        self.edges.pop_front()
    }
}
