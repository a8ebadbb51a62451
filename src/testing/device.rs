//! A device driven by the test instead of hardware.

use std::collections::VecDeque;

use crate::geometry::{Offset, Size};
use crate::input::{Device, Key, KeyEdge, MouseButtons, PointerState, PointerTracker};

/// [`Device`] fed by explicit calls. Everything queued between two ticks is
/// seen by the next tick.
#[derive(Debug, Default)]
pub struct ScriptedDevice {
    pointer: PointerTracker,
    edges: VecDeque<KeyEdge>,
    resize: Option<Size>,
}

impl ScriptedDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: i32, y: i32) -> &mut Self {
        self.pointer.move_to(Offset::new(x, y));
        self
    }

    pub fn press(&mut self, buttons: MouseButtons) -> &mut Self {
        self.pointer.press(buttons);
        self
    }

    pub fn release(&mut self, buttons: MouseButtons) -> &mut Self {
        self.pointer.release(buttons);
        self
    }

    /// Press and release the left button at `(x, y)`.
    pub fn click(&mut self, x: i32, y: i32) -> &mut Self {
        self.move_to(x, y).press(MouseButtons::LEFT).release(MouseButtons::LEFT)
    }

    pub fn scroll(&mut self, steps: i32) -> &mut Self {
        self.pointer.scroll(steps);
        self
    }

    pub fn key_down(&mut self, key: Key) -> &mut Self {
        self.edges.push_back(KeyEdge::down(key));
        self
    }

    pub fn key_up(&mut self, key: Key) -> &mut Self {
        self.edges.push_back(KeyEdge::up(key));
        self
    }

    /// Down then up.
    pub fn tap(&mut self, key: Key) -> &mut Self {
        self.key_down(key).key_up(key)
    }

    /// Each character of `text` as a tap.
    pub fn type_text(&mut self, text: &str) -> &mut Self {
        for c in text.chars() {
            self.tap(Key::Char(c));
        }
        self
    }

    pub fn resize(&mut self, size: Size) -> &mut Self {
        self.resize = Some(size);
        self
    }

    pub fn pending_edges(&self) -> usize {
        self.edges.len()
    }
}

impl Device for ScriptedDevice {
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
