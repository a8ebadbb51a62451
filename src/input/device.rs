//! Device sampling types.
//!
//! The engine never polls hardware itself. Once per tick it asks a [`Device`]
//! for the current pointer state and drains the pending keyboard edges; the
//! terminal adapter lives in [`super::terminal`], scripted devices in
//! [`crate::testing`].

use std::ops::{BitAnd, BitOr};

use crate::error::Result;
use crate::geometry::{Offset, Size};

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// Keyboard key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Tab,
    BackTab,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
    Shift,
    Ctrl,
    Alt,
}

/// Direction of a key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Down,
    Up,
}

/// One keyboard transition as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEdge {
    pub key: Key,
    pub kind: EdgeKind,
    /// Character produced by the transition, if any.
    pub ch: Option<char>,
}

impl KeyEdge {
    pub fn down(key: Key) -> Self {
        Self { key, kind: EdgeKind::Down, ch: char_of(key) }
    }

    pub fn up(key: Key) -> Self {
        Self { key, kind: EdgeKind::Up, ch: None }
    }

    pub fn is_down(&self) -> bool {
        self.kind == EdgeKind::Down
    }
}

fn char_of(key: Key) -> Option<char> {
    match key {
        Key::Char(c) => Some(c),
        Key::Enter => Some('\n'),
        Key::Tab => Some('\t'),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// MouseButtons
// ---------------------------------------------------------------------------

/// Pointer button bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MouseButtons(pub u8);

impl MouseButtons {
    pub const NONE: MouseButtons = MouseButtons(0);
    pub const LEFT: MouseButtons = MouseButtons(1);
    pub const RIGHT: MouseButtons = MouseButtons(2);
    pub const MIDDLE: MouseButtons = MouseButtons(4);

    pub fn contains(self, other: MouseButtons) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Same bits with `other` removed.
    pub fn without(self, other: MouseButtons) -> MouseButtons {
        MouseButtons(self.0 & !other.0)
    }
}

impl BitOr for MouseButtons {
    type Output = MouseButtons;
    fn bitor(self, rhs: Self) -> Self::Output {
        MouseButtons(self.0 | rhs.0)
    }
}

impl BitAnd for MouseButtons {
    type Output = MouseButtons;
    fn bitand(self, rhs: Self) -> Self::Output {
        MouseButtons(self.0 & rhs.0)
    }
}

// ---------------------------------------------------------------------------
// PointerState
// ---------------------------------------------------------------------------

/// Pointer snapshot taken once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerState {
    pub position: Offset,
    pub buttons: MouseButtons,
    /// Buttons held at the previous sample.
    pub previous_buttons: MouseButtons,
    /// Movement since the previous sample.
    pub delta: Offset,
    /// Scroll steps since the previous sample; positive scrolls down.
    pub scroll: i32,
}

impl PointerState {
    /// A resting pointer at `(x, y)` with no buttons.
    pub fn at(x: i32, y: i32) -> Self {
        Self { position: Offset::new(x, y), ..Self::default() }
    }

    pub fn with_buttons(mut self, now: MouseButtons, before: MouseButtons) -> Self {
        self.buttons = now;
        self.previous_buttons = before;
        self
    }

    pub fn with_delta(mut self, dx: i32, dy: i32) -> Self {
        self.delta = Offset::new(dx, dy);
        self
    }

    pub fn with_scroll(mut self, steps: i32) -> Self {
        self.scroll = steps;
        self
    }

    /// Some button was down at the previous sample and none is down now.
    pub fn released(&self) -> bool {
        !self.previous_buttons.is_empty() && self.buttons.is_empty()
    }

    /// Some button was down at both samples.
    pub fn held(&self) -> bool {
        !self.previous_buttons.is_empty() && !self.buttons.is_empty()
    }

    /// No button at either sample.
    pub fn idle(&self) -> bool {
        self.previous_buttons.is_empty() && self.buttons.is_empty()
    }
}

// ---------------------------------------------------------------------------
// PointerTracker
// ---------------------------------------------------------------------------

/// Accumulates pointer activity between samples.
///
/// A press and release that both land between two samples still read as a
/// release at the next sample.
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    position: Offset,
    sampled_at: Offset,
    buttons: MouseButtons,
    previous: MouseButtons,
    pressed_since: MouseButtons,
    scroll: i32,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Offset {
        self.position
    }

    pub fn move_to(&mut self, position: Offset) {
        self.position = position;
    }

    pub fn press(&mut self, buttons: MouseButtons) {
        self.buttons = self.buttons | buttons;
        self.pressed_since = self.pressed_since | buttons;
    }

    /// Mark `buttons` as held without counting a fresh press.
    pub fn hold(&mut self, buttons: MouseButtons) {
        self.buttons = self.buttons | buttons;
    }

    pub fn release(&mut self, buttons: MouseButtons) {
        self.buttons = self.buttons.without(buttons);
    }

    /// Positive steps scroll down.
    pub fn scroll(&mut self, steps: i32) {
        self.scroll += steps;
    }

    /// Snapshot the accumulated state and start a new interval.
    pub fn sample(&mut self) -> PointerState {
        let state = PointerState {
            position: self.position,
            buttons: self.buttons,
            previous_buttons: self.previous | self.pressed_since,
            delta: self.position - self.sampled_at,
            scroll: self.scroll,
        };
        self.previous = self.buttons;
        self.pressed_since = MouseButtons::NONE;
        self.sampled_at = self.position;
        self.scroll = 0;
        state
    }
}

// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------

/// Source of input samples.
pub trait Device {
    /// Collect whatever the device has buffered. Called once at the start of
    /// every tick, before sampling.
    fn poll(&mut self) -> Result<()> {
        Ok(())
    }

    /// New viewport size, if the output was resized since the last call.
    fn take_resize(&mut self) -> Option<Size> {
        None
    }

    /// Current pointer state. Called exactly once per tick; the call also
    /// starts the next sampling interval.
    fn pointer(&mut self) -> PointerState;

    /// Next pending keyboard edge in arrival order.
    fn next_key_edge(&mut self) -> Option<KeyEdge>;
}
