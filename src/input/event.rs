//! Input kinds and the events delivered to handlers.

use super::device::{Key, KeyEdge, PointerState};
use crate::geometry::Offset;
use crate::tree::WidgetId;

/// What a registration listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    // Mouse
    Scroll,
    Click,
    DoubleClick,
    ClickOut,
    Enter,
    Leave,
    Hover,
    Drag,
    // Keyboard
    /// Every key-down edge, auto-repeat included.
    RawKey,
    /// Key-down edge of a key that was not already held.
    PressEdge,
    /// Once per tick for every key still held.
    PressedLevel,
    ReleaseEdge,
    /// All keys of the filter list held at once.
    Combination,
}

impl InputKind {
    pub fn is_keyboard(self) -> bool {
        matches!(
            self,
            InputKind::RawKey
                | InputKind::PressEdge
                | InputKind::PressedLevel
                | InputKind::ReleaseEdge
                | InputKind::Combination
        )
    }

    pub fn is_mouse(self) -> bool {
        !self.is_keyboard()
    }
}

/// Payload of an [`InputEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDetail {
    Pointer(PointerState),
    Key(KeyEdge),
    /// A key held through the tick.
    Held(Key),
    /// The satisfied combination, in filter order.
    Keys(Vec<Key>),
}

/// One classified input delivered to a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    pub widget: WidgetId,
    pub kind: InputKind,
    pub detail: EventDetail,
}

impl InputEvent {
    /// Pointer position, for mouse kinds.
    pub fn position(&self) -> Option<Offset> {
        match &self.detail {
            EventDetail::Pointer(p) => Some(p.position),
            _ => None,
        }
    }

    /// Key that triggered a single-key keyboard event.
    pub fn key(&self) -> Option<Key> {
        match &self.detail {
            EventDetail::Key(edge) => Some(edge.key),
            EventDetail::Held(key) => Some(*key),
            _ => None,
        }
    }

    /// Character produced by a key-down edge.
    pub fn ch(&self) -> Option<char> {
        match &self.detail {
            EventDetail::Key(edge) => edge.ch,
            _ => None,
        }
    }
}
