//! Mouse classification.
//!
//! One pointer sample yields at most one mouse kind per widget. The checks run
//! in a fixed precedence and the first match wins.

use super::device::PointerState;
use super::event::InputKind;

/// Per-widget facts the classifier needs besides the pointer sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitState {
    /// The pointer is over the widget now.
    pub inside: bool,
    /// The pointer was over the widget at the previous tick.
    pub was_inside: bool,
    /// The widget's previous click lies within the double-click threshold.
    pub recent_click: bool,
}

/// Classify one pointer sample for one widget.
///
/// Precedence: scroll, click or double-click, click-out, leave, enter, hover,
/// drag.
pub fn classify(pointer: &PointerState, hit: HitState) -> Option<InputKind> {
    let HitState { inside, was_inside, recent_click } = hit;

    if pointer.scroll != 0 && inside {
        return Some(InputKind::Scroll);
    }
    if pointer.released() {
        return Some(match (inside, recent_click) {
            (true, true) => InputKind::DoubleClick,
            (true, false) => InputKind::Click,
            (false, _) => InputKind::ClickOut,
        });
    }
    if was_inside && !inside {
        return Some(InputKind::Leave);
    }
    if !was_inside && inside {
        return Some(InputKind::Enter);
    }
    if inside && pointer.idle() {
        return Some(InputKind::Hover);
    }
    if inside && pointer.held() && !pointer.delta.is_zero() {
        return Some(InputKind::Drag);
    }
    None
}
