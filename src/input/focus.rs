//! Keyboard focus.
//!
//! [`FocusManager`] records the single widget eligible for keyboard input. The
//! focus and unfocus hooks are run by the screen, which needs the widget out of
//! the tree while its hook borrows the screen; this type only tracks the holder
//! and computes the traversal order.

use tracing::debug;

use crate::error::Result;
use crate::tree::{WidgetId, WidgetTree};

#[derive(Debug, Default)]
pub struct FocusManager {
    holder: Option<WidgetId>,
}

impl FocusManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The widget currently holding focus.
    pub fn holder(&self) -> Option<WidgetId> {
        self.holder
    }

    pub fn is_focused(&self, id: WidgetId) -> bool {
        self.holder == Some(id)
    }

    /// Install `next` and hand back the previous holder.
    pub(crate) fn replace(&mut self, next: Option<WidgetId>) -> Option<WidgetId> {
        let previous = std::mem::replace(&mut self.holder, next);
        debug!(?previous, ?next, "focus moved");
        previous
    }

    /// Focusable widgets in depth-first order from the root.
    ///
    /// Hidden widgets and everything below them are skipped.
    pub fn chain(tree: &WidgetTree) -> Result<Vec<WidgetId>> {
        let mut out = Vec::new();
        if let Some(root) = tree.root() {
            collect(tree, root, &mut out)?;
        }
        Ok(out)
    }

    /// The widget after `current` in `chain`, wrapping around. Starts at the
    /// front when nothing (or something outside the chain) is focused.
    pub fn next_in(chain: &[WidgetId], current: Option<WidgetId>) -> Option<WidgetId> {
        if chain.is_empty() {
            return None;
        }
        let next = match current.and_then(|c| chain.iter().position(|&n| n == c)) {
            Some(idx) => (idx + 1) % chain.len(),
            None => 0,
        };
        chain.get(next).copied()
    }

    /// The widget before `current` in `chain`, wrapping around.
    pub fn previous_in(chain: &[WidgetId], current: Option<WidgetId>) -> Option<WidgetId> {
        if chain.is_empty() {
            return None;
        }
        let prev = match current.and_then(|c| chain.iter().position(|&n| n == c)) {
            Some(0) | None => chain.len() - 1,
            Some(idx) => idx - 1,
        };
        chain.get(prev).copied()
    }
}

fn collect(tree: &WidgetTree, id: WidgetId, out: &mut Vec<WidgetId>) -> Result<()> {
    let Some(node) = tree.get(id) else {
        return Ok(());
    };
    if !node.is_visible()? {
        return Ok(());
    }
    if node.widget.as_deref().is_some_and(|w| w.can_focus()) {
        out.push(id);
    }
    for &child in tree.children(id) {
        collect(tree, child, out)?;
    }
    Ok(())
}
