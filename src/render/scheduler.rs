//! Redraw scheduling.
//!
//! [`RenderScheduler`] keeps a min-heap of widgets waiting to be redrawn, keyed
//! by z-index with insertion order breaking ties, plus the set of widgets that
//! currently hold a live entry so scheduling twice before a drain collapses to
//! one draw. A drain empties the heap completely: every entry erases its last
//! footprint and draws itself and its visible descendants at their current
//! bounds.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

use tracing::{debug, trace};

use super::surface::{DrawContext, Surface};
use crate::error::Result;
use crate::geometry::Region;
use crate::tree::{WidgetId, WidgetTree};

#[derive(Debug, Clone, Copy)]
struct Entry {
    z: i32,
    seq: u64,
    id: WidgetId,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.z, self.seq).cmp(&(other.z, other.seq))
    }
}

/// Z-ordered dirty queue and drain loop.
#[derive(Debug, Default)]
pub struct RenderScheduler {
    queue: BinaryHeap<Reverse<Entry>>,
    /// Widgets with a live entry in `queue`.
    queued: HashSet<WidgetId>,
    seq: u64,
    /// Widgets whose dirty flag is cleared at the end of the next drain.
    dirty: Vec<WidgetId>,
    /// Footprints of widgets that left the tree or were hidden.
    erase: Vec<Region>,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `id` for redraw.
    ///
    /// Only visible widgets with a positive z-index are queued; z-index 0 is
    /// background drawn by an ancestor. A widget already queued is left alone.
    /// Returns whether a new entry was created.
    pub fn schedule(&mut self, id: WidgetId, visible: bool, z: i32) -> bool {
        if !visible || z <= 0 || !self.queued.insert(id) {
            return false;
        }
        self.seq += 1;
        self.queue.push(Reverse(Entry { z, seq: self.seq, id }));
        trace!(?id, z, "redraw scheduled");
        true
    }

    pub fn is_scheduled(&self, id: WidgetId) -> bool {
        self.queued.contains(&id)
    }

    /// Number of live entries.
    pub fn pending(&self) -> usize {
        self.queued.len()
    }

    /// Remember to clear `id`'s dirty flag when the next drain finishes.
    pub(crate) fn track_dirty(&mut self, id: WidgetId) {
        self.dirty.push(id);
    }

    /// Clear `rect` at the start of the next drain.
    pub(crate) fn erase(&mut self, rect: Region) {
        if !rect.is_empty() {
            self.erase.push(rect);
        }
    }

    /// Drop any live entry for a widget that is going away.
    pub(crate) fn forget(&mut self, id: WidgetId) {
        self.queued.remove(&id);
        self.dirty.retain(|&d| d != id);
    }

    /// Empty the queue in ascending z-order, drawing onto `surface`.
    ///
    /// Returns how many widgets were drawn. Each widget is drawn at most once
    /// per drain: an entry whose ancestor is also queued is left to that
    /// ancestor's subtree, whichever pops first. Widgets not connected to the
    /// root are skipped.
    pub fn drain(&mut self, tree: &mut WidgetTree, surface: &mut dyn Surface) -> Result<usize> {
        for rect in self.erase.drain(..) {
            surface.clear_rect(rect);
        }

        let mut drawn = HashSet::new();
        while let Some(Reverse(entry)) = self.queue.pop() {
            self.queued.remove(&entry.id);
            if drawn.contains(&entry.id) || !tree.is_rooted(entry.id) {
                continue;
            }
            if let Some(cover) = self.queued_ancestor(tree, entry.id)? {
                // The ancestor's subtree draw repaints this widget later in the drain.
                let footprint = tree.get(entry.id).and_then(|n| n.last_drawn);
                let covered = tree.get(cover).and_then(|n| n.last_drawn);
                if let Some(last) = footprint {
                    if !covered.is_some_and(|c| c.contains_region(last)) {
                        surface.clear_rect(last);
                    }
                }
                trace!(id = ?entry.id, ?cover, "redraw folded into ancestor");
                continue;
            }
            if let Some(last) = tree.get(entry.id).and_then(|n| n.last_drawn) {
                surface.clear_rect(last);
            }
            draw_subtree(tree, entry.id, surface, &mut drawn)?;
        }

        for id in self.dirty.drain(..) {
            if let Some(node) = tree.get_mut(id) {
                node.dirty = false;
            }
        }
        if !drawn.is_empty() {
            debug!(drawn = drawn.len(), "render drain");
        }
        Ok(drawn.len())
    }

    /// Nearest visible ancestor of `id` that still holds a queue entry.
    fn queued_ancestor(&self, tree: &WidgetTree, id: WidgetId) -> Result<Option<WidgetId>> {
        for ancestor in tree.ancestors(id) {
            if !self.queued.contains(&ancestor) {
                continue;
            }
            if tree.get(ancestor).map_or(Ok(false), |n| n.is_visible())? {
                return Ok(Some(ancestor));
            }
        }
        Ok(None)
    }
}

/// Draw `id` at its current bounds, then its visible children in ascending
/// z-index (content order among equals).
fn draw_subtree(
    tree: &mut WidgetTree,
    id: WidgetId,
    surface: &mut dyn Surface,
    drawn: &mut HashSet<WidgetId>,
) -> Result<()> {
    let Some(node) = tree.get(id) else {
        return Ok(());
    };
    if !node.is_visible()? {
        return Ok(());
    }
    let bounds = node.bounds();
    if let Some(widget) = node.widget.as_deref() {
        let ctx = DrawContext { id, bounds, props: node.props() };
        widget.draw(&ctx, surface)?;
        trace!(?id, ?bounds, "drawn");
    }

    let mut children = Vec::with_capacity(tree.children(id).len());
    for &child in tree.children(id) {
        let z = tree.get(child).map_or(Ok(0), |n| n.z_index())?;
        children.push((z, child));
    }
    children.sort_by_key(|&(z, _)| z);

    if let Some(node) = tree.get_mut(id) {
        node.last_drawn = Some(bounds);
    }
    drawn.insert(id);

    for (_, child) in children {
        draw_subtree(tree, child, surface, drawn)?;
    }
    Ok(())
}
