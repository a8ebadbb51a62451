//! Input registrations and per-tick classification.
//!
//! The dispatcher owns the registration list plus the device-derived state
//! that outlives a tick: which keys are held, which widgets the pointer was
//! over, and when each widget was last clicked. [`InputDispatcher::collect`]
//! turns one tick of device samples into an ordered list of dispatches; the
//! [`Screen`] then invokes the handlers, looking each registration up again so
//! that handlers removed earlier in the same tick are skipped.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::{Duration, Instant};

use slotmap::{new_key_type, SlotMap};
use tracing::{debug, trace};

use super::classify::{classify, HitState};
use super::device::{EdgeKind, Key, KeyEdge, PointerState};
use super::event::{EventDetail, InputEvent, InputKind};
use crate::error::{Error, Result};
use crate::geometry::Offset;
use crate::screen::Screen;
use crate::tree::{WidgetId, WidgetTree};

new_key_type! {
    /// Token returned by input registration.
    pub struct RegistrationId;
}

/// Callback invoked with the screen and the classified event.
pub type Handler = Rc<RefCell<dyn FnMut(&mut Screen, &InputEvent) -> Result<()>>>;

/// One widget listening for one input kind.
pub struct Registration {
    pub widget: WidgetId,
    pub kind: InputKind,
    /// Key filter. Empty accepts every key.
    pub keys: Vec<Key>,
    handler: Handler,
}

impl Registration {
    fn accepts(&self, key: Key) -> bool {
        self.keys.is_empty() || self.keys.contains(&key)
    }

    fn matches_mouse(&self, class: InputKind) -> bool {
        self.kind == class || (self.kind == InputKind::Click && class == InputKind::DoubleClick)
    }
}

/// A handler call produced by [`InputDispatcher::collect`].
#[derive(Debug, Clone)]
pub(crate) struct Dispatch {
    pub registration: RegistrationId,
    pub event: InputEvent,
}

pub struct InputDispatcher {
    registrations: SlotMap<RegistrationId, Registration>,
    /// Registration order; slot iteration order is not stable across removals.
    order: Vec<RegistrationId>,
    /// Keys currently down, in press order.
    held: Vec<Key>,
    hovered: HashSet<WidgetId>,
    last_click: HashMap<WidgetId, Instant>,
    double_click: Duration,
}

impl InputDispatcher {
    pub fn new(double_click: Duration) -> Self {
        Self {
            registrations: SlotMap::with_key(),
            order: Vec::new(),
            held: Vec::new(),
            hovered: HashSet::new(),
            last_click: HashMap::new(),
            double_click,
        }
    }

    /// Add a registration after validating the kind/filter pair.
    pub(crate) fn register(
        &mut self,
        widget: WidgetId,
        kind: InputKind,
        keys: Vec<Key>,
        handler: Handler,
    ) -> Result<RegistrationId> {
        if kind.is_mouse() && !keys.is_empty() {
            return Err(Error::configuration(format!(
                "{kind:?} is a mouse input kind and takes no key filter"
            )));
        }
        if kind == InputKind::Combination && keys.is_empty() {
            return Err(Error::configuration("a combination needs at least one key"));
        }
        let id = self.registrations.insert(Registration { widget, kind, keys, handler });
        self.order.push(id);
        debug!(?widget, ?kind, "input registered");
        Ok(id)
    }

    /// Returns whether the registration existed.
    pub fn unregister(&mut self, id: RegistrationId) -> bool {
        if self.registrations.remove(id).is_none() {
            return false;
        }
        self.order.retain(|&r| r != id);
        true
    }

    /// Drop every registration and pointer state owned by `widget`.
    pub fn unregister_widget(&mut self, widget: WidgetId) -> usize {
        let before = self.registrations.len();
        self.registrations.retain(|_, r| r.widget != widget);
        let registrations = &self.registrations;
        self.order.retain(|&r| registrations.contains_key(r));
        self.hovered.remove(&widget);
        self.last_click.remove(&widget);
        before - self.registrations.len()
    }

    pub fn get(&self, id: RegistrationId) -> Option<&Registration> {
        self.registrations.get(id)
    }

    pub fn contains(&self, id: RegistrationId) -> bool {
        self.registrations.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Registrations owned by `widget`, in registration order.
    pub fn registrations_of(&self, widget: WidgetId) -> Vec<RegistrationId> {
        self.order
            .iter()
            .copied()
            .filter(|&id| self.registrations.get(id).is_some_and(|r| r.widget == widget))
            .collect()
    }

    /// Keys currently held, in press order.
    pub fn held_keys(&self) -> &[Key] {
        &self.held
    }

    pub fn double_click(&self) -> Duration {
        self.double_click
    }

    pub(crate) fn handler(&self, id: RegistrationId) -> Option<Handler> {
        self.registrations.get(id).map(|r| Rc::clone(&r.handler))
    }

    /// Classify one tick of device input.
    ///
    /// Mouse dispatches come first, highest z-index first; keyboard dispatches
    /// follow in edge order and only target `focus`.
    pub(crate) fn collect(
        &mut self,
        tree: &WidgetTree,
        focus: Option<WidgetId>,
        pointer: &PointerState,
        edges: &[KeyEdge],
        now: Instant,
    ) -> Result<Vec<Dispatch>> {
        let mut out = self.collect_mouse(tree, pointer, now)?;
        self.collect_keys(focus, edges, &mut out);
        Ok(out)
    }

    fn collect_mouse(
        &mut self,
        tree: &WidgetTree,
        pointer: &PointerState,
        now: Instant,
    ) -> Result<Vec<Dispatch>> {
        let mut widgets = Vec::new();
        for id in &self.order {
            if let Some(r) = self.registrations.get(*id) {
                if r.kind.is_mouse() && !widgets.contains(&r.widget) {
                    widgets.push(r.widget);
                }
            }
        }

        let mut classes = HashMap::with_capacity(widgets.len());
        for widget in widgets {
            let class = self.classify_widget(tree, widget, pointer, now)?;
            let z = tree.get(widget).map_or(Ok(0), |n| n.z_index())?;
            classes.insert(widget, (class, z));
        }

        let mut out = Vec::new();
        for &id in &self.order {
            let Some(r) = self.registrations.get(id) else {
                continue;
            };
            if !r.kind.is_mouse() {
                continue;
            }
            if let Some(&(Some(class), z)) = classes.get(&r.widget) {
                if r.matches_mouse(class) {
                    trace!(widget = ?r.widget, ?class, "mouse input");
                    let event = InputEvent {
                        widget: r.widget,
                        kind: class,
                        detail: EventDetail::Pointer(*pointer),
                    };
                    out.push((z, Dispatch { registration: id, event }));
                }
            }
        }
        out.sort_by_key(|(z, _)| std::cmp::Reverse(*z));
        Ok(out.into_iter().map(|(_, d)| d).collect())
    }

    fn classify_widget(
        &mut self,
        tree: &WidgetTree,
        widget: WidgetId,
        pointer: &PointerState,
        now: Instant,
    ) -> Result<Option<InputKind>> {
        let inside = hit(tree, widget, pointer.position)?;
        let recent_click = self
            .last_click
            .get(&widget)
            .is_some_and(|&t| now.saturating_duration_since(t) <= self.double_click);
        let state = HitState { inside, was_inside: self.hovered.contains(&widget), recent_click };
        let class = classify(pointer, state);

        if inside {
            self.hovered.insert(widget);
        } else {
            self.hovered.remove(&widget);
        }
        match class {
            Some(InputKind::Click) => {
                self.last_click.insert(widget, now);
            }
            Some(InputKind::DoubleClick) => {
                self.last_click.remove(&widget);
            }
            _ => {}
        }
        Ok(class)
    }

    fn collect_keys(&mut self, focus: Option<WidgetId>, edges: &[KeyEdge], out: &mut Vec<Dispatch>) {
        for edge in edges {
            let repeat = match edge.kind {
                EdgeKind::Down => {
                    let repeat = self.held.contains(&edge.key);
                    if !repeat {
                        self.held.push(edge.key);
                    }
                    repeat
                }
                EdgeKind::Up => {
                    self.held.retain(|&k| k != edge.key);
                    false
                }
            };
            let Some(focus) = focus else {
                continue;
            };

            for &id in &self.order {
                let Some(r) = self.registrations.get(id) else {
                    continue;
                };
                if r.widget != focus {
                    continue;
                }
                let detail = match (r.kind, edge.kind) {
                    (InputKind::RawKey, EdgeKind::Down) if r.accepts(edge.key) => {
                        EventDetail::Key(*edge)
                    }
                    (InputKind::PressEdge, EdgeKind::Down) if !repeat && r.accepts(edge.key) => {
                        EventDetail::Key(*edge)
                    }
                    (InputKind::ReleaseEdge, EdgeKind::Up) if r.accepts(edge.key) => {
                        EventDetail::Key(*edge)
                    }
                    (InputKind::Combination, EdgeKind::Down)
                        if !repeat
                            && r.keys.contains(&edge.key)
                            && r.keys.iter().all(|k| self.held.contains(k)) =>
                    {
                        EventDetail::Keys(r.keys.clone())
                    }
                    _ => continue,
                };
                let event = InputEvent { widget: focus, kind: r.kind, detail };
                out.push(Dispatch { registration: id, event });
            }
        }

        let Some(focus) = focus else {
            return;
        };
        for &id in &self.order {
            let Some(r) = self.registrations.get(id) else {
                continue;
            };
            if r.widget != focus || r.kind != InputKind::PressedLevel {
                continue;
            }
            for &key in &self.held {
                if r.accepts(key) {
                    let event = InputEvent {
                        widget: focus,
                        kind: InputKind::PressedLevel,
                        detail: EventDetail::Held(key),
                    };
                    out.push(Dispatch { registration: id, event });
                }
            }
        }
    }
}

impl std::fmt::Debug for InputDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputDispatcher")
            .field("registrations", &self.registrations.len())
            .field("held", &self.held)
            .field("hovered", &self.hovered.len())
            .finish()
    }
}

/// Whether `point` hits `widget`: connected to the root, visible along its
/// whole ancestor chain, and accepted by the widget's own hit test.
pub(crate) fn hit(tree: &WidgetTree, widget: WidgetId, point: Offset) -> Result<bool> {
    if !tree.is_rooted(widget) {
        return Ok(false);
    }
    let Some(node) = tree.get(widget) else {
        return Ok(false);
    };
    if !node.is_visible()? {
        return Ok(false);
    }
    for ancestor in tree.ancestors(widget) {
        if let Some(a) = tree.get(ancestor) {
            if !a.is_visible()? {
                return Ok(false);
            }
        }
    }
    let bounds = node.bounds();
    Ok(match node.widget.as_deref() {
        Some(w) => w.hit_test(bounds, point),
        None => bounds.contains(point),
    })
}
