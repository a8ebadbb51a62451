//! The engine context.
//!
//! [`Screen`] owns the widget tree, the binding engine, the redraw scheduler,
//! the input dispatcher, focus and layout for one tree of widgets. Everything a
//! handler or hook can do goes through it, so there is no global state and
//! several screens can live side by side (one per test, typically).
//!
//! Property writes are the hub: [`Screen::set_value`] applies the no-op rules,
//! performs the structural side effects of well-known properties, publishes
//! the change to observers and bindings, and finally marks the widget dirty.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::geometry::{Offset, Region, Size};
use crate::input::{
    FocusManager, InputDispatcher, InputEvent, InputKind, Key, KeyEdge, PointerState,
    RegistrationId,
};
use crate::layout::LayoutEngine;
use crate::reactive::store::Assessment;
use crate::reactive::{
    binding::Admission, Binding, BindingEngine, BindingId, PropertyType, Side, Subscription, Value,
};
use crate::render::{RenderScheduler, Surface};
use crate::tree::{WidgetId, WidgetNode, WidgetTree};
use crate::widget::{props, Widget};

/// Double-click threshold used when none is configured.
pub const DEFAULT_DOUBLE_CLICK: Duration = Duration::from_millis(500);

pub struct Screen {
    tree: WidgetTree,
    bindings: BindingEngine,
    scheduler: RenderScheduler,
    input: InputDispatcher,
    focus: FocusManager,
    layout: LayoutEngine,
    viewport: Region,
    quit: bool,
}

impl Screen {
    pub fn new(viewport: Size) -> Self {
        Self::with_double_click(viewport, DEFAULT_DOUBLE_CLICK)
    }

    pub fn with_double_click(viewport: Size, double_click: Duration) -> Self {
        Self {
            tree: WidgetTree::new(),
            bindings: BindingEngine::new(),
            scheduler: RenderScheduler::new(),
            input: InputDispatcher::new(double_click),
            focus: FocusManager::new(),
            layout: LayoutEngine::new(),
            viewport: Region::from_parts(Offset::ZERO, viewport),
            quit: false,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn tree(&self) -> &WidgetTree {
        &self.tree
    }

    pub fn bindings(&self) -> &BindingEngine {
        &self.bindings
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    pub fn input(&self) -> &InputDispatcher {
        &self.input
    }

    pub fn layout_engine(&self) -> &LayoutEngine {
        &self.layout
    }

    pub fn viewport(&self) -> Region {
        self.viewport
    }

    pub fn root(&self) -> Option<WidgetId> {
        self.tree.root()
    }

    pub fn node(&self, id: WidgetId) -> Option<&WidgetNode> {
        self.tree.get(id)
    }

    /// Borrow a widget as its concrete type.
    pub fn widget<W: Widget>(&self, id: WidgetId) -> Option<&W> {
        self.tree.get(id).and_then(|n| n.widget::<W>())
    }

    pub fn widget_mut<W: Widget>(&mut self, id: WidgetId) -> Option<&mut W> {
        self.tree.get_mut(id).and_then(|n| n.widget_mut::<W>())
    }

    fn require(&self, id: WidgetId) -> Result<&WidgetNode> {
        self.tree
            .get(id)
            .ok_or_else(|| Error::state(format!("widget {id:?} is not in the tree")))
    }

    fn require_mut(&mut self, id: WidgetId) -> Result<&mut WidgetNode> {
        self.tree
            .get_mut(id)
            .ok_or_else(|| Error::state(format!("widget {id:?} is not in the tree")))
    }

    // -----------------------------------------------------------------------
    // Tree building
    // -----------------------------------------------------------------------

    /// Add a detached widget.
    pub fn insert(&mut self, node: WidgetNode) -> WidgetId {
        let id = self.tree.insert(node);
        trace!(?id, "widget inserted");
        id
    }

    /// Make `id` the root of the drawn tree. It must not have a parent.
    pub fn set_root(&mut self, id: WidgetId) -> Result<()> {
        self.require(id)?;
        if self.tree.parent(id).is_some() {
            return Err(Error::state("the root widget cannot have a parent"));
        }
        self.tree.set_root(id);
        self.invalidate_layout(id);
        debug!(?id, "root set");
        Ok(())
    }

    /// Set the single content of `parent` through its `Content` property.
    ///
    /// Returns `false` when the write was a no-op (same child, parent dirty, or
    /// the child is `parent` itself or related to it). The previous content is
    /// disposed.
    pub fn set_content(&mut self, parent: WidgetId, child: WidgetId) -> Result<bool> {
        self.set_value(parent, props::CONTENT, Value::Widget(child))
    }

    /// Dispose the single content of `parent`, returning which widget it was.
    pub fn clear_content(&mut self, parent: WidgetId) -> Result<Option<WidgetId>> {
        let Some(child) = self.require(parent)?.content() else {
            return Ok(None);
        };
        self.dispose(child)?;
        Ok(Some(child))
    }

    /// Append `child` to a stacking or overlay container.
    ///
    /// Returns `false` without touching anything when `child` is `parent` or
    /// related to it.
    pub fn add_content(&mut self, parent: WidgetId, child: WidgetId) -> Result<bool> {
        let node = self.require(parent)?;
        if !node.container().is_multi() {
            return Err(Error::configuration(format!(
                "{} does not hold a content list",
                node.widget_type()
            )));
        }
        self.require(child)?;
        if self.tree.related(parent, child) {
            return Ok(false);
        }
        if self.tree.parent(child).is_some() {
            return Err(Error::state(format!("widget {child:?} already has a parent")));
        }
        self.tree.attach(parent, child);
        self.with_widget(child, |w, s| w.on_attach(child, s))?;
        self.invalidate_layout(parent);
        debug!(?parent, ?child, "content added");
        Ok(true)
    }

    /// Remove and dispose `child` if it is a child of `parent`.
    pub fn remove_content(&mut self, parent: WidgetId, child: WidgetId) -> Result<bool> {
        if self.tree.parent(child) != Some(parent) {
            return Ok(false);
        }
        self.dispose(child)?;
        Ok(true)
    }

    /// Take `id` out of its parent, releasing its input registrations,
    /// bindings, focus and drawn footprint. Returns the former parent.
    pub fn detach(&mut self, id: WidgetId) -> Result<Option<WidgetId>> {
        if self.tree.parent(id).is_none() {
            return Ok(None);
        }
        self.with_widget(id, |w, s| w.on_detach(id, s))?;
        // The hook may have moved the widget already.
        let Some(parent) = self.tree.detach(id) else {
            return Ok(None);
        };
        if let Some(node) = self.tree.get_mut(parent) {
            if node.content() == Some(id) {
                node.props.remove(props::CONTENT);
            }
        }
        self.release(id)?;
        if let Some(holder) = self.focus.holder() {
            if self.tree.is_ancestor(id, holder) {
                self.clear_focus()?;
            }
        }
        self.invalidate_layout(parent);
        debug!(?id, ?parent, "widget detached");
        Ok(Some(parent))
    }

    /// Detach `id` and remove it and its whole subtree from the screen.
    ///
    /// Unknown ids are ignored.
    pub fn dispose(&mut self, id: WidgetId) -> Result<()> {
        if !self.tree.contains(id) {
            return Ok(());
        }
        if self.tree.parent(id).is_some() {
            self.detach(id)?;
        } else {
            self.with_widget(id, |w, s| w.on_detach(id, s))?;
            self.release(id)?;
        }
        let subtree = self.tree.walk_depth_first(id);
        for &descendant in subtree.iter().skip(1).rev() {
            self.with_widget(descendant, |w, s| w.on_detach(descendant, s))?;
            self.release(descendant)?;
        }
        for removed in self.tree.remove(id) {
            self.scheduler.forget(removed);
        }
        debug!(?id, widgets = subtree.len(), "widget disposed");
        Ok(())
    }

    /// Drop everything the engine holds on behalf of `id`.
    fn release(&mut self, id: WidgetId) -> Result<()> {
        self.input.unregister_widget(id);
        for binding in self.bindings.involving(id) {
            self.unbind(binding);
        }
        if self.focus.is_focused(id) {
            self.clear_focus()?;
        }
        if let Some(node) = self.tree.get_mut(id) {
            if let Some(footprint) = node.last_drawn.take() {
                self.scheduler.erase(footprint);
            }
        }
        Ok(())
    }

    /// Run `f` with the widget taken out of its node.
    ///
    /// Returns `Ok(None)` when the widget is unknown or already taken (its own
    /// hook is running further up the stack).
    pub(crate) fn with_widget<R>(
        &mut self,
        id: WidgetId,
        f: impl FnOnce(&mut dyn Widget, &mut Screen) -> Result<R>,
    ) -> Result<Option<R>> {
        let Some(mut widget) = self.tree.get_mut(id).and_then(|n| n.widget.take()) else {
            return Ok(None);
        };
        let result = f(widget.as_mut(), self);
        if let Some(node) = self.tree.get_mut(id) {
            node.widget = Some(widget);
        }
        result.map(Some)
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    /// Read a property, storing `default` first when it is absent.
    pub fn get<T: PropertyType + Clone>(&mut self, id: WidgetId, name: &str, default: T) -> Result<T> {
        self.require_mut(id)?.props.get_or_insert(name, default)
    }

    /// Read a property without inserting anything.
    pub fn value<T: PropertyType>(&self, id: WidgetId, name: &str) -> Result<Option<T>> {
        self.require(id)?.props.value(name)
    }

    /// Typed form of [`set_value`](Self::set_value).
    pub fn set<T: PropertyType>(&mut self, id: WidgetId, name: &str, value: T) -> Result<bool> {
        self.set_value(id, name, value.into_value())
    }

    /// Write a property. Returns whether the value was stored.
    ///
    /// The write is a no-op when the value is null, equal to the stored one,
    /// the widget is already dirty, or old and new are widgets related to each
    /// other. A value of a different kind than the stored one is a cast error.
    pub fn set_value(&mut self, id: WidgetId, name: &str, value: Value) -> Result<bool> {
        self.set_from(id, name, value, None)
    }

    pub(crate) fn set_from(
        &mut self,
        id: WidgetId,
        name: &str,
        value: Value,
        origin: Option<BindingId>,
    ) -> Result<bool> {
        let node = self.require(id)?;
        if node.props.assess(name, &value)? == Assessment::Unchanged {
            return Ok(false);
        }
        if node.dirty {
            trace!(?id, name, "write skipped: widget is dirty");
            return Ok(false);
        }
        let old = node.props.raw(name).cloned();
        if let (Some(Value::Widget(a)), Value::Widget(b)) = (&old, &value) {
            if self.tree.related(*a, *b) {
                return Ok(false);
            }
        }
        if name == props::CONTENT && !self.accepts_content(id, &value)? {
            return Ok(false);
        }

        trace!(?id, name, ?value, "property written");
        self.require_mut(id)?.props.replace(name, value.clone());
        self.on_property_changed(id, name, old, &value)?;

        let listeners = match self.tree.get_mut(id) {
            Some(node) => node.channel.publish(name, &value),
            None => Vec::new(),
        };
        for (binding, side) in listeners {
            self.propagate(binding, side)?;
        }

        let one_way_feed = origin
            .and_then(|b| self.bindings.get(b))
            .is_some_and(|b| b.direction().is_one_way());
        if !one_way_feed {
            self.mark_dirty(id)?;
        }
        Ok(true)
    }

    /// Validate a new `Content` value for `parent`.
    fn accepts_content(&self, parent: WidgetId, value: &Value) -> Result<bool> {
        let node = self.require(parent)?;
        if node.container() != crate::widget::Container::Single {
            return Err(Error::configuration(format!(
                "{} does not take single content",
                node.widget_type()
            )));
        }
        let Value::Widget(child) = *value else {
            return Err(node.props.cast_error(props::CONTENT, WidgetId::KIND, value));
        };
        self.require(child)?;
        if self.tree.related(parent, child) {
            return Ok(false);
        }
        if self.tree.parent(child).is_some() {
            return Err(Error::state(format!("widget {child:?} already has a parent")));
        }
        Ok(true)
    }

    fn on_property_changed(
        &mut self,
        id: WidgetId,
        name: &str,
        old: Option<Value>,
        new: &Value,
    ) -> Result<()> {
        if name == props::CONTENT {
            if let Some(Value::Widget(previous)) = old {
                self.dispose(previous)?;
            }
            if let Value::Widget(child) = *new {
                self.tree.attach(id, child);
                self.with_widget(child, |w, s| w.on_attach(child, s))?;
            }
        }
        if props::LAYOUT_AFFECTING.contains(&name) {
            self.invalidate_layout(id);
        }
        if name == props::IS_VISIBLE && *new == Value::Bool(false) {
            if let Some(node) = self.tree.get_mut(id) {
                if let Some(footprint) = node.last_drawn.take() {
                    self.scheduler.erase(footprint);
                }
            }
        }
        Ok(())
    }

    /// Flag `id` and its ancestors for the next layout pass.
    fn invalidate_layout(&mut self, id: WidgetId) {
        let mut current = Some(id);
        while let Some(w) = current {
            match self.tree.get_mut(w) {
                Some(node) => node.needs_layout = true,
                None => break,
            }
            current = self.tree.parent(w);
        }
    }

    /// Subscribe an observer to one property of `widget`, or to all of them.
    pub fn subscribe(
        &mut self,
        widget: WidgetId,
        property: Option<&str>,
        observer: impl FnMut(&str, &Value) + 'static,
    ) -> Result<Subscription> {
        let id = self.require_mut(widget)?.channel.observe(property, Box::new(observer));
        Ok(Subscription { widget, id })
    }

    /// Release a subscription. Stale tokens are ignored.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.tree
            .get_mut(subscription.widget)
            .is_some_and(|n| n.channel.unsubscribe(subscription.id))
    }

    // -----------------------------------------------------------------------
    // Bindings
    // -----------------------------------------------------------------------

    /// Install a binding, subscribing to the channels its direction watches.
    /// A `OneTime` binding copies the source value once, here.
    pub fn bind(&mut self, binding: Binding) -> Result<BindingId> {
        let source = binding.source().clone();
        let target = binding.target().clone();
        self.require(source.widget)?;
        self.require(target.widget)?;
        let direction = binding.direction();

        let id = self.bindings.insert(binding);
        let source_subscription = direction.watches_source().then(|| {
            self.tree
                .get_mut(source.widget)
                .map(|n| n.channel.attach_binding(&source.property, id, Side::Source))
        });
        let target_subscription = direction.watches_target().then(|| {
            self.tree
                .get_mut(target.widget)
                .map(|n| n.channel.attach_binding(&target.property, id, Side::Target))
        });
        if let Some(b) = self.bindings.get_mut(id) {
            b.source_subscription = source_subscription.flatten();
            b.target_subscription = target_subscription.flatten();
        }
        for widget in [source.widget, target.widget] {
            if let Some(node) = self.tree.get_mut(widget) {
                if !node.bindings.contains(&id) {
                    node.bindings.push(id);
                }
            }
        }
        debug!(?id, ?direction, from = %source.property, to = %target.property, "binding installed");

        if direction == crate::reactive::Direction::OneTime {
            self.propagate(id, Side::Source)?;
        }
        Ok(id)
    }

    /// Dispose a binding, releasing both subscriptions. Returns `false` when it
    /// was already gone.
    pub fn unbind(&mut self, id: BindingId) -> bool {
        let Some(binding) = self.bindings.remove(id) else {
            return false;
        };
        let ends = [
            (binding.source().widget, binding.source_subscription),
            (binding.target().widget, binding.target_subscription),
        ];
        for (widget, subscription) in ends {
            if let Some(node) = self.tree.get_mut(widget) {
                if let Some(sub) = subscription {
                    node.channel.unsubscribe(sub);
                }
                node.bindings.retain(|&b| b != id);
            }
        }
        debug!(?id, "binding disposed");
        true
    }

    /// Deliver a change on `side` of binding `id`.
    fn propagate(&mut self, id: BindingId, side: Side) -> Result<()> {
        match self.bindings.admit(id, side) {
            Admission::Run => self.run_binding(id, side),
            Admission::Suppressed => {
                warn!(?id, ?side, "binding feedback suppressed");
                Ok(())
            }
            Admission::Deferred | Admission::Gone => Ok(()),
        }
    }

    fn run_binding(&mut self, id: BindingId, side: Side) -> Result<()> {
        self.bindings.enter(id);
        let mut result = self.apply_binding(id, side);
        let queued = self.bindings.leave(id);
        if result.is_ok() {
            for side in queued {
                if let Err(e) = self.propagate(id, side) {
                    result = Err(e);
                    break;
                }
            }
        }
        self.bindings.finish();
        result
    }

    /// Read the live value on the changed side, convert it and write it to
    /// the other side.
    fn apply_binding(&mut self, id: BindingId, side: Side) -> Result<()> {
        let Some((from, to, converter)) = self.bindings.get(id).and_then(|b| b.route(side)) else {
            return Ok(());
        };
        let Some(node) = self.tree.get(from.widget) else {
            return Ok(());
        };
        let Some(value) = node.props.raw(&from.property) else {
            return Ok(());
        };
        let converted = converter.convert(value).ok_or_else(|| Error::Cast {
            widget_type: node.widget_type().to_owned(),
            property: from.property.clone(),
            expected: converter.input_kind(),
            found: value.kind(),
        })?;
        let (widget, property) = (to.widget, to.property.clone());
        trace!(?id, ?side, %property, "binding update");
        self.set_from(widget, &property, converted, Some(id))?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Input and focus
    // -----------------------------------------------------------------------

    /// Register `handler` for `kind` input on `widget`.
    ///
    /// `keys` is the key filter for keyboard kinds (empty accepts any key) and
    /// must be empty for mouse kinds.
    pub fn register_input(
        &mut self,
        widget: WidgetId,
        kind: InputKind,
        keys: &[Key],
        handler: impl FnMut(&mut Screen, &InputEvent) -> Result<()> + 'static,
    ) -> Result<RegistrationId> {
        self.require(widget)?;
        self.input.register(widget, kind, keys.to_vec(), Rc::new(RefCell::new(handler)))
    }

    /// Remove a registration. Stale ids are ignored.
    pub fn unregister_input(&mut self, id: RegistrationId) -> bool {
        self.input.unregister(id)
    }

    /// Classify one tick of device input and invoke the matching handlers.
    /// Returns how many handlers ran.
    ///
    /// Registrations removed by an earlier handler in the same tick are
    /// skipped, as are keyboard events for a widget that lost focus meanwhile.
    pub fn dispatch_input(&mut self, pointer: &PointerState, edges: &[KeyEdge], now: Instant) -> Result<usize> {
        let dispatches = self.input.collect(&self.tree, self.focus.holder(), pointer, edges, now)?;
        let mut fired = 0;
        for dispatch in dispatches {
            if dispatch.event.kind.is_keyboard() && !self.focus.is_focused(dispatch.event.widget) {
                continue;
            }
            let Some(handler) = self.input.handler(dispatch.registration) else {
                continue;
            };
            let Ok(mut handler) = handler.try_borrow_mut() else {
                continue;
            };
            (&mut *handler)(self, &dispatch.event)?;
            fired += 1;
        }
        Ok(fired)
    }

    pub fn focused(&self) -> Option<WidgetId> {
        self.focus.holder()
    }

    /// Give `id` keyboard focus. The previous holder's unfocus hook runs
    /// before the new holder's focus hook; focusing the current holder does
    /// nothing.
    pub fn set_focus(&mut self, id: WidgetId) -> Result<()> {
        self.require(id)?;
        if self.focus.is_focused(id) {
            return Ok(());
        }
        if let Some(previous) = self.focus.holder() {
            self.with_widget(previous, |w, s| w.on_unfocus(previous, s))?;
        }
        self.focus.replace(Some(id));
        self.with_widget(id, |w, s| w.on_focus(id, s))?;
        Ok(())
    }

    /// Drop focus, running the holder's unfocus hook.
    pub fn clear_focus(&mut self) -> Result<()> {
        if let Some(previous) = self.focus.replace(None) {
            self.with_widget(previous, |w, s| w.on_unfocus(previous, s))?;
        }
        Ok(())
    }

    /// Move focus to the next focusable widget in tree order, wrapping.
    pub fn focus_next(&mut self) -> Result<Option<WidgetId>> {
        let chain = FocusManager::chain(&self.tree)?;
        let next = FocusManager::next_in(&chain, self.focus.holder());
        if let Some(id) = next {
            self.set_focus(id)?;
        }
        Ok(next)
    }

    pub fn focus_previous(&mut self) -> Result<Option<WidgetId>> {
        let chain = FocusManager::chain(&self.tree)?;
        let previous = FocusManager::previous_in(&chain, self.focus.holder());
        if let Some(id) = previous {
            self.set_focus(id)?;
        }
        Ok(previous)
    }

    // -----------------------------------------------------------------------
    // Scheduling, layout, rendering
    // -----------------------------------------------------------------------

    /// Queue `id` for redraw if it is visible with a positive z-index.
    pub fn schedule_redraw(&mut self, id: WidgetId) -> Result<bool> {
        let node = self.require(id)?;
        let (visible, z) = (node.is_visible()?, node.z_index()?);
        Ok(self.scheduler.schedule(id, visible, z))
    }

    /// Flag `id` dirty and queue the redraw that will clear the flag.
    pub fn mark_dirty(&mut self, id: WidgetId) -> Result<()> {
        let node = self.require_mut(id)?;
        if node.dirty {
            return Ok(());
        }
        node.dirty = true;
        self.scheduler.track_dirty(id);
        self.request_redraw(id)?;
        Ok(())
    }

    /// Schedule `id`, or its nearest ancestor that can be scheduled when `id`
    /// itself is hidden or on the background layer.
    fn request_redraw(&mut self, id: WidgetId) -> Result<bool> {
        let mut current = Some(id);
        while let Some(w) = current {
            let Some(node) = self.tree.get(w) else {
                break;
            };
            let (visible, z) = (node.is_visible()?, node.z_index()?);
            if visible && z > 0 {
                return Ok(self.scheduler.schedule(w, visible, z));
            }
            current = self.tree.parent(w);
        }
        Ok(false)
    }

    /// Run layout if anything invalidated it and queue redraws for widgets
    /// whose bounds changed. Returns how many moved.
    pub fn layout(&mut self) -> Result<usize> {
        let moved = self.layout.update(&mut self.tree, self.viewport)?;
        for &id in &moved {
            self.request_redraw(id)?;
        }
        Ok(moved.len())
    }

    /// Drain the redraw queue onto `surface`. Returns how many widgets were drawn.
    pub fn render(&mut self, surface: &mut dyn Surface) -> Result<usize> {
        self.scheduler.drain(&mut self.tree, surface)
    }

    /// Change the viewport; the next layout pass re-runs from the root.
    pub fn resize(&mut self, size: Size) {
        if self.viewport.size() == size {
            return;
        }
        self.viewport = Region::from_parts(Offset::ZERO, size);
        if let Some(root) = self.tree.root() {
            self.invalidate_layout(root);
        }
        debug!(?size, "viewport resized");
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }
}

impl fmt::Debug for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Screen")
            .field("widgets", &self.tree.len())
            .field("root", &self.tree.root())
            .field("bindings", &self.bindings.len())
            .field("registrations", &self.input.len())
            .field("focused", &self.focus.holder())
            .field("viewport", &self.viewport)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::geometry::Spacing;
    use crate::layout::{HorizontalAlignment, VerticalAlignment};
    use crate::reactive::Direction;
    use crate::render::Color;
    use crate::testing::RecordingSurface;
    use crate::widgets::{Block, DockPanel, Panel, StackPanel};

    type Log = Rc<RefCell<Vec<String>>>;

    /// Leaf that records its hook calls.
    struct Probe {
        name: &'static str,
        log: Log,
    }

    impl Widget for Probe {
        fn widget_type(&self) -> &str {
            "Probe"
        }
        fn can_focus(&self) -> bool {
            true
        }
        fn on_attach(&mut self, _: WidgetId, _: &mut Screen) -> Result<()> {
            self.log.borrow_mut().push(format!("{}:attach", self.name));
            Ok(())
        }
        fn on_detach(&mut self, _: WidgetId, _: &mut Screen) -> Result<()> {
            self.log.borrow_mut().push(format!("{}:detach", self.name));
            Ok(())
        }
        fn on_focus(&mut self, _: WidgetId, _: &mut Screen) -> Result<()> {
            self.log.borrow_mut().push(format!("{}:focus", self.name));
            Ok(())
        }
        fn on_unfocus(&mut self, _: WidgetId, _: &mut Screen) -> Result<()> {
            self.log.borrow_mut().push(format!("{}:unfocus", self.name));
            Ok(())
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn probe(name: &'static str, log: &Log) -> WidgetNode {
        WidgetNode::new(Probe { name, log: Rc::clone(log) })
    }

    /// Screen with a z=1 overlay root.
    fn screen() -> (Screen, WidgetId) {
        let mut screen = Screen::new(Size::new(100, 100));
        let root = screen.insert(
            WidgetNode::new(DockPanel::new())
                .with(props::Z_INDEX, 1)
                .with(props::HORIZONTAL_ALIGNMENT, HorizontalAlignment::Stretch)
                .with(props::VERTICAL_ALIGNMENT, VerticalAlignment::Stretch),
        );
        screen.set_root(root).unwrap();
        (screen, root)
    }

    fn block(screen: &mut Screen, parent: WidgetId) -> WidgetId {
        let id = screen.insert(WidgetNode::new(Block::new()));
        screen.add_content(parent, id).unwrap();
        id
    }

    /// Finish the tick so dirty flags clear.
    fn settle(screen: &mut Screen) {
        screen.layout().unwrap();
        screen.render(&mut RecordingSurface::new()).unwrap();
    }

    fn count_changes(screen: &mut Screen, id: WidgetId, name: &str) -> Rc<RefCell<usize>> {
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        screen
            .subscribe(id, Some(name), move |_, _| *sink.borrow_mut() += 1)
            .unwrap();
        count
    }

    // ── Property store ──────────────────────────────────────────────

    #[test]
    fn repeated_equal_set_notifies_once() {
        let (mut screen, root) = screen();
        let w = block(&mut screen, root);
        let count = count_changes(&mut screen, w, "Label");

        assert!(screen.set(w, "Label", "hi".to_string()).unwrap());
        settle(&mut screen);
        assert!(!screen.set(w, "Label", "hi".to_string()).unwrap());
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn get_inserts_default_silently() {
        let (mut screen, root) = screen();
        let w = block(&mut screen, root);
        let count = count_changes(&mut screen, w, "Count");
        assert_eq!(screen.get(w, "Count", 3i64).unwrap(), 3);
        assert_eq!(screen.value::<i64>(w, "Count").unwrap(), Some(3));
        assert_eq!(*count.borrow(), 0);
        assert!(!screen.node(w).unwrap().is_dirty());
    }

    #[test]
    fn null_is_ignored() {
        let (mut screen, root) = screen();
        let w = block(&mut screen, root);
        assert!(!screen.set_value(w, "Label", Value::Null).unwrap());
        assert!(!screen.node(w).unwrap().props().contains("Label"));
    }

    #[test]
    fn dirty_widget_ignores_writes_until_drained() {
        let (mut screen, root) = screen();
        let w = block(&mut screen, root);
        assert!(screen.set(w, "Count", 1i64).unwrap());
        assert!(screen.node(w).unwrap().is_dirty());
        assert!(!screen.set(w, "Count", 2i64).unwrap());
        assert_eq!(screen.value::<i64>(w, "Count").unwrap(), Some(1));

        settle(&mut screen);
        assert!(screen.set(w, "Count", 2i64).unwrap());
    }

    #[test]
    fn kind_mismatch_is_cast_error() {
        let (mut screen, root) = screen();
        let w = block(&mut screen, root);
        screen.set(w, "Count", 1i64).unwrap();
        settle(&mut screen);

        let err = screen.set(w, "Count", "one".to_string()).unwrap_err();
        assert_eq!(
            err,
            Error::Cast {
                widget_type: "Block".into(),
                property: "Count".into(),
                expected: "text",
                found: "integer",
            }
        );
        assert!(screen.get(w, "Count", false).is_err());
    }

    #[test]
    fn unknown_widget_is_state_error() {
        let (mut screen, root) = screen();
        let w = block(&mut screen, root);
        screen.dispose(w).unwrap();
        assert!(matches!(screen.set(w, "Count", 1i64), Err(Error::State(_))));
        assert!(matches!(screen.value::<i64>(w, "Count"), Err(Error::State(_))));
    }

    #[test]
    fn unsubscribed_observer_stops_hearing() {
        let (mut screen, root) = screen();
        let w = block(&mut screen, root);
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let sub = screen.subscribe(w, None, move |_, _| *sink.borrow_mut() += 1).unwrap();
        screen.set(w, "A", 1i64).unwrap();
        settle(&mut screen);
        assert!(screen.unsubscribe(sub));
        assert!(!screen.unsubscribe(sub));
        screen.set(w, "B", 1i64).unwrap();
        assert_eq!(*count.borrow(), 1);
    }

    // ── Content ─────────────────────────────────────────────────────

    #[test]
    fn content_cannot_be_an_ancestor() {
        let mut screen = Screen::new(Size::new(10, 10));
        let outer = screen.insert(WidgetNode::new(Panel::new()));
        let inner = screen.insert(WidgetNode::new(Panel::new()));
        screen.set_root(outer).unwrap();
        assert!(screen.set_content(outer, inner).unwrap());
        settle(&mut screen);

        let count = count_changes(&mut screen, inner, props::CONTENT);
        assert!(!screen.set_content(inner, outer).unwrap());
        assert!(!screen.set_content(inner, inner).unwrap());
        assert_eq!(*count.borrow(), 0);
        assert_eq!(screen.node(inner).unwrap().content(), None);
        assert_eq!(screen.tree().parent(outer), None);
    }

    #[test]
    fn replacing_content_disposes_the_previous_child() {
        let log: Log = Rc::default();
        let mut screen = Screen::new(Size::new(10, 10));
        let panel = screen.insert(WidgetNode::new(Panel::new()));
        screen.set_root(panel).unwrap();
        let first = screen.insert(probe("first", &log));
        let second = screen.insert(probe("second", &log));

        screen.set_content(panel, first).unwrap();
        settle(&mut screen);
        screen.set_content(panel, second).unwrap();

        assert!(screen.node(first).is_none());
        assert_eq!(screen.tree().children(panel), &[second]);
        assert_eq!(
            *log.borrow(),
            vec!["first:attach", "first:detach", "second:attach"]
        );
    }

    #[test]
    fn content_api_checks_container_shape() {
        let (mut screen, root) = screen();
        let leaf = block(&mut screen, root);
        let other = screen.insert(WidgetNode::new(Block::new()));
        assert!(matches!(screen.add_content(leaf, other), Err(Error::Configuration(_))));
        assert!(matches!(screen.set_content(root, other), Err(Error::Configuration(_))));

        let panel = screen.insert(WidgetNode::new(Panel::new()));
        assert!(matches!(screen.add_content(panel, other), Err(Error::Configuration(_))));
        assert!(matches!(
            screen.set_value(panel, props::CONTENT, Value::Int(1)),
            Err(Error::Cast { .. })
        ));
    }

    #[test]
    fn add_content_refuses_cycles_and_adopted_children() {
        let (mut screen, root) = screen();
        let stack = screen.insert(WidgetNode::new(StackPanel::new()));
        assert!(screen.add_content(root, stack).unwrap());
        assert!(!screen.add_content(stack, root).unwrap());
        assert!(!screen.add_content(root, stack).unwrap());

        let other = screen.insert(WidgetNode::new(DockPanel::new()));
        assert!(matches!(screen.add_content(other, stack), Err(Error::State(_))));
    }

    #[test]
    fn clear_and_remove_content() {
        let (mut screen, root) = screen();
        let panel = screen.insert(WidgetNode::new(Panel::new()));
        screen.add_content(root, panel).unwrap();
        let child = screen.insert(WidgetNode::new(Block::new()));
        screen.set_content(panel, child).unwrap();

        assert_eq!(screen.clear_content(panel).unwrap(), Some(child));
        assert_eq!(screen.node(panel).unwrap().content(), None);
        assert_eq!(screen.clear_content(panel).unwrap(), None);

        assert!(!screen.remove_content(panel, root).unwrap());
        assert!(screen.remove_content(root, panel).unwrap());
        assert!(screen.node(panel).is_none());
    }

    #[test]
    fn detach_releases_registrations_bindings_and_focus() {
        let log: Log = Rc::default();
        let (mut screen, root) = screen();
        let a = screen.insert(probe("a", &log));
        screen.add_content(root, a).unwrap();
        let b = block(&mut screen, root);

        screen.register_input(a, InputKind::Click, &[], |_, _| Ok(())).unwrap();
        screen
            .bind(Binding::builder(a, "X").to(b, "Y").unwrap())
            .unwrap();
        screen.set_focus(a).unwrap();
        settle(&mut screen);

        assert_eq!(screen.detach(a).unwrap(), Some(root));
        assert!(screen.input().is_empty());
        assert!(screen.bindings().is_empty());
        assert_eq!(screen.focused(), None);
        assert!(screen.node(a).is_some());
        assert_eq!(*log.borrow(), vec!["a:attach", "a:focus", "a:detach", "a:unfocus"]);
        assert_eq!(screen.detach(a).unwrap(), None);
    }

    // ── Bindings ────────────────────────────────────────────────────

    #[test]
    fn one_way_feeds_target_without_dirtying_it() {
        let (mut screen, root) = screen();
        let a = block(&mut screen, root);
        let b = block(&mut screen, root);
        let binding = Binding::builder(a, "Count")
            .converter(|n: i64| n * 10)
            .to(b, "Scaled")
            .unwrap();
        screen.bind(binding).unwrap();

        screen.set(a, "Count", 4i64).unwrap();
        assert_eq!(screen.value::<i64>(b, "Scaled").unwrap(), Some(40));
        assert!(screen.node(a).unwrap().is_dirty());
        assert!(!screen.node(b).unwrap().is_dirty());

        // Nothing flows back.
        settle(&mut screen);
        screen.set(b, "Scaled", 7i64).unwrap();
        assert_eq!(screen.value::<i64>(a, "Count").unwrap(), Some(4));
    }

    #[test]
    fn one_way_to_source_writes_back() {
        let (mut screen, root) = screen();
        let a = block(&mut screen, root);
        let b = block(&mut screen, root);
        let binding = Binding::builder(a, "Text")
            .direction(Direction::OneWayToSource)
            .back_converter(|s: String| s.to_uppercase())
            .to(b, "Text")
            .unwrap();
        screen.bind(binding).unwrap();

        screen.set(b, "Text", "hello".to_string()).unwrap();
        assert_eq!(screen.value::<String>(a, "Text").unwrap(), Some("HELLO".to_string()));

        // Nothing flows forward.
        settle(&mut screen);
        screen.set(a, "Text", "other".to_string()).unwrap();
        assert_eq!(screen.value::<String>(b, "Text").unwrap(), Some("hello".to_string()));
    }

    #[test]
    fn one_time_copies_once() {
        let (mut screen, root) = screen();
        let a = block(&mut screen, root);
        let b = block(&mut screen, root);
        screen.set(a, "Count", 5i64).unwrap();
        settle(&mut screen);

        let id = screen
            .bind(Binding::builder(a, "Count").direction(Direction::OneTime).to(b, "Count").unwrap())
            .unwrap();
        assert_eq!(screen.value::<i64>(b, "Count").unwrap(), Some(5));
        assert_eq!(screen.node(a).unwrap().channel.len(), 0);

        settle(&mut screen);
        screen.set(a, "Count", 6i64).unwrap();
        assert_eq!(screen.value::<i64>(b, "Count").unwrap(), Some(5));
        assert!(screen.unbind(id));
        assert!(!screen.unbind(id));
    }

    #[test]
    fn two_way_feedback_terminates_consistently() {
        let (mut screen, root) = screen();
        let a = block(&mut screen, root);
        let b = block(&mut screen, root);
        // Not inverse of each other: every round trip adds one.
        let binding = Binding::builder(a, "X")
            .direction(Direction::TwoWay)
            .converter(|x: i64| x * 2)
            .back_converter(|y: i64| y / 2 + 1)
            .to(b, "Y")
            .unwrap();
        screen.bind(binding).unwrap();

        screen.set(a, "X", 10i64).unwrap();
        let x = screen.value::<i64>(a, "X").unwrap().unwrap();
        let y = screen.value::<i64>(b, "Y").unwrap().unwrap();
        assert_eq!(y, 20);
        assert_eq!(x, y / 2 + 1);
        assert!(!screen.bindings().is_propagating());
    }

    #[test]
    fn converter_rejecting_input_is_cast_error() {
        let (mut screen, root) = screen();
        let a = block(&mut screen, root);
        let b = block(&mut screen, root);
        screen
            .bind(Binding::builder(a, "X").converter(|x: i64| x).to(b, "Y").unwrap())
            .unwrap();
        let err = screen.set(a, "X", "text".to_string()).unwrap_err();
        assert!(matches!(err, Error::Cast { expected: "integer", found: "text", .. }));
    }

    #[test]
    fn binding_endpoints_must_exist() {
        let (mut screen, root) = screen();
        let a = block(&mut screen, root);
        let gone = block(&mut screen, root);
        screen.dispose(gone).unwrap();
        let binding = Binding::builder(a, "X").to(gone, "Y").unwrap();
        assert!(matches!(screen.bind(binding), Err(Error::State(_))));
        assert!(screen.bindings().is_empty());
    }

    // ── Focus ───────────────────────────────────────────────────────

    #[test]
    fn focus_hooks_run_in_order() {
        let log: Log = Rc::default();
        let (mut screen, root) = screen();
        let a = screen.insert(probe("a", &log));
        let b = screen.insert(probe("b", &log));
        screen.add_content(root, a).unwrap();
        screen.add_content(root, b).unwrap();
        log.borrow_mut().clear();

        screen.set_focus(a).unwrap();
        screen.set_focus(a).unwrap();
        screen.set_focus(b).unwrap();
        assert_eq!(*log.borrow(), vec!["a:focus", "a:unfocus", "b:focus"]);
        assert_eq!(screen.focused(), Some(b));

        screen.clear_focus().unwrap();
        assert_eq!(screen.focused(), None);
    }

    #[test]
    fn focus_traversal_wraps() {
        let (mut screen, root) = screen();
        let a = screen.insert(WidgetNode::new(Block::focusable()));
        let b = screen.insert(WidgetNode::new(Block::focusable()));
        screen.add_content(root, a).unwrap();
        block(&mut screen, root);
        screen.add_content(root, b).unwrap();

        assert_eq!(screen.focus_next().unwrap(), Some(a));
        assert_eq!(screen.focus_next().unwrap(), Some(b));
        assert_eq!(screen.focus_next().unwrap(), Some(a));
        assert_eq!(screen.focus_previous().unwrap(), Some(b));
    }

    #[test]
    fn focusing_unknown_widget_is_state_error() {
        let (mut screen, root) = screen();
        let w = block(&mut screen, root);
        screen.dispose(w).unwrap();
        assert!(matches!(screen.set_focus(w), Err(Error::State(_))));
    }

    // ── Scheduling and layout ───────────────────────────────────────

    #[test]
    fn background_widget_schedules_nearest_layered_ancestor() {
        let (mut screen, root) = screen();
        let w = block(&mut screen, root);
        settle(&mut screen);

        assert!(!screen.schedule_redraw(w).unwrap());
        screen.set(w, props::BACKGROUND_COLOR, Color::WHITE).unwrap();
        assert!(screen.scheduler().is_scheduled(root));
        assert!(!screen.scheduler().is_scheduled(w));
    }

    #[test]
    fn layout_without_root_is_state_error() {
        let mut screen = Screen::new(Size::new(10, 10));
        assert!(matches!(screen.layout(), Err(Error::State(_))));
    }

    #[test]
    fn layout_properties_trigger_relayout() {
        let (mut screen, root) = screen();
        let w = screen.insert(
            WidgetNode::new(Block::new())
                .with(props::SIZE, Size::new(10, 10))
                .with(props::HORIZONTAL_ALIGNMENT, HorizontalAlignment::Left)
                .with(props::VERTICAL_ALIGNMENT, VerticalAlignment::Top),
        );
        screen.add_content(root, w).unwrap();
        settle(&mut screen);
        assert!(!screen.node(root).unwrap().needs_layout());
        assert_eq!(screen.layout().unwrap(), 0);

        screen.set(w, props::MARGIN, Spacing::all(5)).unwrap();
        assert!(screen.node(root).unwrap().needs_layout());
        assert_eq!(screen.layout().unwrap(), 1);
        assert_eq!(screen.node(w).unwrap().bounds(), Region::new(5, 5, 10, 10));
    }

    #[test]
    fn resize_invalidates_root() {
        let (mut screen, root) = screen();
        settle(&mut screen);
        screen.resize(Size::new(100, 100));
        assert!(!screen.node(root).unwrap().needs_layout());
        screen.resize(Size::new(40, 30));
        assert!(screen.node(root).unwrap().needs_layout());
        screen.layout().unwrap();
        assert_eq!(screen.node(root).unwrap().bounds(), Region::new(0, 0, 40, 30));
    }

    #[test]
    fn hiding_erases_footprint() {
        let (mut screen, root) = screen();
        let w = screen.insert(
            WidgetNode::new(Block::new())
                .with(props::Z_INDEX, 2)
                .with(props::SIZE, Size::new(10, 10)),
        );
        screen.add_content(root, w).unwrap();
        settle(&mut screen);
        let footprint = screen.node(w).unwrap().last_drawn();
        assert!(footprint.is_some());

        screen.set(w, props::IS_VISIBLE, false).unwrap();
        assert_eq!(screen.node(w).unwrap().last_drawn(), None);
        let mut surface = RecordingSurface::new();
        screen.layout().unwrap();
        screen.render(&mut surface).unwrap();
        assert_eq!(
            surface.commands().first(),
            Some(&crate::testing::DrawCommand::Clear { rect: footprint.unwrap() })
        );
    }

    #[test]
    fn quit_flag() {
        let (mut screen, _) = screen();
        assert!(!screen.quit_requested());
        screen.request_quit();
        assert!(screen.quit_requested());
    }
}
