//! Property-to-property bindings.
//!
//! A [`Binding`] links `(source widget, property)` to `(target widget, property)`
//! in one of four [`Direction`]s, converting values on the way. Bindings are
//! described with [`BindingBuilder`] and installed with
//! [`Screen::bind`](crate::screen::Screen::bind), which wires the change
//! channel subscriptions.
//!
//! [`BindingEngine`] owns the installed bindings and the bookkeeping that keeps
//! propagation finite:
//!
//! - each binding has a depth counter; a notification that reaches a binding
//!   while it is already updating is queued on that binding and replayed in
//!   FIFO order once its depth drops back to zero;
//! - within one propagation wave (from the first binding entered until the
//!   outermost binding update returns) each side of a binding applies at most
//!   once, so cycles through several bindings also terminate.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

use super::channel::SubscriptionId;
use super::value::{PropertyType, Value};
use crate::error::{Error, Result};
use crate::tree::WidgetId;

new_key_type! {
    /// Handle to an installed binding.
    pub struct BindingId;
}

// ---------------------------------------------------------------------------
// Direction / Side
// ---------------------------------------------------------------------------

/// Which way values flow through a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Source changes are written to the target.
    #[default]
    OneWayToTarget,
    /// Target changes are written back to the source.
    OneWayToSource,
    /// Both of the above.
    TwoWay,
    /// The source value is copied to the target once, when the binding is installed.
    OneTime,
}

impl Direction {
    /// One-way feeds do not make the receiving widget schedule its own redraw.
    pub fn is_one_way(self) -> bool {
        matches!(self, Direction::OneWayToTarget | Direction::OneWayToSource)
    }

    pub(crate) fn watches_source(self) -> bool {
        matches!(self, Direction::OneWayToTarget | Direction::TwoWay)
    }

    pub(crate) fn watches_target(self) -> bool {
        matches!(self, Direction::OneWayToSource | Direction::TwoWay)
    }

    fn needs_backward(self) -> bool {
        matches!(self, Direction::OneWayToSource | Direction::TwoWay)
    }
}

/// The end of a binding whose property changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Source,
    Target,
}

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

/// A value conversion applied while propagating.
#[derive(Clone)]
pub struct Converter {
    /// Kind the converter accepts, reported when it rejects a value.
    input: &'static str,
    apply: Rc<dyn Fn(&Value) -> Option<Value>>,
}

impl Converter {
    /// Wrap a typed conversion function.
    pub fn new<A, B>(f: impl Fn(A) -> B + 'static) -> Self
    where
        A: PropertyType,
        B: PropertyType,
    {
        Self {
            input: A::KIND,
            apply: Rc::new(move |value| A::from_value(value).map(|a| f(a).into_value())),
        }
    }

    /// Pass values through unchanged.
    pub fn identity() -> Self {
        Self {
            input: "any value",
            apply: Rc::new(|value| Some(value.clone())),
        }
    }

    pub fn input_kind(&self) -> &'static str {
        self.input
    }

    /// `None` when the value is not of the accepted kind.
    pub fn convert(&self, value: &Value) -> Option<Value> {
        (self.apply)(value)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter").field("input", &self.input).finish()
    }
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// One end of a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub widget: WidgetId,
    pub property: String,
}

impl Endpoint {
    pub fn new(widget: WidgetId, property: impl Into<String>) -> Self {
        Self { widget, property: property.into() }
    }
}

/// A binding between two widget properties.
#[derive(Debug)]
pub struct Binding {
    source: Endpoint,
    target: Endpoint,
    direction: Direction,
    forward: Converter,
    backward: Option<Converter>,
    pub(crate) source_subscription: Option<SubscriptionId>,
    pub(crate) target_subscription: Option<SubscriptionId>,
    depth: u32,
    pending: VecDeque<Side>,
}

impl Binding {
    /// Start describing a binding whose source is `property` on `widget`.
    pub fn builder(widget: WidgetId, property: impl Into<String>) -> BindingBuilder {
        BindingBuilder::new(widget, property)
    }

    pub fn source(&self) -> &Endpoint {
        &self.source
    }

    pub fn target(&self) -> &Endpoint {
        &self.target
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether the binding is currently inside an update.
    pub fn is_updating(&self) -> bool {
        self.depth > 0
    }

    /// Where a change on `changed` flows: `(from, to, converter)`.
    pub(crate) fn route(&self, changed: Side) -> Option<(&Endpoint, &Endpoint, &Converter)> {
        match changed {
            Side::Source => Some((&self.source, &self.target, &self.forward)),
            Side::Target => self
                .backward
                .as_ref()
                .map(|back| (&self.target, &self.source, back)),
        }
    }

    /// Whether `widget` is either end of the binding.
    pub fn involves(&self, widget: WidgetId) -> bool {
        self.source.widget == widget || self.target.widget == widget
    }
}

// ---------------------------------------------------------------------------
// BindingBuilder
// ---------------------------------------------------------------------------

/// Describes a binding before it is installed.
///
/// ```ignore
/// let binding = Binding::builder(slider, "Value")
///     .direction(Direction::TwoWay)
///     .converter(|v: i64| Size::new(v as i32, 10))
///     .back_converter(|s: Size| i64::from(s.width))
///     .to(bar, "Size")?;
/// screen.bind(binding)?;
/// ```
#[derive(Debug)]
pub struct BindingBuilder {
    source: Endpoint,
    direction: Direction,
    forward: Option<Converter>,
    backward: Option<Converter>,
}

impl BindingBuilder {
    pub fn new(widget: WidgetId, property: impl Into<String>) -> Self {
        Self {
            source: Endpoint::new(widget, property),
            direction: Direction::default(),
            forward: None,
            backward: None,
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Source to target conversion. Defaults to identity.
    pub fn converter<A, B>(mut self, f: impl Fn(A) -> B + 'static) -> Self
    where
        A: PropertyType,
        B: PropertyType,
    {
        self.forward = Some(Converter::new(f));
        self
    }

    /// Target to source conversion. Required for `TwoWay` and `OneWayToSource`.
    pub fn back_converter<A, B>(mut self, f: impl Fn(A) -> B + 'static) -> Self
    where
        A: PropertyType,
        B: PropertyType,
    {
        self.backward = Some(Converter::new(f));
        self
    }

    /// Use identity conversion in both directions.
    pub fn identity(mut self) -> Self {
        self.forward = Some(Converter::identity());
        self.backward = Some(Converter::identity());
        self
    }

    /// Finish the description with the target endpoint.
    ///
    /// Fails with a configuration error when the direction writes back to the
    /// source but no backward converter was given.
    pub fn to(self, widget: WidgetId, property: impl Into<String>) -> Result<Binding> {
        let target = Endpoint::new(widget, property);
        if self.direction.needs_backward() && self.backward.is_none() {
            return Err(Error::configuration(format!(
                "{:?} binding {} -> {} needs a backward converter",
                self.direction, self.source.property, target.property
            )));
        }
        Ok(Binding {
            source: self.source,
            target,
            direction: self.direction,
            forward: self.forward.unwrap_or_else(Converter::identity),
            backward: self.backward,
            source_subscription: None,
            target_subscription: None,
            depth: 0,
            pending: VecDeque::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// BindingEngine
// ---------------------------------------------------------------------------

/// What to do with a notification that reached a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    /// The binding no longer exists.
    Gone,
    /// The binding is mid-update; the change was queued on it.
    Deferred,
    /// This side already applied during the current wave.
    Suppressed,
    Run,
}

/// Installed bindings plus propagation guards.
#[derive(Debug, Default)]
pub struct BindingEngine {
    bindings: SlotMap<BindingId, Binding>,
    /// Binding updates currently on the call stack, across all bindings.
    active: usize,
    /// Binding sides applied since `active` last left zero.
    wave: HashSet<(BindingId, Side)>,
}

impl BindingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: BindingId) -> Option<&Binding> {
        self.bindings.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: BindingId) -> Option<&mut Binding> {
        self.bindings.get_mut(id)
    }

    pub fn contains(&self, id: BindingId) -> bool {
        self.bindings.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Whether a binding update is currently running anywhere.
    pub fn is_propagating(&self) -> bool {
        self.active > 0
    }

    pub(crate) fn insert(&mut self, binding: Binding) -> BindingId {
        self.bindings.insert(binding)
    }

    /// Remove a binding. Its queued updates are dropped with it.
    pub(crate) fn remove(&mut self, id: BindingId) -> Option<Binding> {
        self.bindings.remove(id)
    }

    /// Ids of every binding touching `widget`.
    pub fn involving(&self, widget: WidgetId) -> Vec<BindingId> {
        self.bindings
            .iter()
            .filter(|(_, b)| b.involves(widget))
            .map(|(id, _)| id)
            .collect()
    }

    pub(crate) fn admit(&mut self, id: BindingId, changed: Side) -> Admission {
        let Some(binding) = self.bindings.get_mut(id) else {
            return Admission::Gone;
        };
        if binding.depth > 0 {
            // The update reads the live value, so one queued entry per side is enough.
            if !binding.pending.contains(&changed) {
                binding.pending.push_back(changed);
            }
            return Admission::Deferred;
        }
        if !self.wave.insert((id, changed)) {
            return Admission::Suppressed;
        }
        Admission::Run
    }

    pub(crate) fn enter(&mut self, id: BindingId) {
        if let Some(binding) = self.bindings.get_mut(id) {
            binding.depth += 1;
        }
        self.active += 1;
    }

    /// Leave an update of `id`. Once its depth is back to zero the queued
    /// changes are handed back in arrival order.
    pub(crate) fn leave(&mut self, id: BindingId) -> Vec<Side> {
        match self.bindings.get_mut(id) {
            Some(binding) => {
                binding.depth = binding.depth.saturating_sub(1);
                if binding.depth == 0 {
                    binding.pending.drain(..).collect()
                } else {
                    Vec::new()
                }
            }
            None => Vec::new(),
        }
    }

    /// Pair of [`enter`](Self::enter): closes the wave when the outermost update returns.
    pub(crate) fn finish(&mut self) {
        self.active = self.active.saturating_sub(1);
        if self.active == 0 {
            self.wave.clear();
        }
    }
}
