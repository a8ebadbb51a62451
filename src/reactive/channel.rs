//! Change notification channel.
//!
//! Every widget owns one [`ChangeChannel`]. Subscribing returns a
//! [`SubscriptionId`] token; the subscription lives until the token is passed
//! back to [`ChangeChannel::unsubscribe`] or the owning widget is disposed, which
//! drops the channel and everything subscribed to it.
//!
//! Two kinds of listener share the channel: plain observer closures, which are
//! called inline, and binding endpoints, which are handed back to the caller so
//! it can run the binding with full access to the widget tree.

use std::fmt;

use slotmap::{new_key_type, SlotMap};

use super::binding::{BindingId, Side};
use super::value::Value;
use crate::tree::WidgetId;

new_key_type! {
    /// Token identifying one subscription on a widget's channel.
    pub struct SubscriptionId;
}

/// Closure invoked with `(property name, new value)`.
pub type Observer = Box<dyn FnMut(&str, &Value)>;

/// A subscription handle bound to the widget that owns the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub widget: WidgetId,
    pub id: SubscriptionId,
}

pub(crate) enum Listener {
    Observer(Observer),
    Binding(BindingId, Side),
}

struct Entry {
    /// Only changes to this property are delivered. `None` means all of them.
    filter: Option<String>,
    listener: Listener,
}

impl Entry {
    fn accepts(&self, name: &str) -> bool {
        self.filter.as_deref().map_or(true, |f| f == name)
    }
}

/// Publish/subscribe channel for property changes on one widget.
#[derive(Default)]
pub struct ChangeChannel {
    entries: SlotMap<SubscriptionId, Entry>,
    /// Subscription order; slot order is reused after removals.
    order: Vec<SubscriptionId>,
}

impl ChangeChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe an observer to one property, or to all of them when `filter` is `None`.
    pub fn observe(&mut self, filter: Option<&str>, observer: Observer) -> SubscriptionId {
        self.push(Entry {
            filter: filter.map(str::to_owned),
            listener: Listener::Observer(observer),
        })
    }

    pub(crate) fn attach_binding(&mut self, property: &str, binding: BindingId, side: Side) -> SubscriptionId {
        self.push(Entry {
            filter: Some(property.to_owned()),
            listener: Listener::Binding(binding, side),
        })
    }

    fn push(&mut self, entry: Entry) -> SubscriptionId {
        let id = self.entries.insert(entry);
        self.order.push(id);
        id
    }

    /// Remove a subscription. Returns `false` when the token was already released.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        if self.entries.remove(id).is_none() {
            return false;
        }
        self.order.retain(|&o| o != id);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deliver a change in subscription order. Observers run immediately; the
    /// binding endpoints that listen to `name` are returned for the caller to
    /// propagate.
    pub(crate) fn publish(&mut self, name: &str, value: &Value) -> Vec<(BindingId, Side)> {
        let mut bindings = Vec::new();
        for &id in &self.order {
            let Some(entry) = self.entries.get_mut(id) else {
                continue;
            };
            if !entry.accepts(name) {
                continue;
            }
            match &mut entry.listener {
                Listener::Observer(observer) => observer(name, value),
                Listener::Binding(id, side) => bindings.push((*id, *side)),
            }
        }
        bindings
    }
}

impl fmt::Debug for ChangeChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeChannel")
            .field("subscriptions", &self.entries.len())
            .finish()
    }
}
