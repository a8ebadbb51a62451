//! Reactive state: property values, per-widget stores, change channels and
//! bindings.
//!
//! - [`PropertyMap`]: string-keyed [`Value`]s owned by one widget.
//! - [`ChangeChannel`]: publish/subscribe for property changes, token based.
//! - [`Binding`] / [`BindingBuilder`]: directional links between properties.
//! - [`BindingEngine`]: installed bindings plus the re-entrancy guards.

pub mod binding;
pub mod channel;
pub mod store;
pub mod value;

pub use binding::{Binding, BindingBuilder, BindingEngine, BindingId, Converter, Direction, Endpoint, Side};
pub use channel::{ChangeChannel, Observer, Subscription, SubscriptionId};
pub use store::PropertyMap;
pub use value::{PropertyType, Value};
