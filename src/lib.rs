//! # tessera
//!
//! A retained-mode widget composition engine.
//!
//! tessera keeps a tree of widgets whose state lives in string-keyed, typed
//! properties. Writing a property notifies observers, flows through data
//! bindings to other widgets, invalidates layout when it affects size or
//! placement, and schedules the widget for a z-ordered redraw on the next
//! frame. Drawing goes through the [`Surface`](render::Surface) trait, so the
//! engine itself never touches a pixel or a terminal cell.
//!
//! ## Core Systems
//!
//! - **[`reactive`]**: property values, change channels, bindings and converters
//! - **[`tree`]**: slotmap-backed widget arena with parent/child links
//! - **[`layout`]**: two-pass measure/arrange with alignment, margin and padding
//! - **[`render`]**: z-ordered redraw scheduler and the drawing surface trait
//! - **[`input`]**: device sampling, mouse classification, key edges, focus
//! - **[`widget`]**: the Widget trait and well-known property names
//! - **[`widgets`]**: built-in Panel, StackPanel, DockPanel and Block
//! - **[`screen`]**: the tree plus every engine acting on it
//! - **[`app`]**: frame loop tying a screen to a device and a surface
//! - **[`testing`]**: headless Pilot, scripted device, recording surface
//! - **[`geometry`]**: Offset, Size, Region, Spacing primitives

// Foundation
pub mod error;
pub mod geometry;

// Core systems
pub mod layout;
pub mod reactive;
pub mod tree;

// Widget system
pub mod widget;
pub mod widgets;

// Input and rendering
pub mod input;
pub mod render;

// Application
pub mod app;
pub mod screen;

// Headless test support
pub mod testing;

pub use app::{App, AppConfig, TickReport};
pub use error::{Error, Result};
pub use geometry::{Offset, Region, Size, Spacing};
pub use screen::Screen;
pub use tree::{WidgetId, WidgetNode};
pub use widget::Widget;
