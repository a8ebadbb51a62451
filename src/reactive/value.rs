//! Property values.
//!
//! A property map stores [`Value`]s, a closed set of kinds the engine knows how
//! to compare structurally. Typed access goes through [`PropertyType`], which maps
//! a Rust type onto one variant; reading a stored value as the wrong type is a
//! cast error rather than a silent default.

use crate::geometry::{Offset, Size, Spacing};
use crate::layout::{HorizontalAlignment, Orientation, VerticalAlignment};
use crate::render::{Color, ImageId};
use crate::tree::WidgetId;

/// A dynamically typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value. Assigning it is always a no-op.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Color(Color),
    Image(ImageId),
    Size(Size),
    Offset(Offset),
    Spacing(Spacing),
    HorizontalAlignment(HorizontalAlignment),
    VerticalAlignment(VerticalAlignment),
    Orientation(Orientation),
    Widget(WidgetId),
}

impl Value {
    /// Human-readable kind name, used in cast errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => bool::KIND,
            Value::Int(_) => i64::KIND,
            Value::Float(_) => f64::KIND,
            Value::Text(_) => String::KIND,
            Value::Color(_) => Color::KIND,
            Value::Image(_) => ImageId::KIND,
            Value::Size(_) => Size::KIND,
            Value::Offset(_) => Offset::KIND,
            Value::Spacing(_) => Spacing::KIND,
            Value::HorizontalAlignment(_) => HorizontalAlignment::KIND,
            Value::VerticalAlignment(_) => VerticalAlignment::KIND,
            Value::Orientation(_) => Orientation::KIND,
            Value::Widget(_) => WidgetId::KIND,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether both values are of the same variant.
    pub fn same_kind(&self, other: &Value) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn as_widget(&self) -> Option<WidgetId> {
        match self {
            Value::Widget(id) => Some(*id),
            _ => None,
        }
    }
}

/// A Rust type that can be stored in a property map.
pub trait PropertyType: Sized {
    /// Kind name reported in cast errors.
    const KIND: &'static str;

    fn into_value(self) -> Value;

    /// `None` when `value` holds a different kind.
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! property_type {
    ($ty:ty, $variant:ident, $kind:literal) => {
        impl PropertyType for $ty {
            const KIND: &'static str = $kind;

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(inner) => Some(inner.clone()),
                    _ => None,
                }
            }
        }
    };
}

property_type!(bool, Bool, "bool");
property_type!(i64, Int, "integer");
property_type!(f64, Float, "float");
property_type!(String, Text, "text");
property_type!(Color, Color, "color");
property_type!(ImageId, Image, "image");
property_type!(Size, Size, "size");
property_type!(Offset, Offset, "offset");
property_type!(Spacing, Spacing, "spacing");
property_type!(HorizontalAlignment, HorizontalAlignment, "horizontal alignment");
property_type!(VerticalAlignment, VerticalAlignment, "vertical alignment");
property_type!(Orientation, Orientation, "orientation");
property_type!(WidgetId, Widget, "widget");

// i32 shares the integer variant; out-of-range values fail the cast.
impl PropertyType for i32 {
    const KIND: &'static str = "integer";

    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }
}
