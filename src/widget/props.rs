//! Names of the properties the engine itself reads.

/// Declared [`Size`](crate::geometry::Size). A zero component means "size to content" on that axis.
pub const SIZE: &str = "Size";
pub const HORIZONTAL_ALIGNMENT: &str = "HorizontalAlignment";
pub const VERTICAL_ALIGNMENT: &str = "VerticalAlignment";
/// Outer [`Spacing`](crate::geometry::Spacing), honored by the parent.
pub const MARGIN: &str = "Margin";
/// Inner [`Spacing`](crate::geometry::Spacing) between a widget's bounds and its content.
pub const PADDING: &str = "Padding";
/// Redraw order and hit-test priority. Zero means "drawn by an ancestor".
pub const Z_INDEX: &str = "ZIndex";
pub const IS_VISIBLE: &str = "IsVisible";
pub const BACKGROUND_COLOR: &str = "BackgroundColor";
/// Axis of a stacking container.
pub const ORIENTATION: &str = "Orientation";
/// Gap in pixels between consecutive visible children of a stacking container.
pub const SPACING: &str = "Spacing";
/// Single content of a [`Container::Single`](super::Container::Single) widget.
pub const CONTENT: &str = "Content";
/// Corner radius used by the default background drawing.
pub const CORNER_RADIUS: &str = "CornerRadius";

/// Properties whose change invalidates layout.
pub(crate) const LAYOUT_AFFECTING: &[&str] = &[
    SIZE,
    HORIZONTAL_ALIGNMENT,
    VERTICAL_ALIGNMENT,
    MARGIN,
    PADDING,
    IS_VISIBLE,
    ORIENTATION,
    SPACING,
    CONTENT,
];
