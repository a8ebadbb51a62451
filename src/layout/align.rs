//! Alignment enums and single-axis placement.

/// Horizontal placement of a widget inside the rect its parent offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
    Stretch,
}

/// Vertical placement of a widget inside the rect its parent offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerticalAlignment {
    #[default]
    Top,
    Center,
    Bottom,
    Stretch,
}

/// Axis of a stacking container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    Horizontal,
    #[default]
    Vertical,
}

/// Axis-independent form of the two alignment enums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    Start,
    Center,
    End,
    Stretch,
}

impl From<HorizontalAlignment> for Placement {
    fn from(value: HorizontalAlignment) -> Self {
        match value {
            HorizontalAlignment::Left => Placement::Start,
            HorizontalAlignment::Center => Placement::Center,
            HorizontalAlignment::Right => Placement::End,
            HorizontalAlignment::Stretch => Placement::Stretch,
        }
    }
}

impl From<VerticalAlignment> for Placement {
    fn from(value: VerticalAlignment) -> Self {
        match value {
            VerticalAlignment::Top => Placement::Start,
            VerticalAlignment::Center => Placement::Center,
            VerticalAlignment::Bottom => Placement::End,
            VerticalAlignment::Stretch => Placement::Stretch,
        }
    }
}

impl Placement {
    /// Place a span of `desired` pixels inside `[start, start + offered)`.
    ///
    /// Returns `(position, extent)`. Stretch takes the whole offer; everything
    /// else is clamped to the offer, so the span never leaves it.
    pub(crate) fn place(self, start: i32, offered: i32, desired: i32) -> (i32, i32) {
        let offered = offered.max(0);
        let extent = match self {
            Placement::Stretch => return (start, offered),
            _ => desired.clamp(0, offered),
        };
        let offset = match self {
            Placement::Start | Placement::Stretch => 0,
            Placement::Center => (offered - extent) / 2,
            Placement::End => offered - extent,
        };
        (start + offset, extent)
    }
}
