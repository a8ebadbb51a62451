//! Measure and arrange passes.
//!
//! Both passes read their inputs from the property store (declared size,
//! alignment, margin, padding, visibility, orientation) and write their results
//! into the node's layout fields, never back into properties. That keeps layout
//! free of change notifications and makes a second pass over an unchanged tree
//! a no-op.

use tracing::debug;

use super::align::{HorizontalAlignment, Orientation, Placement, VerticalAlignment};
use crate::error::{Error, Result};
use crate::geometry::{Region, Size, Spacing};
use crate::tree::{WidgetId, WidgetNode, WidgetTree};
use crate::widget::{props, Container};

/// Layout inputs of one widget.
#[derive(Debug, Clone, Copy)]
struct LayoutProps {
    declared: Size,
    horizontal: HorizontalAlignment,
    vertical: VerticalAlignment,
    margin: Spacing,
    padding: Spacing,
    visible: bool,
    orientation: Orientation,
    /// Gap between consecutive visible children of a stack.
    gap: i32,
}

impl LayoutProps {
    fn read(node: &WidgetNode) -> Result<Self> {
        let p = node.props();
        Ok(Self {
            declared: p.value_or(props::SIZE, Size::ZERO)?,
            horizontal: p.value_or(props::HORIZONTAL_ALIGNMENT, HorizontalAlignment::default())?,
            vertical: p.value_or(props::VERTICAL_ALIGNMENT, VerticalAlignment::default())?,
            margin: p.value_or(props::MARGIN, Spacing::ZERO)?,
            padding: p.value_or(props::PADDING, Spacing::ZERO)?,
            visible: p.value_or(props::IS_VISIBLE, true)?,
            orientation: p.value_or(props::ORIENTATION, Orientation::default())?,
            gap: p.value_or(props::SPACING, 0i32)?.max(0),
        })
    }
}

/// Margin of a visible child, `None` for hidden or unknown ones.
fn child_margin(tree: &WidgetTree, child: WidgetId) -> Result<Option<Spacing>> {
    let Some(node) = tree.get(child) else {
        return Ok(None);
    };
    if !node.is_visible()? {
        return Ok(None);
    }
    Ok(Some(node.props().value_or(props::MARGIN, Spacing::ZERO)?))
}

// ---------------------------------------------------------------------------
// measure
// ---------------------------------------------------------------------------

/// Compute and record the desired size of `id` given `available` space.
///
/// The result excludes the widget's own margin (the parent accounts for it) and
/// includes its padding. A non-zero declared size on an axis replaces the
/// content-derived size on that axis. Hidden widgets measure as zero.
pub fn measure(tree: &mut WidgetTree, id: WidgetId, available: Size) -> Result<Size> {
    let Some(node) = tree.get(id) else {
        return Ok(Size::ZERO);
    };
    let lp = LayoutProps::read(node)?;
    if !lp.visible {
        set_desired(tree, id, Size::ZERO);
        return Ok(Size::ZERO);
    }

    let inner = available.shrink(lp.padding);
    let children = tree.children(id).to_vec();
    let content = match node.container() {
        Container::Leaf => match node.widget.as_deref() {
            Some(widget) => widget.natural_size(node.props())?,
            None => Size::ZERO,
        },
        Container::Single | Container::Overlay => {
            let mut size = Size::ZERO;
            for child in children {
                let Some(margin) = child_margin(tree, child)? else {
                    measure(tree, child, Size::ZERO)?;
                    continue;
                };
                let desired = measure(tree, child, inner.shrink(margin))?;
                size = size.max(desired.grow(margin));
            }
            size
        }
        Container::Stack => measure_stack(tree, &children, inner, lp.orientation, lp.gap)?,
    };

    let mut desired = content.grow(lp.padding);
    if lp.declared.width > 0 {
        desired.width = lp.declared.width;
    }
    if lp.declared.height > 0 {
        desired.height = lp.declared.height;
    }
    set_desired(tree, id, desired);
    Ok(desired)
}

/// Sum along the axis plus one `gap` between each pair of visible children,
/// max across it. Each child is offered what the previous ones left over.
fn measure_stack(
    tree: &mut WidgetTree,
    children: &[WidgetId],
    inner: Size,
    orientation: Orientation,
    gap: i32,
) -> Result<Size> {
    let mut along = 0;
    let mut across = 0;
    let mut placed = 0;
    for &child in children {
        let Some(margin) = child_margin(tree, child)? else {
            measure(tree, child, Size::ZERO)?;
            continue;
        };
        if placed > 0 {
            along += gap;
        }
        placed += 1;
        let offer = match orientation {
            Orientation::Horizontal => Size::new((inner.width - along).max(0), inner.height),
            Orientation::Vertical => Size::new(inner.width, (inner.height - along).max(0)),
        };
        let desired = measure(tree, child, offer.shrink(margin))?.grow(margin);
        match orientation {
            Orientation::Horizontal => {
                along += desired.width;
                across = across.max(desired.height);
            }
            Orientation::Vertical => {
                along += desired.height;
                across = across.max(desired.width);
            }
        }
    }
    Ok(match orientation {
        Orientation::Horizontal => Size::new(along, across),
        Orientation::Vertical => Size::new(across, along),
    })
}

fn set_desired(tree: &mut WidgetTree, id: WidgetId, desired: Size) {
    if let Some(node) = tree.get_mut(id) {
        node.desired = desired;
    }
}

// ---------------------------------------------------------------------------
// arrange
// ---------------------------------------------------------------------------

/// Assign final bounds to `id` inside `slot` and recurse into its content.
///
/// `slot` is the rect the parent offers after removing this widget's margin.
/// Widgets whose bounds changed are appended to `moved`.
pub fn arrange(tree: &mut WidgetTree, id: WidgetId, slot: Region, moved: &mut Vec<WidgetId>) -> Result<()> {
    let Some(node) = tree.get(id) else {
        return Ok(());
    };
    let lp = LayoutProps::read(node)?;
    let container = node.container();
    let desired = node.desired_size();

    let bounds = if lp.visible {
        let (x, width) = Placement::from(lp.horizontal).place(slot.x, slot.width, desired.width);
        let (y, height) = Placement::from(lp.vertical).place(slot.y, slot.height, desired.height);
        Region::new(x, y, width, height)
    } else {
        Region::from_parts(slot.origin(), Size::ZERO)
    };

    if let Some(node) = tree.get_mut(id) {
        node.needs_layout = false;
        if node.bounds != bounds {
            node.bounds = bounds;
            if lp.visible {
                moved.push(id);
            }
        }
    }

    let inner = bounds.shrink(lp.padding);
    let children = tree.children(id).to_vec();
    match container {
        Container::Leaf => {}
        Container::Single | Container::Overlay => {
            for child in children {
                let margin = child_margin(tree, child)?.unwrap_or(Spacing::ZERO);
                arrange(tree, child, inner.shrink(margin), moved)?;
            }
        }
        Container::Stack => arrange_stack(tree, &children, inner, lp.orientation, lp.gap, moved)?,
    }
    Ok(())
}

/// Give each child a cell as long as its desired size (plus margin) along the
/// axis, clamped to what is left, and the full inner extent across it. Visible
/// children are separated by `gap`.
fn arrange_stack(
    tree: &mut WidgetTree,
    children: &[WidgetId],
    inner: Region,
    orientation: Orientation,
    gap: i32,
    moved: &mut Vec<WidgetId>,
) -> Result<()> {
    let (mut cursor, end) = match orientation {
        Orientation::Horizontal => (inner.x, inner.right()),
        Orientation::Vertical => (inner.y, inner.bottom()),
    };
    let mut placed = 0;
    for &child in children {
        let Some(margin) = child_margin(tree, child)? else {
            let origin = match orientation {
                Orientation::Horizontal => Region::new(cursor, inner.y, 0, 0),
                Orientation::Vertical => Region::new(inner.x, cursor, 0, 0),
            };
            arrange(tree, child, origin, moved)?;
            continue;
        };
        if placed > 0 {
            cursor = (cursor + gap).min(end.max(cursor));
        }
        placed += 1;
        let desired = tree.get(child).map_or(Size::ZERO, |n| n.desired_size()).grow(margin);
        let cell = match orientation {
            Orientation::Horizontal => {
                let length = desired.width.min((inner.right() - cursor).max(0));
                let cell = Region::new(cursor, inner.y, length, inner.height);
                cursor += length;
                cell
            }
            Orientation::Vertical => {
                let length = desired.height.min((inner.bottom() - cursor).max(0));
                let cell = Region::new(inner.x, cursor, inner.width, length);
                cursor += length;
                cell
            }
        };
        arrange(tree, child, cell.shrink(margin), moved)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// LayoutEngine
// ---------------------------------------------------------------------------

/// Runs layout over the whole tree when something invalidated it.
#[derive(Debug, Default)]
pub struct LayoutEngine {
    passes: u64,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of full passes run so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Re-run layout if the root was invalidated. Returns the widgets whose
    /// bounds changed.
    pub fn update(&mut self, tree: &mut WidgetTree, viewport: Region) -> Result<Vec<WidgetId>> {
        let root = tree
            .root()
            .ok_or_else(|| Error::state("layout requires a root widget"))?;
        if !tree.get(root).is_some_and(WidgetNode::needs_layout) {
            return Ok(Vec::new());
        }
        self.run(tree, root, viewport)
    }

    /// Measure and arrange `root` into `viewport` unconditionally.
    pub fn run(&mut self, tree: &mut WidgetTree, root: WidgetId, viewport: Region) -> Result<Vec<WidgetId>> {
        let margin = match tree.get(root) {
            Some(node) => node.props().value_or(props::MARGIN, Spacing::ZERO)?,
            None => return Err(Error::state("root widget is not in the tree")),
        };
        measure(tree, root, viewport.size().shrink(margin))?;
        let mut moved = Vec::new();
        arrange(tree, root, viewport.shrink(margin), &mut moved)?;
        self.passes += 1;
        debug!(pass = self.passes, moved = moved.len(), "layout pass");
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::widgets::{Block, DockPanel, Panel, StackPanel};

    const VIEWPORT: Region = Region::new(0, 0, 200, 100);

    fn block(width: i32, height: i32) -> WidgetNode {
        WidgetNode::new(Block::new()).with(props::SIZE, Size::new(width, height))
    }

    fn rooted(tree: &mut WidgetTree, node: WidgetNode) -> WidgetId {
        let id = tree.insert(node);
        tree.set_root(id);
        id
    }

    fn bounds(tree: &WidgetTree, id: WidgetId) -> Region {
        tree.get(id).map(WidgetNode::bounds).unwrap_or_default()
    }

    // ── Leaf ────────────────────────────────────────────────────────

    #[test]
    fn leaf_measures_declared_size_plus_nothing() {
        let mut tree = WidgetTree::new();
        let id = rooted(&mut tree, block(30, 20));
        assert_eq!(measure(&mut tree, id, Size::new(200, 100)).unwrap(), Size::new(30, 20));
    }

    #[test]
    fn leaf_alignment_within_viewport() {
        let mut tree = WidgetTree::new();
        let id = rooted(
            &mut tree,
            block(30, 20)
                .with(props::HORIZONTAL_ALIGNMENT, HorizontalAlignment::Center)
                .with(props::VERTICAL_ALIGNMENT, VerticalAlignment::Bottom),
        );
        LayoutEngine::new().update(&mut tree, VIEWPORT).unwrap();
        assert_eq!(bounds(&tree, id), Region::new(85, 80, 30, 20));
    }

    #[test]
    fn stretch_fills_offer() {
        let mut tree = WidgetTree::new();
        let id = rooted(
            &mut tree,
            block(30, 20).with(props::HORIZONTAL_ALIGNMENT, HorizontalAlignment::Stretch),
        );
        LayoutEngine::new().update(&mut tree, VIEWPORT).unwrap();
        assert_eq!(bounds(&tree, id), Region::new(0, 0, 200, 20));
    }

    #[test]
    fn oversized_widget_is_clamped_to_offer() {
        let mut tree = WidgetTree::new();
        let id = rooted(&mut tree, block(500, 500));
        LayoutEngine::new().update(&mut tree, VIEWPORT).unwrap();
        assert_eq!(bounds(&tree, id), VIEWPORT);
    }

    // ── Single content ──────────────────────────────────────────────

    #[test]
    fn panel_applies_padding_and_child_margin() {
        let mut tree = WidgetTree::new();
        let panel = rooted(
            &mut tree,
            WidgetNode::new(Panel::new()).with(props::PADDING, Spacing::all(5)),
        );
        let child = tree.insert(block(20, 10).with(props::MARGIN, Spacing::new(1, 2, 3, 4)));
        tree.attach(panel, child);

        let desired = measure(&mut tree, panel, Size::new(200, 100)).unwrap();
        // 20 + 4 + 2 + 10 wide, 10 + 1 + 3 + 10 high.
        assert_eq!(desired, Size::new(36, 24));

        LayoutEngine::new().update(&mut tree, VIEWPORT).unwrap();
        assert_eq!(bounds(&tree, panel), Region::new(0, 0, 36, 24));
        assert_eq!(bounds(&tree, child), Region::new(9, 6, 20, 10));
    }

    // ── Stack ───────────────────────────────────────────────────────

    #[test]
    fn vertical_stack_sums_heights_and_maxes_widths() {
        let mut tree = WidgetTree::new();
        let stack = rooted(&mut tree, WidgetNode::new(StackPanel::new()));
        let a = tree.insert(block(40, 10));
        let b = tree.insert(block(60, 15).with(props::MARGIN, Spacing::symmetric(2, 0)));
        tree.attach(stack, a);
        tree.attach(stack, b);

        assert_eq!(measure(&mut tree, stack, Size::new(200, 100)).unwrap(), Size::new(60, 29));

        LayoutEngine::new().update(&mut tree, VIEWPORT).unwrap();
        assert_eq!(bounds(&tree, a), Region::new(0, 0, 40, 10));
        assert_eq!(bounds(&tree, b), Region::new(0, 12, 60, 15));
    }

    #[test]
    fn horizontal_stack_places_side_by_side() {
        let mut tree = WidgetTree::new();
        let stack = rooted(
            &mut tree,
            WidgetNode::new(StackPanel::new())
                .with(props::ORIENTATION, Orientation::Horizontal)
                .with(props::PADDING, Spacing::all(1)),
        );
        let a = tree.insert(block(40, 10));
        let b = tree.insert(block(30, 20).with(props::VERTICAL_ALIGNMENT, VerticalAlignment::Stretch));
        tree.attach(stack, a);
        tree.attach(stack, b);

        assert_eq!(measure(&mut tree, stack, Size::new(200, 100)).unwrap(), Size::new(72, 22));

        LayoutEngine::new().update(&mut tree, VIEWPORT).unwrap();
        assert_eq!(bounds(&tree, a), Region::new(1, 1, 40, 10));
        assert_eq!(bounds(&tree, b), Region::new(41, 1, 30, 20));
    }

    #[test]
    fn stack_children_never_overflow_the_container() {
        let mut tree = WidgetTree::new();
        let stack = rooted(
            &mut tree,
            WidgetNode::new(StackPanel::new()).with(props::SIZE, Size::new(50, 25)),
        );
        let kids: Vec<WidgetId> = (0..3)
            .map(|_| {
                let id = tree.insert(block(50, 10));
                tree.attach(stack, id);
                id
            })
            .collect();

        LayoutEngine::new().update(&mut tree, VIEWPORT).unwrap();
        let outer = bounds(&tree, stack);
        assert_eq!(outer, Region::new(0, 0, 50, 25));
        for id in &kids {
            assert!(outer.contains_region(bounds(&tree, *id)));
        }
        assert_eq!(bounds(&tree, kids[2]), Region::new(0, 20, 50, 5));
    }

    #[test]
    fn spacing_separates_visible_children_only() {
        let mut tree = WidgetTree::new();
        let stack = rooted(&mut tree, WidgetNode::new(StackPanel::new()).with(props::SPACING, 4));
        let a = tree.insert(block(40, 10));
        let hidden = tree.insert(block(40, 10).with(props::IS_VISIBLE, false));
        let b = tree.insert(block(20, 5));
        let c = tree.insert(block(30, 5));
        for id in [a, hidden, b, c] {
            tree.attach(stack, id);
        }

        // Three visible children, two gaps.
        assert_eq!(measure(&mut tree, stack, Size::new(200, 100)).unwrap(), Size::new(40, 28));

        LayoutEngine::new().update(&mut tree, VIEWPORT).unwrap();
        assert_eq!(bounds(&tree, a), Region::new(0, 0, 40, 10));
        assert_eq!(bounds(&tree, b), Region::new(0, 14, 20, 5));
        assert_eq!(bounds(&tree, c), Region::new(0, 23, 30, 5));
    }

    #[test]
    fn spacing_is_clamped_to_the_container() {
        let mut tree = WidgetTree::new();
        let stack = rooted(
            &mut tree,
            StackPanel::horizontal()
                .with(props::SIZE, Size::new(50, 10))
                .with(props::SPACING, 30),
        );
        let a = tree.insert(block(30, 10));
        let b = tree.insert(block(30, 10));
        tree.attach(stack, a);
        tree.attach(stack, b);

        LayoutEngine::new().update(&mut tree, VIEWPORT).unwrap();
        assert_eq!(bounds(&tree, a), Region::new(0, 0, 30, 10));
        assert_eq!(bounds(&tree, b), Region::new(50, 0, 0, 10));
    }

    #[test]
    fn hidden_children_take_no_space() {
        let mut tree = WidgetTree::new();
        let stack = rooted(&mut tree, WidgetNode::new(StackPanel::new()));
        let hidden = tree.insert(block(40, 10).with(props::IS_VISIBLE, false));
        let shown = tree.insert(block(40, 10));
        tree.attach(stack, hidden);
        tree.attach(stack, shown);

        LayoutEngine::new().update(&mut tree, VIEWPORT).unwrap();
        assert_eq!(bounds(&tree, shown), Region::new(0, 0, 40, 10));
        assert_eq!(bounds(&tree, hidden).size(), Size::ZERO);
    }

    // ── Overlay ─────────────────────────────────────────────────────

    #[test]
    fn dock_takes_max_and_aligns_each_child() {
        let mut tree = WidgetTree::new();
        let dock = rooted(
            &mut tree,
            WidgetNode::new(DockPanel::new())
                .with(props::HORIZONTAL_ALIGNMENT, HorizontalAlignment::Stretch)
                .with(props::VERTICAL_ALIGNMENT, VerticalAlignment::Stretch),
        );
        let top = tree.insert(
            block(10, 10)
                .with(props::HORIZONTAL_ALIGNMENT, HorizontalAlignment::Stretch)
                .with(props::VERTICAL_ALIGNMENT, VerticalAlignment::Top),
        );
        let corner = tree.insert(
            block(30, 40)
                .with(props::HORIZONTAL_ALIGNMENT, HorizontalAlignment::Right)
                .with(props::VERTICAL_ALIGNMENT, VerticalAlignment::Bottom),
        );
        tree.attach(dock, top);
        tree.attach(dock, corner);

        assert_eq!(measure(&mut tree, dock, Size::new(200, 100)).unwrap(), Size::new(30, 40));

        LayoutEngine::new().update(&mut tree, VIEWPORT).unwrap();
        assert_eq!(bounds(&tree, dock), VIEWPORT);
        assert_eq!(bounds(&tree, top), Region::new(0, 0, 200, 10));
        assert_eq!(bounds(&tree, corner), Region::new(170, 60, 30, 40));
    }

    // ── Engine ──────────────────────────────────────────────────────

    #[test]
    fn second_pass_is_idempotent() {
        let mut tree = WidgetTree::new();
        let stack = rooted(&mut tree, WidgetNode::new(StackPanel::new()));
        let a = tree.insert(block(40, 10));
        tree.attach(stack, a);

        let mut engine = LayoutEngine::new();
        let root = tree.root().unwrap();
        let first = engine.run(&mut tree, root, VIEWPORT).unwrap();
        let snapshot: Vec<Region> = tree.walk_depth_first(root).iter().map(|&id| bounds(&tree, id)).collect();
        let second = engine.run(&mut tree, root, VIEWPORT).unwrap();
        let again: Vec<Region> = tree.walk_depth_first(root).iter().map(|&id| bounds(&tree, id)).collect();

        assert_eq!(first, vec![stack, a]);
        assert!(second.is_empty());
        assert_eq!(snapshot, again);
        assert_eq!(engine.passes(), 2);
    }

    #[test]
    fn update_skips_clean_tree() {
        let mut tree = WidgetTree::new();
        rooted(&mut tree, block(10, 10));
        let mut engine = LayoutEngine::new();
        assert_eq!(engine.update(&mut tree, VIEWPORT).unwrap().len(), 1);
        assert!(engine.update(&mut tree, VIEWPORT).unwrap().is_empty());
        assert_eq!(engine.passes(), 1);
    }

    #[test]
    fn update_without_root_is_state_error() {
        let mut tree = WidgetTree::new();
        tree.insert(block(10, 10));
        let err = LayoutEngine::new().update(&mut tree, VIEWPORT).unwrap_err();
        assert!(matches!(err, Error::State(_)));
    }

    #[test]
    fn wrongly_typed_layout_property_is_cast_error() {
        let mut tree = WidgetTree::new();
        rooted(&mut tree, block(10, 10).with(props::PADDING, 3));
        let err = LayoutEngine::new().update(&mut tree, VIEWPORT).unwrap_err();
        assert!(matches!(err, Error::Cast { ref property, .. } if property == "Padding"));
    }
}
