//! ElementKind - the central dispatch enum for element content.
//!
//! `ElementKind` decides how an element's content is measured, arranged and
//! hit-tested. The generic part of the protocol (margin, declared size,
//! alignment, caching) lives in `ElementTree`; everything that depends on
//! what the element holds is dispatched from here.

use std::fmt;

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::primitives::{Point, Rect, Size};

use super::element::ElementId;
use super::grid::Grid;
use super::items_list::ItemsList;
use super::leaf::Leaf;
use super::stack::Stack;
use super::tree::{ElementTree, HitResult};
use super::tree_view::TreeView;
use super::uniform_grid::UniformGrid;

/// What an element holds.
pub enum ElementKind {
    /// No children; natural size from an oracle.
    Leaf(Leaf),

    /// Linear flow, optionally wrapping.
    Stack(Stack),

    /// Track-based grid.
    Grid(Grid),

    /// Equal-cell grid.
    UniformGrid(UniformGrid),

    /// Virtualized flat list (boxed, it carries the realization caches).
    ItemsList(Box<ItemsList>),

    /// Virtualized hierarchical list.
    TreeView(Box<TreeView>),
}

impl Default for ElementKind {
    fn default() -> Self {
        ElementKind::Leaf(Leaf::default())
    }
}

// =========================================================================
// ElementKind Methods
// =========================================================================

impl ElementKind {
    /// Short name used in errors and trace output.
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Leaf(_) => "Leaf",
            ElementKind::Stack(_) => "Stack",
            ElementKind::Grid(_) => "Grid",
            ElementKind::UniformGrid(_) => "UniformGrid",
            ElementKind::ItemsList(_) => "ItemsList",
            ElementKind::TreeView(_) => "TreeView",
        }
    }

    pub(crate) fn is_container(&self) -> bool {
        !matches!(self, ElementKind::Leaf(_))
    }

    /// Whether generic stretch and declared-size clamping apply.
    ///
    /// A grid's size is always the sum of its tracks; the declared size
    /// bounds the space the tracks are resolved against instead.
    pub(crate) fn fills_slot(&self) -> bool {
        !matches!(self, ElementKind::Grid(_))
    }

    /// Whether the measure cache must be bypassed this pass.
    pub(crate) fn always_measure(&self) -> bool {
        match self {
            ElementKind::Grid(g) => g.has_bound_tracks(),
            ElementKind::ItemsList(list) => list.source_changed(),
            _ => false,
        }
    }

    /// Pick up defaults the caller did not set explicitly.
    pub(crate) fn configure(&mut self, config: &LayoutConfig) {
        match self {
            ElementKind::Stack(s) => s.configure(config),
            ElementKind::ItemsList(list) => list.configure(config),
            ElementKind::TreeView(tv) => tv.configure(config),
            _ => {}
        }
    }

    /// Every element this kind owns, realized children included.
    pub(crate) fn children(&self) -> Vec<ElementId> {
        match self {
            ElementKind::Leaf(_) => Vec::new(),
            ElementKind::Stack(s) => s.children().to_vec(),
            ElementKind::Grid(g) => g.items().iter().map(|item| item.child()).collect(),
            ElementKind::UniformGrid(u) => u.children().to_vec(),
            ElementKind::ItemsList(list) => list.realized().map(|(_, id)| id).collect(),
            ElementKind::TreeView(tv) => tv.owned_elements(),
        }
    }

    /// Forget a child. Returns whether it was owned.
    pub(crate) fn detach(&mut self, child: ElementId) -> bool {
        match self {
            ElementKind::Leaf(_) => false,
            ElementKind::Stack(s) => s.detach(child),
            ElementKind::Grid(g) => g.detach(child),
            ElementKind::UniformGrid(u) => u.detach(child),
            ElementKind::ItemsList(list) => list.detach(child),
            ElementKind::TreeView(tv) => tv.detach(child),
        }
    }

    /// Measure content against the space left after margin.
    pub(crate) fn measure_content(
        &mut self,
        tree: &mut ElementTree,
        id: ElementId,
        available: Size,
        dont_stretch: bool,
    ) -> Result<Size> {
        match self {
            ElementKind::Leaf(leaf) => Ok(leaf.natural_size(available)),
            ElementKind::Stack(s) => s.measure(tree, available, dont_stretch),
            ElementKind::Grid(g) => g.measure(tree, id, available),
            ElementKind::UniformGrid(u) => u.measure(tree, available, dont_stretch),
            ElementKind::ItemsList(list) => list.measure(tree, id, available),
            ElementKind::TreeView(tv) => tv.measure(tree, id, available),
        }
    }

    /// Arrange children inside the element's final content rectangle.
    pub(crate) fn arrange_content(&mut self, tree: &mut ElementTree, content: Rect) -> Result<()> {
        match self {
            ElementKind::Leaf(_) => Ok(()),
            ElementKind::Stack(s) => s.arrange(tree, content),
            ElementKind::Grid(g) => g.arrange(tree, content),
            ElementKind::UniformGrid(u) => u.arrange(tree, content),
            ElementKind::ItemsList(list) => list.arrange(tree, content),
            ElementKind::TreeView(tv) => tv.arrange(tree, content),
        }
    }

    /// Hit-test children. `None` means the element itself is the target.
    pub(crate) fn hit_test(&self, tree: &ElementTree, id: ElementId, point: Point) -> Option<HitResult> {
        match self {
            ElementKind::Leaf(_) => None,
            ElementKind::Stack(s) => first_hit(tree, s.children().iter().copied(), point),
            ElementKind::Grid(g) => first_hit(tree, g.items().iter().map(|item| item.child()), point),
            ElementKind::UniformGrid(u) => first_hit(tree, u.children().iter().copied(), point),
            ElementKind::ItemsList(list) => list.hit_test(tree, id, point),
            ElementKind::TreeView(tv) => tv.hit_test(tree, id, point),
        }
    }
}

/// Children in declaration order; the first hit wins.
pub(crate) fn first_hit(
    tree: &ElementTree,
    children: impl Iterator<Item = ElementId>,
    point: Point,
) -> Option<HitResult> {
    children.into_iter().find_map(|child| tree.hit_test(child, point))
}

/// Children in order, with hits on non-interactive descendants claimed by
/// the virtualized owner.
pub(crate) fn claiming_hit(
    tree: &ElementTree,
    owner: ElementId,
    children: impl Iterator<Item = ElementId>,
    point: Point,
) -> Option<HitResult> {
    let hit = first_hit(tree, children, point)?;
    match hit {
        HitResult::Scrollbar(_) => Some(hit),
        HitResult::Element(target) => {
            let interactive = tree.get(target).map(|el| el.is_interactive()).unwrap_or(false);
            if interactive {
                Some(hit)
            } else {
                Some(HitResult::Element(owner))
            }
        }
    }
}

impl fmt::Debug for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Leaf(leaf) => fmt::Debug::fmt(leaf, f),
            other => write!(f, "{}({} children)", other.name(), other.children().len()),
        }
    }
}

// =========================================================================
// From impls for ElementKind - lets `Element::new` take any kind directly
// =========================================================================

impl From<Leaf> for ElementKind {
    fn from(v: Leaf) -> Self {
        Self::Leaf(v)
    }
}

impl From<Stack> for ElementKind {
    fn from(v: Stack) -> Self {
        Self::Stack(v)
    }
}

impl From<Grid> for ElementKind {
    fn from(v: Grid) -> Self {
        Self::Grid(v)
    }
}

impl From<UniformGrid> for ElementKind {
    fn from(v: UniformGrid) -> Self {
        Self::UniformGrid(v)
    }
}

impl From<ItemsList> for ElementKind {
    fn from(v: ItemsList) -> Self {
        Self::ItemsList(Box::new(v))
    }
}

impl From<TreeView> for ElementKind {
    fn from(v: TreeView) -> Self {
        Self::TreeView(Box::new(v))
    }
}
