//! ElementTree - the element arena and the generic layout protocol.
//!
//! Elements are stored in a generational arena and refer to each other by
//! handle. Containers own their children's handles; a child's `parent`
//! handle is used only to walk invalidation upward.
//!
//! # Protocol
//!
//! ```text
//! measure(available) -> desired (margin-inclusive), sets element_size
//! arrange(bounds)    -> position, recurses into children
//! hit_test(point)    -> deepest element containing point
//! ```
//!
//! The generic part (margin, declared size, stretch, alignment, cache) is
//! handled here once for every kind. While a container's kind recurses into
//! its children it is moved out of the arena, so the kind and the tree can
//! be borrowed mutably at the same time.

use slotmap::SlotMap;

use crate::collection::CollectionChange;
use crate::config::LayoutConfig;
use crate::error::{LayoutError, Result};
use crate::primitives::{Point, Rect, Size};

use super::cache::{CachedMeasure, MeasureKey};
use super::context::{LayoutContext, LayoutWarning, PassStats};
use super::element::{Element, ElementId};
use super::grid::{Grid, GridPlacement};
use super::items_list::ItemsList;
use super::kind::ElementKind;
use super::tree_view::{TreeClick, TreeView};

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitResult {
    /// An element (the deepest one, or a virtualized owner claiming the hit).
    Element(ElementId),
    /// The scrollbar strip of a virtualized control.
    Scrollbar(ElementId),
}

impl HitResult {
    /// The element that was hit.
    pub fn element(&self) -> ElementId {
        match self {
            HitResult::Element(id) | HitResult::Scrollbar(id) => *id,
        }
    }
}

/// Arena of elements plus per-pass layout state.
#[derive(Debug, Default)]
pub struct ElementTree {
    elements: SlotMap<ElementId, Element>,
    config: LayoutConfig,
    ctx: LayoutContext,
}

impl ElementTree {
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default())
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        let ctx = LayoutContext::new(config.trace_layout);
        Self {
            elements: SlotMap::with_key(),
            config,
            ctx,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    // =========================================================================
    // Arena
    // =========================================================================

    /// Insert a detached element.
    pub fn insert(&mut self, mut element: Element) -> ElementId {
        element.kind.configure(&self.config);
        element.parent = None;
        element.cache.invalidate();
        self.elements.insert(element)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, id: ElementId) -> Result<&Element> {
        self.elements.get(id).ok_or(LayoutError::UnknownElement(id))
    }

    fn get_mut(&mut self, id: ElementId) -> Result<&mut Element> {
        self.elements.get_mut(id).ok_or(LayoutError::UnknownElement(id))
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.elements.get(id).and_then(|el| el.parent)
    }

    /// Children owned by a container, realized children included.
    pub fn children(&self, id: ElementId) -> Result<Vec<ElementId>> {
        Ok(self.get(id)?.kind.children())
    }

    /// Edit an element in place and invalidate it and its ancestors.
    pub fn update<R>(&mut self, id: ElementId, f: impl FnOnce(&mut Element) -> R) -> Result<R> {
        let result = f(self.get_mut(id)?);
        self.invalidate(id);
        Ok(result)
    }

    /// Append a child to a stack or uniform grid.
    pub fn add_child(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        self.prepare_attach(parent, child)?;
        let el = self.get_mut(parent)?;
        match &mut el.kind {
            ElementKind::Stack(s) => s.push_child(child),
            ElementKind::UniformGrid(u) => u.push_child(child),
            other => {
                return Err(LayoutError::NotAContainer {
                    element: parent,
                    kind: other.name(),
                });
            }
        }
        self.finish_attach(parent, child)
    }

    /// Place a child in a grid cell.
    pub fn add_grid_child(
        &mut self,
        grid: ElementId,
        child: ElementId,
        placement: GridPlacement,
    ) -> Result<()> {
        placement.validate()?;
        self.prepare_attach(grid, child)?;
        let el = self.get_mut(grid)?;
        match &mut el.kind {
            ElementKind::Grid(g) => g.push_child(child, placement),
            other => {
                return Err(LayoutError::NotAContainer {
                    element: grid,
                    kind: other.name(),
                });
            }
        }
        self.finish_attach(grid, child)
    }

    /// Validate an attach and detach the child from its previous parent.
    fn prepare_attach(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        self.get(parent)?;
        self.get(child)?;
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(LayoutError::CycleDetected { parent, child });
            }
            cursor = self.parent(id);
        }
        self.detach(child);
        Ok(())
    }

    fn finish_attach(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        self.get_mut(child)?.parent = Some(parent);
        self.invalidate(parent);
        Ok(())
    }

    /// Record the owner of a realized child (virtualized containers).
    pub(crate) fn set_parent(&mut self, child: ElementId, parent: ElementId) -> Result<()> {
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Remove an element from its parent without destroying it.
    pub fn detach(&mut self, id: ElementId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(el) = self.elements.get_mut(parent) {
            el.kind.detach(id);
        }
        if let Some(el) = self.elements.get_mut(id) {
            el.parent = None;
        }
        self.invalidate(parent);
    }

    /// Remove an element and its whole subtree.
    pub fn remove(&mut self, id: ElementId) -> Result<()> {
        self.get(id)?;
        self.detach(id);
        self.remove_subtree(id);
        Ok(())
    }

    /// Drop a subtree without touching its parent's child list.
    pub(crate) fn remove_subtree(&mut self, id: ElementId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(el) = self.elements.remove(next) {
                stack.extend(el.kind.children());
            }
        }
    }

    /// Mark an element and every ancestor dirty.
    pub fn invalidate(&mut self, id: ElementId) {
        let mut cursor = Some(id);
        while let Some(next) = cursor {
            match self.elements.get_mut(next) {
                Some(el) => {
                    el.cache.invalidate();
                    cursor = el.parent;
                }
                None => break,
            }
        }
    }

    // =========================================================================
    // Typed access
    // =========================================================================

    /// Mutable kind access. Invalidates the element first.
    pub fn kind_mut(&mut self, id: ElementId) -> Result<&mut ElementKind> {
        self.get(id)?;
        self.invalidate(id);
        Ok(&mut self.get_mut(id)?.kind)
    }

    pub fn grid(&self, id: ElementId) -> Result<&Grid> {
        match &self.get(id)?.kind {
            ElementKind::Grid(g) => Ok(g),
            other => Err(LayoutError::NotAContainer {
                element: id,
                kind: other.name(),
            }),
        }
    }

    pub fn grid_mut(&mut self, id: ElementId) -> Result<&mut Grid> {
        match self.kind_mut(id)? {
            ElementKind::Grid(g) => Ok(g),
            other => Err(LayoutError::NotAContainer {
                element: id,
                kind: other.name(),
            }),
        }
    }

    pub fn items_list(&self, id: ElementId) -> Result<&ItemsList> {
        match &self.get(id)?.kind {
            ElementKind::ItemsList(list) => Ok(list),
            other => Err(LayoutError::NotAContainer {
                element: id,
                kind: other.name(),
            }),
        }
    }

    pub fn items_list_mut(&mut self, id: ElementId) -> Result<&mut ItemsList> {
        match self.kind_mut(id)? {
            ElementKind::ItemsList(list) => Ok(list),
            other => Err(LayoutError::NotAContainer {
                element: id,
                kind: other.name(),
            }),
        }
    }

    pub fn tree_view(&self, id: ElementId) -> Result<&TreeView> {
        match &self.get(id)?.kind {
            ElementKind::TreeView(tv) => Ok(tv),
            other => Err(LayoutError::NotAContainer {
                element: id,
                kind: other.name(),
            }),
        }
    }

    pub fn tree_view_mut(&mut self, id: ElementId) -> Result<&mut TreeView> {
        match self.kind_mut(id)? {
            ElementKind::TreeView(tv) => Ok(tv),
            other => Err(LayoutError::NotAContainer {
                element: id,
                kind: other.name(),
            }),
        }
    }

    /// Report a change to a list's backing collection.
    pub fn notify_collection_changed(&mut self, list: ElementId, change: CollectionChange) -> Result<()> {
        self.items_list_mut(list)?.notify_collection_changed(change);
        Ok(())
    }

    /// Set the scroll offset of an ItemsList or TreeView. Returns the
    /// clamped offset.
    pub fn set_scroll_offset(&mut self, id: ElementId, offset: f32) -> Result<f32> {
        match self.kind_mut(id)? {
            ElementKind::ItemsList(list) => Ok(list.set_scroll_offset(offset)),
            ElementKind::TreeView(tv) => Ok(tv.set_scroll_offset(offset)),
            other => Err(LayoutError::NotAContainer {
                element: id,
                kind: other.name(),
            }),
        }
    }

    /// Route a click on a tree view: interactive row content first, then the
    /// expander glyph, then row selection.
    pub fn tree_view_click(&mut self, id: ElementId, point: Point) -> Result<TreeClick> {
        let bounds = self.get(id)?.bounds();
        if !bounds.contains(point) {
            return Ok(TreeClick::None);
        }
        let rows = self.tree_view(id)?.realized_elements();
        for row in rows {
            if let Some(hit) = self.hit_test(row, point) {
                let target = hit.element();
                if self.get(target)?.is_interactive() {
                    return Ok(TreeClick::Control(target));
                }
                break;
            }
        }
        let click = match &mut self.get_mut(id)?.kind {
            ElementKind::TreeView(tv) => tv.click(point)?,
            other => {
                return Err(LayoutError::NotAContainer {
                    element: id,
                    kind: other.name(),
                });
            }
        };
        // Selection does not change layout; expansion does
        if matches!(click, TreeClick::Toggled { .. }) {
            self.invalidate(id);
        }
        Ok(click)
    }

    // =========================================================================
    // Measure / Arrange / HitTest
    // =========================================================================

    /// Measure an element. Returns the desired size including margin and
    /// stores the final size (excluding margin) on the element.
    pub fn measure(&mut self, id: ElementId, available: Size, dont_stretch: bool) -> Result<Size> {
        let available = sanitize_available(available);
        let key = MeasureKey::new(available, dont_stretch);

        let element = self.elements.get_mut(id).ok_or(LayoutError::UnknownElement(id))?;
        if !element.kind.always_measure() {
            if let Some(cached) = element.cache.get(key) {
                element.element_size = cached.element_size;
                self.ctx.record_hit();
                return Ok(cached.desired);
            }
        }

        let inner = element.content_available(available);
        let h_stretch = element.horizontal_alignment.is_stretch();
        let v_stretch = element.vertical_alignment.is_stretch();
        let mut kind = std::mem::take(&mut element.kind);

        self.ctx.enter_measure();
        let result = kind.measure_content(self, id, inner, dont_stretch);
        let name = kind.name();
        let fills = kind.fills_slot();
        let container = kind.is_container();

        let Some(element) = self.elements.get_mut(id) else {
            self.ctx.exit();
            return Err(LayoutError::UnknownElement(id));
        };
        element.kind = kind;
        let content = match result {
            Ok(size) => size.sanitized(),
            Err(e) => {
                self.ctx.exit();
                return Err(e);
            }
        };

        let mut size = content;
        if fills {
            size = element.clamp_to_desired(size);
            if !dont_stretch {
                if h_stretch && inner.width.is_finite() {
                    size.width = inner.width;
                }
                if v_stretch && inner.height.is_finite() {
                    size.height = inner.height;
                }
            }
        }
        let desired = size.inflate(&element.margin);
        element.element_size = size;
        element.cache.store(key, CachedMeasure { desired, element_size: size });

        if container {
            self.ctx.warn_oversized(id, name, content.width, inner.width, "width");
            self.ctx.warn_oversized(id, name, content.height, inner.height, "height");
        }
        self.ctx.log_measure(name, id, available, desired);
        self.ctx.exit();
        Ok(desired)
    }

    /// Arrange an element inside `bounds` (its slot, margin included).
    /// Returns the resolved top-left position.
    pub fn arrange(&mut self, id: ElementId, bounds: Rect) -> Result<Point> {
        let element = self.get_mut(id)?;
        let margin = element.margin;
        let mut size = element.element_size;

        if element.kind.fills_slot() {
            let slot = element.clamp_to_desired(bounds.size().deflate(&margin));
            if element.horizontal_alignment.is_stretch() && bounds.width.is_finite() {
                size.width = slot.width;
            }
            if element.vertical_alignment.is_stretch() && bounds.height.is_finite() {
                size.height = slot.height;
            }
        }

        let x = element
            .horizontal_alignment
            .resolve(bounds.x, bounds.width, size.width, margin.left, margin.right);
        let y = element
            .vertical_alignment
            .resolve(bounds.y, bounds.height, size.height, margin.top, margin.bottom);
        let position = Point::new(x, y);
        element.position = position;
        element.element_size = size;
        let mut kind = std::mem::take(&mut element.kind);

        self.ctx.enter_arrange();
        let result = kind.arrange_content(self, Rect::from_origin_size(position, size));
        let name = kind.name();
        if let Some(element) = self.elements.get_mut(id) {
            element.kind = kind;
        }
        self.ctx.log_arrange(name, id, bounds, position);
        self.ctx.exit();
        result?;
        Ok(position)
    }

    /// The deepest element under `point`, starting at `id`.
    pub fn hit_test(&self, id: ElementId, point: Point) -> Option<HitResult> {
        let element = self.elements.get(id)?;
        if !element.bounds().contains(point) {
            return None;
        }
        element
            .kind
            .hit_test(self, id, point)
            .or(Some(HitResult::Element(id)))
    }

    /// One measure and one arrange of `root` against a viewport.
    pub fn layout(&mut self, root: ElementId, viewport: Rect) -> Result<Point> {
        self.measure(root, viewport.size(), false)?;
        self.arrange(root, viewport)
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Counters for the most recent pass.
    pub fn last_pass_stats(&self) -> PassStats {
        self.ctx.stats()
    }

    /// Overflow warnings collected during the most recent pass.
    pub fn layout_warnings(&self) -> &[LayoutWarning] {
        self.ctx.warnings()
    }
}

/// Negative or NaN available extents clamp to zero; infinity stays.
fn sanitize_available(size: Size) -> Size {
    let axis = |v: f32| if v.is_nan() { 0.0 } else { v.max(0.0) };
    Size::new(axis(size.width), axis(size.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::length::Alignment;
    use crate::layout::stack::Stack;
    use crate::primitives::Margin;

    fn leaf(tree: &mut ElementTree, w: f32, h: f32) -> ElementId {
        tree.insert(Element::leaf(Size::new(w, h)))
    }

    #[test]
    fn test_measure_adds_margin_back() {
        let mut tree = ElementTree::new();
        let id = tree.insert(Element::leaf(Size::new(20.0, 10.0)).margin(Margin::all(5.0)));
        let desired = tree.measure(id, Size::new(100.0, 100.0), false).unwrap();
        assert_eq!(desired, Size::new(30.0, 20.0));
        assert_eq!(tree.get(id).unwrap().element_size(), Size::new(20.0, 10.0));
    }

    #[test]
    fn test_stretch_fills_finite_available() {
        let mut tree = ElementTree::new();
        let id = tree.insert(
            Element::leaf(Size::new(20.0, 10.0))
                .margin(Margin::all(5.0))
                .align(Alignment::Stretch, Alignment::Start),
        );
        let desired = tree.measure(id, Size::new(100.0, 100.0), false).unwrap();
        assert_eq!(desired, Size::new(100.0, 20.0));

        // Natural size when asked not to stretch
        let natural = tree.measure(id, Size::new(100.0, 100.0), true).unwrap();
        assert_eq!(natural, Size::new(30.0, 20.0));

        // Unconstrained axis cannot stretch
        let unbounded = tree.measure(id, Size::INFINITE, false).unwrap();
        assert_eq!(unbounded, Size::new(30.0, 20.0));
    }

    #[test]
    fn test_desired_size_clamps_natural_size() {
        let mut tree = ElementTree::new();
        let id = tree.insert(Element::leaf(Size::new(200.0, 10.0)).desired_width(50.0));
        let desired = tree.measure(id, Size::INFINITE, false).unwrap();
        assert_eq!(desired, Size::new(50.0, 10.0));
    }

    #[test]
    fn test_negative_and_nan_available_clamp_to_zero() {
        let mut tree = ElementTree::new();
        let id = tree.insert(Element::leaf(Size::new(5.0, 5.0)).align(Alignment::Stretch, Alignment::Stretch));
        let desired = tree.measure(id, Size::new(-10.0, f32::NAN), false).unwrap();
        assert_eq!(desired, Size::ZERO);
    }

    #[test]
    fn test_arrange_resolves_alignment() {
        let mut tree = ElementTree::new();
        let id = tree.insert(
            Element::leaf(Size::new(20.0, 10.0))
                .margin(Margin::new(1.0, 2.0, 3.0, 4.0))
                .align(Alignment::End, Alignment::Center),
        );
        tree.measure(id, Size::new(100.0, 50.0), false).unwrap();
        let pos = tree.arrange(id, Rect::new(10.0, 10.0, 100.0, 50.0)).unwrap();
        // x: 10 + 100 - 3 - 20; y: 10 + 2 + (50 - 6 - 10) / 2
        assert_eq!(pos, Point::new(87.0, 29.0));
        assert_eq!(tree.get(id).unwrap().position(), pos);
    }

    #[test]
    fn test_arrange_stretch_fills_slot() {
        let mut tree = ElementTree::new();
        let id = tree.insert(
            Element::leaf(Size::new(20.0, 10.0))
                .margin(Margin::all(2.0))
                .align(Alignment::Stretch, Alignment::Start),
        );
        tree.measure(id, Size::INFINITE, false).unwrap();
        tree.arrange(id, Rect::new(0.0, 0.0, 80.0, 40.0)).unwrap();
        let el = tree.get(id).unwrap();
        assert_eq!(el.element_size(), Size::new(76.0, 10.0));
        assert_eq!(el.position(), Point::new(2.0, 2.0));
    }

    #[test]
    fn test_cache_hit_skips_subtree() {
        let mut tree = ElementTree::new();
        let stack = tree.insert(Element::new(Stack::vertical()));
        for _ in 0..3 {
            let child = leaf(&mut tree, 10.0, 10.0);
            tree.add_child(stack, child).unwrap();
        }
        tree.measure(stack, Size::new(100.0, 100.0), false).unwrap();
        assert_eq!(tree.last_pass_stats().measure_calls, 4);

        tree.measure(stack, Size::new(100.0, 100.0), false).unwrap();
        let stats = tree.last_pass_stats();
        assert_eq!(stats.measure_calls, 0);
        assert_eq!(stats.cache_hits, 1);
    }

    #[test]
    fn test_invalidate_walks_ancestors() {
        let mut tree = ElementTree::new();
        let outer = tree.insert(Element::new(Stack::vertical()));
        let inner = tree.insert(Element::new(Stack::vertical()));
        let child = leaf(&mut tree, 10.0, 10.0);
        tree.add_child(outer, inner).unwrap();
        tree.add_child(inner, child).unwrap();
        tree.measure(outer, Size::new(50.0, 50.0), false).unwrap();
        assert!(!tree.get(outer).unwrap().is_dirty());

        tree.update(child, |el| el.set_margin(Margin::all(1.0))).unwrap();
        assert!(tree.get(child).unwrap().is_dirty());
        assert!(tree.get(inner).unwrap().is_dirty());
        assert!(tree.get(outer).unwrap().is_dirty());

        let desired = tree.measure(outer, Size::new(50.0, 50.0), false).unwrap();
        assert_eq!(desired, Size::new(12.0, 12.0));
    }

    #[test]
    fn test_add_child_rejects_leaf_parent() {
        let mut tree = ElementTree::new();
        let a = leaf(&mut tree, 1.0, 1.0);
        let b = leaf(&mut tree, 1.0, 1.0);
        let err = tree.add_child(a, b).unwrap_err();
        assert!(matches!(err, LayoutError::NotAContainer { kind: "Leaf", .. }));
    }

    #[test]
    fn test_add_child_rejects_cycle() {
        let mut tree = ElementTree::new();
        let outer = tree.insert(Element::new(Stack::vertical()));
        let inner = tree.insert(Element::new(Stack::vertical()));
        tree.add_child(outer, inner).unwrap();
        let err = tree.add_child(inner, outer).unwrap_err();
        assert!(matches!(err, LayoutError::CycleDetected { .. }));
        let err = tree.add_child(outer, outer).unwrap_err();
        assert!(matches!(err, LayoutError::CycleDetected { .. }));
    }

    #[test]
    fn test_reparent_detaches_from_previous_parent() {
        let mut tree = ElementTree::new();
        let a = tree.insert(Element::new(Stack::vertical()));
        let b = tree.insert(Element::new(Stack::vertical()));
        let child = leaf(&mut tree, 1.0, 1.0);
        tree.add_child(a, child).unwrap();
        tree.add_child(b, child).unwrap();
        assert!(tree.children(a).unwrap().is_empty());
        assert_eq!(tree.children(b).unwrap(), vec![child]);
        assert_eq!(tree.parent(child), Some(b));
    }

    #[test]
    fn test_remove_drops_subtree() {
        let mut tree = ElementTree::new();
        let root = tree.insert(Element::new(Stack::vertical()));
        let inner = tree.insert(Element::new(Stack::vertical()));
        let child = leaf(&mut tree, 1.0, 1.0);
        tree.add_child(root, inner).unwrap();
        tree.add_child(inner, child).unwrap();

        tree.remove(inner).unwrap();
        assert!(!tree.contains(inner));
        assert!(!tree.contains(child));
        assert!(tree.children(root).unwrap().is_empty());
        assert!(matches!(tree.remove(inner), Err(LayoutError::UnknownElement(_))));
    }

    #[test]
    fn test_hit_test_returns_deepest_first_match() {
        let mut tree = ElementTree::new();
        let root = tree.insert(Element::new(Stack::vertical()));
        let a = leaf(&mut tree, 100.0, 20.0);
        let b = leaf(&mut tree, 100.0, 20.0);
        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();
        tree.layout(root, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();

        assert_eq!(tree.hit_test(root, Point::new(5.0, 5.0)), Some(HitResult::Element(a)));
        assert_eq!(tree.hit_test(root, Point::new(5.0, 25.0)), Some(HitResult::Element(b)));
        assert_eq!(tree.hit_test(root, Point::new(5.0, 45.0)), None);
    }

    #[test]
    fn test_unknown_element_errors() {
        let mut tree = ElementTree::new();
        let id = leaf(&mut tree, 1.0, 1.0);
        tree.remove(id).unwrap();
        assert!(matches!(
            tree.measure(id, Size::INFINITE, false),
            Err(LayoutError::UnknownElement(_))
        ));
        assert!(tree.hit_test(id, Point::ORIGIN).is_none());
    }
}
