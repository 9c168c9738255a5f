//! ItemsList - virtualized flat list.
//!
//! Only the items intersecting the viewport have realized child elements;
//! memory and arrange cost are bounded by the viewport, not the collection.
//!
//! # Measure pass
//!
//! ```text
//! poll source revision -> reset caches if it moved
//! measure every item (temporaries for unrealized ones) -> sizes, max cross
//! rebuild positions (estimate for unmeasured) -> clamp scroll offset
//! resolve visible range -> realize entering indices, drop leaving ones
//! ```
//!
//! Measuring every item keeps the cross extent stable while scrolling.
//! With `measure_all_items(false)` only realized items are measured and the
//! cross extent follows whatever is on screen.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::collection::{CollectionChange, Item, ItemsSource};
use crate::config::{DEFAULT_ESTIMATED_ITEM_SIZE, DEFAULT_SCROLLBAR_THICKNESS, LayoutConfig};
use crate::error::{LayoutError, Result};
use crate::primitives::{Point, Rect, Size};
use crate::scroll_state::{ScrollbarState, clamp_offset};

use super::element::ElementId;
use super::kind::claiming_hit;
use super::length::Orientation;
use super::tree::{ElementTree, HitResult};

/// Bound on refinement passes when only realized items are measured.
const MAX_WINDOW_PASSES: usize = 8;

/// Builds the element for an item. Returning `None` for a realized index is
/// a programming error.
pub type ItemTemplate = Box<dyn Fn(&mut ElementTree, &Item, usize) -> Option<ElementId>>;

/// Inclusive range of visible indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRange {
    pub first: usize,
    pub last: usize,
}

impl VisibleRange {
    pub fn contains(&self, index: usize) -> bool {
        index >= self.first && index <= self.last
    }

    /// Number of indices in the range.
    pub fn count(&self) -> usize {
        self.last - self.first + 1
    }
}

// =========================================================================
// ItemsList
// =========================================================================

/// A virtualized list over an item source.
pub struct ItemsList {
    source: ItemsSource,
    template: Option<ItemTemplate>,
    orientation: Orientation,
    spacing: f32,
    scroll_offset: f32,

    estimated_item_size: Option<f32>,
    scrollbar_thickness: Option<f32>,
    measure_all: Option<bool>,

    realized: BTreeMap<usize, ElementId>,
    item_sizes: Vec<Option<f32>>,
    item_positions: Vec<f32>,
    estimate: f32,
    range: Option<VisibleRange>,

    seen_revision: u64,
    needs_reset: bool,
    measured_once: bool,
    content_extent: f32,
    viewport_extent: f32,
    max_cross: f32,
    bounds: Rect,
}

impl Default for ItemsList {
    fn default() -> Self {
        Self {
            source: ItemsSource::default(),
            template: None,
            orientation: Orientation::Vertical,
            spacing: 0.0,
            scroll_offset: 0.0,
            estimated_item_size: None,
            scrollbar_thickness: None,
            measure_all: None,
            realized: BTreeMap::new(),
            item_sizes: Vec::new(),
            item_positions: Vec::new(),
            estimate: DEFAULT_ESTIMATED_ITEM_SIZE,
            range: None,
            seen_revision: 0,
            needs_reset: false,
            measured_once: false,
            content_extent: 0.0,
            viewport_extent: 0.0,
            max_cross: 0.0,
            bounds: Rect::ZERO,
        }
    }
}

impl ItemsList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the item source.
    pub fn items(mut self, source: impl Into<ItemsSource>) -> Self {
        self.source = source.into();
        self.seen_revision = self.source.revision();
        self
    }

    /// Set the factory that builds an element per realized item.
    pub fn template(
        mut self,
        template: impl Fn(&mut ElementTree, &Item, usize) -> Option<ElementId> + 'static,
    ) -> Self {
        self.template = Some(Box::new(template));
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Gap between consecutive items.
    pub fn spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing.max(0.0);
        self
    }

    /// Extent assumed for unmeasured items until one has been measured.
    pub fn estimated_item_size(mut self, size: f32) -> Self {
        self.estimated_item_size = Some(size.max(0.0));
        self
    }

    pub fn scrollbar_thickness(mut self, thickness: f32) -> Self {
        self.scrollbar_thickness = Some(thickness.max(0.0));
        self
    }

    /// Measure every item each pass (stable cross extent) or only realized ones.
    pub fn measure_all_items(mut self, all: bool) -> Self {
        self.measure_all = Some(all);
        self
    }

    pub(crate) fn configure(&mut self, config: &LayoutConfig) {
        self.estimated_item_size.get_or_insert(config.estimated_item_size.max(0.0));
        self.scrollbar_thickness.get_or_insert(config.scrollbar_thickness.max(0.0));
        self.measure_all.get_or_insert(config.measure_all_items);
    }

    // =========================================================================
    // Source
    // =========================================================================

    pub fn source(&self) -> &ItemsSource {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Replace the source. Caches are dropped at the next measure.
    pub fn set_items(&mut self, source: impl Into<ItemsSource>) {
        self.source = source.into();
        self.needs_reset = true;
    }

    /// Report a change to the backing collection.
    pub fn notify_collection_changed(&mut self, change: CollectionChange) {
        tracing::debug!(?change, "items source changed");
        self.needs_reset = true;
    }

    /// Whether the next measure must rebuild the caches.
    pub(crate) fn source_changed(&self) -> bool {
        self.needs_reset || self.source.revision() != self.seen_revision
    }

    // =========================================================================
    // Scrolling
    // =========================================================================

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    /// Set the scroll offset, clamped to the content. Returns the new offset.
    ///
    /// Before the first measure the extents are unknown; the offset is kept
    /// and clamped when the list is measured.
    pub fn set_scroll_offset(&mut self, offset: f32) -> f32 {
        self.scroll_offset = if self.measured_once {
            clamp_offset(offset, self.content_extent, self.viewport_extent)
        } else if offset.is_nan() {
            0.0
        } else {
            offset.max(0.0)
        };
        self.scroll_offset
    }

    pub fn scroll_by(&mut self, delta: f32) -> f32 {
        self.set_scroll_offset(self.scroll_offset + delta)
    }

    /// Scroll the minimum distance that brings `index` fully into view.
    pub fn scroll_into_view(&mut self, index: usize) -> f32 {
        let (Some(&start), Some(size)) = (self.item_positions.get(index), self.item_size(index)) else {
            return self.scroll_offset;
        };
        let end = start + size;
        let target = if start < self.scroll_offset {
            start
        } else if end > self.scroll_offset + self.viewport_extent {
            end - self.viewport_extent
        } else {
            self.scroll_offset
        };
        self.set_scroll_offset(target)
    }

    /// Scrollbar state along the scroll axis.
    pub fn scrollbar(&self) -> ScrollbarState {
        ScrollbarState::new(self.scroll_offset, self.content_extent, self.viewport_extent)
    }

    pub fn get_scrollbar_thickness(&self) -> f32 {
        self.scrollbar_thickness.unwrap_or(DEFAULT_SCROLLBAR_THICKNESS)
    }

    /// Strip along the trailing cross edge, present only while scrollable.
    pub fn scrollbar_rect(&self) -> Option<Rect> {
        if !self.scrollbar().is_scrollable() {
            return None;
        }
        let t = self.get_scrollbar_thickness().min(self.orientation.cross(self.bounds.size()));
        let b = self.bounds;
        Some(match self.orientation {
            Orientation::Vertical => Rect::new(b.right() - t, b.y, t, b.height),
            Orientation::Horizontal => Rect::new(b.x, b.bottom() - t, b.width, t),
        })
    }

    // =========================================================================
    // Window queries
    // =========================================================================

    pub fn visible_range(&self) -> Option<VisibleRange> {
        self.range
    }

    pub fn first_visible_index(&self) -> Option<usize> {
        self.range.map(|r| r.first)
    }

    pub fn last_visible_index(&self) -> Option<usize> {
        self.range.map(|r| r.last)
    }

    pub fn realized_count(&self) -> usize {
        self.realized.len()
    }

    pub fn realized_element(&self, index: usize) -> Option<ElementId> {
        self.realized.get(&index).copied()
    }

    /// Realized (index, element) pairs in index order.
    pub fn realized(&self) -> impl Iterator<Item = (usize, ElementId)> + '_ {
        self.realized.iter().map(|(&index, &id)| (index, id))
    }

    /// Extent of an item along the scroll axis (measured or estimated).
    pub fn item_size(&self, index: usize) -> Option<f32> {
        if index >= self.item_positions.len() {
            return None;
        }
        Some(self.size_of(index))
    }

    /// Leading offset of an item along the scroll axis.
    pub fn item_position(&self, index: usize) -> Option<f32> {
        self.item_positions.get(index).copied()
    }

    /// Whether the item's extent came from a measure rather than the estimate.
    pub fn is_measured(&self, index: usize) -> bool {
        matches!(self.item_sizes.get(index), Some(Some(_)))
    }

    /// Average measured extent, else the configured estimate.
    pub fn get_estimated_item_size(&self) -> f32 {
        let (sum, n) = self
            .item_sizes
            .iter()
            .flatten()
            .fold((0.0f32, 0usize), |(sum, n), s| (sum + s, n + 1));
        if n > 0 {
            sum / n as f32
        } else {
            self.estimated_item_size.unwrap_or(DEFAULT_ESTIMATED_ITEM_SIZE)
        }
    }

    pub fn content_extent(&self) -> f32 {
        self.content_extent
    }

    pub fn viewport_extent(&self) -> f32 {
        self.viewport_extent
    }

    /// Largest cross-axis extent seen in the last measure.
    pub fn max_cross_extent(&self) -> f32 {
        self.max_cross
    }

    pub(crate) fn detach(&mut self, child: ElementId) -> bool {
        let index = self.realized.iter().find(|(_, id)| **id == child).map(|(&i, _)| i);
        match index {
            Some(i) => {
                self.realized.remove(&i);
                true
            }
            None => false,
        }
    }

    fn size_of(&self, index: usize) -> f32 {
        self.item_sizes.get(index).copied().flatten().unwrap_or(self.estimate)
    }

    // =========================================================================
    // Measure
    // =========================================================================

    pub(crate) fn measure(&mut self, tree: &mut ElementTree, id: ElementId, available: Size) -> Result<Size> {
        if self.source_changed() {
            self.reset_caches(tree);
        }
        let count = self.source.len();
        if count > 0 && self.template.is_none() {
            return Err(LayoutError::NoTemplate);
        }
        self.item_sizes.resize(count, None);

        let mut temporaries = HashMap::new();
        let result = self.measure_window(tree, id, available, &mut temporaries);
        for (_, temp) in temporaries {
            tree.remove_subtree(temp);
        }
        self.measured_once = true;
        result
    }

    fn measure_window(
        &mut self,
        tree: &mut ElementTree,
        id: ElementId,
        available: Size,
        temporaries: &mut HashMap<usize, ElementId>,
    ) -> Result<Size> {
        let o = self.orientation;
        let count = self.source.len();
        let avail_main = o.main(available);
        let avail_cross = o.cross(available);
        let item_available = o.size(f32::INFINITY, avail_cross);
        let measure_all = self.measure_all.unwrap_or(true);

        let mut max_cross = 0.0f32;
        if measure_all {
            for index in 0..count {
                let child = match self.realized.get(&index) {
                    Some(&child) => child,
                    None => {
                        let child = self.create(tree, id, index)?;
                        temporaries.insert(index, child);
                        child
                    }
                };
                let desired = tree.measure(child, item_available, false)?;
                self.item_sizes[index] = Some(o.main(desired));
                max_cross = max_cross.max(o.cross(desired));
            }
        }

        let mut viewport = self.sync_positions(avail_main);
        let (mut entered, mut derealized) = self.sync_window(tree, id, count, viewport, temporaries)?;

        if !measure_all {
            // Estimated positions picked the window; refine until the
            // measured sizes agree with it.
            for pass in 0..MAX_WINDOW_PASSES {
                let realized: Vec<(usize, ElementId)> = self.realized().collect();
                for (index, child) in realized {
                    let desired = tree.measure(child, item_available, false)?;
                    self.item_sizes[index] = Some(o.main(desired));
                    max_cross = max_cross.max(o.cross(desired));
                }
                let previous = self.range;
                viewport = self.sync_positions(avail_main);
                if self.compute_range(count, viewport) == previous || pass + 1 == MAX_WINDOW_PASSES {
                    break;
                }
                let (e, d) = self.sync_window(tree, id, count, viewport, temporaries)?;
                entered += e;
                derealized += d;
            }
        }

        if entered > 0 || derealized > 0 {
            tracing::debug!(
                ?id,
                first = self.range.map(|r| r.first),
                last = self.range.map(|r| r.last),
                realized = entered,
                derealized,
                "virtualization window moved"
            );
        }

        self.max_cross = max_cross;
        let main = self.content_extent.min(avail_main);
        let cross = max_cross.min(avail_cross);
        Ok(o.size(main, cross))
    }

    /// Rebuild positions, then clamp the offset against the new extent.
    /// Returns the viewport extent used for the window.
    fn sync_positions(&mut self, avail_main: f32) -> f32 {
        self.rebuild_positions();
        let viewport = if avail_main.is_finite() { avail_main } else { self.content_extent };
        self.viewport_extent = viewport;
        self.scroll_offset = clamp_offset(self.scroll_offset, self.content_extent, viewport);
        viewport
    }

    /// Recompute the visible range, dropping indices that left it and
    /// realizing those that entered. Returns (entered, derealized).
    fn sync_window(
        &mut self,
        tree: &mut ElementTree,
        id: ElementId,
        count: usize,
        viewport: f32,
        temporaries: &mut HashMap<usize, ElementId>,
    ) -> Result<(usize, usize)> {
        self.range = self.compute_range(count, viewport);

        let leaving: Vec<(usize, ElementId)> = self
            .realized
            .iter()
            .filter(|(index, _)| !self.range.is_some_and(|r| r.contains(**index)))
            .map(|(&index, &child)| (index, child))
            .collect();
        for (index, child) in &leaving {
            self.realized.remove(index);
            tree.remove_subtree(*child);
        }

        let mut entered = 0usize;
        if let Some(range) = self.range {
            for index in range.first..=range.last {
                if self.realized.contains_key(&index) {
                    continue;
                }
                let child = match temporaries.remove(&index) {
                    Some(child) => child,
                    None => self.create(tree, id, index)?,
                };
                self.realized.insert(index, child);
                entered += 1;
            }
        }
        Ok((entered, leaving.len()))
    }

    /// Build and adopt the element for `index`.
    fn create(&self, tree: &mut ElementTree, id: ElementId, index: usize) -> Result<ElementId> {
        let template = self.template.as_ref().ok_or(LayoutError::NoTemplate)?;
        let item = self.source.get(index).ok_or(LayoutError::MissingTemplate { index })?;
        let child = template(tree, &item, index).ok_or(LayoutError::MissingTemplate { index })?;
        tree.set_parent(child, id)?;
        Ok(child)
    }

    fn reset_caches(&mut self, tree: &mut ElementTree) {
        let dropped = self.realized.len();
        for (_, child) in std::mem::take(&mut self.realized) {
            tree.remove_subtree(child);
        }
        self.item_sizes.clear();
        self.item_positions.clear();
        self.range = None;
        self.seen_revision = self.source.revision();
        self.needs_reset = false;
        tracing::debug!(
            dropped,
            len = self.source.len(),
            change = ?self.source.last_change(),
            "items list caches reset"
        );
    }

    fn rebuild_positions(&mut self) {
        self.estimate = self.get_estimated_item_size();
        let count = self.item_sizes.len();
        self.item_positions.clear();
        let mut cursor = 0.0f32;
        for index in 0..count {
            self.item_positions.push(cursor);
            cursor += self.size_of(index) + self.spacing;
        }
        self.content_extent = if count > 0 { cursor - self.spacing } else { 0.0 };
    }

    /// First index whose trailing edge reaches the offset through the last
    /// whose leading edge is before the viewport end. A non-positive
    /// viewport shows everything.
    fn compute_range(&self, count: usize, viewport: f32) -> Option<VisibleRange> {
        if count == 0 {
            return None;
        }
        if viewport <= 0.0 {
            return Some(VisibleRange { first: 0, last: count - 1 });
        }
        let start = self.scroll_offset;
        let end = start + viewport;
        let first = (0..count)
            .find(|&i| self.item_positions[i] + self.size_of(i) >= start)
            .unwrap_or(count - 1);
        let last = (first..count)
            .take_while(|&i| self.item_positions[i] < end)
            .last()
            .unwrap_or(first);
        Some(VisibleRange { first, last })
    }

    // =========================================================================
    // Arrange / HitTest
    // =========================================================================

    pub(crate) fn arrange(&mut self, tree: &mut ElementTree, content: Rect) -> Result<()> {
        let o = self.orientation;
        self.bounds = content;
        self.viewport_extent = o.main(content.size());
        self.scroll_offset = clamp_offset(self.scroll_offset, self.content_extent, self.viewport_extent);

        let origin = content.origin();
        let cross_extent = o.cross(content.size());
        for (&index, &child) in &self.realized {
            let main = o.main_pos(origin) + self.item_positions.get(index).copied().unwrap_or(0.0)
                - self.scroll_offset;
            let slot = Rect::from_origin_size(
                o.point(main, o.cross_pos(origin)),
                o.size(self.size_of(index), cross_extent),
            );
            tree.arrange(child, slot)?;
        }
        Ok(())
    }

    pub(crate) fn hit_test(&self, tree: &ElementTree, id: ElementId, point: Point) -> Option<HitResult> {
        if self.scrollbar_rect().is_some_and(|r| r.contains(point)) {
            return Some(HitResult::Scrollbar(id));
        }
        claiming_hit(tree, id, self.realized.values().copied(), point)
    }
}

impl fmt::Debug for ItemsList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemsList")
            .field("len", &self.source.len())
            .field("orientation", &self.orientation)
            .field("scroll_offset", &self.scroll_offset)
            .field("range", &self.range)
            .field("realized", &self.realized.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{ObservableCollection, item};
    use crate::layout::element::Element;

    /// Items carry their main-axis extent.
    fn sized_items(sizes: impl IntoIterator<Item = f32>) -> Vec<Item> {
        sizes.into_iter().map(item).collect()
    }

    fn leaf_template(tree: &mut ElementTree, item: &Item, _index: usize) -> Option<ElementId> {
        let h = *item.downcast_ref::<f32>()?;
        Some(tree.insert(Element::leaf(Size::new(100.0, h))))
    }

    fn list_of(tree: &mut ElementTree, list: ItemsList) -> ElementId {
        tree.insert(Element::new(list.template(leaf_template)))
    }

    #[test]
    fn test_realizes_only_visible_window() {
        let mut tree = ElementTree::new();
        let id = list_of(&mut tree, ItemsList::new().items(sized_items([50.0; 100])));
        tree.layout(id, Rect::new(0.0, 0.0, 100.0, 200.0)).unwrap();

        let list = tree.items_list(id).unwrap();
        assert_eq!(list.realized_count(), 4);
        assert_eq!(list.visible_range(), Some(VisibleRange { first: 0, last: 3 }));
        assert_eq!(list.content_extent(), 5000.0);
        // 1 list + 4 realized
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_scroll_moves_window_and_drops_old_items() {
        let mut tree = ElementTree::new();
        let id = list_of(&mut tree, ItemsList::new().items(sized_items([50.0; 100])));
        tree.layout(id, Rect::new(0.0, 0.0, 100.0, 200.0)).unwrap();
        let first = tree.items_list(id).unwrap().realized_element(0).unwrap();

        tree.set_scroll_offset(id, 1000.0).unwrap();
        tree.layout(id, Rect::new(0.0, 0.0, 100.0, 200.0)).unwrap();

        let list = tree.items_list(id).unwrap();
        assert_eq!(list.first_visible_index(), Some(19));
        assert_eq!(list.last_visible_index(), Some(23));
        assert!(!tree.contains(first));
        let el = tree.get(list.realized_element(20).unwrap()).unwrap();
        assert_eq!(el.position().y, 0.0);
    }

    #[test]
    fn test_scroll_offset_clamped_to_content() {
        let mut tree = ElementTree::new();
        let id = list_of(&mut tree, ItemsList::new().items(sized_items([50.0; 10])));
        tree.layout(id, Rect::new(0.0, 0.0, 100.0, 200.0)).unwrap();
        assert_eq!(tree.set_scroll_offset(id, 1e6).unwrap(), 300.0);
        assert_eq!(tree.set_scroll_offset(id, -5.0).unwrap(), 0.0);
    }

    #[test]
    fn test_unbounded_viewport_realizes_everything() {
        let mut tree = ElementTree::new();
        let id = list_of(&mut tree, ItemsList::new().items(sized_items([10.0; 7])));
        let size = tree.measure(id, Size::new(100.0, f32::INFINITY), false).unwrap();
        assert_eq!(size.height, 70.0);
        assert_eq!(tree.items_list(id).unwrap().realized_count(), 7);
    }

    #[test]
    fn test_zero_viewport_treats_all_as_visible() {
        let mut tree = ElementTree::new();
        let id = list_of(&mut tree, ItemsList::new().items(sized_items([10.0; 3])));
        tree.measure(id, Size::new(100.0, 0.0), false).unwrap();
        assert_eq!(
            tree.items_list(id).unwrap().visible_range(),
            Some(VisibleRange { first: 0, last: 2 })
        );
    }

    #[test]
    fn test_template_returning_none_is_fatal() {
        let mut tree = ElementTree::new();
        let id = tree.insert(Element::new(
            ItemsList::new().items(sized_items([10.0; 3])).template(|_, _, _| None),
        ));
        let err = tree.measure(id, Size::new(100.0, 100.0), false).unwrap_err();
        assert!(matches!(err, LayoutError::MissingTemplate { index: 0 }));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_items_without_template_error() {
        let mut tree = ElementTree::new();
        let id = tree.insert(Element::new(ItemsList::new().items(sized_items([10.0]))));
        assert!(matches!(
            tree.measure(id, Size::new(100.0, 100.0), false),
            Err(LayoutError::NoTemplate)
        ));
    }

    #[test]
    fn test_empty_list_is_zero_sized() {
        let mut tree = ElementTree::new();
        let id = tree.insert(Element::new(ItemsList::new()));
        assert_eq!(tree.measure(id, Size::new(100.0, 100.0), false).unwrap(), Size::ZERO);
        assert_eq!(tree.items_list(id).unwrap().visible_range(), None);
    }

    #[test]
    fn test_observable_change_resets_window() {
        let items = ObservableCollection::from_items(sized_items([50.0; 3]));
        let mut tree = ElementTree::new();
        let id = list_of(&mut tree, ItemsList::new().items(items.clone()));
        tree.layout(id, Rect::new(0.0, 0.0, 100.0, 200.0)).unwrap();
        let before = tree.items_list(id).unwrap().realized_element(0).unwrap();
        assert_eq!(tree.items_list(id).unwrap().content_extent(), 150.0);

        items.insert(0, item(20.0f32));
        assert!(tree.items_list(id).unwrap().source_changed());
        tree.layout(id, Rect::new(0.0, 0.0, 100.0, 200.0)).unwrap();

        let list = tree.items_list(id).unwrap();
        assert_eq!(list.content_extent(), 170.0);
        assert_eq!(list.realized_count(), 4);
        assert!(!tree.contains(before));
    }

    #[test]
    fn test_explicit_notification_resets_static_source() {
        let mut tree = ElementTree::new();
        let id = list_of(&mut tree, ItemsList::new().items(sized_items([50.0; 3])));
        tree.layout(id, Rect::new(0.0, 0.0, 100.0, 200.0)).unwrap();
        let before = tree.items_list(id).unwrap().realized_element(1).unwrap();

        tree.notify_collection_changed(id, CollectionChange::Reset).unwrap();
        tree.layout(id, Rect::new(0.0, 0.0, 100.0, 200.0)).unwrap();
        assert!(!tree.contains(before));
        assert_eq!(tree.items_list(id).unwrap().realized_count(), 3);
    }

    #[test]
    fn test_cross_extent_covers_offscreen_items() {
        let template = |tree: &mut ElementTree, item: &Item, _: usize| {
            let w = *item.downcast_ref::<f32>()?;
            Some(tree.insert(Element::leaf(Size::new(w, 50.0))))
        };
        let widths: Vec<Item> = (0..50).map(|i| item(if i == 40 { 300.0f32 } else { 80.0 })).collect();

        let mut tree = ElementTree::new();
        let all = tree.insert(Element::new(ItemsList::new().items(widths.clone()).template(template)));
        let size = tree.measure(all, Size::new(500.0, 200.0), false).unwrap();
        assert_eq!(size.width, 300.0);

        let visible_only = tree.insert(Element::new(
            ItemsList::new().items(widths).template(template).measure_all_items(false),
        ));
        let size = tree.measure(visible_only, Size::new(500.0, 200.0), false).unwrap();
        assert_eq!(size.width, 80.0);
    }

    #[test]
    fn test_estimate_is_average_of_measured() {
        let mut tree = ElementTree::new();
        let id = list_of(
            &mut tree,
            ItemsList::new()
                .items(sized_items([10.0, 30.0, 10.0, 30.0, 99.0]))
                .measure_all_items(false)
                .estimated_item_size(5.0),
        );
        assert_eq!(tree.items_list(id).unwrap().get_estimated_item_size(), 5.0);
        // Estimated rows sit at 0, 5, 10, 15, 20 so three get measured; the
        // measured rows sit at 0, 10, 40 and the window narrows to two
        tree.measure(id, Size::new(100.0, 12.0), false).unwrap();

        let list = tree.items_list(id).unwrap();
        assert!(list.is_measured(2));
        assert!(!list.is_measured(4));
        assert_eq!(list.visible_range(), Some(VisibleRange { first: 0, last: 1 }));
        assert_eq!(list.realized_count(), 2);
        let measured: Vec<f32> = (0..5).filter(|&i| list.is_measured(i)).map(|i| list.item_size(i).unwrap()).collect();
        let avg = measured.iter().sum::<f32>() / measured.len() as f32;
        assert_eq!(list.get_estimated_item_size(), avg);
        assert_eq!(list.item_size(4), Some(avg));
    }

    #[test]
    fn test_realized_only_window_refines_past_estimate() {
        let mut tree = ElementTree::new();
        let id = list_of(
            &mut tree,
            ItemsList::new().items(sized_items([10.0; 50])).measure_all_items(false),
        );
        for _ in 0..3 {
            tree.layout(id, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
            let list = tree.items_list(id).unwrap();
            assert_eq!(list.visible_range(), Some(VisibleRange { first: 0, last: 9 }));
            assert_eq!(list.realized_count(), 10);
            let last = list.last_visible_index().unwrap();
            assert!(list.item_position(last + 1).unwrap() >= 100.0);
        }
    }

    #[test]
    fn test_horizontal_list_with_spacing() {
        let template = |tree: &mut ElementTree, _: &Item, _: usize| Some(tree.insert(Element::leaf(Size::new(40.0, 20.0))));
        let mut tree = ElementTree::new();
        let id = tree.insert(Element::new(
            ItemsList::new()
                .orientation(Orientation::Horizontal)
                .spacing(10.0)
                .items(sized_items([0.0; 10]))
                .template(template),
        ));
        tree.layout(id, Rect::new(0.0, 0.0, 120.0, 50.0)).unwrap();
        let list = tree.items_list(id).unwrap();
        assert_eq!(list.content_extent(), 490.0);
        assert_eq!(list.visible_range(), Some(VisibleRange { first: 0, last: 2 }));
        let third = tree.get(list.realized_element(2).unwrap()).unwrap();
        assert_eq!(third.position(), Point::new(100.0, 0.0));
    }

    #[test]
    fn test_scroll_into_view() {
        let mut tree = ElementTree::new();
        let id = list_of(&mut tree, ItemsList::new().items(sized_items([50.0; 20])));
        tree.layout(id, Rect::new(0.0, 0.0, 100.0, 200.0)).unwrap();

        let list = tree.items_list_mut(id).unwrap();
        // Item 10 spans [500, 550); bottom-align it
        assert_eq!(list.scroll_into_view(10), 350.0);
        // Already visible: no movement
        assert_eq!(list.scroll_into_view(9), 350.0);
        // Above the viewport: top-align
        assert_eq!(list.scroll_into_view(2), 100.0);
        // Unknown index is ignored
        assert_eq!(list.scroll_into_view(99), 100.0);
    }

    #[test]
    fn test_hit_test_scrollbar_then_children() {
        let template = |tree: &mut ElementTree, item: &Item, _: usize| {
            let interactive = *item.downcast_ref::<bool>()?;
            Some(tree.insert(Element::leaf(Size::new(100.0, 50.0)).interactive(interactive)))
        };
        let items: Vec<Item> = (0..10).map(|i| item(i % 2 == 1)).collect();
        let mut tree = ElementTree::new();
        let id = tree.insert(Element::new(ItemsList::new().items(items).template(template)));
        tree.layout(id, Rect::new(0.0, 0.0, 100.0, 200.0)).unwrap();

        let list = tree.items_list(id).unwrap();
        let scrollbar = list.scrollbar_rect().unwrap();
        assert_eq!(scrollbar, Rect::new(88.0, 0.0, 12.0, 200.0));

        assert_eq!(tree.hit_test(id, Point::new(95.0, 10.0)), Some(HitResult::Scrollbar(id)));
        // Non-interactive row: the list claims the hit
        assert_eq!(tree.hit_test(id, Point::new(10.0, 10.0)), Some(HitResult::Element(id)));
        // Interactive row is returned verbatim
        let row = list.realized_element(1).unwrap();
        assert_eq!(tree.hit_test(id, Point::new(10.0, 60.0)), Some(HitResult::Element(row)));
    }

    #[test]
    fn test_not_scrollable_has_no_scrollbar() {
        let mut tree = ElementTree::new();
        let id = list_of(&mut tree, ItemsList::new().items(sized_items([10.0; 2])));
        tree.layout(id, Rect::new(0.0, 0.0, 100.0, 200.0)).unwrap();
        let list = tree.items_list(id).unwrap();
        assert!(!list.scrollbar().is_scrollable());
        assert!(list.scrollbar_rect().is_none());
    }

    #[test]
    fn test_removing_list_drops_realized_children() {
        let mut tree = ElementTree::new();
        let id = list_of(&mut tree, ItemsList::new().items(sized_items([50.0; 100])));
        tree.layout(id, Rect::new(0.0, 0.0, 100.0, 200.0)).unwrap();
        tree.remove(id).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_config_supplies_defaults() {
        let config = LayoutConfig {
            estimated_item_size: 7.0,
            scrollbar_thickness: 3.0,
            ..LayoutConfig::default()
        };
        let mut tree = ElementTree::with_config(config);
        let id = tree.insert(Element::new(ItemsList::new().scrollbar_thickness(9.0)));
        let list = tree.items_list(id).unwrap();
        assert_eq!(list.get_estimated_item_size(), 7.0);
        assert_eq!(list.get_scrollbar_thickness(), 9.0);
    }
}
