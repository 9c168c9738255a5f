//! TreeView - virtualized hierarchical list.
//!
//! Nodes live in their own arena and are created lazily: a node's children
//! are produced the first time it is expanded, by the children selector
//! registered for the item's concrete type. Each node caches the height of
//! its visible subtree:
//!
//! ```text
//! expanded_height = row_height + (is_expanded ? sum(child.expanded_height) : 0)
//! ```
//!
//! Every expand or collapse walks the change up to the roots before it
//! returns, so `total_height` is always current. Measure culls the tree
//! against the viewport and realizes one element per visible row.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;

use slotmap::SlotMap;

use crate::collection::{Item, ItemKey};
use crate::config::{
    DEFAULT_SCROLLBAR_THICKNESS, DEFAULT_TREE_EXPANDER_SIZE, DEFAULT_TREE_INDENTATION,
    DEFAULT_TREE_ROW_HEIGHT, LayoutConfig,
};
use crate::error::{LayoutError, Result};
use crate::primitives::{Point, Rect, Size};
use crate::scroll_state::{ScrollbarState, clamp_offset};

use super::element::ElementId;
use super::kind::claiming_hit;
use super::tree::{ElementTree, HitResult};

slotmap::new_key_type! {
    /// Handle to a node inside one `TreeView`.
    pub struct NodeId;
}

/// Builds the row element for an item at a depth.
pub type RowTemplate = Box<dyn Fn(&mut ElementTree, &Item, usize) -> Option<ElementId>>;

type ChildrenSelector = Box<dyn Fn(&dyn Any) -> Vec<Item>>;

// =========================================================================
// Nodes
// =========================================================================

/// One item in the hierarchy.
pub struct TreeViewNode {
    item: Item,
    depth: usize,
    parent: Option<NodeId>,
    is_expanded: bool,
    /// `None` until the first expansion.
    children: Option<Vec<NodeId>>,
    has_children: bool,
    expanded_height: f32,
}

impl TreeViewNode {
    pub fn item(&self) -> &Item {
        &self.item
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_expanded(&self) -> bool {
        self.is_expanded
    }

    /// Loaded children; empty until the node has been expanded once.
    pub fn children(&self) -> &[NodeId] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn is_loaded(&self) -> bool {
        self.children.is_some()
    }

    /// Whether an expander is shown. Cleared when expansion finds no children.
    pub fn has_children(&self) -> bool {
        self.has_children
    }

    /// Height of this row plus every visible descendant row.
    pub fn expanded_height(&self) -> f32 {
        self.expanded_height
    }
}

impl fmt::Debug for TreeViewNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeViewNode")
            .field("depth", &self.depth)
            .field("is_expanded", &self.is_expanded)
            .field("children", &self.children.as_ref().map(Vec::len))
            .field("has_children", &self.has_children)
            .field("expanded_height", &self.expanded_height)
            .finish()
    }
}

/// A row that overlaps the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleNode {
    pub node: NodeId,
    pub depth: usize,
    /// Top of the row in content coordinates (before scrolling).
    pub y: f32,
}

/// Outcome of a click on a tree view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeClick {
    /// An interactive element inside a row took the click.
    Control(ElementId),
    /// The expander glyph was hit; `expanded` is the new state.
    Toggled { node: NodeId, expanded: bool },
    /// The row was selected.
    Selected(NodeId),
    None,
}

// =========================================================================
// TreeView
// =========================================================================

/// A virtualized tree over heterogeneous items.
pub struct TreeView {
    nodes: SlotMap<NodeId, TreeViewNode>,
    item_to_node: HashMap<ItemKey, NodeId>,
    root_nodes: Vec<NodeId>,
    selectors: HashMap<TypeId, ChildrenSelector>,
    template: Option<RowTemplate>,

    row_height: Option<f32>,
    indentation: Option<f32>,
    expander_size: Option<f32>,
    scrollbar_thickness: Option<f32>,

    scroll_offset: f32,
    viewport_extent: f32,
    measured_once: bool,
    selected: Option<NodeId>,

    visible: Vec<VisibleNode>,
    realized: HashMap<NodeId, ElementId>,
    bounds: Rect,
}

impl Default for TreeView {
    fn default() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            item_to_node: HashMap::new(),
            root_nodes: Vec::new(),
            selectors: HashMap::new(),
            template: None,
            row_height: None,
            indentation: None,
            expander_size: None,
            scrollbar_thickness: None,
            scroll_offset: 0.0,
            viewport_extent: 0.0,
            measured_once: false,
            selected: None,
            visible: Vec::new(),
            realized: HashMap::new(),
            bounds: Rect::ZERO,
        }
    }
}

impl TreeView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register how children are produced for items of type `T`.
    pub fn children_of<T: Any>(mut self, selector: impl Fn(&T) -> Vec<Item> + 'static) -> Self {
        self.register_children(selector);
        self
    }

    /// Set the root items.
    pub fn items(mut self, roots: Vec<Item>) -> Self {
        self.set_items(roots);
        self
    }

    /// Set the factory that builds the element for a visible row.
    pub fn template(
        mut self,
        template: impl Fn(&mut ElementTree, &Item, usize) -> Option<ElementId> + 'static,
    ) -> Self {
        self.template = Some(Box::new(template));
        self
    }

    pub fn row_height(mut self, height: f32) -> Self {
        self.row_height = Some(height.max(0.0));
        self.recompute_heights();
        self
    }

    pub fn indentation(mut self, indentation: f32) -> Self {
        self.indentation = Some(indentation.max(0.0));
        self
    }

    pub fn expander_size(mut self, size: f32) -> Self {
        self.expander_size = Some(size.max(0.0));
        self
    }

    pub fn scrollbar_thickness(mut self, thickness: f32) -> Self {
        self.scrollbar_thickness = Some(thickness.max(0.0));
        self
    }

    pub(crate) fn configure(&mut self, config: &LayoutConfig) {
        if self.row_height.is_none() {
            self.row_height = Some(config.tree_row_height.max(0.0));
            self.recompute_heights();
        }
        self.indentation.get_or_insert(config.tree_indentation.max(0.0));
        self.expander_size.get_or_insert(config.tree_expander_size.max(0.0));
        self.scrollbar_thickness.get_or_insert(config.scrollbar_thickness.max(0.0));
    }

    /// Register a children selector after construction. Unloaded nodes of
    /// type `T` start showing an expander.
    pub fn register_children<T: Any>(&mut self, selector: impl Fn(&T) -> Vec<Item> + 'static) {
        let type_id = TypeId::of::<T>();
        self.selectors.insert(
            type_id,
            Box::new(move |any: &dyn Any| any.downcast_ref::<T>().map(&selector).unwrap_or_default()),
        );
        for node in self.nodes.values_mut() {
            if !node.is_loaded() && (*node.item).type_id() == type_id {
                node.has_children = true;
            }
        }
    }

    pub fn get_row_height(&self) -> f32 {
        self.row_height.unwrap_or(DEFAULT_TREE_ROW_HEIGHT)
    }

    pub fn get_indentation(&self) -> f32 {
        self.indentation.unwrap_or(DEFAULT_TREE_INDENTATION)
    }

    pub fn get_expander_size(&self) -> f32 {
        self.expander_size.unwrap_or(DEFAULT_TREE_EXPANDER_SIZE)
    }

    pub fn get_scrollbar_thickness(&self) -> f32 {
        self.scrollbar_thickness.unwrap_or(DEFAULT_SCROLLBAR_THICKNESS)
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Replace the roots. Every previous node handle becomes stale.
    pub fn set_items(&mut self, roots: Vec<Item>) {
        self.nodes.clear();
        self.item_to_node.clear();
        self.selected = None;
        self.visible.clear();
        self.root_nodes = roots
            .into_iter()
            .map(|item| self.create_node(item, 0, None))
            .collect();
        tracing::debug!(roots = self.root_nodes.len(), "tree view roots set");
    }

    pub fn root_nodes(&self) -> &[NodeId] {
        &self.root_nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeViewNode> {
        self.nodes.get(id)
    }

    /// Number of nodes created so far (loaded nodes only).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_for_item(&self, item: &Item) -> Option<NodeId> {
        self.item_to_node.get(&ItemKey::of(item)).copied()
    }

    fn create_node(&mut self, item: Item, depth: usize, parent: Option<NodeId>) -> NodeId {
        let has_children = self.selectors.contains_key(&(*item).type_id());
        let key = ItemKey::of(&item);
        let row = self.get_row_height();
        let id = self.nodes.insert(TreeViewNode {
            item,
            depth,
            parent,
            is_expanded: false,
            children: None,
            has_children,
            expanded_height: row,
        });
        self.item_to_node.insert(key, id);
        id
    }

    /// Run the selector for `id` once and create its child nodes.
    fn load_children(&mut self, id: NodeId) -> Result<()> {
        let node = self.nodes.get(id).ok_or(LayoutError::UnknownNode)?;
        if node.is_loaded() {
            return Ok(());
        }
        let item = node.item.clone();
        let depth = node.depth + 1;
        let items = match self.selectors.get(&(*item).type_id()) {
            Some(selector) => selector(&*item),
            None => Vec::new(),
        };
        let children: Vec<NodeId> = items
            .into_iter()
            .map(|child| self.create_node(child, depth, Some(id)))
            .collect();
        tracing::debug!(?id, depth, loaded = children.len(), "tree node children loaded");

        let node = self.nodes.get_mut(id).ok_or(LayoutError::UnknownNode)?;
        node.has_children = !children.is_empty();
        node.children = Some(children);
        Ok(())
    }

    /// Expand a node, loading its children on first use. Returns whether
    /// the node changed state.
    pub fn expand_node(&mut self, id: NodeId) -> Result<bool> {
        let node = self.nodes.get(id).ok_or(LayoutError::UnknownNode)?;
        if node.is_expanded {
            return Ok(false);
        }
        self.load_children(id)?;
        let node = self.nodes.get_mut(id).ok_or(LayoutError::UnknownNode)?;
        if !node.has_children {
            return Ok(false);
        }
        node.is_expanded = true;
        self.propagate_height(id);
        tracing::debug!(?id, total_height = self.total_height(), "tree node expanded");
        Ok(true)
    }

    /// Collapse a node. Loaded children are kept.
    pub fn collapse_node(&mut self, id: NodeId) -> Result<bool> {
        let node = self.nodes.get_mut(id).ok_or(LayoutError::UnknownNode)?;
        if !node.is_expanded {
            return Ok(false);
        }
        node.is_expanded = false;
        self.propagate_height(id);
        tracing::debug!(?id, total_height = self.total_height(), "tree node collapsed");
        Ok(true)
    }

    /// Flip a node's state. Returns the new `is_expanded`.
    pub fn toggle_node(&mut self, id: NodeId) -> Result<bool> {
        let node = self.nodes.get(id).ok_or(LayoutError::UnknownNode)?;
        if node.is_expanded {
            self.collapse_node(id)?;
        } else {
            self.expand_node(id)?;
        }
        Ok(self.nodes.get(id).is_some_and(|n| n.is_expanded))
    }

    /// Expand the node showing `item`.
    pub fn expand_item(&mut self, item: &Item) -> Result<bool> {
        let id = self.node_for_item(item).ok_or(LayoutError::UnknownNode)?;
        self.expand_node(id)
    }

    /// Recompute `id` and every ancestor.
    fn propagate_height(&mut self, id: NodeId) {
        let row = self.get_row_height();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.nodes.get(current) else {
                break;
            };
            let children: f32 = if node.is_expanded {
                node.children()
                    .iter()
                    .filter_map(|c| self.nodes.get(*c))
                    .map(|c| c.expanded_height)
                    .sum()
            } else {
                0.0
            };
            cursor = node.parent;
            if let Some(node) = self.nodes.get_mut(current) {
                node.expanded_height = row + children;
            }
        }
    }

    /// Rebuild every cached height after a row height change.
    fn recompute_heights(&mut self) {
        let roots = self.root_nodes.clone();
        for root in roots {
            self.recompute_subtree(root);
        }
    }

    fn recompute_subtree(&mut self, id: NodeId) -> f32 {
        let Some(node) = self.nodes.get(id) else {
            return 0.0;
        };
        let expanded = node.is_expanded;
        let children = node.children().to_vec();
        let mut height = self.get_row_height();
        for child in children {
            let child_height = self.recompute_subtree(child);
            if expanded {
                height += child_height;
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.expanded_height = height;
        }
        height
    }

    /// Sum of the roots' expanded heights.
    pub fn total_height(&self) -> f32 {
        self.root_nodes
            .iter()
            .filter_map(|id| self.nodes.get(*id))
            .map(|n| n.expanded_height)
            .sum()
    }

    // =========================================================================
    // Culling
    // =========================================================================

    /// Rows overlapping `[start, start + height)` in display order.
    pub fn get_visible_nodes(&self, start: f32, height: f32) -> Vec<VisibleNode> {
        let mut out = Vec::new();
        if !(height > 0.0) {
            return out;
        }
        let mut y = 0.0;
        self.collect_visible(&self.root_nodes, &mut y, start, start + height, &mut out);
        out
    }

    /// Depth-first walk; returns true once the cursor passes `end`.
    fn collect_visible(
        &self,
        ids: &[NodeId],
        y: &mut f32,
        start: f32,
        end: f32,
        out: &mut Vec<VisibleNode>,
    ) -> bool {
        let row = self.get_row_height();
        for &id in ids {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if *y >= end {
                return true;
            }
            // Whole subtree above the viewport
            if *y + node.expanded_height <= start {
                *y += node.expanded_height;
                continue;
            }
            if *y + row > start {
                out.push(VisibleNode {
                    node: id,
                    depth: node.depth,
                    y: *y,
                });
            }
            *y += row;
            if node.is_expanded && self.collect_visible(node.children(), y, start, end, out) {
                return true;
            }
        }
        false
    }

    /// The row containing content coordinate `y`.
    pub fn find_row(&self, y: f32) -> Option<VisibleNode> {
        if !(y >= 0.0) {
            return None;
        }
        let mut cursor = 0.0;
        self.find_in(&self.root_nodes, &mut cursor, y)
    }

    fn find_in(&self, ids: &[NodeId], cursor: &mut f32, y: f32) -> Option<VisibleNode> {
        let row = self.get_row_height();
        for &id in ids {
            let node = self.nodes.get(id)?;
            if y >= *cursor + node.expanded_height {
                *cursor += node.expanded_height;
                continue;
            }
            if y < *cursor + row {
                return Some(VisibleNode {
                    node: id,
                    depth: node.depth,
                    y: *cursor,
                });
            }
            *cursor += row;
            return self.find_in(node.children(), cursor, y);
        }
        None
    }

    // =========================================================================
    // Selection / Scrolling
    // =========================================================================

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn select(&mut self, node: Option<NodeId>) -> Result<()> {
        if let Some(id) = node {
            if !self.nodes.contains_key(id) {
                return Err(LayoutError::UnknownNode);
            }
        }
        self.selected = node;
        Ok(())
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    /// Set the vertical scroll offset. Returns the clamped value.
    pub fn set_scroll_offset(&mut self, offset: f32) -> f32 {
        self.scroll_offset = if self.measured_once {
            clamp_offset(offset, self.total_height(), self.viewport_extent)
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

    pub fn scrollbar(&self) -> ScrollbarState {
        ScrollbarState::new(self.scroll_offset, self.total_height(), self.viewport_extent)
    }

    /// Strip along the right edge, present only while scrollable.
    pub fn scrollbar_rect(&self) -> Option<Rect> {
        if !self.scrollbar().is_scrollable() {
            return None;
        }
        let b = self.bounds;
        let t = self.get_scrollbar_thickness().min(b.width);
        Some(Rect::new(b.right() - t, b.y, t, b.height))
    }

    /// Handle a click that no interactive row content claimed.
    pub fn click(&mut self, point: Point) -> Result<TreeClick> {
        if !self.bounds.contains(point) || self.scrollbar_rect().is_some_and(|r| r.contains(point)) {
            return Ok(TreeClick::None);
        }
        let Some(row) = self.find_row(point.y - self.bounds.y + self.scroll_offset) else {
            return Ok(TreeClick::None);
        };
        let node = self.nodes.get(row.node).ok_or(LayoutError::UnknownNode)?;
        let x = point.x - self.bounds.x;
        let glyph = row.depth as f32 * self.get_indentation();
        if node.has_children && x >= glyph && x < glyph + self.get_expander_size() {
            let expanded = self.toggle_node(row.node)?;
            return Ok(TreeClick::Toggled {
                node: row.node,
                expanded,
            });
        }
        self.select(Some(row.node))?;
        Ok(TreeClick::Selected(row.node))
    }

    // =========================================================================
    // Realization
    // =========================================================================

    /// Rows culled by the last measure.
    pub fn visible_nodes(&self) -> &[VisibleNode] {
        &self.visible
    }

    pub fn realized_element(&self, node: NodeId) -> Option<ElementId> {
        self.realized.get(&node).copied()
    }

    pub fn realized_count(&self) -> usize {
        self.realized.len()
    }

    /// Realized row elements in display order.
    pub(crate) fn realized_elements(&self) -> Vec<ElementId> {
        self.visible
            .iter()
            .filter_map(|v| self.realized.get(&v.node).copied())
            .collect()
    }

    /// Every realized row element, including rows culled since the last
    /// measure.
    pub(crate) fn owned_elements(&self) -> Vec<ElementId> {
        self.realized.values().copied().collect()
    }

    pub(crate) fn detach(&mut self, child: ElementId) -> bool {
        let before = self.realized.len();
        self.realized.retain(|_, id| *id != child);
        self.realized.len() != before
    }

    /// Horizontal offset of a row's content.
    fn row_inset(&self, depth: usize) -> f32 {
        depth as f32 * self.get_indentation() + self.get_expander_size()
    }

    pub(crate) fn measure(&mut self, tree: &mut ElementTree, id: ElementId, available: Size) -> Result<Size> {
        let row = self.get_row_height();
        let total = self.total_height();
        let viewport = if available.height.is_finite() { available.height } else { total };
        self.viewport_extent = viewport;
        self.scroll_offset = clamp_offset(self.scroll_offset, total, viewport);
        self.measured_once = true;
        self.visible = self.get_visible_nodes(self.scroll_offset, viewport);

        let keep: HashSet<NodeId> = self.visible.iter().map(|v| v.node).collect();
        let leaving: Vec<(NodeId, ElementId)> = self
            .realized
            .iter()
            .filter(|(node, _)| !keep.contains(*node))
            .map(|(&node, &child)| (node, child))
            .collect();
        for (node, child) in &leaving {
            self.realized.remove(node);
            tree.remove_subtree(*child);
        }

        let mut entered = 0usize;
        let mut widest = 0.0f32;
        if let Some(template) = &self.template {
            for (index, v) in self.visible.iter().enumerate() {
                let child = match self.realized.get(&v.node) {
                    Some(&child) => child,
                    None => {
                        let item = self.nodes.get(v.node).ok_or(LayoutError::UnknownNode)?.item.clone();
                        let child = template(tree, &item, v.depth).ok_or(LayoutError::MissingTemplate { index })?;
                        tree.set_parent(child, id)?;
                        self.realized.insert(v.node, child);
                        entered += 1;
                        child
                    }
                };
                let inset = self.row_inset(v.depth);
                let desired = tree.measure(child, Size::new((available.width - inset).max(0.0), row), false)?;
                widest = widest.max(inset + desired.width);
            }
        }

        if entered > 0 || !leaving.is_empty() {
            tracing::debug!(
                ?id,
                visible = self.visible.len(),
                realized = entered,
                derealized = leaving.len(),
                "tree view window moved"
            );
        }

        Ok(Size::new(widest.min(available.width), total.min(available.height)))
    }

    pub(crate) fn arrange(&mut self, tree: &mut ElementTree, content: Rect) -> Result<()> {
        self.bounds = content;
        self.viewport_extent = content.height;
        self.scroll_offset = clamp_offset(self.scroll_offset, self.total_height(), self.viewport_extent);

        let row = self.get_row_height();
        for v in &self.visible {
            let Some(&child) = self.realized.get(&v.node) else {
                continue;
            };
            let inset = self.row_inset(v.depth);
            let slot = Rect::new(
                content.x + inset,
                content.y + v.y - self.scroll_offset,
                (content.width - inset).max(0.0),
                row,
            );
            tree.arrange(child, slot)?;
        }
        Ok(())
    }

    pub(crate) fn hit_test(&self, tree: &ElementTree, id: ElementId, point: Point) -> Option<HitResult> {
        if self.scrollbar_rect().is_some_and(|r| r.contains(point)) {
            return Some(HitResult::Scrollbar(id));
        }
        claiming_hit(tree, id, self.realized_elements().into_iter(), point)
    }
}

impl fmt::Debug for TreeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeView")
            .field("roots", &self.root_nodes.len())
            .field("nodes", &self.nodes.len())
            .field("total_height", &self.total_height())
            .field("scroll_offset", &self.scroll_offset)
            .field("realized", &self.realized.len())
            .finish()
    }
}
