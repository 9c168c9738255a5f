//! The box layout node.
//!
//! An `Element` holds the geometry state every node shares (position, final
//! size, margin, alignment, declared size) plus its `ElementKind`, which
//! decides how content is measured and arranged. Elements live in an
//! `ElementTree` arena and refer to each other by `ElementId`.

use crate::primitives::{Margin, Point, Rect, Size};

use super::cache::MeasureCache;
use super::kind::ElementKind;
use super::length::Alignment;

slotmap::new_key_type! {
    /// Handle to an element inside an `ElementTree`.
    pub struct ElementId;
}

/// A node in the element tree.
#[derive(Debug)]
pub struct Element {
    pub(crate) kind: ElementKind,
    pub(crate) parent: Option<ElementId>,
    pub(crate) position: Point,
    pub(crate) element_size: Size,
    pub(crate) margin: Margin,
    pub(crate) horizontal_alignment: Alignment,
    pub(crate) vertical_alignment: Alignment,
    pub(crate) desired_width: Option<f32>,
    pub(crate) desired_height: Option<f32>,
    pub(crate) interactive: bool,
    pub(crate) cache: MeasureCache,
}

impl Element {
    pub fn new(kind: impl Into<ElementKind>) -> Self {
        Self {
            kind: kind.into(),
            parent: None,
            position: Point::ORIGIN,
            element_size: Size::ZERO,
            margin: Margin::ZERO,
            horizontal_alignment: Alignment::Start,
            vertical_alignment: Alignment::Start,
            desired_width: None,
            desired_height: None,
            interactive: false,
            cache: MeasureCache::new(),
        }
    }

    /// A leaf with a fixed natural size.
    pub fn leaf(size: Size) -> Self {
        Self::new(super::leaf::Leaf::fixed(size))
    }

    // =========================================================================
    // Builder
    // =========================================================================

    pub fn margin(mut self, margin: Margin) -> Self {
        self.margin = margin;
        self
    }

    pub fn horizontal_alignment(mut self, alignment: Alignment) -> Self {
        self.horizontal_alignment = alignment;
        self
    }

    pub fn vertical_alignment(mut self, alignment: Alignment) -> Self {
        self.vertical_alignment = alignment;
        self
    }

    /// Set both alignments at once.
    pub fn align(mut self, horizontal: Alignment, vertical: Alignment) -> Self {
        self.horizontal_alignment = horizontal;
        self.vertical_alignment = vertical;
        self
    }

    /// Declare a size. The natural size is clamped to it on both axes.
    pub fn desired_size(mut self, size: Size) -> Self {
        self.desired_width = Some(size.width);
        self.desired_height = Some(size.height);
        self
    }

    pub fn desired_width(mut self, width: f32) -> Self {
        self.desired_width = Some(width);
        self
    }

    pub fn desired_height(mut self, height: f32) -> Self {
        self.desired_height = Some(height);
        self
    }

    /// Mark as an interactive control. Virtualized containers return
    /// interactive hits verbatim instead of claiming them.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Top-left corner, set by arrange.
    #[inline]
    pub fn position(&self) -> Point {
        self.position
    }

    /// Final size excluding margin, set by measure.
    #[inline]
    pub fn element_size(&self) -> Size {
        self.element_size
    }

    /// Arranged bounds (excluding margin).
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.element_size)
    }

    #[inline]
    pub fn get_margin(&self) -> Margin {
        self.margin
    }

    #[inline]
    pub fn get_horizontal_alignment(&self) -> Alignment {
        self.horizontal_alignment
    }

    #[inline]
    pub fn get_vertical_alignment(&self) -> Alignment {
        self.vertical_alignment
    }

    /// Declared size, if any axis was set. Unset axes read as infinity.
    pub fn get_desired_size(&self) -> Option<Size> {
        if self.desired_width.is_none() && self.desired_height.is_none() {
            return None;
        }
        Some(Size::new(
            self.desired_width.unwrap_or(f32::INFINITY),
            self.desired_height.unwrap_or(f32::INFINITY),
        ))
    }

    #[inline]
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    #[inline]
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    #[inline]
    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    /// Whether the next measure must recompute.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.cache.is_dirty()
    }

    // =========================================================================
    // Mutation (through `ElementTree::update`, which invalidates ancestors)
    // =========================================================================

    pub fn set_margin(&mut self, margin: Margin) {
        self.margin = margin;
    }

    pub fn set_horizontal_alignment(&mut self, alignment: Alignment) {
        self.horizontal_alignment = alignment;
    }

    pub fn set_vertical_alignment(&mut self, alignment: Alignment) {
        self.vertical_alignment = alignment;
    }

    pub fn set_desired_size(&mut self, size: Option<Size>) {
        self.desired_width = size.map(|s| s.width);
        self.desired_height = size.map(|s| s.height);
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    /// Mutable access to the kind for in-place edits.
    pub fn kind_mut(&mut self) -> &mut ElementKind {
        &mut self.kind
    }

    /// Space available to content after margin and declared size.
    pub(crate) fn content_available(&self, available: Size) -> Size {
        let mut inner = available.deflate(&self.margin);
        if let Some(w) = self.desired_width {
            inner.width = inner.width.min(w.max(0.0));
        }
        if let Some(h) = self.desired_height {
            inner.height = inner.height.min(h.max(0.0));
        }
        inner
    }

    /// Clamp a natural size to the declared size.
    pub(crate) fn clamp_to_desired(&self, size: Size) -> Size {
        Size::new(
            self.desired_width.map_or(size.width, |w| size.width.min(w.max(0.0))),
            self.desired_height.map_or(size.height, |h| size.height.min(h.max(0.0))),
        )
    }
}
