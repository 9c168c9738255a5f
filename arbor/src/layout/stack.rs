//! Stack - linear flow container.
//!
//! Children are laid out along the main axis in declaration order; on the
//! cross axis each child resolves its own alignment inside the stack's
//! extent. With `wrap` enabled, children are packed greedily into lines
//! that break when the next child would overflow the main axis.

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::primitives::{Rect, Size};

use super::element::ElementId;
use super::length::Orientation;
use super::tree::ElementTree;

/// Slot assigned to a child during measure, relative to the content origin.
#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    main: f32,
    cross: f32,
    main_extent: f32,
    /// Line height for wrapped stacks; `None` spans the full cross extent.
    cross_extent: Option<f32>,
}

// =========================================================================
// Stack
// =========================================================================

/// A horizontal or vertical stack.
#[derive(Debug, Default)]
pub struct Stack {
    children: Vec<ElementId>,
    orientation: Orientation,
    /// Gap between children; `None` picks up the tree's default.
    spacing: Option<f32>,
    wrap: bool,
    line_spacing: f32,
    slots: Vec<Slot>,
}

impl Stack {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            ..Self::default()
        }
    }

    pub fn vertical() -> Self {
        Self::new(Orientation::Vertical)
    }

    pub fn horizontal() -> Self {
        Self::new(Orientation::Horizontal)
    }

    /// Set spacing between children.
    pub fn spacing(mut self, spacing: f32) -> Self {
        self.spacing = Some(spacing.max(0.0));
        self
    }

    /// Wrap children onto new lines when the main axis is exhausted.
    pub fn wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    /// Set spacing between wrapped lines.
    pub fn line_spacing(mut self, spacing: f32) -> Self {
        self.line_spacing = spacing.max(0.0);
        self
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn is_wrapping(&self) -> bool {
        self.wrap
    }

    pub fn get_spacing(&self) -> f32 {
        self.spacing.unwrap_or(0.0)
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub(crate) fn configure(&mut self, config: &LayoutConfig) {
        if self.spacing.is_none() {
            self.spacing = Some(config.stack_spacing.max(0.0));
        }
    }

    pub(crate) fn push_child(&mut self, child: ElementId) {
        self.children.push(child);
    }

    pub(crate) fn detach(&mut self, child: ElementId) -> bool {
        let before = self.children.len();
        self.children.retain(|c| *c != child);
        self.children.len() != before
    }

    // =========================================================================
    // Measure
    // =========================================================================

    pub(crate) fn measure(
        &mut self,
        tree: &mut ElementTree,
        available: Size,
        dont_stretch: bool,
    ) -> Result<Size> {
        self.slots.clear();
        self.slots.resize(self.children.len(), Slot::default());
        if self.children.is_empty() {
            return Ok(Size::ZERO);
        }
        if self.wrap {
            self.measure_wrapped(tree, available, dont_stretch)
        } else {
            self.measure_linear(tree, available, dont_stretch)
        }
    }

    fn measure_linear(
        &mut self,
        tree: &mut ElementTree,
        available: Size,
        dont_stretch: bool,
    ) -> Result<Size> {
        let o = self.orientation;
        let spacing = self.get_spacing();
        let avail_main = o.main(available);
        let avail_cross = o.cross(available);
        let gaps = spacing * (self.children.len() - 1) as f32;

        let mut remaining = (avail_main - gaps).max(0.0);
        let mut extents = vec![0.0f32; self.children.len()];
        let mut cross_max = 0.0f32;
        let mut stretchers = Vec::new();

        // Fixed children first, each shrinking what is left
        for (i, &child) in self.children.iter().enumerate() {
            let el = tree.get(child)?;
            let main_align = match o {
                Orientation::Horizontal => el.get_horizontal_alignment(),
                Orientation::Vertical => el.get_vertical_alignment(),
            };
            if main_align.is_stretch() && avail_main.is_finite() {
                stretchers.push(i);
                continue;
            }
            let desired = tree.measure(child, o.size(remaining, avail_cross), dont_stretch)?;
            extents[i] = o.main(desired);
            cross_max = cross_max.max(o.cross(desired));
            remaining = (remaining - extents[i]).max(0.0);
        }

        // Stretch children split the rest equally
        if !stretchers.is_empty() {
            let share = remaining / stretchers.len() as f32;
            for &i in &stretchers {
                let desired = tree.measure(self.children[i], o.size(share, avail_cross), dont_stretch)?;
                extents[i] = o.main(desired);
                cross_max = cross_max.max(o.cross(desired));
            }
        }

        let mut cursor = 0.0f32;
        for (slot, extent) in self.slots.iter_mut().zip(&extents) {
            *slot = Slot {
                main: cursor,
                cross: 0.0,
                main_extent: *extent,
                cross_extent: None,
            };
            cursor += extent + spacing;
        }
        let main_total = extents.iter().sum::<f32>() + gaps;

        Ok(o.size(main_total, cross_max))
    }

    fn measure_wrapped(
        &mut self,
        tree: &mut ElementTree,
        available: Size,
        dont_stretch: bool,
    ) -> Result<Size> {
        let o = self.orientation;
        let spacing = self.get_spacing();
        let max_main = o.main(available);

        let mut line_main = 0.0f32;
        let mut line_cross_pos = 0.0f32;
        let mut line_extent = 0.0f32;
        let mut line_start = 0usize;
        let mut widest = 0.0f32;

        for i in 0..self.children.len() {
            let desired = tree.measure(self.children[i], available, dont_stretch)?;
            let (main, cross) = (o.main(desired), o.cross(desired));

            // Wrap to the next line when this child would overflow
            if i > line_start && line_main + main > max_main {
                self.close_line(line_start, i, line_extent);
                widest = widest.max(line_main - spacing);
                line_cross_pos += line_extent + self.line_spacing;
                line_main = 0.0;
                line_extent = 0.0;
                line_start = i;
            }

            self.slots[i] = Slot {
                main: line_main,
                cross: line_cross_pos,
                main_extent: main,
                cross_extent: None,
            };
            line_main += main + spacing;
            line_extent = line_extent.max(cross);
        }
        self.close_line(line_start, self.children.len(), line_extent);
        widest = widest.max(line_main - spacing);

        let size = o.size(widest.max(0.0), line_cross_pos + line_extent);
        Ok(size.min(available))
    }

    fn close_line(&mut self, start: usize, end: usize, extent: f32) {
        for slot in &mut self.slots[start..end] {
            slot.cross_extent = Some(extent);
        }
    }

    // =========================================================================
    // Arrange
    // =========================================================================

    pub(crate) fn arrange(&mut self, tree: &mut ElementTree, content: Rect) -> Result<()> {
        let o = self.orientation;
        let origin = content.origin();
        let full_cross = o.cross(content.size());
        for (&child, slot) in self.children.iter().zip(&self.slots) {
            let offset = o.point(slot.main, slot.cross);
            let size = o.size(slot.main_extent, slot.cross_extent.unwrap_or(full_cross));
            tree.arrange(child, Rect::from_origin_size(origin + offset, size))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::element::Element;
    use crate::layout::length::Alignment;
    use crate::primitives::{Margin, Point};

    fn stack_with(tree: &mut ElementTree, stack: Stack, sizes: &[(f32, f32)]) -> (ElementId, Vec<ElementId>) {
        let id = tree.insert(Element::new(stack));
        let children = sizes
            .iter()
            .map(|&(w, h)| {
                let child = tree.insert(Element::leaf(Size::new(w, h)));
                tree.add_child(id, child).unwrap();
                child
            })
            .collect();
        (id, children)
    }

    #[test]
    fn test_vertical_sums_main_and_maxes_cross() {
        let mut tree = ElementTree::new();
        let (id, _) = stack_with(&mut tree, Stack::vertical().spacing(5.0), &[(30.0, 10.0), (50.0, 20.0)]);
        let size = tree.measure(id, Size::new(200.0, 200.0), false).unwrap();
        assert_eq!(size, Size::new(50.0, 35.0));
    }

    #[test]
    fn test_horizontal_arrange_positions() {
        let mut tree = ElementTree::new();
        let (id, children) =
            stack_with(&mut tree, Stack::horizontal().spacing(4.0), &[(10.0, 5.0), (20.0, 8.0)]);
        tree.layout(id, Rect::new(100.0, 50.0, 300.0, 300.0)).unwrap();
        assert_eq!(tree.get(children[0]).unwrap().position(), Point::new(100.0, 50.0));
        assert_eq!(tree.get(children[1]).unwrap().position(), Point::new(114.0, 50.0));
    }

    #[test]
    fn test_child_margin_counted_once() {
        let mut tree = ElementTree::new();
        let id = tree.insert(Element::new(Stack::vertical()));
        let child = tree.insert(Element::leaf(Size::new(10.0, 10.0)).margin(Margin::all(3.0)));
        tree.add_child(id, child).unwrap();
        let size = tree.measure(id, Size::new(100.0, 100.0), false).unwrap();
        assert_eq!(size, Size::new(16.0, 16.0));
        tree.arrange(id, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        assert_eq!(tree.get(child).unwrap().position(), Point::new(3.0, 3.0));
    }

    #[test]
    fn test_stretch_children_share_remaining_space() {
        let mut tree = ElementTree::new();
        let id = tree.insert(Element::new(Stack::horizontal()));
        let fixed = tree.insert(Element::leaf(Size::new(40.0, 10.0)));
        let a = tree.insert(Element::leaf(Size::new(5.0, 10.0)).horizontal_alignment(Alignment::Stretch));
        let b = tree.insert(Element::leaf(Size::new(5.0, 10.0)).horizontal_alignment(Alignment::Stretch));
        for child in [a, fixed, b] {
            tree.add_child(id, child).unwrap();
        }
        let size = tree.measure(id, Size::new(100.0, 50.0), false).unwrap();
        assert_eq!(size.width, 100.0);
        assert_eq!(tree.get(a).unwrap().element_size().width, 30.0);
        assert_eq!(tree.get(b).unwrap().element_size().width, 30.0);

        tree.arrange(id, Rect::new(0.0, 0.0, 100.0, 50.0)).unwrap();
        assert_eq!(tree.get(fixed).unwrap().position().x, 30.0);
        assert_eq!(tree.get(b).unwrap().position().x, 70.0);
    }

    #[test]
    fn test_cross_alignment_inside_stack() {
        let mut tree = ElementTree::new();
        let id = tree.insert(Element::new(Stack::vertical()));
        let wide = tree.insert(Element::leaf(Size::new(100.0, 10.0)));
        let narrow = tree.insert(Element::leaf(Size::new(20.0, 10.0)).horizontal_alignment(Alignment::End));
        tree.add_child(id, wide).unwrap();
        tree.add_child(id, narrow).unwrap();
        tree.layout(id, Rect::new(0.0, 0.0, 300.0, 300.0)).unwrap();
        assert_eq!(tree.get(narrow).unwrap().position(), Point::new(80.0, 10.0));
    }

    #[test]
    fn test_wrap_breaks_lines_on_main_axis() {
        let mut tree = ElementTree::new();
        let (id, children) = stack_with(
            &mut tree,
            Stack::horizontal().wrap(true).spacing(10.0).line_spacing(5.0),
            &[(40.0, 10.0), (40.0, 20.0), (40.0, 10.0)],
        );
        // 40 + 10 + 40 = 90 fits in 100; the third child wraps
        let size = tree.measure(id, Size::new(100.0, 500.0), false).unwrap();
        assert_eq!(size, Size::new(90.0, 35.0));

        tree.arrange(id, Rect::new(0.0, 0.0, 100.0, 500.0)).unwrap();
        assert_eq!(tree.get(children[1]).unwrap().position(), Point::new(50.0, 0.0));
        assert_eq!(tree.get(children[2]).unwrap().position(), Point::new(0.0, 25.0));
    }

    #[test]
    fn test_wrap_size_capped_to_available() {
        let mut tree = ElementTree::new();
        let (id, _) = stack_with(
            &mut tree,
            Stack::vertical().wrap(true),
            &[(10.0, 60.0), (10.0, 60.0), (500.0, 10.0)],
        );
        let size = tree.measure(id, Size::new(200.0, 100.0), false).unwrap();
        // Lines: [60], [60, 10]; cross = 10 + 500, capped to 200
        assert_eq!(size, Size::new(200.0, 70.0));
    }

    #[test]
    fn test_empty_stack_is_zero() {
        let mut tree = ElementTree::new();
        let id = tree.insert(Element::new(Stack::vertical().spacing(8.0)));
        assert_eq!(tree.measure(id, Size::new(50.0, 50.0), false).unwrap(), Size::ZERO);
    }
}
