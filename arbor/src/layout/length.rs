//! Alignment and axis types.
//!
//! Core types for resolving an element inside the slot its parent gives it.

use serde::{Deserialize, Serialize};

use crate::primitives::{Point, Size};

/// Placement of an element along one axis of its slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    /// Pack at the leading edge (after the margin).
    #[default]
    Start,
    /// Center inside the slot.
    Center,
    /// Pack at the trailing edge (before the margin).
    End,
    /// Fill the slot. The size is expanded during measure.
    Stretch,
}

impl Alignment {
    #[inline]
    pub fn is_stretch(&self) -> bool {
        matches!(self, Alignment::Stretch)
    }

    /// Resolve the leading coordinate of an extent inside `[start, start + slot)`.
    ///
    /// `lead`/`trail` are the element's margins on this axis.
    #[inline]
    pub fn resolve(&self, start: f32, slot: f32, extent: f32, lead: f32, trail: f32) -> f32 {
        if !slot.is_finite() {
            return start + lead;
        }
        match self {
            Alignment::Start | Alignment::Stretch => start + lead,
            Alignment::Center => start + lead + (slot - lead - trail - extent) / 2.0,
            Alignment::End => start + slot - trail - extent,
        }
    }
}

/// Flow direction of a linear container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    #[default]
    Vertical,
}

impl Orientation {
    /// Extent along the flow direction.
    #[inline]
    pub fn main(&self, size: Size) -> f32 {
        match self {
            Orientation::Horizontal => size.width,
            Orientation::Vertical => size.height,
        }
    }

    /// Extent perpendicular to the flow direction.
    #[inline]
    pub fn cross(&self, size: Size) -> f32 {
        match self {
            Orientation::Horizontal => size.height,
            Orientation::Vertical => size.width,
        }
    }

    /// Build a size from main/cross extents.
    #[inline]
    pub fn size(&self, main: f32, cross: f32) -> Size {
        match self {
            Orientation::Horizontal => Size::new(main, cross),
            Orientation::Vertical => Size::new(cross, main),
        }
    }

    /// Build a point from main/cross coordinates.
    #[inline]
    pub fn point(&self, main: f32, cross: f32) -> Point {
        match self {
            Orientation::Horizontal => Point::new(main, cross),
            Orientation::Vertical => Point::new(cross, main),
        }
    }

    #[inline]
    pub fn main_pos(&self, point: Point) -> f32 {
        match self {
            Orientation::Horizontal => point.x,
            Orientation::Vertical => point.y,
        }
    }

    #[inline]
    pub fn cross_pos(&self, point: Point) -> f32 {
        match self {
            Orientation::Horizontal => point.y,
            Orientation::Vertical => point.x,
        }
    }
}
