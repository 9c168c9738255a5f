//! Scroll State
//!
//! Scroll offset clamping and scrollbar thumb geometry shared by the
//! virtualized controls. A scrollbar widget (outside this crate) reads
//! `ScrollbarState` and maps pointer drags back to offsets.

/// Grab tolerance for scrollbar thumb presses (absorbs float rounding).
const GRAB_TOLERANCE: f32 = 4.0;

/// Smallest thumb extent, so the thumb stays grabbable on huge content.
const MIN_THUMB_EXTENT: f32 = 16.0;

/// Clamp a requested scroll offset into `[0, max(0, content - viewport)]`.
#[inline]
pub fn clamp_offset(requested: f32, content_extent: f32, viewport_extent: f32) -> f32 {
    let max = max_offset(content_extent, viewport_extent);
    if requested.is_nan() {
        return 0.0;
    }
    requested.clamp(0.0, max)
}

/// Maximum scroll offset for the given extents.
#[inline]
pub fn max_offset(content_extent: f32, viewport_extent: f32) -> f32 {
    let viewport = if viewport_extent.is_finite() { viewport_extent.max(0.0) } else { content_extent };
    (content_extent - viewport).max(0.0)
}

/// Snapshot of a scroll container's state along its scroll axis.
///
/// Everything a scrollbar needs is derived from the four stored values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollbarState {
    /// Current (clamped) scroll offset.
    pub offset: f32,
    /// Maximum scroll offset.
    pub max_offset: f32,
    /// Visible extent along the scroll axis.
    pub viewport_extent: f32,
    /// Total content extent along the scroll axis.
    pub content_extent: f32,
}

impl ScrollbarState {
    pub fn new(offset: f32, content_extent: f32, viewport_extent: f32) -> Self {
        Self {
            offset: clamp_offset(offset, content_extent, viewport_extent),
            max_offset: max_offset(content_extent, viewport_extent),
            viewport_extent,
            content_extent,
        }
    }

    /// Whether the content overflows the viewport.
    pub fn is_scrollable(&self) -> bool {
        self.max_offset > 0.0
    }

    /// Thumb extent for a track of the given length.
    pub fn thumb_extent(&self, track_len: f32) -> f32 {
        if self.content_extent <= 0.0 || !self.is_scrollable() {
            return track_len.max(0.0);
        }
        let ratio = (self.viewport_extent / self.content_extent).clamp(0.0, 1.0);
        (track_len * ratio).max(MIN_THUMB_EXTENT).min(track_len.max(0.0))
    }

    /// Distance the thumb can travel along the track.
    pub fn travel(&self, track_len: f32) -> f32 {
        (track_len - self.thumb_extent(track_len)).max(0.0)
    }

    /// Leading edge of the thumb relative to the track start.
    pub fn thumb_offset(&self, track_len: f32) -> f32 {
        let available = self.travel(track_len);
        if available <= 0.0 || self.max_offset <= 0.0 {
            return 0.0;
        }
        (self.offset / self.max_offset) * available
    }

    /// Convert a pointer position on the track into a scroll offset.
    ///
    /// `grab` is the distance from the thumb's leading edge to where the
    /// drag started, so the thumb stays anchored under the pointer.
    pub fn offset_for_thumb(&self, pointer: f32, grab: f32, track_len: f32) -> f32 {
        let available = self.travel(track_len);
        if available <= 0.0 {
            return 0.0;
        }
        let relative = (pointer - grab).clamp(0.0, available);
        (relative / available) * self.max_offset
    }

    /// Grab offset for a press at `pointer` (track-relative).
    ///
    /// A press on the thumb keeps its offset; a press on the bare track
    /// centers the thumb on the pointer.
    pub fn grab_offset(&self, pointer: f32, track_len: f32) -> f32 {
        let top = self.thumb_offset(track_len);
        let extent = self.thumb_extent(track_len);
        if pointer >= top - GRAB_TOLERANCE && pointer <= top + extent + GRAB_TOLERANCE {
            pointer - top
        } else {
            extent / 2.0
        }
    }
}
