//! Grid - track-based sizing engine.
//!
//! Rows and columns are tracks of three kinds:
//! - `Absolute`: a fixed size, resolved before any child is measured
//! - `Auto`: sized to the largest natural extent of the children in it
//! - `Star`: a weighted share of whatever Absolute and Auto tracks leave
//!
//! Each measure resolves both axes in two child passes: a natural pass
//! (children ignore Stretch) that sizes the Auto tracks, then a final pass
//! against the resolved cell sizes. The grid's size is always the sum of
//! its tracks.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::primitives::{Rect, Size};

use super::element::ElementId;
use super::tree::ElementTree;

// =========================================================================
// Tracks
// =========================================================================

/// How a track is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    Absolute,
    Star,
    Auto,
}

/// Source of a track's fixed value (size for Absolute, weight for Star).
#[derive(Clone)]
pub enum TrackSize {
    Fixed(f32),
    /// Re-read on every measure.
    Bound(Rc<dyn Fn() -> f32>),
}

impl TrackSize {
    /// Current value; NaN and negatives read as zero.
    pub fn value(&self) -> f32 {
        let v = match self {
            TrackSize::Fixed(v) => *v,
            TrackSize::Bound(getter) => getter(),
        };
        if v.is_nan() { 0.0 } else { v.max(0.0) }
    }
}

impl fmt::Debug for TrackSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackSize::Fixed(v) => f.debug_tuple("Fixed").field(v).finish(),
            TrackSize::Bound(_) => f.write_str("Bound"),
        }
    }
}

/// A row or column definition.
#[derive(Debug, Clone)]
pub struct Track {
    kind: TrackKind,
    size: TrackSize,
    measured: f32,
}

impl Track {
    pub fn absolute(size: f32) -> Self {
        Self {
            kind: TrackKind::Absolute,
            size: TrackSize::Fixed(size),
            measured: 0.0,
        }
    }

    pub fn star(weight: f32) -> Self {
        Self {
            kind: TrackKind::Star,
            size: TrackSize::Fixed(weight),
            measured: 0.0,
        }
    }

    pub fn auto() -> Self {
        Self {
            kind: TrackKind::Auto,
            size: TrackSize::Fixed(0.0),
            measured: 0.0,
        }
    }

    /// A track whose size (or weight) is read from `getter` every measure.
    pub fn bound(kind: TrackKind, getter: impl Fn() -> f32 + 'static) -> Self {
        Self {
            kind,
            size: TrackSize::Bound(Rc::new(getter)),
            measured: 0.0,
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    /// Fixed size or weight.
    pub fn fixed_size(&self) -> f32 {
        self.size.value()
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.size, TrackSize::Bound(_))
    }

    /// Size resolved by the last measure.
    pub fn measured_size(&self) -> f32 {
        self.measured
    }

    /// Star tracks behave like Auto when the axis is unconstrained.
    fn is_auto_like(&self, unbounded: bool) -> bool {
        match self.kind {
            TrackKind::Auto => true,
            TrackKind::Star => unbounded,
            TrackKind::Absolute => false,
        }
    }
}

/// A child's natural extent over a run of tracks on one axis.
#[derive(Debug, Clone, Copy)]
struct SpanRequest {
    start: usize,
    span: usize,
    extent: f32,
}

/// Resolve every track's measured size on one axis.
fn resolve_tracks(tracks: &mut [Track], available: f32, requests: &[SpanRequest]) {
    let unbounded = !available.is_finite();

    for track in tracks.iter_mut() {
        track.measured = match track.kind {
            TrackKind::Absolute => track.size.value(),
            TrackKind::Auto | TrackKind::Star => 0.0,
        };
    }

    // Grow Auto tracks; spans split their extent equally across the Auto
    // tracks they cover and ignore the rest.
    for req in requests {
        let range = req.start..req.start + req.span;
        let autos: Vec<usize> = range.filter(|&i| tracks[i].is_auto_like(unbounded)).collect();
        if autos.is_empty() {
            continue;
        }
        let share = req.extent / autos.len() as f32;
        for i in autos {
            tracks[i].measured = tracks[i].measured.max(share);
        }
    }

    if unbounded {
        return;
    }

    let used: f32 = tracks
        .iter()
        .filter(|t| t.kind != TrackKind::Star)
        .map(|t| t.measured)
        .sum();
    let remaining = (available - used).max(0.0);
    let total_weight: f32 = tracks
        .iter()
        .filter(|t| t.kind == TrackKind::Star)
        .map(|t| t.size.value())
        .sum();

    for track in tracks.iter_mut().filter(|t| t.kind == TrackKind::Star) {
        track.measured = if total_weight > 0.0 {
            remaining * track.size.value() / total_weight
        } else {
            0.0
        };
    }
}

fn track_sum(tracks: &[Track], start: usize, span: usize) -> f32 {
    tracks[start..start + span].iter().map(|t| t.measured).sum()
}

fn track_offsets(tracks: &[Track]) -> Vec<f32> {
    let mut offsets = Vec::with_capacity(tracks.len());
    let mut cursor = 0.0;
    for track in tracks {
        offsets.push(cursor);
        cursor += track.measured;
    }
    offsets
}

// =========================================================================
// Placement
// =========================================================================

/// Where a child sits in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPlacement {
    pub row: usize,
    pub column: usize,
    pub row_span: usize,
    pub column_span: usize,
}

impl GridPlacement {
    /// A single cell.
    pub fn cell(row: usize, column: usize) -> Self {
        Self {
            row,
            column,
            row_span: 1,
            column_span: 1,
        }
    }

    /// A block of cells starting at (row, column).
    pub fn span(row: usize, column: usize, row_span: usize, column_span: usize) -> Self {
        Self {
            row,
            column,
            row_span,
            column_span,
        }
    }

    /// Spans must cover at least one track.
    pub fn validate(&self) -> Result<()> {
        if self.row_span == 0 || self.column_span == 0 {
            return Err(LayoutError::InvalidSpan {
                row_span: self.row_span,
                column_span: self.column_span,
            });
        }
        Ok(())
    }

    /// Clamp indices and spans to the declared track counts.
    fn clamped(&self, rows: usize, columns: usize) -> GridPlacement {
        let row = self.row.min(rows.saturating_sub(1));
        let column = self.column.min(columns.saturating_sub(1));
        GridPlacement {
            row,
            column,
            row_span: self.row_span.clamp(1, rows - row),
            column_span: self.column_span.clamp(1, columns - column),
        }
    }
}

/// A child with its placement.
#[derive(Debug, Clone, Copy)]
pub struct GridItem {
    child: ElementId,
    placement: GridPlacement,
}

impl GridItem {
    pub fn child(&self) -> ElementId {
        self.child
    }

    /// Placement as declared (before clamping).
    pub fn placement(&self) -> GridPlacement {
        self.placement
    }
}

// =========================================================================
// Grid
// =========================================================================

/// A grid of row and column tracks.
#[derive(Debug, Default)]
pub struct Grid {
    rows: Vec<Track>,
    columns: Vec<Track>,
    items: Vec<GridItem>,
    /// Placements clamped during the last measure, parallel to `items`.
    resolved: Vec<GridPlacement>,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(mut self, rows: impl IntoIterator<Item = Track>) -> Self {
        self.rows = rows.into_iter().collect();
        self
    }

    pub fn columns(mut self, columns: impl IntoIterator<Item = Track>) -> Self {
        self.columns = columns.into_iter().collect();
        self
    }

    /// Append a row definition.
    pub fn row(mut self, track: Track) -> Self {
        self.rows.push(track);
        self
    }

    /// Append a column definition.
    pub fn column(mut self, track: Track) -> Self {
        self.columns.push(track);
        self
    }

    pub fn row_definitions(&self) -> &[Track] {
        &self.rows
    }

    pub fn column_definitions(&self) -> &[Track] {
        &self.columns
    }

    pub fn set_row_definitions(&mut self, rows: Vec<Track>) {
        self.rows = rows;
    }

    pub fn set_column_definitions(&mut self, columns: Vec<Track>) {
        self.columns = columns;
    }

    /// Measured row heights from the last measure.
    pub fn row_sizes(&self) -> Vec<f32> {
        self.rows.iter().map(|t| t.measured).collect()
    }

    /// Measured column widths from the last measure.
    pub fn column_sizes(&self) -> Vec<f32> {
        self.columns.iter().map(|t| t.measured).collect()
    }

    pub fn items(&self) -> &[GridItem] {
        &self.items
    }

    pub fn has_bound_tracks(&self) -> bool {
        self.rows.iter().chain(&self.columns).any(Track::is_bound)
    }

    pub(crate) fn push_child(&mut self, child: ElementId, placement: GridPlacement) {
        self.items.push(GridItem { child, placement });
    }

    pub(crate) fn detach(&mut self, child: ElementId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.child != child);
        self.resolved.clear();
        self.items.len() != before
    }

    pub(crate) fn measure(&mut self, tree: &mut ElementTree, id: ElementId, available: Size) -> Result<Size> {
        if self.rows.is_empty() {
            self.rows.push(Track::auto());
        }
        if self.columns.is_empty() {
            self.columns.push(Track::auto());
        }

        let (row_count, column_count) = (self.rows.len(), self.columns.len());
        self.resolved = self
            .items
            .iter()
            .map(|item| item.placement.clamped(row_count, column_count))
            .collect();

        // Natural pass
        let mut column_requests = Vec::with_capacity(self.items.len());
        let mut row_requests = Vec::with_capacity(self.items.len());
        for (item, cell) in self.items.iter().zip(&self.resolved) {
            let natural = tree.measure(item.child, available, true)?;
            column_requests.push(SpanRequest {
                start: cell.column,
                span: cell.column_span,
                extent: natural.width,
            });
            row_requests.push(SpanRequest {
                start: cell.row,
                span: cell.row_span,
                extent: natural.height,
            });
        }

        resolve_tracks(&mut self.columns, available.width, &column_requests);
        resolve_tracks(&mut self.rows, available.height, &row_requests);

        // Final pass against the resolved cells
        for (item, cell) in self.items.iter().zip(&self.resolved) {
            let cell_size = Size::new(
                track_sum(&self.columns, cell.column, cell.column_span),
                track_sum(&self.rows, cell.row, cell.row_span),
            );
            tree.measure(item.child, cell_size, false)?;
        }

        tracing::trace!(
            ?id,
            columns = ?self.column_sizes(),
            rows = ?self.row_sizes(),
            "grid tracks resolved"
        );

        Ok(Size::new(
            track_sum(&self.columns, 0, column_count),
            track_sum(&self.rows, 0, row_count),
        ))
    }

    pub(crate) fn arrange(&mut self, tree: &mut ElementTree, content: Rect) -> Result<()> {
        let column_offsets = track_offsets(&self.columns);
        let row_offsets = track_offsets(&self.rows);
        for (item, cell) in self.items.iter().zip(&self.resolved) {
            // Tracks replaced since the last measure
            if cell.row + cell.row_span > self.rows.len() || cell.column + cell.column_span > self.columns.len() {
                continue;
            }
            let slot = Rect::new(
                content.x + column_offsets[cell.column],
                content.y + row_offsets[cell.row],
                track_sum(&self.columns, cell.column, cell.column_span),
                track_sum(&self.rows, cell.row, cell.row_span),
            );
            tree.arrange(item.child, slot)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::layout::element::Element;
    use crate::layout::length::Alignment;
    use crate::primitives::{Margin, Point};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    fn add(tree: &mut ElementTree, grid: ElementId, size: (f32, f32), placement: GridPlacement) -> ElementId {
        let child = tree.insert(Element::leaf(Size::new(size.0, size.1)));
        tree.add_grid_child(grid, child, placement).unwrap();
        child
    }

    #[test]
    fn test_absolute_and_star_columns() {
        let mut tree = ElementTree::new();
        let grid = tree.insert(Element::new(
            Grid::new()
                .columns([Track::absolute(30.0), Track::star(1.0), Track::star(2.0)])
                .row(Track::auto()),
        ));
        tree.measure(grid, Size::new(160.0, 100.0), false).unwrap();
        let cols = tree.grid(grid).unwrap().column_sizes();
        assert!(approx(cols[0], 30.0));
        assert!(approx(cols[1], 43.33));
        assert!(approx(cols[2], 86.67));
    }

    #[test]
    fn test_empty_grid_synthesizes_single_auto_cell() {
        let mut tree = ElementTree::new();
        let grid = tree.insert(Element::new(Grid::new()));
        add(&mut tree, grid, (40.0, 25.0), GridPlacement::cell(0, 0));
        let size = tree.measure(grid, Size::new(200.0, 200.0), false).unwrap();
        assert_eq!(size, Size::new(40.0, 25.0));
        assert_eq!(tree.grid(grid).unwrap().row_definitions().len(), 1);
    }

    #[test]
    fn test_auto_track_fits_largest_child() {
        let mut tree = ElementTree::new();
        let grid = tree.insert(Element::new(
            Grid::new().columns([Track::auto(), Track::star(1.0)]).rows([Track::auto(), Track::auto()]),
        ));
        add(&mut tree, grid, (20.0, 10.0), GridPlacement::cell(0, 0));
        add(&mut tree, grid, (35.0, 12.0), GridPlacement::cell(1, 0));
        let size = tree.measure(grid, Size::new(100.0, 100.0), false).unwrap();
        let g = tree.grid(grid).unwrap();
        assert_eq!(g.column_sizes(), vec![35.0, 65.0]);
        assert_eq!(g.row_sizes(), vec![10.0, 12.0]);
        assert_eq!(size, Size::new(100.0, 22.0));
    }

    #[test]
    fn test_span_splits_across_auto_tracks_only() {
        let mut tree = ElementTree::new();
        let grid = tree.insert(Element::new(
            Grid::new().columns([Track::auto(), Track::auto()]).row(Track::auto()),
        ));
        add(&mut tree, grid, (100.0, 10.0), GridPlacement::span(0, 0, 1, 2));
        tree.measure(grid, Size::new(500.0, 500.0), false).unwrap();
        assert_eq!(tree.grid(grid).unwrap().column_sizes(), vec![50.0, 50.0]);

        let mixed = tree.insert(Element::new(
            Grid::new()
                .columns([Track::absolute(30.0), Track::auto(), Track::auto()])
                .row(Track::auto()),
        ));
        add(&mut tree, mixed, (90.0, 10.0), GridPlacement::span(0, 0, 1, 3));
        add(&mut tree, mixed, (60.0, 10.0), GridPlacement::cell(0, 2));
        tree.measure(mixed, Size::new(500.0, 500.0), false).unwrap();
        // 90 / 2 autos = 45 each; the single child raises column 2 to 60
        assert_eq!(tree.grid(mixed).unwrap().column_sizes(), vec![30.0, 45.0, 60.0]);
    }

    #[test]
    fn test_spans_clamped_at_high_end() {
        let mut tree = ElementTree::new();
        let grid = tree.insert(Element::new(
            Grid::new().columns([Track::absolute(10.0), Track::absolute(20.0)]).row(Track::absolute(5.0)),
        ));
        let child = add(&mut tree, grid, (1.0, 1.0), GridPlacement::span(3, 1, 4, 9));
        tree.layout(grid, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        assert_eq!(tree.get(child).unwrap().position(), Point::new(10.0, 0.0));
    }

    #[test]
    fn test_arrange_after_tracks_shrink_skips_stale_cells() {
        let mut tree = ElementTree::new();
        let grid = tree.insert(Element::new(
            Grid::new()
                .columns([Track::absolute(10.0), Track::absolute(20.0), Track::absolute(30.0)])
                .row(Track::absolute(5.0)),
        ));
        let near = add(&mut tree, grid, (1.0, 1.0), GridPlacement::cell(0, 0));
        let far = add(&mut tree, grid, (1.0, 1.0), GridPlacement::cell(0, 2));
        tree.layout(grid, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        assert_eq!(tree.get(far).unwrap().position(), Point::new(30.0, 0.0));

        tree.grid_mut(grid)
            .unwrap()
            .set_column_definitions(vec![Track::absolute(40.0)]);
        tree.arrange(grid, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        assert_eq!(tree.get(near).unwrap().position(), Point::ORIGIN);

        tree.layout(grid, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        assert_eq!(tree.get(far).unwrap().position(), Point::ORIGIN);
    }

    #[test]
    fn test_zero_span_is_rejected() {
        let mut tree = ElementTree::new();
        let grid = tree.insert(Element::new(Grid::new()));
        let child = tree.insert(Element::leaf(Size::ZERO));
        let err = tree
            .add_grid_child(grid, child, GridPlacement::span(0, 0, 0, 1))
            .unwrap_err();
        assert!(matches!(err, LayoutError::InvalidSpan { row_span: 0, column_span: 1 }));
        assert!(tree.grid(grid).unwrap().items().is_empty());
    }

    #[test]
    fn test_zero_weight_star_is_zero() {
        let mut tree = ElementTree::new();
        let grid = tree.insert(Element::new(
            Grid::new().columns([Track::star(0.0), Track::absolute(10.0)]),
        ));
        tree.measure(grid, Size::new(100.0, 100.0), false).unwrap();
        assert_eq!(tree.grid(grid).unwrap().column_sizes(), vec![0.0, 10.0]);
    }

    #[test]
    fn test_star_falls_back_to_auto_when_unbounded() {
        let mut tree = ElementTree::new();
        let grid = tree.insert(Element::new(
            Grid::new().columns([Track::star(1.0), Track::star(3.0)]),
        ));
        add(&mut tree, grid, (25.0, 5.0), GridPlacement::cell(0, 0));
        let size = tree.measure(grid, Size::INFINITE, false).unwrap();
        assert_eq!(tree.grid(grid).unwrap().column_sizes(), vec![25.0, 0.0]);
        assert_eq!(size, Size::new(25.0, 5.0));
    }

    #[test]
    fn test_bound_track_reevaluated_each_measure() {
        let width = Rc::new(Cell::new(40.0f32));
        let source = width.clone();
        let mut tree = ElementTree::new();
        let grid = tree.insert(Element::new(
            Grid::new().column(Track::bound(TrackKind::Absolute, move || source.get())),
        ));
        assert_eq!(tree.measure(grid, Size::new(100.0, 100.0), false).unwrap().width, 40.0);
        width.set(70.0);
        assert_eq!(tree.measure(grid, Size::new(100.0, 100.0), false).unwrap().width, 70.0);
    }

    #[test]
    fn test_final_pass_stretches_children_into_cells() {
        let mut tree = ElementTree::new();
        let grid = tree.insert(Element::new(
            Grid::new()
                .columns([Track::absolute(50.0), Track::star(1.0)])
                .rows([Track::absolute(40.0)]),
        ));
        let child = tree.insert(
            Element::leaf(Size::new(10.0, 10.0))
                .margin(Margin::all(5.0))
                .align(Alignment::Stretch, Alignment::Stretch),
        );
        tree.add_grid_child(grid, child, GridPlacement::cell(0, 1)).unwrap();
        tree.layout(grid, Rect::new(0.0, 0.0, 150.0, 80.0)).unwrap();

        let el = tree.get(child).unwrap();
        assert_eq!(el.element_size(), Size::new(90.0, 30.0));
        assert_eq!(el.position(), Point::new(55.0, 5.0));
    }

    #[test]
    fn test_grid_ignores_own_stretch_and_keeps_track_sum() {
        let mut tree = ElementTree::new();
        let grid = tree.insert(
            Element::new(Grid::new().columns([Track::absolute(30.0)]).rows([Track::absolute(10.0)]))
                .align(Alignment::Stretch, Alignment::Stretch),
        );
        tree.layout(grid, Rect::new(0.0, 0.0, 300.0, 300.0)).unwrap();
        assert_eq!(tree.get(grid).unwrap().element_size(), Size::new(30.0, 10.0));
    }
}
