//! UniformGrid - equal-cell grid.
//!
//! Every cell has the same size: the largest child measured against an
//! equal share of the available space. Row and column counts are derived
//! from the child count unless set explicitly. Children fill cells in
//! row-major order.

use crate::error::Result;
use crate::primitives::{Rect, Size};

use super::element::ElementId;
use super::tree::ElementTree;

/// A grid of equally sized cells.
#[derive(Debug, Default)]
pub struct UniformGrid {
    children: Vec<ElementId>,
    /// Requested rows; 0 derives the count.
    rows: usize,
    /// Requested columns; 0 derives the count.
    columns: usize,
    resolved: (usize, usize),
}

impl UniformGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub(crate) fn push_child(&mut self, child: ElementId) {
        self.children.push(child);
    }

    pub(crate) fn detach(&mut self, child: ElementId) -> bool {
        let before = self.children.len();
        self.children.retain(|c| *c != child);
        self.children.len() != before
    }

    /// (rows, columns) for the current child count.
    pub fn dimensions(&self) -> (usize, usize) {
        let n = self.children.len();
        match (self.rows, self.columns) {
            (0, 0) if n == 0 => (0, 0),
            (0, 0) => {
                let columns = (n as f32).sqrt().ceil() as usize;
                (n.div_ceil(columns), columns)
            }
            (0, columns) => (n.div_ceil(columns).max(1), columns),
            (rows, 0) => (rows, n.div_ceil(rows).max(1)),
            (rows, columns) => (rows, columns),
        }
    }

    /// Row and column of the child at `index` (row-major).
    pub fn cell_of(&self, index: usize) -> Option<(usize, usize)> {
        let (rows, columns) = self.resolved;
        if columns == 0 || index >= rows * columns {
            return None;
        }
        Some((index / columns, index % columns))
    }

    pub(crate) fn measure(
        &mut self,
        tree: &mut ElementTree,
        available: Size,
        dont_stretch: bool,
    ) -> Result<Size> {
        self.resolved = self.dimensions();
        let (rows, columns) = self.resolved;
        if rows == 0 || columns == 0 {
            return Ok(Size::ZERO);
        }

        let cell_available = Size::new(available.width / columns as f32, available.height / rows as f32);
        let mut cell = Size::ZERO;
        for &child in &self.children {
            let desired = tree.measure(child, cell_available, dont_stretch)?;
            cell = cell.max(desired);
        }

        Ok(Size::new(cell.width * columns as f32, cell.height * rows as f32))
    }

    pub(crate) fn arrange(&mut self, tree: &mut ElementTree, content: Rect) -> Result<()> {
        let (rows, columns) = self.resolved;
        if rows == 0 || columns == 0 {
            return Ok(());
        }
        let cell_width = content.width / columns as f32;
        let cell_height = content.height / rows as f32;
        for (index, &child) in self.children.iter().enumerate() {
            let slot = match self.cell_of(index) {
                Some((row, column)) => Rect::new(
                    content.x + column as f32 * cell_width,
                    content.y + row as f32 * cell_height,
                    cell_width,
                    cell_height,
                ),
                // Overflow children beyond an explicit rows x columns get no space
                None => Rect::from_origin_size(content.origin(), Size::ZERO),
            };
            tree.arrange(child, slot)?;
        }
        Ok(())
    }
}
