//! Engine configuration.
//!
//! Defaults picked up by an `ElementTree` and by the virtualized controls it
//! hosts. Deserializable so hosts can load it from their own settings file.

use serde::{Deserialize, Serialize};

pub const DEFAULT_ESTIMATED_ITEM_SIZE: f32 = 32.0;
pub const DEFAULT_SCROLLBAR_THICKNESS: f32 = 12.0;
pub const DEFAULT_TREE_ROW_HEIGHT: f32 = 32.0;
pub const DEFAULT_TREE_INDENTATION: f32 = 16.0;
pub const DEFAULT_TREE_EXPANDER_SIZE: f32 = 16.0;

/// Tunables for layout and virtualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Extent assumed for list items that have not been measured yet.
    pub estimated_item_size: f32,

    /// Thickness of the scrollbar strip drawn over virtualized content.
    pub scrollbar_thickness: f32,

    /// Row height for tree views.
    pub tree_row_height: f32,

    /// Horizontal indentation per tree depth level.
    pub tree_indentation: f32,

    /// Width of the expand/collapse glyph hit area in tree rows.
    pub tree_expander_size: f32,

    /// Measure every list item each pass to keep the cross-axis extent stable.
    ///
    /// When false only realized items are measured and the list's cross
    /// extent may change as items scroll in and out.
    pub measure_all_items: bool,

    /// Default spacing for newly created stacks.
    pub stack_spacing: f32,

    /// Emit a trace event for every measured and arranged element.
    pub trace_layout: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            estimated_item_size: DEFAULT_ESTIMATED_ITEM_SIZE,
            scrollbar_thickness: DEFAULT_SCROLLBAR_THICKNESS,
            tree_row_height: DEFAULT_TREE_ROW_HEIGHT,
            tree_indentation: DEFAULT_TREE_INDENTATION,
            tree_expander_size: DEFAULT_TREE_EXPANDER_SIZE,
            measure_all_items: true,
            stack_spacing: 0.0,
            trace_layout: false,
        }
    }
}
