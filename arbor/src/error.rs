//! Layout error types.
//!
//! Only programming errors surface here. Degenerate numeric input (negative
//! sizes, zero weights, empty collections) is clamped where it occurs.

use thiserror::Error;

use crate::layout::ElementId;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("unknown element: {0:?}")]
    UnknownElement(ElementId),

    #[error("element {element:?} is a {kind}, which does not accept this operation")]
    NotAContainer {
        element: ElementId,
        kind: &'static str,
    },

    #[error("invalid grid span: {row_span} rows x {column_span} columns (spans must be >= 1)")]
    InvalidSpan { row_span: usize, column_span: usize },

    #[error("item template returned no element for index {index}")]
    MissingTemplate { index: usize },

    #[error("virtualized control has items but no item template")]
    NoTemplate,

    #[error("stale tree node handle")]
    UnknownNode,

    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    CycleDetected { parent: ElementId, child: ElementId },
}

pub type Result<T, E = LayoutError> = std::result::Result<T, E>;
