//! Layout System for Arbor
//!
//! Retained element tree with a two-pass protocol. Containers measure their
//! children bottom-up to learn natural sizes, then arrange them top-down
//! into final rectangles. Hit-testing walks the same tree afterwards.
//!
//! # Architecture
//!
//! ```text
//! ElementTree (arena) -> Element (generic box model) -> ElementKind (dispatch)
//!                                                        Leaf | Stack | Grid | UniformGrid
//!                                                        ItemsList | TreeView (virtualized)
//! ```
//!
//! Results are cached per element and reused until the element, or one of
//! its descendants, is invalidated.

pub mod cache;
pub mod context;
pub mod element;
pub mod length;

// kind must come before the containers that dispatch through it
pub mod kind;
pub mod leaf;
pub mod stack;
pub mod grid;
pub mod uniform_grid;
pub mod items_list;
pub mod tree_view;
pub mod tree;

// Re-export core types
pub use context::{LayoutContext, LayoutWarning, PassStats};
pub use element::{Element, ElementId};
pub use kind::ElementKind;
pub use length::{Alignment, Orientation};
pub use tree::{ElementTree, HitResult};

// Re-export containers
pub use grid::{Grid, GridItem, GridPlacement, Track, TrackKind, TrackSize};
pub use items_list::{ItemTemplate, ItemsList, VisibleRange};
pub use leaf::{Leaf, SizeOracle};
pub use stack::Stack;
pub use tree_view::{NodeId, RowTemplate, TreeClick, TreeView, TreeViewNode, VisibleNode};
pub use uniform_grid::UniformGrid;
