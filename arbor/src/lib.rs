//! Arbor: Retained-Mode Layout and Virtualization Engine
//!
//! Arbor sizes and positions a tree of rectangular elements:
//! - Two-pass Measure/Arrange protocol with margins, alignment and stretch
//! - Stack, track-based Grid and UniformGrid containers
//! - Virtualized flat lists and lazily expanded trees that realize only
//!   the rows intersecting the viewport
//! - Hit-testing over the arranged tree
//!
//! Rendering, input dispatch and text shaping belong to the host.
//!
//! # Usage
//!
//! ```
//! use arbor::{Element, ElementTree, Rect, Size, Stack};
//!
//! let mut tree = ElementTree::new();
//! let root = tree.insert(Element::new(Stack::vertical().spacing(4.0)));
//! let child = tree.insert(Element::leaf(Size::new(80.0, 20.0)));
//! tree.add_child(root, child).unwrap();
//!
//! tree.layout(root, Rect::new(0.0, 0.0, 320.0, 240.0)).unwrap();
//! assert_eq!(tree.get(child).unwrap().element_size(), Size::new(80.0, 20.0));
//! ```

// Core primitives
pub mod primitives;
pub mod error;
pub mod config;

// Layout system
pub mod layout;

// State helpers
pub mod collection;
pub mod scroll_state;

// Re-export core types
pub use primitives::{Margin, Point, Rect, Size};
pub use error::{LayoutError, Result};
pub use config::LayoutConfig;
pub use collection::{CollectionChange, Item, ItemKey, ItemsSource, ObservableCollection, item};
pub use scroll_state::ScrollbarState;
pub use layout::{
    Alignment, Element, ElementId, ElementKind, ElementTree, Grid, GridPlacement, HitResult,
    ItemsList, Leaf, NodeId, Orientation, Stack, Track, TrackKind, TreeClick, TreeView,
    UniformGrid,
};
