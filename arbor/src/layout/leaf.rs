//! Leaf elements.
//!
//! A leaf has no children. Its content size comes from a natural-size
//! oracle: either a fixed size or a callback that receives the available
//! content size (text shaping, image decoding and the like live behind it).

use std::fmt;

use crate::primitives::Size;

/// Natural-size callback.
pub type SizeOracle = Box<dyn Fn(Size) -> Size>;

enum NaturalSize {
    Fixed(Size),
    Oracle(SizeOracle),
}

/// A childless element.
pub struct Leaf {
    natural: NaturalSize,
}

impl Default for Leaf {
    fn default() -> Self {
        Self::fixed(Size::ZERO)
    }
}

impl Leaf {
    /// A leaf that always reports `size`.
    pub fn fixed(size: Size) -> Self {
        Self {
            natural: NaturalSize::Fixed(size),
        }
    }

    /// A leaf whose natural size depends on the available content size.
    pub fn measured(oracle: impl Fn(Size) -> Size + 'static) -> Self {
        Self {
            natural: NaturalSize::Oracle(Box::new(oracle)),
        }
    }

    /// Natural size for the given available content size.
    pub fn natural_size(&self, available: Size) -> Size {
        match &self.natural {
            NaturalSize::Fixed(size) => *size,
            NaturalSize::Oracle(oracle) => oracle(available),
        }
        .sanitized()
    }

    /// Replace a fixed natural size. Oracles are swapped for the fixed value.
    pub fn set_size(&mut self, size: Size) {
        self.natural = NaturalSize::Fixed(size);
    }
}

impl fmt::Debug for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.natural {
            NaturalSize::Fixed(size) => f.debug_tuple("Leaf").field(size).finish(),
            NaturalSize::Oracle(_) => f.write_str("Leaf(<oracle>)"),
        }
    }
}
