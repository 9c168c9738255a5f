//! Per-element measure cache.
//!
//! Each element keeps a dirty flag and the inputs/outputs of its last
//! measure. A clean element asked for the same (available, dont_stretch)
//! pair returns the stored result without recursing into its subtree.
//!
//! Only the most recent call is kept. A parent that measures a child twice
//! per pass (natural, then final) leaves the child's subtree in the state of
//! the final call; serving an older entry would desynchronize descendants.

use crate::primitives::Size;

/// The inputs of a measure call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeasureKey {
    width_bits: u32,
    height_bits: u32,
    dont_stretch: bool,
}

impl MeasureKey {
    #[inline]
    pub fn new(available: Size, dont_stretch: bool) -> Self {
        Self {
            width_bits: available.width.to_bits(),
            height_bits: available.height.to_bits(),
            dont_stretch,
        }
    }
}

/// A cached measure result: the outer (margin-inclusive) size and the
/// element size it left behind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedMeasure {
    pub desired: Size,
    pub element_size: Size,
}

/// Dirty flag plus the last measure.
#[derive(Debug, Clone)]
pub struct MeasureCache {
    dirty: bool,
    entry: Option<(MeasureKey, CachedMeasure)>,
}

impl Default for MeasureCache {
    fn default() -> Self {
        Self {
            dirty: true,
            entry: None,
        }
    }
}

impl MeasureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark dirty. The next measure recomputes regardless of inputs.
    #[inline]
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Look up a result for these inputs.
    #[inline]
    pub fn get(&self, key: MeasureKey) -> Option<CachedMeasure> {
        if self.dirty {
            return None;
        }
        match self.entry {
            Some((k, cached)) if k == key => Some(cached),
            _ => None,
        }
    }

    /// Store a fresh result and clear the dirty flag.
    #[inline]
    pub fn store(&mut self, key: MeasureKey, cached: CachedMeasure) {
        self.entry = Some((key, cached));
        self.dirty = false;
    }
}
