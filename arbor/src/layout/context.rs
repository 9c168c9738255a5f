//! Layout pass context for tracing and diagnostics.
//!
//! The LayoutContext carries per-pass bookkeeping through the recursion:
//! - Depth in the element tree (for indented trace output)
//! - Counters for measure calls, cache hits and arrange calls
//! - Overflow warnings collected while measuring
//!
//! A measure entered at depth 0 starts a new pass and resets everything.

use crate::primitives::{Point, Rect, Size};

use super::element::ElementId;

/// Counters for a single layout pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Measure calls that recomputed.
    pub measure_calls: usize,
    /// Measure calls served from an element's cache.
    pub cache_hits: usize,
    /// Arrange calls.
    pub arrange_calls: usize,
}

/// A layout warning.
#[derive(Debug, Clone)]
pub struct LayoutWarning {
    pub depth: u32,
    pub element: ElementId,
    pub kind: &'static str,
    pub message: String,
}

/// Per-pass state owned by the `ElementTree`.
#[derive(Debug, Default)]
pub struct LayoutContext {
    depth: u32,
    trace: bool,
    stats: PassStats,
    warnings: Vec<LayoutWarning>,
}

impl LayoutContext {
    pub fn new(trace: bool) -> Self {
        Self {
            trace,
            ..Self::default()
        }
    }

    /// Enter a measure. Resets the pass when entered at the root.
    pub fn enter_measure(&mut self) {
        if self.depth == 0 {
            self.stats = PassStats::default();
            self.warnings.clear();
        }
        self.depth += 1;
        self.stats.measure_calls += 1;
    }

    /// Enter an arrange.
    pub fn enter_arrange(&mut self) {
        self.depth += 1;
        self.stats.arrange_calls += 1;
    }

    /// Exit the current scope.
    pub fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Record a measure served from cache.
    pub fn record_hit(&mut self) {
        if self.depth == 0 {
            self.stats = PassStats::default();
            self.warnings.clear();
        }
        self.stats.cache_hits += 1;
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Log a measure decision.
    pub fn log_measure(&self, kind: &'static str, id: ElementId, available: Size, result: Size) {
        if self.trace {
            tracing::trace!(
                depth = self.depth,
                ?id,
                kind,
                "measure {{w:{:.1}, h:{:.1}}} -> {{w:{:.1}, h:{:.1}}}",
                available.width,
                available.height,
                result.width,
                result.height,
            );
        }
    }

    /// Log an arrange decision.
    pub fn log_arrange(&self, kind: &'static str, id: ElementId, bounds: Rect, position: Point) {
        if self.trace {
            tracing::trace!(
                depth = self.depth,
                ?id,
                kind,
                "arrange [{:.1}, {:.1}, {:.1}x{:.1}] -> ({:.1}, {:.1})",
                bounds.x,
                bounds.y,
                bounds.width,
                bounds.height,
                position.x,
                position.y,
            );
        }
    }

    /// Warn when content exceeds a finite available extent.
    pub fn warn_oversized(
        &mut self,
        id: ElementId,
        kind: &'static str,
        actual: f32,
        max: f32,
        axis: &str,
    ) {
        if actual > max && max.is_finite() {
            let message = format!("{} produced {:.0} {} but only {:.0} available", kind, actual, axis, max);
            tracing::warn!(depth = self.depth, ?id, "{}", message);
            self.warnings.push(LayoutWarning {
                depth: self.depth,
                element: id,
                kind,
                message,
            });
        }
    }

    pub fn stats(&self) -> PassStats {
        self.stats
    }

    pub fn warnings(&self) -> &[LayoutWarning] {
        &self.warnings
    }

    /// Take collected warnings.
    pub fn take_warnings(&mut self) -> Vec<LayoutWarning> {
        std::mem::take(&mut self.warnings)
    }
}
