//! stream/segment.rs
//! Declared vs. applied segment index.
//!
//! Boundaries are detected lazily: a declared change only materializes when the
//! next write consumes it, so a change with no following write never flushes.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentTracker {
    current: u64,
    declared: u64,
}

impl SegmentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Segment applied to the live context.
    pub fn current(&self) -> u64 {
        self.current
    }

    /// Most recent segment announced by the caller.
    pub fn declared(&self) -> u64 {
        self.declared
    }

    pub fn is_pending(&self) -> bool {
        self.current < self.declared
    }

    pub fn declare_change(&mut self) {
        self.declared += 1;
    }

    /// Returns true exactly once per pending boundary and advances `current`.
    pub fn consume_pending_boundary(&mut self) -> bool {
        if self.current < self.declared {
            self.current = self.declared;
            return true;
        }
        false
    }
}
