use std::collections::BTreeSet;

/// Addresses at which the engine pauses before executing.
///
/// Only consulted at instruction-fetch boundaries, never in the middle of an
/// instruction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BreakpointSet {
    addrs: BTreeSet<usize>,
}

impl BreakpointSet {
    /// Adds a breakpoint. Returns `false` when it was already set.
    pub fn add(&mut self, addr: usize) -> bool {
        self.addrs.insert(addr)
    }

    /// Removes a breakpoint. Returns `false` when none was set.
    pub fn remove(&mut self, addr: usize) -> bool {
        self.addrs.remove(&addr)
    }

    /// Removes every breakpoint.
    pub fn clear(&mut self) {
        self.addrs.clear();
    }

    /// Returns `true` when `addr` has a breakpoint.
    #[must_use]
    pub fn contains(&self, addr: usize) -> bool {
        self.addrs.contains(&addr)
    }

    /// Breakpoint addresses in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.addrs.iter().copied()
    }

    /// Number of breakpoints set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    /// Returns `true` when no breakpoint is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }
}

impl FromIterator<usize> for BreakpointSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            addrs: iter.into_iter().collect(),
        }
    }
}
