//! Explicit per-operation lookup context
//!
//! Callers create one context per session or operation and pass it through
//! every dictionary call; the decorators record which tier answered.

/// The dictionary tier that resolved a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBy {
    KnownTerms,
    FirstLevelCache,
    CumulativeCache,
    Backend,
}

#[derive(Debug, Clone, Default)]
pub struct LookupContext {
    session: u64,
    resolved_by: Option<ResolvedBy>,
    backend_lookups: u64,
}

impl LookupContext {
    pub fn new(session: u64) -> Self {
        Self { session, ..Self::default() }
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    /// Tier that answered the most recent successful lookup
    pub fn resolved_by(&self) -> Option<ResolvedBy> {
        self.resolved_by
    }

    /// Number of lookups that reached the backing store through this context
    pub fn backend_lookups(&self) -> u64 {
        self.backend_lookups
    }

    pub(crate) fn record(&mut self, tier: ResolvedBy) {
        self.resolved_by = Some(tier);
    }

    pub(crate) fn record_backend_lookup(&mut self) {
        self.backend_lookups += 1;
    }
}
