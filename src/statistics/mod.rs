//! Cardinality estimation for query planning
//!
//! Estimates are relative costs: the planner only compares them, so a
//! consistent order between pattern shapes matters more than accuracy.

pub mod heuristic;

pub use heuristic::HeuristicSelectivityEstimator;

use crate::core::Term;

/// Cardinality reported when nothing is known about a pattern
pub const UNKNOWN_CARDINALITY: f64 = 1_000_000_000.0;

/// A triple pattern over terms; `None` slots are variables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermPattern {
    pub subject: Option<Term>,
    pub predicate: Option<Term>,
    pub object: Option<Term>,
    pub context: Option<Term>,
}

impl TermPattern {
    pub fn new(subject: Option<Term>, predicate: Option<Term>, object: Option<Term>) -> Self {
        Self { subject, predicate, object, context: None }
    }

    pub fn with_context(mut self, context: Term) -> Self {
        self.context = Some(context);
        self
    }

    /// Build from canonical (s, p, o[, c]) slots
    pub fn from_slots(slots: &[Option<Term>]) -> Self {
        let slot = |i: usize| slots.get(i).cloned().flatten();
        Self { subject: slot(0), predicate: slot(1), object: slot(2), context: slot(3) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeBound {
    pub value: Term,
    pub inclusive: bool,
}

/// A subject/predicate pattern whose object is constrained to a range
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangePattern {
    pub subject: Option<Term>,
    pub predicate: Option<Term>,
    pub lower: Option<RangeBound>,
    pub upper: Option<RangeBound>,
}

impl RangePattern {
    /// Both ends are the same inclusive value
    pub fn is_equality(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Some(lower), Some(upper)) => {
                lower.inclusive && upper.inclusive && lower.value == upper.value
            }
            _ => false,
        }
    }
}

/// Two patterns joined on shared variables
#[derive(Debug, Clone, PartialEq)]
pub struct JoinExpression {
    pub left: TermPattern,
    pub right: TermPattern,
    pub variables: Vec<String>,
}

pub trait SelectivityEstimator: Send + Sync {
    /// Statements currently in the store, or -1 when the count is unavailable
    fn triples_count(&self) -> i64;

    fn triple_pattern_cardinality(&self, pattern: &TermPattern) -> f64;

    fn range_pattern_cardinality(&self, pattern: &RangePattern) -> f64;

    fn equi_join_cardinality(&self, join: &JoinExpression) -> f64;
}
