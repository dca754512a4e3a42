//! Rule-based selectivity estimator
//!
//! Cardinalities come from a fixed decision table keyed on which positions
//! are bound and whether the predicate is a well-known vocabulary term. The
//! only live statistic is the statement counter, kept current by listening
//! to change events.

use std::sync::Arc;

use log::{debug, warn};

use crate::core::vocab::{rdf, ANNOTATION_PREDICATES, SCHEMA_PREDICATES};
use crate::core::Term;
use crate::error::{Error, Result};
use crate::notification::{ChangeEvent, ChangeListener};
use crate::statistics::{
    JoinExpression, RangePattern, SelectivityEstimator, TermPattern, UNKNOWN_CARDINALITY,
};
use crate::storage::counter::{Counter, CounterFactory, TRIPLE_COUNTER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PredicateKind {
    Type,
    Schema,
    Annotation,
    Other,
}

fn classify(predicate: Option<&Term>) -> PredicateKind {
    match predicate.and_then(Term::as_iri) {
        Some(rdf::TYPE) => PredicateKind::Type,
        Some(iri) if SCHEMA_PREDICATES.contains(&iri) => PredicateKind::Schema,
        Some(iri) if ANNOTATION_PREDICATES.contains(&iri) => PredicateKind::Annotation,
        _ => PredicateKind::Other,
    }
}

pub struct HeuristicSelectivityEstimator {
    triples: Arc<dyn Counter>,
}

impl HeuristicSelectivityEstimator {
    pub fn new(counters: &dyn CounterFactory) -> Result<Self> {
        let triples = counters.counter(TRIPLE_COUNTER).map_err(|e| {
            Error::Initialization(format!("cannot bind counter {}: {}", TRIPLE_COUNTER, e))
        })?;
        Ok(Self { triples })
    }

    fn record_removal(&self, count: i64) -> Result<()> {
        let current = self.triples.current()?;
        if current > 0 {
            self.triples.decrement(count.min(current))?;
        }
        Ok(())
    }
}

impl SelectivityEstimator for HeuristicSelectivityEstimator {
    fn triples_count(&self) -> i64 {
        self.triples.current().unwrap_or_else(|e| {
            warn!("Reading {} counter failed: {}", TRIPLE_COUNTER, e);
            -1
        })
    }

    fn triple_pattern_cardinality(&self, pattern: &TermPattern) -> f64 {
        let s = pattern.subject.is_some();
        let p = pattern.predicate.is_some();
        let o = pattern.object.is_some();

        if s && p && o {
            return 1.0;
        }
        match classify(pattern.predicate.as_ref()) {
            PredicateKind::Type => {
                return match (s, o) {
                    (true, _) => 1.0,
                    (false, true) => 10_000.0,
                    (false, false) => 1_000_000_000.0,
                }
            }
            PredicateKind::Schema => {
                return match (s, o) {
                    (true, _) => 2.0,
                    (false, true) => 10.0,
                    (false, false) => 1_000.0,
                }
            }
            PredicateKind::Annotation => {
                return match (s, o) {
                    (true, _) => 3.0,
                    (false, true) => 5.0,
                    (false, false) => 100_000.0,
                }
            }
            PredicateKind::Other => {}
        }
        match (s, p, o) {
            (true, true, false) => 20.0,
            (true, false, true) => 2.0,
            (false, true, true) => 500.0,
            (true, false, false) => 50.0,
            (false, false, true) => 200.0,
            (false, true, false) => 100_000.0,
            _ => UNKNOWN_CARDINALITY,
        }
    }

    fn range_pattern_cardinality(&self, pattern: &RangePattern) -> f64 {
        if pattern.subject.is_some() || pattern.is_equality() {
            return 1.0;
        }
        // TODO: scale open and bounded ranges by the width of the object range
        UNKNOWN_CARDINALITY
    }

    fn equi_join_cardinality(&self, _join: &JoinExpression) -> f64 {
        UNKNOWN_CARDINALITY
    }
}

impl ChangeListener for HeuristicSelectivityEstimator {
    fn on_event(&self, event: &ChangeEvent) -> Result<()> {
        match event {
            ChangeEvent::Added { count, .. } => self.triples.increment(*count),
            ChangeEvent::Removed { count, .. } => self.record_removal(*count),
            ChangeEvent::BatchStarted { source } | ChangeEvent::BatchFinished { source } => {
                debug!("Ignoring batch bracket from {}", source);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vocab::{owl, rdfs};
    use crate::storage::counter::MemoryCounterFactory;

    struct BrokenFactory;

    impl CounterFactory for BrokenFactory {
        fn counter(&self, _name: &str) -> Result<Arc<dyn Counter>> {
            Err(Error::Backend("counter table missing".to_string()))
        }
    }

    struct UnreadableCounter;

    impl Counter for UnreadableCounter {
        fn name(&self) -> &str {
            TRIPLE_COUNTER
        }
        fn current(&self) -> Result<i64> {
            Err(Error::Backend("offline".to_string()))
        }
        fn increment(&self, _by: i64) -> Result<()> {
            Ok(())
        }
        fn decrement(&self, _by: i64) -> Result<()> {
            Ok(())
        }
    }

    struct UnreadableFactory;

    impl CounterFactory for UnreadableFactory {
        fn counter(&self, _name: &str) -> Result<Arc<dyn Counter>> {
            Ok(Arc::new(UnreadableCounter))
        }
    }

    fn estimator() -> HeuristicSelectivityEstimator {
        HeuristicSelectivityEstimator::new(&MemoryCounterFactory::new()).unwrap()
    }

    fn term(iri: &str) -> Option<Term> {
        Some(Term::iri(iri))
    }

    #[test]
    fn test_schema_and_annotation_rows() {
        let estimator = estimator();
        let x = term("http://example.org/x");
        let cardinality = |s: &Option<Term>, p: &str, o: &Option<Term>| {
            estimator.triple_pattern_cardinality(&TermPattern::new(s.clone(), term(p), o.clone()))
        };

        assert_eq!(cardinality(&x, rdfs::SUB_CLASS_OF, &None), 2.0);
        assert_eq!(cardinality(&None, rdfs::DOMAIN, &x), 10.0);
        assert_eq!(cardinality(&None, rdfs::RANGE, &None), 1_000.0);
        assert_eq!(cardinality(&x, rdfs::LABEL, &None), 3.0);
        assert_eq!(cardinality(&None, owl::SAME_AS, &x), 5.0);
        assert_eq!(cardinality(&None, rdfs::COMMENT, &None), 100_000.0);
        assert_eq!(cardinality(&None, rdf::TYPE, &x), 10_000.0);
        assert_eq!(cardinality(&x, rdf::TYPE, &x), 1.0);
    }

    #[test]
    fn test_range_cardinality() {
        let estimator = estimator();
        let bounded = RangePattern { subject: term("http://example.org/x"), ..Default::default() };
        assert_eq!(estimator.range_pattern_cardinality(&bounded), 1.0);
        assert_eq!(estimator.range_pattern_cardinality(&RangePattern::default()), UNKNOWN_CARDINALITY);
    }

    #[test]
    fn test_join_is_unknown() {
        let join = JoinExpression {
            left: TermPattern::default(),
            right: TermPattern::default(),
            variables: vec!["x".to_string()],
        };
        assert_eq!(estimator().equi_join_cardinality(&join), UNKNOWN_CARDINALITY);
    }

    #[test]
    fn test_unbindable_counter_fails_initialization() {
        let result = HeuristicSelectivityEstimator::new(&BrokenFactory);
        assert!(matches!(result, Err(Error::Initialization(_))));
    }

    #[test]
    fn test_unreadable_counter_reports_minus_one() {
        let estimator = HeuristicSelectivityEstimator::new(&UnreadableFactory).unwrap();
        assert_eq!(estimator.triples_count(), -1);
    }

    #[test]
    fn test_removal_is_clamped() {
        let estimator = estimator();
        estimator.on_event(&ChangeEvent::Added { source: "t".into(), statements: vec![], count: 2 }).unwrap();
        estimator.on_event(&ChangeEvent::Removed { source: "t".into(), statements: vec![], count: 5 }).unwrap();
        assert_eq!(estimator.triples_count(), 0);
        estimator.on_event(&ChangeEvent::Removed { source: "t".into(), statements: vec![], count: 1 }).unwrap();
        assert_eq!(estimator.triples_count(), 0);
    }
}
