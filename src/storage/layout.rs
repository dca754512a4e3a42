//! Index layout and pattern routing
//!
//! Every statement is stored once per permutation index, keyed by its ids
//! reordered into that index's position order. A pattern is answered by
//! the index whose leading positions are exactly the bound ones, so the
//! bound ids form a contiguous key prefix and the lookup is one range scan.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::encoding::concat;
use crate::core::Id;
use crate::error::{Error, Result};

/// Canonical tuple position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Subject,
    Predicate,
    Object,
    Context,
}

impl Position {
    /// Slot of this position in a canonical (s, p, o[, c]) tuple
    pub const fn slot(self) -> usize {
        match self {
            Position::Subject => 0,
            Position::Predicate => 1,
            Position::Object => 2,
            Position::Context => 3,
        }
    }
}

/// A named physical index over one ordering of the tuple positions
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct PermutationIndex {
    name: &'static str,
    order: &'static [Position],
}

use Position::{Context as C, Object as O, Predicate as P, Subject as S};

pub const SPO: PermutationIndex = PermutationIndex { name: "SPO", order: &[S, P, O] };
pub const POS: PermutationIndex = PermutationIndex { name: "POS", order: &[P, O, S] };
pub const OSP: PermutationIndex = PermutationIndex { name: "OSP", order: &[O, S, P] };

pub const SPOC: PermutationIndex = PermutationIndex { name: "SPOC", order: &[S, P, O, C] };
pub const OSPC: PermutationIndex = PermutationIndex { name: "OSPC", order: &[O, S, P, C] };
pub const POCS: PermutationIndex = PermutationIndex { name: "POCS", order: &[P, O, C, S] };
pub const OCSP: PermutationIndex = PermutationIndex { name: "OCSP", order: &[O, C, S, P] };
pub const CSPO: PermutationIndex = PermutationIndex { name: "CSPO", order: &[C, S, P, O] };
pub const CPSO: PermutationIndex = PermutationIndex { name: "CPSO", order: &[C, P, S, O] };

static TRIPLE_INDEXES: [&PermutationIndex; 3] = [&SPO, &POS, &OSP];
static QUAD_INDEXES: [&PermutationIndex; 6] = [&SPOC, &OSPC, &POCS, &OCSP, &CSPO, &CPSO];

impl PermutationIndex {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn order(&self) -> &'static [Position] {
        self.order
    }

    pub fn arity(&self) -> usize {
        self.order.len()
    }

    /// Reorder a canonical tuple into this index's key order
    pub fn to_native_order<T: Clone>(&self, tuple: &[T]) -> Result<Vec<T>> {
        self.check_arity(tuple.len())?;
        Ok(self.order.iter().map(|position| tuple[position.slot()].clone()).collect())
    }

    /// Inverse of [`to_native_order`](Self::to_native_order)
    pub fn to_canonical_order<T: Clone>(&self, tuple: &[T]) -> Result<Vec<T>> {
        self.check_arity(tuple.len())?;
        let mut canonical: Vec<Option<T>> = vec![None; tuple.len()];
        for (value, position) in tuple.iter().zip(self.order) {
            canonical[position.slot()] = Some(value.clone());
        }
        canonical
            .into_iter()
            .collect::<Option<Vec<T>>>()
            .ok_or_else(|| Error::InvalidPattern(format!("index {} does not cover every slot", self.name)))
    }

    /// Row key of a concrete statement in this index
    pub fn encode_key(&self, ids: &[Id]) -> Result<Vec<u8>> {
        let native = self.to_native_order(ids)?;
        let parts: Vec<&[u8]> = native.iter().map(|id| id.as_bytes().as_slice()).collect();
        Ok(concat(&parts))
    }

    /// Canonical ids of a row key read back from this index
    pub fn decode_key(&self, key: &[u8]) -> Result<Vec<Id>> {
        let native = crate::core::encoding::decode_ids(key)
            .ok_or_else(|| Error::Backend(format!("malformed row key in index {}", self.name)))?;
        self.to_canonical_order(&native)
    }

    /// Key prefix covering every row that matches `pattern`
    ///
    /// Only the leading bound ids in this index's order contribute, so the
    /// prefix is exact when this index was chosen by [`Layout::select_index`].
    pub fn scan_prefix(&self, pattern: &[Option<Id>]) -> Result<Vec<u8>> {
        let native = self.to_native_order(pattern)?;
        let bound: Vec<&[u8]> = native
            .iter()
            .map_while(|slot| slot.as_ref().map(|id| id.as_bytes().as_slice()))
            .collect();
        Ok(concat(&bound))
    }

    fn check_arity(&self, len: usize) -> Result<()> {
        if len != self.arity() {
            return Err(Error::InvalidPattern(format!(
                "index {} expects {} positions, got {}",
                self.name,
                self.arity(),
                len
            )));
        }
        Ok(())
    }

    /// Whether the first `count` positions of this index are all bound
    fn leads_with(&self, bound: &[bool], count: usize) -> bool {
        self.order[..count].iter().all(|position| bound[position.slot()])
    }
}

impl fmt::Display for PermutationIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Which statement shape the store holds, and with it the index catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Triples,
    Quads,
}

impl Layout {
    pub fn arity(&self) -> usize {
        match self {
            Layout::Triples => 3,
            Layout::Quads => 4,
        }
    }

    /// The full index catalog, default index first
    pub fn indexes(&self) -> &'static [&'static PermutationIndex] {
        match self {
            Layout::Triples => &TRIPLE_INDEXES,
            Layout::Quads => &QUAD_INDEXES,
        }
    }

    pub fn default_index(&self) -> &'static PermutationIndex {
        self.indexes()[0]
    }

    pub fn index_by_name(&self, name: &str) -> Option<&'static PermutationIndex> {
        self.indexes().iter().copied().find(|index| index.name == name)
    }

    /// Pick the index whose leading positions are exactly the bound ones
    ///
    /// Fully bound and fully unbound patterns go to the default index. The
    /// result only depends on which slots are bound.
    pub fn select_index<T>(&self, pattern: &[Option<T>]) -> Result<&'static PermutationIndex> {
        if pattern.len() != self.arity() {
            return Err(Error::InvalidPattern(format!(
                "{:?} layout expects {} positions, got {}",
                self,
                self.arity(),
                pattern.len()
            )));
        }
        let bound: Vec<bool> = pattern.iter().map(Option::is_some).collect();
        let bound_count = bound.iter().filter(|b| **b).count();
        if bound_count == 0 || bound_count == self.arity() {
            return Ok(self.default_index());
        }
        self.indexes()
            .iter()
            .copied()
            .find(|index| index.leads_with(&bound, bound_count))
            .ok_or_else(|| {
                Error::InvalidPattern(format!("no {:?} index covers bound slots {:?}", self, bound))
            })
    }

    /// Check that every bound/unbound combination has an index with all
    /// wildcards trailing
    pub fn coverage_holds(&self) -> bool {
        let arity = self.arity();
        (0u32..1 << arity).all(|mask| {
            let pattern: Vec<Option<()>> =
                (0..arity).map(|slot| (mask & (1 << slot) != 0).then_some(())).collect();
            let bound_count = mask.count_ones() as usize;
            match self.select_index(&pattern) {
                Ok(index) => {
                    let bound: Vec<bool> = pattern.iter().map(Option::is_some).collect();
                    index.leads_with(&bound, bound_count)
                }
                Err(_) => false,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[u64]) -> Vec<Id> {
        values.iter().map(|v| Id::from_u64(*v)).collect()
    }

    #[test]
    fn test_catalogs() {
        let triples: Vec<&str> = Layout::Triples.indexes().iter().map(|i| i.name()).collect();
        assert_eq!(triples, vec!["SPO", "POS", "OSP"]);
        let quads: Vec<&str> = Layout::Quads.indexes().iter().map(|i| i.name()).collect();
        assert_eq!(quads, vec!["SPOC", "OSPC", "POCS", "OCSP", "CSPO", "CPSO"]);
        assert_eq!(Layout::Quads.index_by_name("CPSO"), Some(&CPSO));
        assert_eq!(Layout::Triples.index_by_name("SPOC"), None);
    }

    #[test]
    fn test_triple_routing() {
        let s = Some(1);
        assert_eq!(Layout::Triples.select_index(&[s, None, None]).unwrap(), &SPO);
        assert_eq!(Layout::Triples.select_index(&[s, s, None]).unwrap(), &SPO);
        assert_eq!(Layout::Triples.select_index(&[None, s, None]).unwrap(), &POS);
        assert_eq!(Layout::Triples.select_index(&[None, s, s]).unwrap(), &POS);
        assert_eq!(Layout::Triples.select_index(&[None, None, s]).unwrap(), &OSP);
        assert_eq!(Layout::Triples.select_index(&[s, None, s]).unwrap(), &OSP);
        assert_eq!(Layout::Triples.select_index::<i32>(&[None, None, None]).unwrap(), &SPO);
        assert_eq!(Layout::Triples.select_index(&[s, s, s]).unwrap(), &SPO);
    }

    #[test]
    fn test_quad_routing() {
        let b = Some(1);
        assert_eq!(Layout::Quads.select_index(&[None, None, None, b]).unwrap(), &CSPO);
        assert_eq!(Layout::Quads.select_index(&[None, b, None, b]).unwrap(), &CPSO);
        assert_eq!(Layout::Quads.select_index(&[b, None, None, b]).unwrap(), &CSPO);
        assert_eq!(Layout::Quads.select_index(&[None, None, b, b]).unwrap(), &OCSP);
        assert_eq!(Layout::Quads.select_index(&[b, None, b, b]).unwrap(), &OCSP);
        assert_eq!(Layout::Quads.select_index(&[None, b, b, None]).unwrap(), &POCS);
    }

    #[test]
    fn test_arity_mismatch() {
        let result = Layout::Triples.select_index(&[Some(1), None, None, None]);
        assert!(matches!(result, Err(Error::InvalidPattern(_))));
        assert!(SPO.to_native_order(&[1, 2]).is_err());
    }

    #[test]
    fn test_coverage() {
        assert!(Layout::Triples.coverage_holds());
        assert!(Layout::Quads.coverage_holds());
    }

    #[test]
    fn test_key_round_trip() {
        let statement = ids(&[10, 20, 30, 40]);
        for index in Layout::Quads.indexes() {
            let key = index.encode_key(&statement).unwrap();
            assert_eq!(key.len(), 4 * crate::core::ID_LENGTH);
            assert_eq!(index.decode_key(&key).unwrap(), statement);
        }
    }

    #[test]
    fn test_scan_prefix_takes_leading_bound_ids() {
        let [s, p, o] = [Id::from_u64(1), Id::from_u64(2), Id::from_u64(3)];
        let prefix = POS.scan_prefix(&[None, Some(p), Some(o)]).unwrap();
        assert_eq!(prefix, concat(&[p.as_bytes().as_slice(), o.as_bytes().as_slice()]));

        // The unbound predicate stops the prefix in SPO order
        let prefix = SPO.scan_prefix(&[Some(s), None, Some(o)]).unwrap();
        assert_eq!(prefix, s.as_bytes().to_vec());

        assert!(SPO.scan_prefix(&[None, None, None]).unwrap().is_empty());
    }
}
