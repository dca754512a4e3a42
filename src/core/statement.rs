use serde::{Deserialize, Serialize};

use crate::core::id::Id;
use crate::error::{Error, Result};

/// A fully bound statement in canonical (subject, predicate, object[, context]) order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statement {
    Triple([Id; 3]),
    Quad([Id; 4]),
}

impl Statement {
    pub fn triple(subject: Id, predicate: Id, object: Id) -> Self {
        Statement::Triple([subject, predicate, object])
    }

    pub fn quad(subject: Id, predicate: Id, object: Id, context: Id) -> Self {
        Statement::Quad([subject, predicate, object, context])
    }

    /// Build a statement from 3 or 4 identifiers, none of which may be `NOT_SET`
    pub fn from_ids(ids: &[Id]) -> Result<Self> {
        if ids.iter().any(|id| !id.is_set()) {
            return Err(Error::InvalidPattern(
                "a concrete statement cannot hold an unset identifier".to_string(),
            ));
        }
        match ids {
            [s, p, o] => Ok(Statement::triple(*s, *p, *o)),
            [s, p, o, c] => Ok(Statement::quad(*s, *p, *o, *c)),
            _ => Err(Error::InvalidPattern(format!(
                "statements hold 3 or 4 identifiers, got {}",
                ids.len()
            ))),
        }
    }

    pub fn ids(&self) -> &[Id] {
        match self {
            Statement::Triple(ids) => ids,
            Statement::Quad(ids) => ids,
        }
    }

    pub fn arity(&self) -> usize {
        self.ids().len()
    }

    /// The statement as a pattern with every slot bound
    pub fn as_pattern(&self) -> Vec<Option<Id>> {
        self.ids().iter().copied().map(Some).collect()
    }
}
