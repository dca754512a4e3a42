//! Term dictionary: bidirectional mapping between RDF terms and identifiers
//!
//! Implementations are stacked as decorators, outermost first:
//!
//! ```text
//! KnownTermsDictionary -> CacheDictionary (first level) -> CacheDictionary (cumulative) -> PersistentDictionary -> TermIndex
//! ```
//!
//! A `None` term or id stands for an unbound pattern position. Every layer
//! answers it with `None` without touching a cache or the backing store.

pub mod cache;
pub mod context;
pub mod known;
pub mod persistent;
pub mod term_index;

pub use cache::{CacheDictionary, CacheDictionaryBuilder, CacheStatistics};
pub use context::{LookupContext, ResolvedBy};
pub use known::KnownTermsDictionary;
pub use persistent::PersistentDictionary;
pub use term_index::{MemoryTermIndex, TermIndex};

use crate::core::{Id, Term};
use crate::error::Result;

pub trait Dictionary: Send + Sync {
    /// One-time setup; failures are reported as `Error::Initialization`
    fn initialise(&self) -> Result<()> {
        Ok(())
    }

    /// Identifier of a term, minting one when `create_if_missing` is set
    fn get_id(
        &self,
        ctx: &mut LookupContext,
        term: Option<&Term>,
        create_if_missing: bool,
    ) -> Option<Id>;

    /// Term behind an identifier
    fn get_value(
        &self,
        ctx: &mut LookupContext,
        id: Option<&Id>,
        create_if_missing: bool,
    ) -> Option<Term>;

    fn remove_value(&self, ctx: &mut LookupContext, term: &Term);

    /// Release resources; calling it more than once is harmless
    fn close(&self);
}
