//! Core data structures: identifiers, terms, statements and byte utilities

pub mod encoding;
pub mod id;
pub mod statement;
pub mod term;
pub mod vocab;

pub use id::{Id, ID_LENGTH};
pub use statement::Statement;
pub use term::Term;
