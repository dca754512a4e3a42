pub mod counter;
pub mod layout;
pub mod permutation_store;
