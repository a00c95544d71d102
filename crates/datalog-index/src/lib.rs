//! Concurrent fact storage
//!
//! Two shared structures back the saturators:
//!
//! - [`FactIndexer`]: the set of derived ground atoms, sharded by predicate
//!   and indexed by bound-argument position for pattern lookups
//! - [`RedundancyTrie`]: the set of derivation fingerprints, deciding
//!   exactly once per fact which worker derived it first

pub mod indexer;
pub mod trie;

pub use indexer::FactIndexer;
pub use trie::RedundancyTrie;
