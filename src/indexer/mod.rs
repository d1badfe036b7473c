//! Indexer
//!
//! Definitions and references for the whole workspace, keyed by FQN. The
//! traverser turns one parsed document into index entries; the index
//! answers lookups for the resolver, the inferrer and the feature
//! handlers.

pub mod definition;
pub mod index;
pub mod traverser;

pub use definition::{create_definition, Definition};
pub use index::{Index, ProjectIndex, ReadableIndex};
pub use traverser::{index_document, IndexTier};
