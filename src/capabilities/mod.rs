//! Feature Handlers
//!
//! The consumers the core exists for: go-to-definition, hover and
//! find-references over a (document, position) pair.

pub mod definitions;
pub mod hover;
pub mod references;

pub use definitions::goto_definition;
pub use hover::hover;
pub use references::find_references;
