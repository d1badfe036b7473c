pub mod ast;
pub mod capabilities;
pub mod config;
pub mod indexer;
pub mod inferrer;
pub mod parser;
pub mod phpdoc;
pub mod resolver;
pub mod server;
pub mod types;

#[cfg(test)]
mod test;

// Re-export the main components for easier access in tests
pub use indexer::{ProjectIndex, ReadableIndex};
pub use parser::PhpDocument;
pub use server::PhpLanguageServer;
