//! PHP Parser
//!
//! The frontend: lexer, recursive-descent grammar and the parsed document
//! wrapper. The grammar produces the arena AST directly and computes
//! resolved names in the same pass, so the resolver downstream never sees
//! raw alias-dependent names.

pub mod document;
pub mod grammar;
pub mod lexer;

pub use document::PhpDocument;
pub use grammar::{parse, Parse, ParseError};
