//! PHPDoc Adapter
//!
//! Turns a node's attached `/** ... */` comment into tagged sections the
//! inferrer and the definition builder consume: `@param` / `@return` /
//! `@var` with variable-name and type fields, plus the summary text shown
//! on hover.

pub mod parser;
pub mod types;

pub use types::{DocBlock, DocTag};
