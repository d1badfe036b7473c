//! Semantic Resolution
//!
//! The name-level half of the core: building the FQN a declaration
//! introduces, resolving a reference back to the FQN it targets, and
//! finding the definition node of a local variable. Type questions live in
//! `crate::inferrer`; the two sides call into each other for member
//! dispatch.

pub mod defined;
pub mod reference;
pub mod scope;

pub use defined::{defined_fqn, enclosing_class_like_fqn};
pub use reference::reference_to_fqn;
pub use scope::find_variable_definition;

use crate::ast::{Ast, NodeId, NodeKind};
use crate::types::Fqn;

/// FQN of the nearest enclosing `class` declaration, used to resolve
/// `$this`, `self`, `static` and `parent`. `None` inside anonymous classes
/// and outside any class.
pub fn enclosing_class_fqn(ast: &Ast, node: NodeId) -> Option<Fqn> {
    let class = ast.enclosing_class(node)?;
    ast.resolved_name(class).map(Fqn::new)
}

/// Base classes / base interfaces of a class-like declaration, in
/// declaration order. At most one for classes, any number for interfaces.
pub fn class_extends(ast: &Ast, class: NodeId) -> Vec<Fqn> {
    ast.children(class)
        .iter()
        .filter(|&&child| ast.kind(child) == NodeKind::ClassBaseClause)
        .flat_map(|&clause| ast.children(clause).iter())
        .filter_map(|&name| ast.resolved_name(name))
        .map(Fqn::new)
        .collect()
}

/// The extends list of the class enclosing `node`.
pub fn enclosing_class_extends(ast: &Ast, node: NodeId) -> Vec<Fqn> {
    match ast.enclosing_class(node) {
        Some(class) => class_extends(ast, class),
        None => Vec::new(),
    }
}
