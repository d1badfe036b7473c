//! Name Builder
//!
//! Computes the FQN a declaration node introduces. Anonymous declarations
//! (and members of anonymous classes) introduce no FQN.

use crate::ast::{Ast, NodeFlags, NodeId, NodeKind};
use crate::types::Fqn;

/// The FQN introduced by a declaration node, or `None` for anonymous
/// declarations and nodes that declare nothing.
pub fn defined_fqn(ast: &Ast, node: NodeId) -> Option<Fqn> {
    match ast.kind(node) {
        NodeKind::ClassDeclaration
        | NodeKind::InterfaceDeclaration
        | NodeKind::TraitDeclaration
        | NodeKind::NamespaceDefinition => ast.resolved_name(node).map(Fqn::new),

        NodeKind::FunctionDeclaration => ast.resolved_name(node).map(Fqn::function),

        NodeKind::MethodDeclaration => {
            let class = enclosing_class_like_fqn(ast, node)?;
            let name = ast.name(node)?;
            if ast.node(node).is_static() {
                Some(Fqn::static_member(&class, name, false, true))
            } else {
                Some(Fqn::instance_member(&class, name, true))
            }
        }

        // Property elements are `Variable` or `AssignmentExpression` nodes
        // directly under the property declaration.
        NodeKind::Variable => {
            let parent = ast.parent(node)?;
            if ast.kind(parent) != NodeKind::PropertyDeclaration {
                return None;
            }
            property_fqn(ast, parent, ast.name(node)?)
        }
        NodeKind::AssignmentExpression => {
            let parent = ast.parent(node)?;
            if ast.kind(parent) != NodeKind::PropertyDeclaration {
                return None;
            }
            let &lhs = ast.children(node).first()?;
            property_fqn(ast, parent, ast.name(lhs)?)
        }

        NodeKind::ConstElement => {
            let parent = ast.parent(node)?;
            match ast.kind(parent) {
                NodeKind::ConstDeclaration => ast.resolved_name(node).map(Fqn::new),
                NodeKind::ClassConstDeclaration => {
                    let class = enclosing_class_like_fqn(ast, node)?;
                    Some(Fqn::static_member(&class, ast.name(node)?, false, false))
                }
                _ => None,
            }
        }

        _ => None,
    }
}

/// FQN of the nearest class, interface or trait enclosing `node`; `None`
/// when it is anonymous or absent.
pub fn enclosing_class_like_fqn(ast: &Ast, node: NodeId) -> Option<Fqn> {
    let class = ast.enclosing_class_like(node)?;
    ast.resolved_name(class).map(Fqn::new)
}

fn property_fqn(ast: &Ast, declaration: NodeId, name: &str) -> Option<Fqn> {
    let class = enclosing_class_like_fqn(ast, declaration)?;
    if ast.node(declaration).flags.contains(NodeFlags::STATIC) {
        Some(Fqn::static_member(&class, name, true, false))
    } else {
        Some(Fqn::instance_member(&class, name, false))
    }
}
