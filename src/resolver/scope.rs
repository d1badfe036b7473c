//! Variable Scope Resolver
//!
//! Intra-function walk that finds the node introducing a local variable
//! name: a parameter, a plain `=` assignment in a preceding statement, or a
//! closure capture. The walk never leaks out of the enclosing function
//! except through captures.

use crate::ast::{Ast, NodeId, NodeKind, Operator};

/// Finds the definition node for a variable reference: the `Parameter`,
/// `AssignmentExpression` or `UseVariableName` that introduces its name.
///
/// Starting from a `UseVariableName` the walk continues in the scope
/// surrounding the closure, so captures chain to their outer definition.
pub fn find_variable_definition(ast: &Ast, reference: NodeId) -> Option<NodeId> {
    let name = ast.name(reference)?.to_string();

    // A capture is defined by the scope the closure appears in.
    let mut current = if ast.kind(reference) == NodeKind::UseVariableName {
        ast.parent(reference)?
    } else {
        reference
    };

    loop {
        for sibling in ast.preceding_siblings(current) {
            if let Some(assignment) = assignment_of(ast, sibling, &name) {
                return Some(assignment);
            }
        }

        let parent = ast.parent(current)?;
        if ast.kind(parent).is_function_like() {
            for &child in ast.children(parent) {
                match ast.kind(child) {
                    NodeKind::Parameter if ast.name(child) == Some(name.as_str()) => {
                        return Some(child);
                    }
                    NodeKind::UseVariableName if ast.name(child) == Some(name.as_str()) => {
                        return Some(child);
                    }
                    _ => {}
                }
            }
            // Function boundary: locals do not leak in.
            return None;
        }
        current = parent;
    }
}

/// If `statement` is an expression statement whose expression is a plain
/// `name = rhs` assignment, returns the assignment node.
fn assignment_of(ast: &Ast, statement: NodeId, name: &str) -> Option<NodeId> {
    if ast.kind(statement) != NodeKind::ExpressionStatement {
        return None;
    }
    let &expr = ast.children(statement).first()?;
    if ast.kind(expr) != NodeKind::AssignmentExpression
        || ast.node(expr).operator != Some(Operator::Assign)
    {
        return None;
    }
    let &lhs = ast.children(expr).first()?;
    if ast.kind(lhs) == NodeKind::Variable && ast.name(lhs) == Some(name) {
        return Some(expr);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::grammar::parse;

    fn ast_of(source: &str) -> Ast {
        parse(source).ast
    }

    fn find_variable<'a>(ast: &Ast, name: &str, nth: usize) -> NodeId {
        ast.preorder()
            .into_iter()
            .filter(|&id| ast.kind(id) == NodeKind::Variable && ast.name(id) == Some(name))
            .nth(nth)
            .unwrap()
    }

    #[test]
    fn test_finds_preceding_assignment() {
        let ast = ast_of("<?php $x = 1; echo $x;");
        let reference = find_variable(&ast, "x", 1);
        let definition = find_variable_definition(&ast, reference).unwrap();
        assert_eq!(ast.kind(definition), NodeKind::AssignmentExpression);
        assert_eq!(ast.text(definition), "$x = 1");
    }

    #[test]
    fn test_compound_assignment_does_not_define() {
        let ast = ast_of("<?php $x .= 'a'; echo $x;");
        let reference = find_variable(&ast, "x", 1);
        assert_eq!(find_variable_definition(&ast, reference), None);
    }

    #[test]
    fn test_finds_parameter() {
        let ast = ast_of("<?php function f($a) { return $a; }");
        let reference = find_variable(&ast, "a", 0);
        let definition = find_variable_definition(&ast, reference).unwrap();
        assert_eq!(ast.kind(definition), NodeKind::Parameter);
    }

    #[test]
    fn test_does_not_leak_across_function_boundary() {
        let ast = ast_of("<?php $x = 1; function f() { return $x; }");
        let reference = find_variable(&ast, "x", 1);
        assert_eq!(find_variable_definition(&ast, reference), None);
    }

    #[test]
    fn test_closure_capture_found() {
        let ast = ast_of("<?php $y = 1; $f = function () use ($y) { return $y; };");
        let reference = find_variable(&ast, "y", 1);
        let definition = find_variable_definition(&ast, reference).unwrap();
        assert_eq!(ast.kind(definition), NodeKind::UseVariableName);
    }

    #[test]
    fn test_capture_chains_to_outer_assignment() {
        let ast = ast_of("<?php $y = 1; $f = function () use ($y) {};");
        let capture = ast
            .preorder()
            .into_iter()
            .find(|&id| ast.kind(id) == NodeKind::UseVariableName)
            .unwrap();
        let definition = find_variable_definition(&ast, capture).unwrap();
        assert_eq!(ast.kind(definition), NodeKind::AssignmentExpression);
        assert_eq!(ast.text(definition), "$y = 1");
    }

    #[test]
    fn test_assignment_in_earlier_block_level() {
        let ast = ast_of("<?php function f() { $a = 'x'; if ($a) { echo $a; } }");
        let reference = find_variable(&ast, "a", 2);
        let definition = find_variable_definition(&ast, reference).unwrap();
        assert_eq!(ast.text(definition), "$a = 'x'");
    }
}
