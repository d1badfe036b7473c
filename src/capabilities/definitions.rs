//! Definitions Capability — go-to-definition
//!
//! Cursor position → node → FQN (or local variable definition node) →
//! index lookup → location.

use tower_lsp::lsp_types::{Location, Position};

use crate::ast::{Ast, NodeId, NodeKind};
use crate::indexer::index::ReadableIndex;
use crate::parser::PhpDocument;
use crate::resolver::{defined_fqn, find_variable_definition, reference_to_fqn};
use crate::types::Fqn;

/// Resolves the symbol at `position` to its definition location.
pub fn goto_definition(
    document: &PhpDocument,
    index: &dyn ReadableIndex,
    position: Position,
) -> Option<Location> {
    let ast = &document.ast;
    let node = document.node_at_position(position)?;

    // Local variables jump to their defining node inside the document.
    if ast.kind(node) == NodeKind::Variable && ast.name(node) != Some("this") {
        if let Some(definition) = find_variable_definition(ast, node) {
            return Some(Location {
                uri: document.uri.clone(),
                range: document.node_range(definition),
            });
        }
    }

    let fqn = fqn_at(ast, index, node)?;
    let definition = index.get_definition(&fqn, wants_global_fallback(ast, node))?;
    Some(definition.location().clone())
}

/// The FQN named at a node: its own declaration, or the reference target.
pub(crate) fn fqn_at(ast: &Ast, index: &dyn ReadableIndex, node: NodeId) -> Option<Fqn> {
    defined_fqn(ast, node).or_else(|| reference_to_fqn(ast, index, node))
}

/// The root-namespace retry applies to function calls and constant
/// fetches only.
pub(crate) fn wants_global_fallback(ast: &Ast, node: NodeId) -> bool {
    if ast.kind(node) != NodeKind::QualifiedName {
        return false;
    }
    let Some(parent) = ast.parent(node) else {
        return true;
    };
    match ast.kind(parent) {
        // Call target: PHP falls back to the global function.
        NodeKind::CallExpression => ast.children(parent).first() == Some(&node),
        // Class-name positions never fall back.
        NodeKind::ObjectCreationExpression
        | NodeKind::BinaryExpression
        | NodeKind::ScopedPropertyAccessExpression
        | NodeKind::ClassBaseClause
        | NodeKind::ClassInterfaceClause
        | NodeKind::TraitUseClause
        | NodeKind::Parameter
        | NodeKind::FunctionDeclaration
        | NodeKind::MethodDeclaration
        | NodeKind::AnonymousFunctionCreationExpression
        | NodeKind::PropertyDeclaration
        | NodeKind::NamespaceUseDeclaration
        | NodeKind::NamespaceUseGroupClause => false,
        // Expression position: a constant fetch.
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::{index_document, IndexTier, ProjectIndex};
    use tower_lsp::lsp_types::Url;

    fn fixture(source: &str) -> (PhpDocument, ProjectIndex) {
        let document = PhpDocument::new(
            Url::parse("file:///test.php").unwrap(),
            source.to_string(),
            1,
        );
        let mut index = ProjectIndex::new();
        index_document(&mut index, &document, IndexTier::Project);
        (document, index)
    }

    #[test]
    fn test_goto_class_from_new() {
        let source = "<?php\nclass Widget {}\n$w = new Widget();\n";
        let (document, index) = fixture(source);
        // Cursor on "Widget" in the instantiation.
        let location = goto_definition(&document, &index, Position::new(2, 12)).unwrap();
        assert_eq!(location.range.start.line, 1);
    }

    #[test]
    fn test_goto_method_through_member_call() {
        let source = "<?php\nclass C {\n    function m() {}\n}\n$c = new C;\n$c->m();\n";
        let (document, index) = fixture(source);
        let location = goto_definition(&document, &index, Position::new(5, 4)).unwrap();
        assert_eq!(location.range.start.line, 2);
    }

    #[test]
    fn test_goto_local_variable() {
        let source = "<?php\n$value = 1;\necho $value;\n";
        let (document, index) = fixture(source);
        let location = goto_definition(&document, &index, Position::new(2, 7)).unwrap();
        assert_eq!(location.range.start.line, 1);
    }

    #[test]
    fn test_unknown_symbol_is_none() {
        let (document, index) = fixture("<?php\nnosuch();\n");
        assert_eq!(goto_definition(&document, &index, Position::new(1, 2)), None);
    }
}
