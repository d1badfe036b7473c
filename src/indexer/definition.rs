//! Definition Record
//!
//! The aggregate describing one defined symbol: FQN, kind flags, declared
//! type, the source line it was declared on, documentation summary,
//! inheritance list, and the LSP symbol payload. Definitions reference
//! each other by FQN string only, never by pointer, so the index stays
//! acyclic and snapshottable.

use tower_lsp::lsp_types::{Location, SymbolInformation, SymbolKind};

use crate::ast::{Ast, NodeId, NodeKind};
use crate::indexer::index::ReadableIndex;
use crate::inferrer::{PhpType, TypeInferrer};
use crate::parser::PhpDocument;
use crate::phpdoc::DocBlock;
use crate::resolver::class_extends;
use crate::types::Fqn;

#[derive(Debug, Clone)]
pub struct Definition {
    pub fqn: Fqn,
    /// True for class declarations proper (not interfaces or traits).
    pub is_class: bool,
    /// True for globally addressable symbols (classes, functions,
    /// constants, namespaces) as opposed to class members.
    pub is_global: bool,
    pub is_static: bool,
    /// Base class (classes, at most one) or base interfaces (interfaces).
    pub extends: Vec<Fqn>,
    pub ty: PhpType,
    /// The declaration's source line, truncated at the first newline;
    /// property/const lists are respliced to show only this element.
    pub declaration_line: String,
    /// Doc-block summary.
    pub documentation: Option<String>,
    pub symbol_information: SymbolInformation,
}

impl Definition {
    /// Whether `new` on this symbol is meaningful.
    pub fn can_be_instantiated(&self) -> bool {
        self.is_class
    }

    pub fn location(&self) -> &Location {
        &self.symbol_information.location
    }

    #[cfg(test)]
    pub fn for_tests(fqn: Fqn, location: Location, ty: PhpType) -> Definition {
        #[allow(deprecated)]
        let symbol_information = SymbolInformation {
            name: fqn.name().to_string(),
            kind: SymbolKind::CLASS,
            tags: None,
            deprecated: None,
            location,
            container_name: None,
        };
        Definition {
            fqn,
            is_class: true,
            is_global: true,
            is_static: false,
            extends: Vec::new(),
            ty,
            declaration_line: String::new(),
            documentation: None,
            symbol_information,
        }
    }
}

/// Packages the outputs of the name builder, the inferrer and the
/// doc-comment adapter into a `Definition` for one declaration node.
pub fn create_definition(
    document: &PhpDocument,
    index: &dyn ReadableIndex,
    node: NodeId,
    fqn: Fqn,
) -> Definition {
    let ast = &document.ast;
    let kind = ast.kind(node);

    let is_class = kind == NodeKind::ClassDeclaration;
    let is_global = !fqn.is_member();
    let is_static = match kind {
        NodeKind::MethodDeclaration => ast.node(node).is_static(),
        NodeKind::Variable | NodeKind::AssignmentExpression => ast
            .parent(node)
            .is_some_and(|parent| ast.node(parent).is_static()),
        _ => false,
    };

    let extends = match kind {
        NodeKind::ClassDeclaration | NodeKind::InterfaceDeclaration => class_extends(ast, node),
        _ => Vec::new(),
    };

    let inferrer = TypeInferrer::new(ast, index);
    let ty = match kind {
        NodeKind::ClassDeclaration
        | NodeKind::InterfaceDeclaration
        | NodeKind::TraitDeclaration => PhpType::Object(Some(fqn.clone())),
        _ => inferrer.type_from_node(node).unwrap_or(PhpType::Mixed),
    };

    let documentation = ast
        .doc_comment(node)
        .map(DocBlock::parse)
        .and_then(|block| block.summary);

    let location = Location {
        uri: document.uri.clone(),
        range: document.node_range(node),
    };
    #[allow(deprecated)]
    let symbol_information = SymbolInformation {
        name: fqn.name().to_string(),
        kind: symbol_kind(ast, node),
        tags: None,
        deprecated: None,
        location,
        container_name: match fqn.container_name() {
            "" => None,
            container => Some(container.to_string()),
        },
    };

    Definition {
        fqn,
        is_class,
        is_global,
        is_static,
        extends,
        ty,
        declaration_line: declaration_line(ast, node),
        documentation,
        symbol_information,
    }
}

fn symbol_kind(ast: &Ast, node: NodeId) -> SymbolKind {
    match ast.kind(node) {
        NodeKind::NamespaceDefinition => SymbolKind::NAMESPACE,
        NodeKind::ClassDeclaration | NodeKind::TraitDeclaration => SymbolKind::CLASS,
        NodeKind::InterfaceDeclaration => SymbolKind::INTERFACE,
        NodeKind::FunctionDeclaration => SymbolKind::FUNCTION,
        NodeKind::MethodDeclaration => SymbolKind::METHOD,
        NodeKind::Variable | NodeKind::AssignmentExpression => SymbolKind::PROPERTY,
        NodeKind::ConstElement => SymbolKind::CONSTANT,
        _ => SymbolKind::VARIABLE,
    }
}

/// The single source line shown for a declaration. Elements of a
/// property/const list are respliced onto the declaration head, so
/// `public $a, $b;` shown at `$b` reads `public $b;`.
fn declaration_line(ast: &Ast, node: NodeId) -> String {
    let line = match element_list_parent(ast, node) {
        Some(declaration) => {
            let first_element = ast
                .children(declaration)
                .iter()
                .copied()
                .find(|&child| is_element(ast, child));
            match first_element {
                Some(first) => {
                    let declaration_span = ast.node(declaration).span;
                    let prefix_len =
                        (ast.node(first).span.start - declaration_span.start) as usize;
                    let prefix = &ast.text(declaration)[..prefix_len];
                    format!("{}{};", prefix, ast.text(node))
                }
                None => ast.text(node).to_string(),
            }
        }
        None => ast.text(node).to_string(),
    };
    line.lines().next().unwrap_or_default().trim_end().to_string()
}

/// The enclosing declaration when `node` is a property or const element.
fn element_list_parent(ast: &Ast, node: NodeId) -> Option<NodeId> {
    let parent = ast.parent(node)?;
    match (ast.kind(node), ast.kind(parent)) {
        (
            NodeKind::Variable | NodeKind::AssignmentExpression,
            NodeKind::PropertyDeclaration,
        ) => Some(parent),
        (
            NodeKind::ConstElement,
            NodeKind::ConstDeclaration | NodeKind::ClassConstDeclaration,
        ) => Some(parent),
        _ => None,
    }
}

fn is_element(ast: &Ast, node: NodeId) -> bool {
    matches!(
        ast.kind(node),
        NodeKind::Variable | NodeKind::AssignmentExpression | NodeKind::ConstElement
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::index::ProjectIndex;
    use crate::resolver::defined_fqn;
    use tower_lsp::lsp_types::Url;

    fn document(source: &str) -> PhpDocument {
        PhpDocument::new(
            Url::parse("file:///test.php").unwrap(),
            source.to_string(),
            1,
        )
    }

    fn definition_of(document: &PhpDocument, fqn: &str) -> Definition {
        let index = ProjectIndex::new();
        let node = document
            .ast
            .preorder()
            .into_iter()
            .find(|&id| {
                defined_fqn(&document.ast, id).map(|f| f.to_string()) == Some(fqn.to_string())
            })
            .unwrap_or_else(|| panic!("no declaration for {}", fqn));
        create_definition(document, &index, node, Fqn::new(fqn))
    }

    #[test]
    fn test_class_definition_flags() {
        let doc = document("<?php namespace A\\B; class C {}");
        let def = definition_of(&doc, "A\\B\\C");
        assert!(def.is_class);
        assert!(def.can_be_instantiated());
        assert!(def.is_global);
        assert!(!def.is_static);
        assert!(def.extends.is_empty());
        assert_eq!(def.ty, PhpType::object("A\\B\\C"));
        assert_eq!(def.symbol_information.kind, SymbolKind::CLASS);
        assert_eq!(
            def.symbol_information.container_name.as_deref(),
            Some("A\\B")
        );
    }

    #[test]
    fn test_extends_recorded() {
        let doc = document("<?php namespace N; class B extends A {}");
        let def = definition_of(&doc, "N\\B");
        assert_eq!(def.extends, vec![Fqn::new("N\\A")]);
    }

    #[test]
    fn test_interface_is_not_instantiable() {
        let doc = document("<?php interface I extends A, B {}");
        let def = definition_of(&doc, "I");
        assert!(!def.is_class);
        assert!(!def.can_be_instantiated());
        assert_eq!(def.extends.len(), 2);
        assert_eq!(def.symbol_information.kind, SymbolKind::INTERFACE);
    }

    #[test]
    fn test_static_method_flags() {
        let doc = document("<?php class C { public static function make(): self {} }");
        let def = definition_of(&doc, "C::make()");
        assert!(def.is_static);
        assert!(!def.is_global);
        assert_eq!(def.symbol_information.kind, SymbolKind::METHOD);
        assert_eq!(def.ty, PhpType::object("C"));
    }

    #[test]
    fn test_property_element_declaration_line() {
        let doc = document("<?php class C { public $a = 1, $b, $c = 3; }");
        let def = definition_of(&doc, "C->b");
        assert_eq!(def.declaration_line, "public $b;");
        let def = definition_of(&doc, "C->c");
        assert_eq!(def.declaration_line, "public $c = 3;");
    }

    #[test]
    fn test_declaration_line_truncates_at_newline() {
        let doc = document("<?php function f(\n    int $a\n) {}");
        let def = definition_of(&doc, "f()");
        assert_eq!(def.declaration_line, "function f(");
    }

    #[test]
    fn test_documentation_summary() {
        let doc = document(
            "<?php\n/**\n * Makes widgets.\n *\n * @return int\n */\nfunction make() {}",
        );
        let def = definition_of(&doc, "make()");
        assert_eq!(def.documentation.as_deref(), Some("Makes widgets."));
        assert_eq!(def.ty, PhpType::Integer);
    }

    #[test]
    fn test_property_type_from_initializer() {
        let doc = document("<?php class C { public $x = 1; }");
        let def = definition_of(&doc, "C->x");
        assert_eq!(def.ty, PhpType::Integer);
        assert_eq!(def.symbol_information.kind, SymbolKind::PROPERTY);
        assert_eq!(def.symbol_information.name, "x");
    }

    #[test]
    fn test_const_element() {
        let doc = document("<?php namespace N; const LIMIT = 10;");
        let def = definition_of(&doc, "N\\LIMIT");
        assert_eq!(def.ty, PhpType::Integer);
        assert!(def.is_global);
        assert_eq!(def.symbol_information.kind, SymbolKind::CONSTANT);
        assert_eq!(def.declaration_line, "const LIMIT = 10;");
    }
}
