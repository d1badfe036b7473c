//! Declaration Inference
//!
//! The `typeFromNode` side of the engine: what type does a declaration
//! carry. Doc-comment tags win over syntactic hints; hints widen with a
//! default value of a different shape; functions stop at the doc-block and
//! return-type hint, their bodies are never inspected.

use std::mem::discriminant;

use crate::ast::{NodeFlags, NodeId, NodeKind};
use crate::phpdoc::DocBlock;

use super::{PhpType, TypeInferrer};

impl<'a> TypeInferrer<'a> {
    /// The declared type of a declaration node; `None` for nodes that are
    /// not declarations.
    pub fn type_from_node(&self, node: NodeId) -> Option<PhpType> {
        self.node_type(node, 0)
    }

    pub(crate) fn node_type(&self, node: NodeId, depth: u32) -> Option<PhpType> {
        match self.ast.kind(node) {
            NodeKind::Parameter => Some(self.parameter_type(node, depth)),
            NodeKind::FunctionDeclaration | NodeKind::MethodDeclaration => {
                Some(self.callable_return_type(node))
            }
            NodeKind::Variable | NodeKind::AssignmentExpression | NodeKind::ConstElement => {
                Some(self.value_declaration_type(node, depth))
            }
            _ => None,
        }
    }

    /// Parameter typing: `@param` tag, then the type hint widened by a
    /// default of a different shape, then the default alone.
    pub(crate) fn parameter_type(&self, parameter: NodeId, depth: u32) -> PhpType {
        let ast = self.ast;

        if let (Some(function), Some(name)) = (ast.parent(parameter), ast.name(parameter)) {
            if let Some(doc) = ast.doc_comment(function) {
                let block = DocBlock::parse(doc);
                if let Some(type_string) =
                    block.param_tag(name).and_then(|tag| tag.type_string.as_deref())
                {
                    return PhpType::from_doc_string(type_string, ast.context(parameter));
                }
            }
        }

        let has_hint = ast.node(parameter).flags.contains(NodeFlags::HAS_TYPE_HINT);
        let children = ast.children(parameter);
        let hint = if has_hint {
            children.first().map(|&h| self.hint_type(h))
        } else {
            None
        };
        let default = children
            .get(usize::from(has_hint))
            .map(|&d| self.expression_type(d, depth + 1));

        match (hint, default) {
            (Some(hint), Some(default)) if discriminant(&hint) != discriminant(&default) => {
                PhpType::compound([hint, default])
            }
            (Some(hint), _) => hint,
            (None, Some(default)) => default,
            (None, None) => PhpType::Mixed,
        }
    }

    /// Function/method typing: `@return` tag, then the syntactic return
    /// hint. The body is never inspected.
    pub(crate) fn callable_return_type(&self, function: NodeId) -> PhpType {
        let ast = self.ast;
        if let Some(doc) = ast.doc_comment(function) {
            let block = DocBlock::parse(doc);
            if let Some(type_string) =
                block.return_tag().and_then(|tag| tag.type_string.as_deref())
            {
                return PhpType::from_doc_string(type_string, ast.context(function));
            }
        }
        // A qualified-name child of a function-like node is its return
        // hint; parameter hints live under the parameter nodes.
        let hint = ast
            .children(function)
            .iter()
            .find(|&&child| ast.kind(child) == NodeKind::QualifiedName);
        match hint {
            Some(&hint) => self.hint_type(hint),
            None => PhpType::Mixed,
        }
    }

    /// Property elements, const elements, local assignments: `@var` tag,
    /// then the right-hand side.
    fn value_declaration_type(&self, node: NodeId, depth: u32) -> PhpType {
        let ast = self.ast;
        let doc = ast.doc_comment(node).or_else(|| {
            // A `/** @var ... */` before a statement lands on the statement.
            ast.parent(node).and_then(|parent| {
                (ast.kind(parent) == NodeKind::ExpressionStatement)
                    .then(|| ast.doc_comment(parent))
                    .flatten()
            })
        });
        if let Some(doc) = doc {
            let block = DocBlock::parse(doc);
            if let Some(type_string) =
                block.var_tag().and_then(|tag| tag.type_string.as_deref())
            {
                return PhpType::from_doc_string(type_string, ast.context(node));
            }
        }

        match ast.kind(node) {
            NodeKind::AssignmentExpression => match ast.children(node).get(1) {
                Some(&rhs) => self.expression_type(rhs, depth + 1),
                None => PhpType::Mixed,
            },
            NodeKind::ConstElement => match ast.children(node).first() {
                Some(&value) => self.expression_type(value, depth + 1),
                None => PhpType::Mixed,
            },
            _ => PhpType::Mixed,
        }
    }

    /// A type-hint name: primitive keyword or class designator.
    fn hint_type(&self, hint: NodeId) -> PhpType {
        if let Some(name) = self.ast.name(hint) {
            if let Some(primitive) = PhpType::from_hint_keyword(name) {
                return primitive;
            }
        }
        self.class_designator_type(hint)
    }
}
