//! Expression Inference
//!
//! The `typeFromExpression` dispatch: given any expression node, produce a
//! symbolic type. Member and scoped lookups go through the index; variable
//! references go through the scope resolver to their defining node.

use crate::ast::{NodeFlags, NodeId, NodeKind, Operator};
use crate::indexer::index::ReadableIndex;
use crate::resolver::{enclosing_class_extends, enclosing_class_fqn, find_variable_definition};
use crate::types::Fqn;

use super::{PhpType, TypeInferrer, MAX_DEPTH};

impl<'a> TypeInferrer<'a> {
    /// Infers the type of an expression. Total: unknown is `Mixed`.
    pub fn type_from_expression(&self, node: NodeId) -> PhpType {
        self.expression_type(node, 0)
    }

    pub(crate) fn expression_type(&self, node: NodeId, depth: u32) -> PhpType {
        // Recursion boundary: cancellation and depth are only checked here.
        if self.cancel.is_cancelled() || depth > MAX_DEPTH {
            return PhpType::Mixed;
        }

        let ast = self.ast;
        match ast.kind(node) {
            NodeKind::Variable => match ast.name(node) {
                Some("this") => PhpType::This,
                Some(_) => match find_variable_definition(ast, node) {
                    Some(definition) => self.definition_node_type(definition, depth + 1),
                    None => PhpType::Mixed,
                },
                None => PhpType::Mixed,
            },

            NodeKind::CallExpression => {
                let Some(&callee) = ast.children(node).first() else {
                    return PhpType::Mixed;
                };
                match ast.kind(callee) {
                    NodeKind::QualifiedName => self.function_call_type(callee),
                    NodeKind::MemberAccessExpression => {
                        self.member_access_type(callee, true, depth)
                    }
                    NodeKind::ScopedPropertyAccessExpression => {
                        self.scoped_access_type(callee, true, depth)
                    }
                    _ => PhpType::Mixed,
                }
            }

            NodeKind::QualifiedName => {
                // Boolean literals come first, by source text.
                if let Some(name) = ast.name(node) {
                    if name.eq_ignore_ascii_case("true") || name.eq_ignore_ascii_case("false") {
                        return PhpType::Boolean;
                    }
                }
                let Some(resolved) = ast.resolved_name(node) else {
                    return PhpType::Mixed;
                };
                match self.index.get_definition(&Fqn::new(resolved), true) {
                    Some(definition) => definition.ty.clone(),
                    None => PhpType::Mixed,
                }
            }

            NodeKind::MemberAccessExpression => self.member_access_type(node, false, depth),
            NodeKind::ScopedPropertyAccessExpression => {
                self.scoped_access_type(node, false, depth)
            }

            NodeKind::ObjectCreationExpression => match ast.children(node).first() {
                Some(&designator) => self.class_designator_type(designator),
                None => PhpType::Mixed,
            },

            NodeKind::CloneExpression => match ast.children(node).first() {
                Some(&operand) => self.expression_type(operand, depth + 1),
                None => PhpType::Mixed,
            },

            NodeKind::AssignmentExpression => self.assignment_type(node, depth),

            NodeKind::TernaryExpression => {
                let children = ast.children(node);
                let short = ast.node(node).flags.contains(NodeFlags::SHORT_TERNARY);
                match (short, children) {
                    (true, [condition, alternative]) => PhpType::compound([
                        self.expression_type(*condition, depth + 1),
                        self.expression_type(*alternative, depth + 1),
                    ]),
                    (false, [_, consequence, alternative]) => PhpType::compound([
                        self.expression_type(*consequence, depth + 1),
                        self.expression_type(*alternative, depth + 1),
                    ]),
                    _ => PhpType::Mixed,
                }
            }

            NodeKind::BinaryExpression => self.binary_type(node, depth),

            NodeKind::UnaryOpExpression => match ast.node(node).operator {
                Some(Operator::Not) => PhpType::Boolean,
                _ => PhpType::Mixed,
            },

            NodeKind::IssetIntrinsicExpression | NodeKind::EmptyIntrinsicExpression => {
                PhpType::Boolean
            }

            NodeKind::CastExpression => self.cast_type(node),

            NodeKind::StringLiteral => PhpType::String,

            NodeKind::NumericLiteral => {
                if ast.node(node).flags.contains(NodeFlags::FLOAT) {
                    PhpType::Float
                } else {
                    PhpType::Integer
                }
            }

            NodeKind::ArrayCreationExpression => self.array_literal_type(node, depth),

            NodeKind::SubscriptExpression => {
                let Some(&base) = ast.children(node).first() else {
                    return PhpType::Mixed;
                };
                match self.expression_type(base, depth + 1) {
                    PhpType::Array {
                        value: Some(value), ..
                    } => *value,
                    _ => PhpType::Mixed,
                }
            }

            _ => PhpType::Mixed,
        }
    }

    /// Type carried by a variable's defining node: the parameter type, the
    /// assignment's right-hand side, or the capture's outer definition.
    pub(crate) fn definition_node_type(&self, definition: NodeId, depth: u32) -> PhpType {
        if depth > MAX_DEPTH {
            return PhpType::Mixed;
        }
        let ast = self.ast;
        match ast.kind(definition) {
            NodeKind::Parameter => self.parameter_type(definition, depth),
            NodeKind::AssignmentExpression => match ast.children(definition).get(1) {
                Some(&rhs) => self.expression_type(rhs, depth),
                None => PhpType::Mixed,
            },
            NodeKind::UseVariableName => match find_variable_definition(ast, definition) {
                Some(outer) => self.definition_node_type(outer, depth + 1),
                None => PhpType::Mixed,
            },
            _ => PhpType::Mixed,
        }
    }

    fn function_call_type(&self, callee: NodeId) -> PhpType {
        let Some(resolved) = self.ast.resolved_name(callee) else {
            return PhpType::Mixed;
        };
        let fqn = Fqn::function(resolved);
        match self.index.get_definition(&fqn, true) {
            Some(definition) => definition.ty.clone(),
            None => PhpType::Mixed,
        }
    }

    /// `a->m` / `a->m(...)`: widen the subject to its components and return
    /// the type of the first member definition found.
    pub(crate) fn member_access_type(&self, node: NodeId, call: bool, depth: u32) -> PhpType {
        let ast = self.ast;
        let Some(member) = ast.name(node) else {
            return PhpType::Mixed;
        };
        let Some(&base) = ast.children(node).first() else {
            return PhpType::Mixed;
        };
        let base_type = self.expression_type(base, depth + 1);

        for component in base_type.components() {
            let class = match component {
                PhpType::This | PhpType::SelfType | PhpType::StaticType => {
                    enclosing_class_fqn(ast, node)
                }
                PhpType::Object(Some(fqn)) => Some(fqn),
                _ => None,
            };
            let Some(class) = class else { continue };
            if self.cancel.is_cancelled() {
                return PhpType::Mixed;
            }
            let fqn = Fqn::instance_member(&class, member, call);
            if let Some(definition) = self.index.get_definition(&fqn, false) {
                return definition.ty.clone();
            }
        }
        PhpType::Mixed
    }

    /// `C::x` / `C::x(...)`: resolve the qualifier to a class and look the
    /// member up. Dynamic qualifiers stay `Mixed`.
    pub(crate) fn scoped_access_type(&self, node: NodeId, call: bool, _depth: u32) -> PhpType {
        let ast = self.ast;
        let Some(member) = ast.name(node) else {
            return PhpType::Mixed;
        };
        let Some(&qualifier) = ast.children(node).first() else {
            return PhpType::Mixed;
        };
        let class = match self.class_designator_type(qualifier) {
            PhpType::Object(Some(fqn)) => fqn,
            PhpType::StaticType => match enclosing_class_fqn(ast, node) {
                Some(fqn) => fqn,
                None => return PhpType::Mixed,
            },
            _ => return PhpType::Mixed,
        };
        let variable = ast.node(node).flags.contains(NodeFlags::VARIABLE_MEMBER);
        let fqn = Fqn::static_member(&class, member, variable, call);
        match self.index.get_definition(&fqn, false) {
            Some(definition) => definition.ty.clone(),
            None => PhpType::Mixed,
        }
    }

    /// A class-name node in designator position (`new C`, `C::`, type
    /// hints): keywords resolve against the enclosing class, anonymous
    /// classes are objects without an FQSEN, dynamic designators are
    /// `Mixed`.
    pub(crate) fn class_designator_type(&self, node: NodeId) -> PhpType {
        let ast = self.ast;
        match ast.kind(node) {
            NodeKind::QualifiedName => {
                let name = ast.name(node).unwrap_or_default();
                match name.to_ascii_lowercase().as_str() {
                    "static" => PhpType::StaticType,
                    "self" => match enclosing_class_fqn(ast, node) {
                        Some(fqn) => PhpType::Object(Some(fqn)),
                        None => PhpType::Mixed,
                    },
                    "parent" => match enclosing_class_extends(ast, node).into_iter().next() {
                        Some(base) => PhpType::Object(Some(base)),
                        None => PhpType::Object(None),
                    },
                    _ => match ast.resolved_name(node) {
                        Some(resolved) => PhpType::object(resolved),
                        None => PhpType::Mixed,
                    },
                }
            }
            NodeKind::ClassDeclaration => PhpType::Object(None),
            _ => PhpType::Mixed,
        }
    }

    fn assignment_type(&self, node: NodeId, depth: u32) -> PhpType {
        let ast = self.ast;
        let children = ast.children(node);
        let (Some(&lhs), Some(&rhs)) = (children.first(), children.get(1)) else {
            return PhpType::Mixed;
        };
        match ast.node(node).operator {
            Some(Operator::Assign) => self.expression_type(rhs, depth + 1),
            Some(Operator::ConcatAssign) => PhpType::String,
            Some(Operator::CoalesceAssign) => PhpType::compound([
                self.expression_type(lhs, depth + 1),
                self.expression_type(rhs, depth + 1),
            ]),
            Some(op) if op.is_arithmetic() => self.arithmetic_type(lhs, rhs, depth),
            Some(
                Operator::BitAndAssign | Operator::BitOrAssign | Operator::BitXorAssign,
            ) => PhpType::Integer,
            _ => PhpType::Mixed,
        }
    }

    fn binary_type(&self, node: NodeId, depth: u32) -> PhpType {
        let ast = self.ast;
        let children = ast.children(node);
        let (Some(&lhs), Some(&rhs)) = (children.first(), children.get(1)) else {
            return PhpType::Mixed;
        };
        let Some(operator) = ast.node(node).operator else {
            return PhpType::Mixed;
        };
        if operator.is_coalesce() {
            return PhpType::compound([
                self.expression_type(lhs, depth + 1),
                self.expression_type(rhs, depth + 1),
            ]);
        }
        if operator.is_boolean() {
            return PhpType::Boolean;
        }
        if operator.is_concat() {
            return PhpType::String;
        }
        if operator.is_arithmetic() {
            return self.arithmetic_type(lhs, rhs, depth);
        }
        if operator.is_integral() {
            return PhpType::Integer;
        }
        PhpType::Mixed
    }

    fn arithmetic_type(&self, lhs: NodeId, rhs: NodeId, depth: u32) -> PhpType {
        let left = self.expression_type(lhs, depth + 1);
        let right = self.expression_type(rhs, depth + 1);
        if left == PhpType::Integer && right == PhpType::Integer {
            PhpType::Integer
        } else {
            PhpType::Float
        }
    }

    fn cast_type(&self, node: NodeId) -> PhpType {
        match self.ast.name(node).unwrap_or_default() {
            "int" | "integer" => PhpType::Integer,
            "bool" | "boolean" => PhpType::Boolean,
            "float" | "double" | "real" => PhpType::Float,
            "string" | "binary" => PhpType::String,
            "array" => PhpType::plain_array(),
            "object" => PhpType::Object(None),
            _ => PhpType::Mixed,
        }
    }

    /// `[k => v, ...]`: distinct unions for keys and values; elements
    /// without keys contribute `Integer` keys.
    fn array_literal_type(&self, node: NodeId, depth: u32) -> PhpType {
        let ast = self.ast;
        let elements = ast.children(node);
        if elements.is_empty() {
            return PhpType::plain_array();
        }
        let mut keys = Vec::new();
        let mut values = Vec::new();
        for &element in elements {
            if ast.kind(element) != NodeKind::ArrayElement {
                continue;
            }
            let children = ast.children(element);
            if ast.node(element).flags.contains(NodeFlags::HAS_KEY) {
                if let Some(&key) = children.first() {
                    keys.push(self.expression_type(key, depth + 1));
                }
                match children.get(1) {
                    Some(&value) => values.push(self.expression_type(value, depth + 1)),
                    None => values.push(PhpType::Mixed),
                }
            } else {
                keys.push(PhpType::Integer);
                if let Some(&value) = children.first() {
                    values.push(self.expression_type(value, depth + 1));
                }
            }
        }
        PhpType::Array {
            value: Some(Box::new(PhpType::compound(values))),
            key: Some(Box::new(PhpType::compound(keys))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Ast;
    use crate::indexer::index::ProjectIndex;
    use crate::parser::grammar::parse;

    fn ast_of(source: &str) -> Ast {
        parse(source).ast
    }

    /// Type of the rhs of the last top-level assignment statement.
    fn last_assignment_rhs_type(source: &str) -> PhpType {
        let ast = ast_of(source);
        let index = ProjectIndex::new();
        let inferrer = TypeInferrer::new(&ast, &index);
        let assignment = ast
            .preorder()
            .into_iter()
            .filter(|&id| {
                ast.kind(id) == NodeKind::AssignmentExpression
                    && ast
                        .parent(id)
                        .is_some_and(|p| ast.kind(p) == NodeKind::ExpressionStatement)
            })
            .last()
            .unwrap();
        let rhs = ast.children(assignment)[1];
        inferrer.type_from_expression(rhs)
    }

    #[test]
    fn test_literals() {
        assert_eq!(last_assignment_rhs_type("<?php $a = 1;"), PhpType::Integer);
        assert_eq!(last_assignment_rhs_type("<?php $a = 1.5;"), PhpType::Float);
        assert_eq!(last_assignment_rhs_type("<?php $a = 'x';"), PhpType::String);
        assert_eq!(last_assignment_rhs_type("<?php $a = true;"), PhpType::Boolean);
        assert_eq!(last_assignment_rhs_type("<?php $a = FALSE;"), PhpType::Boolean);
    }

    #[test]
    fn test_assignment_has_rhs_type() {
        // The round-trip property: type(lhs = rhs) == type(rhs).
        let ast = ast_of("<?php $a = 1;");
        let index = ProjectIndex::new();
        let inferrer = TypeInferrer::new(&ast, &index);
        let assignment = ast
            .preorder()
            .into_iter()
            .find(|&id| ast.kind(id) == NodeKind::AssignmentExpression)
            .unwrap();
        assert_eq!(inferrer.type_from_expression(assignment), PhpType::Integer);
    }

    #[test]
    fn test_variable_tracks_assignment() {
        assert_eq!(
            last_assignment_rhs_type("<?php $x = 'hello'; $y = $x;"),
            PhpType::String
        );
    }

    #[test]
    fn test_ternary_compound() {
        assert_eq!(
            last_assignment_rhs_type("<?php $x = true; $y = $x ? 1 : \"s\";"),
            PhpType::compound([PhpType::Integer, PhpType::String])
        );
    }

    #[test]
    fn test_short_ternary_and_coalesce() {
        assert_eq!(
            last_assignment_rhs_type("<?php $a = 1; $y = $a ?: 's';"),
            PhpType::compound([PhpType::Integer, PhpType::String])
        );
        assert_eq!(
            last_assignment_rhs_type("<?php $a = 1; $y = $a ?? 2.5;"),
            PhpType::compound([PhpType::Integer, PhpType::Float])
        );
    }

    #[test]
    fn test_arithmetic_narrowing() {
        assert_eq!(last_assignment_rhs_type("<?php $a = 1 + 2;"), PhpType::Integer);
        assert_eq!(last_assignment_rhs_type("<?php $a = 1 + 2.0;"), PhpType::Float);
        assert_eq!(last_assignment_rhs_type("<?php $a = 2 ** 3;"), PhpType::Integer);
    }

    #[test]
    fn test_boolean_and_string_operators() {
        assert_eq!(
            last_assignment_rhs_type("<?php $a = 1 < 2;"),
            PhpType::Boolean
        );
        assert_eq!(
            last_assignment_rhs_type("<?php $a = $x instanceof Foo;"),
            PhpType::Boolean
        );
        assert_eq!(
            last_assignment_rhs_type("<?php $a = 'x' . 'y';"),
            PhpType::String
        );
        assert_eq!(
            last_assignment_rhs_type("<?php $a = !$b;"),
            PhpType::Boolean
        );
        assert_eq!(
            last_assignment_rhs_type("<?php $a = isset($b);"),
            PhpType::Boolean
        );
        assert_eq!(
            last_assignment_rhs_type("<?php $a = 1 <=> 2;"),
            PhpType::Integer
        );
    }

    #[test]
    fn test_casts() {
        assert_eq!(
            last_assignment_rhs_type("<?php $a = (bool)$x;"),
            PhpType::Boolean
        );
        assert_eq!(
            last_assignment_rhs_type("<?php $a = (string)$x;"),
            PhpType::String
        );
        assert_eq!(
            last_assignment_rhs_type("<?php $a = (double)$x;"),
            PhpType::Float
        );
    }

    #[test]
    fn test_new_object() {
        assert_eq!(
            last_assignment_rhs_type("<?php namespace N; $a = new Widget();"),
            PhpType::object("N\\Widget")
        );
        assert_eq!(
            last_assignment_rhs_type("<?php $a = new $cls;"),
            PhpType::Mixed
        );
        assert_eq!(
            last_assignment_rhs_type("<?php $a = new class {};"),
            PhpType::Object(None)
        );
    }

    #[test]
    fn test_clone_preserves_type() {
        assert_eq!(
            last_assignment_rhs_type("<?php $w = new Widget; $a = clone $w;"),
            PhpType::object("Widget")
        );
    }

    #[test]
    fn test_array_literal_and_subscript() {
        assert_eq!(
            last_assignment_rhs_type("<?php $a = [1, 2];"),
            PhpType::Array {
                value: Some(Box::new(PhpType::Integer)),
                key: Some(Box::new(PhpType::Integer)),
            }
        );
        assert_eq!(
            last_assignment_rhs_type("<?php $a = ['k' => 1, 'j' => 's'];"),
            PhpType::Array {
                value: Some(Box::new(PhpType::compound([
                    PhpType::Integer,
                    PhpType::String
                ]))),
                key: Some(Box::new(PhpType::String)),
            }
        );
        assert_eq!(
            last_assignment_rhs_type("<?php $xs = [1, 2]; $a = $xs[0];"),
            PhpType::Integer
        );
    }

    #[test]
    fn test_unknown_stays_mixed() {
        assert_eq!(last_assignment_rhs_type("<?php $a = $unknown;"), PhpType::Mixed);
        assert_eq!(
            last_assignment_rhs_type("<?php $a = unknown_fn();"),
            PhpType::Mixed
        );
        assert_eq!(last_assignment_rhs_type("<?php $a = 1 / 2;"), PhpType::Mixed);
    }

    #[test]
    fn test_this_type() {
        let ast = ast_of("<?php class C { function m() { return $this; } }");
        let index = ProjectIndex::new();
        let inferrer = TypeInferrer::new(&ast, &index);
        let this = ast
            .preorder()
            .into_iter()
            .find(|&id| ast.kind(id) == NodeKind::Variable && ast.name(id) == Some("this"))
            .unwrap();
        assert_eq!(inferrer.type_from_expression(this), PhpType::This);
    }

    #[test]
    fn test_cancelled_inference_is_mixed() {
        let ast = ast_of("<?php $a = 1;");
        let index = ProjectIndex::new();
        let cancel = super::super::CancelToken::new();
        cancel.cancel();
        let inferrer = TypeInferrer::with_cancel(&ast, &index, cancel);
        let literal = ast
            .preorder()
            .into_iter()
            .find(|&id| ast.kind(id) == NodeKind::NumericLiteral)
            .unwrap();
        assert_eq!(inferrer.type_from_expression(literal), PhpType::Mixed);
    }
}
