//! Reference Resolver
//!
//! Maps a reference node to the FQN it targets. Dispatch follows the
//! node's syntactic position; member dispatch leans on type inference for
//! the subject expression and on the index for the inheritance walk. The
//! resolver is total: anything unresolvable is `None`.

use crate::ast::{Ast, NodeFlags, NodeId, NodeKind};
use crate::indexer::index::ReadableIndex;
use crate::inferrer::{PhpType, TypeInferrer};
use crate::types::Fqn;

use super::{enclosing_class_extends, enclosing_class_fqn};

/// Upper bound on `extends` chains, so cyclic hierarchies terminate.
const MAX_ANCESTORS: usize = 64;

/// Resolves a reference node to the FQN it names.
///
/// Local variables resolve to `None` (they are not globally indexed; the
/// scope resolver handles them), with the exception of `$this`, which
/// names the enclosing class.
pub fn reference_to_fqn(ast: &Ast, index: &dyn ReadableIndex, node: NodeId) -> Option<Fqn> {
    match ast.kind(node) {
        NodeKind::Variable => {
            if ast.name(node) == Some("this") {
                enclosing_class_fqn(ast, node)
            } else {
                None
            }
        }

        NodeKind::QualifiedName => qualified_name_fqn(ast, node),

        NodeKind::MemberAccessExpression => {
            member_access_fqn(ast, index, node, is_callee(ast, node))
        }

        NodeKind::ScopedPropertyAccessExpression => {
            scoped_access_fqn(ast, index, node, is_callee(ast, node))
        }

        NodeKind::CallExpression => {
            let &callee = ast.children(node).first()?;
            match ast.kind(callee) {
                NodeKind::QualifiedName => qualified_name_fqn(ast, callee),
                NodeKind::MemberAccessExpression => member_access_fqn(ast, index, callee, true),
                NodeKind::ScopedPropertyAccessExpression => {
                    scoped_access_fqn(ast, index, callee, true)
                }
                _ => None,
            }
        }

        _ => None,
    }
}

/// True when `node` is the callee of a call expression.
fn is_callee(ast: &Ast, node: NodeId) -> bool {
    match ast.parent(node) {
        Some(parent) => {
            ast.kind(parent) == NodeKind::CallExpression
                && ast.children(parent).first() == Some(&node)
        }
        None => false,
    }
}

/// A qualified name in any position: declarations of imports, call
/// targets, class references, constant fetches.
fn qualified_name_fqn(ast: &Ast, node: NodeId) -> Option<Fqn> {
    let raw = ast.name(node)?;
    match raw.to_ascii_lowercase().as_str() {
        // Relative class keywords name the enclosing hierarchy.
        "self" | "static" => return enclosing_class_fqn(ast, node),
        "parent" => return enclosing_class_extends(ast, node).into_iter().next(),
        // Reserved value words name nothing.
        "true" | "false" | "null" => return None,
        _ => {}
    }

    let mut name = ast
        .resolved_name(node)
        .unwrap_or(raw)
        .to_string();

    // Names inside `use` declarations: group members get the group prefix,
    // function imports get the call suffix.
    if let Some(group) = ast.first_ancestor(node, &[NodeKind::NamespaceUseGroupClause]) {
        if let Some(prefix) = ast.name(group) {
            name = format!("{}\\{}", prefix, name);
        }
    }
    if let Some(use_decl) = ast.first_ancestor(node, &[NodeKind::NamespaceUseDeclaration]) {
        if ast.node(use_decl).flags.contains(NodeFlags::FUNCTION_USE) {
            return Some(Fqn::function(&name));
        }
        return Some(Fqn::new(name));
    }

    if is_callee(ast, node) {
        return Some(Fqn::function(&name));
    }
    Some(Fqn::new(name))
}

/// `a->m` / `a->m(...)`: infer the subject, pick the dispatch class, then
/// walk the inheritance chain for the first class that defines the member.
/// With no hit the initial candidate is returned so the index can fill it
/// in later.
fn member_access_fqn(
    ast: &Ast,
    index: &dyn ReadableIndex,
    node: NodeId,
    call: bool,
) -> Option<Fqn> {
    let member = ast.name(node)?;
    let &base = ast.children(node).first()?;

    let inferrer = TypeInferrer::new(ast, index);
    let base_type = inferrer.type_from_expression(base);

    let component = base_type
        .components()
        .into_iter()
        .find(|component| {
            matches!(
                component,
                PhpType::This | PhpType::Object(_) | PhpType::StaticType | PhpType::SelfType
            )
        })?;

    let class = match component {
        PhpType::This | PhpType::StaticType | PhpType::SelfType => {
            enclosing_class_fqn(ast, node)?
        }
        PhpType::Object(Some(fqn)) => fqn,
        _ => return None,
    };

    let initial = Fqn::instance_member(&class, member, call);
    let mut class_fqn = class;
    let mut candidate = initial.clone();
    for _ in 0..MAX_ANCESTORS {
        if index.get_definition(&candidate, false).is_some() {
            return Some(candidate);
        }
        let Some(class_def) = index.get_definition(&class_fqn, false) else {
            break;
        };
        let Some(base) = class_def.extends.first() else {
            break;
        };
        class_fqn = base.clone();
        candidate = Fqn::instance_member(&class_fqn, member, call);
    }
    Some(initial)
}

/// `C::m` / `C::$p` / `C::K` and call forms. The qualifier resolves through
/// the relative keywords or its own resolved name; the member is looked up
/// along the inheritance chain, accepting the instance-dispatch form for
/// calls so `parent::`/`static::` reach instance methods of ancestors.
fn scoped_access_fqn(
    ast: &Ast,
    index: &dyn ReadableIndex,
    node: NodeId,
    call: bool,
) -> Option<Fqn> {
    let member = ast.name(node)?;
    let variable = ast.node(node).flags.contains(NodeFlags::VARIABLE_MEMBER);
    let &qualifier = ast.children(node).first()?;
    if ast.kind(qualifier) != NodeKind::QualifiedName {
        return None;
    }

    let raw = ast.name(qualifier)?;
    let class = match raw.to_ascii_lowercase().as_str() {
        "self" | "static" => enclosing_class_fqn(ast, qualifier)?,
        "parent" => enclosing_class_extends(ast, qualifier).into_iter().next()?,
        _ => Fqn::new(ast.resolved_name(qualifier).unwrap_or(raw)),
    };

    let initial = Fqn::static_member(&class, member, variable, call);
    let mut class_fqn = class;
    for _ in 0..MAX_ANCESTORS {
        let static_form = Fqn::static_member(&class_fqn, member, variable, call);
        if index.get_definition(&static_form, false).is_some() {
            return Some(static_form);
        }
        if call {
            let instance_form = Fqn::instance_member(&class_fqn, member, true);
            if index.get_definition(&instance_form, false).is_some() {
                return Some(instance_form);
            }
        }
        let Some(class_def) = index.get_definition(&class_fqn, false) else {
            break;
        };
        let Some(base) = class_def.extends.first() else {
            break;
        };
        class_fqn = base.clone();
    }
    Some(initial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::index::ProjectIndex;
    use crate::parser::grammar::parse;

    fn resolve_nth(
        source: &str,
        kind: NodeKind,
        nth: usize,
    ) -> Option<String> {
        let ast = parse(source).ast;
        let index = ProjectIndex::new();
        let node = ast
            .preorder()
            .into_iter()
            .filter(|&id| ast.kind(id) == kind)
            .nth(nth)
            .unwrap();
        reference_to_fqn(&ast, &index, node).map(|fqn| fqn.to_string())
    }

    #[test]
    fn test_this_names_enclosing_class() {
        let source = "<?php namespace N; class C { function m() { return $this; } }";
        let ast = parse(source).ast;
        let index = ProjectIndex::new();
        let this = ast
            .preorder()
            .into_iter()
            .find(|&id| ast.kind(id) == NodeKind::Variable && ast.name(id) == Some("this"))
            .unwrap();
        assert_eq!(
            reference_to_fqn(&ast, &index, this).map(|f| f.to_string()),
            Some("N\\C".to_string())
        );
    }

    #[test]
    fn test_plain_variable_is_none() {
        assert_eq!(
            resolve_nth("<?php $x = 1; echo $x;", NodeKind::Variable, 1),
            None
        );
    }

    #[test]
    fn test_function_call_appends_parens() {
        assert_eq!(
            resolve_nth("<?php namespace N; f();", NodeKind::CallExpression, 0),
            Some("N\\f()".to_string())
        );
    }

    #[test]
    fn test_use_function_import_resolution() {
        assert_eq!(
            resolve_nth(
                "<?php namespace N; use function X\\g; g();",
                NodeKind::CallExpression,
                0
            ),
            Some("X\\g()".to_string())
        );
    }

    #[test]
    fn test_name_inside_use_function_clause() {
        // The import name itself references the function.
        assert_eq!(
            resolve_nth(
                "<?php namespace N; use function X\\g;",
                NodeKind::QualifiedName,
                0
            ),
            Some("X\\g()".to_string())
        );
    }

    #[test]
    fn test_name_inside_group_use_clause() {
        assert_eq!(
            resolve_nth("<?php use A\\{B, C};", NodeKind::QualifiedName, 1),
            Some("A\\C".to_string())
        );
    }

    #[test]
    fn test_class_reference_in_new() {
        assert_eq!(
            resolve_nth(
                "<?php namespace N; use App\\Svc; new Svc();",
                NodeKind::QualifiedName,
                1
            ),
            Some("App\\Svc".to_string())
        );
    }

    #[test]
    fn test_constant_fetch() {
        assert_eq!(
            resolve_nth("<?php namespace N; echo MAX_VALUE;", NodeKind::QualifiedName, 0),
            Some("N\\MAX_VALUE".to_string())
        );
        assert_eq!(
            resolve_nth("<?php echo true;", NodeKind::QualifiedName, 0),
            None
        );
    }

    #[test]
    fn test_member_access_without_index_returns_candidate() {
        assert_eq!(
            resolve_nth(
                "<?php class C {} $c = new C; echo $c->x;",
                NodeKind::MemberAccessExpression,
                0
            ),
            Some("C->x".to_string())
        );
    }

    #[test]
    fn test_member_call_on_this() {
        assert_eq!(
            resolve_nth(
                "<?php namespace N; class C { function m() { $this->helper(); } }",
                NodeKind::CallExpression,
                0
            ),
            Some("N\\C->helper()".to_string())
        );
    }

    #[test]
    fn test_scoped_constant_and_static_property() {
        assert_eq!(
            resolve_nth(
                "<?php namespace N; C::FLAG;",
                NodeKind::ScopedPropertyAccessExpression,
                0
            ),
            Some("N\\C::FLAG".to_string())
        );
        assert_eq!(
            resolve_nth(
                "<?php namespace N; C::$count;",
                NodeKind::ScopedPropertyAccessExpression,
                0
            ),
            Some("N\\C::$count".to_string())
        );
    }

    #[test]
    fn test_self_scoped_call() {
        assert_eq!(
            resolve_nth(
                "<?php class C { function m() { self::f(); } }",
                NodeKind::CallExpression,
                0
            ),
            Some("C::f()".to_string())
        );
    }

    #[test]
    fn test_parent_without_base_is_none() {
        assert_eq!(
            resolve_nth(
                "<?php class C { function m() { parent::f(); } }",
                NodeKind::CallExpression,
                0
            ),
            None
        );
    }

    #[test]
    fn test_dynamic_member_is_none() {
        assert_eq!(
            resolve_nth(
                "<?php $c = new C; $c->$dynamic;",
                NodeKind::MemberAccessExpression,
                0
            ),
            None
        );
    }
}
