//! PHP AST
//!
//! The arena-backed syntax tree the resolver walks. Nodes live in a slotmap
//! owned by the document and are addressed by lightweight `NodeId` handles;
//! parent pointers are handle-valued, never owning, so the tree is freely
//! shareable read-only.
//!
//! ## Components
//!
//! - **`Ast`**: the arena plus the source text back-reference and the
//!   name-resolution contexts captured at parse time
//! - **`Node`**: kind tag, span, links, identifier/operator payloads
//! - **`NameContext`**: enclosing namespace and `use` alias tables, used to
//!   resolve names that only become available after parsing (doc-comment
//!   type strings)

pub mod kind;

use std::collections::HashMap;
use std::sync::Arc;

use slotmap::{new_key_type, SlotMap};

pub use kind::{NodeKind, Operator};

new_key_type! { pub struct NodeId; }

// ============================================================================
// Span & Flags
// ============================================================================

/// Byte range of a node in the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: u32,
    pub len: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Span {
            start,
            len: end.saturating_sub(start),
        }
    }

    pub fn end(&self) -> u32 {
        self.start + self.len
    }

    pub fn contains(&self, offset: u32) -> bool {
        offset >= self.start && offset < self.end()
    }
}

/// Per-node boolean attributes, packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeFlags(u16);

impl NodeFlags {
    pub const STATIC: NodeFlags = NodeFlags(1 << 0);
    pub const ABSTRACT: NodeFlags = NodeFlags(1 << 1);
    pub const BY_REF: NodeFlags = NodeFlags(1 << 2);
    pub const VARIADIC: NodeFlags = NodeFlags(1 << 3);
    /// A `Parameter` whose first child is its type hint.
    pub const HAS_TYPE_HINT: NodeFlags = NodeFlags(1 << 4);
    /// Ternary without a middle branch (`a ?: c`).
    pub const SHORT_TERNARY: NodeFlags = NodeFlags(1 << 5);
    /// `use function ...`
    pub const FUNCTION_USE: NodeFlags = NodeFlags(1 << 6);
    /// `use const ...`
    pub const CONST_USE: NodeFlags = NodeFlags(1 << 7);
    /// Anonymous class (`new class { ... }`).
    pub const ANONYMOUS: NodeFlags = NodeFlags(1 << 8);
    /// Scoped access member written as a variable (`C::$prop`).
    pub const VARIABLE_MEMBER: NodeFlags = NodeFlags(1 << 9);
    /// Array element with an explicit `key =>`.
    pub const HAS_KEY: NodeFlags = NodeFlags(1 << 10);
    /// Numeric literal with a fractional part or exponent.
    pub const FLOAT: NodeFlags = NodeFlags(1 << 11);

    pub fn insert(&mut self, flag: NodeFlags) {
        self.0 |= flag.0;
    }

    pub fn contains(&self, flag: NodeFlags) -> bool {
        self.0 & flag.0 != 0
    }
}

// ============================================================================
// Node
// ============================================================================

/// Index of a `NameContext` in `Ast::contexts`.
pub type ContextId = u32;

/// One node of the tree. Text is not stored here: it is sliced from the
/// document source through the span.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Identifier payload: declaration name, member name, variable name
    /// (without `$`), cast keyword, or group-use prefix.
    pub name: Option<String>,
    /// The fully-qualified form the parser computed from `use` clauses and
    /// the enclosing namespace. Present on qualified names and declaration
    /// nodes; absent for keywords (`self`, `static`, `parent`) and
    /// anonymous declarations.
    pub resolved_name: Option<String>,
    pub operator: Option<Operator>,
    /// Raw `/** ... */` text attached to a declaration.
    pub doc_comment: Option<String>,
    pub context: ContextId,
    pub flags: NodeFlags,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Node {
            kind,
            span,
            parent: None,
            children: Vec::new(),
            name: None,
            resolved_name: None,
            operator: None,
            doc_comment: None,
            context: 0,
            flags: NodeFlags::default(),
        }
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(NodeFlags::STATIC)
    }
}

// ============================================================================
// Name contexts
// ============================================================================

/// Namespace and `use` alias tables in force at a point of the document.
/// Qualified names in the tree already carry their resolved form; this is
/// kept so later passes (doc-comment types) can resolve names the parser
/// never saw.
#[derive(Debug, Clone, Default)]
pub struct NameContext {
    pub namespace: Option<String>,
    /// alias → fully qualified name, per import category.
    pub class_aliases: HashMap<String, String>,
    pub function_aliases: HashMap<String, String>,
    pub const_aliases: HashMap<String, String>,
}

impl NameContext {
    /// Resolves a class-position name. Returns `None` for the relative
    /// keywords `self`, `static` and `parent`, which only the resolver can
    /// interpret.
    pub fn resolve_class(&self, raw: &str) -> Option<String> {
        if let Some(absolute) = raw.strip_prefix('\\') {
            return Some(absolute.to_string());
        }
        let lower = raw.to_ascii_lowercase();
        if matches!(lower.as_str(), "self" | "static" | "parent") {
            return None;
        }
        Some(self.resolve_with(&self.class_aliases, raw))
    }

    /// Resolves a call-position name. Unqualified names check the
    /// function-import table first; the global fallback for the remaining
    /// ambiguity happens at index lookup time.
    pub fn resolve_function(&self, raw: &str) -> String {
        if let Some(absolute) = raw.strip_prefix('\\') {
            return absolute.to_string();
        }
        if !raw.contains('\\') {
            if let Some(target) = self.function_aliases.get(raw) {
                return target.clone();
            }
        }
        self.resolve_with(&self.class_aliases, raw)
    }

    /// Resolves a constant-position name. `true`/`false`/`null` stay bare.
    pub fn resolve_const(&self, raw: &str) -> String {
        if let Some(absolute) = raw.strip_prefix('\\') {
            return absolute.to_string();
        }
        let lower = raw.to_ascii_lowercase();
        if matches!(lower.as_str(), "true" | "false" | "null") {
            return raw.to_string();
        }
        if !raw.contains('\\') {
            if let Some(target) = self.const_aliases.get(raw) {
                return target.clone();
            }
        }
        self.resolve_with(&self.class_aliases, raw)
    }

    /// Prepends a namespaced name to a bare one.
    pub fn qualify(&self, name: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{}\\{}", ns, name),
            None => name.to_string(),
        }
    }

    fn resolve_with(&self, aliases: &HashMap<String, String>, raw: &str) -> String {
        let (first, rest) = match raw.split_once('\\') {
            Some((first, rest)) => (first, Some(rest)),
            None => (raw, None),
        };
        if let Some(target) = aliases.get(first) {
            return match rest {
                Some(rest) => format!("{}\\{}", target, rest),
                None => target.clone(),
            };
        }
        self.qualify(raw)
    }
}

// ============================================================================
// Ast
// ============================================================================

/// The arena tree for one document.
#[derive(Debug)]
pub struct Ast {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
    source: Arc<str>,
    contexts: Vec<NameContext>,
}

impl Ast {
    pub(crate) fn new(source: Arc<str>) -> Self {
        let mut nodes: SlotMap<NodeId, Node> = SlotMap::with_key();
        let len = source.len() as u32;
        let root = nodes.insert(Node::new(NodeKind::SourceFile, Span::new(0, len)));
        Ast {
            nodes,
            root,
            source,
            contexts: vec![NameContext::default()],
        }
    }

    /// Inserts a fully-built node, wiring its children's parent handles.
    pub(crate) fn insert(&mut self, node: Node) -> NodeId {
        let children = node.children.clone();
        let id = self.nodes.insert(node);
        for child in children {
            self.nodes[child].parent = Some(id);
        }
        id
    }

    pub(crate) fn set_root_children(&mut self, children: Vec<NodeId>) {
        let root = self.root;
        for &child in &children {
            self.nodes[child].parent = Some(root);
        }
        self.nodes[root].children = children;
    }

    pub(crate) fn push_context(&mut self, context: NameContext) -> ContextId {
        self.contexts.push(context);
        (self.contexts.len() - 1) as ContextId
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// The node's text, sliced from the document contents.
    pub fn text(&self, id: NodeId) -> &str {
        let span = self.nodes[id].span;
        &self.source[span.start as usize..span.end() as usize]
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes[id].name.as_deref()
    }

    pub fn resolved_name(&self, id: NodeId) -> Option<&str> {
        self.nodes[id].resolved_name.as_deref()
    }

    pub fn doc_comment(&self, id: NodeId) -> Option<&str> {
        self.nodes[id].doc_comment.as_deref()
    }

    pub fn context(&self, id: NodeId) -> &NameContext {
        &self.contexts[self.nodes[id].context as usize]
    }

    // ========================================================================
    // Walkers
    // ========================================================================

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// Nearest ancestor with one of the given kinds.
    pub fn first_ancestor(&self, id: NodeId, kinds: &[NodeKind]) -> Option<NodeId> {
        self.ancestors(id).find(|&n| kinds.contains(&self.kind(n)))
    }

    /// Nearest enclosing `ClassDeclaration`; resolves `$this`, `self`,
    /// `static` and `parent`.
    pub fn enclosing_class(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .find(|&n| self.kind(n) == NodeKind::ClassDeclaration)
    }

    /// Nearest enclosing class, interface or trait.
    pub fn enclosing_class_like(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id).find(|&n| self.kind(n).is_class_like())
    }

    /// Siblings before `id` under its parent, closest first.
    pub fn preceding_siblings(&self, id: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(id) else {
            return Vec::new();
        };
        let siblings = self.children(parent);
        let Some(pos) = siblings.iter().position(|&n| n == id) else {
            return Vec::new();
        };
        siblings[..pos].iter().rev().copied().collect()
    }

    /// Deepest node whose span contains `offset`.
    pub fn node_at_offset(&self, offset: u32) -> Option<NodeId> {
        if !self.nodes[self.root].span.contains(offset) {
            return None;
        }
        let mut current = self.root;
        'descend: loop {
            for &child in self.children(current) {
                if self.nodes[child].span.contains(offset) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids, preorder from the root.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            for &child in self.children(id).iter().rev() {
                stack.push(child);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_context_alias_resolution() {
        let mut ctx = NameContext {
            namespace: Some("App".to_string()),
            ..NameContext::default()
        };
        ctx.class_aliases
            .insert("Svc".to_string(), "Vendor\\Service".to_string());

        assert_eq!(ctx.resolve_class("Svc").as_deref(), Some("Vendor\\Service"));
        assert_eq!(
            ctx.resolve_class("Svc\\Inner").as_deref(),
            Some("Vendor\\Service\\Inner")
        );
        assert_eq!(ctx.resolve_class("Local").as_deref(), Some("App\\Local"));
        assert_eq!(ctx.resolve_class("\\Global\\X").as_deref(), Some("Global\\X"));
        assert_eq!(ctx.resolve_class("self"), None);
        assert_eq!(ctx.resolve_class("STATIC"), None);
    }

    #[test]
    fn test_name_context_function_and_const() {
        let mut ctx = NameContext {
            namespace: Some("N".to_string()),
            ..NameContext::default()
        };
        ctx.function_aliases
            .insert("g".to_string(), "X\\g".to_string());

        assert_eq!(ctx.resolve_function("g"), "X\\g");
        assert_eq!(ctx.resolve_function("h"), "N\\h");
        assert_eq!(ctx.resolve_const("MAX"), "N\\MAX");
        assert_eq!(ctx.resolve_const("true"), "true");
        assert_eq!(ctx.resolve_const("\\PHP_EOL"), "PHP_EOL");
    }

    #[test]
    fn test_span_contains() {
        let span = Span::new(4, 10);
        assert!(!span.contains(3));
        assert!(span.contains(4));
        assert!(span.contains(9));
        assert!(!span.contains(10));
    }
}
