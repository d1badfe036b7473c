//! Integration tests for the resolution core: end-to-end scenarios over
//! parsed documents and the index, plus the structural invariants the
//! resolver guarantees.

pub mod invariants;

use tower_lsp::lsp_types::Url;

use crate::ast::{Ast, NodeId, NodeKind};
use crate::indexer::{index_document, IndexTier, ProjectIndex};
use crate::parser::PhpDocument;

/// Parses a source string and runs the full indexing pass over it.
pub fn indexed_document(source: &str) -> (PhpDocument, ProjectIndex) {
    let document = PhpDocument::new(
        Url::parse("file:///fixture.php").unwrap(),
        source.to_string(),
        1,
    );
    assert!(
        document.errors.is_empty(),
        "fixture should parse cleanly: {:?}",
        document.errors
    );
    let mut index = ProjectIndex::new();
    index_document(&mut index, &document, IndexTier::Project);
    (document, index)
}

pub fn find_nth(ast: &Ast, kind: NodeKind, nth: usize) -> NodeId {
    ast.preorder()
        .into_iter()
        .filter(|&id| ast.kind(id) == kind)
        .nth(nth)
        .unwrap_or_else(|| panic!("fixture has no {:?} #{}", kind, nth))
}
