//! Document Indexing Pass
//!
//! One walk over a parsed document: every declaration node goes through the
//! name builder and the definition builder into the index, and every
//! reference-position node records its resolved FQN with its location.
//! Re-indexing first drops everything the previous revision of the
//! document contributed.

use log::debug;
use tower_lsp::lsp_types::Location;

use crate::ast::NodeKind;
use crate::indexer::definition::create_definition;
use crate::indexer::index::ProjectIndex;
use crate::parser::PhpDocument;
use crate::resolver::{defined_fqn, reference_to_fqn};
use crate::types::Fqn;

/// Which tier of the index a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexTier {
    Project,
    Dependencies,
}

/// Parses nothing: the document is already parsed. Replaces the document's
/// contribution to the index.
pub fn index_document(index: &mut ProjectIndex, document: &PhpDocument, tier: IndexTier) {
    let uri = &document.uri;
    index.remove_document(uri);

    let ast = &document.ast;

    // Definition pass: name each declaration, package it, insert.
    let declarations: Vec<(crate::ast::NodeId, Fqn)> = ast
        .preorder()
        .into_iter()
        .filter_map(|id| defined_fqn(ast, id).map(|fqn| (id, fqn)))
        .collect();
    debug!("indexing {}: {} declarations", uri, declarations.len());

    for (node, fqn) in declarations {
        let definition = create_definition(document, &*index, node, fqn.clone());
        match tier {
            IndexTier::Project => index.project.set_definition(fqn, definition),
            IndexTier::Dependencies => index.dependencies.set_definition(fqn, definition),
        }
    }

    // Reference pass: resolve every reference-position node.
    let mut references: Vec<(Fqn, Location)> = Vec::new();
    for id in ast.preorder() {
        let is_reference_position = match ast.kind(id) {
            // Keyword names (type-hint primitives, self/static/parent)
            // carry no resolved name and are not recorded.
            NodeKind::QualifiedName => ast.resolved_name(id).is_some(),
            NodeKind::MemberAccessExpression | NodeKind::ScopedPropertyAccessExpression => true,
            // `$this` references its class; other variables are local.
            NodeKind::Variable => ast.name(id) == Some("this"),
            _ => false,
        };
        if !is_reference_position {
            continue;
        }
        if let Some(fqn) = reference_to_fqn(ast, &*index, id) {
            references.push((
                fqn,
                Location {
                    uri: uri.clone(),
                    range: document.node_range(id),
                },
            ));
        }
    }

    for (fqn, location) in references {
        match tier {
            IndexTier::Project => index.project.add_reference(fqn, location),
            IndexTier::Dependencies => index.dependencies.add_reference(fqn, location),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::index::ReadableIndex;
    use tower_lsp::lsp_types::Url;

    fn indexed(source: &str) -> (ProjectIndex, PhpDocument) {
        let document = PhpDocument::new(
            Url::parse("file:///test.php").unwrap(),
            source.to_string(),
            1,
        );
        let mut index = ProjectIndex::new();
        index_document(&mut index, &document, IndexTier::Project);
        (index, document)
    }

    #[test]
    fn test_declarations_become_definitions() {
        let (index, _) = indexed(
            "<?php namespace A\\B; class C { public function m() {} public $x = 1; }",
        );
        for fqn in ["A\\B", "A\\B\\C", "A\\B\\C->m()", "A\\B\\C->x"] {
            let definition = index.get_definition(&Fqn::new(fqn), false).unwrap();
            assert_eq!(definition.fqn, Fqn::new(fqn));
        }
    }

    #[test]
    fn test_references_recorded() {
        let (index, _) = indexed("<?php class C {} $c = new C; $c->m();");
        assert_eq!(ReadableIndex::references(&index, &Fqn::new("C")).len(), 1);
        assert_eq!(
            ReadableIndex::references(&index, &Fqn::new("C->m()")).len(),
            1
        );
    }

    #[test]
    fn test_reindex_replaces_contribution() {
        let (mut index, mut document) = indexed("<?php class Old {}");
        assert!(index.get_definition(&Fqn::new("Old"), false).is_some());

        document.update("<?php class New {}".to_string(), 2);
        index_document(&mut index, &document, IndexTier::Project);

        assert!(index.get_definition(&Fqn::new("Old"), false).is_none());
        assert!(index.get_definition(&Fqn::new("New"), false).is_some());
    }

    #[test]
    fn test_use_clause_records_reference() {
        let (index, _) = indexed("<?php namespace N; use App\\Svc; new Svc();");
        // Once for the import, once for the instantiation.
        assert_eq!(
            ReadableIndex::references(&index, &Fqn::new("App\\Svc")).len(),
            2
        );
    }

    #[test]
    fn test_dependency_tier_is_shadowed() {
        let dep = PhpDocument::new(
            Url::parse("file:///vendor/lib.php").unwrap(),
            "<?php class C { const K = 1; }".to_string(),
            1,
        );
        let proj = PhpDocument::new(
            Url::parse("file:///src/app.php").unwrap(),
            "<?php class C { const K = 2; }".to_string(),
            1,
        );
        let mut index = ProjectIndex::new();
        index_document(&mut index, &dep, IndexTier::Dependencies);
        index_document(&mut index, &proj, IndexTier::Project);

        let hit = index.get_definition(&Fqn::new("C"), false).unwrap();
        assert_eq!(hit.location().uri.path(), "/src/app.php");
    }
}
