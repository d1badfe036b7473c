//! References Capability — find all usages of a symbol.

use tower_lsp::lsp_types::{Location, Position};

use crate::indexer::index::ReadableIndex;
use crate::parser::PhpDocument;

use super::definitions::fqn_at;

pub fn find_references(
    document: &PhpDocument,
    index: &dyn ReadableIndex,
    position: Position,
    include_declaration: bool,
) -> Vec<Location> {
    let ast = &document.ast;
    let Some(node) = document.node_at_position(position) else {
        return Vec::new();
    };
    let Some(fqn) = fqn_at(ast, index, node) else {
        return Vec::new();
    };

    let mut locations = index.references(&fqn).to_vec();
    if include_declaration {
        if let Some(definition) = index.get_definition(&fqn, false) {
            locations.push(definition.location().clone());
        }
    }
    locations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::{index_document, IndexTier, ProjectIndex};
    use tower_lsp::lsp_types::Url;

    #[test]
    fn test_references_from_declaration() {
        let source = "<?php\nclass Widget {}\nnew Widget();\nnew Widget();\n";
        let document = PhpDocument::new(
            Url::parse("file:///test.php").unwrap(),
            source.to_string(),
            1,
        );
        let mut index = ProjectIndex::new();
        index_document(&mut index, &document, IndexTier::Project);

        // Cursor on the class declaration.
        let without = find_references(&document, &index, Position::new(1, 8), false);
        assert_eq!(without.len(), 2);

        let with = find_references(&document, &index, Position::new(1, 8), true);
        assert_eq!(with.len(), 3);
    }
}
