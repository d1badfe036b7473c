//! Hover Capability
//!
//! Renders the declaration line, documentation summary and inferred type
//! of the symbol under the cursor as markdown.

use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position};

use crate::ast::NodeKind;
use crate::indexer::index::ReadableIndex;
use crate::inferrer::TypeInferrer;
use crate::parser::PhpDocument;
use crate::resolver::find_variable_definition;

use super::definitions::{fqn_at, wants_global_fallback};

pub fn hover(
    document: &PhpDocument,
    index: &dyn ReadableIndex,
    position: Position,
) -> Option<Hover> {
    let ast = &document.ast;
    let node = document.node_at_position(position)?;

    // Local variables render their inferred type.
    if ast.kind(node) == NodeKind::Variable && ast.name(node) != Some("this") {
        find_variable_definition(ast, node)?;
        let inferrer = TypeInferrer::new(ast, index);
        let ty = inferrer.type_from_expression(node);
        let name = ast.name(node)?;
        return Some(markdown_hover(
            document,
            node,
            format!("```php\n${}\n```\n\n_Type:_ `{}`", name, ty),
        ));
    }

    let fqn = fqn_at(ast, index, node)?;
    let definition = index.get_definition(&fqn, wants_global_fallback(ast, node))?;

    let mut value = format!("```php\n{}\n```", definition.declaration_line);
    if let Some(documentation) = &definition.documentation {
        value.push_str("\n\n");
        value.push_str(documentation);
    }
    value.push_str(&format!("\n\n_Type:_ `{}`", definition.ty));

    Some(markdown_hover(document, node, value))
}

fn markdown_hover(document: &PhpDocument, node: crate::ast::NodeId, value: String) -> Hover {
    Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value,
        }),
        range: Some(document.node_range(node)),
    }
}
