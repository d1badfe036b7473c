//! PHP Document
//!
//! A parsed document: source text, version, the arena AST, and the
//! line-offset table used to convert between byte offsets and LSP
//! positions.

use std::cmp;

use tower_lsp::lsp_types::{Position, Range, Url};

use crate::ast::{Ast, NodeId, Span};

use super::grammar::{parse, ParseError};

pub struct PhpDocument {
    pub uri: Url,
    pub content: String,
    pub version: i32,
    pub ast: Ast,
    pub errors: Vec<ParseError>,
    /// Byte offset at the start of each line; the last element is the total
    /// content length.
    line_offsets: Vec<usize>,
}

impl PhpDocument {
    pub fn new(uri: Url, content: String, version: i32) -> Self {
        let parse = parse(&content);
        let mut doc = PhpDocument {
            uri,
            content,
            version,
            ast: parse.ast,
            errors: parse.errors,
            line_offsets: Vec::new(),
        };
        doc.compute_line_offsets();
        doc
    }

    /// Replaces the content and re-parses.
    pub fn update(&mut self, content: String, version: i32) {
        let parse = parse(&content);
        self.content = content;
        self.version = version;
        self.ast = parse.ast;
        self.errors = parse.errors;
        self.compute_line_offsets();
    }

    fn compute_line_offsets(&mut self) {
        self.line_offsets = vec![0];
        let mut offset = 0;
        for c in self.content.chars() {
            offset += c.len_utf8();
            if c == '\n' {
                self.line_offsets.push(offset);
            }
        }
        if self.line_offsets.last() != Some(&self.content.len()) {
            self.line_offsets.push(self.content.len());
        }
    }

    pub fn offset_to_position(&self, offset: usize) -> Position {
        let offset = cmp::min(offset, self.content.len());
        let line_index = match self.line_offsets.binary_search(&offset) {
            Ok(exact) => exact,
            Err(after) => after - 1,
        };
        let line_index = line_index.min(self.line_offsets.len() - 1);
        let line_start = self.line_offsets[line_index];
        let character = self.content[line_start..offset].chars().count();
        Position::new(line_index as u32, character as u32)
    }

    pub fn position_to_offset(&self, position: Position) -> usize {
        let line = position.line as usize;
        if line >= self.line_offsets.len() - 1 {
            return self.content.len();
        }
        let line_start = self.line_offsets[line];
        let line_end = self.line_offsets[line + 1];
        let target_char = position.character as usize;

        let mut byte_offset = 0;
        for (chars_seen, c) in self.content[line_start..line_end].chars().enumerate() {
            if chars_seen >= target_char || c == '\n' {
                break;
            }
            byte_offset += c.len_utf8();
        }
        line_start + byte_offset
    }

    pub fn span_to_range(&self, span: Span) -> Range {
        Range::new(
            self.offset_to_position(span.start as usize),
            self.offset_to_position(span.end() as usize),
        )
    }

    pub fn node_range(&self, id: NodeId) -> Range {
        self.span_to_range(self.ast.node(id).span)
    }

    /// Deepest node at an LSP position.
    pub fn node_at_position(&self, position: Position) -> Option<NodeId> {
        let offset = self.position_to_offset(position);
        self.ast.node_at_offset(offset as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str) -> PhpDocument {
        PhpDocument::new(
            Url::parse("file:///test.php").unwrap(),
            content.to_string(),
            1,
        )
    }

    #[test]
    fn test_offset_position_round_trip() {
        let document = doc("<?php\n$a = 1;\n$b = 2;\n");
        let position = document.offset_to_position(7);
        assert_eq!(position, Position::new(1, 1));
        assert_eq!(document.position_to_offset(position), 7);
    }

    #[test]
    fn test_position_past_end_clamps() {
        let document = doc("<?php $a = 1;");
        assert_eq!(
            document.position_to_offset(Position::new(10, 0)),
            document.content.len()
        );
    }

    #[test]
    fn test_node_at_position() {
        let document = doc("<?php\n$abc = 1;\n");
        let node = document.node_at_position(Position::new(1, 1)).unwrap();
        assert_eq!(document.ast.text(node), "$abc");
    }
}
