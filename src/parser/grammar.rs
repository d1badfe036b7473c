//! PHP Grammar
//!
//! Recursive-descent parser producing the arena AST in a single pass. Name
//! resolution happens here as well: the parser tracks the enclosing
//! namespace and the `use` alias tables, and stamps every qualified name
//! with its resolved form according to its syntactic position (call,
//! class or constant). The parser is tolerant: unexpected input is recorded
//! as a `ParseError` and skipped, and an AST is always produced.

use std::sync::Arc;

use crate::ast::{Ast, ContextId, NameContext, Node, NodeFlags, NodeId, NodeKind, Operator, Span};

use super::lexer::{tokenize, Token, TokenKind};

/// A recoverable syntax error with the byte offset it was noticed at.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub offset: u32,
    pub message: String,
}

/// Result of parsing one document.
#[derive(Debug)]
pub struct Parse {
    pub ast: Ast,
    pub errors: Vec<ParseError>,
}

pub fn parse(source: &str) -> Parse {
    let text: Arc<str> = Arc::from(source);
    let tokens = tokenize(source);
    let mut parser = Parser {
        src: source,
        tokens,
        pos: 0,
        ast: Ast::new(text),
        ctx: NameContext::default(),
        ctx_id: 0,
        errors: Vec::new(),
    };
    parser.run();
    Parse {
        ast: parser.ast,
        errors: parser.errors,
    }
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    ast: Ast,
    ctx: NameContext,
    ctx_id: ContextId,
    errors: Vec<ParseError>,
}

// Binding powers for the Pratt expression loop. Right-associative operators
// reuse their left binding power as the right one.
const BP_ASSIGN: u8 = 2;
const BP_TERNARY: u8 = 4;
const BP_COALESCE: u8 = 6;
const BP_UNARY: u8 = 30;

impl<'a> Parser<'a> {
    // ========================================================================
    // Token access
    // ========================================================================

    fn peek(&self) -> TokenKind {
        self.tokens[self.pos].kind
    }

    fn peek_at(&self, ahead: usize) -> TokenKind {
        self.tokens
            .get(self.pos + ahead)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn token_text(&self, index: usize) -> &'a str {
        let token = &self.tokens[index];
        &self.src[token.start as usize..token.end as usize]
    }

    fn current_text(&self) -> &'a str {
        self.token_text(self.pos)
    }

    /// Case-insensitive keyword check on the current identifier token.
    fn at_kw(&self, keyword: &str) -> bool {
        self.peek() == TokenKind::Ident && self.current_text().eq_ignore_ascii_case(keyword)
    }

    fn kw_at(&self, ahead: usize, keyword: &str) -> bool {
        self.peek_at(ahead) == TokenKind::Ident
            && self
                .token_text(self.pos + ahead)
                .eq_ignore_ascii_case(keyword)
    }

    fn start(&self) -> u32 {
        self.tokens[self.pos].start
    }

    fn prev_end(&self) -> u32 {
        if self.pos == 0 {
            return 0;
        }
        self.tokens[self.pos - 1].end
    }

    fn bump(&mut self) -> usize {
        let index = self.pos;
        if self.peek() != TokenKind::Eof {
            self.pos += 1;
        }
        index
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error(format!(
            "expected {:?}, found {:?}",
            kind,
            self.peek()
        ));
        false
    }

    fn error(&mut self, message: String) {
        self.errors.push(ParseError {
            offset: self.start(),
            message,
        });
    }

    /// Doc-block attached to the current token, if any.
    fn take_doc(&mut self) -> Option<String> {
        self.tokens[self.pos].doc.take().map(String::from)
    }

    // ========================================================================
    // Node construction
    // ========================================================================

    fn build(&mut self, kind: NodeKind, start: u32, children: Vec<NodeId>) -> Node {
        let mut node = Node::new(kind, Span::new(start, self.prev_end()));
        node.children = children;
        node.context = self.ctx_id;
        node
    }

    fn add(&mut self, node: Node) -> NodeId {
        self.ast.insert(node)
    }

    fn refresh_context(&mut self) {
        self.ctx_id = self.ast.push_context(self.ctx.clone());
    }

    // ========================================================================
    // Top level
    // ========================================================================

    fn run(&mut self) {
        let mut top = Vec::new();
        loop {
            match self.peek() {
                TokenKind::Eof => break,
                TokenKind::OpenTag | TokenKind::CloseTag => {
                    self.bump();
                }
                TokenKind::InlineHtml => {
                    let start = self.start();
                    self.bump();
                    let node = self.build(NodeKind::InlineHtml, start, vec![]);
                    top.push(self.add(node));
                }
                _ => {
                    if let Some(statement) = self.parse_statement() {
                        top.push(statement);
                    }
                }
            }
        }
        self.ast.set_root_children(top);
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Parses one statement. Always makes progress: on failure at least one
    /// token is consumed.
    fn parse_statement(&mut self) -> Option<NodeId> {
        let doc = self.take_doc();
        let start = self.start();

        if self.peek() == TokenKind::Ident {
            if self.at_kw("namespace") && !matches!(self.peek_at(1), TokenKind::Backslash) {
                return self.parse_namespace(start);
            }
            if self.at_kw("use") {
                return Some(self.parse_use(start));
            }
            if self.at_kw("abstract") || self.at_kw("final") {
                // Look past modifiers for a class declaration.
                let mut ahead = 1;
                while self.kw_at(ahead, "abstract") || self.kw_at(ahead, "final") {
                    ahead += 1;
                }
                if self.kw_at(ahead, "class") {
                    for _ in 0..ahead {
                        self.bump();
                    }
                    self.bump(); // class
                    return Some(self.parse_class_declaration(start, doc, false));
                }
            }
            if self.at_kw("class") && self.peek_at(1) == TokenKind::Ident {
                self.bump();
                return Some(self.parse_class_declaration(start, doc, false));
            }
            if self.at_kw("interface") && self.peek_at(1) == TokenKind::Ident {
                self.bump();
                return Some(self.parse_interface_declaration(start, doc));
            }
            if self.at_kw("trait") && self.peek_at(1) == TokenKind::Ident {
                self.bump();
                return Some(self.parse_trait_declaration(start, doc));
            }
            if self.at_kw("function")
                && matches!(self.peek_at(1), TokenKind::Ident)
                || (self.at_kw("function")
                    && self.peek_at(1) == TokenKind::Amp
                    && self.peek_at(2) == TokenKind::Ident)
            {
                self.bump();
                return Some(self.parse_function_declaration(start, doc));
            }
            if self.at_kw("const") {
                self.bump();
                return Some(self.parse_const_declaration(start, doc, false));
            }
            if self.at_kw("echo") {
                self.bump();
                return Some(self.parse_echo(start));
            }
            if self.at_kw("return") {
                self.bump();
                return Some(self.parse_return(start));
            }
            if self.at_kw("if") {
                self.bump();
                return self.parse_if(start);
            }
            if self.at_kw("while") {
                self.bump();
                return self.parse_while(start);
            }
            if self.at_kw("foreach") {
                self.bump();
                return self.parse_foreach(start);
            }
        }

        match self.peek() {
            TokenKind::LBrace => Some(self.parse_compound()),
            TokenKind::Semicolon => {
                self.bump();
                None
            }
            _ => {
                let expr = self.parse_expr(0);
                match expr {
                    Some(expr) => {
                        self.eat(TokenKind::Semicolon);
                        let mut node =
                            self.build(NodeKind::ExpressionStatement, start, vec![expr]);
                        node.doc_comment = doc;
                        Some(self.add(node))
                    }
                    None => {
                        // Guarantee progress.
                        self.bump();
                        None
                    }
                }
            }
        }
    }

    fn parse_compound(&mut self) -> NodeId {
        let start = self.start();
        self.expect(TokenKind::LBrace);
        let mut statements = Vec::new();
        while !matches!(self.peek(), TokenKind::RBrace | TokenKind::Eof) {
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
        }
        self.expect(TokenKind::RBrace);
        let node = self.build(NodeKind::CompoundStatement, start, statements);
        self.add(node)
    }

    fn parse_echo(&mut self, start: u32) -> NodeId {
        let mut exprs = Vec::new();
        loop {
            if let Some(expr) = self.parse_expr(0) {
                exprs.push(expr);
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.eat(TokenKind::Semicolon);
        let node = self.build(NodeKind::EchoStatement, start, exprs);
        self.add(node)
    }

    fn parse_return(&mut self, start: u32) -> NodeId {
        let mut children = Vec::new();
        if !matches!(self.peek(), TokenKind::Semicolon | TokenKind::Eof) {
            if let Some(expr) = self.parse_expr(0) {
                children.push(expr);
            }
        }
        self.eat(TokenKind::Semicolon);
        let node = self.build(NodeKind::ReturnStatement, start, children);
        self.add(node)
    }

    fn parse_if(&mut self, start: u32) -> Option<NodeId> {
        self.expect(TokenKind::LParen);
        let cond = self.parse_expr(0)?;
        self.expect(TokenKind::RParen);
        let then = self.parse_statement()?;
        let mut children = vec![cond, then];

        if self.at_kw("elseif") {
            let elseif_start = self.start();
            self.bump();
            if let Some(nested) = self.parse_if(elseif_start) {
                children.push(nested);
            }
        } else if self.at_kw("else") {
            self.bump();
            if self.at_kw("if") {
                let elseif_start = self.start();
                self.bump();
                if let Some(nested) = self.parse_if(elseif_start) {
                    children.push(nested);
                }
            } else if let Some(alt) = self.parse_statement() {
                children.push(alt);
            }
        }
        let node = self.build(NodeKind::IfStatement, start, children);
        Some(self.add(node))
    }

    fn parse_while(&mut self, start: u32) -> Option<NodeId> {
        self.expect(TokenKind::LParen);
        let cond = self.parse_expr(0)?;
        self.expect(TokenKind::RParen);
        let body = self.parse_statement()?;
        let node = self.build(NodeKind::WhileStatement, start, vec![cond, body]);
        Some(self.add(node))
    }

    fn parse_foreach(&mut self, start: u32) -> Option<NodeId> {
        self.expect(TokenKind::LParen);
        let collection = self.parse_expr(0)?;
        let mut children = vec![collection];
        if self.at_kw("as") {
            self.bump();
            self.eat(TokenKind::Amp);
            if let Some(first) = self.parse_expr(BP_TERNARY) {
                children.push(first);
                if self.eat(TokenKind::DoubleArrow) {
                    self.eat(TokenKind::Amp);
                    if let Some(value) = self.parse_expr(BP_TERNARY) {
                        children.push(value);
                    }
                }
            }
        }
        self.expect(TokenKind::RParen);
        if let Some(body) = self.parse_statement() {
            children.push(body);
        }
        let node = self.build(NodeKind::ForeachStatement, start, children);
        Some(self.add(node))
    }

    // ========================================================================
    // Namespaces & use declarations
    // ========================================================================

    fn parse_namespace(&mut self, start: u32) -> Option<NodeId> {
        self.bump(); // namespace
        let name = if self.peek() == TokenKind::Ident {
            Some(self.parse_plain_name_path())
        } else {
            None
        };

        if self.eat(TokenKind::LBrace) {
            let saved = self.ctx.clone();
            self.ctx = NameContext {
                namespace: name.clone(),
                ..NameContext::default()
            };
            self.refresh_context();

            let mut statements = Vec::new();
            while !matches!(self.peek(), TokenKind::RBrace | TokenKind::Eof) {
                if let Some(statement) = self.parse_statement() {
                    statements.push(statement);
                }
            }
            self.expect(TokenKind::RBrace);

            let mut node = self.build(NodeKind::NamespaceDefinition, start, statements);
            node.name = name.clone();
            node.resolved_name = name;
            let id = self.add(node);

            self.ctx = saved;
            self.refresh_context();
            return Some(id);
        }

        self.eat(TokenKind::Semicolon);
        // The statement form resets the import tables for the rest of the
        // document (or until the next namespace statement).
        self.ctx = NameContext {
            namespace: name.clone(),
            ..NameContext::default()
        };
        self.refresh_context();

        let mut node = self.build(NodeKind::NamespaceDefinition, start, vec![]);
        node.name = name.clone();
        node.resolved_name = name;
        Some(self.add(node))
    }

    fn parse_use(&mut self, start: u32) -> NodeId {
        self.bump(); // use
        let mut flags = NodeFlags::default();
        if self.at_kw("function") && self.peek_at(1) != TokenKind::LParen {
            flags.insert(NodeFlags::FUNCTION_USE);
            self.bump();
        } else if self.at_kw("const") {
            flags.insert(NodeFlags::CONST_USE);
            self.bump();
        }
        let is_function = flags.contains(NodeFlags::FUNCTION_USE);
        let is_const = flags.contains(NodeFlags::CONST_USE);

        let mut children = Vec::new();
        loop {
            let clause_start = self.start();
            self.eat(TokenKind::Backslash);
            let mut path = String::new();
            let mut group = None;
            while self.peek() == TokenKind::Ident {
                if !path.is_empty() {
                    path.push('\\');
                }
                path.push_str(self.current_text());
                self.bump();
                if self.peek() == TokenKind::Backslash {
                    if self.peek_at(1) == TokenKind::LBrace {
                        self.bump();
                        self.bump();
                        group = Some(self.parse_use_group(&path, clause_start, is_function, is_const));
                        break;
                    }
                    if self.peek_at(1) == TokenKind::Ident {
                        self.bump();
                        continue;
                    }
                }
                break;
            }

            match group {
                Some(group_clause) => children.push(group_clause),
                None if !path.is_empty() => {
                    let alias = if self.at_kw("as") {
                        self.bump();
                        let token = self.bump();
                        Some(self.token_text(token).to_string())
                    } else {
                        None
                    };
                    let mut qn = self.build(NodeKind::QualifiedName, clause_start, vec![]);
                    qn.name = Some(path.clone());
                    qn.resolved_name = Some(path.clone());
                    children.push(self.add(qn));
                    self.record_import(&path, alias, is_function, is_const);
                }
                None => {
                    self.error("expected import path".to_string());
                    break;
                }
            }

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.eat(TokenKind::Semicolon);
        self.refresh_context();

        let mut node = self.build(NodeKind::NamespaceUseDeclaration, start, children);
        node.flags = flags;
        self.add(node)
    }

    fn parse_use_group(
        &mut self,
        prefix: &str,
        start: u32,
        is_function: bool,
        is_const: bool,
    ) -> NodeId {
        let mut members = Vec::new();
        while !matches!(self.peek(), TokenKind::RBrace | TokenKind::Eof) {
            // Per-member `function`/`const` qualifiers are accepted and
            // folded into the clause's category.
            let member_function = if self.at_kw("function") {
                self.bump();
                true
            } else {
                is_function
            };
            let member_const = if self.at_kw("const") {
                self.bump();
                true
            } else {
                is_const
            };

            let member_start = self.start();
            let mut member = String::new();
            while self.peek() == TokenKind::Ident {
                if !member.is_empty() {
                    member.push('\\');
                }
                member.push_str(self.current_text());
                self.bump();
                if self.peek() == TokenKind::Backslash && self.peek_at(1) == TokenKind::Ident {
                    self.bump();
                    continue;
                }
                break;
            }
            if member.is_empty() {
                self.bump();
                continue;
            }
            let alias = if self.at_kw("as") {
                self.bump();
                let token = self.bump();
                Some(self.token_text(token).to_string())
            } else {
                None
            };

            let mut qn = self.build(NodeKind::QualifiedName, member_start, vec![]);
            qn.name = Some(member.clone());
            qn.resolved_name = Some(member.clone());
            members.push(self.add(qn));

            let full = format!("{}\\{}", prefix, member);
            self.record_import(&full, alias, member_function, member_const);

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace);

        let mut node = self.build(NodeKind::NamespaceUseGroupClause, start, members);
        node.name = Some(prefix.to_string());
        self.add(node)
    }

    fn record_import(&mut self, path: &str, alias: Option<String>, function: bool, constant: bool) {
        let alias =
            alias.unwrap_or_else(|| path.rsplit('\\').next().unwrap_or(path).to_string());
        let table = if function {
            &mut self.ctx.function_aliases
        } else if constant {
            &mut self.ctx.const_aliases
        } else {
            &mut self.ctx.class_aliases
        };
        table.insert(alias, path.to_string());
    }

    /// `A\B\C` without a leading backslash; used for namespace names.
    fn parse_plain_name_path(&mut self) -> String {
        let mut path = String::new();
        while self.peek() == TokenKind::Ident {
            if !path.is_empty() {
                path.push('\\');
            }
            path.push_str(self.current_text());
            self.bump();
            if self.peek() == TokenKind::Backslash && self.peek_at(1) == TokenKind::Ident {
                self.bump();
                continue;
            }
            break;
        }
        path
    }

    // ========================================================================
    // Class-like declarations
    // ========================================================================

    fn parse_class_declaration(&mut self, start: u32, doc: Option<String>, anonymous: bool) -> NodeId {
        let mut name = None;
        let mut resolved = None;
        if !anonymous && self.peek() == TokenKind::Ident {
            let token = self.bump();
            let text = self.token_text(token).to_string();
            resolved = Some(self.ctx.qualify(&text));
            name = Some(text);
        }

        let mut children = Vec::new();
        if self.at_kw("extends") {
            let clause_start = self.start();
            self.bump();
            let mut bases = Vec::new();
            if let Some(base) = self.parse_type_name() {
                bases.push(base);
            }
            let clause = self.build(NodeKind::ClassBaseClause, clause_start, bases);
            children.push(self.add(clause));
        }
        if self.at_kw("implements") {
            let clause_start = self.start();
            self.bump();
            let mut interfaces = Vec::new();
            loop {
                if let Some(interface) = self.parse_type_name() {
                    interfaces.push(interface);
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            let clause = self.build(NodeKind::ClassInterfaceClause, clause_start, interfaces);
            children.push(self.add(clause));
        }

        children.extend(self.parse_class_body());

        let mut node = self.build(NodeKind::ClassDeclaration, start, children);
        node.name = name;
        node.resolved_name = resolved;
        node.doc_comment = doc;
        if anonymous {
            node.flags.insert(NodeFlags::ANONYMOUS);
        }
        self.add(node)
    }

    fn parse_interface_declaration(&mut self, start: u32, doc: Option<String>) -> NodeId {
        let token = self.bump();
        let text = self.token_text(token).to_string();
        let resolved = Some(self.ctx.qualify(&text));

        let mut children = Vec::new();
        if self.at_kw("extends") {
            let clause_start = self.start();
            self.bump();
            let mut bases = Vec::new();
            loop {
                if let Some(base) = self.parse_type_name() {
                    bases.push(base);
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            let clause = self.build(NodeKind::ClassBaseClause, clause_start, bases);
            children.push(self.add(clause));
        }
        children.extend(self.parse_class_body());

        let mut node = self.build(NodeKind::InterfaceDeclaration, start, children);
        node.name = Some(text);
        node.resolved_name = resolved;
        node.doc_comment = doc;
        self.add(node)
    }

    fn parse_trait_declaration(&mut self, start: u32, doc: Option<String>) -> NodeId {
        let token = self.bump();
        let text = self.token_text(token).to_string();
        let resolved = Some(self.ctx.qualify(&text));

        let children = self.parse_class_body();
        let mut node = self.build(NodeKind::TraitDeclaration, start, children);
        node.name = Some(text);
        node.resolved_name = resolved;
        node.doc_comment = doc;
        self.add(node)
    }

    fn parse_class_body(&mut self) -> Vec<NodeId> {
        let mut members = Vec::new();
        if !self.expect(TokenKind::LBrace) {
            return members;
        }
        while !matches!(self.peek(), TokenKind::RBrace | TokenKind::Eof) {
            if let Some(member) = self.parse_class_member() {
                members.push(member);
            }
        }
        self.expect(TokenKind::RBrace);
        members
    }

    fn parse_class_member(&mut self) -> Option<NodeId> {
        let doc = self.take_doc();
        let start = self.start();
        let mut flags = NodeFlags::default();

        loop {
            if self.at_kw("public")
                || self.at_kw("protected")
                || self.at_kw("private")
                || self.at_kw("final")
                || self.at_kw("var")
                || self.at_kw("readonly")
            {
                self.bump();
            } else if self.at_kw("static") {
                flags.insert(NodeFlags::STATIC);
                self.bump();
            } else if self.at_kw("abstract") {
                flags.insert(NodeFlags::ABSTRACT);
                self.bump();
            } else {
                break;
            }
        }

        if self.at_kw("use") {
            self.bump();
            return Some(self.parse_trait_use(start));
        }
        if self.at_kw("const") {
            self.bump();
            return Some(self.parse_const_declaration(start, doc, true));
        }
        if self.at_kw("function") {
            self.bump();
            return Some(self.parse_method(start, doc, flags));
        }
        if self.peek() == TokenKind::Variable
            || matches!(self.peek(), TokenKind::Ident | TokenKind::Question | TokenKind::Backslash)
        {
            return Some(self.parse_property(start, doc, flags));
        }

        self.error(format!("unexpected token {:?} in class body", self.peek()));
        self.bump();
        None
    }

    fn parse_trait_use(&mut self, start: u32) -> NodeId {
        let mut names = Vec::new();
        loop {
            if let Some(name) = self.parse_type_name() {
                names.push(name);
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        if self.eat(TokenKind::LBrace) {
            // Conflict-resolution adaptations are skipped wholesale.
            let mut depth = 1usize;
            while depth > 0 && self.peek() != TokenKind::Eof {
                match self.peek() {
                    TokenKind::LBrace => depth += 1,
                    TokenKind::RBrace => depth -= 1,
                    _ => {}
                }
                self.bump();
            }
        } else {
            self.eat(TokenKind::Semicolon);
        }
        let node = self.build(NodeKind::TraitUseClause, start, names);
        self.add(node)
    }

    fn parse_const_declaration(
        &mut self,
        start: u32,
        doc: Option<String>,
        in_class: bool,
    ) -> NodeId {
        let mut elements = Vec::new();
        loop {
            if self.peek() != TokenKind::Ident {
                break;
            }
            let element_start = self.start();
            let name_token = self.bump();
            let name = self.token_text(name_token).to_string();
            let mut children = Vec::new();
            if self.eat(TokenKind::Eq) {
                if let Some(value) = self.parse_expr(BP_ASSIGN) {
                    children.push(value);
                }
            }
            let mut element = self.build(NodeKind::ConstElement, element_start, children);
            if !in_class {
                element.resolved_name = Some(self.ctx.qualify(&name));
            }
            element.name = Some(name);
            element.doc_comment = doc.clone();
            elements.push(self.add(element));

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.eat(TokenKind::Semicolon);

        let kind = if in_class {
            NodeKind::ClassConstDeclaration
        } else {
            NodeKind::ConstDeclaration
        };
        let mut node = self.build(kind, start, elements);
        node.doc_comment = doc;
        self.add(node)
    }

    fn parse_method(&mut self, start: u32, doc: Option<String>, flags: NodeFlags) -> NodeId {
        self.eat(TokenKind::Amp);
        let name = if self.peek() == TokenKind::Ident {
            let token = self.bump();
            Some(self.token_text(token).to_string())
        } else {
            self.error("expected method name".to_string());
            None
        };

        let mut children = self.parse_parameter_list();
        if self.eat(TokenKind::Colon) {
            if let Some(return_type) = self.parse_type_hint() {
                children.push(return_type);
            }
        }
        if self.peek() == TokenKind::LBrace {
            children.push(self.parse_compound());
        } else {
            self.eat(TokenKind::Semicolon);
        }

        let mut node = self.build(NodeKind::MethodDeclaration, start, children);
        node.name = name;
        node.doc_comment = doc;
        node.flags = flags;
        self.add(node)
    }

    fn parse_property(&mut self, start: u32, doc: Option<String>, flags: NodeFlags) -> NodeId {
        let mut children = Vec::new();
        let mut has_hint = false;
        if self.peek() != TokenKind::Variable {
            if let Some(hint) = self.parse_type_hint() {
                children.push(hint);
                has_hint = true;
            }
        }

        loop {
            if self.peek() != TokenKind::Variable {
                break;
            }
            let element_start = self.start();
            let var_token = self.bump();
            let var_name = self.token_text(var_token)[1..].to_string();

            let mut variable = self.build(NodeKind::Variable, element_start, vec![]);
            variable.name = Some(var_name);
            variable.doc_comment = doc.clone();
            let var_id = self.add(variable);

            if self.peek() == TokenKind::Eq {
                self.bump();
                let value = self.parse_expr(BP_ASSIGN);
                let mut assignment_children = vec![var_id];
                if let Some(value) = value {
                    assignment_children.push(value);
                }
                let mut assignment =
                    self.build(NodeKind::AssignmentExpression, element_start, assignment_children);
                assignment.operator = Some(Operator::Assign);
                assignment.doc_comment = doc.clone();
                children.push(self.add(assignment));
            } else {
                children.push(var_id);
            }

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.eat(TokenKind::Semicolon);

        let mut node = self.build(NodeKind::PropertyDeclaration, start, children);
        node.doc_comment = doc;
        node.flags = flags;
        if has_hint {
            node.flags.insert(NodeFlags::HAS_TYPE_HINT);
        }
        self.add(node)
    }

    // ========================================================================
    // Functions & parameters
    // ========================================================================

    fn parse_function_declaration(&mut self, start: u32, doc: Option<String>) -> NodeId {
        self.eat(TokenKind::Amp);
        let name_token = self.bump();
        let name = self.token_text(name_token).to_string();
        let resolved = Some(self.ctx.qualify(&name));

        let mut children = self.parse_parameter_list();
        if self.eat(TokenKind::Colon) {
            if let Some(return_type) = self.parse_type_hint() {
                children.push(return_type);
            }
        }
        if self.peek() == TokenKind::LBrace {
            children.push(self.parse_compound());
        } else {
            self.eat(TokenKind::Semicolon);
        }

        let mut node = self.build(NodeKind::FunctionDeclaration, start, children);
        node.name = Some(name);
        node.resolved_name = resolved;
        node.doc_comment = doc;
        self.add(node)
    }

    fn parse_parameter_list(&mut self) -> Vec<NodeId> {
        let mut parameters = Vec::new();
        if !self.expect(TokenKind::LParen) {
            return parameters;
        }
        while !matches!(self.peek(), TokenKind::RParen | TokenKind::Eof) {
            if let Some(parameter) = self.parse_parameter() {
                parameters.push(parameter);
            } else {
                self.bump();
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen);
        parameters
    }

    fn parse_parameter(&mut self) -> Option<NodeId> {
        let doc = self.take_doc();
        let start = self.start();

        // Constructor promotion modifiers are accepted and dropped.
        while self.at_kw("public")
            || self.at_kw("protected")
            || self.at_kw("private")
            || self.at_kw("readonly")
        {
            self.bump();
        }

        let mut children = Vec::new();
        let mut flags = NodeFlags::default();
        if self.peek() != TokenKind::Variable
            && !matches!(self.peek(), TokenKind::Amp | TokenKind::Ellipsis)
        {
            if let Some(hint) = self.parse_type_hint() {
                children.push(hint);
                flags.insert(NodeFlags::HAS_TYPE_HINT);
            }
        }
        if self.eat(TokenKind::Amp) {
            flags.insert(NodeFlags::BY_REF);
        }
        if self.eat(TokenKind::Ellipsis) {
            flags.insert(NodeFlags::VARIADIC);
        }
        if self.peek() != TokenKind::Variable {
            return None;
        }
        let var_token = self.bump();
        let name = self.token_text(var_token)[1..].to_string();

        if self.eat(TokenKind::Eq) {
            if let Some(default) = self.parse_expr(BP_ASSIGN) {
                children.push(default);
            }
        }

        let mut node = self.build(NodeKind::Parameter, start, children);
        node.name = Some(name);
        node.flags = flags;
        node.doc_comment = doc;
        Some(self.add(node))
    }

    /// One type hint: optional `?`, then a keyword or class name. Extra
    /// union members are consumed but only the first is kept.
    fn parse_type_hint(&mut self) -> Option<NodeId> {
        self.eat(TokenKind::Question);
        let first = self.parse_type_name()?;
        while self.peek() == TokenKind::Pipe
            && matches!(self.peek_at(1), TokenKind::Ident | TokenKind::Backslash)
        {
            self.bump();
            self.parse_type_name();
        }
        Some(first)
    }

    /// A name in type position, resolved as a class name. Built-in type
    /// keywords and relative keywords carry no resolved name.
    fn parse_type_name(&mut self) -> Option<NodeId> {
        if !matches!(self.peek(), TokenKind::Ident | TokenKind::Backslash) {
            return None;
        }
        let start = self.start();
        let raw = self.parse_absolute_name_path()?;
        let mut node = self.build(NodeKind::QualifiedName, start, vec![]);
        node.resolved_name = if is_type_keyword(&raw) {
            None
        } else {
            self.ctx.resolve_class(&raw)
        };
        node.name = Some(raw);
        Some(self.add(node))
    }

    /// `\A\B` or `A\B`; the leading backslash is kept in the raw text.
    fn parse_absolute_name_path(&mut self) -> Option<String> {
        let mut raw = String::new();
        if self.eat(TokenKind::Backslash) {
            raw.push('\\');
        }
        if self.peek() != TokenKind::Ident {
            return None;
        }
        loop {
            raw.push_str(self.current_text());
            self.bump();
            if self.peek() == TokenKind::Backslash && self.peek_at(1) == TokenKind::Ident {
                raw.push('\\');
                self.bump();
                continue;
            }
            break;
        }
        Some(raw)
    }

    fn parse_anonymous_function(&mut self, start: u32, is_static: bool) -> Option<NodeId> {
        // `fn` arrow functions reuse the same node kind; their body is the
        // bare expression.
        if self.at_kw("fn") {
            self.bump();
            let mut children = self.parse_parameter_list();
            if self.eat(TokenKind::Colon) {
                if let Some(return_type) = self.parse_type_hint() {
                    children.push(return_type);
                }
            }
            self.expect(TokenKind::DoubleArrow);
            if let Some(body) = self.parse_expr(BP_ASSIGN) {
                children.push(body);
            }
            let mut node =
                self.build(NodeKind::AnonymousFunctionCreationExpression, start, children);
            if is_static {
                node.flags.insert(NodeFlags::STATIC);
            }
            return Some(self.add(node));
        }

        self.bump(); // function
        self.eat(TokenKind::Amp);
        let mut children = self.parse_parameter_list();

        if self.at_kw("use") {
            self.bump();
            self.expect(TokenKind::LParen);
            while !matches!(self.peek(), TokenKind::RParen | TokenKind::Eof) {
                let capture_start = self.start();
                let by_ref = self.eat(TokenKind::Amp);
                if self.peek() != TokenKind::Variable {
                    self.bump();
                    continue;
                }
                let var_token = self.bump();
                let name = self.token_text(var_token)[1..].to_string();
                let mut capture = self.build(NodeKind::UseVariableName, capture_start, vec![]);
                capture.name = Some(name);
                if by_ref {
                    capture.flags.insert(NodeFlags::BY_REF);
                }
                children.push(self.add(capture));
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen);
        }

        if self.eat(TokenKind::Colon) {
            if let Some(return_type) = self.parse_type_hint() {
                children.push(return_type);
            }
        }
        children.push(self.parse_compound());

        let mut node = self.build(NodeKind::AnonymousFunctionCreationExpression, start, children);
        if is_static {
            node.flags.insert(NodeFlags::STATIC);
        }
        Some(self.add(node))
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn parse_expr(&mut self, min_bp: u8) -> Option<NodeId> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let (lbp, rbp, operator) = match self.binary_op() {
                Some(op) => op,
                None => break,
            };
            if lbp < min_bp {
                break;
            }

            // Ternary needs special structure.
            if self.peek() == TokenKind::Question {
                self.bump();
                let start = self.ast.node(lhs).span.start;
                if self.eat(TokenKind::Colon) {
                    let alt = self.parse_expr(BP_TERNARY)?;
                    let mut node =
                        self.build(NodeKind::TernaryExpression, start, vec![lhs, alt]);
                    node.flags.insert(NodeFlags::SHORT_TERNARY);
                    lhs = self.add(node);
                } else {
                    let then = self.parse_expr(0)?;
                    self.expect(TokenKind::Colon);
                    let alt = self.parse_expr(BP_TERNARY)?;
                    let node =
                        self.build(NodeKind::TernaryExpression, start, vec![lhs, then, alt]);
                    lhs = self.add(node);
                }
                continue;
            }

            let op_token = self.peek();
            self.bump();
            let start = self.ast.node(lhs).span.start;

            // `instanceof` takes a class designator on the right.
            if operator == Operator::Instanceof {
                let rhs = self.parse_instanceof_rhs()?;
                let mut node = self.build(NodeKind::BinaryExpression, start, vec![lhs, rhs]);
                node.operator = Some(operator);
                lhs = self.add(node);
                continue;
            }

            let rhs = self.parse_expr(rbp)?;
            let kind = if is_assignment_token(op_token) {
                NodeKind::AssignmentExpression
            } else {
                NodeKind::BinaryExpression
            };
            let mut node = self.build(kind, start, vec![lhs, rhs]);
            node.operator = Some(operator);
            lhs = self.add(node);
        }

        Some(lhs)
    }

    /// (left bp, right bp, operator) for the token at the cursor.
    fn binary_op(&self) -> Option<(u8, u8, Operator)> {
        use TokenKind as T;
        let entry = match self.peek() {
            T::Eq => (BP_ASSIGN, BP_ASSIGN, Operator::Assign),
            T::PlusEq => (BP_ASSIGN, BP_ASSIGN, Operator::AddAssign),
            T::MinusEq => (BP_ASSIGN, BP_ASSIGN, Operator::SubAssign),
            T::StarEq => (BP_ASSIGN, BP_ASSIGN, Operator::MulAssign),
            T::SlashEq => (BP_ASSIGN, BP_ASSIGN, Operator::DivAssign),
            T::PercentEq => (BP_ASSIGN, BP_ASSIGN, Operator::ModAssign),
            T::StarStarEq => (BP_ASSIGN, BP_ASSIGN, Operator::PowAssign),
            T::DotEq => (BP_ASSIGN, BP_ASSIGN, Operator::ConcatAssign),
            T::QuestionQuestionEq => (BP_ASSIGN, BP_ASSIGN, Operator::CoalesceAssign),
            T::AmpEq => (BP_ASSIGN, BP_ASSIGN, Operator::BitAndAssign),
            T::PipeEq => (BP_ASSIGN, BP_ASSIGN, Operator::BitOrAssign),
            T::CaretEq => (BP_ASSIGN, BP_ASSIGN, Operator::BitXorAssign),
            T::ShlEq => (BP_ASSIGN, BP_ASSIGN, Operator::ShlAssign),
            T::ShrEq => (BP_ASSIGN, BP_ASSIGN, Operator::ShrAssign),
            // Ternary structure is handled by the caller; the operator
            // slot is unused.
            T::Question => (BP_TERNARY, BP_TERNARY, Operator::Coalesce),
            T::QuestionQuestion => (BP_COALESCE, BP_COALESCE, Operator::Coalesce),
            T::PipePipe => (8, 9, Operator::BoolOr),
            T::AmpAmp => (10, 11, Operator::BoolAnd),
            T::Pipe => (12, 13, Operator::BitOr),
            T::Caret => (14, 15, Operator::BitXor),
            T::Amp => (16, 17, Operator::BitAnd),
            T::EqEq => (18, 19, Operator::Equal),
            T::BangEq | T::LtGt => (18, 19, Operator::NotEqual),
            T::EqEqEq => (18, 19, Operator::Identical),
            T::BangEqEq => (18, 19, Operator::NotIdentical),
            T::Lt => (20, 21, Operator::Less),
            T::Gt => (20, 21, Operator::Greater),
            T::Le => (20, 21, Operator::LessEqual),
            T::Ge => (20, 21, Operator::GreaterEqual),
            T::Spaceship => (20, 21, Operator::Spaceship),
            T::Shl => (22, 23, Operator::Shl),
            T::Shr => (22, 23, Operator::Shr),
            T::Plus => (24, 25, Operator::Add),
            T::Minus => (24, 25, Operator::Sub),
            T::Dot => (24, 25, Operator::Concat),
            T::Star => (26, 27, Operator::Mul),
            T::Slash => (26, 27, Operator::Div),
            T::Percent => (26, 27, Operator::Mod),
            T::Ident if self.at_kw("instanceof") => (28, 29, Operator::Instanceof),
            T::StarStar => (32, 32, Operator::Pow),
            _ => return None,
        };
        Some(entry)
    }

    fn parse_prefix(&mut self) -> Option<NodeId> {
        let start = self.start();
        match self.peek() {
            TokenKind::Bang => {
                self.bump();
                let operand = self.parse_expr(BP_UNARY)?;
                let mut node = self.build(NodeKind::UnaryOpExpression, start, vec![operand]);
                node.operator = Some(Operator::Not);
                Some(self.add(node))
            }
            TokenKind::Minus | TokenKind::Plus | TokenKind::Tilde | TokenKind::At => {
                let operator = match self.peek() {
                    TokenKind::Minus => Operator::Minus,
                    TokenKind::Plus => Operator::Plus,
                    TokenKind::Tilde => Operator::BitNot,
                    _ => Operator::ErrorSuppress,
                };
                self.bump();
                let operand = self.parse_expr(BP_UNARY)?;
                let mut node = self.build(NodeKind::UnaryOpExpression, start, vec![operand]);
                node.operator = Some(operator);
                Some(self.add(node))
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                self.bump();
                let operand = self.parse_expr(BP_UNARY)?;
                let node = self.build(NodeKind::UnaryOpExpression, start, vec![operand]);
                Some(self.add(node))
            }
            TokenKind::LParen => match self.cast_keyword() {
                Some(keyword) => {
                    self.bump(); // (
                    self.bump(); // keyword
                    self.bump(); // )
                    let operand = self.parse_expr(BP_UNARY)?;
                    let mut node = self.build(NodeKind::CastExpression, start, vec![operand]);
                    node.name = Some(keyword);
                    Some(self.add(node))
                }
                None => {
                    let primary = self.parse_primary()?;
                    Some(self.parse_postfix(primary))
                }
            },
            TokenKind::Ident if self.at_kw("clone") => {
                self.bump();
                let operand = self.parse_expr(BP_UNARY)?;
                let node = self.build(NodeKind::CloneExpression, start, vec![operand]);
                Some(self.add(node))
            }
            TokenKind::Ident if self.at_kw("new") => {
                let new = self.parse_new(start);
                new.map(|n| self.parse_postfix(n))
            }
            TokenKind::Ident
                if (self.at_kw("include")
                    || self.at_kw("include_once")
                    || self.at_kw("require")
                    || self.at_kw("require_once")) =>
            {
                self.bump();
                let operand = self.parse_expr(BP_TERNARY)?;
                let node = self.build(NodeKind::ScriptInclusionExpression, start, vec![operand]);
                Some(self.add(node))
            }
            _ => {
                let primary = self.parse_primary()?;
                Some(self.parse_postfix(primary))
            }
        }
    }

    /// If the cursor is at `(keyword)` where keyword is a cast type, returns
    /// the keyword.
    fn cast_keyword(&self) -> Option<String> {
        if self.peek() != TokenKind::LParen
            || self.peek_at(1) != TokenKind::Ident
            || self.peek_at(2) != TokenKind::RParen
        {
            return None;
        }
        let keyword = self.token_text(self.pos + 1).to_ascii_lowercase();
        match keyword.as_str() {
            "int" | "integer" | "bool" | "boolean" | "float" | "double" | "real" | "string"
            | "array" | "object" | "unset" | "binary" => Some(keyword),
            _ => None,
        }
    }

    fn parse_primary(&mut self) -> Option<NodeId> {
        let start = self.start();
        match self.peek() {
            TokenKind::Variable => {
                let token = self.bump();
                let name = self.token_text(token)[1..].to_string();
                let mut node = self.build(NodeKind::Variable, start, vec![]);
                node.name = Some(name);
                Some(self.add(node))
            }
            TokenKind::Dollar => {
                // Variable variable: `$$x`. The inner expression is kept as
                // a child; the name stays dynamic.
                self.bump();
                let mut children = Vec::new();
                if let Some(inner) = self.parse_primary() {
                    children.push(inner);
                }
                let node = self.build(NodeKind::Variable, start, children);
                Some(self.add(node))
            }
            TokenKind::Int | TokenKind::Float => {
                let is_float = self.peek() == TokenKind::Float;
                self.bump();
                let mut node = self.build(NodeKind::NumericLiteral, start, vec![]);
                if is_float {
                    node.flags.insert(NodeFlags::FLOAT);
                }
                Some(self.add(node))
            }
            TokenKind::Str => {
                self.bump();
                let node = self.build(NodeKind::StringLiteral, start, vec![]);
                Some(self.add(node))
            }
            TokenKind::LBracket => {
                self.bump();
                Some(self.parse_array_elements(start, TokenKind::RBracket))
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expr(0);
                self.expect(TokenKind::RParen);
                inner
            }
            TokenKind::Ident | TokenKind::Backslash => self.parse_name_primary(start),
            _ => {
                self.error(format!("unexpected token {:?} in expression", self.peek()));
                None
            }
        }
    }

    fn parse_name_primary(&mut self, start: u32) -> Option<NodeId> {
        if self.at_kw("function") || self.at_kw("fn") {
            return self.parse_anonymous_function(start, false);
        }
        if self.at_kw("static") && (self.kw_at(1, "function") || self.kw_at(1, "fn")) {
            self.bump();
            return self.parse_anonymous_function(start, true);
        }
        if self.at_kw("isset") && self.peek_at(1) == TokenKind::LParen {
            self.bump();
            let args = self.parse_argument_list();
            let node = self.build(NodeKind::IssetIntrinsicExpression, start, args);
            return Some(self.add(node));
        }
        if self.at_kw("empty") && self.peek_at(1) == TokenKind::LParen {
            self.bump();
            let args = self.parse_argument_list();
            let node = self.build(NodeKind::EmptyIntrinsicExpression, start, args);
            return Some(self.add(node));
        }
        if (self.at_kw("array") || self.at_kw("list")) && self.peek_at(1) == TokenKind::LParen {
            self.bump();
            self.bump();
            return Some(self.parse_array_elements(start, TokenKind::RParen));
        }

        let raw = self.parse_absolute_name_path()?;
        let lower = raw.to_ascii_lowercase();
        let mut node = self.build(NodeKind::QualifiedName, start, vec![]);
        node.resolved_name = if matches!(lower.as_str(), "self" | "static" | "parent") {
            None
        } else {
            match self.peek() {
                TokenKind::LParen => Some(self.ctx.resolve_function(&raw)),
                TokenKind::DoubleColon => self.ctx.resolve_class(&raw),
                _ => Some(self.ctx.resolve_const(&raw)),
            }
        };
        node.name = Some(raw);
        Some(self.add(node))
    }

    fn parse_array_elements(&mut self, start: u32, terminator: TokenKind) -> NodeId {
        let mut elements = Vec::new();
        while !matches!(self.peek(), k if k == terminator || k == TokenKind::Eof) {
            let element_start = self.start();
            self.eat(TokenKind::Amp);
            self.eat(TokenKind::Ellipsis);
            let first = self.parse_expr(BP_ASSIGN);
            let Some(first) = first else {
                self.bump();
                continue;
            };
            let mut element_children = vec![first];
            let mut flags = NodeFlags::default();
            if self.eat(TokenKind::DoubleArrow) {
                flags.insert(NodeFlags::HAS_KEY);
                self.eat(TokenKind::Amp);
                if let Some(value) = self.parse_expr(BP_ASSIGN) {
                    element_children.push(value);
                }
            }
            let mut element = self.build(NodeKind::ArrayElement, element_start, element_children);
            element.flags = flags;
            elements.push(self.add(element));

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(terminator);
        let node = self.build(NodeKind::ArrayCreationExpression, start, elements);
        self.add(node)
    }

    fn parse_argument_list(&mut self) -> Vec<NodeId> {
        let mut args = Vec::new();
        if !self.expect(TokenKind::LParen) {
            return args;
        }
        while !matches!(self.peek(), TokenKind::RParen | TokenKind::Eof) {
            self.eat(TokenKind::Amp);
            self.eat(TokenKind::Ellipsis);
            // Named arguments: `label:` before the value.
            if self.peek() == TokenKind::Ident
                && self.peek_at(1) == TokenKind::Colon
                && self.peek_at(2) != TokenKind::Colon
            {
                self.bump();
                self.bump();
            }
            if let Some(arg) = self.parse_expr(0) {
                args.push(arg);
            } else {
                self.bump();
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen);
        args
    }

    fn parse_postfix(&mut self, mut lhs: NodeId) -> NodeId {
        loop {
            let start = self.ast.node(lhs).span.start;
            match self.peek() {
                TokenKind::LParen => {
                    let mut children = vec![lhs];
                    children.extend(self.parse_argument_list());
                    let node = self.build(NodeKind::CallExpression, start, children);
                    lhs = self.add(node);
                }
                TokenKind::Arrow => {
                    self.bump();
                    match self.peek() {
                        TokenKind::Ident => {
                            let token = self.bump();
                            let member = self.token_text(token).to_string();
                            let mut node =
                                self.build(NodeKind::MemberAccessExpression, start, vec![lhs]);
                            node.name = Some(member);
                            lhs = self.add(node);
                        }
                        TokenKind::Variable => {
                            // Dynamic member name: unresolvable.
                            let member = self.parse_primary();
                            let mut children = vec![lhs];
                            children.extend(member);
                            let node =
                                self.build(NodeKind::MemberAccessExpression, start, children);
                            lhs = self.add(node);
                        }
                        TokenKind::LBrace => {
                            self.bump();
                            let member = self.parse_expr(0);
                            self.expect(TokenKind::RBrace);
                            let mut children = vec![lhs];
                            children.extend(member);
                            let node =
                                self.build(NodeKind::MemberAccessExpression, start, children);
                            lhs = self.add(node);
                        }
                        _ => {
                            self.error("expected member name after ->".to_string());
                            let node =
                                self.build(NodeKind::MemberAccessExpression, start, vec![lhs]);
                            lhs = self.add(node);
                            break;
                        }
                    }
                }
                TokenKind::DoubleColon => {
                    self.bump();
                    let mut node =
                        self.build(NodeKind::ScopedPropertyAccessExpression, start, vec![lhs]);
                    match self.peek() {
                        TokenKind::Ident => {
                            let token = self.bump();
                            node.name = Some(self.token_text(token).to_string());
                            node.span = Span::new(start, self.prev_end());
                        }
                        TokenKind::Variable => {
                            let token = self.bump();
                            node.name = Some(self.token_text(token)[1..].to_string());
                            node.flags.insert(NodeFlags::VARIABLE_MEMBER);
                            node.span = Span::new(start, self.prev_end());
                        }
                        _ => {
                            self.error("expected member name after ::".to_string());
                        }
                    }
                    lhs = self.add(node);
                }
                TokenKind::LBracket => {
                    self.bump();
                    let mut children = vec![lhs];
                    if self.peek() != TokenKind::RBracket {
                        if let Some(index) = self.parse_expr(0) {
                            children.push(index);
                        }
                    }
                    self.expect(TokenKind::RBracket);
                    let node = self.build(NodeKind::SubscriptExpression, start, children);
                    lhs = self.add(node);
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    self.bump();
                    let node = self.build(NodeKind::UnaryOpExpression, start, vec![lhs]);
                    lhs = self.add(node);
                }
                _ => break,
            }
        }
        lhs
    }

    fn parse_new(&mut self, start: u32) -> Option<NodeId> {
        self.bump(); // new
        let mut children = Vec::new();

        if self.at_kw("class") {
            let class_start = self.start();
            self.bump();
            // Anonymous class argument list comes before the body.
            let args = if self.peek() == TokenKind::LParen {
                self.parse_argument_list()
            } else {
                Vec::new()
            };
            let class = self.parse_class_declaration(class_start, None, true);
            children.push(class);
            children.extend(args);
        } else {
            let designator = match self.peek() {
                TokenKind::Variable => self.parse_primary()?,
                TokenKind::Ident | TokenKind::Backslash => {
                    let name_start = self.start();
                    let raw = self.parse_absolute_name_path()?;
                    let lower = raw.to_ascii_lowercase();
                    let mut node = self.build(NodeKind::QualifiedName, name_start, vec![]);
                    node.resolved_name =
                        if matches!(lower.as_str(), "self" | "static" | "parent") {
                            None
                        } else {
                            self.ctx.resolve_class(&raw)
                        };
                    node.name = Some(raw);
                    self.add(node)
                }
                _ => {
                    self.error("expected class name after new".to_string());
                    return None;
                }
            };
            children.push(designator);
            if self.peek() == TokenKind::LParen {
                children.extend(self.parse_argument_list());
            }
        }

        let node = self.build(NodeKind::ObjectCreationExpression, start, children);
        Some(self.add(node))
    }

    fn parse_instanceof_rhs(&mut self) -> Option<NodeId> {
        match self.peek() {
            TokenKind::Ident | TokenKind::Backslash => {
                let start = self.start();
                let raw = self.parse_absolute_name_path()?;
                let lower = raw.to_ascii_lowercase();
                let mut node = self.build(NodeKind::QualifiedName, start, vec![]);
                node.resolved_name = if matches!(lower.as_str(), "self" | "static" | "parent") {
                    None
                } else {
                    self.ctx.resolve_class(&raw)
                };
                node.name = Some(raw);
                Some(self.add(node))
            }
            _ => self.parse_expr(BP_UNARY),
        }
    }
}

fn is_assignment_token(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        Eq | PlusEq
            | MinusEq
            | StarEq
            | SlashEq
            | PercentEq
            | StarStarEq
            | DotEq
            | QuestionQuestionEq
            | AmpEq
            | PipeEq
            | CaretEq
            | ShlEq
            | ShrEq
    )
}

fn is_type_keyword(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "int"
            | "integer"
            | "float"
            | "double"
            | "string"
            | "bool"
            | "boolean"
            | "array"
            | "callable"
            | "iterable"
            | "object"
            | "mixed"
            | "void"
            | "null"
            | "false"
            | "true"
            | "never"
            | "self"
            | "static"
            | "parent"
    )
}
