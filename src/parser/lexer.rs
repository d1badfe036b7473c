//! PHP Lexer
//!
//! Scans source text into a flat token stream for the recursive-descent
//! parser. Comments and whitespace are trivia; a `/** ... */` doc-block is
//! remembered and attached to the next significant token so declarations can
//! pick it up.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    OpenTag,
    CloseTag,
    InlineHtml,
    Ident,
    Variable,
    Int,
    Float,
    Str,

    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Backslash,
    Dollar,

    Arrow,
    DoubleColon,
    DoubleArrow,
    Ellipsis,
    Question,
    Colon,
    QuestionQuestion,
    QuestionQuestionEq,

    Eq,
    EqEq,
    EqEqEq,
    BangEq,
    BangEqEq,
    LtGt,
    Lt,
    Gt,
    Le,
    Ge,
    Spaceship,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StarStar,
    Dot,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    DotEq,
    StarStarEq,
    AmpEq,
    PipeEq,
    CaretEq,
    ShlEq,
    ShrEq,

    AmpAmp,
    PipePipe,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Bang,
    Shl,
    Shr,
    PlusPlus,
    MinusMinus,
    At,

    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub start: u32,
    pub end: u32,
    /// Doc-block immediately preceding this token, if any.
    pub doc: Option<Box<str>>,
}

pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    src: &'a [u8],
    text: &'a str,
    pos: usize,
    in_php: bool,
    pending_doc: Option<Box<str>>,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Lexer {
            src: text.as_bytes(),
            text,
            pos: 0,
            in_php: false,
            pending_doc: None,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        while self.pos < self.src.len() {
            if !self.in_php {
                self.lex_html();
                continue;
            }
            self.lex_php();
        }
        let end = self.src.len() as u32;
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            start: end,
            end,
            doc: self.pending_doc.take(),
        });
        self.tokens
    }

    fn lex_html(&mut self) {
        let start = self.pos;
        match self.text[self.pos..].find("<?php") {
            Some(rel) => {
                let tag_start = self.pos + rel;
                if rel > 0 {
                    self.push(TokenKind::InlineHtml, start, tag_start);
                }
                self.pos = tag_start + "<?php".len();
                self.push(TokenKind::OpenTag, tag_start, self.pos);
                self.in_php = true;
            }
            None => {
                self.pos = self.src.len();
                if start < self.pos {
                    self.push(TokenKind::InlineHtml, start, self.pos);
                }
            }
        }
    }

    fn lex_php(&mut self) {
        let c = self.src[self.pos];
        match c {
            b' ' | b'\t' | b'\r' | b'\n' => {
                self.pos += 1;
            }
            b'/' if self.peek(1) == Some(b'*') => self.lex_block_comment(),
            b'/' if self.peek(1) == Some(b'/') => self.lex_line_comment(),
            b'#' => self.lex_line_comment(),
            b'?' if self.peek(1) == Some(b'>') => {
                let start = self.pos;
                self.pos += 2;
                self.push(TokenKind::CloseTag, start, self.pos);
                self.in_php = false;
            }
            b'$' => self.lex_variable(),
            b'\'' | b'"' => self.lex_string(c),
            b'0'..=b'9' => self.lex_number(),
            b'.' if matches!(self.peek(1), Some(b'0'..=b'9')) => self.lex_number(),
            c if c == b'_' || c.is_ascii_alphabetic() || c >= 0x80 => self.lex_ident(),
            _ => self.lex_operator(),
        }
    }

    fn lex_block_comment(&mut self) {
        let start = self.pos;
        let is_doc = self.text[self.pos..].starts_with("/**")
            && !self.text[self.pos..].starts_with("/**/");
        let end = match self.text[self.pos + 2..].find("*/") {
            Some(rel) => self.pos + 2 + rel + 2,
            None => self.src.len(),
        };
        if is_doc {
            self.pending_doc = Some(self.text[start..end].into());
        }
        self.pos = end;
    }

    fn lex_line_comment(&mut self) {
        while self.pos < self.src.len() && self.src[self.pos] != b'\n' {
            // A line comment ends at a close tag as well.
            if self.src[self.pos] == b'?' && self.peek(1) == Some(b'>') {
                return;
            }
            self.pos += 1;
        }
    }

    fn lex_variable(&mut self) {
        let start = self.pos;
        self.pos += 1;
        if self
            .src
            .get(self.pos)
            .is_some_and(|&c| c == b'_' || c.is_ascii_alphabetic() || c >= 0x80)
        {
            self.pos += 1;
            while self
                .src
                .get(self.pos)
                .is_some_and(|&c| c == b'_' || c.is_ascii_alphanumeric() || c >= 0x80)
            {
                self.pos += 1;
            }
            self.push(TokenKind::Variable, start, self.pos);
        } else {
            self.push(TokenKind::Dollar, start, self.pos);
        }
    }

    fn lex_string(&mut self, quote: u8) {
        let start = self.pos;
        self.pos += 1;
        while self.pos < self.src.len() {
            let c = self.src[self.pos];
            if c == b'\\' {
                self.pos = (self.pos + 2).min(self.src.len());
                continue;
            }
            self.pos += 1;
            if c == quote {
                break;
            }
        }
        self.push(TokenKind::Str, start, self.pos);
    }

    fn lex_number(&mut self) {
        let start = self.pos;
        let mut float = false;

        if self.src[self.pos] == b'0'
            && matches!(self.peek(1), Some(b'x' | b'X' | b'b' | b'B' | b'o' | b'O'))
        {
            self.pos += 2;
            while self
                .src
                .get(self.pos)
                .is_some_and(|&c| c.is_ascii_alphanumeric() || c == b'_')
            {
                self.pos += 1;
            }
            self.push(TokenKind::Int, start, self.pos);
            return;
        }

        while self
            .src
            .get(self.pos)
            .is_some_and(|&c| c.is_ascii_digit() || c == b'_')
        {
            self.pos += 1;
        }
        if self.src.get(self.pos) == Some(&b'.')
            && matches!(self.peek(1), Some(b'0'..=b'9'))
        {
            float = true;
            self.pos += 1;
            while self
                .src
                .get(self.pos)
                .is_some_and(|&c| c.is_ascii_digit() || c == b'_')
            {
                self.pos += 1;
            }
        }
        let has_exponent = matches!(self.src.get(self.pos), Some(b'e' | b'E'))
            && (matches!(self.peek(1), Some(b'0'..=b'9'))
                || (matches!(self.peek(1), Some(b'+' | b'-'))
                    && matches!(self.peek(2), Some(b'0'..=b'9'))));
        if has_exponent {
            float = true;
            self.pos += 1;
            if matches!(self.src.get(self.pos), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            while self.src.get(self.pos).is_some_and(|&c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }

        let kind = if float { TokenKind::Float } else { TokenKind::Int };
        self.push(kind, start, self.pos);
    }

    fn lex_ident(&mut self) {
        let start = self.pos;
        self.pos += 1;
        while self
            .src
            .get(self.pos)
            .is_some_and(|&c| c == b'_' || c.is_ascii_alphanumeric() || c >= 0x80)
        {
            self.pos += 1;
        }
        self.push(TokenKind::Ident, start, self.pos);
    }

    fn lex_operator(&mut self) {
        use TokenKind::*;
        let rest = &self.text[self.pos..];
        let table: &[(&str, TokenKind)] = &[
            ("<=>", Spaceship),
            ("===", EqEqEq),
            ("!==", BangEqEq),
            ("**=", StarStarEq),
            ("<<=", ShlEq),
            (">>=", ShrEq),
            ("??=", QuestionQuestionEq),
            ("...", Ellipsis),
            ("==", EqEq),
            ("!=", BangEq),
            ("<>", LtGt),
            ("<=", Le),
            (">=", Ge),
            ("&&", AmpAmp),
            ("||", PipePipe),
            ("++", PlusPlus),
            ("--", MinusMinus),
            ("+=", PlusEq),
            ("-=", MinusEq),
            ("*=", StarEq),
            ("/=", SlashEq),
            (".=", DotEq),
            ("%=", PercentEq),
            ("^=", CaretEq),
            ("&=", AmpEq),
            ("|=", PipeEq),
            ("<<", Shl),
            (">>", Shr),
            ("=>", DoubleArrow),
            ("->", Arrow),
            ("::", DoubleColon),
            ("**", StarStar),
            ("??", QuestionQuestion),
            ("{", LBrace),
            ("}", RBrace),
            ("(", LParen),
            (")", RParen),
            ("[", LBracket),
            ("]", RBracket),
            (";", Semicolon),
            (",", Comma),
            ("\\", Backslash),
            ("?", Question),
            (":", Colon),
            ("=", Eq),
            ("<", Lt),
            (">", Gt),
            ("+", Plus),
            ("-", Minus),
            ("*", Star),
            ("/", Slash),
            ("%", Percent),
            (".", Dot),
            ("&", Amp),
            ("|", Pipe),
            ("^", Caret),
            ("~", Tilde),
            ("!", Bang),
            ("@", At),
        ];
        for (pat, kind) in table {
            if rest.starts_with(pat) {
                let start = self.pos;
                self.pos += pat.len();
                self.push(*kind, start, self.pos);
                return;
            }
        }
        // Unknown byte: skip it so the scan always terminates.
        self.pos += 1;
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.src.get(self.pos + ahead).copied()
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.tokens.push(Token {
            kind,
            start: start as u32,
            end: end as u32,
            doc: self.pending_doc.take(),
        });
    }
}
