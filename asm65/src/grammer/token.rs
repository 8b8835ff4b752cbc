use serde::Serialize;

use crate::error::Error;

pub type FileId = usize;

/// Half-open column range on a single source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Span {
    pub file: FileId,
    pub line: usize,
    pub col: usize,
    pub end: usize,
}

impl Span {
    pub fn new(file: FileId, line: usize, col: usize, end: usize) -> Self {
        Span {
            file,
            line,
            col,
            end,
        }
    }

    /// Cover from the start of `self` to the end of `other`
    pub fn to(self, other: Span) -> Span {
        if other.line != self.line || other.file != self.file {
            return self;
        }
        Span {
            end: other.end.max(self.end),
            ..self
        }
    }

    pub fn contains(&self, line: usize, col: usize) -> bool {
        self.line == line && self.col <= col && col < self.end.max(self.col + 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }

    /// Source-like text of the token
    pub fn text(&self) -> String {
        match &self.kind {
            TokenKind::Symbol(s) | TokenKind::Keyword(s) | TokenKind::Operator(s) => s.clone(),
            TokenKind::Number(n) => n.to_string(),
            TokenKind::Text(s) => format!("\"{}\"", s),
            TokenKind::Anon(mark) => mark.to_string(),
            TokenKind::Comment(s) => format!(";{}", s),
            TokenKind::Indent => String::new(),
            TokenKind::Error(e) => e.to_string(),
        }
    }

    pub fn is_op(&self, op: &str) -> bool {
        matches!(&self.kind, TokenKind::Operator(s) if s == op)
    }

    /// Symbol, keyword and alphabetic operator tokens compared without case
    pub fn is_word(&self, word: &str) -> bool {
        match &self.kind {
            TokenKind::Symbol(s) | TokenKind::Keyword(s) | TokenKind::Operator(s) => {
                s.eq_ignore_ascii_case(word)
            }
            _ => false,
        }
    }

    /// True when `next` starts exactly where this token ends
    pub fn touches(&self, next: &Token) -> bool {
        self.span.line == next.span.line && self.span.end == next.span.col
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Identifier, possibly scope-qualified or carrying a local prefix
    Symbol(String),
    // Prefixed directive, e.g. `.byte` or `!word`
    Keyword(String),
    // Operator or punctuation, longest match against the dialect's set
    Operator(String),

    // Literals
    Number(i64),
    Text(String),

    // Anonymous label definition or reference
    Anon(AnonMark),

    // Special
    Comment(String),
    Indent,
    Error(Error),
}

/// `sign` is `None` for a definition written without direction
/// (`:` in ca65, `!:` in Kick Assembler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnonMark {
    pub sign: Option<char>,
    pub count: usize,
}

impl std::fmt::Display for AnonMark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.sign {
            Some(c) => write!(f, "{}", c.to_string().repeat(self.count)),
            None => write!(f, ":"),
        }
    }
}
