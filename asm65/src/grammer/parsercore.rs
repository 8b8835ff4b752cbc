use super::token::{Span, Token, TokenKind};
use crate::dialect::DialectConfig;
use crate::error::{Diagnostic, Error};

/// Cursor over the tokens of one logical line
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    pub dialect: &'a DialectConfig,
    lines: &'a [&'a str],
    diags: Vec<Diagnostic>,
    last: Span,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], dialect: &'a DialectConfig, lines: &'a [&'a str]) -> Self {
        let last = tokens.first().map(|t| t.span).unwrap_or_default();
        Parser {
            tokens,
            pos: 0,
            dialect,
            lines,
            diags: Vec::new(),
            last,
        }
    }

    pub fn error(&mut self, span: Span, e: Error) {
        self.diags.push(Diagnostic::error(span, e));
    }

    pub fn warning(&mut self, span: Span, e: Error) {
        self.diags.push(Diagnostic::warning(span, e));
    }

    pub fn take_diags(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diags)
    }

    /// Span just past the last consumed token, for end-of-line errors
    pub fn eol_span(&self) -> Span {
        Span {
            col: self.last.end,
            end: self.last.end + 1,
            ..self.last
        }
    }

    /// Index of the next token, for re-reading a range later
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Save the cursor for backtracking
    pub fn checkpoint(&self) -> (usize, usize) {
        (self.pos, self.diags.len())
    }

    /// Backtrack, dropping diagnostics recorded since the checkpoint
    pub fn restore(&mut self, (pos, diags): (usize, usize)) {
        self.pos = pos;
        self.diags.truncate(diags);
    }

    /// Span of the last consumed token
    pub fn last_span(&self) -> Span {
        self.last
    }

    /// The line starts with whitespace
    pub fn indented(&self) -> bool {
        self.tokens
            .first()
            .is_some_and(|t| t.kind == TokenKind::Indent)
    }

    /// Trailing comment text of the line
    pub fn comment(&self) -> Option<String> {
        self.tokens.iter().find_map(|t| match &t.kind {
            TokenKind::Comment(c) if !c.is_empty() => Some(c.clone()),
            _ => None,
        })
    }
}

impl<'a> Parser<'a> {
    /// Skip comments and report lexical error tokens
    fn skip(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            match &token.kind {
                TokenKind::Comment(_) | TokenKind::Indent => {}
                TokenKind::Error(e) => {
                    let diag = Diagnostic::error(token.span, e.clone());
                    if !self.diags.contains(&diag) {
                        self.diags.push(diag);
                    }
                }
                _ => break,
            }
            self.pos += 1;
        }
    }

    /// Peek : Watch next token without consuming it
    pub fn peek(&mut self) -> Option<&'a Token> {
        self.skip();
        self.tokens.get(self.pos)
    }

    /// Peek further ahead, comments excluded
    pub fn peek_nth(&mut self, n: usize) -> Option<&'a Token> {
        self.skip();
        self.tokens[self.pos..]
            .iter()
            .filter(|t| !matches!(t.kind, TokenKind::Comment(_) | TokenKind::Indent))
            .nth(n)
    }

    /// Next : Consume next token and return it
    pub fn next(&mut self) -> Option<&'a Token> {
        self.skip();
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        self.last = token.span;
        Some(token)
    }

    pub fn at_end(&mut self) -> bool {
        self.peek().is_none()
    }

    /// Peek and check next token is match with condition
    pub fn check_if<F: Fn(&Token) -> bool>(&mut self, cond: F) -> bool {
        self.peek().is_some_and(cond)
    }

    /// Consume if next token is match with condition
    pub fn consume_if<F: Fn(&Token) -> bool>(&mut self, cond: F) -> Option<&'a Token> {
        if self.check_if(cond) {
            self.next()
        } else {
            None
        }
    }

    /// Consume the rest of the line
    pub fn consume_rest(&mut self) {
        while self.next().is_some() {}
    }

    /// Next token must be match with condition (skipping comments)
    pub fn expect_tobe<F: Fn(&Token) -> bool>(&mut self, cond: F) -> Result<&'a Token, Error> {
        match self.peek() {
            Some(token) if cond(token) => {
                self.next();
                Ok(token)
            }
            Some(token) => Err(Error::UnexpectedToken(token.text())),
            None => Err(Error::UnexpectedEol),
        }
    }

    pub fn check_op(&mut self, op: &str) -> bool {
        self.check_if(|t| t.is_op(op))
    }

    pub fn consume_op(&mut self, op: &str) -> bool {
        self.consume_if(|t| t.is_op(op)).is_some()
    }

    pub fn expect_op(&mut self, op: &str) -> Result<&'a Token, Error> {
        self.expect_tobe(|t| t.is_op(op))
            .map_err(|e| match e {
                Error::UnexpectedEol => Error::Expected(op.to_string()),
                e => e,
            })
    }

    /// Span of the next token, or of the end of line
    pub fn span(&mut self) -> Span {
        match self.peek() {
            Some(t) => t.span,
            None => self.eol_span(),
        }
    }

    /// Source text of tokens `from..to`, comments excluded
    pub fn raw(&self, from: usize, to: usize) -> String {
        let mut parts: Vec<(usize, usize, usize)> = Vec::new();
        for token in &self.tokens[from..to.min(self.tokens.len())] {
            if matches!(token.kind, TokenKind::Comment(_) | TokenKind::Indent) {
                continue;
            }
            let Span { line, col, end, .. } = token.span;
            match parts.last_mut() {
                Some(part) if part.0 == line => part.2 = end,
                _ => parts.push((line, col, end)),
            }
        }
        parts
            .iter()
            .filter_map(|(line, col, end)| {
                // Spans index the physical line the token came from
                let first = self.tokens.first()?.span.line;
                self.lines.get(line.checked_sub(first)?)?.get(*col..*end)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Source text of the rest of the line
    pub fn rest_text(&mut self) -> String {
        self.skip();
        self.raw(self.pos, self.tokens.len())
    }
}

#[macro_export]
macro_rules! check {
    ($parser:expr, $kind:pat) => {
        $parser.check_if(|token| matches!(&token.kind, $kind))
    };
}

#[macro_export]
macro_rules! expect {
    ($parser:expr, $kind:pat) => {
        $parser.expect_tobe(|token| matches!(&token.kind, $kind))
    };
}

#[macro_export]
macro_rules! optional {
    ($parser:expr, $trigger:pat) => {
        $parser.consume_if(|token| matches!(&token.kind, $trigger))
    };
}

/// Parse a comma separated list: element { "," element }
#[macro_export]
macro_rules! repeat {
    ($parser:expr, $elem:expr) => {{
        let mut items = Vec::new();
        if !$parser.at_end() {
            items.push($elem?);
            while $parser.consume_op(",") {
                items.push($elem?);
            }
        }
        items
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{get_dialect, DialectId};
    use crate::grammer::lexer::tokenize;

    #[test]
    fn test() {
        let dialect = get_dialect(DialectId::Acme);
        let line = "lda 1, 2 ; done";
        let tokens = tokenize(line, dialect).tokens;
        let lines = [line];
        let mut p = Parser::new(&tokens, dialect, &lines);
        assert_eq!(p.rest_text(), "lda 1, 2");
        assert!(check!(p, TokenKind::Symbol(_)));
        p.next();
        assert!(optional!(p, TokenKind::Number(1)).is_some());
        assert!(p.consume_op(","));
        assert!(expect!(p, TokenKind::Number(_)).is_ok());
        assert!(p.at_end());
        assert_eq!(p.expect_op(")"), Err(Error::Expected(")".into())));
    }
}
