use super::token::{AnonMark, FileId, Span, Token, TokenKind};
use crate::dialect::{AnonStyle, DialectConfig};
use crate::error::Error;
use std::iter::Peekable;
use std::str::CharIndices;

/// Tokens of one physical line. `continued` is set when the line ends with
/// the dialect's continuation character.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub continued: bool,
}

/// Tokenize a line that is not part of any file
pub fn tokenize(line: &str, dialect: &DialectConfig) -> Lexed {
    LineLexer::new(line, dialect, 0, 0).parse()
}

pub struct LineLexer<'a> {
    line: &'a str,
    iter: Peekable<CharIndices<'a>>,
    dialect: &'a DialectConfig,
    file: FileId,
    row: usize,
    tokens: Vec<Token>,
    continued: bool,
}

impl<'a> LineLexer<'a> {
    pub fn new(line: &'a str, dialect: &'a DialectConfig, file: FileId, row: usize) -> Self {
        Self {
            line,
            iter: line.char_indices().peekable(),
            dialect,
            file,
            row,
            tokens: Vec::new(),
            continued: false,
        }
    }
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

impl<'a> LineLexer<'a> {
    fn peek_nth(&self, n: usize) -> Option<(usize, char)> {
        self.iter.clone().nth(n)
    }

    fn consume(&mut self) -> Option<(usize, char)> {
        self.iter.next()
    }

    /// Byte offset of the next unread character
    fn offset(&mut self) -> usize {
        self.iter.peek().map(|(i, _)| *i).unwrap_or(self.line.len())
    }

    fn rest(&self, idx: usize) -> &'a str {
        &self.line[idx..]
    }

    fn prev_char(&self, idx: usize) -> Option<char> {
        self.line[..idx].chars().next_back()
    }

    fn skip_bytes(&mut self, len: usize) {
        let end = self.offset() + len;
        while self.iter.next_if(|(i, _)| *i < end).is_some() {}
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        let end = self.offset();
        let span = Span::new(self.file, self.row, start, end);
        self.tokens.push(Token::new(kind, span));
    }

    /// A value is expected next, so `%` and `&` start numbers
    fn operand_position(&self) -> bool {
        match self.tokens.last().map(|t| &t.kind) {
            None | Some(TokenKind::Indent) | Some(TokenKind::Keyword(_)) => true,
            Some(TokenKind::Operator(op)) => !matches!(op.as_str(), ")" | "]" | "}"),
            Some(TokenKind::Symbol(s)) => {
                arch::Mnemonic::parse(s).is_some() || self.dialect.keyword(s).is_some()
            }
            _ => false,
        }
    }

    /// Only labels and markers so far
    fn at_head(&self) -> bool {
        self.tokens.iter().all(|t| {
            matches!(
                t.kind,
                TokenKind::Indent | TokenKind::Symbol(_) | TokenKind::Anon(_)
            ) || t.is_op(":")
        })
    }

    /// Length of the comment starter at `idx`, if any
    fn comment_start(&self, idx: usize) -> Option<usize> {
        let lex = &self.dialect.lex;
        if idx == 0 && lex.column_comment.is_some_and(|c| self.line.starts_with(c)) {
            return Some(1);
        }
        let spaced = !lex.comment_needs_space
            || idx == 0
            || self.prev_char(idx).is_some_and(|c| c.is_whitespace());
        if !spaced {
            return None;
        }
        lex.comments
            .iter()
            .find(|c| self.rest(idx).starts_with(**c))
            .map(|c| c.len())
    }
}

// ----------------------------------------------------------------------------
// Lexer
// ----------------------------------------------------------------------------

impl<'a> LineLexer<'a> {
    pub fn parse(mut self) -> Lexed {
        while let Some((idx, ch0)) = self.peek_nth(0) {
            // 0. Skip whitespaces
            if ch0.is_whitespace() {
                self.consume();
                continue;
            }

            // 1. Comment
            if let Some(len) = self.comment_start(idx) {
                let text = self.rest(idx);
                self.skip_bytes(text.len());
                let body = text[len..].trim().to_string();
                self.push(TokenKind::Comment(body), idx);
                break;
            }

            // 2. Line continuation
            if Some(ch0) == self.dialect.lex.continuation {
                let after = self.rest(idx + ch0.len_utf8()).trim_start();
                let after_idx = self.line.len() - after.len();
                if after.is_empty() || self.comment_start(after_idx).is_some() {
                    self.consume();
                    self.continued = true;
                    continue;
                }
            }

            // 3. String and character literals
            if self.dialect.lex.quotes.contains(ch0) {
                let kind = self.parse_string(ch0);
                self.push(kind, idx);
                continue;
            }
            if Some(ch0) == self.dialect.lex.char_quote {
                let kind = self.parse_char();
                self.push(kind, idx);
                continue;
            }

            // 4. Number literal
            if let Some(kind) = self.parse_number(ch0) {
                self.push(kind, idx);
                continue;
            }

            // 5. Anonymous label marks
            if let Some(mark) = self.parse_anon(idx, ch0) {
                self.push(TokenKind::Anon(mark), idx);
                continue;
            }

            // 6. Prefixed word operator (`.and`, `.not.`)
            if let Some(op) = self.parse_word_operator(idx) {
                self.push(TokenKind::Operator(op), idx);
                continue;
            }

            // 7. Keyword
            if let Some(kind) = self.parse_keyword(idx, ch0) {
                self.push(kind, idx);
                continue;
            }

            // 8. Symbol
            if let Some(name) = self.parse_symbol(ch0) {
                self.push(TokenKind::Symbol(name), idx);
                continue;
            }

            // 9. Operator and punctuation
            let rest = self.rest(idx);
            let dialect = self.dialect;
            if let Some(op) = dialect
                .operators()
                .iter()
                .find(|op| rest.starts_with(**op))
            {
                self.skip_bytes(op.len());
                self.push(TokenKind::Operator(op.to_string()), idx);
                continue;
            }

            self.consume();
            self.push(TokenKind::Error(Error::UnexpectedChar(ch0)), idx);
        }

        let indented = self.line.starts_with(char::is_whitespace);
        let has_code = self
            .tokens
            .iter()
            .any(|t| !matches!(t.kind, TokenKind::Comment(_)));
        if indented && has_code {
            let span = Span::new(self.file, self.row, 0, 0);
            self.tokens.insert(0, Token::new(TokenKind::Indent, span));
        }

        Lexed {
            tokens: self.tokens,
            continued: self.continued,
        }
    }

    fn parse_string(&mut self, quote: char) -> TokenKind {
        self.consume(); // consume opening quote
        let escapes = self.dialect.lex.escapes;
        let mut text = String::new();
        let mut error = None;
        loop {
            match self.consume() {
                None => return TokenKind::Error(Error::UnterminatedString),
                Some((_, c)) if c == quote => break,
                Some((_, '\\')) if !escapes.is_empty() => match self.consume() {
                    None => return TokenKind::Error(Error::UnterminatedString),
                    Some((_, e)) if escapes.contains(e) => text.push(unescape(e)),
                    Some((_, e)) => {
                        error.get_or_insert(Error::InvalidEscape(e));
                    }
                },
                Some((_, c)) => text.push(c),
            }
        }
        match error {
            Some(e) => TokenKind::Error(e),
            None => TokenKind::Text(text),
        }
    }

    fn parse_char(&mut self) -> TokenKind {
        let quote = self.consume().map(|(_, c)| c);
        let value = match self.consume() {
            None => return TokenKind::Error(Error::UnterminatedString),
            Some((_, '\\')) if !self.dialect.lex.escapes.is_empty() => match self.consume() {
                Some((_, e)) if self.dialect.lex.escapes.contains(e) => unescape(e),
                Some((_, e)) => return TokenKind::Error(Error::InvalidEscape(e)),
                None => return TokenKind::Error(Error::UnterminatedString),
            },
            Some((_, c)) => c,
        };
        // Closing quote is optional
        self.iter.next_if(|(_, c)| Some(*c) == quote);
        TokenKind::Number(value as i64)
    }

    fn parse_number(&mut self, ch0: char) -> Option<TokenKind> {
        let ch1 = self.peek_nth(1).map(|(_, c)| c);
        let dialect = self.dialect;
        let lex = &dialect.lex;
        let (radix, prefix) = match (ch0, ch1) {
            ('$', Some(c)) if c.is_ascii_hexdigit() => (16, 1),
            ('%', Some('0' | '1')) if self.operand_position() => (2, 1),
            (c, Some('0'..='7')) if Some(c) == lex.octal_prefix && self.operand_position() => {
                (8, 1)
            }
            ('0', Some('x' | 'X')) => (16, 2),
            ('0', Some('b' | 'B'))
                if self.peek_nth(2).is_some_and(|(_, c)| c == '0' || c == '1') =>
            {
                (2, 2)
            }
            (c, _) if c.is_ascii_digit() => (10, 0),
            _ => return None,
        };
        for _ in 0..prefix {
            self.consume();
        }

        let mut digits = String::new();
        while let Some((_, c)) = self
            .iter
            .next_if(|(_, c)| c.is_ascii_alphanumeric() || *c == '_')
        {
            if c != '_' {
                digits.push(c);
            }
        }
        Some(match i64::from_str_radix(&digits, radix) {
            Ok(n) => TokenKind::Number(n),
            Err(_) => TokenKind::Error(Error::InvalidNumber(digits)),
        })
    }

    fn parse_anon(&mut self, idx: usize, ch0: char) -> Option<AnonMark> {
        let (lead, run_start) = match self.dialect.lex.anon {
            AnonStyle::None => return None,
            AnonStyle::Runs => (0, idx),
            AnonStyle::Colon if ch0 == ':' => (1, idx + 1),
            AnonStyle::Bang if ch0 == '!' => (1, idx + 1),
            _ => return None,
        };

        // Bare definition mark: `:` (ca65) or `!:` (Kick)
        let rest = self.rest(run_start);
        if lead == 1 {
            let bare = match self.dialect.lex.anon {
                AnonStyle::Colon => {
                    let first = self.tokens.iter().all(|t| t.kind == TokenKind::Indent);
                    first && (rest.is_empty() || rest.starts_with(char::is_whitespace))
                }
                _ => rest.starts_with(':'),
            };
            if bare {
                let len = if ch0 == '!' { 2 } else { 1 };
                self.skip_bytes(len);
                return Some(AnonMark {
                    sign: None,
                    count: 1,
                });
            }
        }

        let sign = rest.chars().next().filter(|c| *c == '+' || *c == '-')?;
        let count = rest.chars().take_while(|c| *c == sign).count();
        let after = rest[count..].chars().next();
        let boundary = after.map_or(true, |c| c.is_whitespace() || ",)]};:".contains(c));
        if !boundary {
            return None;
        }
        if lead == 0 {
            let before = self.prev_char(idx);
            let spaced = before.map_or(true, |c| c.is_whitespace() || ",(#[{".contains(c));
            if !spaced {
                return None;
            }
        }
        self.skip_bytes(lead + count);
        Some(AnonMark {
            sign: Some(sign),
            count,
        })
    }

    fn parse_word_operator(&mut self, idx: usize) -> Option<String> {
        let rest = self.rest(idx);
        let dialect = self.dialect;
        let lex = &dialect.lex;
        let word = dialect.word_operators().iter().find(|w| {
            rest.len() >= w.len()
                && rest.is_char_boundary(w.len())
                && rest[..w.len()].eq_ignore_ascii_case(w)
                && !rest[w.len()..].starts_with(|c: char| lex.is_symbol_char(c))
        })?;
        let len = word.len();
        self.skip_bytes(len);
        // `.not.` style trailing dot
        self.iter.next_if(|(_, c)| *c == '.');
        Some(word.to_string())
    }

    fn parse_keyword(&mut self, idx: usize, ch0: char) -> Option<TokenKind> {
        let dialect = self.dialect;
        let lex = &dialect.lex;
        if !lex.keyword_prefix.contains(ch0) {
            return None;
        }
        let ch1 = self.peek_nth(1).map(|(_, c)| c)?;
        if !(ch1.is_ascii_alphabetic() || (ch1.is_ascii_digit() && self.at_head())) {
            return None;
        }
        let is_local = lex.local_rule(self.rest(idx)).is_some();
        self.consume();
        let mut text = String::from(ch0);
        while let Some((_, c)) = self.iter.next_if(|(_, c)| lex.is_symbol_char(*c)) {
            text.push(c);
        }
        Some(if is_local {
            TokenKind::Symbol(self.join_scoped(text))
        } else {
            TokenKind::Keyword(text)
        })
    }

    fn parse_symbol(&mut self, ch0: char) -> Option<String> {
        let dialect = self.dialect;
        let lex = &dialect.lex;
        if !lex.is_symbol_start(ch0) {
            return None;
        }
        if !(ch0.is_ascii_alphabetic() || ch0 == '_') {
            // A prefix character must be followed by a name
            let ch1 = self.peek_nth(1).map(|(_, c)| c)?;
            if !lex.is_symbol_char(ch1) {
                return None;
            }
        }
        self.consume();
        let mut text = String::from(ch0);
        while let Some((_, c)) = self.iter.next_if(|(_, c)| lex.is_symbol_char(*c)) {
            text.push(c);
        }
        Some(self.join_scoped(text))
    }

    /// Append `sep name` segments of a scope-qualified name
    fn join_scoped(&mut self, mut text: String) -> String {
        let lex = self.dialect.lex;
        let Some(sep) = lex.scope_sep else {
            return text;
        };
        loop {
            let at = self.offset();
            let rest = self.rest(at);
            let qualified = rest.starts_with(sep)
                && rest[sep.len()..].starts_with(|c: char| c.is_ascii_alphabetic() || c == '_');
            if !qualified {
                return text;
            }
            self.skip_bytes(sep.len());
            text.push_str(sep);
            while let Some((_, c)) = self.iter.next_if(|(_, c)| lex.is_symbol_char(*c)) {
                text.push(c);
            }
        }
    }
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        c => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{get_dialect, DialectId};

    fn kinds(line: &str, id: DialectId) -> Vec<TokenKind> {
        tokenize(line, get_dialect(id))
            .tokens
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test() {
        use TokenKind::*;
        assert_eq!(
            kinds("lda #$10 ; load", DialectId::Acme),
            vec![
                Symbol("lda".into()),
                Operator("#".into()),
                Number(16),
                Comment("load".into())
            ]
        );
        assert_eq!(
            kinds("  .byte %0101, 'a'", DialectId::Ca65),
            vec![
                Indent,
                Keyword(".byte".into()),
                Number(5),
                Operator(",".into()),
                Number(97)
            ]
        );
        assert_eq!(
            kinds("x % 2", DialectId::Kick),
            vec![Symbol("x".into()), Operator("%".into()), Number(2)]
        );

        // Continuation only at end of line, before an optional comment
        let unknown = get_dialect(DialectId::Unknown);
        let lexed = tokenize("  lda #1 \\ ; more", unknown);
        assert!(lexed.continued);
        assert_eq!(
            lexed.tokens.into_iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                Indent,
                Symbol("lda".into()),
                Operator("#".into()),
                Number(1),
                Comment("more".into())
            ]
        );
        assert!(!tokenize("  lda #1", unknown).continued);
        assert!(!tokenize("  lda #1", get_dialect(DialectId::Ca65)).continued);
    }
}
