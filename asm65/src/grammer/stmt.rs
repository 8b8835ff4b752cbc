use arch::{AddrMode, Form, Mnemonic};

use super::ast::{Cond, Expr, Item, Label, MacroParam, Stmt, StmtKind};
use super::parsercore::Parser;
use super::token::{Span, Token, TokenKind};
use crate::dialect::keyword::{Grammar, KwEntry, KwTarget, LabelRule, Level, StmtTag, ZoneKind};
use crate::dialect::ops::BinaryOp;
use crate::dialect::{AnonStyle, DialectConfig, LabelColon};
use crate::error::{Diagnostic, Error};
use crate::{check, optional, repeat};

/// One parsed logical line
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub stmt: Option<Stmt>,
    // The line ends with `{` and opens a brace block
    pub brace: bool,
    pub diags: Vec<Diagnostic>,
}

/// Parser state carried from earlier lines
#[derive(Debug, Clone, Copy, Default)]
pub struct LineState {
    // Inside a struct/union/enum body, where bare names are members
    pub in_type: bool,
}

/// Parse the tokens of one logical line. `lines` are the physical source
/// lines, starting with the line of the first token.
pub fn parse_statement(
    tokens: &[Token],
    dialect: &DialectConfig,
    lines: &[&str],
    state: LineState,
) -> Line {
    let mut parser = Parser::new(tokens, dialect, lines);
    let (stmt, brace) = parser.parse_line(state);
    Line {
        stmt,
        brace,
        diags: parser.take_diags(),
    }
}

// ----------------------------------------------------------------------------
// Line structure
// ----------------------------------------------------------------------------

impl<'a> Parser<'a> {
    fn parse_line(&mut self, state: LineState) -> (Option<Stmt>, bool) {
        let Some(first) = self.peek() else {
            return (None, false);
        };
        let start = first.span;
        let mut label = self.parse_label(state);
        let mut brace = false;

        let (kind, keyword) = match self.parse_body(&mut label, &mut brace, state) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => (StmtKind::Label, None),
            Err(e) => {
                let span = self.span();
                self.error(span, e);
                self.consume_rest();
                (StmtKind::Label, None)
            }
        };
        if let Some(token) = self.peek() {
            self.error(token.span, Error::UnexpectedToken(token.text()));
            self.consume_rest();
        }
        if kind == StmtKind::Label && label.is_none() {
            return (None, brace);
        }

        let mut stmt = Stmt::new(kind, start.to(self.last_span()));
        stmt.label = label;
        stmt.keyword = keyword;
        stmt.comment = self.comment();
        (Some(stmt), brace)
    }

    fn parse_label(&mut self, state: LineState) -> Option<Label> {
        let token = self.peek()?;
        match &token.kind {
            TokenKind::Anon(mark)
                if mark.sign.is_none() || self.dialect.lex.anon == AnonStyle::Runs =>
            {
                self.next();
                self.consume_op(":");
                Some(Label::Anon(*mark, token.span))
            }
            TokenKind::Symbol(name) if self.label_here(name, state) => {
                self.next();
                self.consume_op(":");
                Some(Label::Named(name.clone(), token.span))
            }
            _ => None,
        }
    }

    /// Whether the leading symbol defines a label
    fn label_here(&mut self, name: &str, state: LineState) -> bool {
        let dialect = self.dialect;
        let next = self.peek_nth(1);
        if next.is_some_and(|t| t.is_op(":")) {
            return true;
        }
        let names_next = next
            .and_then(|t| match &t.kind {
                TokenKind::Keyword(s) | TokenKind::Symbol(s) | TokenKind::Operator(s) => {
                    dialect.keyword(s)
                }
                _ => None,
            })
            .is_some_and(|(_, e)| matches!(e.label, LabelRule::Required | LabelRule::Name));
        if names_next {
            return true;
        }
        if dialect.lex.column_labels {
            return !self.indented();
        }
        if state.in_type {
            return true;
        }
        match dialect.lex.label_colon {
            LabelColon::Required => false,
            LabelColon::Optional => {
                Mnemonic::parse(name).is_none() && dialect.keyword(name).is_none()
            }
        }
    }

    /// Everything after the label. `None` for a label-only line.
    fn parse_body(
        &mut self,
        label: &mut Option<Label>,
        brace: &mut bool,
        state: LineState,
    ) -> Result<Option<(StmtKind, Option<&'static str>)>, Error> {
        let Some(token) = self.peek() else {
            return Ok(None);
        };
        let dialect = self.dialect;

        // `* = expr`
        if token.is_op(dialect.lex.pc_symbol) && self.peek_nth(1).is_some_and(|t| t.is_op("=")) {
            self.next();
            self.next();
            let value = self.parse_expr()?;
            self.org_title();
            return Ok(Some((StmtKind::Org(Some(value)), None)));
        }

        if let TokenKind::Symbol(s) = &token.kind {
            if let Some(op) = Mnemonic::parse(s) {
                self.next();
                return Ok(Some((self.parse_instruction(op)?, None)));
            }
        }

        let text = match &token.kind {
            TokenKind::Keyword(s) | TokenKind::Symbol(s) | TokenKind::Operator(s) => Some(s),
            _ => None,
        };
        if let Some((name, entry)) = text.and_then(|s| dialect.keyword(s)) {
            self.next();
            let mut kind = self.parse_keyword(name, entry, token.span, label, state)?;
            if dialect.lex.brace_blocks && self.consume_op("{") {
                *brace = true;
                if let StmtKind::Scope { block, .. } = &mut kind {
                    *block = true;
                }
            }
            return Ok(Some((kind, Some(name))));
        }

        // Bare `{` opens an unnamed block
        if dialect.lex.brace_blocks && token.is_op("{") {
            self.next();
            *brace = true;
            let kind = StmtKind::Scope {
                kind: ZoneKind::Block,
                name: None,
                block: true,
            };
            return Ok(Some((kind, None)));
        }

        // `+name args` style invocation
        if let TokenKind::Operator(op) = &token.kind {
            let prefixed = dialect
                .lex
                .macro_prefix
                .is_some_and(|c| op.len() == 1 && op.starts_with(c));
            let name = self.peek_nth(1).filter(|t| token.touches(t));
            if let (true, Some(name)) = (prefixed, name) {
                if let TokenKind::Symbol(s) | TokenKind::Keyword(s) = &name.kind {
                    self.next();
                    self.next();
                    let args = self.call_args(false)?;
                    let span = token.span.to(name.span);
                    return Ok(Some((StmtKind::Call { name: s.clone(), args, span }, None)));
                }
            }
        }

        match &token.kind {
            TokenKind::Keyword(s) if dialect.keyword_macros => {
                self.next();
                let prefix = dialect.lex.keyword_prefix;
                let name = s.trim_start_matches(|c| prefix.contains(c)).to_string();
                let args = self.call_args(false)?;
                let span = token.span;
                Ok(Some((StmtKind::Call { name, args, span }, None)))
            }
            TokenKind::Keyword(s) => {
                self.next();
                Err(Error::UnknownKeyword(s.clone()))
            }
            TokenKind::Symbol(s) => {
                self.next();
                let paren =
                    dialect.call_macros && self.check_if(|t| t.is_op("(") && token.touches(t));
                let args = if paren {
                    self.next();
                    self.call_args(true)?
                } else {
                    self.call_args(false)?
                };
                let span = token.span;
                Ok(Some((StmtKind::Call { name: s.clone(), args, span }, None)))
            }
            _ => Err(Error::UnexpectedToken(token.text())),
        }
    }

    /// Macro arguments as raw source text, split on top-level commas
    fn call_args(&mut self, paren: bool) -> Result<Vec<String>, Error> {
        let mut args = Vec::new();
        let mut depth = 0usize;
        let mut start = self.position();
        while let Some(token) = self.peek() {
            let at = self.position();
            if let TokenKind::Operator(op) = &token.kind {
                match op.as_str() {
                    "(" | "[" | "{" => depth += 1,
                    ")" if paren && depth == 0 => {
                        args.push(self.raw(start, at));
                        self.next();
                        return Ok(trim_args(args));
                    }
                    ")" | "]" | "}" => depth = depth.saturating_sub(1),
                    "," | ";" if depth == 0 => {
                        args.push(self.raw(start, at));
                        start = at + 1;
                    }
                    _ => {}
                }
            }
            self.next();
        }
        if paren {
            return Err(Error::Expected(")".into()));
        }
        args.push(self.raw(start, self.position()));
        Ok(trim_args(args))
    }
}

fn trim_args(args: Vec<String>) -> Vec<String> {
    if args.len() == 1 && args[0].is_empty() {
        Vec::new()
    } else {
        args
    }
}

// ----------------------------------------------------------------------------
// Instructions
// ----------------------------------------------------------------------------

impl<'a> Parser<'a> {
    fn parse_instruction(&mut self, op: Mnemonic) -> Result<StmtKind, Error> {
        let (form, operand) = self.parse_operand(op)?;
        if arch::select(op, form, None).is_none() {
            return Err(Error::InvalidAddressing(op.to_string()));
        }
        Ok(StmtKind::Instruction { op, form, operand })
    }

    fn index_reg(&mut self, reg: &str) -> bool {
        self.consume_if(|t| t.is_word(reg)).is_some()
    }

    fn parse_operand(&mut self, op: Mnemonic) -> Result<(Form, Option<Expr>), Error> {
        if self.at_end() || self.check_op("}") {
            return Ok((Form::Implied, None));
        }
        let lone = self.peek_nth(1).is_none();
        if lone && self.check_if(|t| t.is_word("a")) && arch::supports(op, AddrMode::Accumulator) {
            self.next();
            return Ok((Form::Accumulator, None));
        }
        if self.consume_op("#") {
            return Ok((Form::Immediate, Some(self.parse_expr()?)));
        }

        // `(e,x)`, `(e),y` and `(e)`; anything else is a parenthesized value
        if self.check_op("(") {
            let start = self.checkpoint();
            self.next();
            if let Ok(inner) = self.parse_expr() {
                let after = self.checkpoint();
                if self.consume_op(",") && self.index_reg("x") && self.consume_op(")") && self.at_end()
                {
                    return Ok((Form::IndirectX, Some(inner)));
                }
                self.restore(after);
                if self.consume_op(")") {
                    if self.at_end() {
                        return Ok((Form::Indirect, Some(inner)));
                    }
                    if self.consume_op(",") && self.index_reg("y") && self.at_end() {
                        return Ok((Form::IndirectY, Some(inner)));
                    }
                }
            }
            self.restore(start);
        }

        let operand = self.parse_expr()?;
        if !self.consume_op(",") {
            return Ok((Form::Direct, Some(operand)));
        }
        if self.index_reg("x") {
            Ok((Form::DirectX, Some(operand)))
        } else if self.index_reg("y") {
            Ok((Form::DirectY, Some(operand)))
        } else {
            Err(Error::InvalidAddressing(op.to_string()))
        }
    }
}

// ----------------------------------------------------------------------------
// Directives
// ----------------------------------------------------------------------------

impl<'a> Parser<'a> {
    fn parse_keyword(
        &mut self,
        name: &'static str,
        entry: KwEntry,
        at: Span,
        label: &mut Option<Label>,
        state: LineState,
    ) -> Result<StmtKind, Error> {
        let tag = match entry.target {
            KwTarget::Stmt(tag) => tag,
            KwTarget::Stub | KwTarget::Alias(_) => {
                self.consume_rest();
                self.warning(at, Error::Unsupported(name.into()));
                return Ok(StmtKind::Unsupported(name.into()));
            }
        };

        // Labels that name the construct rather than an address
        let named = match entry.label {
            LabelRule::Required | LabelRule::Name => match label.take() {
                Some(Label::Named(n, s)) => Some((n, s)),
                other => {
                    *label = other;
                    None
                }
            },
            _ => None,
        };
        if entry.label == LabelRule::Required && named.is_none() {
            return Err(Error::MissingLabel(name.into()));
        }

        let g = entry.grammar;
        let kind = match tag {
            StmtTag::Equate | StmtTag::Assign => {
                let (sym, span) = match named {
                    Some(n) => n,
                    None => self.expect_name()?,
                };
                if matches!(g, Grammar::NamedValue | Grammar::Value) {
                    self.consume_op("=");
                }
                StmtKind::Equate {
                    name: sym,
                    span,
                    value: self.parse_expr()?,
                    variable: tag == StmtTag::Assign,
                }
            }
            StmtTag::Org => {
                let value = self.grammar_exprs(name, g)?.into_iter().next();
                self.org_title();
                StmtKind::Org(value)
            }
            StmtTag::Align | StmtTag::AlignMask => StmtKind::Align {
                args: self.grammar_exprs(name, g)?,
                mask: tag == StmtTag::AlignMask,
            },
            StmtTag::Segment => StmtKind::Segment(self.segment_name(name, g)?),
            StmtTag::Dummy => StmtKind::Dummy(self.grammar_exprs(name, g)?.into_iter().next()),
            StmtTag::DummyEnd => StmtKind::DummyEnd,
            StmtTag::Pseudopc => StmtKind::Pseudopc(self.parse_expr()?),
            StmtTag::PseudopcEnd => StmtKind::PseudopcEnd,
            StmtTag::Include | StmtTag::Binary => {
                let (path, binary) = self.parse_path(g)?;
                if binary || tag == StmtTag::Binary {
                    let args = if self.consume_op(",") {
                        repeat!(self, self.parse_expr())
                    } else {
                        Vec::new()
                    };
                    StmtKind::Binary { path, args }
                } else {
                    StmtKind::Include(path)
                }
            }
            StmtTag::Macro => {
                let (name, _) = match named {
                    Some(n) => n,
                    None => self.expect_name()?,
                };
                StmtKind::Macro {
                    name,
                    params: self.macro_params()?,
                    body: Vec::new(),
                    body_line: 0,
                }
            }
            StmtTag::MacroEnd => StmtKind::MacroEnd,
            StmtTag::Invoke => {
                let (name, span) = self.expect_name()?;
                self.consume_op(".");
                StmtKind::Call {
                    name,
                    args: self.call_args(false)?,
                    span,
                }
            }
            StmtTag::Data(width) => {
                let items = self.items()?;
                // A bare width declares a member inside a type body
                if items.is_empty() && !state.in_type {
                    return Err(Error::Expected("value".into()));
                }
                StmtKind::Data { width, items }
            }
            StmtTag::Text(mode) => StmtKind::Text {
                mode,
                items: self.items()?,
            },
            StmtTag::Storage => {
                let mut args = self.grammar_exprs(name, g)?.into_iter();
                let count = args.next().ok_or(Error::Expected("count".into()))?;
                StmtKind::Storage {
                    count,
                    fill: args.next(),
                }
            }
            StmtTag::Type(kind) => StmtKind::Type {
                kind,
                name: match named {
                    Some(n) => Some(n),
                    None => self.optional_name()?,
                },
            },
            StmtTag::TypeEnd => StmtKind::TypeEnd,
            StmtTag::If => StmtKind::If(Cond::Expr(self.parse_expr()?)),
            StmtTag::IfDef | StmtTag::IfNDef => {
                let (name, span) = self.expect_name()?;
                StmtKind::If(Cond::Defined {
                    name,
                    span,
                    negate: tag == StmtTag::IfNDef,
                })
            }
            StmtTag::ElseIf => StmtKind::ElseIf(Cond::Expr(self.parse_expr()?)),
            StmtTag::Else => StmtKind::Else,
            StmtTag::EndIf => StmtKind::EndIf,
            StmtTag::Repeat => {
                let count = self.parse_expr()?;
                let var = if self.consume_op(",") {
                    Some(self.expect_name()?)
                } else {
                    None
                };
                StmtKind::Repeat { count, var }
            }
            StmtTag::For => {
                let var = self.expect_name()?;
                self.expect_op(",")?;
                let first = self.parse_expr()?;
                let (start, end) = if self.consume_op(",") {
                    (first, self.parse_expr()?)
                } else {
                    (Expr::Number(1, first.span()), first)
                };
                StmtKind::For { var, start, end }
            }
            StmtTag::LoopEnd => StmtKind::LoopEnd,
            StmtTag::Zone(kind) => {
                let name = match (named, g) {
                    (Some(n), _) => Some(n),
                    (None, Grammar::Name) => Some(self.expect_name()?),
                    (None, Grammar::OptName) => self.optional_name()?,
                    _ => None,
                };
                StmtKind::Scope {
                    kind,
                    name,
                    block: matches!(kind, ZoneKind::Proc | ZoneKind::Scope | ZoneKind::Block),
                }
            }
            StmtTag::ScopeEnd => StmtKind::ScopeEnd,
            StmtTag::Import { zp } => StmtKind::Import {
                names: repeat!(self, self.import_name()),
                zp,
            },
            StmtTag::Export { zp } => StmtKind::Export {
                names: repeat!(self, self.import_name()),
                zp,
            },
            StmtTag::Message(level) => StmtKind::Message {
                level,
                cond: None,
                assert: false,
                items: self.items()?,
            },
            StmtTag::MessageIf(level) => {
                let cond = self.parse_expr()?;
                let items = if self.consume_op(",") {
                    self.items()?
                } else {
                    Vec::new()
                };
                StmtKind::Message {
                    level,
                    cond: Some(cond),
                    assert: false,
                    items,
                }
            }
            StmtTag::Assert => self.parse_assert()?,
            StmtTag::End => StmtKind::End,
            StmtTag::Ignore => {
                self.consume_rest();
                StmtKind::Ignored
            }
        };
        Ok(kind)
    }

    fn expect_name(&mut self) -> Result<(String, Span), Error> {
        match self.next() {
            Some(Token {
                kind: TokenKind::Symbol(s) | TokenKind::Keyword(s),
                span,
            }) => Ok((s.clone(), *span)),
            Some(token) => Err(Error::UnexpectedToken(token.text())),
            None => Err(Error::Expected("name".into())),
        }
    }

    /// Memory block title after an origin, e.g. `* = $0801 "Basic"`
    fn org_title(&mut self) {
        optional!(self, TokenKind::Text(_));
    }

    fn optional_name(&mut self) -> Result<Option<(String, Span)>, Error> {
        if check!(self, TokenKind::Symbol(_) | TokenKind::Keyword(_)) {
            self.expect_name().map(Some)
        } else {
            Ok(None)
        }
    }

    /// `name` with an optional `: zp` style address size
    fn import_name(&mut self) -> Result<(String, Span), Error> {
        let name = self.expect_name()?;
        if self.consume_op(":") {
            self.expect_name()?;
        }
        Ok(name)
    }

    fn items(&mut self) -> Result<Vec<Item>, Error> {
        Ok(repeat!(self, self.parse_item()))
    }

    fn grammar_exprs(&mut self, name: &str, g: Grammar) -> Result<Vec<Expr>, Error> {
        let (min, max) = match g {
            Grammar::None => return Ok(Vec::new()),
            Grammar::Value => {
                self.consume_op("=");
                (1, 1)
            }
            Grammar::OptExpr => (0, 1),
            Grammar::Exprs(min, max) => (min as usize, max as usize),
            _ => (1, 1),
        };
        let exprs = if self.at_end() || self.check_op("{") {
            Vec::new()
        } else {
            repeat!(self, self.parse_expr())
        };
        if exprs.len() < min || exprs.len() > max {
            let expected = if min == max {
                min.to_string()
            } else {
                format!("{} to {}", min, max)
            };
            return Err(Error::ArgumentCount(name.into(), expected));
        }
        Ok(exprs)
    }

    fn segment_name(&mut self, keyword: &str, g: Grammar) -> Result<String, Error> {
        if g != Grammar::None {
            if let Some(token) = self.peek() {
                if let TokenKind::Text(s) | TokenKind::Symbol(s) | TokenKind::Keyword(s) = &token.kind {
                    self.next();
                    return Ok(s.clone());
                }
            }
            if g == Grammar::Name {
                return Err(Error::Expected("segment name".into()));
            }
        }
        let prefix = self.dialect.lex.keyword_prefix;
        let bare = keyword.trim_start_matches(|c| prefix.contains(c));
        Ok(match g {
            Grammar::None => bare.to_ascii_uppercase(),
            _ => "default".into(),
        })
    }

    /// File name as a string literal or bare text. Returns whether an
    /// import names a binary file.
    fn parse_path(&mut self, g: Grammar) -> Result<(String, bool), Error> {
        let mut binary = false;
        if g == Grammar::ImportPath {
            if let Some(word) = self.consume_if(|t| matches!(t.kind, TokenKind::Symbol(_))) {
                binary = matches!(word.text().to_ascii_lowercase().as_str(), "binary" | "c64");
            }
        }
        if let Some(token) = self.peek() {
            if let TokenKind::Text(s) = &token.kind {
                self.next();
                return Ok((s.clone(), binary));
            }
        }
        let from = self.position();
        while self.check_if(|t| !t.is_op(",")) {
            self.next();
        }
        let raw = self.raw(from, self.position());
        let path = raw.trim_start_matches('<').trim_end_matches('>').to_string();
        if path.is_empty() {
            return Err(Error::Expected("file name".into()));
        }
        Ok((path, binary))
    }

    fn macro_params(&mut self) -> Result<Vec<MacroParam>, Error> {
        let paren = self.consume_op("(");
        let mut params = Vec::new();
        while !(self.at_end() || self.check_op(")") || self.check_op("{")) {
            let (name, _) = self.expect_name()?;
            let default = if self.consume_op("=") {
                let from = self.position();
                while self.check_if(|t| !t.is_op(",") && !t.is_op(")") && !t.is_op("{")) {
                    self.next();
                }
                Some(self.raw(from, self.position()))
            } else {
                None
            };
            params.push(MacroParam { name, default });
            if !self.consume_op(",") {
                break;
            }
        }
        if paren {
            self.expect_op(")")?;
        }
        Ok(params)
    }

    fn parse_assert(&mut self) -> Result<StmtKind, Error> {
        // "description", actual, expected
        if check!(self, TokenKind::Text(_)) {
            let desc = self.parse_item()?;
            self.expect_op(",")?;
            let actual = self.parse_expr()?;
            self.expect_op(",")?;
            let expected = self.parse_expr()?;
            let span = actual.span().to(expected.span());
            let cond = Expr::Binary(BinaryOp::Eq, Box::new(actual), Box::new(expected), span);
            return Ok(StmtKind::Message {
                level: Level::Error,
                cond: Some(cond),
                assert: true,
                items: vec![desc],
            });
        }

        // condition [, error|warning [, message]]
        let cond = self.parse_expr()?;
        let mut level = Level::Error;
        let mut items = Vec::new();
        if self.consume_op(",") {
            let (word, _) = self.expect_name()?;
            if word.to_ascii_lowercase().ends_with("warning") {
                level = Level::Warning;
            }
            if self.consume_op(",") {
                items = self.items()?;
            }
        }
        Ok(StmtKind::Message {
            level,
            cond: Some(cond),
            assert: true,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{get_dialect, DialectId};
    use crate::grammer::lexer::tokenize;

    fn parse(line: &str, id: DialectId) -> Line {
        let dialect = get_dialect(id);
        let tokens = tokenize(line, dialect).tokens;
        parse_statement(&tokens, dialect, &[line], LineState::default())
    }

    #[test]
    fn test() {
        let line = parse("loop: lda ($fb),y", DialectId::Ca65);
        let stmt = line.stmt.unwrap();
        assert!(matches!(stmt.label, Some(Label::Named(ref n, _)) if n == "loop"));
        assert!(matches!(
            stmt.kind,
            StmtKind::Instruction {
                form: Form::IndirectY,
                ..
            }
        ));

        let line = parse("count = 3", DialectId::Acme);
        assert!(matches!(
            line.stmt.unwrap().kind,
            StmtKind::Equate { ref name, variable: false, .. } if name == "count"
        ));

        let line = parse("  .lobytes 1, 2", DialectId::Ca65);
        assert_eq!(line.diags[0].code(), "unsupported-directive");

        let line = parse("!zone main {", DialectId::Acme);
        assert!(line.brace);
        assert!(matches!(
            line.stmt.unwrap().kind,
            StmtKind::Scope { block: true, .. }
        ));

        let line = parse("  +inc16 ptr, 2", DialectId::Acme);
        match line.stmt.unwrap().kind {
            StmtKind::Call { name, args, .. } => {
                assert_eq!(name, "inc16");
                assert_eq!(args, vec!["ptr".to_string(), "2".to_string()]);
            }
            k => panic!("unexpected {:?}", k),
        }

        let line = parse("  sta", DialectId::Acme);
        assert!(line.stmt.is_none());
        assert_eq!(line.diags[0].code(), "invalid-addressing");
    }
}
