use tracing::trace;

use super::ast::{Stmt, StmtKind};
use super::lexer::LineLexer;
use super::stmt::{parse_statement, LineState};
use super::token::{FileId, Span, Token, TokenKind};
use crate::dialect::keyword::{KwTarget, StmtTag};
use crate::dialect::DialectConfig;
use crate::error::{Diagnostic, Error};

/// Foldable line range of a block statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub keyword: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub file: FileId,
    pub stmts: Vec<Stmt>,
    pub diags: Vec<Diagnostic>,
    pub blocks: Vec<Block>,
    pub includes: Vec<(String, Span)>,
    pub binaries: Vec<(String, Span)>,
    pub lines: Vec<String>,
}

pub fn parse_file(file: FileId, text: &str, dialect: &DialectConfig) -> ParsedFile {
    let lines: Vec<&str> = text.lines().collect();
    let mut parsed = parse_lines(file, &lines, 0, dialect);
    parsed.lines = lines.iter().map(|l| l.to_string()).collect();
    trace!(file, stmts = parsed.stmts.len(), "parsed");
    parsed
}

/// Parse physical lines numbered from `first`
pub fn parse_lines(
    file: FileId,
    lines: &[&str],
    first: usize,
    dialect: &DialectConfig,
) -> ParsedFile {
    let mut parser = FileParser {
        dialect,
        file,
        out: ParsedFile {
            file,
            ..ParsedFile::default()
        },
        stack: Vec::new(),
        capture: None,
    };
    parser.run(lines, first);
    parser.out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Macro,
    Cond,
    Loop,
    Type,
    Scope,
    Pseudopc,
    Dummy,
}

impl Family {
    fn opened_by(kind: &StmtKind, brace: bool) -> Option<Family> {
        Some(match kind {
            StmtKind::Macro { .. } => Family::Macro,
            StmtKind::If(_) => Family::Cond,
            StmtKind::Repeat { .. } | StmtKind::For { .. } => Family::Loop,
            StmtKind::Type { .. } => Family::Type,
            StmtKind::Scope { block: true, .. } => Family::Scope,
            StmtKind::Pseudopc(_) if brace => Family::Pseudopc,
            StmtKind::Dummy(_) if brace => Family::Dummy,
            _ => return None,
        })
    }

    fn closed_by(kind: &StmtKind) -> Option<Family> {
        Some(match kind {
            StmtKind::MacroEnd => Family::Macro,
            StmtKind::EndIf => Family::Cond,
            StmtKind::LoopEnd => Family::Loop,
            StmtKind::TypeEnd => Family::Type,
            StmtKind::ScopeEnd => Family::Scope,
            StmtKind::PseudopcEnd => Family::Pseudopc,
            StmtKind::DummyEnd => Family::Dummy,
            _ => return None,
        })
    }

    /// Statement standing in for a closing `}`
    fn closer(&self) -> StmtKind {
        match self {
            Family::Macro => StmtKind::MacroEnd,
            Family::Cond => StmtKind::EndIf,
            Family::Loop => StmtKind::LoopEnd,
            Family::Type => StmtKind::TypeEnd,
            Family::Scope => StmtKind::ScopeEnd,
            Family::Pseudopc => StmtKind::PseudopcEnd,
            Family::Dummy => StmtKind::DummyEnd,
        }
    }
}

struct Open {
    family: Family,
    stmt: usize,
    line: usize,
    // First line of the current conditional branch
    branch: usize,
    brace: bool,
    keyword: String,
}

/// Raw body lines of the macro being defined
struct Capture {
    stmt: usize,
    brace: bool,
    depth: usize,
    start: Option<usize>,
    body: Vec<String>,
}

struct FileParser<'a> {
    dialect: &'a DialectConfig,
    file: FileId,
    out: ParsedFile,
    stack: Vec<Open>,
    capture: Option<Capture>,
}

impl<'a> FileParser<'a> {
    fn run(&mut self, lines: &[&str], first: usize) {
        let mut i = 0;
        while i < lines.len() {
            let row = first + i;
            if self.capture.is_some() && self.capture_line(lines[i], row) {
                i += 1;
                continue;
            }

            // Join continued lines into one logical statement
            let lexed = LineLexer::new(lines[i], self.dialect, self.file, row).parse();
            let mut tokens = lexed.tokens;
            let mut continued = lexed.continued;
            let mut count = 1;
            while continued && i + count < lines.len() {
                let next = LineLexer::new(lines[i + count], self.dialect, self.file, row + count)
                    .parse();
                tokens.extend(next.tokens.into_iter().filter(|t| t.kind != TokenKind::Indent));
                continued = next.continued;
                count += 1;
            }

            self.line(&tokens, &lines[i..i + count], row);
            i += count;
        }
        self.finish();
    }

    /// Returns false when `line` ends the macro body
    fn capture_line(&mut self, line: &str, row: usize) -> bool {
        let dialect = self.dialect;
        let Some(capture) = self.capture.as_mut() else {
            return false;
        };
        let tokens = LineLexer::new(line, dialect, self.file, row).parse().tokens;
        let code = tokens
            .iter()
            .filter(|t| !matches!(t.kind, TokenKind::Comment(_) | TokenKind::Indent));

        if capture.brace {
            for token in code {
                if token.is_op("{") {
                    capture.depth += 1;
                } else if token.is_op("}") {
                    if capture.depth == 0 {
                        self.end_capture();
                        return false;
                    }
                    capture.depth -= 1;
                }
            }
        } else {
            for token in code.take(2) {
                let tag = match &token.kind {
                    TokenKind::Keyword(s) | TokenKind::Symbol(s) | TokenKind::Operator(s) => {
                        dialect.keyword(s).map(|(_, e)| e.target)
                    }
                    _ => None,
                };
                match tag {
                    Some(KwTarget::Stmt(StmtTag::Macro)) => {
                        capture.depth += 1;
                        break;
                    }
                    Some(KwTarget::Stmt(StmtTag::MacroEnd)) if capture.depth == 0 => {
                        self.end_capture();
                        return false;
                    }
                    Some(KwTarget::Stmt(StmtTag::MacroEnd)) => {
                        capture.depth -= 1;
                        break;
                    }
                    _ => {}
                }
            }
        }
        capture.start.get_or_insert(row);
        capture.body.push(line.to_string());
        true
    }

    fn end_capture(&mut self) {
        let Some(capture) = self.capture.take() else {
            return;
        };
        if let Some(stmt) = self.out.stmts.get_mut(capture.stmt) {
            if let StmtKind::Macro {
                body, body_line, ..
            } = &mut stmt.kind
            {
                *body = capture.body;
                *body_line = capture.start.unwrap_or(stmt.span.line + 1);
            }
        }
    }

    fn line(&mut self, tokens: &[Token], src: &[&str], row: usize) {
        // Leading `}` closes brace blocks, `} else {` switches branches
        let mut start = 0;
        loop {
            let Some(offset) = tokens[start..]
                .iter()
                .position(|t| !matches!(t.kind, TokenKind::Comment(_) | TokenKind::Indent))
            else {
                return;
            };
            let at = start + offset;
            if !tokens[at].is_op("}") {
                break;
            }
            let span = tokens[at].span;
            start = at + 1;

            let next = tokens[start..]
                .iter()
                .find(|t| !matches!(t.kind, TokenKind::Comment(_)));
            let cond_brace = self
                .stack
                .last()
                .is_some_and(|o| o.family == Family::Cond && o.brace);
            if cond_brace && next.is_some_and(|t| t.is_word("else")) {
                let pos = tokens[start..]
                    .iter()
                    .position(|t| t.is_word("else"))
                    .unwrap_or(0);
                start += pos + 1;
                if tokens.get(start).is_some_and(|t| t.is_op("{")) {
                    start += 1;
                }
                let stmt = Stmt::new(StmtKind::Else, span);
                self.push(stmt, false, row);
                continue;
            }
            self.close_brace(span, row);
        }

        let state = LineState {
            in_type: self
                .stack
                .last()
                .is_some_and(|o| o.family == Family::Type),
        };
        let line = parse_statement(&tokens[start..], self.dialect, src, state);
        self.out.diags.extend(line.diags);
        if let Some(stmt) = line.stmt {
            self.push(stmt, line.brace, row);
        }
    }

    fn push(&mut self, stmt: Stmt, brace: bool, row: usize) {
        let idx = self.out.stmts.len();
        let keyword = stmt.keyword.unwrap_or("{").to_string();
        let span = stmt.span;

        match &stmt.kind {
            StmtKind::Include(path) => self.out.includes.push((path.clone(), span)),
            StmtKind::Binary { path, .. } => self.out.binaries.push((path.clone(), span)),
            _ => {}
        }

        if let Some(family) = Family::opened_by(&stmt.kind, brace) {
            if family == Family::Macro {
                self.capture = Some(Capture {
                    stmt: idx,
                    brace,
                    depth: 0,
                    start: None,
                    body: Vec::new(),
                });
            }
            self.stack.push(Open {
                family,
                stmt: idx,
                line: row,
                branch: row,
                brace,
                keyword,
            });
        } else if matches!(stmt.kind, StmtKind::Else | StmtKind::ElseIf(_)) {
            match self.stack.last_mut() {
                Some(open) if open.family == Family::Cond => {
                    if row > open.branch {
                        self.out.blocks.push(Block {
                            keyword: open.keyword.clone(),
                            start: open.branch,
                            end: row - 1,
                        });
                    }
                    open.branch = row;
                }
                _ => self
                    .out
                    .diags
                    .push(Diagnostic::error(span, Error::UnmatchedEnd(keyword))),
            }
        } else if let Some(family) = Family::closed_by(&stmt.kind) {
            self.close(family, idx, &keyword, span, row);
        }
        self.out.stmts.push(stmt);
    }

    fn close_brace(&mut self, span: Span, row: usize) {
        let Some(open) = self.stack.last() else {
            self.out
                .diags
                .push(Diagnostic::error(span, Error::UnmatchedEnd("}".into())));
            return;
        };
        let stmt = Stmt::new(open.family.closer(), span);
        self.push(stmt, false, row);
    }

    /// Pop the block closed by statement `idx`. Closing a block that is not
    /// innermost reports the mismatch once and closes the blocks inside it.
    fn close(&mut self, family: Family, idx: usize, keyword: &str, span: Span, row: usize) {
        let Some(pos) = self.stack.iter().rposition(|o| o.family == family) else {
            // Pseudo-pc and dummy sections need no opener
            if !matches!(family, Family::Pseudopc | Family::Dummy) {
                let e = Error::UnmatchedEnd(keyword.to_string());
                self.out.diags.push(Diagnostic::error(span, e));
            }
            return;
        };
        if pos + 1 != self.stack.len() {
            if let Some(top) = self.stack.last() {
                let e = Error::MismatchedBlock(keyword.to_string(), top.keyword.clone(), top.line + 1);
                self.out.diags.push(Diagnostic::error(span, e));
            }
            self.stack.truncate(pos + 1);
        }
        if let Some(open) = self.stack.pop() {
            if let Some(stmt) = self.out.stmts.get_mut(open.stmt) {
                stmt.end = Some(idx);
            }
            self.out.blocks.push(Block {
                keyword: open.keyword,
                start: open.branch,
                end: row,
            });
        }
    }

    fn finish(&mut self) {
        self.end_capture();
        for open in std::mem::take(&mut self.stack) {
            let span = self
                .out
                .stmts
                .get(open.stmt)
                .map(|s| s.span)
                .unwrap_or_default();
            let e = Error::UnterminatedBlock(open.keyword, open.line + 1);
            self.out.diags.push(Diagnostic::error(span, e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{get_dialect, DialectId};

    #[test]
    fn test() {
        let src = "\
.macro inc16 addr
  inc addr
  bne :+
  inc addr+1
:
.endmacro
.proc main
  .if 1
    nop
  .else
    brk
  .endif
.endproc
";
        let parsed = parse_file(0, src, get_dialect(DialectId::Ca65));
        assert!(parsed.diags.is_empty(), "{:?}", parsed.diags);
        match &parsed.stmts[0].kind {
            StmtKind::Macro { body, body_line, .. } => {
                assert_eq!(body.len(), 4);
                assert_eq!(*body_line, 1);
            }
            k => panic!("unexpected {:?}", k),
        }
        assert_eq!(parsed.stmts[0].end, Some(1));
        assert_eq!(parsed.blocks.len(), 4);

        let parsed = parse_file(0, "!if 1 {\n nop\n} else {\n brk\n}\n", get_dialect(DialectId::Acme));
        assert!(parsed.diags.is_empty(), "{:?}", parsed.diags);
        assert!(matches!(parsed.stmts[2].kind, StmtKind::Else));
        assert!(matches!(parsed.stmts[4].kind, StmtKind::EndIf));

        let parsed = parse_file(0, ".proc a\n.if 1\n.endproc\n", get_dialect(DialectId::Ca65));
        assert_eq!(parsed.diags.len(), 1);
        assert_eq!(parsed.diags[0].code(), "mismatched-block");
    }
}
