use arch::{Form, Mnemonic};

use super::token::{AnonMark, Span};
use crate::dialect::keyword::{Level, TextMode, TypeKind, Width, ZoneKind};
use crate::dialect::ops::{BinaryOp, UnaryOp};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(i64, Span),
    Text(String, Span),
    Symbol(String, Span),
    Pc(Span),
    Anon(AnonMark, Span),
    Unary(UnaryOp, Box<Expr>, Span),
    Binary(BinaryOp, Box<Expr>, Box<Expr>, Span),
    Group(Box<Expr>, Span),
    Call(String, Vec<Expr>, Span),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Number(_, s)
            | Expr::Text(_, s)
            | Expr::Symbol(_, s)
            | Expr::Pc(s)
            | Expr::Anon(_, s)
            | Expr::Unary(_, _, s)
            | Expr::Binary(_, _, _, s)
            | Expr::Group(_, s)
            | Expr::Call(_, _, s) => *s,
        }
    }

    /// Visit every symbol reference
    pub fn symbols<'e>(&'e self, f: &mut impl FnMut(&'e str, Span)) {
        match self {
            Expr::Symbol(name, span) => f(name, *span),
            Expr::Unary(_, e, _) | Expr::Group(e, _) => e.symbols(f),
            Expr::Binary(_, l, r, _) => {
                l.symbols(f);
                r.symbols(f);
            }
            Expr::Call(_, args, _) => args.iter().for_each(|a| a.symbols(f)),
            _ => {}
        }
    }
}

/// Data list element
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Expr(Expr),
    Text(String, Span),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cond {
    Expr(Expr),
    Defined { name: String, span: Span, negate: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacroParam {
    pub name: String,
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Label {
    Named(String, Span),
    Anon(AnonMark, Span),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Label,
    Instruction {
        op: Mnemonic,
        form: Form,
        operand: Option<Expr>,
    },
    Equate {
        name: String,
        span: Span,
        value: Expr,
        variable: bool,
    },
    Org(Option<Expr>),
    Align {
        args: Vec<Expr>,
        mask: bool,
    },
    Segment(String),
    Dummy(Option<Expr>),
    DummyEnd,
    Pseudopc(Expr),
    PseudopcEnd,
    Include(String),
    Binary {
        path: String,
        args: Vec<Expr>,
    },
    Macro {
        name: String,
        params: Vec<MacroParam>,
        body: Vec<String>,
        body_line: usize,
    },
    MacroEnd,
    Call {
        name: String,
        args: Vec<String>,
        span: Span,
    },
    Data {
        width: Width,
        items: Vec<Item>,
    },
    Text {
        mode: TextMode,
        items: Vec<Item>,
    },
    Storage {
        count: Expr,
        fill: Option<Expr>,
    },
    Type {
        kind: TypeKind,
        name: Option<(String, Span)>,
    },
    TypeEnd,
    If(Cond),
    ElseIf(Cond),
    Else,
    EndIf,
    Repeat {
        count: Expr,
        var: Option<(String, Span)>,
    },
    For {
        var: (String, Span),
        start: Expr,
        end: Expr,
    },
    LoopEnd,
    Scope {
        kind: ZoneKind,
        name: Option<(String, Span)>,
        block: bool,
    },
    ScopeEnd,
    Import {
        names: Vec<(String, Span)>,
        zp: bool,
    },
    Export {
        names: Vec<(String, Span)>,
        zp: bool,
    },
    Message {
        level: Level,
        cond: Option<Expr>,
        assert: bool,
        items: Vec<Item>,
    },
    End,
    Ignored,
    Unsupported(String),
}

impl StmtKind {
    /// Statements that always open a block closed by a later statement.
    /// Pseudo-pc and dummy sections nest only when written with braces.
    pub fn opens(&self) -> bool {
        matches!(
            self,
            StmtKind::Macro { .. }
                | StmtKind::If(_)
                | StmtKind::Repeat { .. }
                | StmtKind::For { .. }
                | StmtKind::Type { .. }
                | StmtKind::Scope { block: true, .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub label: Option<Label>,
    pub keyword: Option<&'static str>,
    pub kind: StmtKind,
    pub span: Span,
    // Index of the statement closing this block
    pub end: Option<usize>,
    pub comment: Option<String>,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt {
            label: None,
            keyword: None,
            kind,
            span,
            end: None,
            comment: None,
        }
    }

    pub fn line(&self) -> usize {
        self.span.line
    }
}
