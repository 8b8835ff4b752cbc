use strum::Display;

/// Byte layout of a data directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Width {
    pub bytes: u8,
    pub signed: bool,
    pub big: bool,
}

impl Width {
    pub const fn le(bytes: u8) -> Self {
        Width {
            bytes,
            signed: false,
            big: false,
        }
    }
    pub const fn be(bytes: u8) -> Self {
        Width {
            bytes,
            signed: false,
            big: true,
        }
    }
    pub const fn signed(bytes: u8) -> Self {
        Width {
            bytes,
            signed: true,
            big: false,
        }
    }

    /// Accepted value range. Unsigned widths also take negative values
    /// down to the two's complement minimum.
    pub fn fits(&self, v: i64) -> bool {
        if self.bytes >= 8 {
            return true;
        }
        let bits = self.bytes as u32 * 8;
        let min = -(1i64 << (bits - 1));
        let max = if self.signed {
            (1i64 << (bits - 1)) - 1
        } else {
            (1i64 << bits) - 1
        };
        (min..=max).contains(&v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TextMode {
    Plain,
    // NUL terminated
    Zero,
    // Length byte first
    Length,
    // High bit set on the last character
    HighBit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Level {
    Error,
    Warning,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TypeKind {
    Struct,
    Union,
    Enum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ZoneKind {
    Zone,
    Proc,
    Scope,
    Subroutine,
    Block,
}

/// Statement a keyword produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StmtTag {
    Equate,
    Assign,
    Org,
    Align,
    AlignMask,
    Segment,
    Dummy,
    DummyEnd,
    Pseudopc,
    PseudopcEnd,
    Include,
    Binary,
    Macro,
    MacroEnd,
    Invoke,
    Data(Width),
    Text(TextMode),
    Storage,
    Type(TypeKind),
    TypeEnd,
    If,
    IfDef,
    IfNDef,
    ElseIf,
    Else,
    EndIf,
    Repeat,
    For,
    LoopEnd,
    Zone(ZoneKind),
    ScopeEnd,
    Import { zp: bool },
    Export { zp: bool },
    Message(Level),
    MessageIf(Level),
    Assert,
    End,
    Ignore,
}

/// Where the label of a keyword line may appear and what it means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRule {
    // Defines an address label like any other line
    Allowed,
    // Names the defined symbol (`x = 1`, `x equ 1`)
    Required,
    // Names the construct itself (`name .macro`, `name .proc`)
    Name,
}

/// Operand shape following a keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    None,
    Any,
    Expr,
    OptExpr,
    Exprs(u8, u8),
    Items,
    Value,
    NamedValue,
    Name,
    OptName,
    Names,
    Path,
    ImportPath,
    MacroHead,
    MacroArgs,
    Defined,
    Repeat,
    For,
    CondItems,
    Assert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KwTarget {
    Stmt(StmtTag),
    Alias(&'static str),
    Stub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KwEntry {
    pub target: KwTarget,
    pub label: LabelRule,
    pub grammar: Grammar,
    pub desc: &'static str,
}

pub const fn kw(tag: StmtTag, grammar: Grammar, desc: &'static str) -> KwEntry {
    KwEntry {
        target: KwTarget::Stmt(tag),
        label: LabelRule::Allowed,
        grammar,
        desc,
    }
}

pub const fn kwl(tag: StmtTag, label: LabelRule, grammar: Grammar, desc: &'static str) -> KwEntry {
    KwEntry {
        target: KwTarget::Stmt(tag),
        label,
        grammar,
        desc,
    }
}

pub const fn alias(to: &'static str) -> KwEntry {
    KwEntry {
        target: KwTarget::Alias(to),
        label: LabelRule::Allowed,
        grammar: Grammar::Any,
        desc: "",
    }
}

pub const fn stub(desc: &'static str) -> KwEntry {
    KwEntry {
        target: KwTarget::Stub,
        label: LabelRule::Allowed,
        grammar: Grammar::Any,
        desc,
    }
}

pub const fn ignore(desc: &'static str) -> KwEntry {
    kw(StmtTag::Ignore, Grammar::Any, desc)
}

#[test]
fn test() {
    assert!(Width::le(1).fits(255));
    assert!(Width::le(1).fits(-128));
    assert!(!Width::le(1).fits(256));
    assert!(!Width::signed(1).fits(128));
    assert!(Width::le(2).fits(0xFFFF));
}
