use super::keyword::{
    alias, ignore, kw, kwl, stub, Grammar as G, KwEntry, LabelRule, Level, StmtTag::*, Width,
    ZoneKind,
};
use super::ops::{bin, group, un, BinaryInfo, BinaryOp::*, UnaryInfo, UnaryOp};
use super::{AnonStyle, DialectConfig, DialectId, LabelColon, LexRules, LocalRule, Tables};

pub(super) const LEX: LexRules = LexRules {
    symbol_start: ".",
    symbol_chars: ".",
    keyword_prefix: ".",
    keyword_optional: true,
    locals: &[('.', LocalRule::Zone)],
    anon: AnonStyle::None,
    macro_prefix: None,
    case_sensitive: true,
    label_colon: LabelColon::Optional,
    column_labels: true,
    brace_blocks: false,
    continuation: None,
    escapes: "",
    quotes: "\"",
    char_quote: Some('\''),
    comments: &[";"],
    comment_needs_space: false,
    column_comment: None,
    scope_sep: None,
    pc_symbol: "*",
    octal_prefix: None,
    default_origin: 0,
};

pub(super) const UNARY: &[(&str, UnaryInfo)] = &[
    ("~", un(20, UnaryOp::BitNot)),
    ("-", un(20, UnaryOp::Neg)),
    ("!", un(20, UnaryOp::Not)),
    ("<", un(20, UnaryOp::Lo)),
    (">", un(20, UnaryOp::Hi)),
    ("[", group("]")),
    ("(", group(")")),
];

pub(super) const BINARY: &[(&str, BinaryInfo)] = &[
    ("*", bin(19, Mul)),
    ("/", bin(19, Div)),
    ("%", bin(19, Mod)),
    ("+", bin(18, Add)),
    ("-", bin(18, Sub)),
    (">>", bin(17, Shr)),
    ("<<", bin(17, Shl)),
    (">", bin(16, Gt)),
    (">=", bin(16, Ge)),
    ("<", bin(16, Lt)),
    ("<=", bin(16, Le)),
    ("==", bin(15, Eq)),
    ("=", bin(15, Eq)),
    ("!=", bin(15, Ne)),
    ("&", bin(14, And)),
    ("^", bin(13, Xor)),
    ("|", bin(12, Or)),
    ("&&", bin(11, LogAnd)),
    ("||", bin(10, LogOr)),
];

pub(super) const KEYWORDS: &[(&str, KwEntry)] = &[
    // Symbols
    ("=", kwl(Equate, LabelRule::Required, G::Value, "Define a constant")),
    ("equ", kwl(Equate, LabelRule::Required, G::Value, "Define a constant")),
    ("set", kwl(Assign, LabelRule::Required, G::Value, "Assign a variable")),
    ("eqm", stub("Define an expression macro")),
    // Program counter
    ("processor", ignore("Select the processor")),
    ("org", kw(Org, G::Exprs(1, 2), "Set the program counter")),
    ("rorg", kw(Pseudopc, G::Expr, "Assemble for a different address")),
    ("rend", kw(PseudopcEnd, G::None, "End relocatable origin")),
    ("seg", kw(Segment, G::OptName, "Switch segment")),
    ("seg.u", kw(Segment, G::OptName, "Switch to an uninitialized segment")),
    ("align", kw(Align, G::Exprs(1, 2), "Align the program counter")),
    // Data
    ("dc.b", kw(Data(Width::le(1)), G::Items, "Store 8-bit values")),
    ("dc", alias("dc.b")),
    ("byte", alias("dc.b")),
    ("dc.w", kw(Data(Width::le(2)), G::Items, "Store 16-bit values")),
    ("word", alias("dc.w")),
    ("dc.l", kw(Data(Width::le(4)), G::Items, "Store 32-bit values")),
    ("long", alias("dc.l")),
    ("ds.b", kw(Storage, G::Exprs(1, 2), "Reserve storage")),
    ("ds", alias("ds.b")),
    ("ds.w", stub("Reserve word storage")),
    ("hex", stub("Store hex digit pairs")),
    // Files
    ("include", kw(Include, G::Path, "Include a source file")),
    ("incbin", kw(Binary, G::Path, "Include a binary file")),
    ("incdir", ignore("Add an include directory")),
    // Macros
    ("mac", kw(Macro, G::MacroHead, "Define a macro")),
    ("macro", alias("mac")),
    ("endm", kw(MacroEnd, G::None, "End a macro definition")),
    ("mexit", stub("Leave a macro early")),
    // Conditionals and loops
    ("if", kw(If, G::Expr, "Assemble the block if the condition holds")),
    ("ifconst", kw(IfDef, G::Defined, "Assemble the block if the symbol is known")),
    ("ifnconst", kw(IfNDef, G::Defined, "Assemble the block if the symbol is unknown")),
    ("else", kw(Else, G::None, "Alternative block")),
    ("endif", kw(EndIf, G::None, "End a conditional block")),
    ("eif", alias("endif")),
    ("repeat", kw(Repeat, G::Repeat, "Repeat a block")),
    ("repend", kw(LoopEnd, G::None, "End a repeat block")),
    // Scopes
    ("subroutine", kw(Zone(ZoneKind::Subroutine), G::OptName, "Start a new local label scope")),
    // Messages
    ("err", kw(Message(Level::Fatal), G::Items, "Abort assembly")),
    ("echo", ignore("Print values")),
    ("list", ignore("Control listing output")),
    ("trace", ignore("Control tracing")),
    ("end", kw(End, G::None, "End of source")),
];

pub(super) fn config() -> DialectConfig {
    DialectConfig::new(
        DialectId::Dasm,
        LEX,
        Tables {
            keywords: KEYWORDS.to_vec(),
            unary: UNARY,
            binary: BINARY,
            funcs: None,
            extra: &[],
        },
    )
}
