use super::keyword::{
    alias, ignore, kw, kwl, stub, Grammar as G, KwEntry, LabelRule, Level, StmtTag::*, TextMode,
    TypeKind, Width, ZoneKind,
};
use super::ops::{
    bin, binr, func, group, un, BinaryInfo, BinaryOp::*, Func, FuncInfo, UnaryInfo, UnaryOp,
};
use super::{AnonStyle, DialectConfig, DialectId, LabelColon, LexRules, LocalRule, Tables};

pub(super) const LEX: LexRules = LexRules {
    symbol_start: "",
    symbol_chars: "",
    keyword_prefix: ".",
    keyword_optional: false,
    locals: &[('_', LocalRule::Cheap)],
    anon: AnonStyle::Runs,
    macro_prefix: Some('#'),
    case_sensitive: false,
    label_colon: LabelColon::Optional,
    column_labels: false,
    brace_blocks: false,
    continuation: None,
    escapes: "",
    quotes: "\"'",
    char_quote: None,
    comments: &[";"],
    comment_needs_space: false,
    column_comment: None,
    scope_sep: Some("."),
    pc_symbol: "*",
    octal_prefix: None,
    default_origin: 0,
};

pub(super) const UNARY: &[(&str, UnaryInfo)] = &[
    ("-", un(11, UnaryOp::Neg)),
    ("+", un(11, UnaryOp::Pos)),
    ("!", un(11, UnaryOp::Not)),
    ("~", un(11, UnaryOp::BitNot)),
    ("<", un(11, UnaryOp::Lo)),
    (">", un(11, UnaryOp::Hi)),
    ("`", un(11, UnaryOp::Bank)),
    ("(", group(")")),
    ("[", group("]")),
];

pub(super) const BINARY: &[(&str, BinaryInfo)] = &[
    ("**", binr(12, Pow)),
    ("*", bin(10, Mul)),
    ("/", bin(10, Div)),
    ("%", bin(10, Mod)),
    ("+", bin(9, Add)),
    ("-", bin(9, Sub)),
    ("<<", bin(8, Shl)),
    (">>", bin(8, Shr)),
    ("&", bin(7, And)),
    ("^", bin(6, Xor)),
    ("|", bin(5, Or)),
    ("<", bin(4, Lt)),
    (">", bin(4, Gt)),
    ("<=", bin(4, Le)),
    (">=", bin(4, Ge)),
    ("==", bin(4, Eq)),
    ("!=", bin(4, Ne)),
    ("&&", bin(3, LogAnd)),
    ("^^", bin(3, LogXor)),
    ("||", bin(2, LogOr)),
];

pub(super) const FUNCS: &[(&str, FuncInfo)] = &[
    ("abs", func(Func::Abs, 1, 1)),
    ("ceil", func(Func::Ceil, 1, 1)),
    ("floor", func(Func::Floor, 1, 1)),
    ("round", func(Func::Round, 1, 1)),
    ("sqrt", func(Func::Sqrt, 1, 1)),
    ("sin", func(Func::Sin, 1, 1)),
    ("cos", func(Func::Cos, 1, 1)),
    ("len", func(Func::Strlen, 1, 1)),
    ("min", func(Func::Min, 2, 2)),
    ("max", func(Func::Max, 2, 2)),
];

pub(super) const KEYWORDS: &[(&str, KwEntry)] = &[
    // Symbols
    ("=", kwl(Equate, LabelRule::Required, G::Value, "Define a constant")),
    (":=", kwl(Assign, LabelRule::Required, G::Value, "Assign a variable")),
    (".var", kwl(Assign, LabelRule::Required, G::Value, "Assign a variable")),
    // Data
    (".byte", kw(Data(Width::le(1)), G::Items, "Store 8-bit values")),
    (".char", kw(Data(Width::signed(1)), G::Items, "Store signed 8-bit values")),
    (".word", kw(Data(Width::le(2)), G::Items, "Store 16-bit values")),
    (".addr", alias(".word")),
    (".rta", kw(Data(Width::le(2)), G::Items, "Store return addresses")),
    (".sint", kw(Data(Width::signed(2)), G::Items, "Store signed 16-bit values")),
    (".long", kw(Data(Width::le(3)), G::Items, "Store 24-bit values")),
    (".lint", kw(Data(Width::signed(3)), G::Items, "Store signed 24-bit values")),
    (".dword", kw(Data(Width::le(4)), G::Items, "Store 32-bit values")),
    (".dint", kw(Data(Width::signed(4)), G::Items, "Store signed 32-bit values")),
    (".text", kw(Text(TextMode::Plain), G::Items, "Store text")),
    (".null", kw(Text(TextMode::Zero), G::Items, "Store NUL terminated text")),
    (".ptext", kw(Text(TextMode::Length), G::Items, "Store length prefixed text")),
    (".shift", kw(Text(TextMode::HighBit), G::Items, "Store text with the last byte shifted")),
    (".fill", kw(Storage, G::Exprs(1, 2), "Reserve or fill bytes")),
    (".align", kw(Align, G::Exprs(1, 2), "Align the program counter")),
    // Program counter
    (".logical", kw(Pseudopc, G::Expr, "Assemble for a different address")),
    (".here", kw(PseudopcEnd, G::None, "End a logical block")),
    (".endlogical", alias(".here")),
    (".virtual", kw(Dummy, G::OptExpr, "Assign addresses without emitting")),
    (".endv", kw(DummyEnd, G::None, "End a virtual block")),
    (".endvirtual", alias(".endv")),
    (".offs", stub("Offset the output address")),
    // Files
    (".include", kw(Include, G::Path, "Include a source file")),
    (".binary", kw(Binary, G::Path, "Include a binary file")),
    // Macros
    (".macro", kwl(Macro, LabelRule::Name, G::MacroHead, "Define a macro")),
    (".endm", kw(MacroEnd, G::None, "End a macro definition")),
    (".endmacro", alias(".endm")),
    (".function", stub("Define a function")),
    (".segment", stub("Define a segment macro")),
    // Conditionals and loops
    (".if", kw(If, G::Expr, "Assemble the block if the condition holds")),
    (".elsif", kw(ElseIf, G::Expr, "Alternative condition")),
    (".elif", alias(".elsif")),
    (".else", kw(Else, G::None, "Alternative block")),
    (".fi", kw(EndIf, G::None, "End a conditional block")),
    (".endif", alias(".fi")),
    (".rept", kw(Repeat, G::Repeat, "Repeat a block")),
    (".endrept", kw(LoopEnd, G::None, "End a repeat block")),
    (".next", alias(".endrept")),
    (".for", stub("Loop with a counter")),
    (".while", stub("Loop while a condition holds")),
    // Scopes
    (".proc", kwl(Zone(ZoneKind::Proc), LabelRule::Name, G::None, "Define a procedure")),
    (".pend", kw(ScopeEnd, G::None, "End a procedure")),
    (".endproc", alias(".pend")),
    (".block", kw(Zone(ZoneKind::Block), G::None, "Open a block scope")),
    (".bend", kw(ScopeEnd, G::None, "End a block scope")),
    (".endblock", alias(".bend")),
    (".struct", kwl(Type(TypeKind::Struct), LabelRule::Name, G::None, "Define a structure")),
    (".ends", kw(TypeEnd, G::None, "End a structure")),
    (".endstruct", alias(".ends")),
    (".union", kwl(Type(TypeKind::Union), LabelRule::Name, G::None, "Define a union")),
    (".endu", kw(TypeEnd, G::None, "End a union")),
    (".endunion", alias(".endu")),
    (".weak", stub("Open a weak symbol block")),
    (".section", stub("Open an output section")),
    (".dsection", stub("Place an output section")),
    (".page", stub("Check page crossing")),
    // Messages
    (".error", kw(Message(Level::Error), G::Items, "Report an error")),
    (".warn", kw(Message(Level::Warning), G::Items, "Report a warning")),
    (".cerror", kw(MessageIf(Level::Error), G::CondItems, "Report an error if the condition holds")),
    (".cwarn", kw(MessageIf(Level::Warning), G::CondItems, "Report a warning if the condition holds")),
    (".end", kw(End, G::None, "End of source")),
    // Options
    (".cpu", ignore("Select the processor")),
    (".enc", ignore("Select the text encoding")),
    (".cdef", ignore("Define character mappings")),
    (".edef", ignore("Define escape mappings")),
    (".as", ignore("Accumulator width")),
    (".al", ignore("Accumulator width")),
    (".xs", ignore("Index width")),
    (".xl", ignore("Index width")),
];

pub(super) fn config() -> DialectConfig {
    let mut config = DialectConfig::new(
        DialectId::Tass64,
        LEX,
        Tables {
            keywords: KEYWORDS.to_vec(),
            unary: UNARY,
            binary: BINARY,
            funcs: Some(FUNCS),
            extra: &[],
        },
    );
    config.scoped_labels = true;
    config.keyword_macros = true;
    config
}
