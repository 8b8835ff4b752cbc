use super::keyword::{
    ignore, kw, stub, Grammar as G, KwEntry, Level, StmtTag::*, TextMode, Width, ZoneKind,
};
use super::ops::{bin, func, group, un, BinaryInfo, BinaryOp::*, Func, FuncInfo, UnaryInfo, UnaryOp};
use super::{AnonStyle, DialectConfig, DialectId, LabelColon, LexRules, Tables};

pub(super) const LEX: LexRules = LexRules {
    symbol_start: "",
    symbol_chars: "",
    keyword_prefix: ".",
    keyword_optional: false,
    locals: &[],
    anon: AnonStyle::Bang,
    macro_prefix: None,
    case_sensitive: true,
    label_colon: LabelColon::Required,
    column_labels: false,
    brace_blocks: true,
    continuation: None,
    escapes: "\\\"'nrt0",
    quotes: "\"",
    char_quote: Some('\''),
    comments: &["//", ";", "/*"],
    comment_needs_space: false,
    column_comment: None,
    scope_sep: Some("."),
    pc_symbol: "*",
    octal_prefix: None,
    default_origin: 0,
};

pub(super) const UNARY: &[(&str, UnaryInfo)] = &[
    ("!", un(12, UnaryOp::Not)),
    ("~", un(12, UnaryOp::BitNot)),
    ("-", un(12, UnaryOp::Neg)),
    ("+", un(12, UnaryOp::Pos)),
    ("<", un(12, UnaryOp::Lo)),
    (">", un(12, UnaryOp::Hi)),
    ("(", group(")")),
    ("[", group("]")),
];

pub(super) const BINARY: &[(&str, BinaryInfo)] = &[
    ("*", bin(11, Mul)),
    ("/", bin(11, Div)),
    ("%", bin(11, Mod)),
    ("+", bin(10, Add)),
    ("-", bin(10, Sub)),
    ("<<", bin(9, Shl)),
    (">>", bin(9, Shr)),
    ("<", bin(8, Lt)),
    ("<=", bin(8, Le)),
    (">", bin(8, Gt)),
    (">=", bin(8, Ge)),
    ("==", bin(7, Eq)),
    ("!=", bin(7, Ne)),
    ("&", bin(6, And)),
    ("^", bin(5, Xor)),
    ("|", bin(4, Or)),
    ("&&", bin(3, LogAnd)),
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
    ("min", func(Func::Min, 2, 2)),
    ("max", func(Func::Max, 2, 2)),
    ("pow", func(Func::Pow, 2, 2)),
    ("mod", func(Func::Mod, 2, 2)),
];

pub(super) const KEYWORDS: &[(&str, KwEntry)] = &[
    // Symbols
    (".const", kw(Equate, G::NamedValue, "Define a constant")),
    (".var", kw(Assign, G::NamedValue, "Define a variable")),
    (".eval", kw(Assign, G::NamedValue, "Reassign a variable")),
    (".label", kw(Equate, G::NamedValue, "Define an address label")),
    // Program counter
    (".pc", kw(Org, G::Value, "Set the program counter")),
    (".pseudopc", kw(Pseudopc, G::Expr, "Assemble for a different address")),
    (".align", kw(Align, G::Expr, "Align the program counter")),
    (".segment", kw(Segment, G::Name, "Switch to a named segment")),
    (".segmentdef", ignore("Define a segment")),
    // Data
    (".byte", kw(Data(Width::le(1)), G::Items, "Store 8-bit values")),
    (".by", kw(Data(Width::le(1)), G::Items, "Store 8-bit values")),
    (".word", kw(Data(Width::le(2)), G::Items, "Store 16-bit values")),
    (".wo", kw(Data(Width::le(2)), G::Items, "Store 16-bit values")),
    (".dword", kw(Data(Width::le(4)), G::Items, "Store 32-bit values")),
    (".dw", kw(Data(Width::le(4)), G::Items, "Store 32-bit values")),
    (".text", kw(Text(TextMode::Plain), G::Items, "Store text")),
    (".te", kw(Text(TextMode::Plain), G::Items, "Store text")),
    (".fill", kw(Storage, G::Exprs(1, 2), "Fill bytes with a generated value")),
    // Files
    (".import", kw(Include, G::ImportPath, "Import a source or binary file")),
    (".importonce", ignore("Skip this file if already imported")),
    // Macros and scopes
    (".macro", kw(Macro, G::MacroHead, "Define a macro")),
    (".function", stub("Define a function")),
    (".pseudocommand", stub("Define a pseudo command")),
    (".namespace", kw(Zone(ZoneKind::Scope), G::Name, "Open a namespace")),
    (".filenamespace", stub("Set the namespace for the rest of the file")),
    (".struct", stub("Define a structure")),
    (".enum", stub("Define an enumeration")),
    // Flow
    (".if", kw(If, G::Expr, "Assemble the block if the condition holds")),
    (".for", stub("Loop with an iterator")),
    (".while", stub("Loop while a condition holds")),
    (".return", stub("Return from a function")),
    // Messages
    (".error", kw(Message(Level::Error), G::Items, "Report an error")),
    (".errorif", kw(MessageIf(Level::Error), G::CondItems, "Report an error if the condition holds")),
    (".assert", kw(Assert, G::Assert, "Check a condition")),
    (".print", ignore("Print a message")),
    (".printnow", ignore("Print a message immediately")),
    (".encoding", ignore("Select the text encoding")),
    (".cpu", ignore("Select the processor")),
    (".break", ignore("Emit a debugger breakpoint")),
    (".zp", stub("Declare zero page variables")),
];

pub(super) fn config() -> DialectConfig {
    let mut config = DialectConfig::new(
        DialectId::Kick,
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
    config.call_macros = true;
    config
}
