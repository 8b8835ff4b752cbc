use super::keyword::{
    alias, ignore, kw, kwl, stub, Grammar as G, KwEntry, LabelRule, Level, StmtTag::*, TextMode,
    TypeKind, Width, ZoneKind,
};
use super::ops::{bin, func, group, un, BinaryInfo, BinaryOp::*, Func, FuncInfo, UnaryInfo, UnaryOp};
use super::{AnonStyle, DialectConfig, DialectId, LabelColon, LexRules, LocalRule, Tables};

pub(super) const LEX: LexRules = LexRules {
    symbol_start: "@",
    symbol_chars: "",
    keyword_prefix: ".",
    keyword_optional: false,
    locals: &[('@', LocalRule::Cheap)],
    anon: AnonStyle::Colon,
    macro_prefix: None,
    case_sensitive: true,
    label_colon: LabelColon::Required,
    column_labels: false,
    brace_blocks: false,
    continuation: None,
    escapes: "",
    quotes: "\"",
    char_quote: Some('\''),
    comments: &[";"],
    comment_needs_space: false,
    column_comment: None,
    scope_sep: Some("::"),
    pc_symbol: "*",
    octal_prefix: None,
    default_origin: 0,
};

pub(super) const UNARY: &[(&str, UnaryInfo)] = &[
    ("+", un(7, UnaryOp::Pos)),
    ("-", un(7, UnaryOp::Neg)),
    ("~", un(7, UnaryOp::BitNot)),
    (".bitnot", un(7, UnaryOp::BitNot)),
    ("<", un(7, UnaryOp::Lo)),
    (".lobyte", un(7, UnaryOp::Lo)),
    (">", un(7, UnaryOp::Hi)),
    (".hibyte", un(7, UnaryOp::Hi)),
    ("^", un(7, UnaryOp::Bank)),
    (".bankbyte", un(7, UnaryOp::Bank)),
    ("!", un(1, UnaryOp::Not)),
    (".not", un(1, UnaryOp::Not)),
    ("(", group(")")),
];

pub(super) const BINARY: &[(&str, BinaryInfo)] = &[
    ("*", bin(6, Mul)),
    ("/", bin(6, Div)),
    (".mod", bin(6, Mod)),
    ("&", bin(6, And)),
    (".bitand", bin(6, And)),
    ("^", bin(6, Xor)),
    (".bitxor", bin(6, Xor)),
    ("<<", bin(6, Shl)),
    (".shl", bin(6, Shl)),
    (">>", bin(6, Shr)),
    (".shr", bin(6, Shr)),
    ("+", bin(5, Add)),
    ("-", bin(5, Sub)),
    ("|", bin(5, Or)),
    (".bitor", bin(5, Or)),
    ("=", bin(4, Eq)),
    ("<>", bin(4, Ne)),
    ("<", bin(4, Lt)),
    (">", bin(4, Gt)),
    ("<=", bin(4, Le)),
    (">=", bin(4, Ge)),
    ("&&", bin(3, LogAnd)),
    (".and", bin(3, LogAnd)),
    (".xor", bin(3, LogXor)),
    ("||", bin(2, LogOr)),
    (".or", bin(2, LogOr)),
];

pub(super) const FUNCS: &[(&str, FuncInfo)] = &[
    (".defined", func(Func::Defined, 1, 1)),
    (".def", func(Func::Defined, 1, 1)),
    (".min", func(Func::Min, 2, 2)),
    (".max", func(Func::Max, 2, 2)),
    (".strlen", func(Func::Strlen, 1, 1)),
];

pub(super) const KEYWORDS: &[(&str, KwEntry)] = &[
    // Symbols
    ("=", kwl(Equate, LabelRule::Required, G::Value, "Define a constant")),
    (":=", kwl(Equate, LabelRule::Required, G::Value, "Define a label")),
    (".set", kwl(Assign, LabelRule::Required, G::Value, "Assign a variable")),
    // Segments and program counter
    (".org", kw(Org, G::Expr, "Set the program counter")),
    (".align", kw(Align, G::Exprs(1, 2), "Align the program counter")),
    (".segment", kw(Segment, G::Name, "Switch to a named segment")),
    (".code", kw(Segment, G::None, "Switch to the CODE segment")),
    (".data", kw(Segment, G::None, "Switch to the DATA segment")),
    (".bss", kw(Segment, G::None, "Switch to the BSS segment")),
    (".rodata", kw(Segment, G::None, "Switch to the RODATA segment")),
    (".zeropage", kw(Segment, G::None, "Switch to the ZEROPAGE segment")),
    // Data
    (".byte", kw(Data(Width::le(1)), G::Items, "Store 8-bit values")),
    (".byt", alias(".byte")),
    (".word", kw(Data(Width::le(2)), G::Items, "Store 16-bit values, little endian")),
    (".addr", alias(".word")),
    (".dbyt", kw(Data(Width::be(2)), G::Items, "Store 16-bit values, big endian")),
    (".faraddr", kw(Data(Width::le(3)), G::Items, "Store 24-bit addresses")),
    (".dword", kw(Data(Width::le(4)), G::Items, "Store 32-bit values")),
    (".asciiz", kw(Text(TextMode::Zero), G::Items, "Store NUL terminated text")),
    (".res", kw(Storage, G::Exprs(1, 2), "Reserve storage")),
    (".lobytes", stub("Store low bytes of a list")),
    (".hibytes", stub("Store high bytes of a list")),
    // Files
    (".include", kw(Include, G::Path, "Include a source file")),
    (".incbin", kw(Binary, G::Path, "Include a binary file")),
    // Macros
    (".macro", kw(Macro, G::MacroHead, "Define a macro")),
    (".mac", alias(".macro")),
    (".endmacro", kw(MacroEnd, G::None, "End a macro definition")),
    (".endmac", alias(".endmacro")),
    (".define", stub("Define a C-style macro")),
    // Conditionals
    (".if", kw(If, G::Expr, "Assemble the block if the condition holds")),
    (".ifdef", kw(IfDef, G::Defined, "Assemble the block if the symbol is defined")),
    (".ifndef", kw(IfNDef, G::Defined, "Assemble the block if the symbol is undefined")),
    (".elseif", kw(ElseIf, G::Expr, "Alternative condition")),
    (".else", kw(Else, G::None, "Alternative block")),
    (".endif", kw(EndIf, G::None, "End a conditional block")),
    (".ifconst", stub("Test whether an expression is constant")),
    (".ifblank", stub("Test for an empty macro argument")),
    (".ifnblank", stub("Test for a non-empty macro argument")),
    // Loops
    (".repeat", kw(Repeat, G::Repeat, "Repeat a block")),
    (".rep", alias(".repeat")),
    (".endrepeat", kw(LoopEnd, G::None, "End a repeat block")),
    (".endrep", alias(".endrepeat")),
    // Scopes and types
    (".proc", kw(Zone(ZoneKind::Proc), G::Name, "Open a procedure scope")),
    (".endproc", kw(ScopeEnd, G::None, "Close a procedure scope")),
    (".scope", kw(Zone(ZoneKind::Scope), G::OptName, "Open a lexical scope")),
    (".endscope", kw(ScopeEnd, G::None, "Close a lexical scope")),
    (".struct", kw(Type(TypeKind::Struct), G::OptName, "Define a structure")),
    (".endstruct", kw(TypeEnd, G::None, "End a structure")),
    (".union", kw(Type(TypeKind::Union), G::OptName, "Define a union")),
    (".endunion", kw(TypeEnd, G::None, "End a union")),
    (".enum", kw(Type(TypeKind::Enum), G::OptName, "Define an enumeration")),
    (".endenum", kw(TypeEnd, G::None, "End an enumeration")),
    (".tag", stub("Reserve storage for a structure")),
    // Linkage
    (".import", kw(Import { zp: false }, G::Names, "Import symbols")),
    (".importzp", kw(Import { zp: true }, G::Names, "Import zero page symbols")),
    (".export", kw(Export { zp: false }, G::Names, "Export symbols")),
    (".exportzp", kw(Export { zp: true }, G::Names, "Export zero page symbols")),
    (".global", alias(".export")),
    (".globalzp", alias(".exportzp")),
    // Messages
    (".error", kw(Message(Level::Error), G::Items, "Report an error")),
    (".warning", kw(Message(Level::Warning), G::Items, "Report a warning")),
    (".fatal", kw(Message(Level::Fatal), G::Items, "Report a fatal error")),
    (".assert", kw(Assert, G::Assert, "Check a condition")),
    (".out", ignore("Print a message")),
    (".end", kw(End, G::None, "End of source")),
    // Options
    (".setcpu", ignore("Select the processor")),
    (".p02", ignore("Select the 6502 instruction set")),
    (".pc02", ignore("Select the 65C02 instruction set")),
    (".feature", ignore("Enable a feature")),
    (".list", ignore("Control listing output")),
    (".listbytes", ignore("Control listing output")),
    (".debuginfo", ignore("Control debug information")),
    (".smart", ignore("Enable smart mode")),
    (".autoimport", ignore("Import undefined symbols")),
    (".local", stub("Declare macro-local symbols")),
    (".localchar", stub("Change the cheap local prefix")),
    (".charmap", stub("Define a character mapping")),
];

pub(super) fn config() -> DialectConfig {
    let mut config = DialectConfig::new(
        DialectId::Ca65,
        LEX,
        Tables {
            keywords: KEYWORDS.to_vec(),
            unary: UNARY,
            binary: BINARY,
            funcs: Some(FUNCS),
            extra: &["::"],
        },
    );
    config.scoped_labels = true;
    config
}
