use super::keyword::{
    alias, ignore, kw, kwl, stub, Grammar as G, KwEntry, LabelRule, Level, StmtTag::*, TextMode,
    Width, ZoneKind,
};
use super::ops::{bin, binr, func, group, un, BinaryInfo, BinaryOp::*, Func, FuncInfo, UnaryInfo, UnaryOp};
use super::{AnonStyle, DialectConfig, DialectId, LabelColon, LexRules, LocalRule, Tables};

pub(super) const LEX: LexRules = LexRules {
    symbol_start: ".@",
    symbol_chars: "",
    keyword_prefix: "!",
    keyword_optional: false,
    locals: &[('.', LocalRule::Zone), ('@', LocalRule::Cheap)],
    anon: AnonStyle::Runs,
    macro_prefix: Some('+'),
    case_sensitive: true,
    label_colon: LabelColon::Optional,
    column_labels: false,
    brace_blocks: true,
    continuation: None,
    escapes: "\\\"'0tnr",
    quotes: "\"",
    char_quote: Some('\''),
    comments: &[";"],
    comment_needs_space: false,
    column_comment: None,
    scope_sep: None,
    pc_symbol: "*",
    octal_prefix: Some('&'),
    default_origin: 0,
};

pub(super) const UNARY: &[(&str, UnaryInfo)] = &[
    ("!", un(13, UnaryOp::BitNot)),
    ("-", un(11, UnaryOp::Neg)),
    ("+", un(11, UnaryOp::Pos)),
    ("<", un(7, UnaryOp::Lo)),
    (">", un(7, UnaryOp::Hi)),
    ("^", un(7, UnaryOp::Bank)),
    ("(", group(")")),
];

pub(super) const BINARY: &[(&str, BinaryInfo)] = &[
    ("^", binr(12, Pow)),
    ("*", bin(10, Mul)),
    ("/", bin(10, Div)),
    ("div", bin(10, Div)),
    ("%", bin(10, Mod)),
    ("mod", bin(10, Mod)),
    ("+", bin(9, Add)),
    ("-", bin(9, Sub)),
    ("<<", bin(8, Shl)),
    ("asl", bin(8, Shl)),
    ("lsl", bin(8, Shl)),
    (">>", bin(8, Shr)),
    ("asr", bin(8, Shr)),
    (">>>", bin(8, Lsr)),
    ("lsr", bin(8, Lsr)),
    ("<=", bin(6, Le)),
    ("<", bin(6, Lt)),
    (">=", bin(6, Ge)),
    (">", bin(6, Gt)),
    ("!=", bin(5, Ne)),
    ("<>", bin(5, Ne)),
    ("><", bin(5, Ne)),
    ("=", bin(5, Eq)),
    ("==", bin(5, Eq)),
    ("&", bin(4, And)),
    ("and", bin(4, And)),
    ("xor", bin(3, Xor)),
    ("|", bin(2, Or)),
    ("or", bin(2, Or)),
];

pub(super) const FUNCS: &[(&str, FuncInfo)] = &[
    ("int", func(Func::Int, 1, 1)),
    ("float", func(Func::Float, 1, 1)),
    ("sin", func(Func::Sin, 1, 1)),
    ("cos", func(Func::Cos, 1, 1)),
    ("len", func(Func::Strlen, 1, 1)),
];

pub(super) const KEYWORDS: &[(&str, KwEntry)] = &[
    // Symbols
    ("=", kwl(Equate, LabelRule::Required, G::Value, "Define a constant")),
    ("!set", kw(Assign, G::NamedValue, "Assign a variable")),
    ("!addr", kw(Equate, G::NamedValue, "Define an address symbol")),
    ("!address", alias("!addr")),
    // Data
    ("!byte", kw(Data(Width::le(1)), G::Items, "Store 8-bit values")),
    ("!by", alias("!byte")),
    ("!8", alias("!byte")),
    ("!08", alias("!byte")),
    ("!word", kw(Data(Width::le(2)), G::Items, "Store 16-bit values, little endian")),
    ("!wo", alias("!word")),
    ("!16", alias("!word")),
    ("!le16", alias("!word")),
    ("!be16", kw(Data(Width::be(2)), G::Items, "Store 16-bit values, big endian")),
    ("!24", kw(Data(Width::le(3)), G::Items, "Store 24-bit values, little endian")),
    ("!le24", alias("!24")),
    ("!be24", kw(Data(Width::be(3)), G::Items, "Store 24-bit values, big endian")),
    ("!32", kw(Data(Width::le(4)), G::Items, "Store 32-bit values, little endian")),
    ("!le32", alias("!32")),
    ("!be32", kw(Data(Width::be(4)), G::Items, "Store 32-bit values, big endian")),
    ("!hex", stub("Store hex digit pairs")),
    ("!h", alias("!hex")),
    ("!text", kw(Text(TextMode::Plain), G::Items, "Store text using the current table")),
    ("!tx", alias("!text")),
    ("!pet", kw(Text(TextMode::Plain), G::Items, "Store PETSCII text")),
    ("!raw", kw(Text(TextMode::Plain), G::Items, "Store raw text")),
    ("!scr", kw(Text(TextMode::Plain), G::Items, "Store screen codes")),
    ("!scrxor", stub("Store screen codes xor'ed with a value")),
    ("!fill", kw(Storage, G::Exprs(1, 2), "Fill bytes with a value")),
    ("!fi", alias("!fill")),
    ("!skip", kw(Storage, G::Exprs(1, 1), "Advance the program counter")),
    ("!align", kw(AlignMask, G::Exprs(2, 3), "Pad until (pc & mask) equals value")),
    // Program counter
    ("!pseudopc", kw(Pseudopc, G::Expr, "Assemble for a different address")),
    ("!realpc", kw(PseudopcEnd, G::None, "End a pseudo-pc block")),
    ("!initmem", ignore("Set the fill byte for unused memory")),
    // Files
    ("!source", kw(Include, G::Path, "Include a source file")),
    ("!src", alias("!source")),
    ("!binary", kw(Binary, G::Path, "Include a binary file")),
    ("!bin", alias("!binary")),
    ("!to", ignore("Select the output file")),
    ("!symbollist", ignore("Write a symbol list")),
    ("!sl", alias("!symbollist")),
    ("!svl", ignore("Write a VICE label file")),
    // Scopes
    ("!zone", kw(Zone(ZoneKind::Zone), G::OptName, "Start a new zone for local labels")),
    ("!zn", alias("!zone")),
    ("!subzone", kw(Zone(ZoneKind::Zone), G::OptName, "Start a nested zone")),
    ("!sz", alias("!subzone")),
    // Macros and flow
    ("!macro", kw(Macro, G::MacroHead, "Define a macro")),
    ("!if", kw(If, G::Expr, "Assemble the block if the condition holds")),
    ("!ifdef", kw(IfDef, G::Defined, "Assemble the block if the symbol is defined")),
    ("!ifndef", kw(IfNDef, G::Defined, "Assemble the block if the symbol is undefined")),
    ("!for", kw(For, G::For, "Repeat a block with a counter")),
    ("!do", stub("Loop with pre/post conditions")),
    ("!while", stub("Loop while a condition holds")),
    // Messages
    ("!error", kw(Message(Level::Error), G::Items, "Report an error")),
    ("!warn", kw(Message(Level::Warning), G::Items, "Report a warning")),
    ("!serious", kw(Message(Level::Fatal), G::Items, "Report a fatal error")),
    ("!eof", kw(End, G::None, "Stop reading this file")),
    ("!endoffile", alias("!eof")),
    // Misc
    ("!cpu", ignore("Select the processor")),
    ("!convtab", stub("Select a conversion table")),
    ("!ct", alias("!convtab")),
    ("!xor", stub("Xor emitted bytes with a value")),
];

pub(super) fn config() -> DialectConfig {
    DialectConfig::new(
        DialectId::Acme,
        LEX,
        Tables {
            keywords: KEYWORDS.to_vec(),
            unary: UNARY,
            binary: BINARY,
            funcs: Some(FUNCS),
            extra: &[],
        },
    )
}
