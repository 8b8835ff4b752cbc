use super::keyword::{
    alias, ignore, kw, kwl, stub, Grammar as G, KwEntry, LabelRule, Level, StmtTag::*, TextMode,
    Width,
};
use super::ops::{bin, group, un, BinaryInfo, BinaryOp::*, UnaryInfo, UnaryOp};
use super::{AnonStyle, DialectConfig, DialectId, LabelColon, LexRules, LocalRule, Tables};

pub(super) const LEX: LexRules = LexRules {
    symbol_start: ":]",
    symbol_chars: "",
    keyword_prefix: "",
    keyword_optional: false,
    locals: &[(':', LocalRule::Cheap), (']', LocalRule::Variable)],
    anon: AnonStyle::None,
    macro_prefix: None,
    case_sensitive: true,
    label_colon: LabelColon::Optional,
    column_labels: true,
    brace_blocks: false,
    continuation: None,
    escapes: "",
    quotes: "\"'",
    char_quote: None,
    comments: &[";"],
    comment_needs_space: true,
    column_comment: Some('*'),
    scope_sep: None,
    pc_symbol: "*",
    octal_prefix: None,
    default_origin: 0x8000,
};

// Binary operators all share one level and evaluate left to right
pub(super) const UNARY: &[(&str, UnaryInfo)] = &[
    ("-", un(3, UnaryOp::Neg)),
    ("<", un(1, UnaryOp::Lo)),
    (">", un(1, UnaryOp::Hi)),
    ("^", un(1, UnaryOp::Bank)),
    ("{", group("}")),
];

pub(super) const BINARY: &[(&str, BinaryInfo)] = &[
    ("+", bin(2, Add)),
    ("-", bin(2, Sub)),
    ("*", bin(2, Mul)),
    ("/", bin(2, Div)),
    ("&", bin(2, And)),
    (".", bin(2, Or)),
    ("!", bin(2, Xor)),
    ("=", bin(2, Eq)),
    ("<", bin(2, Lt)),
    (">", bin(2, Gt)),
    ("#", bin(2, Ne)),
];

pub(super) const KEYWORDS: &[(&str, KwEntry)] = &[
    // Symbols
    ("=", kwl(Equate, LabelRule::Required, G::Value, "Define a constant")),
    ("equ", kwl(Equate, LabelRule::Required, G::Value, "Define a constant")),
    // Program counter
    ("org", kw(Org, G::OptExpr, "Set the program counter")),
    ("dum", kw(Dummy, G::Expr, "Start a dummy section")),
    ("dend", kw(DummyEnd, G::None, "End a dummy section")),
    // Data
    ("dfb", kw(Data(Width::le(1)), G::Items, "Store 8-bit values")),
    ("db", alias("dfb")),
    ("da", kw(Data(Width::le(2)), G::Items, "Store 16-bit values")),
    ("dw", alias("da")),
    ("ddb", kw(Data(Width::be(2)), G::Items, "Store 16-bit values, big endian")),
    ("adr", kw(Data(Width::le(3)), G::Items, "Store 24-bit values")),
    ("adrl", kw(Data(Width::le(4)), G::Items, "Store 32-bit values")),
    ("asc", kw(Text(TextMode::Plain), G::Items, "Store text")),
    ("dci", kw(Text(TextMode::HighBit), G::Items, "Store text with the last byte inverted")),
    ("str", kw(Text(TextMode::Length), G::Items, "Store length prefixed text")),
    ("ds", kw(Storage, G::Exprs(1, 2), "Reserve storage")),
    ("hex", stub("Store hex digit pairs")),
    ("rev", stub("Store reversed text")),
    // Files
    ("put", kw(Include, G::Path, "Include a source file")),
    ("use", alias("put")),
    // Macros
    ("mac", kwl(Macro, LabelRule::Name, G::MacroHead, "Define a macro")),
    ("eom", kw(MacroEnd, G::None, "End a macro definition")),
    ("<<<", alias("eom")),
    ("pmc", kw(Invoke, G::MacroArgs, "Invoke a macro")),
    (">>>", alias("pmc")),
    // Conditionals and loops
    ("do", kw(If, G::Expr, "Assemble the block if the value is non-zero")),
    ("else", kw(Else, G::None, "Alternative block")),
    ("fin", kw(EndIf, G::None, "End a conditional block")),
    ("lup", kw(Repeat, G::Repeat, "Repeat a block")),
    ("--^", kw(LoopEnd, G::None, "End a loop block")),
    ("if", stub("Test a character")),
    // Linkage
    ("ent", kw(Export { zp: false }, G::Names, "Make labels visible to the linker")),
    ("ext", kw(Import { zp: false }, G::Names, "Declare external labels")),
    // Messages
    ("err", kw(MessageIf(Level::Error), G::CondItems, "Report an error if the value is non-zero")),
    ("end", kw(End, G::None, "End of source")),
    // Listing and output
    ("lst", ignore("Control listing output")),
    ("lstdo", ignore("Control listing output")),
    ("tr", ignore("Truncate listing")),
    ("exp", ignore("Control macro expansion listing")),
    ("pag", ignore("Page eject")),
    ("ast", ignore("Print asterisks")),
    ("cyc", ignore("Print cycle counts")),
    ("dat", ignore("Print the date")),
    ("skp", ignore("Skip lines in the listing")),
    ("ttl", ignore("Set the listing title")),
    ("sav", ignore("Save the object file")),
    ("dsk", ignore("Assemble to disk")),
    ("typ", ignore("Set the file type")),
    ("obj", ignore("Set the object address")),
    ("rel", ignore("Generate relocatable code")),
    ("xc", ignore("Enable extended instructions")),
    ("mx", ignore("Set register widths")),
    ("usr", stub("User defined directive")),
    ("kbd", stub("Read a value from the keyboard")),
    ("chk", stub("Store a checksum")),
];

pub(super) fn config() -> DialectConfig {
    DialectConfig::new(
        DialectId::Merlin,
        LEX,
        Tables {
            keywords: KEYWORDS.to_vec(),
            unary: UNARY,
            binary: BINARY,
            funcs: None,
            extra: &[";"],
        },
    )
}
