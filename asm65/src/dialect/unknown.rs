//! Permissive superset for files whose syntax is not yet known.

use super::ops::{bin, binr, group, un, BinaryInfo, BinaryOp::*, FuncInfo, UnaryInfo, UnaryOp};
use super::{acme, ca65, kick, tass64};
use super::{AnonStyle, DialectConfig, DialectId, LabelColon, LexRules, LocalRule, Tables};

const LEX: LexRules = LexRules {
    symbol_start: ".@",
    symbol_chars: "",
    keyword_prefix: "!.",
    keyword_optional: false,
    locals: &[
        ('.', LocalRule::Zone),
        ('@', LocalRule::Cheap),
        ('_', LocalRule::Cheap),
    ],
    anon: AnonStyle::Runs,
    macro_prefix: Some('+'),
    case_sensitive: false,
    label_colon: LabelColon::Optional,
    column_labels: false,
    brace_blocks: true,
    continuation: Some('\\'),
    escapes: "\\\"'0tnr",
    quotes: "\"",
    char_quote: Some('\''),
    comments: &[";", "//"],
    comment_needs_space: false,
    column_comment: None,
    scope_sep: Some("::"),
    pc_symbol: "*",
    octal_prefix: None,
    default_origin: 0,
};

const UNARY: &[(&str, UnaryInfo)] = &[
    ("!", un(13, UnaryOp::Not)),
    ("~", un(13, UnaryOp::BitNot)),
    ("-", un(13, UnaryOp::Neg)),
    ("+", un(13, UnaryOp::Pos)),
    ("<", un(13, UnaryOp::Lo)),
    (">", un(13, UnaryOp::Hi)),
    ("^", un(13, UnaryOp::Bank)),
    (".not", un(1, UnaryOp::Not)),
    ("(", group(")")),
    ("[", group("]")),
];

const BINARY: &[(&str, BinaryInfo)] = &[
    ("**", binr(12, Pow)),
    ("*", bin(11, Mul)),
    ("/", bin(11, Div)),
    ("%", bin(11, Mod)),
    ("div", bin(11, Div)),
    ("mod", bin(11, Mod)),
    (".mod", bin(11, Mod)),
    ("+", bin(10, Add)),
    ("-", bin(10, Sub)),
    ("<<", bin(9, Shl)),
    (">>", bin(9, Shr)),
    ("<", bin(8, Lt)),
    ("<=", bin(8, Le)),
    (">", bin(8, Gt)),
    (">=", bin(8, Ge)),
    ("==", bin(7, Eq)),
    ("=", bin(7, Eq)),
    ("!=", bin(7, Ne)),
    ("<>", bin(7, Ne)),
    ("&", bin(6, And)),
    ("^", bin(5, Xor)),
    ("|", bin(4, Or)),
    ("&&", bin(3, LogAnd)),
    (".and", bin(3, LogAnd)),
    ("||", bin(2, LogOr)),
    (".or", bin(2, LogOr)),
];

pub(super) fn config() -> DialectConfig {
    // Later tables win on conflicting keys
    let keywords = tass64::KEYWORDS
        .iter()
        .chain(kick::KEYWORDS)
        .chain(ca65::KEYWORDS)
        .chain(acme::KEYWORDS)
        .copied()
        .collect();
    let funcs: &'static [(&'static str, FuncInfo)] = ca65::FUNCS;

    DialectConfig::new(
        DialectId::Unknown,
        LEX,
        Tables {
            keywords,
            unary: UNARY,
            binary: BINARY,
            funcs: Some(funcs),
            extra: &["::", ":="],
        },
    )
}
