use color_print::{cformat, cprintln};
use serde::Serialize;
use strum::Display;
use thiserror::Error;

use crate::grammer::token::Span;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    // Lexical errors
    #[error("Unterminated string literal")]
    UnterminatedString,

    #[error("Invalid escape sequence: `\\{0}`")]
    InvalidEscape(char),

    #[error("Invalid number: `{0}`")]
    InvalidNumber(String),

    #[error("Unexpected character: `{0}`")]
    UnexpectedChar(char),

    // Parse errors
    #[error("Unexpected token: `{0}`")]
    UnexpectedToken(String),

    #[error("Unexpected end of line")]
    UnexpectedEol,

    #[error("Expected `{0}`")]
    Expected(String),

    #[error("Unknown directive: `{0}`")]
    UnknownKeyword(String),

    #[error("Directive `{0}` is recognized but not yet supported")]
    Unsupported(String),

    #[error("`{0}` requires a label")]
    MissingLabel(String),

    #[error("Invalid addressing mode for `{0}`")]
    InvalidAddressing(String),

    #[error("`{0}` without matching opener")]
    UnmatchedEnd(String),

    #[error("`{0}` does not close `{1}` opened at line {2}")]
    MismatchedBlock(String, String, usize),

    #[error("Unterminated `{0}` block opened at line {1}")]
    UnterminatedBlock(String, usize),

    // Semantic errors
    #[error("Undefined symbol: `{0}`")]
    Undefined(String),

    #[error("Duplicate definition: `{0}`")]
    Duplicate(String),

    #[error("Branch out of range: target is {0} bytes away")]
    BranchRange(i64),

    #[error("Value {0} does not fit in {1} byte(s)")]
    Overflow(i64, u8),

    #[error("Unknown function: `{0}`")]
    UnknownFunction(String),

    #[error("`{0}` expects {1} argument(s)")]
    ArgumentCount(String, String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("String cannot be used as a number: \"{0}\"")]
    NotANumber(String),

    #[error("Unknown macro or instruction: `{0}`")]
    UnknownMacro(String),

    #[error("Macro nesting too deep while expanding `{0}`")]
    MacroDepth(String),

    #[error("Loop runs {0} times, more than the analysis limit")]
    LoopLimit(i64),

    #[error("Unused symbol: `{0}`")]
    Unused(String),

    #[error("Cannot open `{0}`")]
    IncludeNotFound(String),

    #[error("Circular include chain through `{0}`")]
    IncludeCycle(String),

    #[error("Symbol resolution did not settle after {0} passes")]
    NoConvergence(u32),

    #[error("Assertion failed")]
    AssertFailed,

    // Source-declared diagnostics
    #[error("{0}")]
    Message(String),

    // Configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    // Project
    #[error("Unknown file: `{0}`")]
    UnknownFile(String),

    #[error("Edit position {0}:{1} is outside the file")]
    InvalidEdit(usize, usize),
}

impl Error {
    /// Stable identifier for editors and filters.
    pub fn code(&self) -> &'static str {
        match self {
            Error::UnterminatedString => "unterminated-string",
            Error::InvalidEscape(_) => "invalid-escape",
            Error::InvalidNumber(_) => "invalid-number",
            Error::UnexpectedChar(_) => "unexpected-char",
            Error::UnexpectedToken(_) => "unexpected-token",
            Error::UnexpectedEol => "unexpected-eol",
            Error::Expected(_) => "expected-token",
            Error::UnknownKeyword(_) => "unknown-directive",
            Error::Unsupported(_) => "unsupported-directive",
            Error::MissingLabel(_) => "missing-label",
            Error::InvalidAddressing(_) => "invalid-addressing",
            Error::UnmatchedEnd(_) => "unmatched-end",
            Error::MismatchedBlock(..) => "mismatched-block",
            Error::UnterminatedBlock(..) => "unterminated-block",
            Error::Undefined(_) => "undefined-symbol",
            Error::Duplicate(_) => "duplicate-symbol",
            Error::BranchRange(_) => "branch-out-of-range",
            Error::Overflow(..) => "value-overflow",
            Error::UnknownFunction(_) => "unknown-function",
            Error::ArgumentCount(..) => "argument-count",
            Error::DivisionByZero => "division-by-zero",
            Error::NotANumber(_) => "not-a-number",
            Error::UnknownMacro(_) => "unknown-macro",
            Error::MacroDepth(_) => "macro-depth",
            Error::LoopLimit(_) => "loop-limit",
            Error::Unused(_) => "unused-symbol",
            Error::IncludeNotFound(_) => "include-not-found",
            Error::IncludeCycle(_) => "include-cycle",
            Error::NoConvergence(_) => "no-convergence",
            Error::AssertFailed => "assert-failed",
            Error::Message(_) => "user-message",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::UnknownFile(_) => "unknown-file",
            Error::InvalidEdit(..) => "invalid-edit",
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub span: Span,
    pub severity: Severity,
    pub error: Error,
}

impl Diagnostic {
    pub fn error(span: Span, error: Error) -> Self {
        Diagnostic {
            span,
            severity: Severity::Error,
            error,
        }
    }

    pub fn warning(span: Span, error: Error) -> Self {
        Diagnostic {
            span,
            severity: Severity::Warning,
            error,
        }
    }

    pub fn code(&self) -> &'static str {
        self.error.code()
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }

    /// Print with file location and the offending source line
    pub fn print_diag(&self, path: &str, source: &str) {
        match self.severity {
            Severity::Error => cprintln!("<red,bold>error</>[{}]: {}", self.code(), self.error),
            Severity::Warning => {
                cprintln!("<yellow,bold>warn</>[{}]: {}", self.code(), self.error)
            }
        }

        // line is 0-based, display as 1-based
        let line_num = self.span.line + 1;
        cprintln!(
            "     <blue>--></> <underline>{}:{}:{}</>",
            path,
            line_num,
            self.span.col + 1
        );
        cprintln!("      <blue>|</>");
        cprintln!(" <blue>{:>4} |</> {}", line_num, source);
        let width = self.span.end.saturating_sub(self.span.col).max(1);
        let marker = cformat!("<red,bold>{}</>", "^".repeat(width));
        cprintln!("      <blue>|</> {}{}", " ".repeat(self.span.col), marker);
    }
}
