//! Per-syntax configuration records.
//!
//! Every dialect is plain data: lexical rules plus keyword, operator and
//! function tables. The tokenizer, expression parser and statement parser
//! read these records and contain no per-dialect branches of their own.

mod acme;
mod ca65;
mod dasm;
pub mod keyword;
mod kick;
mod merlin;
pub mod ops;
mod tass64;
mod unknown;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::debug;

use keyword::{KwEntry, KwTarget};
use ops::{BinaryInfo, FuncInfo, UnaryInfo};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    Display,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DialectId {
    Acme,
    Ca65,
    Dasm,
    Kick,
    Tass64,
    Merlin,
    #[default]
    Unknown,
}

impl DialectId {
    /// Unrecognized names map to the permissive dialect
    pub fn parse(s: &str) -> Self {
        s.parse().unwrap_or(DialectId::Unknown)
    }
}

/// How a local-label prefix scopes the names it introduces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalRule {
    // Visible until the next zone boundary
    Zone,
    // Visible until the next non-local label
    Cheap,
    // Redefinable variable, not a local at all
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnonStyle {
    None,
    // `-`/`+` runs, matched by direction and run length
    Runs,
    // `:` defines, `:-`/`:+` count definitions
    Colon,
    // `!:` defines, `!-`/`!+` count definitions
    Bang,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelColon {
    Optional,
    Required,
}

#[derive(Debug, Clone, Copy)]
pub struct LexRules {
    pub symbol_start: &'static str,
    pub symbol_chars: &'static str,
    pub keyword_prefix: &'static str,
    pub keyword_optional: bool,
    pub locals: &'static [(char, LocalRule)],
    pub anon: AnonStyle,
    pub macro_prefix: Option<char>,
    pub case_sensitive: bool,
    pub label_colon: LabelColon,
    pub column_labels: bool,
    pub brace_blocks: bool,
    pub continuation: Option<char>,
    pub escapes: &'static str,
    pub quotes: &'static str,
    pub char_quote: Option<char>,
    pub comments: &'static [&'static str],
    pub comment_needs_space: bool,
    pub column_comment: Option<char>,
    pub scope_sep: Option<&'static str>,
    pub pc_symbol: &'static str,
    pub octal_prefix: Option<char>,
    pub default_origin: i64,
}

impl LexRules {
    pub fn is_symbol_start(&self, c: char) -> bool {
        c.is_ascii_alphabetic() || c == '_' || self.symbol_start.contains(c)
    }

    pub fn is_symbol_char(&self, c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_' || self.symbol_chars.contains(c)
    }

    pub fn local_rule(&self, name: &str) -> Option<LocalRule> {
        let first = name.chars().next()?;
        self.locals
            .iter()
            .find(|(c, _)| *c == first)
            .map(|(_, rule)| *rule)
    }
}

pub struct DialectConfig {
    pub id: DialectId,
    pub lex: LexRules,
    pub keywords: HashMap<&'static str, KwEntry>,
    pub unary: HashMap<&'static str, UnaryInfo>,
    pub binary: HashMap<&'static str, BinaryInfo>,
    pub funcs: Option<HashMap<&'static str, FuncInfo>>,
    // Plain labels inside a scope block belong to it; a label before `{` names the block
    pub scoped_labels: bool,
    // `name(args)` at statement start invokes a macro
    pub call_macros: bool,
    // Unknown prefixed keywords are macro invocations
    pub keyword_macros: bool,
    operators: Vec<&'static str>,
    words: Vec<&'static str>,
}

const PUNCTUATION: &[&str] = &["(", ")", "[", "]", "{", "}", ",", "#", "=", ":"];

pub struct Tables {
    pub keywords: Vec<(&'static str, KwEntry)>,
    pub unary: &'static [(&'static str, UnaryInfo)],
    pub binary: &'static [(&'static str, BinaryInfo)],
    pub funcs: Option<&'static [(&'static str, FuncInfo)]>,
    pub extra: &'static [&'static str],
}

impl DialectConfig {
    fn new(id: DialectId, lex: LexRules, tables: Tables) -> Self {
        let keywords: HashMap<_, _> = tables.keywords.into_iter().collect();
        let unary: HashMap<_, _> = tables.unary.iter().copied().collect();
        let binary: HashMap<_, _> = tables.binary.iter().copied().collect();
        let funcs = tables.funcs.map(|f| f.iter().copied().collect());

        // Symbolic operators lex by longest match. Prefixed word operators
        // (`.and`) lex on an identifier boundary. Bare words (`div`) stay
        // symbols and are recognized by the expression parser.
        let mut operators = Vec::new();
        let mut words = Vec::new();
        for key in unary.keys().chain(binary.keys()).copied() {
            let mut chars = key.chars();
            let first = chars.next().unwrap_or(' ');
            let rest_alpha = chars.clone().count() > 0 && chars.all(|c| c.is_ascii_alphabetic());
            if lex.keyword_prefix.contains(first) && rest_alpha {
                words.push(key);
            } else if !first.is_ascii_alphabetic() {
                operators.push(key);
            }
        }
        operators.extend(PUNCTUATION.iter().copied());
        operators.extend(tables.extra.iter().copied());
        operators.extend(keywords.keys().copied().filter(|key| {
            key.chars()
                .next()
                .is_some_and(|c| !c.is_ascii_alphanumeric() && !lex.keyword_prefix.contains(c))
        }));
        operators.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        operators.dedup();
        words.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        words.dedup();

        DialectConfig {
            id,
            lex,
            keywords,
            unary,
            binary,
            funcs,
            scoped_labels: false,
            call_macros: false,
            keyword_macros: false,
            operators,
            words,
        }
    }

    /// Symbolic operators and punctuation, longest first
    pub fn operators(&self) -> &[&'static str] {
        &self.operators
    }

    /// Keyword-prefixed word operators, longest first
    pub fn word_operators(&self) -> &[&'static str] {
        &self.words
    }

    /// Resolve keyword text to its canonical entry, following aliases
    pub fn keyword(&self, text: &str) -> Option<(&'static str, KwEntry)> {
        let key = text.to_ascii_lowercase();
        let mut found = self.keywords.get_key_value(key.as_str());
        if found.is_none() && self.lex.keyword_optional {
            found = self
                .lex
                .keyword_prefix
                .chars()
                .find_map(|p| key.strip_prefix(p))
                .and_then(|rest| self.keywords.get_key_value(rest));
        }
        let (mut name, mut entry) = found.map(|(k, v)| (*k, *v))?;
        for _ in 0..8 {
            match entry.target {
                KwTarget::Alias(to) => {
                    let (k, v) = self.keywords.get_key_value(to)?;
                    name = k;
                    entry = *v;
                }
                _ => return Some((name, entry)),
            }
        }
        None
    }

    pub fn function(&self, name: &str) -> Option<FuncInfo> {
        let funcs = self.funcs.as_ref()?;
        funcs.get(name.to_ascii_lowercase().as_str()).copied()
    }

    pub fn has_functions(&self) -> bool {
        self.funcs.is_some()
    }

    /// Canonical form of a symbol name for table keys
    pub fn fold(&self, name: &str) -> String {
        if self.lex.case_sensitive {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        }
    }
}

// ----------------------------------------------------------------------------
// Registry
// ----------------------------------------------------------------------------

pub struct Registry {
    dialects: HashMap<DialectId, DialectConfig>,
}

static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let mut dialects = HashMap::new();
    for config in [
        acme::config(),
        ca65::config(),
        dasm::config(),
        kick::config(),
        tass64::config(),
        merlin::config(),
        unknown::config(),
    ] {
        debug!(dialect = %config.id, keywords = config.keywords.len(), "dialect loaded");
        dialects.insert(config.id, config);
    }
    Registry { dialects }
});

impl Registry {
    pub fn global() -> &'static Registry {
        &REGISTRY
    }

    pub fn get(&self, id: DialectId) -> &DialectConfig {
        match self.dialects.get(&id) {
            Some(config) => config,
            None => &self.dialects[&DialectId::Unknown],
        }
    }
}

pub fn get_dialect(id: DialectId) -> &'static DialectConfig {
    Registry::global().get(id)
}

/// Guess the dialect of a source text from the directives it uses.
/// Keywords shared by several dialects count for less than distinctive ones.
pub fn detect_dialect(text: &str) -> DialectId {
    let candidates: Vec<_> = DialectId::iter()
        .filter(|id| *id != DialectId::Unknown)
        .map(get_dialect)
        .collect();
    let mut scores = vec![0usize; candidates.len()];

    for line in text.lines() {
        let code = line.split(';').next().unwrap_or("");
        for word in code.split_whitespace().take(2) {
            let word = word.trim_end_matches(':');
            if word.is_empty() || arch::Mnemonic::parse(word).is_some() {
                continue;
            }
            let hits: Vec<_> = candidates
                .iter()
                .enumerate()
                .filter(|(_, d)| {
                    d.keywords
                        .contains_key(word.to_ascii_lowercase().as_str())
                })
                .map(|(i, _)| i)
                .collect();
            for i in &hits {
                scores[*i] += 12 / hits.len();
            }
        }
    }

    let best = scores
        .iter()
        .enumerate()
        .filter(|(_, s)| **s > 0)
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)));
    match best {
        Some((i, _)) => candidates[i].id,
        None => DialectId::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup() {
        let ca65 = get_dialect(DialectId::Ca65);
        assert_eq!(ca65.keyword(".BYT").map(|(k, _)| k), Some(".byte"));
        assert!(ca65.keyword("byte").is_none());

        let dasm = get_dialect(DialectId::Dasm);
        assert_eq!(dasm.keyword(".byte").map(|(k, _)| k), Some("dc.b"));
        assert_eq!(dasm.keyword("ORG").map(|(k, _)| k), Some("org"));

        assert_eq!(DialectId::parse("KICK"), DialectId::Kick);
        assert_eq!(DialectId::parse("whatever"), DialectId::Unknown);
        assert_eq!(get_dialect(DialectId::Unknown).id, DialectId::Unknown);
    }

    #[test]
    fn detect() {
        assert_eq!(detect_dialect("!zone main\n  !byte 1\n"), DialectId::Acme);
        assert_eq!(
            detect_dialect(".proc main\n  rts\n.endproc\n"),
            DialectId::Ca65
        );
        assert_eq!(detect_dialect("  lda #1\n"), DialectId::Unknown);
    }
}
