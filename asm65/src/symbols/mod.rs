//! Scopes and symbols.
//!
//! The table lives for one resolution run. Scopes are keyed by their parent
//! and a stable name so every pass reuses the same scope for the same source
//! construct, and symbols carry the pass that last defined them.

mod anon;
mod table;

use serde::Serialize;
use strum::{Display, EnumString};

use crate::grammer::token::Span;

pub use anon::{AnonDef, AnonTable};
pub use table::SymbolTable;

pub type ScopeId = usize;
pub type SymbolId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum SymbolKind {
    Label,
    ZeroPage,
    Constant,
    Variable,
    Macro,
    Struct,
    StructMember,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ScopeKind {
    Global,
    // One root file together with everything it includes
    Unit,
    // proc / scope / namespace / brace block
    Named,
    Zone,
    Cheap,
    Macro,
    Loop,
    Type,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub name: String,
    pub parent: Option<ScopeId>,
    pub symbols: indexmap::IndexMap<String, SymbolId>,
}

/// Statement that defined a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub span: Span,
    pub stmt: usize,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub scope: ScopeId,
    pub kind: SymbolKind,
    pub value: Option<i64>,
    pub def: Location,
    pub refs: Vec<Span>,
    pub description: Option<String>,
    pub exported: bool,
    pub imported: bool,
    // Generated by a macro expansion or loop iteration
    pub generated: bool,
    // Operand uses by addressing width
    pub zp_uses: usize,
    pub abs_uses: usize,
    pub imm_uses: usize,
    pub pass: u32,
}

impl Symbol {
    pub fn new(name: &str, scope: ScopeId, kind: SymbolKind, def: Location) -> Self {
        Symbol {
            name: name.to_string(),
            scope,
            kind,
            value: None,
            def,
            refs: Vec::new(),
            description: None,
            exported: false,
            imported: false,
            generated: false,
            zp_uses: 0,
            abs_uses: 0,
            imm_uses: 0,
            pass: 0,
        }
    }

    pub fn is_used(&self) -> bool {
        !self.refs.is_empty()
    }

    /// Kind refined by how the symbol is used as an operand
    pub fn inferred_kind(&self) -> SymbolKind {
        match self.kind {
            SymbolKind::Label | SymbolKind::Constant
                if self.zp_uses > 0
                    && self.abs_uses == 0
                    && self.value.is_some_and(|v| (0..0x100).contains(&v)) =>
            {
                SymbolKind::ZeroPage
            }
            SymbolKind::Constant if self.abs_uses > 0 && self.imm_uses == 0 => SymbolKind::Label,
            kind => kind,
        }
    }
}

/// How a symbol was used, for kind inference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    Value,
    Immediate,
    ZeroPage,
    Absolute,
}
