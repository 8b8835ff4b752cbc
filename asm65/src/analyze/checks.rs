use crate::error::{Diagnostic, Error};
use crate::grammer::token::Span;
use crate::symbols::{ScopeKind, SymbolKind, SymbolTable};

/// Symbols nothing refers to. Exports, imports and symbols produced by
/// expansions are exempt.
pub fn unused(table: &SymbolTable) -> Vec<Diagnostic> {
    table
        .live()
        .map(|(_, sym)| sym)
        .filter(|sym| !(sym.is_used() || sym.exported || sym.imported || sym.generated))
        .filter(|sym| {
            matches!(
                sym.kind,
                SymbolKind::Label | SymbolKind::ZeroPage | SymbolKind::Constant | SymbolKind::Macro
            )
        })
        .filter(|sym| table.scope(sym.scope).kind != ScopeKind::Type)
        .map(|sym| Diagnostic::warning(sym.def.span, Error::Unused(sym.name.clone())))
        .collect()
}

/// One diagnostic per unresolved use
pub fn undefined(names: &[(String, Span)]) -> Vec<Diagnostic> {
    let mut seen: Vec<Span> = Vec::new();
    let mut diags = Vec::new();
    for (name, span) in names {
        if seen.contains(span) {
            continue;
        }
        seen.push(*span);
        diags.push(Diagnostic::error(*span, Error::Undefined(name.clone())));
    }
    diags
}
