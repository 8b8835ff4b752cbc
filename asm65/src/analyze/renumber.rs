use serde::Serialize;

use crate::dialect::{DialectConfig, LocalRule};
use crate::grammer::token::{FileId, Span};
use crate::symbols::{ScopeId, Symbol, SymbolTable};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Edit {
    pub span: Span,
    pub text: String,
}

/// Rename the zone and cheap locals under `scope` to `<prefix>l1`,
/// `<prefix>l2`, ... in source order. Names already in that form produce
/// no edit, so a second run returns nothing.
pub fn renumber(table: &SymbolTable, dialect: &DialectConfig, scope: ScopeId) -> Vec<Edit> {
    let mut locals: Vec<&Symbol> = table
        .live()
        .map(|(_, sym)| sym)
        .filter(|sym| !sym.generated)
        .filter(|sym| {
            matches!(
                dialect.lex.local_rule(&sym.name),
                Some(LocalRule::Zone | LocalRule::Cheap)
            )
        })
        .filter(|sym| table.chain(sym.scope).any(|s| s == scope))
        .collect();
    locals.sort_by_key(|sym| sym.def.span);

    let mut edits = Vec::new();
    for (n, sym) in locals.into_iter().enumerate() {
        let Some(prefix) = sym.name.chars().next() else {
            continue;
        };
        let name = format!("{}l{}", prefix, n + 1);
        if dialect.fold(&name) == dialect.fold(&sym.name) {
            continue;
        }
        edits.push(Edit {
            span: sym.def.span,
            text: name.clone(),
        });
        edits.extend(sym.refs.iter().map(|r| Edit {
            span: *r,
            text: name.clone(),
        }));
    }
    edits.sort();
    edits.dedup();
    edits
}

/// Apply edits belonging to `file` to its source text
pub fn apply(text: &str, file: FileId, edits: &[Edit]) -> String {
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    // Right to left so earlier columns stay valid
    for edit in edits.iter().rev().filter(|e| e.span.file == file) {
        if let Some(line) = lines.get_mut(edit.span.line) {
            let end = edit.span.end.min(line.len());
            if edit.span.col <= end && line.is_char_boundary(edit.span.col) && line.is_char_boundary(end) {
                line.replace_range(edit.span.col..end, &edit.text);
            }
        }
    }
    let mut out = lines.join("\n");
    if text.ends_with('\n') {
        out.push('\n');
    }
    out
}
