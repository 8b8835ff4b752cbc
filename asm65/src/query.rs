//! Read-only queries over a published snapshot.

use serde::Serialize;
use strum::Display;

use crate::analyze::{renumber, Edit};
use crate::dialect::{get_dialect, DialectConfig, LocalRule};
use crate::error::{Diagnostic, Severity};
use crate::grammer::lexer::LineLexer;
use crate::grammer::token::{FileId, Span, TokenKind};
use crate::project::Snapshot;
use crate::symbols::{ScopeId, ScopeKind, Symbol, SymbolId, SymbolKind};

pub use crate::dialect::detect_dialect;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolInfo {
    pub id: SymbolId,
    pub name: String,
    // Enclosing named scopes, e.g. `main::loop`
    pub path: String,
    pub kind: SymbolKind,
    pub value: Option<i64>,
    pub span: Span,
    pub description: Option<String>,
    pub unused: bool,
    pub exported: bool,
    pub imported: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hover {
    pub span: Span,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoldingRange {
    pub start: usize,
    pub end: usize,
    pub keyword: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum SemanticKind {
    ZeroPage,
    Constant,
    Unused,
    Disabled,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SemanticToken {
    pub span: Span,
    pub kind: SemanticKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeInfo {
    pub id: ScopeId,
    pub kind: String,
    pub name: String,
    pub path: String,
}

fn hex(value: i64) -> String {
    if (0..0x100).contains(&value) {
        format!("${:02X}", value)
    } else if (0..0x10000).contains(&value) {
        format!("${:04X}", value)
    } else {
        value.to_string()
    }
}

impl Snapshot {
    fn config(&self) -> &'static DialectConfig {
        get_dialect(self.dialect)
    }

    fn is_unused(sym: &Symbol) -> bool {
        !(sym.is_used() || sym.exported || sym.imported || sym.generated)
    }

    /// Parse, include-graph and analysis diagnostics, ordered by position
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diags: Vec<Diagnostic> = self
            .files
            .iter()
            .flat_map(|f| f.parsed.diags.iter().cloned())
            .chain(self.structural.iter().cloned())
            .chain(self.analysis.iter().flat_map(|a| a.diags.iter().cloned()))
            .collect();
        diags.sort_by(|a, b| {
            a.span
                .cmp(&b.span)
                .then(a.severity.cmp(&b.severity))
                .then(a.code().cmp(b.code()))
        });
        diags.dedup();
        diags
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics().iter().any(|d| d.severity == Severity::Error)
    }

    pub fn symbols(&self) -> Vec<SymbolInfo> {
        let Some(analysis) = &self.analysis else {
            return Vec::new();
        };
        let table = &analysis.table;
        let mut out: Vec<SymbolInfo> = table
            .live()
            .map(|(id, sym)| SymbolInfo {
                id,
                name: sym.name.clone(),
                path: table.path(sym.scope),
                kind: sym.inferred_kind(),
                value: sym.value,
                span: sym.def.span,
                description: sym.description.clone(),
                unused: Self::is_unused(sym),
                exported: sym.exported,
                imported: sym.imported,
            })
            .collect();
        out.sort_by_key(|s| s.span);
        out
    }

    pub fn symbol_at(&self, file: FileId, line: usize, col: usize) -> Option<SymbolId> {
        self.analysis.as_ref()?.table.at(file, line, col)
    }

    /// Definition of the symbol or anonymous label under the cursor
    pub fn definition(&self, file: FileId, line: usize, col: usize) -> Option<Span> {
        let analysis = self.analysis.as_ref()?;
        if let Some(id) = analysis.table.at(file, line, col) {
            return Some(analysis.table.symbol(id).def.span);
        }
        analysis
            .anon_refs
            .iter()
            .find(|(r, _)| r.file == file && r.contains(line, col))
            .map(|(_, def)| *def)
    }

    pub fn references(&self, symbol: SymbolId) -> Vec<Span> {
        let Some(analysis) = &self.analysis else {
            return Vec::new();
        };
        let mut refs = analysis
            .table
            .symbols()
            .find(|(id, _)| *id == symbol)
            .map(|(_, s)| s.refs.clone())
            .unwrap_or_default();
        refs.sort();
        refs
    }

    // ------------------------------------------------------------------------
    // Hover
    // ------------------------------------------------------------------------

    pub fn hover(&self, file: FileId, line: usize, col: usize) -> Option<Hover> {
        if let Some(hover) = self.hover_symbol(file, line, col) {
            return Some(hover);
        }
        if let Some(hover) = self.hover_anon(file, line, col) {
            return Some(hover);
        }
        self.hover_word(file, line, col)
    }

    fn hover_symbol(&self, file: FileId, line: usize, col: usize) -> Option<Hover> {
        let analysis = self.analysis.as_ref()?;
        let table = &analysis.table;
        let sym = table.symbol(table.at(file, line, col)?);
        let span = std::iter::once(sym.def.span)
            .chain(sym.refs.iter().copied())
            .find(|s| s.file == file && s.contains(line, col))?;

        let path = table.path(sym.scope);
        let name = if path.is_empty() {
            sym.name.clone()
        } else {
            format!("{}::{}", path, sym.name)
        };
        let value = match sym.value {
            Some(v) => format!("{} ({})", hex(v), v),
            None => "unresolved".to_string(),
        };
        let mut text = format!("{} `{}` = {}", sym.inferred_kind(), name, value);
        if sym.imported {
            text.push_str(" (imported)");
        }
        if let Some(desc) = &sym.description {
            text.push_str("\n\n");
            text.push_str(desc);
        }
        Some(Hover { span, text })
    }

    fn hover_anon(&self, file: FileId, line: usize, col: usize) -> Option<Hover> {
        let analysis = self.analysis.as_ref()?;
        let at = |s: &Span| s.file == file && s.contains(line, col);
        let (span, def) = analysis
            .anon_refs
            .iter()
            .find(|(r, _)| at(r))
            .copied()
            .or_else(|| analysis.anon.iter().find(|d| at(&d.span)).map(|d| (d.span, d.span)))?;
        let def = analysis.anon.iter().find(|d| d.span == def)?;
        let value = def.value.map(hex).unwrap_or_else(|| "unresolved".to_string());
        Some(Hover {
            span,
            text: format!("anonymous label `{}` at line {} = {}", def.mark, def.span.line + 1, value),
        })
    }

    /// Mnemonic and directive descriptions
    fn hover_word(&self, file: FileId, line: usize, col: usize) -> Option<Hover> {
        let source = self.file(file)?.parsed.lines.get(line)?;
        let dialect = self.config();
        let tokens = LineLexer::new(source, dialect, file, line).parse().tokens;
        let token = tokens.iter().find(|t| t.span.contains(line, col))?;
        let text = match &token.kind {
            TokenKind::Symbol(s) => match arch::Mnemonic::parse(s) {
                Some(op) => format!("{}: {}", op, op.description()),
                None => {
                    let (name, entry) = dialect.keyword(s)?;
                    format!("{}: {}", name, entry.desc)
                }
            },
            TokenKind::Keyword(s) => {
                let (name, entry) = dialect.keyword(s)?;
                format!("{}: {}", name, entry.desc)
            }
            _ => return None,
        };
        Some(Hover {
            span: token.span,
            text,
        })
    }

    // ------------------------------------------------------------------------
    // Editor decorations
    // ------------------------------------------------------------------------

    pub fn folding_ranges(&self, file: FileId) -> Vec<FoldingRange> {
        let Some(source) = self.file(file) else {
            return Vec::new();
        };
        let mut ranges: Vec<FoldingRange> = source
            .parsed
            .blocks
            .iter()
            .filter(|b| b.end > b.start)
            .map(|b| FoldingRange {
                start: b.start,
                end: b.end,
                keyword: b.keyword.clone(),
            })
            .collect();
        ranges.sort_by_key(|r| (r.start, r.end));
        ranges
    }

    pub fn semantic_tokens(&self, file: FileId) -> Vec<SemanticToken> {
        let (Some(analysis), Some(source)) = (&self.analysis, self.file(file)) else {
            return Vec::new();
        };
        let dialect = self.config();
        let table = &analysis.table;
        let mut tokens = Vec::new();

        for (_, sym) in table.live() {
            let kind = if Self::is_unused(sym) {
                Some(SemanticKind::Unused)
            } else {
                match sym.inferred_kind() {
                    SymbolKind::ZeroPage => Some(SemanticKind::ZeroPage),
                    SymbolKind::Constant => Some(SemanticKind::Constant),
                    _ => None,
                }
            };
            let local = matches!(table.scope(sym.scope).kind, ScopeKind::Zone | ScopeKind::Cheap)
                || matches!(
                    dialect.lex.local_rule(&sym.name),
                    Some(LocalRule::Zone | LocalRule::Cheap)
                );
            let Some(kind) = kind.or(local.then_some(SemanticKind::Local)) else {
                continue;
            };
            for span in std::iter::once(sym.def.span).chain(sym.refs.iter().copied()) {
                if span.file == file {
                    tokens.push(SemanticToken { span, kind });
                }
            }
        }

        for &(f, first, last) in &analysis.disabled {
            if f != file {
                continue;
            }
            for line in first..=last {
                let len = source.parsed.lines.get(line).map_or(0, |l| l.len());
                tokens.push(SemanticToken {
                    span: Span::new(file, line, 0, len),
                    kind: SemanticKind::Disabled,
                });
            }
        }

        tokens.sort();
        tokens.dedup();
        tokens
    }

    // ------------------------------------------------------------------------
    // Scopes
    // ------------------------------------------------------------------------

    fn scope_info(&self, id: ScopeId) -> Option<ScopeInfo> {
        let table = &self.analysis.as_ref()?.table;
        let scope = table.scope(id);
        Some(ScopeInfo {
            id,
            kind: scope.kind.to_string(),
            name: scope.name.clone(),
            path: table.path(id),
        })
    }

    /// Innermost scope active at a line, from the last statement reached
    /// at or above it
    pub fn scope_at(&self, file: FileId, line: usize) -> Option<ScopeInfo> {
        let analysis = self.analysis.as_ref()?;
        let stmts = &self.file(file)?.parsed.stmts;
        let scope = stmts
            .iter()
            .enumerate()
            .take_while(|(_, s)| s.line() <= line)
            .filter_map(|(i, _)| analysis.info(file, i))
            .last()
            .map(|info| info.scope)
            .or_else(|| self.unit(file))?;
        self.scope_info(scope)
    }

    /// Unit scope a file was analysed in
    pub fn unit(&self, file: FileId) -> Option<ScopeId> {
        let analysis = self.analysis.as_ref()?;
        if let Some((_, unit)) = analysis.units.iter().find(|(f, _)| *f == file) {
            return Some(*unit);
        }
        let table = &analysis.table;
        let info = analysis.stmts.get(&file)?.iter().flatten().next()?;
        table
            .chain(info.scope)
            .find(|s| matches!(table.scope(*s).kind, ScopeKind::Unit | ScopeKind::Global))
    }

    /// Edits renaming the locals under `scope` to canonical numbered names
    pub fn renumber(&self, scope: ScopeId) -> Vec<Edit> {
        match &self.analysis {
            Some(analysis) => renumber(&analysis.table, self.config(), scope),
            None => Vec::new(),
        }
    }
}
