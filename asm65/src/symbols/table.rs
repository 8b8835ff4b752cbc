use indexmap::IndexMap;

use super::{Location, Scope, ScopeId, ScopeKind, Symbol, SymbolId, SymbolKind, Usage};
use crate::error::Error;
use crate::grammer::token::Span;

pub struct SymbolTable {
    scopes: Vec<Scope>,
    // (parent, kind-tagged key) -> child
    children: IndexMap<(ScopeId, String), ScopeId>,
    symbols: Vec<Symbol>,
    case_sensitive: bool,
    pass: u32,
}

pub const GLOBAL: ScopeId = 0;

impl SymbolTable {
    pub fn new(case_sensitive: bool) -> Self {
        SymbolTable {
            scopes: vec![Scope {
                kind: ScopeKind::Global,
                name: String::new(),
                parent: None,
                symbols: IndexMap::new(),
            }],
            children: IndexMap::new(),
            symbols: Vec::new(),
            case_sensitive,
            pass: 0,
        }
    }

    pub fn global(&self) -> ScopeId {
        GLOBAL
    }

    pub fn pass(&self) -> u32 {
        self.pass
    }

    pub fn begin_pass(&mut self) {
        self.pass += 1;
        for sym in &mut self.symbols {
            sym.refs.clear();
            sym.zp_uses = 0;
            sym.abs_uses = 0;
            sym.imm_uses = 0;
        }
    }

    fn key(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        }
    }

    // ------------------------------------------------------------------------
    // Scopes
    // ------------------------------------------------------------------------

    /// Child scope of `parent`, created on first use and reused afterwards
    pub fn child(&mut self, parent: ScopeId, kind: ScopeKind, name: &str) -> ScopeId {
        let key = (parent, format!("{}:{}", kind, self.key(name)));
        if let Some(id) = self.children.get(&key) {
            return *id;
        }
        let id = self.scopes.len();
        self.scopes.push(Scope {
            kind,
            name: name.to_string(),
            parent: Some(parent),
            symbols: IndexMap::new(),
        });
        self.children.insert(key, id);
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    pub fn scopes(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes.iter().enumerate()
    }

    /// Named scope visible from `from`, searching outward
    pub fn find_scope(&self, name: &str, from: ScopeId) -> Option<ScopeId> {
        let key = format!("{}:{}", ScopeKind::Named, self.key(name));
        let ty = format!("{}:{}", ScopeKind::Type, self.key(name));
        self.chain(from).find_map(|s| {
            self.children
                .get(&(s, key.clone()))
                .or_else(|| self.children.get(&(s, ty.clone())))
                .copied()
        })
    }

    /// `from` and all its ancestors, innermost first
    pub fn chain(&self, from: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(from), move |s| self.scopes[*s].parent)
    }

    /// Display path such as `main::loop`
    pub fn path(&self, id: ScopeId) -> String {
        let mut names: Vec<&str> = self
            .chain(id)
            .filter(|s| matches!(self.scopes[*s].kind, ScopeKind::Named | ScopeKind::Type))
            .map(|s| self.scopes[s].name.as_str())
            .collect();
        names.reverse();
        names.join("::")
    }

    // ------------------------------------------------------------------------
    // Symbols
    // ------------------------------------------------------------------------

    /// Define `name` in `scope` for the current pass.
    ///
    /// A second definition in the same pass is a duplicate unless both are
    /// variables, even from the same statement (a file included twice).
    /// The first definition is kept on error.
    pub fn define(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: SymbolKind,
        value: Option<i64>,
        def: Location,
    ) -> Result<SymbolId, Error> {
        let key = self.key(name);
        let pass = self.pass;
        if let Some(&id) = self.scopes[scope].symbols.get(&key) {
            let sym = &mut self.symbols[id];
            let redefinable = kind == SymbolKind::Variable && sym.kind == SymbolKind::Variable;
            if sym.pass == pass && !redefinable {
                return Err(Error::Duplicate(name.to_string()));
            }
            sym.kind = kind;
            sym.value = value;
            sym.def = def;
            sym.pass = pass;
            return Ok(id);
        }
        let id = self.symbols.len();
        let mut sym = Symbol::new(name, scope, kind, def);
        sym.value = value;
        sym.pass = pass;
        self.symbols.push(sym);
        self.scopes[scope].symbols.insert(key, id);
        Ok(id)
    }

    /// Symbol declared directly in `scope`, regardless of pass
    pub fn get(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scopes[scope].symbols.get(&self.key(name)).copied()
    }

    /// Resolve a name from `from` through the enclosing scopes.
    ///
    /// Only symbols defined in this pass or the previous one are visible.
    /// `sep` splits qualified names such as `outer::inner`.
    pub fn lookup(&self, name: &str, from: ScopeId, sep: Option<&str>) -> Option<SymbolId> {
        let live = |id: SymbolId| self.symbols[id].pass + 1 >= self.pass;
        if let Some(sep) = sep.filter(|s| name.contains(*s)) {
            let mut parts: Vec<&str> = name.split(sep).collect();
            let last = parts.pop()?;
            let mut scope = if parts.first() == Some(&"") {
                parts.remove(0);
                GLOBAL
            } else {
                from
            };
            for (i, part) in parts.iter().enumerate() {
                scope = if i == 0 {
                    self.find_scope(part, scope)?
                } else {
                    let named = self.children.get(&(scope, format!("{}:{}", ScopeKind::Named, self.key(part))));
                    let ty = self.children.get(&(scope, format!("{}:{}", ScopeKind::Type, self.key(part))));
                    *named.or(ty)?
                };
            }
            return self.get(scope, last).filter(|id| live(*id));
        }
        self.chain(from)
            .find_map(|s| self.get(s, name).filter(|id| live(*id)))
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id]
    }

    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols.iter().enumerate()
    }

    /// Symbols still defined in the latest pass
    pub fn live(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        let pass = self.pass;
        self.symbols().filter(move |(_, s)| s.pass == pass)
    }

    pub fn reference(&mut self, id: SymbolId, span: Span, usage: Usage) {
        let sym = &mut self.symbols[id];
        if !sym.refs.contains(&span) {
            sym.refs.push(span);
        }
        match usage {
            Usage::Value => {}
            Usage::Immediate => sym.imm_uses += 1,
            Usage::ZeroPage => sym.zp_uses += 1,
            Usage::Absolute => sym.abs_uses += 1,
        }
    }

    /// Symbol defined at or referenced at a position
    pub fn at(&self, file: usize, line: usize, col: usize) -> Option<SymbolId> {
        let hit = |s: &Span| s.file == file && s.contains(line, col);
        self.live()
            .find(|(_, s)| hit(&s.def.span) || s.refs.iter().any(hit))
            .map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(line: usize) -> Location {
        Location {
            span: Span::new(0, line, 0, 4),
            stmt: line,
        }
    }

    #[test]
    fn test() {
        let mut table = SymbolTable::new(false);
        table.begin_pass();
        let unit = table.child(GLOBAL, ScopeKind::Unit, "main.s");
        let proc = table.child(unit, ScopeKind::Named, "Main");
        assert_eq!(table.child(unit, ScopeKind::Named, "main"), proc);

        let inner = table.define(proc, "loop", SymbolKind::Label, Some(0x1000), loc(1)).unwrap();
        assert!(matches!(
            table.define(proc, "LOOP", SymbolKind::Label, Some(0x1002), loc(2)),
            Err(Error::Duplicate(_))
        ));
        assert_eq!(table.lookup("loop", proc, None), Some(inner));
        assert_eq!(table.lookup("loop", unit, None), None);
        assert_eq!(table.lookup("main::loop", unit, Some("::")), Some(inner));
        assert_eq!(table.path(proc), "Main");

        // Redefinition in a later pass is not a duplicate
        table.begin_pass();
        assert_eq!(
            table.define(proc, "loop", SymbolKind::Label, Some(0x1000), loc(1)),
            Ok(inner)
        );
        // The same statement again in one pass is
        assert!(matches!(
            table.define(proc, "loop", SymbolKind::Label, Some(0x1000), loc(1)),
            Err(Error::Duplicate(_))
        ));

        let v = table.define(unit, "i", SymbolKind::Variable, Some(1), loc(3)).unwrap();
        assert_eq!(table.define(unit, "i", SymbolKind::Variable, Some(2), loc(4)), Ok(v));
        assert_eq!(table.symbol(v).value, Some(2));
    }
}
