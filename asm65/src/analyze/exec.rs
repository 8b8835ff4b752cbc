use std::collections::HashMap;

use arch::{AddrMode, Form, Mnemonic};
use indexmap::IndexMap;
use tracing::{debug, trace};

use super::cond::{arms, block_end, Arm};
use super::expand::{MacroDef, MAX_DEPTH};
use super::pc::Pc;
use super::{CancelToken, Cancelled, Options, Sources, StmtInfo};
use crate::dialect::keyword::{Level, TextMode, TypeKind, ZoneKind};
use crate::dialect::{DialectConfig, DialectId, LocalRule};
use crate::error::{Diagnostic, Error};
use crate::eval::{eval, EvalContext, EvalError};
use crate::grammer::ast::{Cond, Expr, Item, Label, Stmt, StmtKind};
use crate::grammer::parse_lines;
use crate::grammer::token::{AnonMark, FileId, Span};
use crate::symbols::{AnonTable, Location, ScopeId, ScopeKind, SymbolId, SymbolKind, SymbolTable, Usage};

pub const MAX_LOOP: i64 = 4096;

// Stand-in address of an imported symbol that is not zero-page
const EXTERNAL: i64 = 0x10000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Unit,
    // proc / scope / brace block
    Block,
    // zone written as a block
    Zone,
    // macro expansion or loop iteration
    Expansion,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    kind: FrameKind,
    // Where plain labels go
    scope: ScopeId,
    zone: ScopeId,
    cheap: ScopeId,
    // Owner of the anonymous labels defined here
    anon: ScopeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Next,
    // `end` or a fatal message: the rest of the file is skipped
    Stop,
}

/// Runs one pass over the program, rebuilding per-pass state each time
/// while the symbol table carries values between passes.
pub struct Exec<'a> {
    dialect: &'a DialectConfig,
    sources: &'a dyn Sources,
    options: Options,
    cancel: &'a CancelToken,
    pub table: SymbolTable,
    pub anon: IndexMap<ScopeId, AnonTable>,
    macros: HashMap<SymbolId, MacroDef>,

    // Per pass
    pc: Pc,
    root: Frame,
    frames: Vec<Frame>,
    includes: Vec<FileId>,
    seq: usize,
    depth: usize,
    generated: usize,
    expansions: usize,
    site: Option<Span>,
    usage: Usage,
    exports: Vec<(String, ScopeId, Span)>,
    pub diags: Vec<Diagnostic>,
    pub undefined: Vec<(String, Span)>,
    pub infos: HashMap<FileId, Vec<Option<StmtInfo>>>,
    pub disabled: Vec<(FileId, usize, usize)>,
    pub unreliable: Vec<Span>,
    pub anon_refs: Vec<(Span, Span)>,
    pub units: Vec<(FileId, ScopeId)>,
}

impl<'a> Exec<'a> {
    pub fn new(
        dialect: &'a DialectConfig,
        sources: &'a dyn Sources,
        options: Options,
        cancel: &'a CancelToken,
    ) -> Self {
        let root = Frame {
            kind: FrameKind::Unit,
            scope: 0,
            zone: 0,
            cheap: 0,
            anon: 0,
        };
        Exec {
            dialect,
            sources,
            options,
            cancel,
            table: SymbolTable::new(dialect.lex.case_sensitive),
            anon: IndexMap::new(),
            macros: HashMap::new(),
            pc: Pc::new(dialect.lex.default_origin),
            root,
            frames: Vec::new(),
            includes: Vec::new(),
            seq: 0,
            depth: 0,
            generated: 0,
            expansions: 0,
            site: None,
            usage: Usage::Value,
            exports: Vec::new(),
            diags: Vec::new(),
            undefined: Vec::new(),
            infos: HashMap::new(),
            disabled: Vec::new(),
            unreliable: Vec::new(),
            anon_refs: Vec::new(),
            units: Vec::new(),
        }
    }

    pub fn begin_pass(&mut self) {
        self.table.begin_pass();
        for table in self.anon.values_mut() {
            table.begin_pass();
        }
        self.seq = 0;
        self.depth = 0;
        self.generated = 0;
        self.expansions = 0;
        self.site = None;
        self.includes.clear();
        self.exports.clear();
        self.diags.clear();
        self.undefined.clear();
        self.infos.clear();
        self.disabled.clear();
        self.unreliable.clear();
        self.anon_refs.clear();
        self.units.clear();
    }

    pub fn end_pass(&mut self) {
        for (name, from, span) in std::mem::take(&mut self.exports) {
            match self.table.lookup(&name, from, self.dialect.lex.scope_sep) {
                Some(id) => {
                    self.table.reference(id, span, Usage::Value);
                    self.table.symbol_mut(id).exported = true;
                }
                None => self.undefined.push((name, span)),
            }
        }
    }

    /// Everything a later pass could still change
    pub fn fingerprint(&self) -> Vec<(bool, Option<i64>)> {
        let pass = self.table.pass();
        let mut print: Vec<(bool, Option<i64>)> = self
            .table
            .symbols()
            .map(|(_, s)| (s.pass == pass, s.value))
            .collect();
        for table in self.anon.values() {
            print.extend(table.defs().iter().map(|d| (true, d.value)));
        }
        print.push((false, Some(self.undefined.len() as i64)));
        print
    }

    /// Run a root file in its own unit scope, or a shared file in the
    /// global scope.
    pub fn run_unit(&mut self, file: FileId, unit: ScopeId) -> Result<(), Cancelled> {
        let zone = self.table.child(unit, ScopeKind::Zone, "");
        let cheap = self.table.child(zone, ScopeKind::Cheap, "");
        self.root = Frame {
            kind: FrameKind::Unit,
            scope: unit,
            zone,
            cheap,
            anon: unit,
        };
        self.frames = vec![self.root];
        self.pc = Pc::new(self.dialect.lex.default_origin);
        self.units.push((file, unit));
        self.run_file(file)
    }

    fn run_file(&mut self, file: FileId) -> Result<(), Cancelled> {
        let sources = self.sources;
        let Some(parsed) = sources.parsed(file) else {
            return Ok(());
        };
        if self.includes.contains(&file) {
            return Ok(());
        }
        trace!(file, "run file");
        self.includes.push(file);
        let flow = self.run_block(&parsed.stmts, 0, parsed.stmts.len(), Some(file));
        self.includes.pop();
        flow.map(|_| ())
    }

    // ------------------------------------------------------------------------
    // Reporting
    // ------------------------------------------------------------------------

    /// Diagnostics inside an expansion point at the outermost invocation
    fn at(&self, span: Span) -> Span {
        self.site.unwrap_or(span)
    }

    fn error(&mut self, span: Span, e: Error) {
        self.diags.push(Diagnostic::error(self.at(span), e));
    }

    fn warning(&mut self, span: Span, e: Error) {
        self.diags.push(Diagnostic::warning(self.at(span), e));
    }

    fn frame(&self) -> Frame {
        self.frames.last().copied().unwrap_or(self.root)
    }

    fn record(&mut self, file: Option<FileId>, idx: usize, pc: Option<i64>, size: i64) {
        let (Some(file), None) = (file, self.site) else {
            return;
        };
        let scope = self.frame().cheap;
        let infos = self.infos.entry(file).or_default();
        if infos.len() <= idx {
            infos.resize(idx + 1, None);
        }
        infos[idx] = Some(StmtInfo { pc, size, scope });
    }

    // ------------------------------------------------------------------------
    // Symbols
    // ------------------------------------------------------------------------

    fn resolve(&self, name: &str) -> Option<SymbolId> {
        self.table
            .lookup(name, self.frame().cheap, self.dialect.lex.scope_sep)
    }

    /// Value of an expression, `None` while it cannot be computed
    fn value(&mut self, expr: &Expr, usage: Usage) -> Option<i64> {
        let dialect = self.dialect;
        self.usage = usage;
        let result = eval(expr, dialect, self);
        self.usage = Usage::Value;
        match result {
            Ok(v) => Some(v),
            Err(EvalError::Unresolved(..)) => None,
            Err(EvalError::Semantic(e, span)) => {
                self.error(span, e);
                None
            }
        }
    }

    fn define(
        &mut self,
        name: &str,
        span: Span,
        stmt: usize,
        kind: SymbolKind,
        value: Option<i64>,
        description: Option<&String>,
    ) -> Option<SymbolId> {
        let frame = self.frame();
        let (scope, kind) = match self.dialect.lex.local_rule(name) {
            Some(LocalRule::Zone) => (frame.zone, kind),
            Some(LocalRule::Cheap) => (frame.cheap, kind),
            Some(LocalRule::Variable) => (frame.scope, SymbolKind::Variable),
            None => (frame.scope, kind),
        };
        match self.table.define(scope, name, kind, value, Location { span, stmt }) {
            Ok(id) => {
                let sym = self.table.symbol_mut(id);
                sym.generated = self.generated > 0;
                if let Some(d) = description {
                    sym.description = Some(d.trim().to_string());
                }
                Some(id)
            }
            Err(e) => {
                self.error(span, e);
                None
            }
        }
    }

    fn define_label(&mut self, stmt: &Stmt, idx: usize) {
        match &stmt.label {
            Some(Label::Named(name, span)) => {
                let pc = self.pc.get();
                self.define(name, *span, idx, SymbolKind::Label, pc, stmt.comment.as_ref());
                // A plain label starts a new run of cheap locals
                if self.dialect.lex.local_rule(name).is_none() {
                    let zone = self.frame().zone;
                    let cheap = self.table.child(zone, ScopeKind::Cheap, name);
                    if let Some(top) = self.frames.last_mut() {
                        top.cheap = cheap;
                    }
                }
            }
            Some(Label::Anon(mark, span)) => {
                let owner = self.frame().anon;
                let (pc, seq, style) = (self.pc.get(), self.seq, self.dialect.lex.anon);
                self.anon
                    .entry(owner)
                    .or_insert_with(|| AnonTable::new(style))
                    .define(seq, *mark, pc, *span);
            }
            None => {}
        }
    }

    // ------------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------------

    fn run_block(
        &mut self,
        stmts: &[Stmt],
        from: usize,
        to: usize,
        file: Option<FileId>,
    ) -> Result<Flow, Cancelled> {
        let mut i = from;
        while i < to {
            if self.cancel.is_cancelled() {
                return Err(Cancelled);
            }
            let stmt = &stmts[i];
            self.seq += 1;
            let pc = self.pc.get();

            let (flow, next) = match &stmt.kind {
                StmtKind::If(_) => {
                    self.define_label(stmt, i);
                    self.record(file, i, pc, 0);
                    (self.run_if(stmts, i, file)?, block_end(stmts, i) + 1)
                }
                StmtKind::Repeat { .. } | StmtKind::For { .. } => {
                    self.define_label(stmt, i);
                    self.record(file, i, pc, 0);
                    (self.run_loop(stmts, i, file)?, block_end(stmts, i) + 1)
                }
                StmtKind::Macro { .. } => {
                    self.define_macro(stmt, i);
                    self.record(file, i, pc, 0);
                    (Flow::Next, block_end(stmts, i) + 1)
                }
                StmtKind::Type { kind, name } => {
                    self.run_type(stmts, i, *kind, name.as_ref());
                    self.record(file, i, pc, 0);
                    (Flow::Next, block_end(stmts, i) + 1)
                }
                _ => (self.stmt(stmt, i, file)?, i + 1),
            };
            if flow == Flow::Stop {
                return Ok(Flow::Stop);
            }
            i = next;
        }
        Ok(Flow::Next)
    }

    fn cond(&mut self, cond: &Cond) -> bool {
        match cond {
            Cond::Expr(e) => self.value(e, Usage::Value).is_some_and(|v| v != 0),
            Cond::Defined { name, negate, .. } => self.resolve(name).is_some() != *negate,
        }
    }

    fn run_if(&mut self, stmts: &[Stmt], start: usize, file: Option<FileId>) -> Result<Flow, Cancelled> {
        let mut taken = false;
        for arm in arms(stmts, start) {
            let active = !taken
                && match &stmts[arm.head].kind {
                    StmtKind::If(c) | StmtKind::ElseIf(c) => self.cond(c),
                    _ => true,
                };
            if active {
                taken = true;
                if self.run_block(stmts, arm.body.0, arm.body.1, file)? == Flow::Stop {
                    return Ok(Flow::Stop);
                }
            } else {
                self.disable(stmts, arm, file);
            }
        }
        Ok(Flow::Next)
    }

    /// Lines of a branch that is not assembled
    fn disable(&mut self, stmts: &[Stmt], arm: Arm, file: Option<FileId>) {
        let (Some(file), None) = (file, self.site) else {
            return;
        };
        let first = stmts[arm.head].line() + 1;
        let last = match stmts.get(arm.body.1) {
            Some(s) => s.line().saturating_sub(1),
            None => stmts.last().map(|s| s.line()).unwrap_or(0),
        };
        if last >= first {
            self.disabled.push((file, first, last));
        }
    }

    fn run_loop(&mut self, stmts: &[Stmt], start: usize, file: Option<FileId>) -> Result<Flow, Cancelled> {
        let stmt = &stmts[start];
        let end = block_end(stmts, start);
        let (var, first, count) = match &stmt.kind {
            StmtKind::Repeat { count, var } => (var.clone(), 0, self.value(count, Usage::Value)),
            StmtKind::For { var, start, end } => {
                let s = self.value(start, Usage::Value);
                let e = self.value(end, Usage::Value);
                let count = s.zip(e).map(|(s, e)| e - s + 1);
                (Some(var.clone()), s.unwrap_or(0), count)
            }
            _ => return Ok(Flow::Next),
        };
        let Some(count) = count else {
            return Ok(Flow::Next);
        };
        if count > MAX_LOOP {
            self.error(stmt.span, Error::LoopLimit(count));
            return Ok(Flow::Next);
        }

        let parent = self.frame();
        let frames = self.frames.len();
        self.generated += 1;
        let mut flow = Ok(Flow::Next);
        for n in 0..count.max(0) {
            let key = format!("@{}:{}#{}", stmt.span.file, stmt.span.line, n);
            let scope = self.table.child(parent.cheap, ScopeKind::Loop, &key);
            self.frames.push(Frame {
                kind: FrameKind::Expansion,
                scope,
                zone: scope,
                cheap: scope,
                anon: scope,
            });
            if let Some((name, span)) = &var {
                let def = Location { span: *span, stmt: start };
                if let Err(e) = self.table.define(scope, name, SymbolKind::Variable, Some(first + n), def) {
                    self.error(*span, e);
                }
            }
            flow = self.run_block(stmts, start + 1, end, file);
            self.frames.truncate(frames);
            if !matches!(flow, Ok(Flow::Next)) {
                break;
            }
        }
        self.generated -= 1;
        flow
    }

    fn define_macro(&mut self, stmt: &Stmt, idx: usize) {
        let StmtKind::Macro {
            name,
            params,
            body,
            body_line,
        } = &stmt.kind
        else {
            return;
        };
        let pc = self.pc.get();
        let Some(id) = self.define(name, stmt.span, idx, SymbolKind::Macro, pc, stmt.comment.as_ref())
        else {
            return;
        };
        self.macros.insert(
            id,
            MacroDef {
                name: name.clone(),
                params: params.clone(),
                body: body.clone(),
                file: stmt.span.file,
                line: *body_line,
            },
        );
    }

    fn call(&mut self, name: &str, args: &[String], span: Span) -> Result<Flow, Cancelled> {
        let id = self
            .resolve(name)
            .filter(|id| self.table.symbol(*id).kind == SymbolKind::Macro);
        let Some(def) = id.and_then(|id| self.macros.get(&id).cloned()) else {
            self.error(span, Error::UnknownMacro(name.to_string()));
            return Ok(Flow::Next);
        };
        if let Some(id) = id {
            self.table.reference(id, span, Usage::Value);
        }
        if self.depth >= MAX_DEPTH {
            self.error(span, Error::MacroDepth(name.to_string()));
            return Ok(Flow::Next);
        }
        let lines = match def.expand(args, self.dialect) {
            Ok(lines) => lines,
            Err(e) => {
                self.error(span, e);
                return Ok(Flow::Next);
            }
        };
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let parsed = parse_lines(def.file, &refs, def.line, self.dialect);

        self.expansions += 1;
        let key = format!("{}#{}", def.name, self.expansions);
        let parent = self.frame().cheap;
        let scope = self.table.child(parent, ScopeKind::Macro, &key);
        debug!(name = %def.name, depth = self.depth, "expand");

        let site = self.site;
        self.site = Some(site.unwrap_or(span));
        for d in parsed.diags {
            let span = self.at(d.span);
            self.diags.push(Diagnostic { span, ..d });
        }
        let frames = self.frames.len();
        self.frames.push(Frame {
            kind: FrameKind::Expansion,
            scope,
            zone: scope,
            cheap: scope,
            anon: scope,
        });
        self.depth += 1;
        self.generated += 1;
        let flow = self.run_block(&parsed.stmts, 0, parsed.stmts.len(), None);
        self.generated -= 1;
        self.depth -= 1;
        self.frames.truncate(frames);
        self.site = site;
        flow
    }

    /// Member offsets of a struct, union or enum body
    fn run_type(&mut self, stmts: &[Stmt], start: usize, kind: TypeKind, name: Option<&(String, Span)>) {
        let head = &stmts[start];
        let end = block_end(stmts, start);
        let parent = self.frame();
        let key = match name {
            Some((n, _)) => n.clone(),
            None => format!("@{}:{}", head.span.file, head.span.line),
        };
        let scope = self.table.child(parent.scope, ScopeKind::Type, &key);

        let mut offset = 0i64;
        let mut widest = 0i64;
        let mut i = start + 1;
        while i < end {
            let stmt = &stmts[i];
            if let Some(e) = stmt.end.filter(|e| *e > i) {
                i = e + 1;
                continue;
            }
            if let (TypeKind::Enum, StmtKind::Equate { name, span, value, .. }) = (kind, &stmt.kind) {
                let v = self.value(value, Usage::Value);
                let def = Location { span: *span, stmt: i };
                match self.table.define(scope, name, SymbolKind::StructMember, v, def) {
                    Ok(id) => self.table.symbol_mut(id).description = stmt.comment.clone(),
                    Err(e) => self.error(*span, e),
                }
                offset = v.map_or(offset + 1, |v| v + 1);
            }
            if let Some(Label::Named(member, span)) = &stmt.label {
                let def = Location { span: *span, stmt: i };
                let value = if kind == TypeKind::Union { 0 } else { offset };
                match self.table.define(scope, member, SymbolKind::StructMember, Some(value), def) {
                    Ok(id) => self.table.symbol_mut(id).description = stmt.comment.clone(),
                    Err(e) => self.error(*span, e),
                }
                if kind == TypeKind::Enum {
                    offset += 1;
                }
            }
            let size = self.member_size(stmt);
            match kind {
                TypeKind::Struct => offset += size,
                TypeKind::Union => widest = widest.max(size),
                TypeKind::Enum => {}
            }
            i += 1;
        }

        if let Some((name, span)) = name {
            let size = if kind == TypeKind::Union { widest } else { offset };
            let description = head.comment.as_ref();
            self.define(name, *span, start, SymbolKind::Struct, Some(size), description);
        }
    }

    fn member_size(&mut self, stmt: &Stmt) -> i64 {
        match &stmt.kind {
            StmtKind::Data { width, items } => width.bytes as i64 * self.item_count(items).max(1),
            StmtKind::Storage { count, .. } => self.value(count, Usage::Value).unwrap_or(0).max(0),
            StmtKind::Text { mode, items } => self.text_size(*mode, items),
            _ => 0,
        }
    }

    fn item_count(&self, items: &[Item]) -> i64 {
        items
            .iter()
            .map(|item| match item {
                Item::Text(s, _) => s.chars().count() as i64,
                Item::Expr(_) => 1,
            })
            .sum()
    }

    fn text_size(&self, mode: TextMode, items: &[Item]) -> i64 {
        let extra = match mode {
            TextMode::Zero | TextMode::Length => 1,
            TextMode::Plain | TextMode::HighBit => 0,
        };
        self.item_count(items) + extra
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    fn stmt(&mut self, stmt: &Stmt, idx: usize, file: Option<FileId>) -> Result<Flow, Cancelled> {
        let pc = self.pc.get();
        self.define_label(stmt, idx);
        let mut size = 0;
        let mut flow = Flow::Next;

        match &stmt.kind {
            StmtKind::Instruction { op, form, operand } => {
                size = self.instruction(*op, *form, operand.as_ref(), stmt.span);
            }
            StmtKind::Equate {
                name,
                span,
                value,
                variable,
            } => {
                let v = self.value(value, Usage::Value);
                let kind = if *variable {
                    SymbolKind::Variable
                } else {
                    SymbolKind::Constant
                };
                self.define(name, *span, idx, kind, v, stmt.comment.as_ref());
            }
            StmtKind::Org(Some(e)) => {
                let v = self.value(e, Usage::Value);
                self.pc.org(v);
            }
            StmtKind::Align { args, mask } => {
                let values: Vec<i64> = args.iter().filter_map(|a| self.value(a, Usage::Value)).collect();
                let pad = match (mask, values.as_slice()) {
                    (true, [m, v, ..]) => self.pc.pad_mask(*m, *v),
                    (true, [m]) => self.pc.pad_mask(*m, 0),
                    (false, [n, ..]) => self.pc.pad_to(*n),
                    _ => 0,
                };
                self.pc.advance(pad);
                size = pad;
            }
            StmtKind::Segment(name) => self.pc.switch(name),
            StmtKind::Dummy(e) => {
                let v = e.as_ref().map(|e| self.value(e, Usage::Value));
                self.pc.dummy(v);
            }
            StmtKind::DummyEnd => self.pc.end_dummy(),
            StmtKind::Pseudopc(e) => {
                let v = self.value(e, Usage::Value);
                self.pc.pseudo(v);
            }
            StmtKind::PseudopcEnd => self.pc.end_pseudo(),
            StmtKind::Include(path) => match self.sources.include(stmt.span.file, path) {
                Some(included) => {
                    self.record(file, idx, pc, 0);
                    self.run_file(included)?;
                    return Ok(Flow::Next);
                }
                None => self.error(stmt.span, Error::IncludeNotFound(path.clone())),
            },
            StmtKind::Binary { path, args } => {
                size = self.binary(path, args, stmt.span);
                self.pc.advance(size);
            }
            StmtKind::Call { name, args, span } => {
                self.record(file, idx, pc, 0);
                return self.call(name, args, *span);
            }
            StmtKind::Data { width, items } => {
                for item in items {
                    match item {
                        Item::Text(s, _) => size += s.chars().count() as i64 * width.bytes as i64,
                        Item::Expr(e) => {
                            if let Some(v) = self.value(e, Usage::Value) {
                                if !width.fits(v) {
                                    self.error(e.span(), Error::Overflow(v, width.bytes));
                                }
                            }
                            size += width.bytes as i64;
                        }
                    }
                }
                self.pc.advance(size);
            }
            StmtKind::Text { mode, items } => {
                for item in items {
                    if let Item::Expr(e) = item {
                        self.value(e, Usage::Value);
                    }
                }
                size = self.text_size(*mode, items);
                self.pc.advance(size);
            }
            StmtKind::Storage { count, fill } => {
                if let Some(fill) = fill {
                    self.value(fill, Usage::Value);
                }
                size = self.value(count, Usage::Value).unwrap_or(0).max(0);
                self.pc.advance(size);
            }
            StmtKind::Scope { kind, name, block } => self.open_scope(stmt, idx, *kind, name.as_ref(), *block),
            StmtKind::ScopeEnd => {
                if matches!(self.frame().kind, FrameKind::Block | FrameKind::Zone) {
                    self.frames.pop();
                }
            }
            StmtKind::Import { names, zp } => {
                let kind = if *zp {
                    SymbolKind::ZeroPage
                } else {
                    SymbolKind::Label
                };
                for (name, span) in names {
                    if let Some(id) = self.define(name, *span, idx, kind, None, None) {
                        self.table.symbol_mut(id).imported = true;
                    }
                }
            }
            StmtKind::Export { names, .. } => {
                let from = self.frame().cheap;
                for (name, span) in names {
                    self.exports.push((name.clone(), from, self.at(*span)));
                }
            }
            StmtKind::Message {
                level,
                cond,
                assert,
                items,
            } => flow = self.message(*level, cond.as_ref(), *assert, items, stmt.span),
            StmtKind::End => flow = Flow::Stop,
            StmtKind::Org(None)
            | StmtKind::Label
            | StmtKind::MacroEnd
            | StmtKind::TypeEnd
            | StmtKind::If(_)
            | StmtKind::ElseIf(_)
            | StmtKind::Else
            | StmtKind::EndIf
            | StmtKind::Repeat { .. }
            | StmtKind::For { .. }
            | StmtKind::LoopEnd
            | StmtKind::Macro { .. }
            | StmtKind::Type { .. }
            | StmtKind::Ignored
            | StmtKind::Unsupported(_) => {}
        }
        self.record(file, idx, pc, size);
        Ok(flow)
    }

    fn instruction(&mut self, op: Mnemonic, form: Form, operand: Option<&Expr>, span: Span) -> i64 {
        let value = operand.and_then(|e| self.value(e, Usage::Value));
        let Some(mode) = arch::select(op, form, value) else {
            self.error(span, Error::InvalidAddressing(op.to_string()));
            return 0;
        };

        // Count operand symbols by the width they end up addressed with
        let usage = match mode {
            AddrMode::Immediate => Usage::Immediate,
            m if m.is_zeropage() => Usage::ZeroPage,
            m if m.is_address() => Usage::Absolute,
            _ => Usage::Value,
        };
        if let Some(e) = operand {
            let mut names = Vec::new();
            e.symbols(&mut |name, span| names.push((name, span)));
            for (name, span) in names {
                if let Some(id) = self.resolve(name) {
                    self.table.reference(id, span, usage);
                }
            }
        }

        if let (AddrMode::Relative, Some(target), Some(pc)) = (mode, value, self.pc.get()) {
            let offset = target - (pc + 2);
            if self.options.branch_range && !(-128..=127).contains(&offset) {
                let at = operand.map_or(span, |e| e.span());
                self.error(at, Error::BranchRange(offset));
            }
        }
        let size = mode.size() as i64;
        self.pc.advance(size);
        size
    }

    fn binary(&mut self, path: &str, args: &[Expr], span: Span) -> i64 {
        let values: Vec<Option<i64>> = args.iter().map(|a| self.value(a, Usage::Value)).collect();
        let file_size = self.sources.binary_size(span.file, path);
        let size = if self.dialect.id == DialectId::Acme {
            // length, then offset
            values.first().copied().flatten().or(file_size)
        } else {
            // offset, then length
            match (values.first().copied().flatten(), values.get(1).copied().flatten()) {
                (_, Some(len)) => Some(len),
                (Some(skip), None) => file_size.map(|s| s - skip),
                (None, None) => file_size,
            }
        };
        if size.is_none() {
            self.error(span, Error::IncludeNotFound(path.to_string()));
        }
        size.unwrap_or(0).max(0)
    }

    fn open_scope(
        &mut self,
        stmt: &Stmt,
        idx: usize,
        kind: ZoneKind,
        name: Option<&(String, Span)>,
        block: bool,
    ) {
        let parent = self.frame();
        let label = match &stmt.label {
            Some(Label::Named(n, _)) if self.dialect.scoped_labels => Some(n.clone()),
            _ => None,
        };
        let key = name
            .map(|(n, _)| n.clone())
            .or(label)
            .unwrap_or_else(|| format!("@{}:{}", stmt.span.file, stmt.span.line));

        match kind {
            ZoneKind::Zone | ZoneKind::Subroutine => {
                let zone = self.table.child(parent.scope, ScopeKind::Zone, &key);
                let cheap = self.table.child(zone, ScopeKind::Cheap, "");
                if block {
                    self.frames.push(Frame {
                        kind: FrameKind::Zone,
                        zone,
                        cheap,
                        ..parent
                    });
                } else if let Some(top) = self.frames.last_mut() {
                    top.zone = zone;
                    top.cheap = cheap;
                }
            }
            ZoneKind::Proc | ZoneKind::Scope | ZoneKind::Block => {
                // A named procedure is also a label
                if let (ZoneKind::Proc, Some((n, span))) = (kind, name) {
                    let pc = self.pc.get();
                    self.define(n, *span, idx, SymbolKind::Label, pc, stmt.comment.as_ref());
                }
                let scope = self.table.child(parent.scope, ScopeKind::Named, &key);
                let zone = self.table.child(scope, ScopeKind::Zone, "");
                let cheap = self.table.child(zone, ScopeKind::Cheap, "");
                self.frames.push(Frame {
                    kind: FrameKind::Block,
                    scope,
                    zone,
                    cheap,
                    anon: parent.anon,
                });
            }
        }
    }

    fn message(&mut self, level: Level, cond: Option<&Expr>, assert: bool, items: &[Item], span: Span) -> Flow {
        if let Some(cond) = cond {
            let Some(v) = self.value(cond, Usage::Value) else {
                return Flow::Next;
            };
            // An assertion fires when false, a conditional message when true
            if (v != 0) == assert {
                return Flow::Next;
            }
        }

        let mut text = String::new();
        for item in items {
            match item {
                Item::Text(s, _) => text.push_str(s),
                Item::Expr(e) => match self.value(e, Usage::Value) {
                    Some(v) => text.push_str(&v.to_string()),
                    None => text.push('?'),
                },
            }
        }
        let e = if text.is_empty() && assert {
            Error::AssertFailed
        } else {
            Error::Message(text)
        };
        match level {
            Level::Warning => self.warning(span, e),
            Level::Error => self.error(span, e),
            Level::Fatal => {
                self.error(span, e);
                let at = self.at(span);
                self.unreliable.push(at);
                debug!(file = at.file, line = at.line, "fatal directive");
                return Flow::Stop;
            }
        }
        Flow::Next
    }
}

impl<'a> EvalContext for Exec<'a> {
    fn lookup(&mut self, name: &str, span: Span) -> Option<i64> {
        let Some(id) = self.resolve(name) else {
            let at = self.at(span);
            self.undefined.push((name.to_string(), at));
            return None;
        };
        self.table.reference(id, span, self.usage);
        let sym = self.table.symbol(id);
        match sym.kind {
            SymbolKind::Macro => None,
            _ if sym.imported => sym.value.or(Some(match sym.kind {
                SymbolKind::ZeroPage => 0,
                _ => EXTERNAL,
            })),
            _ => sym.value,
        }
    }

    fn defined(&mut self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    fn pc(&self) -> Option<i64> {
        self.pc.get()
    }

    fn anon(&mut self, mark: AnonMark, span: Span) -> Option<i64> {
        let owner = self.frame().anon;
        let def = self
            .anon
            .get(&owner)
            .and_then(|t| t.resolve(self.seq, mark))
            .copied();
        match def {
            Some(def) => {
                self.anon_refs.push((span, def.span));
                def.value
            }
            None => {
                let at = self.at(span);
                self.undefined.push((mark.to_string(), at));
                None
            }
        }
    }
}
