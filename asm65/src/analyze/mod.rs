//! Multi-pass resolution.
//!
//! Every pass walks the program from scratch: it tracks the program counter,
//! expands macros and loops, picks branches of conditionals and defines
//! symbols. Values found in one pass are visible to the next, which is how
//! forward references resolve. The run stops once a pass changes nothing,
//! and diagnostics are taken from that last pass only.

pub mod checks;
pub mod cond;
mod exec;
pub mod expand;
pub mod pc;
pub mod renumber;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::dialect::DialectConfig;
use crate::error::{Diagnostic, Error as AsmError};
use crate::grammer::token::{FileId, Span};
use crate::grammer::ParsedFile;
use crate::symbols::{AnonDef, ScopeId, ScopeKind, SymbolTable};
use exec::Exec;

pub use exec::MAX_LOOP;
pub use expand::MAX_DEPTH;
pub use renumber::{apply, renumber, Edit};

pub const MAX_PASSES: u32 = 24;

// ----------------------------------------------------------------------------
// Inputs
// ----------------------------------------------------------------------------

/// Parsed files and the include graph, as the project sees them
pub trait Sources {
    /// `None` for unknown files and files that must not contribute symbols
    fn parsed(&self, file: FileId) -> Option<&ParsedFile>;

    fn include(&self, from: FileId, path: &str) -> Option<FileId>;

    fn binary_size(&self, from: FileId, path: &str) -> Option<i64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub unused: bool,
    pub branch_range: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            unused: true,
            branch_range: true,
        }
    }
}

/// Files of one analysis: shared files define into the global scope, each
/// root file gets a unit scope of its own.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub shared: Vec<FileId>,
    pub roots: Vec<FileId>,
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("resolution was cancelled")]
pub struct Cancelled;

// ----------------------------------------------------------------------------
// Results
// ----------------------------------------------------------------------------

/// What the last pass saw of one top-level statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StmtInfo {
    pub pc: Option<i64>,
    pub size: i64,
    pub scope: ScopeId,
}

pub struct Analysis {
    pub table: SymbolTable,
    pub diags: Vec<Diagnostic>,
    // Statement index -> info, per file. Statements never reached are `None`.
    pub stmts: HashMap<FileId, Vec<Option<StmtInfo>>>,
    // Inclusive line ranges of branches that are not assembled
    pub disabled: Vec<(FileId, usize, usize)>,
    // Fatal directives; their file is unreliable below this point
    pub unreliable: Vec<Span>,
    pub anon: Vec<AnonDef>,
    // Anonymous reference -> definition
    pub anon_refs: Vec<(Span, Span)>,
    pub units: Vec<(FileId, ScopeId)>,
    pub passes: u32,
    pub converged: bool,
}

impl Analysis {
    pub fn info(&self, file: FileId, stmt: usize) -> Option<StmtInfo> {
        self.stmts.get(&file)?.get(stmt).copied().flatten()
    }
}

pub fn analyze(
    sources: &dyn Sources,
    dialect: &DialectConfig,
    plan: &Plan,
    options: Options,
    cancel: &CancelToken,
) -> Result<Analysis, Cancelled> {
    let mut exec = Exec::new(dialect, sources, options, cancel);
    let mut last = None;
    let mut converged = false;
    let mut passes = 0;

    for pass in 1..=MAX_PASSES {
        if cancel.is_cancelled() {
            info!(pass, "resolution cancelled");
            return Err(Cancelled);
        }
        exec.begin_pass();
        for &file in &plan.shared {
            let global = exec.table.global();
            exec.run_unit(file, global)?;
        }
        for &file in &plan.roots {
            let global = exec.table.global();
            let unit = exec.table.child(global, ScopeKind::Unit, &format!("#{}", file));
            exec.run_unit(file, unit)?;
        }
        exec.end_pass();
        passes = pass;

        let print = exec.fingerprint();
        debug!(pass, undefined = exec.undefined.len(), "pass finished");
        if last.as_ref() == Some(&print) {
            converged = true;
            break;
        }
        last = Some(print);
    }

    let mut diags = std::mem::take(&mut exec.diags);
    diags.extend(checks::undefined(&exec.undefined));
    if options.unused {
        diags.extend(checks::unused(&exec.table));
    }
    if !converged {
        let span = plan
            .roots
            .first()
            .or(plan.shared.first())
            .map(|f| Span::new(*f, 0, 0, 0))
            .unwrap_or_default();
        diags.push(Diagnostic::warning(span, AsmError::NoConvergence(passes)));
    }
    diags.sort_by_key(|d| d.span);
    info!(passes, converged, diags = diags.len(), "resolution finished");

    Ok(Analysis {
        anon: exec.anon.values().flat_map(|t| t.defs().iter().copied()).collect(),
        table: exec.table,
        diags,
        stmts: exec.infos,
        disabled: exec.disabled,
        unreliable: exec.unreliable,
        anon_refs: exec.anon_refs,
        units: exec.units,
        passes,
        converged,
    })
}
