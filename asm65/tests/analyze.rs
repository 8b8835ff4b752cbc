use std::cell::Cell;

use asm65::analyze::{analyze, CancelToken, Cancelled, Options, Plan, Sources};
use asm65::dialect::{get_dialect, DialectId, DialectId::*};
use asm65::grammer::token::FileId;
use asm65::grammer::{parse_file, ParsedFile};
use asm65::project::Project;
use pretty_assertions::assert_eq;

fn assert(code: &str, dialect: DialectId, expects: &[&str]) {
    let mut project = Project::new(dialect);
    project.set_options(Options {
        unused: false,
        branch_range: true,
    });
    project.add_file("main.s", code, true, false);
    let snapshot = project.resolve().unwrap();

    let diags = snapshot.diagnostics();
    for (idx, line) in code.lines().enumerate() {
        println!("{:>2}: {}", idx, line);
    }
    for diag in &diags {
        println!("{}:{} [{}] {}", diag.span.line, diag.span.col, diag.code(), diag.message());
    }

    let codes: Vec<&str> = diags.iter().map(|d| d.code()).collect();
    assert_eq!(codes, expects);
}

macro_rules! case {
    ($name:ident, $dialect:expr, $code:expr, $expects:expr) => {
        #[test]
        fn $name() {
            assert($code, $dialect, &$expects);
        }
    };
}

// ---- Resolution ----
case!(
    forward_reference,
    Acme,
    "* = $1000\n  jmp later\n  nop\nlater\n  rts\n",
    []
);
case!(undefined_symbol, Acme, "  jmp nowhere\n", ["undefined-symbol"]);
case!(
    shadowed_in_proc,
    Ca65,
    ".org $1000\nloop: nop\n.proc inner\nloop: jmp loop\n.endproc\n  jmp loop\n  jsr inner\n",
    []
);

// ---- Locals ----
case!(
    duplicate_cheap_local,
    Ca65,
    ".org $1000\nmain:\n@loop: dex\n  bne @loop\n@loop: dey\n  bne @loop\n  rts\n",
    ["duplicate-symbol"]
);
case!(
    cheap_local_after_reset,
    Ca65,
    ".org $1000\nfirst:\n@loop: dex\n  bne @loop\nsecond:\n@loop: dey\n  bne @loop\n  jmp first\n",
    []
);
case!(
    zone_local_after_zone,
    Acme,
    "* = $1000\n!zone one\n.wait dex\n  bne .wait\n!zone two\n.wait dey\n  bne .wait\n",
    []
);
case!(
    anon_runs,
    Acme,
    "* = $1000\n- dex\n  bne -\n  beq +\n  nop\n+ rts\n",
    []
);
case!(
    anon_colon,
    Ca65,
    ".org $1000\n: dex\n  bne :-\n  beq :+\n  nop\n: rts\n",
    []
);

// ---- Branch range ----
case!(
    branch_in_range,
    Ca65,
    ".org $1000\n  beq target\n  .res 127\ntarget:\n  rts\n",
    []
);
case!(
    branch_out_of_range,
    Ca65,
    ".org $1000\n  beq target\n  .res 130\ntarget:\n  rts\n",
    ["branch-out-of-range"]
);

// ---- Block nesting ----
case!(
    mismatched_block,
    Ca65,
    ".proc main\n.if 1\n  nop\n.endproc\n",
    ["mismatched-block"]
);
case!(unterminated_block, Ca65, ".if 1\n  nop\n", ["unterminated-block"]);
case!(stray_end, Ca65, ".endif\n  nop\n", ["unmatched-end"]);

// ---- Expansion ----
case!(
    macro_expansion,
    Ca65,
    ".macro add1 v\n  clc\n  adc #v\n.endmacro\n.org $1000\n  add1 1\n",
    []
);
case!(unknown_macro, Ca65, "  frobnicate 1\n", ["unknown-macro"]);
case!(
    loop_limit,
    Ca65,
    ".repeat 5000\n  nop\n.endrepeat\n",
    ["loop-limit"]
);
case!(
    loop_variable_redefined,
    Ca65,
    ".repeat 2, i\ni = 3\n.endrepeat\n",
    ["duplicate-symbol"]
);
case!(
    false_branch_is_skipped,
    Ca65,
    ".if 0\n  jmp nowhere\n.endif\n",
    []
);

// ---- Values ----
case!(byte_overflow, Ca65, ".byte 300\n", ["value-overflow"]);
case!(division_by_zero, Ca65, ".byte 1/0\n", ["division-by-zero"]);

// ---- Source-declared messages ----
case!(error_directive, Ca65, ".error \"boom\"\n", ["user-message"]);
case!(
    fatal_stops_file,
    Acme,
    "!serious \"stop\"\n  jmp nowhere\n",
    ["user-message"]
);

#[test]
fn unused_symbols() {
    let mut project = Project::new(Ca65);
    project.add_file(
        "main.s",
        ".org $1000\nstart:\n  jmp start\nspare:\n  rts\n",
        true,
        false,
    );
    let snapshot = project.resolve().unwrap();
    let diags = snapshot.diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code(), "unused-symbol");
    assert_eq!(diags[0].span.line, 3);
}

#[test]
fn exported_is_used() {
    let mut project = Project::new(Ca65);
    project.add_file("main.s", ".export entry\nentry:\n  rts\n", true, false);
    let snapshot = project.resolve().unwrap();
    assert!(snapshot.diagnostics().is_empty(), "{:?}", snapshot.diagnostics());
}

// ---- Cancellation ----

/// One file; cancels the token on the `after`-th time the analyzer reads it
struct CancelAfter {
    parsed: ParsedFile,
    token: CancelToken,
    reads: Cell<usize>,
    after: usize,
}

impl Sources for CancelAfter {
    fn parsed(&self, file: FileId) -> Option<&ParsedFile> {
        let reads = self.reads.get() + 1;
        self.reads.set(reads);
        if reads == self.after {
            self.token.cancel();
        }
        (file == 0).then_some(&self.parsed)
    }

    fn include(&self, _from: FileId, _path: &str) -> Option<FileId> {
        None
    }

    fn binary_size(&self, _from: FileId, _path: &str) -> Option<i64> {
        None
    }
}

fn run_cancelling(after: usize) -> (Result<(), Cancelled>, usize) {
    let dialect = get_dialect(Ca65);
    let text = ".org $1000\n  jmp later\n  nop\nlater:\n  rts\n";
    let token = CancelToken::new();
    let sources = CancelAfter {
        parsed: parse_file(0, text, dialect),
        token: token.clone(),
        reads: Cell::new(0),
        after,
    };
    let plan = Plan {
        shared: vec![],
        roots: vec![0],
    };
    let result = analyze(&sources, dialect, &plan, Options::default(), &token);
    (result.map(|_| ()), sources.reads.get())
}

#[test]
fn cancel_during_run() {
    // Runs to completion when nobody cancels
    let (result, reads) = run_cancelling(usize::MAX);
    assert_eq!(result, Ok(()));
    assert!(reads >= 2);

    // Cancelled while the second pass reads the file
    let (result, reads) = run_cancelling(2);
    assert_eq!(result, Err(Cancelled));
    assert_eq!(reads, 2);
}
