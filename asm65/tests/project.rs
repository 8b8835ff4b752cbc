use asm65::analyze::apply;
use asm65::config::Config;
use asm65::dialect::DialectId;
use asm65::error::Error;
use asm65::project::{MemoryLoader, Project, ProjectState, TextEdit};
use asm65::query::{SemanticKind, SemanticToken};
use asm65::grammer::token::Span;
use asm65::symbols::SymbolKind;
use pretty_assertions::assert_eq;

fn codes(project: &mut Project) -> Vec<&'static str> {
    let snapshot = project.resolve().unwrap();
    snapshot.diagnostics().iter().map(|d| d.code()).collect()
}

// ----------------------------------------------------------------------------
// Snapshots and cancellation
// ----------------------------------------------------------------------------

#[test]
fn superseded_job_publishes_nothing() {
    let mut project = Project::new(DialectId::Ca65);
    let file = project.add_file("main.s", "  jmp nowhere\n", true, false);
    assert_eq!(project.state(), ProjectState::Parsed);

    let first = project.start_resolve();
    project.set_text(file, "here:\n  jmp here\n").unwrap();
    let second = project.start_resolve();
    let generation = second.generation();

    assert!(first.run().is_err());
    let snapshot = second.run().unwrap();
    assert_eq!(snapshot.generation, generation);
    assert!(snapshot.diagnostics().is_empty());
    assert_eq!(project.snapshot().generation, generation);
    assert_eq!(project.state(), ProjectState::Stable);
}

#[test]
fn older_job_cannot_overwrite_newer() {
    let mut project = Project::new(DialectId::Ca65);
    project.add_file("main.s", "  rts\n", true, false);

    let first = project.start_resolve();
    let second = project.start_resolve();
    assert!(first.cancel_token().is_cancelled());
    let published = second.run().unwrap();
    assert!(first.run().is_err());
    assert_eq!(project.snapshot().generation, published.generation);
}

#[test]
fn cancel_while_running() {
    let mut text = String::from(".org $1000\n.repeat 4000\n");
    for _ in 0..2000 {
        text.push_str("  nop\n");
    }
    text.push_str(".endrepeat\n");
    let mut project = Project::new(DialectId::Ca65);
    project.add_file("main.s", &text, true, false);

    let job = project.start_resolve();
    let token = job.cancel_token();
    let running = std::thread::spawn(move || job.run());
    std::thread::sleep(std::time::Duration::from_millis(20));
    token.cancel();

    assert!(running.join().unwrap().is_err());
    let snapshot = project.snapshot();
    assert_eq!(snapshot.generation, 0);
    assert!(snapshot.analysis.is_none());
    assert_eq!(project.state(), ProjectState::Resolving);
}

#[test]
fn edit_reparses_file() {
    let mut project = Project::new(DialectId::Ca65);
    let file = project.add_file("main.s", "here:\n  jmp nowhere\n", true, false);
    assert_eq!(codes(&mut project), vec!["unused-symbol", "undefined-symbol"]);

    project
        .edit(file, &TextEdit::new((1, 6), (1, 13), "here"))
        .unwrap();
    assert_eq!(project.state(), ProjectState::Resolving);
    assert_eq!(project.file(file).unwrap().text, "here:\n  jmp here\n");
    assert!(codes(&mut project).is_empty());

    assert!(matches!(
        project.edit(file, &TextEdit::new((7, 0), (7, 1), "x")),
        Err(Error::InvalidEdit(7, 0))
    ));
}

// ----------------------------------------------------------------------------
// Files
// ----------------------------------------------------------------------------

#[test]
fn include_through_loader() {
    let loader = MemoryLoader::new()
        .with("src/main.a", "!source \"defs.a\"\n  lda #value\n")
        .with("src/defs.a", "value = 3\n");
    let mut project = Project::new(DialectId::Acme).with_loader(loader);
    project.open("src/main.a", true, false).unwrap();
    assert!(project.file_id("src/defs.a").is_some());

    let snapshot = project.resolve().unwrap();
    assert!(snapshot.diagnostics().is_empty(), "{:?}", snapshot.diagnostics());
    let value = snapshot.symbols().into_iter().find(|s| s.name == "value").unwrap();
    assert_eq!(value.value, Some(3));
    assert_eq!(value.kind, SymbolKind::Constant);
}

#[test]
fn include_cycle() {
    let loader = MemoryLoader::new()
        .with("a.a", "!source \"b.a\"\nfrom_a = 1\n")
        .with("b.a", "!source \"a.a\"\nfrom_b = 2\n");
    let mut project = Project::new(DialectId::Acme).with_loader(loader);
    project.open("a.a", true, false).unwrap();

    let snapshot = project.resolve().unwrap();
    let diags = snapshot.diagnostics();
    let codes: Vec<&str> = diags.iter().map(|d| d.code()).collect();
    assert_eq!(codes, vec!["include-cycle", "include-cycle"]);
    assert!(diags.iter().all(|d| d.span.line == 0));
    assert!(snapshot.symbols().is_empty());
}

#[test]
fn missing_include() {
    let mut project = Project::new(DialectId::Acme).with_loader(MemoryLoader::new());
    project.add_file("main.a", "!source \"gone.a\"\n", true, false);
    assert_eq!(codes(&mut project), vec!["include-not-found"]);
}

#[test]
fn include_twice_duplicates() {
    let loader = MemoryLoader::new()
        .with("main.s", ".include \"defs.inc\"\n.include \"defs.inc\"\n  lda #count\n")
        .with("defs.inc", "count = 7\n");
    let mut project = Project::new(DialectId::Ca65).with_loader(loader);
    project.open("main.s", true, false).unwrap();
    assert_eq!(codes(&mut project), vec!["duplicate-symbol"]);
}

#[test]
fn include_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("main.s");
    std::fs::write(&main, ".include \"defs.inc\"\n  lda #count\n").unwrap();
    std::fs::write(dir.path().join("defs.inc"), "count = 7\n").unwrap();

    let mut project = Project::new(DialectId::Ca65);
    project.open(&main, true, false).unwrap();
    assert!(codes(&mut project).is_empty());
}

#[test]
fn shared_symbols_are_global() {
    let mut project = Project::new(DialectId::Ca65);
    project.add_file("zp.inc", "ptr = $fb\n", false, true);
    let one = project.add_file("one.s", ".org $1000\n  lda ptr\n", true, false);
    project.add_file("two.s", ".org $2000\n  sta ptr\n", true, false);

    let snapshot = project.resolve().unwrap();
    assert!(snapshot.diagnostics().is_empty(), "{:?}", snapshot.diagnostics());
    let ptr = snapshot.symbols().into_iter().find(|s| s.name == "ptr").unwrap();
    assert_eq!(ptr.kind, SymbolKind::ZeroPage);
    assert_eq!(snapshot.references(ptr.id).len(), 2);
    assert_eq!(snapshot.symbol_at(one, 1, 6), Some(ptr.id));
}

// ----------------------------------------------------------------------------
// Queries
// ----------------------------------------------------------------------------

#[test]
fn anon_resolves_to_nearest() {
    // P1 `-` at line 1, reference at line 2, P2 `+` at line 3
    let mut project = Project::new(DialectId::Acme);
    let file = project.add_file("main.a", "* = $1000\n- nop\n  bne -\n+ nop\n", true, false);
    let snapshot = project.resolve().unwrap();

    let def = snapshot.definition(file, 2, 6).unwrap();
    assert_eq!(def.line, 1);
    let hover = snapshot.hover(file, 2, 6).unwrap();
    assert!(hover.text.contains("$1000"), "{}", hover.text);
}

#[test]
fn renumber_is_idempotent() {
    let text = "* = $1000\nmain\n.loop   dex\n  bne .loop\n.wait   dey\n  bne .wait\n  jmp main\n";
    let mut project = Project::new(DialectId::Acme);
    let file = project.add_file("main.a", text, true, false);

    let snapshot = project.resolve().unwrap();
    let unit = snapshot.unit(file).unwrap();
    let edits = snapshot.renumber(unit);
    assert_eq!(edits.len(), 4);

    let renamed = apply(text, file, &edits);
    assert_eq!(
        renamed,
        "* = $1000\nmain\n.l1   dex\n  bne .l1\n.l2   dey\n  bne .l2\n  jmp main\n"
    );

    project.set_text(file, &renamed).unwrap();
    let snapshot = project.resolve().unwrap();
    assert!(snapshot.diagnostics().is_empty(), "{:?}", snapshot.diagnostics());
    let unit = snapshot.unit(file).unwrap();
    assert!(snapshot.renumber(unit).is_empty());
}

#[test]
fn hover() {
    let mut project = Project::new(DialectId::Ca65);
    let file = project.add_file("main.s", "count = 3 ; loop count\n  lda #count\n", true, false);
    let snapshot = project.resolve().unwrap();

    let hover = snapshot.hover(file, 1, 8).unwrap();
    assert_eq!(hover.text, "constant `count` = $03 (3)\n\nloop count");
    assert_eq!(hover.span, Span::new(file, 1, 7, 12));

    let hover = snapshot.hover(file, 1, 3).unwrap();
    assert_eq!(hover.text, format!("lda: {}", arch::Mnemonic::LDA.description()));

    assert_eq!(snapshot.definition(file, 1, 8), Some(Span::new(file, 0, 0, 5)));
}

#[test]
fn semantic_tokens() {
    let text = "\
ptr = $fb
count = 3
.org $1000
main:
  lda ptr
  ldx #count
.if 0
  nop
.endif
  jmp main
spare:
  rts
";
    let mut project = Project::new(DialectId::Ca65);
    let file = project.add_file("main.s", text, true, false);
    let snapshot = project.resolve().unwrap();
    let tokens = snapshot.semantic_tokens(file);
    for token in &tokens {
        println!("{:?}", token);
    }

    let kind_at = |line: usize| tokens.iter().find(|t| t.span.line == line).map(|t| t.kind);
    assert_eq!(kind_at(0), Some(SemanticKind::ZeroPage));
    assert_eq!(kind_at(4), Some(SemanticKind::ZeroPage));
    assert_eq!(kind_at(1), Some(SemanticKind::Constant));
    assert_eq!(kind_at(5), Some(SemanticKind::Constant));
    assert_eq!(kind_at(10), Some(SemanticKind::Unused));
    assert!(tokens.contains(&SemanticToken {
        span: Span::new(file, 7, 0, 5),
        kind: SemanticKind::Disabled,
    }));
    assert_eq!(kind_at(3), None);
}

#[test]
fn folding_and_scopes() {
    let text = ".proc main\n  nop\n  rts\n.endproc\n";
    let mut project = Project::new(DialectId::Ca65);
    let file = project.add_file("main.s", text, true, false);
    let snapshot = project.resolve().unwrap();

    let ranges = snapshot.folding_ranges(file);
    assert_eq!(ranges.len(), 1);
    assert_eq!((ranges[0].start, ranges[0].end), (0, 3));

    let scope = snapshot.scope_at(file, 1).unwrap();
    assert_eq!(scope.path, "main");
}

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

#[test]
fn config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("asm65.yaml");
    std::fs::write(
        &path,
        "dialect: ca65\nmain: [src/main.s]\ninclude: [inc]\nwarnings:\n  unused: false\n",
    )
    .unwrap();
    let src = dir.path().join("src");
    std::fs::create_dir(&src).unwrap();

    let found = Config::find(&src).unwrap();
    assert_eq!(found, path);

    let config = Config::load(&found).unwrap();
    assert_eq!(config.dialect, Some(DialectId::Ca65));
    assert_eq!(config.main, vec![dir.path().join("src/main.s")]);
    assert_eq!(config.include, vec![dir.path().join("inc")]);
    assert!(!config.options().unused);
    assert!(config.options().branch_range);
}
