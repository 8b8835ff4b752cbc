use std::path::PathBuf;

use asm65::{detect_dialect, Config, DialectId, Project, Severity};
use color_print::{cformat, cprintln};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Root source files (default: `main` of the project file)
    files: Vec<PathBuf>,

    /// Dialect: acme, ca65, dasm, kick, tass64, merlin (default: detected)
    #[clap(short = 'D', long)]
    dialect: Option<String>,

    /// Project file (default: nearest asm65.yaml)
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Files whose symbols are visible to every root
    #[clap(short, long)]
    shared: Vec<PathBuf>,

    /// Include search directories
    #[clap(short = 'I', long = "include")]
    include: Vec<PathBuf>,

    /// Dump the symbol table as YAML
    #[clap(long)]
    dump: bool,

    /// Enable verbose output
    #[clap(short, long)]
    verbose: bool,
}

fn fail(msg: String) -> ! {
    cprintln!("<red,bold>error</>: {}", msg);
    std::process::exit(2);
}

fn main() {
    use clap::Parser;

    let args = Args::parse();

    let default = if args.verbose { "asm65=debug" } else { "asm65=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // 1. Project file
    let config_path = args.config.clone().or_else(|| {
        std::env::current_dir()
            .ok()
            .and_then(|dir| Config::find(&dir))
    });
    let config = match &config_path {
        Some(path) => Config::load(path).unwrap_or_else(|e| fail(e.to_string())),
        None => Config::default(),
    };

    let roots = if args.files.is_empty() {
        config.main.clone()
    } else {
        args.files.clone()
    };
    if roots.is_empty() {
        fail(cformat!("no input files (pass files or set `main` in <underline>asm65.yaml</>)"));
    }
    let shared: Vec<PathBuf> = config.shared.iter().chain(&args.shared).cloned().collect();
    let include: Vec<PathBuf> = args.include.iter().chain(&config.include).cloned().collect();

    // 2. Dialect: flag, project file, then detection on the first root
    let dialect = match (&args.dialect, config.dialect) {
        (Some(name), _) => DialectId::parse(name),
        (None, Some(id)) => id,
        (None, None) => std::fs::read_to_string(&roots[0])
            .map(|text| detect_dialect(&text))
            .unwrap_or_default(),
    };
    if args.verbose {
        println!("Dialect: {}", dialect);
    }

    // 3. Load and resolve
    let mut project = Project::new(dialect);
    project.set_include_dirs(include);
    project.set_options(config.options());
    for path in &shared {
        if let Err(e) = project.open(path, false, true) {
            fail(cformat!("{}: <underline>{}</>", e, path.display()));
        }
    }
    for path in &roots {
        if let Err(e) = project.open(path, true, false) {
            fail(cformat!("{}: <underline>{}</>", e, path.display()));
        }
    }
    let snapshot = match project.resolve() {
        Ok(snapshot) => snapshot,
        Err(e) => fail(e.to_string()),
    };

    // 4. Report
    let diags = snapshot.diagnostics();
    for diag in &diags {
        let Some(file) = snapshot.file(diag.span.file) else {
            continue;
        };
        let source = file.parsed.lines.get(diag.span.line).map_or("", String::as_str);
        diag.print_diag(&file.path.display().to_string(), source);
    }

    if args.dump {
        let symbols = snapshot.symbols();
        let yaml = serde_yaml::to_string(&symbols)
            .unwrap_or_else(|e| format!("# Error generating YAML: {}", e));
        println!("{}", yaml);
    }

    let errors = diags.iter().filter(|d| d.severity == Severity::Error).count();
    let warnings = diags.len() - errors;
    if snapshot.has_errors() {
        cprintln!("<red,bold>{} error(s)</>, {} warning(s)", errors, warnings);
        std::process::exit(1);
    }
    cprintln!("<green,bold>ok</>: {} warning(s)", warnings);
}
