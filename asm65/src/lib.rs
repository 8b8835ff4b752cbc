pub mod analyze;
pub mod config;
pub mod dialect;
pub mod error;
pub mod eval;
pub mod grammer;
pub mod project;
pub mod query;
pub mod symbols;

pub use analyze::{analyze, Analysis, CancelToken, Cancelled, Options};
pub use config::Config;
pub use dialect::{detect_dialect, get_dialect, DialectConfig, DialectId};
pub use error::{Diagnostic, Error, Severity};
pub use project::{FsLoader, MemoryLoader, Project, ProjectState, ResolveJob, Snapshot, SourceLoader, TextEdit};
pub use query::{FoldingRange, Hover, ScopeInfo, SemanticKind, SemanticToken, SymbolInfo};
