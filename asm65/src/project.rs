//! Files, include graph and resolution jobs.
//!
//! Readers never see a half-resolved program: a [`ResolveJob`] builds a new
//! [`Snapshot`] on the side and swaps it in only if no newer job was started
//! in the meantime.

use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use bimap::BiMap;
use strum::Display;
use tracing::{debug, info, warn};

use crate::analyze::{analyze, Analysis, CancelToken, Cancelled, Options, Plan, Sources};
use crate::dialect::{get_dialect, DialectId};
use crate::error::{Diagnostic, Error};
use crate::grammer::token::{FileId, Span};
use crate::grammer::{parse_file, ParsedFile};

// ----------------------------------------------------------------------------
// Loading
// ----------------------------------------------------------------------------

/// Source of files the editor has not supplied
pub trait SourceLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<String, Error>;

    /// Byte size, or `None` when the file does not exist
    fn size(&self, path: &Path) -> Option<u64>;
}

pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, path: &Path) -> Result<String, Error> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn size(&self, path: &Path) -> Option<u64> {
        std::fs::metadata(path).ok().filter(|m| m.is_file()).map(|m| m.len())
    }
}

/// Files held in memory
#[derive(Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        MemoryLoader::default()
    }

    pub fn with(mut self, path: impl AsRef<Path>, text: &str) -> Self {
        self.files.insert(normalize(path.as_ref()), text.to_string());
        self
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, path: &Path) -> Result<String, Error> {
        self.files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| Error::IncludeNotFound(path.display().to_string()))
    }

    fn size(&self, path: &Path) -> Option<u64> {
        self.files.get(&normalize(path)).map(|t| t.len() as u64)
    }
}

/// Resolve `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for part in path.components() {
        match part {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ----------------------------------------------------------------------------
// Files
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
    pub parsed: ParsedFile,
    pub root: bool,
    pub shared: bool,
    // Include request -> file it resolved to
    pub includes: HashMap<String, FileId>,
    pub binaries: HashMap<String, i64>,
}

/// Replace the text between two (line, byte column) positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub start: (usize, usize),
    pub end: (usize, usize),
    pub text: String,
}

impl TextEdit {
    pub fn new(start: (usize, usize), end: (usize, usize), text: &str) -> Self {
        TextEdit {
            start,
            end,
            text: text.to_string(),
        }
    }
}

fn offset(text: &str, (line, col): (usize, usize)) -> Result<usize, Error> {
    let mut start = 0;
    for (n, src) in text.split_inclusive('\n').enumerate() {
        if n == line {
            let len = src.trim_end_matches(['\n', '\r']).len();
            if col > len || !src.is_char_boundary(col) {
                return Err(Error::InvalidEdit(line, col));
            }
            return Ok(start + col);
        }
        start += src.len();
    }
    // Just past the last line
    if col == 0 && line == text.split_inclusive('\n').count() {
        return Ok(text.len());
    }
    Err(Error::InvalidEdit(line, col))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ProjectState {
    Parsed,
    Resolving,
    Stable,
}

/// Resolved view of the project that queries read from
pub struct Snapshot {
    pub generation: u64,
    pub dialect: DialectId,
    pub files: Vec<Arc<SourceFile>>,
    pub analysis: Option<Analysis>,
    // Include-cycle diagnostics
    pub structural: Vec<Diagnostic>,
}

impl Snapshot {
    fn empty(dialect: DialectId) -> Self {
        Snapshot {
            generation: 0,
            dialect,
            files: Vec::new(),
            analysis: None,
            structural: Vec::new(),
        }
    }

    pub fn file(&self, file: FileId) -> Option<&SourceFile> {
        self.files.get(file).map(Arc::as_ref)
    }

    pub fn file_id(&self, path: impl AsRef<Path>) -> Option<FileId> {
        let path = normalize(path.as_ref());
        self.files.iter().position(|f| f.path == path)
    }
}

struct Files<'a> {
    files: &'a [Arc<SourceFile>],
    cyclic: &'a HashSet<FileId>,
}

impl<'a> Sources for Files<'a> {
    fn parsed(&self, file: FileId) -> Option<&ParsedFile> {
        if self.cyclic.contains(&file) {
            return None;
        }
        self.files.get(file).map(|f| &f.parsed)
    }

    fn include(&self, from: FileId, path: &str) -> Option<FileId> {
        self.files.get(from)?.includes.get(path).copied()
    }

    fn binary_size(&self, from: FileId, path: &str) -> Option<i64> {
        self.files.get(from)?.binaries.get(path).copied()
    }
}

// ----------------------------------------------------------------------------
// Project
// ----------------------------------------------------------------------------

pub struct Project {
    dialect: DialectId,
    files: Vec<Arc<SourceFile>>,
    // Normalized path <-> file
    index: BiMap<PathBuf, FileId>,
    include_dirs: Vec<PathBuf>,
    loader: Box<dyn SourceLoader>,
    options: Options,
    cyclic: HashSet<FileId>,
    structural: Vec<Diagnostic>,
    state: Arc<Mutex<ProjectState>>,
    generation: Arc<AtomicU64>,
    current: Option<CancelToken>,
    snapshot: Arc<RwLock<Arc<Snapshot>>>,
}

impl Project {
    pub fn new(dialect: DialectId) -> Self {
        Project {
            dialect,
            files: Vec::new(),
            index: BiMap::new(),
            include_dirs: Vec::new(),
            loader: Box::new(FsLoader),
            options: Options::default(),
            cyclic: HashSet::new(),
            structural: Vec::new(),
            state: Arc::new(Mutex::new(ProjectState::Parsed)),
            generation: Arc::new(AtomicU64::new(0)),
            current: None,
            snapshot: Arc::new(RwLock::new(Arc::new(Snapshot::empty(dialect)))),
        }
    }

    pub fn with_loader(mut self, loader: impl SourceLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn dialect(&self) -> DialectId {
        self.dialect
    }

    pub fn set_include_dirs(&mut self, dirs: Vec<PathBuf>) {
        self.include_dirs = dirs;
    }

    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    pub fn state(&self) -> ProjectState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(ProjectState::Parsed)
    }

    fn set_state(&self, state: ProjectState) {
        if let Ok(mut s) = self.state.lock() {
            *s = state;
        }
    }

    pub fn file_id(&self, path: impl AsRef<Path>) -> Option<FileId> {
        self.index.get_by_left(&normalize(path.as_ref())).copied()
    }

    pub fn file(&self, file: FileId) -> Option<&SourceFile> {
        self.files.get(file).map(Arc::as_ref)
    }

    /// Add a file with text supplied by the caller. Adding a known path
    /// replaces its text.
    pub fn add_file(&mut self, path: impl AsRef<Path>, text: &str, root: bool, shared: bool) -> FileId {
        let path = normalize(path.as_ref());
        let id = match self.index.get_by_left(&path) {
            Some(&id) => {
                let mut file = (*self.files[id]).clone();
                file.root |= root;
                file.shared |= shared;
                self.files[id] = Arc::new(file);
                self.reparse(id, text.to_string());
                id
            }
            None => self.insert(path, text.to_string(), root, shared),
        };
        self.changed();
        id
    }

    /// Load a file through the loader
    pub fn open(&mut self, path: impl AsRef<Path>, root: bool, shared: bool) -> Result<FileId, Error> {
        let text = self.loader.load(path.as_ref())?;
        Ok(self.add_file(path, &text, root, shared))
    }

    /// Replace a range of a file's text and re-parse that file
    pub fn edit(&mut self, file: FileId, edit: &TextEdit) -> Result<(), Error> {
        let source = self
            .files
            .get(file)
            .ok_or_else(|| Error::UnknownFile(format!("#{}", file)))?;
        let start = offset(&source.text, edit.start)?;
        let end = offset(&source.text, edit.end)?;
        if start > end {
            return Err(Error::InvalidEdit(edit.start.0, edit.start.1));
        }
        let mut text = source.text.clone();
        text.replace_range(start..end, &edit.text);
        self.set_text(file, &text)
    }

    pub fn set_text(&mut self, file: FileId, text: &str) -> Result<(), Error> {
        if file >= self.files.len() {
            return Err(Error::UnknownFile(format!("#{}", file)));
        }
        self.reparse(file, text.to_string());
        self.changed();
        Ok(())
    }

    fn insert(&mut self, path: PathBuf, text: String, root: bool, shared: bool) -> FileId {
        let id = self.files.len();
        self.index.insert(path.clone(), id);
        let parsed = parse_file(id, &text, get_dialect(self.dialect));
        self.files.push(Arc::new(SourceFile {
            path,
            text,
            parsed,
            root,
            shared,
            includes: HashMap::new(),
            binaries: HashMap::new(),
        }));
        self.link(id);
        id
    }

    fn reparse(&mut self, id: FileId, text: String) {
        let mut file = (*self.files[id]).clone();
        file.parsed = parse_file(id, &text, get_dialect(self.dialect));
        file.text = text;
        self.files[id] = Arc::new(file);
        self.link(id);
    }

    /// Resolve the include and binary requests of a file, loading new files
    fn link(&mut self, id: FileId) {
        let requests = self.files[id].parsed.includes.clone();
        let mut includes = HashMap::new();
        for (request, _) in requests {
            let Some(path) = self.locate(id, &request) else {
                continue;
            };
            let target = match self.index.get_by_left(&path) {
                Some(&target) => target,
                None => match self.loader.load(&path) {
                    Ok(text) => {
                        debug!(path = %path.display(), "loaded include");
                        self.insert(path, text, false, false)
                    }
                    Err(e) => {
                        warn!(path = %path.display(), "{}", e);
                        continue;
                    }
                },
            };
            includes.insert(request, target);
        }

        let binaries = self.files[id]
            .parsed
            .binaries
            .iter()
            .filter_map(|(request, _)| {
                let path = self.locate(id, request)?;
                let size = self.loader.size(&path)?;
                Some((request.clone(), size as i64))
            })
            .collect();

        let mut file = (*self.files[id]).clone();
        file.includes = includes;
        file.binaries = binaries;
        self.files[id] = Arc::new(file);
    }

    /// Includer's directory first, then the include directories
    fn locate(&self, from: FileId, request: &str) -> Option<PathBuf> {
        let base = self.files[from].path.parent().map(Path::to_path_buf).unwrap_or_default();
        std::iter::once(base)
            .chain(self.include_dirs.iter().cloned())
            .map(|dir| normalize(&dir.join(request)))
            .find(|p| self.index.contains_left(p) || self.loader.size(p).is_some())
    }

    /// Files on an include cycle contribute nothing and get one diagnostic
    fn find_cycles(&mut self) {
        fn visit(
            files: &[Arc<SourceFile>],
            id: FileId,
            marks: &mut [u8],
            stack: &mut Vec<FileId>,
            cyclic: &mut HashSet<FileId>,
        ) {
            marks[id] = 1;
            stack.push(id);
            for &next in files[id].includes.values() {
                match marks[next] {
                    0 => visit(files, next, marks, stack, cyclic),
                    1 => {
                        if let Some(pos) = stack.iter().position(|&s| s == next) {
                            cyclic.extend(&stack[pos..]);
                        }
                    }
                    _ => {}
                }
            }
            stack.pop();
            marks[id] = 2;
        }

        let mut marks = vec![0u8; self.files.len()];
        let mut cyclic = HashSet::new();
        for id in 0..self.files.len() {
            if marks[id] == 0 {
                visit(&self.files, id, &mut marks, &mut Vec::new(), &mut cyclic);
            }
        }

        let mut ids: Vec<FileId> = cyclic.iter().copied().collect();
        ids.sort();
        self.structural = ids
            .iter()
            .map(|&id| {
                let name = self.files[id].path.display().to_string();
                Diagnostic::error(Span::new(id, 0, 0, 0), Error::IncludeCycle(name))
            })
            .collect();
        if !ids.is_empty() {
            warn!(files = ids.len(), "include cycle");
        }
        self.cyclic = cyclic;
    }

    fn changed(&mut self) {
        self.find_cycles();
        if let Some(token) = self.current.take() {
            token.cancel();
        }
        let state = if self.generation.load(Ordering::SeqCst) == 0 {
            ProjectState::Parsed
        } else {
            ProjectState::Resolving
        };
        self.set_state(state);
    }

    fn plan(&self) -> Plan {
        let included: HashSet<FileId> = self
            .files
            .iter()
            .flat_map(|f| f.includes.values().copied())
            .collect();
        let explicit = self.files.iter().any(|f| f.root);
        let mut plan = Plan::default();
        for (id, file) in self.files.iter().enumerate() {
            if file.shared {
                plan.shared.push(id);
            } else if file.root || (!explicit && !included.contains(&id)) {
                plan.roots.push(id);
            }
        }
        plan
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    /// Start a new resolution, cancelling the one in flight
    pub fn start_resolve(&mut self) -> ResolveJob {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
        let token = CancelToken::new();
        self.current = Some(token.clone());
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.set_state(ProjectState::Resolving);
        debug!(generation, "resolve started");

        ResolveJob {
            generation,
            token,
            dialect: self.dialect,
            files: self.files.clone(),
            cyclic: self.cyclic.clone(),
            structural: self.structural.clone(),
            plan: self.plan(),
            options: self.options,
            latest: Arc::clone(&self.generation),
            state: Arc::clone(&self.state),
            target: Arc::clone(&self.snapshot),
        }
    }

    /// Resolve now and return the published snapshot
    pub fn resolve(&mut self) -> Result<Arc<Snapshot>, Cancelled> {
        self.start_resolve().run()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let current = match self.snapshot.read() {
            Ok(current) => current,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(&*current)
    }
}

/// One resolution over a frozen copy of the project's files
pub struct ResolveJob {
    generation: u64,
    token: CancelToken,
    dialect: DialectId,
    files: Vec<Arc<SourceFile>>,
    cyclic: HashSet<FileId>,
    structural: Vec<Diagnostic>,
    plan: Plan,
    options: Options,
    latest: Arc<AtomicU64>,
    state: Arc<Mutex<ProjectState>>,
    target: Arc<RwLock<Arc<Snapshot>>>,
}

impl ResolveJob {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    fn superseded(&self) -> bool {
        self.token.is_cancelled() || self.latest.load(Ordering::SeqCst) != self.generation
    }

    pub fn run(self) -> Result<Arc<Snapshot>, Cancelled> {
        if self.superseded() {
            return Err(Cancelled);
        }
        let sources = Files {
            files: &self.files,
            cyclic: &self.cyclic,
        };
        let analysis = analyze(
            &sources,
            get_dialect(self.dialect),
            &self.plan,
            self.options,
            &self.token,
        )?;

        let mut slot = match self.target.write() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Checked under the lock so an older job cannot overwrite a newer one
        if self.superseded() {
            info!(generation = self.generation, "resolve superseded");
            return Err(Cancelled);
        }
        let snapshot = Arc::new(Snapshot {
            generation: self.generation,
            dialect: self.dialect,
            files: self.files,
            analysis: Some(analysis),
            structural: self.structural,
        });
        *slot = Arc::clone(&snapshot);
        if let Ok(mut state) = self.state.lock() {
            *state = ProjectState::Stable;
        }
        info!(generation = self.generation, "snapshot published");
        Ok(snapshot)
    }
}
