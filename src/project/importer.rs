//! Import resolution straight from source directories.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::analyzer::{
    CheckRequest, Diagnostic, ImportError, ImportResolver, PackageScope, SemanticAnalyzer,
};
use crate::base::FileSet;
use crate::parser::parse_file;

use super::config::LoadConfig;
use super::pattern::is_local;

/// Import paths to try for `path` imported from `src_dir`, nearest vendor
/// directory first and the plain path last.
pub fn import_candidates(config: &LoadConfig, path: &str, src_dir: Option<&Path>) -> Vec<String> {
    let mut candidates = Vec::new();
    if let Some(dir) = src_dir
        && let Some((_, rel)) = config.root_relative(dir)
    {
        let parts: Vec<&str> = rel.split('/').filter(|p| !p.is_empty()).collect();
        for len in (0..=parts.len()).rev() {
            let prefix = parts[..len].join("/");
            candidates.push(if prefix.is_empty() {
                format!("vendor/{path}")
            } else {
                format!("{prefix}/vendor/{path}")
            });
        }
    }
    candidates.push(path.to_string());
    candidates
}

#[derive(Default)]
struct ImportState {
    done: FxHashMap<PathBuf, Result<Arc<PackageScope>, ImportError>>,
    in_progress: FxHashSet<PathBuf>,
}

/// Parses and checks imported packages on demand, caching their scopes by
/// directory.
///
/// Imports are serialized: a thread importing a package holds the lock
/// while it recursively imports that package's dependencies, so meeting a
/// directory that is still in progress means an import cycle.
pub struct SourceImporter {
    config: LoadConfig,
    analyzer: Arc<dyn SemanticAnalyzer>,
    state: ReentrantMutex<RefCell<ImportState>>,
}

impl SourceImporter {
    pub fn new(config: LoadConfig, analyzer: Arc<dyn SemanticAnalyzer>) -> Self {
        Self {
            config,
            analyzer,
            state: ReentrantMutex::new(RefCell::new(ImportState::default())),
        }
    }

    fn locate(&self, path: &str, src_dir: Option<&Path>) -> Option<(PathBuf, String)> {
        if is_local(path) {
            let base = src_dir.unwrap_or(&self.config.working_dir);
            let dir = base.join(path);
            return dir.is_dir().then(|| (dir, path.to_string()));
        }
        import_candidates(&self.config, path, src_dir)
            .into_iter()
            .find_map(|candidate| {
                let dir = self.config.find_in_roots(&candidate)?;
                Some((dir, candidate))
            })
    }

    fn check_dir(&self, dir: &Path, path: &str) -> Result<Arc<PackageScope>, ImportError> {
        debug!(path, dir = %dir.display(), "importing from source");
        let broken = |message: String| ImportError::broken(path, message);

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| broken(e.to_string()))? {
            let file = entry.map_err(|e| broken(e.to_string()))?.path();
            let name = file.file_name().map(|n| n.to_string_lossy().into_owned());
            if let Some(name) = name
                && name.ends_with(".go")
                && !name.ends_with("_test.go")
                && file.is_file()
            {
                paths.push(file);
            }
        }
        paths.sort();

        let fset = Arc::new(FileSet::new());
        let mut files = Vec::new();
        for file_path in &paths {
            let src = fs::read_to_string(file_path).map_err(|e| broken(e.to_string()))?;
            let file = parse_file(&fset, &file_path.to_string_lossy(), &src)
                .map_err(|e| broken(e.to_string()))?;
            if self
                .config
                .build
                .matches_file(file.base_name(), &src, file.imports_foreign())
            {
                files.push(file);
            } else {
                trace!(file = %file_path.display(), "skipping excluded file");
            }
        }

        let Some(first) = files.first() else {
            return Err(broken(format!("no buildable source files in {}", dir.display())));
        };
        if let Some(other) = files
            .iter()
            .find(|f| f.package_name.name != first.package_name.name)
        {
            return Err(broken(format!(
                "found packages {} and {} in {}",
                first.package_name.name,
                other.package_name.name,
                dir.display()
            )));
        }

        let mut first_error: Option<Diagnostic> = None;
        let analysis = self.analyzer.check(
            CheckRequest {
                path,
                dir: Some(dir),
                files: files.iter().collect(),
                fset: &fset,
                importer: self,
                fake_foreign_imports: true,
            },
            &mut |diag| {
                if !diag.soft && first_error.is_none() {
                    first_error = Some(diag);
                }
            },
        );
        if let Some(diag) = first_error {
            let at = fset
                .position(diag.pos)
                .map(|p| p.to_string())
                .unwrap_or_else(|| dir.display().to_string());
            return Err(broken(format!("{at}: {}", diag.message)));
        }
        Ok(analysis.scope)
    }
}

impl ImportResolver for SourceImporter {
    fn import(&self, path: &str, src_dir: Option<&Path>) -> Result<Arc<PackageScope>, ImportError> {
        let (dir, canonical) = self
            .locate(path, src_dir)
            .ok_or_else(|| ImportError::NotFound(path.to_string()))?;

        let guard = self.state.lock();
        {
            let state = guard.borrow();
            if let Some(done) = state.done.get(&dir) {
                return done.clone();
            }
            if state.in_progress.contains(&dir) {
                return Err(ImportError::Cycle(canonical));
            }
        }
        guard.borrow_mut().in_progress.insert(dir.clone());

        let result = self.check_dir(&dir, &canonical);

        let mut state = guard.borrow_mut();
        state.in_progress.remove(&dir);
        state.done.insert(dir, result.clone());
        result
    }
}

/// Resolves imports as if files in one directory lived in another.
pub struct DirOverrideImporter {
    inner: Arc<dyn ImportResolver>,
    overrides: FxHashMap<PathBuf, PathBuf>,
}

impl DirOverrideImporter {
    pub fn new(inner: Arc<dyn ImportResolver>) -> Self {
        Self {
            inner,
            overrides: FxHashMap::default(),
        }
    }

    pub fn with_override(mut self, from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        self.overrides.insert(from.into(), to.into());
        self
    }
}

impl ImportResolver for DirOverrideImporter {
    fn import(&self, path: &str, src_dir: Option<&Path>) -> Result<Arc<PackageScope>, ImportError> {
        let src_dir = src_dir.map(|dir| self.overrides.get(dir).map(PathBuf::as_path).unwrap_or(dir));
        self.inner.import(path, src_dir)
    }
}
