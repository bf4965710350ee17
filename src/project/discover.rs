//! Finding and parsing the directories a load asks for.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::base::FileSet;
use crate::error::LoadError;
use crate::parser::parse_file;
use crate::syntax::SourceFile;

use super::config::{LoadConfig, slash_path};
use super::pattern::{Pattern, PatternMatcher, Variant, is_local};
use super::preprocess::PreprocessRequest;

// ============================================================================
// RAW PACKAGES
// ============================================================================

/// One package of a directory, parsed but not checked.
#[derive(Debug)]
pub struct RawPackage {
    /// `path`, `path:xtest` or `path:nobuild(name)`.
    pub identity: String,
    pub dir: PathBuf,
    pub name: SmolStr,
    /// File set shared by every package of the directory.
    pub fset: Arc<FileSet>,
    /// Sorted by file name.
    pub files: Vec<SourceFile>,
    /// Names of the files excluded by the build context.
    pub non_buildable: FxHashSet<Arc<str>>,
}

impl RawPackage {
    fn new(identity: String, dir: &Path, name: SmolStr, fset: Arc<FileSet>, mut files: Vec<ParsedFile>) -> Self {
        files.sort_by(|a, b| a.file.name.cmp(&b.file.name));
        let non_buildable = files
            .iter()
            .filter(|f| !f.buildable)
            .map(|f| f.file.name.clone())
            .collect();
        Self {
            identity,
            dir: dir.to_path_buf(),
            name,
            fset,
            files: files.into_iter().map(|f| f.file).collect(),
            non_buildable,
        }
    }

    /// A package from files parsed elsewhere, each flagged buildable or not.
    /// The package name is taken from the first file.
    pub fn assemble(
        identity: impl Into<String>,
        dir: &Path,
        fset: Arc<FileSet>,
        files: Vec<(SourceFile, bool)>,
    ) -> Self {
        let name = files
            .first()
            .map(|(file, _)| file.package_name.name.clone())
            .unwrap_or_default();
        let files = files
            .into_iter()
            .map(|(file, buildable)| ParsedFile { file, buildable })
            .collect();
        Self::new(identity.into(), dir, name, fset, files)
    }

    pub fn is_buildable(&self, file: &SourceFile) -> bool {
        !self.non_buildable.contains(&file.name)
    }

    pub fn buildable_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter().filter(|f| self.is_buildable(f))
    }

    pub fn non_buildable_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter().filter(|f| !self.is_buildable(f))
    }

    /// Every import path of every file, deduplicated.
    pub fn imports(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.iter().flat_map(SourceFile::import_paths).collect();
        paths.sort();
        paths.dedup();
        paths
    }
}

#[derive(Debug)]
struct ParsedFile {
    file: SourceFile,
    buildable: bool,
}

// ============================================================================
// DISCOVERY
// ============================================================================

/// Output of [`discover`].
#[derive(Debug, Default)]
pub struct Discovery {
    /// Every package found, keyed by identity.
    pub packages: IndexMap<String, RawPackage>,
    /// Identities found for each requested pattern, in request order.
    pub groups: Vec<Vec<String>>,
}

/// Locate and parse the packages named by `patterns`.
///
/// A directory is parsed at most once per call, however many patterns or
/// roots reach it.
pub fn discover(config: &LoadConfig, patterns: &[&str]) -> Result<Discovery, LoadError> {
    let mut discoverer = Discoverer {
        config,
        packages: IndexMap::new(),
        visited: FxHashMap::default(),
    };
    let mut groups = vec![Vec::new(); patterns.len()];
    let mut trees = Vec::new();

    for (idx, raw) in patterns.iter().enumerate() {
        match Pattern::parse(raw) {
            Pattern::Exact { path, variant } => {
                groups[idx].push(discoverer.exact(&path, &variant)?);
            }
            Pattern::Local(matcher) => groups[idx] = discoverer.local_tree(&matcher)?,
            Pattern::Tree(matcher) => trees.push((idx, matcher)),
        }
    }
    if !trees.is_empty() {
        discoverer.trees(&trees, &mut groups)?;
    }

    Ok(Discovery {
        packages: discoverer.packages,
        groups,
    })
}

struct Discoverer<'c> {
    config: &'c LoadConfig,
    packages: IndexMap<String, RawPackage>,
    /// Identities produced for each directory, keyed by its path name.
    visited: FxHashMap<String, Vec<String>>,
}

impl Discoverer<'_> {
    fn visit(&mut self, dir: &Path, base: &str) -> Result<Vec<String>, LoadError> {
        if let Some(ids) = self.visited.get(base) {
            return Ok(ids.clone());
        }
        let packages = parse_dir(self.config, dir, base)?;
        let ids: Vec<String> = packages.iter().map(|p| p.identity.clone()).collect();
        for pkg in packages {
            self.packages.insert(pkg.identity.clone(), pkg);
        }
        self.visited.insert(base.to_string(), ids.clone());
        Ok(ids)
    }

    fn exact(&mut self, path: &str, variant: &Variant) -> Result<String, LoadError> {
        let wanted = variant.identity(path);
        let dir = if is_local(path) {
            Some(self.config.working_dir.join(path)).filter(|d| d.is_dir())
        } else {
            self.config.find_in_roots(path)
        };
        let dir = dir.ok_or_else(|| LoadError::PackageNotFound(wanted.clone()))?;

        let ids = self.visit(&dir, path)?;
        if ids.contains(&wanted) {
            Ok(wanted)
        } else {
            Err(LoadError::PackageNotFound(wanted))
        }
    }

    fn local_tree(&mut self, matcher: &PatternMatcher) -> Result<Vec<String>, LoadError> {
        let base = matcher.walk_base();
        let root = self.config.working_dir.join(base);
        let config = self.config;
        let mut found = Vec::new();

        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !skip_dir(config, &entry.file_name().to_string_lossy(), true)
            });
        for entry in walker.filter_map(Result::ok) {
            if !entry.file_type().is_dir() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&root)
                .map(slash_path)
                .unwrap_or_default();
            let name = if rel.is_empty() {
                match base.trim_end_matches('/') {
                    "" => ".".to_string(),
                    trimmed => trimmed.to_string(),
                }
            } else {
                format!("{base}{rel}")
            };
            if !matcher.matches(&name) {
                continue;
            }
            found.extend(self.visit(entry.path(), &name)?);
        }
        Ok(found)
    }

    fn trees(
        &mut self,
        matchers: &[(usize, PatternMatcher)],
        groups: &mut [Vec<String>],
    ) -> Result<(), LoadError> {
        let config = self.config;
        let mut have = FxHashSet::default();

        for root in &config.roots {
            let walker = WalkDir::new(root)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| {
                    if entry.depth() == 0 {
                        return true;
                    }
                    if !entry.file_type().is_dir()
                        || skip_dir(config, &entry.file_name().to_string_lossy(), false)
                    {
                        return false;
                    }
                    let name = tree_name(root, entry.path());
                    matchers.iter().any(|(_, m)| m.tree_can_match(&name))
                });

            for entry in walker.filter_map(Result::ok) {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    continue;
                }
                let name = tree_name(root, entry.path());
                if !have.insert(name.clone()) {
                    continue;
                }
                let hits: Vec<usize> = matchers
                    .iter()
                    .filter(|(_, m)| m.matches(&name))
                    .map(|(idx, _)| *idx)
                    .collect();
                if hits.is_empty() {
                    continue;
                }
                let ids = self.visit(entry.path(), &name)?;
                for idx in hits {
                    groups[idx].extend(ids.iter().cloned());
                }
            }
        }
        Ok(())
    }
}

fn tree_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).map(slash_path).unwrap_or_default()
}

fn skip_dir(config: &LoadConfig, elem: &str, local: bool) -> bool {
    let dot = elem.starts_with('.') && !(local && (elem == "." || elem == ".."));
    dot || elem.starts_with('_') || config.is_reserved(elem)
}

// ============================================================================
// DIRECTORY PARSING
// ============================================================================

/// Parse every source file of `dir` and split it into packages named
/// after `base`.
pub fn parse_dir(config: &LoadConfig, dir: &Path, base: &str) -> Result<Vec<RawPackage>, LoadError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| LoadError::io(dir, e))? {
        let entry = entry.map_err(|e| LoadError::io(dir, e))?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "go") && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let fset = Arc::new(FileSet::new());
    let parsed = paths
        .par_iter()
        .map(|path| -> Result<ParsedFile, LoadError> {
            let src = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
            let name = path.to_string_lossy();
            trace!(file = %name, "parsing");
            let file = parse_file(&fset, &name, &src)?;
            let buildable = config
                .build
                .matches_file(file.base_name(), &src, file.imports_foreign());
            Ok(ParsedFile { file, buildable })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut by_name: BTreeMap<SmolStr, Vec<ParsedFile>> = BTreeMap::new();
    for file in parsed {
        by_name
            .entry(file.file.package_name.name.clone())
            .or_default()
            .push(file);
    }

    let mut xtest = None;
    let mut candidates = Vec::new();
    let mut excluded = Vec::new();
    for (name, files) in by_name {
        if name.ends_with("_test") {
            if xtest.is_some() {
                return Err(LoadError::MultipleTestPackages {
                    dir: dir.to_path_buf(),
                });
            }
            xtest = Some((name, files));
        } else if files.iter().any(|f| f.buildable) {
            candidates.push((name, files));
        } else {
            excluded.push((name, files));
        }
    }
    if let [first, second, ..] = candidates.as_slice() {
        return Err(LoadError::AmbiguousPackage {
            dir: dir.to_path_buf(),
            first: first.0.to_string(),
            second: second.0.to_string(),
        });
    }
    let primary = match candidates.pop() {
        Some(primary) => Some(primary),
        None if excluded.len() == 1 => excluded.pop(),
        None => None,
    };

    let mut packages = Vec::new();
    if let Some((name, files)) = primary {
        let identity = Variant::Primary.identity(base);
        packages.push(make_package(config, dir, identity, name, &fset, files)?);
    }
    if let Some((name, files)) = xtest {
        let identity = Variant::ExternalTest.identity(base);
        packages.push(make_package(config, dir, identity, name, &fset, files)?);
    }
    for (name, files) in excluded {
        let identity = Variant::NoBuild(name.to_string()).identity(base);
        packages.push(make_package(config, dir, identity, name, &fset, files)?);
    }

    debug!(
        dir = %dir.display(),
        files = paths.len(),
        packages = packages.len(),
        "parsed directory"
    );
    Ok(packages)
}

/// Build one package, running the preprocessor over its buildable files
/// that import `"C"`.
fn make_package(
    config: &LoadConfig,
    dir: &Path,
    identity: String,
    name: SmolStr,
    fset: &Arc<FileSet>,
    mut files: Vec<ParsedFile>,
) -> Result<RawPackage, LoadError> {
    let foreign: Vec<String> = files
        .iter()
        .filter(|f| f.buildable && f.file.imports_foreign())
        .map(|f| f.file.base_name().to_string())
        .collect();

    if !foreign.is_empty() {
        let preprocessor = config
            .preprocessor
            .as_ref()
            .ok_or_else(|| LoadError::MissingPreprocessor(identity.clone()))?;
        let outputs = preprocessor
            .process(&PreprocessRequest {
                dir,
                identity: &identity,
                files: &foreign,
            })
            .map_err(|e| LoadError::preprocessor(identity.as_str(), e))?;
        debug!(%identity, outputs = outputs.len(), "preprocessed foreign imports");

        for output in outputs {
            let file_name = dir.join(&output.display_name);
            let file = parse_file(fset, &file_name.to_string_lossy(), &output.contents)?;
            match files
                .iter_mut()
                .find(|f| f.file.base_name() == output.display_name)
            {
                Some(slot) => {
                    slot.file = file;
                    slot.buildable = true;
                }
                None => files.push(ParsedFile {
                    file,
                    buildable: true,
                }),
            }
        }
    }

    Ok(RawPackage::new(identity, dir, name, fset.clone(), files))
}
