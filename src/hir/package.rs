//! Checked packages and their queries.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::analyzer::{
    Analysis, ImportResolver, PackageScope, SemanticAnalyzer, Symbol, Type, TypeInfo,
};
use crate::base::{FileSet, Pos, Position};
use crate::syntax::ast::{Expr, Ident};
use crate::syntax::{Ancestors, Node, PackageSyntax, SourceFile, walk_all};

use super::lifetime::{Lifetime, LifetimeIndex};

/// A package after checking: syntax, semantic model and lifetime index.
///
/// Immutable apart from the specifier memo caches, which only grow.
pub struct ResolvedPackage {
    identity: String,
    dir: PathBuf,
    syntax: PackageSyntax,
    fset: Arc<FileSet>,
    scope: Arc<PackageScope>,
    info: TypeInfo,
    lifetimes: LifetimeIndex,
    importer: Arc<dyn ImportResolver>,
    analyzer: Arc<dyn SemanticAnalyzer>,
    pub(crate) type_cache: Mutex<FxHashMap<String, Type>>,
    pub(crate) object_cache: Mutex<FxHashMap<String, Symbol>>,
}

impl ResolvedPackage {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        identity: String,
        dir: PathBuf,
        syntax: PackageSyntax,
        fset: Arc<FileSet>,
        analysis: Analysis,
        lifetimes: LifetimeIndex,
        importer: Arc<dyn ImportResolver>,
        analyzer: Arc<dyn SemanticAnalyzer>,
    ) -> Self {
        Self {
            identity,
            dir,
            syntax,
            fset,
            scope: analysis.scope,
            info: analysis.info,
            lifetimes,
            importer,
            analyzer,
            type_cache: Mutex::new(FxHashMap::default()),
            object_cache: Mutex::new(FxHashMap::default()),
        }
    }

    /// Cache key: `path`, `path:xtest` or `path:nobuild(name)`.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Import path the package was checked as (same as the identity).
    pub fn path(&self) -> &str {
        self.scope.path()
    }

    pub fn name(&self) -> &str {
        &self.syntax.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn syntax(&self) -> &PackageSyntax {
        &self.syntax
    }

    pub fn fset(&self) -> &Arc<FileSet> {
        &self.fset
    }

    pub fn scope(&self) -> &Arc<PackageScope> {
        &self.scope
    }

    pub fn info(&self) -> &TypeInfo {
        &self.info
    }

    pub fn lifetimes(&self) -> &LifetimeIndex {
        &self.lifetimes
    }

    pub fn importer(&self) -> &Arc<dyn ImportResolver> {
        &self.importer
    }

    pub(crate) fn analyzer(&self) -> &Arc<dyn SemanticAnalyzer> {
        &self.analyzer
    }

    /// Files sorted by name.
    pub fn files(&self) -> &[SourceFile] {
        &self.syntax.files
    }

    pub fn file(&self, name: &str) -> Option<&SourceFile> {
        self.syntax.file(name)
    }

    pub fn type_of(&self, expr: &Expr) -> Option<&Type> {
        self.info.type_of(expr.id())
    }

    pub fn object_of(&self, ident: &Ident) -> Option<&Symbol> {
        self.info.object_of(ident.id)
    }

    pub fn lifetime_of(&self, symbol: &Symbol) -> Option<&Lifetime> {
        self.lifetimes.get(symbol)
    }

    pub fn position(&self, pos: Pos) -> Option<Position> {
        self.fset.position(pos)
    }

    /// Symbols with a lifetime record matching `pred`, in position order.
    pub fn search_objects(&self, mut pred: impl FnMut(&Symbol) -> bool) -> Vec<Symbol> {
        self.lifetimes
            .symbols()
            .filter(|sym| pred(sym))
            .cloned()
            .collect()
    }

    /// Every symbol with a lifetime record plus every implicit symbol, in
    /// position order.
    pub fn iterate_objects(&self, mut f: impl FnMut(&Symbol)) {
        let mut all: Vec<&Symbol> = self.lifetimes.symbols().collect();
        all.extend(
            self.info
                .implicits
                .values()
                .filter(|sym| self.lifetimes.get(sym).is_none()),
        );
        all.sort_by_key(|sym| {
            self.lifetimes
                .get(sym)
                .map(|l| l.first)
                .unwrap_or_else(|| sym.pos())
        });
        all.into_iter().for_each(|sym| f(sym));
    }

    /// Visit every node of the package with its ancestors.
    pub fn walk<'a>(&'a self, f: impl FnMut(Node<'a>, &Ancestors<'a>)) {
        walk_all(Node::Package(&self.syntax), f);
    }
}

impl fmt::Debug for ResolvedPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedPackage")
            .field("identity", &self.identity)
            .field("dir", &self.dir)
            .field("files", &self.syntax.files.len())
            .field("symbols", &self.lifetimes.len())
            .finish()
    }
}

impl fmt::Display for ResolvedPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity)
    }
}

/// The result of one load: packages grouped per pattern.
#[derive(Debug, Clone, Default)]
pub struct Packages(Vec<Arc<ResolvedPackage>>);

impl Packages {
    pub fn new(packages: Vec<Arc<ResolvedPackage>>) -> Self {
        Self(packages)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<ResolvedPackage>> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<Arc<ResolvedPackage>> {
        self.0
    }

    /// The package with identity `identity`.
    pub fn get(&self, identity: &str) -> Option<&Arc<ResolvedPackage>> {
        self.0.iter().find(|p| p.identity() == identity)
    }

    /// Walk every package's tree in order.
    pub fn walk<'a>(&'a self, mut f: impl FnMut(&'a ResolvedPackage, Node<'a>, &Ancestors<'a>)) {
        for pkg in &self.0 {
            pkg.walk(|node, ancestors| f(pkg, node, ancestors));
        }
    }

    /// Every file of every package, by name.
    pub fn iterate_files<'a>(&'a self, mut f: impl FnMut(&'a str, &'a SourceFile)) {
        for pkg in &self.0 {
            for file in pkg.files() {
                f(&file.name, file);
            }
        }
    }
}

impl std::ops::Deref for Packages {
    type Target = [Arc<ResolvedPackage>];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl IntoIterator for Packages {
    type Item = Arc<ResolvedPackage>;
    type IntoIter = std::vec::IntoIter<Arc<ResolvedPackage>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Packages {
    type Item = &'a Arc<ResolvedPackage>;
    type IntoIter = std::slice::Iter<'a, Arc<ResolvedPackage>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
