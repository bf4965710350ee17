//! Checking code snippets, mostly for testing static checks.

use std::fmt;
use std::fs;
use std::sync::Arc;

use crate::analyzer::ImportResolver;
use crate::base::{FileSet, Position};
use crate::error::LoadError;
use crate::hir::{Loader, ResolvedPackage, check_package};
use crate::parser::parse_file;
use crate::project::{DirOverrideImporter, RawPackage};

/// File name snippets are checked under.
pub const FAKE_FILE_NAME: &str = "fake_package.go";

/// One problem reported by a [`StaticCheck`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFinding {
    pub position: Option<Position>,
    pub message: String,
}

impl CheckFinding {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            position: None,
            message: message.into(),
        }
    }

    pub fn at(position: Position, message: impl Into<String>) -> Self {
        Self {
            position: Some(position),
            message: message.into(),
        }
    }
}

impl fmt::Display for CheckFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Some(position) => write!(f, "{position}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// A static analysis over one checked package.
pub trait StaticCheck {
    fn check(&self, pkg: &ResolvedPackage) -> Vec<CheckFinding>;
}

impl<F> StaticCheck for F
where
    F: Fn(&ResolvedPackage) -> Vec<CheckFinding>,
{
    fn check(&self, pkg: &ResolvedPackage) -> Vec<CheckFinding> {
        self(pkg)
    }
}

impl Loader {
    /// Check `code` as the single file of package `fake/<name>`.
    ///
    /// The snippet is written to a scratch directory, but imports resolve
    /// as if it lived in the working directory. The result is not cached.
    pub fn eval_package(&self, code: &str) -> Result<Arc<ResolvedPackage>, LoadError> {
        let scratch = tempfile::Builder::new()
            .prefix("pkgscope_fake_package")
            .tempdir()
            .map_err(|e| LoadError::io(std::env::temp_dir(), e))?;
        let path = scratch.path().join(FAKE_FILE_NAME);
        fs::write(&path, code).map_err(|e| LoadError::io(&path, e))?;

        let fset = Arc::new(FileSet::new());
        let file = parse_file(&fset, &path.to_string_lossy(), code)?;
        // The foreign package is faked, so files importing it still count.
        let build = self.config().build.clone().with_foreign_interop(true);
        let buildable = build.matches_file(file.base_name(), code, file.imports_foreign());
        let identity = format!("fake/{}", file.package_name.name);
        let raw = RawPackage::assemble(identity, scratch.path(), fset, vec![(file, buildable)]);

        let importer: Arc<dyn ImportResolver> = Arc::new(
            DirOverrideImporter::new(self.importer())
                .with_override(scratch.path(), &self.config().working_dir),
        );
        let pkg = check_package(raw, self.analyzer(), importer)?;
        Ok(Arc::new(pkg))
    }

    /// Parse `code` as [`FAKE_FILE_NAME`] in the working directory, check it
    /// and run `check` over the result.
    pub fn eval_test<C>(&self, check: &C, code: &str) -> Result<Vec<CheckFinding>, LoadError>
    where
        C: StaticCheck + ?Sized,
    {
        let fset = Arc::new(FileSet::new());
        let file = parse_file(&fset, FAKE_FILE_NAME, code)?;
        let identity = format!("fake/{}", file.package_name.name);
        let raw = RawPackage::assemble(identity, &self.config().working_dir, fset, vec![(file, true)]);

        let pkg = check_package(raw, self.analyzer(), self.importer())?;
        Ok(check.check(&pkg))
    }
}
