use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::parser::BuildContext;

use super::preprocess::{CommandPreprocessor, Preprocessor};

/// Directory names skipped by wildcard walks.
pub const DEFAULT_RESERVED_DIRS: &[&str] = &["testdata"];

/// Where and how packages are loaded.
#[derive(Clone)]
pub struct LoadConfig {
    /// Source roots searched for non-local patterns, in priority order.
    pub roots: Vec<PathBuf>,
    /// Base directory for local (`./`, `../`) patterns.
    pub working_dir: PathBuf,
    pub build: BuildContext,
    pub reserved_dirs: Vec<String>,
    pub preprocessor: Option<Arc<dyn Preprocessor>>,
}

impl fmt::Debug for LoadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadConfig")
            .field("roots", &self.roots)
            .field("working_dir", &self.working_dir)
            .field("build", &self.build)
            .field("reserved_dirs", &self.reserved_dirs)
            .field("preprocessor", &self.preprocessor.is_some())
            .finish()
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadConfig {
    /// No roots, the current directory as working directory and the host
    /// build context with foreign interop disabled.
    pub fn new() -> Self {
        Self {
            roots: Vec::new(),
            working_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            build: BuildContext::host().with_foreign_interop(false),
            reserved_dirs: DEFAULT_RESERVED_DIRS.iter().map(|s| s.to_string()).collect(),
            preprocessor: None,
        }
    }

    /// Configuration from the environment.
    ///
    /// - `PKGSCOPE_PATH` - source roots, separated like `PATH`; a root's
    ///   `src` directory is used when it exists
    /// - `PKGSCOPE_OS`, `PKGSCOPE_ARCH` - target platform
    /// - `PKGSCOPE_TAGS` - comma separated extra build tags
    /// - `PKGSCOPE_CGO` - `1` enables foreign interop through the command
    ///   preprocessor
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var_os(key))
    }

    fn from_vars(var: impl Fn(&str) -> Option<OsString>) -> Self {
        let text = |key: &str| var(key).and_then(|v| v.into_string().ok());
        let mut config = Self::new();

        if let Some(paths) = var("PKGSCOPE_PATH") {
            for root in env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()) {
                let src = root.join("src");
                config.roots.push(if src.is_dir() { src } else { root });
            }
        }

        let os = text("PKGSCOPE_OS").unwrap_or_else(|| config.build.os.clone());
        let arch = text("PKGSCOPE_ARCH").unwrap_or_else(|| config.build.arch.clone());
        let mut build = BuildContext::new(os, arch);

        if let Some(tags) = text("PKGSCOPE_TAGS") {
            build = build.with_tags(
                tags.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from),
            );
        }

        let interop = text("PKGSCOPE_CGO").is_some_and(|v| v.trim() == "1");
        config.build = build.with_foreign_interop(interop);
        if interop {
            config.preprocessor = Some(Arc::new(CommandPreprocessor::default()));
        }
        config
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    pub fn with_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.roots.extend(roots.into_iter().map(Into::into));
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_build_context(mut self, build: BuildContext) -> Self {
        self.build = build;
        self
    }

    pub fn with_reserved_dir(mut self, name: impl Into<String>) -> Self {
        self.reserved_dirs.push(name.into());
        self
    }

    pub fn with_preprocessor(mut self, preprocessor: Arc<dyn Preprocessor>) -> Self {
        self.preprocessor = Some(preprocessor);
        self
    }

    pub(crate) fn is_reserved(&self, name: &str) -> bool {
        self.reserved_dirs.iter().any(|r| r == name)
    }

    /// Directory of a non-local import path: the first root containing it.
    pub fn find_in_roots(&self, path: &str) -> Option<PathBuf> {
        self.roots
            .iter()
            .map(|root| root.join(path))
            .find(|dir| dir.is_dir())
    }

    /// The root `dir` lives under, with the slash-separated path inside it.
    pub fn root_relative(&self, dir: &Path) -> Option<(&Path, String)> {
        self.roots.iter().find_map(|root| {
            let rel = dir.strip_prefix(root).ok()?;
            Some((root.as_path(), slash_path(rel)))
        })
    }
}

/// `rel` with `/` separators.
pub(crate) fn slash_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let config = LoadConfig::new()
            .with_root("/a")
            .with_roots(["/b", "/c"])
            .with_working_dir("/w")
            .with_reserved_dir("fixtures");
        assert_eq!(config.roots.len(), 3);
        assert_eq!(config.working_dir, PathBuf::from("/w"));
        assert!(config.is_reserved("testdata"));
        assert!(config.is_reserved("fixtures"));
        assert!(!config.is_reserved("src"));
        assert!(config.preprocessor.is_none());
        assert!(!config.build.foreign_interop);
    }

    #[test]
    fn test_root_relative() {
        let config = LoadConfig::new().with_root("/src/one").with_root("/src/two");
        let (root, rel) = config
            .root_relative(Path::new("/src/two/example.com/lib"))
            .unwrap();
        assert_eq!(root, Path::new("/src/two"));
        assert_eq!(rel, "example.com/lib");
        assert!(config.root_relative(Path::new("/elsewhere")).is_none());
    }

    #[test]
    fn test_from_vars() {
        let roots = tempfile::tempdir().unwrap();
        std::fs::create_dir(roots.path().join("src")).unwrap();
        let plain = tempfile::tempdir().unwrap();
        let path = env::join_paths([roots.path(), plain.path()]).unwrap();

        let vars = move |key: &str| -> Option<OsString> {
            match key {
                "PKGSCOPE_PATH" => Some(path.clone()),
                "PKGSCOPE_OS" => Some("windows".into()),
                "PKGSCOPE_TAGS" => Some("extra, ,debug".into()),
                "PKGSCOPE_CGO" => Some("1".into()),
                _ => None,
            }
        };
        let config = LoadConfig::from_vars(vars);

        assert_eq!(config.roots, vec![roots.path().join("src"), plain.path().to_path_buf()]);
        assert_eq!(config.build.os, "windows");
        assert_eq!(config.build.arch, BuildContext::host().arch);
        assert_eq!(config.build.tags, vec!["extra", "debug"]);
        assert!(config.build.foreign_interop);
        assert!(config.preprocessor.is_some());
    }

    #[test]
    fn test_from_vars_defaults() {
        let config = LoadConfig::from_vars(|_| None);
        assert!(config.roots.is_empty());
        assert!(!config.build.foreign_interop);
        assert!(config.preprocessor.is_none());
    }
}
