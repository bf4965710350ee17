//! Foreign-interop preprocessing.
//!
//! Files importing the `"C"` pseudo-package cannot be checked as written.
//! A [`Preprocessor`] rewrites them into plain host source: one substitute
//! per input file plus extra generated files.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

/// Input of one preprocessing run.
#[derive(Debug, Clone)]
pub struct PreprocessRequest<'a> {
    /// Package directory; the tool runs inside it.
    pub dir: &'a Path,
    pub identity: &'a str,
    /// Base names of the buildable files importing `"C"`.
    pub files: &'a [String],
}

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessedFile {
    /// Name the file is shown under. An output whose display name equals
    /// an input base name replaces that input.
    pub display_name: String,
    pub contents: String,
}

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("could not run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} failed: {stderr}")]
    Failed { command: String, stderr: String },

    #[error("missing output {}: {source}", path.display())]
    MissingOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Turns files importing `"C"` into plain host source.
pub trait Preprocessor: Send + Sync {
    fn process(&self, request: &PreprocessRequest<'_>) -> Result<Vec<PreprocessedFile>, PreprocessError>;
}

/// Display name of the generated declarations file.
pub const FOREIGN_TYPES_DISPLAY: &str = "C";

const FOREIGN_TYPES_FILE: &str = "_cgo_gotypes.go";

static PATH_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/\\:]").expect("Invalid path separator regex"));

/// Output name the tool uses for input `file`.
pub fn rewritten_name(file: &str) -> String {
    let stem = file.strip_suffix("go").unwrap_or(file);
    format!("{}cgo1.go", PATH_SEPARATORS.replace_all(stem, "_"))
}

/// Runs an external tool: `<program> <args..> -objdir <tmp> -- <files..>`.
#[derive(Debug, Clone)]
pub struct CommandPreprocessor {
    program: String,
    args: Vec<String>,
}

impl Default for CommandPreprocessor {
    fn default() -> Self {
        Self::new("go", ["tool", "cgo"])
    }
}

impl CommandPreprocessor {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Preprocessor for CommandPreprocessor {
    fn process(&self, request: &PreprocessRequest<'_>) -> Result<Vec<PreprocessedFile>, PreprocessError> {
        let prefix = format!("{}_C", request.identity.replace(['/', '\\', ':'], "_"));
        let objdir = tempfile::Builder::new().prefix(&prefix).tempdir()?;
        let command = self.command_line();
        debug!(identity = request.identity, %command, "running preprocessor");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("-objdir")
            .arg(objdir.path())
            .arg("--")
            .args(request.files)
            .current_dir(request.dir)
            .output()
            .map_err(|source| PreprocessError::Spawn {
                command: command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(PreprocessError::Failed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let read = |name: &str| {
            let path = objdir.path().join(name);
            std::fs::read_to_string(&path).map_err(|source| PreprocessError::MissingOutput { path, source })
        };

        let mut out = vec![PreprocessedFile {
            display_name: FOREIGN_TYPES_DISPLAY.to_string(),
            contents: read(FOREIGN_TYPES_FILE)?,
        }];
        for file in request.files {
            out.push(PreprocessedFile {
                display_name: file.clone(),
                contents: read(&rewritten_name(file))?,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewritten_name() {
        assert_eq!(rewritten_name("main.go"), "main.cgo1.go");
        assert_eq!(rewritten_name("sub/x:y.go"), "sub_x_y.cgo1.go");
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let pre = CommandPreprocessor::new("pkgscope-no-such-tool", Vec::<String>::new());
        let files = vec!["a.go".to_string()];
        let err = pre
            .process(&PreprocessRequest {
                dir: dir.path(),
                identity: "example.com/a",
                files: &files,
            })
            .unwrap_err();
        assert!(matches!(err, PreprocessError::Spawn { .. }), "{err}");
    }
}
