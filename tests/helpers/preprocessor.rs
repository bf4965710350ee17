//! Preprocessor test double.

use std::path::PathBuf;

use parking_lot::Mutex;
use pkgscope::project::{PreprocessError, PreprocessRequest, PreprocessedFile, Preprocessor};

/// What one `process` call was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub dir: PathBuf,
    pub identity: String,
    pub files: Vec<String>,
}

/// Returns canned outputs and records every request.
#[derive(Default)]
pub struct FakePreprocessor {
    outputs: Vec<(String, String)>,
    fail_with: Option<String>,
    pub calls: Mutex<Vec<Recorded>>,
}

impl FakePreprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(mut self, display_name: &str, contents: &str) -> Self {
        self.outputs.push((display_name.to_string(), contents.to_string()));
        self
    }

    pub fn failing(stderr: &str) -> Self {
        Self {
            fail_with: Some(stderr.to_string()),
            ..Self::default()
        }
    }
}

impl Preprocessor for FakePreprocessor {
    fn process(&self, request: &PreprocessRequest<'_>) -> Result<Vec<PreprocessedFile>, PreprocessError> {
        self.calls.lock().push(Recorded {
            dir: request.dir.to_path_buf(),
            identity: request.identity.to_string(),
            files: request.files.to_vec(),
        });
        if let Some(stderr) = &self.fail_with {
            return Err(PreprocessError::Failed {
                command: "fake".to_string(),
                stderr: stderr.clone(),
            });
        }
        Ok(self
            .outputs
            .iter()
            .map(|(display_name, contents)| PreprocessedFile {
                display_name: display_name.clone(),
                contents: contents.clone(),
            })
            .collect())
    }
}
