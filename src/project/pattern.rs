//! Classification of requested package paths.
//!
//! A request is one of:
//!
//! - an exact package path, optionally suffixed with `:xtest` or
//!   `:nobuild(name)` to select a variant of the directory
//! - a tree wildcard such as `example.com/lib/...`, walked under every
//!   source root
//! - a local wildcard such as `./cmd/...`, walked under the working
//!   directory

use regex::Regex;

/// Which package of a directory an exact pattern asks for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Variant {
    Primary,
    ExternalTest,
    NoBuild(String),
}

impl Variant {
    /// The identity of this variant of the package at `path`.
    pub fn identity(&self, path: &str) -> String {
        match self {
            Variant::Primary => path.to_string(),
            Variant::ExternalTest => format!("{path}:xtest"),
            Variant::NoBuild(name) => format!("{path}:nobuild({name})"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Pattern {
    Exact { path: String, variant: Variant },
    Tree(PatternMatcher),
    Local(PatternMatcher),
}

impl Pattern {
    pub fn parse(raw: &str) -> Self {
        if raw.contains("...") {
            let matcher = PatternMatcher::new(raw);
            return if is_local(raw) {
                Pattern::Local(matcher)
            } else {
                Pattern::Tree(matcher)
            };
        }

        if let Some(path) = raw.strip_suffix(":xtest") {
            return Pattern::Exact {
                path: path.to_string(),
                variant: Variant::ExternalTest,
            };
        }
        if let Some(rest) = raw.strip_suffix(')')
            && let Some((path, name)) = rest.split_once(":nobuild(")
        {
            return Pattern::Exact {
                path: path.to_string(),
                variant: Variant::NoBuild(name.to_string()),
            };
        }
        Pattern::Exact {
            path: raw.to_string(),
            variant: Variant::Primary,
        }
    }
}

/// Whether `path` is relative to the working directory.
pub fn is_local(path: &str) -> bool {
    path == "." || path == ".." || path.starts_with("./") || path.starts_with("../")
}

/// Predicates for one wildcard pattern.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: String,
    regex: Option<Regex>,
    /// Text before the first `...`.
    prefix: String,
    wildcard: bool,
}

impl PatternMatcher {
    pub fn new(pattern: &str) -> Self {
        // `...` matches any string; a trailing `/...` also matches the
        // directory itself, so `a/...` matches `a`.
        let mut re = regex::escape(pattern).replace(r"\.\.\.", ".*");
        if let Some(stripped) = re.strip_suffix("/.*") {
            re = format!("{stripped}(/.*)?");
        }
        let regex = Regex::new(&format!("^{re}$")).ok();

        let (prefix, wildcard) = match pattern.find("...") {
            Some(idx) => (pattern[..idx].to_string(), true),
            None => (pattern.to_string(), false),
        };
        Self {
            pattern: pattern.to_string(),
            regex,
            prefix,
            wildcard,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(name))
    }

    /// Whether some directory at or below `name` might match.
    pub fn tree_can_match(&self, name: &str) -> bool {
        (name.len() <= self.prefix.len() && has_path_prefix(&self.prefix, name))
            || (self.wildcard && name.starts_with(&self.prefix))
    }

    /// The directory a walk for this pattern starts from, as written in the
    /// pattern: everything up to the last `/` before the first `...`.
    pub fn walk_base(&self) -> &str {
        match self.prefix.rfind('/') {
            Some(idx) => &self.prefix[..=idx],
            None => "",
        }
    }
}

/// Whether `s` equals `prefix` or continues it after a `/`.
fn has_path_prefix(s: &str, prefix: &str) -> bool {
    if s.len() == prefix.len() {
        return s == prefix;
    }
    if !s.starts_with(prefix) {
        return false;
    }
    prefix.ends_with('/') || s.as_bytes()[prefix.len()] == b'/'
}
