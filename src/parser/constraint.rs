//! Build constraints: which files take part in a build.
//!
//! A file is buildable when its name suffix (`_linux`, `_amd64`,
//! `_windows_arm64`), its header constraint lines (`//go:build` or legacy
//! `// +build`) and its foreign imports all agree with a [`BuildContext`].

use std::env;

/// Target platform and tags that decide buildability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub os: String,
    pub arch: String,
    /// Extra tags satisfied in addition to `os`, `arch` and release tags.
    pub tags: Vec<String>,
    /// Whether files importing the foreign-interop package take part.
    pub foreign_interop: bool,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::host()
    }
}

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "ppc", "ppc64", "ppc64le", "riscv", "riscv64", "s390", "s390x", "sparc",
    "sparc64", "wasm",
];

impl BuildContext {
    /// The platform this process runs on, with foreign interop enabled.
    pub fn host() -> Self {
        let os = match env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        let arch = match env::consts::ARCH {
            "x86_64" => "amd64",
            "x86" => "386",
            "aarch64" => "arm64",
            "powerpc64" => "ppc64",
            other => other,
        };
        Self {
            os: os.to_string(),
            arch: arch.to_string(),
            tags: Vec::new(),
            foreign_interop: true,
        }
    }

    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
            tags: Vec::new(),
            foreign_interop: true,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_foreign_interop(mut self, enabled: bool) -> Self {
        self.foreign_interop = enabled;
        self
    }

    /// Whether a single tag is satisfied.
    pub fn matches_tag(&self, tag: &str) -> bool {
        if tag == self.os || tag == self.arch || self.tags.iter().any(|t| t == tag) {
            return true;
        }
        match tag {
            "cgo" => self.foreign_interop,
            "unix" => UNIX_OS.contains(&self.os.as_str()),
            // Every release tag is satisfied.
            _ => tag
                .strip_prefix("go1.")
                .is_some_and(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit())),
        }
    }

    /// Whether a `_GOOS` / `_GOARCH` / `_GOOS_GOARCH` file name suffix is satisfied.
    pub fn matches_file_name(&self, name: &str) -> bool {
        let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
        let stem = base.strip_suffix(".go").unwrap_or(base);
        let stem = stem.strip_suffix("_test").unwrap_or(stem);
        let Some(idx) = stem.find('_') else {
            return true;
        };
        let parts: Vec<&str> = stem[idx..].split('_').collect();
        let n = parts.len();
        if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.os_matches(parts[n - 2]) && self.arch == parts[n - 1];
        }
        if n >= 1 {
            if KNOWN_OS.contains(&parts[n - 1]) {
                return self.os_matches(parts[n - 1]);
            }
            if KNOWN_ARCH.contains(&parts[n - 1]) {
                return self.arch == parts[n - 1];
            }
        }
        true
    }

    fn os_matches(&self, os: &str) -> bool {
        self.os == os || (os == "linux" && self.os == "android") || (os == "darwin" && self.os == "ios")
    }

    /// Whether the constraint lines in the file header are satisfied.
    ///
    /// A malformed `//go:build` line excludes the file.
    pub fn matches_header(&self, src: &str) -> bool {
        let header = Header::scan(src);
        if let Some(expr) = header.go_build {
            return match parse_expr(expr) {
                Some(expr) => expr.eval(&|tag| self.matches_tag(tag)),
                None => false,
            };
        }
        header
            .plus_build
            .iter()
            .all(|line| self.matches_plus_build(line))
    }

    fn matches_plus_build(&self, line: &str) -> bool {
        line.split_whitespace().any(|option| {
            option.split(',').all(|term| match term.strip_prefix('!') {
                Some(tag) => !tag.is_empty() && !self.matches_tag(tag),
                None => self.matches_tag(term),
            })
        })
    }

    /// Full buildability check for one file.
    pub fn matches_file(&self, name: &str, src: &str, imports_foreign: bool) -> bool {
        if imports_foreign && !self.foreign_interop {
            return false;
        }
        self.matches_file_name(name) && self.matches_header(src)
    }
}

// ============================================================================
// HEADER SCANNING
// ============================================================================

#[derive(Debug, Default)]
struct Header<'a> {
    go_build: Option<&'a str>,
    plus_build: Vec<&'a str>,
}

impl<'a> Header<'a> {
    /// Constraint lines in the comment block before the `package` clause.
    fn scan(src: &'a str) -> Self {
        let mut header = Header::default();
        let mut in_block = false;
        for line in src.lines() {
            let line = line.trim();
            if in_block {
                if line.contains("*/") {
                    in_block = false;
                }
                continue;
            }
            if line.is_empty() {
                continue;
            }
            if line.starts_with("/*") {
                in_block = !line.contains("*/");
                continue;
            }
            let Some(comment) = line.strip_prefix("//") else {
                break;
            };
            if let Some(expr) = comment.strip_prefix("go:build") {
                if header.go_build.is_none() {
                    header.go_build = Some(expr.trim());
                }
            } else if let Some(rest) = comment.trim_start().strip_prefix("+build") {
                if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                    header.plus_build.push(rest.trim());
                }
            }
        }
        header
    }
}

// ============================================================================
// BUILD EXPRESSIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum BuildExpr {
    Tag(String),
    Not(Box<BuildExpr>),
    And(Box<BuildExpr>, Box<BuildExpr>),
    Or(Box<BuildExpr>, Box<BuildExpr>),
}

impl BuildExpr {
    fn eval(&self, tag_ok: &dyn Fn(&str) -> bool) -> bool {
        match self {
            BuildExpr::Tag(tag) => tag_ok(tag),
            BuildExpr::Not(x) => !x.eval(tag_ok),
            BuildExpr::And(x, y) => x.eval(tag_ok) && y.eval(tag_ok),
            BuildExpr::Or(x, y) => x.eval(tag_ok) || y.eval(tag_ok),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BuildToken {
    Tag(String),
    Not,
    And,
    Or,
    LParen,
    RParen,
}

fn lex_expr(src: &str) -> Option<Vec<BuildToken>> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        match c {
            ' ' | '\t' => {}
            '!' => tokens.push(BuildToken::Not),
            '(' => tokens.push(BuildToken::LParen),
            ')' => tokens.push(BuildToken::RParen),
            '&' | '|' => {
                if chars.next().map(|(_, next)| next) != Some(c) {
                    return None;
                }
                tokens.push(if c == '&' { BuildToken::And } else { BuildToken::Or });
            }
            c if c.is_alphanumeric() || c == '_' || c == '.' => {
                let mut end = idx + c.len_utf8();
                while let Some(&(next_idx, next)) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' || next == '.' {
                        end = next_idx + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(BuildToken::Tag(src[idx..end].to_string()));
            }
            _ => return None,
        }
    }
    Some(tokens)
}

fn parse_expr(src: &str) -> Option<BuildExpr> {
    let tokens = lex_expr(src)?;
    let mut parser = ExprParser { tokens, pos: 0 };
    let expr = parser.or()?;
    (parser.pos == parser.tokens.len()).then_some(expr)
}

struct ExprParser {
    tokens: Vec<BuildToken>,
    pos: usize,
}

impl ExprParser {
    fn eat(&mut self, token: &BuildToken) -> bool {
        if self.tokens.get(self.pos) == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Option<BuildExpr> {
        let mut x = self.and()?;
        while self.eat(&BuildToken::Or) {
            x = BuildExpr::Or(Box::new(x), Box::new(self.and()?));
        }
        Some(x)
    }

    fn and(&mut self) -> Option<BuildExpr> {
        let mut x = self.not()?;
        while self.eat(&BuildToken::And) {
            x = BuildExpr::And(Box::new(x), Box::new(self.not()?));
        }
        Some(x)
    }

    fn not(&mut self) -> Option<BuildExpr> {
        if self.eat(&BuildToken::Not) {
            return Some(BuildExpr::Not(Box::new(self.not()?)));
        }
        if self.eat(&BuildToken::LParen) {
            let x = self.or()?;
            return self.eat(&BuildToken::RParen).then_some(x);
        }
        match self.tokens.get(self.pos) {
            Some(BuildToken::Tag(tag)) => {
                let tag = tag.clone();
                self.pos += 1;
                Some(BuildExpr::Tag(tag))
            }
            _ => None,
        }
    }
}
