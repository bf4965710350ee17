//! Positions, file sets and coordinate spaces.
//!
//! Every directory parsed during a load gets its own [`FileSet`]. A file set
//! hands out a contiguous range of [`Pos`] values to each file it contains,
//! so a `Pos` is only meaningful together with the file set (the
//! *coordinate space*) that produced it. Moving a position from one space to
//! another goes through [`FileSet::translate`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::RwLock;

/// A compact source position inside one [`FileSet`].
///
/// `Pos::NONE` (zero) never belongs to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pos(u32);

impl Pos {
    pub const NONE: Pos = Pos(0);

    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Position `delta` bytes further into the same file.
    pub fn advance(self, delta: u32) -> Self {
        Self(self.0 + delta)
    }
}

/// Half-open `[start, end)` range of positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    /// Whether the interval `[start, end]` lies inside this span.
    ///
    /// An empty interval sitting exactly on `self.end` is not contained.
    pub fn contains_interval(&self, start: Pos, end: Pos) -> bool {
        self.start <= start && end <= self.end && start < self.end.max(self.start.advance(1))
    }

    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Identifier of a coordinate space (one per [`FileSet`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpaceId(u32);

static NEXT_SPACE: AtomicU32 = AtomicU32::new(1);

impl SpaceId {
    fn fresh() -> Self {
        Self(NEXT_SPACE.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "space#{}", self.0)
    }
}

/// Human readable location (1-based line and column).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    pub filename: Arc<str>,
    pub offset: u32,
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// A location known only by file name.
    pub fn in_file(filename: impl Into<Arc<str>>) -> Self {
        Self {
            filename: filename.into(),
            offset: 0,
            line: 0,
            column: 0,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

/// One file registered in a [`FileSet`].
#[derive(Debug)]
pub struct FileEntry {
    name: Arc<str>,
    base: u32,
    size: u32,
    line_starts: Vec<u32>,
}

impl FileEntry {
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Positions from `base` up to and including `base + size` (EOF) belong to the file.
    pub fn contains(&self, pos: Pos) -> bool {
        pos.0 >= self.base && pos.0 <= self.base + self.size
    }

    pub fn pos(&self, offset: u32) -> Pos {
        Pos(self.base + offset.min(self.size))
    }

    pub fn offset(&self, pos: Pos) -> u32 {
        pos.0.saturating_sub(self.base)
    }

    pub fn position(&self, pos: Pos) -> Position {
        let offset = self.offset(pos);
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        Position {
            filename: self.name.clone(),
            offset,
            line: line_idx + 1,
            column: (offset - self.line_starts[line_idx]) as usize + 1,
        }
    }
}

#[derive(Debug)]
struct FileSetInner {
    next_base: u32,
    files: Vec<Arc<FileEntry>>,
}

/// A coordinate space: the set of files parsed together.
///
/// Shared between parser threads, so registration is internally
/// synchronized. Files are never removed.
#[derive(Debug)]
pub struct FileSet {
    space: SpaceId,
    inner: RwLock<FileSetInner>,
}

impl Default for FileSet {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSet {
    pub fn new() -> Self {
        Self {
            space: SpaceId::fresh(),
            inner: RwLock::new(FileSetInner {
                next_base: 1,
                files: Vec::new(),
            }),
        }
    }

    pub fn space(&self) -> SpaceId {
        self.space
    }

    /// Register a file and reserve `text.len() + 1` positions for it.
    pub fn add_file(&self, name: impl Into<Arc<str>>, text: &str) -> Arc<FileEntry> {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(idx, _)| idx as u32 + 1),
        );

        let mut inner = self.inner.write();
        let entry = Arc::new(FileEntry {
            name: name.into(),
            base: inner.next_base,
            size: text.len() as u32,
            line_starts,
        });
        inner.next_base += entry.size + 1;
        inner.files.push(entry.clone());
        entry
    }

    /// The file a position belongs to.
    pub fn file(&self, pos: Pos) -> Option<Arc<FileEntry>> {
        if !pos.is_valid() {
            return None;
        }
        self.inner
            .read()
            .files
            .iter()
            .find(|f| f.contains(pos))
            .cloned()
    }

    /// The file most recently registered under `name`. A substitute
    /// registered later shadows the original.
    pub fn file_by_name(&self, name: &str) -> Option<Arc<FileEntry>> {
        self.inner
            .read()
            .files
            .iter()
            .rev()
            .find(|f| &*f.name == name)
            .cloned()
    }

    pub fn files(&self) -> Vec<Arc<FileEntry>> {
        self.inner.read().files.clone()
    }

    pub fn position(&self, pos: Pos) -> Option<Position> {
        self.file(pos).map(|f| f.position(pos))
    }

    /// Move `pos` from the `src` coordinate space into `dst`.
    ///
    /// The file is matched by name, and the offset inside it is kept. Returns
    /// `None` when `pos` is not in `src`, when `dst` has no file of that
    /// name, or when the offset falls outside the destination file.
    pub fn translate(pos: Pos, src: &FileSet, dst: &FileSet) -> Option<Pos> {
        if src.space == dst.space {
            return src.file(pos).map(|_| pos);
        }
        let from = src.file(pos)?;
        let to = dst.file_by_name(from.name())?;
        let offset = from.offset(pos);
        (offset <= to.size).then(|| to.pos(offset))
    }
}
