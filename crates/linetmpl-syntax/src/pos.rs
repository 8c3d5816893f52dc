//! Source location tracking for lexer items and parse-tree nodes.

/// A position in template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Pos {
    /// Byte offset (0-indexed).
    pub offset: usize,
    /// Line number (1-indexed).
    pub line: usize,
}

impl Pos {
    /// Create a new position.
    #[must_use]
    pub const fn new(offset: usize, line: usize) -> Self {
        Self { offset, line }
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.line, self.offset)
    }
}

/// Maps byte offsets to line numbers.
#[derive(Debug, Clone)]
pub(crate) struct LineIndex {
    newlines: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(source: &str) -> Self {
        let newlines = source
            .bytes()
            .enumerate()
            .filter_map(|(i, b)| (b == b'\n').then_some(i))
            .collect();
        Self { newlines }
    }

    /// Position of a byte offset. A newline belongs to the line it ends.
    pub(crate) fn pos(&self, offset: usize) -> Pos {
        let line = self.newlines.partition_point(|&nl| nl < offset) + 1;
        Pos::new(offset, line)
    }
}
