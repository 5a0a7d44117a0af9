//! Source spans and the file table they index into.

use std::ops::Range;

/// A byte range into a single source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end);
        Span { start, end }
    }

    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn as_range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

/// The single source file a compilation unit was read from.
///
/// kirc only ever compiles one file per invocation (spec.md's CLI surface
/// takes one input file), so this is simpler than a multi-file source map:
/// it just owns the text and answers line/column queries for diagnostics.
pub struct SourceMap {
    pub name: String,
    pub content: String,
    line_starts: Vec<u32>,
}

impl SourceMap {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let mut line_starts = vec![0u32];
        for (i, b) in content.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self {
            name: name.into(),
            content,
            line_starts,
        }
    }

    pub fn snippet(&self, span: Span) -> &str {
        &self.content[span.as_range()]
    }

    /// 1-based (line, column) for a byte offset.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts[line_idx];
        (line_idx as u32 + 1, offset - line_start + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_merge() {
        let a = Span::new(2, 5);
        let b = Span::new(10, 20);
        assert_eq!(a.to(b), Span::new(2, 20));
    }

    #[test]
    fn line_col_tracks_newlines() {
        let sm = SourceMap::new("t.sy", "int a;\nint b;\n");
        assert_eq!(sm.line_col(0), (1, 1));
        assert_eq!(sm.line_col(7), (2, 1));
    }
}
