use text_size::TextSize;

/// A line/column pair produced by [`LineIndex`].
///
/// Both components are 1-based, matching the `#line` directives emitted
/// into generated code and the line numbers reported in parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

/// Maps byte offsets to line/column positions.
///
/// Built once per source text; lookups are binary searches over the
/// precomputed line-start table.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line
    line_starts: Vec<TextSize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::new(0)];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(TextSize::new(i as u32 + 1));
            }
        }
        Self { line_starts }
    }

    /// Line/column of a byte offset. Offsets past the end map to the last line.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let col = u32::from(offset) - u32::from(self.line_starts[line]);
        LineCol {
            line: line as u32 + 1,
            col: col + 1,
        }
    }

    /// 1-based line number of a byte offset.
    pub fn line(&self, offset: TextSize) -> u32 {
        self.line_col(offset).line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_single_line() {
        let index = LineIndex::new("abc");
        assert_eq!(index.line_col(TextSize::new(0)), LineCol { line: 1, col: 1 });
        assert_eq!(index.line_col(TextSize::new(2)), LineCol { line: 1, col: 3 });
    }

    #[test]
    fn test_line_index_multi_line() {
        let index = LineIndex::new("ab\ncd\n");
        assert_eq!(index.line(TextSize::new(0)), 1);
        assert_eq!(index.line(TextSize::new(3)), 2);
        assert_eq!(index.line_col(TextSize::new(4)), LineCol { line: 2, col: 2 });
        assert_eq!(index.line(TextSize::new(6)), 3);
    }
}
