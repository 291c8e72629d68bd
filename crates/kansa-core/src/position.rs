//! Line/column to absolute offset mapping for diagnostic ranges.
//!
//! Issue positions reported by the rule engine are 1-based lines and
//! 1-based columns; the diagnostic overlay consumed by the host wants
//! 0-based byte offsets into the file content. The table built here pins
//! one convention for every dialect: entry *i* is the offset of the first
//! byte of line *i + 1*, with `table[0] == 0`.

/// Offsets of line starts, one entry per line plus a final entry one past
/// the phantom newline of the last line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineOffsetTable {
    offsets: Vec<usize>,
}

impl LineOffsetTable {
    /// Builds the table for the given text. Lines are split on `'\n'`;
    /// each boundary accounts for the consumed newline byte.
    pub fn build(text: &str) -> Self {
        let mut offsets = Vec::with_capacity(text.len() / 16 + 2);
        offsets.push(0);

        let mut pos = 0;
        for line in text.split('\n') {
            pos += line.len() + 1;
            offsets.push(pos);
        }

        Self { offsets }
    }

    /// Number of lines the table was built over.
    pub fn line_count(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Converts a 1-based line and 1-based column into a 0-based byte
    /// offset.
    ///
    /// A line beyond the table is a contract violation by the upstream
    /// engine and panics rather than clamping: a corrupted diagnostic
    /// range is worse than a crash.
    pub fn to_absolute(&self, line: u32, column: u32) -> usize {
        assert!(
            line >= 1 && column >= 1,
            "position {line}:{column} is not 1-based"
        );
        let index = (line - 1) as usize;
        match self.offsets.get(index) {
            Some(start) => start + (column as usize - 1),
            None => panic!(
                "line {line} is out of range for a {}-line file",
                self.line_count()
            ),
        }
    }

    /// Converts a 0-based byte offset back into a 1-based line and
    /// 1-based column.
    pub fn position_of(&self, offset: usize) -> (u32, u32) {
        let line = self.offsets.partition_point(|&start| start <= offset);
        let start = self.offsets[line - 1];
        (line as u32, (offset - start + 1) as u32)
    }
}
