//! Source spans
//!
//! Lines are 0-based; columns are UTF-8 byte offsets within the line.

use serde::{Deserialize, Serialize};

/// A half-open region of source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Whole-line span covering [start_line, end_line]
    pub fn lines(start_line: u32, end_line: u32) -> Self {
        Self::new(start_line, 0, end_line, u32::MAX)
    }

    /// start ≤ end, column-inclusive on the same line
    pub fn is_well_formed(&self) -> bool {
        self.start_line < self.end_line
            || (self.start_line == self.end_line && self.start_col <= self.end_col)
    }

    pub fn line_count(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    pub fn contains_line(&self, line: u32) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    /// True when `other` lies entirely within `self` (line granularity)
    pub fn encloses(&self, other: &Span) -> bool {
        self.start_line <= other.start_line && other.end_line <= self.end_line
    }

    /// Canonical text used when hashing a span into a stable ID
    pub fn canonical(&self) -> String {
        format!(
            "{}:{}-{}:{}",
            self.start_line, self.start_col, self.end_line, self.end_col
        )
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}-L{}", self.start_line, self.end_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formedness() {
        assert!(Span::new(1, 0, 3, 0).is_well_formed());
        assert!(Span::new(2, 4, 2, 4).is_well_formed());
        assert!(!Span::new(3, 0, 1, 0).is_well_formed());
        assert!(!Span::new(2, 8, 2, 4).is_well_formed());
    }

    #[test]
    fn enclosure_is_line_granular() {
        let outer = Span::lines(10, 20);
        assert!(outer.encloses(&Span::lines(12, 18)));
        assert!(outer.encloses(&Span::lines(10, 20)));
        assert!(!outer.encloses(&Span::lines(9, 15)));
        assert!(!outer.encloses(&Span::lines(15, 21)));
    }
}
