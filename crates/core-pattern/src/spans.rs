//! Highlight spans: matches broken into per-line column ranges.
//!
//! Line-oriented highlighters paint one rectangle per (line, column range);
//! a match crossing a newline therefore becomes several spans. Columns are
//! character offsets within the line, half-open. Line terminators belong to
//! no column: a match covering only `\n` yields a zero-width span at the end
//! of its line, the same as an empty match.

use crate::Match;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineSpan {
    pub line: usize,
    pub start_col: usize,
    pub end_col: usize,
    pub match_number: usize,
}

impl LineSpan {
    pub fn is_empty(&self) -> bool {
        self.start_col == self.end_col
    }
}

pub fn line_spans(text: &str, matches: &[Match]) -> Vec<LineSpan> {
    // Char offset where each line starts; a trailing sentinel closes the last line.
    let mut starts = vec![0usize];
    let mut total = 0usize;
    for ch in text.chars() {
        total += 1;
        if ch == '\n' {
            starts.push(total);
        }
    }
    let line_end = |line: usize| -> usize {
        match starts.get(line + 1) {
            Some(next) => next - 1,
            None => total,
        }
    };
    let line_of = |offset: usize| -> usize { starts.partition_point(|&s| s <= offset).saturating_sub(1) };

    let mut out = Vec::new();
    for m in matches {
        let start = m.range.start.min(total);
        let end = m.range.end.min(total).max(start);
        let first = line_of(start);
        if start == end {
            out.push(LineSpan {
                line: first,
                start_col: start - starts[first],
                end_col: start - starts[first],
                match_number: m.number,
            });
            continue;
        }
        let last = line_of(end - 1);
        for line in first..=last {
            let ls = starts[line];
            let le = line_end(line);
            let s = start.max(ls).min(le);
            let e = end.min(le).max(s);
            out.push(LineSpan {
                line,
                start_col: s - ls,
                end_col: e - ls,
                match_number: m.number,
            });
        }
    }
    out
}
