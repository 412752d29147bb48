use std::ops::Range;

/// One match occurrence produced by a single "find all" pass.
///
/// `range` is half-open `[start, end)` in character (Unicode scalar) offsets,
/// the unit text fields and selections use. `byte_range` is the engine's
/// native half-open byte span, kept for slicing the source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Match {
    /// 1-based ordinal within its pass.
    pub number: usize,
    pub text: String,
    pub range: Range<usize>,
    pub byte_range: Range<usize>,
    /// Capture groups 1..n; groups that did not participate are empty.
    pub groups: Vec<String>,
}

impl Match {
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn char_len(&self) -> usize {
        self.range.len()
    }
}

/// Incremental byte -> char offset translation.
///
/// Matches arrive in ascending order, so each conversion only scans the text
/// between the previous offset and the requested one.
pub(crate) struct CharCursor<'t> {
    text: &'t str,
    byte: usize,
    chars: usize,
}

impl<'t> CharCursor<'t> {
    pub(crate) fn new(text: &'t str) -> Self {
        Self {
            text,
            byte: 0,
            chars: 0,
        }
    }

    pub(crate) fn char_offset(&mut self, byte: usize) -> usize {
        if byte < self.byte {
            self.byte = 0;
            self.chars = 0;
        }
        self.chars += self.text[self.byte..byte].chars().count();
        self.byte = byte;
        self.chars
    }

    pub(crate) fn make_match(
        &mut self,
        number: usize,
        start: usize,
        end: usize,
        groups: Vec<String>,
    ) -> Match {
        let char_start = self.char_offset(start);
        let char_end = self.char_offset(end);
        Match {
            number,
            text: self.text[start..end].to_string(),
            range: char_start..char_end,
            byte_range: start..end,
            groups,
        }
    }
}
