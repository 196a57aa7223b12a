/// A byte cursor over one parameter line.
///
/// Positions are byte offsets into `s`; every token boundary the parameter
/// tokenizer stops at is ASCII, so offsets always fall on char boundaries.
#[derive(Clone)]
pub struct Cursor<'a> {
    /// The string being tokenized.
    pub s: &'a str,
    /// Current index into `s`.
    pub i: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    /// Returns true if at end of string.
    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    /// Peeks at the current byte without advancing.
    pub fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i).copied()
    }

    /// Checks if the remaining input starts with the given byte pattern.
    pub fn starts_with(&self, pat: &[u8]) -> bool {
        self.s.as_bytes()[self.i..].starts_with(pat)
    }

    /// Advances by one byte, returning the consumed byte.
    pub fn bump(&mut self) -> Option<u8> {
        let b = self.s.as_bytes().get(self.i).copied()?;
        self.i += 1;
        Some(b)
    }

    /// Advances by `n` bytes.
    pub fn bump_n(&mut self, n: usize) {
        self.i += n;
    }

    /// Consumes bytes while `pred` holds and returns the consumed slice.
    pub fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.i;
        while let Some(b) = self.peek()
            && pred(b)
        {
            self.i += 1;
        }
        &self.s[start..self.i]
    }

    /// Skips ASCII whitespace and returns how many bytes were skipped.
    pub fn skip_whitespace(&mut self) -> usize {
        self.take_while(|b| b.is_ascii_whitespace()).len()
    }
}
