//! Partial masking for scalar text.
//!
//! [`PartialMask`] keeps a few leading or trailing characters visible and
//! masks the middle. It operates on Unicode scalar values.

/// Default character used to mask hidden characters.
pub const MASK_CHAR: char = '*';

/// Keeps selected segments of a scalar's text visible while masking the rest.
///
/// If the configuration keeps the entire value visible, the whole value is
/// masked instead: a value short enough to be fully revealed is too short to
/// be partially hidden.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartialMask {
    /// Number of leading characters to keep visible.
    keep_first: usize,
    /// Number of trailing characters to keep visible.
    keep_last: usize,
    /// Symbol used to mask the middle.
    mask_char: char,
}

impl PartialMask {
    /// Keeps `keep_first` leading and `keep_last` trailing characters.
    #[must_use]
    pub fn new(keep_first: usize, keep_last: usize) -> Self {
        Self {
            keep_first,
            keep_last,
            mask_char: MASK_CHAR,
        }
    }

    /// Keeps only the last `keep_last` characters.
    #[must_use]
    pub fn last(keep_last: usize) -> Self {
        Self::new(0, keep_last)
    }

    /// Keeps only the first `keep_first` characters.
    #[must_use]
    pub fn first(keep_first: usize) -> Self {
        Self::new(keep_first, 0)
    }

    /// Uses a specific masking character.
    #[must_use]
    pub fn with_mask_char(mut self, mask_char: char) -> Self {
        self.mask_char = mask_char;
        self
    }

    pub fn keep_first(&self) -> usize {
        self.keep_first
    }

    pub fn keep_last(&self) -> usize {
        self.keep_last
    }

    /// Applies the mask to `text`.
    ///
    /// Returns `None` for empty text, which has nothing to keep; callers
    /// substitute the fixed mask token.
    pub fn apply_to(&self, text: &str) -> Option<String> {
        let mut chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        if total == 0 {
            return None;
        }

        if self.keep_first.saturating_add(self.keep_last) >= total {
            chars.fill(self.mask_char);
            return Some(chars.into_iter().collect());
        }

        for ch in &mut chars[self.keep_first..(total - self.keep_last)] {
            *ch = self.mask_char;
        }
        Some(chars.into_iter().collect())
    }
}
