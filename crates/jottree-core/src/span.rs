//! Byte ranges into the source text shared by a parse.
//!
//! The tokenizer reports events with an inclusive end offset; a `Span`
//! stores the equivalent half-open range so it can slice the input directly.

/// A byte range in the source text.
///
/// Spans use byte offsets and are half-open: `[start, end)`.
///
/// # Example
///
/// ```rust
/// use jottree_core::span::Span;
///
/// let span = Span::from_inclusive(3, 5);
/// assert_eq!(span, Span::new(3, 6));
/// assert_eq!(span.len(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Starting byte offset (inclusive).
    pub start: usize,
    /// Ending byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span from byte offsets.
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Create a span from a tokenizer-style `[startpos, endpos]` pair.
    #[inline]
    pub const fn from_inclusive(startpos: usize, endpos: usize) -> Self {
        Self {
            start: startpos,
            end: endpos.saturating_add(1),
        }
    }

    /// Get the length of this span in bytes.
    #[inline]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if this span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Slice `input` by this span, if the range is valid for it.
    #[inline]
    pub fn slice<'a>(&self, input: &'a str) -> Option<&'a str> {
        input.get(self.start..self.end)
    }
}
