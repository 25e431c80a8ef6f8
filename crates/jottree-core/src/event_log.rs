//! Reader for serialized event streams.
//!
//! An event log holds one event per line as `<annot> <startpos> <endpos>`,
//! for example:
//!
//! ```text
//! +para 0 0
//! str 0 4
//! -para 5 5
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Lines are located
//! with `memchr` (SIMD on supported platforms) and annotations borrow from
//! the log text.

use std::borrow::Cow;

use memchr::memchr;

use crate::error::EventLogError;
use crate::event::Event;

/// A single line from the log with its 1-based line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Line<'a> {
    text: &'a str,
    number: usize,
}

impl<'a> Line<'a> {
    #[inline(always)]
    fn is_blank(&self) -> bool {
        self.text.bytes().all(|b| b == b' ' || b == b'\t')
    }

    #[inline(always)]
    fn is_comment(&self) -> bool {
        self.text.trim_start().starts_with('#')
    }

    fn parse_event(&self) -> Result<Event<'a>, EventLogError> {
        let mut fields = self.text.split_ascii_whitespace();
        let missing = || EventLogError::MissingField { line: self.number };

        let annot = fields.next().ok_or_else(missing)?;
        let startpos = self.parse_offset(fields.next().ok_or_else(missing)?)?;
        let endpos = self.parse_offset(fields.next().ok_or_else(missing)?)?;
        if let Some(extra) = fields.next() {
            return Err(EventLogError::TrailingField {
                line: self.number,
                value: extra.to_string(),
            });
        }

        Ok(Event::new(Cow::Borrowed(annot), startpos, endpos))
    }

    fn parse_offset(&self, field: &str) -> Result<usize, EventLogError> {
        field.parse().map_err(|_| EventLogError::InvalidOffset {
            line: self.number,
            value: field.to_string(),
        })
    }
}

/// Iterator over the events of a serialized log.
///
/// ```rust
/// use jottree_core::event_log::EventLog;
///
/// let events: Vec<_> = EventLog::new("+para 0 0\nstr 0 4\n-para 5 5\n")
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(events.len(), 3);
/// assert_eq!(events[1].annot, "str");
/// ```
pub struct EventLog<'a> {
    input: &'a str,
    bytes: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> EventLog<'a> {
    /// Create a reader over the given log text.
    #[inline]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            offset: 0,
            line: 0,
        }
    }

    /// Read the next raw line from input.
    #[inline(always)]
    fn read_line(&mut self) -> Option<Line<'a>> {
        if self.offset >= self.bytes.len() {
            return None;
        }

        let start = self.offset;
        let end = match memchr(b'\n', &self.bytes[start..]) {
            Some(pos) => start + pos,
            None => self.bytes.len(),
        };

        // CRLF: drop the carriage return before the newline
        let text_end = if end > start && self.bytes[end - 1] == b'\r' {
            end - 1
        } else {
            end
        };

        self.offset = if end < self.bytes.len() { end + 1 } else { end };
        self.line += 1;

        // Both bounds sit next to ASCII newlines or at the ends of the input,
        // so they are always char boundaries.
        let text = self.input.get(start..text_end).unwrap_or_default();
        Some(Line {
            text,
            number: self.line,
        })
    }
}

impl<'a> Iterator for EventLog<'a> {
    type Item = Result<Event<'a>, EventLogError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.read_line()?;
            if line.is_blank() || line.is_comment() {
                continue;
            }
            return Some(line.parse_event());
        }
    }
}
