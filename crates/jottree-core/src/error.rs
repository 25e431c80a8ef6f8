//! Error types for tree construction.
//!
//! Every error here is fatal for the parse that raised it. Recoverable
//! conditions are reported through the diagnostic hook in
//! [`ParseOptions`](crate::parser::ParseOptions) instead.

use thiserror::Error;

use crate::span::Span;

/// Error kinds for categorizing parse failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Annotation outside the dispatcher's vocabulary
    UnknownEvent,
    /// Pop or read on an exhausted container stack
    StackUnderflow,
    /// `-destination` with no link or image text waiting for it
    UnmatchedDestination,
    /// Event offsets that do not address the input
    InvalidSpan,
    /// List marker that is not a valid numeral
    InvalidNumeral,
    /// Serialized event log that could not be read
    MalformedLog,
}

/// A malformed list-marker numeral.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumeralError {
    /// A character that is not a roman digit.
    #[error("encountered bad character {ch:?} in roman numeral {numeral:?}")]
    InvalidCharacter { numeral: String, ch: char },
}

/// A fatal error raised while building a document tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The tokenizer produced an annotation the builder does not know.
    #[error("unknown event {annot:?} at bytes {}..{}", span.start, span.end)]
    UnknownEvent { annot: String, span: Span },

    /// A close event had no matching open container.
    #[error("container stack is empty")]
    StackUnderflow,

    /// A link destination closed without preceding link or image text.
    #[error("destination at bytes {}..{} has no link text", span.start, span.end)]
    UnmatchedDestination { span: Span },

    /// The event offsets fall outside the input or split a character.
    #[error("event {annot:?} has invalid span {}..{} for input of {len} bytes", span.start, span.end)]
    InvalidSpan { annot: String, span: Span, len: usize },

    /// A list marker could not be converted to a start number.
    #[error(transparent)]
    Numeral(#[from] NumeralError),

    /// A serialized event log line could not be read.
    #[error("malformed event log: {0}")]
    EventLog(#[from] EventLogError),
}

impl ParseError {
    /// Categorize this error.
    pub fn kind(&self) -> ParseErrorKind {
        match self {
            ParseError::UnknownEvent { .. } => ParseErrorKind::UnknownEvent,
            ParseError::StackUnderflow => ParseErrorKind::StackUnderflow,
            ParseError::UnmatchedDestination { .. } => ParseErrorKind::UnmatchedDestination,
            ParseError::InvalidSpan { .. } => ParseErrorKind::InvalidSpan,
            ParseError::Numeral(_) => ParseErrorKind::InvalidNumeral,
            ParseError::EventLog(_) => ParseErrorKind::MalformedLog,
        }
    }

    /// Source location of the offending event, when one is known.
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::UnknownEvent { span, .. }
            | ParseError::UnmatchedDestination { span }
            | ParseError::InvalidSpan { span, .. } => Some(*span),
            ParseError::StackUnderflow | ParseError::Numeral(_) | ParseError::EventLog(_) => None,
        }
    }
}

/// A malformed line in a serialized event log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventLogError {
    /// The line lacks an annotation or one of its offsets.
    #[error("line {line}: expected `<annot> <startpos> <endpos>`")]
    MissingField { line: usize },

    /// An offset is not a non-negative integer.
    #[error("line {line}: invalid offset {value:?}")]
    InvalidOffset { line: usize, value: String },

    /// The line carries more than three fields.
    #[error("line {line}: unexpected trailing field {value:?}")]
    TrailingField { line: usize, value: String },
}

/// Result type for tree construction.
pub type Result<T> = std::result::Result<T, ParseError>;
