//! Annotated events consumed by the tree builder.
//!
//! A tokenizer describes the source as a flat sequence of events. Each event
//! names an annotation (`str`, `+emph`, `-para`, ...) and the inclusive byte
//! range `[startpos, endpos]` of source text it covers. Annotations starting
//! with `+` open a construct and the matching `-` annotation closes it.

use crate::ast::{Alignment, CowStr};
use crate::span::Span;

/// A single tokenizer event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event<'a> {
    /// Annotation name, e.g. `str` or `+para`.
    pub annot: CowStr<'a>,
    /// First byte covered by the event.
    pub startpos: usize,
    /// Last byte covered by the event (inclusive).
    pub endpos: usize,
}

impl<'a> Event<'a> {
    /// Create a new event.
    #[inline]
    pub fn new(annot: impl Into<CowStr<'a>>, startpos: usize, endpos: usize) -> Self {
        Self {
            annot: annot.into(),
            startpos,
            endpos,
        }
    }

    /// The half-open source span covered by this event.
    #[inline]
    pub fn span(&self) -> Span {
        Span::from_inclusive(self.startpos, self.endpos)
    }
}

/// Constructs delimited by a `+tag` / `-tag` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Emph,
    Strong,
    Span,
    Mark,
    Delete,
    Insert,
    DoubleQuoted,
    SingleQuoted,
    LinkText,
    ImageText,
    Destination,
    Verbatim,
    Attributes,
    Para,
    Heading,
    BlockQuote,
    Div,
    ListItem,
    Table,
    Row,
    Cell,
    Caption,
}

impl Tag {
    fn parse(name: &str) -> Option<Tag> {
        let tag = match name {
            "emph" => Tag::Emph,
            "strong" => Tag::Strong,
            "span" => Tag::Span,
            "mark" => Tag::Mark,
            "delete" => Tag::Delete,
            "insert" => Tag::Insert,
            "double_quoted" => Tag::DoubleQuoted,
            "single_quoted" => Tag::SingleQuoted,
            "linktext" => Tag::LinkText,
            "imagetext" => Tag::ImageText,
            "destination" => Tag::Destination,
            "verbatim" => Tag::Verbatim,
            "attributes" => Tag::Attributes,
            "para" => Tag::Para,
            "heading" => Tag::Heading,
            "blockquote" => Tag::BlockQuote,
            "div" => Tag::Div,
            "list_item" => Tag::ListItem,
            "table" => Tag::Table,
            "row" => Tag::Row,
            "cell" => Tag::Cell,
            "caption" => Tag::Caption,
            _ => return None,
        };
        Some(tag)
    }
}

/// The closed vocabulary of event annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annot {
    /// `+tag`
    Open(Tag),
    /// `-tag`
    Close(Tag),
    Str,
    SoftBreak,
    HardBreak,
    Escape,
    Emoji,
    Class,
    Id,
    Key,
    Value,
    Comment,
    ThematicBreak,
    RightSingleQuote,
    BlankLine,
    /// `checkbox_checked` / `checkbox_unchecked`
    Checkbox(bool),
    /// `separator_default`, `separator_left`, ...
    Separator(Alignment),
}

impl Annot {
    /// Classify an annotation name, or `None` if it is not in the vocabulary.
    ///
    /// ```rust
    /// use jottree_core::event::{Annot, Tag};
    ///
    /// assert_eq!(Annot::parse("+emph"), Some(Annot::Open(Tag::Emph)));
    /// assert_eq!(Annot::parse("-para"), Some(Annot::Close(Tag::Para)));
    /// assert_eq!(Annot::parse("+bogus"), None);
    /// ```
    pub fn parse(annot: &str) -> Option<Annot> {
        if let Some(name) = annot.strip_prefix('+') {
            return Tag::parse(name).map(Annot::Open);
        }
        if let Some(name) = annot.strip_prefix('-') {
            return Tag::parse(name).map(Annot::Close);
        }
        let annot = match annot {
            "str" => Annot::Str,
            "softbreak" => Annot::SoftBreak,
            "hardbreak" => Annot::HardBreak,
            "escape" => Annot::Escape,
            "emoji" => Annot::Emoji,
            "class" => Annot::Class,
            "id" => Annot::Id,
            "key" => Annot::Key,
            "value" => Annot::Value,
            "comment" => Annot::Comment,
            "thematic_break" => Annot::ThematicBreak,
            "right_single_quote" => Annot::RightSingleQuote,
            "blankline" => Annot::BlankLine,
            "checkbox_checked" => Annot::Checkbox(true),
            "checkbox_unchecked" => Annot::Checkbox(false),
            "separator_default" => Annot::Separator(Alignment::Default),
            "separator_left" => Annot::Separator(Alignment::Left),
            "separator_right" => Annot::Separator(Alignment::Right),
            "separator_center" => Annot::Separator(Alignment::Center),
            _ => return None,
        };
        Some(annot)
    }
}
