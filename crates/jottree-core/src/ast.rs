//! Document tree types produced by the builder.
//!
//! The tree is designed to be:
//!
//! - **Zero-copy where possible**: text taken straight from the source uses
//!   `Cow<'a, str>` borrows; text assembled from several events is owned
//! - **Closed**: every node is one of the `Block`/`Inline` variants below
//! - **Sealed**: nodes are built with complete child lists and are not
//!   reopened by the builder

use std::collections::BTreeMap;

/// Borrowed or owned string type for zero-copy building.
pub type CowStr<'a> = std::borrow::Cow<'a, str>;

/// Attribute name/value pairs attached to a node.
///
/// Keys are unique and kept in first-insertion order. The `class` key is
/// special: new values are appended with a space instead of replacing the
/// old one, without deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attributes<'a> {
    entries: Vec<(CowStr<'a>, CowStr<'a>)>,
}

impl<'a> Attributes<'a> {
    /// Create an empty attribute map.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if no attributes are set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Look up the value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_ref())
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v.as_ref()))
    }

    /// Set `key` to `value`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<CowStr<'a>>, value: impl Into<CowStr<'a>>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Append `value` to `key` with no separator, creating the key if needed.
    pub fn extend_value(&mut self, key: impl Into<CowStr<'a>>, value: &str) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => v.to_mut().push_str(value),
            None => self.entries.push((key, CowStr::Owned(value.to_string()))),
        }
    }

    /// Add a class token, space-joined onto any existing classes.
    pub fn add_class(&mut self, class: impl Into<CowStr<'a>>) {
        let class = class.into();
        match self.entries.iter_mut().find(|(k, _)| k == "class") {
            Some((_, v)) => {
                let joined = v.to_mut();
                joined.push(' ');
                joined.push_str(&class);
            }
            None => self.entries.push((CowStr::Borrowed("class"), class)),
        }
    }

    /// Merge `other` into `self`: classes accumulate, every other key is
    /// overwritten by the incoming value.
    pub fn merge(&mut self, other: Attributes<'a>) {
        for (key, value) in other.entries {
            if key == "class" {
                self.add_class(value);
            } else {
                self.insert(key, value);
            }
        }
    }
}

/// A built document.
///
/// The document is the root of the tree. Reference and footnote maps are
/// part of the shape but are not populated by the builder.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Doc<'a> {
    /// Top-level blocks in document order.
    pub children: Vec<Block<'a>>,
    /// Reference definitions by label.
    pub references: BTreeMap<String, Reference<'a>>,
    /// Footnote definitions by label.
    pub footnotes: BTreeMap<String, Footnote<'a>>,
    /// Document-level attributes.
    pub attributes: Attributes<'a>,
}

/// A link reference definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reference<'a> {
    pub destination: CowStr<'a>,
    pub attributes: Attributes<'a>,
}

/// A footnote definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Footnote<'a> {
    pub children: Vec<Block<'a>>,
    pub attributes: Attributes<'a>,
}

/// Block-level nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Block<'a> {
    /// Paragraph of inline content.
    Para(Para<'a>),
    /// Section heading.
    Heading(Heading<'a>),
    /// Horizontal rule.
    ThematicBreak(ThematicBreak<'a>),
    /// Generic block container.
    Div(Div<'a>),
    /// Block quotation.
    BlockQuote(BlockQuote<'a>),
    /// Bullet, ordered, or task list.
    List(List<'a>),
    /// Table with rows and an optional caption.
    Table(Table<'a>),
}

impl<'a> Block<'a> {
    /// Attributes attached to this block.
    pub fn attributes(&self) -> &Attributes<'a> {
        match self {
            Block::Para(b) => &b.attributes,
            Block::Heading(b) => &b.attributes,
            Block::ThematicBreak(b) => &b.attributes,
            Block::Div(b) => &b.attributes,
            Block::BlockQuote(b) => &b.attributes,
            Block::List(b) => &b.attributes,
            Block::Table(b) => &b.attributes,
        }
    }

    /// Mutable access to this block's attributes.
    pub fn attributes_mut(&mut self) -> &mut Attributes<'a> {
        match self {
            Block::Para(b) => &mut b.attributes,
            Block::Heading(b) => &mut b.attributes,
            Block::ThematicBreak(b) => &mut b.attributes,
            Block::Div(b) => &mut b.attributes,
            Block::BlockQuote(b) => &mut b.attributes,
            Block::List(b) => &mut b.attributes,
            Block::Table(b) => &mut b.attributes,
        }
    }
}

/// Paragraph containing inline elements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Para<'a> {
    pub children: Vec<Inline<'a>>,
    pub attributes: Attributes<'a>,
}

/// Section heading with level and inline content.
#[derive(Debug, Clone, PartialEq)]
pub struct Heading<'a> {
    /// Heading level, the length of the marker run (1 or more).
    pub level: usize,
    pub children: Vec<Inline<'a>>,
    pub attributes: Attributes<'a>,
}

/// Horizontal rule.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ThematicBreak<'a> {
    pub attributes: Attributes<'a>,
}

/// Generic block container.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Div<'a> {
    pub children: Vec<Block<'a>>,
    pub attributes: Attributes<'a>,
}

/// Block quotation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockQuote<'a> {
    pub children: Vec<Block<'a>>,
    pub attributes: Attributes<'a>,
}

/// What kind of marker a list uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// `-`, `*` or `+` bullets.
    Bullet,
    /// Numbered, lettered or roman markers.
    Ordered,
    /// Bullet items carrying checkboxes.
    Task,
}

/// A list block.
#[derive(Debug, Clone, PartialEq)]
pub struct List<'a> {
    pub kind: ListKind,
    /// Resolved marker style, e.g. `-`, `1.`, `(a)`, `i)`.
    pub style: String,
    /// First ordinal for ordered lists, when it could be determined.
    pub start: Option<i64>,
    /// Whether no blank line separates items or item blocks.
    pub tight: bool,
    pub children: Vec<ListItem<'a>>,
    pub attributes: Attributes<'a>,
}

/// A single list item.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListItem<'a> {
    pub children: Vec<Block<'a>>,
    /// `Some(checked)` for task list items.
    pub checkbox: Option<bool>,
    pub attributes: Attributes<'a>,
}

/// Column alignment declared by a table separator row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Default,
    Left,
    Right,
    Center,
}

/// A table block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table<'a> {
    pub caption: Option<Caption<'a>>,
    pub children: Vec<TableRow<'a>>,
    pub attributes: Attributes<'a>,
}

/// Table caption.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Caption<'a> {
    pub children: Vec<Inline<'a>>,
    pub attributes: Attributes<'a>,
}

/// A single table row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableRow<'a> {
    pub children: Vec<TableCell<'a>>,
    /// Whether a separator row followed this row.
    pub head: bool,
    pub attributes: Attributes<'a>,
}

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableCell<'a> {
    pub children: Vec<Block<'a>>,
    pub head: bool,
    pub align: Alignment,
    pub attributes: Attributes<'a>,
}

/// Inline-level nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline<'a> {
    /// Plain text.
    Str(Text<'a>),
    /// Line break rendered as a space.
    SoftBreak(Break<'a>),
    /// Explicit line break.
    HardBreak(Break<'a>),
    /// `:alias:` emoji.
    Emoji(Emoji<'a>),
    /// Verbatim code span.
    Verbatim(Text<'a>),
    /// Smart right single quote.
    RightSingleQuote(Text<'a>),
    Emph(Styled<'a>),
    Strong(Styled<'a>),
    /// Hyperlink.
    Link(Link<'a>),
    /// Image; the children are its description.
    Image(Link<'a>),
    Span(Styled<'a>),
    Mark(Styled<'a>),
    Insert(Styled<'a>),
    Delete(Styled<'a>),
    DoubleQuoted(Styled<'a>),
    SingleQuoted(Styled<'a>),
}

impl<'a> Inline<'a> {
    /// Text carried directly by this node, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Inline::Str(t) | Inline::Verbatim(t) | Inline::RightSingleQuote(t) => Some(&t.text),
            _ => None,
        }
    }

    /// Nested inline content, if this node is a container.
    pub fn children(&self) -> Option<&[Inline<'a>]> {
        match self {
            Inline::Emph(s)
            | Inline::Strong(s)
            | Inline::Span(s)
            | Inline::Mark(s)
            | Inline::Insert(s)
            | Inline::Delete(s)
            | Inline::DoubleQuoted(s)
            | Inline::SingleQuoted(s) => Some(&s.children),
            Inline::Link(l) | Inline::Image(l) => Some(&l.children),
            _ => None,
        }
    }

    /// Attributes attached to this inline.
    pub fn attributes(&self) -> &Attributes<'a> {
        match self {
            Inline::Str(t) | Inline::Verbatim(t) | Inline::RightSingleQuote(t) => &t.attributes,
            Inline::SoftBreak(b) | Inline::HardBreak(b) => &b.attributes,
            Inline::Emoji(e) => &e.attributes,
            Inline::Link(l) | Inline::Image(l) => &l.attributes,
            Inline::Emph(s)
            | Inline::Strong(s)
            | Inline::Span(s)
            | Inline::Mark(s)
            | Inline::Insert(s)
            | Inline::Delete(s)
            | Inline::DoubleQuoted(s)
            | Inline::SingleQuoted(s) => &s.attributes,
        }
    }

    /// Mutable access to this inline's attributes.
    pub fn attributes_mut(&mut self) -> &mut Attributes<'a> {
        match self {
            Inline::Str(t) | Inline::Verbatim(t) | Inline::RightSingleQuote(t) => {
                &mut t.attributes
            }
            Inline::SoftBreak(b) | Inline::HardBreak(b) => &mut b.attributes,
            Inline::Emoji(e) => &mut e.attributes,
            Inline::Link(l) | Inline::Image(l) => &mut l.attributes,
            Inline::Emph(s)
            | Inline::Strong(s)
            | Inline::Span(s)
            | Inline::Mark(s)
            | Inline::Insert(s)
            | Inline::Delete(s)
            | Inline::DoubleQuoted(s)
            | Inline::SingleQuoted(s) => &mut s.attributes,
        }
    }
}

/// Text-bearing leaf.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Text<'a> {
    pub text: CowStr<'a>,
    pub attributes: Attributes<'a>,
}

/// Soft or hard line break.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Break<'a> {
    pub attributes: Attributes<'a>,
}

/// Emoji reference by alias, e.g. `smile` for `:smile:`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Emoji<'a> {
    pub alias: CowStr<'a>,
    pub attributes: Attributes<'a>,
}

/// Inline container used by emphasis, spans, quotes and edits.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Styled<'a> {
    pub children: Vec<Inline<'a>>,
    pub attributes: Attributes<'a>,
}

/// Link or image with a destination and inline description.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Link<'a> {
    pub destination: CowStr<'a>,
    pub children: Vec<Inline<'a>>,
    pub attributes: Attributes<'a>,
}

fn add_string_content(node: &Inline<'_>, buffer: &mut String) {
    if let Some(text) = node.text() {
        buffer.push_str(text);
    } else if let Inline::SoftBreak(_) = node {
        buffer.push('\n');
    } else if let Some(children) = node.children() {
        for child in children {
            add_string_content(child, buffer);
        }
    }
}

/// Concatenate the plain text of an inline node and its descendants.
///
/// Soft breaks contribute a newline; nodes with neither text nor children
/// (hard breaks, emoji) contribute nothing.
///
/// ```rust
/// use jottree_core::ast::{get_string_content, Inline, Styled, Text};
///
/// let emph = Inline::Emph(Styled {
///     children: vec![Inline::Str(Text { text: "hi".into(), ..Default::default() })],
///     ..Default::default()
/// });
/// assert_eq!(get_string_content(&emph), "hi");
/// ```
pub fn get_string_content(node: &Inline<'_>) -> String {
    let mut buffer = String::new();
    add_string_content(node, &mut buffer);
    buffer
}
