//! Event dispatcher.
//!
//! [`TreeBuilder`] consumes one event at a time and mutates the container
//! stack, the text accumulator and the pending-link slot. It never looks
//! ahead; everything it needs to remember between events lives in those
//! three places.
//!
//! Recoverable oddities (a checkbox outside a list item, a block inside a
//! paragraph, link text that never receives a destination) are reported
//! through the warning callback and the offending piece is dropped. Only
//! conditions that leave the stack unusable are returned as errors.

use std::borrow::Cow;
use std::collections::BTreeMap;

use log::trace;

use crate::ast::{
    Attributes, Block, BlockQuote, Break, Caption, Div, Doc, Emoji, Heading, Inline, Link,
    List, ListItem, Para, Styled, Table, TableCell, TableRow, Text, ThematicBreak,
};
use crate::container::{Container, ContainerData, ContainerStack, Node};
use crate::context::{Accumulator, Context};
use crate::error::{ParseError, Result};
use crate::event::{Annot, Event, Tag};
use crate::list::{marker_styles, ItemData, ListData};
use crate::table::{self, RowData, TableData};

/// Link or image text that is waiting for its destination.
#[derive(Debug)]
struct PendingLink<'a> {
    image: bool,
    children: Vec<Node<'a>>,
    attributes: Attributes<'a>,
    startpos: usize,
}

/// Incremental tree builder driven by [`handle_event`](Self::handle_event).
///
/// `W` receives every warning as `(message, byte offset)`.
///
/// ```rust
/// use jottree_core::builder::TreeBuilder;
/// use jottree_core::event::Event;
///
/// let input = "_hi_";
/// let mut builder = TreeBuilder::new(input, |_: &str, _: usize| {});
/// for event in [
///     Event::new("+para", 0, 0),
///     Event::new("+emph", 0, 0),
///     Event::new("str", 1, 2),
///     Event::new("-emph", 3, 3),
///     Event::new("-para", 4, 4),
/// ] {
///     builder.handle_event(&event).unwrap();
/// }
/// let doc = builder.finish().unwrap();
/// assert_eq!(doc.children.len(), 1);
/// ```
pub struct TreeBuilder<'a, W>
where
    W: FnMut(&str, usize),
{
    input: &'a str,
    stack: ContainerStack<'a>,
    text: Accumulator,
    pending_link: Option<PendingLink<'a>>,
    /// Key of the attribute currently receiving `value` events.
    pending_key: Option<&'a str>,
    /// Whether the pending key already received a value.
    value_open: bool,
    warn: W,
}

impl<'a, W> TreeBuilder<'a, W>
where
    W: FnMut(&str, usize),
{
    /// Create a builder over `input` with an empty document on the stack.
    pub fn new(input: &'a str, warn: W) -> Self {
        Self {
            input,
            stack: ContainerStack::new(Container::new(ContainerData::Doc, 0)),
            text: Accumulator::new(),
            pending_link: None,
            pending_key: None,
            value_open: false,
            warn,
        }
    }

    /// Current text accumulation mode.
    #[inline]
    pub fn context(&self) -> Context {
        self.text.context()
    }

    /// Text gathered by the accumulator and not yet emitted.
    #[inline]
    pub fn buffered_text(&self) -> &str {
        self.text.buffered()
    }

    /// Number of open containers, the document root included.
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether link or image text is waiting for a destination.
    #[inline]
    pub fn has_pending_link(&self) -> bool {
        self.pending_link.is_some()
    }

    /// Apply a single event.
    pub fn handle_event(&mut self, event: &Event<'_>) -> Result<()> {
        trace!(
            "event {} {}..={} depth={} context={:?}",
            event.annot,
            event.startpos,
            event.endpos,
            self.stack.len(),
            self.text.context()
        );

        let annot = Annot::parse(&event.annot).ok_or_else(|| ParseError::UnknownEvent {
            annot: event.annot.to_string(),
            span: event.span(),
        })?;

        match annot {
            Annot::Open(tag) => self.open(tag, event),
            Annot::Close(tag) => self.close(tag, event),
            Annot::Str => {
                let text = self.text_of(event)?;
                if self.text.is_normal() {
                    self.add_inline(Inline::Str(Text {
                        text: Cow::Borrowed(text),
                        attributes: Attributes::new(),
                    }))
                } else {
                    self.text.push(text);
                    Ok(())
                }
            }
            Annot::SoftBreak => {
                if self.text.is_normal() {
                    self.add_inline(Inline::SoftBreak(Break::default()))
                } else {
                    self.text.push("\n");
                    Ok(())
                }
            }
            Annot::HardBreak => {
                if self.text.is_normal() {
                    self.add_inline(Inline::HardBreak(Break::default()))
                } else {
                    self.text.push("\n");
                    Ok(())
                }
            }
            Annot::Escape => {
                if self.text.context() == Context::Verbatim {
                    self.text.push("\\");
                }
                Ok(())
            }
            Annot::Emoji => {
                let text = self.text_of(event)?;
                if !self.text.is_normal() {
                    self.text.push(text);
                    return Ok(());
                }
                // Drop the surrounding colons.
                let mut chars = text.chars();
                chars.next();
                chars.next_back();
                self.add_inline(Inline::Emoji(Emoji {
                    alias: Cow::Borrowed(chars.as_str()),
                    attributes: Attributes::new(),
                }))
            }
            Annot::RightSingleQuote => self.add_inline(Inline::RightSingleQuote(Text {
                text: Cow::Borrowed("'"),
                attributes: Attributes::new(),
            })),
            Annot::ThematicBreak => self.add_child(Node::Block(Block::ThematicBreak(
                ThematicBreak {
                    attributes: Attributes::new(),
                },
            ))),
            Annot::Class => {
                let class = self.text_of(event)?;
                self.stack.top_mut()?.attributes.add_class(class);
                Ok(())
            }
            Annot::Id => {
                let id = self.text_of(event)?;
                self.stack.top_mut()?.attributes.insert("id", id);
                Ok(())
            }
            Annot::Key => {
                self.pending_key = Some(self.text_of(event)?);
                self.value_open = false;
                Ok(())
            }
            Annot::Value => self.attribute_value(event),
            Annot::Comment => Ok(()),
            Annot::BlankLine => self.note_blank_line(),
            Annot::Checkbox(checked) => {
                let item = match &mut self.stack.top_mut()?.data {
                    ContainerData::ListItem(item) => {
                        item.checkbox = Some(checked);
                        true
                    }
                    _ => false,
                };
                if !item {
                    self.warn("checkbox outside of a list item ignored", event.startpos);
                }
                Ok(())
            }
            Annot::Separator(align) => {
                let row = match &mut self.stack.top_mut()?.data {
                    ContainerData::Row(row) => {
                        row.separators.push(align);
                        true
                    }
                    _ => false,
                };
                if !row {
                    self.warn("table separator outside of a row ignored", event.startpos);
                }
                Ok(())
            }
        }
    }

    /// Close out the parse and return the document.
    ///
    /// Open lists are sealed, since lists have no closing event. Any other
    /// container still open is discarded together with its contents, as is
    /// link text that never received a destination.
    pub fn finish(mut self) -> Result<Doc<'a>> {
        while self.stack.len() > 1 {
            if matches!(self.stack.top()?.data, ContainerData::List(_)) {
                self.seal_list()?;
                continue;
            }
            let orphan = self.stack.pop()?;
            let message = format!("unclosed {} discarded", orphan.data.describe());
            self.warn(&message, orphan.startpos);
        }
        if let Some(link) = self.pending_link.take() {
            self.warn("link text without destination discarded", link.startpos);
        }
        if !self.text.is_normal() {
            self.text.finish();
            self.warn("unterminated verbatim or destination discarded", 0);
        }

        let Container {
            children,
            attributes,
            startpos,
            ..
        } = self.stack.take_root()?;
        let children = self.blocks(children, startpos);
        Ok(Doc {
            children,
            references: BTreeMap::new(),
            footnotes: BTreeMap::new(),
            attributes,
        })
    }

    fn warn(&mut self, message: &str, pos: usize) {
        (self.warn)(message, pos)
    }

    fn text_of(&self, event: &Event<'_>) -> Result<&'a str> {
        let span = event.span();
        span.slice(self.input).ok_or_else(|| ParseError::InvalidSpan {
            annot: event.annot.to_string(),
            span,
            len: self.input.len(),
        })
    }

    fn open(&mut self, tag: Tag, event: &Event<'_>) -> Result<()> {
        let data = match tag {
            Tag::Verbatim => {
                self.text.enter(Context::Verbatim);
                return Ok(());
            }
            Tag::Destination => {
                self.text.enter(Context::Literal);
                return Ok(());
            }
            Tag::ListItem => return self.open_list_item(event),
            // The marker run `#..#` covers exactly `level` bytes.
            Tag::Heading => ContainerData::Heading {
                level: self.text_of(event)?.len(),
            },
            Tag::LinkText => ContainerData::LinkText,
            Tag::ImageText => ContainerData::ImageText,
            Tag::Attributes => ContainerData::Attributes,
            Tag::Table => ContainerData::Table(TableData::default()),
            Tag::Row => ContainerData::Row(RowData::default()),
            Tag::Cell => ContainerData::Cell,
            Tag::Caption => ContainerData::Caption,
            _ => ContainerData::Plain,
        };
        self.seal_open_lists()?;
        self.stack.push(data, event.startpos);
        Ok(())
    }

    fn close(&mut self, tag: Tag, event: &Event<'_>) -> Result<()> {
        match tag {
            Tag::Verbatim => {
                let text = self.text.finish();
                self.add_inline(Inline::Verbatim(Text {
                    text: Cow::Owned(text),
                    attributes: Attributes::new(),
                }))
            }
            Tag::Destination => self.close_destination(event),
            Tag::LinkText => self.close_link_text(false),
            Tag::ImageText => self.close_link_text(true),
            Tag::Attributes => self.close_attributes(),
            Tag::Emph => self.close_styled(Inline::Emph),
            Tag::Strong => self.close_styled(Inline::Strong),
            Tag::Span => self.close_styled(Inline::Span),
            Tag::Mark => self.close_styled(Inline::Mark),
            Tag::Delete => self.close_styled(Inline::Delete),
            Tag::Insert => self.close_styled(Inline::Insert),
            Tag::DoubleQuoted => self.close_styled(Inline::DoubleQuoted),
            Tag::SingleQuoted => self.close_styled(Inline::SingleQuoted),
            Tag::Para => {
                let Container {
                    children,
                    attributes,
                    startpos,
                    ..
                } = self.pop()?;
                let children = self.inlines(children, startpos);
                self.add_child(Node::Block(Block::Para(Para {
                    children,
                    attributes,
                })))
            }
            Tag::Heading => {
                let Container {
                    children,
                    attributes,
                    data,
                    startpos,
                } = self.pop()?;
                let level = match data {
                    ContainerData::Heading { level } => level,
                    _ => 1,
                };
                let children = self.inlines(children, startpos);
                self.add_child(Node::Block(Block::Heading(Heading {
                    level,
                    children,
                    attributes,
                })))
            }
            Tag::BlockQuote => self.close_blocks(|children, attributes| {
                Block::BlockQuote(BlockQuote {
                    children,
                    attributes,
                })
            }),
            Tag::Div => self.close_blocks(|children, attributes| {
                Block::Div(Div {
                    children,
                    attributes,
                })
            }),
            Tag::ListItem => self.close_list_item(),
            Tag::Table => self.close_table(),
            Tag::Row => self.close_row(),
            Tag::Cell => {
                let Container {
                    children,
                    attributes,
                    startpos,
                    ..
                } = self.pop()?;
                let children = self.blocks(children, startpos);
                self.add_child(Node::TableCell(TableCell {
                    children,
                    head: false,
                    align: Default::default(),
                    attributes,
                }))
            }
            Tag::Caption => {
                let Container {
                    children,
                    attributes,
                    startpos,
                    ..
                } = self.pop()?;
                let children = self.inlines(children, startpos);
                self.add_child(Node::Caption(Caption {
                    children,
                    attributes,
                }))
            }
        }
    }

    /// Pop the top container, sealing any list left open inside it first.
    fn pop(&mut self) -> Result<Container<'a>> {
        self.seal_open_lists()?;
        self.stack.pop()
    }

    fn close_styled(&mut self, wrap: fn(Styled<'a>) -> Inline<'a>) -> Result<()> {
        let Container {
            children,
            attributes,
            startpos,
            ..
        } = self.pop()?;
        let children = self.inlines(children, startpos);
        self.add_inline(wrap(Styled {
            children,
            attributes,
        }))
    }

    fn close_blocks<F>(&mut self, wrap: F) -> Result<()>
    where
        F: FnOnce(Vec<Block<'a>>, Attributes<'a>) -> Block<'a>,
    {
        let Container {
            children,
            attributes,
            startpos,
            ..
        } = self.pop()?;
        let children = self.blocks(children, startpos);
        self.add_child(Node::Block(wrap(children, attributes)))
    }

    fn close_link_text(&mut self, image: bool) -> Result<()> {
        let Container {
            children,
            attributes,
            startpos,
            ..
        } = self.pop()?;
        if let Some(previous) = self.pending_link.take() {
            self.warn("link text without destination discarded", previous.startpos);
        }
        self.pending_link = Some(PendingLink {
            image,
            children,
            attributes,
            startpos,
        });
        Ok(())
    }

    fn close_destination(&mut self, event: &Event<'_>) -> Result<()> {
        let destination = self.text.finish();
        let pending = self
            .pending_link
            .take()
            .ok_or(ParseError::UnmatchedDestination { span: event.span() })?;

        let children = self.inlines(pending.children, pending.startpos);
        let link = Link {
            destination: Cow::Owned(destination),
            children,
            attributes: pending.attributes,
        };
        if pending.image {
            self.add_inline(Inline::Image(link))
        } else {
            self.add_inline(Inline::Link(link))
        }
    }

    fn close_attributes(&mut self) -> Result<()> {
        let container = self.pop()?;
        self.pending_key = None;
        self.value_open = false;
        if container.attributes.is_empty() {
            return Ok(());
        }
        self.stack.tip()?.attributes_mut().merge(container.attributes);
        Ok(())
    }

    fn attribute_value(&mut self, event: &Event<'_>) -> Result<()> {
        let value = self.text_of(event)?;
        let Some(key) = self.pending_key else {
            self.warn("attribute value without key ignored", event.startpos);
            return Ok(());
        };
        let attributes = &mut self.stack.top_mut()?.attributes;
        if self.value_open {
            attributes.extend_value(key, value);
        } else {
            attributes.insert(key, value);
        }
        self.value_open = true;
        Ok(())
    }

    fn note_blank_line(&mut self) -> Result<()> {
        match &mut self.stack.top_mut()?.data {
            ContainerData::List(list) => list.blank_pending = true,
            ContainerData::ListItem(item) => item.blank_pending = true,
            _ => {}
        }
        Ok(())
    }

    fn open_list_item(&mut self, event: &Event<'_>) -> Result<()> {
        let marker = self.text_of(event)?;
        let styles = marker_styles(marker);
        let continues = match &mut self.stack.top_mut()?.data {
            ContainerData::List(list) => list.continue_with(&styles),
            _ => false,
        };
        if !continues {
            self.seal_open_lists()?;
            self.stack
                .push(ContainerData::List(ListData::new(marker, styles)), event.startpos);
        }
        self.stack
            .push(ContainerData::ListItem(ItemData::default()), event.startpos);
        Ok(())
    }

    fn close_list_item(&mut self) -> Result<()> {
        let Container {
            children,
            attributes,
            data,
            startpos,
        } = self.pop()?;
        let item = match data {
            ContainerData::ListItem(item) => item,
            _ => ItemData::default(),
        };
        if let ContainerData::List(list) = &mut self.stack.top_mut()?.data {
            if item.loose {
                list.tight = false;
            }
            if item.blank_pending {
                list.blank_pending = true;
            }
        }

        let children = self.blocks(children, startpos);
        self.add_child(Node::ListItem(ListItem {
            children,
            checkbox: item.checkbox,
            attributes,
        }))
    }

    /// Seal every list sitting on top of the stack.
    fn seal_open_lists(&mut self) -> Result<()> {
        while matches!(self.stack.top()?.data, ContainerData::List(_)) {
            self.seal_list()?;
        }
        Ok(())
    }

    fn seal_list(&mut self) -> Result<()> {
        let Container {
            children,
            attributes,
            data,
            startpos,
        } = self.stack.pop()?;
        let ContainerData::List(list) = data else {
            return Err(ParseError::StackUnderflow);
        };

        let mut items = Vec::with_capacity(children.len());
        for node in children {
            match node {
                Node::ListItem(item) => items.push(item),
                other => {
                    let message = format!("{} discarded from list", other.describe());
                    self.warn(&message, startpos);
                }
            }
        }

        let has_checkbox = items.first().is_some_and(|item| item.checkbox.is_some());
        let (kind, style, start) = list.resolve(has_checkbox)?;
        self.append(Node::Block(Block::List(List {
            kind,
            style,
            start,
            tight: list.tight,
            children: items,
            attributes,
        })))
    }

    fn close_row(&mut self) -> Result<()> {
        let Container {
            children,
            attributes,
            data,
            startpos,
        } = self.pop()?;
        let separators = match data {
            ContainerData::Row(row) if row.is_separator() => Some(row.separators),
            _ => None,
        };

        if let Some(aligns) = separators {
            let top = self.stack.top_mut()?;
            if let Some(Node::TableRow(head)) = top.children.last_mut() {
                table::mark_header(head, &aligns);
            }
            if let ContainerData::Table(table) = &mut top.data {
                table.aligns = aligns;
            }
            return Ok(());
        }

        let aligns = match &self.stack.top()?.data {
            ContainerData::Table(table) => table.aligns.clone(),
            _ => Vec::new(),
        };
        let mut cells = Vec::with_capacity(children.len());
        for node in children {
            match node {
                Node::TableCell(cell) => cells.push(cell),
                other => {
                    let message = format!("{} discarded from table row", other.describe());
                    self.warn(&message, startpos);
                }
            }
        }

        let mut row = TableRow {
            children: cells,
            head: false,
            attributes,
        };
        table::align_cells(&mut row, &aligns);
        self.add_child(Node::TableRow(row))
    }

    fn close_table(&mut self) -> Result<()> {
        let Container {
            children,
            attributes,
            startpos,
            ..
        } = self.pop()?;

        let mut caption = None;
        let mut rows = Vec::with_capacity(children.len());
        for node in children {
            match node {
                Node::TableRow(row) => rows.push(row),
                Node::Caption(c) => caption = Some(c),
                other => {
                    let message = format!("{} discarded from table", other.describe());
                    self.warn(&message, startpos);
                }
            }
        }

        self.add_child(Node::Block(Block::Table(Table {
            caption,
            children: rows,
            attributes,
        })))
    }

    #[inline]
    fn add_inline(&mut self, inline: Inline<'a>) -> Result<()> {
        self.add_child(Node::Inline(inline))
    }

    /// Append a sealed node to the top container.
    ///
    /// Anything but a list item ends an open list first.
    fn add_child(&mut self, node: Node<'a>) -> Result<()> {
        if !matches!(node, Node::ListItem(_)) {
            self.seal_open_lists()?;
        }
        self.append(node)
    }

    fn append(&mut self, node: Node<'a>) -> Result<()> {
        let top = self.stack.top_mut()?;
        if let ContainerData::ListItem(item) = &mut top.data {
            // A blank line between two children makes the item loose.
            if item.blank_pending && !top.children.is_empty() {
                item.loose = true;
            }
            item.blank_pending = false;
        }
        self.stack.add_child_to_tip(node)
    }

    /// Keep the inline children, dropping anything else.
    fn inlines(&mut self, nodes: Vec<Node<'a>>, pos: usize) -> Vec<Inline<'a>> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Node::Inline(inline) => out.push(inline),
                other => {
                    let message = format!("{} discarded from inline content", other.describe());
                    self.warn(&message, pos);
                }
            }
        }
        out
    }

    /// Keep the block children, wrapping runs of loose inlines in paragraphs.
    fn blocks(&mut self, nodes: Vec<Node<'a>>, pos: usize) -> Vec<Block<'a>> {
        let mut out = Vec::with_capacity(nodes.len());
        let mut run = Vec::new();
        for node in nodes {
            match node {
                Node::Inline(inline) => run.push(inline),
                Node::Block(block) => {
                    flush_paragraph(&mut run, &mut out);
                    out.push(block);
                }
                other => {
                    let message = format!("{} discarded from block content", other.describe());
                    self.warn(&message, pos);
                }
            }
        }
        flush_paragraph(&mut run, &mut out);
        out
    }
}

fn flush_paragraph<'a>(run: &mut Vec<Inline<'a>>, out: &mut Vec<Block<'a>>) {
    if run.is_empty() {
        return;
    }
    out.push(Block::Para(Para {
        children: std::mem::take(run),
        attributes: Attributes::new(),
    }));
}
