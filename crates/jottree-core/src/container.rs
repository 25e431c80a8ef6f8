//! Transient builders for nodes that are still open.
//!
//! Every `+tag` event pushes a [`Container`]; nested events append sealed
//! children to it; the matching `-tag` event pops it and wraps the children
//! into the permanent node. The root document container sits at the bottom
//! of the stack for the whole parse.

use crate::ast::{Attributes, Block, Caption, Inline, ListItem, TableCell, TableRow};
use crate::error::{ParseError, Result};
use crate::list::{ItemData, ListData};
use crate::table::{RowData, TableData};

/// A sealed node waiting inside an open container.
///
/// The dispatcher narrows these back to the concrete child type a node
/// expects when the container is popped.
#[derive(Debug, Clone, PartialEq)]
pub enum Node<'a> {
    Block(Block<'a>),
    Inline(Inline<'a>),
    ListItem(ListItem<'a>),
    TableRow(TableRow<'a>),
    TableCell(TableCell<'a>),
    Caption(Caption<'a>),
}

impl<'a> Node<'a> {
    /// Mutable access to the node's attributes.
    pub fn attributes_mut(&mut self) -> &mut Attributes<'a> {
        match self {
            Node::Block(b) => b.attributes_mut(),
            Node::Inline(i) => i.attributes_mut(),
            Node::ListItem(n) => &mut n.attributes,
            Node::TableRow(n) => &mut n.attributes,
            Node::TableCell(n) => &mut n.attributes,
            Node::Caption(n) => &mut n.attributes,
        }
    }

    /// Short name used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Node::Block(_) => "block",
            Node::Inline(_) => "inline",
            Node::ListItem(_) => "list item",
            Node::TableRow(_) => "table row",
            Node::TableCell(_) => "table cell",
            Node::Caption(_) => "caption",
        }
    }
}

/// What an open container will become, plus the state it needs until then.
#[derive(Debug, Clone, PartialEq)]
pub enum ContainerData {
    Doc,
    /// Inline or block container with no extra state.
    Plain,
    Heading { level: usize },
    LinkText,
    ImageText,
    Attributes,
    List(ListData),
    ListItem(ItemData),
    Table(TableData),
    Row(RowData),
    Cell,
    Caption,
}

impl ContainerData {
    /// Short name used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            ContainerData::Doc => "document",
            ContainerData::Plain => "container",
            ContainerData::Heading { .. } => "heading",
            ContainerData::LinkText => "link text",
            ContainerData::ImageText => "image text",
            ContainerData::Attributes => "attributes",
            ContainerData::List(_) => "list",
            ContainerData::ListItem(_) => "list item",
            ContainerData::Table(_) => "table",
            ContainerData::Row(_) => "table row",
            ContainerData::Cell => "table cell",
            ContainerData::Caption => "caption",
        }
    }
}

/// A node under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Container<'a> {
    /// Children sealed so far, in order.
    pub children: Vec<Node<'a>>,
    /// Attributes gathered while open.
    pub attributes: Attributes<'a>,
    /// Variant-specific payload, consumed when the container is popped.
    pub data: ContainerData,
    /// Byte offset of the event that opened the container.
    pub startpos: usize,
}

impl<'a> Container<'a> {
    pub fn new(data: ContainerData, startpos: usize) -> Self {
        Self {
            children: Vec::new(),
            attributes: Attributes::new(),
            data,
            startpos,
        }
    }
}

/// The insertion point for trailing attributes.
pub enum Tip<'s, 'a> {
    /// Last child of the top container.
    Node(&'s mut Node<'a>),
    /// The top container itself, when it has no children yet.
    Container(&'s mut Container<'a>),
}

impl<'s, 'a> Tip<'s, 'a> {
    pub fn attributes_mut(self) -> &'s mut Attributes<'a> {
        match self {
            Tip::Node(node) => node.attributes_mut(),
            Tip::Container(container) => &mut container.attributes,
        }
    }
}

/// Stack of open containers with the document root at the bottom.
#[derive(Debug)]
pub struct ContainerStack<'a> {
    containers: Vec<Container<'a>>,
}

impl<'a> ContainerStack<'a> {
    /// Create a stack holding only `root`.
    pub fn new(root: Container<'a>) -> Self {
        let mut containers = Vec::with_capacity(16);
        containers.push(root);
        Self { containers }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Open a new empty container on top of the stack.
    pub fn push(&mut self, data: ContainerData, startpos: usize) {
        self.containers.push(Container::new(data, startpos));
    }

    /// Remove and return the top container. The root is never popped here.
    pub fn pop(&mut self) -> Result<Container<'a>> {
        if self.containers.len() <= 1 {
            return Err(ParseError::StackUnderflow);
        }
        self.containers.pop().ok_or(ParseError::StackUnderflow)
    }

    pub fn top(&self) -> Result<&Container<'a>> {
        self.containers.last().ok_or(ParseError::StackUnderflow)
    }

    pub fn top_mut(&mut self) -> Result<&mut Container<'a>> {
        self.containers.last_mut().ok_or(ParseError::StackUnderflow)
    }

    /// Last child of the top container, or the top container if it has none.
    pub fn tip(&mut self) -> Result<Tip<'_, 'a>> {
        let top = self.top_mut()?;
        if top.children.is_empty() {
            return Ok(Tip::Container(top));
        }
        let last = top.children.len() - 1;
        Ok(Tip::Node(&mut top.children[last]))
    }

    /// Append a sealed node to the top container.
    pub fn add_child_to_tip(&mut self, node: Node<'a>) -> Result<()> {
        self.top_mut()?.children.push(node);
        Ok(())
    }

    /// Take the root container, leaving the stack empty.
    ///
    /// Only valid once everything above the root has been popped.
    pub fn take_root(&mut self) -> Result<Container<'a>> {
        if self.containers.len() != 1 {
            return Err(ParseError::StackUnderflow);
        }
        self.containers.pop().ok_or(ParseError::StackUnderflow)
    }
}
