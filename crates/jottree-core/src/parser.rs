//! Document assembler.
//!
//! Runs a fresh [`TreeBuilder`] over an event stream and hands back the
//! finished [`Doc`]. Each call owns its own builder, so one [`Parser`] can
//! be reused for any number of documents.

use std::fmt;

use log::{debug, warn};

use crate::ast::Doc;
use crate::builder::TreeBuilder;
use crate::error::Result;
use crate::event::Event;
use crate::event_log::EventLog;

/// Callback receiving `(message, byte offset)` for every warning.
pub type WarnFn = Box<dyn FnMut(&str, usize)>;

/// Options for a parse.
#[derive(Default)]
pub struct ParseOptions {
    /// Reserved for attaching source positions to nodes. Currently unused.
    pub source_positions: bool,
    /// Warning sink. When `None`, warnings go to the `log` facade.
    pub warn: Option<WarnFn>,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_positions(mut self, enabled: bool) -> Self {
        self.source_positions = enabled;
        self
    }

    /// Route warnings to `warn` instead of the `log` facade.
    pub fn with_warn<F>(mut self, warn: F) -> Self
    where
        F: FnMut(&str, usize) + 'static,
    {
        self.warn = Some(Box::new(warn));
        self
    }
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("source_positions", &self.source_positions)
            .field("warn", &self.warn.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

/// Builds documents from event streams.
#[derive(Debug, Default)]
pub struct Parser {
    options: ParseOptions,
}

impl Parser {
    #[inline]
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    /// The options this parser was created with.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Build a document from `events`, which describe `input`.
    ///
    /// Stops at the first fatal error. Containers still open when the
    /// events run out are discarded with a warning.
    pub fn parse<'a, 'e, I>(&mut self, input: &'a str, events: I) -> Result<Doc<'a>>
    where
        I: IntoIterator<Item = Event<'e>>,
    {
        debug!("building document for {} bytes of input", input.len());
        let doc = match self.options.warn.as_mut() {
            Some(sink) => build(input, events, |message: &str, pos: usize| sink(message, pos)),
            None => build(input, events, default_warning),
        }?;
        debug!("built document with {} top-level blocks", doc.children.len());
        Ok(doc)
    }
}

fn build<'a, 'e, I, W>(input: &'a str, events: I, warn: W) -> Result<Doc<'a>>
where
    I: IntoIterator<Item = Event<'e>>,
    W: FnMut(&str, usize),
{
    let mut builder = TreeBuilder::new(input, warn);
    let mut count = 0usize;
    for event in events {
        builder.handle_event(&event)?;
        count += 1;
    }
    debug!("consumed {count} events");
    builder.finish()
}

fn default_warning(message: &str, pos: usize) {
    if pos == 0 {
        warn!("{message}");
    } else {
        warn!("{message} at {pos}");
    }
}

/// Build a document from `events` with the given options.
///
/// ```rust
/// use jottree_core::{parse, Block, Event, ParseOptions};
///
/// let input = "hello";
/// let events = vec![
///     Event::new("+para", 0, 0),
///     Event::new("str", 0, 4),
///     Event::new("-para", 5, 5),
/// ];
/// let doc = parse(input, events, ParseOptions::default()).unwrap();
/// assert!(matches!(doc.children[0], Block::Para(_)));
/// ```
pub fn parse<'a, 'e, I>(input: &'a str, events: I, options: ParseOptions) -> Result<Doc<'a>>
where
    I: IntoIterator<Item = Event<'e>>,
{
    Parser::new(options).parse(input, events)
}

/// Build a document from a serialized event log.
///
/// The whole log is read before building starts, so a malformed line fails
/// the parse without producing partial output.
pub fn parse_event_log<'a>(input: &'a str, log: &str, options: ParseOptions) -> Result<Doc<'a>> {
    let events = EventLog::new(log).collect::<std::result::Result<Vec<_>, _>>()?;
    parse(input, events, options)
}
