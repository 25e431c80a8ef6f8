//! # Jottree Core
//!
//! Builds a djot document tree from the flat event stream a djot tokenizer
//! produces.
//!
//! Events are `(annotation, startpos, endpos)` triples over the source text:
//! `+para` opens a paragraph, `str` covers some text, `-para` closes it. The
//! builder keeps a stack of open containers and turns every matching
//! open/close pair into a node of the [`Doc`] tree.
//!
//! ## Quick Start
//!
//! ```rust
//! use jottree_core::{Block, Event, Inline, Parser, ParseOptions};
//!
//! let input = "see [docs](x.html)";
//! let events = vec![
//!     Event::new("+para", 0, 0),
//!     Event::new("str", 0, 3),
//!     Event::new("+linktext", 4, 4),
//!     Event::new("str", 5, 8),
//!     Event::new("-linktext", 9, 9),
//!     Event::new("+destination", 10, 10),
//!     Event::new("str", 11, 16),
//!     Event::new("-destination", 17, 17),
//!     Event::new("-para", 18, 18),
//! ];
//!
//! let mut parser = Parser::new(ParseOptions::default());
//! let doc = parser.parse(input, events).unwrap();
//!
//! let Block::Para(para) = &doc.children[0] else { panic!("expected paragraph") };
//! let Inline::Link(link) = &para.children[1] else { panic!("expected link") };
//! assert_eq!(link.destination, "x.html");
//! ```
//!
//! ## Warnings
//!
//! Malformed but recoverable input is reported through a callback instead
//! of failing the parse:
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use jottree_core::{parse, Event, ParseOptions};
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! let options = ParseOptions::new().with_warn(move |msg, pos| {
//!     sink.borrow_mut().push((msg.to_string(), pos));
//! });
//!
//! // The emphasis is never closed.
//! let events = vec![Event::new("+emph", 0, 0), Event::new("str", 1, 2)];
//! let doc = parse("_hi", events, options).unwrap();
//!
//! assert!(doc.children.is_empty());
//! assert_eq!(seen.borrow().len(), 1);
//! ```
//!
//! ## Event Logs
//!
//! [`parse_event_log`] reads events serialized one per line as
//! `<annot> <startpos> <endpos>`, see [`event_log`].

pub mod ast;
pub mod builder;
pub mod container;
pub mod context;
pub mod error;
pub mod event;
pub mod event_log;
pub mod list;
pub mod numeral;
pub mod parser;
pub mod span;
pub mod table;

pub use ast::{get_string_content, Block, Doc, Inline};
pub use builder::TreeBuilder;
pub use context::Context;
pub use error::{EventLogError, NumeralError, ParseError, ParseErrorKind};
pub use event::Event;
pub use numeral::{get_list_start, roman_to_number};
pub use parser::{parse, parse_event_log, ParseOptions, Parser};
pub use span::Span;
