//! jtree CLI - build, validate, and inspect djot document trees
//!
//! Usage:
//!   jtree [OPTIONS] <COMMAND> <SOURCE> --events <FILE>
//!
//! Commands:
//!   parse     Build the tree and display its structure
//!   validate  Report errors and warnings
//!   stats     Show document statistics

mod cli;

use std::borrow::Cow;
use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::process;
use std::rc::Rc;

use clap::Parser as ClapParser;
use cli::{Cli, Command};
use jottree_core::ast::{Alignment, Attributes, ListKind};
use jottree_core::event_log::EventLog;
use jottree_core::{Block, Doc, Event, Inline, ParseError, ParseOptions, Parser};
use log::{debug, info, LevelFilter};
use serde::Serialize;

type Warnings = Rc<RefCell<Vec<(String, usize)>>>;

fn main() {
    let cli = <Cli as ClapParser>::parse();

    setup_logging(&cli.log_level);
    info!("jtree v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&cli) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

/// Set up logging based on the log level argument.
fn setup_logging(level: &str) {
    let filter = match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Warn,
    };

    env_logger::Builder::new()
        .filter_level(filter)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

fn run(cli: &Cli) -> Result<(), String> {
    let input = cli.command.input();
    let source = fs::read_to_string(&input.source)
        .map_err(|e| format!("failed to read '{}': {}", input.source.display(), e))?;
    let log = fs::read_to_string(&input.events)
        .map_err(|e| format!("failed to read '{}': {}", input.events.display(), e))?;

    let events = load_events(&log)?;
    debug!("loaded {} events", events.len());

    let warnings: Warnings = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&warnings);
    let options = ParseOptions::new().with_warn(move |message, pos| {
        sink.borrow_mut().push((message.to_string(), pos));
    });
    let result = Parser::new(options).parse(&source, events);
    let warnings = warnings.borrow().clone();

    match &cli.command {
        Command::Parse(_) => cmd_parse(result, &warnings, cli),
        Command::Validate(_) => cmd_validate(result, &warnings, cli),
        Command::Stats(_) => cmd_stats(result, &warnings, &source),
    }
}

/// Read events either as a JSON array of triples or as a line log.
fn load_events(text: &str) -> Result<Vec<Event<'_>>, String> {
    if text.trim_start().starts_with('[') {
        let triples: Vec<(String, usize, usize)> =
            serde_json::from_str(text).map_err(|e| format!("invalid JSON events: {}", e))?;
        return Ok(triples
            .into_iter()
            .map(|(annot, start, end)| Event::new(Cow::Owned(annot), start, end))
            .collect());
    }
    EventLog::new(text)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ParseError::from(e).to_string())
}

fn report_warnings(warnings: &[(String, usize)]) {
    for (message, pos) in warnings {
        eprintln!("warning: {} at {}", message, pos);
    }
}

// =============================================================================
// Parse Command
// =============================================================================

fn cmd_parse(
    result: Result<Doc<'_>, ParseError>,
    warnings: &[(String, usize)],
    cli: &Cli,
) -> Result<(), String> {
    report_warnings(warnings);
    let doc = result.map_err(|e| e.to_string())?;

    if cli.json {
        print_json(&doc)?;
    } else if cli.verbose {
        print_document_verbose(&doc);
    } else {
        print_document_summary(&doc);
    }
    Ok(())
}

// =============================================================================
// Validate Command
// =============================================================================

fn cmd_validate(
    result: Result<Doc<'_>, ParseError>,
    warnings: &[(String, usize)],
    cli: &Cli,
) -> Result<(), String> {
    let error = result.err();

    if cli.json {
        let warnings: Vec<_> = warnings
            .iter()
            .map(|(message, pos)| serde_json::json!({"message": message, "offset": pos}))
            .collect();
        let error = error.as_ref().map(|e| {
            serde_json::json!({
                "message": e.to_string(),
                "kind": format!("{:?}", e.kind()),
                "span": e.span().map(|s| serde_json::json!({"start": s.start, "end": s.end})),
            })
        });
        println!(
            "{}",
            serde_json::json!({
                "valid": error.is_none() && warnings.is_empty(),
                "error": error,
                "warnings": warnings,
            })
        );
    } else if error.is_none() && warnings.is_empty() {
        println!("Valid: no errors or warnings");
    } else {
        if let Some(e) = &error {
            eprintln!("Invalid: {}", e);
        }
        if !warnings.is_empty() {
            eprintln!("{} warning(s):", warnings.len());
            for (message, pos) in warnings {
                eprintln!("  - {} at {}", message, pos);
            }
        }
    }

    match error {
        Some(e) => Err(e.to_string()),
        None if !warnings.is_empty() => Err(format!("{} warning(s) found", warnings.len())),
        None => Ok(()),
    }
}

// =============================================================================
// Stats Command
// =============================================================================

fn cmd_stats(
    result: Result<Doc<'_>, ParseError>,
    warnings: &[(String, usize)],
    source: &str,
) -> Result<(), String> {
    let doc = result.map_err(|e| e.to_string())?;
    let stats = DocumentStats::from_document(&doc, source);

    println!("Document Statistics");
    println!("-------------------");
    println!("Content:");
    println!("  Total blocks:   {}", stats.total_blocks);
    println!("  Headings:       {}", stats.headings);
    println!("  Paragraphs:     {}", stats.paragraphs);
    println!("  Lists:          {}", stats.lists);
    println!("  List items:     {}", stats.list_items);
    println!("  Tables:         {}", stats.tables);
    println!("  Block quotes:   {}", stats.block_quotes);
    println!("  Divs:           {}", stats.divs);
    println!("  Links:          {}", stats.links);
    println!("  Images:         {}", stats.images);
    println!();
    println!("Size:");
    println!("  Bytes:          {}", stats.bytes);
    println!("  Words (est.):   {}", stats.words);
    println!("  Lines:          {}", stats.lines);
    println!();
    println!("Warnings:       {}", warnings.len());
    Ok(())
}

#[derive(Default)]
struct DocumentStats {
    total_blocks: usize,
    headings: usize,
    paragraphs: usize,
    lists: usize,
    list_items: usize,
    tables: usize,
    block_quotes: usize,
    divs: usize,
    links: usize,
    images: usize,
    bytes: usize,
    words: usize,
    lines: usize,
}

impl DocumentStats {
    fn from_document(doc: &Doc, source: &str) -> Self {
        let mut stats = Self {
            bytes: source.len(),
            words: source.split_whitespace().count(),
            lines: source.lines().count(),
            ..Self::default()
        };
        stats.count_blocks(&doc.children);
        stats
    }

    fn count_blocks(&mut self, blocks: &[Block]) {
        for block in blocks {
            self.total_blocks += 1;
            match block {
                Block::Heading(h) => {
                    self.headings += 1;
                    self.count_inlines(&h.children);
                }
                Block::Para(p) => {
                    self.paragraphs += 1;
                    self.count_inlines(&p.children);
                }
                Block::List(l) => {
                    self.lists += 1;
                    self.list_items += l.children.len();
                    for item in &l.children {
                        self.count_blocks(&item.children);
                    }
                }
                Block::Table(t) => {
                    self.tables += 1;
                    for cell in t.children.iter().flat_map(|row| &row.children) {
                        self.count_blocks(&cell.children);
                    }
                }
                Block::BlockQuote(q) => {
                    self.block_quotes += 1;
                    self.count_blocks(&q.children);
                }
                Block::Div(d) => {
                    self.divs += 1;
                    self.count_blocks(&d.children);
                }
                Block::ThematicBreak(_) => {}
            }
        }
    }

    fn count_inlines(&mut self, inlines: &[Inline]) {
        for inline in inlines {
            match inline {
                Inline::Link(_) => self.links += 1,
                Inline::Image(_) => self.images += 1,
                _ => {}
            }
            if let Some(children) = inline.children() {
                self.count_inlines(children);
            }
        }
    }
}

// =============================================================================
// JSON Output
// =============================================================================

type JsonAttributes<'a> = Vec<(&'a str, &'a str)>;

#[derive(Serialize)]
struct JsonDocument<'a> {
    blocks: Vec<JsonBlock<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attributes: JsonAttributes<'a>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum JsonBlock<'a> {
    Para {
        content: Vec<JsonInline<'a>>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
    Heading {
        level: usize,
        content: Vec<JsonInline<'a>>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
    ThematicBreak {
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
    Div {
        blocks: Vec<JsonBlock<'a>>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
    BlockQuote {
        blocks: Vec<JsonBlock<'a>>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
    List {
        kind: &'static str,
        style: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        start: Option<i64>,
        tight: bool,
        items: Vec<JsonListItem<'a>>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
    Table {
        #[serde(skip_serializing_if = "Option::is_none")]
        caption: Option<JsonCaption<'a>>,
        rows: Vec<JsonTableRow<'a>>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
}

#[derive(Serialize)]
struct JsonListItem<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    checkbox: Option<bool>,
    blocks: Vec<JsonBlock<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attributes: JsonAttributes<'a>,
}

#[derive(Serialize)]
struct JsonCaption<'a> {
    content: Vec<JsonInline<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attributes: JsonAttributes<'a>,
}

#[derive(Serialize)]
struct JsonTableRow<'a> {
    head: bool,
    cells: Vec<JsonTableCell<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attributes: JsonAttributes<'a>,
}

#[derive(Serialize)]
struct JsonTableCell<'a> {
    align: &'static str,
    blocks: Vec<JsonBlock<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attributes: JsonAttributes<'a>,
}

/// Inline nodes. Every variant carries its attributes, omitted when empty.
#[derive(Serialize)]
#[serde(tag = "type")]
enum JsonInline<'a> {
    Str {
        text: &'a str,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
    SoftBreak {
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
    HardBreak {
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
    Emoji {
        alias: &'a str,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
    Verbatim {
        text: &'a str,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
    RightSingleQuote {
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
    Emph {
        content: Vec<JsonInline<'a>>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
    Strong {
        content: Vec<JsonInline<'a>>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
    Span {
        content: Vec<JsonInline<'a>>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
    Mark {
        content: Vec<JsonInline<'a>>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
    Insert {
        content: Vec<JsonInline<'a>>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
    Delete {
        content: Vec<JsonInline<'a>>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
    DoubleQuoted {
        content: Vec<JsonInline<'a>>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
    SingleQuoted {
        content: Vec<JsonInline<'a>>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
    Link {
        destination: &'a str,
        content: Vec<JsonInline<'a>>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
    Image {
        destination: &'a str,
        content: Vec<JsonInline<'a>>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: JsonAttributes<'a>,
    },
}

fn print_json(doc: &Doc) -> Result<(), String> {
    let json_doc = convert_document(doc);
    let text = serde_json::to_string_pretty(&json_doc).map_err(|e| e.to_string())?;
    println!("{}", text);
    Ok(())
}

fn convert_document<'a>(doc: &'a Doc) -> JsonDocument<'a> {
    JsonDocument {
        blocks: convert_blocks(&doc.children),
        attributes: convert_attributes(&doc.attributes),
    }
}

fn convert_attributes<'a>(attributes: &'a Attributes) -> JsonAttributes<'a> {
    attributes.iter().collect()
}

fn convert_blocks<'a>(blocks: &'a [Block]) -> Vec<JsonBlock<'a>> {
    blocks.iter().map(convert_block).collect()
}

fn convert_inlines<'a>(inlines: &'a [Inline]) -> Vec<JsonInline<'a>> {
    inlines.iter().map(convert_inline).collect()
}

fn list_kind_name(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Bullet => "bullet",
        ListKind::Ordered => "ordered",
        ListKind::Task => "task",
    }
}

fn alignment_name(align: Alignment) -> &'static str {
    match align {
        Alignment::Default => "default",
        Alignment::Left => "left",
        Alignment::Right => "right",
        Alignment::Center => "center",
    }
}

fn convert_block<'a>(block: &'a Block) -> JsonBlock<'a> {
    let attributes = convert_attributes(block.attributes());
    match block {
        Block::Para(p) => JsonBlock::Para {
            content: convert_inlines(&p.children),
            attributes,
        },
        Block::Heading(h) => JsonBlock::Heading {
            level: h.level,
            content: convert_inlines(&h.children),
            attributes,
        },
        Block::ThematicBreak(_) => JsonBlock::ThematicBreak { attributes },
        Block::Div(d) => JsonBlock::Div {
            blocks: convert_blocks(&d.children),
            attributes,
        },
        Block::BlockQuote(q) => JsonBlock::BlockQuote {
            blocks: convert_blocks(&q.children),
            attributes,
        },
        Block::List(l) => JsonBlock::List {
            kind: list_kind_name(l.kind),
            style: &l.style,
            start: l.start,
            tight: l.tight,
            items: l
                .children
                .iter()
                .map(|item| JsonListItem {
                    checkbox: item.checkbox,
                    blocks: convert_blocks(&item.children),
                    attributes: convert_attributes(&item.attributes),
                })
                .collect(),
            attributes,
        },
        Block::Table(t) => JsonBlock::Table {
            caption: t.caption.as_ref().map(|c| JsonCaption {
                content: convert_inlines(&c.children),
                attributes: convert_attributes(&c.attributes),
            }),
            rows: t
                .children
                .iter()
                .map(|row| JsonTableRow {
                    head: row.head,
                    cells: row
                        .children
                        .iter()
                        .map(|cell| JsonTableCell {
                            align: alignment_name(cell.align),
                            blocks: convert_blocks(&cell.children),
                            attributes: convert_attributes(&cell.attributes),
                        })
                        .collect(),
                    attributes: convert_attributes(&row.attributes),
                })
                .collect(),
            attributes,
        },
    }
}

fn convert_inline<'a>(inline: &'a Inline) -> JsonInline<'a> {
    let attributes = convert_attributes(inline.attributes());
    match inline {
        Inline::Str(t) => JsonInline::Str {
            text: &t.text,
            attributes,
        },
        Inline::SoftBreak(_) => JsonInline::SoftBreak { attributes },
        Inline::HardBreak(_) => JsonInline::HardBreak { attributes },
        Inline::Emoji(e) => JsonInline::Emoji {
            alias: &e.alias,
            attributes,
        },
        Inline::Verbatim(t) => JsonInline::Verbatim {
            text: &t.text,
            attributes,
        },
        Inline::RightSingleQuote(_) => JsonInline::RightSingleQuote { attributes },
        Inline::Emph(s) => JsonInline::Emph {
            content: convert_inlines(&s.children),
            attributes,
        },
        Inline::Strong(s) => JsonInline::Strong {
            content: convert_inlines(&s.children),
            attributes,
        },
        Inline::Span(s) => JsonInline::Span {
            content: convert_inlines(&s.children),
            attributes,
        },
        Inline::Mark(s) => JsonInline::Mark {
            content: convert_inlines(&s.children),
            attributes,
        },
        Inline::Insert(s) => JsonInline::Insert {
            content: convert_inlines(&s.children),
            attributes,
        },
        Inline::Delete(s) => JsonInline::Delete {
            content: convert_inlines(&s.children),
            attributes,
        },
        Inline::DoubleQuoted(s) => JsonInline::DoubleQuoted {
            content: convert_inlines(&s.children),
            attributes,
        },
        Inline::SingleQuoted(s) => JsonInline::SingleQuoted {
            content: convert_inlines(&s.children),
            attributes,
        },
        Inline::Link(l) => JsonInline::Link {
            destination: &l.destination,
            content: convert_inlines(&l.children),
            attributes,
        },
        Inline::Image(l) => JsonInline::Image {
            destination: &l.destination,
            content: convert_inlines(&l.children),
            attributes,
        },
    }
}

// =============================================================================
// Text Output
// =============================================================================

fn print_document_summary(doc: &Doc) {
    println!("Blocks: {}", doc.children.len());
    println!();

    for (i, block) in doc.children.iter().enumerate() {
        println!("  [{}] {}", i + 1, describe_block(block));
    }
}

fn describe_block(block: &Block) -> String {
    match block {
        Block::Heading(h) => format!("Heading (level {}): {}", h.level, preview(&h.children)),
        Block::Para(p) => format!("Paragraph: {}", preview(&p.children)),
        Block::ThematicBreak(_) => "Thematic break".to_string(),
        Block::Div(d) => format!("Div ({} blocks)", d.children.len()),
        Block::BlockQuote(q) => format!("Block quote ({} blocks)", q.children.len()),
        Block::List(l) => format!(
            "List ({}, style {:?}, {} items, {})",
            list_kind_name(l.kind),
            l.style,
            l.children.len(),
            if l.tight { "tight" } else { "loose" }
        ),
        Block::Table(t) => format!("Table ({} rows)", t.children.len()),
    }
}

fn preview(inlines: &[Inline]) -> String {
    let text = format_inlines(inlines);
    if text.chars().count() > 50 {
        let cut: String = text.chars().take(50).collect();
        format!("{}...", cut)
    } else {
        text
    }
}

fn print_document_verbose(doc: &Doc) {
    for (i, block) in doc.children.iter().enumerate() {
        println!("Block {}:", i + 1);
        print_block_verbose(block, 1);
    }
}

fn print_block_verbose(block: &Block, indent: usize) {
    let prefix = "  ".repeat(indent);
    println!("{}{}", prefix, describe_block(block));
    print_attributes(block.attributes(), &prefix);

    match block {
        Block::Div(d) => {
            for child in &d.children {
                print_block_verbose(child, indent + 1);
            }
        }
        Block::BlockQuote(q) => {
            for child in &q.children {
                print_block_verbose(child, indent + 1);
            }
        }
        Block::List(l) => {
            for (i, item) in l.children.iter().enumerate() {
                let checkbox = match item.checkbox {
                    Some(true) => " [x]",
                    Some(false) => " [ ]",
                    None => "",
                };
                println!("{}Item {}{}:", prefix, i + 1, checkbox);
                for child in &item.children {
                    print_block_verbose(child, indent + 1);
                }
            }
        }
        Block::Table(t) => {
            if let Some(caption) = &t.caption {
                println!("{}Caption: {}", prefix, format_inlines(&caption.children));
            }
            for (i, row) in t.children.iter().enumerate() {
                let head_marker = if row.head { " (header)" } else { "" };
                let cells: Vec<String> = row
                    .children
                    .iter()
                    .map(|cell| {
                        let text: Vec<String> = cell
                            .children
                            .iter()
                            .map(|b| match b {
                                Block::Para(p) => format_inlines(&p.children),
                                other => describe_block(other),
                            })
                            .collect();
                        text.join(" ")
                    })
                    .collect();
                println!("{}Row {}{}: {}", prefix, i + 1, head_marker, cells.join(" | "));
            }
        }
        _ => {}
    }
}

fn print_attributes(attributes: &Attributes, prefix: &str) {
    if attributes.is_empty() {
        return;
    }
    let pairs: Vec<String> = attributes
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, v))
        .collect();
    println!("{}Attributes: {{{}}}", prefix, pairs.join(" "));
}

fn format_inlines(inlines: &[Inline]) -> String {
    let mut result = String::new();
    for inline in inlines {
        match inline {
            Inline::Str(t) => result.push_str(&t.text),
            Inline::SoftBreak(_) => result.push(' '),
            Inline::HardBreak(_) => result.push_str("\\n"),
            Inline::Emoji(e) => {
                result.push(':');
                result.push_str(&e.alias);
                result.push(':');
            }
            Inline::Verbatim(t) => {
                result.push('`');
                result.push_str(&t.text);
                result.push('`');
            }
            Inline::RightSingleQuote(_) => result.push('\''),
            Inline::Emph(s) => wrap(&mut result, "_", &s.children, "_"),
            Inline::Strong(s) => wrap(&mut result, "*", &s.children, "*"),
            Inline::Span(s) => wrap(&mut result, "[", &s.children, "]"),
            Inline::Mark(s) => wrap(&mut result, "{=", &s.children, "=}"),
            Inline::Insert(s) => wrap(&mut result, "{+", &s.children, "+}"),
            Inline::Delete(s) => wrap(&mut result, "{-", &s.children, "-}"),
            Inline::DoubleQuoted(s) => wrap(&mut result, "\"", &s.children, "\""),
            Inline::SingleQuoted(s) => wrap(&mut result, "'", &s.children, "'"),
            Inline::Link(l) => {
                wrap(&mut result, "[", &l.children, "](");
                result.push_str(&l.destination);
                result.push(')');
            }
            Inline::Image(l) => {
                wrap(&mut result, "![", &l.children, "](");
                result.push_str(&l.destination);
                result.push(')');
            }
        }
    }
    result
}

fn wrap(result: &mut String, open: &str, inlines: &[Inline], close: &str) {
    result.push_str(open);
    result.push_str(&format_inlines(inlines));
    result.push_str(close);
}
