//! Command-line interface for jtree.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// jtree - build and inspect djot document trees from tokenizer events.
#[derive(Parser, Debug)]
#[command(
    name = "jtree",
    version,
    about = "Build and inspect djot document trees from tokenizer event streams",
    after_help = "Event files hold one `<annot> <startpos> <endpos>` per line, or a JSON \
                  array of [annot, startpos, endpos] triples.\n\n\
                  Examples:\n  \
                  jtree parse doc.dj --events doc.events\n  \
                  jtree parse -v doc.dj --events doc.events\n  \
                  jtree --json parse doc.dj --events doc.json\n  \
                  jtree validate doc.dj --events doc.events\n  \
                  jtree stats doc.dj --events doc.events"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output in JSON format
    #[arg(short = 'j', long = "json", global = true)]
    pub json: bool,

    /// Show the full tree instead of a summary
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(short = 'l', long = "log-level", default_value = "warn", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the tree and display its structure
    Parse(Input),
    /// Build the tree and report errors and warnings only
    Validate(Input),
    /// Show document statistics
    Stats(Input),
}

impl Command {
    pub fn input(&self) -> &Input {
        match self {
            Command::Parse(input) | Command::Validate(input) | Command::Stats(input) => input,
        }
    }
}

/// Source text and the event stream describing it.
#[derive(Args, Debug)]
pub struct Input {
    /// Djot source the events refer to
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Event stream produced by a djot tokenizer
    #[arg(short = 'e', long = "events", value_name = "FILE")]
    pub events: PathBuf,
}
