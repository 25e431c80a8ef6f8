//! Text accumulation mode.
//!
//! Inside verbatim spans and link destinations, text events are gathered
//! into a side buffer and emitted as a single node when the construct
//! closes, instead of becoming individual `Str` nodes.

/// How text events are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Context {
    /// Text events become nodes immediately.
    #[default]
    Normal,
    /// Gather `str`, `escape`, `softbreak` and `hardbreak` into the buffer.
    Verbatim,
    /// Gather `str`, `softbreak` and `hardbreak`; escapes are not recorded.
    Literal,
}

/// The current mode together with its side buffer.
#[derive(Debug, Default)]
pub struct Accumulator {
    context: Context,
    buffer: String,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn context(&self) -> Context {
        self.context
    }

    #[inline]
    pub fn is_normal(&self) -> bool {
        self.context == Context::Normal
    }

    /// Switch to `context`; the buffer is left untouched.
    #[inline]
    pub fn enter(&mut self, context: Context) {
        self.context = context;
    }

    #[inline]
    pub fn push(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Take the gathered text, clear the buffer and return to `Normal`.
    pub fn finish(&mut self) -> String {
        self.context = Context::Normal;
        std::mem::take(&mut self.buffer)
    }

    /// The text gathered so far.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }
}
