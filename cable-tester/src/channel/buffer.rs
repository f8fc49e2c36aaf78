//! Transcript buffer with terminal escape stripping.
//!
//! The CLI shell runs on a vt100 PTY, so the firmware's output arrives
//! interleaved with colour codes, cursor movement and carriage returns.
//! Chunks are fed through a `vte` parser that keeps only printable text
//! and line structure. Parser state survives across chunks, so an escape
//! sequence or UTF-8 character split over two reads is still handled.

use vte::{Parser, Perform};

/// Accumulates the text of an interactive session.
pub struct TranscriptBuffer {
    parser: Parser,
    text: TextCollector,

    /// Bytes received before stripping.
    raw_len: usize,
}

#[derive(Default)]
struct TextCollector {
    out: String,
}

impl Perform for TextCollector {
    fn print(&mut self, c: char) {
        self.out.push(c);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            b'\n' => self.out.push('\n'),
            b'\t' => self.out.push('\t'),
            // \r, bell, backspace and the rest carry no table content
            _ => {}
        }
    }
}

impl TranscriptBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            text: TextCollector::default(),
            raw_len: 0,
        }
    }

    /// Feed a chunk of raw shell output.
    pub fn extend(&mut self, data: &[u8]) {
        self.raw_len += data.len();
        self.parser.advance(&mut self.text, data);
    }

    /// The stripped text collected so far.
    pub fn as_str(&self) -> &str {
        &self.text.out
    }

    /// Number of raw bytes received, escapes included.
    pub fn raw_len(&self) -> usize {
        self.raw_len
    }

    /// Whether nothing at all has been received.
    pub fn is_empty(&self) -> bool {
        self.raw_len == 0
    }

    /// Consume the buffer, returning the stripped text.
    pub fn into_string(self) -> String {
        self.text.out
    }
}

impl Default for TranscriptBuffer {
    fn default() -> Self {
        Self::new()
    }
}
