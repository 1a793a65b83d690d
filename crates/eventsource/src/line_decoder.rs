use std::mem;
use std::str;

const REPLACEMENT: char = '\u{FFFD}';

/// Splits an arbitrarily chunked UTF-8 byte stream into complete lines.
///
/// Feeding a byte sequence through `append` in any number of pieces yields the
/// same lines as feeding it whole: a multi-byte character split across chunks
/// is held back until it completes, and a CRLF pair split across chunks counts
/// as one terminator.
#[derive(Debug, Default)]
pub struct Utf8LineDecoder {
    remainder: Vec<u8>,
    line: String,
    seen_cr: bool,
}

impl Utf8LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one chunk and returns the lines it completed, in order and
    /// without their terminators. The final unterminated line stays buffered.
    pub fn append(&mut self, chunk: &[u8]) -> Vec<String> {
        let carried: Vec<u8>;
        let mut input: &[u8] = if self.remainder.is_empty() {
            chunk
        } else {
            self.remainder.extend_from_slice(chunk);
            carried = mem::take(&mut self.remainder);
            &carried
        };

        let mut lines = Vec::new();
        loop {
            match str::from_utf8(input) {
                Ok(text) => {
                    self.take_scalars(text, &mut lines);
                    break;
                }
                Err(err) => {
                    let (valid, rest) = input.split_at(err.valid_up_to());
                    self.take_scalars(str::from_utf8(valid).unwrap_or(""), &mut lines);
                    self.seen_cr = false;
                    match err.error_len() {
                        Some(bad) => {
                            // Invalid sequence with more bytes behind it can
                            // never complete; substitute and move on.
                            self.line.push(REPLACEMENT);
                            input = &rest[bad..];
                        }
                        None => {
                            // Possibly a code point split at the chunk edge;
                            // hold the tail until the next call.
                            self.remainder = rest.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        lines
    }

    /// Drops the partial line, held-over bytes, and CR state so a fresh
    /// connection starts clean.
    pub fn close_and_reset(&mut self) {
        self.remainder.clear();
        self.line.clear();
        self.seen_cr = false;
    }

    fn take_scalars(&mut self, text: &str, lines: &mut Vec<String>) {
        for ch in text.chars() {
            if self.seen_cr && ch == '\n' {
                // LF half of a CRLF pair; the CR already ended the line.
                self.seen_cr = false;
                continue;
            }
            self.seen_cr = ch == '\r';
            if ch == '\r' || ch == '\n' {
                lines.push(mem::take(&mut self.line));
            } else {
                self.line.push(ch);
            }
        }
    }
}
