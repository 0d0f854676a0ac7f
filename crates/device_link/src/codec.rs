//! Line codec for the newline-delimited device stream
//!
//! Bytes arrive in arbitrary chunks; a record is only complete once its
//! terminator has been seen. Partial records stay buffered across reads.

/// Longest unterminated run kept before it is treated as garbage
pub const MAX_LINE_LEN: usize = 1024;

/// Accumulates raw bytes and yields complete lines
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes from the transport
    ///
    /// Returns how many buffered bytes were thrown away as over-long garbage.
    pub fn extend(&mut self, bytes: &[u8]) -> usize {
        self.buf.extend_from_slice(bytes);

        // A device that never sends '\n' (wrong baud rate, boot noise) must not grow us forever
        if self.buf.len() > MAX_LINE_LEN && !self.buf.contains(&b'\n') {
            let dropped = self.buf.len();
            self.buf.clear();
            return dropped;
        }
        0
    }

    /// Pop the next complete, non-blank line (without terminator)
    pub fn next_line(&mut self) -> Option<String> {
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..pos]);
            let line = line.trim();

            if !line.is_empty() {
                return Some(line.to_string());
            }
        }
        None
    }

    /// Bytes held that do not yet form a complete line
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
