//! Groups raw tcpdump output lines into per-packet text blocks.
//!
//! tcpdump with `-l -A` prints one boundary line per packet (leading
//! `HH:MM:SS.ffffff` timestamp) followed by the ASCII payload. A new
//! boundary flushes the previously accumulated block. This is a
//! line-buffering heuristic, not length-prefixed framing: it assumes one
//! packet per detected boundary and does not resynchronize after malformed
//! or interleaved output.

use regex::Regex;

/// Accumulates raw capture lines into packet blocks.
#[derive(Debug)]
pub struct PacketAssembler {
    boundary: Regex,
    block: Vec<String>,
}

impl PacketAssembler {
    /// Create an assembler matching the default tcpdump timestamp boundary.
    #[must_use]
    pub fn new() -> Self {
        Self {
            // tcpdump packet header, e.g. "12:34:56.789012 IP 10.0.0.1.5060 > ..."
            boundary: Regex::new(r"^\d{2}:\d{2}:\d{2}\.\d+\s").expect("valid boundary pattern"),
            block: Vec::new(),
        }
    }

    /// Feed one raw line. Returns the completed previous block when the
    /// line starts a new packet.
    pub fn feed(&mut self, line: &str) -> Option<String> {
        if self.boundary.is_match(line) {
            let finished = self.take_block();
            self.block.push(line.to_string());
            return finished;
        }

        if !line.trim().is_empty() {
            self.block.push(line.to_string());
        }
        None
    }

    /// Flush the remaining block at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        self.take_block()
    }

    /// Drop any partially accumulated block without flushing it.
    pub fn discard(&mut self) {
        self.block.clear();
    }

    /// Number of lines buffered in the current block.
    #[must_use]
    pub fn pending_lines(&self) -> usize {
        self.block.len()
    }

    fn take_block(&mut self) -> Option<String> {
        if self.block.is_empty() {
            return None;
        }
        let block = self.block.join("\n");
        self.block.clear();
        Some(block)
    }
}

impl Default for PacketAssembler {
    fn default() -> Self {
        Self::new()
    }
}
