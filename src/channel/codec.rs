//! Single-byte text framing used on the pipes.
//!
//! Every message is Latin-1 text followed by one NUL byte. Decoding keeps the
//! NUL as the last character so structured consumers can strip it themselves.

/// Byte that ends every frame on the wire.
pub const TERMINATOR: u8 = 0x00;

/// The terminator as it appears at the end of a decoded message.
pub const TERMINATOR_CHAR: char = '\0';

/// Substitute for characters that have no single-byte representation.
const UNMAPPABLE: u8 = b'?';

/// Encode `text` as single-byte characters and append the terminator.
pub fn encode_frame(text: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(text.len() + 1);
    frame.extend(text.chars().map(|ch| u8::try_from(u32::from(ch)).unwrap_or(UNMAPPABLE)));
    frame.push(TERMINATOR);
    frame
}

/// Decode single-byte characters back into text. Every byte maps to one char.
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Drop a single trailing terminator, if present.
pub fn strip_terminator(message: &str) -> &str {
    message.strip_suffix(TERMINATOR_CHAR).unwrap_or(message)
}

/// Accumulates raw reads and hands back whole frames.
///
/// A pipe read may return part of a frame or several frames at once; this
/// keeps the leftovers between reads.
#[derive(Debug, Default)]
pub(crate) struct FrameBuffer {
    pending: Vec<u8>,
}

impl FrameBuffer {
    pub(crate) fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Next complete frame, terminator included.
    pub(crate) fn next_frame(&mut self) -> Option<Vec<u8>> {
        let end = self.pending.iter().position(|&b| b == TERMINATOR)?;
        let rest = self.pending.split_off(end + 1);
        Some(std::mem::replace(&mut self.pending, rest))
    }

    /// Whatever is left once the peer is gone; `None` when nothing is buffered.
    pub(crate) fn take_remainder(&mut self) -> Option<Vec<u8>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}
