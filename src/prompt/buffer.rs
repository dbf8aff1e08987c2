// src/prompt/buffer.rs

/// Once the buffer grows past this many bytes it is trimmed...
pub const HIGH_WATER: usize = 4096;
/// ...down to the most recent this-many bytes.
pub const KEEP_TAIL: usize = 2048;

/// Bounded accumulation of raw PTY output.
///
/// Prompts can arrive split over several reads, so matching runs against
/// everything seen since the last answer, capped so a chatty child cannot
/// grow it without bound.
#[derive(Debug, Default)]
pub struct PromptBuffer {
    bytes: Vec<u8>,
}

impl PromptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
        if self.bytes.len() > HIGH_WATER {
            let cut = self.bytes.len() - KEEP_TAIL;
            self.bytes.drain(..cut);
        }
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_pushes_accumulate() {
        let mut buf = PromptBuffer::new();
        buf.push(b"Do you want ");
        buf.push(b"to continue?");
        assert_eq!(buf.as_bytes(), b"Do you want to continue?");
    }

    #[test]
    fn trims_to_tail_once_over_high_water() {
        let mut buf = PromptBuffer::new();
        buf.push(&vec![b'a'; HIGH_WATER]);
        assert_eq!(buf.len(), HIGH_WATER);

        buf.push(b"(y/n)");
        assert_eq!(buf.len(), KEEP_TAIL);
        assert!(buf.as_bytes().ends_with(b"(y/n)"));
    }

    #[test]
    fn clear_empties() {
        let mut buf = PromptBuffer::new();
        buf.push(b"x");
        buf.clear();
        assert!(buf.is_empty());
    }
}
