// src/prompt/ansi.rs

//! Terminal control-sequence filtering.
//!
//! The child runs on a PTY, so its output is full of colour codes, cursor
//! movement and title updates. Prompt matching needs plain text, and the
//! echo to the real stdout is shown without them as well.
//!
//! Handles:
//! - CSI sequences: `ESC [ ... <final byte>`
//! - OSC sequences: `ESC ] ... ST` (ST is `ESC \` or BEL)
//! - charset designations: `ESC ( B` and friends
//! - simple two-byte escapes: `ESC <byte>`
//!
//! Carriage returns and newlines are kept. The 8-bit CSI byte `0x9B` is
//! left alone: in UTF-8 output it is a continuation byte.

const ESC: u8 = 0x1B;
const BEL: u8 = 0x07;

/// Cap on bytes held back while waiting for a sequence to complete. A
/// runaway OSC without terminator must not stall the echo forever.
const MAX_PENDING: usize = 256;

/// Strip control sequences from a complete byte slice.
///
/// An unterminated sequence at the end is dropped.
pub fn strip_control_sequences(input: &[u8]) -> Vec<u8> {
    scan(input).0
}

/// Strip control sequences and decode as (lossy) UTF-8.
pub fn clean_text(input: &[u8]) -> String {
    String::from_utf8_lossy(&strip_control_sequences(input)).into_owned()
}

/// Streaming variant of [`strip_control_sequences`] for chunked output.
///
/// A sequence split across two chunks is held back until the rest arrives,
/// so fragments like `1;31m` never leak onto the screen.
#[derive(Debug, Default)]
pub struct AnsiFilter {
    pending: Vec<u8>,
}

impl AnsiFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&mut self, chunk: &[u8]) -> Vec<u8> {
        self.pending.extend_from_slice(chunk);
        let (out, consumed) = scan(&self.pending);
        self.pending.drain(..consumed);
        if self.pending.len() > MAX_PENDING {
            self.pending.clear();
        }
        out
    }
}

/// Returns the filtered bytes and how many input bytes were consumed. Any
/// unconsumed tail is the start of an incomplete sequence.
fn scan(input: &[u8]) -> (Vec<u8>, usize) {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        match input[i] {
            ESC => match escape_len(&input[i..]) {
                Some(n) => i += n,
                None => return (out, i),
            },
            BEL => i += 1,
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    (out, i)
}

/// Length of the escape sequence at the start of `seq` (`seq[0] == ESC`),
/// or `None` if it is not complete yet.
fn escape_len(seq: &[u8]) -> Option<usize> {
    match *seq.get(1)? {
        b'[' => csi_len(&seq[2..]).map(|n| 2 + n),
        b']' => osc_len(&seq[2..]).map(|n| 2 + n),
        b'(' | b')' | b'*' | b'+' | b'#' | b'%' => seq.get(2).map(|_| 3),
        _ => Some(2),
    }
}

fn csi_len(body: &[u8]) -> Option<usize> {
    for (idx, &b) in body.iter().enumerate() {
        if (0x40..=0x7E).contains(&b) {
            return Some(idx + 1);
        }
        if !(0x20..=0x3F).contains(&b) {
            // Malformed: drop what we have, keep the offending byte.
            return Some(idx);
        }
    }
    None
}

fn osc_len(body: &[u8]) -> Option<usize> {
    let mut idx = 0;
    while idx < body.len() {
        match body[idx] {
            BEL => return Some(idx + 1),
            ESC => match body.get(idx + 1) {
                Some(b'\\') => return Some(idx + 2),
                Some(_) => idx += 1,
                None => return None,
            },
            _ => idx += 1,
        }
    }
    None
}
