//! # Frame Aligner
//!
//! Cuts an arbitrarily chunked byte stream into runs of whole sample frames.
//!
//! Every slice returned by [`FrameAligner::align`] has a length that is an
//! exact multiple of the frame width. Bytes that do not complete a frame are
//! carried over and prepended to the next chunk, so the concatenation of all
//! aligned output equals the input with at most `frame_width - 1` trailing
//! bytes still held back.

use std::borrow::Cow;

use bytes::BytesMut;

/// Accumulates encode-side input into whole sample frames.
#[derive(Debug, Clone)]
pub struct FrameAligner {
    frame_width: usize,
    carry: BytesMut,
}

impl FrameAligner {
    /// Create an aligner for frames of `frame_width` bytes (`channels x bytes per sample`).
    pub fn new(frame_width: usize) -> Self {
        let frame_width = frame_width.max(1);
        Self {
            frame_width,
            carry: BytesMut::with_capacity(frame_width),
        }
    }

    pub fn frame_width(&self) -> usize {
        self.frame_width
    }

    /// Prepend the carry-over to `chunk` and return the largest whole-frame prefix.
    ///
    /// The returned slice may be empty when carry-over plus chunk still do
    /// not complete a frame.
    pub fn align<'a>(&mut self, chunk: &'a [u8]) -> Cow<'a, [u8]> {
        if self.carry.is_empty() {
            let aligned = chunk.len() - chunk.len() % self.frame_width;
            self.carry.extend_from_slice(&chunk[aligned..]);
            return Cow::Borrowed(&chunk[..aligned]);
        }

        let mut combined = Vec::with_capacity(self.carry.len() + chunk.len());
        combined.extend_from_slice(&self.carry);
        combined.extend_from_slice(chunk);
        self.carry.clear();

        let aligned = combined.len() - combined.len() % self.frame_width;
        self.carry.extend_from_slice(&combined[aligned..]);
        combined.truncate(aligned);
        Cow::Owned(combined)
    }

    /// Bytes held back because they do not complete a frame.
    pub fn pending(&self) -> &[u8] {
        &self.carry
    }

    /// Discard the carry-over.
    pub fn clear(&mut self) {
        self.carry.clear();
    }
}
