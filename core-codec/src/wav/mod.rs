//! # WAV Container Support
//!
//! The minimal RIFF/WAVE subset needed to locate a PCM payload and to write
//! one back out.
//!
//! ## Overview
//!
//! - [`WavReader`] validates the RIFF prologue, walks chunks until `data`
//!   and then exposes exactly the declared payload as a byte stream
//! - [`header_bytes`] builds the canonical 44-byte header
//! - [`AppendOnly`] marks a destination that cannot be seeked, so the
//!   decode path fails instead of shipping an unpatched header
//!
//! Only linear PCM (format code 1) is understood. Trailing chunks after
//! `data` are never parsed.

mod reader;
mod sink;
mod writer;

pub use reader::{read_header, WavInfo, WavReader};
pub use sink::AppendOnly;
pub use writer::{header_bytes, placeholder_header, write_header};

use std::time::Duration;

/// Size of the canonical header in bytes.
pub const HEADER_LEN: usize = 44;

/// Audio format code for linear PCM.
pub const FORMAT_PCM: u16 = 1;

/// Layout of interleaved PCM samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl PcmFormat {
    pub fn new(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
        }
    }

    /// Bytes in one sample frame (`channels x bits / 8`).
    pub fn frame_width(&self) -> usize {
        self.channels as usize * self.bits_per_sample as usize / 8
    }

    /// Bytes per second of audio. Saturates at `u32::MAX`.
    pub fn byte_rate(&self) -> u32 {
        let rate = self.sample_rate as u64 * self.frame_width() as u64;
        u32::try_from(rate).unwrap_or(u32::MAX)
    }

    /// Same as [`frame_width`](Self::frame_width), as stored in the header.
    /// Saturates at `u16::MAX`.
    pub fn block_align(&self) -> u16 {
        u16::try_from(self.frame_width()).unwrap_or(u16::MAX)
    }

    /// Playback time of `payload_bytes` of audio in this format.
    pub fn duration_of(&self, payload_bytes: u64) -> Duration {
        let byte_rate = self.byte_rate();
        if byte_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(payload_bytes as f64 / byte_rate as f64)
    }
}
