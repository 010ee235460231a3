//! # Codec Configuration
//!
//! Configuration types for encoder sessions and the stream orchestrators.
//!
//! Encoder options are never rejected here: zero values fall back to their
//! defaults and an out-of-range quality resets to 2. Only the engine itself
//! can refuse a parameter, which surfaces as
//! [`CodecError::InvalidConfiguration`](crate::error::CodecError::InvalidConfiguration)
//! when the session is created.

use bridge_traits::engine::{EncodeParams, StereoMode, VbrMode};
use serde::{Deserialize, Serialize};

/// Default input sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
/// Default channel count (stereo).
pub const DEFAULT_CHANNELS: u16 = 2;
/// Default bitrate in kbps.
pub const DEFAULT_BITRATE: u32 = 128;
/// Default quality (near-best, not too slow).
pub const DEFAULT_QUALITY: u8 = 2;
/// Highest (worst) quality level.
pub const MAX_QUALITY: u8 = 9;
/// Bytes read from the source per orchestrator iteration.
pub const DEFAULT_READ_CHUNK_BYTES: usize = 2048;

/// Encoder session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Input sample rate in Hz. `0` means the default (44100).
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Interleaved input channels. `0` means the default (2).
    #[serde(default = "default_channels")]
    pub channels: u16,

    /// Target bitrate in kbps, nominally one of 32, 40, 48, 56, 64, 80, 96,
    /// 112, 128, 160, 192, 224, 256 or 320. `0` means the default (128).
    #[serde(default = "default_bitrate")]
    pub bitrate: u32,

    /// Quality 0-9, lower is better and slower. Out-of-range values reset to 2.
    #[serde(default = "default_quality")]
    pub quality: u8,

    #[serde(default)]
    pub vbr_mode: VbrMode,

    /// Output channel mode. `None` lets the engine choose.
    #[serde(default)]
    pub stereo_mode: Option<StereoMode>,

    /// Write a Xing/Info tag frame at the start of the stream.
    #[serde(default = "default_write_vbr_tag")]
    pub write_vbr_tag: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            bitrate: default_bitrate(),
            quality: default_quality(),
            vbr_mode: VbrMode::default(),
            stereo_mode: None,
            write_vbr_tag: default_write_vbr_tag(),
        }
    }
}

impl EncoderConfig {
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_bitrate(mut self, bitrate: u32) -> Self {
        self.bitrate = bitrate;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_vbr_mode(mut self, vbr_mode: VbrMode) -> Self {
        self.vbr_mode = vbr_mode;
        self
    }

    pub fn with_stereo_mode(mut self, stereo_mode: StereoMode) -> Self {
        self.stereo_mode = Some(stereo_mode);
        self
    }

    pub fn with_vbr_tag(mut self, write: bool) -> Self {
        self.write_vbr_tag = write;
        self
    }

    /// Apply the defaulting and clamping rules and produce engine parameters.
    pub fn normalized(&self) -> EncodeParams {
        EncodeParams {
            sample_rate: non_zero_or(self.sample_rate, DEFAULT_SAMPLE_RATE),
            channels: non_zero_or(self.channels, DEFAULT_CHANNELS),
            bitrate: non_zero_or(self.bitrate, DEFAULT_BITRATE),
            quality: if self.quality > MAX_QUALITY {
                DEFAULT_QUALITY
            } else {
                self.quality
            },
            vbr_mode: self.vbr_mode,
            stereo_mode: self.stereo_mode,
            write_vbr_tag: self.write_vbr_tag,
        }
    }
}

fn non_zero_or<T: PartialEq + Default>(value: T, default: T) -> T {
    if value == T::default() {
        default
    } else {
        value
    }
}

/// Orchestrator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Bytes requested from the source per read.
    ///
    /// Default: 2048. Zero is treated as the default.
    #[serde(default = "default_read_chunk_bytes")]
    pub read_chunk_bytes: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            read_chunk_bytes: default_read_chunk_bytes(),
        }
    }
}

impl StreamingConfig {
    pub fn with_read_chunk_bytes(mut self, bytes: usize) -> Self {
        self.read_chunk_bytes = bytes;
        self
    }

    /// Effective chunk size, with zero mapped to the default.
    pub fn chunk_bytes(&self) -> usize {
        non_zero_or(self.read_chunk_bytes, DEFAULT_READ_CHUNK_BYTES)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        const MAX_READ_CHUNK_BYTES: usize = 16 * 1024 * 1024;
        if self.read_chunk_bytes > MAX_READ_CHUNK_BYTES {
            return Err(format!(
                "read_chunk_bytes must be <= {} (got {})",
                MAX_READ_CHUNK_BYTES, self.read_chunk_bytes
            ));
        }
        Ok(())
    }
}

// Default value functions for serde

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_channels() -> u16 {
    DEFAULT_CHANNELS
}

fn default_bitrate() -> u32 {
    DEFAULT_BITRATE
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

fn default_write_vbr_tag() -> bool {
    true
}

fn default_read_chunk_bytes() -> usize {
    DEFAULT_READ_CHUNK_BYTES
}
