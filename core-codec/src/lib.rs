//! # MP3 Codec Core
//!
//! Streaming MP3 encode and decode on top of pluggable codec engines.
//!
//! ## Overview
//!
//! This crate handles:
//! - Encoder sessions fed with arbitrarily chunked 16-bit PCM ([`Mp3Encoder`])
//! - Decoder sessions fed with arbitrarily chunked MP3 ([`Mp3Decoder`])
//! - The minimal WAV container subset needed on either side ([`wav`])
//! - Whole-stream conversions between the two ([`streaming`])
//!
//! Engines are reached only through the `bridge-traits` boundary. With the
//! default `native-engines` feature, `bridge-native` supplies LAME for
//! encoding and a Symphonia-backed decoder, and the convenience
//! constructors ([`Mp3Encoder::new`], [`encode_from_wav`], ...) use them.
//!
//! Sessions are synchronous and single-threaded. Separate sessions can run
//! on separate threads.

pub mod aligner;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod streaming;
pub mod wav;

pub use aligner::FrameAligner;
pub use config::{EncoderConfig, StreamingConfig};
pub use decoder::{Mp3Decoder, DECODE_OUTPUT_ESTIMATE};
pub use encoder::Mp3Encoder;
pub use error::{CodecError, Result};
pub use streaming::{decode_to_wav_with, encode_from_wav_with, DecodeSummary, EncodeSummary};
pub use wav::{AppendOnly, PcmFormat, WavInfo, WavReader};

#[cfg(feature = "native-engines")]
pub use streaming::{decode_to_wav, encode_from_wav};

pub use bridge_traits::engine::{StereoMode, VbrMode};
