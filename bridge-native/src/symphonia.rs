//! # Symphonia Feed Decode Engine
//!
//! Incremental MP3 decoder built from [`FrameSync`] and Symphonia's MP3
//! codec.
//!
//! ## Overview
//!
//! Symphonia decodes packets, not byte streams. Fed bytes are therefore cut
//! into whole Layer III frames first, and each frame is handed to the codec
//! as one packet. Decoded audio is converted to interleaved signed 16-bit
//! little-endian PCM and queued until the caller reads it.
//!
//! ## Read Protocol
//!
//! - `(NewFormat, 0)` once whenever the output format is first discovered
//!   or changes, before any bytes in that format are returned
//! - `(Ok, n)` while decoded bytes are queued
//! - `(NeedMore, 0)` when every complete fed frame has been consumed
//!
//! The engine runs quietly: skipped frames and resyncs are only logged at
//! debug level or below.

use std::sync::OnceLock;

use bridge_traits::engine::{DecodeEngine, DecodeStatus, DecodedFormat, SampleEncoding};
use bridge_traits::error::EngineError;
use bytes::{Buf, BytesMut};
use symphonia::core::audio::{Channels, SampleBuffer};
use symphonia::core::codecs::{CodecParameters, Decoder, DecoderOptions, CODEC_TYPE_MP3};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::Packet;
use symphonia::default::get_codecs;
use tracing::{debug, info, trace};

use crate::mpeg::{is_vbr_tag_frame, FrameHeader, FrameSync, SyncedFrame};

/// Consecutive undecodable frames tolerated before the stream is declared corrupt.
const MAX_CONSECUTIVE_ERRORS: usize = 32;

static LIBRARY: OnceLock<Result<(), String>> = OnceLock::new();

/// Process-wide decoder library initialization.
///
/// Runs its check exactly once; every later call returns the cached outcome.
pub fn init_library() -> Result<(), EngineError> {
    LIBRARY
        .get_or_init(|| {
            if get_codecs().get_codec(CODEC_TYPE_MP3).is_some() {
                info!("MP3 decoder library initialized");
                Ok(())
            } else {
                Err("MP3 codec is not registered".to_string())
            }
        })
        .clone()
        .map_err(EngineError::Init)
}

fn channel_layout(channels: u16) -> Channels {
    if channels == 1 {
        Channels::FRONT_LEFT
    } else {
        Channels::FRONT_LEFT | Channels::FRONT_RIGHT
    }
}

/// Feed-mode MP3 decode engine.
pub struct SymphoniaDecodeEngine {
    sync: FrameSync,
    decoder: Option<Box<dyn Decoder>>,
    /// Sample rate and channel count the current decoder was built for.
    decoder_params: Option<(u32, u16)>,
    sample_buffer: Option<SampleBuffer<i16>>,
    /// Decoded PCM not yet handed to the caller.
    pending: BytesMut,
    format: Option<DecodedFormat>,
    format_changed: bool,
    frames_seen: u64,
    timestamp: u64,
    consecutive_errors: usize,
}

impl Default for SymphoniaDecodeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SymphoniaDecodeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymphoniaDecodeEngine")
            .field("format", &self.format)
            .field("frames_seen", &self.frames_seen)
            .field("pending_bytes", &self.pending.len())
            .field("buffered_input", &self.sync.buffered())
            .finish_non_exhaustive()
    }
}

impl SymphoniaDecodeEngine {
    pub fn new() -> Self {
        Self {
            sync: FrameSync::new(),
            decoder: None,
            decoder_params: None,
            sample_buffer: None,
            pending: BytesMut::new(),
            format: None,
            format_changed: false,
            frames_seen: 0,
            timestamp: 0,
            consecutive_errors: 0,
        }
    }

    fn ensure_decoder(&mut self, header: &FrameHeader) -> Result<(), EngineError> {
        let params = (header.sample_rate, header.channels);
        if self.decoder.is_some() && self.decoder_params == Some(params) {
            return Ok(());
        }

        let mut codec_params = CodecParameters::new();
        codec_params
            .for_codec(CODEC_TYPE_MP3)
            .with_sample_rate(header.sample_rate)
            .with_channels(channel_layout(header.channels))
            .with_max_frames_per_packet(header.samples_per_frame() as u64);

        let decoder = get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| EngineError::Init(format!("Failed to create MP3 decoder: {}", e)))?;

        debug!(
            sample_rate = header.sample_rate,
            channels = header.channels,
            "Created MP3 codec decoder"
        );
        self.decoder = Some(decoder);
        self.decoder_params = Some(params);
        self.sample_buffer = None;
        Ok(())
    }

    /// Decode one frame into the pending queue.
    fn decode_frame(&mut self, frame: SyncedFrame) -> Result<(), EngineError> {
        let first = self.frames_seen == 0;
        self.frames_seen += 1;
        if first && is_vbr_tag_frame(&frame.header, &frame.data) {
            trace!("Skipping VBR tag frame");
            return Ok(());
        }

        self.ensure_decoder(&frame.header)?;
        let Some(decoder) = self.decoder.as_mut() else {
            return Ok(());
        };

        let duration = frame.header.samples_per_frame() as u64;
        let packet = Packet::new_from_slice(0, self.timestamp, duration, &frame.data);
        self.timestamp += duration;

        let skipped = match decoder.decode(&packet) {
            Ok(decoded) if decoded.frames() == 0 => None,
            Ok(decoded) => {
                let spec = *decoded.spec();
                let capacity = decoded.capacity();
                let reusable = self
                    .sample_buffer
                    .as_ref()
                    .is_some_and(|buffer| buffer.capacity() >= capacity);
                if !reusable {
                    self.sample_buffer = Some(SampleBuffer::<i16>::new(capacity as u64, spec));
                }

                if let Some(buffer) = self.sample_buffer.as_mut() {
                    buffer.copy_interleaved_ref(decoded);
                    for sample in buffer.samples() {
                        self.pending.extend_from_slice(&sample.to_le_bytes());
                    }
                }

                let format = DecodedFormat {
                    sample_rate: spec.rate,
                    channels: spec.channels.count() as u16,
                    encoding: SampleEncoding::Signed16,
                };
                if self.format != Some(format) {
                    debug!(
                        sample_rate = format.sample_rate,
                        channels = format.channels,
                        "Output format discovered"
                    );
                    self.format = Some(format);
                    self.format_changed = true;
                }
                None
            }
            Err(SymphoniaError::DecodeError(err)) => Some(err.to_string()),
            Err(SymphoniaError::IoError(err)) => Some(err.to_string()),
            Err(e) => return Err(EngineError::Decode(e.to_string())),
        };

        match skipped {
            Some(reason) => self.skip_frame(&reason),
            None => {
                self.consecutive_errors = 0;
                Ok(())
            }
        }
    }

    fn skip_frame(&mut self, reason: &str) -> Result<(), EngineError> {
        self.consecutive_errors += 1;
        debug!(
            attempt = self.consecutive_errors,
            max = MAX_CONSECUTIVE_ERRORS,
            "Skipping undecodable frame: {}",
            reason
        );
        if self.consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
            return Err(EngineError::Decode(format!(
                "stream corrupt after {} undecodable frames: {}",
                MAX_CONSECUTIVE_ERRORS, reason
            )));
        }
        Ok(())
    }
}

impl DecodeEngine for SymphoniaDecodeEngine {
    fn feed(&mut self, data: &[u8]) -> Result<(), EngineError> {
        self.sync.push(data);
        Ok(())
    }

    fn read(&mut self, out: &mut [u8]) -> Result<(DecodeStatus, usize), EngineError> {
        loop {
            if self.format_changed {
                self.format_changed = false;
                return Ok((DecodeStatus::NewFormat, 0));
            }

            if !self.pending.is_empty() {
                let n = out.len().min(self.pending.len());
                out[..n].copy_from_slice(&self.pending[..n]);
                self.pending.advance(n);
                return Ok((DecodeStatus::Ok, n));
            }

            match self.sync.next_frame() {
                Some(frame) => self.decode_frame(frame)?,
                None => return Ok((DecodeStatus::NeedMore, 0)),
            }
        }
    }

    fn format(&self) -> Result<DecodedFormat, EngineError> {
        self.format
            .ok_or_else(|| EngineError::Decode("output format not yet discovered".to_string()))
    }
}
