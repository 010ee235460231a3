//! # Encoder Session
//!
//! Drives an [`EncodeEngine`] with caller-chunked 16-bit PCM.
//!
//! ## Overview
//!
//! Input arrives as raw little-endian bytes in any chunking. A
//! [`FrameAligner`] holds back partial sample frames so the engine only ever
//! sees whole frames. Output buffers are checked against
//! [`Mp3Encoder::estimate_output_bytes`] before the engine is called.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_codec::{EncoderConfig, Mp3Encoder};
//!
//! let mut encoder = Mp3Encoder::new(&EncoderConfig::default())?;
//! let mut out = vec![0u8; encoder.estimate_output_bytes(pcm.len())];
//! let n = encoder.encode(&pcm, &mut out)?;
//! sink.write_all(&out[..n])?;
//!
//! let mut tail = vec![0u8; encoder.estimate_output_bytes(0)];
//! let n = encoder.flush(&mut tail)?;
//! sink.write_all(&tail[..n])?;
//!
//! // Fill in the reserved tag frame
//! sink.seek(SeekFrom::Start(0))?;
//! sink.write_all(&encoder.tag_frame()?)?;
//! encoder.close();
//! ```

use bridge_traits::engine::{EncodeEngine, EncodeEngineFactory};
use tracing::{debug, trace};

use crate::aligner::FrameAligner;
use crate::config::EncoderConfig;
use crate::error::{CodecError, Result};

/// Bytes per input sample. Only 16-bit PCM is accepted.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Flat allowance for encoder lookahead and flush overhead.
const OUTPUT_SLACK_BYTES: usize = 7200;

/// An MP3 encoder session.
///
/// Not safe for concurrent use. Separate sessions are independent.
pub struct Mp3Encoder {
    engine: Option<Box<dyn EncodeEngine>>,
    aligner: FrameAligner,
    channels: u16,
    sample_rate: u32,
    frame_length: usize,
    flushed: bool,
    scratch: Vec<i16>,
}

impl Mp3Encoder {
    /// Open a session on the native LAME engine.
    #[cfg(feature = "native-engines")]
    pub fn new(config: &EncoderConfig) -> Result<Self> {
        Self::with_factory(&bridge_native::NativeEngines::new(), config)
    }

    /// Open a session on an engine created by `factory`.
    ///
    /// The configuration is normalized first; only the engine can reject it.
    pub fn with_factory(factory: &dyn EncodeEngineFactory, config: &EncoderConfig) -> Result<Self> {
        let params = config.normalized();
        let engine = factory.create_encoder(&params)?;
        let frame_length = engine.frame_size();

        debug!(
            sample_rate = params.sample_rate,
            channels = params.channels,
            bitrate = params.bitrate,
            quality = params.quality,
            vbr_mode = ?params.vbr_mode,
            frame_length,
            "Encoder session opened"
        );

        Ok(Self {
            engine: Some(engine),
            aligner: FrameAligner::new(params.channels as usize * BYTES_PER_SAMPLE),
            channels: params.channels,
            sample_rate: params.sample_rate,
            frame_length,
            flushed: false,
            scratch: Vec::new(),
        })
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples per channel in one encoded frame.
    pub fn frame_length(&self) -> usize {
        self.frame_length
    }

    /// Bytes in one input sample frame.
    pub fn frame_width(&self) -> usize {
        self.aligner.frame_width()
    }

    /// Output capacity required for a call carrying `input_bytes` of input.
    ///
    /// Use `0` for [`flush`](Self::flush).
    pub fn estimate_output_bytes(&self, input_bytes: usize) -> usize {
        estimate(input_bytes, self.frame_width())
    }

    /// Encode the next chunk of interleaved little-endian PCM.
    ///
    /// Returns the compressed bytes written to `out`, which may be zero while
    /// the engine buffers a partial frame. A chunk that does not complete a
    /// sample frame is held back and also yields zero.
    pub fn encode(&mut self, input: &[u8], out: &mut [u8]) -> Result<usize> {
        let engine = self.engine.as_mut().ok_or(CodecError::SessionClosed)?;
        if input.is_empty() {
            return Err(CodecError::EmptyInput);
        }
        let required = estimate(input.len(), self.aligner.frame_width());
        if out.len() < required {
            return Err(CodecError::OutputTooSmall {
                required,
                provided: out.len(),
            });
        }

        let aligned = self.aligner.align(input);
        if aligned.is_empty() {
            trace!(pending = self.aligner.pending().len(), "Input held back");
            return Ok(0);
        }

        self.scratch.clear();
        self.scratch.extend(
            aligned
                .chunks_exact(BYTES_PER_SAMPLE)
                .map(|b| i16::from_le_bytes([b[0], b[1]])),
        );

        let written = if self.channels == 2 {
            engine.encode_interleaved(&self.scratch, out)?
        } else {
            engine.encode_mono(&self.scratch, out)?
        };
        self.flushed = false;

        trace!(input = aligned.len(), written, "Encoded chunk");
        Ok(written)
    }

    /// Drain the partial frame buffered inside the engine.
    ///
    /// A second flush without intervening input returns zero.
    pub fn flush(&mut self, out: &mut [u8]) -> Result<usize> {
        let engine = self.engine.as_mut().ok_or(CodecError::SessionClosed)?;
        let required = estimate(0, self.aligner.frame_width());
        if out.len() < required {
            return Err(CodecError::OutputTooSmall {
                required,
                provided: out.len(),
            });
        }
        if self.flushed {
            return Ok(0);
        }

        let written = engine.flush(out)?;
        self.flushed = true;
        debug!(written, "Encoder flushed");
        Ok(written)
    }

    /// Frames produced so far.
    pub fn frame_count(&self) -> Result<usize> {
        let engine = self.engine.as_ref().ok_or(CodecError::SessionClosed)?;
        Ok(engine.frame_count()?)
    }

    /// Xing/Info tag frame to write over the first frame of the output.
    ///
    /// Call after [`flush`](Self::flush). The bytes are exactly as long as
    /// the placeholder frame the engine emitted at the start of the stream,
    /// so a seekable sink can overwrite it in place. Empty when tag frames
    /// are disabled.
    pub fn tag_frame(&self) -> Result<Vec<u8>> {
        let engine = self.engine.as_ref().ok_or(CodecError::SessionClosed)?;
        Ok(engine.tag_frame()?)
    }

    /// Release the engine. Bytes still held by the aligner are discarded.
    ///
    /// Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.engine.take().is_some() {
            let dropped = self.aligner.pending().len();
            self.aligner.clear();
            debug!(dropped, "Encoder session closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.engine.is_none()
    }
}

impl Drop for Mp3Encoder {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Mp3Encoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mp3Encoder")
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .field("frame_length", &self.frame_length)
            .field("pending", &self.aligner.pending().len())
            .field("flushed", &self.flushed)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// `floor(1.25 x (input_bytes / frame_width + 1)) + 7200`
fn estimate(input_bytes: usize, frame_width: usize) -> usize {
    let samples = input_bytes / frame_width + 1;
    samples * 5 / 4 + OUTPUT_SLACK_BYTES
}
