//! # Decoder Session
//!
//! Feeds compressed bytes to a [`DecodeEngine`] and drains whatever PCM it
//! can produce.
//!
//! The output format is unknown until the engine has decoded its first
//! frame; [`Mp3Decoder::format`] returns `None` until then. Output buffers
//! must hold at least [`DECODE_OUTPUT_ESTIMATE`] bytes on every call.

use bridge_traits::engine::{DecodeEngine, DecodeEngineFactory, DecodeStatus};
use tracing::{debug, trace, warn};

use crate::error::{CodecError, Result};
use crate::wav::PcmFormat;

/// Required output capacity for [`Mp3Decoder::decode`] and [`Mp3Decoder::drain`]:
/// five frames of 1152 samples at 8 channels and 4 bytes per sample.
pub const DECODE_OUTPUT_ESTIMATE: usize = 1152 * 8 * 4 * 5;

/// Consecutive format-change reports tolerated within one call.
const MAX_FORMAT_CHANGES: usize = 16;

/// An MP3 decoder session.
pub struct Mp3Decoder {
    engine: Option<Box<dyn DecodeEngine>>,
    format: Option<PcmFormat>,
}

impl Mp3Decoder {
    /// Open a session on the native decode engine.
    #[cfg(feature = "native-engines")]
    pub fn new() -> Result<Self> {
        Self::with_factory(&bridge_native::NativeEngines::new())
    }

    /// Open a session on an engine created by `factory`.
    ///
    /// Runs the factory's library initialization first; it is idempotent.
    pub fn with_factory(factory: &dyn DecodeEngineFactory) -> Result<Self> {
        factory.init_library()?;
        let engine = factory.create_decoder()?;
        debug!("Decoder session opened");
        Ok(Self {
            engine: Some(engine),
            format: None,
        })
    }

    /// Output capacity required per call.
    pub fn estimate_output_bytes(&self) -> usize {
        DECODE_OUTPUT_ESTIMATE
    }

    /// Format of the decoded PCM, once the first frame has been decoded.
    pub fn format(&self) -> Option<PcmFormat> {
        self.format
    }

    /// Feed `input` and decode as much as fits into `out`.
    ///
    /// Returns the PCM bytes written, which is zero while the engine waits
    /// for a complete frame.
    pub fn decode(&mut self, input: &[u8], out: &mut [u8]) -> Result<usize> {
        let engine = self.engine.as_mut().ok_or(CodecError::SessionClosed)?;
        if input.is_empty() {
            return Err(CodecError::EmptyInput);
        }
        check_capacity(out)?;

        engine.feed(input)?;
        self.read_available(out)
    }

    /// Decode PCM the engine still holds without feeding more input.
    ///
    /// A single call stops when `out` is full, so callers that stopped
    /// feeding should call this until it returns zero.
    pub fn drain(&mut self, out: &mut [u8]) -> Result<usize> {
        if self.engine.is_none() {
            return Err(CodecError::SessionClosed);
        }
        check_capacity(out)?;
        self.read_available(out)
    }

    fn read_available(&mut self, out: &mut [u8]) -> Result<usize> {
        let engine = self.engine.as_mut().ok_or(CodecError::SessionClosed)?;

        let mut written = 0;
        let mut format_changes = 0;
        while written < out.len() {
            let (status, n) = engine.read(&mut out[written..])?;
            written += n;
            if status.is_terminal() {
                break;
            }
            match status {
                DecodeStatus::NewFormat => {
                    format_changes += 1;
                    if format_changes > MAX_FORMAT_CHANGES {
                        return Err(CodecError::EngineDecodeFailure(
                            "engine keeps reporting a new format".to_string(),
                        ));
                    }
                    trace!("Engine reported new format");
                }
                // A zero-byte read without a terminal status ends this call
                _ if n == 0 => break,
                _ => {}
            }
        }

        if written > 0 && self.format.is_none() {
            let discovered = engine.format()?;
            let bits = discovered.encoding.bit_depth().ok_or_else(|| {
                warn!(encoding = ?discovered.encoding, "Unsupported decoded sample encoding");
                CodecError::UnsupportedEncoding(format!("{:?}", discovered.encoding))
            })?;
            let format = PcmFormat::new(discovered.sample_rate, discovered.channels, bits);
            debug!(
                sample_rate = format.sample_rate,
                channels = format.channels,
                bits_per_sample = format.bits_per_sample,
                "Decoded format discovered"
            );
            self.format = Some(format);
        }

        Ok(written)
    }

    /// Release the engine. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.engine.take().is_some() {
            debug!("Decoder session closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.engine.is_none()
    }
}

impl Drop for Mp3Decoder {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Mp3Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mp3Decoder")
            .field("format", &self.format)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn check_capacity(out: &[u8]) -> Result<()> {
    if out.len() < DECODE_OUTPUT_ESTIMATE {
        return Err(CodecError::OutputTooSmall {
            required: DECODE_OUTPUT_ESTIMATE,
            provided: out.len(),
        });
    }
    Ok(())
}
