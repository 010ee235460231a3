//! Codec engine bridge traits and supporting types.
//!
//! These abstractions describe the narrow contract the core expects from an
//! MPEG Layer III encode/decode engine. The engine itself is an opaque
//! collaborator: the core never looks inside it, it only drives it through
//! the calls below and interprets the raw status codes it reports.
//!
//! Engines are owned by exactly one session at a time and are never called
//! concurrently, so the traits only require `Send`.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

// ============================================================================
// Raw Status Codes
// ============================================================================

/// Raw status codes reported by encode engines.
///
/// Negative values signal failure. Codes not listed here are reported
/// verbatim and classified by the caller as unknown failures.
pub mod status {
    /// The output buffer handed to the engine was too small.
    pub const BUFFER_TOO_SMALL: i32 = -1;
    /// The engine failed to allocate internal memory.
    pub const ALLOCATION_FAILED: i32 = -2;
    /// Parameters were not finalized before the engine was used.
    pub const PARAMS_NOT_INITIALIZED: i32 = -3;
    /// The psychoacoustic model failed internally.
    pub const PSYCHO_ACOUSTIC: i32 = -4;
}

// ============================================================================
// Encode Side
// ============================================================================

/// Variable bitrate strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VbrMode {
    /// Constant bitrate.
    #[default]
    Off,
    /// Original variable bitrate algorithm.
    Rh,
    /// Average bitrate.
    Abr,
    /// Fast variable bitrate algorithm.
    Mtrh,
}

/// Output channel mode hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StereoMode {
    Stereo,
    JointStereo,
    /// Not supported by every engine.
    DualChannel,
    Mono,
}

/// Finalized parameters handed to an encode engine.
///
/// Values are expected to be normalized already; engines apply them as-is
/// and report rejection through a status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeParams {
    /// Input sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved input channels.
    pub channels: u16,
    /// Target bitrate in kbps.
    pub bitrate: u32,
    /// Quality 0-9 (0 = best, slowest). Used as VBR quality when VBR is on.
    pub quality: u8,
    pub vbr_mode: VbrMode,
    /// `None` lets the engine pick a mode from the input channel count.
    pub stereo_mode: Option<StereoMode>,
    /// Reserve a Xing/Info tag frame at the start of the stream.
    pub write_vbr_tag: bool,
}

/// A configured, parameter-finalized encode engine.
///
/// Every method writes at most `out.len()` bytes and returns the number of
/// bytes written, which may legitimately be zero while the engine buffers a
/// partial frame internally.
pub trait EncodeEngine: Send {
    /// Samples per channel in one encoded frame (1152 or 576).
    fn frame_size(&self) -> usize;

    /// Encode interleaved left/right samples.
    fn encode_interleaved(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize, EngineError>;

    /// Encode a single channel of samples.
    fn encode_mono(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize, EngineError>;

    /// Drain buffered partial frames.
    fn flush(&mut self, out: &mut [u8]) -> Result<usize, EngineError>;

    /// Cumulative number of frames produced so far.
    fn frame_count(&self) -> Result<usize, EngineError>;

    /// Contents of the Xing/Info tag frame reserved at the start of the stream.
    ///
    /// Only meaningful after [`flush`](Self::flush). The returned bytes have
    /// the same length as the reserved frame and replace it in place. Empty
    /// when the engine reserved no tag frame.
    fn tag_frame(&self) -> Result<Vec<u8>, EngineError> {
        Ok(Vec::new())
    }
}

/// Creates encode engines.
///
/// Creation covers the whole engine lifecycle prologue: handle allocation,
/// applying every parameter and finalizing them.
pub trait EncodeEngineFactory: Send + Sync {
    fn create_encoder(&self, params: &EncodeParams) -> Result<Box<dyn EncodeEngine>, EngineError>;
}

// ============================================================================
// Decode Side
// ============================================================================

/// Terminal and non-terminal results of a single decode read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeStatus {
    /// Bytes were produced and more may follow.
    Ok,
    /// Every fed byte has been consumed; more input is required.
    NeedMore,
    /// The stream has ended.
    Done,
    /// The output format was discovered or changed; read again.
    NewFormat,
}

impl DecodeStatus {
    /// Returns `true` if the read loop should stop after this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DecodeStatus::NeedMore | DecodeStatus::Done)
    }
}

/// Sample encoding of decoded PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleEncoding {
    Unsigned8,
    Signed16,
    Signed24,
    Signed32,
    Float32,
    /// Engine-specific encoding identifier.
    Other(i32),
}

impl SampleEncoding {
    /// Bit depth for integer encodings a PCM container can carry.
    pub fn bit_depth(&self) -> Option<u16> {
        match self {
            SampleEncoding::Unsigned8 => Some(8),
            SampleEncoding::Signed16 => Some(16),
            SampleEncoding::Signed24 => Some(24),
            SampleEncoding::Signed32 => Some(32),
            SampleEncoding::Float32 | SampleEncoding::Other(_) => None,
        }
    }
}

/// Output format discovered by a decode engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecodedFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub encoding: SampleEncoding,
}

/// An incremental (feed-mode) decode engine.
pub trait DecodeEngine: Send {
    /// Append compressed bytes to the engine's input queue.
    fn feed(&mut self, data: &[u8]) -> Result<(), EngineError>;

    /// Decode into `out`, returning the status and the bytes written.
    fn read(&mut self, out: &mut [u8]) -> Result<(DecodeStatus, usize), EngineError>;

    /// The currently discovered output format.
    fn format(&self) -> Result<DecodedFormat, EngineError>;
}

/// Creates decode engines.
pub trait DecodeEngineFactory: Send + Sync {
    /// Process-wide library initialization. Must be idempotent.
    fn init_library(&self) -> Result<(), EngineError>;

    /// Create a new engine opened for incremental feeding.
    fn create_decoder(&self) -> Result<Box<dyn DecodeEngine>, EngineError>;
}
