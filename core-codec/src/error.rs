//! # Codec Error Types
//!
//! The error taxonomy callers of the codec core can distinguish.

use bridge_traits::engine::status;
use bridge_traits::error::EngineError;
use thiserror::Error;

/// Errors that can occur while encoding, decoding or handling containers.
#[derive(Error, Debug)]
pub enum CodecError {
    // ========================================================================
    // Configuration / Setup Errors
    // ========================================================================
    /// The engine refused a configuration parameter while being set up.
    #[error("Invalid encoder configuration: {0}")]
    InvalidConfiguration(String),

    /// The engine handle could not be created or its global init failed.
    #[error("Engine initialization failed: {0}")]
    EngineInitFailure(String),

    // ========================================================================
    // Caller Errors
    // ========================================================================
    /// Zero-length input passed where at least one byte is required.
    #[error("Empty input")]
    EmptyInput,

    /// Output buffer below the documented minimum for the call.
    #[error("Output buffer too small: {provided} bytes provided, {required} required")]
    OutputTooSmall { required: usize, provided: usize },

    /// The session was used after it was closed.
    #[error("Session is closed")]
    SessionClosed,

    // ========================================================================
    // Engine Status Errors
    // ========================================================================
    /// The engine reported its output buffer was too small.
    #[error("Engine output buffer too small")]
    EngineBufferTooSmall,

    /// The engine failed to allocate memory.
    #[error("Engine memory allocation failed")]
    EngineAllocationFailure,

    /// The engine was used before its parameters were finalized.
    #[error("Engine parameters not initialized")]
    EngineNotFinalized,

    /// The psychoacoustic model failed internally.
    #[error("Engine psychoacoustic model failure")]
    EngineModelFailure,

    /// The engine returned a status code outside the known set.
    #[error("Engine failed with unknown status {0}")]
    EngineUnknownFailure(i32),

    /// The decode engine failed.
    #[error("Engine decode failure: {0}")]
    EngineDecodeFailure(String),

    // ========================================================================
    // Stream / Container Errors
    // ========================================================================
    /// Discovered sample encoding is outside the supported set.
    #[error("Unsupported sample encoding: {0}")]
    UnsupportedEncoding(String),

    /// Container carries a non-PCM audio format.
    #[error("Unsupported audio format code: {0}")]
    UnsupportedFormat(u16),

    /// Container structure is malformed.
    #[error("Invalid container: {0}")]
    InvalidContainer(String),

    /// Container chunks appear in an order that cannot be processed.
    #[error("Container chunk ordering error: {0}")]
    OrderingError(String),

    /// Decoding finished without producing a single PCM byte.
    #[error("No audio frames decoded")]
    NoAudioDecoded,

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// Read, write or seek failure on the surrounding streams.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Map a raw engine status code onto the error taxonomy.
    pub fn from_status(code: i32) -> Self {
        match code {
            status::BUFFER_TOO_SMALL => CodecError::EngineBufferTooSmall,
            status::ALLOCATION_FAILED => CodecError::EngineAllocationFailure,
            status::PARAMS_NOT_INITIALIZED => CodecError::EngineNotFinalized,
            status::PSYCHO_ACOUSTIC => CodecError::EngineModelFailure,
            other => CodecError::EngineUnknownFailure(other),
        }
    }

    /// Returns `true` if the failure originated inside the codec engine.
    pub fn is_engine_error(&self) -> bool {
        matches!(
            self,
            CodecError::EngineInitFailure(_)
                | CodecError::EngineBufferTooSmall
                | CodecError::EngineAllocationFailure
                | CodecError::EngineNotFinalized
                | CodecError::EngineModelFailure
                | CodecError::EngineUnknownFailure(_)
                | CodecError::EngineDecodeFailure(_)
        )
    }

    /// Returns `true` if the input container or stream properties are at fault.
    pub fn is_container_error(&self) -> bool {
        matches!(
            self,
            CodecError::InvalidContainer(_)
                | CodecError::OrderingError(_)
                | CodecError::UnsupportedFormat(_)
                | CodecError::UnsupportedEncoding(_)
        )
    }

    /// Returns `true` if the caller misused the API and must fix the call.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            CodecError::EmptyInput | CodecError::OutputTooSmall { .. } | CodecError::SessionClosed
        )
    }
}

impl From<EngineError> for CodecError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Init(msg) => CodecError::EngineInitFailure(msg),
            EngineError::Rejected(msg) => CodecError::InvalidConfiguration(msg),
            EngineError::Status(code) => CodecError::from_status(code),
            EngineError::Decode(msg) => CodecError::EngineDecodeFailure(msg),
        }
    }
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
