//! # Codec Bridge Traits
//!
//! Abstraction traits that concrete codec engines must implement.
//!
//! ## Overview
//!
//! This crate defines the contract between the streaming core and the
//! external MPEG Layer III engines it drives. The core owns framing, buffer
//! sizing and container handling; engines own the codec mathematics and are
//! treated as black boxes behind these traits.
//!
//! ## Traits
//!
//! ### Encoding
//! - [`EncodeEngine`](engine::EncodeEngine) - Configured encoder: encode, flush, frame count
//! - [`EncodeEngineFactory`](engine::EncodeEngineFactory) - Creates and finalizes encoders
//!
//! ### Decoding
//! - [`DecodeEngine`](engine::DecodeEngine) - Feed-mode decoder: feed, read, format query
//! - [`DecodeEngineFactory`](engine::DecodeEngineFactory) - One-time library init and decoder creation
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Implementations
//!
//! | Engine | Implementation Crate |
//! |--------|---------------------|
//! | LAME encoder | `bridge-native` |
//! | Symphonia-backed feed decoder | `bridge-native` |
//!
//! ## Error Handling
//!
//! Engines report failures through [`EngineError`](error::EngineError):
//! raw status codes are passed through untouched so that the core can map
//! them onto its own error taxonomy with a single lookup table.
//!
//! ## Thread Safety
//!
//! Engines are `Send` but not `Sync`: a session owns its engine exclusively
//! and serializes all calls. Factories are `Send + Sync` and may be shared.

pub mod engine;
pub mod error;
pub mod logging;

pub use error::{BridgeError, EngineError};

// Re-export commonly used types
pub use engine::{
    status, DecodeEngine, DecodeEngineFactory, DecodeStatus, DecodedFormat, EncodeEngine,
    EncodeEngineFactory, EncodeParams, SampleEncoding, StereoMode, VbrMode,
};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
