//! # Native Engine Implementations
//!
//! Default implementations of the codec engine bridge traits for native
//! targets (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `LameEncodeEngine` wraps the LAME encoder through `mp3lame-encoder`
//! - `SymphoniaDecodeEngine` is a feed-mode decoder that frames the input
//!   itself and decodes each frame with Symphonia's MP3 codec
//! - [`NativeEngines`] is the factory handed to the codec core
//!
//! ## Feature Flags
//!
//! - `encoder-lame`: LAME-backed encode engine (default)
//! - `decoder-symphonia`: Symphonia-backed decode engine (default)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_native::NativeEngines;
//! use bridge_traits::{EncodeEngineFactory, EncodeParams};
//!
//! let engines = NativeEngines::new();
//! let encoder = engines.create_encoder(&params)?;
//! ```

pub mod mpeg;

#[cfg(feature = "encoder-lame")]
mod lame;
#[cfg(feature = "decoder-symphonia")]
mod symphonia;

#[cfg(feature = "encoder-lame")]
pub use lame::{nearest_bitrate, LameEncodeEngine};
#[cfg(feature = "decoder-symphonia")]
pub use symphonia::{init_library, SymphoniaDecodeEngine};

#[cfg(feature = "decoder-symphonia")]
use bridge_traits::engine::{DecodeEngine, DecodeEngineFactory};
#[cfg(feature = "encoder-lame")]
use bridge_traits::engine::{EncodeEngine, EncodeEngineFactory, EncodeParams};
#[cfg(any(feature = "encoder-lame", feature = "decoder-symphonia"))]
use bridge_traits::error::EngineError;

/// Factory for the native engines.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEngines;

impl NativeEngines {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "encoder-lame")]
impl EncodeEngineFactory for NativeEngines {
    fn create_encoder(&self, params: &EncodeParams) -> Result<Box<dyn EncodeEngine>, EngineError> {
        Ok(Box::new(LameEncodeEngine::open(params)?))
    }
}

#[cfg(feature = "decoder-symphonia")]
impl DecodeEngineFactory for NativeEngines {
    fn init_library(&self) -> Result<(), EngineError> {
        init_library()
    }

    fn create_decoder(&self) -> Result<Box<dyn DecodeEngine>, EngineError> {
        Ok(Box::new(SymphoniaDecodeEngine::new()))
    }
}
