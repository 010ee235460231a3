//! LAME encode engine.
//!
//! Wraps `mp3lame-encoder`. The builder applies every [`EncodeParams`]
//! field and finalizes them in one step, so a constructed
//! [`LameEncodeEngine`] is always ready to encode.

use std::mem::MaybeUninit;

use bridge_traits::engine::{status, EncodeEngine, EncodeParams, StereoMode, VbrMode};
use bridge_traits::error::EngineError;
use mp3lame_encoder::{
    Bitrate, Builder, BuildError, EncodeError, Encoder, FlushGap, InterleavedPcm, Mode, MonoPcm,
    Quality,
};
use tracing::debug;

use crate::mpeg::FrameCounter;

/// Bitrates the engine accepts, in kbps.
const BITRATES: [(u32, Bitrate); 16] = [
    (8, Bitrate::Kbps8),
    (16, Bitrate::Kbps16),
    (24, Bitrate::Kbps24),
    (32, Bitrate::Kbps32),
    (40, Bitrate::Kbps40),
    (48, Bitrate::Kbps48),
    (64, Bitrate::Kbps64),
    (80, Bitrate::Kbps80),
    (96, Bitrate::Kbps96),
    (112, Bitrate::Kbps112),
    (128, Bitrate::Kbps128),
    (160, Bitrate::Kbps160),
    (192, Bitrate::Kbps192),
    (224, Bitrate::Kbps224),
    (256, Bitrate::Kbps256),
    (320, Bitrate::Kbps320),
];

/// Supported bitrate closest to `kbps`. Ties resolve to the lower rate.
pub fn nearest_bitrate(kbps: u32) -> (u32, Bitrate) {
    let mut best = BITRATES[0];
    for candidate in BITRATES {
        if candidate.0.abs_diff(kbps) < best.0.abs_diff(kbps) {
            best = candidate;
        }
    }
    best
}

fn quality(level: u8) -> Quality {
    match level {
        0 => Quality::Best,
        1 => Quality::SecondBest,
        2 => Quality::NearBest,
        3 => Quality::VeryNice,
        4 => Quality::Nice,
        5 => Quality::Good,
        6 => Quality::Decent,
        7 => Quality::Ok,
        8 => Quality::SecondWorst,
        _ => Quality::Worst,
    }
}

fn vbr_mode(mode: VbrMode) -> mp3lame_encoder::VbrMode {
    match mode {
        VbrMode::Off => mp3lame_encoder::VbrMode::Off,
        VbrMode::Rh => mp3lame_encoder::VbrMode::Rh,
        VbrMode::Abr => mp3lame_encoder::VbrMode::Abr,
        VbrMode::Mtrh => mp3lame_encoder::VbrMode::Mtrh,
    }
}

fn stereo_mode(mode: StereoMode) -> Result<Mode, EngineError> {
    match mode {
        StereoMode::Stereo => Ok(Mode::Stereo),
        StereoMode::JointStereo => Ok(Mode::JointStereo),
        StereoMode::Mono => Ok(Mode::Mono),
        StereoMode::DualChannel => Err(EngineError::Rejected(
            "dual channel mode is not supported by LAME".to_string(),
        )),
    }
}

fn build_error(what: &str, err: BuildError) -> EngineError {
    match err {
        BuildError::NoMem => EngineError::Status(status::ALLOCATION_FAILED),
        BuildError::Other(code) => EngineError::Status(code),
        err => EngineError::Rejected(format!("{what}: {err:?}")),
    }
}

fn encode_error(err: EncodeError) -> EngineError {
    let code = match err {
        EncodeError::BufferTooSmall => status::BUFFER_TOO_SMALL,
        EncodeError::NoMem => status::ALLOCATION_FAILED,
        EncodeError::InvalidState => status::PARAMS_NOT_INITIALIZED,
        EncodeError::PsychoAcoustic => status::PSYCHO_ACOUSTIC,
        EncodeError::Other(code) => code,
    };
    EngineError::Status(code)
}

fn as_uninit(out: &mut [u8]) -> &mut [MaybeUninit<u8>] {
    // SAFETY: `MaybeUninit<u8>` has the same layout as `u8`, and the engine
    // only ever writes fully initialized bytes into the slice.
    unsafe { &mut *(out as *mut [u8] as *mut [MaybeUninit<u8>]) }
}

/// MPEG Layer III encoder backed by LAME.
pub struct LameEncodeEngine {
    encoder: Encoder,
    sample_rate: u32,
    frames: FrameCounter,
}

impl LameEncodeEngine {
    /// Allocate a LAME handle, apply `params` and finalize them.
    pub fn open(params: &EncodeParams) -> Result<Self, EngineError> {
        let mut builder = Builder::new()
            .ok_or_else(|| EngineError::Init("failed to allocate LAME handle".to_string()))?;

        let channels = u8::try_from(params.channels)
            .map_err(|_| EngineError::Rejected(format!("channels: {}", params.channels)))?;
        builder
            .set_num_channels(channels)
            .map_err(|e| build_error("channels", e))?;
        builder
            .set_sample_rate(params.sample_rate)
            .map_err(|e| build_error("sample rate", e))?;

        let (kbps, bitrate) = nearest_bitrate(params.bitrate);
        if kbps != params.bitrate {
            debug!(requested = params.bitrate, applied = kbps, "Snapped bitrate");
        }
        builder
            .set_brate(bitrate)
            .map_err(|e| build_error("bitrate", e))?;

        if let Some(mode) = params.stereo_mode {
            builder
                .set_mode(stereo_mode(mode)?)
                .map_err(|e| build_error("mode", e))?;
        }

        builder
            .set_to_write_vbr_tag(params.write_vbr_tag)
            .map_err(|e| build_error("vbr tag", e))?;

        match params.vbr_mode {
            VbrMode::Off => builder
                .set_quality(quality(params.quality))
                .map_err(|e| build_error("quality", e))?,
            mode => {
                builder
                    .set_vbr_mode(vbr_mode(mode))
                    .map_err(|e| build_error("vbr mode", e))?;
                builder
                    .set_vbr_quality(quality(params.quality))
                    .map_err(|e| build_error("vbr quality", e))?;
            }
        }

        let encoder = builder.build().map_err(|e| build_error("finalize", e))?;

        debug!(
            sample_rate = params.sample_rate,
            channels = params.channels,
            bitrate = kbps,
            vbr = ?params.vbr_mode,
            "LAME encoder ready"
        );

        Ok(Self {
            encoder,
            sample_rate: params.sample_rate,
            frames: if params.write_vbr_tag {
                FrameCounter::with_leading_tag()
            } else {
                FrameCounter::new()
            },
        })
    }

    fn record(&mut self, out: &[u8], written: usize) -> usize {
        self.frames.push(&out[..written]);
        written
    }
}

impl EncodeEngine for LameEncodeEngine {
    fn frame_size(&self) -> usize {
        match self.frames.first_header() {
            Some(header) => header.samples_per_frame(),
            None if self.sample_rate >= 32_000 => 1152,
            None => 576,
        }
    }

    fn encode_interleaved(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize, EngineError> {
        let written = self
            .encoder
            .encode(InterleavedPcm(pcm), as_uninit(out))
            .map_err(encode_error)?;
        Ok(self.record(out, written))
    }

    fn encode_mono(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize, EngineError> {
        let written = self
            .encoder
            .encode(MonoPcm(pcm), as_uninit(out))
            .map_err(encode_error)?;
        Ok(self.record(out, written))
    }

    fn flush(&mut self, out: &mut [u8]) -> Result<usize, EngineError> {
        let written = self
            .encoder
            .flush::<FlushGap>(as_uninit(out))
            .map_err(encode_error)?;
        Ok(self.record(out, written))
    }

    fn frame_count(&self) -> Result<usize, EngineError> {
        Ok(self.frames.frames())
    }

    fn tag_frame(&self) -> Result<Vec<u8>, EngineError> {
        let size = self.encoder.lame_tag_size();
        if size == 0 {
            return Ok(Vec::new());
        }
        let mut tag = Vec::with_capacity(size);
        match self.encoder.lame_tag_encode_to_vec(&mut tag) {
            Some(_) => Ok(tag),
            None => Err(EngineError::Status(status::BUFFER_TOO_SMALL)),
        }
    }
}
