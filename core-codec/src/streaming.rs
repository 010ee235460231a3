//! # Stream Orchestrators
//!
//! Whole-stream conversions between WAV and MP3 built on the encoder and
//! decoder sessions.
//!
//! ## Overview
//!
//! Both directions read the source in fixed-size chunks (2048 bytes unless
//! configured otherwise) and write output as soon as it is produced. Nothing
//! is buffered beyond one chunk and one output buffer.
//!
//! ```text
//! WAV source ──▶ WavReader ──▶ FrameAligner ──▶ encode engine ──▶ MP3 sink
//!                                                                  ▲
//!                                     tag frame patched after flush ┘
//! MP3 source ──▶ decode engine ──▶ placeholder header + PCM ──▶ WAV sink
//!                                        ▲
//!                                        └── header patched after the last byte
//! ```
//!
//! Failures abort immediately. Output already written stays where it is; a
//! caller needing atomic output should write to a temporary destination and
//! rename it on success.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core_codec::{decode_to_wav, encode_from_wav, EncoderConfig};
//! use std::fs::File;
//!
//! # fn main() -> core_codec::Result<()> {
//! let summary = encode_from_wav(
//!     File::open("input.wav")?,
//!     File::create("output.mp3")?,
//!     &EncoderConfig::default().with_bitrate(192),
//! )?;
//! println!("{} frames, {:?}", summary.total_frames, summary.duration());
//!
//! let summary = decode_to_wav(File::open("output.mp3")?, File::create("roundtrip.wav")?)?;
//! println!("{} samples at {} Hz", summary.total_samples, summary.sample_rate);
//! # Ok(())
//! # }
//! ```

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::time::Duration;

use bridge_traits::engine::{DecodeEngineFactory, EncodeEngineFactory};
use tracing::{debug, info, instrument, warn};

use crate::config::{EncoderConfig, StreamingConfig};
use crate::decoder::Mp3Decoder;
use crate::encoder::Mp3Encoder;
use crate::error::{CodecError, Result};
use crate::wav::{placeholder_header, write_header, WavReader, HEADER_LEN};

// ============================================================================
// Summaries
// ============================================================================

/// Result of a WAV to MP3 conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSummary {
    /// Compressed bytes written, including any tag frame.
    pub total_bytes: u64,
    /// MPEG frames produced by the engine.
    pub total_frames: usize,
    /// Sample rate taken from the WAV header.
    pub sample_rate: u32,
}

impl EncodeSummary {
    /// Playback time covered by the produced frames.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let samples = self.total_frames as u64 * samples_per_frame(self.sample_rate);
        Duration::from_secs_f64(samples as f64 / self.sample_rate as f64)
    }
}

/// Result of an MP3 to WAV conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeSummary {
    /// Bytes written to the destination, header included.
    pub total_bytes: u64,
    /// Sample frames in the payload.
    pub total_samples: u64,
    pub sample_rate: u32,
}

impl DecodeSummary {
    /// Bytes of PCM payload, without the header.
    pub fn payload_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(HEADER_LEN as u64)
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.total_samples as f64 / self.sample_rate as f64)
    }
}

/// Samples per channel in one Layer III frame.
fn samples_per_frame(sample_rate: u32) -> u64 {
    if sample_rate >= 32_000 {
        1152
    } else {
        576
    }
}

// ============================================================================
// WAV -> MP3
// ============================================================================

/// Encode a WAV stream to MP3 with the native engine and default chunking.
///
/// Channel count and sample rate come from the WAV header and override
/// those in `config`.
#[cfg(feature = "native-engines")]
pub fn encode_from_wav<R: Read, W: Write + Seek>(
    reader: R,
    writer: W,
    config: &EncoderConfig,
) -> Result<EncodeSummary> {
    encode_from_wav_with(
        &bridge_native::NativeEngines::new(),
        reader,
        writer,
        config,
        &StreamingConfig::default(),
    )
}

/// Encode a WAV stream to MP3 with an explicit engine factory.
///
/// With `write_vbr_tag` on, the engine reserves a blank first frame whose
/// contents are only known after the flush. It is overwritten in place once
/// encoding completes and the destination is left positioned after the last
/// byte written.
/// A destination whose seek reports [`io::ErrorKind::Unsupported`] (such as
/// [`AppendOnly`](crate::AppendOnly)) is encoded without a tag frame.
///
/// # Errors
///
/// Returns error if:
/// - The WAV header is malformed or not 16-bit linear PCM
/// - The engine cannot be created or fails while encoding
/// - Reading the source or writing the destination fails
#[instrument(skip_all, fields(read_chunk_bytes = streaming.chunk_bytes()))]
pub fn encode_from_wav_with<R: Read, W: Write + Seek>(
    factory: &dyn EncodeEngineFactory,
    reader: R,
    mut writer: W,
    config: &EncoderConfig,
    streaming: &StreamingConfig,
) -> Result<EncodeSummary> {
    streaming
        .validate()
        .map_err(CodecError::InvalidConfiguration)?;

    let mut wav = WavReader::new(reader)?;
    let format = wav.format();
    if format.channels == 0 || format.sample_rate == 0 {
        return Err(CodecError::InvalidContainer(format!(
            "fmt chunk declares {} channels at {} Hz",
            format.channels, format.sample_rate
        )));
    }
    if format.bits_per_sample != 16 {
        return Err(CodecError::UnsupportedEncoding(format!(
            "{}-bit PCM input",
            format.bits_per_sample
        )));
    }

    let origin = stream_origin(&mut writer)?;
    let mut config = config
        .clone()
        .with_channels(format.channels)
        .with_sample_rate(format.sample_rate);
    if origin.is_none() && config.write_vbr_tag {
        debug!("Destination cannot seek, tag frame disabled");
        config = config.with_vbr_tag(false);
    }
    let mut encoder = Mp3Encoder::with_factory(factory, &config)?;

    info!(
        sample_rate = format.sample_rate,
        channels = format.channels,
        payload_bytes = wav.info().data_len,
        "Encoding WAV stream"
    );

    let chunk_bytes = streaming.chunk_bytes();
    let mut input = vec![0u8; chunk_bytes];
    let mut output = vec![0u8; encoder.estimate_output_bytes(chunk_bytes)];
    let mut total_bytes = 0u64;

    loop {
        let n = read_chunk(&mut wav, &mut input)?;
        if n == 0 {
            break;
        }
        let written = encoder.encode(&input[..n], &mut output)?;
        writer.write_all(&output[..written])?;
        total_bytes += written as u64;
    }

    let written = encoder.flush(&mut output)?;
    writer.write_all(&output[..written])?;
    total_bytes += written as u64;

    if let Some(origin) = origin {
        let tag = encoder.tag_frame()?;
        if tag.len() as u64 > total_bytes {
            warn!(
                tag_bytes = tag.len(),
                total_bytes, "Tag frame larger than the output, left blank"
            );
        } else if !tag.is_empty() {
            debug!(tag_bytes = tag.len(), "Patching tag frame");
            writer.seek(SeekFrom::Start(origin))?;
            writer.write_all(&tag)?;
            writer.seek(SeekFrom::Start(origin + total_bytes))?;
        }
    }
    writer.flush()?;

    let total_frames = encoder.frame_count()?;
    encoder.close();

    info!(total_bytes, total_frames, "Encoding complete");

    Ok(EncodeSummary {
        total_bytes,
        total_frames,
        sample_rate: format.sample_rate,
    })
}

// ============================================================================
// MP3 -> WAV
// ============================================================================

/// Decode an MP3 stream to WAV with the native engine and default chunking.
///
/// The destination must be seekable; see [`decode_to_wav_with`].
#[cfg(feature = "native-engines")]
pub fn decode_to_wav<R: Read, W: Write + Seek>(reader: R, writer: W) -> Result<DecodeSummary> {
    decode_to_wav_with(
        &bridge_native::NativeEngines::new(),
        reader,
        writer,
        &StreamingConfig::default(),
    )
}

/// Decode an MP3 stream to WAV with an explicit engine factory.
///
/// A zeroed 44-byte header is written ahead of the first PCM byte and
/// overwritten with the real one once the payload length is known. The
/// destination is left positioned at its end.
///
/// # Errors
///
/// Returns error if:
/// - No PCM at all was decoded ([`CodecError::NoAudioDecoded`]); nothing is
///   written in that case
/// - The engine fails or reports an unsupported sample encoding
/// - The destination cannot seek back to patch the header
/// - Reading the source or writing the destination fails
#[instrument(skip_all, fields(read_chunk_bytes = streaming.chunk_bytes()))]
pub fn decode_to_wav_with<R: Read, W: Write + Seek>(
    factory: &dyn DecodeEngineFactory,
    mut reader: R,
    mut writer: W,
    streaming: &StreamingConfig,
) -> Result<DecodeSummary> {
    streaming
        .validate()
        .map_err(CodecError::InvalidConfiguration)?;

    let mut decoder = Mp3Decoder::with_factory(factory)?;

    let mut input = vec![0u8; streaming.chunk_bytes()];
    let mut output = vec![0u8; decoder.estimate_output_bytes()];
    let mut payload = 0u64;

    loop {
        let n = read_chunk(&mut reader, &mut input)?;
        if n == 0 {
            break;
        }
        let written = decoder.decode(&input[..n], &mut output)?;
        append_payload(&mut writer, &output[..written], &mut payload)?;
    }

    loop {
        let written = decoder.drain(&mut output)?;
        if written == 0 {
            break;
        }
        append_payload(&mut writer, &output[..written], &mut payload)?;
    }

    if payload == 0 {
        return Err(CodecError::NoAudioDecoded);
    }
    let format = decoder.format().ok_or(CodecError::NoAudioDecoded)?;
    decoder.close();

    debug!(payload, "Patching WAV header");
    writer.seek(SeekFrom::Start(0))?;
    write_header(&mut writer, payload, format)?;
    writer.seek(SeekFrom::End(0))?;
    writer.flush()?;

    let total_samples = match format.frame_width() {
        0 => 0,
        width => payload / width as u64,
    };

    info!(
        payload_bytes = payload,
        total_samples,
        sample_rate = format.sample_rate,
        channels = format.channels,
        "Decoding complete"
    );

    Ok(DecodeSummary {
        total_bytes: payload + HEADER_LEN as u64,
        total_samples,
        sample_rate: format.sample_rate,
    })
}

/// Current position of `writer`, or `None` if it cannot seek at all.
fn stream_origin<W: Seek>(writer: &mut W) -> Result<Option<u64>> {
    match writer.stream_position() {
        Ok(position) => Ok(Some(position)),
        Err(e) if e.kind() == io::ErrorKind::Unsupported => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write decoded PCM, reserving the header space before the first byte.
fn append_payload<W: Write>(writer: &mut W, pcm: &[u8], payload: &mut u64) -> Result<()> {
    if pcm.is_empty() {
        return Ok(());
    }
    if *payload == 0 {
        writer.write_all(&placeholder_header())?;
    }
    writer.write_all(pcm)?;
    *payload += pcm.len() as u64;
    Ok(())
}

/// Read up to `buf.len()` bytes, retrying interrupted reads. Zero means end of stream.
fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}
