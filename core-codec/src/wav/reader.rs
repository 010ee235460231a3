use std::io::{self, Read};

use tracing::{debug, trace};

use super::{PcmFormat, FORMAT_PCM};
use crate::error::{CodecError, Result};

/// Minimum size of a `fmt ` chunk body.
const MIN_FMT_LEN: u32 = 16;

/// What the header walk found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub format: PcmFormat,
    /// Declared byte length of the `data` chunk.
    pub data_len: u32,
}

impl WavInfo {
    /// Sample frames in the declared payload.
    pub fn total_frames(&self) -> u64 {
        match self.format.frame_width() {
            0 => 0,
            width => u64::from(self.data_len) / width as u64,
        }
    }
}

/// Parse a RIFF/WAVE header, leaving `reader` positioned at the first PCM byte.
///
/// Chunks other than `fmt ` and `data` are skipped by their declared length.
pub fn read_header<R: Read>(reader: &mut R) -> Result<WavInfo> {
    let mut prologue = [0u8; 12];
    read_structure(reader, &mut prologue, "RIFF prologue")?;
    if &prologue[0..4] != b"RIFF" || &prologue[8..12] != b"WAVE" {
        return Err(CodecError::InvalidContainer(
            "missing RIFF/WAVE signature".to_string(),
        ));
    }

    let mut format: Option<PcmFormat> = None;

    loop {
        let mut chunk_header = [0u8; 8];
        read_structure(reader, &mut chunk_header, "chunk header")?;
        let id = [
            chunk_header[0],
            chunk_header[1],
            chunk_header[2],
            chunk_header[3],
        ];
        let len = u32::from_le_bytes([
            chunk_header[4],
            chunk_header[5],
            chunk_header[6],
            chunk_header[7],
        ]);

        match &id {
            b"fmt " => {
                if len < MIN_FMT_LEN {
                    return Err(CodecError::InvalidContainer(format!(
                        "fmt chunk is {} bytes, expected at least {}",
                        len, MIN_FMT_LEN
                    )));
                }
                let mut body = [0u8; MIN_FMT_LEN as usize];
                read_structure(reader, &mut body, "fmt chunk")?;
                skip(reader, u64::from(len - MIN_FMT_LEN), "fmt chunk extension")?;

                let audio_format = u16::from_le_bytes([body[0], body[1]]);
                if audio_format != FORMAT_PCM {
                    return Err(CodecError::UnsupportedFormat(audio_format));
                }
                let parsed = PcmFormat {
                    channels: u16::from_le_bytes([body[2], body[3]]),
                    sample_rate: u32::from_le_bytes([body[4], body[5], body[6], body[7]]),
                    bits_per_sample: u16::from_le_bytes([body[14], body[15]]),
                };
                debug!(
                    sample_rate = parsed.sample_rate,
                    channels = parsed.channels,
                    bits_per_sample = parsed.bits_per_sample,
                    "Parsed fmt chunk"
                );
                format = Some(parsed);
            }
            b"data" => {
                let Some(format) = format else {
                    return Err(CodecError::OrderingError(
                        "data chunk precedes fmt chunk".to_string(),
                    ));
                };
                debug!(data_len = len, "Found data chunk");
                return Ok(WavInfo {
                    format,
                    data_len: len,
                });
            }
            _ => {
                trace!(
                    chunk = %String::from_utf8_lossy(&id),
                    len,
                    "Skipping chunk"
                );
                skip(reader, u64::from(len), "chunk body")?;
            }
        }
    }
}

/// Read structural bytes; running out of input is a container error.
fn read_structure<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| truncated(e, what))
}

fn skip<R: Read>(reader: &mut R, len: u64, what: &str) -> Result<()> {
    let skipped = io::copy(&mut reader.by_ref().take(len), &mut io::sink())?;
    if skipped < len {
        return Err(CodecError::InvalidContainer(format!("truncated {}", what)));
    }
    Ok(())
}

fn truncated(err: io::Error, what: &str) -> CodecError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        CodecError::InvalidContainer(format!("truncated {}", what))
    } else {
        CodecError::Io(err)
    }
}

/// A WAV stream restricted to its PCM payload.
///
/// Reads return payload bytes only and end after the declared `data`
/// length, whatever follows in the underlying stream.
#[derive(Debug)]
pub struct WavReader<R> {
    info: WavInfo,
    payload: io::Take<R>,
}

impl<R: Read> WavReader<R> {
    /// Parse the header of `inner` and window it to the payload.
    pub fn new(mut inner: R) -> Result<Self> {
        let info = read_header(&mut inner)?;
        Ok(Self {
            info,
            payload: inner.take(u64::from(info.data_len)),
        })
    }

    pub fn info(&self) -> &WavInfo {
        &self.info
    }

    pub fn format(&self) -> PcmFormat {
        self.info.format
    }

    /// Payload bytes not yet read.
    pub fn remaining(&self) -> u64 {
        self.payload.limit()
    }

    pub fn into_inner(self) -> R {
        self.payload.into_inner()
    }
}

impl<R: Read> Read for WavReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.payload.read(buf)
    }
}
