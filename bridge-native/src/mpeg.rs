//! MPEG Audio Layer III framing.
//!
//! Locates frame boundaries in a raw MP3 byte stream. The decode engine
//! uses [`FrameSync`] to cut fed bytes into whole frames, and the encode
//! engine uses [`FrameCounter`] to count the frames it has emitted.

use bytes::{Buf, Bytes, BytesMut};
use tracing::trace;

/// Length of a frame header in bytes.
pub const HEADER_LEN: usize = 4;

/// Length of an ID3v2 tag header (and footer) in bytes.
const ID3V2_HEADER_LEN: usize = 10;

const BITRATES_MPEG1: [u32; 16] = [
    0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0,
];
const BITRATES_MPEG2: [u32; 16] = [
    0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0,
];

/// MPEG audio version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MpegVersion {
    Mpeg1,
    Mpeg2,
    Mpeg25,
}

impl MpegVersion {
    fn sample_rates(&self) -> [u32; 3] {
        match self {
            MpegVersion::Mpeg1 => [44100, 48000, 32000],
            MpegVersion::Mpeg2 => [22050, 24000, 16000],
            MpegVersion::Mpeg25 => [11025, 12000, 8000],
        }
    }
}

/// A parsed Layer III frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: MpegVersion,
    pub bitrate_kbps: u32,
    pub sample_rate: u32,
    pub padding: bool,
    /// A 16-bit CRC follows the header.
    pub protected: bool,
    pub channels: u16,
}

impl FrameHeader {
    /// Parse the first four bytes of `bytes` as a Layer III header.
    ///
    /// Returns `None` for anything that is not a usable header, including
    /// free-format bitrates and reserved field values.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_LEN || bytes[0] != 0xFF || bytes[1] & 0xE0 != 0xE0 {
            return None;
        }

        let version = match (bytes[1] >> 3) & 0x03 {
            0 => MpegVersion::Mpeg25,
            2 => MpegVersion::Mpeg2,
            3 => MpegVersion::Mpeg1,
            _ => return None,
        };

        if (bytes[1] >> 1) & 0x03 != 0x01 {
            return None;
        }

        let bitrate_index = (bytes[2] >> 4) as usize;
        let bitrate_kbps = match version {
            MpegVersion::Mpeg1 => BITRATES_MPEG1[bitrate_index],
            _ => BITRATES_MPEG2[bitrate_index],
        };
        if bitrate_kbps == 0 {
            return None;
        }

        let rate_index = ((bytes[2] >> 2) & 0x03) as usize;
        if rate_index == 3 {
            return None;
        }

        // Emphasis value 2 is reserved.
        if bytes[3] & 0x03 == 0x02 {
            return None;
        }

        Some(Self {
            version,
            bitrate_kbps,
            sample_rate: version.sample_rates()[rate_index],
            padding: bytes[2] & 0x02 != 0,
            protected: bytes[1] & 0x01 == 0,
            channels: if bytes[3] >> 6 == 0x03 { 1 } else { 2 },
        })
    }

    /// PCM samples per channel carried by one frame.
    pub fn samples_per_frame(&self) -> usize {
        match self.version {
            MpegVersion::Mpeg1 => 1152,
            _ => 576,
        }
    }

    /// Total frame length in bytes, header included.
    pub fn frame_len(&self) -> usize {
        let coefficient = match self.version {
            MpegVersion::Mpeg1 => 144,
            _ => 72,
        };
        coefficient * self.bitrate_kbps as usize * 1000 / self.sample_rate as usize
            + usize::from(self.padding)
    }

    fn side_info_len(&self) -> usize {
        match (self.version, self.channels) {
            (MpegVersion::Mpeg1, 1) => 17,
            (MpegVersion::Mpeg1, _) => 32,
            (_, 1) => 9,
            _ => 17,
        }
    }

    /// Whether `other` can continue the same stream.
    pub fn is_compatible(&self, other: &FrameHeader) -> bool {
        self.version == other.version && self.sample_rate == other.sample_rate
    }
}

/// Returns `true` if `frame` carries a Xing, Info or VBRI tag instead of audio.
pub fn is_vbr_tag_frame(header: &FrameHeader, frame: &[u8]) -> bool {
    let offset = HEADER_LEN + if header.protected { 2 } else { 0 } + header.side_info_len();
    let xing = frame
        .get(offset..offset + 4)
        .is_some_and(|tag| tag == b"Xing" || tag == b"Info");
    // VBRI sits at a fixed offset after the header.
    let vbri = frame.get(36..40).is_some_and(|tag| tag == b"VBRI");
    xing || vbri
}

/// Length of the ID3v2 tag at the start of `bytes`, header and footer included.
///
/// Returns `None` when `bytes` does not start with a complete ID3v2 header.
pub fn id3v2_len(bytes: &[u8]) -> Option<usize> {
    if bytes.len() < ID3V2_HEADER_LEN || &bytes[..3] != b"ID3" {
        return None;
    }
    let size = bytes[6..10]
        .iter()
        .fold(0usize, |acc, b| (acc << 7) | usize::from(b & 0x7F));
    let footer = if bytes[5] & 0x10 != 0 {
        ID3V2_HEADER_LEN
    } else {
        0
    };
    Some(ID3V2_HEADER_LEN + size + footer)
}

/// A complete frame cut from the input stream.
#[derive(Debug, Clone)]
pub struct SyncedFrame {
    pub header: FrameHeader,
    pub data: Bytes,
}

/// Incremental frame synchroniser.
///
/// Bytes are pushed in arbitrary slices; complete frames are pulled out with
/// [`next_frame`](Self::next_frame). Until the stream is locked a candidate
/// header is only accepted when a compatible header follows it directly, so
/// stray sync words in non-audio data do not produce frames.
#[derive(Debug)]
pub struct FrameSync {
    buffer: BytesMut,
    locked: Option<FrameHeader>,
    /// Bytes of a leading ID3v2 tag still to be discarded.
    skip: usize,
    at_stream_start: bool,
}

impl Default for FrameSync {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSync {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
            locked: None,
            skip: 0,
            at_stream_start: true,
        }
    }

    /// Append input bytes.
    pub fn push(&mut self, data: &[u8]) {
        let skipped = self.skip.min(data.len());
        self.skip -= skipped;
        self.buffer.extend_from_slice(&data[skipped..]);
    }

    /// Bytes buffered but not yet returned as frames.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// The header the stream is currently locked to.
    pub fn locked(&self) -> Option<&FrameHeader> {
        self.locked.as_ref()
    }

    /// Pull the next complete frame, or `None` when more input is needed.
    pub fn next_frame(&mut self) -> Option<SyncedFrame> {
        if self.at_stream_start && !self.skip_leading_tag() {
            return None;
        }

        loop {
            let position = match self.find_sync() {
                Ok(position) => position,
                Err(keep_from) => {
                    self.buffer.advance(keep_from);
                    return None;
                }
            };
            if position > 0 {
                trace!(skipped = position, "Discarding bytes before frame sync");
                self.buffer.advance(position);
            }

            let header = FrameHeader::parse(&self.buffer)?;
            let len = header.frame_len();

            if let Some(lock) = self.locked {
                if lock.is_compatible(&header) {
                    if self.buffer.len() < len {
                        return None;
                    }
                    let data = self.buffer.split_to(len).freeze();
                    return Some(SyncedFrame { header, data });
                }
            }

            // Unlocked, or the header disagrees with the lock: confirm it
            // against the header that should follow.
            if self.buffer.len() < len + HEADER_LEN {
                return None;
            }
            match FrameHeader::parse(&self.buffer[len..]) {
                Some(next) if header.is_compatible(&next) => {
                    self.locked = Some(header);
                    let data = self.buffer.split_to(len).freeze();
                    return Some(SyncedFrame { header, data });
                }
                _ => self.buffer.advance(1),
            }
        }
    }

    /// Returns `false` while the start of the stream is still undecided.
    fn skip_leading_tag(&mut self) -> bool {
        if self.buffer.len() < 3 {
            return false;
        }
        if &self.buffer[..3] == b"ID3" {
            let Some(tag_len) = id3v2_len(&self.buffer) else {
                return false;
            };
            trace!(tag_len, "Skipping ID3v2 tag");
            if self.buffer.len() >= tag_len {
                self.buffer.advance(tag_len);
            } else {
                self.skip = tag_len - self.buffer.len();
                self.buffer.clear();
            }
        }
        self.at_stream_start = false;
        true
    }

    /// Position of the first valid header, or the offset up to which the
    /// buffer can be discarded when none is present yet.
    fn find_sync(&self) -> Result<usize, usize> {
        let buffer = &self.buffer[..];
        for (index, byte) in buffer.iter().enumerate() {
            if *byte != 0xFF {
                continue;
            }
            if index + HEADER_LEN > buffer.len() {
                return Err(index);
            }
            if FrameHeader::parse(&buffer[index..]).is_some() {
                return Ok(index);
            }
        }
        Err(buffer.len())
    }
}

/// Counts the audio frames in an emitted MP3 byte stream.
///
/// A leading Xing/Info tag frame is not counted. Encoders that reserve the
/// tag frame before its contents are known emit it blank, so the first frame
/// can also be excluded unconditionally.
#[derive(Debug, Default)]
pub struct FrameCounter {
    sync: FrameSync,
    frames: usize,
    seen_first: bool,
    skip_first: bool,
    first_header: Option<FrameHeader>,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A counter that never counts the first frame.
    pub fn with_leading_tag() -> Self {
        Self {
            skip_first: true,
            ..Self::default()
        }
    }

    /// Scan newly emitted bytes.
    pub fn push(&mut self, data: &[u8]) {
        self.sync.push(data);
        while let Some(frame) = self.sync.next_frame() {
            if !self.seen_first {
                self.seen_first = true;
                self.first_header = Some(frame.header);
                if self.skip_first || is_vbr_tag_frame(&frame.header, &frame.data) {
                    continue;
                }
            }
            self.frames += 1;
        }
    }

    /// Audio frames seen so far.
    ///
    /// The final frame of a stream is counted once it is complete; a
    /// confirmation header is only required for the very first frame.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Header of the first frame emitted.
    pub fn first_header(&self) -> Option<&FrameHeader> {
        self.first_header.as_ref()
    }
}
