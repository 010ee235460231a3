use std::io::Write;

use super::{PcmFormat, FORMAT_PCM, HEADER_LEN};
use crate::error::Result;

/// Size of the `fmt ` chunk body for plain PCM.
const FMT_CHUNK_LEN: u32 = 16;

/// Build the canonical 44-byte header for `payload_len` bytes of PCM.
///
/// Lengths that do not fit the 32-bit size fields saturate.
pub fn header_bytes(payload_len: u64, format: PcmFormat) -> [u8; HEADER_LEN] {
    let payload = u32::try_from(payload_len).unwrap_or(u32::MAX);
    let riff_len = payload.saturating_add(36);

    let mut header = [0u8; HEADER_LEN];
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&riff_len.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    header[20..22].copy_from_slice(&FORMAT_PCM.to_le_bytes());
    header[22..24].copy_from_slice(&format.channels.to_le_bytes());
    header[24..28].copy_from_slice(&format.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&format.byte_rate().to_le_bytes());
    header[32..34].copy_from_slice(&format.block_align().to_le_bytes());
    header[34..36].copy_from_slice(&format.bits_per_sample.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&payload.to_le_bytes());
    header
}

/// The all-zero header reserved before the payload size is known.
pub fn placeholder_header() -> [u8; HEADER_LEN] {
    [0u8; HEADER_LEN]
}

/// Write the header for `payload_len` bytes of PCM to `writer`.
pub fn write_header<W: Write>(writer: &mut W, payload_len: u64, format: PcmFormat) -> Result<()> {
    writer.write_all(&header_bytes(payload_len, format))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = header_bytes(88200, PcmFormat::new(44100, 2, 16));

        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(header[4..8].try_into().unwrap()), 36 + 88200);
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(u32::from_le_bytes(header[16..20].try_into().unwrap()), 16);
        assert_eq!(u16::from_le_bytes([header[20], header[21]]), 1);
        assert_eq!(u16::from_le_bytes([header[22], header[23]]), 2);
        assert_eq!(u32::from_le_bytes(header[24..28].try_into().unwrap()), 44100);
        assert_eq!(u32::from_le_bytes(header[28..32].try_into().unwrap()), 176_400);
        assert_eq!(u16::from_le_bytes([header[32], header[33]]), 4);
        assert_eq!(u16::from_le_bytes([header[34], header[35]]), 16);
        assert_eq!(&header[36..40], b"data");
        assert_eq!(u32::from_le_bytes(header[40..44].try_into().unwrap()), 88200);
    }

    #[test]
    fn test_placeholder_is_zeroed() {
        assert_eq!(placeholder_header(), [0u8; 44]);
    }

    #[test]
    fn test_write_header() {
        let mut out = Vec::new();
        write_header(&mut out, 0, PcmFormat::new(8000, 1, 8)).unwrap();
        assert_eq!(out.len(), HEADER_LEN);
        assert_eq!(u32::from_le_bytes(out[4..8].try_into().unwrap()), 36);
        assert_eq!(u32::from_le_bytes(out[28..32].try_into().unwrap()), 8000);
    }

    #[test]
    fn test_oversized_payload_saturates() {
        let header = header_bytes(u64::MAX, PcmFormat::new(44100, 2, 16));
        assert_eq!(u32::from_le_bytes(header[40..44].try_into().unwrap()), u32::MAX);
        assert_eq!(u32::from_le_bytes(header[4..8].try_into().unwrap()), u32::MAX);
    }
}
