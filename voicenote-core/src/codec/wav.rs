//! RIFF WAV container math.
//!
//! Streamed recordings deliver the header in the first chunk with zeroed
//! size fields (the total length is unknown mid-capture); the sizes are
//! patched once the full payload has been assembled.

/// Size of the standard WAV RIFF header in bytes.
pub const HEADER_SIZE: usize = 44;

/// Build a 44-byte WAV RIFF header for 16-bit little-endian PCM.
///
/// `data_size` may be zero for streaming use; patch afterwards with
/// [`patch_riff_sizes`].
pub fn header(sample_rate: u32, bit_depth: u16, channels: u16, data_size: u32) -> [u8; HEADER_SIZE] {
    let byte_rate = sample_rate * channels as u32 * bit_depth as u32 / 8;
    let block_align = channels * bit_depth / 8;

    let mut header = [0u8; HEADER_SIZE];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&(36 + data_size).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes()); // PCM format chunk size
    header[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM format code
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bit_depth.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Patch the RIFF chunk size (offset 4) and data chunk size (offset 40) of an
/// assembled payload to match its actual length.
///
/// A payload that is too short or does not start with a RIFF/WAVE header is
/// left untouched.
pub fn patch_riff_sizes(payload: &mut [u8]) {
    if payload.len() < HEADER_SIZE
        || &payload[0..4] != b"RIFF"
        || &payload[8..12] != b"WAVE"
    {
        return;
    }

    let riff_size = (payload.len() - 8) as u32;
    payload[4..8].copy_from_slice(&riff_size.to_le_bytes());

    let data_size = (payload.len() - HEADER_SIZE) as u32;
    payload[40..44].copy_from_slice(&data_size.to_le_bytes());
}
