use serde::{Deserialize, Serialize};

use crate::codec::wav;

/// Container/codec combination for a recording.
///
/// The preference chain is advisory: a backend that supports none of the
/// preferred formats records in whatever it picks itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodingFormat {
    /// Opus frames in an Ogg container.
    OggOpus,
    /// 16-bit PCM in a RIFF WAV container.
    Wav,
}

impl EncodingFormat {
    /// Default preference chain: compressed Opus first, WAV as the alternate.
    pub fn default_preference() -> Vec<EncodingFormat> {
        vec![EncodingFormat::OggOpus, EncodingFormat::Wav]
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            EncodingFormat::OggOpus => "audio/ogg; codecs=opus",
            EncodingFormat::Wav => "audio/wav",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            EncodingFormat::OggOpus => "ogg",
            EncodingFormat::Wav => "wav",
        }
    }

    /// Patch up a payload assembled from streamed chunks so the container is
    /// self-consistent. WAV chunks carry placeholder RIFF sizes until the
    /// payload length is known; Ogg pages need no fixup.
    pub fn finalize(&self, payload: &mut [u8]) {
        if let EncodingFormat::Wav = self {
            wav::patch_riff_sizes(payload);
        }
    }
}
