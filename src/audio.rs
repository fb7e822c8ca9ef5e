use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::data_uri::DataUri;

const MAX_CHANNELS: u16 = 8;
const MAX_SAMPLE_RATE: u32 = 384_000;

/// Raw PCM layout of speech returned by the TTS model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            channels: 1,
            bits_per_sample: 16,
        }
    }
}

impl PcmFormat {
    /// Reads `rate=` / `channels=` parameters from a mime type such as
    /// `audio/L16;codec=pcm;rate=24000`. Returns `None` for non-PCM media.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mut parts = mime.split(';').map(str::trim);
        let essence = parts.next()?.to_ascii_lowercase();
        if essence != "audio/l16" && essence != "audio/pcm" {
            return None;
        }

        let mut format = PcmFormat::default();
        for param in parts {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            match key.trim().to_ascii_lowercase().as_str() {
                "rate" => {
                    if let Ok(rate) = value.trim().parse::<u32>() {
                        if (1..=MAX_SAMPLE_RATE).contains(&rate) {
                            format.sample_rate = rate;
                        }
                    }
                }
                "channels" => {
                    if let Ok(channels) = value.trim().parse::<u16>() {
                        if (1..=MAX_CHANNELS).contains(&channels) {
                            format.channels = channels;
                        }
                    }
                }
                _ => {}
            }
        }
        Some(format)
    }

    fn block_align(&self) -> io::Result<u16> {
        self.channels
            .checked_mul(self.bits_per_sample / 8)
            .ok_or_else(|| invalid_format("block alignment overflows"))
    }

    fn byte_rate(&self) -> io::Result<u32> {
        self.sample_rate
            .checked_mul(u32::from(self.block_align()?))
            .ok_or_else(|| invalid_format("byte rate overflows"))
    }
}

fn invalid_format(reason: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, reason)
}

/// Wraps little-endian PCM samples in a RIFF/WAVE container.
pub fn pcm_to_wav(pcm: &[u8], format: PcmFormat) -> io::Result<Vec<u8>> {
    let data_len = u32::try_from(pcm.len())
        .ok()
        .filter(|len| len.checked_add(36).is_some())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "pcm payload too large"))?;
    let byte_rate = format.byte_rate()?;
    let block_align = format.block_align()?;

    let mut wav = Vec::with_capacity(pcm.len() + 44);
    wav.write_all(b"RIFF")?;
    wav.write_u32::<LittleEndian>(36 + data_len)?;
    wav.write_all(b"WAVE")?;

    wav.write_all(b"fmt ")?;
    wav.write_u32::<LittleEndian>(16)?;
    wav.write_u16::<LittleEndian>(1)?;
    wav.write_u16::<LittleEndian>(format.channels)?;
    wav.write_u32::<LittleEndian>(format.sample_rate)?;
    wav.write_u32::<LittleEndian>(byte_rate)?;
    wav.write_u16::<LittleEndian>(block_align)?;
    wav.write_u16::<LittleEndian>(format.bits_per_sample)?;

    wav.write_all(b"data")?;
    wav.write_u32::<LittleEndian>(data_len)?;
    wav.write_all(pcm)?;
    Ok(wav)
}

/// Converts PCM speech into a playable `audio/wav` data uri; other audio
/// formats pass through untouched.
pub fn playable_audio(media: DataUri) -> io::Result<DataUri> {
    match PcmFormat::from_mime(media.mime_type()) {
        Some(format) => {
            let wav = pcm_to_wav(media.data(), format)?;
            Ok(DataUri::new("audio/wav", wav))
        }
        None => Ok(media),
    }
}
