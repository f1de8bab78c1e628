use anyhow::{anyhow, Result};

/// In-memory audio artifact: mono 16-bit little-endian PCM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub sample_rate: u32,
    pub data: Vec<u8>,
}

impl AudioClip {
    pub fn duration_ms(&self) -> u64 {
        // Two bytes per sample, mono.
        (self.data.len() as u64 * 1000) / (u64::from(self.sample_rate) * 2)
    }
}

/// Decode/concatenate/silence/encode capability for audio artifacts.
pub trait AudioCodec: Send + Sync {
    /// Interprets raw speech-API output (headerless PCM) as a clip.
    fn decode_pcm(&self, bytes: &[u8]) -> Result<AudioClip>;
    /// Parses a persisted WAV artifact back into a clip.
    fn decode_wav(&self, bytes: &[u8]) -> Result<AudioClip>;
    fn silence(&self, millis: u64) -> AudioClip;
    /// Concatenates clips in order with no inserted gap.
    fn concat(&self, clips: &[AudioClip]) -> Result<AudioClip>;
    fn encode_wav(&self, clip: &AudioClip) -> Vec<u8>;
}

pub struct PcmWavCodec {
    pub sample_rate: u32,
}

impl PcmWavCodec {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl AudioCodec for PcmWavCodec {
    fn decode_pcm(&self, bytes: &[u8]) -> Result<AudioClip> {
        if bytes.is_empty() {
            return Err(anyhow!("empty PCM payload"));
        }
        if bytes.len() % 2 != 0 {
            return Err(anyhow!("PCM payload has odd length {}", bytes.len()));
        }
        Ok(AudioClip {
            sample_rate: self.sample_rate,
            data: bytes.to_vec(),
        })
    }

    fn decode_wav(&self, bytes: &[u8]) -> Result<AudioClip> {
        let (fmt, data) = scan_wav(bytes)?;
        if fmt.audio_format != 1 || fmt.bits_per_sample != 16 || fmt.channels != 1 {
            return Err(anyhow!(
                "unsupported WAV format: format {}, {} ch, {} bits",
                fmt.audio_format,
                fmt.channels,
                fmt.bits_per_sample
            ));
        }
        Ok(AudioClip {
            sample_rate: fmt.sample_rate,
            data: data.to_vec(),
        })
    }

    fn silence(&self, millis: u64) -> AudioClip {
        let samples = (u64::from(self.sample_rate) * millis) / 1000;
        AudioClip {
            sample_rate: self.sample_rate,
            data: vec![0u8; samples as usize * 2],
        }
    }

    fn concat(&self, clips: &[AudioClip]) -> Result<AudioClip> {
        let mut out = AudioClip {
            sample_rate: self.sample_rate,
            data: Vec::new(),
        };
        for clip in clips {
            if clip.sample_rate != self.sample_rate {
                return Err(anyhow!(
                    "sample rate mismatch: expected {}, got {}. All clips must share one rate.",
                    self.sample_rate,
                    clip.sample_rate
                ));
            }
            out.data.extend_from_slice(&clip.data);
        }
        Ok(out)
    }

    fn encode_wav(&self, clip: &AudioClip) -> Vec<u8> {
        let data_len = clip.data.len() as u32;
        let byte_rate = clip.sample_rate * 2;

        // RIFF [4] + Size [4] + WAVE [4] + fmt chunk + data chunk
        let mut out = Vec::with_capacity(44 + clip.data.len());
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");

        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&1u16.to_le_bytes()); // mono
        out.extend_from_slice(&clip.sample_rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes()); // block align
        out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out.extend_from_slice(&clip.data);
        out
    }
}

struct WavFmt {
    audio_format: u16,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
}

fn scan_wav(bytes: &[u8]) -> Result<(WavFmt, &[u8])> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(anyhow!("not a RIFF/WAVE file"));
    }

    let mut fmt: Option<WavFmt> = None;
    let mut data: Option<&[u8]> = None;

    let mut pos = 12usize;
    while pos + 8 <= bytes.len() {
        let chunk_id = &bytes[pos..pos + 4];
        let chunk_size =
            u32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().expect("4 bytes")) as usize;
        let body_start = pos + 8;
        let body_end = body_start
            .checked_add(chunk_size)
            .ok_or_else(|| anyhow!("chunk size overflow"))?;
        if body_end > bytes.len() {
            return Err(anyhow!("truncated chunk {:?}", chunk_id));
        }
        let body = &bytes[body_start..body_end];

        if chunk_id == b"fmt " {
            if body.len() < 16 {
                return Err(anyhow!("fmt chunk too short"));
            }
            fmt = Some(WavFmt {
                audio_format: u16::from_le_bytes(body[0..2].try_into().expect("2 bytes")),
                channels: u16::from_le_bytes(body[2..4].try_into().expect("2 bytes")),
                sample_rate: u32::from_le_bytes(body[4..8].try_into().expect("4 bytes")),
                bits_per_sample: u16::from_le_bytes(body[14..16].try_into().expect("2 bytes")),
            });
        } else if chunk_id == b"data" {
            data = Some(body);
            break;
        }

        // Chunks are word-aligned.
        pos = body_end + (chunk_size % 2);
    }

    let fmt = fmt.ok_or_else(|| anyhow!("missing fmt chunk"))?;
    let data = data.ok_or_else(|| anyhow!("missing data chunk"))?;
    Ok((fmt, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_length() {
        let codec = PcmWavCodec::new(24000);
        let clip = codec.silence(300);
        // 24000 samples/s * 0.3s * 2 bytes
        assert_eq!(clip.data.len(), 14400);
        assert_eq!(clip.duration_ms(), 300);
        assert!(clip.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_wav_roundtrip() {
        let codec = PcmWavCodec::new(24000);
        let clip = codec.decode_pcm(&[1, 2, 3, 4, 5, 6]).unwrap();
        let wav = codec.encode_wav(&clip);
        let back = codec.decode_wav(&wav).unwrap();
        assert_eq!(back, clip);
    }

    #[test]
    fn test_concat_preserves_order_with_no_gap() {
        let codec = PcmWavCodec::new(24000);
        let a = codec.decode_pcm(&[1, 1]).unwrap();
        let b = codec.decode_pcm(&[2, 2]).unwrap();
        let c = codec.decode_pcm(&[3, 3]).unwrap();
        let merged = codec.concat(&[a, b, c]).unwrap();
        assert_eq!(merged.data, vec![1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn test_concat_rejects_rate_mismatch() {
        let codec = PcmWavCodec::new(24000);
        let a = codec.decode_pcm(&[1, 1]).unwrap();
        let b = AudioClip {
            sample_rate: 44100,
            data: vec![2, 2],
        };
        assert!(codec.concat(&[a, b]).is_err());
    }

    #[test]
    fn test_decode_pcm_rejects_bad_payloads() {
        let codec = PcmWavCodec::new(24000);
        assert!(codec.decode_pcm(&[]).is_err());
        assert!(codec.decode_pcm(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_decode_wav_rejects_garbage() {
        let codec = PcmWavCodec::new(24000);
        assert!(codec.decode_wav(b"not audio at all").is_err());
    }

    #[test]
    fn test_decode_wav_skips_extra_chunks() {
        let codec = PcmWavCodec::new(24000);
        let clip = codec.decode_pcm(&[9, 9, 8, 8]).unwrap();
        let mut wav = codec.encode_wav(&clip);

        // Splice a LIST chunk between fmt and data.
        let mut spliced = wav[..36].to_vec();
        spliced.extend_from_slice(b"LIST");
        spliced.extend_from_slice(&4u32.to_le_bytes());
        spliced.extend_from_slice(b"INFO");
        spliced.extend_from_slice(&wav[36..]);
        // Patch the RIFF size.
        let riff_size = (spliced.len() - 8) as u32;
        spliced[4..8].copy_from_slice(&riff_size.to_le_bytes());
        wav = spliced;

        let back = codec.decode_wav(&wav).unwrap();
        assert_eq!(back.data, vec![9, 9, 8, 8]);
    }
}
