use crate::audio::AudioCodec;
use crate::error::AssemblyError;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Result of final assembly. When merging is unavailable or disabled the run
/// still ends usefully: the per-segment artifacts are handed back unmerged.
#[derive(Debug, PartialEq, Eq)]
pub enum AssemblyOutcome {
    Combined(PathBuf),
    Unmerged(Vec<PathBuf>),
}

pub struct PodcastAssembler<'a> {
    codec: Option<&'a dyn AudioCodec>,
}

impl<'a> PodcastAssembler<'a> {
    /// `codec: None` models the degraded mode: no concatenation capability,
    /// segments are reported as-is instead of crashing.
    pub fn new(codec: Option<&'a dyn AudioCodec>) -> Self {
        Self { codec }
    }

    /// Concatenates segment artifacts strictly in segment order with no
    /// inserted gap; intra-segment pacing already contains the line gaps.
    /// A segment that fails to decode aborts assembly and is named in the
    /// error.
    pub fn assemble(
        &self,
        segment_paths: &[PathBuf],
        output_path: &Path,
    ) -> Result<AssemblyOutcome> {
        let codec = match self.codec {
            Some(c) => c,
            None => return Ok(AssemblyOutcome::Unmerged(segment_paths.to_vec())),
        };

        let mut clips = Vec::with_capacity(segment_paths.len());
        for (i, path) in segment_paths.iter().enumerate() {
            let segment = i + 1;
            let bytes = fs::read(path)
                .with_context(|| format!("failed to read segment {} from {:?}", segment, path))?;
            let clip = codec.decode_wav(&bytes).map_err(|e| AssemblyError {
                segment,
                reason: e.to_string(),
            })?;
            clips.push(clip);
        }

        let combined = codec.concat(&clips)?;
        fs::write(output_path, codec.encode_wav(&combined))
            .with_context(|| format!("failed to write {:?}", output_path))?;

        Ok(AssemblyOutcome::Combined(output_path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioCodec, PcmWavCodec};
    use crate::error::AssemblyError;

    fn write_segment(dir: &Path, name: &str, codec: &PcmWavCodec, data: &[u8]) -> PathBuf {
        let clip = codec.decode_pcm(data).unwrap();
        let path = dir.join(name);
        fs::write(&path, codec.encode_wav(&clip)).unwrap();
        path
    }

    #[test]
    fn test_assemble_preserves_segment_order_with_no_gap() {
        let temp = tempfile::tempdir().unwrap();
        let codec = PcmWavCodec::new(24000);

        let a = write_segment(temp.path(), "segment_01_audio.wav", &codec, &[1, 1]);
        let b = write_segment(temp.path(), "segment_02_audio.wav", &codec, &[2, 2]);
        let c = write_segment(temp.path(), "segment_03_audio.wav", &codec, &[3, 3]);

        let out = temp.path().join("podcast_full.wav");
        let assembler = PodcastAssembler::new(Some(&codec));
        let outcome = assembler.assemble(&[a, b, c], &out).unwrap();

        assert_eq!(outcome, AssemblyOutcome::Combined(out.clone()));
        let merged = codec.decode_wav(&fs::read(&out).unwrap()).unwrap();
        assert_eq!(merged.data, vec![1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn test_assemble_names_failing_segment() {
        let temp = tempfile::tempdir().unwrap();
        let codec = PcmWavCodec::new(24000);

        let a = write_segment(temp.path(), "segment_01_audio.wav", &codec, &[1, 1]);
        let broken = temp.path().join("segment_02_audio.wav");
        fs::write(&broken, b"definitely not a wav").unwrap();

        let out = temp.path().join("podcast_full.wav");
        let assembler = PodcastAssembler::new(Some(&codec));
        let err = assembler.assemble(&[a, broken], &out).unwrap_err();

        let assembly = err.downcast_ref::<AssemblyError>().unwrap();
        assert_eq!(assembly.segment, 2);
        assert!(!out.exists());
    }

    #[test]
    fn test_assemble_without_codec_returns_unmerged() {
        let temp = tempfile::tempdir().unwrap();
        let paths = vec![temp.path().join("a.wav"), temp.path().join("b.wav")];

        let assembler = PodcastAssembler::new(None);
        let outcome = assembler
            .assemble(&paths, &temp.path().join("out.wav"))
            .unwrap();

        assert_eq!(outcome, AssemblyOutcome::Unmerged(paths));
    }
}
