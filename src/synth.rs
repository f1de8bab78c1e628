use crate::audio::{AudioClip, AudioCodec};
use crate::dialogue::{self, DialogueLine, SPEAKER_HOST};
use crate::llm::TextGenerator;
use crate::retry::{retry, RetryPolicy};
use crate::speech::SpeechSynthesizer;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Pause inserted between consecutive dialogue lines within a segment.
pub const LINE_GAP_MS: u64 = 300;

#[derive(Debug, Clone)]
pub struct VoiceRouting {
    pub host_voice: String,
    pub expert_voice: String,
}

impl VoiceRouting {
    /// HOST maps to the host voice; every other speaker tag (including
    /// unrecognized ones) maps to the expert voice. Never fails a line.
    pub fn route(&self, speaker: &str) -> &str {
        if speaker == SPEAKER_HOST {
            &self.host_voice
        } else {
            &self.expert_voice
        }
    }
}

/// Where a segment's intermediate artifacts land. Optional so unit tests can
/// run without touching the filesystem.
pub struct SegmentSink {
    pub script_path: PathBuf,
    pub dialogue_path: PathBuf,
    pub line_dir: PathBuf,
}

#[derive(Debug)]
pub struct SegmentRender {
    pub dialogue: Vec<DialogueLine>,
    pub clip: AudioClip,
}

pub struct SegmentSynthesizer<'a> {
    generator: &'a dyn TextGenerator,
    speech: &'a dyn SpeechSynthesizer,
    codec: &'a dyn AudioCodec,
    voices: VoiceRouting,
    policy: RetryPolicy,
    /// Unconditional pause after every successful line synthesis; rate-limit
    /// pacing, not retry backoff.
    pacing: Duration,
}

impl<'a> SegmentSynthesizer<'a> {
    pub fn new(
        generator: &'a dyn TextGenerator,
        speech: &'a dyn SpeechSynthesizer,
        codec: &'a dyn AudioCodec,
        voices: VoiceRouting,
        policy: RetryPolicy,
        pacing: Duration,
    ) -> Self {
        Self {
            generator,
            speech,
            codec,
            voices,
            policy,
            pacing,
        }
    }

    /// Renders one segment: script generation, dialogue extraction, per-line
    /// synthesis with retry, and intra-segment concatenation with line gaps.
    /// Lines are synthesized strictly in speaking order; exhausting retries
    /// on any line fails the segment.
    pub async fn synthesize(
        &self,
        prompt: &str,
        segment_index: usize,
        sink: Option<&SegmentSink>,
    ) -> Result<SegmentRender> {
        log::info!("Generating script for segment {}...", segment_index);
        let script = self
            .generator
            .generate(prompt)
            .await
            .with_context(|| format!("script generation failed for segment {}", segment_index))?;

        if let Some(sink) = sink {
            fs::write(&sink.script_path, &script)
                .with_context(|| format!("failed to save script for segment {}", segment_index))?;
        }

        let dialogue = dialogue::extract(&script)
            .with_context(|| format!("dialogue extraction failed for segment {}", segment_index))?;
        log::info!(
            "Parsed {} dialogue lines for segment {}",
            dialogue.len(),
            segment_index
        );

        if let Some(sink) = sink {
            fs::write(&sink.dialogue_path, serde_json::to_string_pretty(&dialogue)?)
                .with_context(|| format!("failed to save dialogue for segment {}", segment_index))?;
        }

        let mut clips: Vec<AudioClip> = Vec::with_capacity(dialogue.len() * 2);
        for (j, line) in dialogue.iter().enumerate() {
            let voice_id = self.voices.route(&line.speaker);
            let preview: String = line.text.chars().take(50).collect();
            log::debug!("  {}: {}", line.speaker, preview);

            let bytes = retry(&self.policy, || self.speech.synthesize(&line.text, voice_id))
                .await
                .with_context(|| {
                    format!("synthesis failed for segment {} line {}", segment_index, j)
                })?;

            let clip = self
                .codec
                .decode_pcm(&bytes)
                .with_context(|| format!("bad audio for segment {} line {}", segment_index, j))?;

            if let Some(sink) = sink {
                let line_path = sink.line_dir.join(format!("line_{:03}.pcm", j));
                fs::write(&line_path, &bytes).with_context(|| {
                    format!("failed to save line audio {:?}", line_path)
                })?;
            }

            if !clips.is_empty() {
                clips.push(self.codec.silence(LINE_GAP_MS));
            }
            clips.push(clip);

            tokio::time::sleep(self.pacing).await;
        }

        let clip = self.codec.concat(&clips)?;
        Ok(SegmentRender { dialogue, clip })
    }
}
