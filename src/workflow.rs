use crate::assembler::{AssemblyOutcome, PodcastAssembler};
use crate::audio::{AudioCodec, PcmWavCodec};
use crate::config::Config;
use crate::llm::TextGenerator;
use crate::outline::{OutlinePlanner, SegmentPlan};
use crate::prompt::{self, SegmentRole};
use crate::retry::RetryPolicy;
use crate::speech::SpeechSynthesizer;
use crate::synth::{SegmentSink, SegmentSynthesizer, VoiceRouting};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisStrategy {
    /// Synthesize each dialogue line separately and stitch the results.
    PerLine,
    /// Hand the whole show to the speech provider in one request.
    Bulk,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub topic: String,
    pub total_minutes: u32,
    pub render_audio: bool,
    pub strategy: SynthesisStrategy,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RunState {
    completed_segments: Vec<usize>,
}

#[derive(Serialize, Deserialize)]
struct RunMetadata {
    topic: String,
    total_segments: usize,
    segments: Vec<SegmentMeta>,
}

#[derive(Serialize, Deserialize)]
struct SegmentMeta {
    segment: usize,
    title: String,
}

pub struct PreparedSegment {
    pub plan: SegmentPlan,
    pub prompt: String,
}

pub struct WorkflowManager {
    config: Config,
    generator: Box<dyn TextGenerator>,
    speech: Option<Box<dyn SpeechSynthesizer>>,
    state: RunState,
}

impl WorkflowManager {
    pub fn new(
        config: Config,
        generator: Box<dyn TextGenerator>,
        speech: Option<Box<dyn SpeechSynthesizer>>,
    ) -> Result<Self> {
        let state = Self::load_state(&config)?;
        Ok(Self {
            config,
            generator,
            speech,
            state,
        })
    }

    fn state_path(config: &Config) -> PathBuf {
        config.output_dir().join("state.json")
    }

    fn load_state(config: &Config) -> Result<RunState> {
        let path = Self::state_path(config);
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(RunState::default())
        }
    }

    fn save_state(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.state)?;
        fs::write(Self::state_path(&self.config), content)?;
        Ok(())
    }

    pub async fn run(&mut self, options: &RunOptions) -> Result<()> {
        println!("Planning outline...");
        let planner = OutlinePlanner::new(self.generator.as_ref());
        let outline = planner
            .plan(
                &options.topic,
                options.total_minutes,
                self.config.segment_minutes,
            )
            .await?;
        // The generator decides the real count; trust the outline, not the
        // request.
        println!("Outline ready: {} segments", outline.len());

        let prepared = self.build_prompts(&options.topic, outline);
        self.save_prompts(&options.topic, &prepared)?;
        println!(
            "Prompt templates saved to {:?}",
            self.config.prompts_dir()
        );

        if !options.render_audio {
            return Ok(());
        }
        if self.speech.is_none() {
            println!("Speech API key not configured. Skipping audio generation.");
            return Ok(());
        }

        match options.strategy {
            SynthesisStrategy::Bulk => self.run_bulk(&prepared).await,
            SynthesisStrategy::PerLine => {
                let segment_files = self.run_per_line(&prepared).await?;
                self.cleanup_temp();
                self.assemble(&segment_files)
            }
        }
    }

    /// Composes one prompt per outline entry. The accumulated context passed
    /// to segment i is the ordered learning goals of segments 1..i-1, never
    /// the segment's own content.
    fn build_prompts(&self, topic: &str, outline: Vec<SegmentPlan>) -> Vec<PreparedSegment> {
        let target_words = self.config.words_per_minute * self.config.segment_minutes;
        let total = outline.len();

        let mut prepared = Vec::with_capacity(total);
        let mut prior_goals: Vec<String> = Vec::new();

        for plan in outline {
            let role = if plan.index == 1 {
                SegmentRole::Opening
            } else {
                SegmentRole::Continuation {
                    is_final: plan.index == total,
                }
            };
            let text = prompt::compose(
                topic,
                &plan,
                role,
                &prior_goals,
                target_words,
                plan.index,
            );
            prior_goals.push(plan.learning_goal.clone());
            prepared.push(PreparedSegment { plan, prompt: text });
        }
        prepared
    }

    fn save_prompts(&self, topic: &str, prepared: &[PreparedSegment]) -> Result<()> {
        let prompts_dir = self.config.prompts_dir();
        fs::create_dir_all(&prompts_dir)?;

        let metadata = RunMetadata {
            topic: topic.to_string(),
            total_segments: prepared.len(),
            segments: prepared
                .iter()
                .map(|p| SegmentMeta {
                    segment: p.plan.index,
                    title: p.plan.title.clone(),
                })
                .collect(),
        };
        fs::write(
            prompts_dir.join("metadata.json"),
            serde_json::to_string_pretty(&metadata)?,
        )
        .context("failed to write metadata.json")?;

        for p in prepared {
            let path = prompts_dir.join(format!("segment_{:02}_prompt.txt", p.plan.index));
            fs::write(&path, &p.prompt)
                .with_context(|| format!("failed to write {:?}", path))?;
        }
        Ok(())
    }

    async fn run_bulk(&self, prepared: &[PreparedSegment]) -> Result<()> {
        let speech = self.speech.as_deref().context("speech client missing")?;
        println!("Generating full podcast in one request...");
        let separator = format!("\n\n{}\n\n", "=".repeat(60));
        let combined = prepared
            .iter()
            .map(|p| p.prompt.as_str())
            .collect::<Vec<_>>()
            .join(&separator);

        let bytes = speech
            .synthesize_bulk(&combined)
            .await
            .context("bulk synthesis failed")?;

        let path = self.config.output_dir().join("podcast_audio.mp3");
        fs::write(&path, bytes).with_context(|| format!("failed to write {:?}", path))?;
        println!("Podcast audio saved: {:?}", path);
        Ok(())
    }

    async fn run_per_line(&mut self, prepared: &[PreparedSegment]) -> Result<Vec<PathBuf>> {
        let speech = self.speech.as_deref().context("speech client missing")?;
        let codec = PcmWavCodec::new(self.config.speech.sample_rate);
        let voices = VoiceRouting {
            host_voice: self.config.speech.host_voice.clone(),
            expert_voice: self.config.speech.expert_voice.clone(),
        };
        let synthesizer = SegmentSynthesizer::new(
            self.generator.as_ref(),
            speech,
            &codec,
            voices,
            RetryPolicy::default(),
            Duration::from_secs(self.config.api_delay_seconds),
        );

        let pb = ProgressBar::new(prepared.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("#>-"),
        );

        let prompts_dir = self.config.prompts_dir();
        let mut segment_files = Vec::with_capacity(prepared.len());

        for p in prepared {
            let index = p.plan.index;
            let segment_path = self
                .config
                .output_dir()
                .join(format!("segment_{:02}_audio.wav", index));

            if self.state.completed_segments.contains(&index) && segment_path.exists() {
                println!("Skipping completed segment {}", index);
                segment_files.push(segment_path);
                pb.inc(1);
                continue;
            }

            let line_dir = self.config.temp_dir().join(format!("segment_{:02}", index));
            fs::create_dir_all(&line_dir)?;
            let sink = SegmentSink {
                script_path: prompts_dir.join(format!("segment_{:02}_script.txt", index)),
                dialogue_path: prompts_dir.join(format!("segment_{:02}_dialogue.json", index)),
                line_dir,
            };

            let render = synthesizer.synthesize(&p.prompt, index, Some(&sink)).await?;

            fs::write(&segment_path, codec.encode_wav(&render.clip))
                .with_context(|| format!("failed to write {:?}", segment_path))?;
            println!("Segment audio saved: {:?}", segment_path);

            self.state.completed_segments.push(index);
            self.save_state()?;
            segment_files.push(segment_path);
            pb.inc(1);
        }

        pb.finish_with_message("Synthesis complete");
        Ok(segment_files)
    }

    /// Per-line scratch is only needed until lines are folded into segment
    /// artifacts; failure to remove it is not fatal.
    fn cleanup_temp(&self) {
        let temp = self.config.temp_dir();
        if temp.exists() {
            if let Err(e) = fs::remove_dir_all(&temp) {
                log::warn!("could not remove temp files at {:?}: {}", temp, e);
            }
        }
    }

    fn assemble(&self, segment_files: &[PathBuf]) -> Result<()> {
        let codec = PcmWavCodec::new(self.config.speech.sample_rate);
        let assembler = if self.config.merge_segments {
            PodcastAssembler::new(Some(&codec))
        } else {
            PodcastAssembler::new(None)
        };

        let output = self.config.output_dir().join("podcast_full.wav");
        match assembler.assemble(segment_files, &output)? {
            AssemblyOutcome::Combined(path) => {
                println!("Final podcast: {:?}", path);
            }
            AssemblyOutcome::Unmerged(paths) => {
                println!("Segment merging disabled. Individual segment files:");
                for p in paths {
                    println!("  - {:?}", p);
                }
            }
        }
        Ok(())
    }
}
